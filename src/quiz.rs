use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::entity::AnswerLetter;

pub const FIELD_DELIMITER: u8 = b';';

#[derive(Debug, thiserror::Error)]
pub enum QuizParseError {
    #[error("line {line}: expected a statement, at least two options and an answer")]
    MalformedLine { line: u64 },
    #[error("line {line}: at most {max} options are supported")]
    TooManyOptions { line: u64, max: usize },
    #[error("no questions found")]
    Empty,
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// A multiple-choice question produced from a lesson transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GeneratedQuestion {
    pub statement: String,
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    pub correct_letter: Option<AnswerLetter>,
}

impl GeneratedQuestion {
    fn new(statement: String, mut options: Vec<String>, correct_answer: String) -> Self {
        options.shuffle(&mut rand::rng());

        let mut correct_letter = None;
        let mut lettered = BTreeMap::new();
        for (idx, option) in options.into_iter().enumerate() {
            let Some(letter) = AnswerLetter::from_index(idx) else {
                break;
            };
            if correct_letter.is_none() && option == correct_answer {
                correct_letter = Some(letter);
            }
            lettered.insert(letter.to_string(), option);
        }

        Self {
            statement,
            options: lettered,
            correct_answer,
            correct_letter,
        }
    }
}

/// Removes a markdown code fence (with optional language tag) wrapped around the text.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => "",
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses `statement;option;...;option;answer` lines as returned by the model.
pub fn parse_generated_questions(text: &str) -> Result<Vec<GeneratedQuestion>, QuizParseError> {
    let body = strip_code_fence(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(body.as_bytes());

    let mut questions = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        if fields.len() < 4 || fields[0].is_empty() {
            return Err(QuizParseError::MalformedLine { line });
        }

        let options = fields[1..fields.len() - 1].to_vec();
        if options.len() > AnswerLetter::ALL.len() {
            return Err(QuizParseError::TooManyOptions {
                line,
                max: AnswerLetter::ALL.len(),
            });
        }

        let mut fields = fields;
        let answer = fields.pop().unwrap_or_default();
        let statement = fields.swap_remove(0);
        questions.push(GeneratedQuestion::new(statement, options, answer));
    }

    if questions.is_empty() {
        return Err(QuizParseError::Empty);
    }
    Ok(questions)
}

#[cfg(test)]
mod test {
    use super::*;

    const PLAIN: &str = "Qual a capital do Brasil?;Brasília;Rio de Janeiro;São Paulo;Salvador;Brasília\n\
                         Quanto é 2+2?;3;4;5;6;4\n";

    #[test]
    fn parses_plain_lines() {
        let questions = parse_generated_questions(PLAIN).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].statement, "Qual a capital do Brasil?");
        assert_eq!(questions[0].correct_answer, "Brasília");
        assert_eq!(questions[1].options.len(), 4);
    }

    #[test]
    fn strips_code_fence() {
        let fenced = format!("```csv\n{PLAIN}```");
        let questions = parse_generated_questions(&fenced).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].statement, "Quanto é 2+2?");
    }

    #[test]
    fn shuffle_keeps_option_set_and_tracks_letter() {
        for _ in 0..20 {
            let questions = parse_generated_questions(PLAIN).unwrap();
            let q = &questions[1];

            let mut values: Vec<&str> = q.options.values().map(String::as_str).collect();
            values.sort();
            assert_eq!(values, vec!["3", "4", "5", "6"]);

            let keys: Vec<&str> = q.options.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["A", "B", "C", "D"]);

            let letter = q.correct_letter.unwrap();
            assert_eq!(q.options[&letter.to_string()], "4");
        }
    }

    #[test]
    fn answer_outside_options_has_no_letter() {
        let questions = parse_generated_questions("Cor do céu?;Azul;Verde;Vermelho;Preto;Roxo").unwrap();
        assert_eq!(questions[0].correct_letter, None);
    }

    #[test]
    fn skips_blank_lines() {
        let text = "\nQuanto é 1+1?;1;2;3;4;2\n\n";
        assert_eq!(parse_generated_questions(text).unwrap().len(), 1);
    }

    #[test]
    fn malformed_line_is_reported() {
        let text = "Quanto é 1+1?;1;2;3;4;2\napenas texto solto\n";
        match parse_generated_questions(text) {
            Err(QuizParseError::MalformedLine { line }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_output_is_an_error() {
        assert!(matches!(
            parse_generated_questions("```csv\n```"),
            Err(QuizParseError::Empty)
        ));
    }
}
