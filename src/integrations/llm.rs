use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Llm;
use crate::integrations::{IntegrationError, IntegrationResult, QuestionGenerator, ensure_success};
use crate::quiz::{GeneratedQuestion, parse_generated_questions};

pub const SERVICE: &str = "maritaca";

fn system_prompt(count: u32) -> String {
    format!(
        "Crie exatamente {count} perguntas com 4 alternativas cada, a partir de uma transcrição de aula fornecida, \
         no formato CSV, onde cada linha contém a pergunta, as 4 alternativas, e a resposta correta, separadas por ;. \
         A primeira coluna será a pergunta, a segunda coluna terá a alternativa 1, a terceira coluna terá a alternativa 2, \
         a quarta coluna terá a alternativa 3, a quinta coluna terá a alternativa 4 e a sexta coluna terá a resposta correta. \
         As perguntas devem ser claras, objetivas e concisas, e todas as alternativas devem ser apresentadas de forma coerente. \
         Não adicione texto antes ou depois das perguntas e alternativas e nenhuma outra formatação no arquivo CSV. \
         A resposta deve ser o texto da alternativa correta. Apenas as perguntas e respostas nas linhas, \
         sem a indicação do número da pergunta."
    )
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Question generator backed by Maritaca's OpenAI-compatible chat API.
#[derive(Debug, Clone)]
pub struct MaritacaGenerator {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl MaritacaGenerator {
    pub fn new(http: reqwest::Client, config: &Llm) -> Self {
        Self {
            http,
            api_url: config.api_url().to_string(),
            api_key: config.api_key().to_string(),
            model: config.model().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        }
    }

    fn chat_request(&self, transcript: &str, count: u32) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt(count),
                },
                Message {
                    role: "user",
                    content: format!("A transcrição é: {transcript}"),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl QuestionGenerator for MaritacaGenerator {
    #[tracing::instrument(skip(self, transcript))]
    async fn generate(
        &self,
        transcript: &str,
        count: u32,
    ) -> IntegrationResult<Vec<GeneratedQuestion>> {
        let body = self.chat_request(transcript, count);
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| IntegrationError::Request {
                service: SERVICE,
                source,
            })?;
        let resp = ensure_success(SERVICE, resp).await?;

        let chat: ChatResponse = resp.json().await.map_err(|e| IntegrationError::Payload {
            service: SERVICE,
            message: e.to_string(),
        })?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(IntegrationError::Payload {
                service: SERVICE,
                message: "no choices in completion".to_string(),
            })?;

        tracing::debug!(len = content.len(), "Completion received.");
        Ok(parse_generated_questions(&content)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    #[test]
    fn prompt_carries_count_and_transcript() {
        let text = std::fs::read_to_string("./config.toml").unwrap();
        let config = Config::from_toml(&text).unwrap();
        let generator = MaritacaGenerator::new(reqwest::Client::new(), config.llm());

        let req = generator.chat_request("Rust tem ownership.", 3);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "sabia-3");
        assert_eq!(json["max_tokens"], 8000);
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(
            json["messages"][0]["content"]
                .as_str()
                .unwrap()
                .starts_with("Crie exatamente 3 perguntas")
        );
        assert_eq!(json["messages"][1]["content"], "A transcrição é: Rust tem ownership.");
    }
}
