//! Field checks shared by the account endpoints.

use chrono::{NaiveDate, Utc};

use crate::utils::cpf;
use crate::web::{WebError, WebResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn email(value: &str) -> WebResult<String> {
    let value = value.trim();
    if !value.contains('@') {
        return Err(WebError::invalid_field("email", "invalid e-mail address"));
    }
    Ok(value.to_lowercase())
}

/// Parses `YYYY-MM-DD` and requires a date strictly before today.
pub fn birth_date(value: &str) -> WebResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| WebError::invalid_field("birth_date", "expected YYYY-MM-DD"))?;
    if date >= Utc::now().date_naive() {
        return Err(WebError::invalid_field("birth_date", "must be in the past"));
    }
    Ok(date)
}

/// Returns the bare eleven digits of a valid CPF.
pub fn cpf(value: &str) -> WebResult<String> {
    if !cpf::validate(value) {
        return Err(WebError::invalid_field("cpf", "invalid CPF"));
    }
    Ok(cpf::normalize(value))
}

pub fn passwords_match(password: &str, check: &str) -> WebResult<()> {
    if password.is_empty() {
        return Err(WebError::invalid_field("password", "must not be empty"));
    }
    if password != check {
        return Err(WebError::invalid_field("password", "passwords do not match"));
    }
    Ok(())
}

pub fn required<'a>(field: &'static str, value: Option<&'a str>) -> WebResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(WebError::invalid_field(field, "is required")),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn email_needs_at_sign() {
        assert_eq!(email(" Ana@Example.com ").unwrap(), "ana@example.com");
        assert!(email("ana.example.com").is_err());
    }

    #[test]
    fn birth_date_must_be_past() {
        assert!(birth_date("2000-01-31").is_ok());
        assert!(birth_date("31/01/2000").is_err());
        let tomorrow = (Utc::now() + chrono::Duration::days(1)).date_naive();
        assert!(birth_date(&tomorrow.format(DATE_FORMAT).to_string()).is_err());
        let today = Utc::now().date_naive();
        assert!(birth_date(&today.format(DATE_FORMAT).to_string()).is_err());
    }

    #[test]
    fn cpf_is_normalized() {
        assert_eq!(cpf("529.982.247-25").unwrap(), "52998224725");
        assert!(cpf("529.982.247-26").is_err());
    }

    #[test]
    fn passwords() {
        assert!(passwords_match("abc", "abc").is_ok());
        assert!(passwords_match("abc", "abd").is_err());
        assert!(passwords_match("", "").is_err());
    }

    #[test]
    fn required_rejects_blank() {
        assert_eq!(required("email", Some(" a@b ")).unwrap(), "a@b");
        assert!(required("email", Some("   ")).is_err());
        assert!(required("email", None).is_err());
    }
}
