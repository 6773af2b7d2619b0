use async_trait::async_trait;
use serde::Serialize;

use crate::config::Mail;
use crate::integrations::{IntegrationError, IntegrationResult, Mailer, ensure_success};

pub const SERVICE: &str = "mailtrap";
const CATEGORY: &str = "Email Verification";

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text: &'a str,
    category: &'a str,
}

/// Mailtrap send API client.
#[derive(Debug, Clone)]
pub struct MailtrapMailer {
    http: reqwest::Client,
    api_url: String,
    token: String,
    sender_email: String,
    sender_name: String,
}

impl MailtrapMailer {
    pub fn new(http: reqwest::Client, config: &Mail) -> Self {
        Self {
            http,
            api_url: config.api_url().to_string(),
            token: config.token().to_string(),
            sender_email: config.sender_email().to_string(),
            sender_name: config.sender_name().to_string(),
        }
    }
}

#[async_trait]
impl Mailer for MailtrapMailer {
    #[tracing::instrument(skip(self, text))]
    async fn send(&self, recipient: &str, subject: &str, text: &str) -> IntegrationResult<()> {
        let body = SendRequest {
            from: Address {
                email: &self.sender_email,
                name: Some(&self.sender_name),
            },
            to: vec![Address {
                email: recipient,
                name: None,
            }],
            subject,
            text,
            category: CATEGORY,
        };

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|source| IntegrationError::Request {
                service: SERVICE,
                source,
            })?;
        ensure_success(SERVICE, resp).await?;

        tracing::info!("Mail sent.");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = SendRequest {
            from: Address {
                email: "hello@demomailtrap.com",
                name: Some("Mailtrap Test"),
            },
            to: vec![Address {
                email: "ana@example.com",
                name: None,
            }],
            subject: "Código",
            text: "123456",
            category: CATEGORY,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["from"]["name"], "Mailtrap Test");
        assert_eq!(json["to"][0]["email"], "ana@example.com");
        assert!(json["to"][0].get("name").is_none());
        assert_eq!(json["category"], "Email Verification");
    }
}
