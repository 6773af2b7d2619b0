//! Clients for the third-party services the platform talks to.
//!
//! Handlers only see the traits below; production wiring uses the reqwest
//! backed clients and tests swap in the recording mocks from [`mock`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::model::entity::Plan;
use crate::quiz::{GeneratedQuestion, QuizParseError};

pub mod llm;
pub mod mail;
pub mod mock;
pub mod oauth;
pub mod payment;

pub use llm::MaritacaGenerator;
pub use mail::MailtrapMailer;
pub use oauth::GoogleIdentityProvider;
pub use payment::MercadoPagoGateway;

#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("request to {service} failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} answered with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} returned an unexpected payload: {message}")]
    Payload {
        service: &'static str,
        message: String,
    },
    #[error(transparent)]
    QuizParse(#[from] QuizParseError),
}

pub type IntegrationResult<T> = Result<T, IntegrationError>;

impl IntegrationError {
    pub fn service(&self) -> &'static str {
        match self {
            Self::Request { service, .. }
            | Self::Status { service, .. }
            | Self::Payload { service, .. } => service,
            Self::QuizParse(_) => llm::SERVICE,
        }
    }
}

/// Checks the status of a response and turns failures into [`IntegrationError::Status`].
pub(crate) async fn ensure_success(
    service: &'static str,
    resp: reqwest::Response,
) -> IntegrationResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(IntegrationError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
pub trait Mailer: Send + Sync + fmt::Debug {
    async fn send(&self, recipient: &str, subject: &str, text: &str) -> IntegrationResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Approved,
    Pending,
    Rejected,
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        match value {
            "approved" => Self::Approved,
            "pending" | "in_process" | "authorized" | "in_mediation" => Self::Pending,
            _ => Self::Rejected,
        }
    }
}

/// What the gateway reports about a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentInfo {
    pub status: PaymentStatus,
    /// Plan recorded on the checkout the payment came from, if any.
    pub plan: Option<Plan>,
}

/// Buyer data attached to checkout preferences.
#[derive(Debug, Clone)]
pub struct Payer {
    pub email: String,
    pub full_name: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + fmt::Debug {
    /// Creates a checkout for `plan` and returns the link the buyer follows.
    async fn create_preference(&self, plan: Plan, payer: &Payer) -> IntegrationResult<String>;

    async fn payment(&self, payment_id: &str) -> IntegrationResult<PaymentInfo>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    fn authorize_url(&self, state: &str) -> String;

    async fn exchange(&self, code: &str) -> IntegrationResult<ExternalIdentity>;
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync + fmt::Debug {
    async fn generate(
        &self,
        transcript: &str,
        count: u32,
    ) -> IntegrationResult<Vec<GeneratedQuestion>>;
}

#[derive(Debug, Clone)]
pub struct Services {
    pub mailer: Arc<dyn Mailer>,
    pub payments: Arc<dyn PaymentGateway>,
    pub identity: Arc<dyn IdentityProvider>,
    pub questions: Arc<dyn QuestionGenerator>,
}

impl Services {
    /// Network-backed clients configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        Self {
            mailer: Arc::new(MailtrapMailer::new(http.clone(), config.mail())),
            payments: Arc::new(MercadoPagoGateway::new(
                http.clone(),
                config.payment(),
                config.app().public_url(),
            )),
            identity: Arc::new(GoogleIdentityProvider::new(
                http.clone(),
                config.oauth().google(),
            )),
            questions: Arc::new(MaritacaGenerator::new(http, config.llm())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payment_status_from_gateway_names() {
        assert_eq!(PaymentStatus::from("approved"), PaymentStatus::Approved);
        assert_eq!(PaymentStatus::from("in_process"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from("rejected"), PaymentStatus::Rejected);
        assert_eq!(PaymentStatus::from("cancelled"), PaymentStatus::Rejected);
    }

    #[test]
    fn error_names_its_service() {
        let err = IntegrationError::Status {
            service: "mailtrap",
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.service(), "mailtrap");
        assert_eq!(err.to_string(), "mailtrap answered with status 401: unauthorized");
    }
}
