//! In-process integrations that record calls instead of reaching the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::integrations::{
    ExternalIdentity, IdentityProvider, IntegrationError, IntegrationResult, Mailer, Payer,
    PaymentGateway, PaymentInfo, PaymentStatus, QuestionGenerator, Services,
};
use crate::model::entity::Plan;
use crate::quiz::{GeneratedQuestion, parse_generated_questions};

fn unavailable(service: &'static str) -> IntegrationError {
    IntegrationError::Status {
        service,
        status: 503,
        body: "service unavailable".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<SentMail> {
        self.sent().pop()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, recipient: &str, subject: &str, text: &str) -> IntegrationResult<()> {
        if self.failing {
            return Err(unavailable("mock-mail"));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMail {
                recipient: recipient.to_string(),
                subject: subject.to_string(),
                text: text.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockPaymentGateway {
    payments: Mutex<HashMap<String, PaymentInfo>>,
    preferences: Mutex<Vec<(Plan, String)>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payment made through the `plan` checkout.
    /// Payments not registered here are reported as rejected.
    pub fn set_payment(&self, payment_id: &str, plan: Plan, status: PaymentStatus) {
        if let Ok(mut payments) = self.payments.lock() {
            payments.insert(
                payment_id.to_string(),
                PaymentInfo {
                    status,
                    plan: Some(plan),
                },
            );
        }
    }

    pub fn preferences(&self) -> Vec<(Plan, String)> {
        self.preferences.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_preference(&self, plan: Plan, payer: &Payer) -> IntegrationResult<String> {
        let link = format!("https://checkout.mock/{plan}?payer={}", payer.email);
        if let Ok(mut prefs) = self.preferences.lock() {
            prefs.push((plan, payer.email.clone()));
        }
        Ok(link)
    }

    async fn payment(&self, payment_id: &str) -> IntegrationResult<PaymentInfo> {
        let info = self
            .payments
            .lock()
            .ok()
            .and_then(|p| p.get(payment_id).copied())
            .unwrap_or(PaymentInfo {
                status: PaymentStatus::Rejected,
                plan: None,
            });
        Ok(info)
    }
}

#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    identities: Mutex<HashMap<String, ExternalIdentity>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, code: &str, email: &str, name: &str) {
        if let Ok(mut ids) = self.identities.lock() {
            ids.insert(
                code.to_string(),
                ExternalIdentity {
                    email: email.to_string(),
                    name: name.to_string(),
                },
            );
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://accounts.mock/auth?state={state}")
    }

    async fn exchange(&self, code: &str) -> IntegrationResult<ExternalIdentity> {
        self.identities
            .lock()
            .ok()
            .and_then(|ids| ids.get(code).cloned())
            .ok_or(IntegrationError::Status {
                service: "mock-oauth",
                status: 400,
                body: "invalid_grant".to_string(),
            })
    }
}

#[derive(Debug)]
pub struct MockQuestionGenerator {
    output: String,
    calls: Mutex<Vec<(String, u32)>>,
}

impl MockQuestionGenerator {
    /// Replies to every request with `output` as if it came from the model.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockQuestionGenerator {
    fn default() -> Self {
        Self::new("```csv\nQuanto é 2+2?;3;4;5;6;4\nQual a cor do céu?;Azul;Verde;Roxo;Preto;Azul\n```")
    }
}

#[async_trait]
impl QuestionGenerator for MockQuestionGenerator {
    async fn generate(
        &self,
        transcript: &str,
        count: u32,
    ) -> IntegrationResult<Vec<GeneratedQuestion>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((transcript.to_string(), count));
        }
        Ok(parse_generated_questions(&self.output)?)
    }
}

/// Mock handles kept by tests next to the [`Services`] built from them.
#[derive(Debug, Clone)]
pub struct MockServices {
    pub mailer: Arc<MockMailer>,
    pub payments: Arc<MockPaymentGateway>,
    pub identity: Arc<MockIdentityProvider>,
    pub questions: Arc<MockQuestionGenerator>,
}

impl MockServices {
    pub fn new() -> Self {
        Self {
            mailer: Arc::new(MockMailer::new()),
            payments: Arc::new(MockPaymentGateway::new()),
            identity: Arc::new(MockIdentityProvider::new()),
            questions: Arc::new(MockQuestionGenerator::default()),
        }
    }

    /// Same as [`MockServices::new`] but every e-mail fails to send.
    pub fn with_failing_mailer() -> Self {
        Self {
            mailer: Arc::new(MockMailer::failing()),
            ..Self::new()
        }
    }

    pub fn services(&self) -> Services {
        Services {
            mailer: self.mailer.clone(),
            payments: self.payments.clone(),
            identity: self.identity.clone(),
            questions: self.questions.clone(),
        }
    }
}

impl Default for MockServices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn mailer_records_messages() {
        let mailer = MockMailer::new();
        mailer.send("a@b.com", "Oi", "123456").await.unwrap();
        assert_eq!(mailer.last().unwrap().text, "123456");
        assert!(MockMailer::failing().send("a@b.com", "Oi", "x").await.is_err());
    }

    #[tokio::test]
    async fn unknown_payments_are_rejected() {
        let gateway = MockPaymentGateway::new();
        gateway.set_payment("42", Plan::Annual, PaymentStatus::Approved);
        let known = gateway.payment("42").await.unwrap();
        assert_eq!(known.status, PaymentStatus::Approved);
        assert_eq!(known.plan, Some(Plan::Annual));
        let unknown = gateway.payment("7").await.unwrap();
        assert_eq!(unknown.status, PaymentStatus::Rejected);
        assert_eq!(unknown.plan, None);
    }

    #[tokio::test]
    async fn generator_parses_canned_output() {
        let generator = MockQuestionGenerator::default();
        let questions = generator.generate("texto", 2).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(generator.calls(), vec![("texto".to_string(), 2)]);
    }
}
