use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Payment;
use crate::integrations::{
    IntegrationError, IntegrationResult, Payer, PaymentGateway, PaymentInfo, PaymentStatus,
    ensure_success,
};
use crate::model::entity::Plan;

pub const SERVICE: &str = "mercadopago";

#[derive(Debug, Serialize)]
struct Item<'a> {
    id: String,
    title: String,
    quantity: u32,
    currency_id: &'a str,
    unit_price: f64,
}

#[derive(Debug, Serialize)]
struct BackUrls {
    success: String,
    failure: String,
    pending: String,
}

#[derive(Debug, Serialize)]
struct PreferencePayer<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct PreferenceRequest<'a> {
    items: Vec<Item<'a>>,
    payer: PreferencePayer<'a>,
    back_urls: BackUrls,
    auto_return: &'static str,
    external_reference: String,
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
    init_point: String,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    status: String,
    #[serde(default)]
    external_reference: Option<String>,
}

impl From<PaymentResponse> for PaymentInfo {
    fn from(resp: PaymentResponse) -> Self {
        Self {
            status: PaymentStatus::from(resp.status.as_str()),
            plan: resp.external_reference.and_then(|r| r.parse().ok()),
        }
    }
}

/// MercadoPago checkout client.
#[derive(Debug, Clone)]
pub struct MercadoPagoGateway {
    http: reqwest::Client,
    api_url: String,
    access_token: String,
    currency: String,
    title: String,
    prices: [f64; 3],
    public_url: String,
}

impl MercadoPagoGateway {
    pub fn new(http: reqwest::Client, config: &Payment, public_url: &str) -> Self {
        Self {
            http,
            api_url: config.api_url().to_string(),
            access_token: config.access_token().to_string(),
            currency: config.currency().to_string(),
            title: config.title().to_string(),
            prices: [
                config.monthly_price(),
                config.annual_price(),
                config.lifetime_price(),
            ],
            public_url: public_url.to_string(),
        }
    }

    fn price(&self, plan: Plan) -> f64 {
        match plan {
            Plan::Monthly => self.prices[0],
            Plan::Annual => self.prices[1],
            Plan::Lifetime => self.prices[2],
        }
    }

    fn payment_url(&self, payment_id: &str) -> String {
        format!(
            "{}/v1/payments/{}",
            self.api_url,
            urlencoding::encode(payment_id)
        )
    }

    fn preference_request<'a>(&'a self, plan: Plan, payer: &'a Payer) -> PreferenceRequest<'a> {
        PreferenceRequest {
            items: vec![Item {
                id: plan.to_string(),
                title: format!("{} ({plan})", self.title),
                quantity: 1,
                currency_id: &self.currency,
                unit_price: self.price(plan),
            }],
            payer: PreferencePayer {
                email: &payer.email,
                name: &payer.full_name,
            },
            back_urls: BackUrls {
                success: format!("{}/payment_done?plan={plan}", self.public_url),
                failure: format!("{}/payment_denied", self.public_url),
                pending: format!("{}/payment_denied", self.public_url),
            },
            auto_return: "approved",
            external_reference: plan.to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    #[tracing::instrument(skip(self, payer))]
    async fn create_preference(&self, plan: Plan, payer: &Payer) -> IntegrationResult<String> {
        let body = self.preference_request(plan, payer);
        let resp = self
            .http
            .post(format!("{}/checkout/preferences", self.api_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|source| IntegrationError::Request {
                service: SERVICE,
                source,
            })?;
        let resp = ensure_success(SERVICE, resp).await?;

        let preference: PreferenceResponse =
            resp.json().await.map_err(|e| IntegrationError::Payload {
                service: SERVICE,
                message: e.to_string(),
            })?;
        Ok(preference.init_point)
    }

    #[tracing::instrument(skip(self))]
    async fn payment(&self, payment_id: &str) -> IntegrationResult<PaymentInfo> {
        let resp = self
            .http
            .get(self.payment_url(payment_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|source| IntegrationError::Request {
                service: SERVICE,
                source,
            })?;
        let resp = ensure_success(SERVICE, resp).await?;

        let payment: PaymentResponse = resp.json().await.map_err(|e| IntegrationError::Payload {
            service: SERVICE,
            message: e.to_string(),
        })?;
        Ok(payment.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    fn gateway() -> MercadoPagoGateway {
        let text = std::fs::read_to_string("./config.toml").unwrap();
        let config = Config::from_toml(&text).unwrap();
        MercadoPagoGateway::new(
            reqwest::Client::new(),
            config.payment(),
            "https://tina.example",
        )
    }

    #[test]
    fn preference_uses_plan_price_and_callbacks() {
        let gateway = gateway();
        let payer = Payer {
            email: "ana@example.com".into(),
            full_name: "Ana".into(),
        };
        let req = gateway.preference_request(Plan::Annual, &payer);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["items"][0]["unit_price"], 1234.5);
        assert_eq!(json["items"][0]["currency_id"], "BRL");
        assert_eq!(
            json["back_urls"]["success"],
            "https://tina.example/payment_done?plan=annual"
        );
        assert_eq!(json["back_urls"]["failure"], "https://tina.example/payment_denied");
        assert_eq!(json["external_reference"], "annual");
    }

    #[test]
    fn payment_id_stays_in_its_segment() {
        let gateway = gateway();
        let url = gateway.payment_url("../checkout/preferences");
        assert!(url.ends_with("/v1/payments/..%2Fcheckout%2Fpreferences"));
    }

    #[test]
    fn payment_reads_plan_from_reference() {
        let resp: PaymentResponse =
            serde_json::from_str(r#"{"status":"approved","external_reference":"monthly"}"#).unwrap();
        let info = PaymentInfo::from(resp);
        assert_eq!(info.status, PaymentStatus::Approved);
        assert_eq!(info.plan, Some(Plan::Monthly));

        let resp: PaymentResponse = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert_eq!(PaymentInfo::from(resp).plan, None);
    }
}
