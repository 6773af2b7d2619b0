use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{CONFIG_ENV, find_config_file, read_config, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    mail: Mail,
    payment: Payment,
    llm: Llm,
    oauth: OAuth,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    admin_email: String,
    public_url: String,
    #[serde(default)]
    front_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Mail {
    api_url: String,
    token: String,
    sender_email: String,
    sender_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Payment {
    api_url: String,
    access_token: String,
    currency: String,
    title: String,
    monthly_price: f64,
    annual_price: f64,
    lifetime_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct Llm {
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct OAuth {
    google: GoogleOAuth,
}

#[derive(Debug, Deserialize)]
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let text = read_config(use_local)?;
                    Self::from_toml(&text)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e @ ConfigError::ConfigNotFound { .. }) => {
                        tracing::error!("{e}, set {} to point at one.", CONFIG_ENV);
                        std::process::exit(1);
                    }
                    Err(e) => {
                        crate::error::log_error(&e);
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn mail(&self) -> &Mail {
        &self.mail
    }

    #[inline]
    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    #[inline]
    pub fn llm(&self) -> &Llm {
        &self.llm
    }

    #[inline]
    pub fn oauth(&self) -> &OAuth {
        &self.oauth
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    /// Accounts registered with this e-mail get the admin role.
    #[inline]
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Externally reachable base URL, used for payment callbacks.
    #[inline]
    pub fn public_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    #[inline]
    pub fn front_urls(&self) -> &[String] {
        &self.front_urls
    }
}

impl Mail {
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn sender_email(&self) -> &str {
        &self.sender_email
    }

    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }
}

impl Payment {
    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn monthly_price(&self) -> f64 {
        self.monthly_price
    }

    pub fn annual_price(&self) -> f64 {
        self.annual_price
    }

    pub fn lifetime_price(&self) -> f64 {
        self.lifetime_price
    }
}

impl Llm {
    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

impl OAuth {
    pub fn google(&self) -> &GoogleOAuth {
        &self.google
    }
}

impl GoogleOAuth {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
        assert_eq!(config.llm().model(), "sabia-3");
    }

    #[test]
    fn config_missing_section_is_an_error() {
        let result = Config::from_toml("[host]\nbindto = \"0.0.0.0:1\"\n");
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }

    #[test]
    fn config_public_url_is_trimmed() {
        let text = std::fs::read_to_string("./config.toml").unwrap();
        let text = text.replace(
            "public_url = \"http://127.0.0.1:5000\"",
            "public_url = \"https://tina.example/\"",
        );
        let config = Config::from_toml(&text).unwrap();
        assert_eq!(config.app().public_url(), "https://tina.example");
    }
}
