use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SignUpBody {
    pub email: String,
    pub password: String,
    pub password_check: String,
    pub full_name: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub cpf: String,
    #[serde(default)]
    pub tina_client: bool,
    #[serde(default)]
    pub keep_logged_in: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginBody {
    /// E-mail address or CPF
    pub id_method: String,
    pub password: String,
    #[serde(default)]
    pub keep_logged_in: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SendEmailBody {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct EmailCodeBody {
    pub auth_code: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct MaskedEmailResponse {
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}
