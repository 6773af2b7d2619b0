use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    certificate::CertificateError,
    error::log_error,
    integrations::IntegrationError,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationEmailConflict")]
    RegistrationEmailConflict,

    #[error("RegistrationCpfConflict")]
    RegistrationCpfConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationAdminRequired")]
    AuthenticationAdminRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,

    #[error("AuthenticationUserNotFound")]
    AuthenticationUserNotFound,

    #[error("AuthenticationAlreadyLoggedIn")]
    AuthenticationAlreadyLoggedIn,

    #[error("AuthenticationEmailAlreadyVerified")]
    AuthenticationEmailAlreadyVerified,

    #[error("AuthenticationStateMismatch")]
    AuthenticationStateMismatch,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceConflict: {resource_type:?}")]
    ResourceConflict { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },

    #[error("ResourceBadRequest: {resource_type:?}. {reason}")]
    ResourceBadRequest {
        resource_type: ResourceType,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("ValidationInvalidField: {field}. {reason}")]
    ValidationInvalidField { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] CryptError),

    #[error("ServerCertificateError: {0}")]
    ServerCertificateError(#[from] CertificateError),
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("UpstreamIntegrationError: {0}")]
    UpstreamIntegrationError(#[from] IntegrationError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl UpstreamError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::UpstreamIntegrationError(e) => {
                format!("Upstream error, {} request failed.", e.service())
            }
        }
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::CONFLICT
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationEmailConflict => {
                String::from("Registration error, e-mail already in use.")
            }
            Self::RegistrationCpfConflict => String::from("Registration error, CPF already in use."),
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationAdminRequired => StatusCode::FORBIDDEN,
            Self::AuthenticationInvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AuthenticationUserNotFound => StatusCode::NOT_FOUND,
            Self::AuthenticationAlreadyLoggedIn => StatusCode::UNAUTHORIZED,
            Self::AuthenticationEmailAlreadyVerified => StatusCode::UNAUTHORIZED,
            Self::AuthenticationStateMismatch => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationAdminRequired => {
                String::from("Authentication error, administrator access required.")
            }
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, password is invalid.")
            }
            Self::AuthenticationUserNotFound => String::from("Authentication error, user not found."),
            Self::AuthenticationAlreadyLoggedIn => {
                String::from("Authentication error, already logged in.")
            }
            Self::AuthenticationEmailAlreadyVerified => {
                String::from("Authentication error, e-mail already verified.")
            }
            Self::AuthenticationStateMismatch => {
                String::from("Authentication error, login state does not match.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ResourceBadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { resource_type } => {
                format!("Resource error, {} not found.", resource_type.name())
            }
            Self::ResourceForbidden { resource_type } => {
                format!("Resource error, {} forbidden.", resource_type.name())
            }
            Self::ResourceConflict { resource_type } => {
                format!("Resource error, {} already exists.", resource_type.name())
            }
            Self::ResourceFetchError { resource_type, .. } => {
                format!("Resource error, unable to fetch {}.", resource_type.name())
            }
            Self::ResourceBadRequest { reason, .. } => format!("Resource error, {reason}."),
        }
    }
}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ValidationInvalidField { field, reason } => {
                format!("Validation error, {field}: {reason}.")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("ValidationError - {0}")]
    ValidationError(#[from] ValidationError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
    #[error("UpstreamError - {0}")]
    UpstreamError(#[from] UpstreamError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_conflict(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn resource_bad_request<S: Into<String>>(r#type: ResourceType, reason: S) -> Self {
        Self::ResourceError(ResourceError::ResourceBadRequest {
            resource_type: r#type,
            reason: reason.into(),
        })
    }

    /// Maps a repository error, keeping access and uniqueness failures distinct.
    pub fn from_db(r#type: ResourceType) -> impl FnOnce(DatabaseError) -> Self {
        move |e| match e {
            DatabaseError::Forbidden => Self::resource_forbidden(r#type),
            e if e.is_unique_violation() => Self::resource_conflict(r#type),
            e => Self::resource_fetch_error(r#type, e),
        }
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn admin_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationAdminRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn auth_user_not_found() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationUserNotFound)
    }

    pub fn auth_already_logged_in() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationAlreadyLoggedIn)
    }

    pub fn auth_email_already_verified() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationEmailAlreadyVerified)
    }

    pub fn auth_state_mismatch() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationStateMismatch)
    }

    pub fn registration_email_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationEmailConflict)
    }

    pub fn registration_cpf_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationCpfConflict)
    }

    pub fn invalid_field<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::ValidationError(ValidationError::ValidationInvalidField {
            field,
            reason: reason.into(),
        })
    }

    pub fn server_crypt_error<E: Into<CryptError>>(e: E) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e.into()))
    }

    pub fn server_certificate_error(e: CertificateError) -> Self {
        Self::ServerError(ServerError::ServerCertificateError(e))
    }

    pub fn upstream<E: Into<IntegrationError>>(e: E) -> Self {
        Self::UpstreamError(UpstreamError::UpstreamIntegrationError(e.into()))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::ValidationError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
            Self::UpstreamError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::ValidationError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
            Self::UpstreamError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code, equal to the response status
    pub response: u16,
    /// Human-readable message for the client
    pub description: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let body = ErrorResponse {
            response: status_code.as_u16(),
            description: self.client_display(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}
