use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

/// Success envelope; `response` always equals the HTTP status.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    pub response: u16,
    pub description: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok<S: Into<String>>(description: S, data: T) -> Self {
        Self::with_status(StatusCode::OK, description, data)
    }

    pub fn created<S: Into<String>>(description: S, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, description, data)
    }

    pub fn with_status<S: Into<String>>(status: StatusCode, description: S, data: T) -> Self {
        Self {
            response: status.as_u16(),
            description: description.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.response).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Envelope for responses that carry no payload.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub response: u16,
    pub description: String,
}

impl MessageResponse {
    pub fn ok<S: Into<String>>(description: S) -> Self {
        Self {
            response: StatusCode::OK.as_u16(),
            description: description.into(),
        }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.response).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn envelope_shape() {
        let resp = ApiResponse::created("Course created.", serde_json::json!({"id": 1}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["response"], 201);
        assert_eq!(json["description"], "Course created.");
        assert_eq!(json["data"]["id"], 1);

        let msg = serde_json::to_value(MessageResponse::ok("Done.")).unwrap();
        assert_eq!(msg["response"], 200);
        assert!(msg.get("data").is_none());
    }
}
