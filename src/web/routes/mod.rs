use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{AppState, doc::ApiDoc};

pub mod account;
pub mod auth;
pub mod certificate;
pub mod courses;
pub mod payment;
pub mod progress;
pub mod quiz;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct PaginationQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Front-end origins with credentials, or anything goes when none are configured.
fn cors_layer(front_urls: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = front_urls
        .iter()
        .filter_map(|url| match HeaderValue::from_str(url.trim_end_matches('/')) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%url, "Ignoring invalid front-end origin.");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState) -> Router<S> {
    let config = state.config();

    let mut router = Router::new()
        .merge(auth::routes(state.clone()))
        .merge(account::routes(state.clone()))
        .merge(payment::routes(state.clone()))
        .merge(quiz::routes(state.clone()))
        .merge(courses::routes(state.clone()))
        .merge(progress::routes(state.clone()))
        .merge(certificate::routes(state.clone()));

    if config.app().docs() {
        router = router.merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(CookieManagerLayer::new())
        .layer(cors_layer(config.app().front_urls()))
        .with_state(state)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pagination_defaults_and_bounds() {
        let q = PaginationQuery::default();
        assert_eq!(q.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(q.offset(), 0);

        let q = PaginationQuery {
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(q.limit(), MAX_PAGE_LIMIT);
        assert_eq!(q.offset(), 0);
    }
}
