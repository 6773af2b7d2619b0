mod context;
pub use context::{AuthenticatedUser, RequestContext, UserRole};

mod error;
pub use error::{ErrorResponse, WebError, WebResult};

mod response;
pub use response::{ApiResponse, MessageResponse};

pub mod dto;
pub mod middlewares;
pub mod validation;

mod state;
pub use state::AppState;

pub mod routes;

pub mod doc;
