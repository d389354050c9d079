pub mod auth;
pub mod redirect;
pub mod response;

pub use auth::identity_middleware;
pub use redirect::legacy_redirect_middleware;
pub use response::{ApiResponse, ApiResult};
