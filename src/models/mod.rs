pub mod auth;
pub mod request;
pub mod response;

pub use auth::{ApiKeyLocation, ApiKeyParam, AuthParam, Authentication, OAuth2Config, OAuth2Grant};
pub use request::{RequestBody, RequestDescription, RequestHeader, RequestUrl};
pub use response::ExecutionResult;
