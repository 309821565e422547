//! Database models split into domain-specific modules.

pub mod request;
pub mod role;
pub mod service;
pub mod user;

pub use request::*;
pub use role::*;
pub use service::*;
pub use user::*;
