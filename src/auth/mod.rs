//! Authentication: service and HTTP handlers.

mod handlers;
mod service;

pub use handlers::{login, logout, profile, register, reset_password_token, update_password};
pub use service::Auth;
