//! HTTP layer: shared state and miscellaneous endpoints.

pub mod http;

pub use http::{health, index, AppState};
