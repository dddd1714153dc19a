//! HTTP layer: Axum router, guards, handlers, and response shapes.
//!
//! Admin-gated routes verify the bearer token and the caller's role before
//! any resource store access; everything else maps one request to one store
//! or processor call.

mod auth;
mod error;
mod handlers;
mod responses;
mod state;

#[cfg(test)]
mod tests;

pub use handlers::router;
pub use state::AppState;
