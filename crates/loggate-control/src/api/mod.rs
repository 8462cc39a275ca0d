//! REST handlers for the management API.

mod health;
mod inputs;
mod logs;
mod response;
mod router;
mod uploads;

#[cfg(test)]
mod tests;

pub use router::{create_router, AppState};
