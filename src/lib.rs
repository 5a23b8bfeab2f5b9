pub mod app_state;
pub mod commands;
pub mod error;
pub mod services;
pub mod utils;
pub mod web;

#[cfg(test)]
mod test_support;

pub use app_state::AppState;
pub use error::{AppError, AppResult};
