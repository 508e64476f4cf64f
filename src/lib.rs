//! Library lending service
//!
//! REST JSON API for a book catalog, borrowings and the fees they incur,
//! with chat notifications, hosted checkout and a daily overdue reminder.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod scheduler;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
