pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod route;
pub mod state;
pub mod ui;

pub use api::{ApiClient, ApiError, TaskDeckApi};
pub use app::{App, AppEvent};
pub use config::Config;
pub use route::Route;
