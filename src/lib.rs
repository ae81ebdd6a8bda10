pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod reconcile;
pub mod state;
pub mod storage;
pub mod store;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_data;
