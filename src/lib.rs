pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod images;
pub mod recipes;
pub mod state;
pub mod storage;
pub mod users;
pub mod validation;

pub use app::build_app;
pub use state::AppState;
