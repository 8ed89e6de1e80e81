//! # Davinci Web模块
//!
//! 管理端仪表盘的 HTTP 接口。

pub mod handlers;
pub mod server;

pub use handlers::ApiError;
pub use server::{create_app, AppState, WebServer};
