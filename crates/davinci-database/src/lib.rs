//! # Davinci 数据库模块
//!
//! 仪表盘所需外部数据源的实现：基于 PostgreSQL 的持久化存储，
//! 以及用于演示和测试的内存存储。

pub mod connection;
pub mod memory;
pub mod models;
pub mod queries;
pub mod store;

// 重新导出主要类型
pub use connection::DatabasePool;
pub use memory::{MemoryStore, SeedData};
pub use models::*;
pub use queries::DatabaseQueries;
pub use store::PostgresStore;
