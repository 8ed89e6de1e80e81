//! # Davinci Core
//!
//! 手术管理后台的核心模块，提供基础数据结构、错误定义、外部数据源接口和通用工具。

pub mod error;
pub mod models;
pub mod sources;
pub mod utils;

pub use error::{Result, SurgeryError};
pub use models::*;
pub use sources::{EntityCounter, MessageSource, PriceLookup, SurgerySource};
