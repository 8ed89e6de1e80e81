//! 错误定义模块

use thiserror::Error;

/// 手术管理系统统一错误类型
#[derive(Error, Debug)]
pub enum SurgeryError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("价格表中不存在该项目: {0}")]
    PriceNotFound(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for SurgeryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => SurgeryError::NotFound(err.to_string()),
            other => SurgeryError::Database(other.to_string()),
        }
    }
}

/// 手术管理系统统一结果类型
pub type Result<T> = std::result::Result<T, SurgeryError>;
