//! 配置管理
//!
//! 从可选的配置文件和 `DAVINCI_` 前缀的环境变量加载配置，
//! 环境变量用 `__` 分隔层级，例如 `DAVINCI_SERVER__PORT=9000`。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use davinci_dashboard::{DashboardSettings, DEFAULT_REIMBURSEMENT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

use crate::logging::LogFormat;

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: Arc<RwLock<DavinciConfig>>,
    /// 配置文件路径
    config_path: Option<String>,
}

/// 完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DavinciConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 连接字符串，未设置时使用内存存储
    pub url: Option<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时秒数
    pub connect_timeout_secs: u64,
    /// 内存存储的种子文件
    pub seed_file: Option<String>,
}

/// 仪表盘配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// 每台手术的报销金额
    pub reimbursement: i64,
    /// 未指定时间窗口时向前回溯的月数
    pub default_window_months: u32,
    /// 主刀排行榜长度
    pub top_n: usize,
    /// 价格表 JSON 文件
    pub price_table_path: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别，EnvFilter 语法
    pub level: String,
    /// 输出格式
    pub format: LogFormat,
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数，返回 false 表示不通过
    validator: fn(&DavinciConfig) -> bool,
    /// 错误消息
    error_message: &'static str,
}

impl ConfigManager {
    /// 从配置文件（可选）和环境变量加载配置
    pub fn new(config_path: Option<&str>) -> Result<Self> {
        let config = Self::load_config(config_path, Self::environment())?;
        Self::with_config(config, config_path)
    }

    /// 使用已有配置创建
    pub fn with_config(config: DavinciConfig, config_path: Option<&str>) -> Result<Self> {
        ConfigValidator::new().validate(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.map(str::to_string),
        })
    }

    fn environment() -> Environment {
        Environment::with_prefix("DAVINCI")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// 加载配置
    fn load_config(config_path: Option<&str>, environment: Environment) -> Result<DavinciConfig> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(environment)
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// 获取当前配置
    pub async fn get_config(&self) -> DavinciConfig {
        self.config.read().await.clone()
    }

    /// 配置来源，日志初始化后由调用方输出
    pub fn source_description(&self) -> String {
        match &self.config_path {
            Some(path) => format!("{} + DAVINCI_* 环境变量", path),
            None => "默认值 + DAVINCI_* 环境变量".to_string(),
        }
    }

    /// 按点分路径读取配置值，例如 `dashboard.top_n`
    pub async fn get_value<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let config = self.config.read().await;
        let mut current = serde_json::to_value(&*config)
            .context("Failed to serialize config to JSON")?;

        for part in path.split('.') {
            current = match current {
                serde_json::Value::Object(mut map) => map
                    .remove(part)
                    .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", path))?,
                _ => return Err(anyhow::anyhow!("Invalid path at segment: {}", part)),
            };
        }

        serde_json::from_value(current).context("Failed to deserialize configuration value")
    }

    /// 仪表盘聚合参数
    pub async fn dashboard_settings(&self) -> DashboardSettings {
        self.config.read().await.dashboard.to_settings()
    }
}

impl DashboardConfig {
    pub fn to_settings(&self) -> DashboardSettings {
        DashboardSettings {
            reimbursement: self.reimbursement,
            default_window_months: self.default_window_months,
            top_n: self.top_n,
        }
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "server.port",
                validator: |config| config.server.port != 0,
                error_message: "Server port cannot be 0",
            },
            ValidationRule {
                field_path: "database.max_connections",
                validator: |config| config.database.max_connections != 0,
                error_message: "Database max connections cannot be 0",
            },
            ValidationRule {
                field_path: "dashboard.reimbursement",
                validator: |config| config.dashboard.reimbursement >= 0,
                error_message: "Reimbursement cannot be negative",
            },
            ValidationRule {
                field_path: "dashboard.default_window_months",
                validator: |config| config.dashboard.default_window_months != 0,
                error_message: "Default window must cover at least one month",
            },
            ValidationRule {
                field_path: "dashboard.top_n",
                validator: |config| config.dashboard.top_n != 0,
                error_message: "Top surgeon list cannot be empty",
            },
        ];

        Self { validation_rules }
    }

    pub fn validate(&self, config: &DavinciConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if !(rule.validator)(config) {
                error!("Configuration validation failed for {}", rule.field_path);
                return Err(anyhow::anyhow!("{}: {}", rule.field_path, rule.error_message));
            }
        }

        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connect_timeout_secs: 10,
            seed_file: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let settings = DashboardSettings::default();
        Self {
            reimbursement: DEFAULT_REIMBURSEMENT,
            default_window_months: settings.default_window_months,
            top_n: settings.top_n,
            price_table_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
