//! 手术仪表盘服务器主程序

use anyhow::Context;
use clap::Parser;
use davinci_admin::{init_logging, ConfigManager, DavinciConfig};
use davinci_core::{EntityCounter, MessageSource, SurgerySource};
use davinci_dashboard::{DashboardAggregator, GeneralStatsAggregator, PriceTable};
use davinci_database::{DatabasePool, MemoryStore, PostgresStore};
use davinci_web::{AppState, WebServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 服务器命令行参数，覆盖配置文件中的同名项
#[derive(Parser, Debug)]
#[command(name = "davinci-server")]
#[command(about = "手术机器人使用统计仪表盘服务器")]
struct Args {
    /// 服务器端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long)]
    log_level: Option<String>,

    /// 数据库连接字符串
    #[arg(long)]
    database_url: Option<String>,

    /// 内存存储的种子文件
    #[arg(long)]
    seed_file: Option<String>,

    /// 价格表 JSON 文件
    #[arg(long)]
    price_table: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut DavinciConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        if let Some(seed) = &self.seed_file {
            config.database.seed_file = Some(seed.clone());
        }
        if let Some(prices) = &self.price_table {
            config.dashboard.price_table_path = Some(prices.clone());
        }
    }
}

/// 数据源三件套
struct Sources {
    surgeries: Arc<dyn SurgerySource>,
    messages: Arc<dyn MessageSource>,
    counter: Arc<dyn EntityCounter>,
}

impl Sources {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: SurgerySource + MessageSource + EntityCounter + 'static,
    {
        Self {
            surgeries: store.clone(),
            messages: store.clone(),
            counter: store,
        }
    }
}

async fn open_sources(config: &DavinciConfig) -> anyhow::Result<Sources> {
    if let Some(url) = &config.database.url {
        info!("  数据源: PostgreSQL");
        let pool = DatabasePool::connect(
            url,
            config.database.max_connections,
            Duration::from_secs(config.database.connect_timeout_secs),
        )
        .await?;
        let store = PostgresStore::initialize(pool).await?;
        return Ok(Sources::from_store(Arc::new(store)));
    }

    let store = match &config.database.seed_file {
        Some(path) => {
            info!("  数据源: 内存 (种子文件 {})", path);
            MemoryStore::from_seed_file(path)?
        }
        None => {
            warn!("  数据源: 内存 (空)");
            MemoryStore::new()
        }
    };
    Ok(Sources::from_store(Arc::new(store)))
}

fn load_prices(config: &DavinciConfig) -> anyhow::Result<PriceTable> {
    match &config.dashboard.price_table_path {
        Some(path) => {
            let table = PriceTable::from_json_file(path)?;
            info!("  价格表: {} ({} 项)", path, table.len());
            Ok(table)
        }
        None => {
            warn!("  价格表: 未配置，任何带器械或耗材的手术都无法计算效益");
            Ok(PriceTable::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let manager = ConfigManager::new(args.config.as_deref())?;
    let mut config = manager.get_config().await;
    args.apply(&mut config);
    // 命令行覆盖后重新验证
    let manager = ConfigManager::with_config(config, args.config.as_deref())?;
    let config = manager.get_config().await;

    init_logging(&config.logging)?;

    info!("启动手术仪表盘服务器...");
    info!("  配置来源: {}", manager.source_description());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("  监听地址: {}", addr);

    let sources = open_sources(&config).await?;
    let prices = Arc::new(load_prices(&config)?);

    let dashboard = Arc::new(DashboardAggregator::new(
        sources.surgeries,
        prices,
        manager.dashboard_settings().await,
    ));
    let general = Arc::new(GeneralStatsAggregator::new(
        dashboard.clone(),
        sources.counter,
        sources.messages,
    ));

    let server = WebServer::new(addr, AppState { dashboard, general });

    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}
