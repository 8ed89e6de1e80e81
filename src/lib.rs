//! 手术器械与耗材管理后台的仪表盘统计

pub use davinci_core;
pub use davinci_dashboard;
pub use davinci_database;
