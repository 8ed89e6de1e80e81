//! 仪表盘演示程序
//!
//! 从 data/ 下的种子文件和价格表构建：
//! - 2024年第一季度的手术仪表盘
//! - 按科室筛选后的仪表盘
//! - 三月份的概览统计

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use davinci_core::{ReportWindow, SurgeryFilter};
use davinci_dashboard::{
    DashboardAggregator, DashboardSettings, GeneralStatsAggregator, PriceTable,
};
use davinci_database::MemoryStore;
use std::sync::Arc;
use tracing::{info, warn};

fn at(date: &str) -> Result<NaiveDateTime> {
    Ok(NaiveDate::parse_from_str(date, "%Y-%m-%d")?.and_time(NaiveTime::MIN))
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("🚀 启动仪表盘演示");

    let store = Arc::new(MemoryStore::from_seed_file("data/seed.json")?);
    let prices = Arc::new(PriceTable::from_json_file("data/price_table.json")?);
    let dashboard = Arc::new(DashboardAggregator::new(
        store.clone(),
        prices,
        DashboardSettings::default(),
    ));

    demo_quarter_dashboard(&dashboard).await?;
    demo_filtered_dashboard(&dashboard).await?;

    let general = GeneralStatsAggregator::new(dashboard.clone(), store.clone(), store);
    let stats = general.build_general_stats_at(at("2024-03-20")?).await?;
    info!("\n📋 三月概览");
    info!("{}", serde_json::to_string_pretty(&stats)?);

    info!("✅ 仪表盘演示完成");
    Ok(())
}

/// 第一季度仪表盘
async fn demo_quarter_dashboard(dashboard: &DashboardAggregator) -> Result<()> {
    info!("\n📋 2024年第一季度仪表盘");

    let payload = dashboard
        .build_dashboard(Some(at("2024-01-01")?), Some(at("2024-04-01")?))
        .await?;

    info!("   手术台数: {}", payload.df.len());
    for surgeon in &payload.surgeon_count {
        info!(
            "   {} {}: 主刀 {} 台, 科室 {} 台",
            surgeon.department, surgeon.chief_surgeon, surgeon.c_count, surgeon.d_count
        );
    }
    for nurse in &payload.nurse_count {
        info!(
            "   {}: 巡回 {} 台, 器械 {} 台",
            nurse.name, nurse.count_circulate, nurse.count_instrument
        );
    }
    for item in &payload.accident_instrument_count {
        warn!("   异常器械 {} {}: {} 次 ({})", item.month, item.name, item.count, item.description);
    }
    if let Some(totals) = &payload.sum_all {
        info!(
            "   总成本 {} / 总报销 {} / 差额 {}",
            totals.total_cost, totals.total_paid, totals.total_gap
        );
    }

    Ok(())
}

/// 只看泌尿外科
async fn demo_filtered_dashboard(dashboard: &DashboardAggregator) -> Result<()> {
    info!("\n📋 泌尿外科仪表盘");

    let filter = SurgeryFilter {
        department: Some("泌尿外科".to_string()),
        surgery_name: None,
    };
    let window = ReportWindow::new(Some(at("2024-01-01")?), Some(at("2024-04-01")?));
    let payload = dashboard.build_dashboard_filtered(window, &filter).await?;

    info!("   手术台数: {}", payload.df.len());
    info!("   器械使用趋势: {}", serde_json::to_string(&payload.instrument_time_series)?);

    Ok(())
}
