//! # Davinci 仪表盘模块
//!
//! 管理员仪表盘的统计流水线，包括：
//! - 明细计数：按月份和项目统计器械/耗材使用次数，并单独统计异常使用
//! - 时间序列：把计数整理成折线图数据
//! - 效益分析：按价格表计算每台手术的成本与报销差额
//! - 贡献统计：医生、科室、护士的手术数量及排名
//! - 概览统计：本月用户、手术、器械、耗材、成本与消息概况

pub mod aggregator;
pub mod benefit;
pub mod contribution;
pub mod detail;
pub mod general;
pub mod price;
pub mod time_series;

// 重新导出主要类型
pub use aggregator::{DashboardAggregator, DashboardPayload, DashboardSettings};
pub use benefit::{analyze_benefits, BenefitAnalysis, BenefitRow, BenefitTotals, DEFAULT_REIMBURSEMENT};
pub use contribution::{
    department_counts, doctor_monthly_contribution, nurse_counts, surgeon_counts, top_surgeons,
    DailyContribution, DepartmentCount, NurseCount, SurgeonCount, SurgeryBrief, TopTen,
};
pub use detail::{count_details, DetailCount, DetailCounts, ItemKey};
pub use general::{GeneralStats, GeneralStatsAggregator, NO_MESSAGE_THIS_MONTH};
pub use price::PriceTable;
pub use time_series::{build_time_series, ChartKind, Series, TimeSeries};
