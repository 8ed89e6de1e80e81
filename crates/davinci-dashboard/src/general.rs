//! 概览统计
//!
//! 首页小部件使用的本月概况：各类实体总数、本月成本、消息数量与未处理比例。

use chrono::NaiveDateTime;
use davinci_core::{EntityCounter, EntityKind, MessageSource, ReportWindow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::aggregator::DashboardAggregator;

/// 本月没有消息时的提示
pub const NO_MESSAGE_THIS_MONTH: &str = "本月无消息";

/// 概览数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralStats {
    pub users: String,
    pub surgery: String,
    pub instrument: String,
    pub consumable: String,
    /// 本月总成本，两位小数
    pub cost: String,
    /// "<n>条" 或 "本月无消息"
    pub message: String,
    /// 未处理消息百分比
    pub unhandled_message: f64,
}

/// 概览统计聚合器
pub struct GeneralStatsAggregator {
    dashboard: Arc<DashboardAggregator>,
    counter: Arc<dyn EntityCounter>,
    messages: Arc<dyn MessageSource>,
}

impl GeneralStatsAggregator {
    pub fn new(
        dashboard: Arc<DashboardAggregator>,
        counter: Arc<dyn EntityCounter>,
        messages: Arc<dyn MessageSource>,
    ) -> Self {
        Self {
            dashboard,
            counter,
            messages,
        }
    }

    /// 本月一日到现在的概览
    pub async fn build_general_stats(&self) -> Result<GeneralStats> {
        self.build_general_stats_at(chrono::Local::now().naive_local())
            .await
    }

    pub async fn build_general_stats_at(&self, now: NaiveDateTime) -> Result<GeneralStats> {
        let window = ReportWindow::month_to_date(now);
        let counts = self.counter.count_all().await?;
        let count_of = |kind: EntityKind| counts.get(&kind).copied().unwrap_or(0).to_string();

        let cost = self
            .dashboard
            .window_benefit_totals(&window)
            .await?
            .map(|totals| totals.total_cost)
            .unwrap_or_else(|| "0.00".to_string());

        let messages = self.messages.fetch_messages(&window).await?;
        let (message, unhandled_message) = if messages.is_empty() {
            (NO_MESSAGE_THIS_MONTH.to_string(), 0.0)
        } else {
            let unhandled = messages.iter().filter(|m| m.is_unhandled()).count();
            (
                format!("{}条", messages.len()),
                unhandled as f64 / messages.len() as f64 * 100.0,
            )
        };

        info!(
            "General stats: {} month-to-date messages, cost {}",
            messages.len(),
            cost
        );

        Ok(GeneralStats {
            users: count_of(EntityKind::Users),
            surgery: count_of(EntityKind::Surgeries),
            instrument: count_of(EntityKind::Instruments),
            consumable: count_of(EntityKind::Consumables),
            cost,
            message,
            unhandled_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::DashboardSettings;
    use crate::price::PriceTable;
    use chrono::NaiveDate;
    use davinci_core::{Message, SurgeryRecord};
    use davinci_database::MemoryStore;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn surgery(date: &str, instruments: &str) -> SurgeryRecord {
        SurgeryRecord {
            patient_name: "张三".to_string(),
            date: date.to_string(),
            admission_number: "A001".to_string(),
            department: "普外科".to_string(),
            surgery_name: "胆囊切除术".to_string(),
            chief_surgeon: "王医生".to_string(),
            associate_surgeon: String::new(),
            instrument_nurses: vec![],
            circulating_nurses: vec![],
            instruments: instruments.to_string(),
            consumables: String::new(),
            instrument_details: vec![],
            consumable_details: vec![],
        }
    }

    fn message(m_id: i64, status: i32, date: &str) -> Message {
        Message {
            m_id,
            content: "器械损坏".to_string(),
            priority: 0,
            status,
            feedback: None,
            insert_time: at(date),
        }
    }

    fn aggregator(store: MemoryStore) -> GeneralStatsAggregator {
        let store = Arc::new(store);
        let prices = Arc::new(PriceTable::from_json_str(r#"{"Forceps": 10.5}"#).unwrap());
        let dashboard = Arc::new(DashboardAggregator::new(
            store.clone(),
            prices,
            DashboardSettings::default(),
        ));
        GeneralStatsAggregator::new(dashboard, store.clone(), store)
    }

    #[tokio::test]
    async fn test_general_stats_with_messages() {
        let store = MemoryStore::new()
            .with_surgeries(vec![
                surgery("2024-03-02", "Forceps"),
                surgery("2024-03-10", "Forceps,Forceps"),
                surgery("2024-02-27", "Forceps"),
            ])
            .with_messages(vec![
                message(1, 1, "2024-03-03"),
                message(2, 0, "2024-03-04"),
                message(3, 1, "2024-03-05"),
                message(4, 1, "2024-03-06"),
                message(5, 1, "2024-02-01"),
            ])
            .with_entity_count(EntityKind::Users, 7)
            .with_entity_count(EntityKind::Instruments, 42);

        let stats = aggregator(store).build_general_stats_at(at("2024-03-15")).await.unwrap();

        assert_eq!(stats.users, "7");
        assert_eq!(stats.surgery, "3");
        assert_eq!(stats.instrument, "42");
        assert_eq!(stats.consumable, "0");
        assert_eq!(stats.cost, "31.50");
        assert_eq!(stats.message, "4条");
        assert!((stats.unhandled_message - 75.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_general_stats_quiet_month() {
        let store = MemoryStore::new().with_surgeries(vec![surgery("2024-02-27", "Forceps")]);

        let stats = aggregator(store).build_general_stats_at(at("2024-03-15")).await.unwrap();

        assert_eq!(stats.cost, "0.00");
        assert_eq!(stats.message, NO_MESSAGE_THIS_MONTH);
        assert_eq!(stats.unhandled_message, 0.0);
    }
}
