//! 仪表盘聚合
//!
//! 对一个时间窗口内的手术记录依次执行贡献统计、明细计数、
//! 时间序列和效益分析，组装出完整的仪表盘数据。每次请求都重新计算。

use chrono::NaiveDateTime;
use davinci_core::{
    ItemCategory, PriceLookup, ReportWindow, Result, SurgeryError, SurgeryFilter, SurgeryRecord,
    SurgerySource,
};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::benefit::{analyze_benefits, BenefitAnalysis, BenefitRow, BenefitTotals, DEFAULT_REIMBURSEMENT};
use crate::contribution::{
    department_counts, nurse_counts, surgeon_counts, top_surgeons, DepartmentCount, NurseCount,
    SurgeonCount, SurgeryBrief, TopTen,
};
use crate::detail::{count_details, DetailCount};
use crate::time_series::{build_time_series, TimeSeries};

/// 仪表盘参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    /// 每台手术的报销金额
    pub reimbursement: i64,
    /// 未指定时间窗口时回溯的月数
    pub default_window_months: u32,
    /// 排名人数
    pub top_n: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            reimbursement: DEFAULT_REIMBURSEMENT,
            default_window_months: 12,
            top_n: 10,
        }
    }
}

/// 没有记录时序列化为空对象而不是 null
fn serialize_totals<S>(totals: &Option<BenefitTotals>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match totals {
        Some(totals) => totals.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// 仪表盘数据
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DashboardPayload {
    pub df: Vec<SurgeryBrief>,
    pub surgeon_count: Vec<SurgeonCount>,
    pub nurse_count: Vec<NurseCount>,
    pub department_count: Vec<DepartmentCount>,
    pub top_ten: TopTen,
    pub instrument_count: Vec<DetailCount>,
    pub accident_instrument_count: Vec<DetailCount>,
    pub consumable_count: Vec<DetailCount>,
    pub accident_consumable_count: Vec<DetailCount>,
    pub instrument_time_series: TimeSeries,
    pub instrument_acc_time_series: TimeSeries,
    pub consumable_time_series: TimeSeries,
    pub consumable_acc_time_series: TimeSeries,
    pub df_benefits: Vec<BenefitRow>,
    #[serde(serialize_with = "serialize_totals")]
    pub sum_all: Option<BenefitTotals>,
}

impl DashboardPayload {
    /// 所有字段均为空集合
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.df.is_empty()
            && self.surgeon_count.is_empty()
            && self.nurse_count.is_empty()
            && self.department_count.is_empty()
            && self.top_ten.is_empty()
            && self.instrument_count.is_empty()
            && self.accident_instrument_count.is_empty()
            && self.consumable_count.is_empty()
            && self.accident_consumable_count.is_empty()
            && self.instrument_time_series.is_empty()
            && self.instrument_acc_time_series.is_empty()
            && self.consumable_time_series.is_empty()
            && self.consumable_acc_time_series.is_empty()
            && self.df_benefits.is_empty()
            && self.sum_all.is_none()
    }
}

/// 仪表盘聚合器
pub struct DashboardAggregator {
    surgeries: Arc<dyn SurgerySource>,
    prices: Arc<dyn PriceLookup>,
    settings: DashboardSettings,
}

impl DashboardAggregator {
    pub fn new(
        surgeries: Arc<dyn SurgerySource>,
        prices: Arc<dyn PriceLookup>,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            surgeries,
            prices,
            settings,
        }
    }

    /// 两端都未指定时使用截止到 `now` 的默认窗口
    pub fn resolve_window(&self, window: ReportWindow, now: NaiveDateTime) -> ReportWindow {
        if window.begin.is_none() && window.end.is_none() {
            ReportWindow::trailing_months(now, self.settings.default_window_months)
        } else {
            window
        }
    }

    /// 生成时间窗口 [begin, end) 的仪表盘
    pub async fn build_dashboard(
        &self,
        begin: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<DashboardPayload> {
        self.build_dashboard_filtered(ReportWindow::new(begin, end), &SurgeryFilter::default())
            .await
    }

    /// 按科室、手术名称进一步筛选后生成仪表盘
    pub async fn build_dashboard_filtered(
        &self,
        window: ReportWindow,
        filter: &SurgeryFilter,
    ) -> Result<DashboardPayload> {
        let now = chrono::Local::now().naive_local();
        let window = self.resolve_window(window, now);
        let span = tracing::info_span!("dashboard", report_id = %Uuid::new_v4());

        async move {
            info!("Building dashboard for window {:?} .. {:?}", window.begin, window.end);

            let records = self.surgeries.fetch_surgeries(&window, filter).await?;
            let payload = self.build_from_records(&records)?;

            info!(
                "Dashboard built from {} surgeries ({} surgeons, {} benefit rows)",
                records.len(),
                payload.surgeon_count.len(),
                payload.df_benefits.len()
            );
            Ok::<_, SurgeryError>(payload)
        }
        .instrument(span)
        .await
    }

    /// 对已取回的记录计算仪表盘，不做任何 IO
    pub fn build_from_records(&self, records: &[SurgeryRecord]) -> Result<DashboardPayload> {
        if records.is_empty() {
            warn!("No surgeries in window, returning empty dashboard");
            return Ok(DashboardPayload::empty());
        }

        let surgeons = surgeon_counts(records);
        let departments = department_counts(&surgeons);
        let nurses = nurse_counts(records);
        let top_ten = top_surgeons(&surgeons, self.settings.top_n);

        let instruments = count_details(records, ItemCategory::Instruments);
        let consumables = count_details(records, ItemCategory::Consumables);

        let instrument_time_series = build_time_series(&instruments.normal, ItemCategory::Instruments);
        let instrument_acc_time_series =
            build_time_series(&instruments.accident, ItemCategory::Instruments);
        let consumable_time_series = build_time_series(&consumables.normal, ItemCategory::Consumables);
        let consumable_acc_time_series =
            build_time_series(&consumables.accident, ItemCategory::Consumables);

        let BenefitAnalysis { rows, totals } =
            analyze_benefits(records, self.prices.as_ref(), self.settings.reimbursement)?;

        Ok(DashboardPayload {
            df: records.iter().map(SurgeryBrief::from).collect(),
            surgeon_count: surgeons,
            nurse_count: nurses,
            department_count: departments,
            top_ten,
            instrument_count: instruments.normal,
            accident_instrument_count: instruments.accident,
            consumable_count: consumables.normal,
            accident_consumable_count: consumables.accident,
            instrument_time_series,
            instrument_acc_time_series,
            consumable_time_series,
            consumable_acc_time_series,
            df_benefits: rows,
            sum_all: Some(totals),
        })
    }

    /// 时间窗口内的效益汇总，没有记录时返回 `None`
    pub async fn window_benefit_totals(&self, window: &ReportWindow) -> Result<Option<BenefitTotals>> {
        let records = self
            .surgeries
            .fetch_surgeries(window, &SurgeryFilter::default())
            .await?;
        if records.is_empty() {
            return Ok(None);
        }

        let analysis = analyze_benefits(&records, self.prices.as_ref(), self.settings.reimbursement)?;
        Ok(Some(analysis.totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::PriceTable;
    use chrono::NaiveDate;
    use davinci_core::ItemUsage;
    use davinci_database::MemoryStore;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn record(date: &str, surgeon: &str, instruments: Vec<ItemUsage>, consumables: Vec<ItemUsage>) -> SurgeryRecord {
        let joined = |items: &[ItemUsage]| {
            items.iter().map(|i| i.name.clone()).collect::<Vec<_>>().join(",")
        };
        SurgeryRecord {
            patient_name: format!("{}的患者", surgeon),
            date: date.to_string(),
            admission_number: format!("A-{}", date),
            department: "普外科".to_string(),
            surgery_name: "胆囊切除术".to_string(),
            chief_surgeon: surgeon.to_string(),
            associate_surgeon: String::new(),
            instrument_nurses: vec!["李护士".to_string()],
            circulating_nurses: vec!["周护士".to_string()],
            instruments: joined(&instruments),
            consumables: joined(&consumables),
            instrument_details: instruments,
            consumable_details: consumables,
        }
    }

    fn prices() -> Arc<PriceTable> {
        Arc::new(PriceTable::from_json_str(r#"{"Forceps": 10, "Scissors": 20, "Trocar": 5}"#).unwrap())
    }

    fn aggregator(records: Vec<SurgeryRecord>) -> DashboardAggregator {
        let store = Arc::new(MemoryStore::new().with_surgeries(records));
        DashboardAggregator::new(store, prices(), DashboardSettings::default())
    }

    fn sample_records() -> Vec<SurgeryRecord> {
        vec![
            record(
                "2024-01-10",
                "王医生",
                vec![ItemUsage::instrument(1, "Forceps", "默认"), ItemUsage::instrument(2, "Scissors", "默认")],
                vec![ItemUsage::consumable("Trocar", "默认")],
            ),
            record(
                "2024-01-20",
                "王医生",
                vec![ItemUsage::instrument(1, "Forceps", "Broken")],
                vec![],
            ),
            record(
                "2024-02-03",
                "李医生",
                vec![ItemUsage::instrument(2, "Scissors", "默认")],
                vec![ItemUsage::consumable("Trocar", "Lost")],
            ),
        ]
    }

    #[tokio::test]
    async fn test_empty_window_returns_empty_payload() {
        let aggregator = aggregator(sample_records());

        let payload = aggregator
            .build_dashboard(Some(at("2030-01-01")), Some(at("2030-02-01")))
            .await
            .unwrap();

        assert!(payload.is_empty());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["top_ten"], serde_json::json!([[], []]));
        assert_eq!(json["sum_all"], serde_json::json!({}));
        let empty_series = serde_json::json!({"xAxis": [], "series": [], "legend": []});
        for key in [
            "instrument_time_series",
            "instrument_acc_time_series",
            "consumable_time_series",
            "consumable_acc_time_series",
        ] {
            assert_eq!(json[key], empty_series, "{}", key);
        }
        assert!(json.as_object().unwrap().values().all(|v| !v.is_null()));
    }

    #[tokio::test]
    async fn test_full_dashboard() {
        let aggregator = aggregator(sample_records());

        let payload = aggregator
            .build_dashboard(Some(at("2024-01-01")), Some(at("2024-03-01")))
            .await
            .unwrap();

        assert_eq!(payload.df.len(), 3);
        assert_eq!(payload.top_ten.counts(), &[1, 2]);
        assert_eq!(payload.top_ten.names(), &["李医生".to_string(), "王医生".to_string()]);
        assert_eq!(payload.department_count[0].value, 3);
        assert_eq!(payload.nurse_count.len(), 2);

        let forceps_jan = payload
            .instrument_count
            .iter()
            .find(|c| c.id == Some(1) && c.month == "2024-01")
            .unwrap();
        assert_eq!(forceps_jan.count, 2);
        assert_eq!(payload.accident_instrument_count.len(), 1);
        assert_eq!(payload.accident_consumable_count.len(), 1);

        assert_eq!(payload.instrument_time_series.x_axis, vec!["2024-01", "2024-02"]);
        assert_eq!(payload.instrument_time_series.legend, vec!["1号Forceps", "2号Scissors"]);
        assert_eq!(payload.instrument_acc_time_series.x_axis, vec!["2024-01"]);
        assert_eq!(payload.consumable_acc_time_series.legend, vec!["Trocar"]);

        assert_eq!(payload.df_benefits[0].sum, "35.00");
        assert_eq!(payload.df_benefits[0].gap, "32965.00");
        let totals = payload.sum_all.unwrap();
        assert_eq!(totals.total_cost, "70.00");
        assert_eq!(totals.total_paid, "99000.00");
        assert_eq!(totals.total_gap, "98930.00");
    }

    #[tokio::test]
    async fn test_dashboard_is_idempotent() {
        let aggregator = aggregator(sample_records());
        let begin = Some(at("2024-01-01"));
        let end = Some(at("2024-03-01"));

        let first = aggregator.build_dashboard(begin, end).await.unwrap();
        let second = aggregator.build_dashboard(begin, end).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_filtered_dashboard() {
        let mut records = sample_records();
        records[2].department = "泌尿外科".to_string();
        let aggregator = aggregator(records);

        let filter = SurgeryFilter {
            department: Some("泌尿外科".to_string()),
            surgery_name: None,
        };
        let payload = aggregator
            .build_dashboard_filtered(ReportWindow::new(Some(at("2024-01-01")), None), &filter)
            .await
            .unwrap();

        assert_eq!(payload.df.len(), 1);
        assert_eq!(payload.surgeon_count[0].chief_surgeon, "李医生");
    }

    #[tokio::test]
    async fn test_unknown_price_fails_request() {
        let mut records = sample_records();
        records[0].consumables = "Trocar,Gauze".to_string();
        let aggregator = aggregator(records);

        let result = aggregator
            .build_dashboard(Some(at("2024-01-01")), Some(at("2024-03-01")))
            .await;

        assert!(matches!(result, Err(SurgeryError::PriceNotFound(name)) if name == "Gauze"));
    }

    #[test]
    fn test_default_window_is_trailing_year() {
        let aggregator = aggregator(vec![]);
        let now = at("2024-06-15");

        let window = aggregator.resolve_window(ReportWindow::default(), now);
        assert_eq!(window.begin, Some(at("2023-06-15")));
        assert_eq!(window.end, Some(now));

        let explicit = ReportWindow::new(Some(at("2024-01-01")), None);
        assert_eq!(aggregator.resolve_window(explicit, now), explicit);
    }
}
