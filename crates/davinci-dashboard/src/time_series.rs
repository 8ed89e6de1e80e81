//! 折线图时间序列

use davinci_core::ItemCategory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::detail::{DetailCount, ItemKey};

/// 图表类型
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
}

/// 单个项目的序列，数据与横轴一一对应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub data: Vec<u64>,
    #[serde(rename = "type")]
    pub kind: ChartKind,
}

/// 图表数据
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSeries {
    /// 升序去重的月份
    #[serde(rename = "xAxis")]
    pub x_axis: Vec<String>,
    pub series: Vec<Series>,
    pub legend: Vec<String>,
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.x_axis.is_empty() && self.series.is_empty() && self.legend.is_empty()
    }
}

/// 器械标注为 "<编号>号<名称>"，耗材只用名称
fn series_label(category: ItemCategory, count: &DetailCount) -> String {
    match category {
        ItemCategory::Instruments => {
            let id = count.id.map(|id| id.to_string()).unwrap_or_default();
            format!("{}号{}", id, count.name)
        }
        ItemCategory::Consumables => count.name.clone(),
    }
}

/// 把计数表整理成以月份为横轴的折线图数据，缺失月份补 0
pub fn build_time_series(counts: &[DetailCount], category: ItemCategory) -> TimeSeries {
    if counts.is_empty() {
        return TimeSeries::default();
    }

    let x_axis: Vec<String> = counts
        .iter()
        .map(|c| c.month.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut items: BTreeMap<ItemKey, (String, BTreeMap<&str, u64>)> = BTreeMap::new();
    for count in counts {
        let (_, monthly) = items
            .entry(count.item_key(category))
            .or_insert_with(|| (series_label(category, count), BTreeMap::new()));
        *monthly.entry(count.month.as_str()).or_insert(0) += count.count;
    }

    let mut series = Vec::with_capacity(items.len());
    let mut legend = Vec::with_capacity(items.len());
    for (_, (label, monthly)) in items {
        let data = x_axis
            .iter()
            .map(|month| monthly.get(month.as_str()).copied().unwrap_or(0))
            .collect();
        legend.push(label.clone());
        series.push(Series {
            name: label,
            data,
            kind: ChartKind::Line,
        });
    }

    TimeSeries {
        x_axis,
        series,
        legend,
    }
}
