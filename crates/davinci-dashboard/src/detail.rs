//! 器械/耗材明细计数
//!
//! 把每台手术的使用明细展开成 (月份, 项目) 维度的计数，
//! 并对描述不是"默认"的记录单独统计异常次数。

use davinci_core::{ItemCategory, ItemUsage, SurgeryRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 分组用的项目标识：器械按编号，耗材按名称
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKey {
    Id(Option<i64>),
    Name(String),
}

impl ItemKey {
    pub fn of(category: ItemCategory, id: Option<i64>, name: &str) -> Self {
        match category {
            ItemCategory::Instruments => ItemKey::Id(id),
            ItemCategory::Consumables => ItemKey::Name(name.to_string()),
        }
    }

    fn of_usage(category: ItemCategory, usage: &ItemUsage) -> Self {
        Self::of(category, usage.id, &usage.name)
    }
}

/// 某月某项目的使用次数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailCount {
    /// 月份 YYYY-MM
    #[serde(rename = "date")]
    pub month: String,
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub count: u64,
}

impl DetailCount {
    pub fn item_key(&self, category: ItemCategory) -> ItemKey {
        ItemKey::of(category, self.id, &self.name)
    }
}

/// 正常计数与异常计数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailCounts {
    pub normal: Vec<DetailCount>,
    /// 没有异常记录时为空
    pub accident: Vec<DetailCount>,
}

/// 统计一批手术记录中某类项目的使用次数
pub fn count_details(records: &[SurgeryRecord], category: ItemCategory) -> DetailCounts {
    let rows: Vec<(&str, &ItemUsage)> = records
        .iter()
        .flat_map(|record| {
            record
                .usages(category)
                .iter()
                .map(move |usage| (record.month(), usage))
        })
        .collect();

    let normal = group_counts(rows.iter().copied(), category);
    let accident = group_counts(
        rows.iter().copied().filter(|(_, usage)| usage.is_anomalous()),
        category,
    );

    tracing::debug!(
        "Counted {} usage rows for {}: {} groups, {} accident groups",
        rows.len(),
        category,
        normal.len(),
        accident.len()
    );

    DetailCounts { normal, accident }
}

/// 按 (月份, 项目) 分组计数，名称和描述取组内第一条
fn group_counts<'a>(
    rows: impl Iterator<Item = (&'a str, &'a ItemUsage)>,
    category: ItemCategory,
) -> Vec<DetailCount> {
    let mut groups: HashMap<(String, ItemKey), DetailCount> = HashMap::new();

    for (month, usage) in rows {
        groups
            .entry((month.to_string(), ItemKey::of_usage(category, usage)))
            .and_modify(|count| count.count += 1)
            .or_insert_with(|| DetailCount {
                month: month.to_string(),
                id: usage.id,
                name: usage.name.clone(),
                description: usage.description.clone(),
                count: 1,
            });
    }

    let mut counts: Vec<DetailCount> = groups.into_values().collect();
    counts.sort_by(|a, b| (&a.name, a.id, &a.month).cmp(&(&b.name, b.id, &b.month)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, instruments: Vec<ItemUsage>, consumables: Vec<ItemUsage>) -> SurgeryRecord {
        SurgeryRecord {
            patient_name: "患者".to_string(),
            date: date.to_string(),
            admission_number: "A001".to_string(),
            department: "普外科".to_string(),
            surgery_name: "胆囊切除术".to_string(),
            chief_surgeon: "王医生".to_string(),
            associate_surgeon: String::new(),
            instrument_nurses: vec![],
            circulating_nurses: vec![],
            instruments: String::new(),
            consumables: String::new(),
            instrument_details: instruments,
            consumable_details: consumables,
        }
    }

    #[test]
    fn test_normal_and_accident_counts() {
        let records = vec![
            record("2024-03-01", vec![ItemUsage::instrument(1, "Forceps", "默认")], vec![]),
            record("2024-03-20", vec![ItemUsage::instrument(1, "Forceps", "Broken")], vec![]),
        ];

        let counts = count_details(&records, ItemCategory::Instruments);

        assert_eq!(counts.normal.len(), 1);
        assert_eq!(counts.normal[0].month, "2024-03");
        assert_eq!(counts.normal[0].id, Some(1));
        assert_eq!(counts.normal[0].count, 2);

        assert_eq!(counts.accident.len(), 1);
        assert_eq!(counts.accident[0].count, 1);
        assert_eq!(counts.accident[0].description, "Broken");
    }

    #[test]
    fn test_accident_counts_empty_when_all_default() {
        let records = vec![record(
            "2024-03-01",
            vec![ItemUsage::instrument(1, "Forceps", "默认")],
            vec![ItemUsage::consumable("Trocar", "默认")],
        )];

        let counts = count_details(&records, ItemCategory::Consumables);
        assert_eq!(counts.normal.len(), 1);
        assert!(counts.accident.is_empty());
    }

    #[test]
    fn test_consumables_grouped_by_name() {
        let records = vec![
            record("2024-03-01", vec![], vec![
                ItemUsage::consumable("Trocar", "默认"),
                ItemUsage::consumable("Trocar", "默认"),
                ItemUsage::consumable("Clip", "Lost"),
            ]),
            record("2024-04-02", vec![], vec![ItemUsage::consumable("Trocar", "默认")]),
        ];

        let counts = count_details(&records, ItemCategory::Consumables);
        let summary: Vec<(&str, &str, u64)> = counts
            .normal
            .iter()
            .map(|c| (c.name.as_str(), c.month.as_str(), c.count))
            .collect();

        // 按名称排序，同名按月份
        assert_eq!(
            summary,
            vec![("Clip", "2024-03", 1), ("Trocar", "2024-03", 2), ("Trocar", "2024-04", 1)]
        );
        assert_eq!(counts.accident.len(), 1);
        assert_eq!(counts.accident[0].name, "Clip");
    }

    #[test]
    fn test_counts_sum_to_usage_events_and_accident_is_bounded() {
        let records = vec![
            record("2024-01-05", vec![
                ItemUsage::instrument(1, "Forceps", "默认"),
                ItemUsage::instrument(2, "Scissors", "Broken"),
            ], vec![]),
            record("2024-01-09", vec![
                ItemUsage::instrument(2, "Scissors", "Lost"),
                ItemUsage::instrument(2, "Scissors", "默认"),
            ], vec![]),
            record("2024-02-11", vec![ItemUsage::instrument(1, "Forceps", "Broken")], vec![]),
        ];

        let counts = count_details(&records, ItemCategory::Instruments);
        let total: u64 = counts.normal.iter().map(|c| c.count).sum();
        assert_eq!(total, 5);

        for accident in &counts.accident {
            let normal = counts
                .normal
                .iter()
                .find(|c| c.month == accident.month && c.id == accident.id)
                .expect("accident group must exist in normal counts");
            assert!(accident.count <= normal.count);
        }

        let scissors = counts
            .normal
            .iter()
            .find(|c| c.id == Some(2))
            .unwrap();
        assert_eq!(scissors.count, 3);
    }
}
