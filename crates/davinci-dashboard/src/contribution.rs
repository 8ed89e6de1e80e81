//! 医生、科室、护士贡献统计

use davinci_core::SurgeryRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 精简的手术记录，供前端按医生查看贡献
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurgeryBrief {
    pub chief_surgeon: String,
    pub date: String,
    pub p_name: String,
}

impl From<&SurgeryRecord> for SurgeryBrief {
    fn from(record: &SurgeryRecord) -> Self {
        Self {
            chief_surgeon: record.chief_surgeon.clone(),
            date: record.date.clone(),
            p_name: record.patient_name.clone(),
        }
    }
}

/// 医生在某一天的手术数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyContribution {
    pub date: String,
    pub count: u64,
}

/// 主刀医生手术数，附带所在科室总数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurgeonCount {
    pub department: String,
    pub chief_surgeon: String,
    pub c_count: u64,
    pub d_count: u64,
}

/// 科室手术数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepartmentCount {
    pub name: String,
    pub value: u64,
}

/// 护士参与次数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NurseCount {
    pub name: String,
    pub count_circulate: u64,
    pub count_instrument: u64,
    pub sum: u64,
}

/// 排名，序列化为 `[[手术数...], [医生...]]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopTen(pub Vec<u64>, pub Vec<String>);

impl TopTen {
    pub fn counts(&self) -> &[u64] {
        &self.0
    }

    pub fn names(&self) -> &[String] {
        &self.1
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 指定医生每天的主刀手术数，按日期升序
pub fn doctor_monthly_contribution(records: &[SurgeryBrief], surgeon: &str) -> Vec<DailyContribution> {
    let mut by_date: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.chief_surgeon == surgeon) {
        *by_date.entry(record.date.as_str()).or_insert(0) += 1;
    }

    by_date
        .into_iter()
        .map(|(date, count)| DailyContribution {
            date: date.to_string(),
            count,
        })
        .collect()
}

/// 按 (科室, 主刀医生) 统计手术数
pub fn surgeon_counts(records: &[SurgeryRecord]) -> Vec<SurgeonCount> {
    let mut by_surgeon: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    let mut by_department: BTreeMap<&str, u64> = BTreeMap::new();

    for record in records {
        *by_surgeon
            .entry((record.department.as_str(), record.chief_surgeon.as_str()))
            .or_insert(0) += 1;
        *by_department.entry(record.department.as_str()).or_insert(0) += 1;
    }

    by_surgeon
        .into_iter()
        .map(|((department, surgeon), count)| SurgeonCount {
            department: department.to_string(),
            chief_surgeon: surgeon.to_string(),
            c_count: count,
            d_count: by_department.get(department).copied().unwrap_or(0),
        })
        .collect()
}

/// 从医生统计中汇总科室手术数
pub fn department_counts(surgeons: &[SurgeonCount]) -> Vec<DepartmentCount> {
    let mut by_department: BTreeMap<&str, u64> = BTreeMap::new();
    for surgeon in surgeons {
        *by_department.entry(surgeon.department.as_str()).or_insert(0) += surgeon.c_count;
    }

    by_department
        .into_iter()
        .map(|(name, value)| DepartmentCount {
            name: name.to_string(),
            value,
        })
        .collect()
}

/// 统计每位护士担任巡回护士和器械护士的次数
pub fn nurse_counts(records: &[SurgeryRecord]) -> Vec<NurseCount> {
    // name -> (巡回, 器械)
    let mut by_nurse: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

    for record in records {
        for nurse in record.circulating_nurses.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            by_nurse.entry(nurse).or_insert((0, 0)).0 += 1;
        }
        for nurse in record.instrument_nurses.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            by_nurse.entry(nurse).or_insert((0, 0)).1 += 1;
        }
    }

    by_nurse
        .into_iter()
        .map(|(name, (circulate, instrument))| NurseCount {
            name: name.to_string(),
            count_circulate: circulate,
            count_instrument: instrument,
            sum: circulate + instrument,
        })
        .collect()
}

/// 按手术数升序取前 `limit` 位医生
///
/// 升序意味着手术最少的医生排在前面；同数时保持 (科室, 医生) 顺序。
pub fn top_surgeons(surgeons: &[SurgeonCount], limit: usize) -> TopTen {
    let mut ranked: Vec<&SurgeonCount> = surgeons.iter().collect();
    ranked.sort_by_key(|s| s.c_count);
    ranked.truncate(limit);

    TopTen(
        ranked.iter().map(|s| s.c_count).collect(),
        ranked.iter().map(|s| s.chief_surgeon.clone()).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(department: &str, surgeon: &str, circulating: &[&str], instrument: &[&str]) -> SurgeryRecord {
        SurgeryRecord {
            patient_name: "患者".to_string(),
            date: "2024-03-15".to_string(),
            admission_number: "A001".to_string(),
            department: department.to_string(),
            surgery_name: "手术".to_string(),
            chief_surgeon: surgeon.to_string(),
            associate_surgeon: String::new(),
            instrument_nurses: instrument.iter().map(|s| s.to_string()).collect(),
            circulating_nurses: circulating.iter().map(|s| s.to_string()).collect(),
            instruments: String::new(),
            consumables: String::new(),
            instrument_details: vec![],
            consumable_details: vec![],
        }
    }

    fn brief(surgeon: &str, date: &str) -> SurgeryBrief {
        SurgeryBrief {
            chief_surgeon: surgeon.to_string(),
            date: date.to_string(),
            p_name: "患者".to_string(),
        }
    }

    #[test]
    fn test_surgeon_and_department_counts() {
        let records = vec![
            record("普外科", "王医生", &[], &[]),
            record("普外科", "王医生", &[], &[]),
            record("普外科", "李医生", &[], &[]),
            record("泌尿外科", "赵医生", &[], &[]),
        ];

        let surgeons = surgeon_counts(&records);
        assert_eq!(surgeons.len(), 3);
        let wang = surgeons.iter().find(|s| s.chief_surgeon == "王医生").unwrap();
        assert_eq!(wang.c_count, 2);
        assert_eq!(wang.d_count, 3);

        let departments = department_counts(&surgeons);
        let total: u64 = departments.iter().map(|d| d.value).sum();
        assert_eq!(total, 4);
        assert!(departments.contains(&DepartmentCount {
            name: "泌尿外科".to_string(),
            value: 1
        }));
    }

    #[test]
    fn test_nurse_counts_outer_join() {
        let records = vec![
            record("普外科", "王医生", &["周护士"], &["李护士", "赵护士"]),
            record("普外科", "王医生", &["李护士"], &["赵护士", ""]),
        ];

        let nurses = nurse_counts(&records);
        let summary: Vec<(&str, u64, u64, u64)> = nurses
            .iter()
            .map(|n| (n.name.as_str(), n.count_circulate, n.count_instrument, n.sum))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("周护士", 1, 0, 1),
                ("李护士", 1, 1, 2),
                ("赵护士", 0, 2, 2),
            ]
        );
    }

    #[test]
    fn test_top_surgeons_ascending_and_bounded() {
        let mut records = Vec::new();
        for i in 0..12u64 {
            for _ in 0..=i {
                records.push(record("普外科", &format!("医生{:02}", i), &[], &[]));
            }
        }

        let surgeons = surgeon_counts(&records);
        let top = top_surgeons(&surgeons, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top.counts(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(top.names()[0], "医生00");

        let few = top_surgeons(&surgeons[..3], 10);
        assert_eq!(few.len(), 3);
        assert!(few.counts().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_top_ten_serializes_as_parallel_arrays() {
        let top = TopTen(vec![1, 2], vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_value(&top).unwrap();
        assert_eq!(json, serde_json::json!([[1, 2], ["a", "b"]]));
    }

    #[test]
    fn test_doctor_contribution_by_date() {
        let records = vec![
            brief("王医生", "2024-03-02"),
            brief("李医生", "2024-03-01"),
            brief("王医生", "2024-03-01"),
            brief("王医生", "2024-03-02"),
        ];

        let contribution = doctor_monthly_contribution(&records, "王医生");
        assert_eq!(
            contribution,
            vec![
                DailyContribution { date: "2024-03-01".to_string(), count: 1 },
                DailyContribution { date: "2024-03-02".to_string(), count: 2 },
            ]
        );
        assert!(doctor_monthly_contribution(&records, "赵医生").is_empty());
    }
}
