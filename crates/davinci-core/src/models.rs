//! 核心数据模型定义

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{deserialize_multi_value, month_of};

/// 器械/耗材正常使用时的描述
pub const DEFAULT_DESCRIPTION: &str = "默认";

/// 未处理消息的状态值
pub const MESSAGE_STATUS_UNHANDLED: i32 = 1;

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

/// 单次器械/耗材使用记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemUsage {
    /// 器械编号，耗材没有编号
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    /// "默认" 表示正常使用，其他值表示损坏、丢失等异常
    #[serde(default = "default_description")]
    pub description: String,
}

impl ItemUsage {
    pub fn instrument(id: i64, name: &str, description: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    pub fn consumable(name: &str, description: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    /// 是否为异常使用
    pub fn is_anomalous(&self) -> bool {
        self.description != DEFAULT_DESCRIPTION
    }
}

/// 使用项目类别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Instruments, // 器械，按编号区分
    Consumables, // 耗材，按名称区分
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemCategory::Instruments => write!(f, "instruments"),
            ItemCategory::Consumables => write!(f, "consumables"),
        }
    }
}

/// 手术记录
///
/// 由外部手术记录库提供，在一次统计请求内只读。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurgeryRecord {
    #[serde(rename = "p_name")]
    pub patient_name: String,
    /// 手术日期 YYYY-MM-DD
    pub date: String,
    pub admission_number: String,
    pub department: String,
    #[serde(rename = "s_name")]
    pub surgery_name: String,
    pub chief_surgeon: String,
    #[serde(default)]
    pub associate_surgeon: String,
    #[serde(rename = "instrument_nurse", default, deserialize_with = "deserialize_multi_value")]
    pub instrument_nurses: Vec<String>,
    #[serde(rename = "circulating_nurse", default, deserialize_with = "deserialize_multi_value")]
    pub circulating_nurses: Vec<String>,
    /// 逗号拼接的器械名称
    #[serde(default)]
    pub instruments: String,
    /// 逗号拼接的耗材名称
    #[serde(default)]
    pub consumables: String,
    #[serde(rename = "instruments_detail", default)]
    pub instrument_details: Vec<ItemUsage>,
    #[serde(rename = "consumables_detail", default)]
    pub consumable_details: Vec<ItemUsage>,
}

impl SurgeryRecord {
    /// 手术所在月份 YYYY-MM
    pub fn month(&self) -> &str {
        month_of(&self.date)
    }

    pub fn surgery_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    /// 按类别取使用明细
    pub fn usages(&self, category: ItemCategory) -> &[ItemUsage] {
        match category {
            ItemCategory::Instruments => &self.instrument_details,
            ItemCategory::Consumables => &self.consumable_details,
        }
    }
}

/// 消息箱中的消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub m_id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: i32,
    pub status: i32,
    #[serde(default)]
    pub feedback: Option<String>,
    pub insert_time: NaiveDateTime,
}

impl Message {
    pub fn is_unhandled(&self) -> bool {
        self.status == MESSAGE_STATUS_UNHANDLED
    }
}

/// 可计数的实体类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Users,
    Surgeries,
    Instruments,
    Consumables,
}

impl EntityKind {
    /// 对应的存储表名
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Surgeries => "surgeries",
            EntityKind::Instruments => "instruments",
            EntityKind::Consumables => "consumables",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// 统计时间窗口 [begin, end)
///
/// 任意一端为 `None` 时该端不设限制。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportWindow {
    pub begin: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl ReportWindow {
    pub fn new(begin: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { begin, end }
    }

    /// 截止到 `now` 的最近若干个月
    pub fn trailing_months(now: NaiveDateTime, months: u32) -> Self {
        let begin = now.checked_sub_months(Months::new(months)).unwrap_or(NaiveDateTime::MIN);
        Self {
            begin: Some(begin),
            end: Some(now),
        }
    }

    /// 本月一日零点到 `now`
    pub fn month_to_date(now: NaiveDateTime) -> Self {
        let first_day = now.date().with_day(1).unwrap_or(now.date());
        Self {
            begin: Some(first_day.and_time(NaiveTime::MIN)),
            end: Some(now),
        }
    }

    pub fn contains(&self, at: &NaiveDateTime) -> bool {
        self.begin.map_or(true, |begin| *at >= begin) && self.end.map_or(true, |end| *at < end)
    }

    /// 按日期零点判断是否落在窗口内
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(&date.and_time(NaiveTime::MIN))
    }
}

/// 手术记录附加过滤条件
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurgeryFilter {
    pub department: Option<String>,
    #[serde(rename = "s_name")]
    pub surgery_name: Option<String>,
}

impl SurgeryFilter {
    pub fn matches(&self, record: &SurgeryRecord) -> bool {
        self.department.as_ref().map_or(true, |d| *d == record.department)
            && self.surgery_name.as_ref().map_or(true, |s| *s == record.surgery_name)
    }
}
