//! 通用工具函数

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};

/// 拆分逗号拼接的多值字段
///
/// 每一项去掉首尾空白，空项被丢弃。
pub fn split_multi_value(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MultiValue {
    Joined(String),
    List(Vec<String>),
}

/// 多值字段既可以是逗号拼接的字符串，也可以是字符串数组
pub fn deserialize_multi_value<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<MultiValue>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(MultiValue::Joined(joined)) => split_multi_value(&joined),
        Some(MultiValue::List(items)) => items.iter().flat_map(|s| split_multi_value(s)).collect(),
    };
    Ok(values)
}

/// 日期字符串的前7位，即 YYYY-MM
pub fn month_of(date: &str) -> &str {
    date.get(..7).unwrap_or(date)
}

/// 金额保留两位小数（四舍五入）
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}
