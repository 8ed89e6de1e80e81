//! 价格表
//!
//! 项目名称到单价的只读映射，进程启动时加载一次。

use davinci_core::{PriceLookup, Result, SurgeryError};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;

/// 静态价格表
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    prices: HashMap<String, Decimal>,
}

impl PriceTable {
    pub fn new(prices: HashMap<String, Decimal>) -> Self {
        Self { prices }
    }

    /// 从 JSON 对象加载，例如 `{"持针器": 1200.5, "套管": 80}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, serde_json::Number> = serde_json::from_str(json)?;

        let mut prices = HashMap::with_capacity(raw.len());
        for (name, number) in raw {
            let price = number.to_string().parse::<Decimal>().map_err(|e| {
                SurgeryError::Validation(format!("Invalid price for {}: {} ({})", name, number, e))
            })?;
            prices.insert(name, price);
        }

        Ok(Self { prices })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)?;
        tracing::info!("Loaded {} prices from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, Decimal)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

impl PriceLookup for PriceTable {
    fn lookup_price(&self, item_name: &str) -> Result<Decimal> {
        self.prices
            .get(item_name)
            .copied()
            .ok_or_else(|| SurgeryError::PriceNotFound(item_name.to_string()))
    }
}
