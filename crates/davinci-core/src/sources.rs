//! 外部数据源接口
//!
//! 仪表盘统计只依赖以下几个外部协作者：
//! - 手术记录库：按时间窗口查询手术记录
//! - 消息箱：按时间窗口查询消息
//! - 实体计数：用户、手术、器械、耗材的总数
//! - 价格表：项目名称到单价的静态映射

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::Result;
use crate::models::{EntityKind, Message, ReportWindow, SurgeryFilter, SurgeryRecord};

/// 手术记录库
#[async_trait]
pub trait SurgerySource: Send + Sync {
    /// 查询时间窗口内的手术记录
    async fn fetch_surgeries(
        &self,
        window: &ReportWindow,
        filter: &SurgeryFilter,
    ) -> Result<Vec<SurgeryRecord>>;
}

/// 消息箱
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch_messages(&self, window: &ReportWindow) -> Result<Vec<Message>>;
}

/// 实体计数
#[async_trait]
pub trait EntityCounter: Send + Sync {
    async fn count(&self, kind: EntityKind) -> Result<u64>;

    /// 一次取回所有实体的数量
    async fn count_all(&self) -> Result<HashMap<EntityKind, u64>> {
        let mut counts = HashMap::new();
        for kind in [
            EntityKind::Users,
            EntityKind::Surgeries,
            EntityKind::Instruments,
            EntityKind::Consumables,
        ] {
            counts.insert(kind, self.count(kind).await?);
        }
        Ok(counts)
    }
}

/// 价格查询
///
/// 未知项目必须返回 [`SurgeryError::PriceNotFound`](crate::SurgeryError::PriceNotFound)。
pub trait PriceLookup: Send + Sync {
    fn lookup_price(&self, item_name: &str) -> Result<Decimal>;
}
