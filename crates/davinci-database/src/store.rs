//! 基于 PostgreSQL 的外部数据源实现

use async_trait::async_trait;
use davinci_core::{
    EntityCounter, EntityKind, Message, MessageSource, ReportWindow, Result, SurgeryFilter,
    SurgeryRecord, SurgerySource,
};

use crate::connection::DatabasePool;
use crate::queries::DatabaseQueries;

/// PostgreSQL 存储
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: DatabasePool,
}

impl PostgresStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn queries(&self) -> DatabaseQueries<'_> {
        DatabaseQueries::new(&self.pool)
    }

    /// 建表并返回存储
    pub async fn initialize(pool: DatabasePool) -> Result<Self> {
        let store = Self::new(pool);
        store.queries().create_tables().await?;
        Ok(store)
    }
}

#[async_trait]
impl SurgerySource for PostgresStore {
    async fn fetch_surgeries(
        &self,
        window: &ReportWindow,
        filter: &SurgeryFilter,
    ) -> Result<Vec<SurgeryRecord>> {
        let records = self.queries().get_surgeries_in_window(window, filter).await?;
        tracing::debug!("Fetched {} surgeries from database", records.len());
        Ok(records)
    }
}

#[async_trait]
impl MessageSource for PostgresStore {
    async fn fetch_messages(&self, window: &ReportWindow) -> Result<Vec<Message>> {
        self.queries().get_messages_in_window(window).await
    }
}

#[async_trait]
impl EntityCounter for PostgresStore {
    async fn count(&self, kind: EntityKind) -> Result<u64> {
        self.queries().count_entities(kind).await
    }
}
