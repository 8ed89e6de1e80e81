//! 内存存储
//!
//! 不依赖数据库的数据源实现，可从 JSON 种子文件加载，用于演示和测试。

use async_trait::async_trait;
use davinci_core::{
    EntityCounter, EntityKind, Message, MessageSource, ReportWindow, Result, SurgeryFilter,
    SurgeryRecord, SurgerySource,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

/// 种子文件格式
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub surgeries: Vec<SurgeryRecord>,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// 实体数量，手术数量未给出时取手术记录条数
    #[serde(default)]
    pub counts: HashMap<EntityKind, u64>,
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    surgeries: RwLock<Vec<SurgeryRecord>>,
    messages: RwLock<Vec<Message>>,
    entity_counts: RwLock<HashMap<EntityKind, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        Self {
            surgeries: RwLock::new(seed.surgeries),
            messages: RwLock::new(seed.messages),
            entity_counts: RwLock::new(seed.counts),
        }
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let seed: SeedData = serde_json::from_str(&content)?;
        tracing::info!(
            "Loaded {} surgeries and {} messages from {}",
            seed.surgeries.len(),
            seed.messages.len(),
            path.display()
        );
        Ok(Self::from_seed(seed))
    }

    pub fn with_surgeries(mut self, records: Vec<SurgeryRecord>) -> Self {
        self.surgeries.get_mut().extend(records);
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.get_mut().extend(messages);
        self
    }

    pub fn with_entity_count(mut self, kind: EntityKind, count: u64) -> Self {
        self.entity_counts.get_mut().insert(kind, count);
        self
    }
}

#[async_trait]
impl SurgerySource for MemoryStore {
    async fn fetch_surgeries(
        &self,
        window: &ReportWindow,
        filter: &SurgeryFilter,
    ) -> Result<Vec<SurgeryRecord>> {
        let surgeries = self.surgeries.read().await;

        let records = surgeries
            .iter()
            .filter(|record| match record.surgery_date() {
                Some(date) => window.contains_date(date),
                None => {
                    tracing::warn!("Skipping surgery with invalid date: {}", record.date);
                    false
                }
            })
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl MessageSource for MemoryStore {
    async fn fetch_messages(&self, window: &ReportWindow) -> Result<Vec<Message>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| window.contains(&m.insert_time))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EntityCounter for MemoryStore {
    async fn count(&self, kind: EntityKind) -> Result<u64> {
        if let Some(count) = self.entity_counts.read().await.get(&kind) {
            return Ok(*count);
        }

        let count = match kind {
            EntityKind::Surgeries => self.surgeries.read().await.len() as u64,
            _ => 0,
        };
        Ok(count)
    }
}
