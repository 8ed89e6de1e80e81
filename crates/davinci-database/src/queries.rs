//! 数据库查询操作

use crate::connection::DatabasePool;
use crate::models::*;
use davinci_core::{EntityKind, Message, ReportWindow, Result, SurgeryError, SurgeryFilter, SurgeryRecord};
use sqlx::Row;

/// 数据库查询操作接口
pub struct DatabaseQueries<'a> {
    pool: &'a DatabasePool,
}

impl<'a> DatabaseQueries<'a> {
    pub fn new(pool: &'a DatabasePool) -> Self {
        Self { pool }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        // 手术表，器械/耗材明细以 JSONB 保存
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS surgeries (
                id BIGSERIAL PRIMARY KEY,
                p_name VARCHAR(255) NOT NULL,
                surgery_date DATE NOT NULL,
                admission_number VARCHAR(64) NOT NULL,
                department VARCHAR(128) NOT NULL,
                s_name VARCHAR(255) NOT NULL,
                chief_surgeon VARCHAR(128) NOT NULL,
                associate_surgeon VARCHAR(255) NOT NULL DEFAULT '',
                instrument_nurse TEXT NOT NULL DEFAULT '',
                circulating_nurse TEXT NOT NULL DEFAULT '',
                instruments TEXT NOT NULL DEFAULT '',
                consumables TEXT NOT NULL DEFAULT '',
                instruments_detail JSONB NOT NULL DEFAULT '[]',
                consumables_detail JSONB NOT NULL DEFAULT '[]',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| SurgeryError::Database(e.to_string()))?;

        // 消息表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS messages (
                m_id BIGSERIAL PRIMARY KEY,
                content TEXT NOT NULL DEFAULT '',
                priority INTEGER NOT NULL DEFAULT 0,
                status INTEGER NOT NULL DEFAULT 1,
                feedback TEXT,
                insert_time TIMESTAMP NOT NULL DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| SurgeryError::Database(e.to_string()))?;

        // 用户、器械、耗材表只用于计数
        for table in ["users", "instruments", "consumables"] {
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id BIGSERIAL PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    insert_time TIMESTAMP NOT NULL DEFAULT NOW()
                )",
                table
            );
            sqlx::query(&sql)
                .execute(pool)
                .await
                .map_err(|e| SurgeryError::Database(e.to_string()))?;
        }

        self.create_indexes().await?;

        tracing::info!("Database tables created successfully");
        Ok(())
    }

    /// 创建数据库索引
    async fn create_indexes(&self) -> Result<()> {
        let pool = self.pool.pool();

        let indexes = vec![
            "CREATE INDEX IF NOT EXISTS idx_surgeries_surgery_date ON surgeries(surgery_date)",
            "CREATE INDEX IF NOT EXISTS idx_surgeries_department ON surgeries(department)",
            "CREATE INDEX IF NOT EXISTS idx_surgeries_chief_surgeon ON surgeries(chief_surgeon)",
            "CREATE INDEX IF NOT EXISTS idx_messages_insert_time ON messages(insert_time)",
        ];

        for index_sql in indexes {
            sqlx::query(index_sql)
                .execute(pool)
                .await
                .map_err(|e| SurgeryError::Database(e.to_string()))?;
        }

        tracing::info!("Database indexes created successfully");
        Ok(())
    }

    // ========== 手术相关操作 ==========

    /// 查询时间窗口 [begin, end) 内的手术，按日期升序
    pub async fn get_surgeries_in_window(
        &self,
        window: &ReportWindow,
        filter: &SurgeryFilter,
    ) -> Result<Vec<SurgeryRecord>> {
        let pool = self.pool.pool();

        let results = sqlx::query_as::<_, DbSurgery>(r#"
            SELECT * FROM surgeries
            WHERE ($1::timestamp IS NULL OR surgery_date >= $1::timestamp)
              AND ($2::timestamp IS NULL OR surgery_date < $2::timestamp)
              AND ($3::text IS NULL OR department = $3)
              AND ($4::text IS NULL OR s_name = $4)
            ORDER BY surgery_date, id
        "#)
        .bind(window.begin)
        .bind(window.end)
        .bind(&filter.department)
        .bind(&filter.surgery_name)
        .fetch_all(pool)
        .await
        .map_err(|e| SurgeryError::Database(e.to_string()))?;

        Ok(results.into_iter().map(SurgeryRecord::from).collect())
    }

    // ========== 消息相关操作 ==========

    /// 查询时间窗口内的消息
    pub async fn get_messages_in_window(&self, window: &ReportWindow) -> Result<Vec<Message>> {
        let pool = self.pool.pool();

        let results = sqlx::query_as::<_, DbMessage>(r#"
            SELECT * FROM messages
            WHERE ($1::timestamp IS NULL OR insert_time >= $1)
              AND ($2::timestamp IS NULL OR insert_time < $2)
            ORDER BY insert_time
        "#)
        .bind(window.begin)
        .bind(window.end)
        .fetch_all(pool)
        .await
        .map_err(|e| SurgeryError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Message::from).collect())
    }

    // ========== 计数 ==========

    /// 统计实体总数
    pub async fn count_entities(&self, kind: EntityKind) -> Result<u64> {
        let pool = self.pool.pool();

        let sql = format!("SELECT COUNT(*) AS total FROM {}", kind.table_name());
        let total: i64 = sqlx::query(&sql)
            .fetch_one(pool)
            .await
            .map(|row| row.get("total"))
            .map_err(|e| SurgeryError::Database(e.to_string()))?;

        Ok(total.max(0) as u64)
    }
}
