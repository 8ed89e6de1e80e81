//! 数据库模型

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use davinci_core::utils::split_multi_value;
use davinci_core::{ItemUsage, Message, SurgeryRecord};
use sqlx::types::Json;
use sqlx::FromRow;

// 数据库表模型 - 使用FromRow trait用于SQL查询

/// 数据库手术表
#[derive(Debug, FromRow)]
pub struct DbSurgery {
    pub id: i64,
    pub p_name: String,
    pub surgery_date: NaiveDate,
    pub admission_number: String,
    pub department: String,
    pub s_name: String,
    pub chief_surgeon: String,
    pub associate_surgeon: String,
    pub instrument_nurse: String, // 逗号拼接
    pub circulating_nurse: String, // 逗号拼接
    pub instruments: String,
    pub consumables: String,
    pub instruments_detail: Json<Vec<ItemUsage>>,
    pub consumables_detail: Json<Vec<ItemUsage>>,
    pub created_at: DateTime<Utc>,
}

impl From<DbSurgery> for SurgeryRecord {
    fn from(db_surgery: DbSurgery) -> Self {
        SurgeryRecord {
            patient_name: db_surgery.p_name,
            date: db_surgery.surgery_date.format("%Y-%m-%d").to_string(),
            admission_number: db_surgery.admission_number,
            department: db_surgery.department,
            surgery_name: db_surgery.s_name,
            chief_surgeon: db_surgery.chief_surgeon,
            associate_surgeon: db_surgery.associate_surgeon,
            instrument_nurses: split_multi_value(&db_surgery.instrument_nurse),
            circulating_nurses: split_multi_value(&db_surgery.circulating_nurse),
            instruments: db_surgery.instruments,
            consumables: db_surgery.consumables,
            instrument_details: db_surgery.instruments_detail.0,
            consumable_details: db_surgery.consumables_detail.0,
        }
    }
}

/// 数据库消息表
#[derive(Debug, FromRow)]
pub struct DbMessage {
    pub m_id: i64,
    pub content: String,
    pub priority: i32,
    pub status: i32,
    pub feedback: Option<String>,
    pub insert_time: NaiveDateTime,
}

impl From<DbMessage> for Message {
    fn from(db_message: DbMessage) -> Self {
        Message {
            m_id: db_message.m_id,
            content: db_message.content,
            priority: db_message.priority,
            status: db_message.status,
            feedback: db_message.feedback,
            insert_time: db_message.insert_time,
        }
    }
}
