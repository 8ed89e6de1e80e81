//! HTTP处理器

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{NaiveDate, NaiveDateTime};
use davinci_core::{ReportWindow, SurgeryError, SurgeryFilter};
use davinci_dashboard::{
    doctor_monthly_contribution, DailyContribution, DashboardPayload, GeneralStats, SurgeryBrief,
};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::server::AppState;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Davinci Admin API",
        "version": "1.0.0",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "dashboard": "/admin/get_surgery_dashboard",
            "doctor_contribution": "/admin/get_doctor_contribution",
            "general_data": "/admin/get_general_data"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": "1.0.0"
    }))
}

/// 接受 `2024-01-01T08:00:00`、`2024-01-01 08:00:00` 或 `2024-01-01`
fn deserialize_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map(Some)
        .map_err(|_| serde::de::Error::custom(format!("invalid datetime: {}", raw)))
}

/// 仪表盘请求参数
#[derive(Debug, Default, Deserialize)]
pub struct DashboardRequest {
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub begin_time: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub end_time: Option<NaiveDateTime>,
    pub department: Option<String>,
    pub s_name: Option<String>,
}

/// 医生贡献请求参数
#[derive(Debug, Deserialize)]
pub struct ContributionRequest {
    pub df: Vec<SurgeryBrief>,
    pub name: String,
}

/// 手术仪表盘处理器
pub async fn get_surgery_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DashboardRequest>,
) -> Result<Json<DashboardPayload>, ApiError> {
    info!("Getting surgery dashboard with request: {:?}", request);

    let window = ReportWindow::new(request.begin_time, request.end_time);
    let filter = SurgeryFilter {
        department: request.department,
        surgery_name: request.s_name,
    };
    let payload = state.dashboard.build_dashboard_filtered(window, &filter).await?;

    Ok(Json(payload))
}

/// 医生贡献处理器
pub async fn get_doctor_contribution(
    Json(request): Json<ContributionRequest>,
) -> Json<Vec<DailyContribution>> {
    info!(
        "Getting contribution of {} from {} records",
        request.name,
        request.df.len()
    );
    Json(doctor_monthly_contribution(&request.df, &request.name))
}

/// 概览统计处理器
pub async fn get_general_data(State(state): State<Arc<AppState>>) -> Result<Json<GeneralStats>, ApiError> {
    let stats = state.general.build_general_stats().await?;
    Ok(Json(stats))
}

/// 接口错误
#[derive(Debug)]
pub struct ApiError(pub SurgeryError);

impl From<SurgeryError> for ApiError {
    fn from(err: SurgeryError) -> Self {
        Self(err)
    }
}

/// 错误处理
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SurgeryError::NotFound(_) => StatusCode::NOT_FOUND,
            SurgeryError::Validation(_) => StatusCode::BAD_REQUEST,
            SurgeryError::PriceNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SurgeryError::Config(_)
            | SurgeryError::Database(_)
            | SurgeryError::Io(_)
            | SurgeryError::Serialization(_)
            | SurgeryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
