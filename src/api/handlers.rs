use crate::models::{DocumentGrid, LineItem, ReconcileReport, RowDiagnostic};
use crate::service::{report, ReconcileConfig, ReconcileError, ReconcilerService};
use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// リクエスト体: 両ドキュメントの抽出済みグリッド
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub tender: DocumentGrid,
    pub proposal: DocumentGrid,
    /// 省略時はサーバー既定値
    #[serde(default)]
    pub config: Option<ReconcileConfig>,
}

/// リクエスト体: 1ドキュメントの抽出確認用
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub document: DocumentGrid,
    #[serde(default)]
    pub config: Option<ReconcileConfig>,
}

/// レスポンス体
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReconcileReport>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub message: String,
    pub items: Vec<LineItem>,
    pub diagnostics: Vec<RowDiagnostic>,
    pub tables_seen: usize,
}

/// ヘルスチェック
pub async fn health_check() -> &'static str {
    "OK"
}

/// 1ドキュメントだけ抽出して項目と診断記録を返す (抽出デバッグ用)
pub async fn extract(
    State(service): State<Arc<ReconcilerService>>,
    Json(req): Json<ExtractRequest>,
) -> Response {
    let config = req.config.unwrap_or_else(|| service.default_config());
    let extraction = service.extract(&req.document, &config);
    let response = ExtractResponse {
        success: true,
        message: format!(
            "Extracted {} items from {} tables",
            extraction.items.len(),
            extraction.tables_seen
        ),
        items: extraction.items,
        diagnostics: extraction.diagnostics,
        tables_seen: extraction.tables_seen,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 発注書と提案書の照合
pub async fn reconcile(
    State(service): State<Arc<ReconcilerService>>,
    Json(req): Json<ReconcileRequest>,
) -> Response {
    let config = req.config.unwrap_or_else(|| service.default_config());
    match service.reconcile_documents(&req.tender, &req.proposal, &config) {
        Ok(report) => {
            let response = ReconcileResponse {
                success: true,
                message: format!(
                    "Compared {} items: {} matched, {} mismatched, {} missing, {} extra",
                    report.summary.total_items,
                    report.summary.matched,
                    report.summary.quantity_mismatches,
                    report.summary.missing,
                    report.summary.extra
                ),
                report: Some(report),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => reconcile_error(e),
    }
}

/// 照合結果を CSV でダウンロードする
pub async fn reconcile_csv(
    State(service): State<Arc<ReconcilerService>>,
    Json(req): Json<ReconcileRequest>,
) -> Response {
    let config = req.config.unwrap_or_else(|| service.default_config());
    match service.reconcile_documents(&req.tender, &req.proposal, &config) {
        Ok(report) => match report::render_csv(&report) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                let response = ReconcileResponse {
                    success: false,
                    message: format!("Error: {}", e),
                    report: None,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
            }
        },
        Err(e) => reconcile_error(e),
    }
}

fn reconcile_error(e: ReconcileError) -> Response {
    let response = ReconcileResponse {
        success: false,
        message: format!("Error: {}", e),
        report: None,
    };
    // 抽出可能なテーブルが皆無なのは入力データの問題
    (StatusCode::UNPROCESSABLE_ENTITY, Json(response)).into_response()
}
