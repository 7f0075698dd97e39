use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::LineItem;

/// 照合ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Matched,
    QuantityMismatch,
    Missing,
    Extra,
}

/// 発注側1項目 (または未消費の提案側1項目) ごとの照合結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub status: MatchStatus,
    /// ファジー一致の確信度 [0,1]。完全一致は 1.0、MISSING/EXTRA は 0.0。
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tender_item: Option<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_item: Option<LineItem>,
    /// QUANTITY_MISMATCH のみ: 提案数量 - 発注数量
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_difference: Option<BigDecimal>,
    /// 単位不一致は数量不一致と直交するシグナルとして別立てで報告する
    #[serde(default)]
    pub unit_mismatch: bool,
}

/// ステータス集計
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub total_items: usize,
    pub matched: usize,
    pub quantity_mismatches: usize,
    pub missing: usize,
    pub extra: usize,
    pub unit_mismatches: usize,
}

impl ReconcileSummary {
    pub fn tally(results: &[MatchResult]) -> Self {
        let mut summary = Self {
            total_items: results.len(),
            ..Self::default()
        };
        for r in results {
            match r.status {
                MatchStatus::Matched => summary.matched += 1,
                MatchStatus::QuantityMismatch => summary.quantity_mismatches += 1,
                MatchStatus::Missing => summary.missing += 1,
                MatchStatus::Extra => summary.extra += 1,
            }
            if r.unit_mismatch {
                summary.unit_mismatches += 1;
            }
        }
        summary
    }
}

/// 行・テーブル単位でスキップした理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyRow,
    NoIdentifyingFields,
    TotalRow,
    EmptyItemKey,
    OrphanQuantity,
    NoHeader,
}

/// 復旧済みの局所異常の記録。成功パスには影響しない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDiagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    pub table_index: usize,
    /// テーブル内の1始まり行番号。テーブル全体のスキップは None。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    pub reason: SkipReason,
}

/// 照合レポート全体 (結果 + 集計 + 両側の診断記録)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub summary: ReconcileSummary,
    pub results: Vec<MatchResult>,
    pub tender_diagnostics: Vec<RowDiagnostic>,
    pub proposal_diagnostics: Vec<RowDiagnostic>,
    pub generated_at: DateTime<Utc>,
}
