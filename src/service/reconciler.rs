use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{
    DocumentGrid, LineItem, MatchResult, MatchStatus, ReconcileReport, ReconcileSummary,
};
use crate::service::normalizer::{normalize_key, normalize_unit};
use crate::service::similarity::SimilarityKind;
use crate::service::walker::{Extraction, TableWalker};

/// エンジン設定。リクエスト単位で上書きできる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// 指定時は既定の役割検出より優先される識別列のヘッダ名
    #[serde(default)]
    pub custom_item_name_column: Option<String>,
    /// ファジー一致を採用する最小確信度 [0,1]
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// 数量比較の許容誤差
    #[serde(default = "default_quantity_epsilon")]
    pub quantity_epsilon: BigDecimal,
    /// 類似度関数の選択
    #[serde(default)]
    pub similarity: SimilarityKind,
}

fn default_confidence_threshold() -> f64 {
    0.8
}

fn default_quantity_epsilon() -> BigDecimal {
    "0.001".parse().expect("static epsilon literal")
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            custom_item_name_column: None,
            confidence_threshold: default_confidence_threshold(),
            quantity_epsilon: default_quantity_epsilon(),
            similarity: SimilarityKind::default(),
        }
    }
}

/// 照合呼び出し全体を失敗させる唯一の条件
#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileError {
    /// 両ドキュメントとも抽出可能なテーブルが1つもない
    NoExtractableTables,
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::NoExtractableTables => {
                write!(f, "no extractable tables in either document")
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

/// 発注書 (PDF) と提案書 (Excel) の明細照合サービス
pub struct ReconcilerService {
    defaults: ReconcileConfig,
}

impl ReconcilerService {
    pub fn new(defaults: ReconcileConfig) -> Self {
        Self { defaults }
    }

    pub fn default_config(&self) -> ReconcileConfig {
        self.defaults.clone()
    }

    /// 1ドキュメント分のグリッドを明細項目に変換する
    pub fn extract(&self, grid: &DocumentGrid, config: &ReconcileConfig) -> Extraction {
        TableWalker::new(config.custom_item_name_column.clone()).walk(grid)
    }

    /// 両グリッドを抽出して照合レポートを作る
    ///
    /// 抽出は2ドキュメントで独立なので並列に走らせる (結果は
    /// 逐次実行と同一)。局所異常は診断記録に落とし、失敗するのは
    /// 両側ともテーブルが皆無のときだけ。
    pub fn reconcile_documents(
        &self,
        tender: &DocumentGrid,
        proposal: &DocumentGrid,
        config: &ReconcileConfig,
    ) -> Result<ReconcileReport, ReconcileError> {
        let (tender_extraction, proposal_extraction) =
            rayon::join(|| self.extract(tender, config), || self.extract(proposal, config));

        if tender_extraction.tables_seen == 0 && proposal_extraction.tables_seen == 0 {
            return Err(ReconcileError::NoExtractableTables);
        }

        info!(
            "Reconciling {} tender items against {} proposal items",
            tender_extraction.items.len(),
            proposal_extraction.items.len()
        );

        let results = self.reconcile(
            &tender_extraction.items,
            &proposal_extraction.items,
            config,
        );
        let summary = ReconcileSummary::tally(&results);
        info!(
            "照合完了: 一致 {} / 数量不一致 {} / 欠落 {} / 余剰 {}",
            summary.matched, summary.quantity_mismatches, summary.missing, summary.extra
        );

        Ok(ReconcileReport {
            summary,
            results,
            tender_diagnostics: tender_extraction.diagnostics,
            proposal_diagnostics: proposal_extraction.diagnostics,
            generated_at: chrono::Utc::now(),
        })
    }

    /// 照合本体。入力項目は一切変更しない (正規化キーは派生値)。
    ///
    /// 優先順: 完全一致+同一単位 → 完全一致 (単位不一致は別報告) →
    /// しきい値以上のファジー一致 (同点は提案書の出現順が先のもの) →
    /// MISSING。提案側項目の消費は高々1回。
    pub fn reconcile(
        &self,
        tender_items: &[LineItem],
        proposal_items: &[LineItem],
        config: &ReconcileConfig,
    ) -> Vec<MatchResult> {
        let scorer = config.similarity.scorer();

        let tender_keys: Vec<String> = tender_items
            .iter()
            .map(|i| normalize_key(&i.item_key))
            .collect();
        let proposal_keys: Vec<String> = proposal_items
            .iter()
            .map(|i| normalize_key(&i.item_key))
            .collect();
        let tender_units: Vec<Option<String>> = tender_items.iter().map(derived_unit).collect();
        let proposal_units: Vec<Option<String>> = proposal_items.iter().map(derived_unit).collect();

        // 正規化キー → 提案側項目番号 (出現順、キー重複あり得る)
        let mut key_index: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for (idx, key) in proposal_keys.iter().enumerate() {
            key_index.entry(key.as_str()).or_default().push(idx);
        }

        let mut consumed = vec![false; proposal_items.len()];
        let mut results = Vec::with_capacity(tender_items.len() + proposal_items.len());

        for (t_idx, tender) in tender_items.iter().enumerate() {
            let t_key = tender_keys[t_idx].as_str();
            let t_unit = &tender_units[t_idx];

            let matched = self
                .exact_match(t_key, t_unit, &key_index, &proposal_units, &consumed)
                .map(|(p_idx, unit_mismatch)| (p_idx, 1.0, unit_mismatch))
                .or_else(|| {
                    self.fuzzy_match(
                        t_key,
                        &proposal_keys,
                        &consumed,
                        scorer.as_ref(),
                        config.confidence_threshold,
                    )
                    .map(|(p_idx, score)| {
                        let unit_mismatch = tender_units[t_idx] != proposal_units[p_idx];
                        (p_idx, score, unit_mismatch)
                    })
                });

            match matched {
                Some((p_idx, confidence, unit_mismatch)) => {
                    consumed[p_idx] = true;
                    let proposal = &proposal_items[p_idx];
                    let (status, quantity_difference) = compare_quantities(
                        &tender.quantity,
                        &proposal.quantity,
                        &config.quantity_epsilon,
                    );
                    results.push(MatchResult {
                        status,
                        confidence,
                        tender_item: Some(tender.clone()),
                        proposal_item: Some(proposal.clone()),
                        quantity_difference,
                        unit_mismatch,
                    });
                }
                None => results.push(MatchResult {
                    status: MatchStatus::Missing,
                    confidence: 0.0,
                    tender_item: Some(tender.clone()),
                    proposal_item: None,
                    quantity_difference: None,
                    unit_mismatch: false,
                }),
            }
        }

        // 一度も消費されなかった提案側項目は余剰
        for (p_idx, proposal) in proposal_items.iter().enumerate() {
            if !consumed[p_idx] {
                results.push(MatchResult {
                    status: MatchStatus::Extra,
                    confidence: 0.0,
                    tender_item: None,
                    proposal_item: Some(proposal.clone()),
                    quantity_difference: None,
                    unit_mismatch: false,
                });
            }
        }

        results
    }

    /// 完全一致候補から未消費のものを選ぶ。同一単位の候補を優先。
    fn exact_match(
        &self,
        t_key: &str,
        t_unit: &Option<String>,
        key_index: &IndexMap<&str, Vec<usize>>,
        proposal_units: &[Option<String>],
        consumed: &[bool],
    ) -> Option<(usize, bool)> {
        let candidates = key_index.get(t_key)?;
        let available = || candidates.iter().copied().filter(|&i| !consumed[i]);

        if let Some(p_idx) = available().find(|&i| proposal_units[i] == *t_unit) {
            return Some((p_idx, false));
        }
        available().next().map(|p_idx| (p_idx, true))
    }

    /// 未消費の提案側項目全体からしきい値以上の最良スコアを選ぶ
    fn fuzzy_match(
        &self,
        t_key: &str,
        proposal_keys: &[String],
        consumed: &[bool],
        scorer: &dyn crate::service::similarity::SimilarityScorer,
        threshold: f64,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (p_idx, p_key) in proposal_keys.iter().enumerate() {
            if consumed[p_idx] {
                continue;
            }
            let score = scorer.score(t_key, p_key);
            if score < threshold {
                continue;
            }
            // 同点は先に現れた候補を保持
            if best.map(|(_, b)| score > b).unwrap_or(true) {
                best = Some((p_idx, score));
            }
        }
        best
    }
}

fn derived_unit(item: &LineItem) -> Option<String> {
    item.unit
        .as_deref()
        .map(normalize_unit)
        .filter(|u| !u.is_empty())
}

/// 数量比較。欠損 (None) は有効値で、存在する値とは常に不一致。
/// 差分は QUANTITY_MISMATCH かつ両側に数量がある場合のみ入る。
fn compare_quantities(
    tender: &Option<BigDecimal>,
    proposal: &Option<BigDecimal>,
    epsilon: &BigDecimal,
) -> (MatchStatus, Option<BigDecimal>) {
    match (tender, proposal) {
        (None, None) => (MatchStatus::Matched, None),
        (Some(t), Some(p)) => {
            let diff = p - t;
            if diff.abs() <= *epsilon {
                (MatchStatus::Matched, None)
            } else {
                (MatchStatus::QuantityMismatch, Some(diff))
            }
        }
        _ => (MatchStatus::QuantityMismatch, None),
    }
}
