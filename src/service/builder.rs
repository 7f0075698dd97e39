use bigdecimal::{BigDecimal, Zero};

use crate::models::{LineItem, Provenance, SkipReason, Source};
use crate::service::classifier::RowOutcome;

/// 1行処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildAction {
    NewItem,
    Merged,
    Skipped(SkipReason),
}

/// 分類済み行から明細項目を組み立てる
///
/// 「直前に作った項目」への数量継続行のマージがあるため逐次処理。
/// 行またぎのマージはテーブル境界を越えないので、Builder は
/// テーブルごとに作り直す (状態は常にこの値の中だけに閉じる)。
pub struct ItemBuilder {
    source: Source,
    provenance: Provenance,
    items: Vec<LineItem>,
}

impl ItemBuilder {
    pub fn new(source: Source, provenance: Provenance) -> Self {
        Self {
            source,
            provenance,
            items: Vec::new(),
        }
    }

    /// 行順に1回ずつ呼ぶ
    pub fn process(&mut self, outcome: RowOutcome) -> BuildAction {
        match outcome {
            RowOutcome::Empty(reason) => BuildAction::Skipped(reason),
            RowOutcome::QuantityOnly(fields) => {
                let Some(last) = self.items.last_mut() else {
                    // マージ先がない数量行は方針としてスキップ (エラーにしない)
                    return BuildAction::Skipped(SkipReason::OrphanQuantity);
                };
                let addend = fields.quantity.clone().unwrap_or_else(BigDecimal::zero);
                let base = last.quantity.take().unwrap_or_else(BigDecimal::zero);
                last.quantity = Some(base + addend);
                if last.unit.is_none() {
                    last.unit = fields.unit.clone();
                }
                BuildAction::Merged
            }
            RowOutcome::Item(fields) => {
                let item_key = fields.build_key();
                if item_key.is_empty() {
                    // 分類側をすり抜けてもキーが作れない行は項目にしない
                    return BuildAction::Skipped(SkipReason::EmptyItemKey);
                }
                self.items.push(LineItem {
                    item_key,
                    quantity: fields.quantity.clone(),
                    unit: fields.unit.clone(),
                    raw_fields: fields,
                    source: self.source,
                    provenance: self.provenance.clone(),
                });
                BuildAction::NewItem
            }
        }
    }

    pub fn finish(self) -> Vec<LineItem> {
        self.items
    }
}
