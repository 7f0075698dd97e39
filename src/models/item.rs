use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::grid::Source;

/// 項目キーの結合デリミタ
pub const KEY_DELIMITER: &str = "|";

/// 1行から抽出した役割別フィールド
///
/// 識別系 (custom/category/subcategory/detail/item_name/specification)
/// は trim 済みの原文、unit は正規化済み、quantity は数値化済み。
/// 数量 0 は「数量なし (None)」と区別して保持する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl FieldSet {
    /// 識別フィールドを優先順 (custom → 区分 → 工種系 → 名称 → 規格) で返す
    pub fn identifying_parts(&self) -> Vec<&str> {
        [
            &self.custom,
            &self.category,
            &self.subcategory,
            &self.detail,
            &self.item_name,
            &self.specification,
        ]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .filter(|s| !s.is_empty())
        .collect()
    }

    pub fn has_identifying_text(&self) -> bool {
        !self.identifying_parts().is_empty()
    }

    /// 識別フィールドを `|` で結合して項目キーを作る。空なら空文字列。
    pub fn build_key(&self) -> String {
        self.identifying_parts().join(KEY_DELIMITER)
    }
}

/// 項目の出所 (ページ番号 / シート名 / 参照番号)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
}

/// 照合単位となる明細項目
///
/// 不変条件: `item_key` は常に非空。テーブル走査が次の項目に
/// 進んだ後は変更されない (数量継続行の加算は直前の項目のみ)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_key: String,
    pub quantity: Option<BigDecimal>,
    pub unit: Option<String>,
    pub raw_fields: FieldSet,
    pub source: Source,
    pub provenance: Provenance,
}
