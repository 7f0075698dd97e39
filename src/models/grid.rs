use serde::{Deserialize, Serialize};

/// 抽出元ドキュメント種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "EXCEL")]
    Excel,
}

/// グリッド抽出 (外部コラボレータ) が返すドキュメント全体
///
/// PDF ならページ単位、Excel ならシート単位。セル文字列は
/// そのまま受け取り、解釈は一切しない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentGrid {
    pub source: Source,
    #[serde(default)]
    pub pages: Vec<PageGrid>,
}

/// 1ページ / 1シート分のテーブル群
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGrid {
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default)]
    pub tables: Vec<TableGrid>,
}

/// 検出済みテーブル1つ。行は固定列数に揃えた nullable セル列。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableGrid {
    /// 「内1号」のような参照番号ラベル (検出された場合のみ)
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
}
