use tracing::{debug, warn};

use crate::models::{
    DocumentGrid, LineItem, PageGrid, Provenance, RowDiagnostic, SkipReason, TableGrid,
};
use crate::service::builder::{BuildAction, ItemBuilder};
use crate::service::classifier::{classify, ColumnRoleMap, RawRow};

/// ヘッダ行を探す範囲 (テーブル先頭からの行数)
const HEADER_SCAN_LIMIT: usize = 10;

/// 1ドキュメント分の抽出結果
#[derive(Debug, Default)]
pub struct Extraction {
    pub items: Vec<LineItem>,
    pub diagnostics: Vec<RowDiagnostic>,
    /// ヘッダ検出の成否に関わらず走査対象になったテーブル数
    pub tables_seen: usize,
}

/// ページ/シート → テーブル → 行 の単一パス走査
///
/// テーブルごとにヘッダから役割マップを作り、残り行を
/// Classifier → Builder に流す。マージ状態はテーブル境界で
/// 必ずリセットされる (Builder をテーブルごとに作るため)。
pub struct TableWalker {
    custom_column: Option<String>,
}

impl TableWalker {
    pub fn new(custom_column: Option<String>) -> Self {
        Self {
            custom_column: custom_column.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn walk(&self, grid: &DocumentGrid) -> Extraction {
        let mut extraction = Extraction::default();
        for page in &grid.pages {
            for (table_index, table) in page.tables.iter().enumerate() {
                extraction.tables_seen += 1;
                self.walk_table(grid, page, table, table_index, &mut extraction);
            }
        }
        debug!(
            "Extracted {} items from {} tables ({} rows skipped)",
            extraction.items.len(),
            extraction.tables_seen,
            extraction.diagnostics.len()
        );
        extraction
    }

    fn walk_table(
        &self,
        grid: &DocumentGrid,
        page: &PageGrid,
        table: &TableGrid,
        table_index: usize,
        out: &mut Extraction,
    ) {
        let Some((roles, header_index)) = self.find_header(table) else {
            warn!(
                "No detectable header in table {} ({}), skipping table",
                table_index,
                page_label(page)
            );
            out.diagnostics
                .push(diagnostic(page, table_index, None, SkipReason::NoHeader));
            return;
        };

        let provenance = Provenance {
            page_number: page.page_number,
            sheet_name: page.sheet_name.clone(),
            reference_number: table.reference_number.clone(),
        };
        let mut builder = ItemBuilder::new(grid.source, provenance);

        for (offset, cells) in table.rows.iter().enumerate().skip(header_index + 1) {
            let row = RawRow {
                cells,
                row_index: offset + 1,
            };
            let outcome = classify(&row, &roles);
            if let BuildAction::Skipped(reason) = builder.process(outcome) {
                out.diagnostics.push(diagnostic(
                    page,
                    table_index,
                    Some(row.row_index),
                    reason,
                ));
            }
        }

        out.items.extend(builder.finish());
    }

    /// 先頭数行から、役割を1つ以上解決できる最初の行をヘッダとする
    fn find_header(&self, table: &TableGrid) -> Option<(ColumnRoleMap, usize)> {
        table
            .rows
            .iter()
            .take(HEADER_SCAN_LIMIT)
            .enumerate()
            .find_map(|(idx, row)| {
                ColumnRoleMap::from_header(row, self.custom_column.as_deref())
                    .map(|roles| (roles, idx))
            })
    }
}

fn page_label(page: &PageGrid) -> String {
    match (&page.sheet_name, page.page_number) {
        (Some(sheet), _) => format!("sheet {}", sheet),
        (None, Some(num)) => format!("page {}", num),
        (None, None) => "unknown location".to_string(),
    }
}

fn diagnostic(
    page: &PageGrid,
    table_index: usize,
    row_index: Option<usize>,
    reason: SkipReason,
) -> RowDiagnostic {
    RowDiagnostic {
        page_number: page.page_number,
        sheet_name: page.sheet_name.clone(),
        table_index,
        row_index,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn row(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    None
                } else {
                    Some((*v).to_string())
                }
            })
            .collect()
    }

    fn pdf_grid(rows: Vec<Vec<Option<String>>>) -> DocumentGrid {
        DocumentGrid {
            source: Source::Pdf,
            pages: vec![PageGrid {
                page_number: Some(1),
                sheet_name: None,
                tables: vec![TableGrid {
                    reference_number: None,
                    rows,
                }],
            }],
        }
    }

    fn header() -> Vec<Option<String>> {
        row(&["工種", "種別", "細別", "数量", "単位"])
    }

    #[test]
    fn row_spanning_merges_across_an_empty_row() {
        let grid = pdf_grid(vec![
            header(),
            row(&["土工", "掘削", "土砂掘削", "10.0", "m3"]),
            row(&["", "", "", "", ""]),
            row(&["", "", "", "5.0", ""]),
            row(&["舗装", "基礎", "路盤工", "3.0", "m2"]),
        ]);

        let extraction = TableWalker::new(None).walk(&grid);
        assert_eq!(extraction.items.len(), 2);
        assert_eq!(extraction.items[0].item_key, "土工|掘削|土砂掘削");
        assert_eq!(extraction.items[0].quantity, Some("15.0".parse().unwrap()));
        assert_eq!(extraction.items[1].item_key, "舗装|基礎|路盤工");
        assert_eq!(extraction.items[1].quantity, Some("3.0".parse().unwrap()));
    }

    #[test]
    fn inserting_a_blank_row_changes_nothing() {
        let base = vec![
            header(),
            row(&["土工", "掘削", "土砂掘削", "10.0", "m3"]),
            row(&["舗装", "基礎", "路盤工", "3.0", "m2"]),
        ];
        let mut padded = base.clone();
        padded.insert(2, row(&["", "", "", "", ""]));

        let without = TableWalker::new(None).walk(&pdf_grid(base));
        let with = TableWalker::new(None).walk(&pdf_grid(padded));
        assert_eq!(without.items, with.items);
    }

    #[test]
    fn merge_state_resets_at_table_boundaries() {
        let grid = DocumentGrid {
            source: Source::Pdf,
            pages: vec![PageGrid {
                page_number: Some(1),
                sheet_name: None,
                tables: vec![
                    TableGrid {
                        reference_number: None,
                        rows: vec![
                            header(),
                            row(&["土工", "掘削", "土砂掘削", "10.0", "m3"]),
                        ],
                    },
                    TableGrid {
                        reference_number: None,
                        rows: vec![header(), row(&["", "", "", "5.0", ""])],
                    },
                ],
            }],
        };

        let extraction = TableWalker::new(None).walk(&grid);
        // 2テーブル目の数量行は先行項目が無いのでマージされない
        assert_eq!(extraction.items.len(), 1);
        assert_eq!(extraction.items[0].quantity, Some("10.0".parse().unwrap()));
        assert!(extraction
            .diagnostics
            .iter()
            .any(|d| d.reason == SkipReason::OrphanQuantity && d.table_index == 1));
    }

    #[test]
    fn headerless_table_is_skipped_with_diagnostic() {
        let grid = pdf_grid(vec![
            row(&["2025年度", "発注工事一覧", ""]),
            row(&["土工", "掘削", "土砂掘削"]),
        ]);

        let extraction = TableWalker::new(None).walk(&grid);
        assert!(extraction.items.is_empty());
        assert_eq!(extraction.tables_seen, 1);
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].reason, SkipReason::NoHeader);
        assert_eq!(extraction.diagnostics[0].row_index, None);
    }

    #[test]
    fn provenance_carries_sheet_and_reference_number() {
        let grid = DocumentGrid {
            source: Source::Excel,
            pages: vec![PageGrid {
                page_number: None,
                sheet_name: Some("内訳書".to_string()),
                tables: vec![TableGrid {
                    reference_number: Some("内1号".to_string()),
                    rows: vec![
                        row(&["名称", "数量", "単位"]),
                        row(&["基面整正", "120.0", "m2"]),
                    ],
                }],
            }],
        };

        let extraction = TableWalker::new(None).walk(&grid);
        assert_eq!(extraction.items.len(), 1);
        let item = &extraction.items[0];
        assert_eq!(item.source, Source::Excel);
        assert_eq!(item.provenance.sheet_name.as_deref(), Some("内訳書"));
        assert_eq!(item.provenance.reference_number.as_deref(), Some("内1号"));
    }

    #[test]
    fn skipped_rows_are_recorded_but_not_fatal() {
        let grid = pdf_grid(vec![
            header(),
            row(&["", "", "", "5.0", ""]), // マージ先なし
            row(&["土工", "掘削", "土砂掘削", "10.0", "m3"]),
            row(&["合計", "", "", "10.0", ""]),
        ]);

        let extraction = TableWalker::new(None).walk(&grid);
        assert_eq!(extraction.items.len(), 1);
        let reasons: Vec<_> = extraction.diagnostics.iter().map(|d| d.reason).collect();
        assert!(reasons.contains(&SkipReason::OrphanQuantity));
        assert!(reasons.contains(&SkipReason::TotalRow));
    }
}
