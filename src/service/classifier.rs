use bigdecimal::Zero;

use crate::models::{FieldSet, SkipReason};
use crate::service::normalizer::{fold_width, normalize_unit, parse_quantity};

/// 識別・数値フィールドの役割 (列ヘッダから解決する)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Category,
    Subcategory,
    Detail,
    ItemName,
    Specification,
    Remarks,
    Quantity,
    Unit,
}

/// ヘッダ文字列 → 役割の同義語テーブル
///
/// 照合はヘッダ側・パターン側とも clean_header 後の包含判定。
/// 複数役割に掛かる場合は最長パターンの役割を採る (「名称・規格」は
/// 規格ではなく名称列)。
const HEADER_PATTERNS: &[(FieldRole, &[&str])] = &[
    (
        FieldRole::Category,
        &[
            "費目・工種・種別・細別",
            "工事区分・工種・種別・細別",
            "費目・工種・種別・細",
            "工種・種目",
            "工事区分",
            "工種",
            "費目",
        ],
    ),
    (FieldRole::Subcategory, &["種別区分", "種別"]),
    (FieldRole::Detail, &["細別", "細目"]),
    (FieldRole::ItemName, &["名称・規格", "品名", "名称", "項目"]),
    (FieldRole::Specification, &["規格"]),
    (FieldRole::Remarks, &["摘要", "備考"]),
    (FieldRole::Quantity, &["数量"]),
    (FieldRole::Unit, &["単位"]),
];

/// 役割に割り当てない列 (金額系・増減系)
const IGNORED_HEADER_MARKERS: &[&str] = &["金額", "単価", "増減"];

/// 合計行マーカー。識別テキストがこれで始まる行は項目にしない。
const TOTAL_ROW_MARKERS: &[&str] = &["合計", "小計", "総計"];

/// 空セル扱いする文字列トークン (抽出ライブラリの欠損表現)
const BLANK_TOKENS: &[&str] = &["none", "nan"];

/// 走査中の1行。テーブル走査の間だけ生きる借用ビュー。
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    pub cells: &'a [Option<String>],
    /// テーブル内の1始まり行番号
    pub row_index: usize,
}

/// 行分類の結果
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// 項目を生まない行。スキップ理由を診断用に保持する。
    Empty(SkipReason),
    /// 数量のみの継続行 (直前項目への加算対象)
    QuantityOnly(FieldSet),
    /// 新規項目となる行
    Item(FieldSet),
}

/// ヘッダ行から構築した列番号 → 役割の対応
#[derive(Debug, Clone, Default)]
pub struct ColumnRoleMap {
    custom_index: Option<usize>,
    assignments: Vec<(usize, FieldRole)>,
}

impl ColumnRoleMap {
    /// ヘッダ行から役割マップを作る。1役割も解決できなければ None。
    ///
    /// custom_column が指定されていれば、ヘッダ一致した列を最優先の
    /// 識別列として扱う (既定パターンより優先)。
    pub fn from_header(header: &[Option<String>], custom_column: Option<&str>) -> Option<Self> {
        let custom_cleaned = custom_column
            .map(clean_header)
            .filter(|s| !s.is_empty());

        let mut map = ColumnRoleMap::default();
        for (idx, cell) in header.iter().enumerate() {
            let Some(text) = cell_text(cell) else {
                continue;
            };
            let cleaned = clean_header(text);
            if cleaned.is_empty() {
                continue;
            }

            if let Some(custom) = custom_cleaned.as_deref() {
                if map.custom_index.is_none() && cleaned == custom {
                    map.custom_index = Some(idx);
                    continue;
                }
            }

            if IGNORED_HEADER_MARKERS.iter().any(|m| cleaned.contains(m)) {
                continue;
            }

            if let Some(role) = resolve_role(&cleaned) {
                if !map.assignments.iter().any(|(_, r)| *r == role) {
                    map.assignments.push((idx, role));
                }
            }
        }

        if map.custom_index.is_none() && map.assignments.is_empty() {
            None
        } else {
            Some(map)
        }
    }

    pub fn index_of(&self, role: FieldRole) -> Option<usize> {
        self.assignments
            .iter()
            .find(|(_, r)| *r == role)
            .map(|(i, _)| *i)
    }

    pub fn custom_index(&self) -> Option<usize> {
        self.custom_index
    }
}

/// 最長一致パターンの役割を返す
fn resolve_role(cleaned: &str) -> Option<FieldRole> {
    let mut best: Option<(usize, FieldRole)> = None;
    for (role, patterns) in HEADER_PATTERNS {
        for pattern in *patterns {
            let p = clean_header(pattern);
            if cleaned.contains(&p) {
                let better = match best {
                    None => true,
                    Some((len, _)) => p.chars().count() > len,
                };
                if better {
                    best = Some((p.chars().count(), *role));
                }
            }
        }
    }
    best.map(|(_, role)| role)
}

/// ヘッダ照合用の整形: 幅寄せ + 空白と中点 (・/･) の除去
fn clean_header(s: &str) -> String {
    fold_width(s)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '・' && *c != '･')
        .collect()
}

/// セルを trim し、欠損トークンを None に落とす
pub fn cell_text(cell: &Option<String>) -> Option<&str> {
    let text = cell.as_deref()?.trim();
    if text.is_empty() || BLANK_TOKENS.iter().any(|t| text.eq_ignore_ascii_case(t)) {
        return None;
    }
    Some(text)
}

fn is_completely_empty(row: &RawRow) -> bool {
    row.cells.iter().all(|c| cell_text(c).is_none())
}

/// 1行を Empty / QuantityOnly / Item に分類する
///
/// - 空行判定: 全セルが空白 (None/nan 含む)
/// - 数量のみ: 数量役割が非ゼロ数値、かつ識別テキストなし。
///   ゼロ数量や単位だけの行はシグナルとみなさない。
/// - それ以外で識別テキストがあれば Item (キーの最終確認は Builder 側)
pub fn classify(row: &RawRow, roles: &ColumnRoleMap) -> RowOutcome {
    if is_completely_empty(row) {
        return RowOutcome::Empty(SkipReason::EmptyRow);
    }

    let fields = extract_fields(row, roles);

    if is_total_row(&fields) {
        return RowOutcome::Empty(SkipReason::TotalRow);
    }

    let has_identifying = fields.has_identifying_text();
    let has_quantity = fields
        .quantity
        .as_ref()
        .map(|q| !q.is_zero())
        .unwrap_or(false);

    match (has_identifying, has_quantity) {
        (true, _) => RowOutcome::Item(fields),
        (false, true) => RowOutcome::QuantityOnly(fields),
        (false, false) => RowOutcome::Empty(SkipReason::NoIdentifyingFields),
    }
}

fn extract_fields(row: &RawRow, roles: &ColumnRoleMap) -> FieldSet {
    let text_at = |idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.cells.get(i))
            .and_then(cell_text)
            .map(str::to_string)
    };

    let mut fields = FieldSet {
        custom: text_at(roles.custom_index()),
        category: text_at(roles.index_of(FieldRole::Category)),
        subcategory: text_at(roles.index_of(FieldRole::Subcategory)),
        detail: text_at(roles.index_of(FieldRole::Detail)),
        item_name: text_at(roles.index_of(FieldRole::ItemName)),
        specification: text_at(roles.index_of(FieldRole::Specification)),
        remarks: text_at(roles.index_of(FieldRole::Remarks)),
        ..FieldSet::default()
    };
    fields.quantity = text_at(roles.index_of(FieldRole::Quantity))
        .as_deref()
        .and_then(parse_quantity);
    fields.unit = text_at(roles.index_of(FieldRole::Unit))
        .map(|u| normalize_unit(&u))
        .filter(|u| !u.is_empty());
    fields
}

fn is_total_row(fields: &FieldSet) -> bool {
    fields
        .identifying_parts()
        .iter()
        .any(|part| TOTAL_ROW_MARKERS.iter().any(|m| part.starts_with(m)))
}
