use bigdecimal::BigDecimal;

use crate::models::KEY_DELIMITER;

/// 単位表記の同義語テーブル (幅寄せ・小文字化の後に適用)
///
/// 右辺は必ず正規形 (再正規化しても不変) であること。未知の単位は
/// マッピングせずそのまま通す。
const UNIT_SYNONYMS: &[(&str, &str)] = &[
    ("㎜", "mm"),
    ("㎝", "cm"),
    ("㎞", "km"),
    ("㎡", "m2"),
    ("m²", "m2"),
    ("平米", "m2"),
    ("㎥", "m3"),
    ("m³", "m3"),
    ("立米", "m3"),
    ("㎎", "mg"),
    ("㎏", "kg"),
    ("ℓ", "l"),
    ("リットル", "l"),
    ("トン", "t"),
];

/// 全角英数字を半角へ畳み込む (Ａ-Ｚ/ａ-ｚ/０-９ と全角空白、
/// 数値表記に現れる全角小数点・カンマ)
pub fn fold_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
                char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
            }
            '\u{FF0E}' => '.',
            '\u{FF0C}' => ',',
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}

/// キー構成用テキスト正規化: 幅寄せ → 小文字化 → 空白全除去
pub fn normalize_text(s: &str) -> String {
    fold_width(s)
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// 単位の正規化: 幅寄せ → 小文字化 → trim → 同義語テーブル
///
/// 冪等: normalize_unit(normalize_unit(x)) == normalize_unit(x)
pub fn normalize_unit(s: &str) -> String {
    let folded = fold_width(s).to_lowercase().trim().to_string();
    for (from, to) in UNIT_SYNONYMS {
        if folded == *from {
            return (*to).to_string();
        }
    }
    folded
}

/// `|` 区切りの項目キーをセグメント単位で正規化し、空セグメントを落とす
pub fn normalize_key(key: &str) -> String {
    key.split(KEY_DELIMITER)
        .map(normalize_text)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}

/// セル文字列から数量を取り出す
///
/// 幅寄せ後、桁区切りカンマを除去し、最初の数値連続部分
/// (数字と小数点) を十進数として解釈する。数値が見つからない
/// セルは None (数量なし)。0 は Some(0) として区別する。
pub fn parse_quantity(s: &str) -> Option<BigDecimal> {
    // 全角カンマは fold_width で半角に寄っている
    let cleaned = fold_width(s).replace(',', "");

    let mut run = String::new();
    for c in cleaned.chars() {
        if c.is_ascii_digit() || c == '.' {
            run.push(c);
        } else if !run.is_empty() {
            break;
        }
    }

    if !run.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    run.parse::<BigDecimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullwidth_units_fold_to_halfwidth() {
        assert_eq!(normalize_unit("ｍ"), normalize_unit("m"));
        assert_eq!(normalize_unit("ｔ"), normalize_unit("t"));
        assert_eq!(normalize_unit("ｋｇ"), "kg");
        assert_eq!(normalize_unit("ｍ２"), "m2");
    }

    #[test]
    fn unit_synonyms_map_to_canonical_form() {
        assert_eq!(normalize_unit("㎡"), "m2");
        assert_eq!(normalize_unit("m²"), "m2");
        assert_eq!(normalize_unit("㎥"), "m3");
        assert_eq!(normalize_unit("㎏"), "kg");
        assert_eq!(normalize_unit("トン"), "t");
        // 未知の単位はそのまま通す
        assert_eq!(normalize_unit("式"), "式");
    }

    #[test]
    fn normalize_unit_is_idempotent() {
        for s in ["ｍ", "㎡", "M２", "m²", " KG ", "式", "リットル", ""] {
            let once = normalize_unit(s);
            assert_eq!(normalize_unit(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn normalize_text_strips_all_whitespace() {
        assert_eq!(normalize_text("土 砂　掘 削"), "土砂掘削");
        assert_eq!(normalize_text("Ｗ４００"), "w400");
    }

    #[test]
    fn normalize_key_drops_empty_segments() {
        assert_eq!(normalize_key("土工||掘削 |"), "土工|掘削");
        assert_eq!(normalize_key("土工|掘削|土砂掘削"), "土工|掘削|土砂掘削");
    }

    #[test]
    fn parse_quantity_handles_commas_and_fullwidth() {
        assert_eq!(parse_quantity("1,234.5"), Some("1234.5".parse().unwrap()));
        assert_eq!(parse_quantity("１２．５"), Some("12.5".parse().unwrap()));
        assert_eq!(
            parse_quantity("１，２３４．５"),
            Some("1234.5".parse().unwrap())
        );
        assert_eq!(parse_quantity("約 10.0 程度"), Some("10.0".parse().unwrap()));
        assert_eq!(parse_quantity("0"), Some("0".parse().unwrap()));
    }

    #[test]
    fn parse_quantity_rejects_non_numeric_cells() {
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("一式"), None);
        assert_eq!(parse_quantity("..."), None);
    }
}
