use serde::{Deserialize, Serialize};

/// 正規化キー同士の類似度関数の契約
///
/// - score(a, b) == score(b, a) (対称)
/// - 0.0 <= score <= 1.0
/// - a == b なら 1.0
///
/// ファジー一致の確信度はこのスコアをそのまま使う。
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// 設定で選択する類似度実装
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    /// 編集距離比 (1 - distance / max_len)
    #[default]
    Ratio,
    /// 文字多重集合の Dice 係数 (2*共通 / (len_a + len_b))
    Overlap,
}

impl SimilarityKind {
    pub fn scorer(&self) -> Box<dyn SimilarityScorer> {
        match self {
            SimilarityKind::Ratio => Box::new(EditDistanceScorer),
            SimilarityKind::Overlap => Box::new(CharOverlapScorer),
        }
    }
}

/// レーベンシュタイン距離ベースの類似度
pub struct EditDistanceScorer;

impl SimilarityScorer for EditDistanceScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        let len_a = a.chars().count();
        let len_b = b.chars().count();
        if len_a == 0 || len_b == 0 {
            return 0.0;
        }
        let distance = levenshtein(a, b);
        1.0 - distance as f64 / len_a.max(len_b) as f64
    }
}

/// 文字単位の出現数ベース類似度
pub struct CharOverlapScorer;

impl SimilarityScorer for CharOverlapScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        let len_a = a.chars().count();
        let len_b = b.chars().count();
        if len_a == 0 || len_b == 0 {
            return 0.0;
        }

        let mut counts = std::collections::HashMap::new();
        for c in a.chars() {
            *counts.entry(c).or_insert(0i64) += 1;
        }
        let mut common = 0i64;
        for c in b.chars() {
            if let Some(n) = counts.get_mut(&c) {
                if *n > 0 {
                    *n -= 1;
                    common += 1;
                }
            }
        }
        2.0 * common as f64 / (len_a + len_b) as f64
    }
}

/// 文字単位のレーベンシュタイン距離 (1行DP)
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, ac) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, bc) in b_chars.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1)
                .min(current[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("土砂掘削", "土砂運搬"), 2);
    }

    #[test]
    fn scorers_are_symmetric_and_bounded() {
        let pairs = [
            ("土工|掘削|土砂掘削", "土工|掘削|土砂運搬"),
            ("路盤工", "基面整正"),
            ("abc", ""),
            ("同一", "同一"),
        ];
        for scorer in [
            SimilarityKind::Ratio.scorer(),
            SimilarityKind::Overlap.scorer(),
        ] {
            for (a, b) in pairs {
                let s1 = scorer.score(a, b);
                let s2 = scorer.score(b, a);
                assert!((s1 - s2).abs() < 1e-12, "asymmetric for {a:?}/{b:?}");
                assert!((0.0..=1.0).contains(&s1));
            }
        }
    }

    #[test]
    fn identical_keys_score_one() {
        assert_eq!(EditDistanceScorer.score("土工|掘削", "土工|掘削"), 1.0);
        assert_eq!(CharOverlapScorer.score("土工|掘削", "土工|掘削"), 1.0);
    }

    #[test]
    fn near_keys_score_high() {
        let s = EditDistanceScorer.score("土工|掘削|土砂掘削第1工区", "土工|掘削|土砂掘削第2工区");
        assert!(s > 0.9, "score was {s}");
    }
}
