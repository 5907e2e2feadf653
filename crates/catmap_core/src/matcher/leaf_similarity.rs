//! Leaf-label similarity matching.
//!
//! Catches near-literal matches between product-name tokens and the most
//! specific label of each candidate category.
//!
//! # Invariants
//! - Deterministic: fixed keywords and candidate order give the same
//!   `(best, second)` pair and winner. Ties keep the earlier candidate.
//! - Acceptance needs both `best >= min_score` and `best - second >= min_margin`.

use crate::config::MatcherConfig;
use crate::matcher::keywords::{normalize_token, token_pool};
use crate::matcher::similarity::ratio;
use crate::model::category::TargetCategory;

/// Absorbs float error at the threshold boundaries.
const SCORE_EPSILON: f64 = 1e-9;

/// Best score of one candidate against the token pool.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafScore<'a> {
    pub category: &'a TargetCategory,
    pub score: f64,
    /// Pool token that produced `score`; `None` when nothing scored.
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafOutcome<'a> {
    pub best: Option<LeafScore<'a>>,
    pub second: f64,
    pub accepted: bool,
}

impl<'a> LeafOutcome<'a> {
    /// Winning category when accepted.
    pub fn decided(&self) -> Option<&LeafScore<'a>> {
        self.best.as_ref().filter(|_| self.accepted)
    }

    pub fn best_score(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |best| best.score)
    }

    pub fn margin(&self) -> f64 {
        self.best_score() - self.second
    }
}

/// Scores each candidate's leaf against the keyword token pool.
pub fn score_candidates<'a>(keywords: &[String], candidates: &'a [TargetCategory]) -> Vec<LeafScore<'a>> {
    let pool = token_pool(keywords);
    candidates
        .iter()
        .map(|category| {
            let leaf = normalize_token(category.leaf());
            let mut best = LeafScore {
                category,
                score: 0.0,
                token: None,
            };
            if leaf.is_empty() {
                return best;
            }
            for token in &pool {
                let score = ratio(&leaf, token);
                if score > best.score {
                    best.score = score;
                    best.token = Some(token.clone());
                }
            }
            best
        })
        .collect()
}

pub fn match_leaf_similarity<'a>(
    keywords: &[String],
    candidates: &'a [TargetCategory],
    config: &MatcherConfig,
) -> LeafOutcome<'a> {
    let mut best: Option<LeafScore<'a>> = None;
    let mut second = 0.0_f64;
    for scored in score_candidates(keywords, candidates) {
        match &best {
            Some(current) if scored.score <= current.score => {
                second = second.max(scored.score);
            }
            _ => {
                if let Some(previous) = best.take() {
                    second = second.max(previous.score);
                }
                best = Some(scored);
            }
        }
    }

    let accepted = best
        .as_ref()
        .is_some_and(|best| accepts(best.score, second, config));
    LeafOutcome {
        best,
        second,
        accepted,
    }
}

/// Threshold check for a `(best, second)` score pair.
pub fn accepts(best: f64, second: f64, config: &MatcherConfig) -> bool {
    best + SCORE_EPSILON >= config.min_score && (best - second) + SCORE_EPSILON >= config.min_margin
}

#[cfg(test)]
mod tests {
    use super::{accepts, match_leaf_similarity, score_candidates};
    use crate::config::MatcherConfig;
    use crate::model::category::TargetCategory;

    fn keywords(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn pots() -> Vec<TargetCategory> {
        vec![
            TargetCategory::from_path_str("100", "주방용품>냄비>양수냄비"),
            TargetCategory::from_path_str("200", "주방용품>냄비>편수냄비"),
            TargetCategory::from_path_str("300", "주방용품>프라이팬>웍"),
        ]
    }

    #[test]
    fn margin_boundaries() {
        let config = MatcherConfig::default();
        assert!(accepts(0.75, 0.69, &config));
        assert!(!accepts(0.75, 0.71, &config));
        assert!(!accepts(0.74, 0.0, &config));
        assert!(accepts(0.80, 0.75, &config));
    }

    // Token `abcdefghij`: `abcdef` scores 12/16 = 0.75, `abcdefgxyz` 14/20 = 0.70,
    // `abcdefx` 12/17 ~ 0.706.
    fn boundary_candidates(runner_up: &str) -> Vec<TargetCategory> {
        vec![
            TargetCategory::from_path_str("best", "A>abcdef"),
            TargetCategory::from_path_str("runner_up", &format!("A>{runner_up}")),
        ]
    }

    #[test]
    fn scored_margin_at_threshold_is_accepted() {
        let candidates = boundary_candidates("abcdefgxyz");
        let outcome = match_leaf_similarity(&keywords(&["abcdefghij"]), &candidates, &MatcherConfig::default());
        assert!((outcome.best_score() - 0.75).abs() < 1e-12);
        assert!((outcome.second - 0.70).abs() < 1e-12);
        let winner = outcome.decided().expect("margin of exactly 0.05 should accept");
        assert_eq!(winner.category.id.as_str(), "best");
    }

    #[test]
    fn scored_margin_below_threshold_is_rejected() {
        let candidates = boundary_candidates("abcdefx");
        let outcome = match_leaf_similarity(&keywords(&["abcdefghij"]), &candidates, &MatcherConfig::default());
        assert!((outcome.best_score() - 0.75).abs() < 1e-12);
        assert!((outcome.second - 12.0 / 17.0).abs() < 1e-12);
        assert!(outcome.decided().is_none());
    }

    #[test]
    fn repeated_word_compound_is_recovered() {
        let candidates = pots();
        let outcome = match_leaf_similarity(
            &keywords(&["냄비", "뚜껑", "양수", "냄비"]),
            &candidates,
            &MatcherConfig::default(),
        );
        let winner = outcome.decided().expect("should accept");
        assert_eq!(winner.category.id.as_str(), "100");
        assert_eq!(winner.token.as_deref(), Some("양수냄비"));
    }

    #[test]
    fn bigram_recovers_split_compound() {
        let candidates = pots();
        let outcome = match_leaf_similarity(&keywords(&["스텐", "양수", "냄비"]), &candidates, &MatcherConfig::default());
        let winner = outcome.decided().expect("should accept");
        assert_eq!(winner.category.id.as_str(), "100");
        assert_eq!(winner.score, 1.0);
        assert_eq!(winner.token.as_deref(), Some("양수냄비"));
        // "편수냄비" vs "양수냄비" shares three of four chars.
        assert!((outcome.second - 0.75).abs() < 1e-12);
    }

    #[test]
    fn near_tie_is_rejected() {
        let candidates = vec![
            TargetCategory::from_path_str("1", "A>abcd"),
            TargetCategory::from_path_str("2", "A>abce"),
        ];
        let outcome = match_leaf_similarity(&keywords(&["abcx"]), &candidates, &MatcherConfig::default());
        assert!(!outcome.accepted);
        assert_eq!(outcome.best.as_ref().expect("best").category.id.as_str(), "1");
        assert!(outcome.margin().abs() < 1e-12);
    }

    #[test]
    fn low_best_score_is_rejected() {
        let candidates = pots();
        let outcome = match_leaf_similarity(&keywords(&["국자"]), &candidates, &MatcherConfig::default());
        assert!(outcome.decided().is_none());
    }

    #[test]
    fn single_candidate_uses_zero_as_second() {
        let candidates = vec![TargetCategory::from_path_str("1", "A>abcd")];
        let outcome = match_leaf_similarity(&keywords(&["abce"]), &candidates, &MatcherConfig::default());
        assert!(outcome.accepted);
        assert_eq!(outcome.second, 0.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let candidates = pots();
        let words = keywords(&["편수", "냄비", "웍"]);
        let first = score_candidates(&words, &candidates);
        let second = score_candidates(&words, &candidates);
        assert_eq!(first, second);
        let a = match_leaf_similarity(&words, &candidates, &MatcherConfig::default());
        let b = match_leaf_similarity(&words, &candidates, &MatcherConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn empty_keywords_score_zero() {
        let candidates = pots();
        let outcome = match_leaf_similarity(&[], &candidates, &MatcherConfig::default());
        assert_eq!(outcome.best_score(), 0.0);
        assert!(!outcome.accepted);
    }
}
