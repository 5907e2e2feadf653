//! Keyword extraction and text normalization.
//!
//! # Invariants
//! - `normalize_token` keeps Unicode letters/digits only and lowercases them;
//!   it is script-agnostic (Hangul, Latin, CJK, ...).
//! - `normalize_name` only lowercases and collapses whitespace, so substring
//!   rules still see separators.

use once_cell::sync::Lazy;
use regex::Regex;

static KEYWORD_SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s,/|+·&()\[\]{}<>]+").expect("valid keyword split regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Tokenizes a product name into keyword candidates.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, product_name: &str) -> Vec<String>;
}

/// Splits on whitespace and listing punctuation.
///
/// Every occurrence is kept in source order so adjacent pairs stay
/// adjacent; only tokens with no letters or digits are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeywordExtractor;

impl KeywordExtractor for DefaultKeywordExtractor {
    fn extract(&self, product_name: &str) -> Vec<String> {
        KEYWORD_SPLIT_RE
            .split(product_name)
            .map(str::trim)
            .filter(|keyword| !normalize_token(keyword).is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Strips everything except letters/digits and case-folds.
pub fn normalize_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lowercases and collapses whitespace runs to one space.
pub fn normalize_name(value: &str) -> String {
    WHITESPACE_RE
        .replace_all(value.trim(), " ")
        .to_lowercase()
}

/// Normalized unigrams followed by adjacent-pair concatenations.
///
/// Bigrams recover compound terms split by whitespace in the source text
/// (`양수 냄비` -> `양수냄비`). Duplicates keep their first position.
pub fn token_pool(keywords: &[String]) -> Vec<String> {
    let unigrams: Vec<String> = keywords
        .iter()
        .map(|keyword| normalize_token(keyword))
        .filter(|token| !token.is_empty())
        .collect();

    let bigrams = unigrams
        .windows(2)
        .map(|pair| format!("{}{}", pair[0], pair[1]));

    let mut pool: Vec<String> = Vec::with_capacity(unigrams.len() * 2);
    for token in unigrams.iter().cloned().chain(bigrams) {
        if !pool.contains(&token) {
            pool.push(token);
        }
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, normalize_token, token_pool, DefaultKeywordExtractor, KeywordExtractor};

    #[test]
    fn default_extractor_splits_on_listing_punctuation() {
        let keywords = DefaultKeywordExtractor.extract("[코스트코] 스텐 양수 냄비, 24cm / 2개 (세트) 냄비");
        assert_eq!(
            keywords,
            vec!["코스트코", "스텐", "양수", "냄비", "24cm", "2개", "세트", "냄비"]
        );
    }

    #[test]
    fn repeated_word_keeps_its_later_adjacency() {
        let keywords = DefaultKeywordExtractor.extract("냄비 뚜껑 양수 냄비");
        assert_eq!(keywords, vec!["냄비", "뚜껑", "양수", "냄비"]);

        let pool = token_pool(&keywords);
        assert!(pool.contains(&"양수냄비".to_string()));
        assert!(pool.contains(&"뚜껑양수".to_string()));
        assert_eq!(pool.iter().filter(|token| *token == "냄비").count(), 1);
    }

    #[test]
    fn default_extractor_drops_symbol_only_tokens() {
        assert_eq!(DefaultKeywordExtractor.extract(" -- ** "), Vec::<String>::new());
    }

    #[test]
    fn normalize_token_is_script_agnostic() {
        assert_eq!(normalize_token("Pot-24CM!"), "pot24cm");
        assert_eq!(normalize_token("양수·냄비"), "양수냄비");
        assert_eq!(normalize_token("鍋"), "鍋");
    }

    #[test]
    fn normalize_name_collapses_whitespace() {
        assert_eq!(normalize_name("  Stainless\t  POT \n"), "stainless pot");
    }

    #[test]
    fn token_pool_adds_adjacent_bigrams() {
        let keywords = vec!["스텐".to_string(), "양수".to_string(), "냄비".to_string()];
        assert_eq!(
            token_pool(&keywords),
            vec!["스텐", "양수", "냄비", "스텐양수", "양수냄비"]
        );
    }

    #[test]
    fn token_pool_skips_empty_tokens_before_pairing() {
        let keywords = vec!["양수".to_string(), "--".to_string(), "냄비".to_string()];
        assert_eq!(token_pool(&keywords), vec!["양수", "냄비", "양수냄비"]);
    }
}
