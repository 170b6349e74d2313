//! Text statistics: search-result summaries, readability, and topic tags.

use crate::tools::search::SearchResult;
use crate::types::SearchAnalysis;

/// Words longer than this count as complex.
const COMPLEX_WORD_LEN: usize = 6;

const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "technology",
        &["ai", "artificial", "intelligence", "machine", "learning", "algorithm"],
    ),
    (
        "business",
        &["market", "investment", "revenue", "profit", "strategy"],
    ),
    (
        "health",
        &["medical", "healthcare", "treatment", "patient", "clinical"],
    ),
    (
        "education",
        &["learning", "teaching", "student", "curriculum", "knowledge"],
    ),
];

/// Summarise a batch of search results.
pub fn analyze_content(results: &[SearchResult]) -> SearchAnalysis {
    let total_items = results.len();
    let total_word_count: usize = results
        .iter()
        .map(|r| r.snippet.split_whitespace().count())
        .sum();

    SearchAnalysis {
        total_items,
        total_word_count,
        average_words_per_item: total_word_count as f64 / total_items.max(1) as f64,
        content_types: content_types(results),
        quality_score: (total_word_count as f64 / 100.0).min(1.0),
    }
}

fn content_types(results: &[SearchResult]) -> Vec<String> {
    let mut types: Vec<String> = results
        .iter()
        .map(|r| {
            let snippet = r.snippet.to_lowercase();
            let mentions = |words: &[&str]| words.iter().any(|w| snippet.contains(w));
            if mentions(&["research", "study", "data"]) {
                "research"
            } else if mentions(&["news", "update", "recent"]) {
                "news"
            } else {
                "general"
            }
            .to_string()
        })
        .collect();
    types.sort();
    types.dedup();
    types
}

/// Readability in `[0, 1]`, rounded to two decimals. Empty text scores 0.
///
/// Long words lower the score; short sentences raise it.
pub fn calculate_readability(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }

    let words_per_sentence = words.len() as f64 / sentence_count(text).max(1) as f64;
    let complex = words
        .iter()
        .filter(|w| w.chars().count() > COMPLEX_WORD_LEN)
        .count();
    let complexity_ratio = complex as f64 / words.len() as f64;

    let score = (1.0 - complexity_ratio + (30.0 / words_per_sentence) / 100.0).clamp(0.0, 1.0);
    round2(score)
}

/// Number of pieces left after splitting on runs of `.`, `!` and `?`,
/// counting empty pieces at either end.
fn sentence_count(text: &str) -> usize {
    let mut pieces = 1;
    let mut in_terminator = false;
    for c in text.chars() {
        let is_terminator = matches!(c, '.' | '!' | '?');
        if is_terminator && !in_terminator {
            pieces += 1;
        }
        in_terminator = is_terminator;
    }
    pieces
}

/// Topic families whose keywords appear as whole words. Defaults to `general`.
pub fn extract_topics(text: &str) -> Vec<String> {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();

    let topics: Vec<String> = TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| words.iter().any(|w| w == k)))
        .map(|(topic, _)| topic.to_string())
        .collect();

    if topics.is_empty() {
        vec!["general".to_string()]
    } else {
        topics
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
