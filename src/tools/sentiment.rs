//! Lexicon-based sentiment scoring.

use crate::tools::analysis::round2;
use crate::types::{Sentiment, SentimentReport};

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "excellent",
    "great",
    "amazing",
    "positive",
    "successful",
    "beneficial",
    "effective",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "terrible", "negative", "failed", "problem", "issue", "challenge",
];

/// Score above which text reads as positive.
const POSITIVE_THRESHOLD: f64 = 0.6;
/// Score below which text reads as negative.
const NEGATIVE_THRESHOLD: f64 = 0.4;

/// Classify `text` by counting lexicon words.
///
/// Words are whitespace-separated and lowercased but otherwise taken as-is,
/// so `"great,"` does not match `"great"`. With no lexicon hits the result is
/// neutral with a score of 0.5.
pub fn analyze_sentiment(text: &str) -> SentimentReport {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();

    let positive_words = words
        .iter()
        .filter(|w| POSITIVE_WORDS.contains(&w.as_str()))
        .count();
    let negative_words = words
        .iter()
        .filter(|w| NEGATIVE_WORDS.contains(&w.as_str()))
        .count();

    let relevant = positive_words + negative_words;
    let (sentiment, score) = if relevant == 0 {
        (Sentiment::Neutral, 0.5)
    } else {
        let score = positive_words as f64 / relevant as f64;
        let sentiment = if score > POSITIVE_THRESHOLD {
            Sentiment::Positive
        } else if score < NEGATIVE_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };
        (sentiment, score)
    };

    SentimentReport {
        sentiment,
        score: round2(score),
        positive_words,
        negative_words,
        total_words_analyzed: words.len(),
    }
}
