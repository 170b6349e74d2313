//! Scoring and tool behaviour through the public API.

use rstest::rstest;
use scribe::tools::analysis::{calculate_readability, extract_topics};
use scribe::tools::sentiment::analyze_sentiment;
use scribe::tools::ToolRegistry;
use scribe::types::Sentiment;
use scribe::ScribeConfig;
use serde_json::json;

#[rstest]
#[case("This is a great and amazing product with excellent features.", Sentiment::Positive)]
#[case("This is a bad product with poor quality and terrible performance.", Sentiment::Negative)]
#[case("The meeting is scheduled for Tuesday afternoon.", Sentiment::Neutral)]
#[case("Good results but a real problem remains", Sentiment::Neutral)]
fn test_sentiment_classification(#[case] text: &str, #[case] expected: Sentiment) {
    assert_eq!(analyze_sentiment(text).sentiment, expected);
}

#[test]
fn test_sentiment_scores_match_thresholds() {
    let positive = analyze_sentiment("This is a great and amazing product with excellent features.");
    assert!(positive.score > 0.6);
    assert_eq!(positive.positive_words, 3);

    let negative =
        analyze_sentiment("This is a bad product with poor quality and terrible performance.");
    assert!(negative.score < 0.4);
    assert_eq!(negative.negative_words, 3);

    let neutral = analyze_sentiment("Nothing in the lexicon here");
    assert_eq!(neutral.score, 0.5);
    assert_eq!(neutral.total_words_analyzed, 5);
}

#[rstest]
#[case("Short words. Easy read.")]
#[case("Internationalization considerations notwithstanding, comprehensive documentation remains indispensable")]
#[case("one")]
#[case("!!! ??? ...")]
#[case("A sentence. Another one! And a question? Finally, an ending without a terminator")]
fn test_readability_is_bounded_and_rounded(#[case] text: &str) {
    let score = calculate_readability(text);
    assert!((0.0..=1.0).contains(&score), "{} out of range for {:?}", score, text);
    assert_eq!((score * 100.0).round() / 100.0, score);
}

#[rstest]
#[case("")]
#[case("   \n\t ")]
fn test_readability_of_blank_text_is_zero(#[case] text: &str) {
    assert_eq!(calculate_readability(text), 0.0);
}

#[test]
fn test_simple_prose_reads_easier_than_jargon() {
    let simple = calculate_readability("The cat sat. The dog ran. We had fun.");
    let dense = calculate_readability(
        "Multidisciplinary interoperability necessitates comprehensive standardization frameworks.",
    );
    assert!(simple > dense);
}

#[rstest]
#[case("Artificial intelligence algorithm", vec!["technology"])]
#[case("Machine learning curriculum", vec!["technology", "education"])]
#[case("Clinical treatment outcomes for every patient", vec!["health"])]
#[case("Revenue growth strategy", vec!["business"])]
#[case("Nothing relevant", vec!["general"])]
fn test_topic_extraction(#[case] text: &str, #[case] expected: Vec<&str>) {
    assert_eq!(extract_topics(text), expected);
}

#[tokio::test]
async fn test_default_registry_search() {
    let registry = ToolRegistry::with_default_tools(&ScribeConfig::default());
    assert!(registry.has_tool("web_search"));
    assert!(registry.has_tool("code_executor"));

    let out = registry
        .execute("web_search", json!({"query": "rust", "max_results": 2}))
        .await
        .unwrap();
    assert_eq!(out["count"], 2);
    assert_eq!(out["results"][0]["title"], "Research Result 1 for: rust");
    assert_eq!(out["results"][1]["url"], "https://example.com/research-2");
}

#[tokio::test]
async fn test_unknown_tool_is_not_found() {
    let registry = ToolRegistry::with_default_tools(&ScribeConfig::default());
    let err = registry.execute("file_ops", json!({})).await.unwrap_err();
    assert!(err.to_string().contains("Tool not found: file_ops"));
}
