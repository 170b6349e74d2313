//! Rule-based content post-processing for the writing stage.

use serde::{Deserialize, Serialize};

/// A single text transformation. Rules are applied in the order
/// [`ContentOptimizer::rules_for`] returns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationRule {
    StructureParagraphs,
    AddHeadings,
    FormalLanguage,
    AddBulletPoints,
    ProfessionalTone,
    CasualTone,
}

impl OptimizationRule {
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationRule::StructureParagraphs => "structure_paragraphs",
            OptimizationRule::AddHeadings => "add_headings",
            OptimizationRule::FormalLanguage => "formal_language",
            OptimizationRule::AddBulletPoints => "add_bullet_points",
            OptimizationRule::ProfessionalTone => "professional_tone",
            OptimizationRule::CasualTone => "casual_tone",
        }
    }

    pub fn apply(self, content: &str) -> String {
        match self {
            OptimizationRule::StructureParagraphs => content
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
            OptimizationRule::AddHeadings => {
                if content.lines().any(|l| l.trim_start().starts_with('#')) {
                    content.to_string()
                } else {
                    format!("# Overview\n\n{}", content)
                }
            }
            OptimizationRule::FormalLanguage => replace_all(
                content,
                &[
                    (" don't ", " do not "),
                    (" can't ", " cannot "),
                    (" won't ", " will not "),
                ],
            ),
            OptimizationRule::AddBulletPoints => content
                .lines()
                .map(|line| {
                    let indent = line.len() - line.trim_start().len();
                    match line.trim_start().strip_prefix("* ") {
                        Some(rest) => format!("{}- {}", &line[..indent], rest),
                        None => line.to_string(),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            OptimizationRule::ProfessionalTone => replace_all(
                content,
                &[
                    (" kinda ", " kind of "),
                    (" gonna ", " going to "),
                    (" yeah ", " yes "),
                ],
            ),
            OptimizationRule::CasualTone => {
                replace_all(content, &[(" do not ", " don't "), (" cannot ", " can't ")])
            }
        }
    }
}

fn replace_all(content: &str, pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .fold(content.to_string(), |acc, (from, to)| acc.replace(from, to))
}

#[derive(Debug, Clone, Default)]
pub struct ContentOptimizer;

impl ContentOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Rules for a content type followed by rules for a tone. Unknown values
    /// contribute nothing.
    pub fn rules_for(content_type: &str, tone: &str) -> Vec<OptimizationRule> {
        let mut rules = match content_type {
            "article" => vec![
                OptimizationRule::StructureParagraphs,
                OptimizationRule::AddHeadings,
            ],
            "report" => vec![
                OptimizationRule::FormalLanguage,
                OptimizationRule::AddBulletPoints,
            ],
            _ => Vec::new(),
        };

        match tone {
            "professional" => rules.push(OptimizationRule::ProfessionalTone),
            "casual" => rules.push(OptimizationRule::CasualTone),
            _ => {}
        }

        rules
    }

    /// Apply every matching rule in order. Returns the text and the rules used.
    pub fn optimize(
        &self,
        content: &str,
        content_type: &str,
        tone: &str,
    ) -> (String, Vec<OptimizationRule>) {
        let rules = Self::rules_for(content_type, tone);
        let optimized = rules
            .iter()
            .fold(content.to_string(), |acc, rule| rule.apply(&acc));

        tracing::debug!(content_type, tone, rules = rules.len(), "Optimized content");
        (optimized, rules)
    }
}
