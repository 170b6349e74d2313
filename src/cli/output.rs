//! Colored terminal output for the Scribe CLI.

use crate::types::{Task, TaskStatus};
use owo_colors::OwoColorize;

/// Longest content excerpt printed by [`Output::task_report`].
const EXCERPT_CHARS: usize = 600;

pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let art = [
            " ___  ___ ___ ___ ___ ___ ",
            "/ __|/ __| _ \\_ _| _ ) __|",
            "\\__ \\ (__|   /| || _ \\ _| ",
            "|___/\\___|_|_\\___|___/___|",
        ];
        let tagline = "Research / Write / Analyse";
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));

        println!();
        for line in art {
            if self.colored {
                println!("   {}", line.bright_magenta().bold());
            } else {
                println!("   {}", line);
            }
        }
        if self.colored {
            println!("\n   {} {}\n", tagline.bright_white().bold(), version.dimmed());
        } else {
            println!("\n   {} {}\n", tagline, version);
        }
    }

    /// `marker` when colored, `[label]` otherwise.
    fn prefix(&self, marker: String, label: &str) -> String {
        if self.colored {
            marker
        } else {
            format!("[{}]", label)
        }
    }

    pub fn success(&self, message: &str) {
        let prefix = self.prefix("ok".green().bold().to_string(), "ok");
        println!("  {} {}", prefix, message);
    }

    pub fn info(&self, message: &str) {
        let prefix = self.prefix("::".cyan().to_string(), "info");
        println!("  {} {}", prefix, message);
    }

    pub fn warning(&self, message: &str) {
        let prefix = self.prefix("warn".yellow().bold().to_string(), "warn");
        println!("  {} {}", prefix, message);
    }

    /// Errors go to stderr.
    pub fn error(&self, message: &str) {
        let prefix = self.prefix("error".red().bold().to_string(), "error");
        eprintln!("  {} {}", prefix, message);
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bold().underline());
        } else {
            println!("\n  {}\n  {}", title, "-".repeat(title.chars().count()));
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        let key = format!("{:<12}", key);
        if self.colored {
            println!("    {} {}", key.dimmed(), value);
        } else {
            println!("    {} {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        let bullet = self.prefix("›".magenta().to_string(), "-");
        println!("    {} {}", bullet, item);
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.italic().dimmed());
        } else {
            println!("\n  hint: {}", message);
        }
    }

    /// Status word, colored by outcome.
    pub fn status_label(&self, status: TaskStatus) -> String {
        let label = status.as_str();
        if !self.colored {
            return label.to_string();
        }
        match status {
            TaskStatus::Completed => label.green().bold().to_string(),
            TaskStatus::Failed => label.red().bold().to_string(),
            TaskStatus::Pending | TaskStatus::InProgress => label.yellow().to_string(),
        }
    }

    /// Print a finished task: status, error or the scored content.
    pub fn task_report(&self, task: &Task) {
        self.header("Task");
        self.kv("id", &task.id);
        self.kv("topic", &task.request.topic);
        self.kv("status", &self.status_label(task.status));

        if let Some(error) = &task.error {
            self.error(error);
        }

        let Some(result) = &task.result else {
            return;
        };

        self.header("Research");
        self.kv("confidence", &format!("{:.2}", result.research.confidence_score));
        self.kv("source", &format!("{:?}", result.research.generated_by).to_lowercase());
        for finding in &result.research.key_findings {
            self.list_item(finding);
        }

        self.header("Analysis");
        let analysis = &result.analysis;
        self.kv(
            "sentiment",
            &format!(
                "{:?} ({:.2})",
                analysis.sentiment.sentiment, analysis.sentiment.score
            )
            .to_lowercase(),
        );
        self.kv("readability", &format!("{:.2}", analysis.readability_score));
        self.kv("topics", &analysis.key_topics.join(", "));
        self.kv("length", &format!("{} chars", analysis.content_length));

        self.header("Content");
        println!("{}", excerpt(&result.content, EXCERPT_CHARS));
    }

    pub fn newline(&self) {
        println!();
    }
}

/// First `max` characters of `text`, marked when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskRequest;

    #[test]
    fn test_excerpt_cuts_on_char_boundary() {
        assert_eq!(excerpt("héllo wörld", 5), "héllo...");
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("", 3), "");
    }

    #[test]
    fn test_status_label_plain() {
        let output = Output::no_color();
        assert_eq!(output.status_label(TaskStatus::InProgress), "in_progress");
        assert_eq!(output.status_label(TaskStatus::Failed), "failed");
    }

    #[test]
    fn test_colored_label_keeps_word() {
        let output = Output::new();
        assert!(output.status_label(TaskStatus::Completed).contains("completed"));
    }

    #[test]
    fn test_report_without_result_no_panic() {
        let mut task = Task::new("t1", TaskRequest::new("Rust"));
        task.status = TaskStatus::Failed;
        task.error = Some("Research phase failed: boom".to_string());

        Output::no_color().task_report(&task);
        Output::new().task_report(&task);
    }

    #[test]
    fn test_plain_prefix_is_bracketed() {
        let plain = Output::no_color();
        assert_eq!(plain.prefix("x".to_string(), "warn"), "[warn]");
        assert_eq!(Output::new().prefix("x".to_string(), "warn"), "x");
    }

    #[test]
    fn test_every_printer_in_both_modes() {
        for out in [Output::no_color(), Output::new()] {
            out.banner();
            out.success("done");
            out.info("queued");
            out.warning("slow provider");
            out.error("boom");
            out.header("Section");
            out.kv("topic", "Rust");
            out.list_item("finding");
            out.hint("try --verbose");
            out.newline();
        }
    }
}
