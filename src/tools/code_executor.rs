//! Run a code snippet through an interpreter with a hard timeout.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use crate::utils::toml_config::ExecutorConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::Write;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ExecutionReport {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

pub struct CodeExecutorTool {
    interpreter: String,
    timeout: Duration,
}

impl CodeExecutorTool {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(
            config.interpreter.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Write `code` to a temp file and run it. Never returns an error: every
    /// failure, including a timeout, is reported in the [`ExecutionReport`].
    pub async fn run(&self, code: &str, limit: Option<Duration>) -> ExecutionReport {
        let limit = limit.unwrap_or(self.timeout);

        let file = match write_script(code, script_suffix(&self.interpreter)) {
            Ok(file) => file,
            Err(e) => return ExecutionReport::failed(e.to_string()),
        };

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(file.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionReport::failed(format!(
                    "Failed to start {}: {}",
                    self.interpreter, e
                ));
            }
        };

        // The temp file is removed when `file` drops at the end of this scope.
        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                if output.status.success() {
                    ExecutionReport {
                        success: true,
                        output: stdout,
                        error: None,
                    }
                } else {
                    ExecutionReport {
                        success: false,
                        output: stdout,
                        error: Some(stderr),
                    }
                }
            }
            Ok(Err(e)) => ExecutionReport::failed(e.to_string()),
            Err(_) => {
                tracing::warn!(
                    interpreter = %self.interpreter,
                    timeout_secs = limit.as_secs_f64(),
                    "Code execution timed out"
                );
                ExecutionReport::failed("Execution timeout")
            }
        }
    }
}

/// File extension the interpreter expects, or none when it is not known.
fn script_suffix(interpreter: &str) -> &'static str {
    let program = std::path::Path::new(interpreter)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(interpreter);

    match program.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.') {
        "python" | "pypy" => ".py",
        "node" | "deno" | "bun" => ".js",
        "sh" | "bash" | "zsh" | "dash" => ".sh",
        "ruby" => ".rb",
        "perl" => ".pl",
        _ => "",
    }
}

fn write_script(code: &str, suffix: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
    file.write_all(code.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[async_trait]
impl Tool for CodeExecutorTool {
    fn name(&self) -> &str {
        "code_executor"
    }

    fn description(&self) -> &str {
        "Execute a code snippet with the configured interpreter and a hard timeout"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Source code to execute"
                },
                "timeout_secs": {
                    "type": "integer",
                    "description": "Wall-clock limit in seconds",
                    "default": self.timeout.as_secs()
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let code = args["code"]
            .as_str()
            .ok_or_else(|| AppError::InvalidInput("Missing 'code' parameter".to_string()))?;
        let limit = args["timeout_secs"].as_u64().map(Duration::from_secs);

        let report = self.run(code, limit).await;
        serde_json::to_value(report)
            .map_err(|e| AppError::Internal(format!("Failed to encode execution report: {}", e)))
    }
}
