//! Python REPL Tool
//!
//! Runs the model's code in a fresh `python3 -` subprocess. Each call is
//! independent; no interpreter state survives between calls.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use agent_core::{Result as CoreResult, Tool, ToolSchema};

use super::text::truncate_chars;
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};

const NO_OUTPUT_HINT: &str =
    "Code ran without printing anything. Use print(...) to see the value of an expression.";

/// Tool for executing Python snippets
pub struct PythonReplTool {
    python_bin: String,
    timeout: Duration,
    max_chars: usize,
}

impl PythonReplTool {
    pub fn new(config: &ResearchConfig) -> Self {
        Self {
            python_bin: config.python_bin.clone(),
            timeout: Duration::from_secs(config.python_timeout_secs),
            max_chars: config.max_doc_chars,
        }
    }

    async fn execute(&self, input: &str) -> Result<String> {
        let code = sanitize_input(input);
        if code.is_empty() {
            return Err(ResearchError::EmptyInput);
        }

        let run = async {
            let mut child = Command::new(&self.python_bin)
                .arg("-")
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(code.as_bytes()).await?;
                // Closing stdin lets the interpreter start.
                drop(stdin);
            }
            child.wait_with_output().await
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ResearchError::Timeout(self.timeout.as_secs()))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(status = %output.status, stdout_len = stdout.len(), "Python execution finished");

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                format!("python exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(ResearchError::Execution(truncate_chars(&detail, self.max_chars)));
        }

        let mut text = stdout.trim_end().to_string();
        if !stderr.trim().is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr.trim_end());
        }
        if text.is_empty() {
            return Ok(NO_OUTPUT_HINT.into());
        }
        Ok(truncate_chars(&text, self.max_chars))
    }
}

#[async_trait]
impl Tool for PythonReplTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "python_repl",
            "A Python shell. Use this to execute python commands. Input should be a valid python command. If you want to see the output of a value, you should print it out with `print(...)`.",
        )
        .with_input_description("Python source code to execute")
    }

    async fn invoke(&self, input: &str) -> CoreResult<String> {
        Ok(self.execute(input).await?)
    }
}

/// Strip Markdown fencing the model tends to wrap code in
pub(crate) fn sanitize_input(input: &str) -> String {
    let code = input.trim_start().trim_start_matches('`');
    let code = code
        .strip_prefix("python")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .unwrap_or(code);
    code.trim_end().trim_end_matches('`').trim().to_string()
}
