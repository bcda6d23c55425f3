use async_trait::async_trait;

use litper_types::{LitperError, Result};

use crate::Assistant;
use crate::json::strip_code_fences;

/// Assistant that shells out to an LLM CLI (`claude -p` by default).
#[derive(Debug, Clone)]
pub struct CliAssistant {
    /// Executable to run.
    pub command: String,
    /// Model alias passed with `--model`.
    pub model: String,
    /// Extra arguments placed before the prompt.
    pub extra_args: Vec<String>,
}

impl Default for CliAssistant {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            model: "haiku".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl CliAssistant {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn build_args(&self, prompt: &str) -> Vec<String> {
        let mut args = vec![
            "--model".to_string(),
            self.model.clone(),
            "--output-format".to_string(),
            "json".to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push("-p".to_string());
        args.push(prompt.to_string());
        args
    }
}

/// Pull the answer text out of the CLI's JSON envelope. Output that isn't
/// an envelope is taken as the answer itself.
fn unwrap_envelope(stdout: &str) -> String {
    let text = serde_json::from_str::<serde_json::Value>(stdout)
        .ok()
        .and_then(|v| v.get("result").and_then(|r| r.as_str()).map(str::to_string))
        .unwrap_or_else(|| stdout.to_string());
    strip_code_fences(&text)
}

#[async_trait]
impl Assistant for CliAssistant {
    async fn ask(&self, prompt: &str) -> Result<String> {
        let output = tokio::process::Command::new(&self.command)
            .args(self.build_args(prompt))
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                LitperError::Assistant(format!("Failed to spawn {}: {e}", self.command))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LitperError::Assistant(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let answer = unwrap_envelope(&stdout);
        tracing::debug!(command = %self.command, chars = answer.len(), "assistant answered");
        Ok(answer)
    }

    async fn health_check(&self) -> Result<bool> {
        let output = tokio::process::Command::new(&self.command)
            .arg("--version")
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .output()
            .await
            .map_err(|e| LitperError::Assistant(format!("{} not found: {e}", self.command)))?;

        Ok(output.status.success())
    }

    fn name(&self) -> &str {
        "CliAssistant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let assistant = CliAssistant::default().with_model("sonnet");
        let args = assistant.build_args("hola");
        assert!(args.contains(&"sonnet".to_string()));
        assert!(args.contains(&"--output-format".to_string()));
        assert_eq!(args[args.len() - 2], "-p");
        assert_eq!(args[args.len() - 1], "hola");
    }

    #[test]
    fn test_unwrap_envelope() {
        let stdout = r#"{"type":"result","result":"```\nEn camino\n```"}"#;
        assert_eq!(unwrap_envelope(stdout), "En camino");
        assert_eq!(unwrap_envelope("texto plano\n"), "texto plano");
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_assistant_error() {
        let assistant = CliAssistant::new("litper-no-such-llm-binary");
        let err = assistant.ask("hola").await.unwrap_err();
        assert!(matches!(err, LitperError::Assistant(_)));
        assert!(assistant.health_check().await.is_err());
    }
}
