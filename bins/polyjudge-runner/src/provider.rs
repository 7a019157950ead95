// Completion providers: where the raw candidate payload for a task comes from
use crate::response::SECTION_DELIMITER;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use polyjudge_common::types::Task;
use reqwest::Client;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Raw payload for `task`; `None` when the provider produced nothing
    async fn complete(&self, task: &Task) -> Result<Option<String>>;
}

fn system_instruction() -> String {
    format!(
        "You write complete programs that solve the user's task. The program reads its input from STDIN \
         and writes its answer to STDOUT. Reply with the source code, then the dependencies one per line, \
         then the compile flags (C only), separated by lines containing exactly '{d}'. Leave a section \
         empty when there is nothing to declare. Do not use code fences.\n\
         Example (Python):\n\
         import sys\n\
         print(sum(map(int, sys.stdin.read().split())))\n\
         {d}\n\
         {d}",
        d = SECTION_DELIMITER
    )
}

/// OpenAI-compatible chat completions client, pointed at OpenRouter by default
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            model,
        }
    }

    pub fn from_env(model: String) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{} is not set", API_KEY_ENV))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn build_request_body(&self, task: &Task) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_instruction() },
                { "role": "user", "content": task.prompt },
            ],
        })
    }
}

/// `choices[0].message.content`, if present and non-empty
fn extract_content(response: &Value) -> Option<String> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map(String::from)
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(&self, task: &Task) -> Result<Option<String>> {
        let url = format!("{}/chat/completions", self.api_base);
        debug!(task_id = %task.id, model = %self.model, "Requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request_body(task))
            .send()
            .await
            .context("Completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Completion request returned {}: {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to decode completion response")?;
        Ok(extract_content(&body))
    }
}

/// Replays saved payloads from `<dir>/<task-id>.txt`
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    dir: PathBuf,
}

impl DirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CompletionProvider for DirectoryProvider {
    async fn complete(&self, task: &Task) -> Result<Option<String>> {
        let path = self.dir.join(format!("{}.txt", task.id));
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyjudge_common::types::Language;
    use tempfile::TempDir;

    fn make_task(id: &str) -> Task {
        Task::new(id, Language::Python, vec![], "Add two numbers", "/tmp/unused")
    }

    #[test]
    fn test_extract_content() {
        let response = json!({ "choices": [{ "message": { "role": "assistant", "content": "print(1)" } }] });
        assert_eq!(extract_content(&response).as_deref(), Some("print(1)"));
    }

    #[test]
    fn test_extract_content_missing_or_empty() {
        assert_eq!(extract_content(&json!({ "choices": [] })), None);
        assert_eq!(
            extract_content(&json!({ "choices": [{ "message": { "content": "" } }] })),
            None
        );
        assert_eq!(
            extract_content(&json!({ "choices": [{ "message": { "content": null } }] })),
            None
        );
    }

    #[test]
    fn test_request_body_carries_model_and_prompt() {
        let provider = OpenRouterProvider::new("key".to_string(), "some/model".to_string());
        let body = provider.build_request_body(&make_task("task1_python_add"));

        assert_eq!(body["model"], "some/model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains(SECTION_DELIMITER));
        assert_eq!(body["messages"][1]["content"], "Add two numbers");
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let provider = OpenRouterProvider::new("k".to_string(), "m".to_string())
            .with_api_base("http://localhost:8080/v1/".to_string());
        assert_eq!(provider.api_base, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn test_directory_provider() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("task1_python_add.txt"), "print(3)").unwrap();
        let provider = DirectoryProvider::new(dir.path());

        let found = provider.complete(&make_task("task1_python_add")).await.unwrap();
        assert_eq!(found.as_deref(), Some("print(3)"));

        let missing = provider.complete(&make_task("task2_python_other")).await.unwrap();
        assert!(missing.is_none());
    }
}
