//! Test-only helpers: scripted completion clients, temporary repositories, and
//! configuration fixtures.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use crate::io::completion::{CompletionClient, CompletionError};
use crate::io::config::{AgentConfig, AgentSettings, LlmOverrides, RetrySettings};

/// Completion client that replays a fixed script and records every prompt.
pub struct ScriptedCompletionClient {
    script: RefCell<VecDeque<Result<Value, CompletionError>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedCompletionClient {
    pub fn new(script: Vec<Result<Value, CompletionError>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl CompletionClient for ScriptedCompletionClient {
    fn complete(&self, prompt: &str) -> Result<Value, CompletionError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(CompletionError::EmptyResponse))
    }
}

/// Configuration rooted at `root` with outcome records under `root/out`,
/// a fake API key, and retries without delay.
pub fn test_config(root: &Path) -> AgentConfig {
    let root = root.canonicalize().expect("canonical test root");
    let settings = AgentSettings {
        retry: RetrySettings {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        },
        ..AgentSettings::default()
    };
    AgentConfig::from_parts(
        root.clone(),
        root.join("out"),
        settings,
        LlmOverrides {
            api_key: Some("test-key".to_string()),
            ..LlmOverrides::default()
        },
    )
}

/// Temporary repository checkout for pipeline tests.
pub struct TestRepo {
    dir: tempfile::TempDir,
}

impl TestRepo {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` at `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> std::io::Result<()> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    pub fn read(&self, relative: &str) -> std::io::Result<String> {
        fs::read_to_string(self.dir.path().join(relative))
    }

    pub fn config(&self) -> AgentConfig {
        test_config(self.path())
    }
}

/// Wrap `content` in a chat-completions response envelope.
pub fn chat_envelope(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}
