//! Shared test helpers for agent loop tests.

use shellsmith_core::error::ProviderError;
use shellsmith_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use shellsmith_core::tool::ToolCall;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` returns the next result in the queue and keeps a
/// copy of the request. Panics if more calls are made than results provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    pub fn scripted(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// Create a provider that first proposes `calls`, then answers.
    pub fn tool_then_answer(calls: Vec<ToolCall>, answer: &str) -> Self {
        Self::new(vec![make_tool_call_response(calls), make_text_response(answer)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let mut responses = self.responses.lock().unwrap();
        let count = requests.len();

        if responses.is_empty() {
            panic!("SequentialMockProvider: no more responses (call #{count})");
        }

        requests.push(request);
        responses.remove(0)
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        text: text.into(),
        tool_calls: vec![],
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response that only proposes tool calls.
pub fn make_tool_call_response(calls: Vec<ToolCall>) -> ProviderResponse {
    ProviderResponse {
        text: String::new(),
        tool_calls: calls,
        usage: Some(Usage {
            prompt_tokens: 20,
            completion_tokens: 10,
            total_tokens: 30,
        }),
        model: "mock-model".into(),
    }
}

pub fn command_call(command: &str) -> ToolCall {
    ToolCall::new("executeCommand", serde_json::json!({ "command": command }))
}

pub fn write_call(file_path: &str, content: &str) -> ToolCall {
    ToolCall::new(
        "writeFile",
        serde_json::json!({ "filePath": file_path, "content": content }),
    )
}
