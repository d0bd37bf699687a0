//! The agent reasoning loop implementation.

use crate::directive::SystemDirective;
use crate::rate_limiter::RateLimiter;
use shellsmith_config::AppConfig;
use shellsmith_core::error::ProviderError;
use shellsmith_core::event::{DomainEvent, EventBus};
use shellsmith_core::message::{History, Turn};
use shellsmith_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use shellsmith_core::tool::{ToolCall, ToolContext, ToolRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Returned (and recorded as a model turn) when the iteration cap is hit.
pub const ITERATION_LIMIT_NOTICE: &str =
    "I've reached the maximum number of tool call iterations. Please provide further guidance.";

/// Where the loop is within one operator request.
#[derive(Debug)]
enum LoopState {
    /// Waiting on admission and the model's reply
    AwaitingModel,
    /// Running the one tool call the model asked for
    Dispatching(ToolCall),
    /// The model answered in plain text
    Done(String),
}

/// The core agent loop that orchestrates model calls and tool execution.
pub struct AgentLoop {
    /// The model transport
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Tools the model may call
    tools: Arc<ToolRegistry>,

    /// Fixed instructions sent with every request
    directive: SystemDirective,

    /// Shared for the lifetime of the process
    rate_limiter: Arc<RateLimiter>,

    /// Working directory and command timeout for tool execution
    context: ToolContext,

    /// Maximum model requests per operator request; `None` is unbounded
    max_iterations: Option<u32>,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    /// Create a new agent loop.
    ///
    /// Starts with the host directive for the registry's tools, the default
    /// rate limit, and the current directory as working directory.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let directive = SystemDirective::for_host(&tools.names());
        let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            provider,
            model: model.into(),
            temperature,
            tools,
            directive,
            rate_limiter: Arc::new(RateLimiter::default()),
            context: ToolContext::new(working_dir),
            max_iterations: None,
            event_bus,
        }
    }

    /// Create an agent loop with every setting taken from `config`.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut agent = Self::new(
            provider,
            config.model(),
            config.default_temperature,
            tools,
            event_bus,
        )
        .with_rate_limiter(Arc::new(RateLimiter::from_config(&config.rate_limit)))
        .with_working_dir(config.working_dir());

        if let Some(max) = config.agent.max_iterations {
            agent = agent.with_max_iterations(max);
        }
        if let Some(secs) = config.agent.command_timeout_secs {
            agent = agent.with_command_timeout(Duration::from_secs(secs));
        }
        if let Some(text) = &config.agent.system_directive_override {
            agent = agent.with_directive(SystemDirective::custom(text.clone()));
        }
        agent
    }

    /// Cap the number of model requests per operator request.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Replace the system directive.
    pub fn with_directive(mut self, directive: SystemDirective) -> Self {
        self.directive = directive;
        self
    }

    /// Share a rate limiter (e.g. across several loops in one process).
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    /// Set the directory tools run in.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.context.working_dir = dir.into();
        self
    }

    /// Limit how long a single command line may run.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.context.command_timeout = Some(timeout);
        self
    }

    pub fn directive(&self) -> &SystemDirective {
        &self.directive
    }

    pub fn working_dir(&self) -> &std::path::Path {
        &self.context.working_dir
    }

    /// Drive the conversation until the model answers in plain text.
    ///
    /// The caller has already appended the operator's turn to `history`.
    /// Every model request carries the whole history, the directive and the
    /// tool schema. When a response proposes tool calls only the first is
    /// run; its output is appended as a tool-result turn and the model is
    /// asked again. A provider failure ends processing with an error, and
    /// the history keeps every turn appended so far.
    pub async fn process(&self, history: &mut History) -> Result<String, shellsmith_core::Error> {
        info!(turns = history.len(), "Processing operator request");

        let tool_definitions = self.tools.definitions();
        let mut iteration: u32 = 0;
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if let Some(max) = self.max_iterations
                        && iteration >= max
                    {
                        warn!(iterations = iteration, "Max iterations reached, stopping");
                        history.push(Turn::model(ITERATION_LIMIT_NOTICE));
                        return Ok(ITERATION_LIMIT_NOTICE.to_string());
                    }
                    iteration += 1;

                    let response = self
                        .request_model(history, &tool_definitions, iteration)
                        .await?;
                    Self::next_state(response)?
                }

                LoopState::Dispatching(call) => {
                    let turn = self.dispatch(&call).await;
                    history.push(turn);
                    LoopState::AwaitingModel
                }

                LoopState::Done(text) => {
                    history.push(Turn::model(text.clone()));
                    self.event_bus.publish(DomainEvent::AnswerProduced {
                        chars: text.chars().count(),
                        timestamp: chrono::Utc::now(),
                    });
                    return Ok(text);
                }
            };
        }
    }

    /// Wait for admission, send one request, and record it once issued.
    async fn request_model(
        &self,
        history: &History,
        tool_definitions: &[ToolDefinition],
        iteration: u32,
    ) -> Result<ProviderResponse, shellsmith_core::Error> {
        let waited = self.rate_limiter.wait_for_admission().await;
        if !waited.is_zero() {
            self.event_bus.publish(DomainEvent::RateLimited {
                wait_ms: waited.as_millis() as u64,
                timestamp: chrono::Utc::now(),
            });
        }

        debug!(iteration, turns = history.len(), "Agent loop iteration");
        self.event_bus.publish(DomainEvent::ModelRequested {
            iteration,
            history_len: history.len(),
            timestamp: chrono::Utc::now(),
        });

        let request = ProviderRequest {
            model: self.model.clone(),
            system_directive: self.directive.as_str().to_string(),
            turns: history.turns().to_vec(),
            tools: tool_definitions.to_vec(),
            temperature: self.temperature,
        };

        let response = self.provider.complete(request).await?;
        self.rate_limiter.record().await;

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                tokens = usage.total_tokens,
                "Model responded"
            );
        }
        Ok(response)
    }

    /// Only the first proposed call is honoured. A response with neither a
    /// call nor text is rejected and leaves the history untouched.
    fn next_state(response: ProviderResponse) -> Result<LoopState, shellsmith_core::Error> {
        if let Some(call) = response.first_tool_call() {
            let discarded = response.tool_calls.len() - 1;
            if discarded > 0 {
                debug!(tool = %call.name, discarded, "Ignoring extra tool calls in response");
            }
            info!(tool = %call.name, "Model requested tool");
            return Ok(LoopState::Dispatching(call.clone()));
        }

        if response.text.trim().is_empty() {
            warn!(model = %response.model, "Model returned an empty answer");
            return Err(ProviderError::InvalidResponse(
                "model returned neither text nor a tool call".into(),
            )
            .into());
        }
        Ok(LoopState::Done(response.text))
    }

    /// Run one tool call. Dispatch failures become an error turn so the
    /// model can read them and recover.
    async fn dispatch(&self, call: &ToolCall) -> Turn {
        let start = Instant::now();
        let turn = match self.tools.dispatch(call, &self.context).await {
            Ok(turn) => turn,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                Turn::tool_result(&call.name, "Tool output", format!("Error: {e}"))
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(tool = %call.name, duration_ms, output = %turn.text(), "Tool finished");
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: call.name.clone(),
            duration_ms,
            output: turn.text().to_string(),
            timestamp: chrono::Utc::now(),
        });
        turn
    }
}
