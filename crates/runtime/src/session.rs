//! Session management.
//!
//! One turn runs: model output -> extract -> parse -> validate -> dispatch
//! -> format. Every failure along the way becomes an [`OutgoingMessage`];
//! nothing escapes the turn.

use crate::catalog::ToolCatalog;
use crate::format::{Formatter, Outcome, OutgoingMessage};
use crate::llm::{Backend, GenerateRequest, Message};
use crate::tools::{Dispatcher, ToolRegistry};
use crate::validate::validate;
use policy::Policy;
use protocol::{ExtractionError, Template, Warning, extract, parse};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

const DEFAULT_PERSONA: &str = "You are a helpful assistant.";

/// Identifies one turn in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Steps a turn passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    AwaitingModelOutput,
    Extracting,
    NoCall,
    CallFound,
    Parsing,
    ParseFailed,
    Parsed,
    Validating,
    Invalid,
    Valid,
    Dispatching,
    Formatting,
    Responded,
}

/// The result of one turn.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub id: TurnId,
    /// What the model produced, untouched.
    pub raw_output: String,
    pub message: OutgoingMessage,
    /// States visited, in order, ending in [`TurnState::Responded`].
    pub trail: Vec<TurnState>,
}

/// Everything a turn needs besides the model.
///
/// Cheap to clone; the catalog and registry are shared.
#[derive(Debug, Clone)]
pub struct Pipeline {
    catalog: Arc<ToolCatalog>,
    dispatcher: Dispatcher,
    policy: Policy,
    formatter: Formatter,
}

impl Pipeline {
    pub fn new(catalog: Arc<ToolCatalog>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            catalog,
            dispatcher: Dispatcher::new(registry),
            policy: Policy::lenient(),
            formatter: Formatter::default(),
        }
    }

    /// Apply a policy, including its tool deadline.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.dispatcher = self.dispatcher.with_deadline(policy.tool_timeout());
        self.policy = policy;
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.formatter = Formatter::new(template);
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn template(&self) -> &Template {
        self.formatter.template()
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Run the call pipeline over model text that is already in hand.
    pub async fn respond(&self, raw_output: &str) -> Turn {
        let id = TurnId::new();
        let span = info_span!("turn", %id);
        async {
            let mut trail = vec![TurnState::AwaitingModelOutput];
            let message = self.run(raw_output, &mut trail).await;
            trail.push(TurnState::Responded);
            Turn {
                id,
                raw_output: raw_output.to_string(),
                message,
                trail,
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, raw: &str, trail: &mut Vec<TurnState>) -> OutgoingMessage {
        trail.push(TurnState::Extracting);
        let outcome = match extract(raw, self.template()) {
            Ok(None) => {
                trail.push(TurnState::NoCall);
                Outcome::PlainText(raw.to_string())
            }
            Err(err) => {
                warn!(error = %err, "treating unterminated call block as plain text");
                trail.push(TurnState::NoCall);
                Outcome::PlainText(raw.to_string())
            }
            Ok(Some(candidate)) => {
                trail.push(TurnState::CallFound);
                self.call(candidate.text, candidate.ignored_blocks, trail).await
            }
        };
        trail.push(TurnState::Formatting);
        self.formatter.format(outcome)
    }

    async fn call(&self, text: &str, ignored_blocks: usize, trail: &mut Vec<TurnState>) -> Outcome {
        trail.push(TurnState::Parsing);
        let mut parsed = match parse(text) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, candidate = text, "could not parse tool call");
                trail.push(TurnState::ParseFailed);
                return Outcome::ParseFailed(err);
            }
        };
        trail.push(TurnState::Parsed);

        // Calls listed inside the block count the same as extra blocks.
        let listed: usize = parsed
            .warnings
            .iter()
            .map(|warning| match warning {
                Warning::IgnoredCalls { count } => *count,
                _ => 0,
            })
            .sum();
        let calls = 1 + listed + ignored_blocks;
        if let policy::Decision::Deny { reason } = self.policy.check_call_count(calls) {
            warn!(%reason, calls, "rejecting reply");
            return Outcome::Rejected(ExtractionError::MultipleCalls(calls));
        }
        if ignored_blocks > 0 {
            parsed.warnings.push(Warning::IgnoredCalls {
                count: ignored_blocks,
            });
        }
        for warning in &parsed.warnings {
            warn!(%warning, "tool call");
        }
        debug!(call = %parsed.signature(), "parsed tool call");

        trail.push(TurnState::Validating);
        let call = match validate(parsed, &self.catalog, &self.policy) {
            Ok(call) => call,
            Err(err) => {
                warn!(error = %err, "rejected tool call");
                trail.push(TurnState::Invalid);
                return Outcome::Invalid(err);
            }
        };
        trail.push(TurnState::Valid);

        trail.push(TurnState::Dispatching);
        info!(tool = %call.name, "dispatching");
        let result = self.dispatcher.dispatch(&call).await;
        Outcome::Dispatched {
            tool: call.name,
            result,
            warnings: call.warnings,
        }
    }
}

/// Run the call pipeline over `raw_output` without a session.
///
/// For transports that receive model text from elsewhere.
pub async fn respond(raw_output: &str, pipeline: &Pipeline) -> Turn {
    pipeline.respond(raw_output).await
}

/// A conversation session bound to one model backend.
pub struct Session<B> {
    backend: B,
    pipeline: Pipeline,
    persona: Option<String>,
}

impl<B: Backend> Session<B> {
    /// Create a session with the lenient policy and the default template.
    pub fn new(backend: B, catalog: Arc<ToolCatalog>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            backend,
            pipeline: Pipeline::new(catalog, registry),
            persona: None,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.pipeline = self.pipeline.with_policy(policy);
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.pipeline = self.pipeline.with_template(template);
        self
    }

    /// Set the persona that follows the tool list in the system prompt.
    pub fn with_system(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The full system prompt: tool list, then persona.
    pub fn system_prompt(&self) -> String {
        let persona = self.persona.as_deref().unwrap_or(DEFAULT_PERSONA);
        self.pipeline
            .catalog()
            .system_prompt(self.pipeline.template(), persona)
    }

    /// Send a user message and handle whatever the model replies.
    ///
    /// Appends the user message and the raw model reply to `history`.
    pub async fn handle_turn(&self, user_input: &str, history: &mut Vec<Message>) -> Turn {
        history.push(Message::user(user_input));
        self.generate(history).await
    }

    /// Feed a tool response back to the model and handle its next reply.
    ///
    /// Returns `None` when `turn` did not produce a tool response.
    pub async fn feed_back(&self, history: &mut Vec<Message>, turn: &Turn) -> Option<Turn> {
        let OutgoingMessage::ToolResponse { envelope, .. } = &turn.message else {
            return None;
        };
        history.push(Message::tool(envelope.clone()));
        Some(self.generate(history).await)
    }

    async fn generate(&self, history: &mut Vec<Message>) -> Turn {
        let system = self.system_prompt();
        let request = GenerateRequest {
            system: Some(&system),
            messages: history.as_slice(),
        };
        let generated = self.backend.generate(request).await;
        match generated {
            Ok(raw) => {
                history.push(Message::assistant(raw.clone()));
                self.pipeline.respond(&raw).await
            }
            Err(err) => {
                let id = TurnId::new();
                warn!(%id, error = %err, "model backend failed");
                Turn {
                    id,
                    raw_output: String::new(),
                    message: self.pipeline.formatter.format(Outcome::ModelFailed(err.to_string())),
                    trail: vec![
                        TurnState::AwaitingModelOutput,
                        TurnState::Formatting,
                        TurnState::Responded,
                    ],
                }
            }
        }
    }
}
