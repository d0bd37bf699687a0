//! # shellsmith core
//!
//! Domain types, traits, and error definitions for the shellsmith agent loop.
//! This crate has no transport or process dependencies: it defines the
//! conversation model and the seams (`Provider`, `Tool`) that the other
//! crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: turns and the append-only conversation history
//! - [`tool`]: tool calls, the `Tool` trait and the dispatcher
//! - [`provider`]: the model transport abstraction
//! - [`event`]: broadcast domain events
//! - [`error`]: error taxonomy

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{History, Role, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolContext, ToolRegistry};
