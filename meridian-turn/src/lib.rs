#![deny(missing_docs)]
//! Shared toolkit for building agent nodes: wire types, the [`Provider`]
//! trait, context compaction strategy, and prompt template loading.
//!
//! This crate carries the pieces every ReAct-style [`layer0::Operator`]
//! needs but that don't belong to any one agent: the provider-agnostic
//! message/request/response types, the (non-object-safe) LLM backend
//! boundary, context window compaction, and prompt template substitution.
//!
//! Key traits defined here:
//! - [`Provider`] — LLM provider interface (not object-safe, uses RPITIT)
//! - [`ContextStrategy`] — context window management
//! - [`PromptLoader`] — prompt template substitution

pub mod config;
pub mod context;
pub mod convert;
pub mod prompt;
pub mod provider;
pub mod types;

// Re-exports
pub use config::TurnConfig;
pub use context::{ContextStrategy, NoCompaction};
pub use convert::{
    content_block_to_part, content_part_to_block, content_to_parts, content_to_user_message,
    parts_to_content,
};
pub use prompt::{PromptError, PromptLoader, StaticPromptLoader};
pub use provider::{Provider, ProviderError};
pub use types::*;
