//! Sourcing agent - LLM-powered supplier discovery and evaluation
//!
//! This crate is the "brain" of the sourcing system. It coordinates a fixed
//! four-stage pipeline over a single model client:
//!
//! 1. **Research** (`pipeline`) - web search plus model extraction of
//!    supplier leads
//! 2. **Analyze** - rubric scoring of each lead on a 1-10 scale
//! 3. **Assess risk** - eight named risk categories on an ordinal scale
//! 4. **Report** - synthesis into an executive sourcing report
//!
//! # Key Types
//!
//! - `SourcingPipeline` - Main orchestrator (see `pipeline` module)
//! - `LlmClient` - Pluggable trait for OpenAI/Gemini
//! - `WebSearch` - Best-effort search facade over Tavily/Serper
//!
//! # Degradation Principle
//!
//! Model and search providers are unreliable collaborators. Every external
//! failure is absorbed at a stage boundary and replaced with that stage's
//! documented default; a run always finishes with a report.

pub mod llm;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod search;

pub use llm::{client_from_config, GeminiClient, LlmClient, OpenAiChatClient};
pub use pipeline::{
    PipelineOutcome, SourcingPipeline, SourcingRequest, Stage, StageDegradation,
};
pub use search::{SearchHit, SearchProvider, SerperSearch, TavilySearch, WebSearch};
