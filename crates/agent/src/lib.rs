//! AI-backed extractors for the quotation pipeline.
//!
//! This crate owns everything that talks to a hosted language model:
//! - `llm`: the [`LlmClient`] seam and its error type
//! - `providers`: HTTP clients for the chat-completions protocol (Groq,
//!   OpenAI), Gemini and Anthropic
//! - `extractor`: [`LlmExtractor`], which turns any client into an
//!   `Extractor` by composing the prompt and parsing the reply
//! - `registry`: [`ExtractorRegistry`], which builds the ordered provider
//!   chain from configuration
//!
//! # Safety Principle
//!
//! The model only proposes line items. Every reply goes through the shared
//! response parser and line-item validation before it reaches a caller, and
//! any failure hands control to the next extractor in the chain.

pub mod extractor;
pub mod llm;
pub mod providers;
pub mod registry;

pub use extractor::LlmExtractor;
pub use llm::{GenerationOptions, LlmClient, LlmError};
pub use registry::ExtractorRegistry;
