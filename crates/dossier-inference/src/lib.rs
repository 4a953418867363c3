//! # dossier-inference
//!
//! Text-generation backend abstraction for dossier.
//!
//! Provides the OpenAI-compatible [`OpenAiBackend`], the deterministic
//! [`MockGenerationBackend`] for tests, and the [`DocumentTailor`] that
//! formats domain prompts (resume rewrites, cover letter drafts) over any
//! [`dossier_core::GenerationBackend`].

pub mod config;
pub mod mock;
pub mod openai;
pub mod tailor;

pub use config::GenerationConfig;
pub use mock::{MockCall, MockGenerationBackend};
pub use openai::OpenAiBackend;
pub use tailor::{cover_letter_prompt, resume_summary, rewrite_resume_prompt, DocumentTailor};
