//! Document tailoring prompts and the high-level rewrite entry points.
//!
//! The engine hands the tailor a source document plus job context; the tailor
//! formats the prompt and delegates to the configured [`GenerationBackend`].
//! Output is opaque text, required non-empty and otherwise uninspected.

use std::sync::Arc;

use tracing::debug;

use dossier_core::{Error, GenerationBackend, Result};

/// System context for resume rewrites.
const RESUME_SYSTEM: &str =
    "You are an expert resume editor who tailors resumes to specific job descriptions.";

/// System context for cover letter drafting.
const COVER_LETTER_SYSTEM: &str =
    "You are an expert career writer who drafts concise, specific cover letters.";

/// How many leading lines of a resume are used as the summary fed to
/// cover-letter drafting.
const RESUME_SUMMARY_LINES: usize = 10;

/// Build the prompt for rewriting a resume against a job description.
pub fn rewrite_resume_prompt(
    resume_markdown: &str,
    job_description: &str,
    instructions: Option<&str>,
) -> String {
    let instructions_block = match instructions {
        Some(text) if !text.trim().is_empty() => format!(
            "\nAdditional instructions from the candidate, to be followed exactly:\n{}\n",
            text
        ),
        _ => String::new(),
    };

    format!(
        r#"Rewrite the following resume so it targets the job description below.
Keep every claim truthful to the original; reorder, rephrase, and emphasize
relevant experience. Preserve markdown structure. Output only the rewritten
resume, no commentary.
{instructions_block}
Job description:
{job_description}

Resume:
{resume_markdown}"#
    )
}

/// Build the prompt for drafting a cover letter.
pub fn cover_letter_prompt(
    resume_summary: &str,
    job_description: &str,
    company: &str,
    position: &str,
    instructions: Option<&str>,
) -> String {
    let instructions_block = match instructions {
        Some(text) if !text.trim().is_empty() => format!(
            "\nAdditional instructions from the candidate, to be followed exactly:\n{}\n",
            text
        ),
        _ => String::new(),
    };

    format!(
        r#"Draft a cover letter for the {position} position at {company}.
Ground it in the candidate background below and address the job description
directly. Output only the letter body, no commentary.
{instructions_block}
Job description:
{job_description}

Candidate background:
{resume_summary}"#
    )
}

/// Leading lines of a resume used as candidate background.
pub fn resume_summary(resume_markdown: &str) -> String {
    resume_markdown
        .lines()
        .take(RESUME_SUMMARY_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

/// High-level tailoring interface over a generation backend.
#[derive(Clone)]
pub struct DocumentTailor {
    backend: Arc<dyn GenerationBackend>,
}

impl DocumentTailor {
    /// Create a tailor over the given backend.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Model slug of the underlying backend.
    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Rewrite a resume for a job description. Returns the new markdown.
    pub async fn rewrite_resume(
        &self,
        resume_markdown: &str,
        job_description: &str,
        instructions: Option<&str>,
    ) -> Result<String> {
        let prompt = rewrite_resume_prompt(resume_markdown, job_description, instructions);
        debug!(
            subsystem = "inference",
            component = "tailor",
            op = "rewrite_resume",
            model = %self.backend.model_name(),
            prompt_len = prompt.len(),
            "Requesting resume rewrite"
        );
        let output = self
            .backend
            .generate_with_system(RESUME_SYSTEM, &prompt)
            .await?;
        non_empty(output)
    }

    /// Draft a cover letter from a resume summary and job context.
    pub async fn draft_cover_letter(
        &self,
        resume_markdown: &str,
        job_description: &str,
        company: &str,
        position: &str,
        instructions: Option<&str>,
    ) -> Result<String> {
        let summary = resume_summary(resume_markdown);
        let prompt =
            cover_letter_prompt(&summary, job_description, company, position, instructions);
        debug!(
            subsystem = "inference",
            component = "tailor",
            op = "draft_cover_letter",
            model = %self.backend.model_name(),
            prompt_len = prompt.len(),
            "Requesting cover letter draft"
        );
        let output = self
            .backend
            .generate_with_system(COVER_LETTER_SYSTEM, &prompt)
            .await?;
        non_empty(output)
    }

    /// Rewrite a cover letter for a job description. Same shape as the
    /// resume rewrite; only the system context differs.
    pub async fn rewrite_cover_letter(
        &self,
        cover_letter_markdown: &str,
        job_description: &str,
        instructions: Option<&str>,
    ) -> Result<String> {
        let prompt = rewrite_resume_prompt(cover_letter_markdown, job_description, instructions);
        let output = self
            .backend
            .generate_with_system(COVER_LETTER_SYSTEM, &prompt)
            .await?;
        non_empty(output)
    }
}

fn non_empty(output: String) -> Result<String> {
    if output.trim().is_empty() {
        return Err(Error::Generation(
            "Empty response from generation backend".to_string(),
        ));
    }
    Ok(output)
}
