//! Prompt queue loading.

use std::path::{Path, PathBuf};

use crate::error::{AutomationError, Result};

/// One unit of work: a prompt, its 1-based position in the queue, and an
/// optional output directory override. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptJob {
    pub text: String,
    pub sequence: u32,
    pub output_dir: Option<PathBuf>,
}

/// Ordered, validated prompt queue.
#[derive(Debug, Clone, Default)]
pub struct PromptQueue {
    jobs: Vec<PromptJob>,
}

impl PromptQueue {
    /// Build a queue from an ordered list of prompts. Blank entries are
    /// skipped; an entirely empty queue is an error.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let jobs: Vec<PromptJob> = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, text)| PromptJob {
                text,
                sequence: i as u32 + 1,
                output_dir: None,
            })
            .collect();

        if jobs.is_empty() {
            return Err(AutomationError::Validation(
                "prompt queue is empty".to_string(),
            ));
        }
        Ok(Self { jobs })
    }

    /// Read one prompt per line from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_lines(content.lines())
    }

    pub fn jobs(&self) -> &[PromptJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
