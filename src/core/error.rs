//! Error taxonomy for the judging pipeline
//!
//! `ConfigurationMissing` and `UnsupportedLanguage` abort a whole submission
//! before the sandbox is contacted. The remaining variants are local to one
//! test case and end up in that case's `ExecutionResult`.

use thiserror::Error;

use crate::decoder::DecodeError;
use crate::executor::ExecutionError;

pub type JudgeResult<T> = std::result::Result<T, JudgeError>;

#[derive(Error, Debug)]
pub enum JudgeError {
    /// No registry entry for the problem title
    #[error("No judge configuration for problem '{0}'")]
    ConfigurationMissing(String),

    /// Unknown language, or no wrapper hints for it on this problem
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid test input: {0}")]
    Decode(#[from] DecodeError),

    /// Hints and arguments cannot be turned into a driver
    #[error("Could not build driver: {0}")]
    Synthesis(String),

    #[error("Execution backend error: {0}")]
    Execution(#[from] ExecutionError),
}
