//! Execution client
//!
//! Submits one synthesized source file to the remote sandbox and classifies
//! the outcome. This module does NOT:
//! - Compare outputs or determine verdicts
//! - Retry failed calls
//! - Space calls apart (callers hold a `Throttle` for that)

pub mod piston;
pub mod throttle;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::RuntimeConfig;

pub use piston::PistonClient;
pub use throttle::Throttle;

/// Backend failure that prevented a classified response
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sandbox returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid sandbox response: {0}")]
    InvalidResponse(String),

    #[error("call throttle closed")]
    ThrottleClosed(#[from] tokio::sync::AcquireError),
}

/// Classified result of one sandbox call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxResponse {
    pub stdout: String,
    pub stderr: String,
    pub compile_error: Option<String>,
    pub runtime_error: Option<String>,
    pub timed_out: bool,
}

impl SandboxResponse {
    /// Clean run with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    pub fn compile_error(message: impl Into<String>) -> Self {
        Self {
            compile_error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self {
            runtime_error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Default::default()
        }
    }

    /// Whether stdout should be handed to the verifier
    pub fn is_success(&self) -> bool {
        self.compile_error.is_none() && self.runtime_error.is_none() && !self.timed_out
    }
}

/// Remote code execution backend
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    /// Compile (if needed) and run `source` once with `stdin`
    async fn execute(
        &self,
        runtime: &RuntimeConfig,
        source: &str,
        stdin: Option<&str>,
    ) -> Result<SandboxResponse, ExecutionError>;
}
