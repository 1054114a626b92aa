//! Piston-compatible HTTP execution client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ExecutionError, SandboxExecutor, SandboxResponse};
use crate::core::RuntimeConfig;

/// Compile and run ceilings requested from the sandbox, in milliseconds
const DEFAULT_COMPILE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_RUN_TIMEOUT_MS: u64 = 3_000;

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<SourceFile<'a>>,
    stdin: &'a str,
    compile_timeout: u64,
    run_timeout: u64,
}

#[derive(Debug, Serialize)]
struct SourceFile<'a> {
    name: &'a str,
    content: &'a str,
}

/// Raw `/execute` response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExecuteResponse {
    #[serde(default)]
    compile: Option<Stage>,
    #[serde(default)]
    run: Option<Stage>,
    #[serde(default)]
    message: Option<String>,
}

/// One compile or run stage
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Stage {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    output: String,
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    signal: Option<String>,
    /// Newer Piston versions report `TO` for a timeout
    #[serde(default)]
    status: Option<String>,
}

impl Stage {
    fn failed(&self) -> bool {
        self.code.is_some_and(|code| code != 0) || self.signal.is_some()
    }

    fn killed(&self) -> bool {
        self.signal.as_deref() == Some("SIGKILL") || self.status.as_deref() == Some("TO")
    }

    /// Most informative diagnostic text
    fn diagnostic(&self) -> Option<&str> {
        [&self.stderr, &self.output, &self.stdout]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

/// Fold a raw response into one of the four outcome classes
pub(crate) fn classify(response: ExecuteResponse) -> SandboxResponse {
    if let Some(compile) = &response.compile {
        if compile.killed() {
            return SandboxResponse::timed_out();
        }
        if compile.failed() {
            let message = match compile.diagnostic() {
                Some(text) => text.to_string(),
                None => format!("Compilation failed (exit code {:?})", compile.code),
            };
            return SandboxResponse::compile_error(message);
        }
    }

    let Some(run) = response.run else {
        let message = response
            .message
            .unwrap_or_else(|| "Sandbox returned no run stage".to_string());
        return SandboxResponse::runtime_error(message);
    };

    if run.killed() {
        return SandboxResponse {
            stdout: run.stdout,
            stderr: run.stderr,
            timed_out: true,
            ..Default::default()
        };
    }

    let runtime_error = if let Some(signal) = &run.signal {
        Some(match run.stderr.trim() {
            "" => format!("Killed by signal {}", signal),
            text => text.to_string(),
        })
    } else if run.code.is_some_and(|code| code != 0) {
        Some(match run.stderr.trim() {
            "" => format!("Exited with code {}", run.code.unwrap_or_default()),
            text => text.to_string(),
        })
    } else if !run.stderr.trim().is_empty() {
        Some(run.stderr.trim().to_string())
    } else {
        None
    };

    SandboxResponse {
        stdout: run.stdout,
        stderr: run.stderr,
        runtime_error,
        ..Default::default()
    }
}

/// Client for `POST {base_url}/execute`
#[derive(Debug, Clone)]
pub struct PistonClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    compile_timeout_ms: u64,
    run_timeout_ms: u64,
}

impl PistonClient {
    /// `timeout` is the local wall-clock ceiling for the whole call
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ExecutionError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            compile_timeout_ms: DEFAULT_COMPILE_TIMEOUT_MS,
            run_timeout_ms: DEFAULT_RUN_TIMEOUT_MS,
        })
    }

    /// Limits the sandbox applies to the compile and run stages
    pub fn with_stage_timeouts(mut self, compile: Duration, run: Duration) -> Self {
        self.compile_timeout_ms = compile.as_millis().try_into().unwrap_or(u64::MAX);
        self.run_timeout_ms = run.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    async fn post(
        &self,
        runtime: &RuntimeConfig,
        source: &str,
        stdin: Option<&str>,
    ) -> Result<SandboxResponse, ExecutionError> {
        let request = ExecuteRequest {
            language: &runtime.sandbox_language,
            version: &runtime.version,
            files: vec![SourceFile {
                name: &runtime.file_name,
                content: source,
            }],
            stdin: stdin.unwrap_or_default(),
            compile_timeout: self.compile_timeout_ms,
            run_timeout: self.run_timeout_ms,
        };

        let response = self
            .client
            .post(format!("{}/execute", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Sandbox rate limit hit");
            return Ok(SandboxResponse::runtime_error(
                "Sandbox rate limited the request (HTTP 429)",
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ExecuteResponse = serde_json::from_str(&body)
            .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;
        Ok(classify(parsed))
    }
}

#[async_trait]
impl SandboxExecutor for PistonClient {
    async fn execute(
        &self,
        runtime: &RuntimeConfig,
        source: &str,
        stdin: Option<&str>,
    ) -> Result<SandboxResponse, ExecutionError> {
        debug!(
            "Executing {} source ({} bytes) on {} {}",
            runtime.language,
            source.len(),
            runtime.sandbox_language,
            runtime.version
        );

        match tokio::time::timeout(self.timeout, self.post(runtime, source, stdin)).await {
            Ok(Err(ExecutionError::Http(e))) if e.is_timeout() => Ok(SandboxResponse::timed_out()),
            Ok(result) => result,
            Err(_) => {
                warn!("Sandbox call exceeded {:?}", self.timeout);
                Ok(SandboxResponse::timed_out())
            }
        }
    }
}
