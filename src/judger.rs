//! Judger module for processing run/submit requests
//!
//! Resolves the problem and language once, then pushes every test case
//! through decode → synthesize → execute → verify. Cheap fatal failures
//! (unknown problem, unsupported language) abort before any sandbox call;
//! everything else is recorded on the failing test case only.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::languages::get_runtime_config;
use crate::core::value::DEFAULT_FLOAT_TOLERANCE;
use crate::core::{JudgeError, JudgeResult, Language, RuntimeConfig, Verdict};
use crate::decoder::{decode, Arguments};
use crate::executor::{SandboxExecutor, SandboxResponse, Throttle};
use crate::problems::{OutputFormat, ProblemConfig, ProblemRegistry, WrapperHints};
use crate::synth::synthesize;
use crate::verifier::{verify_call_log, verify_with_tolerance};

/// One test case as stored with the problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub output: String,
    #[serde(default, alias = "isHidden")]
    pub is_hidden: bool,
}

/// Outcome of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    pub verdict: Verdict,
    /// Compile error / runtime error / timeout / mismatch description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_hidden: bool,
}

impl ExecutionResult {
    fn failed(case: &TestCase, verdict: Verdict, actual: String, error: String) -> Self {
        Self {
            input: case.input.clone(),
            expected: case.output.clone(),
            actual,
            passed: false,
            verdict,
            error: Some(error),
            is_hidden: case.is_hidden,
        }
    }
}

/// "run" executes the visible cases only, "submit" all of them
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Run,
    Submit,
}

/// Job received from the Redis queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeJob {
    pub submission_id: i64,
    pub problem_title: String,
    pub language: String,
    pub code: String,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub mode: RunMode,
}

/// Result of judging a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeReport {
    pub submission_id: i64,
    /// Every executed test case passed
    pub passed: bool,
    /// First non-accepted verdict, in test order
    pub verdict: Verdict,
    pub results: Vec<ExecutionResult>,
    /// Fatal configuration / language error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Everything a test case needs, resolved once per submission
struct Submission<'a> {
    config: Arc<ProblemConfig>,
    language: Language,
    runtime: RuntimeConfig,
    hints: WrapperHints,
    code: &'a str,
}

/// Judge orchestrator
pub struct Judge {
    registry: Arc<ProblemRegistry>,
    executor: Arc<dyn SandboxExecutor>,
    throttle: Arc<Throttle>,
    concurrency: usize,
}

impl Judge {
    pub fn new(
        registry: Arc<ProblemRegistry>,
        executor: Arc<dyn SandboxExecutor>,
        throttle: Arc<Throttle>,
    ) -> Self {
        Self {
            registry,
            executor,
            throttle,
            concurrency: 1,
        }
    }

    /// Number of test cases in flight at once (results keep test order)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Resolve problem, language, hints and runtime; no sandbox call is made here
    fn prepare<'a>(&self, title: &str, language: &str, code: &'a str) -> JudgeResult<Submission<'a>> {
        let config = self.registry.lookup(title)?;
        let language = Language::resolve(language)
            .ok_or_else(|| JudgeError::UnsupportedLanguage(language.trim().to_string()))?;
        let hints = config.hints_for(language)?.clone();
        let runtime = get_runtime_config(language).ok_or_else(|| {
            JudgeError::UnsupportedLanguage(format!("no sandbox runtime for {}", language))
        })?;

        Ok(Submission {
            config,
            language,
            runtime,
            hints,
            code,
        })
    }

    /// Judge `code` against `test_cases`.
    ///
    /// Returns one result per executed case, in input order. In `Run` mode hidden
    /// cases are skipped entirely.
    pub async fn run_or_submit(
        &self,
        title: &str,
        language: &str,
        code: &str,
        test_cases: &[TestCase],
        mode: RunMode,
    ) -> JudgeResult<Vec<ExecutionResult>> {
        let submission = self.prepare(title, language, code)?;

        let selected: Vec<(usize, &TestCase)> = test_cases
            .iter()
            .filter(|case| mode == RunMode::Submit || !case.is_hidden)
            .enumerate()
            .collect();
        debug!(
            "Judging {} ({}) with {} test case(s)",
            submission.config.title,
            submission.language,
            selected.len()
        );

        let pending: Vec<_> = selected
            .into_iter()
            .map(|(idx, case)| self.run_case(&submission, idx + 1, case))
            .collect();
        let results = stream::iter(pending)
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(results)
    }

    async fn run_case(&self, sub: &Submission<'_>, number: usize, case: &TestCase) -> ExecutionResult {
        debug!("Test {}: decoding", number);
        let args = match decode(&case.input, sub.config.input_format) {
            Ok(args) => args,
            Err(e) => {
                let error = JudgeError::from(e).to_string();
                return ExecutionResult::failed(case, Verdict::InvalidInput, String::new(), error);
            }
        };

        debug!("Test {}: synthesizing {} driver", number, sub.language);
        let source = match synthesize(
            sub.language,
            sub.code,
            Some(&sub.hints),
            &args,
            sub.config.output_format,
        ) {
            Ok(source) => source,
            Err(e) => {
                return ExecutionResult::failed(case, Verdict::SystemError, String::new(), e.to_string())
            }
        };

        debug!("Test {}: submitting", number);
        let response = match self.execute(&sub.runtime, &source).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Test {}: sandbox call failed: {}", number, e);
                return ExecutionResult::failed(case, Verdict::SystemError, String::new(), e.to_string());
            }
        };

        let calls = match &args {
            Arguments::Transaction(tx) => Some(tx.calls().count()),
            Arguments::Call(_) => None,
        };
        self.finish_case(sub, number, case, calls, response)
    }

    async fn execute(&self, runtime: &RuntimeConfig, source: &str) -> JudgeResult<SandboxResponse> {
        let _permit = self.throttle.acquire().await?;
        Ok(self.executor.execute(runtime, source, None).await?)
    }

    fn finish_case(
        &self,
        sub: &Submission<'_>,
        number: usize,
        case: &TestCase,
        calls: Option<usize>,
        response: SandboxResponse,
    ) -> ExecutionResult {
        let actual = response.stdout.trim_end().to_string();

        if let Some(message) = response.compile_error {
            debug!("Test {}: compile error", number);
            return ExecutionResult::failed(
                case,
                Verdict::CompileError,
                actual,
                format!("Compilation error: {}", message),
            );
        }
        if response.timed_out {
            debug!("Test {}: timed out", number);
            return ExecutionResult::failed(
                case,
                Verdict::TimeLimitExceeded,
                actual,
                "Time limit exceeded".to_string(),
            );
        }
        if let Some(message) = response.runtime_error {
            debug!("Test {}: runtime error", number);
            return ExecutionResult::failed(
                case,
                Verdict::RuntimeError,
                actual,
                format!("Runtime error: {}", message),
            );
        }

        debug!("Test {}: verifying", number);
        let tolerance = sub.config.float_tolerance.unwrap_or(DEFAULT_FLOAT_TOLERANCE);
        let verification = match sub.config.output_format {
            OutputFormat::ClassResults => {
                verify_call_log(&case.output, &response.stdout, calls, tolerance)
            }
            format => verify_with_tolerance(&case.output, &response.stdout, format, tolerance),
        };

        if verification.passed {
            ExecutionResult {
                input: case.input.clone(),
                expected: case.output.clone(),
                actual,
                passed: true,
                verdict: Verdict::Accepted,
                error: None,
                is_hidden: case.is_hidden,
            }
        } else {
            let error = format!(
                "Wrong answer: expected {}, got {}",
                verification.normalized_expected, verification.normalized_actual
            );
            ExecutionResult::failed(case, Verdict::WrongAnswer, actual, error)
        }
    }

    /// Process a queued job into a report; fatal errors become a report too
    pub async fn judge(&self, job: &JudgeJob) -> JudgeReport {
        let outcome = self
            .run_or_submit(
                &job.problem_title,
                &job.language,
                &job.code,
                &job.test_cases,
                job.mode,
            )
            .await;

        let report = match outcome {
            Ok(results) => summarize(job.submission_id, results),
            Err(e) => {
                warn!("Submission {} rejected: {}", job.submission_id, e);
                JudgeReport {
                    submission_id: job.submission_id,
                    passed: false,
                    verdict: Verdict::SystemError,
                    results: Vec::new(),
                    error_message: Some(e.to_string()),
                }
            }
        };

        info!(
            "Job summary: submission_id={}, verdict={}, passed={}/{}",
            report.submission_id,
            report.verdict,
            report.results.iter().filter(|r| r.passed).count(),
            report.results.len()
        );
        report
    }
}

/// Submission-level verdict: all results passed, else the first failure
pub fn summarize(submission_id: i64, results: Vec<ExecutionResult>) -> JudgeReport {
    let verdict = results
        .iter()
        .map(|r| r.verdict)
        .find(|v| !v.is_accepted())
        .unwrap_or(Verdict::Accepted);

    JudgeReport {
        submission_id,
        passed: results.iter().all(|r| r.passed),
        verdict,
        results,
        error_message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutionError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Handler = dyn Fn(&str) -> (u64, Result<SandboxResponse, ExecutionError>) + Send + Sync;

    /// Answers each call from the synthesized source and counts calls
    struct MockExecutor {
        calls: AtomicUsize,
        handler: Box<Handler>,
    }

    impl MockExecutor {
        fn new(
            handler: impl Fn(&str) -> (u64, Result<SandboxResponse, ExecutionError>)
                + Send
                + Sync
                + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                handler: Box::new(handler),
            })
        }

        fn always(stdout: &'static str) -> Arc<Self> {
            Self::new(move |_| (0, Ok(SandboxResponse::success(stdout))))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SandboxExecutor for MockExecutor {
        async fn execute(
            &self,
            _runtime: &RuntimeConfig,
            source: &str,
            _stdin: Option<&str>,
        ) -> Result<SandboxResponse, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay_ms, result) = (self.handler)(source);
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            result
        }
    }

    fn judge_with(executor: Arc<MockExecutor>) -> Judge {
        let registry = Arc::new(ProblemRegistry::builtin().unwrap());
        Judge::new(registry, executor, Arc::new(Throttle::unlimited()))
    }

    fn case(input: &str, output: &str, is_hidden: bool) -> TestCase {
        TestCase {
            input: input.to_string(),
            output: output.to_string(),
            is_hidden,
        }
    }

    fn two_sum_cases() -> Vec<TestCase> {
        vec![
            case("4 9\n2 7 11 15", "[0,1]", false),
            case("3 6\n3 2 4", "[1,2]", true),
        ]
    }

    #[tokio::test]
    async fn test_unknown_problem_is_fatal_before_sandbox() {
        let executor = MockExecutor::always("");
        let judge = judge_with(executor.clone());
        let err = judge
            .run_or_submit("No Such Problem", "python", "", &two_sum_cases(), RunMode::Submit)
            .await
            .unwrap_err();
        assert!(matches!(err, JudgeError::ConfigurationMissing(_)));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_language_is_fatal_before_sandbox() {
        let executor = MockExecutor::always("");
        let judge = judge_with(executor.clone());
        let err = judge
            .run_or_submit("Two Sum", "rust", "", &two_sum_cases(), RunMode::Submit)
            .await
            .unwrap_err();
        assert!(matches!(err, JudgeError::UnsupportedLanguage(_)));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_hints_is_fatal_before_sandbox() {
        let mut registry = ProblemRegistry::builtin().unwrap();
        registry
            .merge_toml_str(
                r#"
[[problem]]
title = "Python Only"
input_format = "single_number"
output_format = "single_number"

[problem.hints.python]
function_name = "f"
param_types = ["int"]
return_type = "int"
"#,
            )
            .unwrap();

        let executor = MockExecutor::always("1\n");
        let judge = Judge::new(
            Arc::new(registry),
            executor.clone(),
            Arc::new(Throttle::unlimited()),
        );
        let err = judge
            .run_or_submit("python only", "java", "", &[case("1", "1", false)], RunMode::Run)
            .await
            .unwrap_err();
        assert!(matches!(err, JudgeError::UnsupportedLanguage(_)));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_two_sum_run_and_submit() {
        let executor = MockExecutor::always("0 1\n");
        let judge = judge_with(executor.clone());

        let results = judge
            .run_or_submit("Two Sum", "python", "class Solution: ...", &two_sum_cases(), RunMode::Run)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
        assert_eq!(results[0].verdict, Verdict::Accepted);
        assert_eq!(results[0].actual, "0 1");
        assert!(!results[0].is_hidden);

        let results = judge
            .run_or_submit("two sum", "py", "class Solution: ...", &two_sum_cases(), RunMode::Submit)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert!(results[1].is_hidden);
        assert_eq!(results[1].verdict, Verdict::WrongAnswer);
        assert!(results[1].error.as_deref().unwrap().starts_with("Wrong answer"));
        assert_eq!(executor.calls(), 3);
    }

    #[tokio::test]
    async fn test_malformed_input_fails_only_that_case() {
        let executor = MockExecutor::always("2\n");
        let judge = judge_with(executor.clone());
        let cases = vec![
            case("2", "2", false),
            case("abc", "1", false),
            case("2", "2", false),
        ];

        let results = judge
            .run_or_submit("Climbing Stairs", "cpp", "", &cases, RunMode::Run)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].passed && results[2].passed);
        assert_eq!(results[1].verdict, Verdict::InvalidInput);
        assert!(results[1].error.is_some());
        assert_eq!(executor.calls(), 2);
    }

    #[tokio::test]
    async fn test_sandbox_outcomes_map_to_verdicts() {
        let executor = MockExecutor::new(|source| {
            let response = if source.contains("judge_arg0 = 1\n") {
                Ok(SandboxResponse::compile_error("SyntaxError"))
            } else if source.contains("judge_arg0 = 2\n") {
                Ok(SandboxResponse::timed_out())
            } else if source.contains("judge_arg0 = 3\n") {
                Ok(SandboxResponse::runtime_error("RecursionError"))
            } else {
                Err(ExecutionError::InvalidResponse("garbage".into()))
            };
            (0, response)
        });
        let judge = judge_with(executor);
        let cases: Vec<_> = ["1", "2", "3", "4"]
            .iter()
            .map(|input| case(input, "1", false))
            .collect();

        let results = judge
            .run_or_submit("Climbing Stairs", "python", "", &cases, RunMode::Submit)
            .await
            .unwrap();
        let verdicts: Vec<_> = results.iter().map(|r| r.verdict).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::CompileError,
                Verdict::TimeLimitExceeded,
                Verdict::RuntimeError,
                Verdict::SystemError
            ]
        );
        assert!(results[0].error.as_deref().unwrap().contains("SyntaxError"));
        assert_eq!(results[1].error.as_deref(), Some("Time limit exceeded"));
        assert!(results.iter().all(|r| !r.passed));
    }

    #[tokio::test]
    async fn test_results_keep_order_under_concurrency() {
        // Earlier cases finish last
        let executor = MockExecutor::new(|source| {
            for n in 1..=4u64 {
                if source.contains(&format!("judge_arg0 = {}\n", n)) {
                    return (
                        (5 - n) * 20,
                        Ok(SandboxResponse::success(format!("{}\n", n))),
                    );
                }
            }
            (0, Ok(SandboxResponse::success("")))
        });
        let judge = judge_with(executor).with_concurrency(4);
        let cases: Vec<_> = (1..=4)
            .map(|n| case(&n.to_string(), &n.to_string(), n % 2 == 0))
            .collect();

        let results = judge
            .run_or_submit("Climbing Stairs", "python", "", &cases, RunMode::Submit)
            .await
            .unwrap();
        let inputs: Vec<_> = results.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(inputs, vec!["1", "2", "3", "4"]);
        assert!(results.iter().all(|r| r.passed));
        assert_eq!(
            results.iter().map(|r| r.is_hidden).collect::<Vec<_>>(),
            vec![false, true, false, true]
        );
    }

    #[tokio::test]
    async fn test_stack_transaction_replay() {
        let executor = MockExecutor::always("null\nnull\nnull\n2\n");
        let judge = judge_with(executor.clone());
        let cases = vec![
            case("[\"Stack\",\"push\",\"push\",\"pop\"]\n[[],[1],[2],[]]", "[null,null,null,2]", false),
            case("[\"Stack\",\"push\",\"push\",\"pop\"]\n[[],[1],[2],[]]", "[null,null,2]", false),
        ];

        for language in ["cpp", "c", "python", "java", "javascript"] {
            let results = judge
                .run_or_submit("Stack", language, "", &cases, RunMode::Run)
                .await
                .unwrap();
            assert!(results.iter().all(|r| r.passed), "{}: {:?}", language, results);
        }
        assert_eq!(executor.calls(), 10);
    }

    #[tokio::test]
    async fn test_stray_line_before_constructor_fails() {
        let judge = judge_with(MockExecutor::always("debug\nnull\nnull\nnull\n2\n"));
        let cases = vec![case(
            "[\"Stack\",\"push\",\"push\",\"pop\"]\n[[],[1],[2],[]]",
            "[null,null,null,2]",
            false,
        )];
        let results = judge
            .run_or_submit("Stack", "python", "", &cases, RunMode::Run)
            .await
            .unwrap();
        assert_eq!(results[0].verdict, Verdict::WrongAnswer);
    }

    #[tokio::test]
    async fn test_hostile_lengths_fail_one_case() {
        let executor = MockExecutor::always("1000000000000000000\n1\n");
        let judge = judge_with(executor.clone());
        let cases = vec![
            case("1000000000000000000 2\n1 2", "[0,1]", false),
            case("4 9\n2 7 11 15", "[0,1]", false),
        ];
        let results = judge
            .run_or_submit("Two Sum", "python", "", &cases, RunMode::Run)
            .await
            .unwrap();
        assert_eq!(results[0].verdict, Verdict::InvalidInput);
        assert_eq!(results[1].verdict, Verdict::WrongAnswer);
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_judge_job_report() {
        let judge = judge_with(MockExecutor::always("0 1\n"));
        let job = JudgeJob {
            submission_id: 7,
            problem_title: "Two Sum".into(),
            language: "javascript".into(),
            code: "var twoSum = function() {};".into(),
            test_cases: two_sum_cases(),
            mode: RunMode::Submit,
        };
        let report = judge.judge(&job).await;
        assert_eq!(report.submission_id, 7);
        assert!(!report.passed);
        assert_eq!(report.verdict, Verdict::WrongAnswer);
        assert_eq!(report.results.len(), 2);

        let job = JudgeJob {
            problem_title: "Unknown".into(),
            ..job
        };
        let report = judge.judge(&job).await;
        assert_eq!(report.verdict, Verdict::SystemError);
        assert!(report.results.is_empty());
        assert!(report.error_message.unwrap().contains("Unknown"));
    }

    #[test]
    fn test_job_deserializes_camel_case_hidden_flag() {
        let job: JudgeJob = serde_json::from_str(
            r#"{"submission_id":1,"problem_title":"Two Sum","language":"cpp","code":"",
                "test_cases":[{"input":"4 9\n2 7 11 15","output":"[0,1]","isHidden":true}]}"#,
        )
        .unwrap();
        assert_eq!(job.mode, RunMode::Run);
        assert!(job.test_cases[0].is_hidden);
    }

    #[test]
    fn test_summarize_empty_is_accepted() {
        let report = summarize(1, Vec::new());
        assert!(report.passed);
        assert_eq!(report.verdict, Verdict::Accepted);
    }
}
