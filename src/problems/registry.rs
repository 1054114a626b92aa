//! Problem configuration registry
//!
//! A read-only title → `ProblemConfig` map built from the code-reviewed table
//! in `files/problems.toml`, optionally overlaid with an operator-supplied file.
//! Lookups never guess: an unknown title is `ConfigurationMissing`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use super::{InputFormat, OutputFormat, ProblemConfig, WrapperHints};
use crate::core::{JudgeError, JudgeResult, Language};

const BUILTIN_PROBLEMS: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/problems.toml"));

/// Raw TOML layout of a registry file
#[derive(Debug, Deserialize)]
struct RawRegistry {
    #[serde(default, rename = "problem")]
    problems: Vec<RawProblemConfig>,
}

#[derive(Debug, Deserialize)]
struct RawProblemConfig {
    title: String,
    input_format: InputFormat,
    output_format: OutputFormat,
    #[serde(default)]
    float_tolerance: Option<f64>,
    #[serde(default)]
    hints: HashMap<String, WrapperHints>,
}

impl RawProblemConfig {
    fn into_config(self) -> Result<ProblemConfig> {
        let mut hints = HashMap::new();
        for (name, hint) in self.hints {
            let language = Language::ALL
                .into_iter()
                .find(|lang| lang.name() == name)
                .ok_or_else(|| {
                    anyhow::anyhow!("Unknown language '{}' in hints for {}", name, self.title)
                })?;
            hints.insert(language, hint);
        }

        let config = ProblemConfig {
            title: self.title,
            input_format: self.input_format,
            output_format: self.output_format,
            float_tolerance: self.float_tolerance,
            hints,
        };
        validate(&config)?;
        Ok(config)
    }
}

/// Reject entries whose shape could only produce broken wrappers
fn validate(config: &ProblemConfig) -> Result<()> {
    if config.hints.is_empty() {
        anyhow::bail!("{} has no wrapper hints", config.title);
    }

    let is_class = config.input_format == InputFormat::ClassTransaction;
    if is_class != (config.output_format == OutputFormat::ClassResults) {
        anyhow::bail!(
            "{}: class_transaction input and class_results output must be used together",
            config.title
        );
    }

    if let Some(tolerance) = config.float_tolerance {
        if !(tolerance >= 0.0 && tolerance.is_finite()) {
            anyhow::bail!("{}: invalid float_tolerance {}", config.title, tolerance);
        }
    }

    for (language, hints) in &config.hints {
        if hints.function_name.trim().is_empty() {
            anyhow::bail!("{} ({}): empty function_name", config.title, language);
        }
        if hints.is_void && hints.output_param >= hints.param_types.len() {
            anyhow::bail!(
                "{} ({}): output_param {} out of range",
                config.title,
                language,
                hints.output_param
            );
        }
        if is_class && hints.methods.is_empty() {
            anyhow::bail!("{} ({}): class problem without methods", config.title, language);
        }
    }

    Ok(())
}

/// Normalize a problem title for lookup
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Read-only registry of problem configurations
#[derive(Debug, Clone, Default)]
pub struct ProblemRegistry {
    problems: HashMap<String, Arc<ProblemConfig>>,
}

impl ProblemRegistry {
    /// Registry holding only the built-in table
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_PROBLEMS).context("Invalid built-in problem table")
    }

    /// Parse a registry from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut registry = Self::default();
        registry.merge_toml_str(content)?;
        Ok(registry)
    }

    /// Add (or replace) entries from TOML text
    pub fn merge_toml_str(&mut self, content: &str) -> Result<usize> {
        let raw: RawRegistry = toml::from_str(content).context("Invalid problem table")?;
        let count = raw.problems.len();

        for raw_config in raw.problems {
            let config = raw_config.into_config()?;
            let key = normalize_title(&config.title);
            if self.problems.insert(key, Arc::new(config)).is_some() {
                debug!("Problem entry replaced by later definition");
            }
        }

        Ok(count)
    }

    /// Overlay entries from a file on disk
    pub fn merge_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem table {}", path.display()))?;
        let count = self
            .merge_toml_str(&content)
            .with_context(|| format!("Invalid problem table {}", path.display()))?;
        info!("Loaded {} problem entries from {}", count, path.display());
        Ok(count)
    }

    /// Look up a problem by title (case-insensitive, trimmed)
    pub fn lookup(&self, title: &str) -> JudgeResult<Arc<ProblemConfig>> {
        self.problems
            .get(&normalize_title(title))
            .cloned()
            .ok_or_else(|| JudgeError::ConfigurationMissing(title.trim().to_string()))
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Titles of all registered problems, sorted
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self.problems.values().map(|p| p.title.clone()).collect();
        titles.sort();
        titles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::OutputShape;

    #[test]
    fn test_builtin_registry_loads() {
        let registry = ProblemRegistry::builtin().unwrap();
        assert!(registry.len() >= 20);

        let two_sum = registry.lookup("Two Sum").unwrap();
        assert_eq!(two_sum.input_format, InputFormat::NArrayK);
        assert_eq!(two_sum.output_format, OutputFormat::ArraySpaceSeparated);
        assert_eq!(two_sum.supported_languages(), Language::ALL.to_vec());
    }

    #[test]
    fn test_builtin_covers_every_format() {
        let registry = ProblemRegistry::builtin().unwrap();
        let configs: Vec<_> = registry
            .titles()
            .iter()
            .map(|t| registry.lookup(t).unwrap())
            .collect();

        for format in [
            InputFormat::SingleNumber,
            InputFormat::NThenArray,
            InputFormat::ArrayOnly,
            InputFormat::NArrayK,
            InputFormat::TwoArrays,
            InputFormat::NM2dMatrix,
            InputFormat::NMArrayTarget,
            InputFormat::TwoNumbersArray,
            InputFormat::ClassTransaction,
            InputFormat::Custom,
        ] {
            assert!(
                configs.iter().any(|c| c.input_format == format),
                "no problem uses {:?}",
                format
            );
        }

        for shape in [
            OutputShape::Scalar,
            OutputShape::Array,
            OutputShape::Matrix,
            OutputShape::CallLog,
        ] {
            assert!(configs.iter().any(|c| c.output_format.shape() == shape));
        }
    }

    #[test]
    fn test_lookup_normalizes_title() {
        let registry = ProblemRegistry::builtin().unwrap();
        assert!(registry.lookup("  two sum ").is_ok());
        assert!(registry.lookup("TWO SUM").is_ok());
        // No fuzzy matching
        let err = registry.lookup("Two  Sum").unwrap_err();
        assert!(matches!(err, JudgeError::ConfigurationMissing(_)));
    }

    #[test]
    fn test_merge_overrides_entry() {
        let mut registry = ProblemRegistry::builtin().unwrap();
        let before = registry.len();
        registry
            .merge_toml_str(
                r#"
[[problem]]
title = "two sum"
input_format = "n_then_array"
output_format = "single_number"

[problem.hints.python]
function_name = "solve"
param_types = ["List[int]"]
return_type = "int"
"#,
            )
            .unwrap();

        assert_eq!(registry.len(), before);
        let config = registry.lookup("Two Sum").unwrap();
        assert_eq!(config.input_format, InputFormat::NThenArray);
        assert!(config.hints_for(Language::Java).is_err());
    }

    #[test]
    fn test_rejects_unknown_language() {
        let result = ProblemRegistry::from_toml_str(
            r#"
[[problem]]
title = "X"
input_format = "single_number"
output_format = "single_number"

[problem.hints.rust]
function_name = "x"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_mismatched_class_formats() {
        let result = ProblemRegistry::from_toml_str(
            r#"
[[problem]]
title = "X"
input_format = "class_transaction"
output_format = "array_json"

[problem.hints.python]
function_name = "X"
methods = [{ name = "get", return_type = "int" }]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_out_of_range_output_param() {
        let result = ProblemRegistry::from_toml_str(
            r#"
[[problem]]
title = "X"
input_format = "n_then_array"
output_format = "array_json"

[problem.hints.python]
function_name = "f"
param_types = ["List[int]"]
is_void = true
output_param = 1
"#,
        );
        assert!(result.is_err());
    }
}
