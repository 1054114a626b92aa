//! Problem configuration
//!
//! A `ProblemConfig` fixes how a problem's test strings are decoded, how the
//! program output is compared, and how each language's wrapper calls the
//! user's code. One config serves every language and every test case.

pub mod registry;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{JudgeError, JudgeResult, Language};

pub use registry::ProblemRegistry;

/// Shape of a raw test-case input string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    /// A single scalar
    #[serde(rename = "single_number")]
    SingleNumber,
    /// `n` followed by `n` array elements
    #[serde(rename = "n_then_array")]
    NThenArray,
    /// A bare array, JSON or whitespace separated
    #[serde(rename = "array_only")]
    ArrayOnly,
    /// An array plus one scalar parameter
    #[serde(rename = "n_array_k")]
    NArrayK,
    /// Two independent arrays
    #[serde(rename = "two_arrays")]
    TwoArrays,
    /// `n m` followed by `n` rows of `m` values
    #[serde(rename = "n_m_2d_matrix")]
    NM2dMatrix,
    /// Two arrays with explicit lengths followed by a target scalar
    #[serde(rename = "n_m_array_target")]
    NMArrayTarget,
    /// In-place merge shape: `m n`, `nums1`, `nums2`
    #[serde(rename = "two_numbers_array")]
    TwoNumbersArray,
    /// Method names and per-call argument lists for a stateful object
    #[serde(rename = "class_transaction")]
    ClassTransaction,
    /// One literal per line
    #[serde(rename = "custom")]
    Custom,
}

/// Shape of the expected output and the comparison rule applied to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "single_number")]
    SingleNumber,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "array_space_separated")]
    ArraySpaceSeparated,
    #[serde(rename = "array_json")]
    ArrayJson,
    /// Element order is not significant
    #[serde(rename = "unordered_array")]
    UnorderedArray,
    #[serde(rename = "array_2d_json")]
    Array2dJson,
    #[serde(rename = "array_2d_rows")]
    Array2dRows,
    /// Neither row order nor order within a row is significant (3Sum, 4Sum)
    #[serde(rename = "unordered_array_2d")]
    UnorderedArray2d,
    /// One result per replayed method call
    #[serde(rename = "class_results")]
    ClassResults,
}

/// How a result of a given output format is laid out on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Scalar,
    Array,
    Matrix,
    CallLog,
}

impl OutputFormat {
    pub fn shape(&self) -> OutputShape {
        match self {
            OutputFormat::SingleNumber | OutputFormat::Boolean | OutputFormat::String => {
                OutputShape::Scalar
            }
            OutputFormat::ArraySpaceSeparated
            | OutputFormat::ArrayJson
            | OutputFormat::UnorderedArray => OutputShape::Array,
            OutputFormat::Array2dJson
            | OutputFormat::Array2dRows
            | OutputFormat::UnorderedArray2d => OutputShape::Matrix,
            OutputFormat::ClassResults => OutputShape::CallLog,
        }
    }
}

fn default_return_type() -> String {
    "void".to_string()
}

/// Signature of one method of a design-problem class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodHint {
    /// Method name as it appears in the test's call sequence
    pub name: String,
    /// Name of the function to call when it differs from `name` (C free functions)
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub param_types: Vec<String>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
}

impl MethodHint {
    pub fn symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.name)
    }

    pub fn is_void(&self) -> bool {
        self.return_type.trim() == "void"
    }
}

/// Per-language information the wrapper needs to call user code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapperHints {
    /// Function to call, or the class name for design problems
    pub function_name: String,
    /// Parameter types, one per decoded argument (constructor parameters for classes)
    #[serde(default)]
    pub param_types: Vec<String>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    /// Mutate-in-place: the result is read back from `output_param`
    #[serde(default)]
    pub is_void: bool,
    #[serde(default)]
    pub output_param: usize,
    /// Methods of a design-problem class
    #[serde(default)]
    pub methods: Vec<MethodHint>,
}

impl WrapperHints {
    pub fn method(&self, name: &str) -> Option<&MethodHint> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Declared type of parameter `idx`, if any
    pub fn param_type(&self, idx: usize) -> Option<&str> {
        self.param_types.get(idx).map(|s| s.as_str())
    }
}

/// Immutable judging configuration for one problem
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemConfig {
    pub title: String,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    /// Overrides the default tolerance for float comparisons
    pub float_tolerance: Option<f64>,
    pub hints: HashMap<Language, WrapperHints>,
}

impl ProblemConfig {
    /// Wrapper hints for `language`, or `UnsupportedLanguage`
    pub fn hints_for(&self, language: Language) -> JudgeResult<&WrapperHints> {
        self.hints.get(&language).ok_or_else(|| {
            JudgeError::UnsupportedLanguage(format!(
                "{} has no {} wrapper",
                self.title, language
            ))
        })
    }

    pub fn supported_languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|lang| self.hints.contains_key(lang))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        let f: InputFormat = serde_json::from_str("\"n_m_2d_matrix\"").unwrap();
        assert_eq!(f, InputFormat::NM2dMatrix);
        let f: OutputFormat = serde_json::from_str("\"array_2d_rows\"").unwrap();
        assert_eq!(f, OutputFormat::Array2dRows);
        assert_eq!(OutputFormat::UnorderedArray2d.shape(), OutputShape::Matrix);
    }

    #[test]
    fn test_missing_hints_is_unsupported_language() {
        let config = ProblemConfig {
            title: "Two Sum".into(),
            input_format: InputFormat::NArrayK,
            output_format: OutputFormat::ArraySpaceSeparated,
            float_tolerance: None,
            hints: HashMap::new(),
        };
        let err = config.hints_for(Language::Java).unwrap_err();
        assert!(matches!(err, JudgeError::UnsupportedLanguage(_)));
    }
}
