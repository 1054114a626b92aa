//! Wrapper synthesizer
//!
//! One `LanguageSynthesizer` per target language turns the user's code, the
//! problem's `WrapperHints` and the decoded `Arguments` into a single
//! self-contained source file. Synthesizers are pure text builders: the same
//! inputs always give byte-identical output, and nothing is compiled locally.
//!
//! Every generated driver prints its result with the same line protocol, which
//! only the verifier interprets:
//! - scalars, booleans and strings: one line (`true`/`false`, `null`)
//! - 1-D arrays: one line, elements separated by a single space
//! - 2-D arrays: the row count on its own line, then one line per row
//! - call logs: one line per call; constructor and void calls print `null`,
//!   arrays print as `[a,b,...]`

mod c;
mod cpp;
mod java;
mod javascript;
mod python;

use crate::core::{JudgeError, JudgeResult, Language, Value};
use crate::decoder::{Arguments, Transaction};
use crate::problems::{MethodHint, OutputFormat, OutputShape, WrapperHints};

pub use c::CSynthesizer;
pub use cpp::CppSynthesizer;
pub use java::JavaSynthesizer;
pub use javascript::JavascriptSynthesizer;
pub use python::PythonSynthesizer;

/// Code generator for one target language
pub trait LanguageSynthesizer: Send + Sync {
    fn language(&self) -> Language;

    /// Driver calling a function (or a `Solution` method) once
    fn synthesize_call(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        args: &[Value],
        format: OutputFormat,
    ) -> JudgeResult<String>;

    /// Driver replaying a constructor and method-call sequence on one instance
    fn synthesize_transaction(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        tx: &Transaction,
    ) -> JudgeResult<String>;

    fn synthesize(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        args: &Arguments,
        format: OutputFormat,
    ) -> JudgeResult<String> {
        match (args, format.shape()) {
            (Arguments::Transaction(tx), OutputShape::CallLog) => {
                self.synthesize_transaction(user_code, hints, tx)
            }
            (Arguments::Call(values), shape) if shape != OutputShape::CallLog => {
                check_call(hints, values)?;
                self.synthesize_call(user_code, hints, values, format)
            }
            _ => Err(JudgeError::Synthesis(format!(
                "{:?} output cannot be produced from these arguments",
                format
            ))),
        }
    }
}

static CPP: CppSynthesizer = CppSynthesizer;
static C: CSynthesizer = CSynthesizer;
static PYTHON: PythonSynthesizer = PythonSynthesizer;
static JAVA: JavaSynthesizer = JavaSynthesizer;
static JAVASCRIPT: JavascriptSynthesizer = JavascriptSynthesizer;

/// Dispatch table from logical language to its synthesizer
pub fn synthesizer_for(language: Language) -> &'static dyn LanguageSynthesizer {
    match language {
        Language::Cpp => &CPP,
        Language::C => &C,
        Language::Python => &PYTHON,
        Language::Java => &JAVA,
        Language::Javascript => &JAVASCRIPT,
    }
}

/// Build the complete source for `language`.
///
/// Missing hints fail fast with `UnsupportedLanguage` instead of guessing a signature.
pub fn synthesize(
    language: Language,
    user_code: &str,
    hints: Option<&WrapperHints>,
    args: &Arguments,
    format: OutputFormat,
) -> JudgeResult<String> {
    let hints = hints.ok_or_else(|| {
        JudgeError::UnsupportedLanguage(format!("no wrapper hints for {}", language))
    })?;
    synthesizer_for(language).synthesize(user_code, hints, args, format)
}

fn check_call(hints: &WrapperHints, values: &[Value]) -> JudgeResult<()> {
    if !hints.param_types.is_empty() && hints.param_types.len() != values.len() {
        return Err(JudgeError::Synthesis(format!(
            "{} takes {} argument(s) but the test supplies {}",
            hints.function_name,
            hints.param_types.len(),
            values.len()
        )));
    }
    if hints.is_void && hints.output_param >= values.len() {
        return Err(JudgeError::Synthesis(format!(
            "output parameter {} of {} does not exist",
            hints.output_param, hints.function_name
        )));
    }
    Ok(())
}

/// Method hint required by statically typed targets
fn require_method<'h>(hints: &'h WrapperHints, name: &str) -> JudgeResult<&'h MethodHint> {
    hints.method(name).ok_or_else(|| {
        JudgeError::Synthesis(format!(
            "{} has no signature for method '{}'",
            hints.function_name, name
        ))
    })
}

fn check_method_arity(method: &MethodHint, args: &[Value]) -> JudgeResult<()> {
    if method.param_types.len() != args.len() {
        return Err(JudgeError::Synthesis(format!(
            "{} takes {} argument(s) but the call supplies {}",
            method.name,
            method.param_types.len(),
            args.len()
        )));
    }
    Ok(())
}

/// The constructor of a transaction must name the hinted class, and every
/// replayed name must be a plain identifier before it is spliced into source
fn check_class(hints: &WrapperHints, tx: &Transaction) -> JudgeResult<()> {
    if tx.class_name() != hints.function_name {
        return Err(JudgeError::Synthesis(format!(
            "call sequence constructs '{}' but the problem expects '{}'",
            tx.class_name(),
            hints.function_name
        )));
    }
    check_identifier(tx.class_name())?;
    for (name, _) in tx.calls() {
        check_identifier(name)?;
    }
    Ok(())
}

/// `[A-Za-z_$][A-Za-z0-9_$]*`
fn check_identifier(name: &str) -> JudgeResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_' || first == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        None => false,
    };
    if !valid {
        return Err(JudgeError::Synthesis(format!(
            "'{}' is not a valid method name",
            name
        )));
    }
    Ok(())
}

/// Line-oriented source text builder
#[derive(Debug, Default)]
pub(crate) struct Source {
    text: String,
}

impl Source {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        for _ in 0..indent {
            self.text.push_str("    ");
        }
        self.text.push_str(text.as_ref());
        self.text.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.text.push('\n');
    }

    /// Append a block verbatim, ensuring it ends with a newline
    pub(crate) fn raw(&mut self, block: &str) {
        self.text.push_str(block);
        if !block.ends_with('\n') {
            self.text.push('\n');
        }
    }

    pub(crate) fn finish(self) -> String {
        self.text
    }
}

/// Type annotation without qualifiers and reference markers
fn strip_type(ty: &str) -> String {
    ty.replace("const ", "")
        .replace('&', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Float literal that always reads as floating point
fn float_literal(f: f64) -> String {
    let text = format!("{:?}", f);
    if text.contains(['.', 'e', 'E']) || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{}.0", text)
    }
}

/// JSON-escaped string literal (valid in Java, JavaScript and Python)
fn json_string_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// C/C++ string literal
fn c_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for byte in s.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(byte as char),
            other => out.push_str(&format!("\\{:03o}", other)),
        }
    }
    out.push('"');
    out
}

/// C/C++ character literal for a one-character string
fn c_char_literal(s: &str) -> String {
    match s {
        "'" => "'\\''".to_string(),
        "\\" => "'\\\\'".to_string(),
        _ => {
            let quoted = c_string_literal(s);
            format!("'{}'", &quoted[1..quoted.len() - 1])
        }
    }
}

/// `lowerCamel` form of a class name (`MinStack` -> `minStack`)
fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
