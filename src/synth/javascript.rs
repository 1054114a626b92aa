//! JavaScript (Node) driver generation

use super::{check_class, LanguageSynthesizer, Source};
use crate::core::{JudgeResult, Language, Value};
use crate::decoder::Transaction;
use crate::problems::{OutputFormat, OutputShape, WrapperHints};

const HELPERS: &str = r#"function judgeRepr(v) {
    if (v === null || v === undefined) return "null";
    if (typeof v === "boolean") return v ? "true" : "false";
    if (Array.isArray(v) || v instanceof Set) return Array.from(v).map(x => judgeElem(x, judgeRepr)).join(" ");
    return String(v);
}

function judgeElem(x, render) {
    return typeof x === "string" ? JSON.stringify(x) : render(x);
}

function judgeItem(v) {
    if (Array.isArray(v) || v instanceof Set) return "[" + Array.from(v).map(x => judgeElem(x, judgeItem)).join(",") + "]";
    return judgeRepr(v);
}

function judgePrintRows(rows) {
    rows = Array.from(rows || []);
    const lines = [String(rows.length)];
    for (const row of rows) lines.push(judgeRepr(row));
    console.log(lines.join("\n"));
}
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct JavascriptSynthesizer;

impl LanguageSynthesizer for JavascriptSynthesizer {
    fn language(&self) -> Language {
        Language::Javascript
    }

    fn synthesize_call(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        args: &[Value],
        format: OutputFormat,
    ) -> JudgeResult<String> {
        let mut src = header(user_code);

        let names: Vec<String> = args
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                let name = format!("judge_arg{}", idx);
                src.line(0, format!("const {} = {};", name, literal(value)));
                name
            })
            .collect();

        let call = format!("{}({})", hints.function_name, names.join(", "));
        if hints.is_void {
            src.line(0, format!("{};", call));
            src.line(0, format!("const judgeResult = {};", names[hints.output_param]));
        } else {
            src.line(0, format!("const judgeResult = {};", call));
        }

        match format.shape() {
            OutputShape::Matrix => src.line(0, "judgePrintRows(judgeResult);"),
            _ => src.line(0, "console.log(judgeRepr(judgeResult));"),
        }
        Ok(src.finish())
    }

    fn synthesize_transaction(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        tx: &Transaction,
    ) -> JudgeResult<String> {
        check_class(hints, tx)?;
        let mut src = header(user_code);

        src.line(
            0,
            format!(
                "const judgeObj = new {}({});",
                hints.function_name,
                literal_list(tx.constructor_args())
            ),
        );
        src.line(0, "const judgeOut = [\"null\"];");
        for (name, args) in tx.calls() {
            let call = format!("judgeObj.{}({})", name, literal_list(args));
            match hints.method(name) {
                Some(method) if method.is_void() => {
                    src.line(0, format!("{};", call));
                    src.line(0, "judgeOut.push(\"null\");");
                }
                _ => src.line(0, format!("judgeOut.push(judgeItem({}));", call)),
            }
        }
        src.line(0, "console.log(judgeOut.join(\"\\n\"));");
        Ok(src.finish())
    }
}

fn header(user_code: &str) -> Source {
    let mut src = Source::new();
    src.raw(user_code);
    src.blank();
    src.raw(HELPERS);
    src.blank();
    src
}

fn literal_list(values: &[Value]) -> String {
    values.iter().map(literal).collect::<Vec<_>>().join(", ")
}

/// JSON is valid JavaScript for every `Value`
fn literal(value: &Value) -> String {
    value.to_json().to_string()
}
