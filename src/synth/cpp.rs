//! C++ driver generation

use super::{
    c_char_literal, c_string_literal, check_class, check_method_arity, float_literal,
    require_method, strip_type, LanguageSynthesizer, Source,
};
use crate::core::{JudgeResult, Language, Value};
use crate::decoder::Transaction;
use crate::problems::{OutputFormat, OutputShape, WrapperHints};

const PRELUDE: &str = "#include <bits/stdc++.h>\nusing namespace std;\n";

const HELPERS: &str = r#"static string judge_repr(int v) { return to_string(v); }
static string judge_repr(long v) { return to_string(v); }
static string judge_repr(long long v) { return to_string(v); }
static string judge_repr(unsigned v) { return to_string(v); }
static string judge_repr(unsigned long v) { return to_string(v); }
static string judge_repr(unsigned long long v) { return to_string(v); }
static string judge_repr(double v) {
    char buf[64];
    snprintf(buf, sizeof(buf), "%.6f", v);
    return string(buf);
}
static string judge_repr(float v) { return judge_repr((double)v); }
static string judge_repr(bool v) { return v ? "true" : "false"; }
static string judge_repr(char v) { return string(1, v); }
static string judge_repr(const string& v) { return v; }
static string judge_repr(const char* v) { return v ? string(v) : string("null"); }
static string judge_quote(const string& s) {
    string out = "\"";
    for (unsigned char c : s) {
        if (c == '"' || c == '\\') { out += '\\'; out += (char)c; }
        else if (c == '\n') out += "\\n";
        else if (c == '\r') out += "\\r";
        else if (c == '\t') out += "\\t";
        else if (c < 0x20) {
            char buf[8];
            snprintf(buf, sizeof(buf), "\\u%04x", c);
            out += buf;
        }
        else out += (char)c;
    }
    return out + "\"";
}
template <typename T>
static string judge_repr(const vector<T>& v);
template <typename T>
static string judge_elem(const T& v) { return judge_repr(v); }
static string judge_elem(const string& v) { return judge_quote(v); }
static string judge_elem(char v) { return judge_quote(string(1, v)); }
template <typename T>
static string judge_repr(const vector<T>& v) {
    string out;
    for (size_t i = 0; i < v.size(); ++i) {
        if (i) out += " ";
        const T& x = v[i];
        out += judge_elem(x);
    }
    return out;
}
template <typename T>
static string judge_item(const T& v) { return judge_repr(v); }
template <typename T>
static string judge_item(const vector<T>& v);
template <typename T>
static string judge_item_elem(const T& v) { return judge_item(v); }
static string judge_item_elem(const string& v) { return judge_quote(v); }
static string judge_item_elem(char v) { return judge_quote(string(1, v)); }
template <typename T>
static string judge_item(const vector<T>& v) {
    string out = "[";
    for (size_t i = 0; i < v.size(); ++i) {
        if (i) out += ",";
        const T& x = v[i];
        out += judge_item_elem(x);
    }
    return out + "]";
}
template <typename T>
static void judge_print_rows(const vector<vector<T>>& rows) {
    cout << rows.size() << "\n";
    for (const auto& row : rows) cout << judge_repr(row) << "\n";
}
"#;

/// `#include <bits/stdc++.h>` driver calling a `Solution` member or a class instance
#[derive(Debug, Default, Clone, Copy)]
pub struct CppSynthesizer;

impl LanguageSynthesizer for CppSynthesizer {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn synthesize_call(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        args: &[Value],
        format: OutputFormat,
    ) -> JudgeResult<String> {
        let mut src = header(user_code);
        src.line(0, "int main() {");

        let names = declare_args(&mut src, "judge_arg", hints.param_types.as_slice(), args);
        src.line(1, "Solution judge_solution;");
        let call = format!("judge_solution.{}({})", hints.function_name, names.join(", "));
        if hints.is_void {
            src.line(1, format!("{};", call));
            src.line(1, format!("auto& judge_result = {};", names[hints.output_param]));
        } else {
            src.line(1, format!("auto judge_result = {};", call));
        }

        match format.shape() {
            OutputShape::Matrix => src.line(1, "judge_print_rows(judge_result);"),
            _ => src.line(1, "cout << judge_repr(judge_result) << \"\\n\";"),
        }
        src.line(1, "return 0;");
        src.line(0, "}");
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
        src.line(0, "int main() {");

        let ctor = declare_args(
            &mut src,
            "judge_ctor",
            hints.param_types.as_slice(),
            tx.constructor_args(),
        );
        src.line(
            1,
            format!(
                "{}* judge_obj = new {}({});",
                hints.function_name,
                hints.function_name,
                ctor.join(", ")
            ),
        );
        src.line(1, "cout << \"null\\n\";");

        for (idx, (name, args)) in tx.calls().enumerate() {
            let method = require_method(hints, name)?;
            check_method_arity(method, args)?;

            src.line(1, "{");
            let prefix = format!("judge_c{}_", idx);
            let names = declare_args_at(&mut src, 2, &prefix, &method.param_types, args);
            let call = format!("judge_obj->{}({})", method.symbol(), names.join(", "));
            if method.is_void() {
                src.line(2, format!("{};", call));
                src.line(2, "cout << \"null\\n\";");
            } else {
                src.line(2, format!("cout << judge_item({}) << \"\\n\";", call));
            }
            src.line(1, "}");
        }

        src.line(1, "delete judge_obj;");
        src.line(1, "return 0;");
        src.line(0, "}");
        Ok(src.finish())
    }
}

fn header(user_code: &str) -> Source {
    let mut src = Source::new();
    src.raw(PRELUDE);
    src.blank();
    src.raw(user_code);
    src.blank();
    src.raw(HELPERS);
    src.blank();
    src
}

fn declare_args(src: &mut Source, prefix: &str, types: &[String], args: &[Value]) -> Vec<String> {
    declare_args_at(src, 1, prefix, types, args)
}

/// Declare one named local per argument and return the names
fn declare_args_at(
    src: &mut Source,
    indent: usize,
    prefix: &str,
    types: &[String],
    args: &[Value],
) -> Vec<String> {
    args.iter()
        .enumerate()
        .map(|(idx, value)| {
            let name = format!("{}{}", prefix, idx);
            let ty = match types.get(idx) {
                Some(ty) => strip_type(ty),
                None => infer_type(value),
            };
            src.line(
                indent,
                format!("{} {} = {};", ty, name, literal(value, &ty)),
            );
            name
        })
        .collect()
}

/// Element type of `vector<T>`, or the type itself
fn element_type(ty: &str) -> &str {
    ty.strip_prefix("vector<")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(str::trim)
        .unwrap_or(ty)
}

fn fits_int(i: i64) -> bool {
    i >= i32::MIN as i64 && i <= i32::MAX as i64
}

fn infer_type(value: &Value) -> String {
    match value {
        Value::Int(i) if fits_int(*i) => "int".to_string(),
        Value::Int(_) => "long long".to_string(),
        Value::Float(_) => "double".to_string(),
        Value::Str(_) => "string".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Null => "int".to_string(),
        Value::Array(items) => format!("vector<{}>", infer_element(items)),
    }
}

/// Widest element type among `items`
fn infer_element(items: &[Value]) -> String {
    let mut best = "int".to_string();
    for item in items {
        let ty = infer_type(item);
        best = match (best.as_str(), ty.as_str()) {
            (_, "double") | ("double", _) => "double".to_string(),
            (_, "long long") | ("long long", _) => "long long".to_string(),
            ("int", _) => ty,
            _ => best,
        };
    }
    best
}

fn literal(value: &Value, ty: &str) -> String {
    match value {
        Value::Array(items) => {
            let elem = element_type(ty);
            let parts: Vec<String> = items.iter().map(|item| literal(item, elem)).collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Int(i) if ty == "double" || ty == "float" => float_literal(*i as f64),
        Value::Int(i) if fits_int(*i) => i.to_string(),
        Value::Int(i) => format!("{}LL", i),
        Value::Float(f) => float_literal(*f),
        Value::Str(s) if ty == "char" && s.chars().count() == 1 => c_char_literal(s),
        Value::Str(s) => c_string_literal(s),
        Value::Bool(b) => b.to_string(),
        Value::Null => "{}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::problems::{InputFormat, ProblemRegistry};

    fn source_for(title: &str, input: &str) -> String {
        let registry = ProblemRegistry::builtin().unwrap();
        let config = registry.lookup(title).unwrap();
        let args = decode(input, config.input_format).unwrap();
        CppSynthesizer
            .synthesize(
                "// user code",
                config.hints_for(Language::Cpp).unwrap(),
                &args,
                config.output_format,
            )
            .unwrap()
    }

    #[test]
    fn test_two_sum_driver() {
        let src = source_for("Two Sum", "4 9\n2 7 11 15");
        assert!(src.starts_with("#include <bits/stdc++.h>"));
        assert!(src.contains("vector<int> judge_arg0 = {2, 7, 11, 15};"));
        assert!(src.contains("int judge_arg1 = 9;"));
        assert!(src.contains("auto judge_result = judge_solution.twoSum(judge_arg0, judge_arg1);"));
        assert!(src.contains("cout << judge_repr(judge_result)"));
    }

    #[test]
    fn test_void_reads_back_output_param() {
        let src = source_for("Move Zeroes", "3\n0 1 0");
        assert!(src.contains("judge_solution.moveZeroes(judge_arg0);"));
        assert!(src.contains("auto& judge_result = judge_arg0;"));
    }

    #[test]
    fn test_matrix_printing() {
        let src = source_for("Rotate Image", "2 2\n1 2\n3 4");
        assert!(src.contains("vector<vector<int>> judge_arg0 = {{1, 2}, {3, 4}};"));
        assert!(src.contains("judge_print_rows(judge_result);"));
    }

    #[test]
    fn test_class_replay() {
        let src = source_for(
            "Stack",
            "[\"Stack\",\"push\",\"push\",\"pop\",\"empty\"]\n[[],[1],[2],[],[]]",
        );
        assert!(src.contains("Stack* judge_obj = new Stack();"));
        assert!(src.contains("int judge_c0_0 = 1;"));
        assert!(src.contains("judge_obj->push(judge_c0_0);"));
        assert!(src.contains("cout << judge_item(judge_obj->pop()) << \"\\n\";"));
        // constructor + four calls
        assert_eq!(src.matches("cout << \"null\\n\";").count(), 3);
        assert_eq!(src.matches("judge_item(judge_obj->").count(), 2);
    }

    #[test]
    fn test_unknown_method_rejected() {
        let registry = ProblemRegistry::builtin().unwrap();
        let config = registry.lookup("Stack").unwrap();
        let args = decode("[\"Stack\",\"peek\"]\n[[],[]]", InputFormat::ClassTransaction).unwrap();
        assert!(CppSynthesizer
            .synthesize("", config.hints_for(Language::Cpp).unwrap(), &args, config.output_format)
            .is_err());
    }

    #[test]
    fn test_literal_inference() {
        assert_eq!(infer_type(&Value::Int(5_000_000_000)), "long long");
        assert_eq!(literal(&Value::Int(5_000_000_000), "long long"), "5000000000LL");
        let mixed = Value::Array(vec![Value::Int(1), Value::Float(2.5)]);
        assert_eq!(infer_type(&mixed), "vector<double>");
        assert_eq!(literal(&mixed, "vector<double>"), "{1.0, 2.5}");
        assert_eq!(literal(&Value::Str("a".into()), "char"), "'a'");
        let strings = Value::Array(vec![Value::Str("fl".into())]);
        assert_eq!(literal(&strings, "vector<string>"), "{\"fl\"}");
    }
}
