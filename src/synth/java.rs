//! Java driver generation
//!
//! The sandbox compiles `Main.java`, so the driver is `public class Main` and
//! the user's (non-public) classes are inlined after the imports.

use super::{
    check_class, check_method_arity, float_literal, json_string_literal, require_method,
    strip_type, LanguageSynthesizer, Source,
};
use crate::core::{JudgeResult, Language, Value};
use crate::decoder::Transaction;
use crate::problems::{OutputFormat, OutputShape, WrapperHints};

const PRELUDE: &str = "import java.util.*;
import java.util.function.*;
import java.util.stream.*;
";

const HELPERS: &str = r#"    static List<Object> judgeSeq(Object o) {
        if (o == null) return null;
        if (o.getClass().isArray()) {
            int n = java.lang.reflect.Array.getLength(o);
            List<Object> out = new ArrayList<>(n);
            for (int i = 0; i < n; i++) out.add(java.lang.reflect.Array.get(o, i));
            return out;
        }
        if (o instanceof Collection) return new ArrayList<Object>((Collection<?>) o);
        return null;
    }

    static String judgeScalar(Object o) {
        if (o == null) return "null";
        if (o instanceof Double || o instanceof Float) {
            return String.format(Locale.ROOT, "%.6f", ((Number) o).doubleValue());
        }
        return String.valueOf(o);
    }

    static String judgeQuote(String s) {
        StringBuilder sb = new StringBuilder("\"");
        for (char c : s.toCharArray()) {
            switch (c) {
                case '"': sb.append("\\\""); break;
                case '\\': sb.append("\\\\"); break;
                case '\n': sb.append("\\n"); break;
                case '\r': sb.append("\\r"); break;
                case '\t': sb.append("\\t"); break;
                default:
                    if (c < 0x20) sb.append(String.format("\\u%04x", (int) c));
                    else sb.append(c);
            }
        }
        return sb.append('"').toString();
    }

    static boolean judgeIsText(Object o) {
        return o instanceof CharSequence || o instanceof Character;
    }

    static String judgeRepr(Object o) {
        List<Object> seq = judgeSeq(o);
        if (seq == null) return judgeScalar(o);
        StringBuilder sb = new StringBuilder();
        for (int i = 0; i < seq.size(); i++) {
            if (i > 0) sb.append(' ');
            Object x = seq.get(i);
            sb.append(judgeIsText(x) ? judgeQuote(String.valueOf(x)) : judgeRepr(x));
        }
        return sb.toString();
    }

    static String judgeItem(Object o) {
        List<Object> seq = judgeSeq(o);
        if (seq == null) return judgeScalar(o);
        StringBuilder sb = new StringBuilder("[");
        for (int i = 0; i < seq.size(); i++) {
            if (i > 0) sb.append(',');
            Object x = seq.get(i);
            sb.append(judgeIsText(x) ? judgeQuote(String.valueOf(x)) : judgeItem(x));
        }
        return sb.append(']').toString();
    }

    static void judgePrintRows(Object o) {
        List<Object> rows = judgeSeq(o);
        if (rows == null) rows = new ArrayList<>();
        StringBuilder sb = new StringBuilder();
        sb.append(rows.size()).append('\n');
        for (Object row : rows) sb.append(judgeRepr(row)).append('\n');
        System.out.print(sb);
    }
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct JavaSynthesizer;

impl LanguageSynthesizer for JavaSynthesizer {
    fn language(&self) -> Language {
        Language::Java
    }

    fn synthesize_call(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        args: &[Value],
        format: OutputFormat,
    ) -> JudgeResult<String> {
        let mut src = header(user_code);
        src.line(2, "Solution judgeSolution = new Solution();");

        let mut names = Vec::with_capacity(args.len());
        for (idx, value) in args.iter().enumerate() {
            let name = format!("judge_arg{}", idx);
            let ty = match hints.param_type(idx) {
                Some(ty) => strip_type(ty),
                None => infer_type(value),
            };
            src.line(2, format!("{} {} = {};", ty, name, expr(value, &ty)));
            names.push(name);
        }

        let call = format!("judgeSolution.{}({})", hints.function_name, names.join(", "));
        if hints.is_void {
            src.line(2, format!("{};", call));
            src.line(2, format!("Object judgeResult = {};", names[hints.output_param]));
        } else {
            src.line(2, format!("Object judgeResult = {};", call));
        }

        match format.shape() {
            OutputShape::Matrix => src.line(2, "judgePrintRows(judgeResult);"),
            _ => src.line(2, "System.out.println(judgeRepr(judgeResult));"),
        }
        Ok(footer(src))
    }

    fn synthesize_transaction(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        tx: &Transaction,
    ) -> JudgeResult<String> {
        check_class(hints, tx)?;
        let mut src = header(user_code);

        let ctor_args = exprs(tx.constructor_args(), &hints.param_types);
        src.line(
            2,
            format!(
                "{} judgeObj = new {}({});",
                hints.function_name, hints.function_name, ctor_args
            ),
        );
        src.line(2, "StringBuilder judgeOut = new StringBuilder();");
        src.line(2, "judgeOut.append(\"null\\n\");");

        for (name, args) in tx.calls() {
            let method = require_method(hints, name)?;
            check_method_arity(method, args)?;
            let call = format!(
                "judgeObj.{}({})",
                method.symbol(),
                exprs(args, &method.param_types)
            );
            if method.is_void() {
                src.line(2, format!("{};", call));
                src.line(2, "judgeOut.append(\"null\\n\");");
            } else {
                src.line(2, format!("judgeOut.append(judgeItem({})).append('\\n');", call));
            }
        }

        src.line(2, "System.out.print(judgeOut);");
        Ok(footer(src))
    }
}

fn header(user_code: &str) -> Source {
    let mut src = Source::new();
    src.raw(PRELUDE);
    src.blank();
    src.raw(user_code);
    src.blank();
    src.line(0, "public class Main {");
    src.raw(HELPERS);
    src.blank();
    src.line(1, "public static void main(String[] args) {");
    src
}

fn footer(mut src: Source) -> String {
    src.line(1, "}");
    src.line(0, "}");
    src.finish()
}

fn exprs(values: &[Value], types: &[String]) -> String {
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| match types.get(idx) {
            Some(ty) => expr(value, &strip_type(ty)),
            None => expr(value, &infer_type(value)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn infer_type(value: &Value) -> String {
    match value {
        Value::Int(i) if *i >= i32::MIN as i64 && *i <= i32::MAX as i64 => "int".to_string(),
        Value::Int(_) => "long".to_string(),
        Value::Float(_) => "double".to_string(),
        Value::Str(_) => "String".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Null => "Object".to_string(),
        Value::Array(items) => {
            let elem = items.first().map(infer_type).unwrap_or_else(|| "int".to_string());
            let elem = if items.iter().any(|v| matches!(v, Value::Float(_))) {
                "double".to_string()
            } else {
                elem
            };
            format!("{}[]", elem)
        }
    }
}

/// Type argument of `List<T>` / `ArrayList<T>`
fn list_element(ty: &str) -> Option<&str> {
    let inner = ty
        .strip_prefix("List<")
        .or_else(|| ty.strip_prefix("ArrayList<"))?;
    inner.strip_suffix('>').map(str::trim)
}

/// Java expression of type `ty` holding `value`
fn expr(value: &Value, ty: &str) -> String {
    if let Some(elem) = ty.strip_suffix("[]") {
        return format!("new {}{}", ty, array_init(value, elem));
    }
    if let Some(elem) = list_element(ty) {
        return match value.as_array() {
            Some([]) | None => format!("new ArrayList<{}>()", elem),
            Some(items) => {
                let parts: Vec<String> = items.iter().map(|item| expr(item, elem)).collect();
                format!("new ArrayList<{}>(Arrays.asList({}))", elem, parts.join(", "))
            }
        };
    }
    scalar(value, ty)
}

/// Brace initializer for an array whose element type is `elem`
fn array_init(value: &Value, elem: &str) -> String {
    let items = value.as_array().unwrap_or(&[]);
    let parts: Vec<String> = match elem.strip_suffix("[]") {
        Some(inner) => items.iter().map(|item| array_init(item, inner)).collect(),
        None => items.iter().map(|item| expr(item, elem)).collect(),
    };
    format!("{{{}}}", parts.join(", "))
}

fn scalar(value: &Value, ty: &str) -> String {
    match value {
        Value::Int(i) if matches!(ty, "long" | "Long") => format!("{}L", i),
        Value::Int(i) if matches!(ty, "double" | "Double" | "float" | "Float") => {
            float_literal(*i as f64)
        }
        Value::Int(i) if *i < i32::MIN as i64 || *i > i32::MAX as i64 => format!("{}L", i),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if matches!(ty, "float" | "Float") => format!("{}f", float_literal(*f)),
        Value::Float(f) => float_literal(*f),
        Value::Str(s) if matches!(ty, "char" | "Character") && s.chars().count() == 1 => {
            match s.as_str() {
                "'" => "'\\''".to_string(),
                "\\" => "'\\\\'".to_string(),
                _ => {
                    let quoted = json_string_literal(s);
                    format!("'{}'", &quoted[1..quoted.len() - 1])
                }
            }
        }
        Value::Str(s) => json_string_literal(s),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) => expr(value, &infer_type(value)),
    }
}
