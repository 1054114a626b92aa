//! C driver generation
//!
//! C has no containers, so arguments follow the usual judge convention:
//! arrays expand to `(ptr, size)`, matrices to `(ptr, rows, colSizes)`, and
//! array-returning functions receive trailing `returnSize` (plus
//! `returnColumnSizes` for `T**`) out-parameters.

use super::{
    c_char_literal, c_string_literal, check_class, check_method_arity, float_literal,
    lower_camel, require_method, strip_type, LanguageSynthesizer, Source,
};
use crate::core::{JudgeError, JudgeResult, Language, Value};
use crate::decoder::Transaction;
use crate::problems::{MethodHint, OutputFormat, WrapperHints};

const PRELUDE: &str = "#include <stdio.h>
#include <stdlib.h>
#include <string.h>
#include <stdbool.h>
#include <limits.h>
#include <math.h>
";

const HELPERS: &str = r#"static void judge_put_str(const char* s) {
    if (!s) {
        printf("null");
        return;
    }
    putchar('"');
    for (; *s; s++) {
        unsigned char c = (unsigned char)*s;
        if (c == '"' || c == '\\') printf("\\%c", c);
        else if (c == '\n') printf("\\n");
        else if (c == '\r') printf("\\r");
        else if (c == '\t') printf("\\t");
        else if (c < 0x20) printf("\\u%04x", c);
        else putchar(c);
    }
    putchar('"');
}

static void judge_put_char(char c) {
    char buf[2] = {c, '\0'};
    judge_put_str(buf);
}
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct CSynthesizer;

/// How a C type is passed and printed
#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Scalar(String),
    Str,
    StrArray,
    Array(String),
    Matrix(String),
}

impl Kind {
    fn of(ty: &str) -> Kind {
        let ty = strip_type(ty).replace(" *", "*");
        if ty == "char*" {
            Kind::Str
        } else if ty == "char**" {
            Kind::StrArray
        } else if let Some(elem) = ty.strip_suffix("**") {
            Kind::Matrix(elem.to_string())
        } else if let Some(elem) = ty.strip_suffix('*') {
            Kind::Array(elem.to_string())
        } else {
            Kind::Scalar(ty)
        }
    }

    fn infer(value: &Value) -> Kind {
        match value {
            Value::Str(_) => Kind::Str,
            Value::Array(items) if items.iter().any(Value::is_array) => {
                Kind::Matrix(infer_scalar(items.iter().flat_map(|row| row.as_array().unwrap_or(&[]))))
            }
            Value::Array(items) if items.iter().any(|v| matches!(v, Value::Str(_))) => {
                Kind::StrArray
            }
            Value::Array(items) => Kind::Array(infer_scalar(items.iter())),
            scalar => Kind::Scalar(infer_scalar(std::iter::once(scalar))),
        }
    }
}

fn infer_scalar<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    let mut ty = "int";
    for value in values {
        match value {
            Value::Float(_) => return "double".to_string(),
            Value::Bool(_) if ty == "int" => ty = "bool",
            Value::Int(i) if *i < i32::MIN as i64 || *i > i32::MAX as i64 => ty = "long long",
            _ => {}
        }
    }
    ty.to_string()
}

impl LanguageSynthesizer for CSynthesizer {
    fn language(&self) -> Language {
        Language::C
    }

    fn synthesize_call(
        &self,
        user_code: &str,
        hints: &WrapperHints,
        args: &[Value],
        _format: OutputFormat,
    ) -> JudgeResult<String> {
        let mut src = header(user_code);
        src.line(0, "int main(void) {");

        let mut call_args = Vec::new();
        let mut declared = Vec::new();
        for (idx, value) in args.iter().enumerate() {
            let kind = match hints.param_type(idx) {
                Some(ty) => Kind::of(ty),
                None => Kind::infer(value),
            };
            let name = format!("judge_arg{}", idx);
            call_args.extend(declare(&mut src, 1, &name, &kind, value)?);
            declared.push((name, kind));
        }

        if hints.is_void {
            src.line(1, format!("{}({});", hints.function_name, call_args.join(", ")));
            let (name, kind) = &declared[hints.output_param];
            print_declared(&mut src, name, kind);
        } else {
            let kind = Kind::of(&hints.return_type);
            call_with_result(&mut src, 1, &hints.function_name, call_args, &kind);
            print_result(&mut src, 1, &kind, false)?;
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
        let class = tx.class_name();
        let mut src = header(user_code);
        src.line(0, "int main(void) {");

        let ctor = hints.method(class);
        let ctor_symbol = ctor
            .and_then(|m| m.symbol.clone())
            .unwrap_or_else(|| format!("{}Create", lower_camel(class)));
        let ctor_types = ctor
            .map(|m| m.param_types.as_slice())
            .unwrap_or(hints.param_types.as_slice());

        let mut ctor_args = Vec::new();
        for (idx, value) in tx.constructor_args().iter().enumerate() {
            let kind = match ctor_types.get(idx) {
                Some(ty) => Kind::of(ty),
                None => Kind::infer(value),
            };
            ctor_args.extend(declare(&mut src, 1, &format!("judge_ctor{}", idx), &kind, value)?);
        }
        src.line(
            1,
            format!("{}* judge_obj = {}({});", class, ctor_symbol, ctor_args.join(", ")),
        );
        src.line(1, "printf(\"null\\n\");");

        for (idx, (name, args)) in tx.calls().enumerate() {
            let method = require_method(hints, name)?;
            check_method_arity(method, args)?;

            src.line(1, "{");
            let mut call_args = vec!["judge_obj".to_string()];
            for (arg_idx, (value, ty)) in args.iter().zip(&method.param_types).enumerate() {
                let name = format!("judge_c{}_{}", idx, arg_idx);
                call_args.extend(declare(&mut src, 2, &name, &Kind::of(ty), value)?);
            }

            let symbol = method_symbol(class, method);
            if method.is_void() {
                src.line(2, format!("{}({});", symbol, call_args.join(", ")));
                src.line(2, "printf(\"null\\n\");");
            } else {
                let kind = Kind::of(&method.return_type);
                call_with_result(&mut src, 2, &symbol, call_args, &kind);
                print_result(&mut src, 2, &kind, true)?;
            }
            src.line(1, "}");
        }

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

/// `minStackPush` style symbol for a method without an explicit one
fn method_symbol(class: &str, method: &MethodHint) -> String {
    if let Some(symbol) = &method.symbol {
        return symbol.clone();
    }
    let mut chars = method.name.chars();
    let upper: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{}{}", lower_camel(class), upper)
}

fn scalar_literal(value: &Value, ty: &str) -> JudgeResult<String> {
    let text = match value {
        Value::Int(i) if ty == "double" || ty == "float" => float_literal(*i as f64),
        Value::Int(i) if *i < i32::MIN as i64 || *i > i32::MAX as i64 => format!("{}LL", i),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => float_literal(*f),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) if ty == "char" && s.chars().count() == 1 => c_char_literal(s),
        Value::Str(s) => c_string_literal(s),
        Value::Null => "0".to_string(),
        Value::Array(_) => {
            return Err(JudgeError::Synthesis(format!(
                "array value where C expects {}",
                ty
            )))
        }
    };
    Ok(text)
}

fn items_of<'a>(value: &'a Value, ty: &str) -> JudgeResult<&'a [Value]> {
    value
        .as_array()
        .ok_or_else(|| JudgeError::Synthesis(format!("scalar value where C expects {}", ty)))
}

fn array_literal(items: &[Value], elem: &str) -> JudgeResult<String> {
    let parts = items
        .iter()
        .map(|item| scalar_literal(item, elem))
        .collect::<JudgeResult<Vec<_>>>()?;
    Ok(format!("{{{}}}", parts.join(", ")))
}

/// Declare an array variable; zero-length C arrays are not allowed
fn declare_array(src: &mut Source, indent: usize, elem: &str, name: &str, literal: String, len: usize) {
    if len == 0 {
        src.line(indent, format!("{} {}[1] = {{0}};", elem, name));
    } else {
        src.line(indent, format!("{} {}[] = {};", elem, name, literal));
    }
}

/// Declare locals for one argument and return the expressions passed to the call
fn declare(
    src: &mut Source,
    indent: usize,
    name: &str,
    kind: &Kind,
    value: &Value,
) -> JudgeResult<Vec<String>> {
    let size = format!("{}_size", name);
    match kind {
        Kind::Scalar(ty) => {
            src.line(indent, format!("{} {} = {};", ty, name, scalar_literal(value, ty)?));
            Ok(vec![name.to_string()])
        }
        Kind::Str => {
            let text = value.to_string();
            src.line(indent, format!("char {}[] = {};", name, c_string_literal(&text)));
            Ok(vec![name.to_string()])
        }
        Kind::Array(elem) => {
            let items = items_of(value, elem)?;
            let literal = array_literal(items, elem)?;
            declare_array(src, indent, elem, name, literal, items.len());
            src.line(indent, format!("int {} = {};", size, items.len()));
            Ok(vec![name.to_string(), size])
        }
        Kind::StrArray => {
            let items = items_of(value, "char**")?;
            let parts: Vec<String> = items
                .iter()
                .map(|item| c_string_literal(&item.to_string()))
                .collect();
            let literal = format!("{{{}}}", parts.join(", "));
            declare_array(src, indent, "char*", name, literal, items.len());
            src.line(indent, format!("int {} = {};", size, items.len()));
            Ok(vec![name.to_string(), size])
        }
        Kind::Matrix(elem) => {
            let rows = items_of(value, elem)?;
            let mut row_names = Vec::with_capacity(rows.len());
            let mut col_sizes = Vec::with_capacity(rows.len());
            for (r, row) in rows.iter().enumerate() {
                let items = items_of(row, elem)?;
                let row_name = format!("{}_r{}", name, r);
                declare_array(src, indent, elem, &row_name, array_literal(items, elem)?, items.len());
                row_names.push(row_name);
                col_sizes.push(items.len().to_string());
            }
            let cols = format!("{}_cols", name);
            let pointer = format!("{}*", elem);
            declare_array(
                src,
                indent,
                &pointer,
                name,
                format!("{{{}}}", row_names.join(", ")),
                rows.len(),
            );
            src.line(indent, format!("int {} = {};", size, rows.len()));
            declare_array(
                src,
                indent,
                "int",
                &cols,
                format!("{{{}}}", col_sizes.join(", ")),
                rows.len(),
            );
            Ok(vec![name.to_string(), size, cols])
        }
    }
}

/// printf format and argument for one element of type `ty`
fn printf_spec(ty: &str, expr: &str) -> (&'static str, String) {
    match ty {
        "long" => ("%ld", expr.to_string()),
        "long long" => ("%lld", expr.to_string()),
        "unsigned" | "unsigned int" => ("%u", expr.to_string()),
        "size_t" => ("%zu", expr.to_string()),
        "double" | "float" => ("%.6f", format!("(double)({})", expr)),
        "bool" => ("%s", format!("({}) ? \"true\" : \"false\"", expr)),
        "char" => ("%c", expr.to_string()),
        "char*" => ("%s", format!("({}) ? ({}) : \"null\"", expr, expr)),
        _ => ("%d", expr.to_string()),
    }
}

/// Statement printing one array element; text elements are JSON-quoted
fn print_element(ty: &str, expr: &str) -> String {
    match ty {
        "char*" => format!("judge_put_str({});", expr),
        "char" => format!("judge_put_char({});", expr),
        _ => {
            let (fmt, arg) = printf_spec(ty, expr);
            format!("printf(\"{}\", {});", fmt, arg)
        }
    }
}

/// Call `symbol` storing its result in `judge_result` (plus size out-params)
fn call_with_result(src: &mut Source, indent: usize, symbol: &str, mut args: Vec<String>, kind: &Kind) {
    match kind {
        Kind::Scalar(ty) => {
            src.line(indent, format!("{} judge_result = {}({});", ty, symbol, args.join(", ")));
        }
        Kind::Str => {
            src.line(indent, format!("char* judge_result = {}({});", symbol, args.join(", ")));
        }
        Kind::Array(elem) => {
            src.line(indent, "int judge_return_size = 0;");
            args.push("&judge_return_size".to_string());
            src.line(indent, format!("{}* judge_result = {}({});", elem, symbol, args.join(", ")));
        }
        Kind::StrArray => {
            src.line(indent, "int judge_return_size = 0;");
            args.push("&judge_return_size".to_string());
            src.line(indent, format!("char** judge_result = {}({});", symbol, args.join(", ")));
        }
        Kind::Matrix(elem) => {
            src.line(indent, "int judge_return_size = 0;");
            src.line(indent, "int* judge_return_cols = NULL;");
            args.push("&judge_return_size".to_string());
            args.push("&judge_return_cols".to_string());
            src.line(indent, format!("{}** judge_result = {}({});", elem, symbol, args.join(", ")));
        }
    }
}

/// Print a space-separated (or `[a,b]` bracketed) 1-D array
fn print_array(src: &mut Source, indent: usize, elem: &str, name: &str, len: &str, bracketed: bool) {
    let (sep, open, close) = if bracketed { (",", "[", "]") } else { (" ", "", "") };
    if bracketed {
        src.line(indent, format!("printf(\"{}\");", open));
    }
    let element = print_element(elem, &format!("{}[judge_i]", name));
    src.line(indent, format!("for (int judge_i = 0; judge_i < {}; judge_i++) {{", len));
    src.line(indent + 1, format!("if (judge_i) printf(\"{}\");", sep));
    src.line(indent + 1, element);
    src.line(indent, "}");
    src.line(indent, format!("printf(\"{}\\n\");", close));
}

/// Row-count line followed by one line per row
fn print_matrix(src: &mut Source, indent: usize, elem: &str, name: &str, rows: &str, cols: &str) {
    let element = print_element(elem, &format!("{}[judge_r][judge_c]", name));
    src.line(indent, format!("printf(\"%d\\n\", {});", rows));
    src.line(indent, format!("for (int judge_r = 0; judge_r < {}; judge_r++) {{", rows));
    src.line(
        indent + 1,
        format!("for (int judge_c = 0; judge_c < {}[judge_r]; judge_c++) {{", cols),
    );
    src.line(indent + 2, "if (judge_c) printf(\" \");");
    src.line(indent + 2, element);
    src.line(indent + 1, "}");
    src.line(indent + 1, "printf(\"\\n\");");
    src.line(indent, "}");
}

fn print_result(src: &mut Source, indent: usize, kind: &Kind, bracketed: bool) -> JudgeResult<()> {
    match kind {
        Kind::Scalar(ty) => {
            let (fmt, arg) = printf_spec(ty, "judge_result");
            src.line(indent, format!("printf(\"{}\\n\", {});", fmt, arg));
        }
        Kind::Str => {
            let (fmt, arg) = printf_spec("char*", "judge_result");
            src.line(indent, format!("printf(\"{}\\n\", {});", fmt, arg));
        }
        Kind::Array(elem) => {
            print_array(src, indent, elem, "judge_result", "judge_return_size", bracketed)
        }
        Kind::StrArray => {
            print_array(src, indent, "char*", "judge_result", "judge_return_size", bracketed)
        }
        Kind::Matrix(_) if bracketed => {
            return Err(JudgeError::Synthesis(
                "matrix results are not supported in call logs".to_string(),
            ))
        }
        Kind::Matrix(elem) => print_matrix(
            src,
            indent,
            elem,
            "judge_result",
            "judge_return_size",
            "judge_return_cols",
        ),
    }
    Ok(())
}

/// Print an argument that the user's function mutated in place
fn print_declared(src: &mut Source, name: &str, kind: &Kind) {
    let size = format!("{}_size", name);
    match kind {
        Kind::Scalar(ty) => {
            let (fmt, arg) = printf_spec(ty, name);
            src.line(1, format!("printf(\"{}\\n\", {});", fmt, arg));
        }
        Kind::Str => src.line(1, format!("printf(\"%s\\n\", {});", name)),
        Kind::Array(elem) => print_array(src, 1, elem, name, &size, false),
        Kind::StrArray => print_array(src, 1, "char*", name, &size, false),
        Kind::Matrix(elem) => print_matrix(src, 1, elem, name, &size, &format!("{}_cols", name)),
    }
}
