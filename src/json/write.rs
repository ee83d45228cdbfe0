//! JSON writer for the value model.
//!
//! Renders a [`Value`] tree to compact JSON text. Non-finite floats are
//! written as the `NaN`/`Infinity` literals the reader accepts.
//!
//! The writer is used for serializer output (guaranteed acyclic by the
//! serializer's own cycle guard) and for echoing input snapshots in error
//! reports, which may alias or cycle; a re-entered handle is written as
//! `null` so a report can always be rendered. `Bytes` are echoed as lossy
//! UTF-8 strings and opaque objects as `"<TypeName>"`; the serializer
//! lowers both before they ever reach the writer on the output path.

use alloc::{string::String, sync::Arc, vec::Vec};

use crate::value::{Map, Value};

/// Render a value tree to compact JSON text.
#[must_use]
pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    let mut seen = Vec::new();
    write_value(&mut out, value, &mut seen);
    out
}

fn write_value(out: &mut String, value: &Value, seen: &mut Vec<usize>) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(v) => out.push_str(itoa::Buffer::new().format(*v)),
        Value::Float(f) => write_float(out, f.get()),
        Value::String(s) => write_string(out, s),
        Value::Bytes(b) => write_string(out, &String::from_utf8_lossy(b)),
        Value::Opaque(o) => {
            let mut name = String::with_capacity(o.type_name().len() + 2);
            name.push('<');
            name.push_str(o.type_name());
            name.push('>');
            write_string(out, &name);
        }
        Value::Seq(handle) => {
            let id = Arc::as_ptr(handle) as usize;
            if seen.contains(&id) {
                out.push_str("null");
                return;
            }
            seen.push(id);
            write_seq(out, &handle.read(), seen);
            seen.pop();
        }
        Value::Map(handle) => {
            let id = Arc::as_ptr(handle) as usize;
            if seen.contains(&id) {
                out.push_str("null");
                return;
            }
            seen.push(id);
            write_map(out, &handle.read(), seen);
            seen.pop();
        }
    }
}

fn write_seq(out: &mut String, items: &[Value], seen: &mut Vec<usize>) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_value(out, item, seen);
    }
    out.push(']');
}

fn write_map(out: &mut String, map: &Map, seen: &mut Vec<usize>) {
    out.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match key {
            Value::String(s) => write_string(out, s),
            // JSON keys must be strings; other keys are rendered as the
            // string form of their own JSON text.
            other => {
                let mut rendered = String::new();
                write_value(&mut rendered, other, seen);
                write_string(out, &rendered);
            }
        }
        out.push(':');
        write_value(out, value, seen);
    }
    out.push('}');
}

fn write_float(out: &mut String, v: f64) {
    if v.is_nan() {
        out.push_str("NaN");
    } else if v.is_infinite() {
        out.push_str(if v.is_sign_positive() {
            "Infinity"
        } else {
            "-Infinity"
        });
    } else {
        let s = v.to_string();
        out.push_str(&s);
        if !s.contains(['.', 'e', 'E']) {
            out.push_str(".0");
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str("\\u");
                let code = c as u32;
                for shift in [12, 8, 4, 0] {
                    let digit = (code >> shift) & 0xF;
                    out.push(char::from_digit(digit, 16).unwrap_or('0'));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(to_string(&Value::Null), "null");
        assert_eq!(to_string(&Value::Bool(true)), "true");
        assert_eq!(to_string(&Value::Int(-3)), "-3");
        assert_eq!(to_string(&Value::from(1.5)), "1.5");
        assert_eq!(to_string(&Value::from(2.0)), "2.0");
        assert_eq!(to_string(&Value::from(f64::NAN)), "NaN");
        assert_eq!(to_string(&Value::from(f64::NEG_INFINITY)), "-Infinity");
    }

    #[test]
    fn string_escaping() {
        assert_eq!(to_string(&Value::from("a\"b\\c\n")), r#""a\"b\\c\n""#);
        assert_eq!(to_string(&Value::from("\u{1}")), "\"\\u0001\"");
    }

    #[test]
    fn containers() {
        let v = Value::map(
            [
                ("a", Value::seq(vec![1_i64.into(), 2_i64.into()])),
                ("b", Value::Null),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(to_string(&v), r#"{"a":[1,2],"b":null}"#);
    }

    #[test]
    fn roundtrips_through_reader() {
        let v = Value::map(
            [
                ("x", Value::from(1.25)),
                ("y", Value::seq(vec!["s".into(), Value::Bool(false)])),
            ]
            .into_iter()
            .collect(),
        );
        let text = to_string(&v);
        assert_eq!(crate::json::parse(text.as_bytes()).unwrap(), v);
    }

    #[test]
    fn cyclic_echo_writes_null() {
        let seq = Value::seq(vec![Value::Int(1)]);
        if let Value::Seq(handle) = &seq {
            handle.write().push(seq.clone());
        }
        assert_eq!(to_string(&seq), "[1,null]");
    }
}
