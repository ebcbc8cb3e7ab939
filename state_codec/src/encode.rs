use ahash::AHashSet;

use crate::value::Value;

/// Stand-in literal emitted when a container is reached a second time
/// within one encode call.
pub const CIRCULAR_SENTINEL: &str = "[circular]";

/// Flatten a value into self-delimited text.
///
/// The output is JSON-compatible: lists as arrays, maps as objects, strings
/// quoted with control characters escaped, numbers locale-free. Rounding of
/// floats (one decimal place on the wire) is the caller's job, not the
/// encoder's. Cyclic or aliased containers never recurse twice: the visited
/// set lives for exactly this call and any repeat encounter is replaced by
/// [`CIRCULAR_SENTINEL`], so encoding always terminates.
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    let mut visited: AHashSet<usize> = AHashSet::new();
    write_value(&mut out, value, &mut visited);
    out
}

fn write_value(out: &mut String, value: &Value, visited: &mut AHashSet<usize>) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, *n),
        Value::Text(s) => write_quoted(out, s),
        Value::List(list) => {
            if !visited.insert(list.identity()) {
                write_quoted(out, CIRCULAR_SENTINEL);
                return;
            }
            out.push('[');
            for (index, item) in list.items().iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_value(out, item, visited);
            }
            out.push(']');
        }
        Value::Map(map) => {
            if !visited.insert(map.identity()) {
                write_quoted(out, CIRCULAR_SENTINEL);
                return;
            }
            out.push('{');
            for (index, (key, item)) in map.entries().iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_quoted(out, key);
                out.push(':');
                write_value(out, item, visited);
            }
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: f64) {
    if !n.is_finite() {
        // The value model has no representation for these; the producer's
        // sentinel for unknown numerics is -1, so degrade the same way.
        out.push_str("null");
    } else if n.fract() == 0.0 && n.abs() < 9e15 {
        out.push_str(&format!("{}", n as i64));
    } else {
        out.push_str(&format!("{}", n));
    }
}

fn write_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
