use crate::error::{Position, ShorthandError};
use crate::value::{Map, Value};

use std::fmt::Write;

/// JSON formatting style.
#[derive(Clone, Copy)]
pub enum JsonStyle {
    /// Compact: no whitespace between tokens.
    Compact,
    /// Pretty: 2-space indented, one entry per line.
    Pretty,
}

struct JsonWriter {
    buf: String,
    style: JsonStyle,
    depth: usize,
}

impl JsonWriter {
    fn new(style: JsonStyle) -> Self {
        JsonWriter {
            buf: String::new(),
            style,
            depth: 0,
        }
    }

    fn is_pretty(&self) -> bool {
        matches!(self.style, JsonStyle::Pretty)
    }

    fn newline(&mut self) {
        if self.is_pretty() {
            self.buf.push('\n');
            for _ in 0..self.depth {
                self.buf.push_str("  ");
            }
        }
    }

    fn space(&mut self) {
        if self.is_pretty() {
            self.buf.push(' ');
        }
    }

    fn write_value(&mut self, value: &Value) {
        match value {
            Value::String(s) => self.write_string_value(s),
            Value::List(items) => self.write_list(items),
            Value::Map(map) => self.write_map(map),
        }
    }

    fn write_list(&mut self, items: &[Value]) {
        self.buf.push('[');
        self.depth += 1;

        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.newline();
            self.write_value(item);
        }

        self.depth -= 1;
        if !items.is_empty() {
            self.newline();
        }
        self.buf.push(']');
    }

    fn write_map(&mut self, map: &Map) {
        self.buf.push('{');
        self.depth += 1;

        let mut first = true;
        for (key, value) in map {
            self.entry_sep(&mut first);
            self.write_key(key);
            self.write_value(value);
        }

        self.depth -= 1;
        if !map.is_empty() {
            self.newline();
        }
        self.buf.push('}');
    }

    fn entry_sep(&mut self, first: &mut bool) {
        if *first {
            *first = false;
        } else {
            self.buf.push(',');
        }
        self.newline();
    }

    fn write_key(&mut self, key: &str) {
        self.write_string_value(key);
        self.buf.push(':');
        self.space();
    }

    fn write_string_value(&mut self, s: &str) {
        self.buf.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.buf.push_str("\\\""),
                '\\' => self.buf.push_str("\\\\"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                '\u{0008}' => self.buf.push_str("\\b"),
                '\u{000C}' => self.buf.push_str("\\f"),
                c if c < '\u{0020}' => {
                    let _ = write!(&mut self.buf, "\\u{:04x}", c as u32);
                }
                c => self.buf.push(c),
            }
        }
        self.buf.push('"');
    }

    fn write_position(&mut self, pos: &Position) {
        let _ = write!(
            &mut self.buf,
            "{{\"line\":{},\"column\":{},\"offset\":{}}}",
            pos.line, pos.column, pos.offset
        );
    }

    fn write_errors(&mut self, errors: &[ShorthandError]) {
        self.buf.push('[');
        for (i, err) in errors.iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.buf.push('{');
            self.write_key("code");
            self.write_string_value(err.code());
            self.buf.push(',');
            self.write_key("message");
            self.write_string_value(&err.to_string());
            if let Some(key) = err.key() {
                self.buf.push(',');
                self.write_key("key");
                self.write_string_value(key);
            }
            self.buf.push(',');
            self.write_key("begin");
            self.write_position(&err.position());
            self.buf.push('}');
        }
        self.buf.push(']');
    }
}

/// Serialize a parsed value.
pub fn value_to_json(value: &Value, style: JsonStyle) -> String {
    let mut w = JsonWriter::new(style);
    w.write_value(value);
    w.buf
}

/// Serialize a top-level parse result.
pub fn map_to_json(map: &Map, style: JsonStyle) -> String {
    let mut w = JsonWriter::new(style);
    w.write_map(map);
    w.buf
}

/// Serialize `{"value": ..., "errors": [...]}` for the FFI boundary.
pub fn result_to_json(value: Option<&Map>, errors: &[ShorthandError]) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.buf.push('{');
    w.write_key("value");
    match value {
        Some(map) => w.write_map(map),
        None => w.buf.push_str("null"),
    }
    w.buf.push(',');
    w.write_key("errors");
    w.write_errors(errors);
    w.buf.push('}');
    w.buf
}
