use crate::error::ShorthandError;
use crate::grammar::{patterns, NamedPattern, Patterns};
use crate::value::{Map, Value};

/// Maximum nesting of explicit lists and hash literals.
pub const MAX_DEPTH: usize = 128;

/// Parser state for a single call: tracks position in the input string.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    patterns: &'static Patterns,
}

/// Outcome of one step of a comma-separated list.
enum CsvItem {
    /// A value followed by a comma; `separator` is the comma's offset.
    More { value: String, separator: usize },
    /// A value that ran to the end of input.
    Last(String),
}

/// Parse a shorthand expression into an ordered map of top-level keys.
pub fn parse(input: &str) -> Result<Map, ShorthandError> {
    parse_with(input, patterns())
}

pub(crate) fn parse_with(input: &str, patterns: &'static Patterns) -> Result<Map, ShorthandError> {
    let mut cursor = Cursor {
        input,
        pos: 0,
        depth: 0,
        patterns,
    };
    cursor.parse_parameter()
}

impl<'a> Cursor<'a> {
    // ── Helpers ──────────────────────────────────────────────────────

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn current(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn syntax_error(&self, expected: impl Into<String>, actual: impl Into<String>) -> ShorthandError {
        ShorthandError::syntax(self.input, expected, actual, self.pos)
    }

    fn expect(&mut self, ch: char, consume_whitespace: bool) -> Result<(), ShorthandError> {
        if consume_whitespace {
            self.consume_whitespace();
        }
        match self.current() {
            None => return Err(self.syntax_error(ch, "EOF")),
            Some(actual) if actual != ch => return Err(self.syntax_error(ch, actual)),
            Some(_) => self.advance(ch.len_utf8()),
        }
        if consume_whitespace {
            self.consume_whitespace();
        }
        Ok(())
    }

    fn consume_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c') {
                self.advance(1);
            } else {
                break;
            }
        }
    }

    fn must_consume(&mut self, pattern: &NamedPattern) -> Result<&'a str, ShorthandError> {
        match pattern.match_len(self.remaining()) {
            Some(len) => {
                let matched = &self.input[self.pos..self.pos + len];
                self.advance(len);
                Ok(matched)
            }
            None => Err(self.syntax_error(format!("<{}>", pattern.name), "<none>")),
        }
    }

    /// Track entry into a `[...]` or `{...}`; fails past `MAX_DEPTH`.
    fn enter_nested(&mut self) -> Result<(), ShorthandError> {
        if self.depth >= MAX_DEPTH {
            return Err(ShorthandError::max_depth_exceeded(self.input, MAX_DEPTH, self.pos));
        }
        self.depth += 1;
        Ok(())
    }

    // ── Top level ───────────────────────────────────────────────────

    /// parameter = keyval *("," keyval)
    fn parse_parameter(&mut self) -> Result<Map, ShorthandError> {
        let mut params = Map::new();
        let (key, value) = self.parse_keyval()?;
        params.insert(key, value);
        self.consume_whitespace();
        while !self.at_eof() {
            self.expect(',', true)?;
            let key_start = self.pos;
            let (key, value) = self.parse_keyval()?;
            if params.contains_key(&key) {
                return Err(ShorthandError::duplicate_key(self.input, key, key_start));
            }
            params.insert(key, value);
            self.consume_whitespace();
        }
        Ok(params)
    }

    /// keyval = key "=" values
    fn parse_keyval(&mut self) -> Result<(String, Value), ShorthandError> {
        let key = self.parse_key();
        self.expect('=', true)?;
        let value = self.parse_values()?;
        Ok((key, value))
    }

    fn parse_key(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '#' | '/' | ':') {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    // ── Values ──────────────────────────────────────────────────────

    /// values = csv-list / explicit-list / hash-literal / ""
    fn parse_values(&mut self) -> Result<Value, ShorthandError> {
        match self.current() {
            None => Ok(Value::String(String::new())),
            Some('[') => self.parse_explicit_list().map(Value::List),
            Some('{') => self.parse_hash_literal().map(Value::Map),
            Some(_) => self.parse_csv_value(),
        }
    }

    /// A lone value stays a scalar (`foo=bar`); a comma turns it into a
    /// list (`foo=bar,baz`). When a later item turns out to be the start
    /// of the next `key=`, the cursor goes back to the last separator
    /// and the list ends there:
    ///
    /// ```text
    /// foo=a,b,c=d
    ///          ^ expected ',' received '='
    ///        ^ resume here
    /// ```
    fn parse_csv_value(&mut self) -> Result<Value, ShorthandError> {
        let first = self.parse_first_value()?;
        self.consume_whitespace();
        if self.current() != Some(',') {
            return Ok(Value::String(first));
        }
        let mut separator = self.pos;
        self.expect(',', true)?;

        let mut values = vec![first];
        loop {
            match self.next_csv_item() {
                Ok(CsvItem::Last(value)) => {
                    values.push(value);
                    break;
                }
                Ok(CsvItem::More {
                    value,
                    separator: next,
                }) => {
                    values.push(value);
                    separator = next;
                }
                // Nothing left to hand back to the caller.
                Err(err) if self.at_eof() => return Err(err),
                Err(_) => {
                    self.pos = separator;
                    break;
                }
            }
        }

        if values.len() == 1 {
            return Ok(Value::String(values.swap_remove(0)));
        }
        Ok(Value::List(values.into_iter().map(Value::String).collect()))
    }

    fn next_csv_item(&mut self) -> Result<CsvItem, ShorthandError> {
        let value = self.parse_second_value()?;
        self.consume_whitespace();
        if self.at_eof() {
            return Ok(CsvItem::Last(value));
        }
        let separator = self.pos;
        self.expect(',', true)?;
        Ok(CsvItem::More { value, separator })
    }

    /// explicit-list = "[" [ explicit-value *("," explicit-value) ] "]"
    fn parse_explicit_list(&mut self) -> Result<Vec<Value>, ShorthandError> {
        self.enter_nested()?;
        self.expect('[', true)?;
        let mut values = Vec::new();
        while self.current() != Some(']') {
            values.push(self.parse_explicit_value()?);
            self.consume_whitespace();
            if self.current() != Some(']') {
                self.expect(',', false)?;
                self.consume_whitespace();
            }
        }
        self.expect(']', false)?;
        self.depth -= 1;
        Ok(values)
    }

    /// hash-literal = "{" [ key "=" explicit-value *("," key "=" explicit-value) ] "}"
    ///
    /// A repeated key overwrites the earlier value.
    fn parse_hash_literal(&mut self) -> Result<Map, ShorthandError> {
        self.enter_nested()?;
        self.expect('{', true)?;
        let mut keyvals = Map::new();
        while self.current() != Some('}') {
            let key = self.parse_key();
            self.expect('=', true)?;
            let value = self.parse_explicit_value()?;
            self.consume_whitespace();
            if self.current() != Some('}') {
                self.expect(',', false)?;
                self.consume_whitespace();
            }
            keyvals.insert(key, value);
        }
        self.expect('}', false)?;
        self.depth -= 1;
        Ok(keyvals)
    }

    fn parse_explicit_value(&mut self) -> Result<Value, ShorthandError> {
        match self.current() {
            Some('[') => self.parse_explicit_list().map(Value::List),
            Some('{') => self.parse_hash_literal().map(Value::Map),
            _ => self.parse_first_value().map(Value::String),
        }
    }

    // ── Scalars ─────────────────────────────────────────────────────

    /// first-value = quoted-value / unquoted run, possibly empty
    fn parse_first_value(&mut self) -> Result<String, ShorthandError> {
        let patterns = self.patterns;
        match self.current() {
            Some('\'') => self.parse_quoted(&patterns.single_quoted, '\''),
            Some('"') => self.parse_quoted(&patterns.double_quoted, '"'),
            _ => match patterns.first_value.match_len(self.remaining()) {
                Some(len) => {
                    let raw = &self.input[self.pos..self.pos + len];
                    self.advance(len);
                    Ok(unescape_unquoted(raw))
                }
                None => Ok(String::new()),
            },
        }
    }

    /// Like a first value, but must be non-empty and may not contain `=`.
    fn parse_second_value(&mut self) -> Result<String, ShorthandError> {
        let patterns = self.patterns;
        match self.current() {
            Some('\'') => self.parse_quoted(&patterns.single_quoted, '\''),
            Some('"') => self.parse_quoted(&patterns.double_quoted, '"'),
            _ => {
                let raw = self.must_consume(&patterns.second_value)?;
                Ok(unescape_unquoted(raw))
            }
        }
    }

    fn parse_quoted(&mut self, pattern: &NamedPattern, quote: char) -> Result<String, ShorthandError> {
        let raw = self.must_consume(pattern)?;
        let inner = &raw[1..raw.len() - 1];
        Ok(inner
            .replace(&format!("\\{}", quote), &quote.to_string())
            .replace("\\\\", "\\"))
    }
}

/// `\,` becomes a literal comma; trailing whitespace is dropped.
fn unescape_unquoted(raw: &str) -> String {
    raw.replace("\\,", ",").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn backtrack_hands_next_key_to_caller() {
        let parsed = parse("foo=a,b,c,bar=d,e,f").unwrap();
        assert_eq!(
            parsed["foo"],
            Value::List(vec![s("a"), s("b"), s("c")])
        );
        assert_eq!(
            parsed["bar"],
            Value::List(vec![s("d"), s("e"), s("f")])
        );
    }

    #[test]
    fn backtrack_collapses_single_item_to_scalar() {
        let parsed = parse("foo=a,b=with space").unwrap();
        assert_eq!(parsed["foo"], s("a"));
        assert_eq!(parsed["b"], s("with space"));
    }

    #[test]
    fn trailing_comma_at_eof_is_not_backtracked() {
        let err = parse("foo=a,").unwrap_err();
        match &err {
            ShorthandError::Syntax {
                expected, actual, ..
            } => {
                assert_eq!(expected, "<second>");
                assert_eq!(actual, "<none>");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.index(), 6);
    }

    #[test]
    fn escaped_comma_stays_in_scalar() {
        let parsed = parse(r"foo=a\,b").unwrap();
        assert_eq!(parsed["foo"], s("a,b"));
        let parsed = parse(r"foo=x,a\,b").unwrap();
        assert_eq!(parsed["foo"], Value::List(vec![s("x"), s("a,b")]));
    }

    #[test]
    fn quoted_escapes() {
        assert_eq!(parse(r"foo='it\'s'").unwrap()["foo"], s("it's"));
        assert_eq!(parse(r#"foo="a\\b""#).unwrap()["foo"], s(r"a\b"));
        assert_eq!(parse(r#"foo="a\nb""#).unwrap()["foo"], s(r"a\nb"));
        assert_eq!(parse("foo=' padded '").unwrap()["foo"], s(" padded "));
    }

    #[test]
    fn quoted_values_in_lists() {
        let parsed = parse(r#"foo=a,'b,c',"d""#).unwrap();
        assert_eq!(
            parsed["foo"],
            Value::List(vec![s("a"), s("b,c"), s("d")])
        );
    }

    #[test]
    fn hash_literal_duplicate_keys_overwrite() {
        let parsed = parse("foo={a=b,a=c}").unwrap();
        let map = parsed["foo"].as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], s("c"));
    }

    #[test]
    fn explicit_list_trailing_comma() {
        assert_eq!(
            parse("foo=[a,]").unwrap()["foo"],
            Value::List(vec![s("a")])
        );
        assert_eq!(
            parse("foo=[ a , b ]").unwrap()["foo"],
            Value::List(vec![s("a"), s("b")])
        );
    }

    #[test]
    fn unclosed_list_reports_eof() {
        let err = parse("foo=[a").unwrap_err();
        match &err {
            ShorthandError::Syntax { actual, .. } => assert_eq!(actual, "EOF"),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.index(), 6);
    }

    #[test]
    fn whitespace_after_closing_bracket() {
        let parsed = parse("foo=[a] , bar={x=y} ").unwrap();
        assert_eq!(parsed["foo"], Value::List(vec![s("a")]));
        assert_eq!(parsed["bar"].get("x"), Some(&s("y")));
    }

    #[test]
    fn nesting_deeper_than_limit_is_an_error() {
        let input = format!("foo={}", "[".repeat(200_000));
        let err = parse(&input).unwrap_err();
        assert_eq!(err.code(), "shorthand-max-depth");
        assert_eq!(err.index(), 4 + MAX_DEPTH);

        let input = format!("foo={}", "{a=".repeat(MAX_DEPTH + 1));
        let err = parse(&input).unwrap_err();
        assert!(matches!(
            err,
            ShorthandError::MaxDepthExceeded { max_depth: MAX_DEPTH, .. }
        ));
    }

    #[test]
    fn nesting_at_limit_parses() {
        let input = format!("foo={}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        let mut value = &parse(&input).unwrap()["foo"];
        for _ in 1..MAX_DEPTH {
            value = &value.as_list().unwrap()[0];
        }
        assert_eq!(value, &Value::List(Vec::new()));

        // Depth is released on the way out, so siblings do not accumulate.
        let sibling = format!("[{}{}]", "[".repeat(MAX_DEPTH - 2), "]".repeat(MAX_DEPTH - 2));
        let input = format!("a={},b={},c={{x={}}}", sibling, sibling, sibling);
        assert!(parse(&input).is_ok());
    }

    #[test]
    fn key_charset() {
        let parsed = parse("a-b_c.d#e/f:g=1").unwrap();
        assert_eq!(parsed["a-b_c.d#e/f:g"], s("1"));
    }

    #[test]
    fn keys_keep_input_order() {
        let parsed = parse("z=1,a=2,m=3").unwrap();
        let keys: Vec<&str> = parsed.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
