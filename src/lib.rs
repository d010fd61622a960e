pub mod error;
pub mod grammar;
pub mod json;
pub mod parser;
pub mod value;

pub use error::{Position, ShorthandError};
pub use value::{Map, Value};

use grammar::Patterns;

// ── Core API ───────────────────────────────────────────────────────

/// Parses the compact `key=value` shorthand used on command lines:
///
/// ```
/// use shorthand::{ShorthandParser, Value};
///
/// let parser = ShorthandParser::new();
/// let parsed = parser.parse("foo=bar,baz=a,b").unwrap();
/// assert_eq!(parsed["foo"], Value::from("bar"));
/// assert_eq!(parsed["baz"], Value::List(vec!["a".into(), "b".into()]));
/// ```
///
/// The parser holds only the shared, precompiled token patterns. Every
/// call to [`parse`](Self::parse) runs over its own cursor, so one
/// instance can be used from several threads at once.
#[derive(Clone, Copy)]
pub struct ShorthandParser {
    patterns: &'static Patterns,
}

impl ShorthandParser {
    pub fn new() -> Self {
        ShorthandParser {
            patterns: grammar::patterns(),
        }
    }

    /// Parse one shorthand expression into an ordered map.
    pub fn parse(&self, input: &str) -> Result<Map, ShorthandError> {
        parser::parse_with(input, self.patterns)
    }
}

impl Default for ShorthandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a shorthand expression with the shared parser.
pub fn parse_shorthand(input: &str) -> Result<Map, ShorthandError> {
    parser::parse(input)
}

/// A parse outcome in the shape handed across the FFI boundary.
pub struct ShorthandResult {
    pub value: Option<Map>,
    pub errors: Vec<ShorthandError>,
}

impl ShorthandResult {
    pub fn from_input(input: &str) -> Self {
        match parse_shorthand(input) {
            Ok(map) => ShorthandResult {
                value: Some(map),
                errors: Vec::new(),
            },
            Err(err) => ShorthandResult {
                value: None,
                errors: vec![err],
            },
        }
    }

    /// Serialize as `{"value": {...} | null, "errors": [...]}`.
    pub fn to_json(&self) -> String {
        json::result_to_json(self.value.as_ref(), &self.errors)
    }
}

// ── WASM FFI ────────────────────────────────────────────────────────

/// Allocate `len` bytes in WASM memory, returning a pointer.
/// A zero-length request returns a dangling, non-null pointer.
/// The caller must free the returned pointer with `dealloc(ptr, len)`.
#[no_mangle]
pub extern "C" fn alloc(len: usize) -> *mut u8 {
    if len == 0 {
        return std::ptr::NonNull::dangling().as_ptr();
    }
    let layout = std::alloc::Layout::from_size_align(len, 1).unwrap();
    unsafe { std::alloc::alloc(layout) }
}

/// Free a buffer previously returned by `alloc` or `wasm_parse`. For
/// null-terminated strings returned by `wasm_parse`, pass
/// `strlen(ptr) + 1` as `len`.
#[no_mangle]
pub unsafe extern "C" fn dealloc(ptr: *mut u8, len: usize) {
    if len == 0 {
        return;
    }
    let layout = std::alloc::Layout::from_size_align(len, 1).unwrap();
    unsafe { std::alloc::dealloc(ptr, layout) };
}

/// Parse a UTF-8 shorthand expression.
/// Returns a pointer to a null-terminated JSON result document.
#[no_mangle]
pub unsafe extern "C" fn wasm_parse(src_ptr: *const u8, src_len: usize) -> *const u8 {
    let bytes = unsafe { std::slice::from_raw_parts(src_ptr, src_len) };
    let json_str = match std::str::from_utf8(bytes) {
        Ok(input) => ShorthandResult::from_input(input).to_json(),
        Err(_) => String::from(
            "{\"value\":null,\"errors\":[{\"code\":\"shorthand-invalid-utf8\",\"message\":\"Input is not valid UTF-8\"}]}",
        ),
    };
    string_to_c_ptr(json_str)
}

/// Convert a String to a null-terminated C pointer with exact allocation size.
/// The allocation size is exactly `s.len() + 1` bytes, so the caller can
/// free with `dealloc(ptr, strlen(ptr) + 1)`.
fn string_to_c_ptr(s: String) -> *const u8 {
    let mut bytes = s.into_bytes();
    bytes.push(0);
    // into_boxed_slice guarantees allocation size == bytes.len()
    let boxed = bytes.into_boxed_slice();
    Box::into_raw(boxed) as *mut u8
}
