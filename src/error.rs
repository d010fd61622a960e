use thiserror::Error;

/// A 0-based position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 0-based line number
    pub line: usize,
    /// 0-based column (character offset within the line)
    pub column: usize,
    /// 0-based absolute byte offset from the start of input
    pub offset: usize,
}

impl Position {
    /// Locate a byte offset within `input`.
    pub fn locate(input: &str, offset: usize) -> Self {
        let consumed = &input[..offset];
        let line = consumed.matches('\n').count();
        let line_start = consumed.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = consumed[line_start..].chars().count();
        Position {
            line,
            column,
            offset,
        }
    }
}

/// A failure to parse a shorthand expression.
///
/// Every variant carries the full input so the message can point at the
/// offending column with a caret.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShorthandError {
    /// An expected character or token was not found at the cursor.
    #[error(
        "Expected: '{expected}', received: '{actual}' for input:\n{}",
        caret_diagnostic(.input, .position)
    )]
    Syntax {
        input: String,
        expected: String,
        actual: String,
        position: Position,
    },

    /// The same top-level key was assigned twice.
    #[error(
        "Second instance of key \"{key}\" encountered for input:\n{}\nThis is often because there is a preceding \",\" instead of a space.",
        caret_diagnostic(.input, .position)
    )]
    DuplicateKey {
        input: String,
        key: String,
        position: Position,
    },

    /// Explicit lists and hash literals nested deeper than the parser allows.
    #[error(
        "Maximum nesting depth of {max_depth} exceeded for input:\n{}",
        caret_diagnostic(.input, .position)
    )]
    MaxDepthExceeded {
        input: String,
        max_depth: usize,
        position: Position,
    },
}

impl ShorthandError {
    pub fn syntax(input: &str, expected: impl Into<String>, actual: impl Into<String>, offset: usize) -> Self {
        ShorthandError::Syntax {
            input: input.to_string(),
            expected: expected.into(),
            actual: actual.into(),
            position: Position::locate(input, offset),
        }
    }

    pub fn duplicate_key(input: &str, key: impl Into<String>, offset: usize) -> Self {
        ShorthandError::DuplicateKey {
            input: input.to_string(),
            key: key.into(),
            position: Position::locate(input, offset),
        }
    }

    pub fn max_depth_exceeded(input: &str, max_depth: usize, offset: usize) -> Self {
        ShorthandError::MaxDepthExceeded {
            input: input.to_string(),
            max_depth,
            position: Position::locate(input, offset),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ShorthandError::Syntax { .. } => "shorthand-syntax-error",
            ShorthandError::DuplicateKey { .. } => "shorthand-duplicate-key",
            ShorthandError::MaxDepthExceeded { .. } => "shorthand-max-depth",
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ShorthandError::Syntax { position, .. }
            | ShorthandError::DuplicateKey { position, .. }
            | ShorthandError::MaxDepthExceeded { position, .. } => *position,
        }
    }

    /// Byte offset into the input where the error was detected.
    pub fn index(&self) -> usize {
        self.position().offset
    }

    pub fn input(&self) -> &str {
        match self {
            ShorthandError::Syntax { input, .. }
            | ShorthandError::DuplicateKey { input, .. }
            | ShorthandError::MaxDepthExceeded { input, .. } => input,
        }
    }

    /// The repeated key, for duplicate-key errors.
    pub fn key(&self) -> Option<&str> {
        match self {
            ShorthandError::DuplicateKey { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Render `input` with a `^` under the column at `at`.
///
/// For multi-line input the caret goes directly below the failing line
/// and the remaining lines follow it:
///
/// ```text
/// foo==bar,
///     ^
/// bar=baz
/// ```
pub fn caret_diagnostic(input: &str, at: &Position) -> String {
    let (consumed, remaining) = match input[at.offset..].find('\n') {
        Some(i) => input.split_at(at.offset + i),
        None => (input, ""),
    };
    format!("{}\n{}^{}", consumed, " ".repeat(at.column), remaining)
}
