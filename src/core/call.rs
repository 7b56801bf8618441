//! Normalized call view and the marker matcher.
//!
//! Parser adapters reduce whatever node shapes they produce to [`CallNode`]
//! values; [`match_marker`] is the single place that decides whether a call is
//! a `<marker>.s(phrase, namespace?)` marker.

use std::ops::Range;

/// Position in a source file (1-indexed line and column).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub file_path: String,
    pub line: usize,
    pub col: usize,
}

impl SourceLocation {
    pub fn new(file_path: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            col,
        }
    }
}

/// Quote character of a string literal, reused when emitting the replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quote {
    #[default]
    Single,
    Double,
}

impl Quote {
    pub fn from_raw(raw: &str) -> Self {
        if raw.starts_with('"') {
            Quote::Double
        } else {
            Quote::Single
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }
}

/// A call argument as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// String literal (or template literal without expressions).
    Str { value: String, quote: Quote },
    /// Anything else: identifiers, expressions, spreads.
    Other,
}

impl CallArg {
    pub fn str(value: impl Into<String>, quote: Quote) -> Self {
        CallArg::Str {
            value: value.into(),
            quote,
        }
    }
}

/// A call expression with a static callee path, e.g. `i18n.s('你好')` has the
/// callee path `["i18n", "s"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallNode {
    pub callee_path: Vec<String>,
    pub args: Vec<CallArg>,
    /// Byte range of the whole call in the source text.
    pub span: Range<usize>,
    pub location: SourceLocation,
    /// The source line containing the call, for reporting.
    pub source_line: String,
}

/// A call recognized as `<marker>.s(phrase)` or `<marker>.s(phrase, namespace)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerCall {
    pub phrase: String,
    /// Explicit namespace argument, `None` means the default namespace.
    pub namespace: Option<String>,
    pub quote: Quote,
    pub span: Range<usize>,
    pub location: SourceLocation,
    pub source_line: String,
}

pub fn match_marker(node: &CallNode, marker: &str) -> Option<MarkerCall> {
    let [object, method] = node.callee_path.as_slice() else {
        return None;
    };
    if object != marker || method != "s" {
        return None;
    }

    let (phrase, quote, namespace) = match node.args.as_slice() {
        [CallArg::Str { value, quote }] => (value, *quote, None),
        [CallArg::Str { value, quote }, CallArg::Str { value: ns, .. }] => {
            (value, *quote, Some(ns.clone()))
        }
        _ => return None,
    };

    Some(MarkerCall {
        phrase: phrase.clone(),
        namespace,
        quote,
        span: node.span.clone(),
        location: node.location.clone(),
        source_line: node.source_line.clone(),
    })
}

/// Render `value` as a JavaScript string literal using `quote`.
pub fn quote_js(value: &str, quote: Quote) -> String {
    let q = quote.as_char();
    let mut out = String::with_capacity(value.len() + 2);
    out.push(q);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}
