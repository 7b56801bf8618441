//! Call sources: adapters that turn source text into normalized [`CallNode`]s.
//!
//! - `jsx`: swc syntax tree (TypeScript/JSX/ECMAScript by file extension)
//! - `text`: regex token scan, for sources the tree parser cannot handle

pub mod jsx;
pub mod text;

use crate::config::ParserKind;
use crate::core::call::CallNode;
use crate::error::Result;

pub use jsx::AstCallSource;
pub use text::TextCallSource;

/// One file handed to the rewriter by the host pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// File identity, used in diagnostics and as the affected-file handle.
    pub path: String,
    pub code: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code: code.into(),
        }
    }
}

/// Enumerates the calls of a source unit whose callee starts with the marker.
pub trait CallSource: Send + Sync {
    fn calls(&self, unit: &SourceUnit) -> Result<Vec<CallNode>>;
}

pub fn call_source(kind: ParserKind, marker: &str) -> Result<Box<dyn CallSource>> {
    Ok(match kind {
        ParserKind::Ast => Box::new(AstCallSource::new(marker)),
        ParserKind::Text => Box::new(TextCallSource::new(marker)?),
    })
}

/// Line (1-indexed), column (1-indexed, in chars) and line text for a byte offset.
pub(crate) fn position_of(code: &str, offset: usize) -> (usize, usize, String) {
    let offset = offset.min(code.len());
    let before = code.get(..offset).unwrap_or_default();
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = before.get(line_start..).unwrap_or_default().chars().count() + 1;
    let source_line = code
        .get(line_start..)
        .and_then(|rest| rest.lines().next())
        .unwrap_or_default()
        .to_string();
    (line, col, source_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of() {
        let code = "const a = 1;\nconst 你 = i18n.s('x');\n";
        let offset = code.find("i18n").unwrap();
        let (line, col, source_line) = position_of(code, offset);
        assert_eq!(line, 2);
        assert_eq!(col, 11);
        assert_eq!(source_line, "const 你 = i18n.s('x');");
    }

    #[test]
    fn test_position_of_start() {
        let (line, col, source_line) = position_of("abc", 0);
        assert_eq!((line, col), (1, 1));
        assert_eq!(source_line, "abc");
    }
}
