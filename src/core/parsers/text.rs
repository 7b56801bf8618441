//! Regex call source.
//!
//! Recognizes only the literal-argument marker shapes; it never builds a
//! syntax tree, so it also works on sources the swc parser rejects.

use regex::Regex;

use super::{CallSource, SourceUnit, position_of};
use crate::core::call::{CallArg, CallNode, Quote, SourceLocation};
use crate::error::{Error, Result};

const STRING_LITERAL: &str = r#"'(?:[^'\\\r\n]|\\.)*'|"(?:[^"\\\r\n]|\\.)*""#;

pub struct TextCallSource {
    marker: String,
    pattern: Regex,
}

impl TextCallSource {
    pub fn new(marker: &str) -> Result<Self> {
        let pattern = format!(
            r"{marker}\s*\.\s*s\s*\(\s*(?P<phrase>{lit})\s*(?:,\s*(?P<ns>{lit})\s*)?,?\s*\)",
            marker = regex::escape(marker),
            lit = STRING_LITERAL,
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| Error::configuration(format!("invalid marker \"{marker}\": {e}")))?;
        Ok(Self {
            marker: marker.to_string(),
            pattern,
        })
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn literal_arg(literal: &str) -> CallArg {
    let quote = Quote::from_raw(literal);
    match unescape_js(literal) {
        Some(value) => CallArg::str(value, quote),
        None => CallArg::Other,
    }
}

/// Decode a quoted JavaScript string literal. `None` on malformed escapes.
fn unescape_js(literal: &str) -> Option<String> {
    let inner = literal.get(1..literal.len().checked_sub(1)?)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            'u' => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            '\n' => {}
            other => out.push(other),
        }
    }
    Some(out)
}

impl CallSource for TextCallSource {
    fn calls(&self, unit: &SourceUnit) -> Result<Vec<CallNode>> {
        let code = unit.code.as_str();
        let mut calls = Vec::new();
        for captures in self.pattern.captures_iter(code) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            // `obj.i18n.s(...)` or `myi18n.s(...)` are not marker calls
            let preceded_by_ident = code[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| is_identifier_char(c) || c == '.');
            if preceded_by_ident {
                continue;
            }

            let mut args = Vec::with_capacity(2);
            if let Some(phrase) = captures.name("phrase") {
                args.push(literal_arg(phrase.as_str()));
            }
            if let Some(ns) = captures.name("ns") {
                args.push(literal_arg(ns.as_str()));
            }

            let (line, col, source_line) = position_of(code, whole.start());
            calls.push(CallNode {
                callee_path: vec![self.marker.clone(), "s".to_string()],
                args,
                span: whole.range(),
                location: SourceLocation::new(&unit.path, line, col),
                source_line,
            });
        }
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::call::match_marker;

    fn markers(code: &str) -> Vec<(String, Option<String>)> {
        TextCallSource::new("i18n")
            .unwrap()
            .calls(&SourceUnit::new("./src/a.vue", code))
            .unwrap()
            .iter()
            .filter_map(|c| match_marker(c, "i18n"))
            .map(|m| (m.phrase, m.namespace))
            .collect()
    }

    #[test]
    fn test_finds_both_shapes() {
        let found = markers("a(i18n.s('你好'), i18n.s( \"数据源名称\" , 'dl' ))");
        assert_eq!(
            found,
            vec![
                ("你好".to_string(), None),
                ("数据源名称".to_string(), Some("dl".to_string())),
            ]
        );
    }

    #[test]
    fn test_skips_prefixed_callees() {
        assert!(markers("obj.i18n.s('a'); myi18n.s('b');").is_empty());
    }

    #[test]
    fn test_unescapes_literals() {
        let found = markers(r#"i18n.s('it\'s 你\x41')"#);
        assert_eq!(found[0].0, "it's 你A");
    }

    #[test]
    fn test_span_and_location() {
        let code = "<template>\n  {{ i18n.s('标题') }}\n</template>";
        let calls = TextCallSource::new("i18n")
            .unwrap()
            .calls(&SourceUnit::new("./src/a.vue", code))
            .unwrap();
        assert_eq!(&code[calls[0].span.clone()], "i18n.s('标题')");
        assert_eq!(calls[0].location.line, 2);
        assert_eq!(calls[0].location.col, 6);
    }

    #[test]
    fn test_marker_with_dollar() {
        let source = TextCallSource::new("$i18n").unwrap();
        let calls = source
            .calls(&SourceUnit::new("a.js", "$i18n.s('x')"))
            .unwrap();
        assert_eq!(calls.len(), 1);
    }
}
