use std::path::Path;
use std::sync::Arc;

use swc_common::{BytePos, FileName, Globals, SourceMap, Span};
use swc_ecma_ast::{CallExpr, Callee, Expr, ExprOrSpread, Lit, MemberProp, Module};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};

use super::{CallSource, SourceUnit};
use crate::core::call::{CallArg, CallNode, Quote, SourceLocation};
use crate::error::{Error, Result};

pub struct ParsedJSX {
    pub module: Module,
    pub source_map: Arc<SourceMap>,
    /// Position of the first byte of the file inside `source_map`.
    pub start_pos: BytePos,
}

/// Pick the swc syntax for a file.
///
/// `.ts` is parsed without JSX so generic arrow functions (`<T>(x: T) => x`)
/// keep working; plain JavaScript files accept JSX.
fn syntax_for(file_path: &str) -> Syntax {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    match extension {
        "ts" | "mts" | "cts" => Syntax::Typescript(TsSyntax::default()),
        "js" | "jsx" | "mjs" | "cjs" => Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
        _ => Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        }),
    }
}

/// Parse a JS/TS source string into a module.
///
/// Accepts a shared SourceMap so callers can parse files in parallel.
pub fn parse_jsx_source(
    code: String,
    file_path: &str,
    source_map: Arc<SourceMap>,
) -> Result<ParsedJSX> {
    use swc_common::GLOBALS;

    GLOBALS.set(&Globals::new(), || {
        let source_file = source_map.new_source_file(FileName::Real(file_path.into()).into(), code);
        let start_pos = source_file.start_pos;

        let mut parser = Parser::new(syntax_for(file_path), StringInput::from(&*source_file), None);
        let module = parser.parse_module().map_err(|e| Error::Parse {
            file_path: file_path.to_string(),
            message: format!("{:?}", e.kind()),
        })?;

        Ok(ParsedJSX {
            module,
            source_map,
            start_pos,
        })
    })
}

/// Strip parentheses and TS-only wrappers (`as`, `as const`, `satisfies`).
pub fn unwrap_paren(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unwrap_paren(&paren.expr),
        Expr::TsAs(ts_as) => unwrap_paren(&ts_as.expr),
        Expr::TsConstAssertion(ts_const) => unwrap_paren(&ts_const.expr),
        Expr::TsSatisfies(ts_sat) => unwrap_paren(&ts_sat.expr),
        Expr::TsNonNull(non_null) => unwrap_paren(&non_null.expr),
        _ => expr,
    }
}

/// Static member path of a callee: `i18n.s` -> `["i18n", "s"]`.
fn callee_path(expr: &Expr) -> Option<Vec<String>> {
    match unwrap_paren(expr) {
        Expr::Ident(ident) => Some(vec![ident.sym.to_string()]),
        Expr::This(_) => Some(vec!["this".to_string()]),
        Expr::Member(member) => {
            let prop = match &member.prop {
                MemberProp::Ident(ident) => ident.sym.to_string(),
                MemberProp::Computed(computed) => match unwrap_paren(&computed.expr) {
                    Expr::Lit(Lit::Str(s)) => s.value.as_str()?.to_string(),
                    _ => return None,
                },
                MemberProp::PrivateName(_) => return None,
            };
            let mut path = callee_path(&member.obj)?;
            path.push(prop);
            Some(path)
        }
        _ => None,
    }
}

fn call_arg(arg: &ExprOrSpread) -> CallArg {
    if arg.spread.is_some() {
        return CallArg::Other;
    }
    match unwrap_paren(&arg.expr) {
        Expr::Lit(Lit::Str(s)) => {
            let quote = s.raw.as_deref().map(Quote::from_raw).unwrap_or_default();
            s.value
                .as_str()
                .map(|value| CallArg::str(value, quote))
                .unwrap_or(CallArg::Other)
        }
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
            .quasis
            .first()
            .and_then(|quasi| quasi.cooked.as_ref())
            .and_then(|cooked| cooked.as_str())
            .map(|value| CallArg::str(value, Quote::Single))
            .unwrap_or(CallArg::Other),
        _ => CallArg::Other,
    }
}

struct CallCollector<'a> {
    file_path: &'a str,
    marker: &'a str,
    source_map: &'a SourceMap,
    start_pos: BytePos,
    calls: Vec<CallNode>,
}

impl CallCollector<'_> {
    fn node(&self, callee_path: Vec<String>, args: Vec<CallArg>, span: Span) -> CallNode {
        let loc = self.source_map.lookup_char_pos(span.lo);
        let source_line = loc
            .file
            .get_line(loc.line - 1)
            .map(|cow| cow.to_string())
            .unwrap_or_default();
        let start = (span.lo.0 - self.start_pos.0) as usize;
        let end = (span.hi.0 - self.start_pos.0) as usize;
        CallNode {
            callee_path,
            args,
            span: start..end,
            location: SourceLocation::new(self.file_path, loc.line, loc.col.0 + 1),
            source_line,
        }
    }
}

impl Visit for CallCollector<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee
            && let Some(path) = callee_path(callee)
            && path.first().is_some_and(|head| head == self.marker)
        {
            let args = node.args.iter().map(call_arg).collect();
            let call = self.node(path, args, node.span);
            self.calls.push(call);
        }
        node.visit_children_with(self);
    }
}

/// Collect every call whose callee path is rooted at `marker`.
pub fn collect_calls(parsed: &ParsedJSX, file_path: &str, marker: &str) -> Vec<CallNode> {
    let mut collector = CallCollector {
        file_path,
        marker,
        source_map: &parsed.source_map,
        start_pos: parsed.start_pos,
        calls: Vec::new(),
    };
    parsed.module.visit_with(&mut collector);
    collector.calls
}

/// Syntax-tree call source backed by swc.
pub struct AstCallSource {
    marker: String,
}

impl AstCallSource {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl CallSource for AstCallSource {
    fn calls(&self, unit: &SourceUnit) -> Result<Vec<CallNode>> {
        let source_map: Arc<SourceMap> = Default::default();
        let parsed = parse_jsx_source(unit.code.clone(), &unit.path, source_map)?;
        Ok(collect_calls(&parsed, &unit.path, &self.marker))
    }
}
