//! Lexical import/export scanner.
//!
//! Extracts import and export declarations from one module's raw text as
//! structured records with exact byte spans, so the transformer can replace
//! each matched statement verbatim without re-deriving it.
//!
//! This is a best-effort lexical scan, not a grammar parse. The token layer
//! consumes strings, template literals, and comments as opaque units so that
//! import-like text inside them never matches, and import/export matches are
//! anchored at statement boundaries. Anything the scanner cannot parse is
//! left untouched; a resulting reference error surfaces only when the bundle
//! executes.

use std::ops::Range;

use logos::Logos;

use crate::path::ModulePath;

/// Logos-based token enum for the scanner.
///
/// Everything that is not relevant to module syntax lexes to [`Kind::Other`]
/// and only participates in statement anchoring.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    // Whitespace (skip)
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*", lex_block_comment)]
    BlockComment,

    // Strings are single tokens so specifier-like text inside them never
    // anchors a match.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Str,

    // Template literals are consumed to the closing backtick. Interpolation
    // bodies are treated as opaque text.
    #[token("`", lex_template)]
    Template,

    #[token("import")]
    Import,

    #[token("export")]
    Export,

    #[token("from")]
    From,

    #[token("as")]
    As,

    #[token("default")]
    Default,

    #[token("const")]
    Const,

    #[token("let")]
    Let,

    #[token("var")]
    Var,

    #[token("async")]
    Async,

    #[token("function")]
    Function,

    #[token("class")]
    Class,

    #[token("*")]
    Star,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(";")]
    Semi,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,
}

fn lex_block_comment(lex: &mut logos::Lexer<RawToken>) -> logos::Skip {
    // We've already consumed "/*", now find "*/"
    let remainder = lex.remainder();
    if let Some(end) = remainder.find("*/") {
        lex.bump(end + 2);
    } else {
        // Unterminated comment - consume to end
        lex.bump(remainder.len());
    }
    logos::Skip
}

fn lex_template(lex: &mut logos::Lexer<RawToken>) {
    // We've already consumed the opening backtick; scan to the matching
    // close, honoring backslash escapes.
    let remainder = lex.remainder().as_bytes();
    let mut i = 0;
    while i < remainder.len() {
        match remainder[i] {
            b'\\' => i += 2,
            b'`' => {
                i += 1;
                break;
            }
            _ => i += 1,
        }
    }
    lex.bump(i.min(remainder.len()));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Str,
    Template,
    Import,
    Export,
    From,
    As,
    Default,
    Const,
    Let,
    Var,
    Async,
    Function,
    Class,
    Star,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Ident,
    Other,
}

#[derive(Debug, Clone, Copy)]
struct Tok {
    kind: Kind,
    start: usize,
    end: usize,
}

fn tokenize(source: &str) -> Vec<Tok> {
    let mut toks = Vec::new();
    for (result, span) in RawToken::lexer(source).spanned() {
        let kind = match result {
            Ok(RawToken::Str) => Kind::Str,
            Ok(RawToken::Template) => Kind::Template,
            Ok(RawToken::Import) => Kind::Import,
            Ok(RawToken::Export) => Kind::Export,
            Ok(RawToken::From) => Kind::From,
            Ok(RawToken::As) => Kind::As,
            Ok(RawToken::Default) => Kind::Default,
            Ok(RawToken::Const) => Kind::Const,
            Ok(RawToken::Let) => Kind::Let,
            Ok(RawToken::Var) => Kind::Var,
            Ok(RawToken::Async) => Kind::Async,
            Ok(RawToken::Function) => Kind::Function,
            Ok(RawToken::Class) => Kind::Class,
            Ok(RawToken::Star) => Kind::Star,
            Ok(RawToken::LBrace) => Kind::LBrace,
            Ok(RawToken::RBrace) => Kind::RBrace,
            Ok(RawToken::Comma) => Kind::Comma,
            Ok(RawToken::Semi) => Kind::Semi,
            Ok(RawToken::Ident) => Kind::Ident,
            // Skipped variants never reach the iterator.
            Ok(_) => Kind::Other,
            Err(()) => Kind::Other,
        };
        toks.push(Tok {
            kind,
            start: span.start,
            end: span.end,
        });
    }
    toks
}

/// Keywords that may double as binding names in module syntax, e.g.
/// `import { default as D }`.
fn is_name(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Ident | Kind::From | Kind::As | Kind::Default | Kind::Async
    )
}

/// A match is anchored when it begins a statement: at the start of the
/// input, after `;` or `}`, or after a line break.
fn anchored(source: &str, toks: &[Tok], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = &toks[i - 1];
    if matches!(prev.kind, Kind::Semi | Kind::RBrace) {
        return true;
    }
    source[prev.end..toks[i].start].contains('\n')
}

/// The shape of an import declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportForm {
    /// `import * as X from "p"`
    Namespace,
    /// `import X from "p"`
    Default,
    /// `import { a, b as c } from "p"`
    Named,
    /// `import X, { a } from "p"`
    DefaultAndNamed,
    /// `import "p"`
    SideEffect,
}

/// One named binding: `a` or `b as c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub imported: String,
    pub local: String,
}

/// One scanned import declaration.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    /// Exact byte span of the matched statement, including a trailing `;`
    /// when present.
    pub span: Range<usize>,
    /// The specifier text, unquoted.
    pub specifier: String,
    pub form: ImportForm,
    /// Local name bound by namespace or default imports.
    pub local: Option<String>,
    /// Named bindings; empty for other forms.
    pub bindings: Vec<ImportBinding>,
    /// Canonical target, filled in by the graph builder. `None` for external
    /// specifiers, which are never rewritten.
    pub resolved: Option<ModulePath>,
}

impl ImportRecord {
    /// The exact statement text this record matched.
    pub fn matched_text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

/// One recorded export binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    /// Name of the local binding inside the module.
    pub local: String,
    /// Name the binding is exported under.
    pub alias: String,
    /// `false` for `const`, `function`, and `class` declarations; `true` for
    /// `let`/`var` and for every member of an aggregate `export { ... }`
    /// list (conservative default).
    pub mutable: bool,
}

/// How the transformer rewrites one export statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRewrite {
    /// `export default` keywords replaced by a default-export assignment.
    DefaultAssign,
    /// `export ` keyword stripped, declaration kept local.
    StripKeyword,
    /// Aggregate `export { ... }` statement removed entirely.
    RemoveStatement,
}

/// One scanned export statement: its span, rewrite action, and records.
#[derive(Debug, Clone)]
pub struct ExportSite {
    pub span: Range<usize>,
    pub rewrite: ExportRewrite,
    pub records: Vec<ExportRecord>,
}

/// Scan a module's raw text for import declarations.
pub fn scan_imports(source: &str) -> Vec<ImportRecord> {
    let toks = tokenize(source);
    let mut records = Vec::new();
    let mut i = 0;
    while i < toks.len() {
        if toks[i].kind == Kind::Import && anchored(source, &toks, i) {
            if let Some((record, next)) = parse_import(source, &toks, i) {
                records.push(record);
                i = next;
                continue;
            }
        }
        i += 1;
    }
    records
}

/// Scan a module's raw text for export declarations.
pub fn scan_exports(source: &str) -> Vec<ExportSite> {
    let toks = tokenize(source);
    let mut sites = Vec::new();
    let mut i = 0;
    while i < toks.len() {
        if toks[i].kind == Kind::Export && anchored(source, &toks, i) {
            if let Some((site, next)) = parse_export(source, &toks, i) {
                sites.push(site);
                i = next;
                continue;
            }
        }
        i += 1;
    }
    sites
}

fn text(source: &str, tok: &Tok) -> String {
    source[tok.start..tok.end].to_string()
}

/// Strip quotes and resolve simple backslash escapes.
fn unquote(raw: &str) -> String {
    let inner = &raw[1..raw.len().saturating_sub(1)];
    if !inner.contains('\\') {
        return inner.to_string();
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Statement end: extend through an immediately following `;`.
/// Returns the byte end and the index of the next unconsumed token.
fn statement_end(toks: &[Tok], last: usize) -> (usize, usize) {
    if let Some(tok) = toks.get(last + 1) {
        if tok.kind == Kind::Semi {
            return (tok.end, last + 2);
        }
    }
    (toks[last].end, last + 1)
}

/// Parse the `{ a, b as c }` list shared by named imports and aggregate
/// exports. Returns the bindings and the index just past the `}`.
fn parse_name_list(source: &str, toks: &[Tok], mut i: usize) -> Option<(Vec<ImportBinding>, usize)> {
    let mut bindings = Vec::new();
    loop {
        let tok = toks.get(i)?;
        match tok.kind {
            Kind::RBrace => return Some((bindings, i + 1)),
            kind if is_name(kind) => {
                let first = text(source, tok);
                let mut second = first.clone();
                let mut j = i + 1;
                if toks.get(j)?.kind == Kind::As {
                    let alias_tok = toks.get(j + 1)?;
                    if !is_name(alias_tok.kind) {
                        return None;
                    }
                    second = text(source, alias_tok);
                    j += 2;
                }
                bindings.push(ImportBinding {
                    imported: first,
                    local: second,
                });
                match toks.get(j)?.kind {
                    Kind::Comma => i = j + 1,
                    Kind::RBrace => i = j,
                    _ => return None,
                }
            }
            _ => return None,
        }
    }
}

fn parse_import(source: &str, toks: &[Tok], start: usize) -> Option<(ImportRecord, usize)> {
    let make = |span: Range<usize>,
                specifier_tok: &Tok,
                form: ImportForm,
                local: Option<String>,
                bindings: Vec<ImportBinding>| ImportRecord {
        span,
        specifier: unquote(&source[specifier_tok.start..specifier_tok.end]),
        form,
        local,
        bindings,
        resolved: None,
    };

    let first = toks.get(start + 1)?;
    match first.kind {
        // import "p"
        Kind::Str => {
            let (end, next) = statement_end(toks, start + 1);
            Some((
                make(toks[start].start..end, first, ImportForm::SideEffect, None, Vec::new()),
                next,
            ))
        }
        // import * as X from "p"
        Kind::Star => {
            if toks.get(start + 2)?.kind != Kind::As {
                return None;
            }
            let name_tok = toks.get(start + 3)?;
            if !is_name(name_tok.kind) {
                return None;
            }
            if toks.get(start + 4)?.kind != Kind::From {
                return None;
            }
            let spec_tok = toks.get(start + 5)?;
            if spec_tok.kind != Kind::Str {
                return None;
            }
            let (end, next) = statement_end(toks, start + 5);
            Some((
                make(
                    toks[start].start..end,
                    spec_tok,
                    ImportForm::Namespace,
                    Some(text(source, name_tok)),
                    Vec::new(),
                ),
                next,
            ))
        }
        // import { a, b as c } from "p"
        Kind::LBrace => {
            let (bindings, after) = parse_name_list(source, toks, start + 2)?;
            if toks.get(after)?.kind != Kind::From {
                return None;
            }
            let spec_tok = toks.get(after + 1)?;
            if spec_tok.kind != Kind::Str {
                return None;
            }
            let (end, next) = statement_end(toks, after + 1);
            Some((
                make(toks[start].start..end, spec_tok, ImportForm::Named, None, bindings),
                next,
            ))
        }
        // import X from "p"  |  import X, { a } from "p"
        kind if is_name(kind) => {
            let local = text(source, first);
            match toks.get(start + 2)?.kind {
                Kind::From => {
                    let spec_tok = toks.get(start + 3)?;
                    if spec_tok.kind != Kind::Str {
                        return None;
                    }
                    let (end, next) = statement_end(toks, start + 3);
                    Some((
                        make(
                            toks[start].start..end,
                            spec_tok,
                            ImportForm::Default,
                            Some(local),
                            Vec::new(),
                        ),
                        next,
                    ))
                }
                Kind::Comma => {
                    if toks.get(start + 3)?.kind != Kind::LBrace {
                        return None;
                    }
                    let (bindings, after) = parse_name_list(source, toks, start + 4)?;
                    if toks.get(after)?.kind != Kind::From {
                        return None;
                    }
                    let spec_tok = toks.get(after + 1)?;
                    if spec_tok.kind != Kind::Str {
                        return None;
                    }
                    let (end, next) = statement_end(toks, after + 1);
                    Some((
                        make(
                            toks[start].start..end,
                            spec_tok,
                            ImportForm::DefaultAndNamed,
                            Some(local),
                            bindings,
                        ),
                        next,
                    ))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_export(source: &str, toks: &[Tok], start: usize) -> Option<(ExportSite, usize)> {
    let export_tok = &toks[start];
    let first = toks.get(start + 1)?;
    match first.kind {
        // export default EXPR
        Kind::Default => Some((
            ExportSite {
                span: export_tok.start..first.end,
                rewrite: ExportRewrite::DefaultAssign,
                records: Vec::new(),
            },
            start + 2,
        )),
        // export const/let/var NAME = ...
        Kind::Const | Kind::Let | Kind::Var => {
            let name_tok = toks.get(start + 2)?;
            if !is_name(name_tok.kind) {
                return None;
            }
            let name = text(source, name_tok);
            Some((
                ExportSite {
                    span: export_tok.start..first.start,
                    rewrite: ExportRewrite::StripKeyword,
                    records: vec![ExportRecord {
                        local: name.clone(),
                        alias: name,
                        mutable: first.kind != Kind::Const,
                    }],
                },
                start + 3,
            ))
        }
        // export function NAME | export function* NAME | export class NAME
        Kind::Function | Kind::Class => {
            let mut j = start + 2;
            if first.kind == Kind::Function && toks.get(j)?.kind == Kind::Star {
                j += 1;
            }
            let name_tok = toks.get(j)?;
            if !is_name(name_tok.kind) {
                return None;
            }
            let name = text(source, name_tok);
            Some((
                ExportSite {
                    span: export_tok.start..first.start,
                    rewrite: ExportRewrite::StripKeyword,
                    records: vec![ExportRecord {
                        local: name.clone(),
                        alias: name,
                        mutable: false,
                    }],
                },
                j + 1,
            ))
        }
        // export async function NAME
        Kind::Async => {
            if toks.get(start + 2)?.kind != Kind::Function {
                return None;
            }
            let mut j = start + 3;
            if toks.get(j)?.kind == Kind::Star {
                j += 1;
            }
            let name_tok = toks.get(j)?;
            if !is_name(name_tok.kind) {
                return None;
            }
            let name = text(source, name_tok);
            Some((
                ExportSite {
                    span: export_tok.start..first.start,
                    rewrite: ExportRewrite::StripKeyword,
                    records: vec![ExportRecord {
                        local: name.clone(),
                        alias: name,
                        mutable: false,
                    }],
                },
                j + 1,
            ))
        }
        // export { a, b as c }
        Kind::LBrace => {
            let (items, after) = parse_name_list(source, toks, start + 2)?;
            // `export { ... } from "p"` re-exports are outside the lexical
            // grammar; leave them untouched.
            if toks.get(after).map(|t| t.kind) == Some(Kind::From) {
                return None;
            }
            let (end, next) = statement_end(toks, after - 1);
            Some((
                ExportSite {
                    span: export_tok.start..end,
                    rewrite: ExportRewrite::RemoveStatement,
                    records: items
                        .into_iter()
                        .map(|binding| ExportRecord {
                            local: binding.imported,
                            alias: binding.local,
                            mutable: true,
                        })
                        .collect(),
                },
                next,
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_named_import() {
        let src = "import {greet} from './lib.js'; greet();";
        let records = scan_imports(src);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.form, ImportForm::Named);
        assert_eq!(rec.specifier, "./lib.js");
        assert_eq!(rec.matched_text(src), "import {greet} from './lib.js';");
        assert_eq!(
            rec.bindings,
            vec![ImportBinding {
                imported: "greet".to_string(),
                local: "greet".to_string()
            }]
        );
    }

    #[test]
    fn test_scan_named_import_with_alias() {
        let records = scan_imports("import { a, b as c } from \"./lib.js\"");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bindings.len(), 2);
        assert_eq!(records[0].bindings[1].imported, "b");
        assert_eq!(records[0].bindings[1].local, "c");
    }

    #[test]
    fn test_scan_namespace_import() {
        let records = scan_imports("import * as M from './b.js';");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].form, ImportForm::Namespace);
        assert_eq!(records[0].local.as_deref(), Some("M"));
    }

    #[test]
    fn test_scan_default_import() {
        let records = scan_imports("import App from './app.js';");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].form, ImportForm::Default);
        assert_eq!(records[0].local.as_deref(), Some("App"));
    }

    #[test]
    fn test_scan_default_and_named_import() {
        let records = scan_imports("import App, { mount, render as draw } from './app.js';");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].form, ImportForm::DefaultAndNamed);
        assert_eq!(records[0].local.as_deref(), Some("App"));
        assert_eq!(records[0].bindings.len(), 2);
    }

    #[test]
    fn test_scan_side_effect_import() {
        let records = scan_imports("import './setup.js';\nconsole.log(1);");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].form, ImportForm::SideEffect);
        assert_eq!(records[0].specifier, "./setup.js");
    }

    #[test]
    fn test_scan_multiline_import() {
        let src = "import {\n    a,\n    b as c,\n} from './lib.js';";
        let records = scan_imports(src);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bindings.len(), 2);
        assert_eq!(records[0].matched_text(src), src);
    }

    #[test]
    fn test_import_inside_string_is_ignored() {
        assert!(scan_imports("const s = \"import x from 'y'\";").is_empty());
        assert!(scan_imports("const s = 'import {a} from \"b\"';").is_empty());
    }

    #[test]
    fn test_import_inside_comment_is_ignored() {
        assert!(scan_imports("// import a from './a.js'\nconsole.log(1);").is_empty());
        assert!(scan_imports("/* import a from './a.js' */ console.log(1);").is_empty());
    }

    #[test]
    fn test_import_inside_template_is_ignored() {
        assert!(scan_imports("const t = `import {a} from './x.js'`;").is_empty());
    }

    #[test]
    fn test_import_not_at_statement_boundary_is_ignored() {
        assert!(scan_imports("foo.import ('./x.js')").is_empty());
    }

    #[test]
    fn test_dynamic_import_is_ignored() {
        assert!(scan_imports("import('./x.js').then(m => m.run());").is_empty());
    }

    #[test]
    fn test_import_after_statement_on_same_line() {
        let records = scan_imports("foo(); import { a } from './a.js';");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_default_as_imported_name() {
        let records = scan_imports("import { default as D } from './d.js';");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bindings[0].imported, "default");
        assert_eq!(records[0].bindings[0].local, "D");
    }

    #[test]
    fn test_scan_export_default() {
        let src = "export default function () { return 1; }";
        let sites = scan_exports(src);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].rewrite, ExportRewrite::DefaultAssign);
        assert_eq!(&src[sites[0].span.clone()], "export default");
        assert!(sites[0].records.is_empty());
    }

    #[test]
    fn test_scan_export_const_is_immutable() {
        let sites = scan_exports("export const x = 1;");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].rewrite, ExportRewrite::StripKeyword);
        assert_eq!(
            sites[0].records,
            vec![ExportRecord {
                local: "x".to_string(),
                alias: "x".to_string(),
                mutable: false
            }]
        );
    }

    #[test]
    fn test_scan_export_let_and_var_are_mutable() {
        assert!(scan_exports("export let x = 1;")[0].records[0].mutable);
        assert!(scan_exports("export var y = 2;")[0].records[0].mutable);
    }

    #[test]
    fn test_scan_export_function_and_class() {
        let sites = scan_exports("export function greet() {}\nexport class Widget {}");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].records[0].local, "greet");
        assert!(!sites[0].records[0].mutable);
        assert_eq!(sites[1].records[0].local, "Widget");
        assert!(!sites[1].records[0].mutable);
    }

    #[test]
    fn test_scan_export_async_function_and_generator() {
        let sites = scan_exports("export async function load() {}\nexport function* gen() {}");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].records[0].local, "load");
        assert_eq!(sites[1].records[0].local, "gen");
    }

    #[test]
    fn test_scan_aggregate_export_is_mutable() {
        let src = "let a = 1; const b = 2;\nexport { a, b as renamed };";
        let sites = scan_exports(src);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].rewrite, ExportRewrite::RemoveStatement);
        assert_eq!(&src[sites[0].span.clone()], "export { a, b as renamed };");
        assert_eq!(sites[0].records.len(), 2);
        assert!(sites[0].records.iter().all(|r| r.mutable));
        assert_eq!(sites[0].records[1].local, "b");
        assert_eq!(sites[0].records[1].alias, "renamed");
    }

    #[test]
    fn test_reexport_is_left_untouched() {
        assert!(scan_exports("export { a } from './a.js';").is_empty());
    }

    #[test]
    fn test_export_inside_string_is_ignored() {
        assert!(scan_exports("const s = \"export const x = 1\";").is_empty());
    }

    #[test]
    fn test_export_keyword_strip_span() {
        let src = "export let counter = 0;";
        let sites = scan_exports(src);
        assert_eq!(&src[sites[0].span.clone()], "export ");
    }

    #[test]
    fn test_unparseable_import_is_skipped() {
        // Not a recognized static form; leave it alone.
        assert!(scan_imports("import;").is_empty());
    }
}
