//! Lightweight `module-info.java` parser.
//!
//! Only the module declaration is understood. Comments, `import` statements and annotations are
//! skipped. A malformed directive is reported and parsing resumes after the next `;`, so one bad
//! line never hides the directives around it. Only a missing/garbled `module` header (or an
//! unterminated comment) fails the whole unit.

use std::collections::{BTreeMap, BTreeSet};

use jmd_core::ModuleName;
use thiserror::Error;

use crate::{ModuleDeclaration, RequiresDirective};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at line {line}")]
pub struct ModuleInfoParseError {
    message: String,
    position: usize,
    line: usize,
}

impl ModuleInfoParseError {
    fn new(src: &str, message: impl Into<String>, position: usize) -> Self {
        let line = src.as_bytes()[..position.min(src.len())]
            .iter()
            .filter(|b| **b == b'\n')
            .count()
            + 1;
        Self {
            message: message.into(),
            position,
            line,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset into the parsed source.
    pub fn position(&self) -> usize {
        self.position
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Result of parsing a unit: the declaration plus directives that had to be skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModuleInfo {
    pub declaration: ModuleDeclaration,
    pub errors: Vec<ModuleInfoParseError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Import,
    Open,
    Module,
    Requires,
    Exports,
    Opens,
    Uses,
    Provides,
    With,
    To,
    Transitive,
    Static,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "import" => Keyword::Import,
            "open" => Keyword::Open,
            "module" => Keyword::Module,
            "requires" => Keyword::Requires,
            "exports" => Keyword::Exports,
            "opens" => Keyword::Opens,
            "uses" => Keyword::Uses,
            "provides" => Keyword::Provides,
            "with" => Keyword::With,
            "to" => Keyword::To,
            "transitive" => Keyword::Transitive,
            "static" => Keyword::Static,
            _ => return None,
        })
    }

    fn as_str(self) -> &'static str {
        match self {
            Keyword::Import => "import",
            Keyword::Open => "open",
            Keyword::Module => "module",
            Keyword::Requires => "requires",
            Keyword::Exports => "exports",
            Keyword::Opens => "opens",
            Keyword::Uses => "uses",
            Keyword::Provides => "provides",
            Keyword::With => "with",
            Keyword::To => "to",
            Keyword::Transitive => "transitive",
            Keyword::Static => "static",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    /// A `/*runtime*/` comment directly among `requires` modifiers.
    RuntimeMarker,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semi,
    Comma,
    Dot,
    At,
    Other(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

struct Lexer<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
    in_requires_modifiers: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            input: src.as_bytes(),
            pos: 0,
            in_requires_modifiers: false,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.input.get(self.pos + 1).copied()
    }

    /// Skips whitespace and comments. Returns the start of a `/*runtime*/` marker if one was seen
    /// where a `requires` modifier may appear.
    fn skip_trivia(&mut self) -> Result<Option<usize>, ModuleInfoParseError> {
        loop {
            while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0C)) {
                self.pos += 1;
            }

            if self.peek() == Some(b'/') && self.peek2() == Some(b'/') {
                while let Some(b) = self.peek() {
                    self.pos += 1;
                    if b == b'\n' {
                        break;
                    }
                }
                continue;
            }

            if self.peek() == Some(b'/') && self.peek2() == Some(b'*') {
                let start = self.pos;
                self.pos += 2;
                let body_start = self.pos;
                loop {
                    match (self.peek(), self.peek2()) {
                        (Some(b'*'), Some(b'/')) => break,
                        (Some(_), _) => self.pos += 1,
                        (None, _) => {
                            return Err(ModuleInfoParseError::new(
                                self.src,
                                "unterminated block comment",
                                start,
                            ));
                        }
                    }
                }
                let body = &self.src[body_start..self.pos];
                self.pos += 2;
                if self.in_requires_modifiers && body.trim() == "runtime" {
                    return Ok(Some(start));
                }
                continue;
            }

            return Ok(None);
        }
    }

    fn next_token(&mut self) -> Result<Token, ModuleInfoParseError> {
        if let Some(position) = self.skip_trivia()? {
            return Ok(Token {
                kind: TokenKind::RuntimeMarker,
                position,
            });
        }

        let position = self.pos;
        let Some(b) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position,
            });
        };

        let kind = match b {
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b';' => self.single(TokenKind::Semi),
            b',' => self.single(TokenKind::Comma),
            b'.' => self.single(TokenKind::Dot),
            b'@' => self.single(TokenKind::At),
            b'"' | b'\'' => {
                self.skip_literal(b);
                TokenKind::Other(b as char)
            }
            b if is_ident_start(b) => {
                let ident = self.lex_ident();
                match Keyword::from_ident(&ident) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Ident(ident),
                }
            }
            _ => {
                // Advance by a whole character so positions stay on UTF-8 boundaries.
                let c = self.src[self.pos..].chars().next().unwrap_or('\u{fffd}');
                self.pos += c.len_utf8().max(1);
                TokenKind::Other(c)
            }
        };

        self.in_requires_modifiers = matches!(
            kind,
            TokenKind::Keyword(Keyword::Requires | Keyword::Static | Keyword::Transitive)
        ) || (self.in_requires_modifiers && kind == TokenKind::RuntimeMarker);

        Ok(Token { kind, position })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn skip_literal(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'\n' => break,
                b if b == quote => break,
                _ => {}
            }
        }
        self.pos = self.pos.min(self.input.len());
    }

    fn lex_ident(&mut self) -> String {
        let start = self.pos;
        self.pos += 1;
        while self.peek().is_some_and(is_ident_part) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }
}

// Non-ASCII bytes are accepted here; module names are validated separately.
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

struct Parser<'a> {
    src: &'a str,
    lexer: Lexer<'a>,
    cur: Token,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, ModuleInfoParseError> {
        let mut lexer = Lexer::new(src);
        let cur = lexer.next_token()?;
        Ok(Self { src, lexer, cur })
    }

    fn error(&self, message: impl Into<String>) -> ModuleInfoParseError {
        ModuleInfoParseError::new(self.src, message, self.cur.position)
    }

    fn bump(&mut self) -> Result<(), ModuleInfoParseError> {
        self.cur = self.lexer.next_token()?;
        Ok(())
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.cur.kind == TokenKind::Keyword(keyword)
    }

    fn expect_punct(
        &mut self,
        expected: TokenKind,
        what: &str,
    ) -> Result<(), ModuleInfoParseError> {
        if self.cur.kind == expected {
            self.bump()
        } else {
            Err(self.error(format!("expected `{what}`")))
        }
    }

    fn expect_keyword(&mut self, expected: Keyword) -> Result<(), ModuleInfoParseError> {
        if self.at_keyword(expected) {
            self.bump()
        } else {
            Err(self.error(format!("expected `{}`", expected.as_str())))
        }
    }

    /// A dotted name. Restricted keywords are accepted after the first segment
    /// (`org.example.open` is a legal module name).
    fn parse_qualified_name(&mut self) -> Result<String, ModuleInfoParseError> {
        let mut out = match &self.cur.kind {
            TokenKind::Ident(id) => id.clone(),
            _ => return Err(self.error("expected identifier")),
        };
        self.bump()?;

        while self.cur.kind == TokenKind::Dot {
            self.bump()?;
            let segment = match &self.cur.kind {
                TokenKind::Ident(id) => id.clone(),
                TokenKind::Keyword(keyword) => keyword.as_str().to_string(),
                _ => return Err(self.error("expected identifier after `.`")),
            };
            out.push('.');
            out.push_str(&segment);
            self.bump()?;
        }

        Ok(out)
    }

    fn parse_module_name(&mut self) -> Result<ModuleName, ModuleInfoParseError> {
        let position = self.cur.position;
        let raw = self.parse_qualified_name()?;
        ModuleName::parse(raw)
            .map_err(|err| ModuleInfoParseError::new(self.src, err.to_string(), position))
    }

    fn skip_prelude(&mut self) -> Result<(), ModuleInfoParseError> {
        loop {
            if self.at_keyword(Keyword::Import) {
                while !matches!(self.cur.kind, TokenKind::Semi | TokenKind::Eof) {
                    self.bump()?;
                }
                if self.cur.kind == TokenKind::Semi {
                    self.bump()?;
                }
                continue;
            }

            if self.cur.kind == TokenKind::At {
                self.bump()?;
                self.parse_qualified_name()?;
                if self.cur.kind == TokenKind::LParen {
                    self.skip_balanced_parens()?;
                }
                continue;
            }

            return Ok(());
        }
    }

    fn skip_balanced_parens(&mut self) -> Result<(), ModuleInfoParseError> {
        let mut depth = 0usize;
        loop {
            match self.cur.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.bump();
                    }
                }
                TokenKind::Eof => return Err(self.error("unterminated annotation arguments")),
                _ => {}
            }
            self.bump()?;
        }
    }

    fn parse_unit(&mut self) -> Result<ParsedModuleInfo, ModuleInfoParseError> {
        self.skip_prelude()?;

        let is_open = self.at_keyword(Keyword::Open);
        if is_open {
            self.bump()?;
        }
        self.expect_keyword(Keyword::Module)?;
        let name = self.parse_module_name()?;
        self.expect_punct(TokenKind::LBrace, "{")?;

        let mut declaration = ModuleDeclaration {
            name,
            is_open,
            requires: Vec::new(),
            uses: BTreeSet::new(),
            provides: BTreeMap::new(),
            build_only: Vec::new(),
        };
        let mut errors = Vec::new();

        while !matches!(self.cur.kind, TokenKind::RBrace | TokenKind::Eof) {
            if let Err(err) = self.parse_directive(&mut declaration) {
                tracing::debug!(
                    target: "jmd.modules",
                    module = %declaration.name,
                    error = %err,
                    "skipping malformed module directive"
                );
                errors.push(err);
                self.recover()?;
            }
        }

        if self.cur.kind == TokenKind::Eof {
            errors.push(self.error("expected `}` at end of module declaration"));
        } else {
            self.bump()?;
            if self.cur.kind != TokenKind::Eof {
                errors.push(self.error("unexpected tokens after module declaration"));
            }
        }

        Ok(ParsedModuleInfo {
            declaration,
            errors,
        })
    }

    /// Skip to just after the next `;`, or stop in front of `}` / end of input.
    fn recover(&mut self) -> Result<(), ModuleInfoParseError> {
        loop {
            match self.cur.kind {
                TokenKind::Semi => return self.bump(),
                TokenKind::RBrace | TokenKind::Eof => return Ok(()),
                _ => self.bump()?,
            }
        }
    }

    fn parse_directive(
        &mut self,
        decl: &mut ModuleDeclaration,
    ) -> Result<(), ModuleInfoParseError> {
        match &self.cur.kind {
            TokenKind::Keyword(Keyword::Requires) => {
                let directive = self.parse_requires()?;
                decl.requires.push(directive);
            }
            TokenKind::Keyword(Keyword::Exports) | TokenKind::Keyword(Keyword::Opens) => {
                self.parse_exports_or_opens()?;
            }
            TokenKind::Keyword(Keyword::Uses) => {
                self.bump()?;
                let service = self.parse_qualified_name()?;
                self.expect_punct(TokenKind::Semi, ";")?;
                decl.uses.insert(service);
            }
            TokenKind::Keyword(Keyword::Provides) => {
                self.bump()?;
                let service = self.parse_qualified_name()?;
                self.expect_keyword(Keyword::With)?;
                let mut implementations = vec![self.parse_qualified_name()?];
                while self.cur.kind == TokenKind::Comma {
                    self.bump()?;
                    implementations.push(self.parse_qualified_name()?);
                }
                self.expect_punct(TokenKind::Semi, ";")?;
                decl.provides.entry(service).or_default().extend(implementations);
            }
            _ => return Err(self.error("expected module directive")),
        }
        Ok(())
    }

    fn parse_requires(&mut self) -> Result<RequiresDirective, ModuleInfoParseError> {
        self.expect_keyword(Keyword::Requires)?;

        let mut is_transitive = false;
        let mut is_static = false;
        let mut is_runtime = false;
        loop {
            match &self.cur.kind {
                TokenKind::Keyword(Keyword::Transitive) => is_transitive = true,
                TokenKind::Keyword(Keyword::Static) => is_static = true,
                TokenKind::RuntimeMarker => is_runtime = true,
                _ => break,
            }
            self.bump()?;
        }

        let target = self.parse_module_name()?;
        self.expect_punct(TokenKind::Semi, ";")?;
        Ok(RequiresDirective {
            target,
            is_static,
            is_transitive,
            is_runtime,
        })
    }

    fn parse_exports_or_opens(&mut self) -> Result<(), ModuleInfoParseError> {
        self.bump()?;
        self.parse_qualified_name()?;
        if self.at_keyword(Keyword::To) {
            self.bump()?;
            self.parse_qualified_name()?;
            while self.cur.kind == TokenKind::Comma {
                self.bump()?;
                self.parse_qualified_name()?;
            }
        }
        self.expect_punct(TokenKind::Semi, ";")
    }
}

/// Parse the text of a `module-info.java` file.
pub fn parse_module_info(src: &str) -> Result<ParsedModuleInfo, ModuleInfoParseError> {
    Parser::new(src)?.parse_unit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn requires(src: &str) -> Vec<(String, bool, bool, bool)> {
        parse_module_info(src)
            .unwrap()
            .declaration
            .requires
            .into_iter()
            .map(|r| (r.target.to_string(), r.is_static, r.is_transitive, r.is_runtime))
            .collect()
    }

    #[test]
    fn parses_requires_with_qualifiers_in_source_order() {
        let src = r#"
            module org.example.app {
                requires transitive org.slf4j;
                requires static org.jspecify;
                requires com.google.gson;
                requires static transitive org.apiguardian.api;
                requires /*runtime*/ org.slf4j.simple;
            }
        "#;
        assert_eq!(
            requires(src),
            vec![
                ("org.slf4j".into(), false, true, false),
                ("org.jspecify".into(), true, false, false),
                ("com.google.gson".into(), false, false, false),
                ("org.apiguardian.api".into(), true, true, false),
                ("org.slf4j.simple".into(), false, false, true),
            ]
        );
    }

    #[test]
    fn ignores_comments_imports_and_annotations() {
        let src = r#"
            // header comment
            import java.lang.Deprecated;
            /* block
               comment */
            @Deprecated(since = "1.2", forRemoval = false)
            @SuppressWarnings({"module", "requires-automatic"})
            open module org.example.app {
                // requires commented.out;
                /* requires also.commented; */
                requires org.slf4j; // trailing
                exports org.example.app.api to org.example.other, org.example.third;
                opens org.example.app.internal;
                uses org.slf4j.spi.SLF4JServiceProvider;
                provides org.example.Service with org.example.impl.A, org.example.impl.B;
            }
        "#;
        let parsed = parse_module_info(src).unwrap();
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let decl = parsed.declaration;
        assert!(decl.is_open);
        assert_eq!(decl.name.as_str(), "org.example.app");
        assert_eq!(decl.requires.len(), 1);
        assert_eq!(
            decl.uses.iter().cloned().collect::<Vec<_>>(),
            vec!["org.slf4j.spi.SLF4JServiceProvider".to_string()]
        );
        assert_eq!(
            decl.provides.into_iter().collect::<Vec<_>>(),
            vec![(
                "org.example.Service".to_string(),
                vec!["org.example.impl.A".to_string(), "org.example.impl.B".to_string()]
            )]
        );
    }

    #[test]
    fn runtime_marker_only_counts_among_requires_modifiers() {
        let src = r#"
            module a {
                /*runtime*/
                requires b;
                requires static /* runtime */ c;
            }
        "#;
        assert_eq!(
            requires(src),
            vec![("b".into(), false, false, false), ("c".into(), true, false, true)]
        );
    }

    #[test]
    fn malformed_directive_does_not_hide_siblings() {
        let src = "module a {\n  requires b;\n  requires 1bad;\n  frobnicate x;\n  requires c;\n}\n";
        let parsed = parse_module_info(src).unwrap();
        let names: Vec<_> = parsed
            .declaration
            .requires
            .iter()
            .map(|r| r.target.as_str())
            .collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(parsed.errors.len(), 2);
        assert_eq!(parsed.errors[0].line(), 3);
        assert_eq!(parsed.errors[1].line(), 4);
    }

    #[test]
    fn keywords_are_allowed_as_later_name_segments() {
        assert_eq!(
            requires("module a { requires org.example.open; requires com.to.module; }"),
            vec![
                ("org.example.open".into(), false, false, false),
                ("com.to.module".into(), false, false, false),
            ]
        );
    }

    #[test]
    fn missing_header_is_an_error() {
        let err = parse_module_info("requires a;").unwrap_err();
        assert_eq!(err.message(), "expected `module`");
        assert!(parse_module_info("module a { /* never closed").is_err());
    }

    #[test]
    fn unclosed_body_is_reported_but_keeps_directives() {
        let parsed = parse_module_info("module a {\n requires b;\n").unwrap();
        assert_eq!(parsed.declaration.requires.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
    }
}
