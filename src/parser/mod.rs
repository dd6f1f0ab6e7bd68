use log::warn;

use crate::GocheckError;
use crate::lexer::{Lexer, Token};
use crate::parser::ast::*;
use crate::preprocessor::read_build_constraint;

pub(crate) mod ast;

/// Parses one Go file into a source unit: header constraint, package clause and
/// the function and method declarations at the top level
pub fn parse_source_unit(file_name: &str, source: &str) -> Result<SourceUnit, GocheckError> {
    // a leading byte order mark is permitted and not part of the file
    let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
    let constraint = read_build_constraint(source)?;
    let mut lexer = Lexer::new(source);
    let mut parser = Parser::new(&mut lexer);
    let (package, declarations) = parser.parse_file()?;

    for error in &parser.errors {
        warn!("{}: {}", file_name, error);
    }

    Ok(SourceUnit {
        file_name: file_name.to_string(),
        package,
        constraint,
        declarations,
        syntax_errors: parser.errors,
        source: source.to_string(),
    })
}

pub struct Parser<'l, 'src> {
    lexer: &'l mut Lexer<'src>,
    current_token: Option<Token>,
    current_span: SourceSpan,
    previous_span: SourceSpan,
    lexer_error: Option<GocheckError>,
    errors: Vec<String>,
}

impl<'l, 'src> Parser<'l, 'src> {
    pub fn new(lexer: &'l mut Lexer<'src>) -> Self {
        let origin = SourceSpan {
            start: SourcePosition { line: 1, column: 0 },
            end: SourcePosition { line: 1, column: 0 },
        };
        let mut parser = Parser {
            lexer,
            current_token: None,
            current_span: origin,
            previous_span: origin,
            lexer_error: None,
            errors: Vec::new(),
        };
        parser.advance();
        parser
    }

    fn advance(&mut self) -> Option<Token> {
        let previous = self.current_token.take();
        self.previous_span = self.current_span;

        match self.lexer.next_token() {
            Ok(token) => {
                self.current_span = SourceSpan::from_token(token.start, token.end);
                self.current_token = Some(token.token);
            }
            Err(e) => {
                self.lexer_error = Some(e);
                self.current_token = None;
            }
        }

        previous
    }

    fn check(&self, token_type: &Token) -> bool {
        match &self.current_token {
            Some(t) => t == token_type,
            None => false,
        }
    }

    fn match_token(&mut self, token_type: &Token) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token, None | Some(Token::EOF))
    }

    fn error(&mut self, message: String) {
        let at = self.current_span.start;
        self.errors.push(format!("{}:{}: {}", at.line, at.column + 1, message));
    }

    fn fatal(&mut self, message: &str) -> GocheckError {
        match self.lexer_error.take() {
            Some(e) => e,
            None => GocheckError::ParseError(message.to_string()),
        }
    }

    pub fn parse_file(&mut self) -> Result<(String, Vec<Declaration>), GocheckError> {
        while self.match_token(&Token::Semicolon) {}

        if !self.match_token(&Token::Package) {
            return Err(self.fatal("expected 'package' clause at start of file"));
        }
        let package = match &self.current_token {
            Some(Token::Identifier(name)) => name.clone(),
            _ => return Err(self.fatal("expected package name after 'package'")),
        };
        self.advance();
        self.expect_declaration_end();

        let mut declarations = Vec::new();
        loop {
            match &self.current_token {
                None => return Err(self.fatal("token stream ended unexpectedly")),
                Some(Token::EOF) => break,
                Some(Token::Semicolon) => {
                    self.advance();
                }
                Some(Token::Func) => declarations.push(self.parse_func_declaration()),
                Some(Token::Import | Token::Type | Token::Var | Token::Const) => {
                    self.skip_declaration()
                }
                Some(other) => {
                    let message = format!("non-declaration {:?} outside function body", other);
                    self.error(message);
                    self.skip_declaration();
                }
            }
        }

        if let Some(e) = self.lexer_error.take() {
            return Err(e);
        }
        Ok((package, declarations))
    }

    fn parse_func_declaration(&mut self) -> Declaration {
        let start_span = self.current_span;
        self.advance(); // Consume 'func'

        let receiver = if self.check(&Token::LeftParen) {
            let tokens = self.collect_group();
            Some(self.parse_receiver(&tokens))
        } else {
            None
        };

        let name = if let Some(Token::Identifier(name)) = &self.current_token {
            let ident = Identifier {
                name: name.clone(),
                span: self.current_span,
            };
            self.advance(); // Consume identifier
            Some(ident)
        } else {
            let message = format!("expected function name, got {:?}", self.current_token);
            self.error(message);
            None
        };

        // type parameters
        if self.check(&Token::LeftBracket) {
            self.collect_group();
        }

        let parameter_count = if self.check(&Token::LeftParen) {
            let tokens = self.collect_group();
            split_top_level(&tokens).len()
        } else {
            let message = format!("expected parameter list, got {:?}", self.current_token);
            self.error(message);
            0
        };

        self.skip_results();
        if self.check(&Token::LeftBrace) {
            self.collect_group();
        }
        let span = start_span.to(self.previous_span);
        self.expect_declaration_end();

        match receiver {
            Some(receiver) => Declaration::Method(MethodDeclaration {
                name,
                receiver,
                parameter_count,
                span,
            }),
            None => Declaration::Function(FunctionDeclaration {
                name,
                parameter_count,
                span,
            }),
        }
    }

    fn parse_receiver(&mut self, tokens: &[Token]) -> Option<Receiver> {
        let params = split_top_level(tokens);
        if params.len() != 1 {
            self.error(format!("method has {} receivers", params.len()));
            return None;
        }

        let param = params[0];
        let (name, type_tokens) = match param {
            [Token::Identifier(name), rest @ ..] if starts_receiver_type(rest) => {
                (Some(name.clone()), rest)
            }
            _ => (None, param),
        };

        Some(Receiver {
            name,
            type_expr: parse_type_expr(type_tokens),
        })
    }

    /// Consumes a balanced group starting at the current opening delimiter and
    /// returns the tokens between the delimiters, automatic semicolons dropped
    fn collect_group(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        self.advance(); // Consume the opener

        loop {
            let Some(token) = self.current_token.clone() else {
                return tokens;
            };
            match token {
                Token::EOF => {
                    self.error("unterminated delimiter group".to_string());
                    return tokens;
                }
                Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                Token::RightParen | Token::RightBracket | Token::RightBrace => {
                    if depth == 0 {
                        self.advance(); // Consume the closer
                        return tokens;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();

            if token != Token::Semicolon {
                tokens.push(token);
            }
        }
    }

    fn skip_results(&mut self) {
        loop {
            match &self.current_token {
                None | Some(Token::EOF | Token::Semicolon | Token::LeftBrace) => return,
                Some(Token::Struct | Token::Interface) => {
                    self.advance();
                    if self.check(&Token::LeftBrace) {
                        self.collect_group();
                    }
                }
                Some(Token::LeftParen | Token::LeftBracket) => {
                    self.collect_group();
                }
                Some(Token::RightParen | Token::RightBracket | Token::RightBrace) => {
                    self.error("unbalanced delimiter in signature".to_string());
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn skip_declaration(&mut self) {
        self.advance(); // Consume the keyword
        loop {
            match &self.current_token {
                None | Some(Token::EOF) => return,
                Some(Token::Semicolon) => {
                    self.advance();
                    return;
                }
                Some(Token::LeftParen | Token::LeftBracket | Token::LeftBrace) => {
                    self.collect_group();
                }
                Some(Token::RightParen | Token::RightBracket | Token::RightBrace) => {
                    self.error("unbalanced closing delimiter".to_string());
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn expect_declaration_end(&mut self) {
        if self.match_token(&Token::Semicolon) || self.is_at_end() {
            return;
        }
        let message = format!("expected ';' after declaration, got {:?}", self.current_token);
        self.error(message);
        while !self.is_at_end() && !self.check(&Token::Func) {
            if self.match_token(&Token::Semicolon) {
                return;
            }
            self.advance();
        }
    }
}

/// Splits a delimited list at commas outside nested groups, dropping empty entries
fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
            Token::RightParen | Token::RightBracket | Token::RightBrace => {
                depth = depth.saturating_sub(1)
            }
            Token::Comma if depth == 0 => {
                groups.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    groups.push(&tokens[start..]);
    groups.retain(|group| !group.is_empty());
    groups
}

/// Index of the delimiter closing the group opened at `tokens[0]`
fn matching_close(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
            Token::RightParen | Token::RightBracket | Token::RightBrace => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decides whether the tokens following a leading identifier in a receiver are
/// its type, making that identifier the receiver name. `T[K]` is a generic
/// type, `r []T` or `r [4]T` a named receiver.
fn starts_receiver_type(rest: &[Token]) -> bool {
    match rest {
        [] | [Token::Dot, ..] => false,
        [Token::LeftBracket, ..] => {
            matching_close(rest).is_some_and(|close| close + 1 < rest.len())
        }
        _ => true,
    }
}

fn parse_type_expr(tokens: &[Token]) -> TypeExpr {
    match tokens {
        [Token::Star, rest @ ..] if !rest.is_empty() => {
            TypeExpr::Pointer(Box::new(parse_type_expr(rest)))
        }
        [Token::LeftParen, inner @ .., Token::RightParen]
            if matching_close(tokens) == Some(tokens.len() - 1) =>
        {
            TypeExpr::Parenthesized(Box::new(parse_type_expr(inner)))
        }
        [Token::Identifier(name)] => TypeExpr::Named {
            name: name.clone(),
            type_args: 0,
        },
        [Token::Identifier(name), Token::LeftBracket, args @ .., Token::RightBracket]
            if !args.is_empty() && matching_close(&tokens[1..]) == Some(tokens.len() - 2) =>
        {
            TypeExpr::Named {
                name: name.clone(),
                type_args: split_top_level(args).len(),
            }
        }
        [Token::Identifier(package), Token::Dot, Token::Identifier(name)] => {
            TypeExpr::Qualified {
                package: package.clone(),
                name: name.clone(),
            }
        }
        _ => TypeExpr::Other(render(tokens)),
    }
}

fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            Token::Identifier(text) | Token::NumberLiteral(text) | Token::Operator(text) => {
                text.clone()
            }
            Token::StringLiteral(text) => format!("{:?}", text),
            Token::RuneLiteral(text) => format!("'{}'", text),
            Token::LeftParen => "(".to_string(),
            Token::RightParen => ")".to_string(),
            Token::LeftBracket => "[".to_string(),
            Token::RightBracket => "]".to_string(),
            Token::LeftBrace => "{".to_string(),
            Token::RightBrace => "}".to_string(),
            Token::Comma => ", ".to_string(),
            Token::Dot => ".".to_string(),
            Token::Ellipsis => "...".to_string(),
            Token::Star => "*".to_string(),
            other => format!("{:?} ", other).to_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessor::BuildContext;

    const TEST_SOURCE: &str = r#"
// Package server is a test fixture.
package server

import (
	"fmt"
	"net/http"
)

type Server struct {
	addr string
	mux  map[string]func(int) error
}

var handlers = map[string]func(){
	"a": func() {},
}

const (
	A = iota
	B
)

func New(addr string, opts ...Option) *Server {
	return &Server{addr: addr}
}

func (s *Server) Run() error {
	if s.addr == "" {
		return fmt.Errorf("no address")
	}
	return http.ListenAndServe(s.addr, nil)
}

func (Server) Name() string { return "server" }

func (p *Pair[K, V]) Key() K { return p.k }

func Map[T, U any](in []T, f func(T) U) []U {
	return nil
}

func shape() struct{ x, y int } { return struct{ x, y int }{} }

func init() {}

func _() {}

//go:linkname nanotime runtime.nanotime
func nanotime() int64
"#;

    fn parse(source: &str) -> SourceUnit {
        parse_source_unit("server.go", source).unwrap()
    }

    fn names(unit: &SourceUnit) -> Vec<Option<String>> {
        unit.declarations
            .iter()
            .map(|d| d.name().map(|n| n.name.clone()))
            .collect()
    }

    #[test]
    fn test_parser() {
        let unit = parse(TEST_SOURCE);
        assert_eq!(unit.package, "server");
        assert!(unit.syntax_errors.is_empty(), "{:?}", unit.syntax_errors);
        assert_eq!(
            names(&unit),
            vec![
                Some("New".to_string()),
                Some("Run".to_string()),
                Some("Name".to_string()),
                Some("Key".to_string()),
                Some("Map".to_string()),
                Some("shape".to_string()),
                Some("init".to_string()),
                Some("_".to_string()),
                Some("nanotime".to_string()),
            ]
        );
    }

    #[test]
    fn parameter_counts() {
        let unit = parse(TEST_SOURCE);
        let count = |i: usize| match &unit.declarations[i] {
            Declaration::Function(f) => f.parameter_count,
            Declaration::Method(m) => m.parameter_count,
        };
        assert_eq!(count(0), 2);
        assert_eq!(count(1), 0);
        assert_eq!(count(4), 2);
        assert_eq!(count(6), 0);
    }

    #[test]
    fn receivers() {
        let unit = parse(TEST_SOURCE);
        let receiver = |i: usize| match &unit.declarations[i] {
            Declaration::Method(m) => m.receiver.clone(),
            Declaration::Function(_) => panic!("expected a method"),
        };

        let run = receiver(1).unwrap();
        assert_eq!(run.name.as_deref(), Some("s"));
        assert_eq!(
            run.type_expr,
            TypeExpr::Pointer(Box::new(TypeExpr::Named {
                name: "Server".to_string(),
                type_args: 0
            }))
        );

        let name = receiver(2).unwrap();
        assert_eq!(name.name, None);

        let key = receiver(3).unwrap();
        assert_eq!(
            key.type_expr,
            TypeExpr::Pointer(Box::new(TypeExpr::Named {
                name: "Pair".to_string(),
                type_args: 2
            }))
        );
    }

    #[test]
    fn receiver_shapes() {
        let source = r#"package p
func (r []int) A() {}
func (r [4]T) B() {}
func (T[K]) C() {}
func ((*T)) D() {}
func (a, b T) E() {}
func () F() {}
func (r pkg.T) G() {}
"#;
        let unit = parse(source);
        let types: Vec<Option<TypeExpr>> = unit
            .declarations
            .iter()
            .map(|d| match d {
                Declaration::Method(m) => m.receiver.as_ref().map(|r| r.type_expr.clone()),
                Declaration::Function(_) => panic!("expected a method"),
            })
            .collect();

        assert!(matches!(types[0], Some(TypeExpr::Other(_))));
        assert!(matches!(types[1], Some(TypeExpr::Other(_))));
        assert_eq!(
            types[2],
            Some(TypeExpr::Named {
                name: "T".to_string(),
                type_args: 1
            })
        );
        assert!(matches!(types[3], Some(TypeExpr::Parenthesized(_))));
        assert_eq!(types[4], None);
        assert_eq!(types[5], None);
        assert!(matches!(types[6], Some(TypeExpr::Qualified { .. })));
        assert_eq!(unit.syntax_errors.len(), 2);
    }

    #[test]
    fn name_spans_anchor_on_identifier() {
        let unit = parse("package p\n\nfunc   Foo() {\n}\n");
        let decl = &unit.declarations[0];
        let anchor = decl.anchor();
        assert_eq!(anchor.start, SourcePosition { line: 3, column: 7 });
        assert_eq!(anchor.end, SourcePosition { line: 3, column: 10 });
        assert_eq!(decl.span().start, SourcePosition { line: 3, column: 0 });
        assert_eq!(decl.span().end, SourcePosition { line: 4, column: 1 });
    }

    #[test]
    fn missing_name_is_recorded_not_fatal() {
        let unit = parse("package p\nfunc (x int) {}\nfunc ok() {}\n");
        assert_eq!(unit.declarations.len(), 2);
        assert!(unit.declarations[0].name().is_none());
        assert_eq!(unit.declarations[0].anchor(), unit.declarations[0].span());
        assert_eq!(unit.declarations[1].name().unwrap().name, "ok");
        assert!(!unit.syntax_errors.is_empty());
    }

    #[test]
    fn build_constraint_is_attached() {
        let unit = parse("//go:build windows\n\npackage p\n");
        assert!(unit.constraint.is_some());
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let unit = parse("\u{FEFF}package p\n\nfunc A() {}\n");
        assert_eq!(unit.package, "p");
        assert_eq!(names(&unit), vec![Some("A".to_string())]);
        assert_eq!(
            unit.declarations[0].anchor().start,
            SourcePosition { line: 3, column: 5 }
        );
        assert!(!unit.source.starts_with('\u{FEFF}'));

        let unit = parse("\u{FEFF}//go:build windows\n\npackage p\n");
        assert_eq!(unit.package, "p");
        assert!(unit.constraint.is_some());
        assert!(!BuildContext::default().allows("p/a.go", unit.constraint.as_ref()));
    }

    #[test]
    fn test_error_handling() {
        assert!(matches!(
            parse_source_unit("a.go", "func main() {}"),
            Err(GocheckError::ParseError(_))
        ));
        assert!(matches!(
            parse_source_unit("a.go", "package main\nfunc main() { x := \"open\n}"),
            Err(GocheckError::LexerError(_))
        ));
    }
}
