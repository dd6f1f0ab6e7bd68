use std::iter::Peekable;
use std::str::Chars;
use std::string::String;

use crate::GocheckError;

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    // Keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // Identifiers and literals
    Identifier(String),
    StringLiteral(String),
    RuneLiteral(String),
    NumberLiteral(String),

    // Delimiters the parser cares about
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Dot,
    Ellipsis,
    Star,
    Increment,
    Decrement,

    // Every other operator, kept as its source text
    Operator(String),

    // End of file
    EOF,
}

impl Token {
    /// Whether a newline directly after this token terminates the statement.
    fn ends_statement(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_)
                | Token::StringLiteral(_)
                | Token::RuneLiteral(_)
                | Token::NumberLiteral(_)
                | Token::Break
                | Token::Continue
                | Token::Fallthrough
                | Token::Return
                | Token::Increment
                | Token::Decrement
                | Token::RightParen
                | Token::RightBracket
                | Token::RightBrace
        )
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub start: (usize, usize), // (line, column)
    pub end: (usize, usize),
}

pub struct Lexer<'src> {
    chars: Peekable<Chars<'src>>,
    line: usize,
    column: usize,
    insert_semicolon: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 0,
            insert_semicolon: false,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if let Some(c) = ch {
            self.column += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
        }
        ch
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    /// Skips whitespace and comments. Returns true when a newline was crossed.
    fn skip_trivia(&mut self) -> Result<bool, GocheckError> {
        let mut saw_newline = false;
        loop {
            match self.peek() {
                Some(&'\n') => {
                    saw_newline = true;
                    self.advance();
                }
                Some(&c) if c.is_whitespace() => {
                    self.advance();
                }
                Some(&'/') => match self.peek_second() {
                    Some('/') => self.skip_line_comment(),
                    Some('*') => saw_newline |= self.skip_general_comment()?,
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(saw_newline)
    }

    fn skip_line_comment(&mut self) {
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_general_comment(&mut self) -> Result<bool, GocheckError> {
        self.advance(); // '/'
        self.advance(); // '*'
        let mut saw_newline = false;
        while let Some(c) = self.advance() {
            if c == '\n' {
                saw_newline = true;
            } else if c == '*' && self.peek() == Some(&'/') {
                self.advance();
                return Ok(saw_newline);
            }
        }
        Err(GocheckError::LexerError(format!(
            "Unterminated comment at line {}",
            self.line
        )))
    }

    fn read_identifier(&mut self, first_char: char) -> String {
        let mut identifier = String::new();
        identifier.push(first_char);

        while let Some(&c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                identifier.push(c);
                self.advance();
            } else {
                break;
            }
        }

        identifier
    }

    // Numbers only need to be skipped, so the literal text is kept verbatim.
    fn read_number(&mut self, first_char: char) -> String {
        let mut number = String::new();
        number.push(first_char);

        while let Some(&c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                let exponent = matches!(c, 'e' | 'E' | 'p' | 'P');
                number.push(c);
                self.advance();
                if exponent {
                    if let Some(&sign) = self.peek() {
                        if sign == '+' || sign == '-' {
                            number.push(sign);
                            self.advance();
                        }
                    }
                }
            } else {
                break;
            }
        }

        number
    }

    fn read_quoted(&mut self, quote: char) -> Result<String, GocheckError> {
        let mut text = String::new();

        while let Some(c) = self.advance() {
            if c == quote {
                return Ok(text);
            } else if c == '\n' {
                break;
            } else if c == '\\' {
                text.push(c);
                match self.advance() {
                    Some(escaped) => text.push(escaped),
                    None => break,
                }
            } else {
                text.push(c);
            }
        }

        Err(GocheckError::LexerError(format!(
            "Unterminated literal at line {}",
            self.line
        )))
    }

    fn read_raw_string(&mut self) -> Result<String, GocheckError> {
        let mut text = String::new();
        while let Some(c) = self.advance() {
            if c == '`' {
                return Ok(text);
            }
            text.push(c);
        }
        Err(GocheckError::LexerError("Unterminated raw string literal".to_string()))
    }

    /// Reads an operator starting with `first`, taking the longest match.
    fn read_operator(&mut self, first: char) -> Token {
        let mut op = String::new();
        op.push(first);

        let doubles = matches!(first, '+' | '-' | '&' | '|' | '<' | '>' | '=');
        if let Some(&next) = self.peek() {
            if next == first && doubles && first != '=' {
                op.push(next);
                self.advance();
            } else if next == '-' && first == '<' {
                op.push(next);
                self.advance();
                return Token::Operator(op);
            } else if next == '^' && first == '&' {
                op.push(next);
                self.advance();
            } else if next == '=' && first == ':' {
                op.push(next);
                self.advance();
                return Token::Operator(op);
            }
        }

        match op.as_str() {
            "++" => return Token::Increment,
            "--" => return Token::Decrement,
            "&&" | "||" => return Token::Operator(op),
            _ => {}
        }

        // compound assignment and comparison forms
        if let Some(&'=') = self.peek() {
            op.push('=');
            self.advance();
        }

        Token::Operator(op)
    }

    pub fn next_token(&mut self) -> Result<SpannedToken, GocheckError> {
        let saw_newline = self.skip_trivia()?;
        let start = (self.line, self.column);

        if self.insert_semicolon && (saw_newline || self.peek().is_none()) {
            self.insert_semicolon = false;
            return Ok(SpannedToken {
                token: Token::Semicolon,
                start,
                end: start,
            });
        }

        let c = match self.advance() {
            Some(c) => c,
            None => {
                return Ok(SpannedToken {
                    token: Token::EOF,
                    start,
                    end: start,
                });
            }
        };

        let token = match c {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '*' => {
                if let Some(&'=') = self.peek() {
                    self.advance();
                    Token::Operator("*=".to_string())
                } else {
                    Token::Star
                }
            }
            '.' => {
                if self.peek() == Some(&'.') && self.peek_second() == Some('.') {
                    self.advance();
                    self.advance();
                    Token::Ellipsis
                } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    Token::NumberLiteral(self.read_number(c))
                } else {
                    Token::Dot
                }
            }
            '"' => Token::StringLiteral(self.read_quoted('"')?),
            '\'' => Token::RuneLiteral(self.read_quoted('\'')?),
            '`' => Token::StringLiteral(self.read_raw_string()?),
            '0'..='9' => Token::NumberLiteral(self.read_number(c)),
            '+' | '-' | '/' | '%' | '&' | '|' | '^' | '<' | '>' | '=' | '!' | ':' | '~' => {
                self.read_operator(c)
            }
            c if c.is_alphabetic() || c == '_' => {
                let identifier = self.read_identifier(c);
                match identifier.as_str() {
                    "break" => Token::Break,
                    "case" => Token::Case,
                    "chan" => Token::Chan,
                    "const" => Token::Const,
                    "continue" => Token::Continue,
                    "default" => Token::Default,
                    "defer" => Token::Defer,
                    "else" => Token::Else,
                    "fallthrough" => Token::Fallthrough,
                    "for" => Token::For,
                    "func" => Token::Func,
                    "go" => Token::Go,
                    "goto" => Token::Goto,
                    "if" => Token::If,
                    "import" => Token::Import,
                    "interface" => Token::Interface,
                    "map" => Token::Map,
                    "package" => Token::Package,
                    "range" => Token::Range,
                    "return" => Token::Return,
                    "select" => Token::Select,
                    "struct" => Token::Struct,
                    "switch" => Token::Switch,
                    "type" => Token::Type,
                    "var" => Token::Var,
                    _ => Token::Identifier(identifier),
                }
            }
            _ => {
                return Err(GocheckError::LexerError(format!(
                    "Unexpected character '{}' at {}:{}",
                    c, start.0, start.1
                )));
            }
        };

        self.insert_semicolon = token.ends_statement();
        let end = (self.line, self.column);
        Ok(SpannedToken { token, start, end })
    }

    #[cfg(test)]
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, GocheckError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.token == Token::EOF;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_lexer_function_header() {
        let tokens = kinds("func (s *Server) Run(addr string) error {\n}\n");
        assert_eq!(
            tokens,
            vec![
                Token::Func,
                Token::LeftParen,
                Token::Identifier("s".to_string()),
                Token::Star,
                Token::Identifier("Server".to_string()),
                Token::RightParen,
                Token::Identifier("Run".to_string()),
                Token::LeftParen,
                Token::Identifier("addr".to_string()),
                Token::Identifier("string".to_string()),
                Token::RightParen,
                Token::Identifier("error".to_string()),
                Token::LeftBrace,
                Token::RightBrace,
                Token::Semicolon,
                Token::EOF,
            ]
        );
    }

    #[test]
    fn semicolons_are_inserted_at_line_ends() {
        let tokens = kinds("package main\nimport \"fmt\"\n");
        assert_eq!(
            tokens,
            vec![
                Token::Package,
                Token::Identifier("main".to_string()),
                Token::Semicolon,
                Token::Import,
                Token::StringLiteral("fmt".to_string()),
                Token::Semicolon,
                Token::EOF,
            ]
        );
    }

    #[test]
    fn no_semicolon_after_operator_or_open_brace() {
        let tokens = kinds("x := a +\n b {\n");
        assert!(!tokens[..4].contains(&Token::Semicolon));
        assert_eq!(tokens.last(), Some(&Token::EOF));
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = kinds("// header\nfoo /* inline */ bar /* multi\nline */ baz");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("foo".to_string()),
                Token::Identifier("bar".to_string()),
                Token::Semicolon,
                Token::Identifier("baz".to_string()),
                Token::Semicolon,
                Token::EOF,
            ]
        );
    }

    #[test]
    fn literals_and_operators() {
        let tokens = kinds("a &^= 0x1F; b <- 'x'; c = `raw\nstring`; d... ; 1.5e-3");
        assert!(tokens.contains(&Token::Operator("&^=".to_string())));
        assert!(tokens.contains(&Token::NumberLiteral("0x1F".to_string())));
        assert!(tokens.contains(&Token::Operator("<-".to_string())));
        assert!(tokens.contains(&Token::RuneLiteral("x".to_string())));
        assert!(tokens.contains(&Token::StringLiteral("raw\nstring".to_string())));
        assert!(tokens.contains(&Token::Ellipsis));
        assert!(tokens.contains(&Token::NumberLiteral("1.5e-3".to_string())));
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let tokens = Lexer::new("package p\n\nfunc Foo()").tokenize().unwrap();
        let foo = tokens
            .iter()
            .find(|t| t.token == Token::Identifier("Foo".to_string()))
            .unwrap();
        assert_eq!(foo.start, (3, 5));
        assert_eq!(foo.end, (3, 8));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let result = Lexer::new("x := \"oops\n").tokenize();
        assert!(matches!(result, Err(GocheckError::LexerError(_))));
    }
}
