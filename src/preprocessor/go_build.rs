use crate::GocheckError;
use crate::preprocessor::{ConstraintExpr, DirectiveHandler, PreprocessorState};
use std::iter::Peekable;
use std::str::CharIndices;

/// Handler for the `//go:build` directive.
pub struct GoBuildDirective;

impl DirectiveHandler for GoBuildDirective {
    fn process(&self, line: &str, state: &mut PreprocessorState) -> Result<(), GocheckError> {
        if state.go_build.is_some() {
            return Err(GocheckError::ConstraintError(
                "multiple //go:build lines".to_string(),
            ));
        }
        state.go_build = Some(parse_expression(line)?);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ExprToken {
    Tag(String),
    Not,
    And,
    Or,
    LeftParen,
    RightParen,
}

fn tokenize(line: &str) -> Result<Vec<ExprToken>, GocheckError> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<CharIndices> = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            ' ' | '\t' => {}
            '(' => tokens.push(ExprToken::LeftParen),
            ')' => tokens.push(ExprToken::RightParen),
            '!' => tokens.push(ExprToken::Not),
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(GocheckError::ConstraintError(format!(
                        "unexpected '{}' at offset {} in {:?}",
                        c, i, line
                    )));
                }
                tokens.push(if c == '&' { ExprToken::And } else { ExprToken::Or });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::new();
                tag.push(c);
                while let Some((_, next)) =
                    chars.next_if(|&(_, n)| n.is_alphanumeric() || n == '_' || n == '.')
                {
                    tag.push(next);
                }
                tokens.push(ExprToken::Tag(tag));
            }
            _ => {
                return Err(GocheckError::ConstraintError(format!(
                    "invalid character '{}' in {:?}",
                    c, line
                )));
            }
        }
    }

    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<ExprToken>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<ExprToken> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> Result<ConstraintExpr, GocheckError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&ExprToken::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = ConstraintExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<ConstraintExpr, GocheckError> {
        let mut left = self.parse_not()?;
        while self.peek() == Some(&ExprToken::And) {
            self.advance();
            let right = self.parse_not()?;
            left = ConstraintExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<ConstraintExpr, GocheckError> {
        match self.advance() {
            Some(ExprToken::Not) => Ok(ConstraintExpr::Not(Box::new(self.parse_not()?))),
            Some(ExprToken::LeftParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(ExprToken::RightParen) => Ok(inner),
                    other => Err(GocheckError::ConstraintError(format!(
                        "expected ')', got {:?}",
                        other
                    ))),
                }
            }
            Some(ExprToken::Tag(tag)) => Ok(ConstraintExpr::Tag(tag)),
            other => Err(GocheckError::ConstraintError(format!(
                "expected build tag, got {:?}",
                other
            ))),
        }
    }
}

pub fn parse_expression(line: &str) -> Result<ConstraintExpr, GocheckError> {
    let mut parser = ExprParser {
        tokens: tokenize(line)?,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(extra) = parser.peek() {
        return Err(GocheckError::ConstraintError(format!(
            "unexpected {:?} after expression in {:?}",
            extra, line
        )));
    }
    Ok(expr)
}
