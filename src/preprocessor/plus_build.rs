use crate::GocheckError;
use crate::preprocessor::{ConstraintExpr, DirectiveHandler, PreprocessorState};

/// Handler for the legacy `// +build` directive.
///
/// Space separated options are ORed, comma separated terms within an option are ANDed.
pub struct PlusBuildDirective;

impl DirectiveHandler for PlusBuildDirective {
    fn process(&self, line: &str, state: &mut PreprocessorState) -> Result<(), GocheckError> {
        let expr = line
            .split_whitespace()
            .map(parse_option)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .reduce(|acc, option| ConstraintExpr::Or(Box::new(acc), Box::new(option)))
            .ok_or_else(|| GocheckError::ConstraintError("empty +build line".to_string()))?;
        state.plus_build.push(expr);
        Ok(())
    }
}

fn parse_option(option: &str) -> Result<ConstraintExpr, GocheckError> {
    option
        .split(',')
        .map(parse_term)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .reduce(|acc, term| ConstraintExpr::And(Box::new(acc), Box::new(term)))
        .ok_or_else(|| GocheckError::ConstraintError(format!("empty option {:?}", option)))
}

fn parse_term(term: &str) -> Result<ConstraintExpr, GocheckError> {
    let (negated, tag) = match term.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, term),
    };
    let valid = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if !valid {
        return Err(GocheckError::ConstraintError(format!(
            "invalid +build term {:?}",
            term
        )));
    }

    let expr = ConstraintExpr::Tag(tag.to_string());
    Ok(if negated {
        ConstraintExpr::Not(Box::new(expr))
    } else {
        expr
    })
}
