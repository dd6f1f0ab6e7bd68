use log::error;
use std::ffi::{CString, c_char};
use std::ptr;
use thiserror::Error;

mod lexer;
mod parser;
mod preprocessor;
mod index;
mod analysis;

pub use analysis::SemanticAnalyzer;
pub use analysis::diagnostic::{Diagnostic, DiagnosticSeverity};
pub use analysis::diagnostic_printer::DiagnosticPrinter;
pub use analysis::external_api::{AnalyzerConfig, EntryPoints};
pub use index::Workspace;
pub use parser::ast::{SourcePosition, SourceSpan, UnitId};
pub use preprocessor::BuildContext;

#[derive(Debug, Error)]
pub enum GocheckError {
    #[error("Failed to parse build constraint: {0}")]
    ConstraintError(String),
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(String),
    #[error("Lexer encountered an error while tokenizing input: {0}")]
    LexerError(String),
    #[error("Failed to parse source unit: {0}")]
    ParseError(String),
    #[error("Null pointer passed for {0}")]
    NullPointerError(String),
}

thread_local! {
    static ERRORS: std::cell::RefCell<Vec<String>> = std::cell::RefCell::new(Vec::new());
}

pub fn gocheck_error(err: &str) {
    ERRORS.with(|errors| errors.borrow_mut().push(err.to_string()));
    error!("{:?}", err);
}

/// classic get errors function, returns the last error emitted by gocheck lib, if there are no errors returns a null pointer
///
/// you have to free the returned string using `gocheck_free_string`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gocheck_get_errors() -> *mut c_char {
    ERRORS.with(|errors| {
        let errors = errors.borrow();
        match errors.last() {
            Some(last_error) => match CString::new(last_error.clone()) {
                Ok(cstring) => cstring.into_raw(),
                Err(_) => ptr::null_mut(),
            },
            None => ptr::null_mut(),
        }
    })
}

/// Use to free any strings allocated by gocheck lib
#[unsafe(no_mangle)]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe extern "C" fn gocheck_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}
