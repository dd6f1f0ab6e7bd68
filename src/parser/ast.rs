use crate::preprocessor::ConstraintExpr;

/// Represents a position in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

/// Represents a span in the source code (start and end positions)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    pub fn from_token(start: (usize, usize), end: (usize, usize)) -> Self {
        Self {
            start: SourcePosition { line: start.0, column: start.1 },
            end: SourcePosition { line: end.0, column: end.1 },
        }
    }

    pub fn to(self, other: SourceSpan) -> SourceSpan {
        SourceSpan {
            start: self.start,
            end: other.end,
        }
    }
}

/// Index of a source unit inside a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

/// Stable handle of a declaration: its unit and its slot in that unit.
///
/// Two textually identical declarations always have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId {
    pub unit: UnitId,
    pub slot: usize,
}

/// One parsed Go file
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub file_name: String,
    pub package: String,
    pub constraint: Option<ConstraintExpr>,
    pub declarations: Vec<Declaration>,
    /// Recoverable syntax problems found while parsing
    pub syntax_errors: Vec<String>,
    pub source: String,
}

/// tracks the node kinds rules are applied to, in a single enum
pub enum AstNode<'a> {
    Declaration(DeclId, &'a Declaration),
}

/// An identifier token
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Function,
    Method,
}

/// Top-level declarations checked for duplicates
#[derive(Debug, Clone)]
pub enum Declaration {
    Function(FunctionDeclaration),
    Method(MethodDeclaration),
}

impl Declaration {
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::Function(_) => DeclarationKind::Function,
            Declaration::Method(_) => DeclarationKind::Method,
        }
    }

    pub fn name(&self) -> Option<&Identifier> {
        match self {
            Declaration::Function(func) => func.name.as_ref(),
            Declaration::Method(method) => method.name.as_ref(),
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            Declaration::Function(func) => func.span,
            Declaration::Method(method) => method.span,
        }
    }

    /// True when the declared name is the blank identifier `_`
    pub fn is_blank(&self) -> bool {
        self.name().is_some_and(|ident| ident.name == "_")
    }

    /// Where problems are reported: the name token, or the whole declaration without one
    pub fn anchor(&self) -> SourceSpan {
        self.name().map(|ident| ident.span).unwrap_or_else(|| self.span())
    }
}

/// A function declaration, `func name(params) results { body }`
#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub name: Option<Identifier>,
    pub parameter_count: usize,
    pub span: SourceSpan,
}

/// A method declaration, `func (recv T) name(params) results { body }`
#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    pub name: Option<Identifier>,
    /// `None` when the receiver list is not exactly one parameter
    pub receiver: Option<Receiver>,
    pub parameter_count: usize,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub name: Option<String>,
    pub type_expr: TypeExpr,
}

/// The shape of a receiver type, as far as method keys care about it
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `T` or `T[A, B]`
    Named { name: String, type_args: usize },
    Pointer(Box<TypeExpr>),
    Parenthesized(Box<TypeExpr>),
    /// `pkg.T`
    Qualified { package: String, name: String },
    /// Anything else (slices, maps, function types, malformed input)
    Other(String),
}
