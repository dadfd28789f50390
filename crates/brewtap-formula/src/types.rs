//! Template syntax tree and rendering errors.

use std::path::PathBuf;

use serde_json::Value;

/// A parsed template: text interleaved with expressions and blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output.
    Text(String),

    /// `{{ expr }}`
    Output { expr: Expr, line: usize },

    /// `{% if %}` ... `{% elif %}` ... `{% else %}` ... `{% endif %}`
    If {
        branches: Vec<(Condition, Vec<Node>)>,
        otherwise: Vec<Node>,
    },

    /// `{% for [key,] value in path %}` ... `{% endfor %}`
    For {
        key: Option<String>,
        value: String,
        iterable: Expr,
        body: Vec<Node>,
        line: usize,
    },
}

/// A value reference with optional filters, e.g. `metadata.name | lower`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Source text, used in error messages.
    pub src: String,
    pub operand: Operand,
    pub filters: Vec<Filter>,
}

/// The thing an expression starts from.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Dotted lookup into the context, e.g. `["artifacts", "macArm", "url"]`.
    Path(Vec<String>),
    /// A string, number or boolean literal.
    Literal(Value),
}

/// A filter applied to an expression value.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Lower,
    Upper,
    Capitalize,
    Trim,
    /// Substitute the argument when the value is missing, null or empty.
    Default(String),
}

/// An `if`/`elif` condition: a disjunction of conjunctions.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub any: Vec<Vec<Term>>,
}

/// A single comparison or truthiness test.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Truthy { expr: Expr, negated: bool },
    Equals { lhs: Expr, rhs: Expr, negated: bool },
}

/// Errors that can occur while loading, parsing or rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("undefined value `{expr}` at line {line}")]
    Undefined { expr: String, line: usize },

    #[error("cannot iterate over `{expr}` at line {line}: expected a list or mapping")]
    NotIterable { expr: String, line: usize },

    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RenderError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for template operations.
pub type Result<T> = std::result::Result<T, RenderError>;
