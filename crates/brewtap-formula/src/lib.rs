//! Formula rendering for brewtap.
//!
//! Formulas are produced from a template and a
//! [`TemplateContext`](brewtap_core::TemplateContext). The template language
//! extends plain `{{variable}}` substitution with filters, `if`/`elif`/`else`
//! and `for` blocks. Rendering is pure: the same template and context always
//! produce the same bytes.
//!
//! Templates written for EJS (`<%= metadata.version %>`) must be ported to
//! `{{ metadata.version }}`; EJS tags fail with a syntax error.

pub mod engine;
pub mod parser;
pub mod template;
pub mod types;

pub use engine::{render, Template};
pub use template::{TemplateSource, DEFAULT_TEMPLATE};
pub use types::{RenderError, Result};
