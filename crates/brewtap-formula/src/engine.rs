//! Evaluate a parsed template against a JSON context.

use std::collections::HashMap;

use brewtap_core::{RenderedDocument, TemplateContext};
use serde_json::{Map, Value};

use crate::parser::parse;
use crate::types::{Condition, Expr, Filter, Node, Operand, RenderError, Result, Term};

/// A parsed template, ready to render any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source. Syntax errors carry the offending line.
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            nodes: parse(source)?,
        })
    }

    /// Render against an arbitrary JSON root object.
    pub fn render_value(&self, root: &Value) -> Result<String> {
        let mut scope = Scope {
            root,
            frames: Vec::new(),
        };
        let mut out = String::new();
        render_nodes(&self.nodes, &mut scope, &mut out)?;
        Ok(out)
    }

    /// Render against a pipeline [`TemplateContext`].
    pub fn render(&self, context: &TemplateContext) -> Result<RenderedDocument> {
        self.render_value(&context.to_value())
            .map(RenderedDocument::new)
    }
}

/// Parse and render `template` in one step.
pub fn render(template: &str, context: &TemplateContext) -> Result<RenderedDocument> {
    Template::parse(template)?.render(context)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Variable lookup: loop frames shadow the root context, innermost first.
struct Scope<'a> {
    root: &'a Value,
    frames: Vec<HashMap<String, Value>>,
}

impl Scope<'_> {
    fn lookup(&self, path: &[String]) -> Option<Value> {
        let (first, rest) = path.split_first()?;
        let base = self
            .frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(first))
            .or_else(|| self.root.get(first))?;

        let mut current = base;
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }
}

fn render_nodes(nodes: &[Node], scope: &mut Scope<'_>, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output { expr, line } => {
                let value = eval(expr, scope).ok_or_else(|| RenderError::Undefined {
                    expr: expr.src.clone(),
                    line: *line,
                })?;
                out.push_str(&display(&value));
            }
            Node::If {
                branches,
                otherwise,
            } => {
                let body = branches
                    .iter()
                    .find(|(cond, _)| test(cond, scope))
                    .map_or(otherwise, |(_, body)| body);
                render_nodes(body, scope, out)?;
            }
            Node::For {
                key,
                value,
                iterable,
                body,
                line,
            } => {
                let entries: Vec<(Value, Value)> = match eval(iterable, scope) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| (Value::from(i), item))
                        .collect(),
                    Some(Value::Object(map)) => {
                        map.into_iter().map(|(k, v)| (Value::String(k), v)).collect()
                    }
                    Some(_) => {
                        return Err(RenderError::NotIterable {
                            expr: iterable.src.clone(),
                            line: *line,
                        });
                    }
                };

                let len = entries.len();
                for (index, (k, v)) in entries.into_iter().enumerate() {
                    let mut frame = HashMap::new();
                    if let Some(key) = key {
                        frame.insert(key.clone(), k);
                    }
                    frame.insert(value.clone(), v);
                    frame.insert("loop".to_string(), loop_info(index, len));
                    scope.frames.push(frame);
                    let result = render_nodes(body, scope, out);
                    scope.frames.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

fn loop_info(index: usize, len: usize) -> Value {
    let mut info = Map::new();
    info.insert("index".into(), Value::from(index + 1));
    info.insert("index0".into(), Value::from(index));
    info.insert("first".into(), Value::Bool(index == 0));
    info.insert("last".into(), Value::Bool(index + 1 == len));
    Value::Object(info)
}

/// Evaluate an expression; `None` means undefined.
fn eval(expr: &Expr, scope: &Scope<'_>) -> Option<Value> {
    let mut value = match &expr.operand {
        Operand::Path(path) => scope.lookup(path),
        Operand::Literal(v) => Some(v.clone()),
    };
    for filter in &expr.filters {
        value = apply(filter, value);
    }
    value
}

fn apply(filter: &Filter, value: Option<Value>) -> Option<Value> {
    if let Filter::Default(fallback) = filter {
        return match value {
            None | Some(Value::Null) => Some(Value::String(fallback.clone())),
            Some(Value::String(s)) if s.is_empty() => Some(Value::String(fallback.clone())),
            other => other,
        };
    }

    let text = display(&value?);
    let transformed = match filter {
        Filter::Lower => text.to_lowercase(),
        Filter::Upper => text.to_uppercase(),
        Filter::Trim => text.trim().to_string(),
        Filter::Capitalize => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        Filter::Default(_) => text,
    };
    Some(Value::String(transformed))
}

fn test(cond: &Condition, scope: &Scope<'_>) -> bool {
    cond.any
        .iter()
        .any(|all| all.iter().all(|term| test_term(term, scope)))
}

fn test_term(term: &Term, scope: &Scope<'_>) -> bool {
    match term {
        Term::Truthy { expr, negated } => truthy(eval(expr, scope).as_ref()) != *negated,
        Term::Equals { lhs, rhs, negated } => {
            let l = eval(lhs, scope).map(|v| display(&v)).unwrap_or_default();
            let r = eval(rhs, scope).map(|v| display(&v)).unwrap_or_default();
            (l == r) != *negated
        }
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Text form of a value as it appears in the rendered document.
fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
