//! Tokenize and parse template source into a [`Node`] tree.
//!
//! Syntax:
//! - `{{ expr }}` outputs a value, `expr` being a dotted path or a literal
//!   followed by `| filter` applications.
//! - `{% if %}` / `{% elif %}` / `{% else %}` / `{% endif %}` and
//!   `{% for [key,] value in expr %}` / `{% endfor %}` control flow.
//! - `{# ... #}` comments.
//!
//! A block tag or comment alone on its line swallows the whole line, so
//! control flow leaves no blank lines in the output.
//!
//! EJS-style `<%= expr %>` / `<% code %>` tags are not part of the language.
//! A template using them is rejected with a syntax error pointing at the
//! first tag rather than being copied into the formula verbatim.

use serde_json::Value;

use crate::types::{Condition, Expr, Filter, Node, Operand, RenderError, Result, Term};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Output { src: String, line: usize },
    Tag { src: String, line: usize },
}

/// A block-closing or block-continuing tag handed back to the enclosing block.
struct EndTag<'a> {
    keyword: &'a str,
    rest: &'a str,
    line: usize,
}

/// Parse a template into its node tree.
pub fn parse(source: &str) -> Result<Vec<Node>> {
    reject_ejs(source)?;
    let tokens = tokenize(source)?;
    let mut pos = 0;
    let (nodes, end) = parse_block(&tokens, &mut pos)?;
    match end {
        Some(tag) => Err(unexpected(&tag)),
        None => Ok(nodes),
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = source[cursor..].find('{') {
        let start = cursor + offset;
        let kind = source[start + 1..].chars().next();
        let close = match kind {
            Some('{') => "}}",
            Some('%') => "%}",
            Some('#') => "#}",
            _ => {
                cursor = start + 1;
                continue;
            }
        };

        let line = line_at(source, start);
        let inner_start = start + 2;
        let Some(close_offset) = source[inner_start..].find(close) else {
            return Err(RenderError::syntax(
                line,
                format!("unclosed `{}`", &source[start..inner_start]),
            ));
        };
        let inner = source[inner_start..inner_start + close_offset].trim();
        let mut end = inner_start + close_offset + close.len();
        let mut text_end = start;

        if kind != Some('{') {
            if let Some((line_start, line_end)) = standalone(source, start, end) {
                text_end = line_start.max(text_start);
                end = line_end;
            }
        }

        push_text(&mut tokens, &source[text_start..text_end]);
        match kind {
            Some('{') => tokens.push(Token::Output {
                src: inner.to_string(),
                line,
            }),
            Some('%') => tokens.push(Token::Tag {
                src: inner.to_string(),
                line,
            }),
            _ => {}
        }
        text_start = end;
        cursor = end;
    }

    push_text(&mut tokens, &source[text_start..]);
    Ok(tokens)
}

fn reject_ejs(source: &str) -> Result<()> {
    let Some(open) = source.find("<%") else {
        return Ok(());
    };
    if !source[open + 2..].contains("%>") {
        return Ok(());
    }
    Err(RenderError::syntax(
        line_at(source, open),
        "EJS tags (`<% %>`) are not supported; use `{{ expr }}` and `{% if %}`/`{% for %}` blocks",
    ))
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if !text.is_empty() {
        tokens.push(Token::Text(text.to_string()));
    }
}

/// 1-based line number of byte offset `pos`.
fn line_at(source: &str, pos: usize) -> usize {
    source[..pos].matches('\n').count() + 1
}

/// If the tag spanning `start..end` is the only thing on its line, return
/// the byte range of that whole line (including its newline).
fn standalone(source: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    if !is_blank(&source[line_start..start]) {
        return None;
    }
    let rest = &source[end..];
    let line_len = rest.find('\n').map_or(rest.len(), |i| i + 1);
    if !is_blank(rest[..line_len].trim_end_matches(['\n', '\r'])) {
        return None;
    }
    Some((line_start, end + line_len))
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c == '\t')
}

// ---------------------------------------------------------------------------
// Block structure
// ---------------------------------------------------------------------------

fn parse_block<'a>(tokens: &'a [Token], pos: &mut usize) -> Result<(Vec<Node>, Option<EndTag<'a>>)> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.get(*pos) {
        *pos += 1;
        match token {
            Token::Text(text) => nodes.push(Node::Text(text.clone())),
            Token::Output { src, line } => nodes.push(Node::Output {
                expr: parse_expr(src, *line)?,
                line: *line,
            }),
            Token::Tag { src, line } => {
                let (keyword, rest) = match src.split_once(char::is_whitespace) {
                    Some((k, r)) => (k, r.trim()),
                    None => (src.as_str(), ""),
                };
                match keyword {
                    "if" => nodes.push(parse_if(tokens, pos, rest, *line)?),
                    "for" => nodes.push(parse_for(tokens, pos, rest, *line)?),
                    "elif" | "else" | "endif" | "endfor" => {
                        return Ok((
                            nodes,
                            Some(EndTag {
                                keyword,
                                rest,
                                line: *line,
                            }),
                        ));
                    }
                    "" => return Err(RenderError::syntax(*line, "empty tag")),
                    other => {
                        return Err(RenderError::syntax(*line, format!("unknown tag `{other}`")));
                    }
                }
            }
        }
    }
    Ok((nodes, None))
}

fn parse_if(tokens: &[Token], pos: &mut usize, cond: &str, line: usize) -> Result<Node> {
    let mut branches = Vec::new();
    let mut condition = parse_condition(cond, line)?;
    loop {
        let (body, end) = parse_block(tokens, pos)?;
        match end {
            Some(EndTag {
                keyword: "elif",
                rest,
                line: elif_line,
            }) => {
                branches.push((condition, body));
                condition = parse_condition(rest, elif_line)?;
            }
            Some(EndTag {
                keyword: "else",
                rest,
                line: else_line,
            }) => {
                if !rest.is_empty() {
                    return Err(RenderError::syntax(
                        else_line,
                        "`else` takes no condition (use `elif`)",
                    ));
                }
                branches.push((condition, body));
                let (otherwise, end) = parse_block(tokens, pos)?;
                return match end {
                    Some(EndTag {
                        keyword: "endif", ..
                    }) => Ok(Node::If {
                        branches,
                        otherwise,
                    }),
                    Some(tag) => Err(unexpected(&tag)),
                    None => Err(RenderError::syntax(line, "unclosed `{% if %}`")),
                };
            }
            Some(EndTag {
                keyword: "endif", ..
            }) => {
                branches.push((condition, body));
                return Ok(Node::If {
                    branches,
                    otherwise: Vec::new(),
                });
            }
            Some(tag) => return Err(unexpected(&tag)),
            None => return Err(RenderError::syntax(line, "unclosed `{% if %}`")),
        }
    }
}

fn parse_for(tokens: &[Token], pos: &mut usize, header: &str, line: usize) -> Result<Node> {
    let Some((vars, iterable)) = header.split_once(" in ") else {
        return Err(RenderError::syntax(
            line,
            "expected `{% for value in items %}` or `{% for key, value in items %}`",
        ));
    };

    let names: Vec<&str> = vars.split(',').map(str::trim).collect();
    if let Some(bad) = names.iter().find(|n| !is_identifier(n)) {
        return Err(RenderError::syntax(line, format!("invalid loop variable `{bad}`")));
    }
    let (key, value) = match names.as_slice() {
        [value] => (None, value.to_string()),
        [key, value] => (Some(key.to_string()), value.to_string()),
        _ => {
            return Err(RenderError::syntax(line, "too many loop variables"));
        }
    };
    let iterable = parse_expr(iterable, line)?;

    let (body, end) = parse_block(tokens, pos)?;
    match end {
        Some(EndTag {
            keyword: "endfor", ..
        }) => Ok(Node::For {
            key,
            value,
            iterable,
            body,
            line,
        }),
        Some(tag) => Err(unexpected(&tag)),
        None => Err(RenderError::syntax(line, "unclosed `{% for %}`")),
    }
}

fn unexpected(tag: &EndTag<'_>) -> RenderError {
    RenderError::syntax(tag.line, format!("unexpected `{{% {} %}}`", tag.keyword))
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Parse `operand | filter | filter("arg")`.
pub(crate) fn parse_expr(src: &str, line: usize) -> Result<Expr> {
    let src = src.trim();
    let mut parts = split_outside_quotes(src, "|").into_iter();
    let head = parts.next().unwrap_or_default().trim();
    if head.is_empty() {
        return Err(RenderError::syntax(line, "empty expression"));
    }
    let operand = parse_operand(head, line)?;
    let filters = parts
        .map(|f| parse_filter(f.trim(), line))
        .collect::<Result<Vec<_>>>()?;
    Ok(Expr {
        src: src.to_string(),
        operand,
        filters,
    })
}

fn parse_operand(s: &str, line: usize) -> Result<Operand> {
    if s.starts_with('"') {
        return Ok(Operand::Literal(Value::String(parse_string_literal(s, line)?)));
    }
    match s {
        "true" => return Ok(Operand::Literal(Value::Bool(true))),
        "false" => return Ok(Operand::Literal(Value::Bool(false))),
        _ => {}
    }
    if let Ok(n) = s.parse::<i64>() {
        return Ok(Operand::Literal(Value::from(n)));
    }

    let segments: Vec<String> = s.split('.').map(str::to_string).collect();
    if segments.iter().any(|seg| !is_path_segment(seg)) {
        return Err(RenderError::syntax(line, format!("invalid expression `{s}`")));
    }
    Ok(Operand::Path(segments))
}

fn parse_filter(s: &str, line: usize) -> Result<Filter> {
    let (name, arg) = match s.split_once('(') {
        Some((name, rest)) => {
            let arg = rest.trim_end().strip_suffix(')').ok_or_else(|| {
                RenderError::syntax(line, format!("unclosed argument list in filter `{s}`"))
            })?;
            (name.trim(), Some(arg.trim()))
        }
        None => (s, None),
    };

    match (name, arg) {
        ("lower", None) => Ok(Filter::Lower),
        ("upper", None) => Ok(Filter::Upper),
        ("capitalize", None) => Ok(Filter::Capitalize),
        ("trim", None) => Ok(Filter::Trim),
        ("default", Some(arg)) => Ok(Filter::Default(parse_string_literal(arg, line)?)),
        ("default", None) => Err(RenderError::syntax(
            line,
            "filter `default` needs an argument, e.g. default(\"\")",
        )),
        (name, _) => Err(RenderError::syntax(line, format!("unknown filter `{name}`"))),
    }
}

fn parse_string_literal(s: &str, line: usize) -> Result<String> {
    let inner = s
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .ok_or_else(|| RenderError::syntax(line, format!("unterminated string literal {s}")))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {
                return Err(RenderError::syntax(line, format!("dangling escape in {s}")));
            }
        }
    }
    Ok(out)
}

fn parse_condition(src: &str, line: usize) -> Result<Condition> {
    if src.trim().is_empty() {
        return Err(RenderError::syntax(line, "missing condition"));
    }
    let any = split_outside_quotes(src, " or ")
        .into_iter()
        .map(|conj| {
            split_outside_quotes(conj, " and ")
                .into_iter()
                .map(|term| parse_term(term.trim(), line))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Condition { any })
}

fn parse_term(term: &str, line: usize) -> Result<Term> {
    for (op, negated) in [("!=", true), ("==", false)] {
        let sides = split_outside_quotes(term, op);
        match sides.as_slice() {
            [_] => continue,
            [lhs, rhs] => {
                return Ok(Term::Equals {
                    lhs: parse_expr(lhs, line)?,
                    rhs: parse_expr(rhs, line)?,
                    negated,
                });
            }
            _ => {
                return Err(RenderError::syntax(
                    line,
                    format!("chained comparison in `{term}`"),
                ));
            }
        }
    }

    match term.strip_prefix("not ") {
        Some(expr) => Ok(Term::Truthy {
            expr: parse_expr(expr, line)?,
            negated: true,
        }),
        None => Ok(Term::Truthy {
            expr: parse_expr(term, line)?,
            negated: false,
        }),
    }
}

/// Split on `sep`, ignoring separators inside double-quoted strings.
fn split_outside_quotes<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_quotes = false;
            }
            i += 1;
        } else if b == b'"' {
            in_quotes = true;
            i += 1;
        } else if bytes[i..].starts_with(sep.as_bytes()) {
            parts.push(&s[start..i]);
            i += sep.len();
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(&s[start..]);
    parts
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(segments: &[&str]) -> Operand {
        Operand::Path(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn tokenize_plain_text() {
        assert_eq!(
            tokenize("no tags here").unwrap(),
            vec![Token::Text("no tags here".into())]
        );
    }

    #[test]
    fn ejs_tags_are_rejected_with_their_line() {
        let err = parse("class Hello < Formula\n  version \"<%= metadata.version %>\"\nend").unwrap_err();
        match &err {
            RenderError::Syntax { line, message } => {
                assert_eq!(*line, 2);
                assert!(message.contains("EJS"), "{message}");
            }
            other => panic!("expected Syntax, got: {other:?}"),
        }
        assert!(parse("<% if (x) { %>a<% } %>").is_err());
    }

    #[test]
    fn lone_percent_angle_is_text() {
        assert_eq!(
            tokenize("x <% y").unwrap(),
            vec![Token::Text("x <% y".into())]
        );
        assert!(parse("x <% y").is_ok());
    }

    #[test]
    fn tokenize_ruby_interpolation_is_text() {
        let tokens = tokenize(r##"system "#{bin}/x""##).unwrap();
        assert_eq!(tokens, vec![Token::Text(r##"system "#{bin}/x""##.into())]);
    }

    #[test]
    fn standalone_tag_swallows_its_line() {
        let tokens = tokenize("a\n  {% if x %}  \nb\n{% endif %}\nc").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a\n".into()),
                Token::Tag {
                    src: "if x".into(),
                    line: 2
                },
                Token::Text("b\n".into()),
                Token::Tag {
                    src: "endif".into(),
                    line: 4
                },
                Token::Text("c".into()),
            ]
        );
    }

    #[test]
    fn inline_tag_keeps_surrounding_text() {
        let tokens = tokenize("x {% if y %}z{% endif %}\n").unwrap();
        assert_eq!(tokens[0], Token::Text("x ".into()));
        assert_eq!(tokens.last(), Some(&Token::Text("\n".into())));
    }

    #[test]
    fn standalone_comment_disappears() {
        let tokens = tokenize("a\n{# note #}\nb").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Text("a\n".into()), Token::Text("b".into())]
        );
    }

    #[test]
    fn output_is_never_trimmed() {
        let tokens = tokenize("{{ x }}\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Output {
                    src: "x".into(),
                    line: 1
                },
                Token::Text("\n".into()),
            ]
        );
    }

    #[test]
    fn unclosed_output_reports_line() {
        let err = tokenize("line one\n{{ broken").unwrap_err();
        assert_eq!(
            err.to_string(),
            "template syntax error at line 2: unclosed `{{`"
        );
    }

    #[test]
    fn expr_with_filters() {
        let expr = parse_expr(r#"metadata.name | lower | default("x|y")"#, 1).unwrap();
        assert_eq!(expr.operand, path(&["metadata", "name"]));
        assert_eq!(
            expr.filters,
            vec![Filter::Lower, Filter::Default("x|y".into())]
        );
    }

    #[test]
    fn expr_literals() {
        assert_eq!(
            parse_expr(r#""a \"b\"""#, 1).unwrap().operand,
            Operand::Literal(Value::String("a \"b\"".into()))
        );
        assert_eq!(
            parse_expr("3", 1).unwrap().operand,
            Operand::Literal(Value::from(3))
        );
        assert_eq!(
            parse_expr("true", 1).unwrap().operand,
            Operand::Literal(Value::Bool(true))
        );
    }

    #[test]
    fn expr_rejects_garbage() {
        assert!(parse_expr("metadata..name", 1).is_err());
        assert!(parse_expr("a b", 1).is_err());
        assert!(parse_expr("", 1).is_err());
        assert!(parse_expr("x | shout", 1).is_err());
        assert!(parse_expr("x | default", 1).is_err());
    }

    #[test]
    fn condition_precedence() {
        let cond = parse_condition(r#"a and not b or c == "x y""#, 1).unwrap();
        assert_eq!(cond.any.len(), 2);
        assert_eq!(cond.any[0].len(), 2);
        assert!(matches!(
            &cond.any[0][1],
            Term::Truthy { negated: true, .. }
        ));
        assert!(matches!(
            &cond.any[1][0],
            Term::Equals { negated: false, .. }
        ));
    }

    #[test]
    fn parse_if_elif_else() {
        let nodes = parse("{% if a %}A{% elif b %}B{% else %}C{% endif %}").unwrap();
        match &nodes[..] {
            [Node::If {
                branches,
                otherwise,
            }] => {
                assert_eq!(branches.len(), 2);
                assert_eq!(otherwise, &vec![Node::Text("C".into())]);
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn parse_for_with_key() {
        let nodes = parse("{% for label, art in artifacts %}{{ label }}{% endfor %}").unwrap();
        match &nodes[..] {
            [Node::For {
                key, value, body, ..
            }] => {
                assert_eq!(key.as_deref(), Some("label"));
                assert_eq!(value, "art");
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn unbalanced_blocks_are_errors() {
        assert!(parse("{% if a %}never closed").is_err());
        assert!(parse("{% endif %}").is_err());
        assert!(parse("{% for x in xs %}{% endif %}").is_err());
        assert!(parse("{% if a %}{% else %}{% elif b %}{% endif %}").is_err());
        assert!(parse("{% unless a %}{% endunless %}").is_err());
    }

    #[test]
    fn error_names_the_line() {
        let err = parse("ok\nok\n{% for in %}\n{% endfor %}").unwrap_err();
        match err {
            RenderError::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("expected Syntax, got: {other:?}"),
        }
    }

    #[test]
    fn split_outside_quotes_respects_strings() {
        assert_eq!(
            split_outside_quotes(r#"a | "b | c" | d"#, "|"),
            vec!["a ", r#" "b | c" "#, " d"]
        );
    }
}
