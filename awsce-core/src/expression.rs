//! Per-item parameter expressions
//!
//! A parameter value that is a string starting with `=` is an expression.
//! `{{ ... }}` blocks inside it are evaluated against the current item:
//!
//! - `{{ $json.account.id }}` / `{{ $json["cost center"] }}` / `{{ $json.list[0] }}`
//!   look up a path in the item payload
//! - `{{ $itemIndex }}` is the position of the item
//!
//! An expression made of exactly one block returns the looked-up value as-is,
//! so it can produce arrays or objects. Anything else is rendered as text with
//! the blocks interpolated. Paths that do not exist evaluate to `null`.

use serde_json::Value;

/// Marker prefix that turns a string parameter into an expression
pub const EXPRESSION_PREFIX: char = '=';

/// Expression evaluation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ExpressionError(pub String);

/// The data an expression can see
#[derive(Debug, Clone, Copy)]
pub struct ExpressionContext<'a> {
    /// Payload of the current item
    pub json: &'a Value,
    /// Position of the current item
    pub item_index: usize,
}

impl<'a> ExpressionContext<'a> {
    pub fn new(json: &'a Value, item_index: usize) -> Self {
        Self { json, item_index }
    }
}

/// Returns true if `value` is an expression string
pub fn is_expression(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.starts_with(EXPRESSION_PREFIX))
}

/// Evaluate `value` for one item.
///
/// Non-expression values are returned unchanged.
pub fn evaluate(value: &Value, ctx: ExpressionContext<'_>) -> Result<Value, ExpressionError> {
    let Some(template) = value
        .as_str()
        .and_then(|s| s.strip_prefix(EXPRESSION_PREFIX))
    else {
        return Ok(value.clone());
    };

    let segments = parse_template(template)?;

    if let [Segment::Block(expr)] = segments.as_slice() {
        return eval_block(expr, ctx);
    }

    let mut out = String::new();
    for segment in &segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Block(expr) => match eval_block(expr, ctx)? {
                Value::Null => {}
                Value::String(s) => out.push_str(&s),
                other => out.push_str(&other.to_string()),
            },
        }
    }
    Ok(Value::String(out))
}

#[derive(Debug, PartialEq)]
enum Segment {
    Text(String),
    Block(String),
}

/// Split a template into literal text and `{{ }}` blocks
fn parse_template(template: &str) -> Result<Vec<Segment>, ExpressionError> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or_else(|| ExpressionError("unterminated '{{' block".to_string()))?;
        segments.push(Segment::Block(after_open[..close].trim().to_string()));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }

    Ok(segments)
}

/// Evaluate the contents of one `{{ }}` block
fn eval_block(expr: &str, ctx: ExpressionContext<'_>) -> Result<Value, ExpressionError> {
    if expr == "$itemIndex" {
        return Ok(Value::from(ctx.item_index));
    }

    let Some(path) = expr.strip_prefix("$json") else {
        return Err(ExpressionError(format!(
            "unsupported expression '{}': expected $json or $itemIndex",
            expr
        )));
    };

    let mut current = ctx.json;
    for accessor in parse_path(path)? {
        let next = match &accessor {
            Accessor::Key(key) => current.get(key.as_str()),
            Accessor::Index(idx) => current.get(*idx),
        };
        match next {
            Some(v) => current = v,
            None => return Ok(Value::Null),
        }
    }

    Ok(current.clone())
}

#[derive(Debug, PartialEq)]
enum Accessor {
    Key(String),
    Index(usize),
}

/// Parse `.a.b["c d"][0]` into accessors
fn parse_path(path: &str) -> Result<Vec<Accessor>, ExpressionError> {
    let mut accessors = Vec::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                let mut key = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '.' || next == '[' {
                        break;
                    }
                    key.push(next);
                    chars.next();
                }
                if key.is_empty() {
                    return Err(ExpressionError(format!("empty property name in '{}'", path)));
                }
                accessors.push(Accessor::Key(key));
            }
            '[' => {
                let mut inner = String::new();
                let mut closed = false;
                let quote = match chars.peek().copied() {
                    Some(q) if q == '"' || q == '\'' => {
                        chars.next();
                        Some(q)
                    }
                    _ => None,
                };
                while let Some(next) = chars.next() {
                    if let Some(q) = quote {
                        if next == q {
                            if chars.next() != Some(']') {
                                return Err(ExpressionError(format!(
                                    "expected ']' after quoted key in '{}'",
                                    path
                                )));
                            }
                            closed = true;
                            break;
                        }
                    } else if next == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(next);
                }
                if !closed {
                    return Err(ExpressionError(format!("unterminated '[' in '{}'", path)));
                }
                if quote.is_some() {
                    accessors.push(Accessor::Key(inner));
                } else {
                    let index = inner.trim().parse::<usize>().map_err(|_| {
                        ExpressionError(format!("invalid array index '{}' in '{}'", inner, path))
                    })?;
                    accessors.push(Accessor::Index(index));
                }
            }
            c if c.is_whitespace() => {}
            other => {
                return Err(ExpressionError(format!(
                    "unexpected character '{}' in '{}'",
                    other, path
                )))
            }
        }
    }

    Ok(accessors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expr: &str, payload: &Value) -> Result<Value, ExpressionError> {
        evaluate(&json!(expr), ExpressionContext::new(payload, 5))
    }

    #[test]
    fn test_plain_values_pass_through() {
        let payload = json!({});
        let ctx = ExpressionContext::new(&payload, 0);
        assert_eq!(evaluate(&json!("2023-01-01"), ctx).unwrap(), json!("2023-01-01"));
        assert_eq!(evaluate(&json!(["a"]), ctx).unwrap(), json!(["a"]));
        assert!(!is_expression(&json!("MONTHLY")));
        assert!(is_expression(&json!("={{ $json.x }}")));
    }

    #[test]
    fn test_single_block_returns_raw_value() {
        let payload = json!({"metrics": ["BlendedCost", "UsageQuantity"]});
        assert_eq!(
            eval("={{ $json.metrics }}", &payload).unwrap(),
            json!(["BlendedCost", "UsageQuantity"])
        );
    }

    #[test]
    fn test_nested_and_bracket_paths() {
        let payload = json!({
            "window": {"start": "2023-01-01"},
            "cost center": "ops",
            "list": [{"name": "first"}, {"name": "second"}]
        });
        assert_eq!(eval("={{$json.window.start}}", &payload).unwrap(), json!("2023-01-01"));
        assert_eq!(eval("={{ $json[\"cost center\"] }}", &payload).unwrap(), json!("ops"));
        assert_eq!(eval("={{ $json.list[1].name }}", &payload).unwrap(), json!("second"));
        assert_eq!(eval("={{ $json['list'][0]['name'] }}", &payload).unwrap(), json!("first"));
    }

    #[test]
    fn test_missing_path_is_null() {
        let payload = json!({"a": {}});
        assert_eq!(eval("={{ $json.a.b.c }}", &payload).unwrap(), Value::Null);
        assert_eq!(eval("={{ $json.list[3] }}", &payload).unwrap(), Value::Null);
    }

    #[test]
    fn test_interpolation() {
        let payload = json!({"year": 2023, "month": "01"});
        assert_eq!(
            eval("={{ $json.year }}-{{ $json.month }}-01", &payload).unwrap(),
            json!("2023-01-01")
        );
        assert_eq!(eval("=item-{{ $itemIndex }}", &payload).unwrap(), json!("item-5"));
        assert_eq!(eval("=x{{ $json.nope }}y", &payload).unwrap(), json!("xy"));
    }

    #[test]
    fn test_item_index() {
        assert_eq!(eval("={{ $itemIndex }}", &json!({})).unwrap(), json!(5));
    }

    #[test]
    fn test_errors() {
        let payload = json!({});
        assert!(eval("={{ $json.a ", &payload)
            .unwrap_err()
            .to_string()
            .contains("unterminated"));
        assert!(eval("={{ $node.x }}", &payload)
            .unwrap_err()
            .to_string()
            .contains("unsupported expression"));
        assert!(eval("={{ $json.list[x] }}", &payload)
            .unwrap_err()
            .to_string()
            .contains("invalid array index"));
        assert!(eval("={{ $json..a }}", &payload).is_err());
    }

    #[test]
    fn test_text_without_blocks() {
        assert_eq!(eval("=MONTHLY", &json!({})).unwrap(), json!("MONTHLY"));
    }
}
