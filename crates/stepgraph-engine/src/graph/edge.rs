use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stepgraph_core::context::{RunContext, State};
use stepgraph_core::error::{Result, StepGraphError};
use stepgraph_core::traits::Router;

/// Comparison operator of a `Condition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "contains")]
    Contains,
}

impl ConditionOp {
    /// Order matters: two-character operators must be tried before their
    /// one-character prefixes.
    const PARSE_ORDER: [(&'static str, ConditionOp); 7] = [
        ("contains ", ConditionOp::Contains),
        ("!=", ConditionOp::Ne),
        (">=", ConditionOp::Ge),
        ("<=", ConditionOp::Le),
        ("==", ConditionOp::Eq),
        (">", ConditionOp::Gt),
        ("<", ConditionOp::Lt),
    ];
}

/// A predicate over one state key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub op: ConditionOp,
    pub value: Value,
}

impl Condition {
    pub fn new(key: impl Into<String>, op: ConditionOp, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    /// Parse `key OP value` expressions.
    ///
    /// The key is a run of ASCII letters, digits, `_` and `.`; the operator
    /// must follow it directly (whitespace allowed). Supported operators:
    /// `==`, `!=`, `>`, `>=`, `<`, `<=`, `contains`. A quoted value is a
    /// string; otherwise the value is read as JSON (numbers, booleans) and
    /// falls back to a bare string.
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        let invalid = || StepGraphError::InvalidCondition(expr.to_string());

        let key_end = expr
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(expr.len());
        let (key, rest) = expr.split_at(key_end);
        if key.is_empty() {
            return Err(invalid());
        }

        let rest = rest.trim_start();
        let (op, raw) = ConditionOp::PARSE_ORDER
            .iter()
            .find_map(|(token, op)| rest.strip_prefix(token).map(|raw| (*op, raw.trim())))
            .ok_or_else(invalid)?;
        if raw.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(key, op, parse_value(raw)))
    }

    /// Evaluate against a state map. Missing keys and mismatched value kinds
    /// evaluate to `false`.
    pub fn evaluate(&self, state: &State) -> bool {
        let Some(actual) = state.get(&self.key) else {
            return false;
        };

        match self.op {
            ConditionOp::Eq => values_equal(actual, &self.value),
            ConditionOp::Ne => !values_equal(actual, &self.value),
            ConditionOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            ConditionOp::Ge => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ConditionOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            ConditionOp::Le => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            ConditionOp::Contains => match (actual, &self.value) {
                (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
                (Value::Array(items), needle) => {
                    items.iter().any(|item| values_equal(item, needle))
                }
                _ => false,
            },
        }
    }
}

fn parse_value(raw: &str) -> Value {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Numbers compare by value so `90` equals `90.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Router that picks one of two successors from a `Condition`.
#[derive(Debug, Clone)]
pub struct ExprRouter {
    condition: Condition,
    then: String,
    otherwise: String,
}

impl ExprRouter {
    pub fn new(
        condition: Condition,
        then: impl Into<String>,
        otherwise: impl Into<String>,
    ) -> Self {
        Self {
            condition,
            then: then.into(),
            otherwise: otherwise.into(),
        }
    }

    /// Build from a `key OP value` expression.
    pub fn parse(
        expr: &str,
        then: impl Into<String>,
        otherwise: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(Condition::parse(expr)?, then, otherwise))
    }
}

impl Router for ExprRouter {
    fn route(&self, ctx: &mut RunContext) -> Result<String> {
        let target = if self.condition.evaluate(ctx.state()) {
            &self.then
        } else {
            &self.otherwise
        };
        Ok(target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(pairs: &[(&str, Value)]) -> State {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_condition_equals() {
        let s = state(&[("status", json!("success"))]);
        assert!(Condition::parse(r#"status == "success""#).unwrap().evaluate(&s));
        assert!(!Condition::parse(r#"status == "failure""#).unwrap().evaluate(&s));
    }

    #[test]
    fn test_condition_not_equals() {
        let s = state(&[("status", json!("success"))]);
        assert!(Condition::parse(r#"status != "failure""#).unwrap().evaluate(&s));
        assert!(!Condition::parse(r#"status != "success""#).unwrap().evaluate(&s));
    }

    #[test]
    fn test_condition_numeric() {
        let s = state(&[("quality_score", json!(90))]);
        assert!(Condition::parse("quality_score >= 90").unwrap().evaluate(&s));
        assert!(Condition::parse("quality_score == 90.0").unwrap().evaluate(&s));
        assert!(!Condition::parse("quality_score > 90").unwrap().evaluate(&s));
        assert!(Condition::parse("quality_score <= 90").unwrap().evaluate(&s));
        assert!(!Condition::parse("quality_score < 90").unwrap().evaluate(&s));
    }

    #[test]
    fn test_condition_contains() {
        let s = state(&[
            ("output", json!("The file was created successfully.")),
            ("tags", json!(["rust", "graph"])),
        ]);
        assert!(Condition::parse(r#"output contains "created""#).unwrap().evaluate(&s));
        assert!(!Condition::parse(r#"output contains "deleted""#).unwrap().evaluate(&s));
        assert!(Condition::parse(r#"tags contains "graph""#).unwrap().evaluate(&s));
    }

    #[test]
    fn test_condition_bool_value() {
        let s = state(&[("issues_found", json!(true))]);
        let cond = Condition::parse("issues_found == true").unwrap();
        assert_eq!(cond.value, json!(true));
        assert!(cond.evaluate(&s));
    }

    #[test]
    fn test_condition_missing_key() {
        let s = State::new();
        assert!(!Condition::parse(r#"missing == "value""#).unwrap().evaluate(&s));
        assert!(!Condition::parse("missing >= 1").unwrap().evaluate(&s));
    }

    #[test]
    fn test_condition_type_mismatch() {
        let s = state(&[("score", json!("high"))]);
        assert!(!Condition::parse("score >= 90").unwrap().evaluate(&s));
    }

    #[test]
    fn test_operator_inside_quoted_value() {
        let cond = Condition::parse(r#"status == "a != b""#).unwrap();
        assert_eq!(cond.key, "status");
        assert_eq!(cond.op, ConditionOp::Eq);
        assert_eq!(cond.value, json!("a != b"));

        let cond = Condition::parse(r#"label contains ">= 90""#).unwrap();
        assert_eq!(cond.op, ConditionOp::Contains);
        assert_eq!(cond.value, json!(">= 90"));
    }

    #[test]
    fn test_condition_without_spaces() {
        let cond = Condition::parse("review.score>=90").unwrap();
        assert_eq!(cond.key, "review.score");
        assert_eq!(cond.op, ConditionOp::Ge);
        assert_eq!(cond.value, json!(90));
    }

    #[test]
    fn test_condition_invalid_expr() {
        assert!(matches!(
            Condition::parse("this is not valid"),
            Err(StepGraphError::InvalidCondition(_))
        ));
        assert!(Condition::parse(">= 3").is_err());
        assert!(Condition::parse("score >=").is_err());
        assert!(Condition::parse("my key == 1").is_err());
    }

    #[test]
    fn test_expr_router() {
        let router = ExprRouter::parse("quality_score >= 90", "END", "suggest").unwrap();
        let mut ctx = RunContext::new(state(&[("quality_score", json!(42))]));
        assert_eq!(router.route(&mut ctx).unwrap(), "suggest");
        ctx.update("quality_score", 95);
        assert_eq!(router.route(&mut ctx).unwrap(), "END");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let cond = Condition::new("score", ConditionOp::Ge, 90);
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(json["op"], ">=");
        let parsed: Condition = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, cond);
    }
}
