//! Evaluation of value nodes (constants, operators, result sinks) into live variable values.

use crate::foundation::color::parse_hex;
use crate::foundation::ids::NodeId;
use crate::graph::index::{GraphIndex, IndexError};
use crate::graph::node::{BoolOp, CompareOp, MathOp, NodeKind, ValueType};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// Live outputs of every value node. `None` marks an undefined value.
#[derive(Debug, Clone, Default)]
pub struct VariableValues {
    values: HashMap<NodeId, Option<Value>>,
}

impl VariableValues {
    /// Live value of a result node; `None` when undefined or not a value node.
    pub fn get(&self, id: &NodeId) -> Option<&Value> {
        self.values.get(id).and_then(Option::as_ref)
    }
}

/// Evaluate all value nodes in dependency order.
///
/// Only edges leaving value nodes feed operators. A cycle among value nodes is reported with the
/// nodes left unresolved.
pub fn evaluate_variables(index: &GraphIndex) -> Result<VariableValues, IndexError> {
    let nodes = index.nodes();
    let is_value: Vec<bool> = nodes.iter().map(|n| n.is_value_node()).collect();

    let mut indegree = vec![0usize; nodes.len()];
    for e in index.live_edges() {
        if is_value[e.source] && is_value[e.target] {
            indegree[e.target] += 1;
        }
    }

    let mut ready: VecDeque<usize> = (0..nodes.len())
        .filter(|&i| is_value[i] && indegree[i] == 0)
        .collect();
    let mut out: Vec<Option<Option<Value>>> = vec![None; nodes.len()];
    let mut evaluated = 0usize;

    while let Some(i) = ready.pop_front() {
        let inputs = Inputs::collect(index, i, &out);
        out[i] = Some(eval_node(&nodes[i].kind, &inputs));
        evaluated += 1;
        for e in index.outgoing(i) {
            if !is_value[e.target] {
                continue;
            }
            indegree[e.target] -= 1;
            if indegree[e.target] == 0 {
                ready.push_back(e.target);
            }
        }
    }

    let total = is_value.iter().filter(|v| **v).count();
    if evaluated < total {
        let stuck: Vec<NodeId> = (0..nodes.len())
            .filter(|&i| is_value[i] && out[i].is_none())
            .map(|i| nodes[i].id.clone())
            .collect();
        return Err(IndexError::CircularDependency(stuck));
    }

    let values = nodes
        .iter()
        .zip(out)
        .filter_map(|(n, v)| v.map(|v| (n.id.clone(), v)))
        .collect();
    Ok(VariableValues { values })
}

struct Inputs {
    by_port: Vec<(String, Option<Value>)>,
}

impl Inputs {
    fn collect(index: &GraphIndex, i: usize, out: &[Option<Option<Value>>]) -> Self {
        let by_port = index
            .incoming(i)
            .filter(|e| !e.carries_objects)
            .map(|e| {
                let v = out[e.source].clone().flatten();
                (e.def.target_port.as_str().to_owned(), v)
            })
            .collect();
        Self { by_port }
    }

    /// Connected value on `port`, or `None` when the port is unconnected.
    fn port(&self, port: &str) -> Option<Option<&Value>> {
        self.by_port
            .iter()
            .find(|(p, _)| p == port)
            .map(|(_, v)| v.as_ref())
    }

    fn first(&self) -> Option<&Value> {
        self.by_port.first().and_then(|(_, v)| v.as_ref())
    }
}

/// Connected input wins over the node's own fallback value.
fn operand<'a>(inputs: &'a Inputs, port: &str, fallback: Option<&'a Value>) -> Option<&'a Value> {
    match inputs.port(port) {
        Some(connected) => connected,
        None => fallback,
    }
}

fn eval_node(kind: &NodeKind, inputs: &Inputs) -> Option<Value> {
    match kind {
        NodeKind::Constant(c) => Some(c.value.clone()),
        NodeKind::Result(r) => {
            let v = operand(inputs, "value", None).or_else(|| inputs.first())?;
            match r.value_type {
                Some(t) if !matches_type(v, t) => None,
                _ => Some(v.clone()),
            }
        }
        NodeKind::Math(m) => {
            let fa = m.a.map(Value::from);
            let fb = m.b.map(Value::from);
            let a = operand(inputs, "a", fa.as_ref())?.as_f64()?;
            let b = operand(inputs, "b", fb.as_ref())?.as_f64()?;
            let r = match m.op {
                MathOp::Add => a + b,
                MathOp::Sub => a - b,
                MathOp::Mul => a * b,
                MathOp::Div if b == 0.0 => return None,
                MathOp::Div => a / b,
                MathOp::Min => a.min(b),
                MathOp::Max => a.max(b),
            };
            r.is_finite().then(|| Value::from(r))
        }
        NodeKind::Comparison(c) => {
            let a = operand(inputs, "a", c.a.as_ref())?;
            let b = operand(inputs, "b", c.b.as_ref())?;
            compare(c.op, a, b).map(Value::Bool)
        }
        NodeKind::Boolean(bd) => {
            let fa = bd.a.map(Value::Bool);
            let fb = bd.b.map(Value::Bool);
            let a = operand(inputs, "a", fa.as_ref())?.as_bool()?;
            if bd.op == BoolOp::Not {
                return Some(Value::Bool(!a));
            }
            let b = operand(inputs, "b", fb.as_ref())?.as_bool()?;
            Some(Value::Bool(match bd.op {
                BoolOp::And => a && b,
                BoolOp::Or => a || b,
                BoolOp::Xor => a != b,
                BoolOp::Not => !a,
            }))
        }
        _ => None,
    }
}

fn compare(op: CompareOp, a: &Value, b: &Value) -> Option<bool> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return Some(match op {
            CompareOp::Eq => x == y,
            CompareOp::Ne => x != y,
            CompareOp::Lt => x < y,
            CompareOp::Le => x <= y,
            CompareOp::Gt => x > y,
            CompareOp::Ge => x >= y,
        });
    }
    match op {
        CompareOp::Eq => Some(a == b),
        CompareOp::Ne => Some(a != b),
        _ => None,
    }
}

fn matches_type(v: &Value, t: ValueType) -> bool {
    match t {
        ValueType::Number => v.as_f64().is_some_and(f64::is_finite),
        ValueType::Bool => v.is_boolean(),
        ValueType::Color => v.as_str().is_some_and(|s| parse_hex(s).is_ok()),
        ValueType::Text => v.is_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/values.rs"]
mod tests;
