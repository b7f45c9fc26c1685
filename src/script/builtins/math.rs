//! Arithmetic, comparison, and boolean built-ins.

use crate::error::ScriptError;

use super::super::ast::ProgramNode;
use super::super::interp::Context;
use super::super::value::Value;
use super::{eval_arg, eval_bool, eval_int, ident_arg};

fn numeric(node: &ProgramNode, ctx: &mut Context) -> Result<(Value, Value), ScriptError> {
    let a = eval_arg(node, ctx, 0)?;
    let b = eval_arg(node, ctx, 1)?;
    if !a.is_numeric() || !b.is_numeric() {
        return Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "number"));
    }
    Ok((a, b))
}

/// Applies `int_op` when both operands are `Int` (reporting overflow on `None`), else promotes
/// both to `Float` and applies `float_op`.
fn arith(
    node: &ProgramNode,
    a: Value,
    b: Value,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, ScriptError> {
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => int_op(*x, *y)
            .map(Value::Int)
            .ok_or_else(|| ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "integer overflow")),
        _ => {
            let x = a.as_float().unwrap_or(0.0);
            let y = b.as_float().unwrap_or(0.0);
            Ok(Value::Float(float_op(x, y)))
        }
    }
}

pub fn add(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let (a, b) = numeric(node, ctx)?;
    arith(node, a, b, i64::checked_add, |x, y| x + y)
}

pub fn sub(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let (a, b) = numeric(node, ctx)?;
    arith(node, a, b, i64::checked_sub, |x, y| x - y)
}

pub fn mul(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let (a, b) = numeric(node, ctx)?;
    arith(node, a, b, i64::checked_mul, |x, y| x * y)
}

pub fn div(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let (a, b) = numeric(node, ctx)?;
    match (&a, &b) {
        (Value::Int(_), Value::Int(0)) => {
            Err(ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "division by zero"))
        }
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x / y)),
        _ => {
            let y = b.as_float().unwrap_or(0.0);
            if y == 0.0 {
                return Err(ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "division by zero"));
            }
            Ok(Value::Float(a.as_float().unwrap_or(0.0) / y))
        }
    }
}

pub fn modulo(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let a = eval_int(node, ctx, 0)?;
    let b = eval_int(node, ctx, 1)?;
    if b == 0 {
        return Err(ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "modulo by zero"));
    }
    Ok(Value::Int(a % b))
}

pub fn exp(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let (a, b) = numeric(node, ctx)?;
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) if *y >= 0 => {
            let exponent = u32::try_from(*y)
                .map_err(|_| ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "exponent too large"))?;
            x.checked_pow(exponent)
                .map(Value::Int)
                .ok_or_else(|| ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "integer overflow"))
        }
        _ => Ok(Value::Float(a.as_float().unwrap_or(0.0).powf(b.as_float().unwrap_or(0.0)))),
    }
}

pub fn neg(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let a = eval_arg(node, ctx, 0)?;
    match a {
        Value::Int(n) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "integer overflow")),
        Value::Float(x) => Ok(Value::Float(-x)),
        _ => Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "number")),
    }
}

fn compare(node: &ProgramNode, ctx: &mut Context) -> Result<std::cmp::Ordering, ScriptError> {
    let (a, b) = numeric(node, ctx)?;
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        _ => {
            let x = a.as_float().unwrap_or(0.0);
            let y = b.as_float().unwrap_or(0.0);
            Ok(x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal))
        }
    }
}

macro_rules! ordering_builtin {
    ($name:ident, $ord:pat) => {
        pub fn $name(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
            Ok(Value::Bool(matches!(compare(node, ctx)?, $ord)))
        }
    };
}

ordering_builtin!(lt, std::cmp::Ordering::Less);
ordering_builtin!(gt, std::cmp::Ordering::Greater);
ordering_builtin!(le, std::cmp::Ordering::Less | std::cmp::Ordering::Equal);
ordering_builtin!(ge, std::cmp::Ordering::Greater | std::cmp::Ordering::Equal);
ordering_builtin!(eq, std::cmp::Ordering::Equal);
ordering_builtin!(ne, std::cmp::Ordering::Less | std::cmp::Ordering::Greater);

pub fn and(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    Ok(Value::Bool(eval_bool(node, ctx, 0)? && eval_bool(node, ctx, 1)?))
}

pub fn or(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    Ok(Value::Bool(eval_bool(node, ctx, 0)? || eval_bool(node, ctx, 1)?))
}

pub fn incr(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let name = ident_arg(node, 0)?;
    let current = ctx.frame.get(&name).and_then(Value::as_int).unwrap_or(0);
    let next = current
        .checked_add(1)
        .ok_or_else(|| ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "integer overflow"))?;
    ctx.frame.set(name, Value::Int(next));
    Ok(Value::Int(next))
}

pub fn decr(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let name = ident_arg(node, 0)?;
    let current = ctx.frame.get(&name).and_then(Value::as_int).unwrap_or(0);
    let next = current
        .checked_sub(1)
        .ok_or_else(|| ScriptError::overflow(node.loc.file.to_string(), node.loc.line, "integer overflow"))?;
    ctx.frame.set(name, Value::Int(next));
    Ok(Value::Int(next))
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Database;
    use crate::script::ast::{Loc, NodeKind};
    use crate::script::builtins::lookup_builtin;
    use crate::script::eval::evaluate;
    use crate::script::interp::Runtime;
    use crate::script::symtab::Frame;
    use std::rc::Rc;

    fn call(name: &str, arg_values: Vec<ProgramNode>) -> ProgramNode {
        let func = lookup_builtin(name).unwrap();
        ProgramNode::new(
            NodeKind::BltinCall { name: name.to_string(), args: arg_values, func },
            Loc::new(Rc::from("t.ll"), 1),
        )
    }

    fn int(n: i64) -> ProgramNode {
        ProgramNode::new(NodeKind::IntLiteral(n), Loc::new(Rc::from("t.ll"), 1))
    }

    fn eval_with_fresh_ctx(node: &ProgramNode) -> Value {
        let mut db = Database::new();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        evaluate(node, &mut ctx).unwrap()
    }

    #[test]
    fn add_promotes_to_float_when_mixed() {
        let call_node = call("add", vec![int(1), ProgramNode::new(NodeKind::FloatLiteral(1.5), Loc::new(Rc::from("t.ll"), 1))]);
        assert_eq!(eval_with_fresh_ctx(&call_node).as_float(), Some(2.5));
    }

    #[test]
    fn div_by_zero_is_overflow_error() {
        let mut db = Database::new();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let call_node = call("div", vec![int(1), int(0)]);
        assert!(evaluate(&call_node, &mut ctx).is_err());
    }

    #[test]
    fn comparisons_match_integer_ordering() {
        assert!(eval_with_fresh_ctx(&call("lt", vec![int(1), int(2)])).is_truthy());
        assert!(eval_with_fresh_ctx(&call("ge", vec![int(2), int(2)])).is_truthy());
        assert!(!eval_with_fresh_ctx(&call("eq", vec![int(2), int(3)])).is_truthy());
    }
}
