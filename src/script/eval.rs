//! Expression evaluation: the single `evaluate` entry point plus the coercion helpers
//! (`evaluate_boolean`, `evaluate_person`, `evaluate_family`, `evaluate_gnode`) that give every
//! built-in and loop form its null-chaining, type-checked argument access.

use crate::error::ScriptError;
use crate::node::NodeId;

use super::ast::{NodeKind, ProgramNode};
use super::interp::Context;
use super::value::Value;

/// Evaluates a single expression node to a value. Dispatches by variant; user-function calls get
/// a fresh frame and are interpreted recursively.
pub fn evaluate(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match &node.kind {
        NodeKind::IntLiteral(n) => Ok(Value::Int(*n)),
        NodeKind::FloatLiteral(x) => Ok(Value::Float(*x)),
        NodeKind::StringLiteral(s) => Ok(Value::String(s.clone())),
        NodeKind::Identifier(name) => match ctx.frame.get(name) {
            Some(v) => Ok(v.clone()),
            None => Ok(Value::Null),
        },
        NodeKind::BltinCall { func, .. } => func(node, ctx),
        NodeKind::FuncCall { name, args, body } => {
            let block = body.as_ref().ok_or_else(|| {
                ScriptError::undefined(node.loc.file.to_string(), node.loc.line, name)
            })?;
            let mut values: smallvec::SmallVec<[Value; 4]> = smallvec::SmallVec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, ctx)?);
            }
            let guard = block.borrow();
            if values.len() != guard.params.len() {
                return Err(ScriptError::arity(
                    node.loc.file.to_string(),
                    node.loc.line,
                    name,
                    guard.params.len(),
                    guard.params.len(),
                    values.len(),
                ));
            }
            ctx.call_user_function(&guard.params, values.into_vec(), guard.body.as_deref())
        }
        _ => Err(ScriptError::type_error(
            node.loc.file.to_string(),
            node.loc.line,
            "expression",
        )),
    }
}

/// C-style truthiness used by `if`/`while` and every boolean-coercing builtin.
pub fn evaluate_boolean(node: &ProgramNode, ctx: &mut Context) -> Result<bool, ScriptError> {
    Ok(evaluate(node, ctx)?.is_truthy())
}

/// Evaluates `node`, requiring a `Person` value or `Null`. On a non-person, non-null value,
/// yields a type error at `node`'s location rather than the calling loop's.
pub fn evaluate_person(node: &ProgramNode, ctx: &mut Context) -> Result<Option<NodeId>, ScriptError> {
    match evaluate(node, ctx)? {
        Value::Null => Ok(None),
        Value::Person(id) => Ok(Some(id)),
        _ => Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "person")),
    }
}

pub fn evaluate_family(node: &ProgramNode, ctx: &mut Context) -> Result<Option<NodeId>, ScriptError> {
    match evaluate(node, ctx)? {
        Value::Null => Ok(None),
        Value::Family(id) => Ok(Some(id)),
        _ => Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "family")),
    }
}

/// Any of the gnode-shaped variants (including `Person`/`Family`/...) count as a gnode for
/// built-ins that just want a raw tree node (`tag`, `value`, `child`, ...).
pub fn evaluate_gnode(node: &ProgramNode, ctx: &mut Context) -> Result<Option<NodeId>, ScriptError> {
    match evaluate(node, ctx)? {
        Value::Null => Ok(None),
        other => other
            .as_node()
            .map(Some)
            .ok_or_else(|| ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "node")),
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Database;
    use crate::script::ast::Loc;
    use crate::script::interp::Runtime;
    use crate::script::symtab::Frame;
    use std::rc::Rc;

    fn loc() -> Loc {
        Loc::new(Rc::from("t.ll"), 1)
    }

    #[test]
    fn literals_evaluate_to_themselves() {
        let mut db = Database::new();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let node = ProgramNode::new(NodeKind::IntLiteral(7), loc());
        assert_eq!(evaluate(&node, &mut ctx).unwrap().as_int(), Some(7));
    }

    #[test]
    fn unbound_identifier_is_null_not_error() {
        let mut db = Database::new();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let node = ProgramNode::new(NodeKind::Identifier("missing".into()), loc());
        let v = evaluate(&node, &mut ctx).unwrap();
        assert!(matches!(v, Value::Null));
    }

    #[test]
    fn null_propagates_through_person_coercion() {
        let mut db = Database::new();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let node = ProgramNode::new(NodeKind::Identifier("missing".into()), loc());
        assert_eq!(evaluate_person(&node, &mut ctx).unwrap(), None);
    }
}
