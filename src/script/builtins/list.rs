//! List and table construction and the shared `length` built-in.

use crate::error::ScriptError;

use super::super::ast::ProgramNode;
use super::super::interp::Context;
use super::super::value::Value;
use super::eval_arg;

pub fn list_new(_node: &ProgramNode, _ctx: &mut Context) -> Result<Value, ScriptError> {
    Ok(Value::new_list())
}

pub fn table_new(_node: &ProgramNode, _ctx: &mut Context) -> Result<Value, ScriptError> {
    Ok(Value::new_table())
}

/// Element count for a list or sequence, character count for a string.
pub fn length(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let v = eval_arg(node, ctx, 0)?;
    match v {
        Value::List(handle) => Ok(Value::Int(handle.borrow().len() as i64)),
        Value::Sequence(handle) => Ok(Value::Int(handle.borrow().len() as i64)),
        Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Null => Ok(Value::Int(0)),
        _ => Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "list, sequence, or string")),
    }
}

/// Appends argument 1's value to the end of the list named by argument 0, returning the pushed
/// value (the list itself, being `Rc`-shared, is mutated in place).
pub fn push(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let list = eval_arg(node, ctx, 0)?;
    let value = eval_arg(node, ctx, 1)?;
    match list {
        Value::List(handle) => {
            handle.borrow_mut().push(value.clone());
            Ok(value)
        }
        _ => Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "list")),
    }
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

    fn loc() -> Loc {
        Loc::new(Rc::from("t.ll"), 1)
    }

    fn call(name: &str, arg_values: Vec<ProgramNode>) -> ProgramNode {
        let func = lookup_builtin(name).unwrap();
        ProgramNode::new(NodeKind::BltinCall { name: name.to_string(), args: arg_values, func }, loc())
    }

    fn ident(name: &str) -> ProgramNode {
        ProgramNode::new(NodeKind::Identifier(name.to_string()), loc())
    }

    #[test]
    fn push_then_length_reflects_mutation() {
        let mut db = Database::new();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let list = evaluate(&call("list", vec![]), &mut ctx).unwrap();
        frame.set("l", list);
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        evaluate(&call("push", vec![ident("l"), ProgramNode::new(NodeKind::IntLiteral(7), loc())]), &mut ctx).unwrap();
        let len = evaluate(&call("length", vec![ident("l")]), &mut ctx).unwrap();
        assert_eq!(len.as_int(), Some(1));
    }

    #[test]
    fn length_of_string_counts_chars() {
        let mut db = Database::new();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let node = call("length", vec![ProgramNode::new(NodeKind::StringLiteral("hello".to_string()), loc())]);
        assert_eq!(evaluate(&node, &mut ctx).unwrap().as_int(), Some(5));
    }
}
