//! Raw node-tree built-ins: tag/value/structural access, record lookup, and node construction.

use crate::error::ScriptError;
use crate::node::{Key, NodeId, RecordType};

use super::super::ast::ProgramNode;
use super::super::interp::Context;
use super::super::value::Value;
use super::{eval_arg, eval_gnode_arg, eval_str, ident_arg};

fn record_value(ctx: &Context, id: NodeId) -> Value {
    match ctx.db.arena.get(id).record_type() {
        RecordType::Person => Value::Person(id),
        RecordType::Family => Value::Family(id),
        RecordType::Source => Value::Source(id),
        RecordType::Event => Value::Event(id),
        _ => Value::GNode(id),
    }
}

pub fn tag(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => Ok(Value::String(ctx.db.arena.get(n).tag.clone())),
        None => Ok(Value::Null),
    }
}

pub fn value(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => Ok(ctx.db.arena.get(n).value.clone().map(Value::String).unwrap_or(Value::Null)),
        None => Ok(Value::Null),
    }
}

pub fn child(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => Ok(ctx.db.arena.get(n).child.map(|c| record_value(ctx, c)).unwrap_or(Value::Null)),
        None => Ok(Value::Null),
    }
}

pub fn sibling(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => Ok(ctx.db.arena.get(n).sibling.map(|s| record_value(ctx, s)).unwrap_or(Value::Null)),
        None => Ok(Value::Null),
    }
}

pub fn parent(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => Ok(ctx.db.arena.get(n).parent.map(|p| record_value(ctx, p)).unwrap_or(Value::Null)),
        None => Ok(Value::Null),
    }
}

pub fn root(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => Ok(ctx.db.arena.root_of(n).map(|r| record_value(ctx, r)).unwrap_or(Value::Null)),
        None => Ok(Value::Null),
    }
}

/// The record key without `@` delimiters (`key(indi)` -> `"I1"`); `Null` for non-root nodes.
pub fn key(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => match &ctx.db.arena.get(n).key {
            Some(k) => Ok(Value::String(k.as_str().trim_matches('@').to_string())),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

/// The full cross-reference string (`xref(indi)` -> `"@I1@"`).
pub fn xref(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => match &ctx.db.arena.get(n).key {
            Some(k) => Ok(Value::String(k.as_str().to_string())),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

/// `getrecord(xref)`: looks up any record (person, family, source, event, or other) by its raw
/// cross-reference string, typed by its tag the way [`record_value`] types relational results.
pub fn getrecord(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let xref = eval_str(node, ctx, 0)?;
    match ctx.db.lookup(&Key::new(xref)) {
        Some(id) => Ok(record_value(ctx, id)),
        None => Ok(Value::Null),
    }
}

/// Allocates a new, detached node with the given tag and value; not linked into any tree and not
/// filed in any index until a caller attaches it (matching the source's `create_node`).
pub fn createnode(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let tag = eval_str(node, ctx, 0)?;
    let val = eval_str(node, ctx, 1).ok().filter(|s| !s.is_empty());
    let id = ctx.db.arena.alloc(None, tag, val);
    Ok(Value::GNode(id))
}

/// Links an already-allocated, detached node into the tree under `parent`, after `prevSibling` if
/// given, else as `parent`'s new first child. Matches `createnode`'s "allocate first, attach
/// later" split.
pub fn addnode(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let child = eval_gnode_arg(node, ctx, 0)?
        .ok_or_else(|| ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "node"))?;
    let parent = eval_gnode_arg(node, ctx, 1)?
        .ok_or_else(|| ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "node"))?;
    let prev_sibling = eval_gnode_arg(node, ctx, 2)?;
    ctx.db.arena.add_node_after(child, parent, prev_sibling);
    Ok(Value::Null)
}

/// Detaches `node` from its parent's child list. Refuses (and returns `false`) for a record root.
pub fn deletenode(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => Ok(Value::Bool(ctx.db.arena.delete_node(n))),
        None => Ok(Value::Bool(false)),
    }
}

/// Deep-copies the subtree rooted at `node`; the copy is detached and independently mutable.
pub fn savenode(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_gnode_arg(node, ctx, 0)? {
        Some(n) => Ok(Value::GNode(ctx.db.arena.deep_copy(n))),
        None => Ok(Value::Null),
    }
}

const MONTHS: &[&str] = &["JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC"];

/// Splits a plain GEDCOM date phrase (`"1 JAN 1900"`, `"JAN 1900"`, `"1900"`) into
/// `(day, month, year)`, each `0` if absent or not recognized. No calendar system, qualifier
/// (`ABT`/`BEF`/`AFT`), or date-range handling is implemented; callers get the first parseable
/// day/month/year triple in the phrase.
fn split_gedcom_date(raw: &str) -> (i64, i64, i64) {
    let (mut day, mut month, mut year) = (0i64, 0i64, 0i64);
    for token in raw.split_whitespace() {
        if let Some(pos) = MONTHS.iter().position(|m| m.eq_ignore_ascii_case(token)) {
            month = pos as i64 + 1;
        } else if let Ok(n) = token.parse::<i64>() {
            if n > 31 || year != 0 {
                year = n;
            } else {
                day = n;
            }
        }
    }
    (day, month, year)
}

/// `extractdate(event, dayIdent, moIdent, yrIdent)`: parses the event's (or `DATE` node's own)
/// date phrase and binds the day, month, and year into the caller's three identifier arguments.
/// Always returns `Null`; an absent or empty date phrase leaves the identifiers unbound (matching
/// the source's "not considered an error" early return).
pub fn extractdate(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let Some(n) = eval_gnode_arg(node, ctx, 0)? else {
        return Ok(Value::Null);
    };
    let day_ident = ident_arg(node, 1)?;
    let mo_ident = ident_arg(node, 2)?;
    let yr_ident = ident_arg(node, 3)?;

    let date_node = ctx.db.arena.get(n);
    let raw = if date_node.tag == "DATE" {
        date_node.value.clone()
    } else {
        ctx.db.arena.find_child(n, "DATE").and_then(|d| ctx.db.arena.get(d).value.clone())
    };
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(Value::Null);
    };

    let (day, month, year) = split_gedcom_date(&raw);
    ctx.frame.set(day_ident, Value::Int(day));
    ctx.frame.set(mo_ident, Value::Int(month));
    ctx.frame.set(yr_ident, Value::Int(year));
    Ok(Value::Null)
}

/// `extractplaces(PLAC, listIdent, countIdent)`: splits a `PLAC` child's (or `node` itself, if
/// it's already the `PLAC` node) comma-separated jurisdictions into the list named by
/// `listIdent` (cleared first, then refilled), most specific first, and binds the jurisdiction
/// count into `countIdent`. Always returns `Null`.
pub fn extractplaces(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let Some(n) = eval_gnode_arg(node, ctx, 0)? else {
        return Ok(Value::Null);
    };
    let list_value = eval_arg(node, ctx, 1)?;
    let Value::List(handle) = list_value else {
        return Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "list"));
    };
    let count_ident = ident_arg(node, 2)?;

    let place_node = ctx.db.arena.get(n);
    let raw = if place_node.tag == "PLAC" {
        place_node.value.clone()
    } else {
        ctx.db.arena.find_child(n, "PLAC").and_then(|p| ctx.db.arena.get(p).value.clone())
    };

    let mut items = handle.borrow_mut();
    items.clear();
    if let Some(raw) = raw.filter(|s| !s.is_empty()) {
        for part in raw.split(',') {
            items.push(Value::String(part.trim().to_string()));
        }
    }
    let count = items.len() as i64;
    drop(items);
    ctx.frame.set(count_ident, Value::Int(count));
    Ok(Value::Null)
}

/// `extracttokens(str, listIdent, countIdent, delim)`: splits `str` on any character of `delim`
/// into the list bound to `listIdent` (cleared first, then refilled), and binds the token count
/// into `countIdent`. Always returns `Null`.
pub fn extracttokens(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let raw = eval_str(node, ctx, 0)?;
    let list_value = eval_arg(node, ctx, 1)?;
    let Value::List(handle) = list_value else {
        return Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "list"));
    };
    let count_ident = ident_arg(node, 2)?;
    let delim = eval_str(node, ctx, 3)?;

    let mut items = handle.borrow_mut();
    items.clear();
    if !delim.is_empty() {
        for part in raw.split(|c| delim.contains(c)).filter(|s| !s.is_empty()) {
            items.push(Value::String(part.to_string()));
        }
    }
    let count = items.len() as i64;
    drop(items);
    ctx.frame.set(count_ident, Value::Int(count));
    Ok(Value::Null)
}

/// `extractnames(NAME, listIdent, lenIdent, surIdent)`: splits a `NAME`-shaped node's value into
/// `[given, surname]` in the list bound to `listIdent` (cleared first), binding the list's length
/// into `lenIdent` and the surname's starting index (1-based, `0` if there's no surname) into
/// `surIdent`. Always returns `Null`.
pub fn extractnames(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let Some(n) = eval_gnode_arg(node, ctx, 0)? else {
        return Ok(Value::Null);
    };
    let list_value = eval_arg(node, ctx, 1)?;
    let Value::List(handle) = list_value else {
        return Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "list"));
    };
    let len_ident = ident_arg(node, 2)?;
    let sur_ident = ident_arg(node, 3)?;

    let raw = ctx.db.arena.get(n).value.clone();
    let mut items = handle.borrow_mut();
    items.clear();
    let sur_index = match raw.filter(|s| !s.is_empty()) {
        Some(raw) => {
            let (given, surname) = crate::text::split_name(&raw);
            items.push(Value::String(given.to_string()));
            items.push(Value::String(surname.to_string()));
            if surname.is_empty() { 0 } else { 2 }
        }
        None => 0,
    };
    let len = items.len() as i64;
    drop(items);
    ctx.frame.set(len_ident, Value::Int(len));
    ctx.frame.set(sur_ident, Value::Int(sur_index));
    Ok(Value::Null)
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

    fn str_lit(s: &str) -> ProgramNode {
        ProgramNode::new(NodeKind::StringLiteral(s.to_string()), loc())
    }

    #[test]
    fn createnode_then_tag_and_value_round_trip() {
        let mut db = Database::new();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let created = call("createnode", vec![str_lit("NOTE"), str_lit("hello")]);
        let v = evaluate(&created, &mut ctx).unwrap();
        let id = v.as_node().unwrap();
        frame.set("n", v);
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let tag_call = call("tag", vec![ProgramNode::new(NodeKind::Identifier("n".to_string()), loc())]);
        assert_eq!(evaluate(&tag_call, &mut ctx).unwrap().as_str(), Some("NOTE"));
        assert_eq!(ctx.db.arena.get(id).value.as_deref(), Some("hello"));
    }

    #[test]
    fn deletenode_refuses_roots() {
        use crate::node::Key;
        let mut db = Database::new();
        let root = db.arena.alloc(Some(Key::new("@I1@")), "INDI", None);
        db.register_root(root).unwrap();
        let mut runtime = Runtime::new();
        let mut frame = Frame::new();
        frame.set("n", Value::Person(root));
        let mut ctx = Context { db: &mut db, frame: &mut frame, runtime: &mut runtime };
        let node = call("deletenode", vec![ProgramNode::new(NodeKind::Identifier("n".to_string()), loc())]);
        assert!(!evaluate(&node, &mut ctx).unwrap().is_truthy());
    }
}
