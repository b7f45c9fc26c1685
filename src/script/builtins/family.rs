//! Family-record built-ins: spouses, children, and event access.

use crate::error::ScriptError;
use crate::sequence::{family_to_children, family_to_fathers, family_to_mothers};

use super::super::ast::ProgramNode;
use super::super::interp::Context;
use super::super::value::Value;
use super::eval_family_arg;

/// The first family in key order, or `Null` if the database has no families.
pub fn firstfam(_node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match ctx.db.families.iter().next().and_then(|key| ctx.db.lookup(key)) {
        Some(id) => Ok(Value::Family(id)),
        None => Ok(Value::Null),
    }
}

/// The last family in key order, or `Null` if the database has no families.
pub fn lastfam(_node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match ctx.db.families.iter().last().and_then(|key| ctx.db.lookup(key)) {
        Some(id) => Ok(Value::Family(id)),
        None => Ok(Value::Null),
    }
}

/// The family immediately following `fam` in key order, or `Null` at the last family.
pub fn nextfam(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_family_arg(node, ctx, 0)? {
        Some(f) => {
            let Some(key) = ctx.db.arena.get(f).key.clone() else { return Ok(Value::Null) };
            let pos = ctx.db.families.iter().position(|k| *k == key);
            match pos.and_then(|i| ctx.db.families.iter().nth(i + 1)).and_then(|k| ctx.db.lookup(k)) {
                Some(id) => Ok(Value::Family(id)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

/// The family immediately preceding `fam` in key order, or `Null` at the first family.
pub fn prevfam(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_family_arg(node, ctx, 0)? {
        Some(f) => {
            let Some(key) = ctx.db.arena.get(f).key.clone() else { return Ok(Value::Null) };
            let pos = ctx.db.families.iter().position(|k| *k == key);
            match pos.and_then(|i| i.checked_sub(1)).and_then(|i| ctx.db.families.iter().nth(i)).and_then(|k| ctx.db.lookup(k)) {
                Some(id) => Ok(Value::Family(id)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

pub fn husband(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_family_arg(node, ctx, 0)? {
        Some(f) => match family_to_fathers(ctx.db, f).iter().next().and_then(|e| ctx.db.lookup(&e.key)) {
            Some(id) => Ok(Value::Person(id)),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

pub fn wife(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_family_arg(node, ctx, 0)? {
        Some(f) => match family_to_mothers(ctx.db, f).iter().next().and_then(|e| ctx.db.lookup(&e.key)) {
            Some(id) => Ok(Value::Person(id)),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

pub fn firstchild(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_family_arg(node, ctx, 0)? {
        Some(f) => match family_to_children(ctx.db, f).iter().next().and_then(|e| ctx.db.lookup(&e.key)) {
            Some(id) => Ok(Value::Person(id)),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

pub fn lastchild(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_family_arg(node, ctx, 0)? {
        Some(f) => match family_to_children(ctx.db, f).iter().last().and_then(|e| ctx.db.lookup(&e.key)) {
            Some(id) => Ok(Value::Person(id)),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

pub fn marriage(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_family_arg(node, ctx, 0)? {
        Some(f) => match ctx.db.arena.find_child(f, "MARR") {
            Some(n) => Ok(Value::GNode(n)),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

/// Works on any record that carries a `TITL` child (families, sources, events).
pub fn title(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match super::eval_gnode_arg(node, ctx, 0)? {
        Some(n) => match ctx.db.arena.find_child(n, "TITL").and_then(|t| ctx.db.arena.get(t).value.clone()) {
            Some(v) => Ok(Value::String(v)),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}
