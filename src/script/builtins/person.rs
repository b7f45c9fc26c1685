//! Person-record built-ins: names, sex, and single-step relational navigation.

use crate::error::ScriptError;
use crate::node::NodeId;
use crate::sequence::{person_to_children, person_to_families, person_to_fathers, person_to_mothers, person_to_spouses};
use crate::text::{soundex, split_name};

use super::super::ast::ProgramNode;
use super::super::interp::Context;
use super::super::value::Value;
use super::{eval_int, eval_person_arg, eval_str};

fn first_name_value(ctx: &Context, person: NodeId) -> Option<String> {
    ctx.db.arena.find_child(person, "NAME").and_then(|n| ctx.db.arena.get(n).value.clone())
}

fn sex_tag(ctx: &Context, person: NodeId) -> Option<String> {
    ctx.db.arena.find_child(person, "SEX").and_then(|n| ctx.db.arena.get(n).value.clone())
}

pub fn name(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(first_name_value(ctx, p).map(Value::String).unwrap_or(Value::Null)),
        None => Ok(Value::Null),
    }
}

/// `"Given Surname"` with the GEDCOM slashes stripped, matching `fullname()`'s plain-text form.
pub fn fullname(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => match first_name_value(ctx, p) {
            Some(raw) => {
                let (given, surname) = split_name(&raw);
                let joined = [given, surname].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");
                Ok(Value::String(joined))
            }
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

pub fn givens(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => match first_name_value(ctx, p) {
            Some(raw) => Ok(Value::String(split_name(&raw).0.to_string())),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

pub fn surname(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => match first_name_value(ctx, p) {
            Some(raw) => Ok(Value::String(split_name(&raw).1.to_string())),
            None => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

/// `trimname(indi, length)`: the full name, truncated to at most `length` characters.
pub fn trimname(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let full = fullname(node, ctx)?;
    let max = eval_int(node, ctx, 1)?.max(0) as usize;
    match full {
        Value::String(s) => Ok(Value::String(s.chars().take(max).collect())),
        other => Ok(other),
    }
}

pub fn sex(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(Value::String(sex_tag(ctx, p).unwrap_or_else(|| "U".to_string()))),
        None => Ok(Value::Null),
    }
}

pub fn male(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(Value::Bool(sex_tag(ctx, p).as_deref() == Some("M"))),
        None => Ok(Value::Bool(false)),
    }
}

pub fn female(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(Value::Bool(sex_tag(ctx, p).as_deref() == Some("F"))),
        None => Ok(Value::Bool(false)),
    }
}

/// Selects a pronoun by sex and grammatical case (`0`: he/she, `1`: him/her, `2`: his/her, `3`:
/// He/She); unknown sex falls back to "they" forms.
pub fn pn(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let person = eval_person_arg(node, ctx, 0)?;
    let case = eval_int(node, ctx, 1).unwrap_or(0);
    let sex = person.and_then(|p| sex_tag(ctx, p));
    let word = match (sex.as_deref(), case) {
        (Some("M"), 0) => "he",
        (Some("M"), 1) => "him",
        (Some("M"), 2) => "his",
        (Some("M"), 3) => "He",
        (Some("F"), 0) => "she",
        (Some("F"), 1) => "her",
        (Some("F"), 2) => "her",
        (Some("F"), 3) => "She",
        (_, 0) => "they",
        (_, 1) => "them",
        (_, 2) => "their",
        (_, 3) => "They",
        _ => "they",
    };
    Ok(Value::String(word.to_string()))
}

fn first_event(ctx: &Context, person: NodeId, tag: &str) -> Value {
    match ctx.db.arena.find_child(person, tag) {
        Some(n) => Value::GNode(n),
        None => Value::Null,
    }
}

pub fn birth(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(first_event(ctx, p, "BIRT")),
        None => Ok(Value::Null),
    }
}

pub fn death(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(first_event(ctx, p, "DEAT")),
        None => Ok(Value::Null),
    }
}

pub fn baptism(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(first_event(ctx, p, "BAPM")),
        None => Ok(Value::Null),
    }
}

pub fn burial(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(first_event(ctx, p, "BURI")),
        None => Ok(Value::Null),
    }
}

pub fn father(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => {
            let fathers = person_to_fathers(ctx.db, p);
            match fathers.iter().next().and_then(|e| ctx.db.lookup(&e.key)) {
                Some(id) => Ok(Value::Person(id)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

pub fn mother(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => {
            let mothers = person_to_mothers(ctx.db, p);
            match mothers.iter().next().and_then(|e| ctx.db.lookup(&e.key)) {
                Some(id) => Ok(Value::Person(id)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

/// The first family in which the person is a child (`FAMC`), as a `Family` value.
pub fn parents(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => {
            let fams = person_to_families(ctx.db, p, false);
            match fams.iter().next().and_then(|e| ctx.db.lookup(&e.key)) {
                Some(id) => Ok(Value::Family(id)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

pub fn nchildren(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(Value::Int(person_to_children(ctx.db, p).len() as i64)),
        None => Ok(Value::Int(0)),
    }
}

pub fn nfamilies(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(Value::Int(person_to_families(ctx.db, p, true).len() as i64)),
        None => Ok(Value::Int(0)),
    }
}

pub fn nspouses(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(Value::Int(person_to_spouses(ctx.db, p).map(|s| s.len()).unwrap_or(0) as i64)),
        None => Ok(Value::Int(0)),
    }
}

/// The ordered list of a person's siblings by their shared first `FAMC` family, in document
/// order (not key order), needed so `nextsib`/`prevsib` reflect birth-order position.
fn sibling_list(ctx: &Context, person: NodeId) -> Vec<NodeId> {
    let Some(fam) = ctx.db.arena.find_child(person, "FAMC").and_then(|n| {
        ctx.db.arena.get(n).value.as_deref().and_then(|v| ctx.db.lookup(&crate::node::Key::new(v)))
    }) else {
        return Vec::new();
    };
    ctx.db
        .arena
        .find_children(fam, "CHIL")
        .filter_map(|n| ctx.db.arena.get(n).value.as_deref())
        .filter_map(|v| ctx.db.lookup(&crate::node::Key::new(v)))
        .collect()
}

/// The Sequence of a person's own children across all `FAMS` families, as a script-level
/// sequence value (distinct from `nchildren`'s count).
pub fn children(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => Ok(Value::new_sequence(person_to_children(ctx.db, p))),
        None => Ok(Value::Null),
    }
}

/// The first person in key order, or `Null` if the database has no persons.
pub fn firstindi(_node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match ctx.db.persons.iter().next().and_then(|key| ctx.db.lookup(key)) {
        Some(id) => Ok(Value::Person(id)),
        None => Ok(Value::Null),
    }
}

/// The last person in key order, or `Null` if the database has no persons.
pub fn lastindi(_node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match ctx.db.persons.iter().last().and_then(|key| ctx.db.lookup(key)) {
        Some(id) => Ok(Value::Person(id)),
        None => Ok(Value::Null),
    }
}

/// The person immediately following `indi` in key order, or `Null` at the last person.
pub fn nextindi(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => {
            let Some(key) = ctx.db.arena.get(p).key.clone() else { return Ok(Value::Null) };
            let pos = ctx.db.persons.iter().position(|k| *k == key);
            match pos.and_then(|i| ctx.db.persons.iter().nth(i + 1)).and_then(|k| ctx.db.lookup(k)) {
                Some(id) => Ok(Value::Person(id)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

/// The person immediately preceding `indi` in key order, or `Null` at the first person.
pub fn previndi(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => {
            let Some(key) = ctx.db.arena.get(p).key.clone() else { return Ok(Value::Null) };
            let pos = ctx.db.persons.iter().position(|k| *k == key);
            match pos.and_then(|i| i.checked_sub(1)).and_then(|i| ctx.db.persons.iter().nth(i)).and_then(|k| ctx.db.lookup(k)) {
                Some(id) => Ok(Value::Person(id)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

pub fn nextsib(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => {
            let sibs = sibling_list(ctx, p);
            let pos = sibs.iter().position(|&s| s.0 == p.0);
            match pos.and_then(|i| sibs.get(i + 1)) {
                Some(&next) => Ok(Value::Person(next)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

pub fn prevsib(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    match eval_person_arg(node, ctx, 0)? {
        Some(p) => {
            let sibs = sibling_list(ctx, p);
            let pos = sibs.iter().position(|&s| s.0 == p.0);
            match pos.and_then(|i| i.checked_sub(1)).and_then(|i| sibs.get(i)) {
                Some(&prev) => Ok(Value::Person(prev)),
                None => Ok(Value::Null),
            }
        }
        None => Ok(Value::Null),
    }
}

/// American Soundex of a name string (not a person reference: matches the source's plain
/// string-in, string-out `soundex()`).
pub fn soundex_of(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let raw = eval_str(node, ctx, 0)?;
    Ok(Value::String(soundex(&raw)))
}
