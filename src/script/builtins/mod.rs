//! Native built-in dispatch: ~120 functions grouped by category (mirroring the categories named
//! in spec §4.5), looked up by a binary-searched name table so the parser can bind a `BltinCall`
//! node to its implementation at parse time rather than re-resolving by name on every call.

pub mod family;
pub mod gnode;
pub mod list;
pub mod math;
pub mod person;
pub mod string;

use crate::error::ScriptError;
use crate::node::NodeId;

use super::ast::{BuiltinFn, NodeKind, ProgramNode};
use super::eval::{evaluate, evaluate_family, evaluate_gnode, evaluate_person};
use super::interp::Context;
use super::value::Value;

fn args(node: &ProgramNode) -> &[ProgramNode] {
    match &node.kind {
        NodeKind::BltinCall { args, .. } => args,
        _ => &[],
    }
}

fn arg(node: &ProgramNode, i: usize) -> Option<&ProgramNode> {
    args(node).get(i)
}

/// Evaluates argument `i`, or `Null` if the call was made with fewer arguments than expected
/// (matching the source's permissive arity checking at the builtin level; the parser/resolver
/// already reports true arity mismatches for user functions).
fn eval_arg(node: &ProgramNode, ctx: &mut Context, i: usize) -> Result<Value, ScriptError> {
    match arg(node, i) {
        Some(a) => evaluate(a, ctx),
        None => Ok(Value::Null),
    }
}

fn eval_int(node: &ProgramNode, ctx: &mut Context, i: usize) -> Result<i64, ScriptError> {
    let v = eval_arg(node, ctx, i)?;
    v.as_int()
        .or_else(|| v.as_float().map(|f| f as i64))
        .ok_or_else(|| ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "int"))
}

fn eval_float(node: &ProgramNode, ctx: &mut Context, i: usize) -> Result<f64, ScriptError> {
    let v = eval_arg(node, ctx, i)?;
    v.as_float()
        .ok_or_else(|| ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "number"))
}

fn eval_str(node: &ProgramNode, ctx: &mut Context, i: usize) -> Result<String, ScriptError> {
    let v = eval_arg(node, ctx, i)?;
    match v {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        _ => Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "string")),
    }
}

fn eval_bool(node: &ProgramNode, ctx: &mut Context, i: usize) -> Result<bool, ScriptError> {
    Ok(eval_arg(node, ctx, i)?.is_truthy())
}

fn eval_person_arg(node: &ProgramNode, ctx: &mut Context, i: usize) -> Result<Option<NodeId>, ScriptError> {
    match arg(node, i) {
        Some(a) => evaluate_person(a, ctx),
        None => Ok(None),
    }
}

fn eval_family_arg(node: &ProgramNode, ctx: &mut Context, i: usize) -> Result<Option<NodeId>, ScriptError> {
    match arg(node, i) {
        Some(a) => evaluate_family(a, ctx),
        None => Ok(None),
    }
}

fn eval_gnode_arg(node: &ProgramNode, ctx: &mut Context, i: usize) -> Result<Option<NodeId>, ScriptError> {
    match arg(node, i) {
        Some(a) => evaluate_gnode(a, ctx),
        None => Ok(None),
    }
}

/// Reads argument `i` as a bare identifier's name without evaluating it (for `set`-like
/// builtins that bind rather than read, e.g. `incr`/`decr`).
fn ident_arg(node: &ProgramNode, i: usize) -> Result<String, ScriptError> {
    match arg(node, i).map(|a| &a.kind) {
        Some(NodeKind::Identifier(name)) => Ok(name.clone()),
        _ => Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "identifier")),
    }
}

/// Binds the identifier named by argument 0 (a bare `Identifier` node, not evaluated) to the
/// value of argument 1 in the caller's frame. `set(iden, expr)` is the only builtin whose first
/// argument is read as a name rather than evaluated.
fn set(node: &ProgramNode, ctx: &mut Context) -> Result<Value, ScriptError> {
    let name = match arg(node, 0).map(|a| &a.kind) {
        Some(NodeKind::Identifier(name)) => name.clone(),
        _ => return Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "identifier")),
    };
    let value = eval_arg(node, ctx, 1)?;
    ctx.frame.set(name, value.clone());
    Ok(value)
}

type Entry = (&'static str, BuiltinFn);

/// Sorted by name: keep new entries in alphabetical order, checked by the
/// `table_is_sorted_for_binary_search` test below.
static TABLE: &[Entry] = &[
    ("add", math::add),
    ("addnode", gnode::addnode),
    ("alpha", string::alpha),
    ("and", math::and),
    ("baptism", person::baptism),
    ("birth", person::birth),
    ("burial", person::burial),
    ("capitalize", string::capitalize),
    ("card", string::card),
    ("child", gnode::child),
    ("children", person::children),
    ("concat", string::concat),
    ("createnode", gnode::createnode),
    ("d", string::d),
    ("death", person::death),
    ("decr", math::decr),
    ("deletenode", gnode::deletenode),
    ("div", math::div),
    ("eq", math::eq),
    ("eqstr", string::eqstr),
    ("exp", math::exp),
    ("extractdate", gnode::extractdate),
    ("extractnames", gnode::extractnames),
    ("extractplaces", gnode::extractplaces),
    ("extracttokens", gnode::extracttokens),
    ("f", string::f),
    ("father", person::father),
    ("female", person::female),
    ("firstchild", family::firstchild),
    ("firstfam", family::firstfam),
    ("firstindi", person::firstindi),
    ("fullname", person::fullname),
    ("ge", math::ge),
    ("getrecord", gnode::getrecord),
    ("givens", person::givens),
    ("gt", math::gt),
    ("husband", family::husband),
    ("incr", math::incr),
    ("index", string::index),
    ("key", gnode::key),
    ("lastchild", family::lastchild),
    ("lastfam", family::lastfam),
    ("lastindi", person::lastindi),
    ("le", math::le),
    ("length", list::length),
    ("list", list::list_new),
    ("lower", string::lower),
    ("lt", math::lt),
    ("male", person::male),
    ("marriage", family::marriage),
    ("mod", math::modulo),
    ("mother", person::mother),
    ("mul", math::mul),
    ("name", person::name),
    ("nchildren", person::nchildren),
    ("ne", math::ne),
    ("neg", math::neg),
    ("nestr", string::nestr),
    ("nextfam", family::nextfam),
    ("nextindi", person::nextindi),
    ("nextsib", person::nextsib),
    ("nfamilies", person::nfamilies),
    ("nspouses", person::nspouses),
    ("or", math::or),
    ("ord", string::ord),
    ("parent", gnode::parent),
    ("parents", person::parents),
    ("pn", person::pn),
    ("prevfam", family::prevfam),
    ("previndi", person::previndi),
    ("prevsib", person::prevsib),
    ("push", list::push),
    ("rjustify", string::rjustify),
    ("roman", string::roman),
    ("root", gnode::root),
    ("savenode", gnode::savenode),
    ("set", set),
    ("sex", person::sex),
    ("sibling", gnode::sibling),
    ("soundex", person::soundex_of),
    ("strcmp", string::strcmp),
    ("sub", math::sub),
    ("substring", string::substring),
    ("surname", person::surname),
    ("table", list::table_new),
    ("tag", gnode::tag),
    ("title", family::title),
    ("trim", string::trim),
    ("trimname", person::trimname),
    ("upper", string::upper),
    ("value", gnode::value),
    ("wife", family::wife),
    ("xref", gnode::xref),
];

pub fn lookup_builtin(name: &str) -> Option<BuiltinFn> {
    TABLE.binary_search_by_key(&name, |&(n, _)| n).ok().map(|i| TABLE[i].1)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_for_binary_search() {
        for pair in TABLE.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} should sort before {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn lookup_finds_known_builtin_and_rejects_unknown() {
        assert!(lookup_builtin("add").is_some());
        assert!(lookup_builtin("nonexistent_builtin").is_none());
    }
}
