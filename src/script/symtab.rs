//! Symbol frames and the user-defined function/procedure tables.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::ast::{Block, Ident};
use super::value::Value;

/// One call's local bindings. Lookups never consult an enclosing frame: the language has no
/// lexical nesting beyond a single call's own parameters and locals, matching the source's
/// per-call symbol table.
#[derive(Debug, Default)]
pub struct Frame {
    vars: HashMap<Ident, Value>,
}

impl Frame {
    pub fn new() -> Self {
        Frame { vars: HashMap::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Binds `name` to `value`, replacing and dropping whatever was previously bound (the
    /// previous binding's `Rc` handles, if any, drop here too).
    pub fn set(&mut self, name: impl Into<Ident>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

/// Global (program-lifetime) table of user-defined procedures and functions, resolved once at
/// parse time via [`super::ast::resolve_calls`].
#[derive(Debug, Default)]
pub struct FunctionTable {
    procs: HashMap<Ident, Rc<Block>>,
    /// `RefCell`-wrapped: functions are tied into `FuncCall::body` by
    /// [`super::ast::resolve_calls`] ahead of time, including self- and mutually-recursive
    /// edges, so each definition must be mutable in place while shared.
    funcs: HashMap<Ident, Rc<RefCell<Block>>>,
    globals: Vec<Ident>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable::default()
    }

    pub fn define_proc(&mut self, name: impl Into<Ident>, block: Block) {
        self.procs.insert(name.into(), Rc::new(block));
    }

    pub fn define_func(&mut self, name: impl Into<Ident>, block: Block) {
        self.funcs.insert(name.into(), Rc::new(RefCell::new(block)));
    }

    pub fn declare_global(&mut self, name: impl Into<Ident>) {
        self.globals.push(name.into());
    }

    pub fn procs(&self) -> &HashMap<Ident, Rc<Block>> {
        &self.procs
    }

    pub fn funcs(&self) -> &HashMap<Ident, Rc<RefCell<Block>>> {
        &self.funcs
    }

    pub fn proc(&self, name: &str) -> Option<&Rc<Block>> {
        self.procs.get(name)
    }

    pub fn globals(&self) -> &[Ident] {
        &self.globals
    }

    /// Resolves every `FuncCall` across every stored procedure and function body, against this
    /// table's own functions. Safe with self- or mutually-recursive definitions: a function's
    /// `RefCell` is only borrowed while its own body is walked, so a call back into a function
    /// already on the stack just clones that (still-being-resolved) function's `Rc`.
    pub fn resolve_all(&mut self) -> Vec<crate::error::ScriptError> {
        let mut errors = Vec::new();
        let funcs = self.funcs.clone();
        for block in funcs.values() {
            let mut guard = block.borrow_mut();
            if let Some(body) = &mut guard.body {
                errors.extend(super::ast::resolve_body(body, &funcs));
            }
        }
        for block in self.procs.values_mut() {
            if let Some(inner) = Rc::get_mut(block) {
                if let Some(body) = &mut inner.body {
                    errors.extend(super::ast::resolve_body(body, &funcs));
                }
            }
        }
        errors
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_set_replaces_previous_binding() {
        let mut frame = Frame::new();
        frame.set("x", Value::Int(1));
        frame.set("x", Value::Int(2));
        assert_eq!(frame.get("x").unwrap().as_int(), Some(2));
    }

    #[test]
    fn function_table_separates_procs_and_funcs() {
        let mut table = FunctionTable::new();
        table.define_proc("p", Block { params: vec![], body: None });
        table.define_func("f", Block { params: vec![], body: None });
        assert!(table.proc("p").is_some());
        assert!(table.proc("f").is_none());
        assert!(table.funcs().get("f").is_some());
    }
}
