//! The statement interpreter: `Runtime` (replacing the source's global tables), `Context` (one
//! call's view onto the database, its frame, and the runtime), and `interpret`, which walks a
//! `next`-chain of statements and threads `Signal` through every control-flow form.

use crate::error::{Error, ScriptError, ScriptErrorKind};
use crate::index::Database;
use crate::node::{Key, NodeId};
use crate::sequence;

use super::ast::{Block, Ident, LoopNode, NodeKind, ProgramNode};
use super::eval::{evaluate, evaluate_family, evaluate_gnode, evaluate_person};
use super::symtab::{Frame, FunctionTable};
use super::value::Value;

/// How a statement (or a chain of them) completed.
#[derive(Debug, Clone)]
pub enum Signal {
    Okay,
    Break,
    Continue,
    Return(Value),
}

pub type InterpResult = Result<Signal, ScriptError>;

/// Owns everything that used to be process-global: the user function/procedure table, the output
/// sink, the call-depth counter, and the accumulated error log from parsing.
pub struct Runtime {
    pub funcs: FunctionTable,
    pub output: String,
    pub max_call_depth: usize,
    call_depth: usize,
    pub error_log: Vec<ScriptError>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            funcs: FunctionTable::new(),
            output: String::new(),
            max_call_depth: 1000,
            call_depth: 0,
            error_log: Vec::new(),
        }
    }

    pub fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }
}

/// One call's working state: the database being queried (mutably, since `createnode`/`addnode`/
/// `deletenode` mutate the arena), the current frame, and the shared runtime.
pub struct Context<'a> {
    pub db: &'a mut Database,
    pub frame: &'a mut Frame,
    pub runtime: &'a mut Runtime,
}

impl<'a> Context<'a> {
    /// Calls a user-defined function: binds `values` to `params` in a fresh frame, checks the
    /// configurable recursion depth, interprets `body`, and unwraps `Return`/`Okay` into a value
    /// per spec (`Return` yields the returned value, `Okay` yields `Null`).
    pub fn call_user_function(
        &mut self,
        params: &[super::ast::Param],
        values: Vec<Value>,
        body: Option<&ProgramNode>,
    ) -> Result<Value, ScriptError> {
        if self.runtime.call_depth >= self.runtime.max_call_depth {
            return Err(ScriptError::overflow(
                "<call>",
                0,
                format!("call depth exceeded {}", self.runtime.max_call_depth),
            ));
        }
        self.runtime.call_depth += 1;
        let mut callee_frame = Frame::new();
        for (param, value) in params.iter().zip(values) {
            callee_frame.set(param.name.clone(), value);
        }
        let mut callee_ctx = Context { db: &mut *self.db, frame: &mut callee_frame, runtime: &mut *self.runtime };
        let result = match body {
            Some(stmt) => interpret(stmt, &mut callee_ctx),
            None => Ok(Signal::Okay),
        };
        self.runtime.call_depth -= 1;
        match result? {
            Signal::Return(v) => Ok(v),
            _ => Ok(Value::Null),
        }
    }

    /// Calls a user-defined procedure, per spec: `Return` becomes `Okay` at the call site,
    /// anything else non-`Okay` becomes an `Error`.
    pub fn call_procedure(&mut self, block: &Block, values: Vec<Value>) -> InterpResult {
        if self.runtime.call_depth >= self.runtime.max_call_depth {
            return Err(ScriptError::overflow(
                "<call>",
                0,
                format!("call depth exceeded {}", self.runtime.max_call_depth),
            ));
        }
        self.runtime.call_depth += 1;
        let mut callee_frame = Frame::new();
        for (param, value) in block.params.iter().zip(values) {
            callee_frame.set(param.name.clone(), value);
        }
        let mut callee_ctx = Context { db: &mut *self.db, frame: &mut callee_frame, runtime: &mut *self.runtime };
        let result = match &block.body {
            Some(stmt) => interpret(stmt, &mut callee_ctx),
            None => Ok(Signal::Okay),
        };
        self.runtime.call_depth -= 1;
        match result? {
            Signal::Break | Signal::Continue => {
                Err(ScriptError::new(ScriptErrorKind::Type, "<call>", 0, "break/continue outside a loop"))
            }
            Signal::Return(_) | Signal::Okay => Ok(Signal::Okay),
        }
    }
}

/// Interprets `stmt` and every statement chained after it via `next`. Top-level string values
/// print themselves; top-level int/float values are ignored (per spec, a "report script" writes
/// output purely by evaluating to a string at statement position).
pub fn interpret(stmt: &ProgramNode, ctx: &mut Context) -> InterpResult {
    let mut cur = Some(stmt);
    while let Some(node) = cur {
        match interpret_one(node, ctx)? {
            Signal::Okay => {}
            other => return Ok(other),
        }
        cur = node.next.as_deref();
    }
    Ok(Signal::Okay)
}

fn interpret_one(node: &ProgramNode, ctx: &mut Context) -> InterpResult {
    match &node.kind {
        NodeKind::IntLiteral(_) | NodeKind::FloatLiteral(_) => Ok(Signal::Okay),
        NodeKind::StringLiteral(s) => {
            ctx.runtime.print(s);
            Ok(Signal::Okay)
        }
        NodeKind::Identifier(_) | NodeKind::BltinCall { .. } | NodeKind::FuncCall { .. } => {
            let value = evaluate(node, ctx)?;
            if let Value::String(s) = &value {
                ctx.runtime.print(s);
            }
            Ok(Signal::Okay)
        }
        NodeKind::Break => Ok(Signal::Break),
        NodeKind::Continue => Ok(Signal::Continue),
        NodeKind::Return(expr) => {
            let value = match expr {
                Some(e) => evaluate(e, ctx)?,
                None => Value::Null,
            };
            Ok(Signal::Return(value))
        }
        NodeKind::If { cond_ident, cond_expr, then_stmts, else_stmts } => {
            let truthy = evaluate_conditional(cond_ident, cond_expr, ctx)?;
            match (truthy, then_stmts, else_stmts) {
                (true, Some(s), _) => interpret(s, ctx),
                (false, _, Some(s)) => interpret(s, ctx),
                _ => Ok(Signal::Okay),
            }
        }
        NodeKind::While { cond_ident, cond_expr, body_stmts } => {
            loop {
                if !evaluate_conditional(cond_ident, cond_expr, ctx)? {
                    return Ok(Signal::Okay);
                }
                if let Some(body) = body_stmts {
                    match interpret(body, ctx)? {
                        Signal::Okay | Signal::Continue => {}
                        Signal::Break => return Ok(Signal::Okay),
                        other @ Signal::Return(_) => return Ok(other),
                    }
                }
            }
        }
        NodeKind::ProcDef { .. } | NodeKind::FuncDef { .. } => Ok(Signal::Okay),
        NodeKind::ProcCall { name, args } => {
            let block = ctx
                .runtime
                .funcs
                .proc(name)
                .cloned()
                .ok_or_else(|| ScriptError::undefined(node.loc.file.to_string(), node.loc.line, name))?;
            if args.len() != block.params.len() {
                return Err(ScriptError::arity(
                    node.loc.file.to_string(),
                    node.loc.line,
                    name,
                    block.params.len(),
                    block.params.len(),
                    args.len(),
                ));
            }
            let mut values: smallvec::SmallVec<[Value; 4]> = smallvec::SmallVec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, ctx)?);
            }
            ctx.call_procedure(&block, values.into_vec())
        }
        NodeKind::TraverseLoop { gnode_expr, gnode_ident, level_ident, body_stmts } => {
            interpret_traverse(node, gnode_expr, gnode_ident, level_ident, body_stmts, ctx)
        }
        NodeKind::NodesLoop(l) => interpret_nodes_loop(node, l, ctx),
        NodeKind::ChildrenLoop(l) => interpret_children_loop(node, l, ctx),
        NodeKind::SpousesLoop(l) => interpret_spouses_loop(node, l, ctx),
        NodeKind::FamiliesLoop(l) => interpret_families_loop(node, l, ctx),
        NodeKind::FathersLoop(l) => interpret_parent_loop(node, l, ctx, true),
        NodeKind::MothersLoop(l) => interpret_parent_loop(node, l, ctx, false),
        NodeKind::FamsAsChildLoop(l) => interpret_famc_loop(node, l, ctx),
        NodeKind::AllPersonsLoop(l) => interpret_root_list_loop(node, l, ctx, RootKind::Person),
        NodeKind::AllFamiliesLoop(l) => interpret_root_list_loop(node, l, ctx, RootKind::Family),
        NodeKind::AllSourcesLoop(l) => interpret_root_list_loop(node, l, ctx, RootKind::Source),
        NodeKind::AllEventsLoop(l) => interpret_root_list_loop(node, l, ctx, RootKind::Event),
        NodeKind::AllOthersLoop(l) => interpret_root_list_loop(node, l, ctx, RootKind::Other),
        NodeKind::ListLoop(l) => interpret_list_loop(node, l, ctx),
        NodeKind::SequenceLoop(l) => interpret_sequence_loop(node, l, ctx),
        NodeKind::NotesLoop(l) => interpret_notes_loop(node, l, ctx),
    }
}

/// Two-form conditional: `(expr)` or `(ident, expr)`, the latter binding the expression's value
/// before coercing, the language's "if-let" idiom.
fn evaluate_conditional(
    cond_ident: &Option<Ident>,
    cond_expr: &ProgramNode,
    ctx: &mut Context,
) -> Result<bool, ScriptError> {
    let value = evaluate(cond_expr, ctx)?;
    if let Some(name) = cond_ident {
        let truthy = value.is_truthy();
        ctx.frame.set(name.clone(), value);
        Ok(truthy)
    } else {
        Ok(value.is_truthy())
    }
}

/// Runs `body` once per step; `Break` ends the loop as `Okay`, `Continue`/`Okay` advance,
/// `Return`/`Error` propagate outward immediately.
fn run_loop_body(body: Option<&ProgramNode>, ctx: &mut Context) -> Result<LoopStep, ScriptError> {
    let Some(body) = body else {
        return Ok(LoopStep::Continue);
    };
    match interpret(body, ctx)? {
        Signal::Okay | Signal::Continue => Ok(LoopStep::Continue),
        Signal::Break => Ok(LoopStep::Break),
        Signal::Return(v) => Ok(LoopStep::Return(v)),
    }
}

enum LoopStep {
    Continue,
    Break,
    Return(Value),
}

fn interpret_traverse(
    node: &ProgramNode,
    gnode_expr: &ProgramNode,
    gnode_ident: &Ident,
    level_ident: &Ident,
    body_stmts: &Option<Box<ProgramNode>>,
    ctx: &mut Context,
) -> InterpResult {
    let Some(start) = evaluate_gnode(gnode_expr, ctx)? else {
        return Ok(Signal::Okay);
    };
    let Some(order) = ctx.db.arena.traverse(start) else {
        return Err(ScriptError::overflow(
            node.loc.file.to_string(),
            node.loc.line,
            "traverse exceeded maximum depth",
        ));
    };
    for (id, depth) in order {
        ctx.frame.set(gnode_ident.clone(), Value::GNode(id));
        ctx.frame.set(level_ident.clone(), Value::Int(depth as i64));
        match run_loop_body(body_stmts.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    Ok(Signal::Okay)
}

fn interpret_nodes_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context) -> InterpResult {
    let expr = l.expr.as_deref().expect("NodesLoop always carries an expr");
    let Some(start) = evaluate_gnode(expr, ctx)? else {
        return Ok(Signal::Okay);
    };
    let gnode_ident = &l.idents[0];
    let children: Vec<NodeId> = ctx.db.arena.children(start).collect();
    for child in children {
        ctx.frame.set(gnode_ident.clone(), Value::GNode(child));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    let _ = node;
    Ok(Signal::Okay)
}

fn interpret_children_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context) -> InterpResult {
    let expr = l.expr.as_deref().expect("ChildrenLoop always carries an expr");
    let Some(family) = evaluate_family(expr, ctx)? else {
        return Ok(Signal::Okay);
    };
    let (child_ident, count_ident) = (&l.idents[0], &l.idents[1]);
    let children: Vec<NodeId> = ctx.db.arena.find_children(family, "CHIL").collect();
    for (i, child_tag) in children.into_iter().enumerate() {
        let Some(value) = ctx.db.arena.get(child_tag).value.clone() else { continue };
        let Some(child) = ctx.db.lookup(&Key::new(value)) else { continue };
        ctx.frame.set(child_ident.clone(), Value::Person(child));
        ctx.frame.set(count_ident.clone(), Value::Int(i as i64 + 1));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    let _ = node;
    Ok(Signal::Okay)
}

/// Shared by `spouses`/`families`: walks every FAMS family of `person`, binding the opposite-sex
/// spouse (falling back to the first non-self spouse, same rule as
/// [`sequence::person_to_spouses`]). `spouse_first` controls binding order to match each loop's
/// own `idents` layout.
fn walk_spouse_families(
    person: NodeId,
    l: &LoopNode,
    ctx: &mut Context,
    spouse_first: bool,
) -> InterpResult {
    let sex = ctx
        .db
        .arena
        .find_child(person, "SEX")
        .and_then(|n| ctx.db.arena.get(n).value.clone());
    let (spouse_ident, family_ident, count_ident) = if spouse_first {
        (&l.idents[0], &l.idents[1], &l.idents[2])
    } else {
        (&l.idents[1], &l.idents[0], &l.idents[2])
    };
    let families = sequence::families_as_spouse_of(ctx.db, person);
    let mut count = 0i64;
    for fam in families {
        let husb = ctx
            .db
            .arena
            .find_child(fam, "HUSB")
            .and_then(|n| ctx.db.arena.get(n).value.clone())
            .and_then(|v| ctx.db.lookup(&Key::new(v)));
        let wife = ctx
            .db
            .arena
            .find_child(fam, "WIFE")
            .and_then(|n| ctx.db.arena.get(n).value.clone())
            .and_then(|v| ctx.db.lookup(&Key::new(v)));
        let opposite = match sex.as_deref() {
            Some("M") => wife,
            Some("F") => husb,
            _ => None,
        };
        let spouse = opposite.or_else(|| {
            [husb, wife]
                .into_iter()
                .flatten()
                .find(|&s| s.0 != person.0)
        });
        let Some(spouse) = spouse else { continue };
        count += 1;
        ctx.frame.set(spouse_ident.clone(), Value::Person(spouse));
        ctx.frame.set(family_ident.clone(), Value::Family(fam));
        ctx.frame.set(count_ident.clone(), Value::Int(count));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    Ok(Signal::Okay)
}

fn interpret_spouses_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context) -> InterpResult {
    let expr = l.expr.as_deref().expect("SpousesLoop always carries an expr");
    let Some(person) = evaluate_person(expr, ctx)? else {
        return Ok(Signal::Okay);
    };
    let result = walk_spouse_families(person, l, ctx, true);
    let _ = node;
    result
}

fn interpret_families_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context) -> InterpResult {
    let expr = l.expr.as_deref().expect("FamiliesLoop always carries an expr");
    let Some(person) = evaluate_person(expr, ctx)? else {
        return Ok(Signal::Okay);
    };
    let result = walk_spouse_families(person, l, ctx, false);
    let _ = node;
    result
}

fn interpret_parent_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context, fathers: bool) -> InterpResult {
    let expr = l.expr.as_deref().expect("parent loop always carries an expr");
    let Some(person) = evaluate_person(expr, ctx)? else {
        return Ok(Signal::Okay);
    };
    let (parent_ident, family_ident, count_ident) = (&l.idents[0], &l.idents[1], &l.idents[2]);
    let families = sequence::families_as_child_of(ctx.db, person);
    let mut count = 0i64;
    for fam in families {
        let tag = if fathers { "HUSB" } else { "WIFE" };
        let Some(parent_ref) = ctx.db.arena.find_child(fam, tag) else { continue };
        let Some(value) = ctx.db.arena.get(parent_ref).value.clone() else { continue };
        let Some(parent) = ctx.db.lookup(&Key::new(value)) else { continue };
        count += 1;
        ctx.frame.set(parent_ident.clone(), Value::Person(parent));
        ctx.frame.set(family_ident.clone(), Value::Family(fam));
        ctx.frame.set(count_ident.clone(), Value::Int(count));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    let _ = node;
    Ok(Signal::Okay)
}

fn interpret_famc_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context) -> InterpResult {
    let expr = l.expr.as_deref().expect("FamsAsChildLoop always carries an expr");
    let Some(person) = evaluate_person(expr, ctx)? else {
        return Ok(Signal::Okay);
    };
    let (family_ident, count_ident) = (&l.idents[0], &l.idents[1]);
    let families = sequence::families_as_child_of(ctx.db, person);
    for (i, fam) in families.into_iter().enumerate() {
        ctx.frame.set(family_ident.clone(), Value::Family(fam));
        ctx.frame.set(count_ident.clone(), Value::Int(i as i64 + 1));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    let _ = node;
    Ok(Signal::Okay)
}

enum RootKind {
    Person,
    Family,
    Source,
    Event,
    Other,
}

fn interpret_root_list_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context, kind: RootKind) -> InterpResult {
    let (elem_ident, count_ident) = (&l.idents[0], &l.idents[1]);
    if !ctx.db.persons.is_sorted() {
        ctx.db.sort_root_lists();
    }
    let keys: Vec<Key> = match kind {
        RootKind::Person => ctx.db.persons.iter().cloned().collect(),
        RootKind::Family => ctx.db.families.iter().cloned().collect(),
        RootKind::Source => ctx.db.sources.iter().cloned().collect(),
        RootKind::Event => ctx.db.events.iter().cloned().collect(),
        RootKind::Other => ctx.db.others.iter().cloned().collect(),
    };
    let mut count = 0i64;
    for key in keys {
        let Some(root) = ctx.db.lookup(&key) else { continue };
        count += 1;
        let value = match kind {
            RootKind::Person => Value::Person(root),
            RootKind::Family => Value::Family(root),
            RootKind::Source => Value::Source(root),
            RootKind::Event => Value::Event(root),
            RootKind::Other => Value::Other(root),
        };
        ctx.frame.set(elem_ident.clone(), value);
        ctx.frame.set(count_ident.clone(), Value::Int(count));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    let _ = node;
    Ok(Signal::Okay)
}

fn interpret_list_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context) -> InterpResult {
    let expr = l.expr.as_deref().expect("ListLoop always carries an expr");
    let list_value = evaluate(expr, ctx)?;
    let Value::List(handle) = list_value else {
        return if matches!(list_value, Value::Null) {
            Ok(Signal::Okay)
        } else {
            Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "list"))
        };
    };
    let (elem_ident, count_ident) = (&l.idents[0], &l.idents[1]);
    let items: Vec<Value> = handle.borrow().clone();
    for (i, item) in items.into_iter().enumerate() {
        ctx.frame.set(elem_ident.clone(), item);
        ctx.frame.set(count_ident.clone(), Value::Int(i as i64 + 1));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    Ok(Signal::Okay)
}

fn interpret_sequence_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context) -> InterpResult {
    let expr = l.expr.as_deref().expect("SequenceLoop always carries an expr");
    let seq_value = evaluate(expr, ctx)?;
    let Value::Sequence(handle) = seq_value else {
        return if matches!(seq_value, Value::Null) {
            Ok(Signal::Okay)
        } else {
            Err(ScriptError::type_error(node.loc.file.to_string(), node.loc.line, "sequence"))
        };
    };
    let (elem_ident, value_ident, count_ident) = (&l.idents[0], &l.idents[1], &l.idents[2]);
    let elements: Vec<_> = handle.borrow().iter().cloned().collect();
    for (i, el) in elements.into_iter().enumerate() {
        let variant = root_value_of(ctx, el.root);
        ctx.frame.set(elem_ident.clone(), variant);
        ctx.frame.set(value_ident.clone(), el.value.clone());
        ctx.frame.set(count_ident.clone(), Value::Int(i as i64 + 1));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    let _ = node;
    Ok(Signal::Okay)
}

fn root_value_of(ctx: &Context, root: NodeId) -> Value {
    use crate::node::RecordType;
    match ctx.db.arena.get(root).record_type() {
        RecordType::Person => Value::Person(root),
        RecordType::Family => Value::Family(root),
        RecordType::Source => Value::Source(root),
        RecordType::Event => Value::Event(root),
        _ => Value::Other(root),
    }
}

fn interpret_notes_loop(node: &ProgramNode, l: &LoopNode, ctx: &mut Context) -> InterpResult {
    let expr = l.expr.as_deref().expect("NotesLoop always carries an expr");
    let Some(start) = evaluate_gnode(expr, ctx)? else {
        return Ok(Signal::Okay);
    };
    let value_ident = &l.idents[0];
    let notes: Vec<NodeId> = ctx.db.arena.find_children(start, "NOTE").collect();
    for note in notes {
        let text = ctx.db.arena.get(note).value.clone().unwrap_or_default();
        ctx.frame.set(value_ident.clone(), Value::String(text));
        match run_loop_body(l.body.as_deref(), ctx)? {
            LoopStep::Continue => {}
            LoopStep::Break => return Ok(Signal::Okay),
            LoopStep::Return(v) => return Ok(Signal::Return(v)),
        }
    }
    let _ = node;
    Ok(Signal::Okay)
}

/// Checks a runtime's accumulated error log before handing its entry procedure to `interpret`,
/// per the parse-time-errors-gate-execution rule.
pub fn run_entry_point(
    runtime: &mut Runtime,
    db: &mut Database,
    entry: &Block,
) -> Result<(), Error> {
    if !runtime.error_log.is_empty() {
        return Err(Error::Script(runtime.error_log.clone()));
    }
    let mut frame = Frame::new();
    let result = {
        let mut ctx = Context { db, frame: &mut frame, runtime };
        match &entry.body {
            Some(stmt) => interpret(stmt, &mut ctx),
            None => Ok(Signal::Okay),
        }
    };
    result.map(|_| ()).map_err(|e| Error::Script(vec![e]))
}
