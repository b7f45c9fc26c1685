//! The script abstract syntax tree: one [`ProgramNode`] per source construct, chained through
//! `next` for statement lists. Parent back-pointers from the source union-of-structs are dropped
//! deliberately: the interpreter only ever walks down through `next`/body lists, never back up to
//! a parent, so the pointer has no reader in this design.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ScriptError;

/// Where in source a node came from, carried by every node for error messages.
#[derive(Debug, Clone)]
pub struct Loc {
    pub file: Rc<str>,
    pub line: u32,
}

impl Loc {
    pub fn new(file: Rc<str>, line: u32) -> Self {
        Loc { file, line }
    }
}

/// A parameter or bound loop identifier.
pub type Ident = String;

/// One built-in function's native implementation. Receives its own call node (for argument
/// access) and the interpreter context; returns the result value.
pub type BuiltinFn = fn(&ProgramNode, &mut crate::script::interp::Context) -> Result<crate::script::value::Value, ScriptError>;

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Ident,
}

/// The body of a `ProcDef`/`FuncDef`: parameters plus the statement list.
#[derive(Debug, Clone)]
pub struct Block {
    pub params: Vec<Param>,
    pub body: Option<Box<ProgramNode>>,
}

/// Common shape of every relational/container loop: the driving expression, bound identifiers,
/// and the loop body, plus a trailing element count the body may also see.
#[derive(Debug, Clone)]
pub struct LoopNode {
    pub expr: Option<Box<ProgramNode>>,
    pub idents: Vec<Ident>,
    pub body: Option<Box<ProgramNode>>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    Identifier(Ident),

    If {
        cond_ident: Option<Ident>,
        cond_expr: Box<ProgramNode>,
        then_stmts: Option<Box<ProgramNode>>,
        else_stmts: Option<Box<ProgramNode>>,
    },
    While {
        cond_ident: Option<Ident>,
        cond_expr: Box<ProgramNode>,
        body_stmts: Option<Box<ProgramNode>>,
    },
    Break,
    Continue,
    Return(Option<Box<ProgramNode>>),

    ProcDef {
        name: Ident,
        block: Block,
    },
    ProcCall {
        name: Ident,
        args: Vec<ProgramNode>,
    },
    FuncDef {
        name: Ident,
        block: Block,
    },
    /// Resolved by [`resolve_calls`]: `body` is filled in once the user-function table is known.
    /// `RefCell`-wrapped so mutually recursive functions can share one definition while each
    /// gets resolved in place once, instead of requiring every caller's edge to be cloned only
    /// after its callee is fully resolved.
    FuncCall {
        name: Ident,
        args: Vec<ProgramNode>,
        body: Option<Rc<RefCell<Block>>>,
    },
    BltinCall {
        name: Ident,
        args: Vec<ProgramNode>,
        func: BuiltinFn,
    },

    TraverseLoop {
        gnode_expr: Box<ProgramNode>,
        gnode_ident: Ident,
        level_ident: Ident,
        body_stmts: Option<Box<ProgramNode>>,
    },
    NodesLoop(LoopNode),
    ChildrenLoop(LoopNode),
    SpousesLoop(LoopNode),
    FamiliesLoop(LoopNode),
    FathersLoop(LoopNode),
    MothersLoop(LoopNode),
    FamsAsChildLoop(LoopNode),
    AllPersonsLoop(LoopNode),
    AllFamiliesLoop(LoopNode),
    AllSourcesLoop(LoopNode),
    AllEventsLoop(LoopNode),
    AllOthersLoop(LoopNode),
    ListLoop(LoopNode),
    SequenceLoop(LoopNode),
    NotesLoop(LoopNode),
}

/// One node of the script's abstract syntax tree.
#[derive(Debug, Clone)]
pub struct ProgramNode {
    pub kind: NodeKind,
    pub loc: Loc,
    pub next: Option<Box<ProgramNode>>,
}

impl ProgramNode {
    pub fn new(kind: NodeKind, loc: Loc) -> Self {
        ProgramNode { kind, loc, next: None }
    }

    /// Iterates this node and every node chained after it via `next`.
    pub fn chain(&self) -> ChainIter<'_> {
        ChainIter { cur: Some(self) }
    }
}

pub struct ChainIter<'a> {
    cur: Option<&'a ProgramNode>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a ProgramNode;

    fn next(&mut self) -> Option<&'a ProgramNode> {
        let cur = self.cur?;
        self.cur = cur.next.as_deref();
        Some(cur)
    }
}

/// Resolves every `FuncCall` in the tree rooted at (and chained after) `root` against
/// `user_funcs`: user-function table first, binary-search built-in table second (already baked
/// into `BltinCall` nodes by the parser), unresolved third. Returns one [`ScriptError`] per
/// unresolved call rather than stopping at the first.
pub fn resolve_calls(
    root: &mut ProgramNode,
    user_funcs: &std::collections::HashMap<Ident, Rc<RefCell<Block>>>,
) -> Vec<ScriptError> {
    let mut errors = Vec::new();
    resolve_node(root, user_funcs, &mut errors);
    errors
}

/// Resolves every `FuncCall` inside `body` against `user_funcs`. Exposed so
/// [`super::symtab::FunctionTable::resolve_all`] can walk each stored procedure/function body in
/// place without re-deriving the recursive walk.
pub(crate) fn resolve_body(body: &mut ProgramNode, user_funcs: &std::collections::HashMap<Ident, Rc<RefCell<Block>>>) -> Vec<ScriptError> {
    let mut errors = Vec::new();
    resolve_chain(body, user_funcs, &mut errors);
    errors
}

fn resolve_node(
    node: &mut ProgramNode,
    user_funcs: &std::collections::HashMap<Ident, Rc<RefCell<Block>>>,
    errors: &mut Vec<ScriptError>,
) {
    match &mut node.kind {
        NodeKind::FuncCall { name, args, body } => {
            match user_funcs.get(name) {
                Some(block) => *body = Some(Rc::clone(block)),
                None => errors.push(ScriptError::undefined(
                    node.loc.file.to_string(),
                    node.loc.line,
                    name,
                )),
            }
            for arg in args.iter_mut() {
                resolve_node(arg, user_funcs, errors);
            }
        }
        NodeKind::ProcCall { args, .. } | NodeKind::BltinCall { args, .. } => {
            for arg in args.iter_mut() {
                resolve_node(arg, user_funcs, errors);
            }
        }
        NodeKind::If { cond_expr, then_stmts, else_stmts, .. } => {
            resolve_node(cond_expr, user_funcs, errors);
            if let Some(s) = then_stmts {
                resolve_chain(s, user_funcs, errors);
            }
            if let Some(s) = else_stmts {
                resolve_chain(s, user_funcs, errors);
            }
        }
        NodeKind::While { cond_expr, body_stmts, .. } => {
            resolve_node(cond_expr, user_funcs, errors);
            if let Some(s) = body_stmts {
                resolve_chain(s, user_funcs, errors);
            }
        }
        NodeKind::Return(Some(expr)) => resolve_node(expr, user_funcs, errors),
        NodeKind::ProcDef { block, .. } | NodeKind::FuncDef { block, .. } => {
            if let Some(b) = &mut block.body {
                resolve_chain(b, user_funcs, errors);
            }
        }
        NodeKind::TraverseLoop { gnode_expr, body_stmts, .. } => {
            resolve_node(gnode_expr, user_funcs, errors);
            if let Some(s) = body_stmts {
                resolve_chain(s, user_funcs, errors);
            }
        }
        NodeKind::NodesLoop(l)
        | NodeKind::ChildrenLoop(l)
        | NodeKind::SpousesLoop(l)
        | NodeKind::FamiliesLoop(l)
        | NodeKind::FathersLoop(l)
        | NodeKind::MothersLoop(l)
        | NodeKind::FamsAsChildLoop(l)
        | NodeKind::AllPersonsLoop(l)
        | NodeKind::AllFamiliesLoop(l)
        | NodeKind::AllSourcesLoop(l)
        | NodeKind::AllEventsLoop(l)
        | NodeKind::AllOthersLoop(l)
        | NodeKind::ListLoop(l)
        | NodeKind::SequenceLoop(l)
        | NodeKind::NotesLoop(l) => {
            if let Some(e) = &mut l.expr {
                resolve_node(e, user_funcs, errors);
            }
            if let Some(s) = &mut l.body {
                resolve_chain(s, user_funcs, errors);
            }
        }
        _ => {}
    }
    if let Some(next) = &mut node.next {
        resolve_node(next, user_funcs, errors);
    }
}

fn resolve_chain(
    node: &mut ProgramNode,
    user_funcs: &std::collections::HashMap<Ident, Rc<RefCell<Block>>>,
    errors: &mut Vec<ScriptError>,
) {
    resolve_node(node, user_funcs, errors);
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Loc {
        Loc::new(Rc::from("t.ll"), 1)
    }

    #[test]
    fn unresolved_func_call_reports_error() {
        let mut call = ProgramNode::new(
            NodeKind::FuncCall { name: "mystery".into(), args: vec![], body: None },
            loc(),
        );
        let table = std::collections::HashMap::new();
        let errors = resolve_calls(&mut call, &table);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn resolved_func_call_binds_body() {
        let block = Rc::new(RefCell::new(Block { params: vec![], body: None }));
        let mut table = std::collections::HashMap::new();
        table.insert("known".to_string(), Rc::clone(&block));
        let mut call = ProgramNode::new(
            NodeKind::FuncCall { name: "known".into(), args: vec![], body: None },
            loc(),
        );
        let errors = resolve_calls(&mut call, &table);
        assert!(errors.is_empty());
        match call.kind {
            NodeKind::FuncCall { body: Some(_), .. } => {}
            _ => panic!("expected resolved body"),
        }
    }

    #[test]
    fn chain_iterates_statement_list() {
        let mut a = ProgramNode::new(NodeKind::Break, loc());
        let b = ProgramNode::new(NodeKind::Continue, loc());
        a.next = Some(Box::new(b));
        assert_eq!(a.chain().count(), 2);
    }
}
