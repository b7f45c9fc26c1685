//! A minimal hand-written recursive-descent parser for the script surface grammar: `/* */`
//! comments, `proc`/`func`/`global`/`include` top-level forms, `set`/`call`/control-flow
//! statements, the relational loop forms, and literal/identifier/call expressions.

use std::rc::Rc;

use crate::error::{Error, ScriptError, ScriptErrorKind};

use super::ast::{Block, Ident, Loc, LoopNode, NodeKind, Param, ProgramNode};
use super::builtins::lookup_builtin;
use super::symtab::FunctionTable;

/// Strips `/* ... */` comments and splits into whitespace-delimited tokens, recording the source
/// line each token started on. Tokens are owned strings: scripts are small and loaded once, so
/// the extra allocation is not worth chasing borrow lifetimes for.
struct Lexer {
    tokens: Vec<(String, u32)>,
    pos: usize,
    file: Rc<str>,
}

impl Lexer {
    fn new(source: &str, file: Rc<str>) -> Self {
        let stripped = strip_comments(source);
        let tokens = tokenize(&stripped);
        Lexer { tokens, pos: 0, file }
    }

    fn peek(&self) -> Option<(&str, u32)> {
        self.tokens.get(self.pos).map(|(t, l)| (t.as_str(), *l))
    }

    fn next(&mut self) -> Option<(String, u32)> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, text: &str) -> Result<u32, ScriptError> {
        match self.next() {
            Some((t, line)) if t == text => Ok(line),
            Some((t, line)) => Err(self.err(line, format!("expected '{text}', found '{t}'"))),
            None => Err(self.err(self.line(), format!("expected '{text}', found end of input"))),
        }
    }

    fn err(&self, line: u32, message: impl Into<String>) -> ScriptError {
        ScriptError::new(ScriptErrorKind::Syntax, self.file.to_string(), line, message)
    }

    fn line(&self) -> u32 {
        self.peek().map(|(_, l)| l).unwrap_or(0)
    }

    fn loc(&self) -> Loc {
        Loc::new(Rc::clone(&self.file), self.line())
    }
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    break;
                }
                if c == '\n' {
                    out.push('\n');
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Splits on whitespace while keeping `(`, `)`, `,`, `{`, `}` as their own tokens and quoted
/// strings as single tokens (quotes retained so the parser can tell a string literal from a bare
/// identifier).
fn tokenize(source: &str) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    let mut line: u32 = 1;
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            '(' | ')' | ',' | '{' | '}' => {
                out.push((c.to_string(), line));
                i += 1;
            }
            '"' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                i = (i + 1).min(chars.len());
                out.push((chars[start..i].iter().collect(), line));
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() && !"(),{}\"".contains(chars[i]) {
                    i += 1;
                }
                out.push((chars[start..i].iter().collect(), line));
            }
        }
    }
    out
}

/// The result of parsing one source file: every `proc`/`func` definition plus any `global`
/// declarations, ready to be merged into a [`FunctionTable`].
pub struct ParsedProgram {
    pub procs: Vec<(Ident, Block)>,
    pub funcs: Vec<(Ident, Block)>,
    pub globals: Vec<Ident>,
}

/// Parses `source` (attributed to `file` in error messages) into top-level definitions.
pub fn parse_program(source: &str, file: &str) -> Result<ParsedProgram, Vec<ScriptError>> {
    let file: Rc<str> = Rc::from(file);
    let mut lexer = Lexer::new(source, file);
    let mut program = ParsedProgram { procs: Vec::new(), funcs: Vec::new(), globals: Vec::new() };
    let mut errors = Vec::new();
    while lexer.peek().is_some() {
        if let Err(e) = parse_top_level(&mut lexer, &mut program) {
            errors.push(e);
            while let Some((t, _)) = lexer.peek() {
                if matches!(t, "proc" | "func" | "global" | "include") {
                    break;
                }
                lexer.next();
            }
            if lexer.peek().is_none() {
                break;
            }
        }
    }
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

fn parse_top_level(lexer: &mut Lexer, program: &mut ParsedProgram) -> Result<(), ScriptError> {
    let line = lexer.line();
    let (keyword, _) = lexer.next().ok_or_else(|| lexer.err(line, "unexpected end of input"))?;
    match keyword.as_str() {
        "proc" => {
            let (name, block) = parse_def(lexer)?;
            program.procs.push((name, block));
            Ok(())
        }
        "func" => {
            let (name, block) = parse_def(lexer)?;
            program.funcs.push((name, block));
            Ok(())
        }
        "global" => {
            lexer.expect("(")?;
            let (name, _) = lexer.next().ok_or_else(|| lexer.err(line, "expected identifier"))?;
            lexer.expect(")")?;
            program.globals.push(name);
            Ok(())
        }
        "include" => {
            lexer.expect("(")?;
            lexer.next(); // path string, resolved by the caller via the script search path
            lexer.expect(")")?;
            Ok(())
        }
        other => Err(lexer.err(line, format!("expected a top-level declaration, found '{other}'"))),
    }
}

fn parse_def(lexer: &mut Lexer) -> Result<(Ident, Block), ScriptError> {
    let line = lexer.line();
    let (name, _) = lexer.next().ok_or_else(|| lexer.err(line, "expected a name"))?;
    lexer.expect("(")?;
    let mut params = Vec::new();
    while let Some((t, _)) = lexer.peek() {
        if t == ")" {
            break;
        }
        let (ident, _) = lexer.next().expect("peeked");
        params.push(Param { name: ident });
        if let Some((",", _)) = lexer.peek() {
            lexer.next();
        }
    }
    lexer.expect(")")?;
    lexer.expect("{")?;
    let body = parse_statements(lexer)?;
    lexer.expect("}")?;
    Ok((name, Block { params, body }))
}

/// Parses statements until a `}` is seen (not consumed), chaining them via `next`.
fn parse_statements(lexer: &mut Lexer) -> Result<Option<Box<ProgramNode>>, ScriptError> {
    let mut stmts = Vec::new();
    while let Some((t, _)) = lexer.peek() {
        if t == "}" {
            break;
        }
        stmts.push(parse_statement(lexer)?);
    }
    let mut tail: Option<Box<ProgramNode>> = None;
    for mut stmt in stmts.into_iter().rev() {
        stmt.next = tail;
        tail = Some(Box::new(stmt));
    }
    Ok(tail)
}

fn parse_statement(lexer: &mut Lexer) -> Result<ProgramNode, ScriptError> {
    let (tok, line) = lexer.peek().ok_or_else(|| lexer.err(0, "unexpected end of input"))?;
    let loc = Loc::new(Rc::clone(&lexer.file), line);
    match tok {
        "if" => parse_if(lexer),
        "while" => parse_while(lexer),
        "break" => {
            lexer.next();
            Ok(ProgramNode::new(NodeKind::Break, loc))
        }
        "continue" => {
            lexer.next();
            Ok(ProgramNode::new(NodeKind::Continue, loc))
        }
        "return" => {
            lexer.next();
            let expr = if matches!(lexer.peek(), Some(("(", _))) {
                Some(Box::new(parse_expr(lexer)?))
            } else {
                None
            };
            Ok(ProgramNode::new(NodeKind::Return(expr), loc))
        }
        "call" => {
            lexer.next();
            let (name, _) = lexer.next().ok_or_else(|| lexer.err(line, "expected procedure name"))?;
            let args = parse_args(lexer)?;
            Ok(ProgramNode::new(NodeKind::ProcCall { name, args }, loc))
        }
        _ => parse_expr(lexer),
    }
}

fn parse_conditional_header(lexer: &mut Lexer) -> Result<(Option<Ident>, Box<ProgramNode>), ScriptError> {
    lexer.expect("(")?;
    let first = parse_expr(lexer)?;
    if matches!(lexer.peek(), Some((",", _))) {
        lexer.next();
        let expr = parse_expr(lexer)?;
        lexer.expect(")")?;
        let ident = match &first.kind {
            NodeKind::Identifier(name) => name.clone(),
            _ => return Err(lexer.err(first.loc.line, "expected an identifier")),
        };
        Ok((Some(ident), Box::new(expr)))
    } else {
        lexer.expect(")")?;
        Ok((None, Box::new(first)))
    }
}

fn parse_if(lexer: &mut Lexer) -> Result<ProgramNode, ScriptError> {
    let loc = lexer.loc();
    lexer.next(); // 'if'
    let (cond_ident, cond_expr) = parse_conditional_header(lexer)?;
    lexer.expect("{")?;
    let then_stmts = parse_statements(lexer)?;
    lexer.expect("}")?;
    let else_stmts = if matches!(lexer.peek(), Some(("else", _))) {
        lexer.next();
        lexer.expect("{")?;
        let stmts = parse_statements(lexer)?;
        lexer.expect("}")?;
        stmts
    } else {
        None
    };
    Ok(ProgramNode::new(NodeKind::If { cond_ident, cond_expr, then_stmts, else_stmts }, loc))
}

fn parse_while(lexer: &mut Lexer) -> Result<ProgramNode, ScriptError> {
    let loc = lexer.loc();
    lexer.next(); // 'while'
    let (cond_ident, cond_expr) = parse_conditional_header(lexer)?;
    lexer.expect("{")?;
    let body_stmts = parse_statements(lexer)?;
    lexer.expect("}")?;
    Ok(ProgramNode::new(NodeKind::While { cond_ident, cond_expr, body_stmts }, loc))
}

fn parse_args(lexer: &mut Lexer) -> Result<Vec<ProgramNode>, ScriptError> {
    lexer.expect("(")?;
    let mut args = Vec::new();
    while let Some((t, _)) = lexer.peek() {
        if t == ")" {
            break;
        }
        args.push(parse_expr(lexer)?);
        if matches!(lexer.peek(), Some((",", _))) {
            lexer.next();
        }
    }
    lexer.expect(")")?;
    Ok(args)
}

/// Parses a single expression: a literal, an identifier, or a call `name(args)`. Relational loop
/// forms are recognized here too since, syntactically, they read as `name(args) { body }`.
fn parse_expr(lexer: &mut Lexer) -> Result<ProgramNode, ScriptError> {
    let (tok, line) = lexer.peek().ok_or_else(|| lexer.err(0, "unexpected end of input"))?;
    let loc = Loc::new(Rc::clone(&lexer.file), line);
    if tok.starts_with('"') {
        let (raw, _) = lexer.next().expect("peeked");
        let text = raw.trim_matches('"').to_string();
        return Ok(ProgramNode::new(NodeKind::StringLiteral(text), loc));
    }
    if let Ok(n) = tok.parse::<i64>() {
        lexer.next();
        return Ok(ProgramNode::new(NodeKind::IntLiteral(n), loc));
    }
    if let Ok(x) = tok.parse::<f64>() {
        lexer.next();
        return Ok(ProgramNode::new(NodeKind::FloatLiteral(x), loc));
    }
    let (name, _) = lexer.next().expect("peeked");
    if matches!(lexer.peek(), Some(("(", _))) {
        return parse_call_or_loop(lexer, &name, loc);
    }
    Ok(ProgramNode::new(NodeKind::Identifier(name), loc))
}

/// Parses the common `name(expr, ident...) { body }` shape shared by every relational/container
/// loop. `takes_expr` is false for the whole-database loops (`forindi`, `forfam`, ...), which
/// bind only identifiers.
fn parse_loop_tail(lexer: &mut Lexer, takes_expr: bool) -> Result<LoopNode, ScriptError> {
    lexer.expect("(")?;
    let expr = if takes_expr {
        let e = Some(Box::new(parse_expr(lexer)?));
        lexer.expect(",")?;
        e
    } else {
        None
    };
    let mut idents = Vec::new();
    loop {
        let line = lexer.line();
        let (t, _) = lexer.next().ok_or_else(|| lexer.err(line, "expected identifier"))?;
        idents.push(t);
        if matches!(lexer.peek(), Some((",", _))) {
            lexer.next();
        } else {
            break;
        }
    }
    lexer.expect(")")?;
    lexer.expect("{")?;
    let body = parse_statements(lexer)?;
    lexer.expect("}")?;
    Ok(LoopNode { expr, idents, body })
}

fn parse_call_or_loop(lexer: &mut Lexer, name: &str, loc: Loc) -> Result<ProgramNode, ScriptError> {
    let node = match name {
        "fornodes" => ProgramNode::new(NodeKind::NodesLoop(parse_loop_tail(lexer, true)?), loc),
        "children" => ProgramNode::new(NodeKind::ChildrenLoop(parse_loop_tail(lexer, true)?), loc),
        "spouses" => ProgramNode::new(NodeKind::SpousesLoop(parse_loop_tail(lexer, true)?), loc),
        "families" => ProgramNode::new(NodeKind::FamiliesLoop(parse_loop_tail(lexer, true)?), loc),
        "fathers" => ProgramNode::new(NodeKind::FathersLoop(parse_loop_tail(lexer, true)?), loc),
        "mothers" => ProgramNode::new(NodeKind::MothersLoop(parse_loop_tail(lexer, true)?), loc),
        "parents" => ProgramNode::new(NodeKind::FamsAsChildLoop(parse_loop_tail(lexer, true)?), loc),
        "forindi" => ProgramNode::new(NodeKind::AllPersonsLoop(parse_loop_tail(lexer, false)?), loc),
        "forfam" => ProgramNode::new(NodeKind::AllFamiliesLoop(parse_loop_tail(lexer, false)?), loc),
        "forsour" => ProgramNode::new(NodeKind::AllSourcesLoop(parse_loop_tail(lexer, false)?), loc),
        "foreven" => ProgramNode::new(NodeKind::AllEventsLoop(parse_loop_tail(lexer, false)?), loc),
        "forothr" => ProgramNode::new(NodeKind::AllOthersLoop(parse_loop_tail(lexer, false)?), loc),
        "forlist" => ProgramNode::new(NodeKind::ListLoop(parse_loop_tail(lexer, true)?), loc),
        "forindiset" => ProgramNode::new(NodeKind::SequenceLoop(parse_loop_tail(lexer, true)?), loc),
        "notes" => ProgramNode::new(NodeKind::NotesLoop(parse_loop_tail(lexer, true)?), loc),
        "traverse" => {
            lexer.expect("(")?;
            let gnode_expr = Box::new(parse_expr(lexer)?);
            lexer.expect(",")?;
            let line = lexer.line();
            let (gnode_ident, _) = lexer.next().ok_or_else(|| lexer.err(line, "expected identifier"))?;
            lexer.expect(",")?;
            let (level_ident, _) = lexer.next().ok_or_else(|| lexer.err(line, "expected identifier"))?;
            lexer.expect(")")?;
            lexer.expect("{")?;
            let body_stmts = parse_statements(lexer)?;
            lexer.expect("}")?;
            ProgramNode::new(NodeKind::TraverseLoop { gnode_expr, gnode_ident, level_ident, body_stmts }, loc)
        }
        _ => {
            let args = parse_args(lexer)?;
            match lookup_builtin(name) {
                Some(func) => ProgramNode::new(NodeKind::BltinCall { name: name.to_string(), args, func }, loc),
                None => ProgramNode::new(NodeKind::FuncCall { name: name.to_string(), args, body: None }, loc),
            }
        }
    };
    Ok(node)
}

/// Parses `source` and merges its definitions into `table`. Resolution across all loaded files
/// happens once, via [`finish_loading`], so cross-file calls work regardless of load order.
pub fn load_program(source: &str, file: &str, table: &mut FunctionTable) -> Result<(), Error> {
    let parsed = parse_program(source, file).map_err(Error::Script)?;
    for (name, block) in parsed.procs {
        table.define_proc(name, block);
    }
    for (name, block) in parsed.funcs {
        table.define_func(name, block);
    }
    for name in parsed.globals {
        table.declare_global(name);
    }
    Ok(())
}

/// Resolves every `FuncCall` across every procedure/function loaded into `table` so far. Call
/// once after every source file has been parsed.
pub fn finish_loading(table: &mut FunctionTable) -> Result<(), Error> {
    let errors = table.resolve_all();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Script(errors))
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_proc_with_string_statement() {
        let src = r#"proc main() { "hello\n" }"#;
        let program = parse_program(src, "t.ll").unwrap();
        assert_eq!(program.procs.len(), 1);
        assert_eq!(program.procs[0].0, "main");
    }

    #[test]
    fn parses_forindi_loop() {
        let src = r#"proc main() { forindi(p, n) { call report(p) } }"#;
        let program = parse_program(src, "t.ll").unwrap();
        let body = program.procs[0].1.body.as_ref().unwrap();
        assert!(matches!(body.kind, NodeKind::AllPersonsLoop(_)));
    }

    #[test]
    fn strips_block_comments() {
        let src = "proc main() { /* a comment\nspanning lines */ \"x\" }";
        let program = parse_program(src, "t.ll").unwrap();
        assert_eq!(program.procs.len(), 1);
    }

    #[test]
    fn unresolved_function_call_reported_at_finish() {
        let src = r#"proc main() { mystery() }"#;
        let mut table = FunctionTable::new();
        load_program(src, "t.ll", &mut table).unwrap();
        let result = finish_loading(&mut table);
        assert!(result.is_err());
    }

    #[test]
    fn mutually_recursive_functions_resolve() {
        let src = "func isEven(n) { return(isOdd(n)) } func isOdd(n) { return(isEven(n)) }";
        let mut table = FunctionTable::new();
        load_program(src, "t.ll", &mut table).unwrap();
        finish_loading(&mut table).unwrap();
    }
}
