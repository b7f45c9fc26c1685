//! The GEDCOM line tokenizer and writer: the ingest/export boundary. Reads `level SP [key SP]
//! tag [SP value]` lines, building the node arena by tracking a parent stack indexed by level;
//! writes the arena back out the same way, one line per node.

use std::collections::HashSet;
use std::io::Write;

use crate::error::{Error, Result};
use crate::index::Database;
use crate::node::{Key, NodeId};
use crate::sequence::Sequence;

#[derive(Debug, Clone)]
struct Line {
    level: usize,
    key: Option<Key>,
    tag: String,
    value: Option<String>,
}

/// Decodes a raw GEDCOM file's bytes into UTF-8 text. A byte-order mark selects UTF-8/UTF-16
/// explicitly; lacking one, valid UTF-8 (the common case for modern exports) is used as-is, and
/// anything else is treated as ANSEL, approximated with Windows-1252 per the character-set
/// limitation documented for this format in the wild.
pub fn decode_source(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, _, _) = encoding.decode(&bytes[bom_len..]);
        return text.into_owned();
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

fn tokenize_line(line_no: usize, raw: &str) -> Result<Line> {
    let raw = raw.trim_end_matches(['\r', '\n']);
    let mut parts = raw.trim_start().splitn(2, ' ');
    let level_str = parts.next().unwrap_or("");
    let level: usize = level_str.parse().map_err(|_| Error::ParseError {
        line_number: Some(line_no),
        message: format!("invalid level {level_str:?}"),
    })?;
    let rest = parts.next().unwrap_or("").trim_start();
    if rest.is_empty() {
        return Err(Error::ParseError { line_number: Some(line_no), message: "missing tag".into() });
    }
    // Cross-reference keys appear only on level-0 lines, directly after the level.
    let (key, rest) = if level == 0 && rest.starts_with('@') {
        let mut it = rest.splitn(2, ' ');
        let key = it.next().unwrap_or("");
        (Some(Key::new(key)), it.next().unwrap_or("").trim_start())
    } else {
        (None, rest)
    };
    let mut it = rest.splitn(2, ' ');
    let tag = it.next().unwrap_or("").to_string();
    let value = it.next().map(|v| v.trim_start().to_string()).filter(|v| !v.is_empty());
    Ok(Line { level, key, tag, value })
}

/// Parses `source` and registers every record into `db`, returning the errors encountered (one
/// malformed line does not abort the whole file; records built around it are simply skipped).
pub fn load_gedcom(db: &mut Database, source: &str) -> Vec<Error> {
    let mut errors = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut roots: Vec<NodeId> = Vec::new();

    for (i, raw_line) in source.lines().enumerate() {
        if raw_line.trim().is_empty() {
            continue;
        }
        let line_no = i + 1;
        let line = match tokenize_line(line_no, raw_line) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(line = line_no, "skipping malformed GEDCOM line: {err}");
                errors.push(err);
                continue;
            }
        };

        if line.tag == "CONT" || line.tag == "CONC" {
            let sep = if line.tag == "CONT" { "\n" } else { "" };
            match stack.get(line.level.saturating_sub(1)) {
                Some(&owner) => {
                    let existing = db.arena.get_mut(owner).value.get_or_insert_with(String::new);
                    existing.push_str(sep);
                    if let Some(v) = &line.value {
                        existing.push_str(v);
                    }
                }
                None => {
                    errors.push(Error::ParseError {
                        line_number: Some(line_no),
                        message: "CONT/CONC line has no owning node".into(),
                    });
                }
            }
            continue;
        }

        let id = db.arena.alloc(line.key.clone(), line.tag.clone(), line.value.clone());
        stack.truncate(line.level);
        if line.level == 0 {
            roots.push(id);
        } else {
            match stack.get(line.level - 1) {
                Some(&parent) => db.arena.append_child(parent, id),
                None => {
                    errors.push(Error::ParseError {
                        line_number: Some(line_no),
                        message: format!("line at level {} has no parent", line.level),
                    });
                    continue;
                }
            }
        }
        stack.push(id);
    }

    for root in roots {
        if db.arena.get(root).key.is_some() {
            if let Err(err) = db.register_root(root) {
                errors.push(err);
            }
        }
    }
    db.sort_root_lists();
    tracing::debug!(
        persons = db.persons.len(),
        families = db.families.len(),
        errors = errors.len(),
        "loaded GEDCOM source"
    );
    errors
}

fn write_line(out: &mut impl Write, depth: usize, key: Option<&Key>, tag: &str, value: Option<&str>) -> Result<()> {
    write!(out, "{depth} ")?;
    if let Some(key) = key {
        write!(out, "{key} ")?;
    }
    write!(out, "{tag}")?;
    if let Some(value) = value {
        write!(out, " {value}")?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_subtree(db: &Database, root: NodeId, out: &mut impl Write) -> Result<()> {
    let order = db
        .arena
        .traverse(root)
        .ok_or_else(|| Error::InvalidStructure("node tree too deep to traverse".into()))?;
    for (id, depth) in order {
        let node = db.arena.get(id);
        write_line(out, depth, if depth == 0 { node.key.as_ref() } else { None }, &node.tag, node.value.as_deref())?;
    }
    Ok(())
}

/// Emits every record in `db` (persons, then families, sources, events, others), one line per
/// node, with a trailing newline on every record.
pub fn write_database(db: &Database, out: &mut impl Write) -> Result<()> {
    for list in [&db.persons, &db.families, &db.sources, &db.events, &db.others] {
        for key in list.iter() {
            if let Some(root) = db.lookup(key) {
                write_subtree(db, root, out)?;
            }
        }
    }
    Ok(())
}

const REF_TAGS: [&str; 5] = ["HUSB", "WIFE", "CHIL", "FAMC", "FAMS"];

fn write_subtree_filtered(db: &Database, root: NodeId, emitted: &HashSet<Key>, out: &mut impl Write) -> Result<()> {
    let order = db
        .arena
        .traverse(root)
        .ok_or_else(|| Error::InvalidStructure("node tree too deep to traverse".into()))?;
    for (id, depth) in order {
        let node = db.arena.get(id);
        if REF_TAGS.contains(&node.tag.as_str()) {
            let kept = node.value.as_deref().map(Key::new).is_some_and(|k| emitted.contains(&k));
            if !kept {
                continue;
            }
        }
        write_line(out, depth, if depth == 0 { node.key.as_ref() } else { None }, &node.tag, node.value.as_deref())?;
    }
    Ok(())
}

/// Emits `seq`'s persons plus any family connecting at least two of them, eliding cross-
/// references (`HUSB`/`WIFE`/`CHIL`/`FAMC`/`FAMS`) to anything outside that emitted set.
pub fn sequence_to_gedcom(db: &Database, seq: &Sequence, out: &mut impl Write) -> Result<()> {
    let persons: HashSet<Key> = seq.iter().map(|e| e.key.clone()).collect();
    let mut families = HashSet::new();
    for fam_key in db.families.iter() {
        let Some(fam) = db.lookup(fam_key) else { continue };
        let linked = ["HUSB", "WIFE", "CHIL"]
            .iter()
            .flat_map(|t| db.arena.find_children(fam, t))
            .filter_map(|n| db.arena.get(n).value.clone())
            .filter(|v| persons.contains(&Key::new(v.clone())))
            .count();
        if linked >= 2 {
            families.insert(fam_key.clone());
        }
    }
    let emitted: HashSet<Key> = persons.iter().chain(families.iter()).cloned().collect();
    for el in seq.iter() {
        write_subtree_filtered(db, el.root, &emitted, out)?;
    }
    for fam_key in &families {
        if let Some(fam) = db.lookup(fam_key) {
            write_subtree_filtered(db, fam, &emitted, out)?;
        }
    }
    Ok(())
}
