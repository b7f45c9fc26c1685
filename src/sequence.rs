//! The query layer: [`Sequence`], the ordered, optionally sorted/unique collection of record
//! references every query produces, plus the relational navigators over a [`Database`].

use std::collections::{HashSet, VecDeque};

use crate::index::Database;
use crate::node::{Arena, Key, NodeId};
use crate::script::value::Value;

/// Tracks which invariant, if any, a sequence's current order satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortState {
    Unsorted,
    SortedByKey,
    SortedByName,
}

#[derive(Debug, Clone)]
pub struct SequenceElement {
    pub root: NodeId,
    pub key: Key,
    pub name: Option<String>,
    pub value: Value,
}

/// An ordered collection of record references with optional per-element values.
#[derive(Debug, Clone)]
pub struct Sequence {
    db_id: u64,
    elements: Vec<SequenceElement>,
    sort_state: SortState,
    unique: bool,
}

impl Sequence {
    pub fn new(db: &Database) -> Self {
        Sequence {
            db_id: db.id,
            elements: Vec::new(),
            sort_state: SortState::SortedByKey,
            unique: true,
        }
    }

    pub fn db_id(&self) -> u64 {
        self.db_id
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn sort_state(&self) -> SortState {
        self.sort_state
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceElement> {
        self.elements.iter()
    }

    pub fn get(&self, index: usize) -> Option<&SequenceElement> {
        self.elements.get(index)
    }

    /// Appends a new element. An append to an empty sequence is trivially sorted; any other
    /// append clears the sort flag (the safe choice, per the design notes, over trying to prove
    /// the new element preserves order).
    pub fn append(&mut self, root: NodeId, key: Key, name: Option<String>, value: Value) {
        if self.elements.is_empty() {
            // stays sorted/unique trivially
        } else {
            self.sort_state = SortState::Unsorted;
            self.unique = false;
        }
        self.elements.push(SequenceElement { root, key, name, value });
    }

    pub fn append_plain(&mut self, root: NodeId, key: Key) {
        self.append(root, key, None, Value::Null);
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.elements.iter().any(|e| &e.key == key)
    }

    pub fn remove(&mut self, key: &Key) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| &e.key != key);
        self.elements.len() != before
    }

    /// Idempotent: sorts by key if not already, and does nothing otherwise.
    pub fn key_sort(&mut self) {
        if self.sort_state != SortState::SortedByKey {
            self.elements.sort_by(|a, b| a.key.cmp(&b.key));
            self.sort_state = SortState::SortedByKey;
        }
    }

    /// Idempotent: sorts by cached display name if not already.
    pub fn name_sort(&mut self) {
        if self.sort_state != SortState::SortedByName {
            self.elements
                .sort_by(|a, b| a.name.as_deref().unwrap_or("").cmp(b.name.as_deref().unwrap_or("")));
            self.sort_state = SortState::SortedByName;
        }
    }

    /// Requires a prior key-sort. Returns a new sequence with duplicate keys removed, first
    /// occurrence wins.
    pub fn unique(&self) -> Sequence {
        assert_eq!(self.sort_state, SortState::SortedByKey, "unique requires a key-sorted sequence");
        let mut out = Sequence {
            db_id: self.db_id,
            elements: Vec::new(),
            sort_state: SortState::SortedByKey,
            unique: true,
        };
        let mut seen: Option<&Key> = None;
        for el in &self.elements {
            if seen != Some(&el.key) {
                out.elements.push(el.clone());
            }
            seen = Some(&el.key);
        }
        out
    }

    pub fn unique_in_place(&mut self) {
        assert_eq!(self.sort_state, SortState::SortedByKey, "unique requires a key-sorted sequence");
        self.elements.dedup_by(|a, b| a.key == b.key);
        self.unique = true;
    }

    fn ensure_key_sorted_unique(&mut self) {
        if self.sort_state != SortState::SortedByKey {
            self.key_sort();
        }
        if !self.unique {
            self.unique_in_place();
        }
    }

    /// Set union: key-sorts and uniquifies both operands first, then merges. `None` if the two
    /// sequences were not built against the same database.
    pub fn union(&self, other: &Sequence) -> Option<Sequence> {
        if self.db_id != other.db_id {
            return None;
        }
        let mut a = self.clone();
        let mut b = other.clone();
        a.ensure_key_sorted_unique();
        b.ensure_key_sorted_unique();
        let mut out = Sequence { db_id: self.db_id, elements: Vec::new(), sort_state: SortState::SortedByKey, unique: true };
        let (mut i, mut j) = (0, 0);
        while i < a.elements.len() && j < b.elements.len() {
            match a.elements[i].key.cmp(&b.elements[j].key) {
                std::cmp::Ordering::Less => {
                    out.elements.push(a.elements[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.elements.push(b.elements[j].clone());
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    out.elements.push(a.elements[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }
        out.elements.extend(a.elements[i..].iter().cloned());
        out.elements.extend(b.elements[j..].iter().cloned());
        Some(out)
    }

    /// Set intersection, same discipline as [`Sequence::union`].
    pub fn intersect(&self, other: &Sequence) -> Option<Sequence> {
        if self.db_id != other.db_id {
            return None;
        }
        let mut a = self.clone();
        let mut b = other.clone();
        a.ensure_key_sorted_unique();
        b.ensure_key_sorted_unique();
        let mut out = Sequence { db_id: self.db_id, elements: Vec::new(), sort_state: SortState::SortedByKey, unique: true };
        let (mut i, mut j) = (0, 0);
        while i < a.elements.len() && j < b.elements.len() {
            match a.elements[i].key.cmp(&b.elements[j].key) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.elements.push(a.elements[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }
        Some(out)
    }

    /// Set difference (`self - other`), same discipline as [`Sequence::union`].
    pub fn difference(&self, other: &Sequence) -> Option<Sequence> {
        if self.db_id != other.db_id {
            return None;
        }
        let mut a = self.clone();
        let mut b = other.clone();
        a.ensure_key_sorted_unique();
        b.ensure_key_sorted_unique();
        let mut out = Sequence { db_id: self.db_id, elements: Vec::new(), sort_state: SortState::SortedByKey, unique: true };
        let (mut i, mut j) = (0, 0);
        while i < a.elements.len() && j < b.elements.len() {
            match a.elements[i].key.cmp(&b.elements[j].key) {
                std::cmp::Ordering::Less => {
                    out.elements.push(a.elements[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        out.elements.extend(a.elements[i..].iter().cloned());
        Some(out)
    }
}

fn seq_of(db: &Database, keys: impl IntoIterator<Item = Key>) -> Sequence {
    let mut seq = Sequence::new(db);
    let mut seen = HashSet::new();
    for key in keys {
        if seen.insert(key.clone()) {
            if let Some(root) = db.lookup(&key) {
                let name = display_name(&db.arena, root);
                seq.append(root, key, name, Value::Null);
            }
        }
    }
    seq
}

fn display_name(arena: &Arena, person: NodeId) -> Option<String> {
    arena
        .find_child(person, "NAME")
        .and_then(|n| arena.get(n).value.clone())
}

fn key_of(arena: &Arena, node: NodeId) -> Option<Key> {
    arena.root_of(node).and_then(|r| arena.get(r).key.clone())
}

fn resolve_ref(db: &Database, node: NodeId, tag: &str) -> Vec<NodeId> {
    db.arena
        .find_children(node, tag)
        .filter_map(|n| db.arena.get(n).value.as_deref())
        .filter_map(|v| db.lookup(&Key::new(v)))
        .collect()
}

fn resolve_first_ref(db: &Database, node: NodeId, tag: &str) -> Option<NodeId> {
    resolve_ref(db, node, tag).into_iter().next()
}

/// `p`'s FAMS families (families in which `p` is a spouse).
pub fn families_as_spouse_of(db: &Database, person: NodeId) -> Vec<NodeId> {
    resolve_ref(db, person, "FAMS")
}

/// `p`'s FAMC families (families in which `p` is a child).
pub fn families_as_child_of(db: &Database, person: NodeId) -> Vec<NodeId> {
    resolve_ref(db, person, "FAMC")
}

fn sex_of(db: &Database, person: NodeId) -> Option<String> {
    db.arena
        .find_child(person, "SEX")
        .and_then(|n| db.arena.get(n).value.clone())
}

/// Every `CHIL` child across every FAMS family of `p`.
pub fn person_to_children(db: &Database, person: NodeId) -> Sequence {
    let mut keys = Vec::new();
    for fam in families_as_spouse_of(db, person) {
        for child in resolve_ref(db, fam, "CHIL") {
            if let Some(k) = key_of(&db.arena, child) {
                keys.push(k);
            }
        }
    }
    seq_of(db, keys)
}

/// For each FAMS family, the opposite-sex spouse (first if multiple); requires `p`'s sex be
/// known. If a family has no opposite-sex partner, yields the first non-self spouse of any sex
/// (Open Question resolution, see DESIGN.md).
pub fn person_to_spouses(db: &Database, person: NodeId) -> Option<Sequence> {
    let sex = sex_of(db, person)?;
    if sex != "M" && sex != "F" {
        return None;
    }
    let mut keys = Vec::new();
    for fam in families_as_spouse_of(db, person) {
        let husb = resolve_first_ref(db, fam, "HUSB");
        let wife = resolve_first_ref(db, fam, "WIFE");
        let opposite = if sex == "M" { wife } else { husb };
        let chosen = opposite.or_else(|| {
            [husb, wife]
                .into_iter()
                .flatten()
                .find(|&spouse| spouse.0 != person.0)
        });
        if let Some(spouse) = chosen {
            if let Some(k) = key_of(&db.arena, spouse) {
                keys.push(k);
            }
        }
    }
    Some(seq_of(db, keys))
}

/// Every `HUSB` across every FAMC family of `p`.
pub fn person_to_fathers(db: &Database, person: NodeId) -> Sequence {
    let mut keys = Vec::new();
    for fam in families_as_child_of(db, person) {
        for h in resolve_ref(db, fam, "HUSB") {
            if let Some(k) = key_of(&db.arena, h) {
                keys.push(k);
            }
        }
    }
    seq_of(db, keys)
}

/// Every `WIFE` across every FAMC family of `p`.
pub fn person_to_mothers(db: &Database, person: NodeId) -> Sequence {
    let mut keys = Vec::new();
    for fam in families_as_child_of(db, person) {
        for w in resolve_ref(db, fam, "WIFE") {
            if let Some(k) = key_of(&db.arena, w) {
                keys.push(k);
            }
        }
    }
    seq_of(db, keys)
}

/// FAMS families if `as_spouse`, else FAMC families.
pub fn person_to_families(db: &Database, person: NodeId, as_spouse: bool) -> Sequence {
    let fams = if as_spouse {
        families_as_spouse_of(db, person)
    } else {
        families_as_child_of(db, person)
    };
    seq_of(db, fams.into_iter().filter_map(|f| key_of(&db.arena, f)))
}

pub fn family_to_children(db: &Database, family: NodeId) -> Sequence {
    seq_of(db, resolve_ref(db, family, "CHIL").into_iter().filter_map(|c| key_of(&db.arena, c)))
}

pub fn family_to_fathers(db: &Database, family: NodeId) -> Sequence {
    seq_of(db, resolve_ref(db, family, "HUSB").into_iter().filter_map(|c| key_of(&db.arena, c)))
}

pub fn family_to_mothers(db: &Database, family: NodeId) -> Sequence {
    seq_of(db, resolve_ref(db, family, "WIFE").into_iter().filter_map(|c| key_of(&db.arena, c)))
}

/// For every person in `s`, finds their first FAMC family and collects that family's children.
/// Excludes the original persons unless `close` is true.
pub fn sibling_sequence(db: &Database, s: &Sequence, close: bool) -> Sequence {
    let mut originals = HashSet::new();
    let mut family_keys = Vec::new();
    for el in s.iter() {
        originals.insert(el.key.clone());
        if let Some(fam) = families_as_child_of(db, el.root).into_iter().next() {
            if let Some(k) = key_of(&db.arena, fam) {
                family_keys.push(k);
            }
        }
    }
    let mut keys = Vec::new();
    let mut seen = HashSet::new();
    for fam_key in family_keys {
        let Some(fam) = db.lookup(&fam_key) else { continue };
        for child in resolve_ref(db, fam, "CHIL") {
            if let Some(k) = key_of(&db.arena, child) {
                if !seen.insert(k.clone()) {
                    continue;
                }
                if close || !originals.contains(&k) {
                    keys.push(k);
                }
            }
        }
    }
    seq_of(db, keys)
}

/// BFS over FAMC -> HUSB/WIFE. Originals are included only if `close` is true.
pub fn ancestor_sequence(db: &Database, s: &Sequence, close: bool) -> Sequence {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    let mut out_keys = Vec::new();
    for el in s.iter() {
        queue.push_back(el.root);
        if close && seen.insert(el.key.clone()) {
            out_keys.push(el.key.clone());
        } else {
            seen.insert(el.key.clone());
        }
    }
    while let Some(person) = queue.pop_front() {
        for fam in families_as_child_of(db, person) {
            let father = resolve_first_ref(db, fam, "HUSB");
            let mother = resolve_first_ref(db, fam, "WIFE");
            for parent in [father, mother].into_iter().flatten() {
                if let Some(k) = key_of(&db.arena, parent) {
                    if seen.insert(k.clone()) {
                        out_keys.push(k);
                        queue.push_back(parent);
                    }
                }
            }
        }
    }
    seq_of(db, out_keys)
}

/// BFS over FAMS -> CHIL, with a seen-set covering both persons and families. Originals are
/// included only if `close` is true.
pub fn descendent_sequence(db: &Database, s: &Sequence, close: bool) -> Sequence {
    let mut seen_persons = HashSet::new();
    let mut seen_families = HashSet::new();
    let mut queue = VecDeque::new();
    let mut out_keys = Vec::new();
    for el in s.iter() {
        queue.push_back(el.root);
        if close && seen_persons.insert(el.key.clone()) {
            out_keys.push(el.key.clone());
        } else {
            seen_persons.insert(el.key.clone());
        }
    }
    while let Some(person) = queue.pop_front() {
        for fam in families_as_spouse_of(db, person) {
            let Some(fam_key) = key_of(&db.arena, fam) else { continue };
            if !seen_families.insert(fam_key) {
                continue;
            }
            for child in resolve_ref(db, fam, "CHIL") {
                if let Some(k) = key_of(&db.arena, child) {
                    if seen_persons.insert(k.clone()) {
                        out_keys.push(k);
                        queue.push_back(child);
                    }
                }
            }
        }
    }
    seq_of(db, out_keys)
}

/// Single-step parents of every person in `s`, deduplicated.
pub fn parent_sequence(db: &Database, s: &Sequence) -> Sequence {
    let mut keys = Vec::new();
    for el in s.iter() {
        for fam in families_as_child_of(db, el.root) {
            for parent in resolve_ref(db, fam, "HUSB").into_iter().chain(resolve_ref(db, fam, "WIFE")) {
                if let Some(k) = key_of(&db.arena, parent) {
                    keys.push(k);
                }
            }
        }
    }
    seq_of(db, keys)
}

/// Single-step children of every person in `s`, deduplicated.
pub fn child_sequence(db: &Database, s: &Sequence) -> Sequence {
    let mut keys = Vec::new();
    for el in s.iter() {
        for fam in families_as_spouse_of(db, el.root) {
            for child in resolve_ref(db, fam, "CHIL") {
                if let Some(k) = key_of(&db.arena, child) {
                    keys.push(k);
                }
            }
        }
    }
    seq_of(db, keys)
}

/// Single-step spouses of every person in `s`, deduplicated.
pub fn spouse_sequence(db: &Database, s: &Sequence) -> Sequence {
    let mut keys = Vec::new();
    for el in s.iter() {
        if let Some(spouses) = person_to_spouses(db, el.root) {
            for sp in spouses.iter() {
                keys.push(sp.key.clone());
            }
        }
    }
    seq_of(db, keys)
}

/// Consults the name index. A leading `*` iterates `a..=z` plus `$` as the given-name first
/// letter over the surname that follows, collecting all matches and uniquifying.
pub fn name_to_sequence(db: &Database, name: &str) -> Sequence {
    let mut keys: Vec<Key> = Vec::new();
    if let Some(surname) = name.strip_prefix('*') {
        let mut letters: Vec<char> = ('a'..='z').collect();
        letters.push('$');
        for letter in letters {
            let probe = if letter == '$' {
                surname.to_string()
            } else {
                format!("{surname} {letter}")
            };
            for key in db.names.search_by_key(&probe) {
                keys.push(key);
            }
        }
    } else {
        for key in db.names.search(name) {
            keys.push(key);
        }
    }
    seq_of(db, keys)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Key;

    fn link_family(db: &mut Database, fam_key: &str, husb: Option<&str>, wife: Option<&str>, children: &[&str]) -> NodeId {
        let fam = db.arena.alloc(Some(Key::new(fam_key)), "FAM", None);
        if let Some(h) = husb {
            let n = db.arena.alloc(None, "HUSB", Some(h.to_string()));
            db.arena.append_child(fam, n);
        }
        if let Some(w) = wife {
            let n = db.arena.alloc(None, "WIFE", Some(w.to_string()));
            db.arena.append_child(fam, n);
        }
        for c in children {
            let n = db.arena.alloc(None, "CHIL", Some(c.to_string()));
            db.arena.append_child(fam, n);
        }
        db.register_root(fam).unwrap();
        fam
    }

    fn make_person(db: &mut Database, key: &str, name: &str, sex: Option<&str>, famc: Option<&str>, fams: &[&str]) -> NodeId {
        let root = db.arena.alloc(Some(Key::new(key)), "INDI", None);
        let n = db.arena.alloc(None, "NAME", Some(name.to_string()));
        db.arena.append_child(root, n);
        if let Some(s) = sex {
            let sx = db.arena.alloc(None, "SEX", Some(s.to_string()));
            db.arena.append_child(root, sx);
        }
        if let Some(f) = famc {
            let fc = db.arena.alloc(None, "FAMC", Some(f.to_string()));
            db.arena.append_child(root, fc);
        }
        for f in fams {
            let fs = db.arena.alloc(None, "FAMS", Some(f.to_string()));
            db.arena.append_child(root, fs);
        }
        db.register_root(root).unwrap();
        root
    }

    fn three_generations() -> Database {
        // @I1@ child of @F1@ (parents @I2@, @I3@); @I2@ child of @F2@ (parents @I4@,@I5@);
        // @I3@ child of @F3@ (parents @I6@,@I7@).
        let mut db = Database::new();
        make_person(&mut db, "@I2@", "Father /Two/", Some("M"), Some("@F2@"), &["@F1@"]);
        make_person(&mut db, "@I3@", "Mother /Three/", Some("F"), Some("@F3@"), &["@F1@"]);
        make_person(&mut db, "@I4@", "GFather /Four/", Some("M"), None, &["@F2@"]);
        make_person(&mut db, "@I5@", "GMother /Five/", Some("F"), None, &["@F2@"]);
        make_person(&mut db, "@I6@", "GFather /Six/", Some("M"), None, &["@F3@"]);
        make_person(&mut db, "@I7@", "GMother /Seven/", Some("F"), None, &["@F3@"]);
        make_person(&mut db, "@I1@", "Child /One/", None, Some("@F1@"), &[]);
        link_family(&mut db, "@F1@", Some("@I2@"), Some("@I3@"), &["@I1@"]);
        link_family(&mut db, "@F2@", Some("@I4@"), Some("@I5@"), &["@I2@"]);
        link_family(&mut db, "@F3@", Some("@I6@"), Some("@I7@"), &["@I3@"]);
        db
    }

    #[test]
    fn ancestor_closure_matches_scenario() {
        let db = three_generations();
        let i1 = db.lookup(&Key::new("@I1@")).unwrap();
        let mut start = Sequence::new(&db);
        start.append_plain(i1, Key::new("@I1@"));
        let ancestors = ancestor_sequence(&db, &start, false);
        let keys: HashSet<_> = ancestors.iter().map(|e| e.key.clone()).collect();
        let expect: HashSet<_> = ["@I2@", "@I3@", "@I4@", "@I5@", "@I6@", "@I7@"]
            .into_iter()
            .map(Key::new)
            .collect();
        assert_eq!(keys, expect);
    }

    #[test]
    fn set_algebra_scenario() {
        let db = Database::new();
        let mut a = Sequence::new(&db);
        let mut b = Sequence::new(&db);
        for (k, seq) in [("@I1@", &mut a), ("@I2@", &mut a), ("@I3@", &mut a)] {
            seq.append_plain(NodeId(0), Key::new(k));
        }
        for (k, seq) in [("@I2@", &mut b), ("@I3@", &mut b), ("@I4@", &mut b)] {
            seq.append_plain(NodeId(0), Key::new(k));
        }
        a.key_sort();
        a.unique_in_place();
        b.key_sort();
        b.unique_in_place();
        let union = a.union(&b).unwrap();
        let inter = a.intersect(&b).unwrap();
        let diff_ab = a.difference(&b).unwrap();
        let diff_ba = b.difference(&a).unwrap();
        let ks = |s: &Sequence| s.iter().map(|e| e.key.clone()).collect::<Vec<_>>();
        assert_eq!(ks(&union), vec![Key::new("@I1@"), Key::new("@I2@"), Key::new("@I3@"), Key::new("@I4@")]);
        assert_eq!(ks(&inter), vec![Key::new("@I2@"), Key::new("@I3@")]);
        assert_eq!(ks(&diff_ab), vec![Key::new("@I1@")]);
        assert_eq!(ks(&diff_ba), vec![Key::new("@I4@")]);
    }

    #[test]
    fn empty_sequence_boundary_behaviors() {
        let db = Database::new();
        let mut a = Sequence::new(&db);
        a.append_plain(NodeId(0), Key::new("@I1@"));
        a.key_sort();
        a.unique_in_place();
        let empty = Sequence::new(&db);
        let union = a.union(&empty).unwrap();
        let inter = a.intersect(&empty).unwrap();
        let diff = a.difference(&empty).unwrap();
        assert_eq!(union.len(), 1);
        assert_eq!(inter.len(), 0);
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn unique_idempotent_and_key_sort_idempotent() {
        let db = Database::new();
        let mut s = Sequence::new(&db);
        s.append_plain(NodeId(0), Key::new("@I2@"));
        s.append_plain(NodeId(0), Key::new("@I1@"));
        s.append_plain(NodeId(0), Key::new("@I1@"));
        s.key_sort();
        s.key_sort();
        assert_eq!(s.sort_state(), SortState::SortedByKey);
        let once = s.unique();
        let twice = once.unique();
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn person_with_no_famc_has_no_parents() {
        let mut db = Database::new();
        let p = make_person(&mut db, "@I1@", "Solo /Person/", None, None, &[]);
        assert!(person_to_fathers(&db, p).is_empty());
        assert!(person_to_mothers(&db, p).is_empty());
    }

    #[test]
    fn unknown_sex_yields_no_spouses() {
        let mut db = Database::new();
        let p = make_person(&mut db, "@I1@", "Ambiguous /Person/", None, None, &["@F1@"]);
        make_person(&mut db, "@I2@", "Other /Person/", Some("F"), None, &["@F1@"]);
        link_family(&mut db, "@F1@", None, Some("@I2@"), &[]);
        assert!(person_to_spouses(&db, p).is_none());
    }
}
