//! Indices over the node arena: the record index, name index, reference index, and the
//! per-record-kind root lists, bundled into a [`Database`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::containers::SortedVec;
use crate::error::{Error, Result};
use crate::node::{Arena, Key, NodeId, RecordType};
use crate::text::name_to_name_key;

static NEXT_DATABASE_ID: AtomicU64 = AtomicU64::new(1);

/// Maps record keys to the arena ids of their roots. Owns the arena: every other index and every
/// sequence holds non-owning `NodeId`/`Key` references into it.
#[derive(Debug, Default)]
pub struct RecordIndex {
    map: HashMap<Key, NodeId>,
}

impl RecordIndex {
    pub fn new() -> Self {
        RecordIndex { map: HashMap::new() }
    }

    /// Inserts `root`. If `replace` is false and the key is already present, the existing entry
    /// wins and this call is a silent no-op (first wins).
    pub fn insert(&mut self, key: Key, root: NodeId, replace: bool) {
        if !replace && self.map.contains_key(&key) {
            return;
        }
        self.map.insert(key, root);
    }

    pub fn lookup(&self, key: &Key) -> Option<NodeId> {
        self.map.get(key).copied()
    }

    pub fn iterate(&self) -> impl Iterator<Item = (&Key, NodeId)> {
        self.map.iter().map(|(k, &id)| (k, id))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Maps a normalized name key to the set of record keys of persons bearing that name.
#[derive(Debug, Default)]
pub struct NameIndex {
    map: HashMap<String, HashSet<Key>>,
}

impl NameIndex {
    pub fn new() -> Self {
        NameIndex { map: HashMap::new() }
    }

    /// Inserts `(name_key, record_key)`. Idempotent: inserting the same pair twice has no
    /// further effect.
    pub fn insert(&mut self, name_key: String, record_key: Key) {
        self.map.entry(name_key).or_default().insert(record_key);
    }

    /// Normalizes `raw_name` through [`name_to_name_key`] and returns the matching record keys.
    pub fn search(&self, raw_name: &str) -> HashSet<Key> {
        let key = name_to_name_key(raw_name);
        self.map.get(&key).cloned().unwrap_or_default()
    }

    pub fn search_by_key(&self, name_key: &str) -> HashSet<Key> {
        self.map.get(name_key).cloned().unwrap_or_default()
    }

    pub fn remove(&mut self, name_key: &str, record_key: &Key) {
        if let Some(set) = self.map.get_mut(name_key) {
            set.remove(record_key);
            if set.is_empty() {
                self.map.remove(name_key);
            }
        }
    }

    /// Removes every name-index entry for `person`. Scans *all* of the person's `NAME` children
    /// rather than assuming they are contiguous siblings (the source's `removeNamesOfPerson...`
    /// walks only until the first non-`NAME` sibling, which GEDCOM does not guarantee).
    pub fn remove_all_names_of_person(&mut self, arena: &Arena, person: NodeId) {
        let record_key = match &arena.get(person).key {
            Some(k) => k.clone(),
            None => return,
        };
        for name_node in arena.find_children(person, "NAME") {
            if let Some(value) = &arena.get(name_node).value {
                let name_key = name_to_name_key(value);
                self.remove(&name_key, &record_key);
            }
        }
    }

    /// Builds a name index from every person in `persons`, walking each person's `NAME`
    /// children. `index` resolves each key to its root node.
    pub fn build_from_root_list(index: &RecordIndex, arena: &Arena, persons: &RootList) -> Self {
        let mut name_index = NameIndex::new();
        for key in persons.iter() {
            let Some(person) = index.lookup(key) else {
                continue;
            };
            for name_node in arena.find_children(person, "NAME") {
                if let Some(value) = &arena.get(name_node).value {
                    name_index.insert(name_to_name_key(value), key.clone());
                }
            }
        }
        name_index
    }
}

/// Maps a `REFN` value to the key of the record that declares it.
#[derive(Debug, Default)]
pub struct RefIndex {
    map: HashMap<String, Key>,
}

impl RefIndex {
    pub fn new() -> Self {
        RefIndex { map: HashMap::new() }
    }

    pub fn insert(&mut self, refn: String, record_key: Key) {
        self.map.entry(refn).or_insert(record_key);
    }

    pub fn lookup(&self, refn: &str) -> Option<&Key> {
        self.map.get(refn)
    }
}

/// An ordered, sortable collection of the keys of every record of one kind, backed by
/// [`SortedVec`]'s sorted-hint scan/binary-search split.
#[derive(Debug, Default, Clone)]
pub struct RootList {
    keys: SortedVec<Key>,
}

impl RootList {
    pub fn new() -> Self {
        RootList { keys: SortedVec::new() }
    }

    pub fn push(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn sort_list(&mut self) {
        self.keys.sort();
    }

    pub fn is_sorted(&self) -> bool {
        self.keys.is_sorted()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.keys.iter()
    }

    /// Binary search if sorted, else linear scan.
    pub fn find_in_list(&self, key: &Key) -> Option<&Key> {
        self.keys.find(key)
    }
}

/// The whole in-memory database: the node arena, every index over it, and the per-kind root
/// lists. Carries an opaque id so that [`crate::sequence::Sequence`] set operations can verify
/// two sequences were built against the same database before merging them.
#[derive(Debug)]
pub struct Database {
    pub id: u64,
    pub arena: Arena,
    pub records: RecordIndex,
    pub names: NameIndex,
    pub refs: RefIndex,
    pub persons: RootList,
    pub families: RootList,
    pub sources: RootList,
    pub events: RootList,
    pub others: RootList,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Database {
            id: NEXT_DATABASE_ID.fetch_add(1, AtomicOrdering::Relaxed),
            arena: Arena::new(),
            records: RecordIndex::new(),
            names: NameIndex::new(),
            refs: RefIndex::new(),
            persons: RootList::new(),
            families: RootList::new(),
            sources: RootList::new(),
            events: RootList::new(),
            others: RootList::new(),
        }
    }

    /// Registers an already-allocated root node: files it into the record index and the
    /// appropriate root list, and (for persons) into the name index and (for any record with a
    /// `REFN` child) the reference index.
    pub fn register_root(&mut self, root: NodeId) -> Result<()> {
        let node = self.arena.get(root).clone();
        let Some(key) = node.key.clone() else {
            return Err(Error::InvalidStructure("root node has no key".into()));
        };
        self.records.insert(key.clone(), root, false);
        match node.record_type() {
            RecordType::Person => {
                self.persons.push(key.clone());
                for name_node in self.arena.find_children(root, "NAME") {
                    if let Some(value) = &self.arena.get(name_node).value {
                        self.names.insert(name_to_name_key(value), key.clone());
                    }
                }
            }
            RecordType::Family => self.families.push(key.clone()),
            RecordType::Source => self.sources.push(key.clone()),
            RecordType::Event => self.events.push(key.clone()),
            _ => self.others.push(key.clone()),
        }
        if let Some(refn) = self.arena.find_child(root, "REFN") {
            if let Some(value) = &self.arena.get(refn).value {
                self.refs.insert(value.clone(), key.clone());
            }
        }
        Ok(())
    }

    /// Finalizes root lists into key order, needed before `find_in_list`/`forindi`-style
    /// iteration can binary search or skip gaps deterministically.
    pub fn sort_root_lists(&mut self) {
        self.persons.sort_list();
        self.families.sort_list();
        self.sources.sort_list();
        self.events.sort_list();
        self.others.sort_list();
    }

    pub fn lookup(&self, key: &Key) -> Option<NodeId> {
        self.records.lookup(key)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Key;

    fn make_person(db: &mut Database, key: &str, name: &str) -> NodeId {
        let root = db.arena.alloc(Some(Key::new(key)), "INDI", None);
        let name_node = db.arena.alloc(None, "NAME", Some(name.to_string()));
        db.arena.append_child(root, name_node);
        db.register_root(root).unwrap();
        root
    }

    #[test]
    fn record_index_roundtrip() {
        let mut db = Database::new();
        let p = make_person(&mut db, "@I1@", "John /Smith/");
        assert_eq!(db.lookup(&Key::new("@I1@")), Some(p));
    }

    #[test]
    fn name_index_search_normalizes_query() {
        let mut db = Database::new();
        make_person(&mut db, "@I1@", "John /Smith/");
        let hits = db.names.search("john smith");
        assert!(hits.contains(&Key::new("@I1@")));
    }

    #[test]
    fn remove_all_names_scans_non_contiguous_name_children() {
        let mut db = Database::new();
        let root = db.arena.alloc(Some(Key::new("@I1@")), "INDI", None);
        let n1 = db.arena.alloc(None, "NAME", Some("John /Smith/".into()));
        let sex = db.arena.alloc(None, "SEX", Some("M".into()));
        let n2 = db.arena.alloc(None, "NAME", Some("Jack /Smith/".into()));
        db.arena.append_child(root, n1);
        db.arena.append_child(root, sex);
        db.arena.append_child(root, n2);
        db.register_root(root).unwrap();
        db.names.remove_all_names_of_person(&db.arena, root);
        assert!(db.names.search("john smith").is_empty());
        assert!(db.names.search("jack smith").is_empty());
    }

    #[test]
    fn root_list_binary_search_after_sort() {
        let mut list = RootList::new();
        list.push(Key::new("@I10@"));
        list.push(Key::new("@I2@"));
        list.sort_list();
        assert_eq!(list.find_in_list(&Key::new("@I2@")), Some(&Key::new("@I2@")));
    }
}
