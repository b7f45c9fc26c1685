use lifelines_rs::error::Error;
use lifelines_rs::gedcom_io::{load_gedcom, sequence_to_gedcom, write_database};
use lifelines_rs::index::Database;
use lifelines_rs::node::Key;
use lifelines_rs::script::interp::{run_entry_point, Runtime};
use lifelines_rs::script::parser::parse_program;
use lifelines_rs::sequence::{self, Sequence};

/// Loads `ged`, parses and resolves `script`, runs its `main` procedure, and returns what it
/// printed.
fn run_script(ged: &str, script: &str) -> Result<String, Error> {
    let mut db = Database::new();
    load_gedcom(&mut db, ged);

    let program = parse_program(script, "t.ll").map_err(Error::Script)?;
    let mut runtime = Runtime::new();
    for (name, block) in program.procs {
        runtime.funcs.define_proc(name, block);
    }
    for (name, block) in program.funcs {
        runtime.funcs.define_func(name, block);
    }
    for name in program.globals {
        runtime.funcs.declare_global(name);
    }
    let errors = runtime.funcs.resolve_all();
    runtime.error_log.extend(errors);

    let entry = runtime.funcs.proc("main").cloned().expect("script defines main");
    run_entry_point(&mut runtime, &mut db, &entry)?;
    Ok(runtime.output)
}

// Scenario 1: name query, forindi over the key-sorted root list.
#[test]
fn scenario_name_query() {
    let ged = "\
0 @I1@ INDI
1 NAME John /Smith/
0 @I2@ INDI
1 NAME Jane /Smith/
";
    let script = r#"proc main() { forindi(p, n) { name(p) "\n" } }"#;
    let output = run_script(ged, script).unwrap();
    assert_eq!(output, "John /Smith/\nJane /Smith/\n");
}

fn three_generation_family() -> Database {
    let ged = "\
0 @I1@ INDI
1 NAME Child /One/
1 FAMC @F1@
0 @I2@ INDI
1 NAME Father /One/
1 SEX M
1 FAMS @F1@
1 FAMC @F2@
0 @I3@ INDI
1 NAME Mother /One/
1 SEX F
1 FAMS @F1@
1 FAMC @F3@
0 @F1@ FAM
1 HUSB @I2@
1 WIFE @I3@
1 CHIL @I1@
0 @I4@ INDI
1 NAME Grandfather /Paternal/
1 SEX M
1 FAMS @F2@
0 @I5@ INDI
1 NAME Grandmother /Paternal/
1 SEX F
1 FAMS @F2@
0 @F2@ FAM
1 HUSB @I4@
1 WIFE @I5@
1 CHIL @I2@
0 @I6@ INDI
1 NAME Grandfather /Maternal/
1 SEX M
1 FAMS @F3@
0 @I7@ INDI
1 NAME Grandmother /Maternal/
1 SEX F
1 FAMS @F3@
0 @F3@ FAM
1 HUSB @I6@
1 WIFE @I7@
1 CHIL @I3@
";
    let mut db = Database::new();
    load_gedcom(&mut db, ged);
    db
}

// Scenario 2: ancestorSequence({@I1@}, false) contains exactly the six ancestors.
#[test]
fn scenario_ancestor_closure() {
    let db = three_generation_family();
    let i1 = db.lookup(&Key::new("@I1@")).unwrap();
    let mut start = Sequence::new(&db);
    start.append_plain(i1, Key::new("@I1@"));

    let ancestors = sequence::ancestor_sequence(&db, &start, false);
    let keys: Vec<String> = ancestors.iter().map(|e| e.key.as_str().to_string()).collect();
    for expected in ["@I2@", "@I3@", "@I4@", "@I5@", "@I6@", "@I7@"] {
        assert!(keys.contains(&expected.to_string()), "missing {expected} in {keys:?}");
    }
    assert_eq!(keys.len(), 6);
}

fn small_family() -> Database {
    let ged = "\
0 @I1@ INDI
1 NAME One /Test/
0 @I2@ INDI
1 NAME Two /Test/
0 @I3@ INDI
1 NAME Three /Test/
0 @I4@ INDI
1 NAME Four /Test/
";
    let mut db = Database::new();
    load_gedcom(&mut db, ged);
    db
}

fn sequence_of(db: &Database, xrefs: &[&str]) -> Sequence {
    let mut seq = Sequence::new(db);
    for xref in xrefs {
        let id = db.lookup(&Key::new(*xref)).unwrap();
        seq.append_plain(id, Key::new(*xref));
    }
    seq
}

fn keys_of(seq: &Sequence) -> Vec<String> {
    seq.iter().map(|e| e.key.as_str().to_string()).collect()
}

// Scenario 3: set algebra over A = {@I1@, @I2@, @I3@}, B = {@I2@, @I3@, @I4@}.
#[test]
fn scenario_set_algebra() {
    let db = small_family();
    let a = sequence_of(&db, &["@I1@", "@I2@", "@I3@"]);
    let b = sequence_of(&db, &["@I2@", "@I3@", "@I4@"]);

    assert_eq!(keys_of(&a.union(&b).unwrap()), vec!["@I1@", "@I2@", "@I3@", "@I4@"]);
    assert_eq!(keys_of(&a.intersect(&b).unwrap()), vec!["@I2@", "@I3@"]);
    assert_eq!(keys_of(&a.difference(&b).unwrap()), vec!["@I1@"]);
    assert_eq!(keys_of(&b.difference(&a).unwrap()), vec!["@I4@"]);
}

// Scenario 4: null chaining. @I1@ has no FAMC, so father(@I1@) is null and name(null) prints
// nothing, rather than erroring.
#[test]
fn scenario_null_chaining() {
    let ged = "0 @I1@ INDI\n1 NAME Lone /Wolf/\n";
    let script = r#"proc main() {
        forindi(p, n) {
            name(father(p))
            "done\n"
        }
    }"#;
    let output = run_script(ged, script).unwrap();
    assert_eq!(output, "done\n");
}

// Scenario 5: if-let binding. `if (m, mother(p))` binds m to the mother and only runs the body
// when she is non-null.
#[test]
fn scenario_if_let_binding() {
    let ged = "\
0 @I1@ INDI
1 NAME Child /One/
1 FAMC @F1@
0 @I2@ INDI
1 NAME Mother /One/
1 SEX F
1 FAMS @F1@
0 @I3@ INDI
1 NAME Orphan /Two/
0 @F1@ FAM
1 WIFE @I2@
1 CHIL @I1@
";
    let script = r#"proc main() {
        forindi(p, n) {
            if (m, mother(p)) {
                name(m)
                "\n"
            }
        }
    }"#;
    let output = run_script(ged, script).unwrap();
    assert_eq!(output, "Mother /One/\n");
}

// Scenario 6: traversal over a small node tree prints each node's depth and tag.
#[test]
fn scenario_traversal() {
    let ged = "\
0 @I1@ INDI
1 EVEN
2 DATE 1 JAN 1900
2 PLAC Paris
";
    let script = r#"proc main() {
        forindi(p, n) {
            fornodes(p, e) {
                traverse(e, nd, l) {
                    d(l) " " tag(nd) "\n"
                }
            }
        }
    }"#;
    let output = run_script(ged, script).unwrap();
    assert_eq!(output, "0 EVEN\n1 DATE\n1 PLAC\n");
}

#[test]
fn record_index_round_trips_every_root() {
    let db = three_generation_family();
    for key in db.persons.iter().chain(db.families.iter()) {
        let root = db.lookup(key).expect("every root list key resolves");
        assert_eq!(db.arena.get(root).key.as_ref(), Some(key));
    }
}

#[test]
fn key_ordering_is_numeric_not_lexical() {
    assert!(Key::new("@I2@") < Key::new("@I10@"));
}

#[test]
fn gedcom_round_trip_preserves_structure() {
    let db = three_generation_family();
    let mut out = Vec::new();
    write_database(&db, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let mut reingested = Database::new();
    let errors = load_gedcom(&mut reingested, &text);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(reingested.persons.len(), db.persons.len());
    assert_eq!(reingested.families.len(), db.families.len());

    let husb = reingested.arena.find_child(reingested.lookup(&Key::new("@F1@")).unwrap(), "HUSB").unwrap();
    assert_eq!(reingested.arena.get(husb).value.as_deref(), Some("@I2@"));
}

#[test]
fn sequence_to_gedcom_round_trips_a_subset() {
    let db = three_generation_family();
    let i1 = db.lookup(&Key::new("@I1@")).unwrap();
    let i2 = db.lookup(&Key::new("@I2@")).unwrap();
    let mut seq = Sequence::new(&db);
    seq.append_plain(i1, Key::new("@I1@"));
    seq.append_plain(i2, Key::new("@I2@"));

    let mut out = Vec::new();
    sequence_to_gedcom(&db, &seq, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let mut reingested = Database::new();
    let errors = load_gedcom(&mut reingested, &text);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(reingested.persons.len(), 2);
}

#[test]
fn unresolved_call_is_reported_before_execution() {
    let result = run_script("", r#"proc main() { mystery() }"#);
    assert!(matches!(result, Err(Error::Script(_))));
}

#[test]
fn script_missing_main_is_reported() {
    let db_ged = "";
    let script = r#"proc notmain() { "x" }"#;
    let mut db = Database::new();
    load_gedcom(&mut db, db_ged);
    let program = parse_program(script, "t.ll").unwrap();
    let mut runtime = Runtime::new();
    for (name, block) in program.procs {
        runtime.funcs.define_proc(name, block);
    }
    assert!(runtime.funcs.proc("main").is_none());
}
