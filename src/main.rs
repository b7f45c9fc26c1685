use std::collections::VecDeque;
use std::process;

use clap::{Parser, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use lifelines_rs::config::RuntimeConfig;
use lifelines_rs::error::Error;
use lifelines_rs::gedcom_io::load_gedcom;
use lifelines_rs::index::Database;
use lifelines_rs::node::{Key, NodeId};
use lifelines_rs::script::interp::{run_entry_point, Runtime};
use lifelines_rs::script::parser::parse_program;
use lifelines_rs::sequence;

/// In-memory genealogical database with an embedded scripting language
#[derive(Parser, Debug)]
#[command(name = "lifelines")]
#[command(version)]
#[command(about = "Query and report on GEDCOM data with an embedded script language", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a GEDCOM file and run a report script against it
    Run {
        /// Path to the GEDCOM file to load
        #[arg(short = 'g', long = "gedcom", value_name = "FILE")]
        gedcom: String,

        /// Path to the report script to run
        #[arg(short = 's', long = "script", value_name = "FILE")]
        script: String,

        /// Show detailed diagnostics while loading and running
        #[arg(short, long)]
        verbose: bool,
    },

    /// Load a GEDCOM file and print summary statistics
    Summary {
        /// Path to the GEDCOM file to load
        #[arg(value_name = "FILE")]
        filename: String,

        /// Show detailed ingest warnings
        #[arg(short, long)]
        verbose: bool,

        /// Dump every record as GEDCOM lines
        #[arg(short, long)]
        dump: bool,

        /// XREF of the individual to use as the "home" person
        #[arg(long, value_name = "XREF")]
        home_xref: Option<String>,
    },
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Record Type")]
    record_type: String,
    #[tabled(rename = "Count")]
    count: usize,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let result = match args.command {
        Command::Run { gedcom, script, verbose } => run(&gedcom, &script, verbose),
        Command::Summary { filename, verbose, dump, home_xref } => {
            summary(&filename, verbose, dump, home_xref.as_deref())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn load_database(path: &str, verbose: bool) -> Result<Database, Error> {
    let config = RuntimeConfig::new().with_gedcom(path)?;
    let resolved = config.gedcom_path.expect("just set above");
    let bytes = std::fs::read(&resolved).map_err(|_| Error::FileNotFound(path.to_string()))?;
    let source = lifelines_rs::gedcom_io::decode_source(&bytes);
    let mut db = Database::new();
    let errors = load_gedcom(&mut db, &source);
    if verbose {
        for e in &errors {
            eprintln!("warning: {e}");
        }
    }
    Ok(db)
}

fn run(gedcom: &str, script: &str, verbose: bool) -> Result<(), Error> {
    let mut db = load_database(gedcom, verbose)?;

    let config = RuntimeConfig::new().with_script(script)?;
    let resolved = config.script_path.expect("just set above");
    let source = std::fs::read_to_string(&resolved)?;

    let program = parse_program(&source, script).map_err(Error::Script)?;
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
    let resolve_errors = runtime.funcs.resolve_all();
    runtime.error_log.extend(resolve_errors);

    let entry = runtime
        .funcs
        .proc("main")
        .cloned()
        .ok_or_else(|| Error::InvalidStructure("script has no 'main' procedure".into()))?;

    run_entry_point(&mut runtime, &mut db, &entry)?;
    print!("{}", runtime.output);
    Ok(())
}

fn summary(filename: &str, verbose: bool, dump: bool, home_xref: Option<&str>) -> Result<(), Error> {
    let db = load_database(filename, verbose)?;

    if dump {
        let mut out = Vec::new();
        lifelines_rs::gedcom_io::write_database(&db, &mut out)?;
        print!("{}", String::from_utf8_lossy(&out));
        return Ok(());
    }

    let term_width = term_size::dimensions().map(|(w, _)| w).unwrap_or(80);
    if term_width >= 120 {
        print_summary_wide(&db, home_xref);
    } else {
        print_summary_narrow(&db, home_xref);
    }
    Ok(())
}

fn build_stats_vec(db: &Database) -> Vec<StatRow> {
    vec![
        StatRow { record_type: "Persons".to_string(), count: db.persons.len() },
        StatRow { record_type: "Families".to_string(), count: db.families.len() },
        StatRow { record_type: "Sources".to_string(), count: db.sources.len() },
        StatRow { record_type: "Events".to_string(), count: db.events.len() },
        StatRow { record_type: "Other".to_string(), count: db.others.len() },
    ]
}

fn home_person(db: &Database, home_xref: Option<&str>) -> Option<NodeId> {
    match home_xref {
        Some(xref) => db.lookup(&Key::new(xref)),
        None => db.persons.iter().next().and_then(|k| db.lookup(k)),
    }
}

fn name_of(db: &Database, person: NodeId) -> Option<String> {
    db.arena.find_child(person, "NAME").and_then(|n| db.arena.get(n).value.clone())
}

fn first_event_date(db: &Database, person: NodeId, tag: &str) -> Option<String> {
    let event = db.arena.find_child(person, tag)?;
    db.arena.find_child(event, "DATE").and_then(|n| db.arena.get(n).value.clone())
}

/// BFS depth over `step`, used for both ancestor and descendant generation counts.
fn max_generations(db: &Database, start: NodeId, step: impl Fn(&Database, NodeId) -> Vec<NodeId>) -> usize {
    let mut max_depth = 0;
    let mut queue = VecDeque::new();
    queue.push_back((start, 0));
    while let Some((current, depth)) = queue.pop_front() {
        max_depth = max_depth.max(depth);
        for next in step(db, current) {
            queue.push_back((next, depth + 1));
        }
    }
    max_depth
}

fn parents_of(db: &Database, person: NodeId) -> Vec<NodeId> {
    let fathers = sequence::person_to_fathers(db, person);
    let mothers = sequence::person_to_mothers(db, person);
    fathers.iter().chain(mothers.iter()).map(|e| e.root).collect()
}

fn children_of(db: &Database, person: NodeId) -> Vec<NodeId> {
    sequence::person_to_children(db, person).iter().map(|e| e.root).collect()
}

fn singleton_sequence(db: &Database, person: NodeId) -> sequence::Sequence {
    let mut s = sequence::Sequence::new(db);
    if let Some(key) = db.arena.get(person).key.clone() {
        s.append_plain(person, key);
    }
    s
}

fn home_lines(db: &Database, home_xref: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(person) = home_person(db, home_xref) else {
        lines.push("No persons found in GEDCOM file.".to_string());
        return lines;
    };

    if let Some(name) = name_of(db, person) {
        lines.push(format!("Name: {name}"));
    }
    if let Some(key) = &db.arena.get(person).key {
        lines.push(format!("XREF: {key}"));
    }
    if let Some(date) = first_event_date(db, person, "BIRT") {
        lines.push(format!("Birth Date: {date}"));
    }
    if let Some(date) = first_event_date(db, person, "DEAT") {
        lines.push(format!("Death Date: {date}"));
    }
    lines.push(String::new());

    let ancestor_gens = max_generations(db, person, parents_of);
    let descendant_gens = max_generations(db, person, children_of);
    lines.push("Genealogy Depth:".to_string());
    lines.push(format!("  Ancestors:   {ancestor_gens} generations"));
    lines.push(format!("  Descendants: {descendant_gens} generations"));
    lines.push(format!("  Total:       {} generations", ancestor_gens + descendant_gens));
    lines.push(String::new());

    let parents = parents_of(db, person);
    let children = children_of(db, person);
    let spouses = sequence::person_to_spouses(db, person).map(|s| s.len()).unwrap_or(0);
    let siblings = sequence::sibling_sequence(db, &singleton_sequence(db, person), false).len();

    lines.push("Immediate Family:".to_string());
    lines.push(format!("  Parents:   {}", parents.len()));
    lines.push(format!("  Siblings:  {siblings}"));
    lines.push(format!("  Spouses:   {spouses}"));
    lines.push(format!("  Children:  {}", children.len()));
    lines.push(String::new());

    let ancestor_seq = sequence::ancestor_sequence(db, &singleton_sequence(db, person), false);
    let descendant_seq = sequence::descendent_sequence(db, &singleton_sequence(db, person), false);

    lines.push("Extended Family:".to_string());
    lines.push(format!("  Ancestors:   {}", ancestor_seq.len()));
    lines.push(format!("  Descendants: {}", descendant_seq.len()));
    lines
}

fn print_summary_narrow(db: &Database, home_xref: Option<&str>) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                  GEDCOM FILE SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    let stats = build_stats_vec(db);
    let mut table = Table::new(stats);
    table.with(Style::modern());
    println!("{table}");
    println!();

    println!("───────────────────────────────────────────────────────────");
    println!("                  HOME INDIVIDUAL");
    println!("───────────────────────────────────────────────────────────");
    println!();
    for line in home_lines(db, home_xref) {
        println!("{line}");
    }
    println!("═══════════════════════════════════════════════════════════");
}

fn print_summary_wide(db: &Database, home_xref: Option<&str>) {
    println!("═══════════════════════════════════════════════════════════════════════════════════════════════════════════════");
    println!("                  GEDCOM FILE SUMMARY                     │                    HOME INDIVIDUAL");
    println!("═══════════════════════════════════════════════════════════════════════════════════════════════════════════════");
    println!();

    let stats = build_stats_vec(db);
    let mut table = Table::new(stats);
    table.with(Style::modern());
    let left_lines: Vec<String> = table.to_string().lines().map(String::from).collect();
    let right_lines = home_lines(db, home_xref);

    let max_lines = left_lines.len().max(right_lines.len());
    for i in 0..max_lines {
        let left = left_lines.get(i).map(|s| s.as_str()).unwrap_or("");
        let right = right_lines.get(i).map(|s| s.as_str()).unwrap_or("");
        println!("{left:<58} │ {right}");
    }
    println!("═══════════════════════════════════════════════════════════════════════════════════════════════════════════════");
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
0 @I1@ INDI
1 NAME John /Smith/
1 SEX M
1 BIRT
2 DATE 1 JAN 1900
0 @I2@ INDI
1 NAME Jane /Doe/
1 SEX F
";

    #[test]
    fn home_lines_reports_name_and_birth_without_crashing() {
        let mut db = Database::new();
        load_gedcom(&mut db, SAMPLE);
        let lines = home_lines(&db, Some("@I1@"));
        assert!(lines.iter().any(|l| l.contains("John /Smith/")));
        assert!(lines.iter().any(|l| l.contains("1 JAN 1900")));
    }

    #[test]
    fn home_lines_handles_empty_database() {
        let db = Database::new();
        let lines = home_lines(&db, None);
        assert_eq!(lines, vec!["No persons found in GEDCOM file.".to_string()]);
    }
}
