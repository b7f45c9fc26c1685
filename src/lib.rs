//! # lifelines-rs
//!
//! An in-memory genealogical database with an embedded scripting language for querying and
//! reporting on GEDCOM data, modeled on the LifeLines/DeadEnds record model and report language.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lifelines_rs::gedcom_io::load_gedcom;
//! use lifelines_rs::index::Database;
//!
//! fn main() {
//!     let source = std::fs::read_to_string("family.ged").unwrap();
//!     let mut db = Database::new();
//!     let errors = load_gedcom(&mut db, &source);
//!     println!("Loaded {} persons, {} families ({} errors)", db.persons.len(), db.families.len(), errors.len());
//! }
//! ```
//!
//! Running a report script against a loaded database goes through
//! [`script::parser::parse_program`] to build a [`script::symtab::FunctionTable`], then
//! [`script::interp::run_entry_point`] to execute its `main` procedure.
//!
//! ## Modules
//!
//! - [`node`] - the arena-indexed record tree (`Node`, `Key`, `Arena`)
//! - [`index`] - `Database`: the record/name/ref indices and per-kind root lists
//! - [`text`] - name-key normalization, given/surname splitting, Soundex
//! - [`sequence`] - `Sequence`/`SequenceElement` and the relational navigators and set algebra
//! - [`gedcom_io`] - the GEDCOM line tokenizer and writer (ingest/export boundary)
//! - [`config`] - `RuntimeConfig` and `DE_GEDCOM_PATH`/`DE_SCRIPTS_PATH` path resolution
//! - [`script`] - the embedded report language: AST, parser, evaluator, interpreter, built-ins
//! - [`error`] - error types returned by this crate
//! - [`containers`] - shared container primitives (`Keyed`, `SortedVec`)
//!
//! ## GEDCOM Specification
//!
//! This library ingests the [GEDCOM 5.5.1 specification](https://gedcom.io/specifications/ged551.pdf)
//! line grammar; it does not validate full tag-set conformance.

pub mod config;
pub mod containers;
pub mod error;
pub mod gedcom_io;
pub mod index;
pub mod node;
pub mod script;
pub mod sequence;
pub mod text;
