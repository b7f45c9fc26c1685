//! Runtime configuration: resolves `-g`/`-s` CLI paths against the colon-separated search paths
//! named by `DE_GEDCOM_PATH`/`DE_SCRIPTS_PATH`, matching the source's path-resolution contract.

use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_SEARCH_PATH: &str = ".";

/// Resolved paths and verbosity for one run of the `run` or `summary` subcommand.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub gedcom_path: Option<PathBuf>,
    pub script_path: Option<PathBuf>,
    pub verbose: bool,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        RuntimeConfig { gedcom_path: None, script_path: None, verbose: false }
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Resolves `path` against `DE_GEDCOM_PATH`'s search directories (falling back to `.`) and
    /// stores it.
    pub fn with_gedcom(mut self, path: impl AsRef<Path>) -> std::io::Result<Self> {
        self.gedcom_path = Some(resolve(path.as_ref(), "DE_GEDCOM_PATH")?);
        Ok(self)
    }

    /// Resolves `path` against `DE_SCRIPTS_PATH`'s search directories (falling back to `.`) and
    /// stores it.
    pub fn with_script(mut self, path: impl AsRef<Path>) -> std::io::Result<Self> {
        self.script_path = Some(resolve(path.as_ref(), "DE_SCRIPTS_PATH")?);
        Ok(self)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits an environment variable's colon-separated search path into directories, defaulting to
/// the current directory when the variable is unset or empty.
pub fn search_dirs(env_var: &str) -> Vec<PathBuf> {
    match env::var(env_var) {
        Ok(val) if !val.is_empty() => val.split(':').map(PathBuf::from).collect(),
        _ => vec![PathBuf::from(DEFAULT_SEARCH_PATH)],
    }
}

/// Resolves `path`: absolute paths and paths that exist relative to the current directory are
/// used as-is; otherwise each of `env_var`'s search directories is tried in order, first hit
/// wins. An `include("path")` target in a script uses `DE_SCRIPTS_PATH` the same way.
pub fn resolve(path: &Path, env_var: &str) -> std::io::Result<PathBuf> {
    if path.is_absolute() || path.exists() {
        return Ok(path.to_path_buf());
    }
    for dir in search_dirs(env_var) {
        let candidate = dir.join(path);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, format!("{} not found on {env_var}", path.display())))
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn search_dirs_defaults_to_current_directory_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("DE_GEDCOM_PATH_TEST_UNUSED");
        assert_eq!(search_dirs("DE_GEDCOM_PATH_TEST_UNUSED"), vec![PathBuf::from(".")]);
    }

    #[test]
    fn search_dirs_splits_on_colon() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("DE_GEDCOM_PATH_TEST", "/a:/b:/c");
        assert_eq!(
            search_dirs("DE_GEDCOM_PATH_TEST"),
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
        env::remove_var("DE_GEDCOM_PATH_TEST");
    }

    #[test]
    fn resolve_passes_through_existing_relative_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "0 @I1@ INDI\n").unwrap();
        let resolved = resolve(file.path(), "DE_GEDCOM_PATH").unwrap();
        assert_eq!(resolved, file.path());
    }

    #[test]
    fn resolve_finds_file_on_search_path() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("family.ged"), "0 @I1@ INDI\n").unwrap();
        env::set_var("DE_GEDCOM_PATH_SEARCH_TEST", dir.path().to_str().unwrap());

        let resolved = resolve(Path::new("family.ged"), "DE_GEDCOM_PATH_SEARCH_TEST").unwrap();
        assert_eq!(resolved, dir.path().join("family.ged"));
        env::remove_var("DE_GEDCOM_PATH_SEARCH_TEST");
    }
}
