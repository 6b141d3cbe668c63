//! Catalog discovery when no explicit path is given.
//!
//! Each platform contributes an ordered list of candidate locations; the
//! first one that can actually be opened wins. Environment lookups go through
//! a [`SearchEnv`] snapshot so the ordering can be exercised without touching
//! the process environment.

use crate::error::FactoryError;
use crate::handler::ErrorHandler;
use crate::source::FileSource;
use log::{debug, info};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Names the catalog file directly.
pub const CATALOG_ENV: &str = "COLORER5CATALOG";
/// Indirection dotfile whose first line is a catalog path.
pub const INDIRECTION_FILE: &str = ".colorer5catalog";
pub const CATALOG_FILE: &str = "catalog.xml";
/// Install data directory holding a `catalog.xml`, tried before the fixed
/// locations on Unix.
pub const DATADIR_ENV: &str = "COLORER_DATADIR";

const ENV_NAMES: [&str; 7] = [
    CATALOG_ENV,
    DATADIR_ENV,
    "HOME",
    "HOMEDRIVE",
    "HOMEPATH",
    "SYSTEMROOT",
    "WINDIR",
];

const SYSCONFDIR: &str = "/etc";
const WELL_KNOWN_CATALOGS: [&str; 2] = [
    "/usr/share/colorer/catalog.xml",
    "/usr/local/share/colorer/catalog.xml",
];

/// Snapshot of everything the search reads from the host.
#[derive(Debug, Clone, Default)]
pub struct SearchEnv {
    vars: BTreeMap<String, String>,
    /// Path of the running executable.
    pub exe_path: Option<PathBuf>,
    /// Directory holding the system-wide indirection file on Unix.
    pub sysconf_dir: PathBuf,
    /// Fixed install locations tried last on Unix.
    pub well_known: Vec<PathBuf>,
}

impl SearchEnv {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        let vars = ENV_NAMES
            .iter()
            .filter_map(|name| env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect();

        Self {
            vars,
            exe_path: env::current_exe().ok(),
            sysconf_dir: PathBuf::from(SYSCONFDIR),
            well_known: WELL_KNOWN_CATALOGS.iter().map(PathBuf::from).collect(),
        }
    }

    /// An environment with no variables, no executable and no fixed paths.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    pub fn with_exe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.exe_path = Some(path.into());
        self
    }

    pub fn with_sysconf_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sysconf_dir = dir.into();
        self
    }

    pub fn with_well_known(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.well_known = paths.into_iter().collect();
        self
    }

    /// Non-empty value of `name`.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Target OS family whose search conventions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPlatform {
    Unix,
    Windows,
}

impl SearchPlatform {
    pub fn current() -> Self {
        if cfg!(windows) {
            SearchPlatform::Windows
        } else {
            SearchPlatform::Unix
        }
    }

    /// Ordered candidate catalog locations; earlier entries take precedence.
    pub fn candidates(&self, env: &SearchEnv) -> Vec<String> {
        match self {
            SearchPlatform::Unix => unix_candidates(env),
            SearchPlatform::Windows => windows_candidates(env),
        }
    }
}

fn unix_candidates(env: &SearchEnv) -> Vec<String> {
    let mut paths = Vec::new();
    if let Some(catalog) = env.var(CATALOG_ENV) {
        paths.push(catalog.to_string());
    }

    if let Some(home) = env.var("HOME").or_else(|| env.var("HOMEPATH")) {
        paths.extend(read_indirection_file(&Path::new(home).join(INDIRECTION_FILE)));
    }

    paths.extend(read_indirection_file(&env.sysconf_dir.join(INDIRECTION_FILE)));
    if let Some(datadir) = env.var(DATADIR_ENV) {
        paths.push(Path::new(datadir).join(CATALOG_FILE).display().to_string());
    }
    paths.extend(env.well_known.iter().map(|p| p.display().to_string()));
    paths
}

fn windows_candidates(env: &SearchEnv) -> Vec<String> {
    let mut paths = Vec::new();

    // <exe dir>, <exe dir>/.., <exe dir>/../..
    if let Some(exe) = &env.exe_path {
        paths.extend(
            exe.ancestors()
                .skip(1)
                .take(3)
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(|dir| format!("{}\\{CATALOG_FILE}", dir.display())),
        );
    }

    if let Some(catalog) = env.var(CATALOG_ENV) {
        paths.push(catalog.to_string());
    }

    if let (Some(drive), Some(home)) = (env.var("HOMEDRIVE"), env.var("HOMEPATH")) {
        let dotfile = format!("{drive}{home}/{INDIRECTION_FILE}");
        paths.extend(read_indirection_file(Path::new(&dotfile)));
    }

    if let Some(root) = env.var("SYSTEMROOT").or_else(|| env.var("WINDIR")) {
        let dotfile = format!("{root}/{INDIRECTION_FILE}");
        paths.extend(read_indirection_file(Path::new(&dotfile)));
    }
    paths
}

/// First line of an indirection file, if the file exists and the line is
/// not blank.
pub fn read_indirection_file(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let line = contents.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        debug!(path:? = path, catalog = line; "Read catalog indirection file");
        Some(line.to_string())
    }
}

/// Return the first candidate that can be opened.
///
/// Fails with [`FactoryError::CatalogNotFound`] after reporting a fatal error
/// to `handler` when no candidate is readable.
pub fn find_catalog(
    platform: SearchPlatform,
    env: &SearchEnv,
    handler: &dyn ErrorHandler,
) -> Result<String, FactoryError> {
    for candidate in platform.candidates(env) {
        match FileSource::new(&candidate).probe() {
            Ok(()) => {
                info!(catalog = candidate.as_str(); "Using catalog");
                return Ok(candidate);
            }
            Err(err) => {
                debug!(candidate = candidate.as_str(), error:% = err; "Catalog candidate rejected")
            }
        }
    }

    let err = FactoryError::CatalogNotFound;
    handler.fatal_error(&err.to_string());
    Err(err)
}
