//! Provisioning session: one loaded catalog plus the resources built from it.
//!
//! A [`ParserFactory`] owns its catalog, its error sink and the lazily built
//! grammar set. It is single-threaded by construction (`!Sync`); callers that
//! share one across threads must add their own locking.

use crate::catalog::{self, Catalog};
use crate::error::{FactoryError, Result};
use crate::grammar::{HrcParser, TextParser};
use crate::handler::{ErrorHandler, LogErrorHandler};
use crate::mapper::{RegionDefine, RegionMapper, StyledMapper, TextMapper};
use crate::search::{self, SearchEnv, SearchPlatform};
use crate::source::FileSource;
use log::{debug, info, warn};
use std::cell::OnceCell;
use std::env;
use std::error::Error as _;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// Class used by [`ParserFactory::create_styled_mapper`] when none is given.
pub const DEFAULT_STYLED_CLASS: &str = "rgb";
/// Fixed class of [`ParserFactory::create_text_mapper`].
pub const TEXT_CLASS: &str = "text";
pub const DEFAULT_HRD_NAME: &str = "default";
/// Overrides [`DEFAULT_HRD_NAME`] when no scheme name is requested.
pub const HRD_ENV: &str = "COLORER5HRD";

pub fn version() -> &'static str {
    concat!("colorer-factory ", env!("CARGO_PKG_VERSION"))
}

/// Configures a [`ParserFactory`] before its catalog is loaded.
pub struct ParserFactoryBuilder {
    handler: Box<dyn ErrorHandler>,
    search_env: Option<SearchEnv>,
    platform: SearchPlatform,
    hrd_override: Option<String>,
}

impl Default for ParserFactoryBuilder {
    fn default() -> Self {
        Self {
            handler: Box::new(LogErrorHandler::new()),
            search_env: None,
            platform: SearchPlatform::current(),
            hrd_override: env::var(HRD_ENV).ok().filter(|v| !v.is_empty()),
        }
    }
}

impl ParserFactoryBuilder {
    pub fn with_error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Environment consulted when the catalog path has to be searched for.
    pub fn with_search_env(mut self, env: SearchEnv) -> Self {
        self.search_env = Some(env);
        self
    }

    pub fn with_platform(mut self, platform: SearchPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Scheme name preferred when none is requested; replaces `COLORER5HRD`.
    pub fn with_hrd_override(mut self, name: Option<String>) -> Self {
        self.hrd_override = name;
        self
    }

    /// Load the catalog at `catalog_path`, or search for one when `None`.
    pub fn load_catalog(self, catalog_path: Option<&str>) -> Result<ParserFactory> {
        let location = match catalog_path {
            Some(path) => path.to_string(),
            None => {
                let env = self.search_env.unwrap_or_else(SearchEnv::from_process);
                search::find_catalog(self.platform, &env, self.handler.as_ref())?
            }
        };

        let mut catalog_source = FileSource::new(&location);
        let catalog = catalog::load_catalog(&mut catalog_source, self.handler.as_ref())?;

        if let Some(log_location) = &catalog.log_location {
            let target = catalog_source.create_relative(log_location);
            if let Err(err) = self.handler.set_log_target(target.location()) {
                warn!(path:? = target.location(), error:% = err; "Can't redirect diagnostics");
            }
        }

        info!(catalog:? = catalog_source.location(); "Catalog loaded");
        Ok(ParserFactory {
            handler: self.handler,
            hrd_override: self.hrd_override,
            catalog_source,
            catalog,
            hrc_parser: OnceCell::new(),
        })
    }
}

pub struct ParserFactory {
    handler: Box<dyn ErrorHandler>,
    hrd_override: Option<String>,
    catalog_source: FileSource,
    catalog: Catalog,
    hrc_parser: OnceCell<HrcParser>,
}

impl ParserFactory {
    pub fn builder() -> ParserFactoryBuilder {
        ParserFactoryBuilder::default()
    }

    /// Search the standard locations for a catalog and load it.
    pub fn new() -> Result<Self> {
        Self::load_catalog(None)
    }

    /// Load a catalog with default settings.
    pub fn load_catalog(catalog_path: Option<&str>) -> Result<Self> {
        Self::builder().load_catalog(catalog_path)
    }

    /// Resolved location of the loaded catalog.
    pub fn catalog_path(&self) -> &Path {
        self.catalog_source.location()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn error_handler(&self) -> &dyn ErrorHandler {
        self.handler.as_ref()
    }

    /// The grammar set, built from every hrc location on first access.
    ///
    /// Sources that fail to load are reported and skipped; the parser is
    /// returned even when some of them are missing. Later calls return the
    /// same instance without touching the filesystem.
    pub fn hrc_parser(&self) -> &HrcParser {
        self.hrc_parser.get_or_init(|| self.build_hrc_parser())
    }

    fn build_hrc_parser(&self) -> HrcParser {
        let mut parser = HrcParser::new();
        for link in &self.catalog.hrc_locations {
            let mut source = self.catalog_source.create_relative(link);
            if source.location().is_dir() {
                self.load_hrc_directory(&mut parser, link, source.location());
                continue;
            }
            if let Err(err) = parser.load_source(&mut source) {
                let err = FactoryError::ResourceLoad {
                    location: link.clone(),
                    source: err,
                };
                self.handler.fatal_error(&error_chain(&err));
            }
        }
        info!(
            sources = parser.loaded_sources().len(),
            file_types = parser.file_type_count();
            "Grammar set loaded"
        );
        parser
    }

    // Regular files directly inside `dir`; subdirectories are not entered.
    fn load_hrc_directory(&self, parser: &mut HrcParser, link: &str, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.handler
                    .error(&format!("can't read hrc directory '{}': {err}", dir.display()));
                return;
            }
        };

        let (files, failures) = directory_files(
            entries.map(|entry| entry.map(|e| (e.file_name(), e.path().is_dir()))),
        );
        for err in failures {
            self.handler.error(&format!(
                "can't read entry of hrc directory '{}': {err}",
                dir.display()
            ));
        }
        debug!(directory:? = dir, files = files.len(); "Expanding hrc directory");

        // Only the catalog-written link is expanded; file names are used as found.
        let link = link.trim_end_matches(['/', '\\']);
        for name in files {
            let mut source = FileSource::from_path(dir.join(&name));
            if let Err(err) = parser.load_source(&mut source) {
                let err = FactoryError::ResourceLoad {
                    location: format!("{link}/{}", name.to_string_lossy()),
                    source: err,
                };
                self.handler.error(&error_chain(&err));
            }
        }
    }

    pub fn create_text_parser(&self) -> TextParser {
        TextParser::new()
    }

    /// Build a styled mapper from every location of `(class, name)`.
    ///
    /// `class` defaults to [`DEFAULT_STYLED_CLASS`]. Without `name`, the
    /// override name (or [`DEFAULT_HRD_NAME`]) is used, falling back to the
    /// first scheme of the class. Any location failing to load aborts the
    /// call.
    pub fn create_styled_mapper(
        &self,
        class: Option<&str>,
        name: Option<&str>,
    ) -> Result<StyledMapper> {
        let class = class.unwrap_or(DEFAULT_STYLED_CLASS);
        let locations = self.resolve_hrd(class, name)?;

        let mut mapper = StyledMapper::new();
        for link in locations {
            let mut source = self.catalog_source.create_relative(link);
            if let Err(err) = mapper.load_region_mappings(&mut source) {
                let err = FactoryError::ResourceLoad {
                    location: link.clone(),
                    source: err,
                };
                self.handler.error(&error_chain(&err));
                return Err(err);
            }
        }
        Ok(mapper)
    }

    /// Build a text mapper from the [`TEXT_CLASS`] scheme `name`, resolved
    /// like [`create_styled_mapper`](Self::create_styled_mapper).
    ///
    /// Locations failing to load are reported and skipped, so the mapper may
    /// be partially populated.
    pub fn create_text_mapper(&self, name: Option<&str>) -> Result<TextMapper> {
        let locations = self.resolve_hrd(TEXT_CLASS, name)?;
        let mut mapper = TextMapper::new();
        self.merge_lenient(&mut mapper, locations);
        Ok(mapper)
    }

    fn merge_lenient<D: RegionDefine>(&self, mapper: &mut RegionMapper<D>, locations: &[String]) {
        for link in locations {
            let mut source = self.catalog_source.create_relative(link);
            if let Err(err) = mapper.load_region_mappings(&mut source) {
                let err = FactoryError::ResourceLoad {
                    location: link.clone(),
                    source: err,
                };
                self.handler.error(&error_chain(&err));
            }
        }
    }

    fn resolve_hrd(&self, class: &str, name: Option<&str>) -> Result<&[String]> {
        let hrd = &self.catalog.hrd;
        if !hrd.has_class(class) {
            return Err(FactoryError::ClassOrNameNotFound {
                class: class.to_string(),
                name: None,
            });
        }

        let name = match name {
            Some(name) => name,
            None => {
                let preferred = self.hrd_override.as_deref().unwrap_or(DEFAULT_HRD_NAME);
                if hrd.entry(class, preferred).is_some() {
                    preferred
                } else {
                    hrd.name_at(class, 0).unwrap_or(preferred)
                }
            }
        };
        debug!(class = class, name = name; "Resolved hrd scheme");

        hrd.locations(class, name)
            .ok_or_else(|| FactoryError::ClassOrNameNotFound {
                class: class.to_string(),
                name: Some(name.to_string()),
            })
    }

    pub fn hrd_class_count(&self) -> usize {
        self.catalog.hrd.class_count()
    }

    pub fn hrd_class_at(&self, idx: usize) -> Option<&str> {
        self.catalog.hrd.class_at(idx)
    }

    pub fn hrd_name_count(&self, class: &str) -> usize {
        self.catalog.hrd.name_count(class)
    }

    /// Same as [`hrd_name_count`](Self::hrd_name_count).
    pub fn count_hrd(&self, class: &str) -> usize {
        self.hrd_name_count(class)
    }

    pub fn hrd_name_at(&self, class: &str, idx: usize) -> Option<&str> {
        self.catalog.hrd.name_at(class, idx)
    }

    pub fn hrd_description(&self, class: &str, name: &str) -> Option<&str> {
        self.catalog.hrd.description(class, name)
    }
}

// Sorted non-directory names, plus the entries that could not be read.
fn directory_files(
    entries: impl Iterator<Item = io::Result<(OsString, bool)>>,
) -> (Vec<OsString>, Vec<io::Error>) {
    let mut files = Vec::new();
    let mut failures = Vec::new();
    for entry in entries {
        match entry {
            Ok((_, true)) => {}
            Ok((name, false)) => files.push(name),
            Err(err) => failures.push(err),
        }
    }
    files.sort();
    (files, failures)
}

// "outer: inner: innermost", for single-line reports.
fn error_chain(err: &FactoryError) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;

    #[test]
    fn error_chain_joins_sources() {
        let err = FactoryError::ResourceLoad {
            location: "hrd/rgb.hrd".into(),
            source: SourceError::Io {
                location: "/c/hrd/rgb.hrd".into(),
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            },
        };
        assert_eq!(
            error_chain(&err),
            "can't load resource 'hrd/rgb.hrd': can't open file '/c/hrd/rgb.hrd': gone"
        );
    }

    #[test]
    fn directory_files_reports_unreadable_entries() {
        let entries = vec![
            Ok((OsString::from("b.hrc"), false)),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            Ok((OsString::from("nested"), true)),
            Ok((OsString::from("a.hrc"), false)),
        ];
        let (files, failures) = directory_files(entries.into_iter());
        assert_eq!(files, [OsString::from("a.hrc"), OsString::from("b.hrc")]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn version_names_the_crate() {
        assert!(version().starts_with("colorer-factory "));
    }
}
