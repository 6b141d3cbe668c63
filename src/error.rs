//! Error taxonomy for catalog resolution and resource provisioning.
//!
//! `SourceError` covers a single resource (open/read/parse); `FactoryError`
//! covers the provisioning session. Catalog-level failures abort the whole
//! load, while per-resource failures are either absorbed or propagated
//! depending on which resource kind is being built.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by a single [`FileSource`](crate::source::FileSource) or by
/// the loader consuming its bytes.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source stream already opened: '{}'", .0.display())]
    AlreadyOpen(PathBuf),

    #[error("source stream is not yet opened: '{}'", .0.display())]
    NotOpen(PathBuf),

    #[error("can't open file '{}'", location.display())]
    Io {
        location: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed resource '{}': {reason}", location.display())]
    Malformed { location: PathBuf, reason: String },
}

impl SourceError {
    pub(crate) fn malformed(location: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Malformed {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure raised by [`ParserFactory`](crate::ParserFactory) operations.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("can't find suitable catalog.xml file, check your program settings")]
    CatalogNotFound,

    #[error("bad catalog structure: {0}")]
    BadCatalog(String),

    #[error("can't read catalog")]
    CatalogSource(#[source] SourceError),

    #[error("duplicate hrd class '{class}' name '{name}'")]
    DuplicateRegistration { class: String, name: String },

    #[error("can't load resource '{location}'")]
    ResourceLoad {
        location: String,
        #[source]
        source: SourceError,
    },

    #[error("{}", class_or_name_message(.class, .name.as_deref()))]
    ClassOrNameNotFound { class: String, name: Option<String> },
}

fn class_or_name_message(class: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("can't find hrdName '{name}' in class '{class}'"),
        None => format!("can't find hrdClass '{class}'"),
    }
}

pub type Result<T, E = FactoryError> = std::result::Result<T, E>;
