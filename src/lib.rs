//! Catalog resolution and resource provisioning for a syntax highlighter.
//!
//! A catalog (`catalog.xml`) names the grammar sources (hrc) and color-scheme
//! sources (hrd) available to a highlighting engine. [`ParserFactory`] loads a
//! catalog, either from an explicit path or by searching the platform's
//! standard locations, and then builds grammar sets and region mappers from
//! the locations it lists.

pub mod catalog;
pub mod error;
pub mod factory;
pub mod grammar;
pub mod handler;
pub mod mapper;
pub mod search;
pub mod source;

pub use catalog::{Catalog, HrdEntry, HrdRegistry};
pub use error::{FactoryError, SourceError};
pub use factory::{
    DEFAULT_HRD_NAME, DEFAULT_STYLED_CLASS, HRD_ENV, ParserFactory, ParserFactoryBuilder,
    TEXT_CLASS, version,
};
pub use grammar::{FileType, HrcParser, TextParser};
pub use handler::{ErrorHandler, LogErrorHandler, NullErrorHandler, RecordingErrorHandler};
pub use mapper::{RegionMapper, StyledMapper, StyledRegion, TextMapper, TextRegion};
pub use search::{SearchEnv, SearchPlatform, find_catalog};
pub use source::{FileSource, resolve_location};
