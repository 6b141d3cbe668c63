//! Catalog document wiring.
//!
//! The catalog (`catalog.xml`) lists where grammar sources (`hrc-sets`) and
//! color schemes (`hrd-sets`) live. This module parses it into a [`Catalog`]:
//! an ordered list of grammar locations plus an [`HrdRegistry`]. Locations are
//! kept as written; resolution happens when a resource is opened.

pub mod registry;

pub use registry::{HrdEntry, HrdRegistry, description_key};

use crate::error::{FactoryError, SourceError};
use crate::handler::ErrorHandler;
use crate::source::{FileSource, parse_document};
use log::{debug, info};
use roxmltree::{Document, Node};

const ROOT_ELEMENT: &str = "catalog";

/// In-memory form of a loaded catalog. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Grammar locations in document order; duplicates are kept.
    pub hrc_locations: Vec<String>,
    pub hrd: HrdRegistry,
    /// Raw `log-location` of the last `hrc-sets` block that set one.
    pub log_location: Option<String>,
}

/// Read and parse the catalog behind `source`.
pub fn load_catalog(
    source: &mut FileSource,
    handler: &dyn ErrorHandler,
) -> Result<Catalog, FactoryError> {
    let text = source
        .with_stream(|location, bytes| {
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|err| SourceError::malformed(location, err))
        })
        .map_err(FactoryError::CatalogSource)?;
    let document = parse_document(&text).map_err(|err| {
        FactoryError::BadCatalog(format!("{}: {err}", source.location().display()))
    })?;
    parse_catalog(&document, handler)
}

/// Build a [`Catalog`] from an already parsed document.
pub fn parse_catalog(
    document: &Document<'_>,
    handler: &dyn ErrorHandler,
) -> Result<Catalog, FactoryError> {
    let root = document.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        return Err(FactoryError::BadCatalog(format!(
            "root element is <{}>, expected <{ROOT_ELEMENT}>",
            root.tag_name().name()
        )));
    }

    let mut catalog = Catalog::default();
    for block in root.children().filter(Node::is_element) {
        match block.tag_name().name() {
            "hrc-sets" => parse_hrc_sets(block, &mut catalog),
            "hrd-sets" => parse_hrd_sets(block, &mut catalog, handler),
            _ => {}
        }
    }

    info!(
        hrc_locations = catalog.hrc_locations.len(),
        hrd_classes = catalog.hrd.class_count(),
        hrd_schemes = catalog.hrd.len();
        "Catalog parsed"
    );
    Ok(catalog)
}

fn parse_hrc_sets(block: Node<'_, '_>, catalog: &mut Catalog) {
    if let Some(log_location) = block.attribute("log-location").filter(|s| !s.is_empty()) {
        catalog.log_location = Some(log_location.to_string());
    }
    catalog.hrc_locations.extend(child_locations(block));
}

fn parse_hrd_sets(block: Node<'_, '_>, catalog: &mut Catalog, handler: &dyn ErrorHandler) {
    for hrd in block
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "hrd")
    {
        let (Some(class), Some(name)) = (hrd.attribute("class"), hrd.attribute("name")) else {
            debug!("Skipping hrd entry without class or name");
            continue;
        };
        let description = hrd.attribute("description");
        let locations = child_locations(hrd).collect();
        if let Err(err) = catalog.hrd.register(class, name, description, locations) {
            handler.error(&err.to_string());
        }
    }
}

fn child_locations<'a, 'input: 'a>(
    parent: Node<'a, 'input>,
) -> impl Iterator<Item = String> + 'a {
    parent
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "location")
        .filter_map(|n| n.attribute("link"))
        .map(str::to_string)
}
