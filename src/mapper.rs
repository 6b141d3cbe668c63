//! Region mappings (hrd) merged from one or more color-scheme sources.
//!
//! Each source is an `<hrd>` document of `<assign name="..." .../>` entries.
//! Sources are merged in the order they are loaded; a later assignment of a
//! region replaces the earlier one.

use crate::error::SourceError;
use crate::source::{FileSource, parse_document};
use indexmap::IndexMap;
use log::debug;
use roxmltree::Node;
use std::fmt;
use std::path::Path;

const ROOT_ELEMENT: &str = "hrd";

/// Display data attached to one region by an `assign` element.
pub trait RegionDefine: Sized + Clone + fmt::Debug {
    fn from_assign(node: Node<'_, '_>) -> Result<Self, String>;
}

/// Colors and font style for RGB-capable frontends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyledRegion {
    pub fore: Option<u32>,
    pub back: Option<u32>,
    pub style: u32,
}

impl RegionDefine for StyledRegion {
    fn from_assign(node: Node<'_, '_>) -> Result<Self, String> {
        Ok(Self {
            fore: node.attribute("fore").map(parse_number).transpose()?,
            back: node.attribute("back").map(parse_number).transpose()?,
            style: node
                .attribute("style")
                .map(parse_number)
                .transpose()?
                .unwrap_or(0),
        })
    }
}

/// Markup wrapped around a region by text-oriented frontends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRegion {
    pub stext: Option<String>,
    pub etext: Option<String>,
    pub sback: Option<String>,
    pub eback: Option<String>,
}

impl RegionDefine for TextRegion {
    fn from_assign(node: Node<'_, '_>) -> Result<Self, String> {
        let text = |name: &str| node.attribute(name).map(str::to_string);
        Ok(Self {
            stext: text("stext"),
            etext: text("etext"),
            sback: text("sback"),
            eback: text("eback"),
        })
    }
}

/// Accepts `#rrggbb`, `0x..` and decimal.
fn parse_number(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    let parsed = if let Some(hex) = raw.strip_prefix('#') {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        raw.parse()
    };
    parsed.map_err(|err| format!("invalid number '{raw}': {err}"))
}

#[derive(Debug, Clone)]
pub struct RegionMapper<D> {
    regions: IndexMap<String, D>,
}

pub type StyledMapper = RegionMapper<StyledRegion>;
pub type TextMapper = RegionMapper<TextRegion>;

impl<D> Default for RegionMapper<D> {
    fn default() -> Self {
        Self {
            regions: IndexMap::new(),
        }
    }
}

impl<D: RegionDefine> RegionMapper<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `source`, merge its assignments and close it again.
    pub fn load_region_mappings(&mut self, source: &mut FileSource) -> Result<(), SourceError> {
        source.with_stream(|location, bytes| self.load_bytes(location, bytes))
    }

    /// Merge one hrd document. A malformed document changes nothing.
    pub fn load_bytes(&mut self, location: &Path, bytes: &[u8]) -> Result<(), SourceError> {
        let text =
            std::str::from_utf8(bytes).map_err(|err| SourceError::malformed(location, err))?;
        let document = parse_document(text).map_err(|err| SourceError::malformed(location, err))?;

        let root = document.root_element();
        if root.tag_name().name() != ROOT_ELEMENT {
            return Err(SourceError::malformed(
                location,
                format!(
                    "root element is <{}>, expected <{ROOT_ELEMENT}>",
                    root.tag_name().name()
                ),
            ));
        }

        let mut staged = Vec::new();
        for assign in root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "assign")
        {
            let Some(name) = assign.attribute("name") else {
                return Err(SourceError::malformed(location, "<assign> without name"));
            };
            let define = D::from_assign(assign)
                .map_err(|reason| SourceError::malformed(location, format!("{name}: {reason}")))?;
            staged.push((name.to_string(), define));
        }

        debug!(source:? = location, regions = staged.len(); "Loaded region mappings");
        self.regions.extend(staged);
        Ok(())
    }

    pub fn region(&self, name: &str) -> Option<&D> {
        self.regions.get(name)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Mapped region names in first-assignment order.
    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styled_assignments_parse_colors() {
        let mut mapper = StyledMapper::new();
        mapper
            .load_bytes(
                Path::new("/hrd/default.hrd"),
                br##"<hrd>
                      <assign name="def:Text" fore="#000000" back="#ffffff"/>
                      <assign name="def:Comment" fore="0x808080" style="2"/>
                    </hrd>"##,
            )
            .unwrap();

        assert_eq!(
            mapper.region("def:Text"),
            Some(&StyledRegion {
                fore: Some(0),
                back: Some(0xffffff),
                style: 0
            })
        );
        assert_eq!(mapper.region("def:Comment").unwrap().fore, Some(0x808080));
        assert_eq!(mapper.region("def:Comment").unwrap().style, 2);
    }

    #[test]
    fn doctype_header_is_accepted() {
        let mut mapper = StyledMapper::new();
        mapper
            .load_bytes(
                Path::new("/hrd/rgb/default.hrd"),
                br##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE hrd PUBLIC "-//Cail Lomecb//DTD Colorer HRD take5//EN"
  "http://colorer.sf.net/2003/hrd.dtd">
<hrd><assign name="def:Text" fore="#000000"/></hrd>"##,
            )
            .unwrap();
        assert_eq!(mapper.region("def:Text").unwrap().fore, Some(0));
    }

    #[test]
    fn later_source_overrides_earlier() {
        let mut mapper = StyledMapper::new();
        mapper
            .load_bytes(
                Path::new("/a.hrd"),
                br##"<hrd><assign name="def:Text" fore="#111111"/><assign name="def:Error" fore="#ff0000"/></hrd>"##,
            )
            .unwrap();
        mapper
            .load_bytes(
                Path::new("/b.hrd"),
                br##"<hrd><assign name="def:Text" fore="#222222"/></hrd>"##,
            )
            .unwrap();

        assert_eq!(mapper.region_count(), 2);
        assert_eq!(mapper.region("def:Text").unwrap().fore, Some(0x222222));
        assert_eq!(
            mapper.region_names().collect::<Vec<_>>(),
            vec!["def:Text", "def:Error"]
        );
    }

    #[test]
    fn bad_color_rejects_whole_source() {
        let mut mapper = StyledMapper::new();
        let err = mapper
            .load_bytes(
                Path::new("/bad.hrd"),
                br##"<hrd><assign name="def:Text" fore="#000"/><assign name="def:X" fore="blue"/></hrd>"##,
            )
            .unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
        assert_eq!(mapper.region_count(), 0);
    }

    #[test]
    fn text_assignments_keep_markup() {
        let mut mapper = TextMapper::new();
        mapper
            .load_bytes(
                Path::new("/text.hrd"),
                br#"<hrd><assign name="def:Keyword" stext="&lt;b&gt;" etext="&lt;/b&gt;"/></hrd>"#,
            )
            .unwrap();
        let keyword = mapper.region("def:Keyword").unwrap();
        assert_eq!(keyword.stext.as_deref(), Some("<b>"));
        assert_eq!(keyword.etext.as_deref(), Some("</b>"));
        assert_eq!(keyword.sback, None);
    }

    #[test]
    fn wrong_root_is_malformed() {
        let mut mapper = TextMapper::new();
        assert!(mapper.load_bytes(Path::new("/x.hrd"), b"<hrc/>").is_err());
    }
}
