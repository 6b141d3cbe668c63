//! Grammar definitions (hrc) loaded from catalog sources.
//!
//! Only the declarations matter at this layer: each `prototype` or `type`
//! element names a file type. Region tokenizing is left to the text parser
//! that consumes these definitions.

use crate::error::SourceError;
use crate::source::{FileSource, parse_document};
use indexmap::IndexMap;
use log::debug;
use std::path::{Path, PathBuf};

const ROOT_ELEMENT: &str = "hrc";

/// A file type declared by a grammar source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    pub name: String,
    pub group: Option<String>,
    pub description: Option<String>,
    /// Resolved path of the source that declared it.
    pub source: PathBuf,
}

/// Set of grammar definitions. Later declarations of a name replace earlier
/// ones, so catalog order decides which definition wins.
#[derive(Debug, Default)]
pub struct HrcParser {
    file_types: IndexMap<String, FileType>,
    sources: Vec<PathBuf>,
}

impl HrcParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `source`, load its declarations and close it again.
    pub fn load_source(&mut self, source: &mut FileSource) -> Result<(), SourceError> {
        source.with_stream(|location, bytes| self.load_bytes(location, bytes))
    }

    /// Load one grammar document. Nothing is registered unless the whole
    /// document parses.
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

        let mut declared = Vec::new();
        for node in root.children().filter(|n| n.is_element()) {
            let kind = node.tag_name().name();
            if kind != "prototype" && kind != "type" {
                continue;
            }
            let Some(name) = node.attribute("name") else {
                return Err(SourceError::malformed(location, format!("<{kind}> without name")));
            };
            declared.push(FileType {
                name: name.to_string(),
                group: node.attribute("group").map(str::to_string),
                description: node.attribute("description").map(str::to_string),
                source: location.to_path_buf(),
            });
        }

        debug!(source:? = location, file_types = declared.len(); "Loaded grammar source");
        for file_type in declared {
            // A bare <type> keeps the prototype's metadata.
            if file_type.group.is_none() && file_type.description.is_none() {
                if let Some(existing) = self.file_types.get_mut(&file_type.name) {
                    existing.source = file_type.source;
                    continue;
                }
            }
            self.file_types.insert(file_type.name.clone(), file_type);
        }
        self.sources.push(location.to_path_buf());
        Ok(())
    }

    pub fn file_type(&self, name: &str) -> Option<&FileType> {
        self.file_types.get(name)
    }

    pub fn file_types(&self) -> impl Iterator<Item = &FileType> {
        self.file_types.values()
    }

    pub fn file_type_count(&self) -> usize {
        self.file_types.len()
    }

    /// Sources loaded successfully, in load order.
    pub fn loaded_sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// Per-document parser handle bound to a file type from an [`HrcParser`].
#[derive(Debug, Default, Clone)]
pub struct TextParser {
    file_type: Option<String>,
}

impl TextParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file_type(&mut self, file_type: &FileType) {
        self.file_type = Some(file_type.name.clone());
    }

    pub fn file_type(&self) -> Option<&str> {
        self.file_type.as_deref()
    }
}
