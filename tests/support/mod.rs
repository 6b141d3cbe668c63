#![allow(dead_code)]

use colorer_factory::{ParserFactory, RecordingErrorHandler, SearchEnv};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

// Headers as shipped with the stock Colorer data files.
pub const CATALOG_DOCTYPE: &str = r#"<!DOCTYPE catalog PUBLIC "-//Cail Lomecb//DTD Colorer CATALOG//EN" "http://colorer.sf.net/2003/catalog.dtd">"#;
pub const HRC_DOCTYPE: &str = r#"<!DOCTYPE hrc PUBLIC "-//Cail Lomecb//DTD Colorer HRC take5//EN" "http://colorer.sf.net/2003/hrc.dtd">"#;
pub const HRD_DOCTYPE: &str = r#"<!DOCTYPE hrd PUBLIC "-//Cail Lomecb//DTD Colorer HRD take5//EN" "http://colorer.sf.net/2003/hrd.dtd">"#;

// Catalog layout in a temp directory, removed on drop.
pub struct CatalogTree {
    dir: TempDir,
}

impl CatalogTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("mkdir");
        path
    }

    /// Write `catalog.xml` at the root with `body` inside `<catalog>`.
    pub fn write_catalog(&self, body: &str) -> String {
        let xml = format!(
            "<?xml version=\"1.0\"?>\n{CATALOG_DOCTYPE}\n<catalog xmlns=\"http://colorer.sf.net/2003/catalog\">\n{body}\n</catalog>\n"
        );
        self.write("catalog.xml", &xml).display().to_string()
    }
}

pub fn hrc(prototypes: &[&str]) -> String {
    let body: String = prototypes
        .iter()
        .map(|name| format!("  <prototype name=\"{name}\" group=\"main\" description=\"{name}\"/>\n"))
        .collect();
    format!("{HRC_DOCTYPE}\n<hrc version=\"take5\">\n{body}</hrc>\n")
}

pub fn hrd(assigns: &[(&str, &str)]) -> String {
    let body: String = assigns
        .iter()
        .map(|(name, fore)| format!("  <assign name=\"{name}\" fore=\"{fore}\"/>\n"))
        .collect();
    format!("{HRD_DOCTYPE}\n<hrd>\n{body}</hrd>\n")
}

pub fn text_hrd(assigns: &[(&str, &str)]) -> String {
    let body: String = assigns
        .iter()
        .map(|(name, stext)| format!("  <assign name=\"{name}\" stext=\"{stext}\"/>\n"))
        .collect();
    format!("{HRD_DOCTYPE}\n<hrd>\n{body}</hrd>\n")
}

/// Factory over `catalog` with a recording sink and no scheme-name override.
pub fn load(catalog: &str) -> (ParserFactory, Rc<RecordingErrorHandler>) {
    let handler = Rc::new(RecordingErrorHandler::new());
    let factory = ParserFactory::builder()
        .with_error_handler(Rc::clone(&handler))
        .with_hrd_override(None)
        .with_search_env(SearchEnv::empty())
        .load_catalog(Some(catalog))
        .expect("catalog loads");
    (factory, handler)
}
