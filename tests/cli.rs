#![cfg(unix)]

// End-to-end guard rails for the catalog-info binary.
mod support;

use anyhow::{Context, Result};
use serde_json::Value;
use std::process::{Command, Output};
use support::{CatalogTree, hrc, hrd};

fn catalog_info(catalog: &str, args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_catalog-info"))
        .arg("--catalog")
        .arg(catalog)
        .args(args)
        .env_remove("COLORER5HRD")
        .env_remove("RUST_LOG")
        .output()
        .context("failed to run catalog-info")
}

fn fixture() -> (CatalogTree, String) {
    let tree = CatalogTree::new();
    tree.write("hrc/proto.hrc", &hrc(&["c", "rust"]));
    tree.write("hrd/rgb/default.hrd", &hrd(&[("def:Text", "#000000")]));
    let catalog = tree.write_catalog(
        r#"<hrc-sets><location link="hrc/proto.hrc"/></hrc-sets>
           <hrd-sets>
             <hrd class="rgb" name="default" description="Default">
               <location link="hrd/rgb/default.hrd"/>
             </hrd>
             <hrd class="rgb" name="blue"><location link="hrd/rgb/blue.hrd"/></hrd>
           </hrd-sets>"#,
    );
    (tree, catalog)
}

#[test]
fn list_json_reports_registry() -> Result<()> {
    let (_tree, catalog) = fixture();
    let output = catalog_info(&catalog, &["list", "--json"])?;
    assert!(output.status.success(), "{output:?}");

    let listing: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(listing["hrc_locations"][0], "hrc/proto.hrc");
    let class = &listing["hrd_classes"][0];
    assert_eq!(class["class"], "rgb");
    assert_eq!(class["schemes"][0]["name"], "default");
    assert_eq!(class["schemes"][0]["description"], "Default");
    assert_eq!(class["schemes"][1]["description"], "blue");
    Ok(())
}

#[test]
fn grammars_lists_file_types() -> Result<()> {
    let (_tree, catalog) = fixture();
    let output = catalog_info(&catalog, &["grammars"])?;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("2 file types from 1 sources"), "{stdout}");
    assert!(stdout.contains("  rust - rust"), "{stdout}");
    Ok(())
}

#[test]
fn styled_reports_regions() -> Result<()> {
    let (_tree, catalog) = fixture();
    let output = catalog_info(&catalog, &["styled"])?;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 regions"), "{stdout}");
    assert!(stdout.contains("def:Text"), "{stdout}");
    Ok(())
}

#[test]
fn styled_failure_exits_nonzero() -> Result<()> {
    let (_tree, catalog) = fixture();
    let output = catalog_info(&catalog, &["styled", "--name", "blue"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hrd/rgb/blue.hrd"), "{stderr}");
    Ok(())
}

#[test]
fn text_without_text_class_fails() -> Result<()> {
    let (_tree, catalog) = fixture();
    let output = catalog_info(&catalog, &["text"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("building text mapper"), "{stderr}");
    Ok(())
}

#[test]
fn missing_catalog_exits_nonzero() -> Result<()> {
    let tree = CatalogTree::new();
    let missing = tree.path("absent.xml");
    let output = catalog_info(&missing.display().to_string(), &["list"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading catalog"), "{stderr}");
    Ok(())
}
