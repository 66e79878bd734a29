use pagemap_core::{Node, Orphan, OrphanKind, TreeModel};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A site with `sections` level-1 pages, each holding `pages` articles that
/// share a URL prefix, plus a handful of orphans.
pub fn synthetic_site(sections: usize, pages: usize) -> anyhow::Result<TreeModel> {
    let mut root = Node::new("home", "Home", "/");
    for s in 0..sections {
        let mut section = Node::new(format!("s{s}"), format!("Section {s}"), format!("/s{s}"));
        for p in 0..pages {
            let mut page = Node::new(
                format!("s{s}-p{p}"),
                format!("Article {p}"),
                format!("/s{s}/article-{p}"),
            );
            if p % 10 == 0 {
                page = page.with_child(Node::new(
                    format!("s{s}-p{p}-detail"),
                    "Details",
                    format!("/s{s}/article-{p}/details"),
                ));
            }
            section = section.with_child(page);
        }
        root = root.with_child(section);
    }

    let orphans = (0..sections.min(8))
        .map(|i| {
            let kind = if i % 2 == 0 {
                OrphanKind::Subdomain
            } else {
                OrphanKind::Plain
            };
            Orphan::new(
                Node::new(format!("o{i}"), format!("Orphan {i}"), format!("/o{i}")),
                kind,
            )
        })
        .collect();

    Ok(TreeModel::from_parts(root, orphans, Vec::new())?)
}

/// A single chain of `depth` pages.
pub fn synthetic_chain(depth: usize) -> anyhow::Result<TreeModel> {
    let mut node = Node::new(format!("c{depth}"), "Leaf", "/leaf");
    for i in (0..depth).rev() {
        node = Node::new(format!("c{i}"), format!("Level {i}"), format!("/c/{i}")).with_child(node);
    }
    Ok(TreeModel::from_parts(node, Vec::new(), Vec::new())?)
}

/// Writes `model` as a JSON document into a fresh temporary directory.
pub fn write_document(model: &TreeModel) -> anyhow::Result<(TempDir, PathBuf)> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("site.json");
    fs::write(&path, serde_json::to_string(model)?)?;
    Ok((temp_dir, path))
}
