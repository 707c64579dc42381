//! Shared test utilities for the pixelpit-press test suite.
//!
//! Provides an isolated copy of the bundled `content/` directory plus lookup
//! helpers over the scanned [`Catalog`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_content();
//! let catalog = scan(tmp.path()).unwrap();
//!
//! let beam = find_game(&catalog, "beam");
//! assert_eq!(beam.name, "BEAM");
//! assert_eq!(game_slugs(&catalog)[0], "beam");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::catalog::Catalog;
use crate::types::{GameDescriptor, Lab};

// =========================================================================
// Content setup
// =========================================================================

/// Copy the bundled `content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the repository content.
pub fn setup_content() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let content = Path::new(env!("CARGO_MANIFEST_DIR")).join("content");
    copy_dir_recursive(&content, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Catalog lookups (panic with a clear message on miss)
// =========================================================================

/// Find a game by slug. Panics if not found.
pub fn find_game<'a>(catalog: &'a Catalog, slug: &str) -> &'a GameDescriptor {
    catalog.game(slug).unwrap_or_else(|| {
        panic!(
            "game '{slug}' not found. Available: {:?}",
            game_slugs(catalog)
        )
    })
}

/// Find a lab by game slug. Panics if not found.
pub fn find_lab<'a>(catalog: &'a Catalog, slug: &str) -> &'a Lab {
    catalog.lab(slug).unwrap_or_else(|| {
        let slugs: Vec<&str> = catalog.labs.keys().map(String::as_str).collect();
        panic!("lab '{slug}' not found. Available: {slugs:?}")
    })
}

/// All game slugs in catalog order.
pub fn game_slugs(catalog: &Catalog) -> Vec<&str> {
    catalog.games.iter().map(|g| g.slug.as_str()).collect()
}
