use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories searched for type declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionScope {
    roots: Vec<PathBuf>,
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.depth() > 0 && (name.starts_with('.') || name == "target")
}

impl ResolutionScope {
    /// `root` and every directory beneath it (hidden and `target` directories
    /// excluded), plus the parent directory of each file
    pub fn discover(root: &Path, files: &[PathBuf]) -> Self {
        let mut roots = BTreeSet::new();

        if root.is_dir() {
            for entry in WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| e.file_type().is_dir() && !is_skipped(e))
            {
                match entry {
                    Ok(entry) => {
                        roots.insert(entry.into_path());
                    }
                    Err(err) => warn!("Skipping unreadable directory: {err}"),
                }
            }
        }

        for file in files {
            if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                roots.insert(parent.to_path_buf());
            }
        }

        debug!("Resolution scope has {} directories", roots.len());
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}
