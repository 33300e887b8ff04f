use anyhow::{bail, Context, Result};
use globset::GlobSet;
use ignore::WalkBuilder;
use log::{debug, info, warn};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use tempfile::TempDir;

/// Prefixes that mark an input as a git remote rather than a local path
const REMOTE_PREFIXES: &[&str] = &["https://", "http://", "ssh://", "git@"];

/// What the user pointed archgraph at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    Local(PathBuf),
    /// Cloned into a temporary directory for the duration of the run
    Repository(String),
}

impl SourceInput {
    /// Local path, if this is one
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path.as_path()),
            Self::Repository(_) => None,
        }
    }
}

impl FromStr for SourceInput {
    type Err = Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if REMOTE_PREFIXES.iter().any(|p| input.starts_with(p)) {
            Ok(Self::Repository(input.to_string()))
        } else {
            Ok(Self::Local(PathBuf::from(input)))
        }
    }
}

/// Sources on disk. A cloned repository is removed when this is dropped.
#[derive(Debug)]
pub struct Checkout {
    path: PathBuf,
    _clone: Option<TempDir>,
}

impl Checkout {
    pub fn open(input: &SourceInput) -> Result<Self> {
        match input {
            SourceInput::Local(path) => Ok(Self {
                path: path.clone(),
                _clone: None,
            }),
            SourceInput::Repository(url) => {
                let clone = clone_repository(url)?;
                Ok(Self {
                    path: clone.path().to_path_buf(),
                    _clone: Some(clone),
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Shallow `git clone` of `url` into a fresh temporary directory
fn clone_repository(url: &str) -> Result<TempDir> {
    let dir = tempfile::Builder::new()
        .prefix("archgraph-")
        .tempdir()
        .context("Failed to create a directory for the clone")?;
    info!("Cloning {url} into {}", dir.path().display());

    let output = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg("--quiet")
        .arg(url)
        .arg(dir.path())
        .output()
        .context("Failed to run git")?;
    if !output.status.success() {
        bail!(
            "git clone {url} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(dir)
}

/// Directory that qualified names are resolved against
pub fn source_root(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}

/// `.java` files under `input`, sorted.
///
/// A single file is taken as-is. Directories are walked honouring
/// `.gitignore`; paths matching `exclude` (relative to `input`) are skipped.
pub fn collect_java_files(input: &Path, exclude: &GlobSet) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input path does not exist: {}", input.display());
    }

    let walker = WalkBuilder::new(input)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_java(path) {
            continue;
        }
        let relative = path.strip_prefix(input).unwrap_or(path);
        if exclude.is_match(relative) {
            debug!("Excluded {}", relative.display());
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn is_java(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "java")
}

#[cfg(test)]
mod tests {
    use super::*;
    use globset::{Glob, GlobSetBuilder};
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "class X {}").unwrap();
    }

    #[test]
    fn test_collects_java_sources_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/b/B.java");
        touch(dir.path(), "src/a/A.java");
        touch(dir.path(), "README.md");
        touch(dir.path(), "build/Gen.java");
        fs::write(dir.path().join(".gitignore"), "build/\n").unwrap();

        let files = collect_java_files(dir.path(), &GlobSet::empty()).unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("src/a/A.java"), dir.path().join("src/b/B.java")]
        );
    }

    #[test]
    fn test_exclude_globs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/A.java");
        touch(dir.path(), "src/generated/G.java");
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new("**/generated/**").unwrap());

        let files = collect_java_files(dir.path(), &builder.build().unwrap()).unwrap();

        assert_eq!(files, vec![dir.path().join("src/A.java")]);
    }

    #[test]
    fn test_remote_inputs_are_repositories() {
        for url in [
            "https://github.com/acme/shop.git",
            "http://git.local/shop",
            "ssh://git@host/shop.git",
            "git@github.com:acme/shop.git",
        ] {
            assert_eq!(
                url.parse::<SourceInput>().unwrap(),
                SourceInput::Repository(url.to_string())
            );
        }
    }

    #[test]
    fn test_paths_are_local() {
        for path in ["src", "./https", "/tmp/git@host", "Main.java"] {
            let input: SourceInput = path.parse().unwrap();
            assert_eq!(input.local_path(), Some(Path::new(path)));
        }
    }

    #[test]
    fn test_local_checkout_is_the_path_itself() {
        let dir = tempfile::tempdir().unwrap();
        let input = SourceInput::Local(dir.path().to_path_buf());

        let checkout = Checkout::open(&input).unwrap();

        assert_eq!(checkout.path(), dir.path());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_failed_clone_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-repo");

        assert!(clone_repository(&missing.display().to_string()).is_err());
    }

    #[test]
    fn test_single_file_and_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "One.java");
        let file = dir.path().join("One.java");

        assert_eq!(
            collect_java_files(&file, &GlobSet::empty()).unwrap(),
            vec![file.clone()]
        );
        assert_eq!(source_root(&file), dir.path());
        assert!(collect_java_files(&dir.path().join("nope"), &GlobSet::empty()).is_err());
    }
}
