use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to create apps directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read apps directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Turns a directory name into the label shown under the wheel:
/// lowercased, underscores as spaces, each word capitalized
pub fn display_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut word_start = true;

    for c in name.to_lowercase().replace('_', " ").chars() {
        if word_start && c.is_alphabetic() {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        word_start = !c.is_alphabetic();
    }

    label
}

/// One launchable application directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    name: String,
    dir: PathBuf,
    label: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let label = display_label(&name);
        Self {
            name,
            dir: dir.into(),
            label,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Applications found at startup, in directory-listing order. Never changes
/// while the launcher runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Lists the subdirectories of `root` that contain `entry_point`. The root
    /// is created if it does not exist yet.
    pub async fn scan(root: &Path, entry_point: &str) -> Result<Self, CatalogError> {
        if !tokio::fs::try_exists(root).await.unwrap_or(false) {
            info!("Apps directory {} missing, creating it", root.display());
            tokio::fs::create_dir_all(root)
                .await
                .map_err(|source| CatalogError::CreateDir {
                    path: root.to_path_buf(),
                    source,
                })?;
        }

        let read_error = |source| CatalogError::ReadDir {
            path: root.to_path_buf(),
            source,
        };
        let mut read_dir = tokio::fs::read_dir(root).await.map_err(read_error)?;

        let mut entries = Vec::new();
        while let Some(dir_entry) = read_dir.next_entry().await.map_err(read_error)? {
            let path = dir_entry.path();
            let is_dir = match dir_entry.file_type().await {
                Ok(file_type) => file_type.is_dir(),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !is_dir {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!("Skipping non UTF-8 directory {}", path.display());
                continue;
            };

            if tokio::fs::try_exists(path.join(entry_point))
                .await
                .unwrap_or(false)
            {
                debug!("Found application: {}", name);
                entries.push(CatalogEntry::new(name, path.clone()));
            } else {
                debug!("Ignoring {}: no {}", name, entry_point);
            }
        }

        info!(
            "Found {} applications in {}",
            entries.len(),
            root.display()
        );
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(display_label("space_invaders"), "Space Invaders");
        assert_eq!(display_label("PONG"), "Pong");
        assert_eq!(display_label("2048_clone"), "2048 Clone");
        assert_eq!(display_label("tic_tac_toe2x"), "Tic Tac Toe2X");
    }

    #[tokio::test]
    async fn scan_keeps_only_dirs_with_entry_point() {
        let root = tempfile::tempdir().unwrap();
        let make_app = |name: &str, with_entry: bool| {
            let dir = root.path().join(name);
            fs::create_dir(&dir).unwrap();
            if with_entry {
                fs::write(dir.join("main.py"), "print('hi')").unwrap();
            }
        };
        make_app("snake", true);
        make_app("broken", false);
        make_app("pong", true);
        fs::write(root.path().join("notes.txt"), "not an app").unwrap();

        let catalog = Catalog::scan(root.path(), "main.py").await.unwrap();

        let mut names: Vec<&str> = catalog.entries().iter().map(CatalogEntry::name).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["pong", "snake"]);
        assert!(catalog
            .entries()
            .iter()
            .all(|entry| entry.dir().join("main.py").exists()));
    }

    #[tokio::test]
    async fn missing_root_is_created_empty() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("games");

        let catalog = Catalog::scan(&root, "main.py").await.unwrap();

        assert!(catalog.is_empty());
        assert!(root.is_dir());
    }
}
