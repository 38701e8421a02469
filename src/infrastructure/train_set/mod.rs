//! Training set layout on disk
//!
//! The root holds one subdirectory per person; each subdirectory holds that
//! person's image files. Nested directories below a person are ignored.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::domain::face::validate_person_name;
use crate::domain::DomainError;

/// Images belonging to one person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonImages {
    pub name: String,
    pub images: Vec<PathBuf>,
}

/// A scanned training set
#[derive(Debug, Clone)]
pub struct TrainSet {
    root: PathBuf,
    people: Vec<PersonImages>,
}

impl TrainSet {
    /// Enumerate people and their images under `root`, sorted by name
    pub async fn scan(root: impl AsRef<Path>) -> Result<Self, DomainError> {
        let root = root.as_ref().to_path_buf();
        let mut people = Vec::new();

        for dir in list_entries(&root, EntryKind::Directory).await? {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                warn!(path = %dir.display(), "Skipping person directory with non UTF-8 name");
                continue;
            };

            if let Err(e) = validate_person_name(&name) {
                warn!(path = %dir.display(), error = %e, "Skipping person directory");
                continue;
            }

            let images = list_entries(&dir, EntryKind::File).await?;
            debug!(person = %name, images = images.len(), "Scanned person directory");

            people.push(PersonImages { name, images });
        }

        people.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { root, people })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn people(&self) -> &[PersonImages] {
        &self.people
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.people.iter().map(|p| p.name.as_str())
    }

    pub fn images_for(&self, name: &str) -> &[PathBuf] {
        self.people
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.images.as_slice())
            .unwrap_or(&[])
    }

    pub fn image_count(&self) -> usize {
        self.people.iter().map(|p| p.images.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

async fn list_entries(dir: &Path, kind: EntryKind) -> Result<Vec<PathBuf>, DomainError> {
    let io_error = |e: std::io::Error| DomainError::io(dir.display().to_string(), e.to_string());

    let mut reader = fs::read_dir(dir).await.map_err(io_error)?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await.map_err(io_error)? {
        let file_type = entry.file_type().await.map_err(io_error)?;

        let matches = match kind {
            EntryKind::Directory => file_type.is_dir(),
            EntryKind::File => file_type.is_file(),
        };

        if matches {
            entries.push(entry.path());
        }
    }

    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        std_fs::create_dir_all(path.parent().unwrap()).unwrap();
        std_fs::write(path, relative.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn test_scan_people_and_images() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bob/2.jpg");
        write(dir.path(), "bob/1.jpg");
        write(dir.path(), "alice/a.png");

        let set = TrainSet::scan(dir.path()).await.unwrap();

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["alice", "bob"]);
        assert_eq!(
            set.images_for("bob"),
            &[dir.path().join("bob/1.jpg"), dir.path().join("bob/2.jpg")]
        );
        assert_eq!(set.image_count(), 3);
    }

    #[tokio::test]
    async fn test_top_level_files_are_not_people() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.txt");
        write(dir.path(), "carol/1.jpg");

        let set = TrainSet::scan(dir.path()).await.unwrap();

        assert_eq!(set.people().len(), 1);
        assert_eq!(set.people()[0].name, "carol");
    }

    #[tokio::test]
    async fn test_nested_directories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dave/1.jpg");
        write(dir.path(), "dave/old/2.jpg");

        let set = TrainSet::scan(dir.path()).await.unwrap();

        assert_eq!(set.images_for("dave"), &[dir.path().join("dave/1.jpg")]);
    }

    #[tokio::test]
    async fn test_person_without_images() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::create_dir(dir.path().join("erin")).unwrap();

        let set = TrainSet::scan(dir.path()).await.unwrap();

        assert_eq!(set.people().len(), 1);
        assert!(set.images_for("erin").is_empty());
        assert!(set.images_for("nobody").is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TrainSet::scan(dir.path().join("missing")).await;

        assert!(matches!(result, Err(DomainError::Io { .. })));
    }
}
