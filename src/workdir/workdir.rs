use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::dataset::LabelSet;
use crate::error::{AnnotateError, Result};

/// The directory images are deployed to and sorted in.
///
/// Layout: `<root>/<id><ext>` for the unlabeled pool and
/// `<root>/<label>/<id><ext>` for labelled files.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
    imgext: String,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>, imgext: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            imgext: imgext.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn imgext(&self) -> &str {
        &self.imgext
    }

    pub fn label_dir(&self, label: &str) -> PathBuf {
        self.root.join(label)
    }

    /// Removes everything under the root and recreates it with one empty
    /// subdirectory per label. Labels that cannot name a directory get none.
    pub fn clear(&self, labels: &LabelSet) -> Result<()> {
        self.reset()?;
        for label in labels.iter() {
            if !is_directory_name(label) {
                warn!(label, "label is not a valid directory name, no folder created");
                continue;
            }
            let dir = self.label_dir(label);
            fs::create_dir(&dir).map_err(|e| self.error(format!("cannot create {label:?}: {e}")))?;
        }
        info!(root = %self.root.display(), labels = labels.len(), "working directory cleared");
        Ok(())
    }

    /// Like [`WorkDir::clear`] without any label subdirectories.
    pub fn clear_flat(&self) -> Result<()> {
        self.reset()?;
        info!(root = %self.root.display(), "working directory cleared");
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        match fs::symlink_metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(&self.root)
                    .map_err(|e| self.error(format!("cannot remove: {e}")))?;
            }
            Ok(_) => return Err(self.error("exists and is not a directory".to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.error(e.to_string())),
        }
        fs::create_dir_all(&self.root).map_err(|e| self.error(format!("cannot create: {e}")))
    }

    /// Names of the immediate subdirectories, sorted.
    pub fn list_label_directories(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Image files directly under the root (`None`) or under a label
    /// directory, sorted by name. A missing label directory has no files.
    pub fn list_image_files(&self, label: Option<&str>) -> Result<Vec<PathBuf>> {
        let dir = match label {
            Some(label) => self.label_dir(label),
            None => self.root.clone(),
        };
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "no such label directory");
            return Ok(Vec::new());
        }

        // read_dir order depends on the filesystem
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| self.file_stem(path).is_some())
            .collect();
        files.sort_unstable();
        Ok(files)
    }

    /// File name with the image extension removed, `None` when the file
    /// does not carry the extension.
    pub fn file_stem<'a>(&self, path: &'a Path) -> Option<&'a str> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(self.imgext.as_str()))
            .filter(|stem| !stem.is_empty())
    }

    fn error(&self, reason: String) -> AnnotateError {
        AnnotateError::WorkDir {
            path: self.root.clone(),
            reason,
        }
    }
}

/// True when `label` is a single normal path component, usable as a label
/// folder name.
pub fn is_directory_name(label: &str) -> bool {
    let mut components = Path::new(label).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == label
    )
}
