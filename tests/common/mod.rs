#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{json, Value};
use tempfile::TempDir;

use annotate::dataset::Matrix;
use annotate::{AnnotateConfig, AnnotateConfigBuilder, Data, RenderOptions, Renderer, Result};

/// Writes an empty file per render and remembers the paths in call order.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub paths: Rc<RefCell<Vec<PathBuf>>>,
}

impl Renderer for RecordingRenderer {
    fn render(&self, _matrix: &Matrix, path: &Path, _options: &RenderOptions) -> Result<()> {
        fs::write(path, b"")?;
        self.paths.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

impl RecordingRenderer {
    /// Recorded paths relative to `root`, with `/` separators.
    pub fn relative(&self, root: &Path) -> Vec<String> {
        self.paths
            .borrow()
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect()
    }
}

pub struct Workspace {
    pub tmp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("tempdir"),
        }
    }

    pub fn datafile(&self) -> PathBuf {
        self.tmp.path().join("data.json")
    }

    pub fn workdir(&self) -> PathBuf {
        self.tmp.path().join("work")
    }

    pub fn write_rows(&self, rows: Value) {
        fs::write(self.datafile(), serde_json::to_vec(&rows).unwrap()).unwrap();
    }

    pub fn read_rows(&self) -> Vec<Value> {
        let text = fs::read_to_string(self.datafile()).unwrap();
        serde_json::from_str::<Value>(&text)
            .unwrap()
            .as_array()
            .unwrap()
            .clone()
    }

    /// Builder pointing at this workspace: no initial labels, fixed seed.
    pub fn config(&self) -> AnnotateConfigBuilder {
        AnnotateConfig::builder()
            .datafile(self.datafile())
            .workdir(self.workdir())
            .labels(Vec::<String>::new())
            .seed(Some(11))
    }

    pub fn move_to_label(&self, file: &str, label: &str) {
        let dir = self.workdir().join(label);
        fs::create_dir_all(&dir).unwrap();
        fs::rename(self.workdir().join(file), dir.join(file)).unwrap();
    }

    pub fn place(&self, label: &str, file: &str) {
        let dir = self.workdir().join(label);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), b"").unwrap();
    }

    pub fn pool_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.workdir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn image() -> Value {
    json!([[0.0, 0.5], [0.5, 1.0]])
}

pub fn row(id: impl Into<Value>, label: &str) -> Value {
    json!({"id": id.into(), "img": image(), "label": label})
}

pub fn label_of(rows: &[Value], id: &str) -> String {
    rows.iter()
        .find(|r| r["id"] == json!(id))
        .and_then(|r| r["label"].as_str())
        .unwrap()
        .to_string()
}

pub fn recording_data(config: AnnotateConfig) -> (Data, RecordingRenderer) {
    let recorder = RecordingRenderer::default();
    let data = Data::new(config).with_renderer(Box::new(recorder.clone()));
    (data, recorder)
}
