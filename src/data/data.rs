use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::AnnotateConfig;
use crate::dataset::file;
use crate::dataset::{CountKind, Dataset, DatasetSchema, LabelSet, Selection};
use crate::error::{AnnotateError, Result};
use crate::render::{HeatmapRenderer, RenderOptions, Renderer};
use crate::sample;
use crate::workdir::{is_directory_name, WorkDir};

use super::progress::{NoProgress, Progress};
use super::report::{DeployReport, RegisterReport};

const NOT_LOADED: &str = "data is not loaded, call load() first";

/// Lifecycle of a [`Data`]. A `Data` only exists with a validated
/// configuration, so it starts out `Configured`. `deploy` and `register`
/// leave it `Loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataState {
    Configured,
    Loaded,
}

/// Keeps a dataset file and a working directory in sync.
///
/// `deploy` renders rows into the working directory, a person moves the
/// images into label directories, and `register` writes those labels back
/// into the dataset. Calls that need a loaded dataset are skipped with a
/// warning before `load` succeeded and return `Ok(None)`.
pub struct Data {
    config: AnnotateConfig,
    labels: LabelSet,
    workdir: WorkDir,
    dataset: Option<Dataset>,
    renderer: Box<dyn Renderer>,
    rng: StdRng,
}

impl Data {
    pub fn new(config: AnnotateConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        debug!(seed, "sampling seed");

        Self {
            labels: config.labels.iter().collect(),
            workdir: WorkDir::new(&config.workdir, &config.imgext),
            dataset: None,
            renderer: Box::new(HeatmapRenderer),
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn state(&self) -> DataState {
        match self.dataset {
            Some(_) => DataState::Loaded,
            None => DataState::Configured,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn workdir(&self) -> &WorkDir {
        &self.workdir
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// The configuration with every label discovered so far, ready to be
    /// written back to a configuration file.
    pub fn config(&self) -> AnnotateConfig {
        AnnotateConfig {
            labels: self.labels.as_slice().to_vec(),
            ..self.config.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.count(CountKind::All)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row count of `kind`, 0 before loading.
    pub fn count(&self, kind: CountKind) -> usize {
        self.dataset.as_ref().map_or(0, |ds| ds.count(kind))
    }

    /// [`Data::count`] with the kind given as `"all"` or `"annotated"`.
    pub fn count_str(&self, kind: &str) -> Result<usize> {
        Ok(self.count(kind.parse()?))
    }

    pub fn info(&self) {
        info!(
            data = self.count(CountKind::All),
            annotated = self.count(CountKind::Annotated),
            labels = ?self.labels.as_slice(),
            "dataset info"
        );
    }

    pub fn load(&mut self) -> Result<()> {
        let schema = DatasetSchema::from_config(&self.config);
        let dataset = Dataset::load(&self.config.datafile, schema, &mut self.labels)?;
        self.dataset = Some(dataset);
        if self.config.verbose {
            self.info();
        }
        Ok(())
    }

    pub fn deploy(&mut self, figsize: Option<(f64, f64)>) -> Result<Option<DeployReport>> {
        self.deploy_with(figsize, &mut NoProgress)
    }

    /// Clears the working directory and renders the unlabeled pool into its
    /// root plus up to `n_example` examples into each label directory.
    pub fn deploy_with(
        &mut self,
        figsize: Option<(f64, f64)>,
        progress: &mut dyn Progress,
    ) -> Result<Option<DeployReport>> {
        let Some(dataset) = self.dataset.as_ref() else {
            warn!("deploy skipped: {NOT_LOADED}");
            return Ok(None);
        };

        let mut options = RenderOptions::from_config(&self.config)?;
        if let Some(figsize) = figsize {
            options.figsize = figsize;
        }

        let random = self.config.random;
        let pool = sorted_by_id(
            dataset,
            dataset.select(None, random, !random, self.config.n, &mut self.rng)?,
        );

        let mut jobs: Vec<(usize, PathBuf)> = pool
            .iter()
            .map(|&p| (p, self.workdir.root().join(dataset.identifier(p).file_name(self.workdir.imgext()))))
            .collect();
        for label in self.labels.iter() {
            if !is_directory_name(label) {
                warn!(label, "no examples deployed for a label that is not a directory name");
                continue;
            }
            let examples = sorted_by_id(
                dataset,
                dataset.select(Some(label), true, false, self.config.n_example, &mut self.rng)?,
            );
            let dir = self.workdir.label_dir(label);
            jobs.extend(
                examples
                    .into_iter()
                    .map(|p| (p, dir.join(dataset.identifier(p).file_name(self.workdir.imgext())))),
            );
        }

        self.workdir.clear(&self.labels)?;

        let total = jobs.len();
        let mut report = DeployReport::default();
        for (done, (position, path)) in jobs.into_iter().enumerate() {
            if progress.cancelled() {
                warn!(done, total, "deploy cancelled");
                report.cancelled = true;
                break;
            }

            let matrix = dataset.image(position)?;
            self.renderer.render(&matrix, &path, &options)?;
            debug!(id = %dataset.identifier(position), path = %path.display(), "rendered");

            if done < pool.len() {
                report.pool += 1;
            } else {
                report.examples += 1;
            }
            progress.on_item(done + 1, total);
        }

        info!(pool = report.pool, examples = report.examples, "deployed");
        Ok(Some(report))
    }

    pub fn register(&mut self, save: bool, backup: Option<bool>) -> Result<Option<RegisterReport>> {
        self.register_with(save, backup, &mut NoProgress)
    }

    /// Labels every row whose image sits in a label directory with that
    /// directory's name. Label directories created by hand are adopted as
    /// new labels. Files that match no row are counted as failures and
    /// otherwise ignored.
    ///
    /// With `save`, the dataset is written first and only then is the
    /// working directory emptied. A cancelled register saves nothing.
    pub fn register_with(
        &mut self,
        save: bool,
        backup: Option<bool>,
        progress: &mut dyn Progress,
    ) -> Result<Option<RegisterReport>> {
        let Some(dataset) = self.dataset.as_mut() else {
            warn!("register skipped: {NOT_LOADED}");
            return Ok(None);
        };

        for name in self.workdir.list_label_directories()? {
            if self.labels.insert(&name) {
                info!(label = %name, "label found in working directory");
            }
        }

        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for label in self.labels.iter() {
            files.extend(
                self.workdir
                    .list_image_files(Some(label))?
                    .into_iter()
                    .map(|path| (label.to_string(), path)),
            );
        }

        let total = files.len();
        let mut report = RegisterReport::default();
        for (done, (label, path)) in files.iter().enumerate() {
            if progress.cancelled() {
                warn!(done, total, "register cancelled");
                report.cancelled = true;
                break;
            }

            let Some(stem) = self.workdir.file_stem(path) else {
                report.failure += 1;
                continue;
            };
            match dataset.lookup(stem) {
                Ok(positions) => {
                    debug!(label = %label, id = stem, rows = ?positions, "register");
                    for position in positions {
                        dataset.set_label(position, label);
                    }
                    report.success += 1;
                }
                Err(failure) => {
                    warn!(file = %path.display(), "{failure}");
                    report.failure += 1;
                }
            }
            progress.on_item(done + 1, total);
        }

        info!(success = report.success, failure = report.failure, "registered");

        if save && !report.cancelled {
            self.save(backup)?;
            self.workdir.clear_flat()?;
        }
        Ok(Some(report))
    }

    /// Writes the dataset back to its file. `backup` falls back to the
    /// configured policy. Returns `false` when skipped before `load`.
    pub fn save(&self, backup: Option<bool>) -> Result<bool> {
        let Some(dataset) = self.dataset.as_ref() else {
            warn!("save skipped: {NOT_LOADED}");
            return Ok(false);
        };
        let backup = backup.unwrap_or(self.config.backup);
        dataset.save(&self.config.datafile, backup, &self.config.backup_suffix)?;
        Ok(true)
    }

    /// Writes an `id,label` table with one line per row. Only `"csv"` is
    /// supported. Returns the number of rows written.
    pub fn export(&self, path: &Path, format: &str) -> Result<Option<usize>> {
        let Some(dataset) = self.dataset.as_ref() else {
            warn!("export skipped: {NOT_LOADED}");
            return Ok(None);
        };
        if format != "csv" {
            return Err(AnnotateError::UnsupportedFormat(format.to_string()));
        }

        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "id,label")?;
        for position in 0..dataset.len() {
            writeln!(
                out,
                "{},{}",
                csv_field(&dataset.identifier(position).to_string()),
                csv_field(dataset.label(position))
            )?;
        }
        out.flush()?;

        info!(path = %path.display(), rows = dataset.len(), "exported");
        Ok(Some(dataset.len()))
    }

    /// Writes `count` rows of random 4x4 images under random unique
    /// identifiers to `path`, using the configured column names.
    pub fn create_sample_dataset(&mut self, path: &Path, count: usize, backup: Option<bool>) -> Result<()> {
        let schema = DatasetSchema::from_config(&self.config);
        let rows = sample::sample_rows(&schema, count, &mut self.rng)?;
        info!(
            path = %path.display(),
            count,
            col_filename = %schema.id_column,
            col_img = %schema.img_column,
            "creating sample dataset"
        );
        file::write_rows(
            path,
            &rows,
            backup.unwrap_or(self.config.backup),
            &self.config.backup_suffix,
        )
    }
}

fn sorted_by_id(dataset: &Dataset, mut selection: Selection) -> Selection {
    selection.sort_by(|&a, &b| dataset.identifier(a).cmp(dataset.identifier(b)));
    selection
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field(""), "");
    }

    #[test]
    fn calls_before_load_are_skipped() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = AnnotateConfig::builder()
            .datafile(tmp.path().join("data.json"))
            .workdir(tmp.path().join("work"))
            .build()
            .unwrap();
        let mut data = Data::new(config);

        assert_eq!(data.state(), DataState::Configured);
        assert_eq!(data.count(CountKind::All), 0);
        assert_eq!(data.count(CountKind::Annotated), 0);
        assert!(data.deploy(None).unwrap().is_none());
        assert!(data.register(true, None).unwrap().is_none());
        assert!(!data.save(None).unwrap());
        assert!(data.export(&tmp.path().join("out.csv"), "csv").unwrap().is_none());

        assert!(!tmp.path().join("work").exists());
        assert!(!tmp.path().join("data.json").exists());
    }
}
