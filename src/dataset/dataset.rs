use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use rand::Rng;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::config::INDEX_COLUMN;
use crate::config::AnnotateConfig;
use crate::error::{AnnotateError, Result};

use super::file::{self, Row};
use super::identifier::Identifier;
use super::labels::LabelSet;
use super::matrix::Matrix;

/// Row positions returned by [`Dataset::select`].
pub type Selection = Vec<usize>;

/// Column names and the unlabeled marker of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSchema {
    pub id_column: String,
    pub img_column: String,
    pub label_column: String,
    pub label_null: String,
}

impl DatasetSchema {
    pub fn from_config(config: &AnnotateConfig) -> Self {
        Self {
            id_column: config.col_filename.clone(),
            img_column: config.col_img.clone(),
            label_column: config.col_label.clone(),
            label_null: config.label_null.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKind {
    All,
    Annotated,
}

impl FromStr for CountKind {
    type Err = AnnotateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(CountKind::All),
            "annotated" => Ok(CountKind::Annotated),
            _ => Err(AnnotateError::InvalidCountKind(s.to_string())),
        }
    }
}

/// Why a working-directory file could not be matched to a row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    #[error("no row has identifier '{0}'")]
    NotFound(String),

    #[error("'{0}' is not a row position")]
    Malformed(String),

    #[error("row position {position} is out of range ({rows} rows)")]
    OutOfRange { position: usize, rows: usize },
}

/// The whole table, held in memory between `load` and `save`.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: DatasetSchema,
    rows: Vec<Row>,
    ids: Vec<Identifier>,
    by_stem: HashMap<String, Vec<usize>>,
    row_position_ids: bool,
}

impl Dataset {
    /// Loads and validates the dataset at `path`, appending every label it
    /// carries to `labels`.
    pub fn load(path: &Path, schema: DatasetSchema, labels: &mut LabelSet) -> Result<Self> {
        let rows = file::read_rows(path)?;
        let dataset = Self::from_rows(rows, schema, labels)?;
        info!(
            path = %path.display(),
            rows = dataset.count(CountKind::All),
            annotated = dataset.count(CountKind::Annotated),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_rows(mut rows: Vec<Row>, schema: DatasetSchema, labels: &mut LabelSet) -> Result<Self> {
        let row_position_ids = schema.id_column == INDEX_COLUMN
            && !rows.iter().any(|row| row.contains_key(INDEX_COLUMN));
        if row_position_ids {
            info!("column '{INDEX_COLUMN}' not found, using row positions as identifiers");
        }

        let mut ids = Vec::with_capacity(rows.len());
        for (position, row) in rows.iter_mut().enumerate() {
            coerce_label(row, &schema);

            if !row.contains_key(&schema.img_column) {
                return Err(AnnotateError::Schema(format!(
                    "row {position} has no '{}' column",
                    schema.img_column
                )));
            }

            let id = if row_position_ids {
                Identifier::Position(position)
            } else {
                let value = row.get(&schema.id_column).ok_or_else(|| {
                    AnnotateError::Schema(format!(
                        "row {position} has no '{}' column",
                        schema.id_column
                    ))
                })?;
                Identifier::from_value(value)?
            };
            ids.push(id);
        }

        let mut by_stem: HashMap<String, Vec<usize>> = HashMap::with_capacity(ids.len());
        for (position, id) in ids.iter().enumerate() {
            by_stem.entry(id.to_string()).or_default().push(position);
        }
        if by_stem.len() != rows.len() {
            let mut duplicates: Vec<&String> = by_stem
                .iter()
                .filter(|(_, positions)| positions.len() > 1)
                .map(|(stem, _)| stem)
                .collect();
            duplicates.sort();
            return Err(AnnotateError::Schema(format!(
                "each value of '{}' must be unique, duplicated: {duplicates:?}",
                schema.id_column
            )));
        }

        let dataset = Self {
            schema,
            rows,
            ids,
            by_stem,
            row_position_ids,
        };
        dataset.discover_labels(labels);
        Ok(dataset)
    }

    fn discover_labels(&self, labels: &mut LabelSet) {
        for position in 0..self.rows.len() {
            let label = self.label(position);
            if self.is_unlabeled(label) {
                continue;
            }
            if labels.insert(label) {
                debug!(label, "label found in dataset");
            }
        }
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn uses_row_positions(&self) -> bool {
        self.row_position_ids
    }

    pub fn is_unlabeled(&self, label: &str) -> bool {
        label == self.schema.label_null
    }

    pub fn count(&self, kind: CountKind) -> usize {
        match kind {
            CountKind::All => self.rows.len(),
            CountKind::Annotated => (0..self.rows.len())
                .filter(|&p| !self.is_unlabeled(self.label(p)))
                .count(),
        }
    }

    pub fn identifier(&self, position: usize) -> &Identifier {
        &self.ids[position]
    }

    pub fn label(&self, position: usize) -> &str {
        self.rows[position]
            .get(&self.schema.label_column)
            .and_then(Value::as_str)
            .unwrap_or(&self.schema.label_null)
    }

    pub fn set_label(&mut self, position: usize, label: &str) {
        self.rows[position].insert(
            self.schema.label_column.clone(),
            Value::String(label.to_string()),
        );
    }

    pub fn image(&self, position: usize) -> Result<Matrix> {
        let value = self.rows[position]
            .get(&self.schema.img_column)
            .ok_or_else(|| {
                AnnotateError::Schema(format!(
                    "row {} has no '{}' column",
                    self.ids[position], self.schema.img_column
                ))
            })?;
        Matrix::from_value(value).map_err(|e| match e {
            AnnotateError::Render(msg) => {
                AnnotateError::Render(format!("row {}: {msg}", self.ids[position]))
            }
            other => other,
        })
    }

    /// Rows whose file stem is `stem`.
    pub fn lookup(&self, stem: &str) -> std::result::Result<Vec<usize>, LookupFailure> {
        if self.row_position_ids {
            let position: usize = stem
                .parse()
                .map_err(|_| LookupFailure::Malformed(stem.to_string()))?;
            if position >= self.rows.len() {
                return Err(LookupFailure::OutOfRange {
                    position,
                    rows: self.rows.len(),
                });
            }
            return Ok(vec![position]);
        }

        self.by_stem
            .get(stem)
            .cloned()
            .ok_or_else(|| LookupFailure::NotFound(stem.to_string()))
    }

    /// Rows carrying `label` (`None` for unlabeled rows), optionally cut
    /// down to `n` rows either by sampling without replacement or by
    /// keeping the first `n` in table order.
    pub fn select<R: Rng + ?Sized>(
        &self,
        label: Option<&str>,
        sample: bool,
        head: bool,
        n: Option<usize>,
        rng: &mut R,
    ) -> Result<Selection> {
        if sample && head {
            return Err(AnnotateError::Config(
                "'sample' and 'head' cannot both be selected".to_string(),
            ));
        }

        let wanted = label.unwrap_or(&self.schema.label_null);
        let pool: Selection = (0..self.rows.len())
            .filter(|&p| self.label(p) == wanted)
            .collect();

        let selection = match n {
            Some(n) if sample => {
                let amount = n.min(pool.len());
                rand::seq::index::sample(rng, pool.len(), amount)
                    .into_iter()
                    .map(|i| pool[i])
                    .collect()
            }
            Some(n) if head => pool.into_iter().take(n).collect(),
            _ => pool,
        };

        debug!(
            label = label.unwrap_or("<unlabeled>"),
            selected = selection.len(),
            "select"
        );
        Ok(selection)
    }

    pub fn save(&self, path: &Path, backup: bool, backup_suffix: &str) -> Result<()> {
        file::write_rows(path, &self.rows, backup, backup_suffix)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

fn coerce_label(row: &mut Row, schema: &DatasetSchema) {
    let label = match row.get(&schema.label_column) {
        None | Some(Value::Null) => schema.label_null.clone(),
        Some(Value::String(_)) => return,
        Some(other) => {
            warn!(value = %other, "non-string label converted to text");
            other.to_string()
        }
    };
    row.insert(schema.label_column.clone(), Value::String(label));
}
