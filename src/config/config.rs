use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};

/// Every key accepted in a configuration section, in file order.
pub const CONFIG_KEYS: [&str; 21] = [
    "datafile",
    "workdir",
    "n",
    "n_example",
    "col_filename",
    "col_img",
    "col_label",
    "labels",
    "label_null",
    "random",
    "seed",
    "imgext",
    "cmap",
    "vmin",
    "vmax",
    "figsize",
    "dpi",
    "backup",
    "backup_suffix",
    "verbose",
    "custom_cmaps",
];

/// Column name that selects the row position as identifier, unless the
/// dataset really has a column with that name.
pub const INDEX_COLUMN: &str = "index";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomColorMap {
    pub name: String,
    /// `#rrggbb` stops, evenly spaced from low to high.
    pub colors: Vec<String>,
}

/// Validated settings for one annotation workspace.
///
/// Optional numbers are written as `""` in configuration files when unset,
/// so that `n = ""` ("deploy everything") survives a save/load cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotateConfig {
    pub datafile: PathBuf,
    pub workdir: PathBuf,
    /// Rows deployed to the pool per cycle, `None` for all of them.
    #[serde(with = "blank_none")]
    pub n: Option<usize>,
    /// Example rows deployed per label, `None` for all of them.
    #[serde(with = "blank_none")]
    pub n_example: Option<usize>,
    pub col_filename: String,
    pub col_img: String,
    pub col_label: String,
    pub labels: Vec<String>,
    pub label_null: String,
    pub random: bool,
    /// Seed for deploy sampling, drawn from the OS when unset.
    #[serde(with = "blank_none")]
    pub seed: Option<u64>,
    pub imgext: String,
    #[serde(with = "blank_none")]
    pub cmap: Option<String>,
    #[serde(with = "blank_none")]
    pub vmin: Option<f64>,
    #[serde(with = "blank_none")]
    pub vmax: Option<f64>,
    /// Figure size in inches, rendered at `dpi` pixels per inch.
    pub figsize: (f64, f64),
    pub dpi: u32,
    pub backup: bool,
    pub backup_suffix: String,
    pub verbose: bool,
    pub custom_cmaps: Vec<CustomColorMap>,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            datafile: PathBuf::from("./data.json"),
            workdir: PathBuf::from("./work"),
            n: Some(30),
            n_example: Some(5),
            col_filename: "id".to_string(),
            col_img: "img".to_string(),
            col_label: "label".to_string(),
            labels: vec!["none".to_string()],
            label_null: String::new(),
            random: true,
            seed: None,
            imgext: ".png".to_string(),
            cmap: None,
            vmin: Some(0.0),
            vmax: Some(1.0),
            figsize: (4.0, 4.0),
            dpi: 100,
            backup: true,
            backup_suffix: "~".to_string(),
            verbose: false,
            custom_cmaps: Vec::new(),
        }
    }
}

impl AnnotateConfig {
    pub fn builder() -> AnnotateConfigBuilder {
        AnnotateConfigBuilder::new()
    }

    /// Copy used to re-deploy finished work: every annotated row goes to its
    /// label folder and the unlabeled pool stays empty.
    pub fn for_deploy_result(&self) -> Self {
        Self {
            n: Some(0),
            n_example: None,
            ..self.clone()
        }
    }
}

/// Builds an [`AnnotateConfig`] from defaults plus string overrides, the way
/// a configuration file section or a command line supplies them.
#[derive(Debug, Clone, Default)]
pub struct AnnotateConfigBuilder {
    config: AnnotateConfig,
}

impl AnnotateConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: AnnotateConfig) -> Self {
        Self { config }
    }

    /// Sets one option from its textual form. Empty strings clear optional
    /// values, lists are comma separated, booleans accept `0/1/true/false`.
    pub fn set(mut self, key: &str, value: &str) -> Result<Self> {
        let c = &mut self.config;
        match key {
            "datafile" => c.datafile = PathBuf::from(value),
            "workdir" => c.workdir = PathBuf::from(value),
            "n" => c.n = parse_optional(key, value)?,
            "n_example" => c.n_example = parse_optional(key, value)?,
            "col_filename" => c.col_filename = value.to_string(),
            "col_img" => c.col_img = value.to_string(),
            "col_label" => c.col_label = value.to_string(),
            "labels" => c.labels = split_list(value),
            "label_null" => c.label_null = value.to_string(),
            "random" => c.random = parse_bool(key, value)?,
            "seed" => c.seed = parse_optional(key, value)?,
            "imgext" => c.imgext = value.to_string(),
            "cmap" => c.cmap = (!value.is_empty()).then(|| value.to_string()),
            "vmin" => c.vmin = parse_optional(key, value)?,
            "vmax" => c.vmax = parse_optional(key, value)?,
            "figsize" => c.figsize = parse_figsize(value)?,
            "dpi" => c.dpi = parse_value(key, value)?,
            "backup" => c.backup = parse_bool(key, value)?,
            "backup_suffix" => c.backup_suffix = value.to_string(),
            "verbose" => c.verbose = parse_bool(key, value)?,
            "custom_cmaps" => {
                return Err(AnnotateError::Config(
                    "custom_cmaps can only be set from a configuration file".to_string(),
                ))
            }
            _ => return Err(AnnotateError::UnknownConfigKey(key.to_string())),
        }
        Ok(self)
    }

    pub fn datafile(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.datafile = path.into();
        self
    }

    pub fn workdir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.workdir = path.into();
        self
    }

    pub fn n(mut self, n: Option<usize>) -> Self {
        self.config.n = n;
        self
    }

    pub fn n_example(mut self, n: Option<usize>) -> Self {
        self.config.n_example = n;
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn random(mut self, random: bool) -> Self {
        self.config.random = random;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn backup(mut self, backup: bool) -> Self {
        self.config.backup = backup;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> Result<AnnotateConfig> {
        let mut config = self.config;
        config.cmap = config.cmap.filter(|name| !name.is_empty());

        check_columns(&config)?;
        check_rendering(&config)?;

        if !config.imgext.starts_with('.') || config.imgext.len() < 2 {
            return Err(AnnotateError::Config(format!(
                "imgext must look like '.png', got {:?}",
                config.imgext
            )));
        }
        if config.backup_suffix.is_empty() {
            return Err(AnnotateError::Config(
                "backup_suffix must not be empty".to_string(),
            ));
        }

        let mut labels: Vec<String> = Vec::with_capacity(config.labels.len());
        for label in config.labels.drain(..) {
            if label.is_empty() {
                return Err(AnnotateError::Config("labels must not be empty".to_string()));
            }
            if label == config.label_null {
                return Err(AnnotateError::Config(format!(
                    "label {label:?} equals the unlabeled marker"
                )));
            }
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        config.labels = labels;

        Ok(config)
    }
}

fn check_columns(config: &AnnotateConfig) -> Result<()> {
    let columns = [
        ("col_filename", &config.col_filename),
        ("col_img", &config.col_img),
        ("col_label", &config.col_label),
    ];
    for (key, name) in columns {
        if name.is_empty() {
            return Err(AnnotateError::Config(format!("{key} must not be empty")));
        }
    }
    if config.col_filename == config.col_img
        || config.col_filename == config.col_label
        || config.col_img == config.col_label
    {
        return Err(AnnotateError::Config(format!(
            "column names must be distinct: id={:?} img={:?} label={:?}",
            config.col_filename, config.col_img, config.col_label
        )));
    }
    Ok(())
}

fn check_rendering(config: &AnnotateConfig) -> Result<()> {
    let (width, height) = config.figsize;
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return Err(AnnotateError::Config(format!(
            "figsize must be positive, got ({width}, {height})"
        )));
    }
    if config.dpi == 0 {
        return Err(AnnotateError::Config("dpi must be positive".to_string()));
    }
    if let (Some(vmin), Some(vmax)) = (config.vmin, config.vmax) {
        if vmin >= vmax {
            return Err(AnnotateError::Config(format!(
                "vmin ({vmin}) must be smaller than vmax ({vmax})"
            )));
        }
    }
    for cmap in &config.custom_cmaps {
        if cmap.name.is_empty() || cmap.colors.len() < 2 {
            return Err(AnnotateError::Config(format!(
                "custom colormap {:?} needs a name and at least two colors",
                cmap.name
            )));
        }
        for color in &cmap.colors {
            crate::render::colormap::parse_hex_color(color)?;
        }
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AnnotateError::Config(format!("invalid value for {key}: {value:?}")))
}

fn parse_optional<T: std::str::FromStr>(key: &str, value: &str) -> Result<Option<T>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_value(key, value).map(Some)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(AnnotateError::Config(format!(
            "invalid boolean for {key}: {value:?}"
        ))),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_figsize(value: &str) -> Result<(f64, f64)> {
    let parts = split_list(value);
    match parts.as_slice() {
        [w, h] => Ok((parse_value("figsize", w)?, parse_value("figsize", h)?)),
        _ => Err(AnnotateError::Config(format!(
            "figsize must be 'width,height', got {value:?}"
        ))),
    }
}

mod blank_none {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Field<T> {
            Value(T),
            Text(String),
        }

        match Field::<T>::deserialize(deserializer)? {
            Field::Value(value) => Ok(Some(value)),
            Field::Text(text) if text.is_empty() => Ok(None),
            Field::Text(text) => Err(D::Error::custom(format!(
                "expected a value or an empty string, got {text:?}"
            ))),
        }
    }
}
