//! Manual labelling of datasets whose rows carry 2-D arrays.
//!
//! [`Data`] renders rows of a dataset file as images into a working
//! directory (`deploy`), and after the images were sorted into
//! label-named subdirectories reads that layout back into the dataset's
//! label column (`register`).

pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod render;
pub mod sample;
pub mod workdir;

pub use config::{AnnotateConfig, AnnotateConfigBuilder};
pub use data::{Data, DataState, DeployReport, Progress, RegisterReport};
pub use dataset::{CountKind, Dataset, Identifier, LabelSet};
pub use error::{AnnotateError, Result};
pub use render::{HeatmapRenderer, RenderOptions, Renderer};
pub use workdir::WorkDir;
