pub mod dataset;
pub mod file;
pub mod identifier;
pub mod labels;
pub mod matrix;

pub use dataset::{CountKind, Dataset, DatasetSchema, LookupFailure, Selection};
pub use identifier::Identifier;
pub use labels::LabelSet;
pub use matrix::Matrix;
