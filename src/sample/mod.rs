pub mod generate;

pub use generate::{random_identifiers, random_matrices, sample_rows};
