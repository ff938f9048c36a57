use std::collections::HashSet;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;

use crate::dataset::file::Row;
use crate::dataset::{DatasetSchema, Matrix};
use crate::error::{AnnotateError, Result};

pub const SAMPLE_SHAPE: (usize, usize) = (4, 4);
pub const SAMPLE_ID_LEN: usize = 8;

/// Draws from this many candidates per requested identifier before giving up.
pub const ID_DRAWS_PER_VALUE: usize = 5;

/// `n` matrices of the given shape with values uniform in `[0, 1)`.
pub fn random_matrices<R: Rng + ?Sized>(
    n: usize,
    shape: (usize, usize),
    rng: &mut R,
) -> Result<Vec<Matrix>> {
    let (rows, cols) = shape;
    (0..n)
        .map(|_| Matrix::new(rows, cols, (0..rows * cols).map(|_| rng.gen::<f64>()).collect()))
        .collect()
}

/// `n` distinct alphanumeric strings of length `len`, in draw order.
pub fn random_identifiers<R: Rng + ?Sized>(n: usize, len: usize, rng: &mut R) -> Result<Vec<String>> {
    let mut seen = HashSet::with_capacity(n);
    let mut ids = Vec::with_capacity(n);

    for _ in 0..n * ID_DRAWS_PER_VALUE {
        if ids.len() >= n {
            break;
        }
        let id: String = (&mut *rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    if ids.len() < n {
        return Err(AnnotateError::Generation {
            requested: n,
            produced: ids.len(),
        });
    }
    Ok(ids)
}

/// Rows with a random identifier and a random 4x4 image each. No label
/// column is written, loading fills it in.
pub fn sample_rows<R: Rng + ?Sized>(schema: &DatasetSchema, count: usize, rng: &mut R) -> Result<Vec<Row>> {
    let images = random_matrices(count, SAMPLE_SHAPE, rng)?;
    let ids = random_identifiers(count, SAMPLE_ID_LEN, rng)?;

    Ok(ids
        .into_iter()
        .zip(images)
        .map(|(id, image)| {
            let mut row = Row::new();
            row.insert(schema.id_column.clone(), Value::String(id));
            row.insert(schema.img_column.clone(), image.to_value());
            row
        })
        .collect())
}
