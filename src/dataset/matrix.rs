use serde_json::Value;

use crate::error::{AnnotateError, Result};

/// Row-major 2-D array of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 || values.len() != rows * cols {
            return Err(AnnotateError::Render(format!(
                "matrix of {rows}x{cols} cannot hold {} values",
                values.len()
            )));
        }
        Ok(Self { rows, cols, values })
    }

    /// Reads a nested JSON array. Rows must all have the same length;
    /// `null` cells become NaN.
    pub fn from_value(value: &Value) -> Result<Self> {
        let outer = value
            .as_array()
            .ok_or_else(|| AnnotateError::Render(format!("expected a 2-D array, got {value}")))?;

        let mut cols = None;
        let mut values = Vec::new();
        for (r, row) in outer.iter().enumerate() {
            let row = row.as_array().ok_or_else(|| {
                AnnotateError::Render(format!("row {r} of the image is not an array"))
            })?;
            match cols {
                None => cols = Some(row.len()),
                Some(c) if c != row.len() => {
                    return Err(AnnotateError::Render(format!(
                        "ragged image: row {r} has {} cells, expected {c}",
                        row.len()
                    )))
                }
                Some(_) => {}
            }
            for cell in row {
                let v = match cell {
                    Value::Null => f64::NAN,
                    other => other.as_f64().ok_or_else(|| {
                        AnnotateError::Render(format!("image cell {other} is not a number"))
                    })?,
                };
                values.push(v);
            }
        }

        Self::new(outer.len(), cols.unwrap_or(0), values)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(
            self.values
                .chunks_exact(self.cols)
                .map(|row| Value::Array(row.iter().map(|&v| Value::from(v)).collect()))
                .collect(),
        )
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// Smallest and largest finite values, `None` when there are none.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_arrays() {
        let m = Matrix::from_value(&json!([[0.0, 1.0, 2.0], [3, 4, null]])).unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 3));
        assert_eq!(m.get(1, 0), 3.0);
        assert!(m.get(1, 2).is_nan());
        assert_eq!(m.finite_range(), Some((0.0, 4.0)));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(Matrix::from_value(&json!([[1.0], [1.0, 2.0]])).is_err());
        assert!(Matrix::from_value(&json!([])).is_err());
        assert!(Matrix::from_value(&json!([[]])).is_err());
        assert!(Matrix::from_value(&json!(3)).is_err());
        assert!(Matrix::from_value(&json!([["x"]])).is_err());
    }

    #[test]
    fn converts_back_to_json() {
        let m = Matrix::new(1, 2, vec![0.5, 0.25]).unwrap();
        assert_eq!(m.to_value(), json!([[0.5, 0.25]]));
    }
}
