use std::fmt;

use serde_json::Value;

use crate::error::{AnnotateError, Result};

/// Per-row key. Its `Display` form is the file stem used in the working
/// directory, so two identifiers with the same text name the same file.
///
/// Ordering is numeric for positions and integers and lexical for text,
/// integers sorting before text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Position(usize),
    Int(i64),
    Text(String),
}

impl Identifier {
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = match value {
            Value::String(s) => Identifier::Text(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Identifier::Int(i),
                None => Identifier::Text(n.to_string()),
            },
            other => {
                return Err(AnnotateError::Schema(format!(
                    "identifier must be a string or a number, got {other}"
                )))
            }
        };
        id.check_file_stem()?;
        Ok(id)
    }

    fn check_file_stem(&self) -> Result<()> {
        if let Identifier::Text(s) = self {
            if s.is_empty() || s == "." || s == ".." || s.contains(['/', '\\', '\0']) {
                return Err(AnnotateError::Schema(format!(
                    "identifier {s:?} cannot be used as a file name"
                )));
            }
        }
        Ok(())
    }

    pub fn file_name(&self, ext: &str) -> String {
        format!("{self}{ext}")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Position(p) => write!(f, "{p}"),
            Identifier::Int(i) => write!(f, "{i}"),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_json_values() {
        assert_eq!(
            Identifier::from_value(&json!("a1")).unwrap(),
            Identifier::Text("a1".into())
        );
        assert_eq!(Identifier::from_value(&json!(12)).unwrap(), Identifier::Int(12));
        assert_eq!(
            Identifier::from_value(&json!(1.5)).unwrap().to_string(),
            "1.5"
        );
        assert!(Identifier::from_value(&json!(null)).is_err());
        assert!(Identifier::from_value(&json!(["a"])).is_err());
    }

    #[test]
    fn rejects_path_like_text() {
        for bad in ["", "..", "a/b", "a\\b"] {
            assert!(Identifier::from_value(&json!(bad)).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn integers_sort_numerically() {
        let mut ids = vec![Identifier::Int(10), Identifier::Int(2), Identifier::Int(-1)];
        ids.sort();
        assert_eq!(ids, vec![Identifier::Int(-1), Identifier::Int(2), Identifier::Int(10)]);
    }

    #[test]
    fn file_name_appends_extension() {
        assert_eq!(Identifier::Position(3).file_name(".png"), "3.png");
        assert_eq!(Identifier::Text("a1".into()).file_name(".png"), "a1.png");
    }
}
