//! Class code → genre label mapping
//!
//! Codes are 1-based ordinals into [`CLASS_LABELS`]. Codes outside the table
//! map to themselves when their string form already is a known label, else to
//! a `Class <code>` placeholder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Genre labels, ordinal 1..=5
pub const CLASS_LABELS: [&str; 5] = ["Classical", "Rock", "Pop", "Rap", "R&B"];

/// A class code as emitted by the classifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassCode {
    Int(i64),
    Text(String),
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassCode::Int(n) => write!(f, "{}", n),
            ClassCode::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ClassCode {
    fn from(n: i64) -> Self {
        ClassCode::Int(n)
    }
}

impl From<&str> for ClassCode {
    fn from(s: &str) -> Self {
        ClassCode::Text(s.to_string())
    }
}

impl ClassCode {
    /// Integer view; text codes holding an integer count too
    fn as_ordinal(&self) -> Option<i64> {
        match self {
            ClassCode::Int(n) => Some(*n),
            ClassCode::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Map a class code to its human label
pub fn class_code_to_label(code: &ClassCode) -> String {
    if let Some(n) = code.as_ordinal() {
        if (1..=CLASS_LABELS.len() as i64).contains(&n) {
            return CLASS_LABELS[(n - 1) as usize].to_string();
        }
    }
    let text = code.to_string();
    if CLASS_LABELS.contains(&text.as_str()) {
        return text;
    }
    format!("Class {}", code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_based_mapping() {
        assert_eq!(class_code_to_label(&ClassCode::Int(1)), "Classical");
        assert_eq!(class_code_to_label(&ClassCode::Int(2)), "Rock");
        assert_eq!(class_code_to_label(&ClassCode::Int(3)), "Pop");
        assert_eq!(class_code_to_label(&ClassCode::Int(4)), "Rap");
        assert_eq!(class_code_to_label(&ClassCode::Int(5)), "R&B");
    }

    #[test]
    fn test_numeric_text_code() {
        assert_eq!(class_code_to_label(&ClassCode::from("3")), "Pop");
    }

    #[test]
    fn test_out_of_range_placeholder() {
        assert_eq!(class_code_to_label(&ClassCode::Int(0)), "Class 0");
        assert_eq!(class_code_to_label(&ClassCode::Int(6)), "Class 6");
        assert_eq!(class_code_to_label(&ClassCode::Int(-2)), "Class -2");
    }

    #[test]
    fn test_label_text_passes_through() {
        assert_eq!(class_code_to_label(&ClassCode::from("R&B")), "R&B");
        assert_eq!(class_code_to_label(&ClassCode::from("Jazz")), "Class Jazz");
    }

    #[test]
    fn test_untagged_serde() {
        let codes: Vec<ClassCode> = serde_json::from_str(r#"[1, "Rock"]"#).unwrap();
        assert_eq!(codes, vec![ClassCode::Int(1), ClassCode::from("Rock")]);
    }
}
