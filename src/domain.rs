use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpecimenError;

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Family,
    Genus,
    Species,
    FullName,
}

impl TargetType {
    pub const ALL: [TargetType; 4] = [
        TargetType::Family,
        TargetType::Genus,
        TargetType::Species,
        TargetType::FullName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Family => "family",
            TargetType::Genus => "genus",
            TargetType::Species => "species",
            TargetType::FullName => "full_name",
        }
    }

    pub fn position(&self) -> usize {
        match self {
            TargetType::Family => 0,
            TargetType::Genus => 1,
            TargetType::Species => 2,
            TargetType::FullName => 3,
        }
    }

    fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|target| format!("'{}'", target.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = SpecimenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "family" => Ok(TargetType::Family),
            "genus" => Ok(TargetType::Genus),
            "species" => Ok(TargetType::Species),
            "full_name" => Ok(TargetType::FullName),
            _ => Err(SpecimenError::UnknownTargetType {
                value: value.to_string(),
                valid: Self::valid_values(),
            }),
        }
    }
}

pub fn parse_target_types<S: AsRef<str>>(
    values: &[S],
) -> Result<Vec<TargetType>, SpecimenError> {
    values.iter().map(|value| value.as_ref().parse()).collect()
}

/// Encoded label for one specimen.
///
/// A single requested target type yields a bare code; two or more yield the
/// codes in request order. Consumers branch on this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Label {
    Single(u32),
    Tuple(Vec<u32>),
}

impl Label {
    pub fn from_codes(mut codes: Vec<u32>) -> Self {
        if codes.len() == 1 {
            Label::Single(codes.remove(0))
        } else {
            Label::Tuple(codes)
        }
    }

    pub fn codes(&self) -> &[u32] {
        match self {
            Label::Single(code) => std::slice::from_ref(code),
            Label::Tuple(codes) => codes,
        }
    }
}

pub fn image_id_from_composite(value: &str) -> Option<&str> {
    value
        .split(':')
        .nth(1)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}
