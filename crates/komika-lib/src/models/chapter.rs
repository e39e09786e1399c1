use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// A single chapter of a comic as published by the catalog
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Chapter {
    /// Chapter number, fractional for extras such as `12.5`
    pub chap: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vol: Option<f64>,
    #[serde(default)]
    pub language: String,
    /// Page image urls in reading order
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chapter {
    pub fn new(chap: f64, language: &str, images: Vec<String>) -> Self {
        Self {
            chap,
            vol: None,
            language: language.to_string(),
            images,
            extra: Map::new(),
        }
    }

    /// Identifier used by reading history, `3` for chapter 3 and `3.5` for chapter 3.5
    pub fn id(&self) -> String {
        self.chap.to_string()
    }

    pub fn display_name(&self) -> String {
        match self.vol {
            Some(vol) if vol != 0.0 => format!("Chapter {} (Vol {})", self.chap, vol),
            _ => format!("Chapter {}", self.chap),
        }
    }

    pub fn page_count(&self) -> usize {
        self.images.len()
    }
}

/// Chapter number parsed from a chapter id
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ChapterNumber(pub f64);

impl FromStr for ChapterNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(ChapterNumber(number)),
            _ => Err(Error::InvalidChapterId(s.to_string())),
        }
    }
}
