use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Where the user stands with a comic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    #[default]
    None,
    Planning,
    Reading,
    Completed,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 4] = [
        ReadingStatus::None,
        ReadingStatus::Planning,
        ReadingStatus::Reading,
        ReadingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::None => "none",
            ReadingStatus::Planning => "planning",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidReadingStatus(s.to_string()))
    }
}
