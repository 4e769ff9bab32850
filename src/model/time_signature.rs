use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported meters. Each one fixes the number of steps in a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeSignature {
    #[default]
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "3/4")]
    ThreeFour,
    #[serde(rename = "6/8")]
    SixEight,
}

impl TimeSignature {
    pub const ALL: [TimeSignature; 3] = [
        TimeSignature::FourFour,
        TimeSignature::ThreeFour,
        TimeSignature::SixEight,
    ];

    pub fn steps_per_bar(self) -> usize {
        match self {
            TimeSignature::FourFour => 16,
            TimeSignature::ThreeFour | TimeSignature::SixEight => 12,
        }
    }

    /// Whether `step` starts a beat group on the grid.
    ///
    /// 4/4 accents every fourth step, 3/4 every third, and 6/8 splits the bar
    /// into two groups of six.
    pub fn is_accent(self, step: usize) -> bool {
        match self {
            TimeSignature::FourFour => step % 4 == 0,
            TimeSignature::ThreeFour => step % 3 == 0,
            TimeSignature::SixEight => step == 0 || step == 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeSignature::FourFour => "4/4",
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::SixEight => "6/8",
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported time signature '{0}' (expected 4/4, 3/4 or 6/8)")]
pub struct ParseTimeSignatureError(pub String);

impl FromStr for TimeSignature {
    type Err = ParseTimeSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        TimeSignature::ALL
            .into_iter()
            .find(|sig| sig.as_str() == compact)
            .ok_or_else(|| ParseTimeSignatureError(s.to_string()))
    }
}
