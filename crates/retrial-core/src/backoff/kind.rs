//! Strategy kind tag and its numeric / textual forms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RetryError;

/// Which backoff rule a policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Fixed window between attempts.
    #[default]
    Linear,
    /// Window of `base^attempts` seconds.
    Exponential,
}

impl StrategyKind {
    /// Numeric code used on the command line.
    pub fn code(self) -> u8 {
        match self {
            StrategyKind::Linear => 0,
            StrategyKind::Exponential => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Linear => "linear",
            StrategyKind::Exponential => "exponential",
        }
    }
}

impl TryFrom<u8> for StrategyKind {
    type Error = RetryError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(StrategyKind::Linear),
            1 => Ok(StrategyKind::Exponential),
            _ => Err(RetryError::InvalidRetryStrategy),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = RetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "0" => Ok(StrategyKind::Linear),
            "exponential" | "exp" | "1" => Ok(StrategyKind::Exponential),
            _ => Err(RetryError::InvalidRetryStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes() {
        assert_eq!(StrategyKind::try_from(0), Ok(StrategyKind::Linear));
        assert_eq!(StrategyKind::try_from(1), Ok(StrategyKind::Exponential));
        assert_eq!(
            StrategyKind::try_from(2),
            Err(RetryError::InvalidRetryStrategy)
        );
        assert_eq!(StrategyKind::Exponential.code(), 1);
    }

    #[test]
    fn parse_names() {
        assert_eq!("Linear".parse(), Ok(StrategyKind::Linear));
        assert_eq!(" exponential ".parse(), Ok(StrategyKind::Exponential));
        assert_eq!(
            "fibonacci".parse::<StrategyKind>(),
            Err(RetryError::InvalidRetryStrategy)
        );
    }
}
