//! Coarse display label attached to a word. Owned by the mastery subsystem;
//! the scheduler only reads it to filter due items.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryStage {
    /// Discovered but not yet practised.
    #[default]
    Ghost,
    Liquid,
    /// Mastered. Never due.
    Solid,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mastery stage '{0}'")]
pub struct ParseStageError(pub String);

impl MasteryStage {
    pub fn as_str(self) -> &'static str {
        match self {
            MasteryStage::Ghost => "ghost",
            MasteryStage::Liquid => "liquid",
            MasteryStage::Solid => "solid",
        }
    }
}

impl fmt::Display for MasteryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MasteryStage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ghost" => Ok(MasteryStage::Ghost),
            "liquid" => Ok(MasteryStage::Liquid),
            "solid" => Ok(MasteryStage::Solid),
            _ => Err(ParseStageError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for stage in [MasteryStage::Ghost, MasteryStage::Liquid, MasteryStage::Solid] {
            assert_eq!(stage.as_str().parse::<MasteryStage>(), Ok(stage));
        }
        assert_eq!("Solid".parse::<MasteryStage>(), Ok(MasteryStage::Solid));
        assert!("mastered".parse::<MasteryStage>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&MasteryStage::Liquid).unwrap();
        assert_eq!(json, "\"liquid\"");
    }
}
