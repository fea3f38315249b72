//! Survey categorisation enums shared by the classifier, quality analyzer and
//! batch summary.

use serde::{Deserialize, Serialize};

/// Acquisition/processing category of a seismic dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyType {
    /// Single acquisition line
    #[serde(rename = "2D")]
    TwoD,
    /// Areal volume (inline x crossline grid)
    #[serde(rename = "3D")]
    ThreeD,
    /// Raw field records, one gather per shot
    ShotGather,
    /// CDP-stacked section
    CdpStack,
    /// Migrated 2D line
    #[serde(rename = "migrated_2d")]
    Migrated2d,
    /// Migrated 3D volume
    #[serde(rename = "migrated_3d")]
    Migrated3d,
    /// Not enough header evidence
    Undetermined,
}

impl SurveyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoD => "2D",
            Self::ThreeD => "3D",
            Self::ShotGather => "shot_gather",
            Self::CdpStack => "cdp_stack",
            Self::Migrated2d => "migrated_2d",
            Self::Migrated3d => "migrated_3d",
            Self::Undetermined => "undetermined",
        }
    }

    /// Raw and stacked data routinely carry muted (zeroed) zones. Plain 2D/3D
    /// labels say nothing about processing stage and get no leniency.
    pub fn expects_muting(&self) -> bool {
        matches!(self, Self::ShotGather | Self::CdpStack)
    }
}

impl std::fmt::Display for SurveyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary trace ordering within the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimarySorting {
    Inline,
    Crossline,
    Cdp,
    ShotPoint,
    Undetermined,
}

impl PrimarySorting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Crossline => "crossline",
            Self::Cdp => "cdp",
            Self::ShotPoint => "shot_point",
            Self::Undetermined => "undetermined",
        }
    }
}

impl std::fmt::Display for PrimarySorting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether traces are individual source-receiver pairs or summed per bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackType {
    Prestack,
    Poststack,
    Undetermined,
}

impl StackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prestack => "prestack",
            Self::Poststack => "poststack",
            Self::Undetermined => "undetermined",
        }
    }
}

impl std::fmt::Display for StackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five-step confidence scale.
///
/// Variant order is significant: `VeryLow < Low < Medium < High < VeryHigh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// One step up, capped at `VeryHigh`
    pub fn escalate(self) -> Self {
        match self {
            Self::VeryLow => Self::Low,
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::VeryHigh => Self::VeryHigh,
        }
    }

    /// Zero-based position on the scale
    pub fn rank(self) -> usize {
        match self {
            Self::VeryLow => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate_caps_at_very_high() {
        assert_eq!(ConfidenceLevel::VeryLow.escalate(), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::High.escalate(), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::VeryHigh.escalate(), ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(ConfidenceLevel::Medium > ConfidenceLevel::Low);
        assert!(ConfidenceLevel::VeryHigh > ConfidenceLevel::High);
    }

    #[test]
    fn test_survey_type_wire_names() {
        assert_eq!(serde_json::to_string(&SurveyType::TwoD).unwrap(), "\"2D\"");
        assert_eq!(serde_json::to_string(&SurveyType::ThreeD).unwrap(), "\"3D\"");
        assert_eq!(
            serde_json::to_string(&SurveyType::ShotGather).unwrap(),
            "\"shot_gather\""
        );
        let parsed: SurveyType = serde_json::from_str("\"migrated_3d\"").unwrap();
        assert_eq!(parsed, SurveyType::Migrated3d);
    }
}
