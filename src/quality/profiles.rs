//! Quality threshold profiles, one per survey type.
//!
//! Static tables. Raw shot gathers tolerate weaker dynamic range and more
//! muting than migrated volumes.

use crate::types::{QualityThresholdProfile, SurveyType};

pub const THREE_D: QualityThresholdProfile = QualityThresholdProfile {
    min_dynamic_range_db: 30.0,
    max_zero_percent: 60.0,
    min_traces: 100,
    max_amplitude_range: 1e6,
};

pub const TWO_D: QualityThresholdProfile = QualityThresholdProfile {
    min_dynamic_range_db: 25.0,
    max_zero_percent: 50.0,
    min_traces: 50,
    max_amplitude_range: 1e6,
};

pub const SHOT_GATHER: QualityThresholdProfile = QualityThresholdProfile {
    min_dynamic_range_db: 20.0,
    max_zero_percent: 70.0,
    min_traces: 24,
    max_amplitude_range: 1e7,
};

pub const CDP_STACK: QualityThresholdProfile = QualityThresholdProfile {
    min_dynamic_range_db: 30.0,
    max_zero_percent: 40.0,
    min_traces: 50,
    max_amplitude_range: 1e6,
};

pub const MIGRATED_2D: QualityThresholdProfile = QualityThresholdProfile {
    min_dynamic_range_db: 35.0,
    max_zero_percent: 40.0,
    min_traces: 50,
    max_amplitude_range: 1e6,
};

pub const MIGRATED_3D: QualityThresholdProfile = QualityThresholdProfile {
    min_dynamic_range_db: 35.0,
    max_zero_percent: 50.0,
    min_traces: 100,
    max_amplitude_range: 1e6,
};

/// Applied when the survey type is undetermined
pub const FALLBACK: QualityThresholdProfile = QualityThresholdProfile {
    min_dynamic_range_db: 20.0,
    max_zero_percent: 50.0,
    min_traces: 10,
    max_amplitude_range: 1e7,
};

pub fn profile_for(survey_type: SurveyType) -> QualityThresholdProfile {
    match survey_type {
        SurveyType::ThreeD => THREE_D,
        SurveyType::TwoD => TWO_D,
        SurveyType::ShotGather => SHOT_GATHER,
        SurveyType::CdpStack => CDP_STACK,
        SurveyType::Migrated2d => MIGRATED_2D,
        SurveyType::Migrated3d => MIGRATED_3D,
        SurveyType::Undetermined => FALLBACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_a_profile() {
        for t in [
            SurveyType::TwoD,
            SurveyType::ThreeD,
            SurveyType::ShotGather,
            SurveyType::CdpStack,
            SurveyType::Migrated2d,
            SurveyType::Migrated3d,
            SurveyType::Undetermined,
        ] {
            let p = profile_for(t);
            assert!(p.min_dynamic_range_db > 0.0);
            assert!(p.max_zero_percent > 0.0 && p.max_zero_percent < 100.0);
            assert!(p.min_traces > 0);
        }
    }

    #[test]
    fn test_shot_gathers_most_lenient_on_muting() {
        assert!(SHOT_GATHER.max_zero_percent > THREE_D.max_zero_percent);
        assert!(SHOT_GATHER.min_dynamic_range_db < MIGRATED_3D.min_dynamic_range_db);
    }
}
