use serde::{Deserialize, Serialize};
use tracing::warn;

/// The five maturity levels, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    Basic,
    Opportunistic,
    Systematic,
    Differentiating,
    Transformational,
}

impl StageName {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Basic,
            Self::Opportunistic,
            Self::Systematic,
            Self::Differentiating,
            Self::Transformational,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Opportunistic => "Opportunistic",
            Self::Systematic => "Systematic",
            Self::Differentiating => "Differentiating",
            Self::Transformational => "Transformational",
        }
    }

    /// Name for a 1-based stage number.
    pub fn from_number(number: u8) -> Option<Self> {
        let index = usize::from(number).checked_sub(1)?;
        Self::ordered().get(index).copied()
    }
}

/// Stage number and name before a description is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLevel {
    pub number: u8,
    pub name: StageName,
}

impl StageLevel {
    pub fn with_description(self, description: String) -> Stage {
        Stage {
            number: self.number,
            name: self.name,
            description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    pub number: u8,
    pub name: StageName,
    pub description: String,
}

/// Maps a score to its maturity stage.
///
/// The stage number is `max(floor(score), 1)`; it is never clamped from above.
/// Scores of 6 and over have no stage name and classify as `None`, the same
/// outcome as a missing score, with a warning logged.
pub fn classify(score: Option<f64>) -> Option<StageLevel> {
    let score = score?;
    let floored = score.floor().max(1.0);
    let number = if floored >= f64::from(u8::MAX) {
        u8::MAX
    } else {
        floored as u8
    };

    match StageName::from_number(number) {
        Some(name) => Some(StageLevel { number, name }),
        None => {
            warn!(score, "score is above the highest stage; leaving stage empty");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn missing_score_has_no_stage() {
        assert_eq!(classify(None), None);
    }

    #[test]
    fn stage_uses_floor_with_lower_bound_of_one() {
        let level = classify(Some(3.7)).expect("stage for 3.7");
        assert_eq!(level.number, 3);
        assert_eq!(level.name, StageName::Systematic);

        let level = classify(Some(0.999)).expect("stage for 0.999");
        assert_eq!(level.number, 1);
        assert_eq!(level.name, StageName::Basic);

        let level = classify(Some(1.0)).expect("stage for 1.0");
        assert_eq!(level.number, 1);
        assert_eq!(level.name, StageName::Basic);

        let level = classify(Some(0.0)).expect("zero still has a stage");
        assert_eq!(level.name, StageName::Basic);

        let level = classify(Some(2.0)).expect("stage for 2.0");
        assert_eq!(level.name, StageName::Opportunistic);
    }

    #[test]
    fn top_of_scale_is_transformational() {
        let level = classify(Some(5.0)).expect("stage for 5.0");
        assert_eq!(level.number, 5);
        assert_eq!(level.name, StageName::Transformational);

        let level = classify(Some(5.99)).expect("stage for 5.99");
        assert_eq!(level.name, StageName::Transformational);
    }

    #[test]
    fn scores_beyond_the_scale_have_no_stage() {
        assert_eq!(classify(Some(6.0)), None);
        assert_eq!(classify(Some(6.2)), None);
        assert_eq!(classify(Some(1.0e9)), None);
    }

    #[test]
    fn stage_names_serialize_as_labels() {
        for name in StageName::ordered() {
            let json = serde_json::to_string(&name).expect("serialize");
            assert_eq!(json, format!("\"{}\"", name.label()));
        }
    }

    proptest! {
        #[test]
        fn stage_number_is_monotonic_on_scale(a in 1.0f64..=5.0, b in 1.0f64..=5.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let low_stage = classify(Some(low)).expect("in-range stage");
            let high_stage = classify(Some(high)).expect("in-range stage");
            prop_assert!(low_stage.number <= high_stage.number);
        }
    }
}
