mod aggregate;
mod ancillary;
pub mod definitions;
mod digital_rights;
mod keyed;
mod stage;
mod tree;

pub use aggregate::{OverallRanking, ScoreIndex};
pub use ancillary::{AncillaryMetadata, PillarColors};
pub use digital_rights::DigitalRightScorer;
pub use keyed::Keyed;
pub use stage::{classify, Stage, StageLevel, StageName};
pub use tree::{
    CountryRecord, CountryScoreTreeBuilder, CountryScores, OverallScoreNode, PillarScoreNode,
    ScoreNode, ScoreSources, OVERALL_PILLAR,
};
