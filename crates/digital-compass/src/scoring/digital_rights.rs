//! Digital-rights scores: pillar level only, with a per-country coverage gate.

use super::aggregate::ScoreIndex;
use super::definitions::describe_pillar;
use super::keyed::Keyed;
use super::stage::classify;
use super::tree::ScoreNode;
use crate::pipeline::tables::DefinitionRow;

#[derive(Debug, Clone, Copy)]
pub struct DigitalRightScorer<'a> {
    scores: ScoreIndex<'a>,
    definitions: &'a [DefinitionRow],
}

impl<'a> DigitalRightScorer<'a> {
    pub fn new(scores: ScoreIndex<'a>, definitions: &'a [DefinitionRow]) -> Self {
        Self {
            scores,
            definitions,
        }
    }

    /// True when any digital-rights row mentions the country, whatever the pillar.
    pub fn is_country_covered(&self, country: &str) -> bool {
        self.scores.references_country(country)
    }

    pub fn pillar_node(&self, country: &str, pillar: &str) -> ScoreNode {
        let row = self.scores.find_flat_pillar(country, pillar);
        let stage = classify(row.and_then(|row| row.raw_score())).map(|level| {
            level.with_description(describe_pillar(self.definitions, pillar, level.name))
        });

        ScoreNode::from_row(row, stage)
    }

    pub fn pillar_nodes(&self, country: &str, pillars: &[String]) -> Keyed<ScoreNode> {
        pillars
            .iter()
            .map(|pillar| (pillar.clone(), self.pillar_node(country, pillar)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::measure::{Measure, Rank};
    use crate::pipeline::tables::ScoreRow;
    use crate::scoring::StageName;

    fn rows() -> Vec<ScoreRow> {
        vec![
            ScoreRow {
                country_name: "Ghana".to_string(),
                pillar: "Privacy".to_string(),
                indicator: "Data protection law".to_string(),
                new_rank_score: Measure::Value(4.0),
                ..ScoreRow::default()
            },
            ScoreRow {
                country_name: "Ghana".to_string(),
                pillar: "Privacy".to_string(),
                new_rank_score: Measure::Value(2.25),
                data_availability: Measure::Value(60.0),
                rank: Rank::parse("7"),
                ..ScoreRow::default()
            },
        ]
    }

    fn definitions() -> Vec<DefinitionRow> {
        vec![DefinitionRow {
            pillar: "Privacy".to_string(),
            opportunistic: "Privacy is emerging".to_string(),
            ..DefinitionRow::default()
        }]
    }

    #[test]
    fn pillar_node_uses_aggregate_row_not_indicator() {
        let rows = rows();
        let definitions = definitions();
        let scorer = DigitalRightScorer::new(ScoreIndex::new(&rows), &definitions);

        let node = scorer.pillar_node("Ghana", "Privacy");
        assert_eq!(node.score, Some(2.25));
        assert_eq!(node.confidence, Some(60.0));
        assert_eq!(node.rank, Rank::parse("7"));
        let stage = node.stage.expect("stage present");
        assert_eq!(stage.name, StageName::Opportunistic);
        assert_eq!(stage.description, "Privacy is emerging");
    }

    #[test]
    fn uncovered_country_has_empty_nodes() {
        let rows = rows();
        let definitions = definitions();
        let scorer = DigitalRightScorer::new(ScoreIndex::new(&rows), &definitions);

        assert!(scorer.is_country_covered("Ghana"));
        assert!(!scorer.is_country_covered("Kenya"));

        let nodes = scorer.pillar_nodes("Kenya", &["Privacy".to_string()]);
        let node = nodes.get("Privacy").expect("pillar key present");
        assert_eq!(node.score, None);
        assert_eq!(node.confidence, None);
        assert_eq!(node.rank, None);
        assert!(node.stage.is_none());
    }
}
