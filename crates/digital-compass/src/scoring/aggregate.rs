use crate::pipeline::measure::Rank;
use crate::pipeline::tables::ScoreRow;
use std::cmp::Ordering;
use std::collections::HashMap;

const DISPLAY_DECIMALS: u32 = 2;

impl ScoreRow {
    /// Display score rounded to two decimals; a zero score stays `Some(0.0)`.
    pub fn score(&self) -> Option<f64> {
        self.new_rank_score.rounded(DISPLAY_DECIMALS)
    }

    /// Unrounded score, as used for stage classification.
    pub fn raw_score(&self) -> Option<f64> {
        self.new_rank_score.raw()
    }

    pub fn confidence(&self) -> Option<f64> {
        self.data_availability.rounded(DISPLAY_DECIMALS)
    }

    pub fn rank(&self) -> Option<Rank> {
        self.rank
    }

    pub fn is_pillar_aggregate(&self) -> bool {
        !self.pillar.is_empty() && self.sub_pillar.is_empty() && self.indicator.is_empty()
    }

    pub fn is_overall_aggregate(&self) -> bool {
        self.pillar.is_empty() && self.sub_pillar.is_empty()
    }
}

/// Lookups over a flat score table. The first qualifying row wins.
#[derive(Debug, Clone, Copy)]
pub struct ScoreIndex<'a> {
    rows: &'a [ScoreRow],
}

impl<'a> ScoreIndex<'a> {
    pub fn new(rows: &'a [ScoreRow]) -> Self {
        Self { rows }
    }

    pub fn find_pillar(&self, country: &str, pillar: &str) -> Option<&'a ScoreRow> {
        self.rows.iter().find(|row| {
            row.country_name == country && row.pillar == pillar && row.is_pillar_aggregate()
        })
    }

    pub fn find_sub_pillar(
        &self,
        country: &str,
        pillar: &str,
        sub_pillar: &str,
    ) -> Option<&'a ScoreRow> {
        self.rows.iter().find(|row| {
            row.country_name == country
                && row.pillar == pillar
                && row.sub_pillar == sub_pillar
                && row.indicator.is_empty()
        })
    }

    pub fn find_overall(&self, country: &str) -> Option<&'a ScoreRow> {
        self.rows
            .iter()
            .find(|row| row.country_name == country && row.is_overall_aggregate())
    }

    /// Pillar aggregate in a table without sub-pillars: any non-indicator row
    /// for the pillar qualifies.
    pub fn find_flat_pillar(&self, country: &str, pillar: &str) -> Option<&'a ScoreRow> {
        self.rows.iter().find(|row| {
            row.country_name == country && row.pillar == pillar && row.indicator.is_empty()
        })
    }

    pub fn references_country(&self, country: &str) -> bool {
        self.rows.iter().any(|row| row.country_name == country)
    }
}

/// Overall ranking computed from the overall aggregate rows.
///
/// Rows are ordered by score, highest first, with a stable sort so ties keep
/// their input order; rows without a score go last. A country's position is
/// that of its first overall row, 1-based. Countries absent from the list get
/// position `0`.
#[derive(Debug, Clone, Default)]
pub struct OverallRanking {
    positions: HashMap<String, u32>,
}

impl OverallRanking {
    pub fn compute(rows: &[ScoreRow]) -> Self {
        let mut overall: Vec<&ScoreRow> = rows
            .iter()
            .filter(|row| row.is_overall_aggregate())
            .collect();
        overall.sort_by(|a, b| descending(a.raw_score(), b.raw_score()));

        let mut positions = HashMap::with_capacity(overall.len());
        for (index, row) in overall.iter().enumerate() {
            positions
                .entry(row.country_name.clone())
                .or_insert(index as u32 + 1);
        }

        Self { positions }
    }

    pub fn position(&self, country: &str) -> u32 {
        self.positions.get(country).copied().unwrap_or(0)
    }
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::measure::Measure;

    fn row(country: &str, pillar: &str, sub_pillar: &str, indicator: &str, score: Measure) -> ScoreRow {
        ScoreRow {
            country_name: country.to_string(),
            pillar: pillar.to_string(),
            sub_pillar: sub_pillar.to_string(),
            indicator: indicator.to_string(),
            new_rank_score: score,
            data_availability: Measure::Value(80.0),
            rank: Rank::parse("3"),
        }
    }

    #[test]
    fn pillar_lookup_skips_sub_pillar_and_indicator_rows() {
        let rows = vec![
            row("Ghana", "Economy", "Financial services", "", Measure::Value(1.0)),
            row("Ghana", "Economy", "Financial services", "Accounts", Measure::Value(2.0)),
            row("Ghana", "Economy", "", "", Measure::Value(3.0)),
        ];
        let index = ScoreIndex::new(&rows);

        let pillar = index.find_pillar("Ghana", "Economy").expect("pillar row");
        assert_eq!(pillar.score(), Some(3.0));

        let sub_pillar = index
            .find_sub_pillar("Ghana", "Economy", "Financial services")
            .expect("sub-pillar row");
        assert_eq!(sub_pillar.score(), Some(1.0));

        assert!(index.find_pillar("Kenya", "Economy").is_none());
        assert!(index.find_overall("Ghana").is_none());
    }

    #[test]
    fn zero_score_is_not_missing() {
        let zero = row("Ghana", "Economy", "", "", Measure::Zero);
        assert_eq!(zero.score(), Some(0.0));

        let missing = row("Ghana", "Economy", "", "", Measure::Missing);
        assert_eq!(missing.score(), None);
    }

    #[test]
    fn overall_ranking_orders_by_score_descending() {
        let rows = vec![
            row("Ghana", "", "", "", Measure::Value(2.5)),
            row("Kenya", "", "", "", Measure::Value(3.1)),
            row("Togo", "", "", "", Measure::Missing),
            row("Benin", "", "", "", Measure::Value(2.5)),
            row("Mali", "Economy", "", "", Measure::Value(4.9)),
        ];
        let ranking = OverallRanking::compute(&rows);

        assert_eq!(ranking.position("Kenya"), 1);
        assert_eq!(ranking.position("Ghana"), 2);
        assert_eq!(ranking.position("Benin"), 3);
        assert_eq!(ranking.position("Togo"), 4);
    }

    #[test]
    fn overall_ranking_reports_zero_for_unranked_country() {
        let rows = vec![
            row("Kenya", "", "", "", Measure::Value(3.1)),
            row("Mali", "Economy", "", "", Measure::Value(4.9)),
        ];
        let ranking = OverallRanking::compute(&rows);

        assert_eq!(ranking.position("Mali"), 0);
        assert_eq!(ranking.position("Atlantis"), 0);
    }
}
