use super::aggregate::{OverallRanking, ScoreIndex};
use super::ancillary::AncillaryMetadata;
use super::definitions::stage_for;
use super::digital_rights::DigitalRightScorer;
use super::keyed::Keyed;
use super::stage::{classify, Stage};
use crate::pipeline::measure::Rank;
use crate::pipeline::tables::{CountryRow, DefinitionRow, LatLonEntry, ScoreRow};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Name of the synthetic aggregate appended to every country's pillar scores.
pub const OVERALL_PILLAR: &str = "Overall";

/// Keys a pillar node writes for itself; sub-pillars may not reuse them.
const NODE_FIELDS: [&str; 4] = ["rank", "score", "confidence", "stage"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreNode {
    pub rank: Option<Rank>,
    pub score: Option<f64>,
    pub confidence: Option<f64>,
    pub stage: Option<Stage>,
}

impl ScoreNode {
    pub fn empty() -> Self {
        Self {
            rank: None,
            score: None,
            confidence: None,
            stage: None,
        }
    }

    pub(crate) fn from_row(row: Option<&ScoreRow>, stage: Option<Stage>) -> Self {
        match row {
            Some(row) => Self {
                rank: row.rank(),
                score: row.score(),
                confidence: row.confidence(),
                stage,
            },
            None => Self::empty(),
        }
    }
}

/// Pillar node; sub-pillar nodes serialize as sibling keys of the pillar fields.
/// A sub-pillar named after a pillar field is left out of the serialized map.
#[derive(Debug, Clone, PartialEq)]
pub struct PillarScoreNode {
    pub node: ScoreNode,
    pub sub_pillars: Keyed<ScoreNode>,
}

impl Serialize for PillarScoreNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4 + self.sub_pillars.len()))?;
        map.serialize_entry("rank", &self.node.rank)?;
        map.serialize_entry("score", &self.node.score)?;
        map.serialize_entry("confidence", &self.node.confidence)?;
        map.serialize_entry("stage", &self.node.stage)?;
        for (name, node) in self.sub_pillars.iter() {
            if !NODE_FIELDS.contains(&name) {
                map.serialize_entry(name, node)?;
            }
        }
        map.end()
    }
}

/// Overall aggregate. `rank` is `0` when the country is not in the overall ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallScoreNode {
    pub score: Option<f64>,
    pub confidence: Option<f64>,
    pub stage: Option<Stage>,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryScores {
    pub pillars: Keyed<PillarScoreNode>,
    pub overall: OverallScoreNode,
}

impl CountryScores {
    /// Every key of the serialized map, `Overall` last.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pillars
            .keys()
            .chain(std::iter::once(OVERALL_PILLAR))
    }
}

impl Serialize for CountryScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pillars.len() + 1))?;
        for (name, node) in self.pillars.iter() {
            map.serialize_entry(name, node)?;
        }
        map.serialize_entry(OVERALL_PILLAR, &self.overall)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRecord {
    #[serde(rename = "Country or Area")]
    pub name: String,
    #[serde(rename = "ISO-alpha3 Code")]
    pub iso_alpha3: String,
    #[serde(rename = "ISO-alpha2 Code")]
    pub iso_alpha2: String,
    #[serde(rename = "Region Name")]
    pub region: String,
    #[serde(rename = "Sub-region Name")]
    pub sub_region: String,
    #[serde(rename = "World Bank Income Level")]
    pub income_level: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    #[serde(rename = "unMember")]
    pub un_member: bool,
    pub sids: bool,
    pub lldc: bool,
    pub ldc: bool,
    pub scores: CountryScores,
    #[serde(rename = "digitalRightScores")]
    pub digital_right_scores: Keyed<ScoreNode>,
    #[serde(rename = "digitalRightDataAvailable")]
    pub digital_right_data_available: bool,
}

/// Tables the tree builder reads. Borrowed for the duration of one build.
#[derive(Debug, Clone, Copy)]
pub struct ScoreSources<'a> {
    pub scores: &'a [ScoreRow],
    pub definitions: &'a [DefinitionRow],
    pub digital_right_scores: &'a [ScoreRow],
    pub digital_right_definitions: &'a [DefinitionRow],
    pub latlon: &'a [LatLonEntry],
}

/// Assembles one [`CountryRecord`] per country from flat score tables.
pub struct CountryScoreTreeBuilder<'a> {
    scores: ScoreIndex<'a>,
    definitions: &'a [DefinitionRow],
    digital_rights: DigitalRightScorer<'a>,
    overall_ranking: OverallRanking,
    latlon: HashMap<&'a str, &'a LatLonEntry>,
    pillars: &'a Keyed<Vec<String>>,
    digital_right_pillars: &'a [String],
}

impl<'a> CountryScoreTreeBuilder<'a> {
    pub fn new(sources: ScoreSources<'a>, metadata: &'a AncillaryMetadata) -> Self {
        let mut latlon = HashMap::with_capacity(sources.latlon.len());
        for entry in sources.latlon {
            latlon.entry(entry.alpha2.as_str()).or_insert(entry);
        }

        Self {
            scores: ScoreIndex::new(sources.scores),
            definitions: sources.definitions,
            digital_rights: DigitalRightScorer::new(
                ScoreIndex::new(sources.digital_right_scores),
                sources.digital_right_definitions,
            ),
            overall_ranking: OverallRanking::compute(sources.scores),
            latlon,
            pillars: &metadata.pillars,
            digital_right_pillars: &metadata.digital_right_pillar_name,
        }
    }

    pub fn build(&self, countries: &[CountryRow]) -> Vec<CountryRecord> {
        countries
            .iter()
            .map(|country| self.build_country(country))
            .collect()
    }

    pub fn build_country(&self, country: &CountryRow) -> CountryRecord {
        let name = country.name.as_str();
        let location = self.latlon.get(country.iso_alpha2.as_str());

        let pillars = self
            .pillars
            .iter()
            .filter(|(pillar, _)| *pillar != OVERALL_PILLAR)
            .map(|(pillar, sub_pillars)| {
                (pillar, self.pillar_node(name, pillar, sub_pillars))
            })
            .collect();

        let digital_right_data_available = self.digital_rights.is_country_covered(name);
        tracing::trace!(country = name, digital_right_data_available, "built country scores");

        CountryRecord {
            name: country.name.clone(),
            iso_alpha3: country.iso_alpha3.clone(),
            iso_alpha2: country.iso_alpha2.clone(),
            region: country.region.clone(),
            sub_region: country.sub_region.clone(),
            income_level: country.income_level.clone(),
            longitude: location.and_then(|entry| entry.longitude),
            latitude: location.and_then(|entry| entry.latitude),
            un_member: country.is_un_member(),
            sids: country.is_sids(),
            lldc: country.is_lldc(),
            ldc: country.is_ldc(),
            scores: CountryScores {
                pillars,
                overall: self.overall_node(name),
            },
            digital_right_scores: self
                .digital_rights
                .pillar_nodes(name, self.digital_right_pillars),
            digital_right_data_available,
        }
    }

    fn pillar_node(&self, country: &str, pillar: &str, sub_pillars: &[String]) -> PillarScoreNode {
        let row = self.scores.find_pillar(country, pillar);
        let stage = stage_for(
            classify(row.and_then(ScoreRow::raw_score)),
            self.definitions,
            pillar,
            None,
        );

        for sub_pillar in sub_pillars {
            if NODE_FIELDS.contains(&sub_pillar.as_str()) {
                tracing::warn!(
                    pillar,
                    sub_pillar = %sub_pillar,
                    "sub-pillar name collides with a pillar field; omitting it from output"
                );
            }
        }

        let sub_pillars = sub_pillars
            .iter()
            .map(|sub_pillar| {
                (
                    sub_pillar.clone(),
                    self.sub_pillar_node(country, pillar, sub_pillar),
                )
            })
            .collect();

        PillarScoreNode {
            node: ScoreNode::from_row(row, stage),
            sub_pillars,
        }
    }

    fn sub_pillar_node(&self, country: &str, pillar: &str, sub_pillar: &str) -> ScoreNode {
        let row = self.scores.find_sub_pillar(country, pillar, sub_pillar);
        let stage = stage_for(
            classify(row.and_then(ScoreRow::raw_score)),
            self.definitions,
            pillar,
            Some(sub_pillar),
        );
        ScoreNode::from_row(row, stage)
    }

    // The overall stage classifies the rounded score and reads the definition
    // row that has neither pillar nor sub-pillar.
    fn overall_node(&self, country: &str) -> OverallScoreNode {
        let row = self.scores.find_overall(country);
        let score = row.and_then(ScoreRow::score);

        OverallScoreNode {
            score,
            confidence: row.and_then(ScoreRow::confidence),
            stage: stage_for(classify(score), self.definitions, "", None),
            rank: self.overall_ranking.position(country),
        }
    }
}
