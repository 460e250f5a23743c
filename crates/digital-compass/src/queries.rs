//! On-demand lookups the dashboard performs against the loaded tables.
//!
//! Results are the raw rows exactly as published in `db.json`.

use crate::pipeline::tables::{JsonRow, LoadedTable, ScoreRow};
use crate::pipeline::PipelineInput;
use crate::scoring::definitions::{find_definition, find_pillar_definition};
use crate::scoring::CountryRecord;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const SOURCE_COLUMN: &str = "Source Name";

/// Stage definitions for a pillar, or for one of its sub-pillars.
pub fn stage_definitions<'a>(
    input: &'a PipelineInput,
    pillar: &str,
    sub_pillar: Option<&str>,
) -> Option<&'a JsonRow> {
    let index = find_definition(&input.definitions.rows, pillar, sub_pillar)?;
    input.definitions.passthrough.get(index)
}

pub fn digital_right_stage_definitions<'a>(
    input: &'a PipelineInput,
    pillar: &str,
) -> Option<&'a JsonRow> {
    let index = find_pillar_definition(&input.digital_right_definitions.rows, pillar)?;
    input.digital_right_definitions.passthrough.get(index)
}

/// Indicator rows under a sub-pillar, one per indicator name.
pub fn indicators_for_sub_pillar<'a>(
    input: &'a PipelineInput,
    pillar: &str,
    sub_pillar: &str,
) -> Vec<&'a JsonRow> {
    unique_indicators(&input.scores, |row| {
        row.pillar == pillar && row.sub_pillar == sub_pillar
    })
}

/// Digital-rights indicator rows for a pillar, one per indicator name.
pub fn digital_right_indicators_for_pillar<'a>(
    input: &'a PipelineInput,
    pillar: &str,
) -> Vec<&'a JsonRow> {
    unique_indicators(&input.digital_right_scores, |row| row.pillar == pillar)
}

fn unique_indicators<'a, F>(table: &'a LoadedTable<ScoreRow>, matches: F) -> Vec<&'a JsonRow>
where
    F: Fn(&ScoreRow) -> bool,
{
    let mut seen = HashSet::new();
    table
        .paired()
        .filter(|&(row, _)| !row.indicator.is_empty() && matches(row))
        .filter(|&(row, _)| seen.insert(row.indicator.as_str()))
        .map(|(_, raw)| raw)
        .collect()
}

/// A country's indicator row with the rows citing a source for the same
/// indicator. Serializes as the row's own fields plus `sources`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcedIndicator<'a> {
    #[serde(flatten)]
    pub row: &'a JsonRow,
    pub sources: Vec<&'a JsonRow>,
}

/// Every indicator row a country has under a sub-pillar, with its sources.
pub fn country_indicators<'a>(
    input: &'a PipelineInput,
    country: &str,
    pillar: &str,
    sub_pillar: &str,
) -> Vec<SourcedIndicator<'a>> {
    sourced_indicators(&input.scores, |row| {
        row.country_name == country && row.pillar == pillar && row.sub_pillar == sub_pillar
    })
}

/// Every digital-rights indicator row a country has under a pillar, with its sources.
pub fn digital_right_country_indicators<'a>(
    input: &'a PipelineInput,
    country: &str,
    pillar: &str,
) -> Vec<SourcedIndicator<'a>> {
    sourced_indicators(&input.digital_right_scores, |row| {
        row.country_name == country && row.pillar == pillar
    })
}

fn sourced_indicators<'a, F>(
    table: &'a LoadedTable<ScoreRow>,
    matches: F,
) -> Vec<SourcedIndicator<'a>>
where
    F: Fn(&ScoreRow) -> bool,
{
    let rows: Vec<(&ScoreRow, &JsonRow)> = table
        .paired()
        .filter(|&(row, _)| !row.indicator.is_empty() && matches(row))
        .collect();

    rows.iter()
        .map(|&(row, raw)| SourcedIndicator {
            row: raw,
            sources: rows
                .iter()
                .filter(|&&(candidate, candidate_raw)| {
                    candidate.indicator == row.indicator && cites_source(candidate_raw)
                })
                .map(|&(_, candidate_raw)| candidate_raw)
                .collect(),
        })
        .collect()
}

fn cites_source(row: &JsonRow) -> bool {
    row.get(SOURCE_COLUMN)
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty())
}

/// Grouping used to pick peer countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKey {
    Region,
    SubRegion,
    Sids,
    Lldc,
    Ldc,
}

impl CompareKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Region => "Region Name",
            Self::SubRegion => "Sub-region Name",
            Self::Sids => "sids",
            Self::Lldc => "lldc",
            Self::Ldc => "ldc",
        }
    }
}

impl fmt::Display for CompareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CompareKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "region name" | "region" => Ok(Self::Region),
            "sub-region name" | "sub-region" | "subregion" => Ok(Self::SubRegion),
            "sids" => Ok(Self::Sids),
            "lldc" => Ok(Self::Lldc),
            "ldc" => Ok(Self::Ldc),
            other => Err(format!(
                "unknown comparison key '{other}' (expected region, sub-region, sids, lldc or ldc)"
            )),
        }
    }
}

/// Peer countries of the country with ISO-alpha3 code `iso_alpha3`.
///
/// Regional keys keep countries sharing the country's region or sub-region.
/// Flag keys keep flagged countries plus the country itself. `None` when the
/// code is unknown.
pub fn compare_countries<'a>(
    countries: &'a [CountryRecord],
    iso_alpha3: &str,
    key: CompareKey,
) -> Option<Vec<&'a CountryRecord>> {
    let subject = countries
        .iter()
        .find(|country| country.iso_alpha3 == iso_alpha3)?;

    let peers = countries
        .iter()
        .filter(|country| match key {
            CompareKey::Region => country.region == subject.region,
            CompareKey::SubRegion => country.sub_region == subject.sub_region,
            CompareKey::Sids => country.sids || country.iso_alpha3 == iso_alpha3,
            CompareKey::Lldc => country.lldc || country.iso_alpha3 == iso_alpha3,
            CompareKey::Ldc => country.ldc || country.iso_alpha3 == iso_alpha3,
        })
        .collect();

    Some(peers)
}
