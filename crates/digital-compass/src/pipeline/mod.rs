mod error;
pub mod measure;
pub mod output;
pub mod tables;

pub use error::{PipelineError, SchemaError};
pub use output::{OutputPaths, ANCILLARY_FILE, DB_FILE};

use crate::scoring::{AncillaryMetadata, CountryRecord, CountryScoreTreeBuilder, ScoreSources};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tables::{
    CountryRow, DefinitionRow, LatLonEntry, LoadedTable, PillarDefinitionRow, ScoreRow,
};
use tracing::info;

/// Every input table, loaded once and read-only for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub countries: Vec<CountryRow>,
    pub scores: LoadedTable<ScoreRow>,
    pub digital_right_scores: LoadedTable<ScoreRow>,
    pub definitions: LoadedTable<DefinitionRow>,
    pub digital_right_definitions: LoadedTable<DefinitionRow>,
    pub pillar_definitions: Vec<PillarDefinitionRow>,
    pub digital_right_pillar_definitions: Vec<PillarDefinitionRow>,
    pub latlon: Vec<LatLonEntry>,
    pub bounding_boxes: Value,
    pub geojson: Value,
}

impl PipelineInput {
    /// Reads every input file from `raw_dir`. Any unreadable or malformed file
    /// aborts the load.
    pub fn load<P: AsRef<Path>>(raw_dir: P) -> Result<Self, PipelineError> {
        let raw_dir = raw_dir.as_ref();

        let input = Self {
            countries: tables::load_countries(open(raw_dir, tables::COUNTRIES_FILE)?)?,
            scores: tables::load_scores(open(raw_dir, tables::SCORES_FILE)?)?,
            digital_right_scores: tables::load_digital_right_scores(open(
                raw_dir,
                tables::DIGITAL_RIGHT_SCORES_FILE,
            )?)?,
            definitions: tables::load_definitions(open(raw_dir, tables::DEFINITIONS_FILE)?)?,
            digital_right_definitions: tables::load_digital_right_definitions(open(
                raw_dir,
                tables::DIGITAL_RIGHT_DEFINITIONS_FILE,
            )?)?,
            pillar_definitions: tables::load_pillar_definitions(open(
                raw_dir,
                tables::PILLAR_DEFINITIONS_FILE,
            )?)?,
            digital_right_pillar_definitions: tables::load_digital_right_pillar_definitions(
                open(raw_dir, tables::DIGITAL_RIGHT_PILLAR_DEFINITIONS_FILE)?,
            )?,
            latlon: tables::load_latlon(open(raw_dir, tables::LATLON_FILE)?)?,
            bounding_boxes: tables::load_passthrough_json(
                tables::BOUNDING_BOXES_FILE,
                open(raw_dir, tables::BOUNDING_BOXES_FILE)?,
            )?,
            geojson: tables::load_passthrough_json(
                tables::GEOJSON_FILE,
                open(raw_dir, tables::GEOJSON_FILE)?,
            )?,
        };

        info!(
            raw_dir = %raw_dir.display(),
            countries = input.countries.len(),
            scores = input.scores.rows.len(),
            digital_right_scores = input.digital_right_scores.rows.len(),
            "loaded pipeline input"
        );

        Ok(input)
    }

    fn score_sources(&self) -> ScoreSources<'_> {
        ScoreSources {
            scores: &self.scores.rows,
            definitions: &self.definitions.rows,
            digital_right_scores: &self.digital_right_scores.rows,
            digital_right_definitions: &self.digital_right_definitions.rows,
            latlon: &self.latlon,
        }
    }
}

fn open(raw_dir: &Path, file_name: &str) -> Result<BufReader<File>, PipelineError> {
    let path = raw_dir.join(file_name);
    File::open(&path)
        .map(BufReader::new)
        .map_err(|source| PipelineError::Read { path, source })
}

/// Computed output of one run.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub countries: Vec<CountryRecord>,
    pub ancillary: AncillaryMetadata,
}

impl PreparedData {
    pub fn digital_right_coverage(&self) -> usize {
        self.countries
            .iter()
            .filter(|country| country.digital_right_data_available)
            .count()
    }
}

/// Builds the country score trees and ancillary metadata. Pure: identical
/// input always yields identical output.
pub fn build(input: &PipelineInput) -> PreparedData {
    let ancillary = AncillaryMetadata::emit(
        &input.pillar_definitions,
        &input.digital_right_pillar_definitions,
        &input.definitions.rows,
        &input.digital_right_definitions.rows,
    );
    let countries = CountryScoreTreeBuilder::new(input.score_sources(), &ancillary)
        .build(&input.countries);

    PreparedData {
        countries,
        ancillary,
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub countries: usize,
    pub digital_right_coverage: usize,
    pub outputs: OutputPaths,
}

/// Load, build and write. Nothing is written unless every step before the
/// write succeeded.
pub fn run(raw_dir: &Path, output_dir: &Path) -> Result<RunSummary, PipelineError> {
    let input = PipelineInput::load(raw_dir)?;
    let prepared = build(&input);
    info!(
        countries = prepared.countries.len(),
        pillars = prepared.ancillary.pillar_names.len(),
        digital_right_pillars = prepared.ancillary.digital_right_pillar_name.len(),
        "built country score trees"
    );

    let outputs = output::write_outputs(&input, &prepared, output_dir)?;
    info!(
        db = %outputs.db.display(),
        ancillary = %outputs.ancillary.display(),
        "wrote prepared data"
    );

    Ok(RunSummary {
        countries: prepared.countries.len(),
        digital_right_coverage: prepared.digital_right_coverage(),
        outputs,
    })
}

/// Default location of the raw inputs relative to the working directory.
pub fn default_raw_dir() -> PathBuf {
    PathBuf::from("database").join("raw")
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("database").join("processed")
}
