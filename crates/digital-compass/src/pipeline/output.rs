use super::error::PipelineError;
use super::tables::JsonRow;
use super::{PipelineInput, PreparedData};
use crate::scoring::{AncillaryMetadata, CountryRecord};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DB_FILE: &str = "db.json";
pub const ANCILLARY_FILE: &str = "ancillary.ts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub db: PathBuf,
    pub ancillary: PathBuf,
}

/// Bulk document consumed by the dashboard.
#[derive(Debug, Serialize)]
pub struct Database<'a> {
    pub definitions: &'a [JsonRow],
    pub digital_right_definitions: &'a [JsonRow],
    #[serde(rename = "boundingBoxes")]
    pub bounding_boxes: &'a Value,
    pub countries: &'a [CountryRecord],
    pub geojson: &'a Value,
    pub scores: &'a [JsonRow],
    pub digital_right_scores: &'a [JsonRow],
}

impl<'a> Database<'a> {
    pub fn new(input: &'a PipelineInput, prepared: &'a PreparedData) -> Self {
        Self {
            definitions: &input.definitions.passthrough,
            digital_right_definitions: &input.digital_right_definitions.passthrough,
            bounding_boxes: &input.bounding_boxes,
            countries: &prepared.countries,
            geojson: &input.geojson,
            scores: &input.scores.passthrough,
            digital_right_scores: &input.digital_right_scores.passthrough,
        }
    }
}

pub fn render_database(
    input: &PipelineInput,
    prepared: &PreparedData,
) -> Result<String, PipelineError> {
    serde_json::to_string(&Database::new(input, prepared)).map_err(|source| {
        PipelineError::Serialize {
            artifact: DB_FILE,
            source,
        }
    })
}

/// Renders the metadata as a TypeScript module with a constant default export.
pub fn render_ancillary_module(metadata: &AncillaryMetadata) -> Result<String, PipelineError> {
    Ok(format!(
        "export default {{\n  pillars: {},\n  pillarNames: {},\n  pillarColorMap: {},\n  digitalRightPillarName: {},\n  digitalRightPillarColorMap: {},\n  digitalRightPillars: {},\n}} as const;\n",
        module_field(&metadata.pillars)?,
        module_field(&metadata.pillar_names)?,
        module_field(&metadata.pillar_color_map)?,
        module_field(&metadata.digital_right_pillar_name)?,
        module_field(&metadata.digital_right_pillar_color_map)?,
        module_field(&metadata.digital_right_pillars)?,
    ))
}

fn module_field<T: Serialize + ?Sized>(value: &T) -> Result<String, PipelineError> {
    serde_json::to_string(value).map_err(|source| PipelineError::Serialize {
        artifact: ANCILLARY_FILE,
        source,
    })
}

/// Serializes both artifacts, stages each in a temporary file inside
/// `output_dir`, then renames them into place. A failed write or rename of
/// `db.json` leaves no `ancillary.ts` behind from this run.
pub fn write_outputs(
    input: &PipelineInput,
    prepared: &PreparedData,
    output_dir: &Path,
) -> Result<OutputPaths, PipelineError> {
    let database = render_database(input, prepared)?;
    let ancillary = render_ancillary_module(&prepared.ancillary)?;

    fs::create_dir_all(output_dir).map_err(|source| PipelineError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let paths = OutputPaths {
        db: output_dir.join(DB_FILE),
        ancillary: output_dir.join(ANCILLARY_FILE),
    };
    let staged_db = stage(output_dir, &paths.db, &database)?;
    let staged_ancillary = stage(output_dir, &paths.ancillary, &ancillary)?;

    publish(staged_db, &paths.db)?;
    publish(staged_ancillary, &paths.ancillary)?;

    Ok(paths)
}

fn stage(output_dir: &Path, target: &Path, contents: &str) -> Result<NamedTempFile, PipelineError> {
    let write_error = |source: std::io::Error| PipelineError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(output_dir).map_err(write_error)?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    Ok(file)
}

fn publish(staged: NamedTempFile, target: &Path) -> Result<(), PipelineError> {
    staged
        .persist(target)
        .map(|_| ())
        .map_err(|err| PipelineError::Write {
            path: target.to_path_buf(),
            source: err.error,
        })
}
