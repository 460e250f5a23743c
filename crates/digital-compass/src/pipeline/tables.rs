use super::error::{PipelineError, SchemaError};
use super::measure::{json_number, Measure, Rank};
use crate::scoring::StageName;
use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::io::Read;

pub const COUNTRIES_FILE: &str = "countries-manifest.csv";
pub const SCORES_FILE: &str = "scores.csv";
pub const DIGITAL_RIGHT_SCORES_FILE: &str = "digital-right-scores.csv";
pub const DEFINITIONS_FILE: &str = "definitions.csv";
pub const DIGITAL_RIGHT_DEFINITIONS_FILE: &str = "digital-right-definitions.csv";
pub const PILLAR_DEFINITIONS_FILE: &str = "pillar-definitions.csv";
pub const DIGITAL_RIGHT_PILLAR_DEFINITIONS_FILE: &str = "digital-right-pillar-definitions.csv";
pub const LATLON_FILE: &str = "latlon.json";
pub const BOUNDING_BOXES_FILE: &str = "bounding-boxes.json";
pub const GEOJSON_FILE: &str = "country-geojson.json";

const COUNTRY_COLUMNS: &[&str] = &["Country or Area", "ISO-alpha3 Code", "ISO-alpha2 Code"];
const SCORE_COLUMNS: &[&str] = &[
    "Country Name",
    "Pillar",
    "Sub-Pillar",
    "Indicator",
    "new_rank_score",
    "data_availability",
    "rank",
];
const DIGITAL_RIGHT_SCORE_COLUMNS: &[&str] = &[
    "Country Name",
    "Pillar",
    "Indicator",
    "new_rank_score",
    "data_availability",
    "rank",
];
const DEFINITION_COLUMNS: &[&str] = &[
    "Pillar",
    "Sub-Pillar",
    "Basic",
    "Opportunistic",
    "Systematic",
    "Differentiating",
    "Transformational",
];
const DIGITAL_RIGHT_DEFINITION_COLUMNS: &[&str] = &[
    "Pillar",
    "Basic",
    "Opportunistic",
    "Systematic",
    "Differentiating",
    "Transformational",
];
const PILLAR_DEFINITION_COLUMNS: &[&str] = &[
    "Pillar",
    "ColorBase",
    "ColorTriple1",
    "ColorTriple2",
    "ColorTriple3",
];

const AVAILABILITY_COLUMN: &str = "data_availability";

/// One raw CSV row as the presentation layer receives it.
pub type JsonRow = Map<String, Value>;

/// Typed rows plus the untouched rows they were parsed from, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable<T> {
    pub rows: Vec<T>,
    pub passthrough: Vec<JsonRow>,
}

impl<T> LoadedTable<T> {
    pub fn paired(&self) -> impl Iterator<Item = (&T, &JsonRow)> {
        self.rows.iter().zip(self.passthrough.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CountryRow {
    #[serde(rename = "Country or Area")]
    pub name: String,
    #[serde(rename = "ISO-alpha3 Code")]
    pub iso_alpha3: String,
    #[serde(rename = "ISO-alpha2 Code")]
    pub iso_alpha2: String,
    #[serde(rename = "Region Name", default)]
    pub region: String,
    #[serde(rename = "Sub-region Name", default)]
    pub sub_region: String,
    #[serde(rename = "World Bank Income Level", default)]
    pub income_level: String,
    #[serde(rename = "UN Member States", default)]
    pub un_member_flag: String,
    #[serde(rename = "Small Island Developing States (SIDS)", default)]
    pub sids_flag: String,
    #[serde(rename = "Land Locked Developing Countries (LLDC)", default)]
    pub lldc_flag: String,
    #[serde(rename = "Least Developed Countries (LDC)", default)]
    pub ldc_flag: String,
}

impl CountryRow {
    pub fn is_un_member(&self) -> bool {
        is_marked(&self.un_member_flag)
    }

    pub fn is_sids(&self) -> bool {
        is_marked(&self.sids_flag)
    }

    pub fn is_lldc(&self) -> bool {
        is_marked(&self.lldc_flag)
    }

    pub fn is_ldc(&self) -> bool {
        is_marked(&self.ldc_flag)
    }
}

fn is_marked(cell: &str) -> bool {
    cell.trim() == "x"
}

/// Flat fact row shared by the standard and digital-rights score tables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScoreRow {
    #[serde(rename = "Country Name")]
    pub country_name: String,
    #[serde(rename = "Pillar", default)]
    pub pillar: String,
    #[serde(rename = "Sub-Pillar", default)]
    pub sub_pillar: String,
    #[serde(rename = "Indicator", default)]
    pub indicator: String,
    #[serde(rename = "new_rank_score", default, deserialize_with = "measure_cell")]
    pub new_rank_score: Measure,
    #[serde(rename = "data_availability", default, deserialize_with = "measure_cell")]
    pub data_availability: Measure,
    #[serde(rename = "rank", default, deserialize_with = "rank_cell")]
    pub rank: Option<Rank>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DefinitionRow {
    #[serde(rename = "Pillar", default)]
    pub pillar: String,
    #[serde(rename = "Sub-Pillar", default)]
    pub sub_pillar: String,
    #[serde(rename = "Basic", default)]
    pub basic: String,
    #[serde(rename = "Opportunistic", default)]
    pub opportunistic: String,
    #[serde(rename = "Systematic", default)]
    pub systematic: String,
    #[serde(rename = "Differentiating", default)]
    pub differentiating: String,
    #[serde(rename = "Transformational", default)]
    pub transformational: String,
}

impl DefinitionRow {
    pub fn text_for(&self, stage: StageName) -> &str {
        match stage {
            StageName::Basic => &self.basic,
            StageName::Opportunistic => &self.opportunistic,
            StageName::Systematic => &self.systematic,
            StageName::Differentiating => &self.differentiating,
            StageName::Transformational => &self.transformational,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PillarDefinitionRow {
    #[serde(rename = "Pillar")]
    pub pillar: String,
    #[serde(rename = "ColorBase")]
    pub color_base: String,
    #[serde(rename = "ColorTriple1")]
    pub color_triple_1: String,
    #[serde(rename = "ColorTriple2")]
    pub color_triple_2: String,
    #[serde(rename = "ColorTriple3")]
    pub color_triple_3: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LatLonEntry {
    #[serde(default)]
    pub alpha2: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

pub fn load_countries<R: Read>(reader: R) -> Result<Vec<CountryRow>, PipelineError> {
    let table = CsvTable::read(COUNTRIES_FILE, reader)?;
    table.require(COUNTRY_COLUMNS)?;
    table.typed()
}

pub fn load_scores<R: Read>(reader: R) -> Result<LoadedTable<ScoreRow>, PipelineError> {
    load_with_passthrough(SCORES_FILE, SCORE_COLUMNS, reader)
}

pub fn load_digital_right_scores<R: Read>(
    reader: R,
) -> Result<LoadedTable<ScoreRow>, PipelineError> {
    load_with_passthrough(
        DIGITAL_RIGHT_SCORES_FILE,
        DIGITAL_RIGHT_SCORE_COLUMNS,
        reader,
    )
}

pub fn load_definitions<R: Read>(reader: R) -> Result<LoadedTable<DefinitionRow>, PipelineError> {
    load_with_passthrough(DEFINITIONS_FILE, DEFINITION_COLUMNS, reader)
}

pub fn load_digital_right_definitions<R: Read>(
    reader: R,
) -> Result<LoadedTable<DefinitionRow>, PipelineError> {
    load_with_passthrough(
        DIGITAL_RIGHT_DEFINITIONS_FILE,
        DIGITAL_RIGHT_DEFINITION_COLUMNS,
        reader,
    )
}

pub fn load_pillar_definitions<R: Read>(
    reader: R,
) -> Result<Vec<PillarDefinitionRow>, PipelineError> {
    let table = CsvTable::read(PILLAR_DEFINITIONS_FILE, reader)?;
    table.require(PILLAR_DEFINITION_COLUMNS)?;
    table.typed()
}

pub fn load_digital_right_pillar_definitions<R: Read>(
    reader: R,
) -> Result<Vec<PillarDefinitionRow>, PipelineError> {
    let table = CsvTable::read(DIGITAL_RIGHT_PILLAR_DEFINITIONS_FILE, reader)?;
    table.require(PILLAR_DEFINITION_COLUMNS)?;
    table.typed()
}

pub fn load_latlon<R: Read>(reader: R) -> Result<Vec<LatLonEntry>, PipelineError> {
    serde_json::from_reader(reader).map_err(|source| PipelineError::Json {
        table: LATLON_FILE,
        source,
    })
}

/// Geographic documents are carried through without interpretation.
pub fn load_passthrough_json<R: Read>(
    table: &'static str,
    reader: R,
) -> Result<Value, PipelineError> {
    serde_json::from_reader(reader).map_err(|source| PipelineError::Json { table, source })
}

fn load_with_passthrough<T: DeserializeOwned, R: Read>(
    name: &'static str,
    columns: &[&'static str],
    reader: R,
) -> Result<LoadedTable<T>, PipelineError> {
    let table = CsvTable::read(name, reader)?;
    table.require(columns)?;
    Ok(LoadedTable {
        rows: table.typed()?,
        passthrough: table.passthrough(),
    })
}

struct CsvTable {
    name: &'static str,
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl CsvTable {
    fn read<R: Read>(name: &'static str, reader: R) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|source| PipelineError::Csv { table: name, source })?
            .clone();
        let records = csv_reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| PipelineError::Csv { table: name, source })?;

        tracing::debug!(table = name, rows = records.len(), "loaded table");

        Ok(Self {
            name,
            headers,
            records,
        })
    }

    fn require(&self, columns: &[&'static str]) -> Result<(), SchemaError> {
        for &column in columns {
            if !self.headers.iter().any(|header| header == column) {
                return Err(SchemaError::MissingColumn {
                    table: self.name,
                    column,
                });
            }
        }
        Ok(())
    }

    fn typed<T: DeserializeOwned>(&self) -> Result<Vec<T>, PipelineError> {
        self.records
            .iter()
            .map(|record| {
                record
                    .deserialize(Some(&self.headers))
                    .map_err(|source| PipelineError::Csv {
                        table: self.name,
                        source,
                    })
            })
            .collect()
    }

    fn passthrough(&self) -> Vec<JsonRow> {
        self.records
            .iter()
            .map(|record| {
                self.headers
                    .iter()
                    .zip(record.iter())
                    .map(|(header, cell)| {
                        let value = if header == AVAILABILITY_COLUMN {
                            availability_value(cell)
                        } else {
                            Value::String(cell.to_string())
                        };
                        (header.to_string(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

// Blank availability cells are published as 0, unparsable ones as null.
fn availability_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::from(0);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => json_number(value),
        _ => Value::Null,
    }
}

fn measure_cell<'de, D>(deserializer: D) -> Result<Measure, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Measure::parse(&raw))
}

fn rank_cell<'de, D>(deserializer: D) -> Result<Option<Rank>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Rank::parse(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SCORES: &str = "Country Name,Pillar,Sub-Pillar,Indicator,data_col,new_rank_score,data_availability,rank\n\
Ghana,Economy,,,1.2,3.42,87.5,12\n\
Ghana,Economy,Financial services,,0.4,0,,\n\
Ghana,Economy,Financial services,Bank accounts,42,2.1,,\n";

    #[test]
    fn score_rows_parse_into_typed_measures() {
        let table = load_scores(Cursor::new(SCORES)).expect("scores load");
        assert_eq!(table.rows.len(), 3);

        let pillar = &table.rows[0];
        assert_eq!(pillar.country_name, "Ghana");
        assert!(pillar.sub_pillar.is_empty());
        assert_eq!(pillar.new_rank_score, Measure::Value(3.42));
        assert_eq!(pillar.data_availability, Measure::Value(87.5));
        assert_eq!(pillar.rank, Rank::parse("12"));

        let sub_pillar = &table.rows[1];
        assert_eq!(sub_pillar.new_rank_score, Measure::Zero);
        assert_eq!(sub_pillar.data_availability, Measure::Missing);
        assert!(sub_pillar.rank.is_none());
    }

    #[test]
    fn passthrough_keeps_cells_as_strings_except_availability() {
        let table = load_scores(Cursor::new(SCORES)).expect("scores load");
        let first = &table.passthrough[0];
        assert_eq!(first["Country Name"], Value::from("Ghana"));
        assert_eq!(first["data_col"], Value::from("1.2"));
        assert_eq!(first["new_rank_score"], Value::from("3.42"));
        assert_eq!(first["data_availability"], Value::from(87.5));

        let second = &table.passthrough[1];
        assert_eq!(second["data_availability"], Value::from(0));
    }

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let csv = "Country Name,Pillar,Indicator,new_rank_score,data_availability,rank\nGhana,Economy,,1,2,3\n";
        let error = load_scores(Cursor::new(csv)).expect_err("schema drift detected");

        match error {
            PipelineError::Schema(SchemaError::MissingColumn { table, column }) => {
                assert_eq!(table, SCORES_FILE);
                assert_eq!(column, "Sub-Pillar");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn digital_right_scores_do_not_need_a_sub_pillar_column() {
        let csv = "Country Name,Pillar,Indicator,new_rank_score,data_availability,rank\nGhana,Privacy,,2.5,50,4\n";
        let table = load_digital_right_scores(Cursor::new(csv)).expect("loads");
        assert!(table.rows[0].sub_pillar.is_empty());
        assert_eq!(table.rows[0].new_rank_score, Measure::Value(2.5));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "Country Name,Pillar,Sub-Pillar,Indicator,new_rank_score,data_availability,rank\nGhana,Economy\n";
        let error = load_scores(Cursor::new(csv)).expect_err("ragged row rejected");
        assert!(matches!(error, PipelineError::Csv { table: SCORES_FILE, .. }));
    }

    #[test]
    fn country_flags_require_literal_x() {
        let csv = "Country or Area,ISO-alpha3 Code,ISO-alpha2 Code,UN Member States,Small Island Developing States (SIDS),Land Locked Developing Countries (LLDC),Least Developed Countries (LDC)\n\
Ghana,GHA,GH,x,,X,yes\n";
        let countries = load_countries(Cursor::new(csv)).expect("countries load");
        let ghana = &countries[0];
        assert!(ghana.is_un_member());
        assert!(!ghana.is_sids());
        assert!(!ghana.is_lldc());
        assert!(!ghana.is_ldc());
    }

    #[test]
    fn definitions_expose_text_per_stage() {
        let csv = "Pillar,Sub-Pillar,Definition,Basic,Opportunistic,Systematic,Differentiating,Transformational\n\
Economy,,Economic activity,b,o,s,d,t\n";
        let table = load_definitions(Cursor::new(csv)).expect("definitions load");
        let row = &table.rows[0];
        assert_eq!(row.text_for(StageName::Basic), "b");
        assert_eq!(row.text_for(StageName::Transformational), "t");
        assert_eq!(table.passthrough[0]["Definition"], Value::from("Economic activity"));
    }

    #[test]
    fn latlon_ignores_extra_fields() {
        let json = r#"[{"alpha2":"GH","country":"Ghana","latitude":7.9,"longitude":-1.0}]"#;
        let entries = load_latlon(Cursor::new(json)).expect("latlon loads");
        assert_eq!(entries[0].alpha2, "GH");
        assert_eq!(entries[0].latitude, Some(7.9));
    }
}
