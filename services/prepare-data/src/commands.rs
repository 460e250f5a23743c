use crate::cli::{BuildArgs, CompareArgs, IndicatorsArgs, StagesArgs};
use digital_compass::config::AppConfig;
use digital_compass::error::AppError;
use digital_compass::pipeline::{self, PipelineError, PipelineInput};
use digital_compass::{queries, telemetry};
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

pub(crate) fn run_build(args: BuildArgs) -> Result<(), AppError> {
    let config = init()?;
    let raw_dir = args.raw_dir.unwrap_or(config.paths.raw_dir);
    let output_dir = args.output_dir.unwrap_or(config.paths.output_dir);

    info!(
        environment = ?config.environment,
        raw_dir = %raw_dir.display(),
        output_dir = %output_dir.display(),
        "preparing dashboard data"
    );
    let summary = pipeline::run(&raw_dir, &output_dir)?;

    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "Prepared {} countries ({} with digital-rights data)",
        summary.countries, summary.digital_right_coverage
    )?;
    writeln!(stdout, "  {}", summary.outputs.db.display())?;
    writeln!(stdout, "  {}", summary.outputs.ancillary.display())?;
    Ok(())
}

pub(crate) fn run_stages(args: StagesArgs) -> Result<(), AppError> {
    let input = load_input(args.raw_dir)?;
    let row = if args.digital_rights {
        queries::digital_right_stage_definitions(&input, &args.pillar)
    } else {
        queries::stage_definitions(&input, &args.pillar, args.sub_pillar.as_deref())
    };

    match row {
        Some(row) => print_json(row),
        None => print_json(&Value::Null),
    }
}

pub(crate) fn run_indicators(args: IndicatorsArgs) -> Result<(), AppError> {
    let input = load_input(args.raw_dir)?;
    if let Some(country) = args.country.as_deref() {
        let rows = match (args.digital_rights, args.sub_pillar.as_deref()) {
            (false, Some(sub_pillar)) => {
                queries::country_indicators(&input, country, &args.pillar, sub_pillar)
            }
            _ => queries::digital_right_country_indicators(&input, country, &args.pillar),
        };
        info!(country, pillar = %args.pillar, indicators = rows.len(), "resolved country indicators");
        return print_json(&rows);
    }

    let rows = match (args.digital_rights, args.sub_pillar.as_deref()) {
        (false, Some(sub_pillar)) => {
            queries::indicators_for_sub_pillar(&input, &args.pillar, sub_pillar)
        }
        _ => queries::digital_right_indicators_for_pillar(&input, &args.pillar),
    };
    info!(pillar = %args.pillar, indicators = rows.len(), "resolved indicators");
    print_json(&rows)
}

pub(crate) fn run_compare(args: CompareArgs) -> Result<(), AppError> {
    let input = load_input(args.raw_dir)?;
    let prepared = pipeline::build(&input);

    match queries::compare_countries(&prepared.countries, &args.country, args.by) {
        Some(peers) => {
            info!(country = %args.country, by = %args.by, peers = peers.len(), "resolved peer countries");
            print_json(&peers)
        }
        None => {
            warn!(country = %args.country, "country not found");
            print_json(&Value::Null)
        }
    }
}

fn init() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn load_input(raw_dir: Option<PathBuf>) -> Result<PipelineInput, AppError> {
    let config = init()?;
    let raw_dir = raw_dir.unwrap_or(config.paths.raw_dir);
    Ok(PipelineInput::load(&raw_dir)?)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|source| PipelineError::Serialize {
            artifact: "lookup result",
            source,
        })?;
    writeln!(io::stdout().lock(), "{rendered}")?;
    Ok(())
}
