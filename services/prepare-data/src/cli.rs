use crate::commands::{run_build, run_compare, run_indicators, run_stages};
use clap::{Args, Parser, Subcommand};
use digital_compass::error::AppError;
use digital_compass::queries::CompareKey;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "prepare-data",
    about = "Derive country score trees and dashboard metadata from the raw compass tables",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build db.json and ancillary.ts (default command)
    Build(BuildArgs),
    /// Print the stage definitions for a pillar or sub-pillar
    Stages(StagesArgs),
    /// Print the indicators published under a pillar or sub-pillar
    Indicators(IndicatorsArgs),
    /// Print the peer countries of a country
    Compare(CompareArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct BuildArgs {
    /// Override the configured raw input directory
    #[arg(long)]
    pub(crate) raw_dir: Option<PathBuf>,
    /// Override the configured output directory
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct StagesArgs {
    #[arg(long)]
    pub(crate) pillar: String,
    #[arg(long, conflicts_with = "digital_rights")]
    pub(crate) sub_pillar: Option<String>,
    /// Look up the digital-rights definitions instead
    #[arg(long)]
    pub(crate) digital_rights: bool,
    /// Override the configured raw input directory
    #[arg(long)]
    pub(crate) raw_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct IndicatorsArgs {
    #[arg(long)]
    pub(crate) pillar: String,
    #[arg(
        long,
        required_unless_present = "digital_rights",
        conflicts_with = "digital_rights"
    )]
    pub(crate) sub_pillar: Option<String>,
    /// List digital-rights indicators for the pillar instead
    #[arg(long)]
    pub(crate) digital_rights: bool,
    /// Only this country's indicator rows, each with its sources
    #[arg(long)]
    pub(crate) country: Option<String>,
    /// Override the configured raw input directory
    #[arg(long)]
    pub(crate) raw_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    /// ISO-alpha3 code of the country to compare
    #[arg(long)]
    pub(crate) country: String,
    /// region, sub-region, sids, lldc or ldc
    #[arg(long)]
    pub(crate) by: CompareKey,
    /// Override the configured raw input directory
    #[arg(long)]
    pub(crate) raw_dir: Option<PathBuf>,
}

pub(crate) fn run() -> Result<(), AppError> {
    dispatch(Cli::parse())
}

fn dispatch(cli: Cli) -> Result<(), AppError> {
    let command = cli
        .command
        .unwrap_or_else(|| Command::Build(BuildArgs::default()));

    match command {
        Command::Build(args) => run_build(args),
        Command::Stages(args) => run_stages(args),
        Command::Indicators(args) => run_indicators(args),
        Command::Compare(args) => run_compare(args),
    }
}
