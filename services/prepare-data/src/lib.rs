mod cli;
mod commands;

use digital_compass::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
