//! git2graph binary entry point.

use std::process::ExitCode;

use git2graph::ui::output;

fn main() -> ExitCode {
    match git2graph::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
