//! Launching step tools with the site limits and keeping their console output.

use anyhow::Result;
use dms_types::{console_output_stem, TxtFile};
use log::{debug, info};
use martian::prelude::MartianRover;
use prog_runner::{locate_program, prune_console_output, ProgRunner, RunOutcome};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Lines that carry no information in any tool's console output.
fn blank_line() -> &'static Regex {
    static BLANK: OnceLock<Regex> = OnceLock::new();
    BLANK.get_or_init(|| Regex::new(r"^\s*$").unwrap())
}

/// Resolve the program for a tool: the stage's override if given, else the
/// configured program.
pub(crate) fn tool_program(
    override_program: Option<&Path>,
    configured: impl FnOnce() -> Result<&'static str>,
) -> Result<PathBuf> {
    match override_program {
        Some(program) => locate_program(program),
        None => locate_program(configured()?),
    }
}

/// A runner with the configured time limit and polling interval.
pub(crate) fn tool_runner(program: PathBuf) -> Result<ProgRunner> {
    Ok(ProgRunner::new(program)
        .timeout(parameters_toml::max_runtime()?)
        .monitor_interval(parameters_toml::monitor_interval()?))
}

/// One tool invocation whose console output goes to `<tool>_ConsoleOutput.txt`.
pub(crate) struct ToolRun<'a> {
    pub tool: &'a str,
    pub console_output: TxtFile,
}

impl<'a> ToolRun<'a> {
    pub fn new(tool: &'a str, rover: &MartianRover) -> Self {
        ToolRun {
            tool,
            console_output: rover.make_path(console_output_stem(tool)),
        }
    }

    pub fn with_console_output(tool: &'a str, console_output: TxtFile) -> Self {
        ToolRun {
            tool,
            console_output,
        }
    }

    /// Run the program, prune the console output, and fail unless it succeeded.
    pub fn run(&self, runner: ProgRunner) -> Result<RunOutcome> {
        let console: &Path = self.console_output.as_ref();
        let outcome = runner.console_output(console).run()?;
        let removed = prune_console_output(console, std::slice::from_ref(blank_line()))?;
        if removed > 0 {
            debug!("removed {removed} lines from the {} console output", self.tool);
        }
        outcome.check(self.tool)?;
        info!(
            "{} finished in {:.1} minutes",
            self.tool,
            outcome.elapsed.as_secs_f64() / 60.0
        );
        Ok(outcome)
    }
}
