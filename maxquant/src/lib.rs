//! maxquant
//!
//! Splitting one MaxQuant analysis across several DMS step tools.
//!
//! A MaxQuant parameter file carries a `dmsSteps` section naming, for each
//! step tool, the MaxQuant processing job it starts at. Job names are
//! resolved to job numbers by asking MaxQuantCmd for a dry run; the numbers
//! are written back into the parameter file so later steps skip the dry run.
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

pub mod command;
mod dms_steps;
mod dry_run;
mod error;
mod mqpar;
mod step_range;

pub use dms_steps::{needs_dry_run, read_dms_steps, read_dms_steps_file, DmsStep, StartStepId};
pub use dry_run::{parse_dry_run_output, resolve_start_steps, MaxQuantStep, ResolvedStep};
pub use error::MaxQuantError;
pub use mqpar::{
    rewrite_step_ids_in_place, summarize, update_parameter_file, update_parameters,
    write_resolved_step_ids, MqparSummary, MqparUpdate,
};
pub use step_range::{check_start_steps_increase, step_range_for_tool, StepRange};

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Produces the console output of a MaxQuant dry run for a parameter file.
pub trait DryRun {
    fn dry_run(&self, param_file: &Path) -> Result<Vec<String>>;
}

impl<F> DryRun for F
where
    F: Fn(&Path) -> Result<Vec<String>>,
{
    fn dry_run(&self, param_file: &Path) -> Result<Vec<String>> {
        self(param_file)
    }
}

/// The outcome of resolving the step range for one step tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResolution {
    pub range: StepRange,
    pub steps: Vec<ResolvedStep>,
    /// True if a dry run was needed and the parameter file was rewritten.
    pub ran_dry_run: bool,
}

/// Resolve the MaxQuant step range `tool` should run, running a dry run and
/// rewriting `param_file` in place if any start step is still `auto`.
pub fn resolve_step_range(
    param_file: &Path,
    tool: &str,
    dry_runner: &dyn DryRun,
) -> Result<StepResolution> {
    let steps = read_dms_steps_file(param_file)?;
    let ran_dry_run = needs_dry_run(&steps);

    let dry_run_steps = if ran_dry_run {
        let output = dry_runner
            .dry_run(param_file)
            .with_context(|| format!("MaxQuant dry run for {}", param_file.display()))?;
        let jobs = parse_dry_run_output(&output);
        info!("MaxQuant dry run reported {} processing steps", jobs.len());
        jobs
    } else {
        Vec::new()
    };

    let resolved = resolve_start_steps(&steps, &dry_run_steps)?;
    let range = step_range_for_tool(&resolved, tool)?;
    // Only starts that give every step tool a range are worth keeping.
    if ran_dry_run {
        check_start_steps_increase(&resolved)?;
        if rewrite_step_ids_in_place(param_file, &resolved)? {
            info!("stored resolved start steps in {}", param_file.display());
        }
    }

    info!("step tool {tool} will run MaxQuant steps {range}");
    Ok(StepResolution {
        range,
        steps: resolved,
        ran_dry_run,
    })
}
