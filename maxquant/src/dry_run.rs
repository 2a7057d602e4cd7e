//! Discovering MaxQuant step numbers from `MaxQuantCmd --dryrun` output.
//!
//! The dry run prints one tab-separated line per processing job:
//!
//! ```text
//! id	number of threads	job name
//! 0	1	Configuring
//! 1	4	Feature detection
//! ```

use crate::dms_steps::{DmsStep, StartStepId};
use crate::error::MaxQuantError;
use regex::Regex;
use std::sync::OnceLock;

/// One processing job reported by a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxQuantStep {
    pub number: u32,
    pub threads: u32,
    pub name: String,
}

/// A dmsSteps step with its start step number resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStep {
    pub id: u32,
    pub tool: String,
    pub start_step_name: String,
    pub start_step: u32,
}

fn step_line_regex() -> &'static Regex {
    static STEP_LINE: OnceLock<Regex> = OnceLock::new();
    STEP_LINE.get_or_init(|| Regex::new(r"^\s*(\d+)\s+(\d+)\s+(\S.*?)\s*$").unwrap())
}

/// Extract the ordered step list from dry run console output.
/// Lines that are not step lines, including the header, are skipped.
pub fn parse_dry_run_output<I, S>(lines: I) -> Vec<MaxQuantStep>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let re = step_line_regex();
    lines
        .into_iter()
        .filter_map(|line| {
            let caps = re.captures(line.as_ref())?;
            Some(MaxQuantStep {
                number: caps[1].parse().ok()?,
                threads: caps[2].parse().ok()?,
                name: caps[3].to_string(),
            })
        })
        .collect()
}

/// Assign a concrete start step to every dmsSteps step.
///
/// Steps are resolved in id order. A symbolic start step name only matches
/// dry run jobs numbered after the previous step's start, so a job name that
/// MaxQuant repeats resolves to the occurrence following the prior step.
pub fn resolve_start_steps(
    steps: &[DmsStep],
    dry_run: &[MaxQuantStep],
) -> Result<Vec<ResolvedStep>, MaxQuantError> {
    let mut resolved = Vec::with_capacity(steps.len());
    let mut previous: Option<u32> = None;

    for step in steps {
        let start_step = match step.start_step_id {
            StartStepId::Fixed(n) => n,
            StartStepId::Auto => {
                if dry_run.is_empty() {
                    return Err(MaxQuantError::EmptyDryRun);
                }
                let wanted = step.start_step_name.trim();
                dry_run
                    .iter()
                    .filter(|job| previous.map_or(true, |prev| job.number > prev))
                    .find(|job| job.name.trim().eq_ignore_ascii_case(wanted))
                    .map(|job| job.number)
                    .ok_or_else(|| MaxQuantError::StepNameNotFound {
                        id: step.id,
                        name: step.start_step_name.clone(),
                        available: dry_run
                            .iter()
                            .map(|job| format!("{} {}", job.number, job.name))
                            .collect::<Vec<_>>()
                            .join("; "),
                    })?
            }
        };
        previous = Some(previous.map_or(start_step, |prev| prev.max(start_step)));
        resolved.push(ResolvedStep {
            id: step.id,
            tool: step.tool.clone(),
            start_step_name: step.start_step_name.clone(),
            start_step,
        });
    }
    Ok(resolved)
}
