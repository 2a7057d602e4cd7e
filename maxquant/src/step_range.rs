use crate::dry_run::ResolvedStep;
use crate::error::MaxQuantError;
use std::fmt;

/// The inclusive range of MaxQuant steps a DMS step tool runs.
/// An `end` of `None` runs through the final MaxQuant step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl StepRange {
    pub fn is_unbounded(&self) -> bool {
        self.end.is_none()
    }
}

impl fmt::Display for StepRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{end}", self.start),
            None => write!(f, "{}-inf", self.start),
        }
    }
}

/// Check that every step starts after the step before it, so each step tool
/// has a non-empty range.
pub fn check_start_steps_increase(resolved: &[ResolvedStep]) -> Result<(), MaxQuantError> {
    for pair in resolved.windows(2) {
        if pair[1].start_step <= pair[0].start_step {
            return Err(MaxQuantError::NonIncreasingSteps {
                tool: pair[0].tool.clone(),
                start: pair[0].start_step,
                next_start: pair[1].start_step,
            });
        }
    }
    Ok(())
}

/// Compute the step range for `tool` from the resolved steps, which must be
/// in step id order.
pub fn step_range_for_tool(
    resolved: &[ResolvedStep],
    tool: &str,
) -> Result<StepRange, MaxQuantError> {
    let index = resolved
        .iter()
        .position(|step| step.tool.eq_ignore_ascii_case(tool.trim()))
        .ok_or_else(|| MaxQuantError::ToolNotDefined(tool.to_string()))?;

    let start = resolved[index].start_step;
    let end = match resolved.get(index + 1) {
        None => None,
        Some(next) if next.start_step > start => Some(next.start_step - 1),
        Some(next) => {
            return Err(MaxQuantError::NonIncreasingSteps {
                tool: resolved[index].tool.clone(),
                start,
                next_start: next.start_step,
            })
        }
    };
    Ok(StepRange { start, end })
}
