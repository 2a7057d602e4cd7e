//! MaxQuantCmd command line arguments.

use crate::step_range::StepRange;
use std::ffi::OsString;
use std::path::Path;

/// Arguments that list the processing jobs without running them.
pub fn dry_run_args(param_file: &Path) -> Vec<OsString> {
    vec![param_file.into(), "--dryrun".into()]
}

/// Arguments that run the jobs of one step range.
pub fn step_range_args(param_file: &Path, range: StepRange) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        param_file.into(),
        format!("--partial-processing={}", range.start).into(),
    ];
    if let Some(end) = range.end {
        args.push(format!("--partial-processing-end={end}").into());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_range_args() {
        let param = Path::new("/work/MaxQuant_Params.xml");
        assert_eq!(
            step_range_args(
                param,
                StepRange {
                    start: 3,
                    end: Some(12)
                }
            ),
            vec![
                OsString::from("/work/MaxQuant_Params.xml"),
                OsString::from("--partial-processing=3"),
                OsString::from("--partial-processing-end=12"),
            ]
        );
        assert_eq!(
            step_range_args(param, StepRange { start: 13, end: None }).len(),
            2
        );
        assert_eq!(dry_run_args(param)[1], "--dryrun");
    }
}
