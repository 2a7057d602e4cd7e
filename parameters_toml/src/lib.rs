// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

//! Site configuration for the DMS step tools.
//!
//! Values are read from a `parameters.toml` next to the running executable,
//! falling back to compiled defaults when that file does not exist. Every
//! field must be present in the file.

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct Parameters {
    /// MaxQuant command line program.
    maxquant_program: Cow<'static, str>,
    /// Seconds allowed for `MaxQuantCmd --dryrun`.
    maxquant_dry_run_timeout_secs: u64,
    /// Ape command line program.
    ape_program: Cow<'static, str>,
    /// Script host used to drive Bruker DataAnalysis.
    script_host_program: Cow<'static, str>,
    /// OMSSA command line search program.
    omssa_program: Cow<'static, str>,
    /// NCBI formatdb, used to index FASTA files for OMSSA.
    formatdb_program: Cow<'static, str>,
    /// GlyQ-IQ console program.
    glyq_iq_program: Cow<'static, str>,
    /// Upper bound on the number of GlyQ-IQ instances run for one job.
    glyq_iq_max_cores: usize,
    /// Step tools are killed after running this long.
    max_runtime_minutes: u64,
    /// How often a running step tool is polled.
    monitor_interval_ms: u64,
}

const DEFAULT_PARAMETERS: Parameters = Parameters {
    maxquant_program: Cow::Borrowed("MaxQuantCmd"),
    maxquant_dry_run_timeout_secs: 600,
    ape_program: Cow::Borrowed("Ape"),
    script_host_program: Cow::Borrowed("cscript"),
    omssa_program: Cow::Borrowed("omssacl"),
    formatdb_program: Cow::Borrowed("formatdb"),
    glyq_iq_program: Cow::Borrowed("IQGlyQ_Console"),
    glyq_iq_max_cores: 16,
    max_runtime_minutes: 4320,
    monitor_interval_ms: 2000,
};
static PARAMETERS: OnceLock<Result<Parameters>> = OnceLock::new();

fn load_parameters(path: &Path) -> Result<Parameters> {
    if !path.exists() {
        warn!(
            "could not find parameters.toml at {}, falling back to defaults",
            path.display()
        );
        return Ok(DEFAULT_PARAMETERS);
    }
    let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
    toml::from_str(&s).with_context(|| path.display().to_string())
}

/// Return a reference to the global parameters.
/// The parameters may need to be loaded; if loading fails, return Err.
fn parameters() -> &'static Result<Parameters> {
    PARAMETERS.get_or_init(|| {
        let path = std::env::current_exe()
            .context("Unable to locate the running executable")?
            .with_file_name("parameters.toml");
        load_parameters(&path)
    })
}

macro_rules! parameter_getter {
    ($a:ident, $t:ty) => {
        pub fn $a() -> Result<$t> {
            let val = match parameters() {
                Err(e) => return Err(anyhow::anyhow!("{e:#}")),
                Ok(p) => p.$a,
            };
            if DEFAULT_PARAMETERS.$a != val {
                warn!("using non-default {} = {:?}", stringify!($a), val);
            }
            Ok(val)
        }
    };
}

macro_rules! str_parameter_getter {
    ($a:ident) => {
        pub fn $a() -> Result<&'static str> {
            let val = match parameters() {
                Err(e) => return Err(anyhow::anyhow!("{e:#}")),
                Ok(p) => &*p.$a,
            };
            if DEFAULT_PARAMETERS.$a != val {
                warn!("using non-default {} = {:?}", stringify!($a), val);
            }
            Ok(val)
        }
    };
}

str_parameter_getter!(maxquant_program);
str_parameter_getter!(ape_program);
str_parameter_getter!(script_host_program);
str_parameter_getter!(omssa_program);
str_parameter_getter!(formatdb_program);
str_parameter_getter!(glyq_iq_program);
parameter_getter!(maxquant_dry_run_timeout_secs, u64);
parameter_getter!(glyq_iq_max_cores, usize);
parameter_getter!(max_runtime_minutes, u64);
parameter_getter!(monitor_interval_ms, u64);

/// Time allowed for a MaxQuant dry run.
pub fn maxquant_dry_run_timeout() -> Result<Duration> {
    Ok(Duration::from_secs(maxquant_dry_run_timeout_secs()?))
}

/// Time after which a step tool is killed.
pub fn max_runtime() -> Result<Duration> {
    Ok(Duration::from_secs(max_runtime_minutes()? * 60))
}

/// Polling interval for running step tools.
pub fn monitor_interval() -> Result<Duration> {
    Ok(Duration::from_millis(monitor_interval_ms()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let params = load_parameters(&dir.path().join("parameters.toml"))?;
        assert_eq!(params, DEFAULT_PARAMETERS);
        Ok(())
    }

    #[test]
    fn test_load_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("parameters.toml");
        std::fs::write(
            &path,
            r#"
maxquant_program = "/opt/MaxQuant/bin/MaxQuantCmd"
maxquant_dry_run_timeout_secs = 120
ape_program = "Ape"
script_host_program = "cscript"
omssa_program = "omssacl"
formatdb_program = "formatdb"
glyq_iq_program = "IQGlyQ_Console"
glyq_iq_max_cores = 4
max_runtime_minutes = 60
monitor_interval_ms = 500
"#,
        )?;
        let params = load_parameters(&path)?;
        assert_eq!(params.maxquant_program, "/opt/MaxQuant/bin/MaxQuantCmd");
        assert_eq!(params.glyq_iq_max_cores, 4);
        assert_eq!(params.monitor_interval_ms, 500);
        Ok(())
    }

    #[test]
    fn test_incomplete_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("parameters.toml");
        std::fs::write(&path, "glyq_iq_max_cores = 4\n")?;
        assert!(load_parameters(&path).is_err());
        Ok(())
    }
}
