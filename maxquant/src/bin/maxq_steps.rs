//! maxq_steps: inspect and resolve the dmsSteps section of a MaxQuant parameter file.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use maxquant::{
    needs_dry_run, read_dms_steps, resolve_step_range, summarize, DryRun, StepResolution,
};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[clap(name = "maxq_steps", about = "Resolve MaxQuant step ranges for DMS step tools")]
struct Cli {
    /// Log debug messages.
    #[clap(long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dmsSteps section and the staged inputs of a parameter file.
    Show {
        /// MaxQuant parameter file.
        param_file: PathBuf,
    },
    /// Resolve the step range of a step tool from a saved dry run transcript.
    Resolve {
        /// MaxQuant parameter file.
        param_file: PathBuf,
        /// Step tool name, for example MaxqS1.
        #[clap(long)]
        tool: String,
        /// Console output of `MaxQuantCmd <param_file> --dryrun`.
        #[clap(long)]
        dry_run_output: Option<PathBuf>,
        /// Store resolved start steps in the parameter file.
        /// Without this flag a copy is resolved and the original is untouched.
        #[clap(long)]
        write: bool,
    },
}

/// Dry run output read from a file captured earlier.
struct SavedDryRun(Option<PathBuf>);

impl DryRun for SavedDryRun {
    fn dry_run(&self, param_file: &Path) -> Result<Vec<String>> {
        let path = self.0.as_ref().with_context(|| {
            format!(
                "{} has auto start steps; pass --dry-run-output",
                param_file.display()
            )
        })?;
        Ok(std::fs::read_to_string(path)
            .with_context(|| path.display().to_string())?
            .lines()
            .map(String::from)
            .collect())
    }
}

fn show(param_file: &Path) -> Result<String> {
    let xml = std::fs::read_to_string(param_file)
        .with_context(|| param_file.display().to_string())?;
    let steps = read_dms_steps(&xml)?;
    let mut out = String::new();
    writeln!(out, "{:<6}{:<12}{:<10}start step name", "id", "tool", "start")?;
    for step in &steps {
        writeln!(
            out,
            "{:<6}{:<12}{:<10}{}",
            step.id,
            step.tool,
            step.start_step_id.to_string(),
            step.start_step_name
        )?;
    }
    if needs_dry_run(&steps) {
        writeln!(out, "\nA dry run is required to resolve auto start steps.")?;
    }

    let summary = summarize(&xml)?;
    writeln!(out)?;
    for fasta in &summary.fasta_files {
        writeln!(out, "FASTA:    {fasta}")?;
    }
    for raw in &summary.raw_files {
        writeln!(out, "Raw file: {raw}")?;
    }
    if let Some(threads) = summary.num_threads {
        writeln!(out, "Threads:  {threads}")?;
    }
    Ok(out)
}

fn resolve(
    param_file: &Path,
    tool: &str,
    dry_run_output: Option<PathBuf>,
    write: bool,
) -> Result<String> {
    let dry_runner = SavedDryRun(dry_run_output);
    let StepResolution { range, steps, .. } = if write {
        resolve_step_range(param_file, tool, &dry_runner)?
    } else {
        let scratch = tempfile::tempdir()?;
        let copy = scratch.path().join("params.xml");
        std::fs::copy(param_file, &copy)
            .with_context(|| param_file.display().to_string())?;
        resolve_step_range(&copy, tool, &dry_runner)?
    };
    let mut out = String::new();
    for step in &steps {
        writeln!(out, "{}\t{}\t{}", step.id, step.tool, step.start_step)?;
    }
    writeln!(out, "{tool}: {range}")?;
    Ok(out)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(
            None,
            if cli.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        )
        .init();

    let result = match cli.command {
        Command::Show { param_file } => show(&param_file),
        Command::Resolve {
            param_file,
            tool,
            dry_run_output,
            write,
        } => resolve(&param_file, &tool, dry_run_output, write),
    };
    match result {
        Ok(out) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const PARAMS: &str = indoc! {r#"
        <MaxQuantParams>
          <fastaFiles>
            <FastaFileInfo>
              <fastaFilePath>C:\DMS_Temp_Org\human.fasta</fastaFilePath>
            </FastaFileInfo>
          </fastaFiles>
          <numThreads>4</numThreads>
          <dmsSteps>
            <step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="auto" />
            <step id="2" tool="MaxqS1" startStepName="Preparing searches" startStepID="auto" />
          </dmsSteps>
        </MaxQuantParams>
    "#};

    const DRY_RUN: &str = indoc! {"
        id\tnumber of threads\tjob name
        0\t1\tConfiguring
        1\t4\tFeature detection
        2\t1\tPreparing searches
        3\t4\tMain search
    "};

    fn write_inputs(dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let param_file = dir.join("MaxQuant_Params.xml");
        let dry_run_output = dir.join("dry_run.txt");
        std::fs::write(&param_file, PARAMS)?;
        std::fs::write(&dry_run_output, DRY_RUN)?;
        Ok((param_file, dry_run_output))
    }

    #[test]
    fn test_show() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (param_file, _) = write_inputs(dir.path())?;
        let out = show(&param_file)?;
        assert!(out.contains("A dry run is required"), "{out}");
        assert!(out.contains(r"FASTA:    C:\DMS_Temp_Org\human.fasta"), "{out}");
        assert!(out.contains("Threads:  4"), "{out}");
        Ok(())
    }

    #[test]
    fn test_resolve_copy_leaves_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (param_file, dry_run_output) = write_inputs(dir.path())?;
        let out = resolve(&param_file, "MaxqPeak", Some(dry_run_output), false)?;
        assert!(out.contains("1\tMaxqPeak\t0\n2\tMaxqS1\t2\n"), "{out}");
        assert!(out.contains("MaxqPeak: 0-1"), "{out}");
        assert_eq!(std::fs::read_to_string(&param_file)?, PARAMS);
        Ok(())
    }

    #[test]
    fn test_resolve_write() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (param_file, dry_run_output) = write_inputs(dir.path())?;
        let out = resolve(&param_file, "MaxqS1", Some(dry_run_output), true)?;
        assert!(out.contains("MaxqS1: 2-inf"), "{out}");
        let xml = std::fs::read_to_string(&param_file)?;
        assert!(!needs_dry_run(&read_dms_steps(&xml)?));
        Ok(())
    }

    #[test]
    fn test_auto_steps_need_dry_run_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (param_file, _) = write_inputs(dir.path())?;
        let err = resolve(&param_file, "MaxqS1", None, false).unwrap_err();
        assert!(format!("{err:#}").contains("pass --dry-run-output"), "{err:#}");
        assert_eq!(std::fs::read_to_string(&param_file)?, PARAMS);
        Ok(())
    }
}
