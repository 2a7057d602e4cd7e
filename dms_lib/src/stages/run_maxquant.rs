//! Martian stage RUN_MAXQUANT
//! Run the range of MaxQuant processing steps that belongs to this step tool.

use crate::tool::{tool_program, tool_runner, ToolRun};
use anyhow::{ensure, Result};
use dms_io::{copy_dir, link_or_copy, zip_directory};
use dms_types::{JobInfo, TxtFile, XmlFile, ZipFile};
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use maxquant::command::{dry_run_args, step_range_args};
use maxquant::{resolve_step_range, update_parameters, DryRun, MqparUpdate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const COMBINED: &str = "combined";

#[derive(Clone, Deserialize, MartianStruct)]
pub struct RunMaxQuantStageInputs {
    pub job: JobInfo,
    pub param_file: XmlFile,
    pub fasta_file: PathBuf,
    pub raw_files: Vec<PathBuf>,
    pub combined: Option<PathBuf>,
    /// MaxQuantCmd to run instead of the configured program.
    pub maxquant_program: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct RunMaxQuantStageOutputs {
    /// Parameter file with every start step resolved.
    pub param_file: XmlFile,
    pub step_range: String,
    pub results: ZipFile,
    pub console_output: TxtFile,
    pub dry_run_console_output: Option<TxtFile>,
}

/// Runs `MaxQuantCmd <param> --dryrun` in the work directory.
struct MaxQuantDryRun<'a> {
    program: &'a Path,
    work_dir: &'a Path,
    console_output: TxtFile,
}

impl DryRun for MaxQuantDryRun<'_> {
    fn dry_run(&self, param_file: &Path) -> Result<Vec<String>> {
        let runner = tool_runner(self.program.to_path_buf())?
            .args(dry_run_args(param_file))
            .working_dir(self.work_dir)
            .timeout(parameters_toml::maxquant_dry_run_timeout()?);
        let outcome =
            ToolRun::with_console_output("MaxQuant dry run", self.console_output.clone())
                .run(runner)?;
        Ok(outcome.lines)
    }
}

pub struct RunMaxQuant;

#[make_mro(stage_name = RUN_MAXQUANT, mem_gb = 16, threads = 8, volatile = strict)]
impl MartianMain for RunMaxQuant {
    type StageInputs = RunMaxQuantStageInputs;
    type StageOutputs = RunMaxQuantStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        let program = tool_program(
            args.maxquant_program.as_deref(),
            parameters_toml::maxquant_program,
        )?;

        // MaxQuant writes its combined folder next to the raw files.
        let work_dir: PathBuf = rover.make_path("work");
        fs::create_dir_all(&work_dir)?;
        let link = |src: &Path| -> Result<PathBuf> {
            let dest = work_dir.join(src.file_name().unwrap_or(src.as_os_str()));
            link_or_copy(src, &dest)?;
            Ok(dest)
        };
        let fasta_file = link(&args.fasta_file)?;
        let raw_files = args
            .raw_files
            .iter()
            .map(|raw| link(raw))
            .collect::<Result<Vec<_>>>()?;
        // MaxQuant updates files in the combined folder, so it is copied.
        if let Some(combined) = &args.combined {
            copy_dir(combined, &work_dir.join(COMBINED))?;
        }

        let work_param_file = work_dir.join("MaxQuant_Params.xml");
        let update = MqparUpdate {
            fasta_file: Some(fasta_file),
            raw_files: Some(raw_files),
            num_threads: Some(rover.get_threads()),
        };
        fs::write(
            &work_param_file,
            update_parameters(&fs::read_to_string(&args.param_file)?, &update)?,
        )?;

        let dry_run_console_output: TxtFile = rover.make_path("MaxQuant_DryRun_ConsoleOutput");
        let dry_runner = MaxQuantDryRun {
            program: &program,
            work_dir: &work_dir,
            console_output: dry_run_console_output.clone(),
        };
        let resolution = resolve_step_range(&work_param_file, &args.job.step_tool, &dry_runner)?;

        let param_file: XmlFile = rover.make_path("MaxQuant_Params");
        fs::copy(&work_param_file, &param_file)?;

        let runner = tool_runner(program)?
            .args(step_range_args(&work_param_file, resolution.range))
            .working_dir(&work_dir);
        let run = ToolRun::new("MaxQuant", &rover);
        run.run(runner)?;

        let combined = work_dir.join(COMBINED);
        ensure!(
            combined.is_dir(),
            "MaxQuant did not create {}",
            combined.display()
        );
        let results: ZipFile = rover.make_path(args.job.results_zip_stem(&args.job.step_tool));
        zip_directory(&combined, results.as_ref())?;

        Ok(RunMaxQuantStageOutputs {
            param_file,
            step_range: resolution.range.to_string(),
            results,
            console_output: run.console_output,
            dry_run_console_output: resolution.ran_dry_run.then_some(dry_run_console_output),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::maxq_resources::{
        StageMaxqResources, StageMaxqResourcesStageInputs, StageMaxqResourcesStageOutputs,
    };
    use crate::stages::test_support::{fake_tool, test_job, MAXQUANT_PARAMS};
    use dms_io::unzip;
    use maxquant::{needs_dry_run, read_dms_steps};

    const FAKE_MAXQUANT: &str = r#"
if [ "$2" = "--dryrun" ]; then
    printf 'id\tnumber of threads\tjob name\n'
    printf '0\t1\tConfiguring\n1\t2\tFeature detection\n2\t1\tPreparing searches\n3\t1\tWriting tables\n'
    exit 0
fi
mkdir -p combined/txt
echo "$2 $3" >> combined/txt/steps.txt
echo "MaxQuant finished"
"#;

    fn stage(
        dir: &Path,
        step_tool: &str,
        param_file: PathBuf,
        previous: Option<ZipFile>,
    ) -> Result<StageMaxqResourcesStageOutputs> {
        let run_dir = dir.join(format!("stage_{step_tool}"));
        fs::create_dir_all(&run_dir)?;
        let fasta = dir.join("H_sapiens.fasta");
        fs::write(&fasta, ">P1\nMKV\n")?;
        let raw = dir.join("Dataset_A.raw");
        fs::write(&raw, "raw")?;
        StageMaxqResources.test_run(
            &run_dir,
            StageMaxqResourcesStageInputs {
                job: test_job(step_tool),
                param_file,
                fasta_file: fasta,
                raw_files: vec![raw],
                previous_results: previous,
            },
        )
    }

    fn run(
        dir: &Path,
        step_tool: &str,
        staged: StageMaxqResourcesStageOutputs,
        program: &Path,
    ) -> Result<RunMaxQuantStageOutputs> {
        let run_dir = dir.join(format!("run_{step_tool}"));
        fs::create_dir_all(&run_dir)?;
        RunMaxQuant.test_run(
            &run_dir,
            RunMaxQuantStageInputs {
                job: test_job(step_tool),
                param_file: staged.param_file,
                fasta_file: staged.fasta_file,
                raw_files: staged.raw_files,
                combined: staged.combined,
                maxquant_program: Some(program.to_path_buf()),
            },
        )
    }

    #[test]
    fn test_consecutive_step_tools() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let program = fake_tool(dir.path(), "MaxQuantCmd", FAKE_MAXQUANT)?;
        let param_file = dir.path().join("MaxQuant_Params.xml");
        fs::write(&param_file, MAXQUANT_PARAMS)?;

        let staged = stage(dir.path(), "MaxqS1", param_file, None)?;
        let first = run(dir.path(), "MaxqS1", staged, &program)?;
        assert_eq!(first.step_range, "2-2");
        assert!(first.dry_run_console_output.is_some());
        let resolved = fs::read_to_string(&first.param_file)?;
        assert!(!needs_dry_run(&read_dms_steps(&resolved)?));

        // The next step tool starts from the resolved parameter file and the
        // previous results, and needs no dry run.
        let staged = stage(
            dir.path(),
            "MaxqS2",
            AsRef::<Path>::as_ref(&first.param_file).to_path_buf(),
            Some(first.results.clone()),
        )?;
        let second = run(dir.path(), "MaxqS2", staged, &program)?;
        assert_eq!(second.step_range, "3-inf");
        assert!(second.dry_run_console_output.is_none());

        let out = dir.path().join("unzipped");
        unzip(second.results.as_ref(), &out)?;
        assert_eq!(
            fs::read_to_string(out.join("txt/steps.txt"))?,
            "--partial-processing=2 --partial-processing-end=2\n--partial-processing=3 \n"
        );
        assert!(fs::read_to_string(&second.console_output)?.contains("MaxQuant finished"));
        Ok(())
    }

    #[test]
    fn test_failing_maxquant() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let program = fake_tool(
            dir.path(),
            "MaxQuantCmd",
            "echo 'Error: no license' >&2\nexit 2\n",
        )?;
        let param_file = dir.path().join("MaxQuant_Params.xml");
        fs::write(&param_file, MAXQUANT_PARAMS)?;
        let staged = stage(dir.path(), "MaxqPeak", param_file, None)?;
        let Err(err) = run(dir.path(), "MaxqPeak", staged, &program) else {
            panic!("a failing MaxQuant run was reported as a success");
        };
        assert!(format!("{err:#}").contains("no license"), "{err:#}");
        Ok(())
    }
}
