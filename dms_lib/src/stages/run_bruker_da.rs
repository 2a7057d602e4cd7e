//! Martian stage RUN_BRUKER_DA
//! Export spectra from a Bruker dataset by running a DataAnalysis script.

use crate::tool::{tool_program, tool_runner, ToolRun};
use anyhow::{ensure, Result};
use dms_io::zip_directory;
use dms_types::{JobInfo, TxtFile, ZipFile};
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Deserialize, MartianStruct)]
pub struct RunBrukerDaStageInputs {
    pub job: JobInfo,
    pub dataset_folder: PathBuf,
    pub export_script: PathBuf,
    /// Script host to run instead of the configured program.
    pub script_host: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct RunBrukerDaStageOutputs {
    pub export_dir: PathBuf,
    pub results: ZipFile,
    pub console_output: TxtFile,
}

pub struct RunBrukerDa;

#[make_mro(stage_name = RUN_BRUKER_DA, mem_gb = 4, volatile = strict)]
impl MartianMain for RunBrukerDa {
    type StageInputs = RunBrukerDaStageInputs;
    type StageOutputs = RunBrukerDaStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        let program = tool_program(
            args.script_host.as_deref(),
            parameters_toml::script_host_program,
        )?;

        let export_dir: PathBuf = rover.make_path("export");
        fs::create_dir_all(&export_dir)?;
        let runner = tool_runner(program)?
            .arg("//nologo")
            .arg(&args.export_script)
            .arg(&args.dataset_folder)
            .arg(&export_dir);
        let run = ToolRun::new("DataAnalysis", &rover);
        run.run(runner)?;

        ensure!(
            fs::read_dir(&export_dir)?.next().is_some(),
            "DataAnalysis did not export any files for {}",
            args.job.dataset
        );
        let results: ZipFile = rover.make_path(args.job.results_zip_stem("DA"));
        zip_directory(&export_dir, results.as_ref())?;

        Ok(RunBrukerDaStageOutputs {
            export_dir,
            results,
            console_output: run.console_output,
        })
    }
}
