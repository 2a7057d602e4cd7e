//! Martian stage RUN_APE
//! Run one Ape operation against a copy of the results database.

use crate::tool::{tool_program, tool_runner, ToolRun};
use anyhow::Result;
use dms_io::{copy_file_verified, zip_files};
use dms_types::{ApeOperation, Db3File, JobInfo, TxtFile, XmlFile, ZipFile};
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Deserialize, MartianStruct)]
pub struct RunApeStageInputs {
    pub job: JobInfo,
    pub operation: ApeOperation,
    pub workflow: XmlFile,
    pub results_db: Db3File,
    pub ape_program: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct RunApeStageOutputs {
    /// The results database after the operation.
    pub results_db: Db3File,
    pub results: ZipFile,
    pub console_output: TxtFile,
}

pub struct RunApe;

#[make_mro(stage_name = RUN_APE, mem_gb = 4, volatile = strict)]
impl MartianMain for RunApe {
    type StageInputs = RunApeStageInputs;
    type StageOutputs = RunApeStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        let program = tool_program(args.ape_program.as_deref(), parameters_toml::ape_program)?;

        // Ape updates the database in place.
        let results_db: Db3File = rover.make_path("Results");
        copy_file_verified(args.results_db.as_ref(), results_db.as_ref())?;

        let workflow: &Path = args.workflow.as_ref();
        let db: &Path = results_db.as_ref();
        let runner = tool_runner(program)?
            .arg(args.operation.to_string())
            .arg(workflow)
            .arg(db);
        let run = ToolRun::new("Ape", &rover);
        run.run(runner)?;

        let results: ZipFile =
            rover.make_path(args.job.results_zip_stem(args.operation.results_suffix()));
        zip_files(&[db], results.as_ref())?;

        Ok(RunApeStageOutputs {
            results_db,
            results,
            console_output: run.console_output,
        })
    }
}
