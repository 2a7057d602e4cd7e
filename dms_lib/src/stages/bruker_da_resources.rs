//! Martian stage STAGE_BRUKER_DA_RESOURCES
//! Stage a Bruker `.d` dataset folder and the DataAnalysis export script.

use anyhow::{ensure, Result};
use dms_io::{copy_dir, stage_file};
use dms_types::JobInfo;
use log::info;
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Deserialize, MartianStruct)]
pub struct StageBrukerDaResourcesStageInputs {
    pub job: JobInfo,
    pub dataset_folder: PathBuf,
    /// Script run by the script host to drive DataAnalysis.
    pub export_script: PathBuf,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct StageBrukerDaResourcesStageOutputs {
    pub dataset_folder: PathBuf,
    pub export_script: PathBuf,
}

pub struct StageBrukerDaResources;

#[make_mro(stage_name = STAGE_BRUKER_DA_RESOURCES, mem_gb = 2, volatile = strict)]
impl MartianMain for StageBrukerDaResources {
    type StageInputs = StageBrukerDaResourcesStageInputs;
    type StageOutputs = StageBrukerDaResourcesStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        ensure!(
            args.dataset_folder.is_dir(),
            "dataset folder {} does not exist",
            args.dataset_folder.display()
        );
        let dataset_folder: PathBuf = rover.make_path(format!("{}.d", args.job.dataset));
        let files = copy_dir(&args.dataset_folder, &dataset_folder)?;
        info!("staged {files} files of {}", args.dataset_folder.display());

        // The script host picks the script language from the file extension.
        let script_dir: PathBuf = rover.make_path("script");
        fs::create_dir_all(&script_dir)?;
        let export_script = stage_file(&args.export_script, &script_dir)?;

        Ok(StageBrukerDaResourcesStageOutputs {
            dataset_folder,
            export_script,
        })
    }
}
