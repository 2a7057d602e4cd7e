//! Martian stage STAGE_APE_RESOURCES
//! Stage the Ape workflow and the results database it operates on.

use anyhow::Result;
use dms_io::copy_file_verified;
use dms_types::{Db3File, JobInfo, XmlFile};
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Deserialize, MartianStruct)]
pub struct StageApeResourcesStageInputs {
    pub job: JobInfo,
    pub workflow_file: PathBuf,
    /// SQLite results database produced by an earlier step.
    pub results_db: PathBuf,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct StageApeResourcesStageOutputs {
    pub workflow: XmlFile,
    pub results_db: Db3File,
}

pub struct StageApeResources;

#[make_mro(stage_name = STAGE_APE_RESOURCES, volatile = strict)]
impl MartianMain for StageApeResources {
    type StageInputs = StageApeResourcesStageInputs;
    type StageOutputs = StageApeResourcesStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        let workflow: XmlFile = rover.make_path("ApeWorkflow");
        copy_file_verified(&args.workflow_file, workflow.as_ref())?;
        let results_db: Db3File = rover.make_path("Results");
        copy_file_verified(&args.results_db, results_db.as_ref())?;
        Ok(StageApeResourcesStageOutputs {
            workflow,
            results_db,
        })
    }
}
