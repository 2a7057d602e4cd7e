//! Martian stage STAGE_GLYQ_IQ_RESOURCES
//! Stage the dataset, the glycan target list and the GlyQ-IQ parameter files.

use crate::glyq_iq::TargetList;
use anyhow::{ensure, Result};
use dms_io::{stage_file, stage_path};
use dms_types::JobInfo;
use log::info;
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Deserialize, MartianStruct)]
pub struct StageGlyqIqResourcesStageInputs {
    pub job: JobInfo,
    /// Instrument file or folder of the dataset.
    pub dataset_file: PathBuf,
    pub targets_file: PathBuf,
    pub param_files: Vec<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct StageGlyqIqResourcesStageOutputs {
    pub dataset_file: PathBuf,
    pub targets_file: PathBuf,
    pub param_files: Vec<PathBuf>,
    pub target_count: usize,
}

pub struct StageGlyqIqResources;

#[make_mro(stage_name = STAGE_GLYQ_IQ_RESOURCES, mem_gb = 2, volatile = strict)]
impl MartianMain for StageGlyqIqResources {
    type StageInputs = StageGlyqIqResourcesStageInputs;
    type StageOutputs = StageGlyqIqResourcesStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        let targets = TargetList::read(&args.targets_file)?;
        ensure!(
            !targets.targets.is_empty(),
            "target file {} lists no targets",
            args.targets_file.display()
        );

        let dataset_dir: PathBuf = rover.make_path("dataset");
        let targets_dir: PathBuf = rover.make_path("targets");
        let params_dir: PathBuf = rover.make_path("parameters");
        for dir in [&dataset_dir, &targets_dir, &params_dir] {
            fs::create_dir_all(dir)?;
        }

        let dataset_file = stage_path(&args.dataset_file, &dataset_dir)?;
        let targets_file = stage_file(&args.targets_file, &targets_dir)?;
        let param_files = args
            .param_files
            .iter()
            .map(|param| stage_file(param, &params_dir))
            .collect::<Result<Vec<_>>>()?;
        info!(
            "staged {} targets and {} parameter files",
            targets.targets.len(),
            param_files.len()
        );

        Ok(StageGlyqIqResourcesStageOutputs {
            dataset_file,
            targets_file,
            param_files,
            target_count: targets.targets.len(),
        })
    }
}
