//! Martian stage STAGE_MAXQ_RESOURCES
//! Stage the parameter file, FASTA and raw files of a MaxQuant step tool.

use anyhow::{ensure, Context, Result};
use dms_io::{stage_file, stage_path, unzip};
use dms_types::{JobInfo, XmlFile, ZipFile};
use log::info;
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use maxquant::{read_dms_steps, update_parameters, MqparUpdate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Deserialize, MartianStruct)]
pub struct StageMaxqResourcesStageInputs {
    pub job: JobInfo,
    /// MaxQuant parameter file. Later step tools receive the copy resolved by
    /// the previous step.
    pub param_file: PathBuf,
    pub fasta_file: PathBuf,
    pub raw_files: Vec<PathBuf>,
    /// Results zip of the previous MaxQuant step tool.
    pub previous_results: Option<ZipFile>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct StageMaxqResourcesStageOutputs {
    pub param_file: XmlFile,
    pub fasta_file: PathBuf,
    pub raw_files: Vec<PathBuf>,
    /// The previous step's `combined` folder.
    pub combined: Option<PathBuf>,
}

pub struct StageMaxqResources;

#[make_mro(stage_name = STAGE_MAXQ_RESOURCES, mem_gb = 2, volatile = strict)]
impl MartianMain for StageMaxqResources {
    type StageInputs = StageMaxqResourcesStageInputs;
    type StageOutputs = StageMaxqResourcesStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        ensure!(
            !args.raw_files.is_empty(),
            "job {} has no raw files to process",
            args.job.job
        );

        let xml = fs::read_to_string(&args.param_file)
            .with_context(|| args.param_file.display().to_string())?;
        let steps = read_dms_steps(&xml)
            .with_context(|| args.param_file.display().to_string())?;
        ensure!(
            steps
                .iter()
                .any(|step| step.tool.eq_ignore_ascii_case(&args.job.step_tool)),
            "step tool {} is not defined in the dmsSteps section of {}",
            args.job.step_tool,
            args.param_file.display()
        );

        let fasta_dir: PathBuf = rover.make_path("fasta");
        fs::create_dir_all(&fasta_dir)?;
        let fasta_file = stage_file(&args.fasta_file, &fasta_dir)?;

        let raw_dir: PathBuf = rover.make_path("raw");
        fs::create_dir_all(&raw_dir)?;
        let raw_files = args
            .raw_files
            .iter()
            .map(|raw| stage_path(raw, &raw_dir))
            .collect::<Result<Vec<_>>>()?;
        info!("staged {} raw files for job {}", raw_files.len(), args.job.job);

        let param_file: XmlFile = rover.make_path("MaxQuant_Params");
        let update = MqparUpdate {
            fasta_file: Some(fasta_file.clone()),
            raw_files: Some(raw_files.clone()),
            num_threads: None,
        };
        fs::write(&param_file, update_parameters(&xml, &update)?)?;

        let combined = match &args.previous_results {
            Some(zip) => {
                let dir: PathBuf = rover.make_path("combined");
                fs::create_dir_all(&dir)?;
                unzip(zip.as_ref(), &dir)?;
                Some(dir)
            }
            None => None,
        };

        Ok(StageMaxqResourcesStageOutputs {
            param_file,
            fasta_file,
            raw_files,
            combined,
        })
    }
}
