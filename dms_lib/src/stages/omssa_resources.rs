//! Martian stage STAGE_OMSSA_RESOURCES
//! Index the FASTA database with formatdb and convert the dataset's DTA spectra to MGF.

use crate::dta::convert_dta_to_mgf;
use crate::tool::{tool_program, tool_runner, ToolRun};
use anyhow::{ensure, Result};
use dms_io::{copy_file_verified, stage_file};
use dms_types::{JobInfo, MgfFile, XmlFile};
use log::info;
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions of the protein index files written by `formatdb -p T`.
const PROTEIN_INDEX_EXTENSIONS: [&str; 3] = ["phr", "pin", "psq"];

#[derive(Clone, Deserialize, MartianStruct)]
pub struct StageOmssaResourcesStageInputs {
    pub job: JobInfo,
    pub fasta_file: PathBuf,
    /// Concatenated DTA file, `<dataset>_dta.txt`.
    pub dta_file: PathBuf,
    pub param_file: PathBuf,
    pub formatdb_program: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct StageOmssaResourcesStageOutputs {
    /// Indexed FASTA file; OMSSA finds the index files next to it.
    pub fasta_db: PathBuf,
    pub mgf_file: MgfFile,
    pub param_file: XmlFile,
    pub spectra: usize,
}

pub struct StageOmssaResources;

fn index_file(fasta: &Path, extension: &str) -> PathBuf {
    let mut name = fasta.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[make_mro(stage_name = STAGE_OMSSA_RESOURCES, mem_gb = 4, volatile = strict)]
impl MartianMain for StageOmssaResources {
    type StageInputs = StageOmssaResourcesStageInputs;
    type StageOutputs = StageOmssaResourcesStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        let program = tool_program(
            args.formatdb_program.as_deref(),
            parameters_toml::formatdb_program,
        )?;

        let db_dir: PathBuf = rover.make_path("fasta");
        fs::create_dir_all(&db_dir)?;
        let fasta_db = stage_file(&args.fasta_file, &db_dir)?;
        let runner = tool_runner(program)?
            .arg("-i")
            .arg(&fasta_db)
            .args(["-p", "T", "-o", "T"])
            .working_dir(&db_dir);
        ToolRun::new("formatdb", &rover).run(runner)?;
        for extension in PROTEIN_INDEX_EXTENSIONS {
            let index = index_file(&fasta_db, extension);
            ensure!(index.is_file(), "formatdb did not create {}", index.display());
        }

        let mgf_file: MgfFile = rover.make_path(&args.job.dataset);
        let spectra = convert_dta_to_mgf(&args.dta_file, mgf_file.as_ref())?;
        ensure!(
            spectra > 0,
            "{} does not contain any spectra",
            args.dta_file.display()
        );
        info!("converted {spectra} spectra to MGF");

        let param_file: XmlFile = rover.make_path("OMSSA_Params");
        copy_file_verified(&args.param_file, param_file.as_ref())?;

        Ok(StageOmssaResourcesStageOutputs {
            fasta_db,
            mgf_file,
            param_file,
            spectra,
        })
    }
}
