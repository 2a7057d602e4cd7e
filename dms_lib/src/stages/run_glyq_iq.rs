//! Martian stage RUN_GLYQ_IQ
//! Run GlyQ-IQ on one share of the glycan targets per core and merge the results.

use crate::glyq_iq::{core_count, merge_results, TargetList};
use crate::tool::{tool_program, tool_runner, ToolRun};
use anyhow::{ensure, Result};
use dms_io::zip_files;
use dms_types::{JobInfo, TxtFile, ZipFile};
use log::info;
use martian::prelude::*;
use martian::{Resource, StageDef};
use martian_derive::{make_mro, MartianStruct};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Deserialize, MartianStruct)]
pub struct RunGlyqIqStageInputs {
    pub job: JobInfo,
    pub dataset_file: PathBuf,
    pub targets_file: PathBuf,
    pub param_files: Vec<PathBuf>,
    /// Cores to spread the targets over, capped by the configured maximum.
    pub cores: Option<usize>,
    pub glyq_iq_program: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct RunGlyqIqStageOutputs {
    pub results_file: TxtFile,
    pub result_rows: usize,
    pub results: ZipFile,
    pub console_outputs: Vec<TxtFile>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct RunGlyqIqChunkInputs {
    /// Core number, starting at 1.
    pub core: usize,
    pub targets: TxtFile,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct RunGlyqIqChunkOutputs {
    pub results: TxtFile,
    pub console_output: TxtFile,
}

pub struct RunGlyqIq;

#[make_mro(stage_name = RUN_GLYQ_IQ, volatile = strict)]
impl MartianStage for RunGlyqIq {
    type StageInputs = RunGlyqIqStageInputs;
    type StageOutputs = RunGlyqIqStageOutputs;
    type ChunkInputs = RunGlyqIqChunkInputs;
    type ChunkOutputs = RunGlyqIqChunkOutputs;

    fn split(
        &self,
        args: Self::StageInputs,
        rover: MartianRover,
    ) -> Result<StageDef<Self::ChunkInputs>> {
        let targets = TargetList::read(&args.targets_file)?;
        ensure!(
            !targets.targets.is_empty(),
            "target file {} lists no targets",
            args.targets_file.display()
        );
        let max_cores = parameters_toml::glyq_iq_max_cores()?;
        let cores = core_count(
            targets.targets.len(),
            args.cores.unwrap_or(max_cores),
            max_cores,
        );
        info!(
            "splitting {} targets across {cores} cores",
            targets.targets.len()
        );

        let stage_def = targets
            .split(cores)
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let core = i + 1;
                let chunk_targets: TxtFile = rover.make_path(format!("targets_core{core}"));
                targets.write_part(part, chunk_targets.as_ref())?;
                Ok((
                    RunGlyqIqChunkInputs {
                        core,
                        targets: chunk_targets,
                    },
                    Resource::with_mem_gb(4).threads(1),
                ))
            })
            .collect::<Result<StageDef<_>>>()?;
        Ok(stage_def.join_resource(Resource::with_mem_gb(2)))
    }

    fn main(
        &self,
        args: Self::StageInputs,
        chunk_args: Self::ChunkInputs,
        rover: MartianRover,
    ) -> Result<Self::ChunkOutputs> {
        let program = tool_program(
            args.glyq_iq_program.as_deref(),
            parameters_toml::glyq_iq_program,
        )?;
        let results_dir: PathBuf = rover.make_path("results");
        fs::create_dir_all(&results_dir)?;

        let targets: &Path = chunk_args.targets.as_ref();
        let runner = tool_runner(program)?
            .arg(&args.dataset_file)
            .arg(targets)
            .arg(&results_dir)
            .args(&args.param_files);
        let run = ToolRun::new("GlyQ-IQ", &rover);
        run.run(runner)?;

        let results = TxtFile::new(&results_dir, args.job.dataset_file_stem("_iqResults"));
        let results_path: &Path = results.as_ref();
        ensure!(
            results_path.is_file(),
            "GlyQ-IQ on core {} did not create {}",
            chunk_args.core,
            results_path.display()
        );
        Ok(RunGlyqIqChunkOutputs {
            results,
            console_output: run.console_output,
        })
    }

    fn join(
        &self,
        args: Self::StageInputs,
        _chunk_defs: Vec<Self::ChunkInputs>,
        chunk_outs: Vec<Self::ChunkOutputs>,
        rover: MartianRover,
    ) -> Result<Self::StageOutputs> {
        let parts: Vec<&Path> = chunk_outs
            .iter()
            .map(|out| AsRef::<Path>::as_ref(&out.results))
            .collect();
        let results_file: TxtFile = rover.make_path(args.job.dataset_file_stem("_iqResults"));
        let result_rows = merge_results(&parts, results_file.as_ref())?;
        info!(
            "merged {result_rows} GlyQ-IQ results from {} cores",
            parts.len()
        );

        let results: ZipFile = rover.make_path(args.job.results_zip_stem("iqResults"));
        zip_files(&[&results_file], results.as_ref())?;

        Ok(RunGlyqIqStageOutputs {
            results_file,
            result_rows,
            results,
            console_outputs: chunk_outs.into_iter().map(|out| out.console_output).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::glyq_iq_resources::{
        StageGlyqIqResources, StageGlyqIqResourcesStageInputs,
    };
    use crate::stages::test_support::{fake_tool, test_job};
    use pretty_assertions::assert_eq;

    const FAKE_GLYQ_IQ: &str = r#"
name=$(basename "$1")
name=${name%.*}
awk -v OFS='\t' 'NR == 1 { print $0, "Score"; next } { print $0, "0.9" }' "$2" > "$3/${name}_iqResults.txt"
echo "processed targets from $(basename "$2") with $4"
"#;

    #[test]
    fn test_split_run_merge() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("QC_Mam_19_01.raw");
        fs::write(&dataset, "raw")?;
        let targets = dir.path().join("Targets.txt");
        fs::write(&targets, "ID\tCode\n1\tHexNAc\n2\tHex\n3\tFuc\n")?;
        let params = dir.path().join("GlyQIQ_Params.txt");
        fs::write(&params, "FitScore=0.8\n")?;
        let program = fake_tool(dir.path(), "IQGlyQ_Console", FAKE_GLYQ_IQ)?;

        let stage_dir = dir.path().join("stage");
        fs::create_dir_all(&stage_dir)?;
        let staged = StageGlyqIqResources.test_run(
            &stage_dir,
            StageGlyqIqResourcesStageInputs {
                job: test_job("GlyQ-IQ"),
                dataset_file: dataset,
                targets_file: targets,
                param_files: vec![params],
            },
        )?;
        assert_eq!(staged.target_count, 3);

        let run_dir = dir.path().join("run");
        fs::create_dir_all(&run_dir)?;
        let outs = RunGlyqIq.test_run(
            &run_dir,
            RunGlyqIqStageInputs {
                job: test_job("GlyQ-IQ"),
                dataset_file: staged.dataset_file,
                targets_file: staged.targets_file,
                param_files: staged.param_files,
                cores: Some(2),
                glyq_iq_program: Some(program),
            },
        )?;

        assert_eq!(outs.result_rows, 3);
        assert_eq!(outs.console_outputs.len(), 2);
        assert_eq!(
            fs::read_to_string(&outs.results_file)?,
            "ID\tCode\tScore\n1\tHexNAc\t0.9\n2\tHex\t0.9\n3\tFuc\t0.9\n"
        );
        let console = fs::read_to_string(&outs.console_outputs[1])?;
        assert!(console.starts_with("processed targets from targets_core2.txt"));
        Ok(())
    }

    #[test]
    fn test_no_targets() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let targets = dir.path().join("Targets.txt");
        fs::write(&targets, "ID\tCode\n\n")?;

        let run_dir = dir.path().join("run");
        fs::create_dir_all(&run_dir)?;
        let result = RunGlyqIq.test_run(
            &run_dir,
            RunGlyqIqStageInputs {
                job: test_job("GlyQ-IQ"),
                dataset_file: dir.path().join("QC_Mam_19_01.raw"),
                targets_file: targets,
                param_files: vec![],
                cores: Some(2),
                glyq_iq_program: None,
            },
        );
        let Err(err) = result else {
            panic!("split accepted a target file without targets");
        };
        assert!(format!("{err:#}").contains("lists no targets"), "{err:#}");
        Ok(())
    }
}
