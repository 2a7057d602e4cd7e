//! Martian stage RUN_OMSSA
//! Search the MGF spectra against the indexed FASTA database with OMSSA.

use crate::tool::{tool_program, tool_runner, ToolRun};
use anyhow::{ensure, Result};
use dms_io::zip_files;
use dms_types::{CsvFile, JobInfo, MgfFile, OmxFile, TxtFile, XmlFile, ZipFile};
use martian::prelude::*;
use martian_derive::{make_mro, MartianStruct};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Deserialize, MartianStruct)]
pub struct RunOmssaStageInputs {
    pub job: JobInfo,
    pub fasta_db: PathBuf,
    pub mgf_file: MgfFile,
    pub param_file: XmlFile,
    pub omssa_program: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize, MartianStruct)]
pub struct RunOmssaStageOutputs {
    pub search_results: CsvFile,
    pub omx_file: OmxFile,
    pub results: ZipFile,
    pub console_output: TxtFile,
}

pub struct RunOmssa;

#[make_mro(stage_name = RUN_OMSSA, mem_gb = 4, threads = 4, volatile = strict)]
impl MartianMain for RunOmssa {
    type StageInputs = RunOmssaStageInputs;
    type StageOutputs = RunOmssaStageOutputs;

    fn main(&self, args: Self::StageInputs, rover: MartianRover) -> Result<Self::StageOutputs> {
        let program = tool_program(args.omssa_program.as_deref(), parameters_toml::omssa_program)?;

        let search_results: CsvFile = rover.make_path(args.job.dataset_file_stem("_om"));
        let omx_file: OmxFile = rover.make_path(args.job.dataset_file_stem("_om"));
        let param_file: &Path = args.param_file.as_ref();
        let mgf_file: &Path = args.mgf_file.as_ref();
        let csv: &Path = search_results.as_ref();
        let omx: &Path = omx_file.as_ref();
        let runner = tool_runner(program)?
            .arg("-pm")
            .arg(param_file)
            .arg("-d")
            .arg(&args.fasta_db)
            .arg("-fm")
            .arg(mgf_file)
            .arg("-oc")
            .arg(csv)
            .arg("-ox")
            .arg(omx)
            .arg("-nt")
            .arg(rover.get_threads().to_string());
        let run = ToolRun::new("OMSSA", &rover);
        run.run(runner)?;

        ensure!(omx.is_file(), "OMSSA did not create {}", omx.display());
        let results: ZipFile = rover.make_path(args.job.results_zip_stem("omx"));
        zip_files(&[omx], results.as_ref())?;

        Ok(RunOmssaStageOutputs {
            search_results,
            omx_file,
            results,
            console_output: run.console_output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::omssa_resources::tests::stage_omssa;
    use crate::stages::test_support::{fake_tool, test_job};
    use dms_io::unzip;
    use std::fs;

    const FAKE_OMSSA: &str = r#"
while [ $# -gt 0 ]; do
    case "$1" in
        -oc) csv="$2" ;;
        -ox) omx="$2" ;;
        -fm) mgf="$2" ;;
    esac
    shift
done
grep -c "BEGIN IONS" "$mgf"
echo "Spectrum number, Filename/id, Peptide" > "$csv"
echo "<MSResponse/>" > "$omx"
"#;

    #[test]
    fn test_search() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let staged = stage_omssa(dir.path())?;
        let omssa = fake_tool(dir.path(), "omssacl", FAKE_OMSSA)?;

        let run_dir = dir.path().join("run");
        fs::create_dir_all(&run_dir)?;
        let outs = RunOmssa.test_run(
            &run_dir,
            RunOmssaStageInputs {
                job: test_job("OMSSA"),
                fasta_db: staged.fasta_db,
                mgf_file: staged.mgf_file,
                param_file: staged.param_file,
                omssa_program: Some(omssa),
            },
        )?;

        assert_eq!(fs::read_to_string(&outs.console_output)?, "1\n");
        assert!(fs::read_to_string(&outs.search_results)?.starts_with("Spectrum number"));
        let out = dir.path().join("unzipped");
        let extracted = unzip(outs.results.as_ref(), &out)?;
        assert_eq!(extracted, vec![out.join("QC_Mam_19_01_om.omx")]);
        Ok(())
    }
}
