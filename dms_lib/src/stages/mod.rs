//! dms_lib::stages

mod ape_resources;
mod bruker_da_resources;
mod glyq_iq_resources;
mod maxq_resources;
mod omssa_resources;
mod run_ape;
mod run_bruker_da;
mod run_glyq_iq;
mod run_maxquant;
mod run_omssa;

pub use ape_resources::StageApeResources;
pub use bruker_da_resources::StageBrukerDaResources;
pub use glyq_iq_resources::StageGlyqIqResources;
pub use maxq_resources::StageMaxqResources;
pub use omssa_resources::StageOmssaResources;
pub use run_ape::RunApe;
pub use run_bruker_da::RunBrukerDa;
pub use run_glyq_iq::RunGlyqIq;
pub use run_maxquant::RunMaxQuant;
pub use run_omssa::RunOmssa;

#[cfg(test)]
pub(crate) mod test_support {
    use anyhow::Result;
    use dms_types::JobInfo;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    pub const MAXQUANT_PARAMS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<MaxQuantParams>
   <fastaFiles>
      <FastaFileInfo>
         <fastaFilePath>C:\DMS_Temp_Org\old.fasta</fastaFilePath>
      </FastaFileInfo>
   </fastaFiles>
   <filePaths>
      <string>C:\DMS_WorkDir\Dataset_A.raw</string>
   </filePaths>
   <experiments>
      <string>Exp1</string>
   </experiments>
   <numThreads>1</numThreads>
   <dmsSteps>
      <step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="auto" />
      <step id="2" tool="MaxqS1" startStepName="Preparing searches" startStepID="auto" />
      <step id="3" tool="MaxqS2" startStepName="Writing tables" startStepID="auto" />
   </dmsSteps>
</MaxQuantParams>
"#;

    pub fn test_job(step_tool: &str) -> JobInfo {
        JobInfo {
            job: 2045417,
            dataset: "QC_Mam_19_01".to_string(),
            step_tool: step_tool.to_string(),
        }
    }

    /// Write an executable shell script standing in for an external tool.
    pub fn fake_tool(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }
}
