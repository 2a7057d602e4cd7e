//! dms_types
//!
//! Job description, file types and result naming shared by the DMS step tool stages.
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

use martian_derive::{martian_filetype, MartianStruct, MartianType};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

// File Types

martian_filetype! { ZipFile, "zip" }
martian_filetype! { XmlFile, "xml" }
martian_filetype! { TxtFile, "txt" }
martian_filetype! { MgfFile, "mgf" }
martian_filetype!(Db3File, "db3");
martian_filetype!(OmxFile, "omx");
martian_filetype!(CsvFile, "csv");

// End File Types

/// The DMS job and step a stage is working on.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, MartianStruct)]
pub struct JobInfo {
    pub job: u32,
    pub dataset: String,
    /// Step tool name, e.g. `MaxqS1`.
    pub step_tool: String,
}

impl JobInfo {
    /// File stem of the zip holding this step's results: `<dataset>_<suffix>`.
    pub fn results_zip_stem(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.dataset)
    }

    /// File stem of a per-dataset output: `<dataset><suffix>`.
    pub fn dataset_file_stem(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.dataset)
    }
}

/// File stem of the console output captured for a tool: `<tool>_ConsoleOutput`.
pub fn console_output_stem(tool: &str) -> String {
    format!("{tool}_ConsoleOutput")
}

/// Operations understood by the Ape command line program.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Debug,
    Serialize,
    Deserialize,
    MartianType,
    Display,
    EnumString,
    EnumIter,
)]
pub enum ApeOperation {
    /// Run the workflow against the results database.
    RunWorkflow,
    GetImprovResults,
    GetQRollupResults,
    GetViperResults,
}

impl ApeOperation {
    /// Suffix of the results zip written by this operation.
    pub fn results_suffix(self) -> &'static str {
        match self {
            ApeOperation::RunWorkflow => "Ape",
            ApeOperation::GetImprovResults => "Improv",
            ApeOperation::GetQRollupResults => "QRollup",
            ApeOperation::GetViperResults => "Viper",
        }
    }
}
