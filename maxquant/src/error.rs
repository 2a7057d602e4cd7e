use quick_xml::events::attributes::AttrError;
use std::path::PathBuf;

/// Failures while reading, resolving or rewriting a MaxQuant parameter file.
#[derive(Debug, thiserror::Error)]
pub enum MaxQuantError {
    #[error("malformed parameter file XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute in parameter file: {0}")]
    XmlAttribute(#[from] AttrError),

    #[error("parameter file is not valid UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),

    #[error("unable to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parameter file has no dmsSteps section")]
    MissingDmsSteps,

    #[error("the dmsSteps section of the parameter file does not define any steps")]
    NoSteps,

    #[error("dmsSteps step element is missing the {attribute} attribute")]
    MissingAttribute { attribute: &'static str },

    #[error("dmsSteps step {attribute} must be a non-negative integer, not \"{value}\"")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
    },

    #[error("dmsSteps step id {0} appears more than once")]
    DuplicateStepId(u32),

    #[error("dmsSteps step tool {0} appears more than once")]
    DuplicateTool(String),

    #[error("the MaxQuant dry run did not report any processing steps")]
    EmptyDryRun,

    #[error(
        "start step \"{name}\" for dmsSteps step {id} was not found in the MaxQuant dry run; \
         available steps: {available}"
    )]
    StepNameNotFound {
        id: u32,
        name: String,
        available: String,
    },

    #[error("step tool {0} is not defined in the dmsSteps section of the parameter file")]
    ToolNotDefined(String),

    #[error(
        "step tool {tool} starts at MaxQuant step {start} but the following dmsSteps step \
         starts at {next_start}; start steps must increase"
    )]
    NonIncreasingSteps {
        tool: String,
        start: u32,
        next_start: u32,
    },

    #[error("dmsSteps step {0} has startStepID=\"auto\" but no resolved start step")]
    UnresolvedStep(u32),
}

impl MaxQuantError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MaxQuantError::Io {
            path: path.into(),
            source,
        }
    }
}
