//! Reading the dmsSteps section of a MaxQuant parameter file.
//!
//! ```xml
//! <dmsSteps>
//!   <step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="auto" />
//!   <step id="2" tool="MaxqS1" startStepName="Preparing searches" startStepID="auto" />
//! </dmsSteps>
//! ```

use crate::error::MaxQuantError;
use itertools::Itertools;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub(crate) const DMS_STEPS: &[u8] = b"dmsSteps";
pub(crate) const STEP: &[u8] = b"step";
pub(crate) const ID_ATTR: &str = "id";
pub(crate) const TOOL_ATTR: &str = "tool";
pub(crate) const START_STEP_NAME_ATTR: &str = "startStepName";
pub(crate) const START_STEP_ID_ATTR: &str = "startStepID";

const AUTO: &str = "auto";

/// The MaxQuant step number a DMS step starts at, either known or to be
/// discovered from a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStepId {
    Auto,
    Fixed(u32),
}

impl StartStepId {
    pub fn is_auto(self) -> bool {
        self == StartStepId::Auto
    }
}

impl FromStr for StartStepId {
    type Err = MaxQuantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(AUTO) {
            Ok(StartStepId::Auto)
        } else {
            parse_number(START_STEP_ID_ATTR, s).map(StartStepId::Fixed)
        }
    }
}

impl fmt::Display for StartStepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartStepId::Auto => f.write_str(AUTO),
            StartStepId::Fixed(n) => write!(f, "{n}"),
        }
    }
}

/// One `step` element of the dmsSteps section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmsStep {
    pub id: u32,
    /// Name of the DMS step tool, e.g. MaxqPeak or MaxqS1.
    pub tool: String,
    /// MaxQuant job name the step starts at.
    pub start_step_name: String,
    pub start_step_id: StartStepId,
}

pub(crate) fn parse_number(attribute: &'static str, value: &str) -> Result<u32, MaxQuantError> {
    value
        .trim()
        .parse()
        .map_err(|_| MaxQuantError::InvalidNumber {
            attribute,
            value: value.to_string(),
        })
}

/// Return the unescaped value of an attribute, if present.
pub(crate) fn attribute_value(
    element: &BytesStart<'_>,
    name: &str,
) -> Result<Option<String>, MaxQuantError> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required_attribute(
    element: &BytesStart<'_>,
    attribute: &'static str,
) -> Result<String, MaxQuantError> {
    attribute_value(element, attribute)?.ok_or(MaxQuantError::MissingAttribute { attribute })
}

fn parse_step(element: &BytesStart<'_>) -> Result<DmsStep, MaxQuantError> {
    Ok(DmsStep {
        id: parse_number(ID_ATTR, &required_attribute(element, ID_ATTR)?)?,
        tool: required_attribute(element, TOOL_ATTR)?.trim().to_string(),
        start_step_name: required_attribute(element, START_STEP_NAME_ATTR)?
            .trim()
            .to_string(),
        start_step_id: required_attribute(element, START_STEP_ID_ATTR)?.parse()?,
    })
}

/// Parse the dmsSteps section of a parameter file, sorted by step id.
pub fn read_dms_steps(xml: &str) -> Result<Vec<DmsStep>, MaxQuantError> {
    let mut reader = Reader::from_str(xml);
    let mut found_section = false;
    // Depth relative to the dmsSteps element; zero when outside of it.
    let mut depth = 0usize;
    let mut steps = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth > 0 {
                    if depth == 1 && e.name().as_ref() == STEP {
                        steps.push(parse_step(&e)?);
                    }
                    depth += 1;
                } else if e.name().as_ref() == DMS_STEPS {
                    found_section = true;
                    depth = 1;
                }
            }
            Event::Empty(e) => {
                if depth == 1 && e.name().as_ref() == STEP {
                    steps.push(parse_step(&e)?);
                } else if depth == 0 && e.name().as_ref() == DMS_STEPS {
                    found_section = true;
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found_section {
        return Err(MaxQuantError::MissingDmsSteps);
    }
    if steps.is_empty() {
        return Err(MaxQuantError::NoSteps);
    }

    let mut ids = HashSet::new();
    let mut tools = HashSet::new();
    for step in &steps {
        if !ids.insert(step.id) {
            return Err(MaxQuantError::DuplicateStepId(step.id));
        }
        if !tools.insert(step.tool.to_ascii_lowercase()) {
            return Err(MaxQuantError::DuplicateTool(step.tool.clone()));
        }
    }

    Ok(steps.into_iter().sorted_by_key(|step| step.id).collect())
}

/// Read and parse the dmsSteps section of a parameter file on disk.
pub fn read_dms_steps_file(path: &Path) -> Result<Vec<DmsStep>, MaxQuantError> {
    let xml = std::fs::read_to_string(path).map_err(|e| MaxQuantError::io(path, e))?;
    read_dms_steps(&xml)
}

/// True if any step still needs its start step discovered by a dry run.
pub fn needs_dry_run(steps: &[DmsStep]) -> bool {
    steps.iter().any(|step| step.start_step_id.is_auto())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const PARAMS: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <MaxQuantParams>
           <numThreads>4</numThreads>
           <dmsSteps>
              <step id="2" tool="MaxqS1" startStepName="Preparing searches" startStepID="auto" />
              <step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="0" />
              <step id="3" tool="MaxqS2" startStepName="Calculating peak properties" startStepID="AUTO"></step>
           </dmsSteps>
        </MaxQuantParams>
    "#};

    fn replace_steps(steps: &str) -> String {
        format!("<MaxQuantParams><dmsSteps>{steps}</dmsSteps></MaxQuantParams>")
    }

    #[test]
    fn test_read_dms_steps_sorted() {
        let steps = read_dms_steps(PARAMS).unwrap();
        assert_eq!(
            steps,
            vec![
                DmsStep {
                    id: 1,
                    tool: "MaxqPeak".to_string(),
                    start_step_name: "Configuring".to_string(),
                    start_step_id: StartStepId::Fixed(0),
                },
                DmsStep {
                    id: 2,
                    tool: "MaxqS1".to_string(),
                    start_step_name: "Preparing searches".to_string(),
                    start_step_id: StartStepId::Auto,
                },
                DmsStep {
                    id: 3,
                    tool: "MaxqS2".to_string(),
                    start_step_name: "Calculating peak properties".to_string(),
                    start_step_id: StartStepId::Auto,
                },
            ]
        );
        assert!(needs_dry_run(&steps));
    }

    #[test]
    fn test_fixed_steps_need_no_dry_run() {
        let xml = replace_steps(
            r#"<step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="0"/>
               <step id="2" tool="MaxqS1" startStepName="Preparing searches" startStepID="14"/>"#,
        );
        assert!(!needs_dry_run(&read_dms_steps(&xml).unwrap()));
    }

    #[test]
    fn test_missing_section() {
        let err = read_dms_steps("<MaxQuantParams><numThreads>1</numThreads></MaxQuantParams>")
            .unwrap_err();
        assert!(matches!(err, MaxQuantError::MissingDmsSteps));
        assert!(matches!(
            read_dms_steps("<MaxQuantParams><dmsSteps/></MaxQuantParams>").unwrap_err(),
            MaxQuantError::NoSteps
        ));
    }

    #[test]
    fn test_invalid_steps() {
        let err = read_dms_steps(&replace_steps(
            r#"<step id="1" tool="MaxqPeak" startStepID="auto"/>"#,
        ))
        .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"dmsSteps step element is missing the startStepName attribute");

        let err = read_dms_steps(&replace_steps(
            r#"<step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="first"/>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, MaxQuantError::InvalidNumber { attribute: "startStepID", .. }));

        let err = read_dms_steps(&replace_steps(
            r#"<step id="1" tool="MaxqPeak" startStepName="A" startStepID="auto"/>
               <step id="1" tool="MaxqS1" startStepName="B" startStepID="auto"/>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, MaxQuantError::DuplicateStepId(1)));

        let err = read_dms_steps(&replace_steps(
            r#"<step id="1" tool="MaxqPeak" startStepName="A" startStepID="auto"/>
               <step id="2" tool="maxqpeak" startStepName="B" startStepID="auto"/>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, MaxQuantError::DuplicateTool(_)));
    }

    #[test]
    fn test_nested_step_elements_ignored() {
        let xml = replace_steps(
            r#"<step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="auto">
                 <step id="9" tool="Inner" startStepName="x" startStepID="auto"/>
               </step>"#,
        );
        let steps = read_dms_steps(&xml).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tool, "MaxqPeak");
    }

    #[test]
    fn test_start_step_id_display() {
        assert_eq!(StartStepId::Auto.to_string(), "auto");
        assert_eq!(StartStepId::Fixed(12).to_string(), "12");
        assert_eq!(" 7 ".parse::<StartStepId>().unwrap(), StartStepId::Fixed(7));
    }
}
