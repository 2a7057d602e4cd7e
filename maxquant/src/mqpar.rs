//! Rewriting MaxQuant parameter files.
//!
//! All edits stream the document through a quick-xml reader/writer pair, so
//! elements that are not edited are written back byte for byte.

use crate::dms_steps::{
    attribute_value, parse_number, StartStepId, DMS_STEPS, ID_ATTR, START_STEP_ID_ATTR, STEP,
};
use crate::dry_run::ResolvedStep;
use crate::error::MaxQuantError;
use log::debug;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

const FASTA_FILES: &[u8] = b"fastaFiles";
const FASTA_FILE_PATH: &[u8] = b"fastaFilePath";
const FILE_PATHS: &[u8] = b"filePaths";
const STRING: &[u8] = b"string";
const NUM_THREADS: &[u8] = b"numThreads";

/// Sections holding one entry per raw file: (section, item element, default value).
const RAW_FILE_SECTIONS: &[(&str, &str, &str)] = &[
    ("filePaths", "string", ""),
    ("experiments", "string", ""),
    ("fractions", "short", "32767"),
    ("ptms", "boolean", "False"),
    ("paramGroupIndices", "int", "0"),
    ("referenceChannel", "string", ""),
];

fn raw_file_section(name: &[u8]) -> Option<(&'static str, &'static str, &'static str)> {
    RAW_FILE_SECTIONS
        .iter()
        .copied()
        .find(|(section, _, _)| section.as_bytes() == name)
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// dmsSteps start step IDs
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// Build a replacement for a dmsSteps `step` element whose start step is
/// `auto`. Returns `None` when the element should be written unchanged.
fn resolve_step_element<'a>(
    element: &BytesStart<'_>,
    starts: &HashMap<u32, u32>,
) -> Result<Option<BytesStart<'a>>, MaxQuantError> {
    let Some(start_step_id) = attribute_value(element, START_STEP_ID_ATTR)? else {
        return Ok(None);
    };
    if !start_step_id.parse::<StartStepId>()?.is_auto() {
        return Ok(None);
    }
    let id = attribute_value(element, ID_ATTR)?
        .ok_or(MaxQuantError::MissingAttribute { attribute: ID_ATTR })?;
    let id = parse_number(ID_ATTR, &id)?;
    let start = starts.get(&id).ok_or(MaxQuantError::UnresolvedStep(id))?;

    let mut updated = BytesStart::new(String::from_utf8_lossy(element.name().as_ref()).into_owned());
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == START_STEP_ID_ATTR.as_bytes() {
            updated.push_attribute((START_STEP_ID_ATTR, start.to_string().as_str()));
        } else {
            updated.push_attribute(attr);
        }
    }
    Ok(Some(updated))
}

/// Replace `startStepID="auto"` on each dmsSteps step with its resolved start step.
/// Steps with a numeric start step are left alone.
pub fn write_resolved_step_ids(
    xml: &str,
    resolved: &[ResolvedStep],
) -> Result<String, MaxQuantError> {
    let starts: HashMap<u32, u32> = resolved.iter().map(|s| (s.id, s.start_step)).collect();
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    // Depth relative to the dmsSteps element; zero when outside of it.
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let e = if depth == 1 && e.name().as_ref() == STEP {
                    resolve_step_element(&e, &starts)?.unwrap_or(e)
                } else {
                    e
                };
                if depth > 0 {
                    depth += 1;
                } else if e.name().as_ref() == DMS_STEPS {
                    depth = 1;
                }
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                let e = if depth == 1 && e.name().as_ref() == STEP {
                    resolve_step_element(&e, &starts)?.unwrap_or(e)
                } else {
                    e
                };
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e))?;
            }
            other => writer.write_event(other)?,
        }
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Replace the contents of `path` by writing a sibling temporary file and
/// renaming it over the original.
fn replace_file(path: &Path, contents: &str) -> Result<(), MaxQuantError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| MaxQuantError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| MaxQuantError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| MaxQuantError::io(path, e.error))?;
    Ok(())
}

/// Rewrite the `auto` start steps of a parameter file in place.
/// Returns true if the file changed.
pub fn rewrite_step_ids_in_place(
    path: &Path,
    resolved: &[ResolvedStep],
) -> Result<bool, MaxQuantError> {
    let xml = std::fs::read_to_string(path).map_err(|e| MaxQuantError::io(path, e))?;
    let updated = write_resolved_step_ids(&xml, resolved)?;
    if updated == xml {
        return Ok(false);
    }
    replace_file(path, &updated)?;
    debug!("wrote resolved start steps to {}", path.display());
    Ok(true)
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// Inputs and threads
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// Edits that point a parameter file at the files staged for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MqparUpdate {
    pub fasta_file: Option<PathBuf>,
    /// One entry per raw file; every per-file section is resized to match.
    pub raw_files: Option<Vec<PathBuf>>,
    pub num_threads: Option<usize>,
}

/// Values read back from a parameter file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MqparSummary {
    pub fasta_files: Vec<String>,
    pub raw_files: Vec<String>,
    pub num_threads: Option<usize>,
}

/// Whitespace and template value of a list section.
#[derive(Default)]
struct SectionLayout {
    item_indent: Option<String>,
    close_indent: Option<String>,
    first_value: Option<String>,
    items: usize,
}

/// Consume the events of a section up to and including its end tag.
fn read_section(reader: &mut Reader<&[u8]>) -> Result<SectionLayout, MaxQuantError> {
    let mut layout = SectionLayout::default();
    let mut depth = 0usize;
    let mut pending_whitespace = None;

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                if depth == 0 {
                    if layout.items == 0 {
                        layout.item_indent = pending_whitespace.take();
                    }
                    layout.items += 1;
                }
                depth += 1;
            }
            Event::Empty(_) => {
                if depth == 0 {
                    if layout.items == 0 {
                        layout.item_indent = pending_whitespace.take();
                        layout.first_value = Some(String::new());
                    }
                    layout.items += 1;
                }
            }
            Event::Text(text) => {
                if depth == 0 {
                    let raw = String::from_utf8_lossy(&text).into_owned();
                    if raw.trim().is_empty() {
                        pending_whitespace = Some(raw);
                    }
                } else if depth == 1 && layout.items == 1 {
                    layout.first_value = Some(text.unescape()?.into_owned());
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    layout.close_indent = pending_whitespace.take();
                    return Ok(layout);
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("parameter section".to_string()).into())
            }
            _ => {}
        }
    }
}

/// Consume the events of an element up to and including its end tag.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), MaxQuantError> {
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("parameter element".to_string()).into())
            }
            _ => {}
        }
    }
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'_>,
    text: &str,
) -> Result<(), MaxQuantError> {
    let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn write_raw_file_section(
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'_>,
    (section, item, default): (&str, &str, &str),
    layout: &SectionLayout,
    raw_files: &[PathBuf],
) -> Result<(), MaxQuantError> {
    writer.write_event(Event::Start(start))?;
    for raw_file in raw_files {
        if let Some(indent) = &layout.item_indent {
            writer.write_event(Event::Text(BytesText::from_escaped(indent.as_str())))?;
        }
        let value = if section.as_bytes() == FILE_PATHS {
            raw_file.display().to_string()
        } else {
            layout
                .first_value
                .clone()
                .unwrap_or_else(|| default.to_string())
        };
        write_text_element(writer, BytesStart::new(item), &value)?;
    }
    if let Some(indent) = &layout.close_indent {
        writer.write_event(Event::Text(BytesText::from_escaped(indent.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new(section)))?;
    Ok(())
}

/// Copy a fastaFiles section, keeping only its first entry and pointing that
/// entry at `fasta_file`.
fn write_fasta_section(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'_>,
    fasta_file: &str,
) -> Result<(), MaxQuantError> {
    writer.write_event(Event::Start(start))?;
    let mut depth = 0usize;
    let mut items = 0usize;
    let mut pending_whitespace: Option<BytesText<'static>> = None;

    loop {
        let (e, is_empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::Text(text) if depth == 0 && text.iter().all(u8::is_ascii_whitespace) => {
                pending_whitespace = Some(text.into_owned());
                continue;
            }
            Event::End(e) => {
                if depth == 0 {
                    if let Some(ws) = pending_whitespace.take() {
                        writer.write_event(Event::Text(ws))?;
                    }
                    writer.write_event(Event::End(e))?;
                    return Ok(());
                }
                depth -= 1;
                writer.write_event(Event::End(e))?;
                continue;
            }
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("fastaFiles".to_string()).into())
            }
            other => {
                if let Some(ws) = pending_whitespace.take() {
                    writer.write_event(Event::Text(ws))?;
                }
                writer.write_event(other)?;
                continue;
            }
        };

        if depth == 0 {
            items += 1;
            if items > 1 {
                debug!("dropping extra fastaFiles entry");
                pending_whitespace = None;
                if !is_empty {
                    skip_element(reader)?;
                }
                continue;
            }
            if let Some(ws) = pending_whitespace.take() {
                writer.write_event(Event::Text(ws))?;
            }
        }
        let is_path = if depth == 0 {
            e.name().as_ref() == STRING
        } else {
            e.name().as_ref() == FASTA_FILE_PATH
        };
        if is_path {
            if !is_empty {
                skip_element(reader)?;
            }
            write_text_element(writer, e, fasta_file)?;
        } else if is_empty {
            writer.write_event(Event::Empty(e))?;
        } else {
            depth += 1;
            writer.write_event(Event::Start(e))?;
        }
    }
}

/// Apply `update` to a parameter file's text.
pub fn update_parameters(xml: &str, update: &MqparUpdate) -> Result<String, MaxQuantError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let fasta_file = update.fasta_file.as_ref().map(|p| p.display().to_string());
    let num_threads = update.num_threads.map(|n| n.to_string());

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                let at_top = stack.len() == 1;
                if let (true, Some(raw_files), Some(section)) =
                    (at_top, &update.raw_files, raw_file_section(&name))
                {
                    let layout = read_section(&mut reader)?;
                    write_raw_file_section(&mut writer, e, section, &layout, raw_files)?;
                    continue;
                }
                if let (true, Some(fasta_file)) = (name == FASTA_FILES, &fasta_file) {
                    write_fasta_section(&mut reader, &mut writer, e, fasta_file)?;
                    continue;
                }
                let replacement = if at_top && name == NUM_THREADS {
                    num_threads.as_deref()
                } else {
                    None
                };
                if let Some(text) = replacement {
                    skip_element(&mut reader)?;
                    write_text_element(&mut writer, e, text)?;
                    continue;
                }
                stack.push(name);
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                let name = e.name().as_ref().to_vec();
                let at_top = stack.len() == 1;
                if let (true, Some(raw_files), Some(section)) =
                    (at_top, &update.raw_files, raw_file_section(&name))
                {
                    let layout = SectionLayout::default();
                    let start = BytesStart::new(section.0);
                    write_raw_file_section(&mut writer, start, section, &layout, raw_files)?;
                } else if let (true, Some(text)) = (at_top && name == NUM_THREADS, &num_threads) {
                    write_text_element(&mut writer, e, text)?;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::End(e) => {
                stack.pop();
                writer.write_event(Event::End(e))?;
            }
            other => writer.write_event(other)?,
        }
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Apply `update` to a parameter file on disk.
pub fn update_parameter_file(path: &Path, update: &MqparUpdate) -> Result<(), MaxQuantError> {
    let xml = std::fs::read_to_string(path).map_err(|e| MaxQuantError::io(path, e))?;
    let updated = update_parameters(&xml, update)?;
    if updated != xml {
        replace_file(path, &updated)?;
    }
    Ok(())
}

/// Read the FASTA files, raw files and thread count from a parameter file.
pub fn summarize(xml: &str) -> Result<MqparSummary, MaxQuantError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut summary = MqparSummary::default();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => stack.push(e.name().as_ref().to_vec()),
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                let Some(current) = stack.last() else {
                    continue;
                };
                let parent = stack.len().checked_sub(2).map(|i| stack[i].as_slice());
                let value = text.unescape()?.trim().to_string();
                if (current == FASTA_FILE_PATH && stack.iter().any(|n| n == FASTA_FILES))
                    || (current == STRING && parent == Some(FASTA_FILES))
                {
                    summary.fasta_files.push(value);
                } else if current == STRING && parent == Some(FILE_PATHS) && stack.len() == 3 {
                    summary.raw_files.push(value);
                } else if current == NUM_THREADS && stack.len() == 2 {
                    summary.num_threads = Some(parse_number("numThreads", &value)? as usize);
                }
            }
            _ => {}
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dms_steps::{needs_dry_run, read_dms_steps};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const PARAMS: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <MaxQuantParams xmlns:xsd="http://www.w3.org/2001/XMLSchema">
           <fastaFiles>
              <FastaFileInfo>
                 <fastaFilePath>C:\DMS_Temp_Org\old.fasta</fastaFilePath>
                 <identifierParseRule>&gt;([^\s]*)</identifierParseRule>
              </FastaFileInfo>
           </fastaFiles>
           <filePaths>
              <string>C:\DMS_WorkDir\Dataset_A.raw</string>
           </filePaths>
           <experiments>
              <string>Exp1</string>
           </experiments>
           <fractions>
              <short>32767</short>
           </fractions>
           <ptms>
              <boolean>False</boolean>
           </ptms>
           <paramGroupIndices>
              <int>0</int>
           </paramGroupIndices>
           <referenceChannel />
           <numThreads>1</numThreads>
           <!-- DMS step definitions -->
           <dmsSteps>
              <step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="auto" />
              <step id="2" tool="MaxqS1" startStepName="Preparing searches" startStepID="auto" />
              <step id="3" tool="MaxqS2" startStepName="Writing tables" startStepID="30" />
           </dmsSteps>
        </MaxQuantParams>
    "#};

    fn resolved() -> Vec<ResolvedStep> {
        [(1, "MaxqPeak", 0), (2, "MaxqS1", 14), (3, "MaxqS2", 30)]
            .into_iter()
            .map(|(id, tool, start_step)| ResolvedStep {
                id,
                tool: tool.to_string(),
                start_step_name: String::new(),
                start_step,
            })
            .collect()
    }

    #[test]
    fn test_write_resolved_step_ids() {
        let updated = write_resolved_step_ids(PARAMS, &resolved()).unwrap();
        assert!(updated.contains(
            r#"<step id="1" tool="MaxqPeak" startStepName="Configuring" startStepID="0"/>"#
        ));
        assert!(updated.contains(r#"startStepName="Preparing searches" startStepID="14"/>"#));
        // Untouched elements keep their original text.
        assert!(updated.contains(
            r#"<step id="3" tool="MaxqS2" startStepName="Writing tables" startStepID="30" />"#
        ));
        assert!(updated.contains("<!-- DMS step definitions -->"));
        assert!(updated.contains(r"<identifierParseRule>&gt;([^\s]*)</identifierParseRule>"));
        assert!(!needs_dry_run(&read_dms_steps(&updated).unwrap()));

        // A second pass is a no-op.
        assert_eq!(write_resolved_step_ids(&updated, &resolved()).unwrap(), updated);
    }

    #[test]
    fn test_unresolved_auto_step() {
        let err = write_resolved_step_ids(PARAMS, &resolved()[..1]).unwrap_err();
        assert!(matches!(err, MaxQuantError::UnresolvedStep(2)));
    }

    #[test]
    fn test_rewrite_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MaxQuant_Params.xml");
        std::fs::write(&path, PARAMS).unwrap();

        assert!(rewrite_step_ids_in_place(&path, &resolved()).unwrap());
        assert!(!rewrite_step_ids_in_place(&path, &resolved()).unwrap());
        let starts: Vec<_> = read_dms_steps(&std::fs::read_to_string(&path).unwrap())
            .unwrap()
            .into_iter()
            .map(|s| s.start_step_id)
            .collect();
        assert_eq!(
            starts,
            vec![
                StartStepId::Fixed(0),
                StartStepId::Fixed(14),
                StartStepId::Fixed(30)
            ]
        );
    }

    #[test]
    fn test_update_parameters() {
        let update = MqparUpdate {
            fasta_file: Some(PathBuf::from("/work/job_1234/human.fasta")),
            raw_files: Some(vec![
                PathBuf::from("/work/job_1234/Dataset_A.raw"),
                PathBuf::from("/work/job_1234/Dataset_B.raw"),
            ]),
            num_threads: Some(8),
        };
        let updated = update_parameters(PARAMS, &update).unwrap();
        assert_eq!(
            summarize(&updated).unwrap(),
            MqparSummary {
                fasta_files: vec!["/work/job_1234/human.fasta".to_string()],
                raw_files: vec![
                    "/work/job_1234/Dataset_A.raw".to_string(),
                    "/work/job_1234/Dataset_B.raw".to_string()
                ],
                num_threads: Some(8),
            }
        );
        assert!(updated.contains(
            "<experiments>\n      <string>Exp1</string>\n      <string>Exp1</string>\n   </experiments>"
        ));
        assert!(updated.contains("<short>32767</short>\n      <short>32767</short>"));
        assert!(updated.contains("<referenceChannel><string></string><string></string></referenceChannel>"));
        assert!(updated.contains(r"<identifierParseRule>&gt;([^\s]*)</identifierParseRule>"));
        // The dmsSteps section is untouched.
        assert_eq!(read_dms_steps(&updated).unwrap(), read_dms_steps(PARAMS).unwrap());
    }

    #[test]
    fn test_empty_update_is_identity() {
        assert_eq!(update_parameters(PARAMS, &MqparUpdate::default()).unwrap(), PARAMS);
    }

    #[test]
    fn test_several_fasta_files_become_one() {
        let xml = indoc! {r"
            <MaxQuantParams>
               <fastaFiles>
                  <FastaFileInfo>
                     <fastaFilePath>C:\fasta\a.fasta</fastaFilePath>
                     <taxonomyId>9606</taxonomyId>
                  </FastaFileInfo>
                  <FastaFileInfo>
                     <fastaFilePath>C:\fasta\b.fasta</fastaFilePath>
                     <taxonomyId>10090</taxonomyId>
                  </FastaFileInfo>
               </fastaFiles>
               <numThreads>1</numThreads>
            </MaxQuantParams>
        "};
        let update = MqparUpdate {
            fasta_file: Some(PathBuf::from("/x/new.fasta")),
            ..Default::default()
        };
        let updated = update_parameters(xml, &update).unwrap();
        assert_eq!(
            updated,
            indoc! {r"
                <MaxQuantParams>
                   <fastaFiles>
                      <FastaFileInfo>
                         <fastaFilePath>/x/new.fasta</fastaFilePath>
                         <taxonomyId>9606</taxonomyId>
                      </FastaFileInfo>
                   </fastaFiles>
                   <numThreads>1</numThreads>
                </MaxQuantParams>
            "}
        );
        assert_eq!(summarize(&updated).unwrap().fasta_files, vec!["/x/new.fasta".to_string()]);

        let legacy = "<MaxQuantParams><fastaFiles>\n  <string>a.fasta</string>\n  <string>b.fasta</string>\n</fastaFiles></MaxQuantParams>";
        assert_eq!(
            update_parameters(legacy, &update).unwrap(),
            "<MaxQuantParams><fastaFiles>\n  <string>/x/new.fasta</string>\n</fastaFiles></MaxQuantParams>"
        );
    }

    #[test]
    fn test_summarize_legacy_fasta_list() {
        let xml = indoc! {r"
            <MaxQuantParams>
              <fastaFiles><string>D:\fasta\yeast.fasta</string></fastaFiles>
              <filePaths/>
            </MaxQuantParams>
        "};
        let summary = summarize(xml).unwrap();
        assert_eq!(summary.fasta_files, vec![r"D:\fasta\yeast.fasta".to_string()]);
        assert!(summary.raw_files.is_empty());
        assert_eq!(summary.num_threads, None);

        let update = MqparUpdate {
            fasta_file: Some(PathBuf::from("/local/yeast.fasta")),
            ..Default::default()
        };
        let updated = update_parameters(xml, &update).unwrap();
        assert!(updated.contains("<fastaFiles><string>/local/yeast.fasta</string></fastaFiles>"));
    }
}
