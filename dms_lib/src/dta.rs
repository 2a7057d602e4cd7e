//! Converting a concatenated DTA file (`<dataset>_dta.txt`) to MGF for OMSSA.
//!
//! Each spectrum in the concatenated file starts with a header line naming the
//! original DTA file, for example
//! `=============== "Dataset.1234.1236.2.dta" ===============`, followed by the
//! parent `MH+ charge` line and one `m/z intensity` line per peak.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use std::sync::OnceLock;

pub const PROTON_MASS: f64 = 1.00727646688;

fn header_pattern() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r#"^\s*=+\s*"([^"]+)"\s*=+\s*$"#).unwrap())
}

fn scans_pattern() -> &'static Regex {
    static SCANS: OnceLock<Regex> = OnceLock::new();
    SCANS.get_or_init(|| Regex::new(r"(?i)\.(\d+)\.(\d+)\.\d+\.dta$").unwrap())
}

fn header_title(line: &str) -> Option<&str> {
    header_pattern()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DtaSpectrum {
    /// Name of the DTA file, used as the MGF title.
    pub title: String,
    /// Singly protonated parent mass.
    pub parent_mh: f64,
    pub charge: u32,
    pub peaks: Vec<(f64, f64)>,
}

impl DtaSpectrum {
    pub fn precursor_mz(&self) -> f64 {
        let z = f64::from(self.charge);
        (self.parent_mh + (z - 1.0) * PROTON_MASS) / z
    }

    /// Start scan, or `start-end` when the DTA spans several scans.
    pub fn scans(&self) -> Option<String> {
        let caps = scans_pattern().captures(&self.title)?;
        let start = caps[1].parse::<u32>().ok()?;
        let end = caps[2].parse::<u32>().ok()?;
        Some(if end > start {
            format!("{start}-{end}")
        } else {
            start.to_string()
        })
    }

    pub fn write_mgf<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "BEGIN IONS")?;
        writeln!(out, "TITLE={}", self.title)?;
        writeln!(out, "PEPMASS={:.5}", self.precursor_mz())?;
        writeln!(out, "CHARGE={}+", self.charge)?;
        if let Some(scans) = self.scans() {
            writeln!(out, "SCANS={scans}")?;
        }
        for (mz, intensity) in &self.peaks {
            writeln!(out, "{mz} {intensity}")?;
        }
        writeln!(out, "END IONS")?;
        writeln!(out)
    }
}

/// Reads spectra one at a time from a concatenated DTA file.
pub struct DtaReader<R: BufRead> {
    lines: Lines<R>,
    line_number: usize,
    next_title: Option<String>,
}

impl<R: BufRead> DtaReader<R> {
    pub fn new(reader: R) -> Self {
        DtaReader {
            lines: reader.lines(),
            line_number: 0,
            next_title: None,
        }
    }

    fn next_line(&mut self) -> Option<io::Result<String>> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(line)
    }

    fn parse_pair(&self, line: &str) -> Result<(f64, f64)> {
        let mut fields = line.split_whitespace();
        let (Some(a), Some(b)) = (fields.next(), fields.next()) else {
            bail!("line {}: expected two values, found {line:?}", self.line_number);
        };
        let parse = |v: &str| {
            v.parse::<f64>()
                .map_err(|_| anyhow!("line {}: {v:?} is not a number", self.line_number))
        };
        Ok((parse(a)?, parse(b)?))
    }

    fn read_spectrum(&mut self, title: String) -> Result<DtaSpectrum> {
        let mut parent = None;
        let mut peaks = Vec::new();
        while let Some(line) = self.next_line() {
            let line = line?;
            if let Some(next) = header_title(&line) {
                self.next_title = Some(next.to_string());
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let pair = self.parse_pair(line)?;
            if parent.is_none() {
                parent = Some(pair);
            } else {
                peaks.push(pair);
            }
        }

        let Some((parent_mh, charge)) = parent else {
            bail!("{title} has no parent ion line");
        };
        if charge < 1.0 || charge.fract() != 0.0 {
            bail!("{title} has an invalid charge {charge}");
        }
        Ok(DtaSpectrum {
            title,
            parent_mh,
            charge: charge as u32,
            peaks,
        })
    }
}

impl<R: BufRead> Iterator for DtaReader<R> {
    type Item = Result<DtaSpectrum>;

    fn next(&mut self) -> Option<Self::Item> {
        let title = match self.next_title.take() {
            Some(title) => title,
            None => loop {
                let line = match self.next_line()? {
                    Ok(line) => line,
                    Err(e) => return Some(Err(e.into())),
                };
                if let Some(title) = header_title(&line) {
                    break title.to_string();
                }
                if !line.trim().is_empty() {
                    return Some(Err(anyhow!(
                        "line {}: expected a DTA header, found {line:?}",
                        self.line_number
                    )));
                }
            },
        };
        Some(self.read_spectrum(title))
    }
}

/// Convert a concatenated DTA file to MGF. Returns the number of spectra written.
pub fn convert_dta_to_mgf(dta: &Path, mgf: &Path) -> Result<usize> {
    let reader = BufReader::new(File::open(dta).with_context(|| dta.display().to_string())?);
    let mut out = BufWriter::new(File::create(mgf).with_context(|| mgf.display().to_string())?);
    let mut count = 0;
    for spectrum in DtaReader::new(reader) {
        spectrum
            .with_context(|| dta.display().to_string())?
            .write_mgf(&mut out)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
