//! The samples file: one `<simpletiled>` entry per generated sample.
//!
//! Tileset paths are resolved against the directory of the samples file.
//! `<overlapping>` entries need pattern extraction from a source image,
//! which this crate does not do; they are reported and skipped.

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use wfc_core::{Heuristic, ModelConfig, RngKind};

use crate::error::LoadError;
use crate::xml::{element_name, Attributes};

/// Settings of one `<simpletiled>` sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub name: String,
    pub tileset: PathBuf,
    pub width: usize,
    pub height: usize,
    pub periodic: bool,
    pub ground: bool,
    pub heuristic: Heuristic,
    /// Collapse cap; `None` for unbounded
    pub limit: Option<usize>,
    pub screenshots: usize,
    pub attempts: usize,
    pub text_output: bool,
    pub workers: usize,
    pub rng: RngKind,
}

impl SampleConfig {
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            width: self.width,
            height: self.height,
            n: 1,
            periodic: self.periodic,
            ground: self.ground,
            heuristic: self.heuristic,
            workers: self.workers,
            rng: self.rng,
        }
    }
}

/// Read every `<simpletiled>` entry of a samples file.
pub fn load_samples(path: &Path) -> Result<Vec<SampleConfig>, LoadError> {
    let xml = std::fs::read_to_string(path)
        .map_err(|e| LoadError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_samples(&xml, base)
}

pub fn parse_samples(xml: &str, base: &Path) -> Result<Vec<SampleConfig>, LoadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut samples = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match element_name(e)?.as_str() {
                    "simpletiled" => samples.push(parse_simpletiled(&Attributes::parse(e)?, base)?),
                    "overlapping" => {
                        let attrs = Attributes::parse(e)?;
                        tracing::warn!(
                            name = attrs.get("name").unwrap_or("?"),
                            "overlapping samples are not supported, skipping"
                        );
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoadError::XmlError(format!("{}", e))),
            _ => {}
        }
    }

    Ok(samples)
}

fn parse_simpletiled(attrs: &Attributes, base: &Path) -> Result<SampleConfig, LoadError> {
    let name = attrs.required("name")?.to_string();
    let tileset = match attrs.get("tileset") {
        Some(file) => base.join(file),
        None => base.join("tilesets").join(format!("{}.xml", name)),
    };

    let size: usize = attrs.parse_or("size", 24)?;
    let heuristic = match attrs.get("heuristic") {
        Some(value) => value
            .parse::<Heuristic>()
            .map_err(|e| attrs.invalid("heuristic", value, e))?,
        None => Heuristic::Entropy,
    };
    let rng = match attrs.get("rng") {
        Some(value) => value
            .parse::<RngKind>()
            .map_err(|e| attrs.invalid("rng", value, e))?,
        None => RngKind::default(),
    };
    let limit: i64 = attrs.parse_or("limit", -1)?;

    Ok(SampleConfig {
        name,
        tileset,
        width: attrs.parse_or("width", size)?,
        height: attrs.parse_or("height", size)?,
        periodic: attrs.bool_or("periodic", false)?,
        ground: attrs.bool_or("ground", false)?,
        heuristic,
        limit: usize::try_from(limit).ok(),
        screenshots: attrs.parse_or("screenshots", 2)?,
        attempts: attrs.parse_or("attempts", 10)?,
        text_output: attrs.bool_or("textOutput", false)?,
        workers: attrs.parse_or("workers", 1)?,
        rng,
    })
}
