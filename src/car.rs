//! Data model for the corpus reader's paragraph and outline streams.
//!
//! CBOR decoding of the raw corpus belongs to the external reader; this
//! module only mirrors its object model and reads the JSON-lines dumps it
//! produces, one object per line.

use std::io::BufRead;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One body element of a paragraph: plain text, or anchor text linking to
/// another page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParaBody {
    Text { text: String },
    Link { anchor_text: String, page: String },
}

impl ParaBody {
    /// The visible text of this element.
    pub fn text(&self) -> &str {
        match self {
            ParaBody::Text { text } => text,
            ParaBody::Link { anchor_text, .. } => anchor_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub para_id: String,
    pub bodies: Vec<ParaBody>,
}

impl Paragraph {
    /// Concatenated body text, links flattened to their anchor text.
    pub fn text(&self) -> String {
        self.bodies.iter().map(ParaBody::text).collect()
    }
}

/// A heading in a page outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading_id: String,
    pub heading: String,
    #[serde(default)]
    pub children: Vec<Section>,
}

/// A page with its outline of nested headings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_id: String,
    pub page_name: String,
    #[serde(default)]
    pub outline: Vec<Section>,
}

impl Page {
    /// Every root-to-leaf heading chain, depth-first in outline order.
    pub fn flat_heading_paths(&self) -> Vec<Vec<&Section>> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        for top in &self.outline {
            walk(top, &mut prefix, &mut paths);
        }
        paths
    }
}

fn walk<'a>(
    section: &'a Section,
    prefix: &mut Vec<&'a Section>,
    paths: &mut Vec<Vec<&'a Section>>,
) {
    prefix.push(section);
    if section.children.is_empty() {
        paths.push(prefix.clone());
    } else {
        for child in &section.children {
            walk(child, prefix, paths);
        }
    }
    prefix.pop();
}

fn read_jsonl<T: DeserializeOwned>(reader: impl BufRead) -> impl Iterator<Item = Result<T>> {
    reader.lines().map(|line| {
        let line = line?;
        Ok(serde_json::from_str(&line)?)
    })
}

/// Lazily read paragraphs, one JSON object per line.
pub fn read_paragraphs(reader: impl BufRead) -> impl Iterator<Item = Result<Paragraph>> {
    read_jsonl(reader)
}

/// Lazily read pages, one JSON object per line.
pub fn read_pages(reader: impl BufRead) -> impl Iterator<Item = Result<Page>> {
    read_jsonl(reader)
}
