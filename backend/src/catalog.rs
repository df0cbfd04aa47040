use std::path::Path;
use serde::Deserialize;
use tracing::{info, warn};
use poll_shared::models::{CatalogEntry, CatalogView, CategoryGroup, OptionKind};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("could not read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Typ")]
    kind: String,
    #[serde(rename = "Kategorie")]
    category: String,
    #[serde(rename = "Text")]
    text: String,
}

/// Selectable traits and wishes, read once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        // Latin-1 maps every byte to the code point of the same value
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    if header.matches(';').count() > header.matches(',').count() { b';' } else { b',' }
}

fn group(entries: &[CatalogEntry], kind: OptionKind) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for entry in entries.iter().filter(|entry| entry.kind == kind) {
        match groups.iter_mut().find(|g| g.category == entry.category) {
            Some(existing) => existing.options.push(entry.text.clone()),
            None => groups.push(CategoryGroup {
                category: entry.category.clone(),
                options: vec![entry.text.clone()],
            }),
        }
    }
    groups
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Never fails: a missing or unreadable file yields an empty catalog.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!("Catalog {} not found - guests will see no options", path.display());
            return Self::default();
        }

        match std::fs::read(path).map_err(CatalogError::from).and_then(|bytes| Self::parse(&bytes)) {
            Ok(catalog) => {
                info!("📋 Loaded {} catalog options from {}", catalog.len(), path.display());
                catalog
            }
            Err(e) => {
                warn!("Catalog {} unusable: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, CatalogError> {
        let text = decode(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(sniff_delimiter(&text))
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut entries = Vec::new();
        for row in reader.deserialize::<CatalogRow>() {
            let row = row?;
            let Some(kind) = OptionKind::from_label(&row.kind) else { continue };
            if row.text.is_empty() {
                continue;
            }
            entries.push(CatalogEntry { kind, category: row.category, text: row.text });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn offers(&self, kind: OptionKind, text: &str) -> bool {
        self.entries.iter().any(|entry| entry.kind == kind && entry.text == text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn view(&self) -> CatalogView {
        CatalogView {
            properties: group(&self.entries, OptionKind::Property),
            wishes: group(&self.entries, OptionKind::Wish),
        }
    }
}
