use serde::{Serialize, Deserialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub wishes: Vec<String>,
    #[serde(default)]
    pub insider: String,
    #[serde(default)]
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub wishes: Vec<String>,
    #[serde(default)]
    pub insider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteResponse {
    pub stored_remotely: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub online: bool,
    pub backend: String,
    pub detail: Option<String>,
}

/// Flattened view of every stored vote, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteSnapshot {
    pub properties: Vec<String>,
    pub wishes: Vec<String>,
    pub insider_notes: Vec<String>,
    pub records: Vec<VoteRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub total_votes: usize,
    pub top_properties: Vec<TagCount>,
    pub top_wishes: Vec<TagCount>,
    pub property_counts: Vec<TagCount>,
    pub wish_counts: Vec<TagCount>,
    pub insider_notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    #[serde(default = "default_celebrant")]
    pub name: String,
    #[serde(default = "default_age")]
    pub age: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemRequest {
    #[serde(default = "default_celebrant")]
    pub name: String,
    #[serde(default = "default_age")]
    pub age: u32,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemResponse {
    pub title: String,
    pub poem: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OptionKind {
    Property,
    Wish,
}

impl OptionKind {
    /// Maps the catalog's `Typ` column onto a kind.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Eigenschaft" => Some(OptionKind::Property),
            "Wunsch" => Some(OptionKind::Wish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub kind: OptionKind,
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub properties: Vec<CategoryGroup>,
    pub wishes: Vec<CategoryGroup>,
}

fn default_celebrant() -> String {
    "Das Geburtstagskind".to_string()
}

fn default_age() -> u32 {
    40
}

impl VoteRecord {
    pub fn new(
        name: impl Into<String>,
        properties: Vec<String>,
        wishes: Vec<String>,
        insider: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            properties,
            wishes,
            insider: insider.into(),
            timestamp: None,
        }
    }

    /// Trims free text and drops repeated selections, keeping first-pick order.
    pub fn from_submission(request: SubmitVoteRequest) -> Self {
        Self::new(
            request.name.trim(),
            distinct_tags(request.properties),
            distinct_tags(request.wishes),
            request.insider.trim(),
        )
    }

    pub fn stamped_now(mut self) -> Self {
        self.timestamp = Some(OffsetDateTime::now_utc());
        self
    }

    pub fn has_selection(&self) -> bool {
        !self.properties.is_empty() || !self.wishes.is_empty()
    }
}

fn distinct_tags(tags: Vec<String>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !distinct.iter().any(|seen| seen == tag) {
            distinct.push(tag.to_string());
        }
    }
    distinct
}

impl VoteSnapshot {
    pub fn push(&mut self, record: VoteRecord) {
        self.properties.extend(record.properties.iter().cloned());
        self.wishes.extend(record.wishes.iter().cloned());
        if !record.insider.is_empty() {
            self.insider_notes.push(record.insider.clone());
        }
        self.records.push(record);
    }

    pub fn total_votes(&self) -> usize {
        self.records.len()
    }
}

impl FromIterator<VoteRecord> for VoteSnapshot {
    fn from_iter<I: IntoIterator<Item = VoteRecord>>(iter: I) -> Self {
        let mut snapshot = VoteSnapshot::default();
        for record in iter {
            snapshot.push(record);
        }
        snapshot
    }
}
