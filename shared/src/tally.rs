use std::collections::HashMap;
use crate::models::{TagCount, VoteSnapshot, VoteSummary};

pub const DEFAULT_TOP_N: usize = 5;

/// Counts every distinct tag and orders the table by count, highest first.
/// Equal counts keep the order in which the tags first appeared.
pub fn frequencies<S: AsRef<str>>(tags: &[S]) -> Vec<TagCount> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TagCount> = Vec::new();

    for tag in tags {
        let tag = tag.as_ref();
        match first_seen.get(tag) {
            Some(&idx) => counts[idx].count += 1,
            None => {
                first_seen.insert(tag, counts.len());
                counts.push(TagCount { tag: tag.to_string(), count: 1 });
            }
        }
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

pub fn rank<S: AsRef<str>>(tags: &[S], top_n: usize) -> Vec<TagCount> {
    let mut ranked = frequencies(tags);
    ranked.truncate(top_n);
    ranked
}

pub fn summarize(snapshot: &VoteSnapshot, top_n: usize) -> VoteSummary {
    let property_counts = frequencies(&snapshot.properties);
    let wish_counts = frequencies(&snapshot.wishes);

    VoteSummary {
        total_votes: snapshot.total_votes(),
        top_properties: property_counts.iter().take(top_n).cloned().collect(),
        top_wishes: wish_counts.iter().take(top_n).cloned().collect(),
        property_counts,
        wish_counts,
        insider_notes: snapshot.insider_notes.clone(),
    }
}

pub fn tags_of(ranked: &[TagCount]) -> Vec<String> {
    ranked.iter().map(|entry| entry.tag.clone()).collect()
}
