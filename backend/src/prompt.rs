use ring::rand::SecureRandom;
use tracing::warn;

pub const POET_PERSONA: &str = "Du bist ein herzlicher Dichter.";
pub const RHYME_DIRECTIVE: &str = "Reimschema AABB.";
pub const DEFAULT_SAMPLE_SIZE: usize = 3;

pub struct PromptInput<'a> {
    pub name: &'a str,
    pub age: u32,
    pub top_properties: &'a [String],
    pub top_wishes: &'a [String],
    pub insider_notes: &'a [String],
}

fn random_below(rng: &dyn SecureRandom, bound: usize) -> Option<usize> {
    let mut bytes = [0u8; 8];
    rng.fill(&mut bytes).ok()?;
    Some((u64::from_le_bytes(bytes) % bound as u64) as usize)
}

/// Picks up to `sample_size` notes without replacement (partial Fisher-Yates).
/// Falls back to the first notes if the system RNG fails.
pub fn sample_notes<'a>(rng: &dyn SecureRandom, notes: &'a [String], sample_size: usize) -> Vec<&'a str> {
    let take = sample_size.min(notes.len());
    let mut pool: Vec<&str> = notes.iter().map(String::as_str).collect();

    for i in 0..take {
        match random_below(rng, pool.len() - i) {
            Some(offset) => pool.swap(i, i + offset),
            None => {
                warn!("System RNG failed, using the first {} insider notes", take);
                break;
            }
        }
    }

    pool.truncate(take);
    pool
}

pub fn compose(rng: &dyn SecureRandom, input: &PromptInput<'_>, sample_size: usize) -> String {
    let details = sample_notes(rng, input.insider_notes, sample_size);

    let mut prompt = format!(
        "Gedicht für {} ({}). Eigenschaften: {}. Wünsche: {}. ",
        input.name,
        input.age,
        input.top_properties.join(", "),
        input.top_wishes.join(", "),
    );
    if !details.is_empty() {
        prompt.push_str(&format!("Details: {}. ", details.join(", ")));
    }
    prompt.push_str(RHYME_DIRECTIVE);
    prompt
}
