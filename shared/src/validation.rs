use crate::models::{OptionKind, PromptRequest, SubmitVoteRequest, VoteRecord};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_INSIDER_LENGTH: usize = 500;
pub const MAX_TAG_LENGTH: usize = 200;
pub const MAX_SELECTIONS: usize = 50;
pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 120;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select at least one property or wish")]
    NothingSelected,
    #[error("Name exceeds maximum length of {MAX_NAME_LENGTH}")]
    NameTooLong,
    #[error("Insider note exceeds maximum length of {MAX_INSIDER_LENGTH}")]
    InsiderTooLong,
    #[error("Selection text exceeds maximum length of {MAX_TAG_LENGTH}")]
    TagTooLong,
    #[error("Too many selections (maximum {MAX_SELECTIONS})")]
    TooManySelections,
    #[error("Empty selection text")]
    EmptyTag,
    #[error("Age must be between {MIN_AGE} and {MAX_AGE}, got {0}")]
    AgeOutOfRange(u32),
    #[error("Celebrant name must not be empty")]
    EmptyCelebrant,
    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

pub fn validate_submission(request: &SubmitVoteRequest) -> Result<(), ValidationError> {
    if request.properties.is_empty() && request.wishes.is_empty() {
        return Err(ValidationError::NothingSelected);
    }
    if request.name.chars().count() > MAX_NAME_LENGTH { return Err(ValidationError::NameTooLong); }
    if request.insider.chars().count() > MAX_INSIDER_LENGTH { return Err(ValidationError::InsiderTooLong); }
    if request.properties.len() + request.wishes.len() > MAX_SELECTIONS {
        return Err(ValidationError::TooManySelections);
    }

    let mut tags = request.properties.iter().chain(request.wishes.iter());
    if tags.clone().any(|tag| tag.trim().is_empty()) { return Err(ValidationError::EmptyTag); }
    if tags.any(|tag| tag.chars().count() > MAX_TAG_LENGTH) { return Err(ValidationError::TagTooLong); }

    Ok(())
}

/// Every selected tag must be offered by the catalog under the matching kind.
pub fn validate_selections<F>(record: &VoteRecord, is_offered: F) -> Result<(), ValidationError>
where
    F: Fn(OptionKind, &str) -> bool,
{
    let properties = record.properties.iter().map(|tag| (OptionKind::Property, tag));
    let wishes = record.wishes.iter().map(|tag| (OptionKind::Wish, tag));

    for (kind, tag) in properties.chain(wishes) {
        if !is_offered(kind, tag) {
            return Err(ValidationError::UnknownOption(tag.clone()));
        }
    }
    Ok(())
}

pub fn validate_prompt_request(request: &PromptRequest) -> Result<(), ValidationError> {
    if request.name.trim().is_empty() { return Err(ValidationError::EmptyCelebrant); }
    if request.name.chars().count() > MAX_NAME_LENGTH { return Err(ValidationError::NameTooLong); }
    if !(MIN_AGE..=MAX_AGE).contains(&request.age) {
        return Err(ValidationError::AgeOutOfRange(request.age));
    }
    Ok(())
}
