use std::sync::Arc;
use rocket::{State, get, post, http::Status, serde::json::Json};
use ring::rand::SystemRandom;
use tracing::{debug, info, instrument};
use poll_shared::models::*;
use poll_shared::tally::tags_of;
use poll_shared::validation::{validate_prompt_request, validate_selections, validate_submission};
use crate::{
    admin::{AdminGate, AdminSession},
    catalog::Catalog,
    config::AppConfig,
    connection::ConnectionResolver,
    error::ApiError,
    generator::PoemGenerator,
    processor::{SaveOutcome, VoteProcessor},
    prompt::{compose, PromptInput, DEFAULT_SAMPLE_SIZE},
};

pub struct AppState {
    pub processor: VoteProcessor,
    pub catalog: Catalog,
    pub generator: PoemGenerator,
    pub admin: AdminGate,
    pub rng: SystemRandom,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        resolver: Arc<ConnectionResolver>,
        catalog: Catalog,
        generator: PoemGenerator,
    ) -> Self {
        Self {
            processor: VoteProcessor::new(resolver, config.store_timeout()),
            catalog,
            generator,
            admin: AdminGate::new(config.admin_password.clone()),
            rng: SystemRandom::new(),
        }
    }

    async fn compose_prompt(&self, request: &PromptRequest) -> String {
        let summary = self.processor.summary().await;
        let top_properties = tags_of(&summary.top_properties);
        let top_wishes = tags_of(&summary.top_wishes);

        compose(
            &self.rng,
            &PromptInput {
                name: request.name.trim(),
                age: request.age,
                top_properties: &top_properties,
                top_wishes: &top_wishes,
                insider_notes: &summary.insider_notes,
            },
            DEFAULT_SAMPLE_SIZE,
        )
    }
}

#[get("/status")]
pub async fn status(state: &State<AppState>) -> Json<StoreStatus> {
    Json(state.processor.status().await)
}

#[get("/options")]
pub fn catalog_options(state: &State<AppState>) -> Json<CatalogView> {
    Json(state.catalog.view())
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[instrument(skip_all)]
#[post("/votes", format = "json", data = "<request>")]
pub async fn submit_vote(
    state: &State<AppState>,
    request: Json<SubmitVoteRequest>,
) -> Result<Json<SubmitVoteResponse>, ApiError> {
    let request = request.into_inner();
    validate_submission(&request)?;

    let record = VoteRecord::from_submission(request);
    validate_selections(&record, |kind, tag| state.catalog.offers(kind, tag))?;
    debug!(
        "Storing vote with {} properties, {} wishes",
        record.properties.len(),
        record.wishes.len()
    );

    let outcome = state.processor.store(record).await;
    let message = match outcome {
        SaveOutcome::Remote => "Saved to the cloud.",
        SaveOutcome::Ephemeral => "Saved locally only - lost when the server restarts.",
        SaveOutcome::Dropped => "Saving failed - please tell the host.",
    };

    Ok(Json(SubmitVoteResponse {
        stored_remotely: outcome.is_remote(),
        message: message.into(),
    }))
}

#[get("/admin/session")]
pub fn admin_session(_admin: AdminSession) -> Status {
    Status::NoContent
}

#[get("/admin/summary")]
pub async fn summary(state: &State<AppState>, _admin: AdminSession) -> Json<VoteSummary> {
    Json(state.processor.summary().await)
}

#[get("/admin/votes")]
pub async fn raw_votes(state: &State<AppState>, _admin: AdminSession) -> Json<Vec<VoteRecord>> {
    Json(state.processor.load_all().await.records)
}

#[post("/admin/prompt", format = "json", data = "<request>")]
pub async fn preview_prompt(
    state: &State<AppState>,
    _admin: AdminSession,
    request: Json<PromptRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    validate_prompt_request(&request)?;
    Ok(Json(PromptResponse { prompt: state.compose_prompt(&request).await }))
}

#[instrument(skip_all)]
#[post("/admin/poem", format = "json", data = "<request>")]
pub async fn generate_poem(
    state: &State<AppState>,
    _admin: AdminSession,
    request: Json<PoemRequest>,
) -> Result<Json<PoemResponse>, ApiError> {
    let request = request.into_inner();
    let prompt_request = PromptRequest { name: request.name.clone(), age: request.age };
    validate_prompt_request(&prompt_request)?;

    let prompt = state.compose_prompt(&prompt_request).await;
    let poem = state.generator.generate(&prompt, request.api_key.as_deref()).await?;

    info!("Poem ready for {}", prompt_request.name.trim());
    Ok(Json(PoemResponse {
        title: format!("Gedicht für {}", prompt_request.name.trim()),
        poem,
        prompt,
    }))
}
