pub mod admin;
pub mod catalog;
pub mod catchers;
pub mod config;
pub mod connection;
pub mod cors;
pub mod error;
pub mod generator;
pub mod processor;
pub mod prompt;
#[cfg(feature = "remote")]
pub mod remote;
pub mod routes;
pub mod store;
pub use poll_shared::{models::*, error::*, tally::*};

use rocket::{catchers, routes, Build, Rocket};
use crate::config::AppConfig;
use crate::cors::Cors;
use crate::routes::AppState;

pub fn build_rocket(state: AppState, config: &AppConfig) -> Rocket<Build> {
    rocket::build()
        .attach(Cors::new(config.cors_origin_prefix.clone()))
        .manage(state)
        .mount(
            "/api",
            routes![
                routes::status,
                routes::catalog_options,
                routes::all_options,
                routes::submit_vote,
                routes::admin_session,
                routes::summary,
                routes::raw_votes,
                routes::preview_prompt,
                routes::generate_poem,
            ],
        )
        .register(
            "/",
            catchers![
                catchers::bad_request,
                catchers::unauthorized,
                catchers::forbidden,
                catchers::not_found,
                catchers::unprocessable,
                catchers::internal_error,
            ],
        )
}

#[cfg(test)]
mod tests;
