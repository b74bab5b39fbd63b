//! Pokemon routes under `/v1`, and the OpenAPI document describing them.

use crate::handlers::pokemon::{
    create, delete as delete_handler, get_by_id, get_by_name, hidden_abilities, list, replace,
};
use crate::model::{Ability, CreatedId, HiddenAbilities, Pokemon, PokemonInput, PokemonType, Stat};
use crate::state::AppState;
use axum::{routing::get, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::pokemon::get_by_id,
        crate::handlers::pokemon::get_by_name,
        crate::handlers::pokemon::list,
        crate::handlers::pokemon::hidden_abilities,
        crate::handlers::pokemon::create,
        crate::handlers::pokemon::replace,
        crate::handlers::pokemon::delete,
    ),
    components(schemas(Pokemon, PokemonInput, Ability, Stat, PokemonType, HiddenAbilities, CreatedId)),
    tags((name = "pokemon", description = "Pokemon catalog"))
)]
pub struct ApiDoc;

pub fn pokemon_routes(state: AppState) -> Router {
    Router::new()
        .route("/pokemon", get(list).post(create))
        .route("/pokemon/hidden_abilities", get(hidden_abilities))
        .route("/pokemon/name/:name", get(get_by_name))
        .route(
            "/pokemon/id/:id",
            get(get_by_id).put(replace).delete(delete_handler),
        )
        .with_state(state)
}
