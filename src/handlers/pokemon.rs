//! Pokemon handlers: decode requests, call the catalog façade, wrap results in the envelope.

use crate::error::AppError;
use crate::model::{CreatedId, HiddenAbilities, Page, Pokemon, PokemonFilter, PokemonInput};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::CatalogService;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

const DEFAULT_SKIP: u32 = 0;

fn parse_id(id_str: &str) -> Result<i32, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", id_str)))
}

fn parse_num<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer, got '{}'", key, raw)))
}

fn parse_int(key: &str, raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer, got '{}'", key, raw)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::BadRequest(format!("{} must be true or false, got '{}'", key, raw))),
    }
}

/// Comma-separated values, blanks dropped.
fn push_names(dst: &mut Vec<String>, raw: &str) {
    dst.extend(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
    );
}

fn int_slot<'a>(f: &'a mut PokemonFilter, key: &str) -> Option<&'a mut Option<i32>> {
    Some(match key {
        "height" => &mut f.height.exact,
        "min_height" => &mut f.height.min,
        "max_height" => &mut f.height.max,
        "weight" => &mut f.weight.exact,
        "min_weight" => &mut f.weight.min,
        "max_weight" => &mut f.weight.max,
        "xp" => &mut f.xp.exact,
        "min_xp" => &mut f.xp.min,
        "max_xp" => &mut f.xp.max,
        "base_stat" => &mut f.base_stat.exact,
        "min_base_stat" => &mut f.base_stat.min,
        "max_base_stat" => &mut f.base_stat.max,
        _ => return None,
    })
}

/// Page and filters from raw query pairs. Set filters repeat (`types=a&types=b`), accept a `[]`
/// suffix and comma-separated values. Unknown keys are ignored.
pub fn parse_list_query(pairs: Vec<(String, String)>) -> Result<(Page, PokemonFilter), AppError> {
    let mut page = Page::default();
    let mut filter = PokemonFilter::default();
    for (k, v) in pairs {
        let key = k.strip_suffix("[]").unwrap_or(&k);
        match key {
            "page" => page.page = parse_num(key, &v)?,
            "limit" => page.limit = parse_num(key, &v)?,
            "name" => filter.name = Some(v),
            "abilities" => push_names(&mut filter.abilities, &v),
            "stats" => push_names(&mut filter.stats, &v),
            "types" => push_names(&mut filter.types, &v),
            "is_hidden" => filter.is_hidden = Some(parse_bool(key, &v)?),
            _ => {
                if let Some(slot) = int_slot(&mut filter, key) {
                    *slot = Some(parse_int(key, &v)?);
                }
            }
        }
    }
    Ok((page, filter))
}

fn input_from_body(body: Value) -> Result<PokemonInput, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(format!("invalid pokemon body: {}", e)))
}

#[utoipa::path(
    get,
    path = "/v1/pokemon/id/{id}",
    tag = "pokemon",
    params(("id" = i32, Path, description = "Pokemon id")),
    responses(
        (status = 200, description = "Pokemon in `data`", body = Pokemon),
        (status = 404, description = "No Pokemon with this id")
    )
)]
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let pokemon = CatalogService::get_by_id(&state.pool, id).await?;
    Ok(success_one_ok(pokemon))
}

#[utoipa::path(
    get,
    path = "/v1/pokemon/name/{name}",
    tag = "pokemon",
    params(("name" = String, Path, description = "Exact, case-sensitive name")),
    responses(
        (status = 200, description = "Pokemon in `data`", body = Pokemon),
        (status = 404, description = "No Pokemon with this name")
    )
)]
pub async fn get_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let pokemon = CatalogService::get_by_name(&state.pool, &name).await?;
    Ok(success_one_ok(pokemon))
}

#[utoipa::path(
    get,
    path = "/v1/pokemon",
    tag = "pokemon",
    params(
        ("page" = Option<u32>, Query, description = "One-based page, default 1"),
        ("limit" = Option<u32>, Query, description = "Rows per page, default 20, max 1000"),
        ("name" = Option<String>, Query, description = "Exact name"),
        ("height" = Option<i32>, Query, description = "Exact height; also min_height / max_height"),
        ("weight" = Option<i32>, Query, description = "Exact weight; also min_weight / max_weight"),
        ("xp" = Option<i32>, Query, description = "Exact xp; also min_xp / max_xp"),
        ("base_stat" = Option<i32>, Query, description = "Any stat equal; also min_base_stat / max_base_stat"),
        ("abilities" = Option<Vec<String>>, Query, description = "Any ability named in the set"),
        ("stats" = Option<Vec<String>>, Query, description = "Any stat named in the set"),
        ("types" = Option<Vec<String>>, Query, description = "Any type named in the set"),
        ("is_hidden" = Option<bool>, Query, description = "Any ability with this hidden flag")
    ),
    responses(
        (status = 200, description = "Page of Pokemon in `data`", body = [Pokemon]),
        (status = 422, description = "Invalid page, limit or range")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let (page, filter) = parse_list_query(pairs)?;
    let rows = CatalogService::list(&state.pool, page, &filter).await?;
    Ok(success_many(rows))
}

#[utoipa::path(
    get,
    path = "/v1/pokemon/hidden_abilities",
    tag = "pokemon",
    params(
        ("skip" = Option<u32>, Query, description = "Rows to skip, default 0"),
        ("limit" = Option<u32>, Query, description = "Rows to return, default 20, max 1000")
    ),
    responses((status = 200, description = "Pokemon with their hidden abilities in `data`", body = [HiddenAbilities]))
)]
pub async fn hidden_abilities(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let skip = match params.get("skip") {
        Some(v) => parse_num("skip", v)?,
        None => DEFAULT_SKIP,
    };
    let limit = match params.get("limit") {
        Some(v) => parse_num("limit", v)?,
        None => Page::DEFAULT_LIMIT,
    };
    let rows = CatalogService::list_hidden_abilities(&state.pool, skip, limit).await?;
    Ok(success_many(rows))
}

#[utoipa::path(
    post,
    path = "/v1/pokemon",
    tag = "pokemon",
    request_body = PokemonInput,
    responses(
        (status = 201, description = "New id in `data`", body = CreatedId),
        (status = 409, description = "Name already exists"),
        (status = 422, description = "Invalid field")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let input = input_from_body(body)?;
    let id = CatalogService::create(&state.pool, &input).await?;
    Ok(success_one(CreatedId { id }))
}

#[utoipa::path(
    put,
    path = "/v1/pokemon/id/{id}",
    tag = "pokemon",
    params(("id" = i32, Path, description = "Pokemon id")),
    request_body = PokemonInput,
    responses(
        (status = 200, description = "Replaced id in `data`", body = CreatedId),
        (status = 404, description = "No Pokemon with this id"),
        (status = 409, description = "Name belongs to another Pokemon"),
        (status = 422, description = "Invalid field")
    )
)]
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let input = input_from_body(body)?;
    CatalogService::replace(&state.pool, id, &input).await?;
    Ok(success_one_ok(CreatedId { id }))
}

#[utoipa::path(
    delete,
    path = "/v1/pokemon/id/{id}",
    tag = "pokemon",
    params(("id" = i32, Path, description = "Pokemon id")),
    responses(
        (status = 200, description = "Deleted id in `data`", body = CreatedId),
        (status = 404, description = "No Pokemon with this id")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    CatalogService::delete(&state.pool, id).await?;
    Ok(success_one_ok(CreatedId { id }))
}
