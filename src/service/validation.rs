//! Field-level checks run before any store access.

use crate::error::AppError;
use crate::model::{IntFilter, Page, PokemonFilter, PokemonInput};
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_NAME_LEN: usize = 30;
pub const MAX_URL_LEN: usize = 300;
pub const MAX_ABILITY_NAME_LEN: usize = 30;
pub const MAX_STAT_NAME_LEN: usize = 30;
pub const MAX_TYPE_NAME_LEN: usize = 15;

/// The eighteen elemental types. Matched case-insensitively.
pub const ELEMENTAL_TYPES: [&str; 18] = [
    "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground", "flying", "psychic",
    "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://\S+$").expect("static url pattern"))
}

pub struct PokemonValidator;

impl PokemonValidator {
    /// Validate a create/replace body.
    pub fn validate_input(input: &PokemonInput) -> Result<(), AppError> {
        check_len("name", &input.name, 1, MAX_NAME_LEN)?;
        check_url("image_url", &input.image_url)?;
        check_url("pokemon_url", &input.pokemon_url)?;
        for a in &input.abilities {
            check_len("ability name", &a.name, 1, MAX_ABILITY_NAME_LEN)?;
        }
        for s in &input.stats {
            check_len("stat name", &s.name, 1, MAX_STAT_NAME_LEN)?;
        }
        for t in &input.types {
            check_len("type name", &t.name, 1, MAX_TYPE_NAME_LEN)?;
            let lower = t.name.to_lowercase();
            if !ELEMENTAL_TYPES.contains(&lower.as_str()) {
                return Err(AppError::Validation(format!(
                    "type '{}' is not one of: {}",
                    t.name,
                    ELEMENTAL_TYPES.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn validate_page(page: &Page) -> Result<(), AppError> {
        if page.page < 1 {
            return Err(AppError::Validation("page must be at least 1".into()));
        }
        check_limit(page.limit)
    }

    pub fn validate_skip_limit(limit: u32) -> Result<(), AppError> {
        check_limit(limit)
    }

    pub fn validate_filter(filter: &PokemonFilter) -> Result<(), AppError> {
        check_range("height", filter.height)?;
        check_range("weight", filter.weight)?;
        check_range("xp", filter.xp)?;
        check_range("base_stat", filter.base_stat)?;
        Ok(())
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let n = value.chars().count();
    if n < min {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if n > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn check_url(field: &str, value: &str) -> Result<(), AppError> {
    check_len(field, value, 1, MAX_URL_LEN)?;
    if !url_pattern().is_match(value) {
        return Err(AppError::Validation(format!("{} must be an http(s) URL", field)));
    }
    Ok(())
}

fn check_limit(limit: u32) -> Result<(), AppError> {
    if limit < 1 || limit > Page::MAX_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {}",
            Page::MAX_LIMIT
        )));
    }
    Ok(())
}

fn check_range(field: &str, f: IntFilter) -> Result<(), AppError> {
    if let (Some(min), Some(max)) = (f.min, f.max) {
        if min > max {
            return Err(AppError::Validation(format!(
                "min_{} must not exceed max_{}",
                field, field
            )));
        }
    }
    Ok(())
}
