use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    constants::INGREDIENT_SEARCH_LIMIT,
    error::{ApiError, Error, QueryError},
    schema::{Ingredient, Uuid},
};

use sqlx::{Pool, Postgres};

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Uuid, Error> {
    session.authenticate(ActionType::ManageIngredients)?;

    if name.trim().is_empty() || measurement_unit.trim().is_empty() {
        return Err(ApiError::InvalidRequest.new("Ingredient name and unit cannot be empty"));
    }

    let id: (Uuid,) = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(id.0)
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, Error> {
    let list: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Name-prefix search backing the ingredient picker in the authoring form.
pub async fn search_ingredients(
    search: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let pattern = format!("{}%", search.replace('%', "\\%").replace('_', "\\_"));

    let list: Vec<Ingredient> = sqlx::query_as(
        "SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name LIMIT $2",
    )
    .bind(pattern)
    .bind(INGREDIENT_SEARCH_LIMIT)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}
