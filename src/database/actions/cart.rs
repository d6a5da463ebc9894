use crate::{
    error::{ApiError, Error, QueryError},
    schema::{RecipeSummary, Uuid},
};

use sqlx::{Pool, Postgres};

use super::favorites::get_recipe_summary;

pub async fn is_in_cart(id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, Error> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM cart WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

/// Adds a recipe to the user's shopping cart; the (user, recipe) pair is
/// unique, so a repeated add surfaces as a conflict rather than a duplicate.
pub async fn add_to_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, Error> {
    let summary = get_recipe_summary(id, pool).await?;

    let result =
        sqlx::query("INSERT INTO cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict.new("Recipe is already in the shopping cart"));
    }

    Ok(summary)
}

pub async fn remove_from_cart(id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound.new("Recipe is not in the shopping cart"));
    }

    Ok(())
}
