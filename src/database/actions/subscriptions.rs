use std::collections::HashMap;

use crate::{
    constants::SUBSCRIPTION_COUNT_PER_PAGE,
    error::{ApiError, Error, QueryError},
    pagination::PageContext,
    schema::{AuthorRow, RecipeSummary, SubscriptionAuthor, Uuid},
};

use sqlx::{Pool, Postgres};

use super::get_user_by_id;

#[derive(sqlx::FromRow)]
struct AuthorRecipeRow {
    author_id: Uuid,
    id: Uuid,
    name: String,
    image: String,
    cooking_time: i32,
}

/// Subscribes the user to an author. Self-subscription is rejected outright;
/// a duplicate pair surfaces as a conflict through the store's uniqueness
/// guarantee.
pub async fn subscribe(user_id: Uuid, author_id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    if user_id == author_id {
        return Err(ApiError::InvalidRequest.new("You cannot subscribe to yourself"));
    }

    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(ApiError::NotFound.new("No author exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict.new("You are already subscribed to this author"));
    }

    Ok(())
}

pub async fn unsubscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound.new("You were not subscribed to this author"));
    }

    Ok(())
}

pub async fn is_subscribed(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = $2",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

/// Lists the user's subscribed authors with their recipe counts and a recipe
/// preview, optionally capped to `recipes_limit` per author.
pub async fn fetch_subscriptions(
    user_id: Uuid,
    offset: i64,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionAuthor>, Error> {
    let authors: Vec<AuthorRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if authors.is_empty() {
        return Ok(PageContext::no_rows());
    }

    let total_count = authors.get(0).map(|a| a.count).unwrap_or(0);
    let author_ids: Vec<Uuid> = authors.iter().map(|a| a.id).collect();

    let recipes: Vec<AuthorRecipeRow> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time
        FROM recipes
        WHERE author_id = ANY($1)
        ORDER BY pub_date DESC
    ",
    )
    .bind(&author_ids)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let mut by_author: HashMap<Uuid, Vec<RecipeSummary>> = HashMap::new();
    recipes.into_iter().for_each(|row| {
        by_author.entry(row.author_id).or_default().push(RecipeSummary {
            id: row.id,
            name: row.name,
            image: row.image,
            cooking_time: row.cooking_time,
        });
    });

    let rows: Vec<SubscriptionAuthor> = authors
        .into_iter()
        .map(|author| {
            let recipes = by_author.remove(&author.id).unwrap_or_default();
            let recipes_count = recipes.len() as i64;
            let recipes = match recipes_limit {
                Some(limit) => recipes.into_iter().take(limit.max(0) as usize).collect(),
                None => recipes,
            };

            SubscriptionAuthor {
                id: author.id,
                email: author.email,
                username: author.username,
                first_name: author.first_name,
                last_name: author.last_name,
                is_subscribed: true,
                recipes,
                recipes_count,
            }
        })
        .collect();

    Ok(PageContext::from_rows(
        rows,
        total_count,
        SUBSCRIPTION_COUNT_PER_PAGE,
        offset,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn self_subscription_is_rejected_before_any_query() {
        // Lazy pool never connects; the guard must fire first.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@localhost:1/none")
            .unwrap();

        let err = subscribe(5, 5, &pool).await.unwrap_err();
        assert_eq!(err.code, 400);
        assert_eq!(
            err.info.as_deref(),
            Some("You cannot subscribe to yourself")
        );
    }
}
