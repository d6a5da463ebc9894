use std::collections::HashMap;

use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};

use crate::{
    cache::cache::{invalidate, CacheKeyType, CachedValue},
    error::{Error, QueryError},
    schema::{CartPart, ShoppingListRow, Uuid},
};

/// One row per (carted recipe, ingredient) occurrence. A recipe appears once
/// per cart entry, never more; the cart pair itself is unique.
pub async fn fetch_cart_parts(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartPart>, Error> {
    let rows: Vec<CartPart> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Groups cart occurrences by ingredient and sums their amounts. Output is
/// name-sorted; an empty cart yields an empty list.
pub fn aggregate_totals(parts: Vec<CartPart>) -> Vec<ShoppingListRow> {
    let mut totals: HashMap<(String, String), i64> = HashMap::new();
    parts.into_iter().for_each(|part| {
        *totals
            .entry((part.name, part.measurement_unit))
            .or_insert(0) += part.amount as i64;
    });

    let mut rows: Vec<ShoppingListRow> = totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListRow {
            name,
            measurement_unit,
            total,
        })
        .collect();

    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

pub async fn fetch_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListRow>, Error> {
    let parts = fetch_cart_parts(user_id, pool).await?;
    Ok(aggregate_totals(parts))
}

/// Read-through variant; callers invalidate with
/// [`invalidate_shopping_list`] after mutating the cart or a carted recipe.
pub async fn fetch_shopping_list_cached(
    user_id: Uuid,
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Vec<ShoppingListRow>, Error> {
    let key = CacheKeyType::ShoppingList.new(user_id);
    let pool = pool.clone();

    CachedValue::get_or(key, cache, move || async move {
        fetch_shopping_list(user_id, &pool).await
    })
    .await
}

pub async fn invalidate_shopping_list(
    user_id: Uuid,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    invalidate(CacheKeyType::ShoppingList.new(user_id), cache).await
}
