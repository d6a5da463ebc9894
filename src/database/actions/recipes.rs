use std::collections::HashSet;

use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    constants::{MAX_NAME_LENGTH, MIN_COOKING_TIME, MIN_INGREDIENT_AMOUNT, RECIPE_COUNT_PER_PAGE},
    error::{ApiError, Error, QueryError},
    pagination::PageContext,
    schema::{
        HydratedRecipe, Recipe, RecipeDraft, RecipeIngredientRow, RecipeOrder, RecipeRow,
        RecipeScope, Uuid,
    },
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use super::{get_user_profile, is_favorite, is_in_cart, list_recipe_tags};

/// Checks a candidate payload against the authoring rules. Pure; runs before
/// any row is touched.
pub fn validate_recipe_draft(draft: &RecipeDraft) -> Result<(), Error> {
    if draft.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest.new("Recipe name cannot be empty"));
    }
    if draft.name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::InvalidRequest.new("Recipe name is too long"));
    }
    if draft.tags.is_empty() {
        return Err(ApiError::InvalidRequest.new("Recipe requires at least one tag"));
    }
    if draft.ingredients.is_empty() {
        return Err(ApiError::InvalidRequest.new("Recipe requires at least one ingredient"));
    }
    if draft.cooking_time < MIN_COOKING_TIME {
        return Err(ApiError::InvalidRequest.new("Cooking time cannot be less than a minute"));
    }

    if let Some(part) = draft
        .ingredients
        .iter()
        .find(|part| part.amount < MIN_INGREDIENT_AMOUNT)
    {
        return Err(ApiError::InvalidRequest.new(&format!(
            "Ingredient {} amount must be positive",
            part.id
        )));
    }

    let mut seen: HashSet<Uuid> = HashSet::new();
    let duplicates: Vec<String> = draft
        .ingredients
        .iter()
        .filter(|part| !seen.insert(part.id))
        .map(|part| part.id.to_string())
        .collect();

    if !duplicates.is_empty() {
        return Err(ApiError::InvalidRequest.new(&format!(
            "Ingredient {} is already in the list; increase its amount instead of repeating it",
            duplicates.join(", ")
        )));
    }

    let mut seen_tags: HashSet<Uuid> = HashSet::new();
    let duplicate_tags: Vec<String> = draft
        .tags
        .iter()
        .filter(|id| !seen_tags.insert(**id))
        .map(|id| id.to_string())
        .collect();

    if !duplicate_tags.is_empty() {
        return Err(ApiError::InvalidRequest.new(&format!(
            "Tag {} is listed more than once",
            duplicate_tags.join(", ")
        )));
    }

    Ok(())
}

pub async fn fetch_recipes(
    author: Option<Uuid>,
    tag: Option<String>,
    order: Option<RecipeOrder>,
    scope: Option<RecipeScope>,
    offset: i64,
    search: String,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let order = order
        .map(|order| match order {
            RecipeOrder::Newest => "pub_date DESC",
            RecipeOrder::Oldest => "pub_date",
            RecipeOrder::Alphabetical => "name",
        })
        .unwrap_or("pub_date DESC");

    // Scope clauses only embed the session user's integer id.
    let scope = match (scope, session) {
        (Some(RecipeScope::Favorited), Some(session)) => format!(
            "AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = {})",
            session.user_id
        ),
        (Some(RecipeScope::InCart), Some(session)) => format!(
            "AND EXISTS (SELECT 1 FROM cart c WHERE c.recipe_id = r.id AND c.user_id = {})",
            session.user_id
        ),
        _ => String::new(),
    };

    let search = format!("%{}%", search.trim());

    let rows: Vec<RecipeRow> = match (author, tag) {
        (Some(author), Some(tag)) => {
            sqlx::query_as(&format!("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE r.author_id = $1 AND r.name ILIKE $2 AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = $3) {scope} ORDER BY {order} LIMIT $4 OFFSET $5"))
                .bind(author)
                .bind(search)
                .bind(tag)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
        }
        (Some(author), None) => {
            sqlx::query_as(&format!("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE r.author_id = $1 AND r.name ILIKE $2 {scope} ORDER BY {order} LIMIT $3 OFFSET $4"))
                .bind(author)
                .bind(search)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
        }
        (None, Some(tag)) => {
            sqlx::query_as(&format!("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE r.name ILIKE $1 AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = $2) {scope} ORDER BY {order} LIMIT $3 OFFSET $4"))
                .bind(search)
                .bind(tag)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
        }
        (None, None) => {
            sqlx::query_as(&format!("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE r.name ILIKE $1 {scope} ORDER BY {order} LIMIT $2 OFFSET $3"))
                .bind(search)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
        }
    };

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);
    Ok(page)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Fetches a recipe for mutation: the session user must own it or hold
/// `ManageAllRecipes`.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(ApiError::Unauthorized.default())
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(ApiError::NotFound.new("No recipe exists with specified id")),
    }
}

pub async fn list_recipe_ingredients(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<RecipeIngredientRow>, Error> {
    let rows: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT ri.ingredient_id AS ingredient_id, i.name AS name,
            i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Full representation: author profile, tags, quantified ingredients and the
/// session user's favorite/cart flags (false for anonymous readers).
pub async fn get_recipe_hydrated(
    id: Uuid,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<HydratedRecipe, Error> {
    let recipe = match get_recipe(id, pool).await? {
        Some(recipe) => recipe,
        None => return Err(ApiError::NotFound.new("No recipe exists with specified id")),
    };

    let author = match get_user_profile(recipe.author_id, session, pool).await? {
        Some(author) => author,
        None => return Err(ApiError::InternalServerError.new("Recipe author is missing")),
    };

    let tags = list_recipe_tags(pool, recipe.id).await?;
    let ingredients = list_recipe_ingredients(pool, recipe.id).await?;

    let (is_favorited, is_in_shopping_cart) = match session {
        Some(session) => (
            is_favorite(recipe.id, session.user_id, pool).await?,
            is_in_cart(recipe.id, session.user_id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(HydratedRecipe {
        id: recipe.id,
        author,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
    })
}

/// Persists a validated draft: the recipe row, its ingredient amounts and its
/// tag set land in one transaction or not at all.
pub async fn create_recipe(
    draft: RecipeDraft,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Uuid, Error> {
    validate_recipe_draft(&draft)?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    check_references(&draft, &mut tr).await?;

    let recipe: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time, pub_date)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING id
    ",
    )
    .bind(user_id)
    .bind(&draft.name)
    .bind(&draft.image)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let recipe_id = recipe.0;
    insert_composition(recipe_id, &draft, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(recipe_id)
}

/// Applies a validated draft to an existing recipe, replacing the full
/// ingredient and tag sets atomically. The author never changes.
pub async fn update_recipe(
    id: Uuid,
    draft: RecipeDraft,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    validate_recipe_draft(&draft)?;
    let recipe = get_recipe_mut(id, session, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    check_references(&draft, &mut tr).await?;

    sqlx::query("UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5")
        .bind(&draft.name)
        .bind(&draft.image)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    insert_composition(recipe.id, &draft, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}

pub async fn delete_recipe(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe_mut(id, session, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    for query in [
        "DELETE FROM recipe_ingredients WHERE recipe_id = $1",
        "DELETE FROM recipe_tags WHERE recipe_id = $1",
        "DELETE FROM favorites WHERE recipe_id = $1",
        "DELETE FROM cart WHERE recipe_id = $1",
        "DELETE FROM recipes WHERE id = $1",
    ] {
        sqlx::query(query)
            .bind(recipe.id)
            .execute(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}

/// Every referenced tag and ingredient must exist before rows are written;
/// checked inside the surrounding transaction.
async fn check_references(
    draft: &RecipeDraft,
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let tag_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(&draft.tags)
        .fetch_one(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if tag_count.0 != draft.tags.len() as i64 {
        return Err(ApiError::NotFound.new("One or more tags do not exist"));
    }

    let ingredient_ids: Vec<Uuid> = draft.ingredients.iter().map(|part| part.id).collect();
    let ingredient_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
            .bind(&ingredient_ids)
            .fetch_one(&mut **tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    if ingredient_count.0 != ingredient_ids.len() as i64 {
        return Err(ApiError::NotFound.new("One or more ingredients do not exist"));
    }

    Ok(())
}

async fn insert_composition(
    recipe_id: Uuid,
    draft: &RecipeDraft,
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut parts: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    parts.push_values(draft.ingredients.iter(), |mut b, part| {
        b.push_bind(recipe_id).push_bind(part.id).push_bind(part.amount);
    });
    parts
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let mut tags: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    tags.push_values(draft.tags.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(tag_id);
    });
    tags.build()
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IngredientAmount;

    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: "Pancakes".into(),
            image: "recipes/abc.png".into(),
            text: "Mix and fry.".into(),
            cooking_time: 20,
            tags: vec![1],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 100 },
                IngredientAmount { id: 2, amount: 2 },
            ],
        }
    }

    #[test]
    fn accepts_a_well_formed_draft() {
        assert!(validate_recipe_draft(&draft()).is_ok());
    }

    #[test]
    fn rejects_empty_tag_list() {
        let mut d = draft();
        d.tags.clear();
        assert_eq!(validate_recipe_draft(&d).unwrap_err().code, 400);
    }

    #[test]
    fn rejects_empty_ingredient_list() {
        let mut d = draft();
        d.ingredients.clear();
        assert_eq!(validate_recipe_draft(&d).unwrap_err().code, 400);
    }

    #[test]
    fn rejects_non_positive_amounts() {
        for amount in [0, -5] {
            let mut d = draft();
            d.ingredients[0].amount = amount;
            assert!(validate_recipe_draft(&d).is_err(), "accepted amount {amount}");
        }
    }

    #[test]
    fn rejects_duplicate_ingredients() {
        let mut d = draft();
        d.ingredients.push(IngredientAmount { id: 1, amount: 50 });

        let err = validate_recipe_draft(&d).unwrap_err();
        assert_eq!(err.code, 400);
        assert!(err.info.unwrap().contains('1'));
    }

    #[test]
    fn rejects_duplicate_tags() {
        let mut d = draft();
        d.tags.push(1);

        let err = validate_recipe_draft(&d).unwrap_err();
        assert_eq!(err.code, 400);
        assert!(err.info.unwrap().contains('1'));
    }

    #[test]
    fn sub_minute_cooking_time_rejected_one_minute_accepted() {
        let mut d = draft();
        d.cooking_time = 0;
        assert!(validate_recipe_draft(&d).is_err());

        d.cooking_time = 1;
        assert!(validate_recipe_draft(&d).is_ok());
    }

    #[test]
    fn rejects_blank_and_oversized_names() {
        let mut d = draft();
        d.name = "  ".into();
        assert!(validate_recipe_draft(&d).is_err());

        d.name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(validate_recipe_draft(&d).is_err());
    }
}
