use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Error, TypeError};
use super::form::{Form, FormData};

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "user" => Ok(Self::User),
                "admin" => Ok(Self::Admin),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, PartialOrd, Serialize, Eq, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecipeOrder {
    Newest,
    Oldest,
    Alphabetical,
}

impl TryFrom<Value> for RecipeOrder {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "newest" => Ok(Self::Newest),
                "oldest" => Ok(Self::Oldest),
                "alphabetical" => Ok(Self::Alphabetical),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

/// Listing scope relative to the session user.
#[derive(Clone, Debug, PartialEq, PartialOrd, Serialize, Eq, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecipeScope {
    All,
    Favorited,
    InCart,
}

impl TryFrom<Value> for RecipeScope {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "all" => Ok(Self::All),
                "favorited" => Ok(Self::Favorited),
                "in_cart" => Ok(Self::InCart),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

/// Public user representation; `is_subscribed` is relative to the session
/// user and false for anonymous readers.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,

    pub count: i64,
}

/// Minimal representation returned by the favorite/cart toggles.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredientRow {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

/// Candidate payload for recipe creation and update. Tags and ingredients are
/// referenced by id; `image` is either a base64 data URI (new upload) or an
/// already-stored media path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeDraft {
    pub fn from_form(data: FormData) -> Result<Self, Error> {
        let form = Form::from_data(data);

        Ok(Self {
            name: form.get_str("name")?,
            image: form.get_str("image")?,
            text: form.get_str("text")?,
            cooking_time: form.get_number("cooking_time")?,
            tags: form.get_list("tags")?,
            ingredients: form.get_list("ingredients")?,
        })
    }
}

/// Fully hydrated recipe representation returned after create/update and by
/// the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct HydratedRecipe {
    pub id: Uuid,
    pub author: UserProfile,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

/// One (recipe, ingredient) occurrence from the session user's cart.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CartPart {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct AuthorRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,

    pub count: i64,
}

/// Subscription listing entry: the author's profile plus a capped recipe
/// preview and the full recipe count.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionAuthor {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recipe_order_from_value() {
        assert_eq!(
            RecipeOrder::try_from(json!("newest")).unwrap(),
            RecipeOrder::Newest
        );
        assert!(RecipeOrder::try_from(json!("sideways")).is_err());
        assert!(RecipeOrder::try_from(json!(42)).is_err());
    }

    #[test]
    fn recipe_scope_from_value() {
        assert_eq!(
            RecipeScope::try_from(json!("in_cart")).unwrap(),
            RecipeScope::InCart
        );
        assert!(RecipeScope::try_from(json!("")).is_err());
    }

    #[test]
    fn draft_from_form() {
        let mut data = FormData::new();
        data.insert("name".into(), json!("Pancakes"));
        data.insert("image".into(), json!("recipes/abc.png"));
        data.insert("text".into(), json!("Mix and fry."));
        data.insert("cooking_time".into(), json!("20"));
        data.insert("tags".into(), json!([1, 2]));
        data.insert(
            "ingredients".into(),
            json!([{ "id": 3, "amount": 100 }, { "id": 4, "amount": 2 }]),
        );

        let draft = RecipeDraft::from_form(data).unwrap();
        assert_eq!(draft.name, "Pancakes");
        assert_eq!(draft.cooking_time, 20);
        assert_eq!(draft.tags, vec![1, 2]);
        assert_eq!(draft.ingredients[0], IngredientAmount { id: 3, amount: 100 });
    }

    #[test]
    fn draft_from_form_missing_key() {
        let mut data = FormData::new();
        data.insert("name".into(), json!("Pancakes"));

        assert!(RecipeDraft::from_form(data).is_err());
    }
}
