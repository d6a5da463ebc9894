use foodgram_sdk::{
    actions::{aggregate_totals, validate_recipe_draft},
    schema::{CartPart, IngredientAmount, RecipeDraft},
    ShoppingListDocument,
};

fn draft() -> RecipeDraft {
    RecipeDraft {
        name: "Borscht".into(),
        image: "recipes/borscht.png".into(),
        text: "Simmer everything.".into(),
        cooking_time: 90,
        tags: vec![1, 2],
        ingredients: vec![
            IngredientAmount { id: 10, amount: 300 },
            IngredientAmount { id: 11, amount: 2 },
        ],
    }
}

#[test]
fn a_complete_draft_passes() {
    assert!(validate_recipe_draft(&draft()).is_ok());
}

#[test]
fn drafts_without_composition_are_rejected() {
    let mut empty_tags = draft();
    empty_tags.tags.clear();
    assert_eq!(validate_recipe_draft(&empty_tags).unwrap_err().code, 400);

    let mut empty_ingredients = draft();
    empty_ingredients.ingredients.clear();
    assert_eq!(
        validate_recipe_draft(&empty_ingredients).unwrap_err().code,
        400
    );
}

#[test]
fn amounts_and_cooking_time_hold_their_minimums() {
    let mut zero_amount = draft();
    zero_amount.ingredients[0].amount = 0;
    assert!(validate_recipe_draft(&zero_amount).is_err());

    let mut instant = draft();
    instant.cooking_time = 0;
    assert!(validate_recipe_draft(&instant).is_err());

    let mut one_minute = draft();
    one_minute.cooking_time = 1;
    assert!(validate_recipe_draft(&one_minute).is_ok());
}

#[test]
fn repeated_ingredient_ids_are_rejected() {
    let mut doubled = draft();
    doubled.ingredients.push(IngredientAmount { id: 10, amount: 1 });

    let err = validate_recipe_draft(&doubled).unwrap_err();
    assert!(err.info.unwrap().contains("10"));
}

#[test]
fn shopping_list_merges_shared_ingredients_into_one_line() {
    let parts = vec![
        CartPart {
            name: "flour".into(),
            measurement_unit: "g".into(),
            amount: 100,
        },
        CartPart {
            name: "flour".into(),
            measurement_unit: "g".into(),
            amount: 50,
        },
    ];

    let rows = aggregate_totals(parts);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total, 150);

    let doc = ShoppingListDocument::render(&rows);
    assert!(doc.as_str().contains("flour (g): 150"));
}

#[test]
fn empty_cart_produces_a_document_without_lines() {
    let rows = aggregate_totals(vec![]);
    let doc = ShoppingListDocument::render(&rows);

    assert!(!doc.as_str().contains(": "));
    assert_eq!(doc.content_type(), "text/plain; charset=utf-8");
}
