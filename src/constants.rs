pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 10;
pub const INGREDIENT_SEARCH_LIMIT: i64 = 50;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_NAME_LENGTH: usize = 200;
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const DEFAULT_TAG_COLOR: &str = "#FF0000";

pub const RECIPE_ORDERS: &[(&str, &str)] = &[
    ("newest", "Newest first"),
    ("oldest", "Oldest first"),
    ("alphabetical", "Alphabetical"),
];

pub const RECIPE_SCOPES: &[(&str, &str)] = &[
    ("all", "All recipes"),
    ("favorited", "My favorites"),
    ("in_cart", "In my shopping cart"),
];
