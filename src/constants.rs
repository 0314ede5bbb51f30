pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const COOKING_TIME_MIN: i32 = 1;
pub const COOKING_TIME_MAX: i32 = 1440;

pub const AMOUNT_MIN: i32 = 1;
pub const AMOUNT_MAX: i32 = 1000;

/// One bulk insert binds three values per ingredient and two per tag,
/// and Postgres accepts at most 65535 binds per statement.
pub const MAX_RECIPE_INGREDIENTS: usize = 65535 / 3;
pub const MAX_RECIPE_TAGS: usize = 65535 / 2;

pub const NAME_MAX_LENGTH: usize = 200;
pub const USER_FIELD_MAX_LENGTH: usize = 150;

pub const SHOPPING_LIST_FILE_NAME: &str = "foodgram_shopping_cart.txt";

pub const RECIPE_IMAGE_DIR: &str = "recipes/images";

/// Base64 images travel inside the JSON body.
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;
