use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::repo_types::{NewRecipe, Recipe, RecipeFields, RecipeRow};
use crate::error::AppError;

const RECIPE_COLUMNS: &str =
    "id, user_id, title, time_minutes, price, link, description, image";

/// Prices are stored with exactly two decimal places.
pub fn price_text(price: Decimal) -> String {
    let mut p = price;
    p.rescale(2);
    p.to_string()
}

fn into_recipe(row: RecipeRow) -> Result<Recipe, AppError> {
    Ok(Recipe::try_from(row)?)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    owner: i64,
    new: &NewRecipe,
) -> Result<Recipe, AppError> {
    let sql = format!(
        "INSERT INTO recipes (user_id, title, time_minutes, price, link, description) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {RECIPE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(owner)
        .bind(&new.title)
        .bind(new.time_minutes)
        .bind(price_text(new.price))
        .bind(&new.link)
        .bind(&new.description)
        .fetch_one(&mut *conn)
        .await?;
    into_recipe(row)
}

/// Caller's recipes, most recent first.
pub async fn list_for_owner(db: &SqlitePool, owner: i64) -> Result<Vec<Recipe>, AppError> {
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = ? ORDER BY id DESC");
    sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(owner)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(into_recipe)
        .collect()
}

/// A recipe owned by someone else is reported exactly like a missing one.
pub async fn find<'e, E>(executor: E, owner: i64, id: i64) -> Result<Recipe, AppError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ? AND user_id = ?");
    let row = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(id)
        .bind(owner)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)?;
    into_recipe(row)
}

pub async fn update_fields(
    conn: &mut SqliteConnection,
    owner: i64,
    id: i64,
    fields: &RecipeFields,
) -> Result<Recipe, AppError> {
    let sql = format!(
        "UPDATE recipes SET \
             title = COALESCE(?, title), \
             time_minutes = COALESCE(?, time_minutes), \
             price = COALESCE(?, price), \
             link = COALESCE(?, link), \
             description = COALESCE(?, description) \
         WHERE id = ? AND user_id = ? RETURNING {RECIPE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(fields.title.as_deref())
        .bind(fields.time_minutes)
        .bind(fields.price.map(price_text))
        .bind(fields.link.as_deref())
        .bind(fields.description.as_deref())
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound)?;
    into_recipe(row)
}

/// Store a new image path and hand back the one it replaced.
pub async fn set_image(
    db: &SqlitePool,
    owner: i64,
    id: i64,
    image: &str,
) -> Result<Option<String>, AppError> {
    let mut tx = db.begin().await?;
    let previous: Option<Option<String>> =
        sqlx::query_scalar("SELECT image FROM recipes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(previous) = previous else {
        return Err(AppError::NotFound);
    };

    sqlx::query("UPDATE recipes SET image = ? WHERE id = ? AND user_id = ?")
        .bind(image)
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(previous)
}

/// Delete the recipe (links cascade) and return its image path, if any.
pub async fn delete(db: &SqlitePool, owner: i64, id: i64) -> Result<Option<String>, AppError> {
    let image: Option<Option<String>> =
        sqlx::query_scalar("DELETE FROM recipes WHERE id = ? AND user_id = ? RETURNING image")
            .bind(id)
            .bind(owner)
            .fetch_optional(db)
            .await?;
    image.ok_or(AppError::NotFound)
}
