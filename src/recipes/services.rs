use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::{
    dto::{RecipeDetail, RecipeSummary},
    repo,
    repo_types::{NewRecipe, Recipe, RecipeChanges},
};
use crate::{
    catalog::{reconcile, repo as catalog_repo, Ingredients, Tags},
    error::AppError,
    storage::StorageClient,
};

async fn load_detail(conn: &mut SqliteConnection, recipe: Recipe) -> Result<RecipeDetail, AppError> {
    let tags = catalog_repo::for_recipe::<Tags, _>(&mut *conn, recipe.id).await?;
    let ingredients = catalog_repo::for_recipe::<Ingredients, _>(&mut *conn, recipe.id).await?;
    Ok(RecipeDetail::new(recipe, tags, ingredients))
}

pub async fn list_recipes(db: &SqlitePool, owner: i64) -> Result<Vec<RecipeSummary>, AppError> {
    let recipes = repo::list_for_owner(db, owner).await?;
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let mut tags = catalog_repo::for_recipes::<Tags>(db, &ids).await?;
    let mut ingredients = catalog_repo::for_recipes::<Ingredients>(db, &ids).await?;

    Ok(recipes
        .iter()
        .map(|r| {
            RecipeSummary::new(
                r,
                tags.remove(&r.id).unwrap_or_default(),
                ingredients.remove(&r.id).unwrap_or_default(),
            )
        })
        .collect())
}

pub async fn get_recipe(db: &SqlitePool, owner: i64, id: i64) -> Result<RecipeDetail, AppError> {
    let mut conn = db.acquire().await?;
    let recipe = repo::find(&mut *conn, owner, id).await?;
    load_detail(&mut conn, recipe).await
}

/// Insert the recipe and attach its catalog entries in one transaction.
pub async fn create_recipe(
    db: &SqlitePool,
    owner: i64,
    new: NewRecipe,
    tag_names: Vec<String>,
    ingredient_names: Vec<String>,
) -> Result<RecipeDetail, AppError> {
    let mut tx = db.begin().await?;
    let recipe = repo::insert(&mut tx, owner, &new).await?;
    let tags = reconcile::attach::<Tags>(&mut tx, owner, recipe.id, &tag_names).await?;
    let ingredients =
        reconcile::attach::<Ingredients>(&mut tx, owner, recipe.id, &ingredient_names).await?;
    tx.commit().await?;

    let detail = RecipeDetail::new(recipe, tags, ingredients);
    info!(user_id = owner, recipe_id = detail.summary.id, "recipe created");
    Ok(detail)
}

/// Associations first (per-field replace rule), then scalar fields, all in
/// one transaction.
pub async fn update_recipe(
    db: &SqlitePool,
    owner: i64,
    id: i64,
    changes: RecipeChanges,
) -> Result<RecipeDetail, AppError> {
    let mut tx = db.begin().await?;
    repo::find(&mut *tx, owner, id).await?;

    let tags = reconcile::replace::<Tags>(&mut tx, owner, id, changes.tags.as_deref()).await?;
    let ingredients =
        reconcile::replace::<Ingredients>(&mut tx, owner, id, changes.ingredients.as_deref())
            .await?;
    let recipe = repo::update_fields(&mut tx, owner, id, &changes.fields).await?;
    let tags = match tags {
        Some(tags) => tags,
        None => catalog_repo::for_recipe::<Tags, _>(&mut *tx, id).await?,
    };
    let ingredients = match ingredients {
        Some(ingredients) => ingredients,
        None => catalog_repo::for_recipe::<Ingredients, _>(&mut *tx, id).await?,
    };
    tx.commit().await?;

    let detail = RecipeDetail::new(recipe, tags, ingredients);
    info!(
        user_id = owner,
        recipe_id = id,
        tags_replaced = changes.tags.is_some(),
        ingredients_replaced = changes.ingredients.is_some(),
        "recipe updated"
    );
    Ok(detail)
}

pub async fn delete_recipe(
    db: &SqlitePool,
    storage: &dyn StorageClient,
    owner: i64,
    id: i64,
) -> Result<(), AppError> {
    let image = repo::delete(db, owner, id).await?;
    if let Some(key) = image {
        // The row is gone already; a leftover file is only logged.
        if let Err(e) = storage.delete_object(&key).await {
            warn!(error = %e, %key, "failed to remove image of deleted recipe");
        } else {
            debug!(%key, "recipe image removed");
        }
    }
    info!(user_id = owner, recipe_id = id, "recipe deleted");
    Ok(())
}
