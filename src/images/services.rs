use std::path::Path;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    recipes::{repo, Recipe},
    state::AppState,
};

pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

pub struct UploadItem {
    pub filename: String,
    pub body: Bytes,
    pub content_type: String,
}

/// Storage key for a recipe image: a random name under [`RECIPE_IMAGE_DIR`]
/// that keeps only the original extension.
pub fn recipe_image_file_path(_recipe: &Recipe, original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{RECIPE_IMAGE_DIR}/{}{ext}", Uuid::new_v4())
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Store the upload and point the recipe at it; the replaced file is removed.
pub async fn upload_recipe_image(
    st: &AppState,
    owner: i64,
    recipe_id: i64,
    upload: UploadItem,
) -> Result<Recipe, AppError> {
    if !upload.content_type.starts_with("image/") || upload.body.is_empty() {
        return Err(AppError::field(
            "image",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        ));
    }

    let recipe = repo::find(&st.db, owner, recipe_id).await?;

    // Fall back to the MIME type when the client name has no usable extension.
    let mut key = recipe_image_file_path(&recipe, &upload.filename);
    if Path::new(&key).extension().is_none() {
        if let Some(ext) = ext_from_mime(&upload.content_type) {
            key = format!("{key}.{ext}");
        }
    }

    st.storage
        .put_object(&key, upload.body, &upload.content_type)
        .await?;

    let previous = match repo::set_image(&st.db, owner, recipe_id, &key).await {
        Ok(previous) => previous,
        Err(e) => {
            if let Err(cleanup) = st.storage.delete_object(&key).await {
                warn!(error = %cleanup, %key, "failed to remove orphaned upload");
            }
            return Err(e);
        }
    };

    if let Some(old) = previous.filter(|old| *old != key) {
        if let Err(e) = st.storage.delete_object(&old).await {
            warn!(error = %e, key = %old, "failed to remove replaced recipe image");
        }
    }

    info!(user_id = owner, recipe_id, %key, "recipe image stored");
    Ok(Recipe {
        image: Some(key),
        ..recipe
    })
}
