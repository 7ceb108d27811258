pub mod services;

pub use services::{recipe_image_file_path, upload_recipe_image, UploadItem};
