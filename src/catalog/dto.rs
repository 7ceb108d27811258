use serde::Deserialize;

use crate::{
    error::{AppError, FieldErrors},
    validation,
};

pub const MAX_NAME_LEN: usize = 255;

/// `{"name": ...}` body for both tag and ingredient updates.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogPayload {
    pub name: Option<String>,
}

impl CatalogPayload {
    /// PUT needs a name; PATCH without one is a no-op.
    pub fn into_name(self, partial: bool) -> Result<Option<String>, AppError> {
        let mut errors = FieldErrors::new();
        let name = if partial {
            self.name
        } else {
            validation::required(&mut errors, "name", self.name)
        };
        if let Some(name) = &name {
            validation::text(&mut errors, "name", name, MAX_NAME_LEN, false);
        }
        errors.into_result()?;
        Ok(name)
    }
}
