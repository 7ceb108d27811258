use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::repo_types::{NewRecipe, Recipe, RecipeChanges, RecipeFields};
use crate::{
    catalog::CatalogEntry,
    error::{AppError, FieldErrors},
    validation,
};

const MAX_TEXT_LEN: usize = 255;
const MAX_NAME_LEN: usize = 255;
const PRICE_MAX_DIGITS: u32 = 5;
const PRICE_DECIMAL_PLACES: u32 = 2;

#[derive(Debug, Clone, Deserialize)]
pub struct NamePayload {
    pub name: String,
}

/// Body of POST, PUT and PATCH on recipes. Absent fields stay `None`; any
/// `user`/`id` keys the client sends are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<NamePayload>>,
    pub ingredients: Option<Vec<NamePayload>>,
}

fn check_price(errors: &mut FieldErrors, price: Decimal) {
    let normalized = price.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
        );
        return;
    }
    let max_whole = Decimal::from(10i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if normalized.abs() >= max_whole {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."),
        );
    }
}

fn check_names(errors: &mut FieldErrors, field: &str, items: &[NamePayload]) -> Vec<String> {
    let mut names = Vec::with_capacity(items.len());
    for item in items {
        let name = item.name.trim();
        if name.is_empty() {
            errors.add(field, "Tag and ingredient names may not be blank.");
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.add(
                field,
                format!("Names may not be longer than {MAX_NAME_LEN} characters."),
            );
        } else {
            names.push(name.to_string());
        }
    }
    names
}

impl RecipePayload {
    fn check_present(&self, errors: &mut FieldErrors) -> (Option<Vec<String>>, Option<Vec<String>>) {
        if let Some(title) = &self.title {
            validation::text(errors, "title", title, MAX_TEXT_LEN, false);
        }
        if let Some(minutes) = self.time_minutes {
            if minutes < 0 {
                errors.add("time_minutes", "Ensure this value is greater than or equal to 0.");
            }
        }
        if let Some(price) = self.price {
            check_price(errors, price);
        }
        if let Some(link) = &self.link {
            validation::text(errors, "link", link, MAX_TEXT_LEN, true);
        }
        let tags = self.tags.as_deref().map(|t| check_names(errors, "tags", t));
        let ingredients = self
            .ingredients
            .as_deref()
            .map(|i| check_names(errors, "ingredients", i));
        (tags, ingredients)
    }

    fn check_required(&self, errors: &mut FieldErrors) {
        validation::required(errors, "title", self.title.as_ref());
        validation::required(errors, "time_minutes", self.time_minutes);
        validation::required(errors, "price", self.price);
    }

    /// POST: scalars plus the tag and ingredient names (empty when absent).
    pub fn into_new(self) -> Result<(NewRecipe, Vec<String>, Vec<String>), AppError> {
        let mut errors = FieldErrors::new();
        self.check_required(&mut errors);
        let (tags, ingredients) = self.check_present(&mut errors);
        errors.into_result()?;

        let new = NewRecipe {
            title: self.title.unwrap_or_default(),
            time_minutes: self.time_minutes.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        };
        Ok((new, tags.unwrap_or_default(), ingredients.unwrap_or_default()))
    }

    /// PUT (`partial == false`) still requires the scalar fields; tags and
    /// ingredients are optional for both verbs.
    pub fn into_changes(self, partial: bool) -> Result<RecipeChanges, AppError> {
        let mut errors = FieldErrors::new();
        if !partial {
            self.check_required(&mut errors);
        }
        let (tags, ingredients) = self.check_present(&mut errors);
        errors.into_result()?;

        Ok(RecipeChanges {
            fields: RecipeFields {
                title: self.title,
                time_minutes: self.time_minutes,
                price: self.price,
                link: self.link,
                description: self.description,
            },
            tags,
            ingredients,
        })
    }
}

/// List shape: no description, no image.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    #[serde(serialize_with = "serialize_price")]
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<CatalogEntry>,
    pub ingredients: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeImage {
    pub id: i64,
    pub image: Option<String>,
}

fn serialize_price<S: serde::Serializer>(price: &Decimal, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&super::repo::price_text(*price))
}

impl RecipeSummary {
    pub fn new(recipe: &Recipe, tags: Vec<CatalogEntry>, ingredients: Vec<CatalogEntry>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            tags,
            ingredients,
        }
    }
}

impl RecipeDetail {
    pub fn new(recipe: Recipe, tags: Vec<CatalogEntry>, ingredients: Vec<CatalogEntry>) -> Self {
        let summary = RecipeSummary::new(&recipe, tags, ingredients);
        Self {
            summary,
            description: recipe.description,
            image: recipe.image,
        }
    }
}
