use std::{fmt, str::FromStr};

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Row as stored; price is kept as decimal text.
#[derive(Debug, Clone, FromRow)]
pub(super) struct RecipeRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: String,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = anyhow::Error;

    fn try_from(r: RecipeRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&r.price)
            .with_context(|| format!("recipe {} has unreadable price {:?}", r.id, r.price))?;
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            time_minutes: r.time_minutes,
            price,
            link: r.link,
            description: r.description,
            image: r.image,
        })
    }
}

/// Scalar columns of a recipe being created.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub description: String,
}

/// Scalar columns to overwrite on update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct RecipeFields {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub description: Option<String>,
}

/// Full update: scalars plus optional association replacement per catalog.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub fields: RecipeFields,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}
