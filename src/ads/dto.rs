use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use super::repo_types::{Ad, AdListingRow, Category};
use crate::error::FieldErrors;

pub const AD_NAME_MIN: usize = 5;
pub const AD_NAME_MAX: usize = 25;
pub const AD_DESCRIPTION_MIN: usize = 15;
pub const AD_DESCRIPTION_MAX: usize = 250;

/// Prices are stored as `NUMERIC(18, 2)`: two decimal places, below 10^16.
pub const PRICE_SCALE: u32 = 2;
pub const PRICE_LIMIT: Decimal = Decimal::from_parts(1_874_919_424, 2_328_306, 0, false, 0);

/// Listing card shown in the catalog and in the cart.
#[derive(Debug, Clone, Serialize)]
pub struct AdView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub created_on: String,
    pub category: String,
    pub owner: String,
}

impl From<AdListingRow> for AdView {
    fn from(r: AdListingRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            image_url: r.image_url,
            created_on: format_created_on(r.created_at),
            category: r.category,
            owner: r.owner,
        }
    }
}

/// `dd/MM/yyyy H:mm`
pub fn format_created_on(at: OffsetDateTime) -> String {
    let fmt = format_description!("[day]/[month]/[year] [hour padding:none]:[minute]");
    at.format(&fmt).unwrap_or_else(|_| at.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
}

impl From<Category> for CategoryView {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

/// Add/edit form as handed to the presentation layer. `price` and
/// `category_id` carry the raw text so rejected input is shown back as typed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdForm {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: String,
    pub category_id: String,
    pub categories: Vec<CategoryView>,
}

impl AdForm {
    pub fn empty(categories: Vec<Category>) -> Self {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_ad(ad: &Ad, categories: Vec<Category>) -> Self {
        Self {
            name: ad.name.clone(),
            description: ad.description.clone(),
            image_url: ad.image_url.clone(),
            price: ad.price.to_string(),
            category_id: ad.category_id.to_string(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-populates the form with what the user submitted.
    pub fn from_input(input: &AdInput, categories: Vec<Category>) -> Self {
        Self {
            name: input.name.clone(),
            description: input.description.clone(),
            image_url: input.image_url.clone(),
            price: input.price.clone(),
            category_id: input.category_id.clone(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

/// Submitted add/edit form. Every field is taken as text; missing or
/// malformed values are reported by [`AdInput::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdInput {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: String,
    pub category_id: String,
}

/// Input that passed validation, trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAd {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: Decimal,
    pub category_id: i32,
}

impl AdInput {
    pub fn validate(&self, categories: &[Category]) -> Result<ValidAd, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        check_length(&mut errors, "name", "Name", name, AD_NAME_MIN, AD_NAME_MAX, || {
            format!("Ad name must be between {AD_NAME_MIN} and {AD_NAME_MAX} characters.")
        });

        let description = self.description.trim();
        check_length(
            &mut errors,
            "description",
            "Description",
            description,
            AD_DESCRIPTION_MIN,
            AD_DESCRIPTION_MAX,
            || {
                format!(
                    "Description must be between {AD_DESCRIPTION_MIN} and {AD_DESCRIPTION_MAX} characters."
                )
            },
        );

        let image_url = self.image_url.trim();
        if image_url.is_empty() {
            errors.add("image_url", required("Image Url"));
        }

        let price = parse_price(&mut errors, self.price.trim());
        let category_id = parse_category(&mut errors, self.category_id.trim(), categories);

        match (price, category_id) {
            (Some(price), Some(category_id)) if errors.is_empty() => Ok(ValidAd {
                name: name.to_string(),
                description: description.to_string(),
                image_url: image_url.to_string(),
                price,
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

fn required(label: &str) -> String {
    format!("The {label} field is required.")
}

fn parse_price(errors: &mut FieldErrors, raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        errors.add("price", required("Price"));
        return None;
    }
    let Ok(price) = raw.parse::<Decimal>() else {
        errors.add("price", "The Price field must be a number.");
        return None;
    };
    if price < Decimal::ZERO {
        errors.add("price", "Price cannot be negative.");
        return None;
    }
    if price.normalize().scale() > PRICE_SCALE {
        errors.add("price", "Price can have at most 2 decimal places.");
        return None;
    }
    if price >= PRICE_LIMIT {
        errors.add("price", format!("Price must be less than {PRICE_LIMIT}."));
        return None;
    }
    Some(price.round_dp(PRICE_SCALE))
}

fn parse_category(errors: &mut FieldErrors, raw: &str, categories: &[Category]) -> Option<i32> {
    if raw.is_empty() {
        errors.add("category_id", required("Category"));
        return None;
    }
    let Ok(id) = raw.parse::<i32>() else {
        errors.add("category_id", "The Category field must be a number.");
        return None;
    };
    if !categories.iter().any(|c| c.id == id) {
        errors.add("category_id", "Category does not exist!");
        return None;
    }
    Some(id)
}

fn check_length(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
    message: impl FnOnce() -> String,
) {
    let len = value.chars().count();
    if len == 0 {
        errors.add(field, required(label));
    } else if len < min || len > max {
        errors.add(field, message());
    }
}
