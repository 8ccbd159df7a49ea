use rust_decimal::Decimal;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Ad record in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Ad {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub created_at: OffsetDateTime,
    /// Immutable after insert.
    pub owner_id: Uuid,
    pub category_id: i32,
}

/// Ad joined with its category name and owner username.
#[derive(Debug, Clone, FromRow)]
pub struct AdListingRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub created_at: OffsetDateTime,
    pub category: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Values for a fresh insert; owner and timestamp are fixed by the caller.
#[derive(Debug, Clone)]
pub struct NewAd {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub created_at: OffsetDateTime,
    pub owner_id: Uuid,
    pub category_id: i32,
}

/// The fields an owner may overwrite.
#[derive(Debug, Clone)]
pub struct AdChanges {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub category_id: i32,
}

#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Ad),
    NotFound,
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAdd {
    Added,
    AlreadyPresent,
    AdMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartRemove {
    Removed,
    NotInCart,
    AdMissing,
}
