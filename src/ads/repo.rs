use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{
    Ad, AdChanges, AdListingRow, CartAdd, CartRemove, Category, NewAd, UpdateOutcome,
};

/// Storage seam for ads, categories and carts.
#[async_trait]
pub trait AdRepo: Send + Sync {
    async fn list_ads(&self) -> anyhow::Result<Vec<AdListingRow>>;
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>>;
    async fn find_ad(&self, id: i32) -> anyhow::Result<Option<Ad>>;
    async fn insert_ad(&self, ad: NewAd) -> anyhow::Result<Ad>;
    /// Applies `changes` only when `owner_id` still owns the row.
    async fn update_owned_ad(
        &self,
        id: i32,
        owner_id: Uuid,
        changes: AdChanges,
    ) -> anyhow::Result<UpdateOutcome>;
    async fn add_to_cart(&self, buyer_id: Uuid, ad_id: i32) -> anyhow::Result<CartAdd>;
    async fn remove_from_cart(&self, buyer_id: Uuid, ad_id: i32) -> anyhow::Result<CartRemove>;
    async fn list_cart(&self, buyer_id: Uuid) -> anyhow::Result<Vec<AdListingRow>>;
}

#[derive(Clone)]
pub struct PgAdRepo {
    db: PgPool,
}

impl PgAdRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const AD_COLUMNS: &str =
    "id, name, description, price, image_url, created_at, owner_id, category_id";

#[async_trait]
impl AdRepo for PgAdRepo {
    async fn list_ads(&self) -> anyhow::Result<Vec<AdListingRow>> {
        let rows = sqlx::query_as::<_, AdListingRow>(
            r#"
            SELECT a.id, a.name, a.description, a.price, a.image_url, a.created_at,
                   c.name AS category, u.username AS owner
              FROM ads a
              JOIN categories c ON c.id = a.category_id
              JOIN users u ON u.id = a.owner_id
             ORDER BY a.id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list ads")?;
        Ok(rows)
    }

    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.db)
            .await
            .context("list categories")?;
        Ok(rows)
    }

    async fn find_ad(&self, id: i32) -> anyhow::Result<Option<Ad>> {
        let ad = sqlx::query_as::<_, Ad>(&format!("SELECT {AD_COLUMNS} FROM ads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("find ad {id}"))?;
        Ok(ad)
    }

    async fn insert_ad(&self, ad: NewAd) -> anyhow::Result<Ad> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let row = sqlx::query_as::<_, Ad>(&format!(
            r#"
            INSERT INTO ads (name, description, price, image_url, created_at, owner_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {AD_COLUMNS}
            "#
        ))
        .bind(&ad.name)
        .bind(&ad.description)
        .bind(ad.price)
        .bind(&ad.image_url)
        .bind(ad.created_at)
        .bind(ad.owner_id)
        .bind(ad.category_id)
        .fetch_one(&mut *tx)
        .await
        .context("insert ad")?;
        tx.commit().await.context("commit tx")?;
        Ok(row)
    }

    async fn update_owned_ad(
        &self,
        id: i32,
        owner_id: Uuid,
        changes: AdChanges,
    ) -> anyhow::Result<UpdateOutcome> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let current: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM ads WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .with_context(|| format!("lock ad {id}"))?;

        match current {
            None => return Ok(UpdateOutcome::NotFound),
            Some(owner) if owner != owner_id => return Ok(UpdateOutcome::NotOwner),
            Some(_) => {}
        }

        let ad = sqlx::query_as::<_, Ad>(&format!(
            r#"
            UPDATE ads
               SET name = $2, description = $3, price = $4, image_url = $5, category_id = $6
             WHERE id = $1
            RETURNING {AD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(&changes.image_url)
        .bind(changes.category_id)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("update ad {id}"))?;

        tx.commit().await.context("commit tx")?;
        Ok(UpdateOutcome::Updated(ad))
    }

    async fn add_to_cart(&self, buyer_id: Uuid, ad_id: i32) -> anyhow::Result<CartAdd> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM ads WHERE id = $1 FOR SHARE")
            .bind(ad_id)
            .fetch_optional(&mut *tx)
            .await
            .with_context(|| format!("find ad {ad_id}"))?;
        if exists.is_none() {
            return Ok(CartAdd::AdMissing);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO ad_buyers (ad_id, buyer_id)
            VALUES ($1, $2)
            ON CONFLICT (ad_id, buyer_id) DO NOTHING
            "#,
        )
        .bind(ad_id)
        .bind(buyer_id)
        .execute(&mut *tx)
        .await
        .context("insert cart entry")?
        .rows_affected();

        tx.commit().await.context("commit tx")?;
        Ok(if inserted == 0 {
            CartAdd::AlreadyPresent
        } else {
            CartAdd::Added
        })
    }

    async fn remove_from_cart(&self, buyer_id: Uuid, ad_id: i32) -> anyhow::Result<CartRemove> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM ads WHERE id = $1")
            .bind(ad_id)
            .fetch_optional(&mut *tx)
            .await
            .with_context(|| format!("find ad {ad_id}"))?;
        if exists.is_none() {
            return Ok(CartRemove::AdMissing);
        }

        let deleted = sqlx::query("DELETE FROM ad_buyers WHERE ad_id = $1 AND buyer_id = $2")
            .bind(ad_id)
            .bind(buyer_id)
            .execute(&mut *tx)
            .await
            .context("delete cart entry")?
            .rows_affected();

        tx.commit().await.context("commit tx")?;
        Ok(if deleted == 0 {
            CartRemove::NotInCart
        } else {
            CartRemove::Removed
        })
    }

    async fn list_cart(&self, buyer_id: Uuid) -> anyhow::Result<Vec<AdListingRow>> {
        let rows = sqlx::query_as::<_, AdListingRow>(
            r#"
            SELECT a.id, a.name, a.description, a.price, a.image_url, a.created_at,
                   c.name AS category, u.username AS owner
              FROM ad_buyers ab
              JOIN ads a ON a.id = ab.ad_id
              JOIN categories c ON c.id = a.category_id
              JOIN users u ON u.id = a.owner_id
             WHERE ab.buyer_id = $1
             ORDER BY a.id
            "#,
        )
        .bind(buyer_id)
        .fetch_all(&self.db)
        .await
        .context("list cart")?;
        Ok(rows)
    }
}
