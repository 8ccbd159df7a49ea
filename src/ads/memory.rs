use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use super::repo::AdRepo;
use super::repo_types::{
    Ad, AdChanges, AdListingRow, CartAdd, CartRemove, Category, NewAd, UpdateOutcome,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, String>,
    categories: Vec<Category>,
    ads: Vec<Ad>,
    ad_buyers: BTreeSet<(i32, Uuid)>,
}

/// In-memory stand-in for Postgres.
#[derive(Default)]
pub struct MemoryAdRepo {
    tables: Mutex<Tables>,
}

impl MemoryAdRepo {
    /// Same categories as the initial migration.
    pub fn seeded() -> Self {
        let repo = Self::default();
        {
            let mut t = repo.tables.lock().unwrap();
            for (i, name) in ["Cars", "Buildings", "Furniture", "Clothes"].iter().enumerate() {
                t.categories.push(Category {
                    id: i as i32 + 1,
                    name: name.to_string(),
                });
            }
        }
        repo
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables
            .lock()
            .unwrap()
            .users
            .insert(id, username.to_string());
        id
    }

    pub fn ads(&self) -> Vec<Ad> {
        self.tables.lock().unwrap().ads.clone()
    }

    pub fn cart_rows(&self) -> Vec<(i32, Uuid)> {
        self.tables.lock().unwrap().ad_buyers.iter().copied().collect()
    }
}

impl Tables {
    fn listing(&self, ad: &Ad) -> anyhow::Result<AdListingRow> {
        let category = self
            .categories
            .iter()
            .find(|c| c.id == ad.category_id)
            .ok_or_else(|| anyhow!("category {} missing", ad.category_id))?;
        let owner = self
            .users
            .get(&ad.owner_id)
            .ok_or_else(|| anyhow!("user {} missing", ad.owner_id))?;
        Ok(AdListingRow {
            id: ad.id,
            name: ad.name.clone(),
            description: ad.description.clone(),
            price: ad.price,
            image_url: ad.image_url.clone(),
            created_at: ad.created_at,
            category: category.name.clone(),
            owner: owner.clone(),
        })
    }

    fn has_ad(&self, id: i32) -> bool {
        self.ads.iter().any(|a| a.id == id)
    }
}

#[async_trait]
impl AdRepo for MemoryAdRepo {
    async fn list_ads(&self) -> anyhow::Result<Vec<AdListingRow>> {
        let t = self.tables.lock().unwrap();
        t.ads.iter().map(|a| t.listing(a)).collect()
    }

    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        Ok(self.tables.lock().unwrap().categories.clone())
    }

    async fn find_ad(&self, id: i32) -> anyhow::Result<Option<Ad>> {
        let t = self.tables.lock().unwrap();
        Ok(t.ads.iter().find(|a| a.id == id).cloned())
    }

    async fn insert_ad(&self, ad: NewAd) -> anyhow::Result<Ad> {
        let mut t = self.tables.lock().unwrap();
        anyhow::ensure!(
            t.categories.iter().any(|c| c.id == ad.category_id),
            "foreign key violation: category {}",
            ad.category_id
        );
        let id = t.ads.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let row = Ad {
            id,
            name: ad.name,
            description: ad.description,
            price: ad.price,
            image_url: ad.image_url,
            created_at: ad.created_at,
            owner_id: ad.owner_id,
            category_id: ad.category_id,
        };
        t.ads.push(row.clone());
        Ok(row)
    }

    async fn update_owned_ad(
        &self,
        id: i32,
        owner_id: Uuid,
        changes: AdChanges,
    ) -> anyhow::Result<UpdateOutcome> {
        let mut t = self.tables.lock().unwrap();
        let Some(ad) = t.ads.iter_mut().find(|a| a.id == id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if ad.owner_id != owner_id {
            return Ok(UpdateOutcome::NotOwner);
        }
        ad.name = changes.name;
        ad.description = changes.description;
        ad.price = changes.price;
        ad.image_url = changes.image_url;
        ad.category_id = changes.category_id;
        Ok(UpdateOutcome::Updated(ad.clone()))
    }

    async fn add_to_cart(&self, buyer_id: Uuid, ad_id: i32) -> anyhow::Result<CartAdd> {
        let mut t = self.tables.lock().unwrap();
        if !t.has_ad(ad_id) {
            return Ok(CartAdd::AdMissing);
        }
        Ok(if t.ad_buyers.insert((ad_id, buyer_id)) {
            CartAdd::Added
        } else {
            CartAdd::AlreadyPresent
        })
    }

    async fn remove_from_cart(&self, buyer_id: Uuid, ad_id: i32) -> anyhow::Result<CartRemove> {
        let mut t = self.tables.lock().unwrap();
        if !t.has_ad(ad_id) {
            return Ok(CartRemove::AdMissing);
        }
        Ok(if t.ad_buyers.remove(&(ad_id, buyer_id)) {
            CartRemove::Removed
        } else {
            CartRemove::NotInCart
        })
    }

    async fn list_cart(&self, buyer_id: Uuid) -> anyhow::Result<Vec<AdListingRow>> {
        let t = self.tables.lock().unwrap();
        t.ad_buyers
            .iter()
            .filter(|(_, buyer)| *buyer == buyer_id)
            .filter_map(|(ad_id, _)| t.ads.iter().find(|a| a.id == *ad_id))
            .map(|a| t.listing(a))
            .collect()
    }
}
