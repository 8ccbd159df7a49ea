use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{AdForm, AdInput, AdView, ValidAd};
use super::repo::AdRepo;
use super::repo_types::{Ad, AdChanges, CartAdd, CartRemove, Category, NewAd, UpdateOutcome};
use crate::error::{AppError, AppResult, FieldErrors};

pub async fn list_all(repo: &dyn AdRepo) -> AppResult<Vec<AdView>> {
    let rows = repo.list_ads().await?;
    Ok(rows.into_iter().map(AdView::from).collect())
}

pub async fn empty_form(repo: &dyn AdRepo) -> AppResult<AdForm> {
    let categories = repo.list_categories().await?;
    Ok(AdForm::empty(categories))
}

pub async fn create_ad(
    repo: &dyn AdRepo,
    owner_id: Uuid,
    input: AdInput,
    now: OffsetDateTime,
) -> AppResult<Ad> {
    let categories = repo.list_categories().await?;
    let valid = validated(input, categories)?;

    let ad = repo
        .insert_ad(NewAd {
            name: valid.name,
            description: valid.description,
            price: valid.price,
            image_url: valid.image_url,
            created_at: now,
            owner_id,
            category_id: valid.category_id,
        })
        .await?;

    info!(ad_id = ad.id, %owner_id, "ad created");
    Ok(ad)
}

pub async fn edit_form(repo: &dyn AdRepo, user_id: Uuid, ad_id: i32) -> AppResult<AdForm> {
    let ad = owned_ad(repo, user_id, ad_id).await?;
    let categories = repo.list_categories().await?;
    Ok(AdForm::from_ad(&ad, categories))
}

pub async fn update_ad(
    repo: &dyn AdRepo,
    user_id: Uuid,
    ad_id: i32,
    input: AdInput,
) -> AppResult<Ad> {
    owned_ad(repo, user_id, ad_id).await?;

    let categories = repo.list_categories().await?;
    let valid = validated(input, categories)?;

    let changes = AdChanges {
        name: valid.name,
        description: valid.description,
        price: valid.price,
        image_url: valid.image_url,
        category_id: valid.category_id,
    };

    // Ownership is re-checked under the row lock.
    match repo.update_owned_ad(ad_id, user_id, changes).await? {
        UpdateOutcome::Updated(ad) => {
            info!(ad_id, %user_id, "ad updated");
            Ok(ad)
        }
        UpdateOutcome::NotFound => Err(ad_not_found(ad_id)),
        UpdateOutcome::NotOwner => Err(not_owner(ad_id, user_id)),
    }
}

pub async fn add_to_cart(repo: &dyn AdRepo, buyer_id: Uuid, ad_id: i32) -> AppResult<()> {
    match repo.add_to_cart(buyer_id, ad_id).await? {
        CartAdd::Added => info!(ad_id, %buyer_id, "added to cart"),
        CartAdd::AlreadyPresent => info!(ad_id, %buyer_id, "already in cart"),
        CartAdd::AdMissing => return Err(ad_not_found(ad_id)),
    }
    Ok(())
}

pub async fn remove_from_cart(repo: &dyn AdRepo, buyer_id: Uuid, ad_id: i32) -> AppResult<()> {
    match repo.remove_from_cart(buyer_id, ad_id).await? {
        CartRemove::Removed => info!(ad_id, %buyer_id, "removed from cart"),
        CartRemove::NotInCart => info!(ad_id, %buyer_id, "not in cart, nothing to remove"),
        CartRemove::AdMissing => return Err(ad_not_found(ad_id)),
    }
    Ok(())
}

pub async fn cart(repo: &dyn AdRepo, buyer_id: Uuid) -> AppResult<Vec<AdView>> {
    let rows = repo.list_cart(buyer_id).await?;
    Ok(rows.into_iter().map(AdView::from).collect())
}

async fn owned_ad(repo: &dyn AdRepo, user_id: Uuid, ad_id: i32) -> AppResult<Ad> {
    let ad = repo
        .find_ad(ad_id)
        .await?
        .ok_or_else(|| ad_not_found(ad_id))?;
    if ad.owner_id != user_id {
        return Err(not_owner(ad_id, user_id));
    }
    Ok(ad)
}

fn validated(input: AdInput, categories: Vec<Category>) -> AppResult<ValidAd> {
    input.validate(&categories).map_err(|errors: FieldErrors| {
        let fields = errors.fields().collect::<Vec<_>>().join(",");
        warn!(%fields, "ad form rejected");
        AppError::Validation {
            form: Box::new(AdForm::from_input(&input, categories)),
            errors,
        }
    })
}

fn ad_not_found(ad_id: i32) -> AppError {
    AppError::NotFound(format!("Ad {ad_id} not found"))
}

fn not_owner(ad_id: i32, user_id: Uuid) -> AppError {
    warn!(ad_id, %user_id, "edit attempted by non-owner");
    AppError::Forbidden("Only the owner can edit this ad".into())
}
