//! Advert endpoints: browse, show, and post listings.
//!
//! The browse pipeline fetches the full list and filters/sorts/pages it in
//! memory (`crate::models::filter_sort_page`), matching the listings page.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::client::MarketClient;
use crate::auth::validate::validate_new_advert;
use crate::models::{filter_sort_page, Advert, AdvertQuery, AdvertSort, Category};

// -- Response types --

#[derive(Debug, Deserialize)]
struct AdvertsResponse {
    adverts: Option<Vec<Advert>>,
}

#[derive(Debug, Deserialize)]
struct AdvertResponse {
    advert: Advert,
}

/// Fields for a new listing.
#[derive(Debug)]
pub struct NewAdvert {
    pub title: String,
    pub category: Category,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub price_pence: u64,
    pub location: Option<String>,
    pub description: Option<String>,
}

pub fn parse_category(s: &str) -> Result<Category> {
    match s.to_lowercase().as_str() {
        "pets" | "pet" => Ok(Category::Pets),
        "accessories" | "accessory" => Ok(Category::Accessories),
        other => bail!("Unknown category '{}' (expected pets or accessories)", other),
    }
}

pub fn parse_sort(s: &str) -> Result<AdvertSort> {
    match s.to_lowercase().as_str() {
        "newest" => Ok(AdvertSort::Newest),
        "price" | "price-asc" => Ok(AdvertSort::PriceAsc),
        "price-desc" => Ok(AdvertSort::PriceDesc),
        other => bail!(
            "Unknown sort '{}' (expected newest, price-asc, or price-desc)",
            other
        ),
    }
}

// ---------------------------------------------------------------------------
// Data-returning API functions
// ---------------------------------------------------------------------------

pub async fn fetch_adverts(client: &MarketClient) -> Result<Vec<Advert>> {
    let resp = client.get("/adverts").await?;
    let body: AdvertsResponse = resp
        .json()
        .await
        .context("Failed to parse adverts response")?;
    Ok(body.adverts.unwrap_or_default())
}

pub async fn fetch_advert(client: &MarketClient, advert_id: &str) -> Result<Advert> {
    let path = format!("/adverts/{}", advert_id);
    let resp = client.get(&path).await?;
    let body: AdvertResponse = resp
        .json()
        .await
        .context("Failed to parse advert response")?;
    Ok(body.advert)
}

pub async fn post_advert_with_client(client: &MarketClient, new: &NewAdvert) -> Result<Advert> {
    validate_new_advert(&new.title, new.price_pence)?;

    let body = serde_json::json!({
        "title": new.title.trim(),
        "category": new.category,
        "species": new.species,
        "breed": new.breed,
        "pricePence": new.price_pence,
        "location": new.location,
        "description": new.description,
    });
    let resp = client.post("/adverts", &body).await?;
    let body: AdvertResponse = resp
        .json()
        .await
        .context("Failed to parse post-advert response")?;
    Ok(body.advert)
}

// ---------------------------------------------------------------------------
// CLI commands (print to stdout)
// ---------------------------------------------------------------------------

/// Browse adverts with client-side filter/sort/pagination.
pub async fn browse(query: AdvertQuery) -> Result<()> {
    let client = MarketClient::new().await?;
    let adverts = fetch_adverts(&client).await?;
    let page = filter_sort_page(adverts, &query);

    println!(
        "\nAdverts (page {}/{}, {} match{}):",
        page.page,
        page.pages,
        page.total,
        if page.total == 1 { "" } else { "es" }
    );
    println!("{:-<72}", "");

    if page.items.is_empty() {
        println!("  (nothing matched)");
        return Ok(());
    }

    for advert in &page.items {
        let species = advert.species.as_deref().unwrap_or("-");
        let location = advert.location.as_deref().unwrap_or("-");
        println!("{}  {}", advert.price_display(), advert.title);
        println!(
            "  {} | {} | {} | posted {}",
            advert.category.as_str(),
            species,
            location,
            advert.posted_at.format("%Y-%m-%d")
        );
        println!("  ID: {}", advert.id);
        println!();
    }

    Ok(())
}

/// Show one advert in full.
pub async fn show(advert_id: &str) -> Result<()> {
    let client = MarketClient::new().await?;
    let advert = fetch_advert(&client, advert_id).await?;

    println!("\n{}  {}", advert.price_display(), advert.title);
    println!("Category: {}", advert.category.as_str());
    if let Some(ref species) = advert.species {
        println!("Species:  {}", species);
    }
    if let Some(ref breed) = advert.breed {
        println!("Breed:    {}", breed);
    }
    if let Some(ref location) = advert.location {
        println!("Location: {}", location);
    }
    println!("Posted:   {}", advert.posted_at.format("%Y-%m-%d %H:%M"));
    println!(
        "Seller:   {} ({})",
        advert.seller_name.as_deref().unwrap_or("(unnamed)"),
        advert.seller_id
    );
    if let Some(ref description) = advert.description {
        println!("\n{}", description.trim());
    }
    println!("\nContact the seller: petmarket-cli contact {}", advert.id);

    Ok(())
}

/// Post a new advert.
pub async fn post(new: NewAdvert) -> Result<()> {
    let client = MarketClient::new().await?;
    let advert = post_advert_with_client(&client, &new).await?;
    println!("Advert posted: {} ({})", advert.title, advert.id);
    Ok(())
}
