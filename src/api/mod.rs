//! API client module for the PetMarket backend

pub mod adverts;
pub mod articles;
pub mod client;
mod me;
pub mod messages;

use anyhow::Result;

pub use adverts::NewAdvert;
pub use me::whoami_data;

use crate::models::AdvertQuery;

/// Browse adverts with client-side filter/sort/pagination
pub async fn browse_adverts(query: AdvertQuery) -> Result<()> {
    adverts::browse(query).await
}

/// Show one advert in full
pub async fn show_advert(advert_id: &str) -> Result<()> {
    adverts::show(advert_id).await
}

/// Post a new advert
pub async fn post_advert(new: NewAdvert) -> Result<()> {
    adverts::post(new).await
}

/// List conversations derived from the message feed
pub async fn list_conversations() -> Result<()> {
    messages::list_conversations().await
}

/// Print one conversation's thread
pub async fn read_conversation(counterpart_id: &str, advert_id: &str, mark_read: bool) -> Result<()> {
    messages::read_conversation(counterpart_id, advert_id, mark_read).await
}

/// Send a message about an advert
pub async fn send_message(advert_id: &str, recipient_id: &str, content: &str) -> Result<()> {
    messages::send(advert_id, recipient_id, content).await
}

/// Start a conversation with an advert's seller
pub async fn contact_seller(advert_id: &str) -> Result<()> {
    messages::contact(advert_id).await
}

/// List knowledge-hub articles
pub async fn list_articles(limit: usize) -> Result<()> {
    articles::list_articles(limit).await
}

/// Print one knowledge-hub article
pub async fn read_article(article_id: &str) -> Result<()> {
    articles::read_article(article_id).await
}

/// Show current user info
pub async fn whoami() -> Result<()> {
    me::whoami().await
}
