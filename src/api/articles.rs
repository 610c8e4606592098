//! Knowledge-hub article endpoints

use anyhow::{Context, Result};
use serde::Deserialize;

use super::client::MarketClient;
use crate::models::Article;

#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    articles: Option<Vec<Article>>,
}

#[derive(Debug, Deserialize)]
struct ArticleResponse {
    article: Article,
}

pub async fn fetch_articles(client: &MarketClient) -> Result<Vec<Article>> {
    let resp = client.get("/articles").await?;
    let body: ArticlesResponse = resp
        .json()
        .await
        .context("Failed to parse articles response")?;
    Ok(body.articles.unwrap_or_default())
}

pub async fn fetch_article(client: &MarketClient, article_id: &str) -> Result<Article> {
    let path = format!("/articles/{}", article_id);
    let resp = client.get(&path).await?;
    let body: ArticleResponse = resp
        .json()
        .await
        .context("Failed to parse article response")?;
    Ok(body.article)
}

/// List knowledge-hub articles (prints to stdout).
pub async fn list_articles(limit: usize) -> Result<()> {
    let client = MarketClient::new().await?;
    let articles = fetch_articles(&client).await?;

    println!("\nKnowledge hub:");
    println!("{:-<72}", "");

    if articles.is_empty() {
        println!("  (no articles)");
        return Ok(());
    }

    for article in articles.iter().take(limit) {
        println!("{}", article.title);
        if let Some(ref category) = article.category {
            print!("  {}", category);
            if let Some(published) = article.published_at {
                print!(" | {}", published.format("%Y-%m-%d"));
            }
            println!();
        }
        if let Some(ref summary) = article.summary {
            println!("  {}", summary.trim());
        }
        println!("  ID: {}", article.id);
        println!();
    }

    Ok(())
}

/// Print one article in full.
pub async fn read_article(article_id: &str) -> Result<()> {
    let client = MarketClient::new().await?;
    let article = fetch_article(&client, article_id).await?;

    println!("\n{}", article.title);
    println!("{:=<1$}", "", article.title.chars().count());
    if let Some(published) = article.published_at {
        println!("Published {}", published.format("%Y-%m-%d"));
    }
    println!();
    match article.body {
        Some(ref body) => println!("{}", body.trim()),
        None => println!("(article has no body)"),
    }

    Ok(())
}
