//! Advert-related models and the client-side browse pipeline.
//!
//! The backend returns the full advert list; filtering, sorting, and
//! pagination all happen in memory on the client, mirroring how the
//! listings page works.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level listing category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Pets,
    Accessories,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pets => "pets",
            Category::Accessories => "accessories",
        }
    }
}

/// A pet or accessory listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advert {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub species: Option<String>,
    pub breed: Option<String>,
    /// Asking price in pence.
    pub price_pence: u64,
    pub location: Option<String>,
    pub description: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub seller_id: String,
    pub seller_name: Option<String>,
}

impl Advert {
    /// "£12.50" style price for display.
    pub fn price_display(&self) -> String {
        format!("\u{a3}{}.{:02}", self.price_pence / 100, self.price_pence % 100)
    }
}

/// Sort order for the browse view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvertSort {
    /// Most recently posted first
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Client-side browse query: which adverts to keep, how to order them, and
/// which page to show.
#[derive(Debug, Clone)]
pub struct AdvertQuery {
    pub category: Option<Category>,
    /// Case-insensitive species match ("dog", "cat", ...).
    pub species: Option<String>,
    pub min_price_pence: Option<u64>,
    pub max_price_pence: Option<u64>,
    /// Case-insensitive substring match on location.
    pub location: Option<String>,
    pub sort: AdvertSort,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
}

impl Default for AdvertQuery {
    fn default() -> Self {
        Self {
            category: None,
            species: None,
            min_price_pence: None,
            max_price_pence: None,
            location: None,
            sort: AdvertSort::Newest,
            page: 1,
            per_page: 10,
        }
    }
}

/// One page of browse results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matches across all pages.
    pub total: usize,
    /// 1-based page number actually returned (clamped to the last page).
    pub page: usize,
    pub pages: usize,
}

fn matches(advert: &Advert, query: &AdvertQuery) -> bool {
    if let Some(category) = query.category {
        if advert.category != category {
            return false;
        }
    }
    if let Some(ref species) = query.species {
        match advert.species {
            Some(ref s) if s.eq_ignore_ascii_case(species) => {}
            _ => return false,
        }
    }
    if let Some(min) = query.min_price_pence {
        if advert.price_pence < min {
            return false;
        }
    }
    if let Some(max) = query.max_price_pence {
        if advert.price_pence > max {
            return false;
        }
    }
    if let Some(ref needle) = query.location {
        let needle = needle.to_lowercase();
        match advert.location {
            Some(ref loc) if loc.to_lowercase().contains(&needle) => {}
            _ => return false,
        }
    }
    true
}

/// Filter, sort, and paginate the full advert list.
///
/// The requested page is clamped to the last available page rather than
/// returning an empty result for an out-of-range page number.
pub fn filter_sort_page(adverts: Vec<Advert>, query: &AdvertQuery) -> Page<Advert> {
    let mut kept: Vec<Advert> = adverts.into_iter().filter(|a| matches(a, query)).collect();

    match query.sort {
        AdvertSort::Newest => kept.sort_by(|a, b| b.posted_at.cmp(&a.posted_at)),
        AdvertSort::PriceAsc => kept.sort_by_key(|a| a.price_pence),
        AdvertSort::PriceDesc => kept.sort_by(|a, b| b.price_pence.cmp(&a.price_pence)),
    }

    let total = kept.len();
    let per_page = query.per_page.max(1);
    let pages = total.div_ceil(per_page).max(1);
    let page = query.page.clamp(1, pages);

    let start = (page - 1) * per_page;
    let items: Vec<Advert> = kept.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        total,
        page,
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn advert(id: &str, category: Category, species: &str, price: u64, day: u32) -> Advert {
        Advert {
            id: id.to_string(),
            title: format!("advert {}", id),
            category,
            species: Some(species.to_string()),
            breed: None,
            price_pence: price,
            location: Some("Bristol, Avon".to_string()),
            description: None,
            posted_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            seller_id: "seller-1".to_string(),
            seller_name: None,
        }
    }

    #[test]
    fn test_filter_by_category_and_species() {
        let adverts = vec![
            advert("a", Category::Pets, "Dog", 10_000, 1),
            advert("b", Category::Pets, "Cat", 5_000, 2),
            advert("c", Category::Accessories, "Dog", 1_500, 3),
        ];
        let query = AdvertQuery {
            category: Some(Category::Pets),
            species: Some("dog".to_string()),
            ..Default::default()
        };

        let page = filter_sort_page(adverts, &query);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, "a");
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let adverts = vec![
            advert("a", Category::Pets, "Dog", 1_000, 1),
            advert("b", Category::Pets, "Dog", 2_000, 2),
            advert("c", Category::Pets, "Dog", 3_000, 3),
        ];
        let query = AdvertQuery {
            min_price_pence: Some(1_000),
            max_price_pence: Some(2_000),
            ..Default::default()
        };

        let page = filter_sort_page(adverts, &query);
        let ids: Vec<&str> = page.items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]); // newest first
    }

    #[test]
    fn test_sort_orders() {
        let adverts = vec![
            advert("cheap", Category::Pets, "Dog", 100, 1),
            advert("dear", Category::Pets, "Dog", 9_900, 2),
            advert("mid", Category::Pets, "Dog", 5_000, 3),
        ];

        let asc = filter_sort_page(
            adverts.clone(),
            &AdvertQuery {
                sort: AdvertSort::PriceAsc,
                ..Default::default()
            },
        );
        let ids: Vec<&str> = asc.items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["cheap", "mid", "dear"]);

        let newest = filter_sort_page(adverts, &AdvertQuery::default());
        assert_eq!(newest.items[0].id, "mid");
    }

    #[test]
    fn test_pagination_clamps_out_of_range_page() {
        let adverts: Vec<Advert> = (1..=5)
            .map(|i| advert(&format!("a{}", i), Category::Pets, "Dog", 1_000, i))
            .collect();
        let query = AdvertQuery {
            page: 99,
            per_page: 2,
            ..Default::default()
        };

        let page = filter_sort_page(adverts, &query);
        assert_eq!(page.pages, 3);
        assert_eq!(page.page, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_empty_result_still_reports_one_page() {
        let query = AdvertQuery {
            species: Some("tortoise".to_string()),
            ..Default::default()
        };
        let page = filter_sort_page(Vec::new(), &query);
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 1);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_price_display() {
        let a = advert("a", Category::Pets, "Dog", 125_050, 1);
        assert_eq!(a.price_display(), "\u{a3}1250.50");
    }
}
