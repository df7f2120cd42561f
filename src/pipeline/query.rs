use serde::{Deserialize, Serialize};

use super::enrich::ListingView;
use crate::users::repo_types::User;

/// `?q=&page=` as sent by the dashboards.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            page: first_page(),
        }
    }
}

/// Records that take part in free-text search.
pub trait Searchable {
    /// `needle` is already trimmed and lowercased.
    fn matches(&self, needle: &str) -> bool;
}

fn contains(field: &str, needle: &str) -> bool {
    field.to_lowercase().contains(needle)
}

impl Searchable for ListingView {
    fn matches(&self, needle: &str) -> bool {
        let owner_name = self.owner.as_ref().map(|o| o.name.as_str()).unwrap_or("");
        contains(&self.listing.name, needle)
            || contains(&self.listing.category, needle)
            || contains(owner_name, needle)
            || contains(&self.listing.price.to_string(), needle)
    }
}

impl Searchable for User {
    fn matches(&self, needle: &str) -> bool {
        contains(&self.name, needle) || contains(&self.email, needle) || contains(&self.phone, needle)
    }
}

/// Keeps the records matching `query`, preserving order. A blank query
/// keeps everything.
pub fn filter<T: Searchable>(items: Vec<T>, query: &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items.into_iter().filter(|item| item.matches(&needle)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// Size of the filtered collection, not of this page.
    pub total: usize,
}

/// Cuts one 1-indexed page out of `items`. Page 0 is read as page 1; a page
/// past the end is empty rather than an error.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let total = items.len();
    let page_count = total.div_ceil(page_size).max(1);
    let start = (page - 1).saturating_mul(page_size);

    let items = items.into_iter().skip(start).take(page_size).collect();
    Page {
        items,
        page,
        page_size,
        page_count,
        total,
    }
}
