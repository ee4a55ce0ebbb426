//! # Pagination and Collections
//!
//! A page is always cut from a fully materialized list: a real category, every record,
//! or one of the two virtual collections that filter across categories (`_favorites`
//! for liked records, `_unfavorites` for the rest).
//!
//! ## Pagination Rules
//!
//! - `per_page == 0` yields nothing and zero pages.
//! - Page numbers are 1-based; page 0 is treated as page 1.
//! - A page past the end is empty but still reports the real page count.
//! - `total_pages == ceil(len / per_page)`, so an empty list has zero pages.
//!
//! ## Seeded Ordering
//!
//! Virtual collections are shown shuffled. The shuffle is driven by a PCG64 generator
//! seeded from an integer carried in the page URL, so paging through a shuffled
//! collection keeps a stable order. PCG64's output stream is fixed by its algorithm,
//! which keeps the order stable across processes and crate upgrades too.

use crate::index::ImageIndex;
use crate::model::ImageRecord;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::Serialize;
use std::fmt;

pub const FAVORITES: &str = "_favorites";
pub const UNFAVORITES: &str = "_unfavorites";

/// Upper bound (inclusive) for freshly drawn seeds.
pub const MAX_SEED: u64 = 999_999_999;

/// Returns the requested page of `items` and the total page count.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> (&[T], usize) {
    if per_page == 0 {
        return (&[], 0);
    }
    let total_pages = items.len().div_ceil(per_page);
    let page = page.max(1);
    let start = (page - 1).saturating_mul(per_page);
    if start >= items.len() {
        return (&[], total_pages);
    }
    let end = start.saturating_add(per_page).min(items.len());
    (&items[start..end], total_pages)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Collection {
    /// Every record, categories in alphabetical order.
    All,
    Category(String),
    Favorites,
    Unfavorites,
}

impl Collection {
    pub fn from_name(name: &str) -> Self {
        match name {
            FAVORITES => Collection::Favorites,
            UNFAVORITES => Collection::Unfavorites,
            other => Collection::Category(other.to_string()),
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Collection::Favorites | Collection::Unfavorites)
    }

    /// Materializes the collection. Virtual collections keep index order here;
    /// see [`order_seeded`].
    pub fn records(&self, index: &ImageIndex) -> Vec<ImageRecord> {
        match self {
            Collection::All => index
                .sorted_categories()
                .into_iter()
                .flat_map(|name| index.categories[name].iter().cloned())
                .collect(),
            Collection::Category(name) => {
                index.categories.get(name).cloned().unwrap_or_default()
            }
            Collection::Favorites => index.records().filter(|r| r.like).cloned().collect(),
            Collection::Unfavorites => index.records().filter(|r| !r.like).cloned().collect(),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::All => write!(f, "all"),
            Collection::Category(name) => write!(f, "{}", name),
            Collection::Favorites => write!(f, "{}", FAVORITES),
            Collection::Unfavorites => write!(f, "{}", UNFAVORITES),
        }
    }
}

/// Shuffles `items` deterministically for `seed`.
pub fn order_seeded<T>(items: &mut [T], seed: u64) {
    let mut rng = Pcg64::seed_from_u64(seed);
    items.shuffle(&mut rng);
}

/// Parses a seed from a URL parameter, drawing a fresh one if it is absent or not an
/// integer. Negative integers are accepted and reinterpreted as `u64`.
pub fn resolve_seed(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|s| s as u64)
        .unwrap_or_else(fresh_seed)
}

pub fn fresh_seed() -> u64 {
    rand::thread_rng().gen_range(0..=MAX_SEED)
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagePage {
    pub collection: Collection,
    pub images: Vec<ImageRecord>,
    pub page: usize,
    pub total_pages: usize,
    /// Seed used for a virtual collection; carry it to the next page request.
    pub seed: Option<u64>,
}

/// One page of a collection. `seed` only matters for virtual collections.
pub fn page_images(
    index: &ImageIndex,
    collection: Collection,
    page: usize,
    per_page: usize,
    seed: Option<&str>,
) -> ImagePage {
    let mut items = collection.records(index);
    let seed = if collection.is_virtual() {
        let seed = resolve_seed(seed);
        order_seeded(&mut items, seed);
        Some(seed)
    } else {
        None
    };

    let (slice, total_pages) = paginate(&items, page, per_page);
    ImagePage {
        images: slice.to_vec(),
        collection,
        page: page.max(1),
        total_pages,
        seed,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub name: String,
    /// First record of the category, used as its thumbnail.
    pub thumbnail: Option<ImageRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub categories: Vec<CategorySummary>,
    pub page: usize,
    pub total_pages: usize,
}

/// One page of alphabetically sorted categories.
pub fn list_categories(index: &ImageIndex, page: usize, per_page: usize) -> CategoryPage {
    let names = index.sorted_categories();
    let (slice, total_pages) = paginate(&names, page, per_page);
    let categories = slice
        .iter()
        .map(|name| {
            let records = index.categories.get(*name);
            CategorySummary {
                name: name.to_string(),
                thumbnail: records.and_then(|r| r.first()).cloned(),
                count: records.map_or(0, Vec::len),
            }
        })
        .collect();

    CategoryPage {
        categories,
        page: page.max(1),
        total_pages,
    }
}
