//! Sequential catalog scraper for the Kohler storefront.
//!
//! Base category pages lead to subcategory listings, listings lead to product
//! pages, and every product page yields one CSV row per not-yet-seen model
//! number.

pub mod app;

pub use app::*;
