pub mod config;
pub mod crawl;
pub mod data_io;
pub mod extract;
pub mod runtime;
pub mod types;

pub use config::{Cli, CrawlMode, PayloadLayout, SiteProfile};
pub use crawl::{Crawler, HttpSource, PageSource, parse_document};
pub use data_io::{CSV_HEADERS, export_rows};
pub use extract::{
    ItemScraper, categories, document_links, find_by_class, model_variants, parse_variant_payload,
};
pub use runtime::run;
pub use types::{
    CrawlSummary, ExportError, FetchError, ModelNumberSet, ModelVariant, PageError, PageFailure,
    ProductRow, ProfileError, VariantError,
};
