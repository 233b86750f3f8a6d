use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

/// One purchasable variant of a product, read from a swatch payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVariant {
    pub model_number: String,
    /// Always rendered with two fractional digits, e.g. `19.50`.
    pub list_price: String,
    pub image_link: String,
}

/// A single exported CSV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub name: String,
    pub category1: String,
    pub category2: Option<String>,
    pub category3: Option<String>,
    pub description_html: String,
    pub model_number: String,
    pub list_price: String,
    pub image_link: String,
    pub document_links: String,
    pub features_html: String,
    pub source_url: String,
}

/// Model numbers already emitted during the current run.
#[derive(Debug, Default)]
pub struct ModelNumberSet {
    seen: HashSet<String>,
}

impl ModelNumberSet {
    /// Returns `false` when the model number was already present.
    pub fn insert(&mut self, model_number: &str) -> bool {
        if self.seen.contains(model_number) {
            return false;
        }
        self.seen.insert(model_number.to_string())
    }

    pub fn contains(&self, model_number: &str) -> bool {
        self.seen.contains(model_number)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// A product page that was fetched but could not be scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub output_path: PathBuf,
    pub rows_written: usize,
    pub pages_scraped: usize,
    pub fetch_failures: usize,
    pub skipped_pages: usize,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http status {0}")]
    Status(u16),
    #[error("empty response body")]
    EmptyBody,
}

/// The page does not have the shape a product detail page is expected to have.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("breadcrumb navigation element is missing")]
    MissingBreadcrumb,
    #[error("parts and resources section is missing")]
    MissingResourcesSection,
    #[error("color swatch container is missing")]
    MissingSwatchContainer,
    #[error("no <{tag}> element with class containing '{class}' ({field})")]
    MissingElement {
        field: &'static str,
        tag: &'static str,
        class: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariantError {
    #[error("malformed swatch payload: {reason}")]
    MalformedPayload { reason: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("cannot read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid profile {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("site base '{base}' is not an absolute URL: {source}")]
    InvalidSiteBase {
        base: String,
        #[source]
        source: url::ParseError,
    },
}
