use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use url::Url;

use super::types::ProfileError;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "kohler-scrape",
    version,
    about = "Scrapes the Kohler product catalog into a timestamped CSV file"
)]
pub struct Cli {
    /// JSON file overriding the built-in site profile
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Crawl these subcategory listing pages instead of the base categories
    #[arg(long = "category", value_name = "URL")]
    pub categories: Vec<String>,

    /// Scrape these product pages directly
    #[arg(long = "product", value_name = "URL")]
    pub products: Vec<String>,
}

/// Which crawl entry point a command line selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlMode {
    All,
    Categories(Vec<String>),
    Products(Vec<String>),
}

impl Cli {
    pub fn mode(&self) -> CrawlMode {
        if !self.products.is_empty() {
            CrawlMode::Products(self.products.clone())
        } else if !self.categories.is_empty() {
            CrawlMode::Categories(self.categories.clone())
        } else {
            CrawlMode::All
        }
    }
}

/// Field positions inside a swatch's comma-delimited data payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PayloadLayout {
    pub model_number: usize,
    pub list_price: usize,
    pub image_link: usize,
}

impl PayloadLayout {
    /// Smallest field count that still covers every position.
    pub fn min_fields(&self) -> usize {
        self.model_number
            .max(self.list_price)
            .max(self.image_link)
            + 1
    }
}

impl Default for PayloadLayout {
    fn default() -> Self {
        Self {
            model_number: 0,
            list_price: 1,
            image_link: 10,
        }
    }
}

/// Markup conventions and endpoints of the scraped storefront.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub site_base: String,
    pub base_category_urls: Vec<String>,
    pub user_agent: String,
    pub category_link_class: String,
    pub product_link_class: String,
    pub name_class: String,
    pub description_class: String,
    pub features_class: String,
    pub colors_class: String,
    pub breadcrumb_id: String,
    pub resources_id: String,
    pub swatch_payload_attr: String,
    pub payload_layout: PayloadLayout,
    /// Characters dropped from the front of a click handler with no quoted argument.
    pub handler_prefix_len: usize,
    pub handler_suffix_len: usize,
    pub output_prefix: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            site_base: "https://www.us.kohler.com".to_string(),
            base_category_urls: vec![
                "https://www.us.kohler.com/us/Bathroom/category/429204.htm".to_string(),
                "https://www.us.kohler.com/us/Kitchen/category/432288.htm".to_string(),
            ],
            user_agent: "MyAgent/1.0".to_string(),
            category_link_class: "section__category-header-link".to_string(),
            product_link_class: "add-to-compare-link".to_string(),
            name_class: "product-detail__name".to_string(),
            description_class: "product-detail__features-description".to_string(),
            features_class: "product-detail__features-list".to_string(),
            colors_class: "product-detail__colors".to_string(),
            breadcrumb_id: "breadcrumb-navigation".to_string(),
            resources_id: "product-detail__parts-and-resources".to_string(),
            swatch_payload_attr: "data-getdata".to_string(),
            payload_layout: PayloadLayout::default(),
            handler_prefix_len: 13,
            handler_suffix_len: 2,
            output_prefix: "kohler".to_string(),
        }
    }
}

impl SiteProfile {
    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: SiteProfile =
            serde_json::from_str(&content).map_err(|source| ProfileError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        Url::parse(&self.site_base)
            .map(|_| ())
            .map_err(|source| ProfileError::InvalidSiteBase {
                base: self.site_base.clone(),
                source,
            })
    }

    /// Resolves a link found on the site into an absolute URL.
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }

        let base = Url::parse(&self.site_base).ok()?;
        base.join(href).ok().map(|url| url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_needs_eleven_fields() {
        assert_eq!(PayloadLayout::default().min_fields(), 11);
    }

    #[test]
    fn relative_links_resolve_against_site_base() {
        let profile = SiteProfile::default();
        assert_eq!(
            profile.absolute_url("/us/Toilets/category/123.htm").as_deref(),
            Some("https://www.us.kohler.com/us/Toilets/category/123.htm")
        );
        assert_eq!(
            profile.absolute_url("https://cdn.example.com/a.pdf").as_deref(),
            Some("https://cdn.example.com/a.pdf")
        );
        assert_eq!(profile.absolute_url("  "), None);
        assert_eq!(profile.absolute_url("#top"), None);
    }

    #[test]
    fn partial_profile_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(
            &path,
            r#"{
                "site_base": "https://shop.example.com",
                "base_category_urls": ["https://shop.example.com/c/1"],
                "payload_layout": { "model_number": 1, "list_price": 2, "image_link": 10 }
            }"#,
        )
        .unwrap();

        let profile = SiteProfile::from_path(&path).unwrap();
        assert_eq!(profile.site_base, "https://shop.example.com");
        assert_eq!(profile.payload_layout.model_number, 1);
        assert_eq!(profile.user_agent, "MyAgent/1.0");
        assert_eq!(profile.breadcrumb_id, "breadcrumb-navigation");
    }

    #[test]
    fn relative_site_base_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, r#"{ "site_base": "/not-absolute" }"#).unwrap();

        let err = SiteProfile::from_path(&path).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidSiteBase { .. }));
    }

    #[test]
    fn products_take_precedence_over_categories() {
        let cli = Cli::parse_from([
            "kohler-scrape",
            "--category",
            "https://www.us.kohler.com/c/1",
            "--product",
            "https://www.us.kohler.com/p/1",
        ]);
        assert_eq!(
            cli.mode(),
            CrawlMode::Products(vec!["https://www.us.kohler.com/p/1".to_string()])
        );

        let cli = Cli::parse_from(["kohler-scrape", "--category", "https://www.us.kohler.com/c/1"]);
        assert!(matches!(cli.mode(), CrawlMode::Categories(urls) if urls.len() == 1));

        let cli = Cli::parse_from(["kohler-scrape"]);
        assert_eq!(cli.mode(), CrawlMode::All);
        assert_eq!(cli.output_dir, PathBuf::from("."));
    }
}
