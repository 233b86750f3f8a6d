use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Local;
use reqwest::header::USER_AGENT;
use scraper::Html;
use tracing::{debug, info, warn};

use super::config::SiteProfile;
use super::data_io::export_rows;
use super::extract::{ItemScraper, find_by_class};
use super::types::{CrawlSummary, ExportError, FetchError, ModelNumberSet, PageFailure};

const LINK_TAG: &str = "a";

/// Something that can hand back the decoded body of a page.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_body(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain GET requests carrying only the configured user agent.
pub struct HttpSource {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpSource {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }
}

impl PageSource for HttpSource {
    async fn fetch_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        response_text(response).await
    }
}

/// Body of a successful response, decoded with the charset its
/// `Content-Type` declares (UTF-8 otherwise, invalid bytes replaced).
async fn response_text(response: reqwest::Response) -> Result<String, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    Ok(response.text().await?)
}

/// Parses a fetched body. Only an empty or whitespace-only body is rejected;
/// the HTML parser recovers from anything else.
pub fn parse_document(body: &str) -> Result<Html, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }
    Ok(Html::parse_document(body))
}

/// Walks categories down to product pages and exports what it finds.
///
/// The crawler owns the dedup state, so one instance is one export run until
/// [`Crawler::reset`] is called.
pub struct Crawler<S> {
    profile: SiteProfile,
    source: S,
    output_dir: PathBuf,
    model_numbers: ModelNumberSet,
    fetch_failures: Vec<String>,
    page_failures: Vec<PageFailure>,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(profile: SiteProfile, source: S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            profile,
            source,
            output_dir: output_dir.into(),
            model_numbers: ModelNumberSet::default(),
            fetch_failures: Vec::new(),
            page_failures: Vec::new(),
        }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// URLs whose fetch or parse failed.
    pub fn fetch_failures(&self) -> &[String] {
        &self.fetch_failures
    }

    /// Product pages skipped because they lacked an expected element.
    pub fn page_failures(&self) -> &[PageFailure] {
        &self.page_failures
    }

    pub fn model_numbers(&self) -> &ModelNumberSet {
        &self.model_numbers
    }

    /// Forgets exported model numbers and recorded failures.
    pub fn reset(&mut self) {
        self.model_numbers.clear();
        self.fetch_failures.clear();
        self.page_failures.clear();
    }

    async fn fetch(&mut self, url: &str) -> Option<Html> {
        let result = match self.source.fetch_body(url).await {
            Ok(body) => parse_document(&body),
            Err(err) => Err(err),
        };

        match result {
            Ok(doc) => Some(doc),
            Err(err) => {
                warn!("fetch failed for {url}: {err}");
                self.fetch_failures.push(url.to_string());
                None
            }
        }
    }

    /// Absolute hrefs of `a` elements matching `link_class` across `pages`,
    /// first occurrence wins.
    async fn discover_links(&mut self, pages: &[String], link_class: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();

        for page in pages {
            let Some(doc) = self.fetch(page).await else {
                continue;
            };
            let before = out.len();
            for link in find_by_class(doc.root_element(), LINK_TAG, link_class) {
                let Some(url) = link
                    .value()
                    .attr("href")
                    .and_then(|href| self.profile.absolute_url(href))
                else {
                    continue;
                };
                if seen.insert(url.clone()) {
                    out.push(url);
                }
            }
            debug!("{page}: {} new links", out.len() - before);
        }

        out
    }

    /// Starts from the profile's base categories.
    pub async fn crawl_all(&mut self) -> Result<CrawlSummary, ExportError> {
        let bases = self.profile.base_category_urls.clone();
        let link_class = self.profile.category_link_class.clone();
        let categories = self.discover_links(&bases, &link_class).await;
        info!(
            "discovered {} category pages from {} base pages",
            categories.len(),
            bases.len()
        );
        self.crawl_categories(&categories).await
    }

    pub async fn crawl_categories(
        &mut self,
        category_urls: &[String],
    ) -> Result<CrawlSummary, ExportError> {
        let link_class = self.profile.product_link_class.clone();
        let products = self.discover_links(category_urls, &link_class).await;
        info!(
            "discovered {} product pages from {} category pages",
            products.len(),
            category_urls.len()
        );
        self.crawl_products(&products).await
    }

    /// Scrapes every product page in order and writes one CSV at the end.
    pub async fn crawl_products(
        &mut self,
        product_urls: &[String],
    ) -> Result<CrawlSummary, ExportError> {
        let mut rows = Vec::new();
        let mut pages_scraped = 0usize;

        for url in product_urls {
            let Some(doc) = self.fetch(url).await else {
                continue;
            };

            let scraper = ItemScraper::new(&self.profile);
            match scraper.scrape(&doc, url, &mut self.model_numbers) {
                Ok(page_rows) => {
                    pages_scraped += 1;
                    debug!("{url}: {} rows", page_rows.len());
                    rows.extend(page_rows);
                }
                Err(err) => {
                    warn!("skipping {url}: {err}");
                    self.page_failures.push(PageFailure {
                        url: url.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let output_path = export_rows(
            &rows,
            &self.output_dir,
            &self.profile.output_prefix,
            &Local::now(),
        )?;
        info!("wrote {} rows to {}", rows.len(), output_path.display());

        Ok(CrawlSummary {
            output_path,
            rows_written: rows.len(),
            pages_scraped,
            fetch_failures: self.fetch_failures.len(),
            skipped_pages: self.page_failures.len(),
        })
    }
}
