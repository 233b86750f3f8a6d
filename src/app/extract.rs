//! Product page extraction: element lookup, breadcrumbs, swatch variants,
//! resource links and the per-page row builder.

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::config::{PayloadLayout, SiteProfile};
use super::types::{ModelNumberSet, ModelVariant, PageError, ProductRow, VariantError};

const LINK_TAG: &str = "a";
const NAME_TAG: &str = "h1";
const DESCRIPTION_TAG: &str = "p";
const FEATURES_TAG: &str = "div";
const COLORS_TAG: &str = "div";
const SWATCH_TAG: &str = "div";

/// Elements below `root` (not `root` itself) with the given tag, in document order.
fn elements_by_tag<'a>(root: ElementRef<'a>, tag: &str) -> impl Iterator<Item = ElementRef<'a>> {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name().eq_ignore_ascii_case(tag))
}

/// Elements with `tag` whose class attribute contains `class_substring`,
/// ignoring ASCII case. `"btn"` matches both `btn-primary` and `my-btn-x`.
pub fn find_by_class<'a>(
    root: ElementRef<'a>,
    tag: &str,
    class_substring: &str,
) -> Vec<ElementRef<'a>> {
    let needle = class_substring.to_ascii_lowercase();
    elements_by_tag(root, tag)
        .filter(|el| {
            el.value()
                .attr("class")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .contains(&needle)
        })
        .collect()
}

pub fn find_by_id<'a>(root: ElementRef<'a>, id: &str) -> Option<ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().id() == Some(id))
}

/// Breadcrumb labels, root category first.
pub fn categories(doc: &Html, profile: &SiteProfile) -> Result<Vec<String>, PageError> {
    let nav = find_by_id(doc.root_element(), &profile.breadcrumb_id)
        .ok_or(PageError::MissingBreadcrumb)?;

    Ok(elements_by_tag(nav, LINK_TAG)
        .filter_map(|link| link.value().attr("title"))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// Removes one wrapping quote from each end of a payload field.
fn unquote(field: &str) -> &str {
    let field = field.trim();
    let field = field.strip_prefix(['\'', '"']).unwrap_or(field);
    field.strip_suffix(['\'', '"']).unwrap_or(field)
}

fn format_price(raw: &str) -> Result<String, VariantError> {
    let cleaned = raw.trim();
    let cleaned = cleaned.strip_prefix('$').unwrap_or(cleaned).trim();
    if cleaned.is_empty() {
        return Ok("0.00".to_string());
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(format!("{value:.2}")),
        _ => Err(VariantError::MalformedPayload {
            reason: format!("list price {raw:?} is not a number"),
        }),
    }
}

/// Parses one swatch's `data-getdata` style payload, e.g.
/// `['K-1234-0','19.5',...,'https://img/x.jpg']`.
pub fn parse_variant_payload(
    payload: &str,
    layout: PayloadLayout,
) -> Result<ModelVariant, VariantError> {
    let inner = payload.trim();
    let inner = inner.strip_prefix('[').unwrap_or(inner);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    let fields = inner.split(',').collect::<Vec<_>>();
    let needed = layout.min_fields();
    if fields.len() < needed {
        return Err(VariantError::MalformedPayload {
            reason: format!("expected at least {needed} fields, found {}", fields.len()),
        });
    }

    let model_number = unquote(fields[layout.model_number]);
    if model_number.is_empty() {
        return Err(VariantError::MalformedPayload {
            reason: "empty model number".to_string(),
        });
    }

    Ok(ModelVariant {
        model_number: model_number.to_string(),
        list_price: format_price(unquote(fields[layout.list_price]))?,
        image_link: unquote(fields[layout.image_link]).to_string(),
    })
}

/// Variants from the color swatch container. Malformed swatches are logged and
/// skipped; the remaining swatches are still returned.
pub fn model_variants(doc: &Html, profile: &SiteProfile) -> Result<Vec<ModelVariant>, PageError> {
    let container = find_by_class(doc.root_element(), COLORS_TAG, &profile.colors_class)
        .into_iter()
        .next()
        .ok_or(PageError::MissingSwatchContainer)?;

    let mut variants = Vec::new();
    for swatch in elements_by_tag(container, SWATCH_TAG) {
        let Some(payload) = swatch.value().attr(&profile.swatch_payload_attr) else {
            continue;
        };
        match parse_variant_payload(payload, profile.payload_layout) {
            Ok(variant) => variants.push(variant),
            Err(err) => warn!("skipping swatch: {err}"),
        }
    }

    Ok(variants)
}

/// The argument of a handler such as `window.open('/docs/x.pdf')`.
fn quoted_argument(handler: &str) -> Option<&str> {
    let open = handler.find('(')?;
    let rest = handler[open + 1..].trim_start();
    let quote = rest.chars().next().filter(|c| matches!(c, '\'' | '"'))?;
    let body = &rest[quote.len_utf8()..];
    let end = body.find(quote)?;
    Some(&body[..end]).filter(|path| !path.trim().is_empty())
}

fn handler_path<'h>(handler: &'h str, profile: &SiteProfile) -> Option<&'h str> {
    quoted_argument(handler).or_else(|| {
        let end = handler.len().checked_sub(profile.handler_suffix_len)?;
        handler
            .get(profile.handler_prefix_len..end)
            .filter(|path| !path.trim().is_empty())
    })
}

/// Absolute URLs of the downloadable resources, joined with `", "`.
pub fn document_links(doc: &Html, profile: &SiteProfile) -> Result<String, PageError> {
    let section = find_by_id(doc.root_element(), &profile.resources_id)
        .ok_or(PageError::MissingResourcesSection)?;

    let mut links = Vec::new();
    for anchor in elements_by_tag(section, LINK_TAG) {
        let handler = anchor.value().attr("onclick").unwrap_or_default().trim();
        if handler.is_empty() {
            continue;
        }
        match handler_path(handler, profile).and_then(|path| profile.absolute_url(path)) {
            Some(link) => links.push(link),
            None => debug!("ignoring resource handler {handler:?}"),
        }
    }

    Ok(links.join(", "))
}

/// Turns product detail pages into export rows.
pub struct ItemScraper<'p> {
    profile: &'p SiteProfile,
}

impl<'p> ItemScraper<'p> {
    pub fn new(profile: &'p SiteProfile) -> Self {
        Self { profile }
    }

    fn first<'a>(
        &self,
        doc: &'a Html,
        field: &'static str,
        tag: &'static str,
        class: &str,
    ) -> Result<ElementRef<'a>, PageError> {
        find_by_class(doc.root_element(), tag, class)
            .into_iter()
            .next()
            .ok_or_else(|| PageError::MissingElement {
                field,
                tag,
                class: class.to_string(),
            })
    }

    /// One row per variant whose model number has not been emitted yet.
    /// `seen` is left untouched when the page is rejected.
    pub fn scrape(
        &self,
        doc: &Html,
        source_url: &str,
        seen: &mut ModelNumberSet,
    ) -> Result<Vec<ProductRow>, PageError> {
        let profile = self.profile;
        let name = self
            .first(doc, "name", NAME_TAG, &profile.name_class)?
            .text()
            .collect::<String>()
            .trim()
            .to_string();
        let description_html = self
            .first(doc, "description", DESCRIPTION_TAG, &profile.description_class)?
            .html();
        let features_html = self
            .first(doc, "features", FEATURES_TAG, &profile.features_class)?
            .html();
        let mut levels = categories(doc, profile)?.into_iter();
        let documents = document_links(doc, profile)?;
        let variants = model_variants(doc, profile)?;

        let category1 = levels.next().unwrap_or_default();
        let category2 = levels.next();
        let category3 = levels.next();

        let mut rows = Vec::with_capacity(variants.len());
        for variant in variants {
            if !seen.insert(&variant.model_number) {
                debug!("model {} already exported", variant.model_number);
                continue;
            }
            rows.push(ProductRow {
                name: name.clone(),
                category1: category1.clone(),
                category2: category2.clone(),
                category3: category3.clone(),
                description_html: description_html.clone(),
                model_number: variant.model_number,
                list_price: variant.list_price,
                image_link: variant.image_link,
                document_links: documents.clone(),
                features_html: features_html.clone(),
                source_url: source_url.to_string(),
            });
        }

        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A product page in the storefront's markup; each swatch is `(model, price)`.
    pub fn product_page(name: &str, swatches: &[(&str, &str)]) -> String {
        let swatch_divs = swatches
            .iter()
            .map(|(model, price)| {
                format!(
                    r#"<div class="swatch" data-getdata="['{model}','{price}','x','x','x','x','x','x','x','x','https://img.example.com/{model}.jpg']"></div>"#
                )
            })
            .collect::<String>();

        format!(
            r#"<!DOCTYPE html>
<html><head><title>{name}</title></head><body>
<ul id="breadcrumb-navigation">
  <li><a href="/us/Bathroom" title="Bathroom">Bathroom</a></li>
  <li><a href="/us/Toilets" title="Toilets">Toilets</a></li>
</ul>
<h1 class="product-detail__name">  {name}  </h1>
<p class="product-detail__features-description">A <b>quiet</b> flush.</p>
<div class="product-detail__features-list"><ul><li>Dual flush</li></ul></div>
<div class="product-detail__colors">{swatch_divs}</div>
<div id="product-detail__parts-and-resources">
  <a href="" onclick="window.open('/webassets/kpna/install.pdf')">Install guide</a>
  <a href="/parts">Parts</a>
  <a href="" onclick="window.open('/webassets/kpna/spec.pdf')">Spec sheet</a>
</div>
</body></html>"#
        )
    }
}
