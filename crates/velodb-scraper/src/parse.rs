//! Product-page field extraction.
//!
//! Applies a site's configured selectors to a parsed document. Extraction is
//! lenient throughout: a selector with no match yields an absent field, never
//! an error, and a record with only a subset of fields populated is valid
//! output. Only a selector that fails to *compile* is treated as an error,
//! since that is a configuration bug rather than a markup change.

use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use velodb_core::sites::FieldSelectors;

use crate::error::ScraperError;

/// Attributes an image URL may live in, probed in order. Both are collected
/// when present, so lazy-loaded galleries contribute their real URLs too.
const IMAGE_ATTRS: [&str; 2] = ["src", "data-src"];

pub(crate) fn parse_selector(raw: &str) -> Result<Selector, ScraperError> {
    Selector::parse(raw).map_err(|e| ScraperError::InvalidSelector {
        selector: raw.to_owned(),
        reason: e.to_string(),
    })
}

/// Compiled form of [`FieldSelectors`], parsed once per site per run.
pub struct PageSelectors {
    name: Option<Selector>,
    price: Option<Selector>,
    description: Option<Selector>,
    battery: Option<Selector>,
    motor_type: Option<Selector>,
    max_speed: Option<Selector>,
    range: Option<Selector>,
    weight: Option<Selector>,
    max_load: Option<Selector>,
    images: Option<Selector>,
}

impl PageSelectors {
    /// Compile every configured selector.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] for the first selector that
    /// does not parse as CSS.
    pub fn compile(raw: &FieldSelectors) -> Result<Self, ScraperError> {
        let one = |s: &Option<String>| -> Result<Option<Selector>, ScraperError> {
            s.as_deref().map(parse_selector).transpose()
        };
        Ok(Self {
            name: one(&raw.name)?,
            price: one(&raw.price)?,
            description: one(&raw.description)?,
            battery: one(&raw.battery)?,
            motor_type: one(&raw.motor_type)?,
            max_speed: one(&raw.max_speed)?,
            range: one(&raw.range)?,
            weight: one(&raw.weight)?,
            max_load: one(&raw.max_load)?,
            images: one(&raw.images)?,
        })
    }
}

/// Fields extracted from one product page, before crawl metadata is attached.
#[derive(Debug, Default)]
pub struct ParsedProduct {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub battery: Option<String>,
    pub motor_type: Option<String>,
    pub max_speed: Option<String>,
    pub range: Option<String>,
    pub weight: Option<String>,
    pub max_load: Option<String>,
    pub images: Vec<String>,
}

/// Apply a compiled selector set to a parsed product page.
#[must_use]
pub fn parse_product_page(doc: &Html, selectors: &PageSelectors) -> ParsedProduct {
    ParsedProduct {
        name: select_text(doc, selectors.name.as_ref()),
        price: select_text(doc, selectors.price.as_ref()).and_then(|raw| clean_price(&raw)),
        description: select_text(doc, selectors.description.as_ref()),
        battery: select_text(doc, selectors.battery.as_ref()),
        motor_type: select_text(doc, selectors.motor_type.as_ref()),
        max_speed: select_text(doc, selectors.max_speed.as_ref()),
        range: select_text(doc, selectors.range.as_ref()),
        weight: select_text(doc, selectors.weight.as_ref()),
        max_load: select_text(doc, selectors.max_load.as_ref()),
        images: select_images(doc, selectors.images.as_ref()),
    }
}

/// Trimmed text of the first element matching `selector`; `None` for no
/// selector, no match, or whitespace-only content.
fn select_text(doc: &Html, selector: Option<&Selector>) -> Option<String> {
    let element = doc.select(selector?).next()?;
    let text = element_text(&element);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Strip currency symbols and separators from a raw price string and parse
/// the remainder as a decimal. `"$1,299.00"` becomes `1299.00`.
fn clean_price(raw: &str) -> Option<Decimal> {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();
    let normalized = filtered.replace(',', "");

    match normalized.parse::<Decimal>() {
        Ok(price) => Some(price),
        Err(_) => {
            tracing::warn!(raw, "could not parse price; omitting field");
            None
        }
    }
}

/// Collect image URLs from every element matching `selector`, reading both
/// `src` and the lazy-load attribute, normalizing protocol-relative URLs,
/// deduplicating exactly, and preserving insertion order.
fn select_images(doc: &Html, selector: Option<&Selector>) -> Vec<String> {
    let Some(selector) = selector else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for element in doc.select(selector) {
        for attr in IMAGE_ATTRS {
            if let Some(value) = element.value().attr(attr) {
                if value.is_empty() {
                    continue;
                }
                let url = normalize_image_url(value);
                if !images.contains(&url) {
                    images.push(url);
                }
            }
        }
    }
    images
}

fn normalize_image_url(src: &str) -> String {
    src.strip_prefix("//")
        .map_or_else(|| src.to_string(), |rest| format!("https://{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> PageSelectors {
        PageSelectors::compile(&FieldSelectors {
            name: Some("h1.product-title".to_string()),
            price: Some("span.product-price".to_string()),
            description: Some("p.product-description".to_string()),
            battery: Some("div.spec-battery".to_string()),
            motor_type: Some("div.spec-motor".to_string()),
            max_speed: Some("div.spec-speed".to_string()),
            range: Some("div.spec-range".to_string()),
            weight: Some("div.spec-weight".to_string()),
            max_load: Some("div.spec-load".to_string()),
            images: Some("img.gallery-image".to_string()),
        })
        .expect("test selectors should compile")
    }

    #[test]
    fn parses_all_fields_from_complete_page() {
        let doc = Html::parse_document(
            r#"
            <h1 class="product-title"> City 750 </h1>
            <span class="product-price">$1,299.00</span>
            <p class="product-description">A commuter e-bike.</p>
            <div class="spec-battery">48V 15Ah</div>
            <div class="spec-motor">Rear hub 750W</div>
            <div class="spec-speed">25 km/h</div>
            <div class="spec-range">100 km</div>
            <div class="spec-weight">28 kg</div>
            <div class="spec-load">150 kg</div>
            <img class="gallery-image" src="https://cdn.example.com/a.jpg">
            "#,
        );
        let parsed = parse_product_page(&doc, &selectors());
        assert_eq!(parsed.name.as_deref(), Some("City 750"));
        assert_eq!(parsed.price, Some("1299.00".parse().unwrap()));
        assert_eq!(parsed.description.as_deref(), Some("A commuter e-bike."));
        assert_eq!(parsed.battery.as_deref(), Some("48V 15Ah"));
        assert_eq!(parsed.motor_type.as_deref(), Some("Rear hub 750W"));
        assert_eq!(parsed.max_speed.as_deref(), Some("25 km/h"));
        assert_eq!(parsed.range.as_deref(), Some("100 km"));
        assert_eq!(parsed.weight.as_deref(), Some("28 kg"));
        assert_eq!(parsed.max_load.as_deref(), Some("150 kg"));
        assert_eq!(parsed.images, vec!["https://cdn.example.com/a.jpg"]);
    }

    #[test]
    fn missing_description_yields_absent_field_not_error() {
        let doc = Html::parse_document(r#"<h1 class="product-title">City 750</h1>"#);
        let parsed = parse_product_page(&doc, &selectors());
        assert_eq!(parsed.name.as_deref(), Some("City 750"));
        assert!(parsed.description.is_none());
        assert!(parsed.price.is_none());
        assert!(parsed.images.is_empty());
    }

    #[test]
    fn unparseable_price_is_omitted() {
        let doc = Html::parse_document(r#"<span class="product-price">Call us</span>"#);
        let parsed = parse_product_page(&doc, &selectors());
        assert!(parsed.price.is_none());
    }

    #[test]
    fn price_with_comma_and_symbol_is_cleaned() {
        assert_eq!(clean_price("$1,299.00"), Some("1299.00".parse().unwrap()));
        assert_eq!(clean_price("€999"), Some("999".parse().unwrap()));
        assert_eq!(clean_price("from 2,499.95 USD"), Some("2499.95".parse().unwrap()));
        assert_eq!(clean_price("TBD"), None);
    }

    #[test]
    fn duplicate_image_sources_appear_once() {
        let doc = Html::parse_document(
            r#"
            <img class="gallery-image" src="https://cdn.example.com/a.jpg">
            <img class="gallery-image" src="https://cdn.example.com/a.jpg">
            "#,
        );
        let parsed = parse_product_page(&doc, &selectors());
        assert_eq!(parsed.images, vec!["https://cdn.example.com/a.jpg"]);
    }

    #[test]
    fn lazy_load_attribute_is_collected_alongside_src() {
        let doc = Html::parse_document(
            r#"<img class="gallery-image"
                    src="https://cdn.example.com/placeholder.gif"
                    data-src="https://cdn.example.com/real.jpg">"#,
        );
        let parsed = parse_product_page(&doc, &selectors());
        assert_eq!(
            parsed.images,
            vec![
                "https://cdn.example.com/placeholder.gif",
                "https://cdn.example.com/real.jpg"
            ]
        );
    }

    #[test]
    fn protocol_relative_image_urls_get_https() {
        let doc = Html::parse_document(
            r#"<img class="gallery-image" src="//cdn.example.com/a.jpg">"#,
        );
        let parsed = parse_product_page(&doc, &selectors());
        assert_eq!(parsed.images, vec!["https://cdn.example.com/a.jpg"]);
    }

    #[test]
    fn image_order_follows_the_page() {
        let doc = Html::parse_document(
            r#"
            <img class="gallery-image" src="https://cdn.example.com/b.jpg">
            <img class="gallery-image" src="https://cdn.example.com/a.jpg">
            "#,
        );
        let parsed = parse_product_page(&doc, &selectors());
        assert_eq!(
            parsed.images,
            vec![
                "https://cdn.example.com/b.jpg",
                "https://cdn.example.com/a.jpg"
            ]
        );
    }

    #[test]
    fn compile_rejects_malformed_selector() {
        let result = PageSelectors::compile(&FieldSelectors {
            name: Some("h1[".to_string()),
            ..FieldSelectors::default()
        });
        assert!(matches!(
            result,
            Err(ScraperError::InvalidSelector { ref selector, .. }) if selector == "h1["
        ));
    }

    #[test]
    fn no_selectors_yields_empty_product() {
        let compiled = PageSelectors::compile(&FieldSelectors::default()).unwrap();
        let doc = Html::parse_document("<h1>anything</h1>");
        let parsed = parse_product_page(&doc, &compiled);
        assert!(parsed.name.is_none());
        assert!(parsed.images.is_empty());
    }
}
