//! Heuristic inverse of the product URL template.
//!
//! Given a candidate link, the site's base URL, and the templated product
//! URL, recover the product id. The primary rule locates the literal path
//! prefix that precedes the `{product_id}` placeholder in the template and
//! takes whatever follows its first occurrence in the candidate path. When
//! that fails, a fallback scans path segments for well-known marker words.
//! This is pattern matching, not a grammar: a template whose prefix occurs
//! twice in a path, or that has no literal prefix at all, is ambiguous and
//! resolves to the first occurrence.

use velodb_core::sites::PRODUCT_ID_PLACEHOLDER;

/// Path segments that conventionally precede a product id.
const ID_MARKERS: [&str; 3] = ["products", "bikes", "p"];

/// Extract a product id from `url`, resolving relative candidates against
/// `base_url`. Returns `None` when neither the template rule nor the marker
/// fallback yields a non-empty id.
#[must_use]
pub fn extract_product_id(url: &str, base_url: &str, template: &str) -> Option<String> {
    let without_query = url.split('?').next().unwrap_or(url);
    let trimmed = without_query.trim_end_matches('/');

    let path = candidate_path(trimmed, base_url)?;

    let template_path = url_path(template);
    if let Some(marker_idx) = template_path.find(PRODUCT_ID_PLACEHOLDER) {
        let prefix = &template_path[..marker_idx];
        if let Some(pos) = path.find(prefix) {
            let id = path[pos + prefix.len()..].trim_end_matches('/');
            if !id.is_empty() {
                tracing::debug!(url, id, "extracted product id from template prefix");
                return Some(id.to_string());
            }
        }
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for marker in ID_MARKERS {
        if let Some(i) = segments.iter().position(|s| *s == marker) {
            if i + 1 < segments.len() {
                let id = segments[i + 1..].join("/");
                tracing::debug!(url, id = %id, marker, "extracted product id via marker fallback");
                return Some(id);
            }
        }
    }

    tracing::warn!(url, "could not extract product id");
    None
}

/// Path component of an already-absolute candidate, or of a relative one
/// resolved against `base_url`.
fn candidate_path(url: &str, base_url: &str) -> Option<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Some(url_path(url).to_string());
    }
    let base = reqwest::Url::parse(base_url.trim_end_matches('/')).ok()?;
    let joined = base.join(url).ok()?;
    Some(joined.path().trim_end_matches('/').to_string())
}

/// Path component of a URL string, without parsing it as a `Url`: the
/// template contains literal `{` `}` that URL parsing would percent-encode.
fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.find('/').map_or("/", |i| &rest[i..])
}
