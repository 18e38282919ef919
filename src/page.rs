//! Pulling a representative image URL out of article HTML.
//!
//! Meta tags are the publisher's own pick and win outright; inline images
//! are a weaker signal and must both declare a large size and look like a
//! raster file before we trust them.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Meta keys checked for an image, in priority order.
const META_IMAGE_KEYS: &[&str] = &["og:image", "og:image:secure_url", "twitter:image"];

/// Minimum declared width or height for an inline `<img>` to count.
const MIN_INLINE_DIMENSION: u32 = 300;

const RASTER_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];

/// Extract the most promising image URL from a page.
///
/// Relative URLs are resolved against `base`. Returns `None` when the page
/// offers nothing that passes the filters.
pub fn extract_image_url(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);

    // Publishers label their meta tags with either attribute, so check both.
    for key in META_IMAGE_KEYS {
        for attr in ["property", "name"] {
            let Ok(selector) = Selector::parse(&format!("meta[{attr}='{key}']")) else {
                continue;
            };
            for element in document.select(&selector) {
                if let Some(content) = element.value().attr("content") {
                    if let Some(absolute) = absolutize(content, base) {
                        return Some(absolute);
                    }
                }
            }
        }
    }

    let Ok(selector) = Selector::parse("img[src]") else {
        return None;
    };
    for element in document.select(&selector) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        if !has_raster_extension(src) || !declares_large_dimension(&element) {
            continue;
        }
        if let Some(absolute) = absolutize(src, base) {
            return Some(absolute);
        }
    }

    None
}

fn declares_large_dimension(element: &ElementRef) -> bool {
    ["width", "height"].iter().any(|name| {
        element
            .value()
            .attr(name)
            .and_then(|value| value.trim().trim_end_matches("px").parse::<u32>().ok())
            .is_some_and(|value| value >= MIN_INLINE_DIMENSION)
    })
}

/// The path part (before any query or fragment) must end in a raster
/// extension.
fn has_raster_extension(src: &str) -> bool {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let lower = path.to_ascii_lowercase();
    RASTER_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn absolutize(candidate: &str, base: &Url) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(absolute) => Some(String::from(absolute)),
        Err(_) => base.join(trimmed).ok().map(String::from),
    }
}
