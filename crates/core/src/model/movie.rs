use serde::{Deserialize, Serialize};
use url::Url;

/// Marker the upstream poster URLs carry between the base image path and
/// the size directives appended by the image CDN.
const RESIZE_MARKER: &str = "._";

/// Size directive for quiz-sized posters.
const RESIZE_SUFFIX: &str = "._V0_UX600_.jpg";

/// A single catalog entry: a titled movie with its rating as delivered
/// by the upstream API and a full-size poster URL.
///
/// The rating is kept as raw text; upstream sometimes ships placeholders
/// that do not parse, and those must score as `0.0` rather than fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    title: String,
    rating: String,
    image_url: Url,
}

impl Movie {
    #[must_use]
    pub fn new(title: impl Into<String>, rating: impl Into<String>, image_url: Url) -> Self {
        Self {
            title: title.into(),
            rating: rating.into(),
            image_url,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw rating text as delivered by the API.
    #[must_use]
    pub fn rating(&self) -> &str {
        &self.rating
    }

    /// Rating parsed to a float; unparseable text counts as `0.0`.
    #[must_use]
    pub fn rating_value(&self) -> f64 {
        self.rating.trim().parse().unwrap_or(0.0)
    }

    #[must_use]
    pub fn image_url(&self) -> &Url {
        &self.image_url
    }

    /// Poster URL rewritten to the quiz display size.
    ///
    /// Truncates the URL at the first `._` marker and appends the fixed
    /// size suffix. Falls back to the original URL when the marker is
    /// absent or the rewritten string is not a valid URL.
    #[must_use]
    pub fn resized_image_url(&self) -> Url {
        let raw = self.image_url.as_str();
        let Some(base) = raw.split(RESIZE_MARKER).next().filter(|b| b.len() < raw.len()) else {
            return self.image_url.clone();
        };
        Url::parse(&format!("{base}{RESIZE_SUFFIX}")).unwrap_or_else(|_| self.image_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(rating: &str, url: &str) -> Movie {
        Movie::new("The Test", rating, Url::parse(url).unwrap())
    }

    #[test]
    fn parses_valid_rating() {
        assert_eq!(movie("8.4", "https://img.example/a.jpg").rating_value(), 8.4);
    }

    #[test]
    fn invalid_rating_is_zero() {
        assert_eq!(movie("N/A", "https://img.example/a.jpg").rating_value(), 0.0);
        assert_eq!(movie("", "https://img.example/a.jpg").rating_value(), 0.0);
    }

    #[test]
    fn resizes_poster_url_at_marker() {
        let m = movie(
            "7.0",
            "https://m.media-amazon.com/images/M/abc123._V1_UX128_CR0,3,128,176_AL_.jpg",
        );
        assert_eq!(
            m.resized_image_url().as_str(),
            "https://m.media-amazon.com/images/M/abc123._V0_UX600_.jpg"
        );
    }

    #[test]
    fn url_without_marker_is_returned_unchanged() {
        let m = movie("7.0", "https://img.example/poster.jpg");
        assert_eq!(m.resized_image_url(), *m.image_url());
    }
}
