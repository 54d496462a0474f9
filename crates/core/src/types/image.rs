//! Image reference type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A reference to a product image.
///
/// Catalog data carries images either as a bare URL string or as an object
/// with a `url` field. Both wire shapes deserialize into this one type at the
/// ingestion boundary, so code past that point never re-inspects shapes; it
/// calls [`ImageRef::url`].
///
/// ## Examples
///
/// ```
/// use auric_core::ImageRef;
///
/// let bare: ImageRef = serde_json::from_str(r#""https://cdn.example/ring.jpg""#).unwrap();
/// let object: ImageRef = serde_json::from_str(r#"{"url":"https://cdn.example/ring.jpg"}"#).unwrap();
///
/// assert_eq!(bare.url(), object.url());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    /// A bare URL string.
    Literal(String),
    /// An object wrapping the URL.
    Object {
        /// The image URL.
        url: String,
    },
}

impl ImageRef {
    /// The image URL, regardless of which wire shape it arrived in.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Literal(url) | Self::Object { url } => url,
        }
    }

    /// Consume the reference and return the URL.
    #[must_use]
    pub fn into_url(self) -> String {
        match self {
            Self::Literal(url) | Self::Object { url } => url,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

impl From<String> for ImageRef {
    fn from(url: String) -> Self {
        Self::Literal(url)
    }
}

impl From<&str> for ImageRef {
    fn from(url: &str) -> Self {
        Self::Literal(url.to_owned())
    }
}
