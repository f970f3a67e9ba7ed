use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::UnknownCollection;

/// Resource collections the marketing site reads from the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Services,
    Cases,
    Team,
    Testimonials,
    Posts,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Services,
        Collection::Cases,
        Collection::Team,
        Collection::Testimonials,
        Collection::Posts,
    ];

    /// Path segment of the collection on the CMS REST API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Services => "services",
            Collection::Cases => "cases",
            Collection::Team => "team",
            Collection::Testimonials => "testimonials",
            Collection::Posts => "posts",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "services" => Ok(Collection::Services),
            "cases" => Ok(Collection::Cases),
            "team" => Ok(Collection::Team),
            "testimonials" => Ok(Collection::Testimonials),
            "posts" => Ok(Collection::Posts),
            _ => Err(UnknownCollection(s.to_string())),
        }
    }
}

/// A CMS string field delivered as pre-rendered HTML (`{"rendered": "..."}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    pub rendered: String,
}

static BLOCK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(p|br|div|li|ul|ol|h[1-6])\b[^>]*>").expect("block tag regex"));
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|nbsp|hellip|quot|lt|gt|amp);").expect("entity regex"));

// Each entity is decoded exactly once: the output of one match is never rescanned.
fn decode_entity(caps: &Captures) -> String {
    let decoded = match &caps[1] {
        "nbsp" => Some(' '),
        "hellip" => Some('\u{2026}'),
        "quot" => Some('"'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        numeric => numeric[1..].parse::<u32>().ok().and_then(char::from_u32),
    };
    decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
}

impl Rendered {
    pub fn new(html: impl Into<String>) -> Self {
        Self { rendered: html.into() }
    }

    /// The rendered HTML reduced to display text: tags removed, common
    /// entities decoded, whitespace collapsed.
    pub fn plain_text(&self) -> String {
        let text = BLOCK_TAG.replace_all(&self.rendered, " ");
        let text = ANY_TAG.replace_all(&text, "");
        let text = ENTITY.replace_all(&text, decode_entity);
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeaturedMedia {
    // Missing when the media entry is an access error object.
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub alt_text: String,
}

/// The `_embedded` section returned when a request carries `_embed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embedded {
    #[serde(rename = "wp:featuredmedia", default, skip_serializing_if = "Vec::is_empty")]
    pub featured_media: Vec<FeaturedMedia>,
}

/// One unit of marketing content: a service, case study, team member,
/// testimonial or post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    pub slug: String,
    pub title: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
    /// Custom fields; keys depend on the collection.
    #[serde(default, deserialize_with = "custom_fields")]
    pub acf: Map<String, Value>,
}

// The CMS sends `false` or `[]` instead of an object when no custom field is set.
fn custom_fields<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

impl ContentItem {
    pub fn new(id: u64, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            title: Rendered::new(title),
            excerpt: Rendered::default(),
            content: Rendered::default(),
            embedded: None,
            acf: Map::new(),
        }
    }

    pub fn with_excerpt(mut self, html: impl Into<String>) -> Self {
        self.excerpt = Rendered::new(html);
        self
    }

    pub fn with_content(mut self, html: impl Into<String>) -> Self {
        self.content = Rendered::new(html);
        self
    }

    pub fn with_featured_image(mut self, url: impl Into<String>, alt: impl Into<String>) -> Self {
        let media = FeaturedMedia { source_url: url.into(), alt_text: alt.into() };
        self.embedded.get_or_insert_with(Embedded::default).featured_media.push(media);
        self
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.acf.insert(key.to_string(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.acf.get(key)
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    pub fn featured_image_url(&self) -> Option<&str> {
        self.embedded
            .as_ref()?
            .featured_media
            .iter()
            .map(|m| m.source_url.as_str())
            .find(|url| !url.is_empty())
    }
}

/// The collections a landing page renders together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteContent {
    pub services: Vec<ContentItem>,
    pub cases: Vec<ContentItem>,
    pub team: Vec<ContentItem>,
    pub testimonials: Vec<ContentItem>,
}

/// JSON error body shared by every endpoint that reports a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self { error: error.into(), details: Some(details.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_round_trips_through_its_name() {
        for c in Collection::ALL {
            assert_eq!(c.to_string().parse::<Collection>(), Ok(c));
        }
        assert_eq!(" Services ".parse::<Collection>(), Ok(Collection::Services));
        assert_eq!(
            "pages".parse::<Collection>(),
            Err(UnknownCollection("pages".to_string()))
        );
    }

    #[test]
    fn plain_text_strips_markup_and_decodes_entities() {
        let r = Rendered::new("<p>Design &amp; Build&#8217;s <strong>best</strong>&nbsp;work&hellip;</p>\n<p>Next</p>");
        assert_eq!(r.plain_text(), "Design & Build\u{2019}s best work\u{2026} Next");
    }

    #[test]
    fn plain_text_keeps_escaped_entities_escaped_once() {
        assert_eq!(Rendered::new("a &amp;lt; b").plain_text(), "a &lt; b");
        assert_eq!(Rendered::new("x&#99999999;").plain_text(), "x&#99999999;");
        assert_eq!(Rendered::new("&#38;lt;p&#38;gt;").plain_text(), "&lt;p&gt;");
        assert_eq!(Rendered::new("&amp;#60;").plain_text(), "&#60;");
    }

    #[test]
    fn decodes_cms_item_with_missing_optional_fields() {
        let raw = json!({
            "id": 7,
            "slug": "web-development",
            "title": { "rendered": "Web Development" },
            "acf": false,
            "status": "publish"
        });
        let item: ContentItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.id, 7);
        assert!(item.acf.is_empty());
        assert!(item.excerpt.is_empty());
        assert_eq!(item.featured_image_url(), None);
    }

    #[test]
    fn featured_image_skips_media_error_entries() {
        let raw = json!({
            "id": 1,
            "slug": "a",
            "title": { "rendered": "A" },
            "_embedded": {
                "wp:featuredmedia": [
                    { "code": "rest_forbidden" },
                    { "source_url": "https://cdn.example/a.jpg", "alt_text": "A" }
                ],
                "author": [{ "id": 1 }]
            }
        });
        let item: ContentItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.featured_image_url(), Some("https://cdn.example/a.jpg"));
    }

    #[test]
    fn builder_produces_cms_shape() {
        let item = ContentItem::new(3, "seo", "SEO")
            .with_excerpt("<p>Rank</p>")
            .with_featured_image("/img/seo.jpg", "SEO")
            .with_field("service_icon", json!("search"));
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v.pointer("/title/rendered"), Some(&json!("SEO")));
        assert_eq!(v.pointer("/excerpt/rendered"), Some(&json!("<p>Rank</p>")));
        assert_eq!(
            v.pointer("/_embedded/wp:featuredmedia/0/source_url"),
            Some(&json!("/img/seo.jpg"))
        );
        assert_eq!(item.field_str("service_icon"), Some("search"));
    }

    #[test]
    fn error_body_omits_absent_details() {
        let v = serde_json::to_value(ErrorBody::new("URL parameter is required")).unwrap();
        assert_eq!(v, json!({ "error": "URL parameter is required" }));
    }
}
