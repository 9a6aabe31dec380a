use reqwest::Url;
use serde::Serialize;

/// Opaque ID types for type safety
pub type RoundId = String;

/// Primary category used when an image URL does not name a breed
pub const UNKNOWN_BREED: &str = "unknown";

/// Path segment that precedes the breed slug in dog.ceo image URLs
const BREEDS_SEGMENT: &str = "breeds";

/// Capitalize every whitespace-separated word: first letter upper, the rest lower.
pub fn capitalize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn compose_display_name(primary: &str, sub: Option<&str>) -> String {
    match sub {
        Some(sub) => format!("{} {}", capitalize(sub), capitalize(primary)),
        None => capitalize(primary),
    }
}

/// A breed: lowercase primary category plus an optional lowercase sub-category
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct Label {
    primary: String,
    sub: Option<String>,
}

impl Label {
    pub fn new(primary: &str, sub: Option<&str>) -> Self {
        Self {
            primary: primary.to_lowercase(),
            sub: sub.map(str::to_lowercase),
        }
    }

    /// Sentinel for images whose breed could not be derived
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_BREED, None)
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn sub(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    pub fn is_unknown(&self) -> bool {
        self.primary == UNKNOWN_BREED && self.sub.is_none()
    }

    /// "Afghan Hound" for hound/afghan, "Labrador" for labrador
    pub fn display_name(&self) -> String {
        compose_display_name(&self.primary, self.sub.as_deref())
    }

    /// Derive a label from an image URL of the form `<host>/breeds/<slug>/<file>`.
    ///
    /// The slug is split on `-`: exactly two parts means primary and sub-category,
    /// anything else makes the whole slug the primary category. URLs that cannot
    /// be parsed, or whose path does not start with `breeds/<slug>`, yield
    /// [`Label::unknown`].
    pub fn from_image_url(url: &str) -> Self {
        let Some(parsed) = parse_url(url) else {
            return Self::unknown();
        };

        let segments: Vec<&str> = match parsed.path_segments() {
            Some(segments) => segments.filter(|s| !s.is_empty()).collect(),
            None => return Self::unknown(),
        };

        if segments.len() < 2 || segments[0] != BREEDS_SEGMENT {
            return Self::unknown();
        }

        let slug = segments[1];
        let parts: Vec<&str> = slug.split('-').filter(|p| !p.is_empty()).collect();
        if parts.len() == 2 {
            Self::new(parts[0], Some(parts[1]))
        } else {
            Self::new(slug, None)
        }
    }
}

/// Absolute URLs parse directly; bare paths are resolved against a placeholder origin.
fn parse_url(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(_) if url.starts_with('/') => Url::parse("http://localhost/")
            .and_then(|base| base.join(url))
            .ok(),
        Err(_) => None,
    }
}

/// A primary breed and the sub-breeds listed under it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LabelGroup {
    pub primary: String,
    pub subs: Vec<String>,
}

impl LabelGroup {
    pub fn new(primary: impl Into<String>, subs: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            subs,
        }
    }

    /// Every display name this group stands for: one per sub-breed, or the
    /// primary alone when there are none
    pub fn display_names(&self) -> Vec<String> {
        if self.subs.is_empty() {
            vec![compose_display_name(&self.primary, None)]
        } else {
            self.subs
                .iter()
                .map(|sub| compose_display_name(&self.primary, Some(sub)))
                .collect()
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Image {
    pub url: String,
    pub label: Label,
}

impl Image {
    pub fn new(url: impl Into<String>, label: Label) -> Self {
        Self {
            url: url.into(),
            label,
        }
    }

    /// Build an image whose label is derived from its URL path
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let label = Label::from_image_url(&url);
        Self { url, label }
    }

    pub fn display_name(&self) -> String {
        self.label.display_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_sub_breed_url() {
        let label =
            Label::from_image_url("https://images.dog.ceo/breeds/hound-afghan/n02088094_1003.jpg");
        assert_eq!(label.primary(), "hound");
        assert_eq!(label.sub(), Some("afghan"));
        assert_eq!(label.display_name(), "Afghan Hound");
    }

    #[test]
    fn test_label_from_primary_only_url() {
        let label =
            Label::from_image_url("https://images.dog.ceo/breeds/labrador/n02099712_1001.jpg");
        assert_eq!(label.primary(), "labrador");
        assert_eq!(label.sub(), None);
        assert_eq!(label.display_name(), "Labrador");
    }

    #[test]
    fn test_label_from_garbage_is_unknown() {
        let label = Label::from_image_url("not-a-url");
        assert!(label.is_unknown());
        assert_eq!(label.display_name(), "Unknown");
        assert_eq!(label, Label::unknown());
    }

    #[test]
    fn test_label_requires_breeds_segment() {
        assert!(Label::from_image_url("https://images.dog.ceo/dogs/labrador/x.jpg").is_unknown());
        assert!(Label::from_image_url("https://images.dog.ceo/breeds").is_unknown());
        assert!(Label::from_image_url("https://images.dog.ceo/breeds/").is_unknown());
        assert!(Label::from_image_url("https://images.dog.ceo/").is_unknown());
    }

    #[test]
    fn test_label_slug_with_extra_dashes_is_whole_primary() {
        let label = Label::from_image_url("https://images.dog.ceo/breeds/a-b-c/x.jpg");
        assert_eq!(label.primary(), "a-b-c");
        assert_eq!(label.sub(), None);
    }

    #[test]
    fn test_label_from_bare_path() {
        let label = Label::from_image_url("/breeds/retriever-golden/x.jpg");
        assert_eq!(label.display_name(), "Golden Retriever");
    }

    #[test]
    fn test_label_normalizes_case() {
        let a = Label::new("Sheepdog", Some("Himalayan"));
        let b = Label::new("sheepdog", Some("himalayan"));
        assert_eq!(a, b);
        assert_eq!(a.display_name(), "Himalayan Sheepdog");
        assert_ne!(a, Label::new("sheepdog", None));
    }

    #[test]
    fn test_group_display_names() {
        let hound = LabelGroup::new("hound", vec!["afghan".to_string(), "basset".to_string()]);
        assert_eq!(hound.display_names(), vec!["Afghan Hound", "Basset Hound"]);

        let poodle = LabelGroup::new("poodle", vec![]);
        assert_eq!(poodle.display_names(), vec!["Poodle"]);

        let mixed_case = LabelGroup::new("Sheepdog", vec!["Himalayan".to_string()]);
        assert_eq!(mixed_case.display_names(), vec!["Himalayan Sheepdog"]);
    }

    #[test]
    fn test_image_from_url_matches_label_rule() {
        let image = Image::from_url("https://images.dog.ceo/breeds/bulldog-boston/x.jpg");
        assert_eq!(image.label, Label::new("bulldog", Some("boston")));
        assert_eq!(image.display_name(), "Boston Bulldog");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("hound"), "Hound");
        assert_eq!(capitalize("SHIBA"), "Shiba");
        assert_eq!(capitalize(""), "");
    }
}
