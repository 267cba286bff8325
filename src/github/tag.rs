const TAG_PATH_SEGMENT: &str = "/releases/tag/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Tag { name: name.into() }
    }

    pub fn value(&self) -> &str {
        &self.name
    }

    /// Extracts the tag from a `.../releases/tag/<tag>` redirect target.
    pub fn from_location(location: &str) -> Option<Tag> {
        let (_, rest) = location.split_once(TAG_PATH_SEGMENT)?;
        let name = rest
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        if name.is_empty() {
            None
        } else {
            Some(Tag::new(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_a_new_tag() {
        let tag = Tag::new("v1.0.0");

        assert_eq!(tag.value(), "v1.0.0");
    }

    #[test]
    fn should_read_tag_from_absolute_location() {
        let tag = Tag::from_location("https://github.com/streamlink/windows-builds/releases/tag/7.1.2-1");

        assert_eq!(tag, Some(Tag::new("7.1.2-1")));
    }

    #[test]
    fn should_read_tag_from_relative_location_with_query() {
        let tag = Tag::from_location("/owner/repo/releases/tag/v2.5.1/?tab=assets#x");

        assert_eq!(tag, Some(Tag::new("v2.5.1")));
    }

    #[test]
    fn should_reject_location_without_tag() {
        assert_eq!(Tag::from_location("https://github.com/owner/repo/releases"), None);
        assert_eq!(Tag::from_location("https://github.com/owner/repo/releases/tag/"), None);
    }
}
