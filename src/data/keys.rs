//! Classification of `development_status` keys by shape.
//!
//! - `epic-<N>` is an epic
//! - `epic-<N>-retrospective` is that epic's retrospective
//! - `<epic>-<story>[suffix][-<slug>]` is a story

use once_cell::sync::Lazy;
use regex::Regex;

static EPIC_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^epic-(\d+)$").unwrap());
static RETROSPECTIVE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^epic-(\d+)-retrospective$").unwrap());
static STORY_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)-(\d+)([a-z])?(?:-(.+))?$").unwrap());

/// Numeric parts of a story key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryKeyParts {
    pub epic: u32,
    pub story: u32,
    pub suffix: Option<char>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SprintKey {
    Epic(u32),
    Retrospective(u32),
    Story(StoryKeyParts),
    /// A key matching none of the known shapes. Ignored by all derivations.
    Unrecognized,
}

pub fn classify_key(key: &str) -> SprintKey {
    if let Some(caps) = RETROSPECTIVE_KEY.captures(key) {
        if let Ok(n) = caps[1].parse() {
            return SprintKey::Retrospective(n);
        }
    }
    if let Some(caps) = EPIC_KEY.captures(key) {
        if let Ok(n) = caps[1].parse() {
            return SprintKey::Epic(n);
        }
    }
    match parse_story_key(key) {
        Some(parts) => SprintKey::Story(parts),
        None => SprintKey::Unrecognized,
    }
}

pub fn parse_story_key(key: &str) -> Option<StoryKeyParts> {
    let caps = STORY_KEY.captures(key)?;
    Some(StoryKeyParts {
        epic: caps[1].parse().ok()?,
        story: caps[2].parse().ok()?,
        suffix: caps.get(3).and_then(|m| m.as_str().chars().next()),
        slug: caps.get(4).map(|m| m.as_str().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_epic_and_retrospective() {
        assert_eq!(classify_key("epic-3"), SprintKey::Epic(3));
        assert_eq!(classify_key("epic-12-retrospective"), SprintKey::Retrospective(12));
    }

    #[test]
    fn test_classify_story_shapes() {
        let SprintKey::Story(parts) = classify_key("2-4b-user-login") else {
            panic!("expected story key");
        };
        assert_eq!(parts.epic, 2);
        assert_eq!(parts.story, 4);
        assert_eq!(parts.suffix, Some('b'));
        assert_eq!(parts.slug.as_deref(), Some("user-login"));

        let SprintKey::Story(bare) = classify_key("1-1") else {
            panic!("expected story key");
        };
        assert_eq!(bare.slug, None);
        assert_eq!(bare.suffix, None);
    }

    #[test]
    fn test_unrecognized_keys() {
        assert_eq!(classify_key("epic-x"), SprintKey::Unrecognized);
        assert_eq!(classify_key("notes"), SprintKey::Unrecognized);
        assert_eq!(classify_key("1.2-story"), SprintKey::Unrecognized);
    }
}
