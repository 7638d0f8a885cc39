//! Share links
//!
//! `{base}/n/{id}#{key}` for link-mode notes, `{base}/n/{id}` for password
//! notes. The key sits in the fragment, which browsers never send to the
//! server.

use secrecy::{ExposeSecret, SecretString};

use crate::{NoteError, Result};

const NOTE_SEGMENT: &str = "/n/";

#[derive(Debug, Clone)]
pub struct ShareLink {
    base_url: String,
    id: String,
    key: Option<SecretString>,
}

impl ShareLink {
    pub fn new(base_url: &str, id: &str, key: Option<SecretString>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            id: id.to_string(),
            key,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn key(&self) -> Option<&SecretString> {
        self.key.as_ref()
    }

    /// Full link, key included. Treat the result as a secret.
    pub fn to_url(&self) -> String {
        match &self.key {
            Some(key) => format!(
                "{}{NOTE_SEGMENT}{}#{}",
                self.base_url,
                self.id,
                key.expose_secret()
            ),
            None => format!("{}{NOTE_SEGMENT}{}", self.base_url, self.id),
        }
    }

    pub fn parse(link: &str) -> Result<Self> {
        let link = link.trim();
        let (location, fragment) = match link.split_once('#') {
            Some((location, fragment)) => (location, Some(fragment)),
            None => (link, None),
        };

        let split = location
            .rfind(NOTE_SEGMENT)
            .ok_or_else(|| NoteError::InvalidLink("no note path".to_string()))?;
        let base_url = &location[..split];
        let id = location[split + NOTE_SEGMENT.len()..]
            .split(['?', '/'])
            .next()
            .unwrap_or_default();

        if id.is_empty() {
            return Err(NoteError::InvalidLink("missing note id".to_string()));
        }

        let key = fragment
            .filter(|f| !f.is_empty())
            .map(|f| SecretString::new(f.to_string()));

        Ok(Self::new(base_url, id, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_mode_url() {
        let link = ShareLink::new(
            "https://notes.example/",
            "abc123",
            Some(SecretString::new("k3y".to_string())),
        );
        assert_eq!(link.to_url(), "https://notes.example/n/abc123#k3y");
    }

    #[test]
    fn test_password_mode_url_has_no_fragment() {
        let link = ShareLink::new("https://notes.example", "abc123", None);
        assert_eq!(link.to_url(), "https://notes.example/n/abc123");
    }

    #[test]
    fn test_parse_roundtrip() {
        let parsed = ShareLink::parse("https://notes.example/n/abc123#k3y").unwrap();
        assert_eq!(parsed.base_url(), "https://notes.example");
        assert_eq!(parsed.id(), "abc123");
        assert_eq!(parsed.key().unwrap().expose_secret(), "k3y");
    }

    #[test]
    fn test_parse_ignores_query_and_empty_fragment() {
        let parsed = ShareLink::parse("http://localhost:8787/n/abc123?ref=mail#").unwrap();
        assert_eq!(parsed.id(), "abc123");
        assert!(parsed.key().is_none());
    }

    #[test]
    fn test_parse_rejects_non_note_links() {
        assert!(matches!(
            ShareLink::parse("https://notes.example/about"),
            Err(NoteError::InvalidLink(_))
        ));
        assert!(matches!(
            ShareLink::parse("https://notes.example/n/#key"),
            Err(NoteError::InvalidLink(_))
        ));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let link = ShareLink::new("https://x", "abc123", Some(SecretString::new("topsecret".into())));
        assert!(!format!("{link:?}").contains("topsecret"));
    }
}
