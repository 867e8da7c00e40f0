use serde::{Deserialize, Serialize};

/// One row of the faculty directory store.
///
/// Immutable input to author resolution. Only `name` is guaranteed; every
/// link may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacultyRecord {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid_url: Option<String>,

    /// University directory profile (publication tab lives under it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,

    /// dblp-style bibliography profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibliography_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scholar_url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub websites: Vec<String>,
}

impl FacultyRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_orcid(mut self, orcid_url: impl Into<String>) -> Self {
        self.orcid_url = Some(orcid_url.into());
        self
    }

    pub fn with_profile(mut self, profile_url: impl Into<String>) -> Self {
        self.profile_url = Some(profile_url.into());
        self
    }

    /// Key used for per-faculty caches.
    pub fn cache_key(&self) -> &str {
        self.name.trim()
    }
}
