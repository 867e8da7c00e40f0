use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const OPENALEX_PREFIX: &str = "https://openalex.org/";

fn strip_openalex_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix(OPENALEX_PREFIX)
        .or_else(|| trimmed.strip_prefix("http://openalex.org/"))
        .unwrap_or(trimmed)
}

/// Author key in the external bibliographic system, e.g. `A5023888391`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    /// Accepts the bare key or the `https://openalex.org/` URL form.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let key = strip_openalex_prefix(input);
        if key.is_empty() || key.contains('/') {
            return Err(CoreError::InvalidIdentifier(input.to_string()));
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn url(&self) -> String {
        format!("{OPENALEX_PREFIX}{}", self.0)
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work key in the external bibliographic system, e.g. `W2741809807`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WorkId(String);

impl WorkId {
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let key = strip_openalex_prefix(input);
        if key.is_empty() || key.contains('/') {
            return Err(CoreError::InvalidIdentifier(input.to_string()));
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn url(&self) -> String {
        format!("{OPENALEX_PREFIX}{}", self.0)
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an author identity was found, strongest evidence first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMethod {
    Orcid,
    Doi,
    #[serde(rename = "pub")]
    Publication,
    Institution,
    Name,
}

impl ResolutionMethod {
    /// The ladder order the resolver walks.
    pub const LADDER: [ResolutionMethod; 5] = [
        ResolutionMethod::Orcid,
        ResolutionMethod::Doi,
        ResolutionMethod::Publication,
        ResolutionMethod::Institution,
        ResolutionMethod::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orcid => "orcid",
            Self::Doi => "doi",
            Self::Publication => "pub",
            Self::Institution => "institution",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orcid" => Ok(Self::Orcid),
            "doi" => Ok(Self::Doi),
            "pub" => Ok(Self::Publication),
            "institution" => Ok(Self::Institution),
            "name" => Ok(Self::Name),
            other => Err(CoreError::InvalidIdentifier(format!(
                "unknown resolution method: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub author_id: AuthorId,
    pub method: ResolutionMethod,
}

/// Outcome of running the resolution ladder for one faculty member.
///
/// `Unresolved` is a normal terminal state meaning "insufficient data".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(AuthorIdentity),
    Unresolved,
}

impl Resolution {
    pub fn resolved(author_id: AuthorId, method: ResolutionMethod) -> Self {
        Self::Resolved(AuthorIdentity { author_id, method })
    }

    pub fn identity(&self) -> Option<&AuthorIdentity> {
        match self {
            Self::Resolved(identity) => Some(identity),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}
