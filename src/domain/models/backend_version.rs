#[cfg(test)]
#[path = "backend_version_test.rs"]
mod tests;

use std::fmt;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionPart {
    Number(i64),
    Text(String),
}

impl fmt::Display for VersionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionPart::Number(num) => return write!(f, "{num}"),
            VersionPart::Text(text) => return write!(f, "{text}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawVersion {
    Parts(Vec<VersionPart>),
    Single(VersionPart),
}

/// Opaque version identifier reported by the backend. Scalars are accepted as
/// a single component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawVersion", into = "Vec<VersionPart>")]
pub struct BackendVersion {
    parts: Vec<VersionPart>,
}

impl BackendVersion {
    pub fn new(parts: Vec<VersionPart>) -> BackendVersion {
        return BackendVersion { parts };
    }

    pub fn parts(&self) -> &[VersionPart] {
        return &self.parts;
    }
}

impl From<RawVersion> for BackendVersion {
    fn from(raw: RawVersion) -> BackendVersion {
        match raw {
            RawVersion::Parts(parts) => return BackendVersion { parts },
            RawVersion::Single(part) => return BackendVersion { parts: vec![part] },
        }
    }
}

impl From<BackendVersion> for Vec<VersionPart> {
    fn from(version: BackendVersion) -> Vec<VersionPart> {
        return version.parts;
    }
}

impl fmt::Display for BackendVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .parts()
            .iter()
            .map(|part| {
                return part.to_string();
            })
            .collect::<Vec<String>>()
            .join(".");

        return write!(f, "{joined}");
    }
}

/// Body of both `GET /is-ready` and `GET /update-data`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: BackendVersion,
}
