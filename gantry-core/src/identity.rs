//! Hierarchical resource names
//!
//! Google APIs address resources by alternating collection/id segments,
//! e.g. `projects/my-project/locations/us-central1/queues/q1`.

use crate::error::IdentityError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Immutable hierarchical resource path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    segments: Arc<[String]>,
}

impl ResourceIdentity {
    /// Parse a full resource path
    pub fn parse(path: &str) -> Result<Self, IdentityError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }

        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(IdentityError::EmptySegment(path.to_string()));
        }
        if segments.len() % 2 != 0 {
            return Err(IdentityError::OddSegments(path.to_string()));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }

        Ok(Self {
            segments: segments.into(),
        })
    }

    /// `projects/{project_id}`
    pub fn project(project_id: &str) -> Result<Self, IdentityError> {
        Self::root("projects", project_id)
    }

    /// `projects/{project_id}/locations/{location_id}`
    pub fn location(project_id: &str, location_id: &str) -> Result<Self, IdentityError> {
        Self::project(project_id)?.child("locations", location_id)
    }

    fn root(collection: &str, id: &str) -> Result<Self, IdentityError> {
        validate_segment(collection)?;
        validate_segment(id)?;
        Ok(Self {
            segments: vec![collection.to_string(), id.to_string()].into(),
        })
    }

    /// Append a `{collection}/{id}` pair, returning a new identity
    pub fn child(&self, collection: &str, id: &str) -> Result<Self, IdentityError> {
        validate_segment(collection)?;
        validate_segment(id)?;
        let mut segments = self.segments.to_vec();
        segments.push(collection.to_string());
        segments.push(id.to_string());
        Ok(Self {
            segments: segments.into(),
        })
    }

    /// Identity one level up, or `None` at the root
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 2].to_vec().into(),
        })
    }

    /// Trailing id segment (`q1` in `.../queues/q1`)
    pub fn id(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Trailing collection segment (`queues` in `.../queues/q1`)
    pub fn collection(&self) -> &str {
        &self.segments[self.segments.len() - 2]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Fail unless the trailing collection is `expected`
    pub fn ensure_collection(&self, expected: &str) -> Result<(), IdentityError> {
        if self.collection() == expected {
            return Ok(());
        }
        Err(IdentityError::UnexpectedCollection {
            path: self.to_string(),
            expected: expected.to_string(),
        })
    }
}

fn validate_segment(segment: &str) -> Result<(), IdentityError> {
    if segment.is_empty() {
        return Err(IdentityError::EmptySegment(segment.to_string()));
    }
    // Segments are joined into request paths verbatim, so anything that a
    // URL parser would treat as a delimiter or dot-segment is rejected.
    if segment == "." || segment == ".." || !segment.bytes().all(is_id_byte) {
        return Err(IdentityError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b'+')
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for ResourceIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
