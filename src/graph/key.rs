use std::borrow::Borrow;
use std::fmt;

use super::{Endpoints, Link};

/// Canonical identity of a link across snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey(String);

impl LinkKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for LinkKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LinkKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LinkKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for LinkKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// The only place that looks at which endpoint form a link holds.
impl Endpoints {
    pub fn source_id(&self) -> &str {
        match self {
            Self::Raw { source, .. } => source,
            Self::Resolved { source, .. } => &source.id,
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            Self::Raw { target, .. } => target,
            Self::Resolved { target, .. } => &target.id,
        }
    }

    /// Arena indices captured at bind time; `None` while still raw.
    pub fn indices(&self) -> Option<(usize, usize)> {
        match self {
            Self::Raw { .. } => None,
            Self::Resolved { source, target } => Some((source.index, target.index)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.indices().is_some()
    }
}

/// Explicit id wins; otherwise `"{source}-{target}"` read from whichever
/// endpoint form the link currently holds.
pub fn link_key(link: &Link) -> LinkKey {
    if let Some(id) = link.id.as_deref()
        && !id.is_empty()
    {
        return LinkKey(id.to_owned());
    }

    let endpoints = &link.endpoints;
    LinkKey(format!("{}-{}", endpoints.source_id(), endpoints.target_id()))
}
