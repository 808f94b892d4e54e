//! Hierarchical content names

use crate::{NdnError, NdnResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Hierarchical name made of ordered components, e.g. `/video/seg3/probe`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// Root name (`/`)
    pub const fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Parse from a URI such as `/a/b/c`
    ///
    /// Empty components (`//`) are skipped. A leading `ndn:` scheme is accepted.
    pub fn parse(uri: &str) -> NdnResult<Self> {
        let path = uri.strip_prefix("ndn:").unwrap_or(uri);
        if !path.starts_with('/') {
            return Err(NdnError::InvalidName(uri.to_string()));
        }

        let components = path
            .split('/')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self { components })
    }

    /// Number of components
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether this is the root name
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    /// Append a component
    pub fn append(mut self, component: impl Into<String>) -> Self {
        self.components.push(component.into());
        self
    }

    /// First `n` components (the whole name if it is shorter)
    pub fn prefix(&self, n: usize) -> Self {
        Self {
            components: self.components.iter().take(n).cloned().collect(),
        }
    }

    /// First `n` components, borrowed
    pub fn prefix_components(&self, n: usize) -> &[String] {
        &self.components[..n.min(self.components.len())]
    }

    /// All components
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Whether `self` is a prefix of `other`
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.len() <= other.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }

    /// URI form
    pub fn to_uri(&self) -> String {
        self.to_string()
    }

    /// Whether the URI contains `marker` (e.g. the probe suffix `/probe`)
    pub fn contains_marker(&self, marker: &str) -> bool {
        !marker.is_empty() && self.to_uri().contains(marker)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for c in &self.components {
            write!(f, "/{}", c)?;
        }
        Ok(())
    }
}

// Hashes and compares exactly like the component vector, so maps keyed by
// `Name` can be queried with a borrowed prefix.
impl Borrow<[String]> for Name {
    fn borrow(&self) -> &[String] {
        &self.components
    }
}

impl From<&[String]> for Name {
    fn from(components: &[String]) -> Self {
        Self {
            components: components.to_vec(),
        }
    }
}

impl FromStr for Name {
    type Err = NdnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
