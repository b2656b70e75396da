use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Category identifier of an ability, used for gating and lookup.
///
/// Tags are minted by a [`TagRegistry`] so that a name maps to exactly one tag and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AbilityTag(pub u32);

impl AbilityTag {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AbilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of behavior backing an ability (`"jump"`, `"move"`, ...).
///
/// Replaces lookups by concrete type: a behavior reports its kind and the system indexes the
/// first ability registered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbilityKind(pub &'static str);

impl fmt::Display for AbilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0)
    }
}

/// Interns tag names into [`AbilityTag`]s.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    by_name: BTreeMap<String, AbilityTag>,
    names: Vec<String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tag for `name`, minting a new one on first use.
    pub fn intern(&mut self, name: &str) -> AbilityTag {
        if let Some(tag) = self.by_name.get(name) {
            return *tag;
        }
        let tag = AbilityTag(self.names.len() as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), tag);
        tag
    }

    pub fn get(&self, name: &str) -> Option<AbilityTag> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, tag: AbilityTag) -> Option<&str> {
        self.names.get(tag.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AbilityTag, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (AbilityTag(i as u32), name.as_str()))
    }
}
