//! YAML roster: ability definitions, the agent's acquired tags and starting stats.
//!
//! ```yaml
//! clone_abilities: true
//! acquired: [move, jump]
//! stats:
//!   energy: 100
//! abilities:
//!   - name: jump
//!     kind: jump
//!     input_buffer: 0.2
//!     energy_cost: 10
//!     blocked_by: [dash]
//! ```
//!
//! Tag lists refer to other abilities by tag name (the ability name unless `tag` is given).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Ability, AbilityBehavior, AbilityCatalog, AbilityDefinition, AbilityFlags, AbilityStats,
    AbilityTag, TagRegistry, WorldMut,
};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ability `{ability}` uses unknown kind `{kind}`")]
    UnknownKind { ability: String, kind: String },
    #[error("tag `{0}` is declared by more than one ability")]
    DuplicateTag(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Roster {
    /// Give every agent a private copy instead of sharing one instance.
    pub clone_abilities: bool,
    /// Tag names already acquired (the persisted part of an agent).
    pub acquired: Vec<String>,
    pub stats: AbilityStats,
    pub abilities: Vec<RosterAbility>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterAbility {
    pub name: String,
    /// Behavior kind, resolved through a [`BehaviorLibrary`].
    pub kind: String,
    /// Tag name; defaults to `name`.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub cooldown: f32,
    #[serde(default)]
    pub input_buffer: f32,
    #[serde(default)]
    pub energy_cost: f32,
    #[serde(default)]
    pub blocked_by: Vec<String>,
    #[serde(default)]
    pub allowed_by: Vec<String>,
    #[serde(default)]
    pub finish_on_start: Vec<String>,
    #[serde(default)]
    pub finish_on_end: Vec<String>,
    #[serde(default)]
    pub flags: AbilityFlags,
}

impl RosterAbility {
    pub fn tag_name(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }
}

type BehaviorFactory<W> = Box<dyn Fn() -> Box<dyn AbilityBehavior<W>>>;

/// Maps roster `kind` names to behavior constructors.
pub struct BehaviorLibrary<W>
where
    W: WorldMut + 'static,
{
    factories: BTreeMap<String, BehaviorFactory<W>>,
}

impl<W> BehaviorLibrary<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register<B, F>(&mut self, kind: impl Into<String>, make: F)
    where
        B: AbilityBehavior<W>,
        F: Fn() -> B + 'static,
    {
        self.factories
            .insert(kind.into(), Box::new(move || Box::new(make())));
    }

    pub fn with<B, F>(mut self, kind: impl Into<String>, make: F) -> Self
    where
        B: AbilityBehavior<W>,
        F: Fn() -> B + 'static,
    {
        self.register(kind, make);
        self
    }

    pub fn create(&self, kind: &str) -> Option<Box<dyn AbilityBehavior<W>>> {
        self.factories.get(kind).map(|make| make())
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl<W> Default for BehaviorLibrary<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RosterError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Builds the catalog, interning every tag name into `tags`.
    ///
    /// Tag lists may name tags no ability declares; those stay lookup misses at runtime.
    pub fn compile<W>(
        &self,
        library: &BehaviorLibrary<W>,
        tags: &mut TagRegistry,
    ) -> Result<AbilityCatalog<W>, RosterError>
    where
        W: WorldMut + 'static,
    {
        let mut declared = BTreeSet::new();
        for ability in &self.abilities {
            let name = ability.tag_name();
            if !declared.insert(name) {
                return Err(RosterError::DuplicateTag(name.to_string()));
            }
            tags.intern(name);
        }

        let mut catalog = AbilityCatalog::new(self.clone_abilities);
        for ability in &self.abilities {
            let behavior = library
                .create(&ability.kind)
                .ok_or_else(|| RosterError::UnknownKind {
                    ability: ability.name.clone(),
                    kind: ability.kind.clone(),
                })?;

            let owner = ability.name.as_str();
            let definition = AbilityDefinition {
                name: ability.name.clone(),
                tag: tags.intern(ability.tag_name()),
                base_cooldown: ability.cooldown,
                input_buffer_duration: ability.input_buffer,
                energy_cost: ability.energy_cost,
                blocked_by: intern_list(&ability.blocked_by, owner, &declared, tags),
                allowed_by: intern_list(&ability.allowed_by, owner, &declared, tags),
                finish_on_start: intern_list(&ability.finish_on_start, owner, &declared, tags),
                finish_on_end: intern_list(&ability.finish_on_end, owner, &declared, tags),
                flags: ability.flags,
            };
            catalog.add_reference(Ability::from_boxed(definition, behavior).into_shared());
        }

        let mut acquired = Vec::new();
        for name in &self.acquired {
            match tags.get(name) {
                Some(tag) if declared.contains(name.as_str()) => acquired.push(tag),
                _ => tracing::warn!(tag = %name, "acquired tag matches no ability"),
            }
        }
        Ok(catalog.with_acquired(acquired))
    }
}

fn intern_list(
    names: &[String],
    owner: &str,
    declared: &BTreeSet<&str>,
    tags: &mut TagRegistry,
) -> Vec<AbilityTag> {
    names
        .iter()
        .map(|name| {
            if !declared.contains(name.as_str()) {
                tracing::warn!(ability = owner, tag = %name, "tag list names an undeclared tag");
            }
            tags.intern(name)
        })
        .collect()
}
