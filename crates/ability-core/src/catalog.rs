use std::collections::BTreeSet;
use std::fmt;

use crate::{
    AbilityError, AbilityHandle, AbilityRef, AbilitySystem, AbilityTag, ResourcePool, WorldMut,
};

/// Abilities an agent may possess, plus the tags it has already acquired.
///
/// The acquired set is the persistent part: it is what a save file stores, and on startup
/// [`AbilityCatalog::possess_acquired`] turns it back into possessions.
pub struct AbilityCatalog<W>
where
    W: WorldMut + 'static,
{
    references: Vec<AbilityRef<W>>,
    acquired: BTreeSet<AbilityTag>,
    clone_abilities: bool,
}

impl<W> fmt::Debug for AbilityCatalog<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityCatalog")
            .field("references", &self.references)
            .field("acquired", &self.acquired)
            .field("clone_abilities", &self.clone_abilities)
            .finish()
    }
}

impl<W> AbilityCatalog<W>
where
    W: WorldMut + 'static,
{
    /// With `clone_abilities` every agent gets a private copy; otherwise possessions share the
    /// catalog's instances (and their runtime state).
    pub fn new(clone_abilities: bool) -> Self {
        Self {
            references: Vec::new(),
            acquired: BTreeSet::new(),
            clone_abilities,
        }
    }

    pub fn add_reference(&mut self, ability: AbilityRef<W>) {
        self.references.push(ability);
    }

    pub fn with_reference(mut self, ability: AbilityRef<W>) -> Self {
        self.add_reference(ability);
        self
    }

    pub fn with_acquired(mut self, tags: impl IntoIterator<Item = AbilityTag>) -> Self {
        self.acquired.extend(tags);
        self
    }

    pub fn references(&self) -> &[AbilityRef<W>] {
        &self.references
    }

    pub fn reference_by_tag(&self, tag: AbilityTag) -> Option<&AbilityRef<W>> {
        self.references.iter().find(|a| a.borrow().tag() == tag)
    }

    pub fn clone_abilities(&self) -> bool {
        self.clone_abilities
    }

    pub fn is_acquired(&self, tag: AbilityTag) -> bool {
        self.acquired.contains(&tag)
    }

    pub fn acquired_tags(&self) -> impl Iterator<Item = AbilityTag> + '_ {
        self.acquired.iter().copied()
    }

    /// Possesses every reference whose tag has been acquired, in catalog order.
    pub fn possess_acquired<P>(
        &self,
        system: &mut AbilitySystem<W, P>,
        world: &mut W,
    ) -> Result<Vec<AbilityHandle>, AbilityError>
    where
        P: ResourcePool,
    {
        let mut handles = Vec::new();
        for ability in &self.references {
            let tag = ability.borrow().tag();
            if self.acquired.contains(&tag) {
                handles.push(self.possess(ability, system, world)?);
            }
        }
        Ok(handles)
    }

    /// Possesses the reference carrying `tag` and records the tag as acquired.
    ///
    /// Returns `Ok(None)` if the tag was already acquired or no reference carries it. If
    /// possession fails the tag stays unacquired, so the call can be retried.
    pub fn acquire_tag<P>(
        &mut self,
        tag: AbilityTag,
        system: &mut AbilitySystem<W, P>,
        world: &mut W,
    ) -> Result<Option<AbilityHandle>, AbilityError>
    where
        P: ResourcePool,
    {
        if self.acquired.contains(&tag) {
            tracing::debug!(tag = tag.id(), "ability already acquired");
            return Ok(None);
        }

        let Some(ability) = self.reference_by_tag(tag).cloned() else {
            tracing::debug!(tag = tag.id(), "no ability carries tag");
            return Ok(None);
        };
        let handle = self.possess(&ability, system, world)?;
        self.acquired.insert(tag);
        Ok(Some(handle))
    }

    fn possess<P>(
        &self,
        ability: &AbilityRef<W>,
        system: &mut AbilitySystem<W, P>,
        world: &mut W,
    ) -> Result<AbilityHandle, AbilityError>
    where
        P: ResourcePool,
    {
        if self.clone_abilities {
            system.acquire_copy(ability, world)
        } else {
            system.acquire(ability.clone(), world)
        }
    }
}
