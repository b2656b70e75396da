use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    AbilityCx, AbilityDefinition, AbilityError, AbilityKind, AbilityRef, AbilityRequest,
    AbilityStats, AbilityTag, AgentId, GameState, GameStateManager, GateVerdict, InputAction,
    QuitRequested, ResourcePool, Signal, Subscription, TickContext, Timer, TimerState, TraceEvent,
    TraceKind, TraceSink, WorldMut,
};

static NEXT_SYSTEM_ID: AtomicU64 = AtomicU64::new(1);

/// Stable index of a possessed ability, returned by acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct AbilityHandle(usize);

impl AbilityHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Raw,
    Update,
    Fixed,
}

impl Hook {
    fn name(self) -> &'static str {
        match self {
            Hook::Raw => "raw_update",
            Hook::Update => "update",
            Hook::Fixed => "fixed_update",
        }
    }
}

struct Possession<W>
where
    W: WorldMut + 'static,
{
    ability: AbilityRef<W>,
    initialized: bool,
    input_buffer: Timer,
}

/// Per-agent owner and driver of possessed abilities.
///
/// Owns the running-tag set and the tag/kind/input indices. Abilities never touch these
/// directly: starting and finishing always goes through the system, which keeps
/// "tag is running" and "ability is running" in lockstep.
///
/// Dispatch order is possession order. Starting or finishing an ability may force-finish others
/// synchronously; abilities evaluated later in the same pass observe the new state.
///
/// A shared ability running under another system is left alone: this system neither
/// dispatches its hooks nor runs, finishes or resets it until that run ends.
pub struct AbilitySystem<W, P = AbilityStats>
where
    W: WorldMut + 'static,
    P: ResourcePool,
{
    id: u64,
    agent: W::Agent,
    possessions: Vec<Possession<W>>,
    running_tags: BTreeSet<AbilityTag>,
    by_tag: BTreeMap<AbilityTag, AbilityHandle>,
    by_kind: BTreeMap<AbilityKind, AbilityHandle>,
    inputs: BTreeMap<InputAction, Vec<AbilityHandle>>,
    locked: bool,
    paused: bool,
    stats: P,
    state_events: Option<Subscription<GameState>>,
    quit_events: Option<Subscription<QuitRequested>>,
    trace: Option<Box<dyn TraceSink>>,
    current_tick: u64,
}

impl<W, P> AbilitySystem<W, P>
where
    W: WorldMut + 'static,
    P: ResourcePool,
{
    pub fn new(agent: W::Agent, stats: P) -> Self {
        Self {
            id: NEXT_SYSTEM_ID.fetch_add(1, Ordering::Relaxed),
            agent,
            possessions: Vec::new(),
            running_tags: BTreeSet::new(),
            by_tag: BTreeMap::new(),
            by_kind: BTreeMap::new(),
            inputs: BTreeMap::new(),
            locked: false,
            paused: false,
            stats,
            state_events: None,
            quit_events: None,
            trace: None,
            current_tick: 0,
        }
    }

    /// Follows `manager`: `Paused` suspends `tick` dispatch, and every change is forwarded to
    /// running abilities.
    pub fn with_state_manager(mut self, manager: &GameStateManager) -> Self {
        self.paused = manager.current() == GameState::Paused;
        self.state_events = Some(manager.subscribe());
        self
    }

    /// Tears the system down on the next `tick` after `signal` fires.
    pub fn with_quit_signal(mut self, signal: &Signal<QuitRequested>) -> Self {
        self.quit_events = Some(signal.subscribe());
        self
    }

    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        std::mem::replace(&mut self.trace, sink)
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn stats(&self) -> &P {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut P {
        &mut self.stats
    }

    // ---------------------------------------------------------------------------------------
    // Possession
    // ---------------------------------------------------------------------------------------

    /// Possesses `ability` by reference. Acquiring an ability already possessed returns its
    /// existing handle.
    pub fn acquire(&mut self, ability: AbilityRef<W>, world: &mut W) -> Result<AbilityHandle, AbilityError> {
        if let Some(handle) = self.handle_of(&ability) {
            tracing::debug!(
                agent = self.agent.log_id(),
                ability = %ability.borrow().name(),
                "ability already possessed"
            );
            return Ok(handle);
        }
        self.possess(ability, world)
    }

    /// Possesses a private copy of `ability` with fresh runtime state. If an ability with the
    /// same tag is already possessed, its handle is returned instead.
    pub fn acquire_copy(&mut self, ability: &AbilityRef<W>, world: &mut W) -> Result<AbilityHandle, AbilityError> {
        let tag = ability.borrow().tag();
        if let Some(handle) = self.by_tag(tag) {
            tracing::debug!(
                agent = self.agent.log_id(),
                ability = %ability.borrow().name(),
                "ability already possessed"
            );
            return Ok(handle);
        }
        let copy = ability.borrow().fresh_copy().into_shared();
        self.possess(copy, world)
    }

    fn possess(&mut self, ability: AbilityRef<W>, world: &mut W) -> Result<AbilityHandle, AbilityError> {
        let (tag, kind, name, initialize_now) = {
            let a = ability.borrow();
            (
                a.tag(),
                a.kind(),
                a.name().to_string(),
                a.definition().flags.initialize_after_acquire,
            )
        };

        if let Some(existing) = self.by_tag.get(&tag) {
            let existing = self.possessions[existing.0].ability.borrow().name().to_string();
            tracing::warn!(
                agent = self.agent.log_id(),
                ability = %name,
                %existing,
                tag = tag.id(),
                "tag already registered"
            );
            return Err(AbilityError::DuplicateTag { tag, existing });
        }

        let handle = AbilityHandle(self.possessions.len());
        self.possessions.push(Possession {
            ability,
            initialized: false,
            input_buffer: Timer::new(),
        });
        self.by_tag.insert(tag, handle);
        self.by_kind.entry(kind).or_insert(handle);
        tracing::debug!(
            agent = self.agent.log_id(),
            ability = %name,
            tag = tag.id(),
            %kind,
            "ability acquired"
        );

        if initialize_now {
            self.initialize(handle, world)?;
        }
        Ok(handle)
    }

    /// Wires a possessed ability to this system: runs its `on_initialized` hook and registers its
    /// input binding. Must happen exactly once before the ability is gated or run.
    pub fn initialize(&mut self, handle: AbilityHandle, world: &mut W) -> Result<(), AbilityError> {
        let agent = self.agent;
        let possession = self
            .possessions
            .get_mut(handle.0)
            .ok_or(AbilityError::UnknownHandle(handle.0))?;
        let ability = Rc::clone(&possession.ability);
        if possession.initialized {
            let tag = ability.borrow().tag();
            tracing::warn!(agent = agent.log_id(), tag = tag.id(), "ability initialized twice");
            return Err(AbilityError::AlreadyInitialized { tag });
        }
        possession.initialized = true;

        let binding = {
            let mut a = ability.borrow_mut();
            a.behavior.on_initialized(agent, world);
            a.behavior.input_binding()
        };
        if let Some(action) = binding {
            self.inputs.entry(action).or_default().push(handle);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.possessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.possessions.is_empty()
    }

    /// Handles in possession (= dispatch) order.
    pub fn handles(&self) -> impl Iterator<Item = AbilityHandle> {
        (0..self.possessions.len()).map(AbilityHandle)
    }

    pub fn ability(&self, handle: AbilityHandle) -> Option<&AbilityRef<W>> {
        self.possessions.get(handle.0).map(|p| &p.ability)
    }

    pub fn definition(&self, handle: AbilityHandle) -> Option<AbilityDefinition> {
        self.ability(handle).map(|a| a.borrow().definition().clone())
    }

    pub fn handle_of(&self, ability: &AbilityRef<W>) -> Option<AbilityHandle> {
        self.possessions
            .iter()
            .position(|p| Rc::ptr_eq(&p.ability, ability))
            .map(AbilityHandle)
    }

    pub fn has_ability(&self, ability: &AbilityRef<W>) -> bool {
        self.handle_of(ability).is_some()
    }

    pub fn by_tag(&self, tag: AbilityTag) -> Option<AbilityHandle> {
        self.by_tag.get(&tag).copied()
    }

    /// First ability acquired with a behavior of `kind`.
    pub fn by_kind(&self, kind: AbilityKind) -> Option<AbilityHandle> {
        self.by_kind.get(&kind).copied()
    }

    pub fn input_bindings(&self, action: InputAction) -> &[AbilityHandle] {
        self.inputs.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_initialized(&self, handle: AbilityHandle) -> bool {
        self.possessions.get(handle.0).is_some_and(|p| p.initialized)
    }

    pub fn is_running(&self, handle: AbilityHandle) -> bool {
        self.ability(handle).is_some_and(|a| a.borrow().state.running)
    }

    /// Gate result of the most recent `tick`.
    pub fn is_allowed(&self, handle: AbilityHandle) -> bool {
        self.ability(handle).is_some_and(|a| a.borrow().state.allowed)
    }

    pub fn cooldown_time_left(&self, handle: AbilityHandle) -> f32 {
        self.ability(handle)
            .map(|a| a.borrow().cooldown_time_left())
            .unwrap_or(0.0)
    }

    pub fn is_input_buffered(&self, handle: AbilityHandle) -> bool {
        self.possessions
            .get(handle.0)
            .is_some_and(|p| p.input_buffer.is_pending())
    }

    // ---------------------------------------------------------------------------------------
    // Running tags
    // ---------------------------------------------------------------------------------------

    /// Returns `false` if `tag` was already running.
    pub fn add_running_tag(&mut self, tag: AbilityTag) -> bool {
        self.running_tags.insert(tag)
    }

    /// Returns `false` if `tag` was not running.
    pub fn remove_running_tag(&mut self, tag: AbilityTag) -> bool {
        self.running_tags.remove(&tag)
    }

    pub fn is_tag_running(&self, tag: AbilityTag) -> bool {
        self.running_tags.contains(&tag)
    }

    pub fn running_tags(&self) -> impl Iterator<Item = AbilityTag> + '_ {
        self.running_tags.iter().copied()
    }

    // ---------------------------------------------------------------------------------------
    // Gating & lifecycle
    // ---------------------------------------------------------------------------------------

    /// Evaluates every gate now. Unknown handles and uninitialized possessions report
    /// [`GateVerdict::Uninitialized`].
    pub fn gate(&self, handle: AbilityHandle, world: &W) -> GateVerdict {
        match self.possessions.get(handle.0) {
            Some(p) if p.initialized => {
                p.ability
                    .borrow()
                    .evaluate(&self.running_tags, self.stats.level(), self.agent, world)
            }
            _ => GateVerdict::Uninitialized,
        }
    }

    pub fn can_use(&self, handle: AbilityHandle, world: &W) -> bool {
        self.gate(handle, world).is_ready()
    }

    /// Starts the ability without gating it.
    pub fn run(&mut self, handle: AbilityHandle, world: &mut W) -> Result<(), AbilityError> {
        self.ensure_initialized(handle)?;
        let ability = &self.possessions[handle.0].ability;
        if self.held_elsewhere(ability) {
            return Err(AbilityError::RunningElsewhere {
                tag: ability.borrow().tag(),
            });
        }
        self.start(handle, world);
        Ok(())
    }

    /// Finishes the ability. Returns `false`, changing nothing, if it was not running or another
    /// system started it.
    pub fn finish(&mut self, handle: AbilityHandle, world: &mut W) -> bool {
        let Some(possession) = self.possessions.get(handle.0) else {
            return false;
        };
        let ability = Rc::clone(&possession.ability);
        if !ability.borrow().state.running {
            return false;
        }
        if self.held_elsewhere(&ability) {
            tracing::debug!(
                agent = self.agent.log_id(),
                tag = ability.borrow().tag().id(),
                "ability started by another system"
            );
            return false;
        }

        ability.borrow_mut().behavior.on_finished(self.agent, world);
        let (tag, finish_on_end) = {
            let mut a = ability.borrow_mut();
            // Cleared before the cascade so mutually-finishing abilities terminate.
            a.state.running = false;
            a.state.running_owner = None;
            (a.tag(), a.definition().finish_on_end.clone())
        };
        self.remove_running_tag(tag);
        self.finish_tagged(&finish_on_end, world);

        tracing::debug!(agent = self.agent.log_id(), tag = tag.id(), "ability finished");
        self.emit(TraceKind::Finish, tag, handle);
        true
    }

    /// Clears the cooldown and finishes the ability. An ability running under another system is
    /// left untouched.
    pub fn reset(&mut self, handle: AbilityHandle, world: &mut W) -> bool {
        let Some(possession) = self.possessions.get(handle.0) else {
            return false;
        };
        if self.held_elsewhere(&possession.ability) {
            return false;
        }
        {
            let mut a = possession.ability.borrow_mut();
            a.state.cooldown.cancel();
            a.state.cooldown_driver = None;
        }
        self.finish(handle, world)
    }

    /// (Re)starts the input-buffer window: until it expires, every `tick` starts the ability as
    /// soon as it is allowed and not running.
    pub fn buffer_input(&mut self, handle: AbilityHandle) -> Result<(), AbilityError> {
        self.ensure_initialized(handle)?;
        let possession = &mut self.possessions[handle.0];
        let (tag, duration) = {
            let a = possession.ability.borrow();
            (a.tag(), a.definition().input_buffer_duration)
        };
        possession.input_buffer.start(duration);
        self.emit(TraceKind::Buffered, tag, handle);
        Ok(())
    }

    /// Routes a performed input to every ability bound to `action`. Returns how many were
    /// buffered.
    pub fn on_input(&mut self, action: InputAction) -> usize {
        let handles = self.inputs.get(&action).cloned().unwrap_or_default();
        let mut buffered = 0;
        for handle in handles {
            match self.buffer_input(handle) {
                Ok(()) => buffered += 1,
                Err(err) => tracing::warn!(agent = self.agent.log_id(), error = %err, "input dropped"),
            }
        }
        buffered
    }

    pub fn finish_all(&mut self, world: &mut W) {
        for index in 0..self.possessions.len() {
            let handle = AbilityHandle(index);
            if self.is_running(handle) {
                self.finish(handle, world);
            }
        }
    }

    /// Suspends `tick` dispatch. `fixed_tick` is not affected.
    pub fn lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Forwards `state` to the abilities this system is running.
    pub fn broadcast_state_change(&mut self, state: GameState, world: &mut W) {
        for index in 0..self.possessions.len() {
            let ability = Rc::clone(&self.possessions[index].ability);
            let mut a = ability.borrow_mut();
            if a.state.running && a.state.running_owner == Some(self.id) {
                a.behavior.on_state_changed(state, self.agent, world);
            }
        }
    }

    /// Resets every possessed ability once and releases the quit subscription.
    pub fn teardown(&mut self, world: &mut W) {
        tracing::debug!(agent = self.agent.log_id(), abilities = self.possessions.len(), "tearing down");
        for index in 0..self.possessions.len() {
            self.reset(AbilityHandle(index), world);
        }
        for possession in &mut self.possessions {
            possession.input_buffer.cancel();
        }
        self.quit_events = None;
    }

    /// Collects a [`TraceKind::Debug`] event from every running ability that reports a status.
    pub fn draw_debug(&self, world: &W, sink: &mut dyn TraceSink) {
        for (index, possession) in self.possessions.iter().enumerate() {
            let a = possession.ability.borrow();
            if !a.state.running {
                continue;
            }
            if let Some(status) = a.behavior.draw_debug(self.agent, world) {
                sink.emit(self.trace_event(TraceKind::Debug, a.tag(), AbilityHandle(index)).with_detail(status));
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Frame entry points
    // ---------------------------------------------------------------------------------------

    /// Per-frame pass: gates every ability, dispatches `raw_update`/`update`, fires buffered
    /// inputs, then advances cooldowns.
    ///
    /// While locked or paused nothing is dispatched, but cooldowns keep counting down. A tick
    /// that consumes a quit request tears the system down and dispatches nothing.
    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) {
        self.current_tick = ctx.tick;
        if self.pump_signals(world) {
            return;
        }

        if !self.locked && !self.paused {
            for index in 0..self.possessions.len() {
                self.tick_ability(AbilityHandle(index), ctx, world);
            }
            self.pump_input_buffers(ctx, world);
        }

        self.advance_cooldowns(ctx.dt());
    }

    /// Fixed-cadence pass dispatching `fixed_update` to abilities that are allowed or running.
    /// Ignores the lock and pause flags.
    pub fn fixed_tick(&mut self, ctx: &TickContext, world: &mut W) {
        for index in 0..self.possessions.len() {
            let possession = &self.possessions[index];
            if !possession.initialized || self.held_elsewhere(&possession.ability) {
                continue;
            }
            let ability = Rc::clone(&possession.ability);
            let dispatch = {
                let a = ability.borrow();
                a.definition().flags.need_fixed_update && (a.state.allowed || a.state.running)
            };
            if dispatch {
                let result = Self::dispatch_hook(self.agent, &ability, Hook::Fixed, ctx, world);
                self.apply(AbilityHandle(index), Hook::Fixed, result, world);
            }
        }
    }

    fn tick_ability(&mut self, handle: AbilityHandle, ctx: &TickContext, world: &mut W) {
        let possession = &self.possessions[handle.0];
        if !possession.initialized || self.held_elsewhere(&possession.ability) {
            return;
        }
        let ability = Rc::clone(&possession.ability);

        let result = Self::dispatch_hook(self.agent, &ability, Hook::Raw, ctx, world);
        self.apply(handle, Hook::Raw, result, world);

        let verdict = ability
            .borrow()
            .evaluate(&self.running_tags, self.stats.level(), self.agent, world);
        let dispatch = {
            let mut a = ability.borrow_mut();
            a.state.allowed = verdict.is_ready();
            let flags = a.definition().flags;
            flags.need_update && (a.state.allowed || a.state.running || flags.run_update_anyway)
        };
        if dispatch {
            let result = Self::dispatch_hook(self.agent, &ability, Hook::Update, ctx, world);
            self.apply(handle, Hook::Update, result, world);
        }
    }

    fn dispatch_hook(
        agent: W::Agent,
        ability: &AbilityRef<W>,
        hook: Hook,
        ctx: &TickContext,
        world: &mut W,
    ) -> anyhow::Result<AbilityRequest> {
        let mut guard = ability.borrow_mut();
        let a = &mut *guard;
        let mut cx = AbilityCx {
            agent,
            tag: a.tag(),
            running: a.state.running,
            allowed: a.state.allowed,
            world,
        };
        match hook {
            Hook::Raw => a.behavior.raw_update(ctx, &mut cx),
            Hook::Update => a.behavior.update(ctx, &mut cx),
            Hook::Fixed => a.behavior.fixed_update(ctx, &mut cx),
        }
    }

    fn apply(
        &mut self,
        handle: AbilityHandle,
        hook: Hook,
        result: anyhow::Result<AbilityRequest>,
        world: &mut W,
    ) {
        match result {
            Ok(AbilityRequest::None) => {}
            Ok(AbilityRequest::Run) => {
                if !self.held_elsewhere(&self.possessions[handle.0].ability) {
                    self.start(handle, world);
                }
            }
            Ok(AbilityRequest::Finish) => {
                self.finish(handle, world);
            }
            Err(err) => {
                let tag = self.possessions[handle.0].ability.borrow().tag();
                tracing::warn!(
                    agent = self.agent.log_id(),
                    tag = tag.id(),
                    hook = hook.name(),
                    error = %err,
                    "ability hook failed"
                );
                let event = self.trace_event(TraceKind::HookFailed, tag, handle).with_detail(hook.name());
                if let Some(sink) = self.trace.as_mut() {
                    sink.emit(event);
                }
            }
        }
    }

    fn start(&mut self, handle: AbilityHandle, world: &mut W) {
        let ability = Rc::clone(&self.possessions[handle.0].ability);
        let (tag, cost, finish_on_start) = {
            let mut a = ability.borrow_mut();
            a.state.running = true;
            a.state.running_owner = Some(self.id);
            let cooldown = a.definition().base_cooldown;
            if cooldown > 0.0 {
                a.state.cooldown.start(cooldown);
                a.state.cooldown_driver = Some(self.id);
            }
            let definition = a.definition();
            (
                definition.tag,
                definition.energy_cost,
                definition.finish_on_start.clone(),
            )
        };

        self.add_running_tag(tag);
        if cost > 0.0 {
            self.stats.consume(cost);
        }
        self.finish_tagged(&finish_on_start, world);
        ability.borrow_mut().behavior.on_started(self.agent, world);

        tracing::debug!(agent = self.agent.log_id(), tag = tag.id(), "ability started");
        self.emit(TraceKind::Run, tag, handle);
    }

    /// Force-finishes the running abilities owning `tags`. Tags nobody owns are skipped.
    fn finish_tagged(&mut self, tags: &[AbilityTag], world: &mut W) {
        for &tag in tags {
            match self.by_tag(tag) {
                Some(other) => {
                    if self.is_running(other) {
                        self.finish(other, world);
                    }
                }
                None => tracing::trace!(agent = self.agent.log_id(), tag = tag.id(), "no ability owns tag"),
            }
        }
    }

    fn ensure_initialized(&self, handle: AbilityHandle) -> Result<(), AbilityError> {
        let possession = self
            .possessions
            .get(handle.0)
            .ok_or(AbilityError::UnknownHandle(handle.0))?;
        if possession.initialized {
            Ok(())
        } else {
            Err(AbilityError::NotInitialized {
                tag: possession.ability.borrow().tag(),
            })
        }
    }

    /// Returns `true` if a quit request tore the system down.
    fn pump_signals(&mut self, world: &mut W) -> bool {
        let states = self
            .state_events
            .as_ref()
            .map(Subscription::drain)
            .unwrap_or_default();
        for state in states {
            self.paused = state == GameState::Paused;
            self.broadcast_state_change(state, world);
        }

        let quit = self
            .quit_events
            .as_ref()
            .is_some_and(|events| !events.drain().is_empty());
        if quit {
            self.teardown(world);
        }
        quit
    }

    fn pump_input_buffers(&mut self, ctx: &TickContext, world: &mut W) {
        let dt = ctx.dt();
        for index in 0..self.possessions.len() {
            let handle = AbilityHandle(index);
            let possession = &mut self.possessions[index];
            if !possession.input_buffer.is_pending() {
                continue;
            }
            let (tag, running, allowed) = {
                let a = possession.ability.borrow();
                (a.tag(), a.state.running, a.state.allowed)
            };

            if !running && allowed {
                possession.input_buffer.cancel();
                tracing::debug!(agent = self.agent.log_id(), tag = tag.id(), "buffered input fired");
                self.emit(TraceKind::BufferFired, tag, handle);
                self.start(handle, world);
            } else if possession.input_buffer.advance(dt) == TimerState::Fired {
                tracing::debug!(agent = self.agent.log_id(), tag = tag.id(), "buffered input expired");
                self.emit(TraceKind::BufferExpired, tag, handle);
            }
        }
    }

    fn advance_cooldowns(&mut self, dt: f32) {
        for possession in &self.possessions {
            let mut a = possession.ability.borrow_mut();
            if a.state.cooldown_driver != Some(self.id) {
                continue;
            }
            if a.state.cooldown.advance(dt) != TimerState::Pending {
                a.state.cooldown_driver = None;
            }
        }
    }

    /// Running, but started by another system sharing the same reference.
    fn held_elsewhere(&self, ability: &AbilityRef<W>) -> bool {
        let a = ability.borrow();
        a.state.running && a.state.running_owner != Some(self.id)
    }

    fn trace_event(&self, kind: TraceKind, tag: AbilityTag, handle: AbilityHandle) -> TraceEvent {
        TraceEvent::new(self.current_tick, self.agent.log_id(), kind, tag, handle)
    }

    fn emit(&mut self, kind: TraceKind, tag: AbilityTag, handle: AbilityHandle) {
        let event = self.trace_event(kind, tag, handle);
        if let Some(sink) = self.trace.as_mut() {
            sink.emit(event);
        }
    }
}

impl<W, P> Drop for AbilitySystem<W, P>
where
    W: WorldMut + 'static,
    P: ResourcePool,
{
    /// Releases shared abilities this system still runs or drives, so the remaining owners can use
    /// them. No hooks run: there is no world to hand them.
    fn drop(&mut self) {
        for possession in &self.possessions {
            let Ok(mut a) = possession.ability.try_borrow_mut() else {
                continue;
            };
            if a.state.running_owner == Some(self.id) {
                a.state.running = false;
                a.state.running_owner = None;
            }
            if a.state.cooldown_driver == Some(self.id) {
                a.state.cooldown.cancel();
                a.state.cooldown_driver = None;
            }
        }
    }
}
