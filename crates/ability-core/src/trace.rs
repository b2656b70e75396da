use std::borrow::Cow;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AbilityHandle, AbilityTag};

/// Lifecycle step an [`AbilitySystem`](crate::AbilitySystem) reports to its trace sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TraceKind {
    Run,
    Finish,
    Buffered,
    BufferFired,
    BufferExpired,
    /// A tick hook returned an error; `detail` names the hook.
    HookFailed,
    /// Status line from a running ability's `draw_debug`.
    Debug,
}

impl TraceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceKind::Run => "ability.run",
            TraceKind::Finish => "ability.finish",
            TraceKind::Buffered => "ability.buffered",
            TraceKind::BufferFired => "ability.buffer_fired",
            TraceKind::BufferExpired => "ability.buffer_expired",
            TraceKind::HookFailed => "ability.hook_failed",
            TraceKind::Debug => "ability.debug",
        }
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One recorded step of one possessed ability.
///
/// Debug overlays and the CLI render these; the system never reads them back.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    /// [`AgentId::log_id`](crate::AgentId::log_id) of the owning agent.
    pub agent: u64,
    pub kind: TraceKind,
    pub tag: AbilityTag,
    pub handle: AbilityHandle,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub detail: Option<Cow<'static, str>>,
}

impl TraceEvent {
    pub fn new(tick: u64, agent: u64, kind: TraceKind, tag: AbilityTag, handle: AbilityHandle) -> Self {
        Self {
            tick,
            agent,
            kind,
            tag,
            handle,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<Cow<'static, str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] agent {} {} {}", self.tick, self.agent, self.kind, self.tag)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

/// In-memory sink, also the serialized form of a recorded run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn of_kind(&self, kind: TraceKind) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn for_tag(&self, tag: AbilityTag) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(move |e| e.tag == tag)
    }

    /// Kinds in emission order, for asserting on sequences.
    pub fn kinds(&self) -> Vec<TraceKind> {
        self.events.iter().map(|e| e.kind).collect()
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}
