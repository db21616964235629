use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::warn;

use crate::content::FurnitureCatalogEntry;
use crate::layout::OfficeLayout;
use crate::roster::AgentId;
use crate::sim::{Millis, StopHandle};
use crate::sprite::Sprite;

static EVENT_LOG_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_event_log_poison_once(operation: &'static str) {
    if EVENT_LOG_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "event log lock poisoned; recovered inner value");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Waiting,
}

/// Correlates an activity start with its finish: `"{agent_id}_{started_at}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ActivityToken(String);

impl ActivityToken {
    pub fn new(agent_id: AgentId, started_at: Millis) -> Self {
        Self(format!("{agent_id}_{started_at}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMeta {
    pub palette: u8,
    pub hue_shift: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_id: Option<String>,
}

/// Animation frames per facing direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterTemplate {
    pub down: Vec<Sprite>,
    pub up: Vec<Sprite>,
    pub right: Vec<Sprite>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SceneEvent {
    /// An empty list tells the renderer to use its built-in characters.
    #[serde(rename = "characterSpritesLoaded")]
    CharacterTemplates { characters: Vec<CharacterTemplate> },
    #[serde(rename = "floorTilesLoaded")]
    FloorTilesLoaded { sprites: Vec<Sprite> },
    #[serde(rename = "wallTilesLoaded")]
    WallTilesLoaded { sprites: Vec<Sprite> },
    #[serde(rename = "furnitureAssetsLoaded")]
    FurnitureAssetsLoaded {
        catalog: Vec<FurnitureCatalogEntry>,
        sprites: BTreeMap<String, Sprite>,
    },
    #[serde(rename = "layoutLoaded")]
    LayoutLoaded { layout: OfficeLayout },
    #[serde(rename = "agentCreated", rename_all = "camelCase")]
    AgentCreated {
        id: AgentId,
        palette: u8,
        hue_shift: u16,
    },
    #[serde(rename = "existingAgents")]
    ExistingAgents {
        #[serde(rename = "agents")]
        ids: Vec<AgentId>,
        #[serde(rename = "agentMeta")]
        metadata_by_id: BTreeMap<AgentId, AgentMeta>,
    },
    #[serde(rename = "settingsLoaded", rename_all = "camelCase")]
    SettingsLoaded { sound_enabled: bool },
    #[serde(rename = "forceGameMode", rename_all = "camelCase")]
    ForceGameMode { is_edit_mode: bool },
    #[serde(rename = "agentToolStart")]
    ActivityStarted {
        #[serde(rename = "id")]
        agent_id: AgentId,
        #[serde(rename = "toolId")]
        activity_token: ActivityToken,
        #[serde(rename = "status")]
        label: String,
    },
    #[serde(rename = "agentStatus")]
    StatusChanged {
        #[serde(rename = "id")]
        agent_id: AgentId,
        status: AgentStatus,
    },
    #[serde(rename = "agentToolDone")]
    ActivityFinished {
        #[serde(rename = "id")]
        agent_id: AgentId,
        #[serde(rename = "toolId")]
        activity_token: ActivityToken,
    },
    #[serde(rename = "agentToolsClear")]
    ActivitiesCleared {
        #[serde(rename = "id")]
        agent_id: AgentId,
    },
}

impl SceneEvent {
    /// Wire tag of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CharacterTemplates { .. } => "characterSpritesLoaded",
            Self::FloorTilesLoaded { .. } => "floorTilesLoaded",
            Self::WallTilesLoaded { .. } => "wallTilesLoaded",
            Self::FurnitureAssetsLoaded { .. } => "furnitureAssetsLoaded",
            Self::LayoutLoaded { .. } => "layoutLoaded",
            Self::AgentCreated { .. } => "agentCreated",
            Self::ExistingAgents { .. } => "existingAgents",
            Self::SettingsLoaded { .. } => "settingsLoaded",
            Self::ForceGameMode { .. } => "forceGameMode",
            Self::ActivityStarted { .. } => "agentToolStart",
            Self::StatusChanged { .. } => "agentStatus",
            Self::ActivityFinished { .. } => "agentToolDone",
            Self::ActivitiesCleared { .. } => "agentToolsClear",
        }
    }

    /// The agent an activity event belongs to; `None` for bootstrap events.
    pub fn activity_agent(&self) -> Option<AgentId> {
        match self {
            Self::ActivityStarted { agent_id, .. }
            | Self::StatusChanged { agent_id, .. }
            | Self::ActivityFinished { agent_id, .. }
            | Self::ActivitiesCleared { agent_id } => Some(*agent_id),
            _ => None,
        }
    }
}

/// One-directional push toward the renderer. Delivery is fire-and-forget.
pub trait EventSink {
    fn emit(&mut self, event: SceneEvent);
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: SceneEvent) {
        (**self).emit(event);
    }
}

/// Shared in-memory recorder; clones observe the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SceneEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, operation: &'static str) -> MutexGuard<'_, Vec<SceneEvent>> {
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_event_log_poison_once(operation);
                poisoned.into_inner()
            }
        }
    }

    pub fn events(&self) -> Vec<SceneEvent> {
        self.lock("read").clone()
    }

    pub fn take(&self) -> Vec<SceneEvent> {
        std::mem::take(&mut *self.lock("take"))
    }

    pub fn len(&self) -> usize {
        self.lock("read").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.lock("read").iter().map(SceneEvent::kind).collect()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: SceneEvent) {
        self.lock("write").push(event);
    }
}

/// Writes one JSON document per line. Write failures are logged and dropped.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
    failed: u64,
    stop_on_failure: Option<StopHandle>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            failed: 0,
            stop_on_failure: None,
        }
    }

    /// Requests `stop` on the first failed write, e.g. when the reader of
    /// stdout has gone away.
    pub fn stop_on_failure(mut self, stop: StopHandle) -> Self {
        self.stop_on_failure = Some(stop);
        self
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, event: &SceneEvent) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: SceneEvent) {
        match self.write_line(&event) {
            Ok(()) => self.written = self.written.saturating_add(1),
            Err(error) => {
                self.failed = self.failed.saturating_add(1);
                warn!(event = event.kind(), error = %error, "event_write_failed");
                if let Some(stop) = &self.stop_on_failure {
                    if !stop.is_requested() {
                        warn!("event_output_closed_stopping");
                        stop.request_stop();
                    }
                }
            }
        }
    }
}
