use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::content::{floor_sprites, wall_sprites, AssetCatalog, FALLBACK_FURNITURE_ID};
use crate::layout::{LayoutOrigin, LayoutStore, OfficeLayout};
use crate::protocol::{AgentMeta, CharacterTemplate, EventSink, SceneEvent};
use crate::roster::Roster;

use super::activity::{ActivityEngine, ActivityTimings, Phase};
use super::timers::{Millis, TimerQueue};

pub const PALETTE_COUNT: usize = 6;
pub const HUE_SHIFT_STEP_DEGREES: usize = 20;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Pause between publishing assets and populating the scene.
    pub asset_settle_delay_ms: Millis,
    pub sound_enabled: bool,
    /// Fixed seed for reproducible runs; entropy when absent.
    pub rng_seed: Option<u64>,
    pub timings: ActivityTimings,
    /// Empty means the renderer's built-in characters.
    pub character_templates: Vec<CharacterTemplate>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            asset_settle_delay_ms: 100,
            sound_enabled: true,
            rng_seed: None,
            timings: ActivityTimings::default(),
            character_templates: Vec::new(),
        }
    }
}

pub struct SimulationSetup {
    pub catalog: AssetCatalog,
    pub layout_store: LayoutStore,
    pub roster: Roster,
    pub sink: Box<dyn EventSink>,
    pub config: SimulationConfig,
}

impl SimulationSetup {
    pub fn new(layout_store: LayoutStore, sink: impl EventSink + 'static) -> Self {
        Self {
            catalog: AssetCatalog::builtin(),
            layout_store,
            roster: Roster::bank_staff(),
            sink: Box::new(sink),
            config: SimulationConfig::default(),
        }
    }

    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingStage {
    PopulateScene,
}

struct CountingSink {
    inner: Box<dyn EventSink>,
    emitted: u64,
}

impl EventSink for CountingSink {
    fn emit(&mut self, event: SceneEvent) {
        self.emitted = self.emitted.saturating_add(1);
        self.inner.emit(event);
    }
}

enum NextTimer {
    Bootstrap,
    Activity,
}

/// Owned handle for one running scene. Dropping it without `stop` also
/// silences it, since every pending timer lives inside the handle.
pub struct Simulation {
    now: Millis,
    sink: CountingSink,
    catalog: AssetCatalog,
    layout_store: LayoutStore,
    roster: Roster,
    config: SimulationConfig,
    stages: TimerQueue<PendingStage>,
    activity: ActivityEngine<SmallRng>,
    layout: Option<(OfficeLayout, LayoutOrigin)>,
    running: bool,
}

impl Simulation {
    /// Stops `previous` before anything is emitted, then publishes assets
    /// and schedules the scene population after the settle delay.
    pub fn start(previous: Option<Simulation>, setup: SimulationSetup) -> Simulation {
        if let Some(mut previous) = previous {
            previous.stop();
        }

        let SimulationSetup {
            catalog,
            layout_store,
            roster,
            sink,
            config,
        } = setup;
        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let activity = ActivityEngine::new(&roster, config.timings, rng);

        let mut simulation = Simulation {
            now: 0,
            sink: CountingSink {
                inner: sink,
                emitted: 0,
            },
            catalog,
            layout_store,
            roster,
            config,
            stages: TimerQueue::new(),
            activity,
            layout: None,
            running: true,
        };
        info!(
            agent_count = simulation.roster.len(),
            layout_source = %simulation.layout_store.source_description(),
            seed = ?simulation.config.rng_seed,
            "simulation_started"
        );
        simulation.publish_assets();
        simulation
    }

    fn emit(&mut self, step: u8, event: SceneEvent) {
        debug!(step, event = event.kind(), at = self.now, "bootstrap_step");
        self.sink.emit(event);
    }

    fn publish_assets(&mut self) {
        let characters = self.config.character_templates.clone();
        self.emit(1, SceneEvent::CharacterTemplates { characters });
        self.emit(
            2,
            SceneEvent::FloorTilesLoaded {
                sprites: floor_sprites(),
            },
        );
        self.emit(
            3,
            SceneEvent::WallTilesLoaded {
                sprites: wall_sprites(),
            },
        );
        let catalog = self.catalog.entries().to_vec();
        let sprites = self.catalog.sprites().clone();
        self.emit(4, SceneEvent::FurnitureAssetsLoaded { catalog, sprites });

        let resume_at = self.now.saturating_add(self.config.asset_settle_delay_ms);
        self.stages.schedule(resume_at, PendingStage::PopulateScene);
        debug!(step = 5u8, resume_at, "bootstrap_paused");
    }

    fn populate_scene(&mut self) {
        let (mut layout, origin) = self.layout_store.load_or_default();
        self.repoint_unknown_furniture(&mut layout);
        let metadata = self.agent_metadata(&layout);
        self.emit(
            6,
            SceneEvent::LayoutLoaded {
                layout: layout.clone(),
            },
        );

        let ids = self.roster.agents().iter().map(|agent| agent.id).collect::<Vec<_>>();
        for id in &ids {
            if let Some(meta) = metadata.get(id) {
                let event = SceneEvent::AgentCreated {
                    id: *id,
                    palette: meta.palette,
                    hue_shift: meta.hue_shift,
                };
                self.emit(7, event);
            }
        }
        self.emit(
            7,
            SceneEvent::ExistingAgents {
                ids,
                metadata_by_id: metadata,
            },
        );
        let sound_enabled = self.config.sound_enabled;
        self.emit(8, SceneEvent::SettingsLoaded { sound_enabled });
        self.emit(
            9,
            SceneEvent::ForceGameMode {
                is_edit_mode: false,
            },
        );

        info!(
            origin = %origin,
            cols = layout.cols,
            rows = layout.rows,
            furniture_count = layout.furniture.len(),
            "scene_populated"
        );
        self.layout = Some((layout, origin));
        self.activity.start(self.now);
    }

    fn repoint_unknown_furniture(&self, layout: &mut OfficeLayout) {
        for placement in &mut layout.furniture {
            if !self.catalog.contains(&placement.kind) {
                warn!(
                    uid = %placement.uid,
                    kind = %placement.kind,
                    "unknown_furniture_type_using_fallback"
                );
                placement.kind = FALLBACK_FURNITURE_ID.to_string();
            }
        }
    }

    fn agent_metadata(&self, layout: &OfficeLayout) -> BTreeMap<u32, AgentMeta> {
        let desks = layout
            .furniture
            .iter()
            .filter(|placement| self.catalog.resolve(&placement.kind).is_desk)
            .map(|placement| placement.uid.clone())
            .collect::<Vec<_>>();
        self.roster
            .agents()
            .iter()
            .enumerate()
            .map(|(index, agent)| {
                let meta = AgentMeta {
                    palette: (index % PALETTE_COUNT) as u8,
                    hue_shift: ((index * HUE_SHIFT_STEP_DEGREES) % 360) as u16,
                    seat_id: desks.get(index).cloned(),
                };
                (agent.id, meta)
            })
            .collect()
    }

    /// Cancels the settle pause and every agent timer. Idempotent.
    pub fn stop(&mut self) -> usize {
        let cancelled = self.stages.clear() + self.activity.stop();
        if self.running {
            info!(
                at = self.now,
                cancelled_timers = cancelled,
                events_emitted = self.sink.emitted,
                "simulation_stopped"
            );
        }
        self.running = false;
        cancelled
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn events_emitted(&self) -> u64 {
        self.sink.emitted
    }

    pub fn pending_timers(&self) -> usize {
        self.stages.len() + self.activity.pending_timers()
    }

    pub fn layout(&self) -> Option<&OfficeLayout> {
        self.layout.as_ref().map(|(layout, _)| layout)
    }

    pub fn layout_origin(&self) -> Option<LayoutOrigin> {
        self.layout.as_ref().map(|(_, origin)| *origin)
    }

    pub fn agent_phase(&self, agent_id: u32) -> Option<&Phase> {
        self.activity.phase(agent_id)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        match (self.stages.next_deadline(), self.activity.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn next_timer(&self) -> Option<(Millis, NextTimer)> {
        match (self.stages.next_deadline(), self.activity.next_deadline()) {
            (Some(stage), Some(agent)) if stage <= agent => Some((stage, NextTimer::Bootstrap)),
            (_, Some(agent)) => Some((agent, NextTimer::Activity)),
            (Some(stage), None) => Some((stage, NextTimer::Bootstrap)),
            (None, None) => None,
        }
    }

    /// Fires every timer due at or before `target` in deadline order and
    /// moves the clock to `target`. Returns the number of timers fired.
    pub fn advance_to(&mut self, target: Millis) -> usize {
        let mut fired = 0;
        while let Some((deadline, timer)) = self.next_timer() {
            if deadline > target {
                break;
            }
            self.now = self.now.max(deadline);
            match timer {
                NextTimer::Bootstrap => {
                    if let Some((_, _, PendingStage::PopulateScene)) = self.stages.pop_due(deadline)
                    {
                        self.populate_scene();
                    }
                }
                NextTimer::Activity => {
                    self.activity.fire_next(deadline, &mut self.sink);
                }
            }
            fired += 1;
        }
        self.now = self.now.max(target);
        fired
    }

    pub fn advance_by(&mut self, delta: Millis) -> usize {
        self.advance_to(self.now.saturating_add(delta))
    }
}

#[cfg(test)]
mod tests {
    use crate::layout::{default_layout, LayoutLoadError};
    use crate::protocol::{AgentStatus, EventLog};

    use super::*;

    const BOOTSTRAP_KINDS: [&str; 14] = [
        "characterSpritesLoaded",
        "floorTilesLoaded",
        "wallTilesLoaded",
        "furnitureAssetsLoaded",
        "layoutLoaded",
        "agentCreated",
        "agentCreated",
        "agentCreated",
        "agentCreated",
        "existingAgents",
        "settingsLoaded",
        "forceGameMode",
        "agentToolStart",
        "agentStatus",
    ];

    fn failing_store() -> LayoutStore {
        LayoutStore::new(|| {
            Err::<String, _>(LayoutLoadError::Status {
                url: "http://localhost/assets/default-layout.json".to_string(),
                status: 404,
            })
        })
    }

    fn store_with(raw: &'static str) -> LayoutStore {
        LayoutStore::new(move || Ok::<_, LayoutLoadError>(raw.to_string()))
    }

    fn seeded(store: LayoutStore, log: &EventLog) -> SimulationSetup {
        SimulationSetup::new(store, log.clone()).with_config(SimulationConfig {
            rng_seed: Some(17),
            ..SimulationConfig::default()
        })
    }

    fn emitted_layout(log: &EventLog) -> OfficeLayout {
        log.events()
            .into_iter()
            .find_map(|event| match event {
                SceneEvent::LayoutLoaded { layout } => Some(layout),
                _ => None,
            })
            .expect("layoutLoaded emitted")
    }

    #[test]
    fn assets_are_published_before_the_pause() {
        let log = EventLog::new();
        let simulation = Simulation::start(None, seeded(failing_store(), &log));

        assert_eq!(log.kinds(), &BOOTSTRAP_KINDS[..4]);
        assert_eq!(simulation.next_deadline(), Some(100));
        assert!(simulation.layout().is_none());
    }

    #[test]
    fn asset_events_carry_generated_sprites() {
        let log = EventLog::new();
        let _simulation = Simulation::start(None, seeded(failing_store(), &log));
        let events = log.events();

        assert_eq!(
            events[0],
            SceneEvent::CharacterTemplates {
                characters: Vec::new()
            }
        );
        match &events[1] {
            SceneEvent::FloorTilesLoaded { sprites } => assert_eq!(sprites.len(), 7),
            other => panic!("unexpected {other:?}"),
        }
        match &events[2] {
            SceneEvent::WallTilesLoaded { sprites } => assert_eq!(sprites.len(), 16),
            other => panic!("unexpected {other:?}"),
        }
        match &events[3] {
            SceneEvent::FurnitureAssetsLoaded { catalog, sprites } => {
                assert_eq!(sprites.len(), catalog.len());
                assert!(catalog.iter().all(|entry| sprites.contains_key(&entry.id)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn full_order_holds_when_layout_falls_back() {
        let log = EventLog::new();
        let mut simulation = Simulation::start(None, seeded(failing_store(), &log));
        simulation.advance_to(99);
        assert_eq!(log.len(), 4);

        simulation.advance_to(100);
        assert_eq!(log.kinds(), BOOTSTRAP_KINDS);
        assert_eq!(simulation.layout_origin(), Some(LayoutOrigin::Fallback));
    }

    #[test]
    fn full_order_holds_when_layout_loads() {
        let log = EventLog::new();
        let store = store_with(
            r#"{"cols": 6, "rows": 4, "furniture": [{"uid": "d", "type": "desk", "col": 1, "row": 1}]}"#,
        );
        let mut simulation = Simulation::start(None, seeded(store, &log));
        simulation.advance_to(100);

        assert_eq!(log.kinds(), BOOTSTRAP_KINDS);
        assert_eq!(simulation.layout_origin(), Some(LayoutOrigin::Resource));
        assert_eq!(emitted_layout(&log).cols, 6);
    }

    #[test]
    fn fallback_scene_is_the_default_bank_floor() {
        let log = EventLog::new();
        let mut simulation = Simulation::start(None, seeded(failing_store(), &log));
        simulation.advance_to(100);

        let layout = emitted_layout(&log);
        assert_eq!(layout, default_layout());
        assert_eq!((layout.cols, layout.rows), (21, 21));
        assert_eq!(layout.furniture.len(), 12);
        let count = |kind: &str| layout.placements_of_kind(kind).count();
        assert_eq!(
            (count("desk"), count("chair"), count("plant"), count("cabinet")),
            (4, 4, 2, 2)
        );
    }

    #[test]
    fn agent_metadata_derives_from_roster_position() {
        let log = EventLog::new();
        let mut simulation = Simulation::start(None, seeded(failing_store(), &log));
        simulation.advance_to(100);

        let events = log.events();
        let created = events
            .iter()
            .filter_map(|event| match event {
                SceneEvent::AgentCreated {
                    id,
                    palette,
                    hue_shift,
                } => Some((*id, *palette, *hue_shift)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(created, [(1, 0, 0), (2, 1, 20), (3, 2, 40), (4, 3, 60)]);

        let (ids, metadata) = events
            .iter()
            .find_map(|event| match event {
                SceneEvent::ExistingAgents {
                    ids,
                    metadata_by_id,
                } => Some((ids.clone(), metadata_by_id.clone())),
                _ => None,
            })
            .expect("existingAgents emitted");
        assert_eq!(ids, [1, 2, 3, 4]);
        assert_eq!(metadata[&1].seat_id.as_deref(), Some("desk_1"));
        assert_eq!(metadata[&4].seat_id.as_deref(), Some("desk_4"));
        assert_eq!(metadata[&3].hue_shift, 40);
    }

    #[test]
    fn seats_are_absent_when_desks_run_out() {
        let log = EventLog::new();
        let store = store_with(
            r#"{"cols": 6, "rows": 4, "furniture": [{"uid": "only_desk", "type": "desk", "col": 1, "row": 1}]}"#,
        );
        let mut simulation = Simulation::start(None, seeded(store, &log));
        simulation.advance_to(100);

        let metadata = log
            .events()
            .into_iter()
            .find_map(|event| match event {
                SceneEvent::ExistingAgents { metadata_by_id, .. } => Some(metadata_by_id),
                _ => None,
            })
            .expect("existingAgents emitted");
        assert_eq!(metadata[&1].seat_id.as_deref(), Some("only_desk"));
        assert!(metadata[&2].seat_id.is_none());
    }

    #[test]
    fn unknown_furniture_type_renders_as_fallback() {
        let log = EventLog::new();
        let store = store_with(
            r#"{"cols": 4, "rows": 4, "furniture": [
                {"uid": "safe_1", "type": "golden_safe", "col": 1, "row": 1},
                {"uid": "plant_1", "type": "plant", "col": 2, "row": 2}
            ]}"#,
        );
        let mut simulation = Simulation::start(None, seeded(store, &log));
        simulation.advance_to(100);

        let layout = emitted_layout(&log);
        assert_eq!(layout.furniture.len(), 2);
        assert_eq!(layout.furniture[0].kind, FALLBACK_FURNITURE_ID);
        assert_eq!(layout.furniture[1].kind, "plant");
    }

    #[test]
    fn settings_follow_configuration() {
        let log = EventLog::new();
        let setup = SimulationSetup::new(failing_store(), log.clone()).with_config(SimulationConfig {
            sound_enabled: false,
            asset_settle_delay_ms: 0,
            rng_seed: Some(1),
            ..SimulationConfig::default()
        });
        let mut simulation = Simulation::start(None, setup);
        simulation.advance_to(0);

        assert!(log.events().contains(&SceneEvent::SettingsLoaded {
            sound_enabled: false
        }));
    }

    #[test]
    fn activity_starts_are_staggered_after_population() {
        let log = EventLog::new();
        let mut simulation = Simulation::start(None, seeded(failing_store(), &log));
        simulation.advance_to(1_600);

        let starts = log
            .events()
            .into_iter()
            .filter_map(|event| match event {
                SceneEvent::ActivityStarted { activity_token, .. } => {
                    Some(activity_token.to_string())
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(starts, ["1_100", "2_600", "3_1100", "4_1600"]);
        assert_eq!(simulation.now(), 1_600);
    }

    #[test]
    fn stop_during_pause_prevents_population() {
        let log = EventLog::new();
        let mut simulation = Simulation::start(None, seeded(failing_store(), &log));
        simulation.advance_to(50);
        assert_eq!(simulation.stop(), 1);

        simulation.advance_to(60_000);
        assert_eq!(log.len(), 4);
        assert!(!simulation.is_running());
        assert_eq!(simulation.pending_timers(), 0);
    }

    #[test]
    fn stop_silences_agents_past_longest_phase() {
        let log = EventLog::new();
        let mut simulation = Simulation::start(None, seeded(failing_store(), &log));
        simulation.advance_to(30_000);
        assert!(log.len() > BOOTSTRAP_KINDS.len());

        assert_eq!(simulation.stop(), 4);
        assert_eq!(simulation.stop(), 0);
        let before = log.len();
        let longest = ActivityTimings::default().longest_phase_ms();
        assert_eq!(simulation.advance_by(longest * 3), 0);
        assert_eq!(log.len(), before);
    }

    #[test]
    fn restart_silences_previous_instance() {
        let first_log = EventLog::new();
        let mut first = Simulation::start(None, seeded(failing_store(), &first_log));
        first.advance_to(5_000);
        let first_count = first_log.len();

        let second_log = EventLog::new();
        let mut second = Simulation::start(Some(first), seeded(failing_store(), &second_log));
        second.advance_to(60_000);

        assert_eq!(first_log.len(), first_count);
        assert_eq!(&second_log.kinds()[..BOOTSTRAP_KINDS.len()], BOOTSTRAP_KINDS);
    }

    #[test]
    fn same_seed_produces_identical_streams() {
        let run = || {
            let log = EventLog::new();
            let mut simulation = Simulation::start(None, seeded(failing_store(), &log));
            simulation.advance_to(45_000);
            log.events()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn every_agent_keeps_cycling_through_statuses() {
        let log = EventLog::new();
        let mut simulation = Simulation::start(None, seeded(failing_store(), &log));
        simulation.advance_to(120_000);

        for agent_id in 1..=4u32 {
            let statuses = log
                .events()
                .into_iter()
                .filter_map(|event| match event {
                    SceneEvent::StatusChanged {
                        agent_id: id,
                        status,
                    } if id == agent_id => Some(status),
                    _ => None,
                })
                .collect::<Vec<_>>();
            assert!(statuses.len() >= 6, "agent {agent_id}");
            for window in statuses.chunks_exact(3) {
                assert_eq!(
                    window,
                    [AgentStatus::Active, AgentStatus::Waiting, AgentStatus::Active]
                );
            }
        }
        assert_eq!(
            simulation.events_emitted(),
            u64::try_from(log.len()).expect("fits")
        );
    }
}
