mod input;
mod timing;

use crate::assets::{
    load_environment, AssetLoader, AssetStore, LoadError, LoadEvent, LoadProgress, LoadSequencer,
};
use crate::config::HarnessConfig;
use crate::lod::{LodController, LodError, LodKey};
use crate::render::LightRig;
use crate::scene::{Environment, RenderStats, SceneGraph};
use crate::ui::controls::{diff_events, draw_controls, ControlEvent, StatsView};
use crate::ui::{EnvironmentMap, ParameterState};
use timing::FrameTiming;

use glam::Quat;
use std::rc::Rc;
use std::time::{Duration, Instant};

const ROTATE_SPEED: f32 = 0.5;
const TARGET_FRAME: Duration = Duration::from_millis(16);

/// Owns the whole lookdev session: assets, the displayed LOD, parameters,
/// lights and the scene they live in.
pub struct Harness<L: AssetLoader, S: SceneGraph> {
    loader: Rc<L>,
    scene: S,
    store: AssetStore,
    sequencer: LoadSequencer,
    controller: LodController,
    params: ParameterState,
    lights: LightRig,
    config: HarnessConfig,
    environment: Option<Environment>,
    status: String,
    loading: bool,
}

impl<L: AssetLoader + 'static, S: SceneGraph> Harness<L, S> {
    pub fn new(loader: L, scene: S, config: HarnessConfig) -> Self {
        Self {
            loader: Rc::new(loader),
            scene,
            store: AssetStore::new(),
            sequencer: LoadSequencer::new(config.lods.clone()),
            controller: LodController::new(),
            params: config.parameters.clone(),
            lights: LightRig::new(),
            config,
            environment: None,
            status: String::new(),
            loading: false,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn params(&self) -> &ParameterState {
        &self.params
    }

    pub fn current_lod(&self) -> Option<LodKey> {
        self.controller.current_key()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// True while lower-priority LODs are still being fetched in the background.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Installs the lights, loads and shows the highest-priority LOD, then
    /// the environment. The remaining LODs arrive through `pump_loads` while
    /// frames run. A failure here leaves an empty but running session.
    pub async fn start(&mut self) -> Result<Option<LodKey>, LoadError> {
        self.lights.install(&mut self.scene, &self.params.shadows);

        let first = self
            .sequencer
            .load_first(&*self.loader, &mut self.store)
            .await;
        match &first {
            Ok(Some(key)) => {
                self.display(*key, "Initial display");
                self.loading = true;
                self.status = format!("{key} ready");
            }
            Ok(None) => {
                self.status = "No LODs configured".to_string();
                log::warn!("{}", self.status);
            }
            Err(err) => {
                self.status = format!("Loading stopped: {err}");
                log::error!("{}", self.status);
            }
        }

        self.load_environment(self.params.environment.map).await;
        first
    }

    /// One non-blocking step of the background load sequence, run once per
    /// frame. A newly stored LOD is shown when it is the requested one.
    pub fn pump_loads(&mut self) -> LoadProgress {
        if !self.loading {
            return LoadProgress::Idle;
        }
        let progress = self.sequencer.poll_next(&self.loader, &mut self.store);
        match &progress {
            LoadProgress::Pending(_) => {}
            LoadProgress::Stored(key) => {
                let key = *key;
                if key == self.params.general.lod || self.controller.current_key().is_none() {
                    self.display(key, "Display of background LOD");
                }
            }
            LoadProgress::Failed(err) => {
                self.status = format!("Loading stopped: {err}");
                log::error!("{}", self.status);
                self.finish_sequence();
            }
            LoadProgress::Idle => {
                self.status = format!("{} LODs loaded", self.store.len());
                log::info!("Load sequence finished");
                self.finish_sequence();
            }
        }
        progress
    }

    /// Blocks until the rest of the load sequence is done, showing LODs the
    /// same way `pump_loads` does. Used to time the whole sequence.
    pub async fn finish_loading(&mut self) -> Result<Vec<LodKey>, LoadError> {
        if !self.loading {
            return Ok(Vec::new());
        }
        let Self {
            loader,
            scene,
            store,
            sequencer,
            controller,
            params,
            ..
        } = self;
        let result = sequencer
            .load_all(&**loader, store, |event, store| {
                let key = match event {
                    LoadEvent::Stored(key) if key == params.general.lod => key,
                    LoadEvent::FirstReady(key) if controller.current_key().is_none() => key,
                    _ => return,
                };
                let shown = show(&mut *controller, store, &mut *scene, &mut *params, key);
                if let Err(err) = shown {
                    log::error!("Display of {} failed: {}", key, err);
                }
            })
            .await;

        match &result {
            Ok(loaded) => {
                self.status = format!("{} LODs loaded", self.store.len());
                log::info!("Load sequence finished ({} new)", loaded.len());
            }
            Err(err) => {
                self.status = format!("Loading stopped: {err}");
                log::error!("{}", self.status);
            }
        }
        self.finish_sequence();
        result
    }

    /// Re-fetches one LOD and redisplays it when it is the active one.
    pub async fn reload(&mut self, key: LodKey) -> Result<(), LoadError> {
        self.sequencer
            .reload(&*self.loader, &mut self.store, key)
            .await?;
        if self.controller.current_key() == Some(key) {
            self.display(key, "Redisplay after reload");
        }
        Ok(())
    }

    pub async fn apply(&mut self, event: ControlEvent) {
        log::debug!("Control event {:?}", event);
        match event {
            ControlEvent::SwitchLod(key) => {
                let result = show(
                    &mut self.controller,
                    &self.store,
                    &mut self.scene,
                    &mut self.params,
                    key,
                );
                match result {
                    Ok(()) => self.status = format!("Showing {key}"),
                    Err(err) => {
                        self.status = err.to_string();
                        if let Some(current) = self.controller.current_key() {
                            self.params.general.lod = current;
                        }
                    }
                }
            }
            ControlEvent::RefreshMaterials => {
                if self.params.material.normal_map_tracks_lod {
                    if let Some(current) = self.controller.current_key() {
                        self.params.material.selected_normal_map = current;
                    }
                }
                self.controller
                    .refresh_materials(&self.store, &mut self.scene, &self.params.material);
            }
            ControlEvent::ShadowsChanged => {
                self.lights.apply_shadows(&mut self.scene, &self.params.shadows);
                self.controller
                    .apply_shadows(&mut self.scene, &self.params.shadows);
            }
            ControlEvent::EnvironmentChanged(map) => self.load_environment(map).await,
            ControlEvent::EnvironmentIntensityChanged(intensity) => {
                if let Some(environment) = &mut self.environment {
                    environment.intensity = intensity;
                    self.scene.set_environment(Some(environment.clone()));
                }
            }
            ControlEvent::ReloadLod(key) => {
                if let Err(err) = self.reload(key).await {
                    self.status = format!("Reload failed: {err}");
                    log::error!("{}", self.status);
                }
            }
        }
    }

    fn display(&mut self, key: LodKey, context: &str) {
        let shown = show(
            &mut self.controller,
            &self.store,
            &mut self.scene,
            &mut self.params,
            key,
        );
        if let Err(err) = shown {
            log::error!("{} of {} failed: {}", context, key, err);
        }
    }

    /// The sequence is over: a requested LOD that never arrived falls back
    /// to the displayed one.
    fn finish_sequence(&mut self) {
        self.loading = false;
        let Some(current) = self.controller.current_key() else {
            return;
        };
        if !self.store.has(self.params.general.lod) {
            log::warn!(
                "Requested {} never loaded, staying on {}",
                self.params.general.lod,
                current
            );
            self.params.general.lod = current;
        }
    }

    async fn load_environment(&mut self, map: EnvironmentMap) {
        let Some(path) = self.config.environment_path(map) else {
            log::warn!("No file configured for environment {}", map);
            return;
        };
        let intensity = self.params.environment.intensity;
        match load_environment(&*self.loader, map.as_str(), path, intensity).await {
            Ok(environment) => {
                self.scene.set_environment(Some(environment.clone()));
                self.environment = Some(environment);
            }
            Err(err) => {
                self.status = format!("Environment {map} failed: {err}");
                log::error!("{}", self.status);
            }
        }
    }

    /// Advances animations by `dt` seconds and returns this frame's stats.
    pub fn frame(&mut self, dt: f32, elapsed_secs: f32) -> RenderStats {
        if self.params.general.rotate_plane {
            if let Some(node) = self.controller.active_node_mut(&mut self.scene) {
                let transform = node.transform_mut();
                transform.rotation = Quat::from_rotation_y(ROTATE_SPEED * dt) * transform.rotation;
            }
        }
        self.lights.animate(&mut self.scene, elapsed_secs);
        self.scene.stats()
    }

    pub fn stats_view(&self, fps: f32) -> StatsView {
        StatsView {
            stats: self.scene.stats(),
            loaded: self.store.loaded_keys(),
            active: self.controller.current_key(),
            fps,
            status: self.status.clone(),
            loading: self.loading,
        }
    }

    /// One UI pass: keyboard shortcuts, then the control panel. Returns the
    /// events caused by both.
    pub fn draw_ui(&mut self, ctx: &egui::Context, fps: f32) -> Vec<ControlEvent> {
        let before = self.params.clone();
        if let Some(key) = input::lod_shortcut(ctx) {
            self.params.general.lod = key;
        }
        let mut events = diff_events(&before, &self.params);
        if input::reload_shortcut(ctx) {
            if let Some(key) = self.current_lod() {
                events.push(ControlEvent::ReloadLod(key));
            }
        }

        let view = self.stats_view(fps);
        egui::SidePanel::right("lookdev_controls").show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                events.extend(draw_controls(ui, &mut self.params, &view));
            });
        });
        events
    }
}

fn show<S: SceneGraph>(
    controller: &mut LodController,
    store: &AssetStore,
    scene: &mut S,
    params: &mut ParameterState,
    key: LodKey,
) -> Result<(), LodError> {
    if params.material.normal_map_tracks_lod && store.has(key) {
        params.material.selected_normal_map = key;
    }
    controller.switch_to(key, store, scene, params)
}

/// Drives `frames` headless frames: UI pass, event dispatch, one background
/// load step, animation.
pub fn run<L: AssetLoader + 'static, S: SceneGraph>(harness: &mut Harness<L, S>, frames: u32) {
    let ctx = egui::Context::default();
    let start = Instant::now();
    let mut timing = FrameTiming::new("lookdev".to_string(), start);
    let mut next_frame_time = start + TARGET_FRAME;

    for _ in 0..frames {
        let raw_input = egui::RawInput {
            predicted_dt: timing.frame_dt,
            ..Default::default()
        };
        let fps = timing.fps();
        let mut events = Vec::new();
        let _ = ctx.run(raw_input, |ctx| {
            events.extend(harness.draw_ui(ctx, fps));
        });
        for event in events {
            pollster::block_on(harness.apply(event));
        }
        harness.pump_loads();

        let elapsed = start.elapsed().as_secs_f32();
        let stats = harness.frame(timing.frame_dt, elapsed);
        if let Some(line) = timing.update(Instant::now()) {
            log::info!(
                "{} | {} triangles, {} draw calls",
                line,
                stats.triangles,
                stats.draw_calls
            );
        }

        let now = Instant::now();
        if next_frame_time > now {
            std::thread::sleep(next_frame_time - now);
        }
        next_frame_time += TARGET_FRAME;
    }
    log::info!("Ran {} frames", frames);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, SceneNode, Transform};
    use crate::testing::{default_sources, MockLoader};
    use pollster::block_on;

    fn config() -> HarnessConfig {
        HarnessConfig {
            lods: default_sources(),
            ..HarnessConfig::default()
        }
    }

    fn harness(loader: MockLoader, config: HarnessConfig) -> Harness<MockLoader, Scene> {
        Harness::new(loader, Scene::new(), config)
    }

    /// Pumps the background sequence until it stops, returning its failure.
    fn drain(harness: &mut Harness<MockLoader, Scene>) -> Option<LoadError> {
        loop {
            match harness.pump_loads() {
                LoadProgress::Pending(key) => panic!("{key} never finishes"),
                LoadProgress::Stored(_) => {}
                LoadProgress::Failed(err) => return Some(err),
                LoadProgress::Idle => return None,
            }
        }
    }

    fn started(config: HarnessConfig) -> Harness<MockLoader, Scene> {
        let mut harness = harness(MockLoader::new(), config);
        block_on(harness.start()).unwrap();
        assert!(drain(&mut harness).is_none());
        harness
    }

    fn active_normal_label(harness: &Harness<MockLoader, Scene>) -> Option<String> {
        let entity = harness.controller.active()?.entity();
        let mut label = None;
        harness.scene.node(entity)?.visit_meshes(&mut |mesh| {
            if label.is_none() {
                label = mesh
                    .material
                    .as_physical()
                    .and_then(|material| material.normal_map.as_ref())
                    .map(|texture| texture.label().to_string());
            }
        });
        label
    }

    #[test]
    fn start_shows_first_lod_and_leaves_the_rest_to_frames() {
        let mut harness = harness(MockLoader::new(), config());
        let first = block_on(harness.start()).unwrap();

        assert_eq!(first, Some(LodKey::Lod1));
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
        assert_eq!(harness.store().loaded_keys(), vec![LodKey::Lod1]);
        assert!(harness.is_loading());
        // three lights plus the model
        assert_eq!(harness.scene().len(), 4);
        let environment = harness.scene().environment().unwrap();
        assert_eq!(environment.name, "venice_sunset");

        assert!(drain(&mut harness).is_none());
        assert_eq!(harness.store().len(), 4);
        assert!(!harness.is_loading());
        assert_eq!(harness.status(), "4 LODs loaded");
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
    }

    #[test]
    fn frames_keep_running_while_a_lod_stalls() {
        let loader = MockLoader::new().stalling("lod2.json");
        let mut harness = harness(loader, config());
        block_on(harness.start()).unwrap();

        run(&mut harness, 5);
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
        assert_eq!(harness.store().loaded_keys(), vec![LodKey::Lod1]);
        assert!(harness.is_loading());
        assert!(harness.stats_view(60.0).loading);
        let lod2_requests = harness
            .loader
            .requests()
            .iter()
            .filter(|r| *r == "mesh:lod2.json")
            .count();
        assert_eq!(lod2_requests, 1);

        // Loaded LODs stay switchable; the stalled one is reported as missing.
        block_on(harness.apply(ControlEvent::SwitchLod(LodKey::Lod2)));
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
        assert_eq!(harness.status(), "LOD lod2 not loaded");
    }

    #[test]
    fn requested_lod_replaces_first_when_it_arrives() {
        let mut config = config();
        config.parameters.general.lod = LodKey::Lod3;
        let mut harness = harness(MockLoader::new(), config);
        block_on(harness.start()).unwrap();
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));

        assert!(matches!(harness.pump_loads(), LoadProgress::Stored(LodKey::Lod2)));
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
        assert!(matches!(harness.pump_loads(), LoadProgress::Stored(LodKey::Lod3)));
        assert_eq!(harness.current_lod(), Some(LodKey::Lod3));

        assert!(drain(&mut harness).is_none());
        assert_eq!(harness.current_lod(), Some(LodKey::Lod3));
        assert_eq!(harness.scene().len(), 4);
    }

    #[test]
    fn later_failure_keeps_earlier_lods_switchable() {
        let loader = MockLoader::new().failing("normal_lod3.png");
        let mut harness = harness(loader, config());
        block_on(harness.start()).unwrap();
        let err = drain(&mut harness).unwrap();

        assert_eq!(err.key(), LodKey::Lod3);
        assert_eq!(harness.store().loaded_keys(), vec![LodKey::Lod1, LodKey::Lod2]);
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
        assert!(harness.status().starts_with("Loading stopped"));
        assert!(!harness.is_loading());

        block_on(harness.apply(ControlEvent::SwitchLod(LodKey::Lod2)));
        assert_eq!(harness.current_lod(), Some(LodKey::Lod2));

        harness.params.general.lod = LodKey::Lod3;
        block_on(harness.apply(ControlEvent::SwitchLod(LodKey::Lod3)));
        assert_eq!(harness.current_lod(), Some(LodKey::Lod2));
        assert_eq!(harness.params().general.lod, LodKey::Lod2);
        assert_eq!(harness.status(), "LOD lod3 not loaded");
    }

    #[test]
    fn failed_first_lod_leaves_an_empty_session() {
        let loader = MockLoader::new().failing("lod1.json");
        let mut harness = harness(loader, config());
        assert!(block_on(harness.start()).is_err());

        assert_eq!(harness.current_lod(), None);
        assert!(!harness.is_loading());
        assert!(matches!(harness.pump_loads(), LoadProgress::Idle));
        assert!(harness.status().starts_with("Loading stopped"));
        run(&mut harness, 2);
        assert!(harness.store().is_empty());
    }

    #[test]
    fn unreachable_requested_lod_falls_back_to_displayed() {
        let mut config = config();
        config.parameters.general.lod = LodKey::Lod4;
        let loader = MockLoader::new().failing("lod4.json");
        let mut harness = harness(loader, config);
        block_on(harness.start()).unwrap();
        assert!(drain(&mut harness).is_some());
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
        assert_eq!(harness.params().general.lod, LodKey::Lod1);
    }

    #[test]
    fn finish_loading_blocks_through_the_rest() {
        let mut config = config();
        config.parameters.general.lod = LodKey::Lod2;
        let mut harness = harness(MockLoader::new(), config);
        block_on(harness.start()).unwrap();

        let loaded = block_on(harness.finish_loading()).unwrap();
        assert_eq!(loaded, vec![LodKey::Lod2, LodKey::Lod3, LodKey::Lod4]);
        assert_eq!(harness.current_lod(), Some(LodKey::Lod2));
        assert!(!harness.is_loading());
        assert!(matches!(harness.pump_loads(), LoadProgress::Idle));
    }

    #[test]
    fn normal_map_stays_independent_by_default() {
        let mut harness = started(config());

        block_on(harness.apply(ControlEvent::SwitchLod(LodKey::Lod3)));
        assert_eq!(harness.params().material.selected_normal_map, LodKey::Lod1);
        assert_eq!(active_normal_label(&harness).as_deref(), Some("normal_lod1.png"));
    }

    #[test]
    fn tracking_normal_map_follows_switches() {
        let mut config = config();
        config.parameters.material.normal_map_tracks_lod = true;
        let mut harness = started(config);

        block_on(harness.apply(ControlEvent::SwitchLod(LodKey::Lod3)));
        assert_eq!(harness.params().material.selected_normal_map, LodKey::Lod3);
        assert_eq!(active_normal_label(&harness).as_deref(), Some("normal_lod3.png"));
    }

    #[test]
    fn environment_events_reach_the_scene() {
        let mut harness = started(config());

        harness.params.environment.map = EnvironmentMap::StudioSmall;
        block_on(harness.apply(ControlEvent::EnvironmentChanged(EnvironmentMap::StudioSmall)));
        let environment = harness.scene().environment().unwrap();
        assert_eq!(environment.name, "studio_small");
        assert_eq!(
            environment.texture.label(),
            "textures/equirectangular/studio_small_1k.hdr"
        );

        block_on(harness.apply(ControlEvent::EnvironmentIntensityChanged(2.5)));
        assert_eq!(harness.scene().environment().unwrap().intensity, 2.5);
    }

    #[test]
    fn shadow_event_updates_model_flags() {
        let mut harness = started(config());

        harness.params.shadows.use_shadows = false;
        block_on(harness.apply(ControlEvent::ShadowsChanged));
        let entity = harness.controller.active().unwrap().entity();
        harness.scene.node(entity).unwrap().visit_meshes(&mut |mesh| {
            assert!(!mesh.cast_shadow);
            assert!(!mesh.receive_shadow);
        });
    }

    #[test]
    fn frame_rotates_only_when_enabled() {
        let mut harness = started(config());
        let entity = harness.controller.active().unwrap().entity();

        let stats = harness.frame(0.5, 0.5);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.triangles, 16 * 4);
        let rotation = |harness: &Harness<MockLoader, Scene>| match harness.scene.node(entity) {
            Some(SceneNode::Group(group)) => group.transform.rotation,
            other => panic!("Expected group, got {:?}", other),
        };
        assert_eq!(rotation(&harness), Transform::IDENTITY.rotation);

        harness.params.general.rotate_plane = true;
        harness.frame(0.5, 1.0);
        assert_ne!(rotation(&harness), Transform::IDENTITY.rotation);
    }

    #[test]
    fn keyboard_shortcut_becomes_switch_event() {
        let mut harness = started(config());

        let ctx = egui::Context::default();
        let input = egui::RawInput {
            events: vec![egui::Event::Key {
                key: egui::Key::Num2,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: egui::Modifiers::default(),
            }],
            ..Default::default()
        };
        let mut events = Vec::new();
        let _ = ctx.run(input, |ctx| {
            events.extend(harness.draw_ui(ctx, 60.0));
        });
        assert_eq!(events, vec![ControlEvent::SwitchLod(LodKey::Lod2)]);

        for event in events {
            block_on(harness.apply(event));
        }
        assert_eq!(harness.current_lod(), Some(LodKey::Lod2));
    }

    #[test]
    fn reload_redisplays_active_lod() {
        let mut harness = started(config());
        let before = harness.controller.active().unwrap().entity();

        block_on(harness.reload(LodKey::Lod1)).unwrap();
        let after = harness.controller.active().unwrap().entity();
        assert_ne!(before, after);
        assert_eq!(harness.scene().len(), 4);
        assert_eq!(
            harness.loader.requests().iter().filter(|r| *r == "mesh:lod1.json").count(),
            2
        );
    }

    #[test]
    fn r_shortcut_reloads_the_displayed_lod() {
        let mut harness = started(config());
        let ctx = egui::Context::default();
        let input = egui::RawInput {
            events: vec![egui::Event::Key {
                key: egui::Key::R,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: egui::Modifiers::default(),
            }],
            ..Default::default()
        };
        let mut events = Vec::new();
        let _ = ctx.run(input, |ctx| {
            events.extend(harness.draw_ui(ctx, 60.0));
        });
        events.dedup();
        assert_eq!(events, vec![ControlEvent::ReloadLod(LodKey::Lod1)]);

        block_on(harness.apply(ControlEvent::ReloadLod(LodKey::Lod1)));
        assert_eq!(
            harness.loader.requests().iter().filter(|r| *r == "mesh:lod1.json").count(),
            2
        );
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
    }

    #[test]
    fn headless_run_loads_the_rest_between_frames() {
        let mut harness = harness(MockLoader::new(), config());
        block_on(harness.start()).unwrap();
        run(&mut harness, 5);
        assert_eq!(harness.store().len(), 4);
        assert!(!harness.is_loading());
        assert_eq!(harness.current_lod(), Some(LodKey::Lod1));
    }
}
