use glam::Vec3;

use crate::controller::camera_controller::{CameraConfig, CameraController};
use crate::controller::editor::BlockEditor;
use crate::controller::formation::FormationConfig;
use crate::controller::input::{Action, InputProcessor, InputState};
use crate::controller::quest::QuestController;
use crate::controller::targeting::{find_target, find_target_panda, PandaTarget, TargetResult};
use crate::model::{Camera, Scene, WorldConfig};
use crate::ui::Hud;
use crate::utils::WorldCoord;

/// Frames longer than this (a backgrounded tab, a debugger pause) are dropped
pub const MAX_FRAME_MS: f32 = 1000.0;

/// Everything one session owns. The host calls `tick` once per frame and
/// reads the result back out for drawing.
pub struct GameState {
    pub scene: Scene,
    pub camera: Camera,
    pub input: InputState,
    pub processor: InputProcessor,
    pub camera_controller: CameraController,
    pub quest: QuestController,
    pub editor: BlockEditor,
    pub hud: Hud,
    pub target: TargetResult,
    pub panda_target: Option<PandaTarget>,
    tick: u64,
}

impl GameState {
    pub fn new(config: &WorldConfig) -> Self {
        Self::with_configs(config, CameraConfig::default(), FormationConfig::default())
    }

    pub fn with_configs(config: &WorldConfig, camera_config: CameraConfig, formation: FormationConfig) -> Self {
        let scene = Scene::generate(config);

        let spawn = scene.spawn_point();
        let mut camera = Camera::new(800, 600);
        camera.eye = Vec3::new(spawn.x, 0.0, spawn.y);
        let mut camera_controller = CameraController::new(camera_config);
        camera_controller.place_on_terrain(&mut camera, &scene.terrain);
        camera.set_look_at(scene.main_panda.position);

        let quest = QuestController::new(formation, camera_controller.player_position(&camera));
        tracing::info!(x = spawn.x, z = spawn.y, babies = scene.babies.len(), "session started");

        Self {
            scene,
            camera,
            input: InputState::new(),
            processor: InputProcessor::default(),
            camera_controller,
            quest,
            editor: BlockEditor::new(),
            hud: Hud::new(),
            target: TargetResult::None,
            panda_target: None,
            tick: 0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn player_position(&self) -> Vec3 {
        self.camera_controller.player_position(&self.camera)
    }

    /// Advance the session by one frame. Returns false if the frame was skipped.
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        if !dt_ms.is_finite() || dt_ms > MAX_FRAME_MS {
            tracing::warn!(dt_ms, "skipping implausible frame time");
            return false;
        }
        let dt_ms = dt_ms.max(0.0);
        self.tick += 1;

        // camera and movement
        let input = self.processor.tick_input(&mut self.input);
        let (dx, dy) = input.look_delta;
        self.camera_controller.apply_look(&mut self.camera, dx, dy);
        self.camera_controller.apply_rotate(&mut self.camera, input.rotate_delta);
        self.camera_controller.update_movement(&mut self.camera, input.move_vector, dt_ms);
        self.camera_controller.follow_terrain(&mut self.camera, &self.scene.terrain);

        let player = self.player_position();
        self.quest.set_player_position(player);

        // actors
        let terrain = &self.scene.terrain;
        self.scene.main_panda.update(dt_ms, Some(terrain));
        for baby in self.scene.babies.iter_mut() {
            baby.update(dt_ms, Some(terrain));
        }

        let events = self.quest.update(&mut self.scene);
        if let Some(&last) = events.found.last() {
            let progress = &self.scene.progress;
            tracing::debug!(baby = last, "found");
            self.hud.show_status(
                format!("You found a baby panda! ({}/{})", progress.found(), progress.total()),
                self.tick,
                dt_ms,
            );
        }
        if events.won {
            self.hud.show_status("All baby pandas are home!", self.tick, dt_ms);
        }

        self.retarget();
        for action in input.actions {
            self.apply_action(action, dt_ms);
        }

        self.hud.expire(self.tick);
        true
    }

    fn retarget(&mut self) {
        let eye = self.camera.eye;
        let dir = self.camera.forward();
        self.target = find_target(eye, dir, &self.scene.grid, &self.scene.terrain, self.scene.config.view_range);
        self.panda_target = find_target_panda(eye, dir, &self.scene);
    }

    fn apply_action(&mut self, action: Action, dt_ms: f32) {
        let message = match (action, self.panda_target) {
            (Action::ToggleAllAnimations, _) => {
                self.scene.toggle_all_animations();
                "Toggled panda animations".to_string()
            }
            (Action::Primary, Some(which)) => {
                self.panda_mut(which).toggle_animation();
                "Panda animation toggled".to_string()
            }
            (Action::Secondary, Some(which)) => {
                self.panda_mut(which).poke();
                "Poked the panda".to_string()
            }
            (Action::Primary, None) => match self.editor.remove(&mut self.scene.grid, &self.target) {
                Ok(outcome) => outcome.message(),
                Err(e) => e.to_string(),
            },
            (Action::Secondary, None) => {
                let player_cell = WorldCoord::from_vec3(self.player_position());
                let block = self.input.selected_block;
                match self.editor.place(&mut self.scene.grid, &self.target, self.camera.eye, player_cell, block) {
                    Ok(outcome) => outcome.message(),
                    Err(e) => e.to_string(),
                }
            }
        };
        self.hud.show_status(message, self.tick, dt_ms);
        self.retarget();
    }

    fn panda_mut(&mut self, which: PandaTarget) -> &mut crate::model::Panda {
        match which {
            PandaTarget::Baby(i) if i < self.scene.babies.len() => &mut self.scene.babies[i],
            _ => &mut self.scene.main_panda,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::InputEvent;
    use crate::model::world::HeightField;

    /// Flat world without trees or babies, eye parked over the grid
    fn workshop() -> GameState {
        let mut config = WorldConfig::default();
        config.trees.count = 0;
        let mut state = GameState::new(&config);
        state.scene.terrain = HeightField::flat(64, 64);
        state.scene.babies.clear();
        state.scene.main_panda.position = Vec3::new(40.0, 0.7, 40.0);
        state.camera.eye = Vec3::new(5.5, 3.0, 3.5);
        state.camera.set_look_at(Vec3::new(5.5, 0.0, 6.5));
        state
    }

    fn press(state: &mut GameState, key: &str) {
        state.input.process_event(&InputEvent::KeyDown(key.to_string()));
        state.tick(16.0);
        state.input.process_event(&InputEvent::KeyUp(key.to_string()));
    }

    #[test]
    fn test_implausible_frames_skipped() {
        let mut state = workshop();
        assert!(!state.tick(5000.0));
        assert!(!state.tick(f32::NAN));
        assert_eq!(state.tick_count(), 0);

        let before = state.scene.main_panda.clone();
        assert!(state.tick(-20.0));
        assert_eq!(state.tick_count(), 1);
        assert_eq!(state.scene.main_panda.animation.time, before.animation.time);
    }

    #[test]
    fn test_place_and_remove_through_input() {
        let mut state = workshop();
        state.tick(16.0);
        assert!(matches!(state.target, TargetResult::TerrainSurface { x: 5, z: 6, .. }), "got {:?}", state.target);

        press(&mut state, "g");
        assert_eq!(state.scene.grid.column_height(5, 6), 1);
        assert_eq!(state.hud.status(), Some("Placed Dirt at (5, 6)"));
        assert!(matches!(state.target, TargetResult::RegularBlock { x: 5, y: 0, z: 6, .. }), "got {:?}", state.target);

        press(&mut state, "f");
        assert_eq!(state.scene.grid.column_height(5, 6), 0);
        assert_eq!(state.hud.status(), Some("Removed block at (5, 0, 6)"));
    }

    #[test]
    fn test_selected_block_is_used() {
        let mut state = workshop();
        press(&mut state, "3");
        press(&mut state, "g");
        let column = state.scene.grid.column_blocks(5, 6);
        let id = *column.first().expect("placed");
        assert_eq!(state.scene.grid.get(id).map(|b| b.block), Some(crate::model::BlockType::Stone));
    }

    #[test]
    fn test_status_message_expires() {
        let mut state = workshop();
        press(&mut state, "p");
        assert!(state.hud.status().is_some());
        for _ in 0..130 {
            state.tick(16.0);
        }
        assert_eq!(state.hud.status(), None);
    }

    #[test]
    fn test_click_on_panda_toggles_instead_of_editing() {
        let mut state = workshop();
        let panda = state.scene.main_panda.position;
        state.camera.eye = panda + Vec3::new(-3.0, 0.3, 0.0);
        state.camera.set_look_at(panda);
        let animating = state.scene.main_panda.animation.animating;

        press(&mut state, "f");
        assert_eq!(state.panda_target, Some(PandaTarget::Main));
        assert_ne!(state.scene.main_panda.animation.animating, animating);

        press(&mut state, "g");
        assert!(state.scene.main_panda.is_flipped());
        assert_eq!(state.scene.grid.instance_count(), 0);
    }

    #[test]
    fn test_walking_feeds_the_quest() {
        let mut state = workshop();
        state.camera.eye = Vec3::new(32.0, 1.0, 32.0);
        state.camera.yaw = 0.0;
        state.camera.pitch = 0.0;
        state.input.process_event(&InputEvent::KeyDown("w".to_string()));
        for _ in 0..30 {
            state.tick(16.67);
        }
        let player = state.player_position();
        assert!(player.x > 34.5, "walked along +X: {player:?}");
        assert!((state.quest.player().direction() - Vec3::X).length() < 1e-3);
    }
}
