// CONTROLLER: Input, game logic, and update loop
pub mod input;
pub mod targeting;
pub mod editor;
pub mod formation;
pub mod quest;
pub mod camera_controller;
pub mod frame_loop;

pub use input::{Action, InputEvent, InputProcessor, InputState, TickInput};
pub use targeting::{find_target, find_target_panda, PandaTarget, TargetResult};
pub use editor::{BlockEditor, EditError, EditOutcome};
pub use formation::{FormationConfig, FormationController, PlayerTracker};
pub use quest::{QuestController, QuestEvents};
pub use camera_controller::{CameraConfig, CameraController};
pub use frame_loop::GameState;
