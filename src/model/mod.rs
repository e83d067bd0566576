// MODEL: World data and game state
pub mod camera;
pub mod panda;
pub mod progress;
pub mod scene;
pub mod world;

pub use camera::Camera;
pub use panda::{FollowState, Panda, PandaRole, Pose};
pub use progress::GameProgress;
pub use scene::{Scene, WorldConfig};
pub use world::{AddOptions, Appearance, BlockId, BlockInstance, BlockType, HeightField, VoxelGrid};
