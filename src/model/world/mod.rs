pub mod block;
pub mod grid;
pub mod heightfield;
pub mod trees;

pub use block::{Appearance, BlockType, SELECTABLE_BLOCKS};
pub use grid::{AddOptions, BlockFlags, BlockId, BlockInstance, VoxelGrid, FLOOR_MARKER, TERRAIN_MARKER};
pub use heightfield::{HeightField, HeightFieldConfig};
pub use trees::{Tree, TreeKind, TreeScatterConfig};
