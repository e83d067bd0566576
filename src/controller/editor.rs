use glam::Vec3;
use thiserror::Error;

use crate::controller::targeting::TargetResult;
use crate::model::world::{AddOptions, BlockType, VoxelGrid, TERRAIN_MARKER};
use crate::utils::WorldCoord;

/// Why an edit did nothing. The message is what the HUD shows.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum EditError {
    #[error("No target in range")]
    NoTarget,
    #[error("Can't place a block where you are standing")]
    InsidePlayer,
    #[error("Can't place outside the world ({x}, {z})")]
    OutsideWorld { x: i32, z: i32 },
    #[error("Column ({x}, {z}) is already at maximum height")]
    ColumnFull { x: i32, z: i32 },
    #[error("Nothing to remove here")]
    NothingToRemove,
    #[error("Block placement rejected")]
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditOutcome {
    Placed { x: i32, z: i32, block: BlockType },
    Removed { x: i32, y: i32, z: i32 },
}

impl EditOutcome {
    pub fn message(&self) -> String {
        match self {
            EditOutcome::Placed { x, z, block } => format!("Placed {} at ({x}, {z})", block.name()),
            EditOutcome::Removed { x, y, z } => format!("Removed block at ({x}, {y}, {z})"),
        }
    }
}

/// Where a new block goes, in `VoxelGrid::add_block` terms
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub opts: AddOptions,
}

/// Turns raycast hits into grid edits. The selected block type is owned
/// by the input layer and passed in per call.
#[derive(Clone, Copy, Debug)]
pub struct BlockEditor {
    pub stack_count: u32,
}

impl Default for BlockEditor {
    fn default() -> Self {
        Self { stack_count: 1 }
    }
}

impl BlockEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell a new block would occupy for the given hit. Block hits place
    /// against the face pointing back at the viewer.
    pub fn placement_for(&self, target: &TargetResult, eye: Vec3, player_cell: WorldCoord) -> Result<Placement, EditError> {
        let opts = AddOptions::stacked(self.stack_count);
        let placement = match *target {
            TargetResult::None => return Err(EditError::NoTarget),
            TargetResult::TerrainSurface { x, z, terrain_height, .. } => Placement {
                x,
                y: TERRAIN_MARKER,
                z,
                opts: AddOptions::on_terrain(terrain_height),
            },
            TargetResult::FloorPlane { x, z, .. } => Placement { x, y: 0, z, opts },
            TargetResult::RegularBlock { x, y, z, .. }
            | TargetResult::TreeBlock { x, y, z, .. }
            | TargetResult::DetachedBlock { x, y, z, .. } => {
                let normal = face_normal(Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5) - eye);
                let mut cell = WorldCoord(x, y, z).offset(normal);
                cell.1 = cell.1.max(0);
                if cell == player_cell {
                    return Err(EditError::InsidePlayer);
                }
                Placement { x: cell.0, y: cell.1, z: cell.2, opts }
            }
        };

        // surface placements only collide with the player on the ground plane
        if target.block_cell().is_none() && (placement.x, placement.z) == (player_cell.0, player_cell.2) {
            return Err(EditError::InsidePlayer);
        }
        Ok(placement)
    }

    pub fn place(
        &self,
        grid: &mut VoxelGrid,
        target: &TargetResult,
        eye: Vec3,
        player_cell: WorldCoord,
        block: BlockType,
    ) -> Result<EditOutcome, EditError> {
        let Placement { x, y, z, opts } = self.placement_for(target, eye, player_cell)?;

        if y != TERRAIN_MARKER && !grid.in_bounds(x, z) {
            return Err(EditError::OutsideWorld { x, z });
        }
        if y == TERRAIN_MARKER && !grid.in_bounds(x, z) && !grid.in_terrain(x, z) {
            return Err(EditError::OutsideWorld { x, z });
        }

        if grid.add_block(x, y, z, block, opts) {
            tracing::info!(x, y, z, ?block, "block placed");
            return Ok(EditOutcome::Placed { x, z, block });
        }

        // only regular stacking is capped
        let stacks = y >= 0 && !(y == 0 && grid.column_height(x, z) == 0);
        if grid.in_bounds(x, z) && stacks && grid.column_height(x, z) >= grid.max_column_height() {
            Err(EditError::ColumnFull { x, z })
        } else {
            Err(EditError::Rejected)
        }
    }

    pub fn remove(&self, grid: &mut VoxelGrid, target: &TargetResult) -> Result<EditOutcome, EditError> {
        let removed = match *target {
            TargetResult::None => return Err(EditError::NoTarget),
            TargetResult::TerrainSurface { .. } | TargetResult::FloorPlane { .. } => false,
            TargetResult::RegularBlock { x, y, z, .. } => grid.remove_block(x, y, z),
            TargetResult::TreeBlock { id, .. } | TargetResult::DetachedBlock { id, .. } => grid.remove_by_id(id),
        };
        match (removed, target.block_cell()) {
            (true, Some((x, y, z))) => {
                tracing::info!(x, y, z, "block removed");
                Ok(EditOutcome::Removed { x, y, z })
            }
            _ => Err(EditError::NothingToRemove),
        }
    }
}

/// Unit axis of the dominant component of `d`, flipped to face the viewer
fn face_normal(d: Vec3) -> (i32, i32, i32) {
    let a = d.abs();
    if a.x >= a.y && a.x >= a.z {
        (-(d.x.signum() as i32), 0, 0)
    } else if a.y >= a.z {
        (0, -(d.y.signum() as i32), 0)
    } else {
        (0, 0, -(d.z.signum() as i32))
    }
}
