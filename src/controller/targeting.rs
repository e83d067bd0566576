use glam::Vec3;

use crate::model::world::{BlockId, HeightField, VoxelGrid};
use crate::model::Scene;

/// March step for the block pass
pub const BLOCK_STEP: f32 = 0.05;
/// March step for the terrain pass
pub const TERRAIN_STEP: f32 = 0.1;
/// A loose block is hit when a sample lands this close to its center
pub const LOOSE_HIT_RADIUS: f32 = 0.6;
/// Depth below the surface a terrain sample may land and still count
pub const TERRAIN_BAND: f32 = 0.3;
/// Pandas further than this can't be clicked
pub const PANDA_REACH: f32 = 5.0;
/// Minimum cosine between view and panda direction
pub const PANDA_AIM: f32 = 0.7;

/// What the crosshair points at
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetResult {
    RegularBlock { x: i32, y: i32, z: i32, distance: f32 },
    TreeBlock { x: i32, y: i32, z: i32, id: BlockId, distance: f32 },
    /// Block standing on the terrain outside the grid
    DetachedBlock { x: i32, y: i32, z: i32, id: BlockId, distance: f32 },
    TerrainSurface { x: i32, z: i32, terrain_height: f32, distance: f32 },
    FloorPlane { x: i32, z: i32, distance: f32 },
    None,
}

impl TargetResult {
    pub fn is_none(&self) -> bool {
        matches!(self, TargetResult::None)
    }

    pub fn distance(&self) -> Option<f32> {
        match *self {
            TargetResult::RegularBlock { distance, .. }
            | TargetResult::TreeBlock { distance, .. }
            | TargetResult::DetachedBlock { distance, .. }
            | TargetResult::TerrainSurface { distance, .. }
            | TargetResult::FloorPlane { distance, .. } => Some(distance),
            TargetResult::None => None,
        }
    }

    /// Cell of a hit cube, `None` for surfaces
    pub fn block_cell(&self) -> Option<(i32, i32, i32)> {
        match *self {
            TargetResult::RegularBlock { x, y, z, .. }
            | TargetResult::TreeBlock { x, y, z, .. }
            | TargetResult::DetachedBlock { x, y, z, .. } => Some((x, y, z)),
            _ => None,
        }
    }
}

/// Step a ray from `eye` along `dir` and report the first thing it hits.
/// Blocks are checked over the whole range before the terrain and floor
/// fallbacks get a chance. Pure function of its inputs.
pub fn find_target(eye: Vec3, dir: Vec3, grid: &VoxelGrid, terrain: &HeightField, range: f32) -> TargetResult {
    let Some(dir) = dir.try_normalize() else {
        return TargetResult::None;
    };

    // loose blocks the ray could possibly reach
    let loose: Vec<(BlockId, Vec3, bool)> = grid
        .instances()
        .filter(|(_, b)| b.is_loose())
        .filter(|(_, b)| b.position.distance(eye) <= range + LOOSE_HIT_RADIUS)
        .map(|(id, b)| (id, b.position, b.flags.tree))
        .collect();

    let steps = (range / BLOCK_STEP) as usize;
    for i in 1..=steps {
        let distance = i as f32 * BLOCK_STEP;
        let p = eye + dir * distance;

        let closest = loose
            .iter()
            .map(|&(id, center, tree)| (id, center, tree, center.distance(p)))
            .filter(|&(.., d)| d < LOOSE_HIT_RADIUS)
            .min_by(|a, b| a.3.total_cmp(&b.3));
        if let Some((id, center, tree, _)) = closest {
            // loose blocks report the cell of the block itself, not of the sample
            let cell = center.floor();
            let (x, y, z) = (cell.x as i32, cell.y as i32, cell.z as i32);
            return if tree {
                TargetResult::TreeBlock { x, y, z, id, distance }
            } else {
                TargetResult::DetachedBlock { x, y, z, id, distance }
            };
        }

        let (x, y, z) = (p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32);
        let height = grid.column_height(x, z);
        if height > 0 {
            let base = grid.column_base(x, z);
            if p.y >= base && p.y < base + height as f32 {
                return TargetResult::RegularBlock { x, y, z, distance };
            }
        }
    }

    if dir.y < 0.9 {
        let steps = (range / TERRAIN_STEP) as usize;
        for i in 1..=steps {
            let distance = i as f32 * TERRAIN_STEP;
            let p = eye + dir * distance;
            if !terrain.in_bounds(p.x, p.z) {
                continue;
            }
            let terrain_height = terrain.height_at(p.x, p.z);
            if p.y <= terrain_height && p.y > terrain_height - TERRAIN_BAND {
                return TargetResult::TerrainSurface {
                    x: p.x.floor() as i32,
                    z: p.z.floor() as i32,
                    terrain_height,
                    distance,
                };
            }
        }
    }

    if dir.y < -0.2 {
        let distance = -eye.y / dir.y;
        if distance > 0.0 && distance < range {
            let p = eye + dir * distance;
            let (x, z) = (p.x.floor() as i32, p.z.floor() as i32);
            if grid.in_bounds(x, z) && grid.column_height(x, z) == 0 {
                return TargetResult::FloorPlane { x, z, distance };
            }
        }
    }

    TargetResult::None
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PandaTarget {
    Main,
    Baby(usize),
}

/// First panda (parent, then babies in order) within reach and roughly under the crosshair
pub fn find_target_panda(eye: Vec3, dir: Vec3, scene: &Scene) -> Option<PandaTarget> {
    let dir = dir.try_normalize()?;
    let aimed_at = |position: Vec3| {
        let to = position - eye;
        to.length() <= PANDA_REACH && to.try_normalize().is_some_and(|n| n.dot(dir) > PANDA_AIM)
    };

    if aimed_at(scene.main_panda.position) {
        return Some(PandaTarget::Main);
    }
    scene.babies.iter().position(|b| aimed_at(b.position)).map(PandaTarget::Baby)
}
