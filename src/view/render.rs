use glam::{Mat4, Vec3};

use crate::controller::targeting::TargetResult;
use crate::controller::GameState;
use crate::model::world::{Appearance, BlockInstance, BlockType, HeightField};
use crate::model::{Panda, Pose};
use crate::utils::{create_cube_mesh, create_outline_mesh, Mesh};

const WHITE: [f32; 3] = [0.95, 0.95, 0.95];
const BLACK: [f32; 3] = [0.08, 0.08, 0.08];
const PINK: [f32; 3] = [0.9, 0.5, 0.55];

/// Which shared mesh an item uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshHandle {
    Terrain,
    Cube,
    Outline,
}

impl MeshHandle {
    pub const ALL: [MeshHandle; 3] = [MeshHandle::Terrain, MeshHandle::Cube, MeshHandle::Outline];

    /// Stable numbering for hosts that can't see the enum
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// One thing for the renderer to draw
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshHandle,
    pub transform: Mat4,
    pub appearance: Appearance,
    pub opaque: bool,
}

/// CPU-side meshes behind each handle, built once per world
pub struct MeshLibrary {
    terrain: Mesh,
    cube: Mesh,
    outline: Mesh,
}

impl MeshLibrary {
    pub fn new(terrain: &HeightField) -> Self {
        Self { terrain: terrain.build_mesh(), cube: create_cube_mesh(), outline: create_outline_mesh() }
    }

    pub fn get(&self, handle: MeshHandle) -> &Mesh {
        match handle {
            MeshHandle::Terrain => &self.terrain,
            MeshHandle::Cube => &self.cube,
            MeshHandle::Outline => &self.outline,
        }
    }
}

/// Everything visible this frame: terrain, blocks within view range,
/// posed pandas, then the target outline.
pub fn build_draw_list(state: &GameState) -> Vec<DrawItem> {
    let scene = &state.scene;
    let eye = state.camera.eye;
    let view_range = scene.config.view_range;
    let mut items = Vec::with_capacity(scene.grid.instance_count() + 64);

    items.push(DrawItem {
        mesh: MeshHandle::Terrain,
        transform: Mat4::IDENTITY,
        appearance: BlockType::Grass.appearance(),
        opaque: true,
    });

    for (_, block) in scene.grid.instances() {
        if block.position.distance(eye) > view_range {
            continue;
        }
        items.push(DrawItem {
            mesh: MeshHandle::Cube,
            transform: Mat4::from_translation(cube_origin(block)),
            appearance: block.appearance,
            opaque: true,
        });
    }

    for panda in scene.pandas() {
        if panda.position.distance(eye) <= view_range {
            items.extend(panda_parts(panda));
        }
    }

    if let Some(transform) = outline_transform(state) {
        items.push(DrawItem {
            mesh: MeshHandle::Outline,
            transform,
            appearance: Appearance::solid([0.0, 0.0, 0.0]),
            opaque: false,
        });
    }
    items
}

/// Floats per packed item: mesh index, column-major transform, rgb,
/// texture unit, opaque flag
pub const PACKED_ITEM_LEN: usize = 22;

/// Flatten a draw list for hosts that take a single float buffer
pub fn pack_draw_list(items: &[DrawItem]) -> Vec<f32> {
    let mut out = Vec::with_capacity(items.len() * PACKED_ITEM_LEN);
    for item in items {
        out.push(item.mesh.index() as f32);
        out.extend_from_slice(&item.transform.to_cols_array());
        out.extend_from_slice(&item.appearance.color);
        out.push(item.appearance.texture_unit as f32);
        out.push(if item.opaque { 1.0 } else { 0.0 });
    }
    out
}

/// Min corner of the unit cube drawn for a block. Column blocks fill
/// their cell; loose blocks are centered on their position, which is
/// also the center of their hit volume.
fn cube_origin(block: &BlockInstance) -> Vec3 {
    if block.is_loose() {
        block.position - Vec3::splat(0.5)
    } else {
        block.position - Vec3::new(0.0, 0.5, 0.0)
    }
}

fn outline_transform(state: &GameState) -> Option<Mat4> {
    let grid = &state.scene.grid;
    // slightly oversized so the lines don't z-fight with the faces
    let grow = |origin: Vec3, size: Vec3| {
        Mat4::from_translation(origin - Vec3::splat(0.005)) * Mat4::from_scale(size + Vec3::splat(0.01))
    };
    match state.target {
        TargetResult::RegularBlock { x, y, z, .. } => {
            let base = grid.column_base(x, z);
            let top = grid.column_height(x, z).saturating_sub(1) as f32;
            let layer = (y as f32 - base).floor().clamp(0.0, top);
            Some(grow(Vec3::new(x as f32, base + layer, z as f32), Vec3::ONE))
        }
        TargetResult::TreeBlock { id, .. } | TargetResult::DetachedBlock { id, .. } => {
            let block = grid.get(id)?;
            Some(grow(cube_origin(block), Vec3::ONE))
        }
        TargetResult::TerrainSurface { x, z, terrain_height, .. } => {
            Some(grow(Vec3::new(x as f32, terrain_height, z as f32), Vec3::new(1.0, 0.02, 1.0)))
        }
        TargetResult::FloorPlane { x, z, .. } => Some(grow(Vec3::new(x as f32, 0.0, z as f32), Vec3::new(1.0, 0.02, 1.0))),
        TargetResult::None => None,
    }
}

/// Centered box of `size` at `offset` inside `parent`
fn part(parent: Mat4, offset: Vec3, size: Vec3, color: [f32; 3]) -> DrawItem {
    let transform = parent
        * Mat4::from_translation(offset)
        * Mat4::from_scale(size)
        * Mat4::from_translation(Vec3::splat(-0.5));
    DrawItem { mesh: MeshHandle::Cube, transform, appearance: Appearance::solid(color), opaque: true }
}

/// Body, head and limbs of one panda. Local +Z is the snout.
pub fn panda_parts(panda: &Panda) -> Vec<DrawItem> {
    let Pose { body_roll, head, left_leg, right_leg, tail } = panda.pose();

    let mut root = Mat4::from_translation(panda.position)
        * Mat4::from_rotation_y(panda.facing.to_radians())
        * Mat4::from_scale(Vec3::splat(panda.scale));
    if body_roll != 0.0 {
        root = root
            * Mat4::from_translation(Vec3::new(0.0, 0.3, 0.0))
            * Mat4::from_rotation_z(body_roll.to_radians());
    }

    let mut parts = vec![
        part(root, Vec3::new(0.0, 0.3, 0.0), Vec3::new(1.2, 1.1, 1.7), WHITE),
        part(root, Vec3::new(-0.58, 0.3, 0.0), Vec3::new(0.15, 1.1, 0.6), BLACK),
        part(root, Vec3::new(0.58, 0.3, 0.0), Vec3::new(0.15, 1.1, 0.6), BLACK),
        part(root, Vec3::new(0.0, 0.85, 0.0), Vec3::new(1.2, 0.15, 0.6), BLACK),
    ];

    let head_root = root * Mat4::from_translation(Vec3::new(0.0, 0.1, 1.0)) * Mat4::from_rotation_x(head.to_radians());
    parts.extend([
        part(head_root, Vec3::ZERO, Vec3::new(1.0, 0.8, 0.8), WHITE),
        part(head_root, Vec3::new(-0.5, 0.6, 0.0), Vec3::new(0.35, 0.45, 0.15), BLACK),
        part(head_root, Vec3::new(0.5, 0.6, 0.0), Vec3::new(0.35, 0.45, 0.15), BLACK),
        part(head_root, Vec3::new(-0.25, 0.1, 0.41), Vec3::new(0.2, 0.15, 0.02), BLACK),
        part(head_root, Vec3::new(0.25, 0.1, 0.41), Vec3::new(0.2, 0.15, 0.02), BLACK),
        part(head_root, Vec3::new(0.0, -0.15, 0.51), Vec3::new(0.4, 0.2, 0.1), WHITE),
        part(head_root, Vec3::new(0.0, -0.07, 0.52), Vec3::new(0.3, 0.15, 0.1), BLACK),
        part(head_root, Vec3::new(0.0, -0.25, 0.52), Vec3::new(0.2, 0.15, 0.1), PINK),
    ]);

    // diagonal pairs swing together
    for (x, z, angle) in [
        (-0.25, 0.6, left_leg),
        (0.25, -0.6, left_leg),
        (0.25, 0.6, right_leg),
        (-0.25, -0.6, right_leg),
    ] {
        let hip = root * Mat4::from_translation(Vec3::new(x, -0.2, z)) * Mat4::from_rotation_x(angle.to_radians());
        parts.push(part(hip, Vec3::new(0.0, -0.3, 0.0), Vec3::new(0.4, 0.7, 0.4), BLACK));
    }

    let tail_root = root * Mat4::from_translation(Vec3::new(0.0, 0.3, -0.85)) * Mat4::from_rotation_y(tail.to_radians());
    parts.push(part(tail_root, Vec3::new(0.0, 0.0, -0.2), Vec3::splat(0.25), WHITE));
    parts
}
