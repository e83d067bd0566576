use glam::Vec3;

use super::block::{Appearance, BlockType};

/// `add_block` y value: attach to the terrain surface at `AddOptions::terrain_height`
pub const TERRAIN_MARKER: i32 = -2;
/// `add_block` y value: place a single block on the y = 0 floor
pub const FLOOR_MARKER: i32 = -1;

/// Default footprint of the terrain the grid sits on
pub const DEFAULT_TERRAIN_EXTENT: (usize, usize) = (64, 64);

/// Stable handle to a block instance. A handle outlives its block:
/// once the block is removed the handle simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId {
    index: u32,
    generation: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockFlags {
    pub tree: bool,
    pub attached_to_terrain: bool,
    pub outside_grid: bool,
}

/// One rendered unit cube
#[derive(Clone, Debug, PartialEq)]
pub struct BlockInstance {
    pub position: Vec3,
    pub block: BlockType,
    pub appearance: Appearance,
    pub flags: BlockFlags,
    // insertion order, used for the reverse-order loose search
    seq: u64,
}

impl BlockInstance {
    /// Tracked outside column bookkeeping
    pub fn is_loose(&self) -> bool {
        self.flags.tree || self.flags.outside_grid
    }

    fn matches_cell(&self, x: i32, y: i32, z: i32) -> bool {
        (self.position.x - x as f32).abs() < 0.5
            && (self.position.z - z as f32).abs() < 0.5
            && (self.position.y - (y as f32 + 0.5)).abs() <= 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AddOptions {
    /// Layers added by a regular stacked placement
    pub stack_count: u32,
    /// Surface height captured by the raycaster, required with `TERRAIN_MARKER`
    pub terrain_height: Option<f32>,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self { stack_count: 1, terrain_height: None }
    }
}

impl AddOptions {
    pub fn on_terrain(terrain_height: f32) -> Self {
        Self { terrain_height: Some(terrain_height), ..Self::default() }
    }

    pub fn stacked(stack_count: u32) -> Self {
        Self { stack_count, ..Self::default() }
    }
}

struct Slot {
    generation: u32,
    instance: Option<BlockInstance>,
}

#[derive(Default)]
struct Column {
    /// Elevation of the bottom face, fixed when the column goes from empty to one block
    base: f32,
    /// Bottom to top; the column height is the length
    blocks: Vec<BlockId>,
}

/// Dense column heights for the playable square plus every block instance
/// in the world. Column blocks are owned by their column's id stack, so a
/// column's height and its instance count cannot drift apart.
pub struct VoxelGrid {
    size: usize,
    max_column_height: u32,
    terrain_extent: (usize, usize),
    columns: Vec<Column>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    next_seq: u64,
}

impl VoxelGrid {
    pub fn new(size: usize, max_column_height: u32) -> Self {
        Self::with_terrain_extent(size, max_column_height, DEFAULT_TERRAIN_EXTENT)
    }

    pub fn with_terrain_extent(size: usize, max_column_height: u32, terrain_extent: (usize, usize)) -> Self {
        let mut columns = Vec::with_capacity(size * size);
        columns.resize_with(size * size, Column::default);
        Self {
            size,
            max_column_height,
            terrain_extent,
            columns,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            next_seq: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_column_height(&self) -> u32 {
        self.max_column_height
    }

    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.size && (z as usize) < self.size
    }

    pub fn in_terrain(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.terrain_extent.0 && (z as usize) < self.terrain_extent.1
    }

    fn column_index(&self, x: i32, z: i32) -> Option<usize> {
        self.in_bounds(x, z).then(|| x as usize * self.size + z as usize)
    }

    /// 0 for out-of-bounds columns
    pub fn column_height(&self, x: i32, z: i32) -> u32 {
        self.column_index(x, z).map_or(0, |i| self.columns[i].blocks.len() as u32)
    }

    /// Elevation the column stacks from, 0 for empty or out-of-bounds columns
    pub fn column_base(&self, x: i32, z: i32) -> f32 {
        self.column_index(x, z)
            .filter(|&i| !self.columns[i].blocks.is_empty())
            .map_or(0.0, |i| self.columns[i].base)
    }

    pub fn column_blocks(&self, x: i32, z: i32) -> &[BlockId] {
        match self.column_index(x, z) {
            Some(i) => &self.columns[i].blocks,
            None => &[],
        }
    }

    pub fn get(&self, id: BlockId) -> Option<&BlockInstance> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_ref())
    }

    pub fn instance_count(&self) -> usize {
        self.live
    }

    /// Live instances in slot order
    pub fn instances(&self) -> impl Iterator<Item = (BlockId, &BlockInstance)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.instance.as_ref().map(|instance| {
                (BlockId { index: index as u32, generation: slot.generation }, instance)
            })
        })
    }

    pub fn tree_blocks(&self) -> impl Iterator<Item = (BlockId, &BlockInstance)> + '_ {
        self.instances().filter(|(_, b)| b.flags.tree)
    }

    /// Non-loose instances whose center lies in column (x, z)
    pub fn instances_in_column(&self, x: i32, z: i32) -> usize {
        self.instances()
            .filter(|(_, b)| !b.is_loose())
            .filter(|(_, b)| b.position.x == x as f32 && b.position.z == z as f32)
            .count()
    }

    fn insert(&mut self, position: Vec3, block: BlockType, flags: BlockFlags) -> BlockId {
        let instance = BlockInstance {
            position,
            block,
            appearance: block.appearance(),
            flags,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.live += 1;

        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.instance = Some(instance);
                BlockId { index, generation: slot.generation }
            }
            None => {
                self.slots.push(Slot { generation: 0, instance: Some(instance) });
                BlockId { index: self.slots.len() as u32 - 1, generation: 0 }
            }
        }
    }

    fn take(&mut self, id: BlockId) -> Option<BlockInstance> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let instance = slot.instance.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(instance)
    }

    /// Tree block at an exact world position; never part of a column
    pub fn add_tree_block(&mut self, position: Vec3, block: BlockType) -> BlockId {
        let outside_grid = !self.in_bounds(position.x.floor() as i32, position.z.floor() as i32);
        self.insert(position, block, BlockFlags { tree: true, attached_to_terrain: true, outside_grid })
    }

    /// Place a block. `y` is a layer index or one of `TERRAIN_MARKER` / `FLOOR_MARKER`.
    /// Returns false, without touching any state, when the placement is illegal.
    pub fn add_block(&mut self, x: i32, y: i32, z: i32, block: BlockType, opts: AddOptions) -> bool {
        if y == TERRAIN_MARKER {
            let Some(terrain_height) = opts.terrain_height else {
                tracing::warn!(x, z, "terrain placement without a terrain height");
                return false;
            };
            return self.add_on_terrain(x, z, terrain_height, block);
        }

        let Some(ci) = self.column_index(x, z) else {
            tracing::debug!(x, y, z, "placement outside grid rejected");
            return false;
        };

        if y == FLOOR_MARKER || (y == 0 && self.columns[ci].blocks.is_empty()) {
            self.place_on_floor(ci, x, z, block);
            return true;
        }

        let height = self.columns[ci].blocks.len() as u32;
        if height >= self.max_column_height {
            tracing::debug!(x, z, height, "column full");
            return false;
        }
        if height == 0 {
            self.columns[ci].base = 0.0;
        }

        let target = (height + opts.stack_count.max(1)).min(self.max_column_height);
        let base = self.columns[ci].base;
        for layer in height..target {
            let position = Vec3::new(x as f32, base + layer as f32 + 0.5, z as f32);
            let id = self.insert(position, block, BlockFlags::default());
            self.columns[ci].blocks.push(id);
        }
        tracing::debug!(x, z, height = target, ?block, "stacked block");
        true
    }

    fn add_on_terrain(&mut self, x: i32, z: i32, terrain_height: f32, block: BlockType) -> bool {
        let Some(ci) = self.column_index(x, z) else {
            if !self.in_terrain(x, z) {
                tracing::debug!(x, z, "terrain placement outside terrain rejected");
                return false;
            }
            let position = Vec3::new(x as f32, terrain_height + 0.5, z as f32);
            self.insert(position, block, BlockFlags { tree: false, attached_to_terrain: true, outside_grid: true });
            tracing::debug!(x, z, terrain_height, ?block, "placed detached block on terrain");
            return true;
        };

        // terrain placement is uncapped, only stacking respects max_column_height
        let height = self.columns[ci].blocks.len() as u32;
        if height == 0 {
            self.columns[ci].base = terrain_height;
        }
        let position = Vec3::new(x as f32, self.columns[ci].base + height as f32 + 0.5, z as f32);
        let id = self.insert(position, block, BlockFlags { attached_to_terrain: true, ..BlockFlags::default() });
        self.columns[ci].blocks.push(id);
        tracing::debug!(x, z, height = height + 1, terrain_height, ?block, "placed block on terrain");
        true
    }

    /// Overwrites the column with exactly one block resting on y = 0
    fn place_on_floor(&mut self, ci: usize, x: i32, z: i32, block: BlockType) {
        let previous = std::mem::take(&mut self.columns[ci].blocks);
        for id in previous {
            self.take(id);
        }
        let id = self.insert(Vec3::new(x as f32, 0.5, z as f32), block, BlockFlags::default());
        let column = &mut self.columns[ci];
        column.base = 0.0;
        column.blocks.push(id);
        tracing::debug!(x, z, ?block, "placed block on floor");
    }

    /// Remove the block at a cell: loose blocks first (newest wins), then
    /// the top of the column. Returns false and leaves state untouched if
    /// nothing matches.
    pub fn remove_block(&mut self, x: i32, y: i32, z: i32) -> bool {
        let loose = self
            .instances()
            .filter(|(_, b)| b.is_loose() && b.matches_cell(x, y, z))
            .max_by_key(|(_, b)| b.seq)
            .map(|(id, _)| id);
        if let Some(id) = loose {
            self.take(id);
            tracing::debug!(x, y, z, "removed loose block");
            return true;
        }

        let Some(ci) = self.column_index(x, z) else {
            return false;
        };
        let Some(&top) = self.columns[ci].blocks.last() else {
            return false;
        };
        if self.take(top).is_none() {
            return false;
        }
        self.columns[ci].blocks.pop();
        tracing::debug!(x, z, height = self.columns[ci].blocks.len(), "removed column block");
        true
    }

    /// Remove a specific block. Column blocks above it drop one layer so the
    /// column stays contiguous.
    pub fn remove_by_id(&mut self, id: BlockId) -> bool {
        let Some(instance) = self.get(id) else {
            return false;
        };
        if instance.is_loose() {
            return self.take(id).is_some();
        }

        let (x, z) = (instance.position.x as i32, instance.position.z as i32);
        let Some(ci) = self.column_index(x, z) else {
            return false;
        };
        let Some(layer) = self.columns[ci].blocks.iter().position(|&b| b == id) else {
            return false;
        };
        self.take(id);
        self.columns[ci].blocks.remove(layer);
        let above = self.columns[ci].blocks[layer..].to_vec();
        for above_id in above {
            if let Some(slot) = self.slots.get_mut(above_id.index as usize) {
                if let Some(b) = slot.instance.as_mut() {
                    b.position.y -= 1.0;
                }
            }
        }
        true
    }
}
