use fastrand::Rng;
use glam::{Vec2, Vec3};

use super::block::BlockType;
use super::grid::{BlockId, VoxelGrid};
use super::heightfield::HeightField;

/// Tree blocks sink this far into the terrain so trunks never float
const TREE_SINK: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeScatterConfig {
    pub count: usize,
    // Candidate positions tried per tree before giving up on it
    pub attempts: usize,
    // Polar scatter radius around the world center
    pub max_radius: f32,
    pub min_spacing: f32,
    pub spawn_clearance: f32,
    pub panda_clearance: f32,
    // Trees only grow on raised ground
    pub min_terrain_height: f32,
}

impl Default for TreeScatterConfig {
    fn default() -> Self {
        Self {
            count: 20,
            attempts: 100,
            max_radius: 28.0,
            min_spacing: 3.5,
            spawn_clearance: 5.0,
            panda_clearance: 6.0,
            min_terrain_height: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeKind {
    /// 4-block trunk, 3x3x2 canopy with an open centre column
    Standard,
    /// 5-6 block trunk, 5x5x2 canopy with ragged corners
    Tall,
    /// 3-block trunk, single 3x3 canopy layer
    Small,
}

impl TreeKind {
    pub fn for_site(x: i32, z: i32) -> Self {
        match (x + z).rem_euclid(3) {
            0 => TreeKind::Standard,
            1 => TreeKind::Tall,
            _ => TreeKind::Small,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tree {
    pub x: i32,
    pub z: i32,
    pub kind: TreeKind,
    pub terrain_height: f32,
}

/// Pick tree sites around the world center, keeping clear of the spawn
/// and panda areas and of each other.
pub fn scatter_trees(field: &HeightField, config: &TreeScatterConfig, rng: &mut Rng) -> Vec<Tree> {
    let center = field.center();
    let panda = field.panda_spawn();
    let max_x = field.width() as i32 - 1;
    let max_z = field.depth() as i32 - 1;
    let mut trees: Vec<Tree> = Vec::with_capacity(config.count);

    for i in 0..config.count {
        for _ in 0..config.attempts {
            let candidate = match i % 3 {
                0 => {
                    let radius = rng.f32() * config.max_radius;
                    polar(rng, center, radius)
                }
                1 => {
                    let ring = rng.u32(0..3) as f32;
                    let radius = (ring + 1.0) * (config.max_radius / 3.0) + (rng.f32() * 4.0 - 2.0);
                    polar(rng, center, radius)
                }
                _ if trees.len() > 1 => {
                    let anchor = trees[rng.usize(0..trees.len())];
                    let origin = Vec2::new(anchor.x as f32, anchor.z as f32);
                    let radius = 5.0 + rng.f32() * 3.0;
                    polar(rng, origin, radius)
                }
                _ => {
                    let radius = rng.f32() * config.max_radius;
                    polar(rng, center, radius)
                }
            };

            let x = (candidate.x.floor() as i32).clamp(0, max_x);
            let z = (candidate.y.floor() as i32).clamp(0, max_z);
            let site = Vec2::new(x as f32, z as f32);

            if site.distance(center) < config.spawn_clearance || site.distance(panda) < config.panda_clearance {
                continue;
            }
            let terrain_height = field.height_at(site.x, site.y);
            if terrain_height < config.min_terrain_height {
                continue;
            }
            let crowded = trees
                .iter()
                .any(|t| site.distance(Vec2::new(t.x as f32, t.z as f32)) < config.min_spacing);
            if crowded {
                continue;
            }

            trees.push(Tree { x, z, kind: TreeKind::for_site(x, z), terrain_height });
            break;
        }
    }

    tracing::debug!(placed = trees.len(), wanted = config.count, "scattered trees");
    trees
}

fn polar(rng: &mut Rng, origin: Vec2, radius: f32) -> Vec2 {
    let angle = rng.f32() * std::f32::consts::TAU;
    origin + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Add a tree's trunk and canopy to the grid as tree blocks.
/// Returns the ids of the trunk blocks, bottom first.
pub fn plant_tree(grid: &mut VoxelGrid, tree: &Tree, rng: &mut Rng) -> Vec<BlockId> {
    let place = |grid: &mut VoxelGrid, lx: i32, ly: i32, lz: i32, block: BlockType| {
        let position = Vec3::new(
            (tree.x + lx) as f32,
            ly as f32 + 0.5 - TREE_SINK + tree.terrain_height,
            (tree.z + lz) as f32,
        );
        grid.add_tree_block(position, block)
    };

    let trunk_height = match tree.kind {
        TreeKind::Standard => 4,
        TreeKind::Tall => 5 + rng.i32(0..2),
        TreeKind::Small => 3,
    };
    let trunk: Vec<BlockId> = (0..trunk_height).map(|ly| place(grid, 0, ly, 0, BlockType::Wood)).collect();

    match tree.kind {
        TreeKind::Standard => {
            for lx in -1..=1 {
                for lz in -1..=1 {
                    if lx == 0 && lz == 0 {
                        continue;
                    }
                    for ly in 4..=5 {
                        place(grid, lx, ly, lz, BlockType::Leaves);
                    }
                }
            }
        }
        TreeKind::Tall => {
            for lx in -2i32..=2 {
                for lz in -2i32..=2 {
                    let corner = lx.abs() == 2 && lz.abs() == 2;
                    if corner && rng.f32() < 0.7 {
                        continue;
                    }
                    for ly in trunk_height..=trunk_height + 1 {
                        place(grid, lx, ly, lz, BlockType::Leaves);
                    }
                }
            }
        }
        TreeKind::Small => {
            for lx in -1..=1 {
                for lz in -1..=1 {
                    place(grid, lx, 3, lz, BlockType::Leaves);
                }
            }
        }
    }

    trunk
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scatter_respects_constraints() {
        let field = HeightField::new();
        let config = TreeScatterConfig::default();
        let trees = scatter_trees(&field, &config, &mut Rng::with_seed(42));
        assert!(!trees.is_empty(), "terrain has raised ground for trees");
        assert!(trees.len() <= config.count);

        for (i, tree) in trees.iter().enumerate() {
            let site = Vec2::new(tree.x as f32, tree.z as f32);
            assert!(site.distance(field.center()) >= config.spawn_clearance);
            assert!(site.distance(field.panda_spawn()) >= config.panda_clearance);
            assert!(tree.terrain_height >= config.min_terrain_height);
            assert!((0..64).contains(&tree.x) && (0..64).contains(&tree.z));
            for other in &trees[i + 1..] {
                let d = site.distance(Vec2::new(other.x as f32, other.z as f32));
                assert!(d >= config.min_spacing, "trees too close: {d}");
            }
        }
    }

    #[test]
    fn test_scatter_is_seeded() {
        let field = HeightField::new();
        let config = TreeScatterConfig::default();
        let a = scatter_trees(&field, &config, &mut Rng::with_seed(9));
        let b = scatter_trees(&field, &config, &mut Rng::with_seed(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_tree_shapes() {
        let mut rng = Rng::with_seed(1);
        let mut grid = VoxelGrid::new(16, 2);

        let standard = Tree { x: 30, z: 30, kind: TreeKind::Standard, terrain_height: 0.5 };
        let trunk = plant_tree(&mut grid, &standard, &mut rng);
        assert_eq!(trunk.len(), 4);
        assert_eq!(grid.instance_count(), 4 + 8 * 2);
        let base = grid.get(trunk[0]).unwrap();
        assert!((base.position.y - 0.3).abs() < 1e-5);
        assert!(base.flags.tree && base.flags.outside_grid);

        let mut grid = VoxelGrid::new(16, 2);
        let small = Tree { x: 40, z: 40, kind: TreeKind::Small, terrain_height: 0.0 };
        plant_tree(&mut grid, &small, &mut rng);
        assert_eq!(grid.instance_count(), 3 + 9);

        let mut grid = VoxelGrid::new(16, 2);
        let tall = Tree { x: 50, z: 20, kind: TreeKind::Tall, terrain_height: 1.0 };
        let trunk = plant_tree(&mut grid, &tall, &mut rng);
        assert!(trunk.len() == 5 || trunk.len() == 6);
        let leaves = grid.instance_count() - trunk.len();
        assert!(leaves >= 21 * 2 && leaves <= 25 * 2);
    }

    #[test]
    fn test_tree_blocks_never_touch_columns() {
        let mut grid = VoxelGrid::new(16, 2);
        let tree = Tree { x: 5, z: 5, kind: TreeKind::Standard, terrain_height: 0.4 };
        plant_tree(&mut grid, &tree, &mut Rng::with_seed(3));
        for x in 0..16 {
            for z in 0..16 {
                assert_eq!(grid.column_height(x, z), 0);
            }
        }
        assert_eq!(grid.tree_blocks().count(), grid.instance_count());
    }

    #[test]
    fn test_kind_from_site() {
        assert_eq!(TreeKind::for_site(3, 3), TreeKind::Standard);
        assert_eq!(TreeKind::for_site(3, 4), TreeKind::Tall);
        assert_eq!(TreeKind::for_site(3, 5), TreeKind::Small);
    }
}
