use fastrand::Rng;
use glam::{Vec2, Vec3};

use crate::model::panda::Panda;
use crate::model::progress::GameProgress;
use crate::model::world::{trees, HeightField, HeightFieldConfig, Tree, TreeScatterConfig, VoxelGrid};

/// World generation parameters. The same config always yields the same world.
///
/// Example:
///   let mut config = WorldConfig::default();
///   config.seed = 7;
///   config.trees.count = 10;   // sparser forest
///   let scene = Scene::generate(&config);
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    pub seed: u64,

    // Playable block grid
    pub grid_size: usize,
    pub max_column_height: u32,

    // Raycast reach and draw distance
    pub view_range: f32,

    pub terrain: HeightFieldConfig,
    pub trees: TreeScatterConfig,

    // Babies to hide, if enough sites exist
    pub baby_panda_limit: usize,
    // Baby sites need at least this much ground under the trunk
    pub min_site_height: f32,
    // Used only when no tree qualifies
    pub fallback_site_height: f32,
    pub fallback_site_limit: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_BA3B0,
            grid_size: 16,
            max_column_height: 2,
            view_range: 24.0,
            terrain: HeightFieldConfig::default(),
            trees: TreeScatterConfig::default(),
            baby_panda_limit: 4,
            min_site_height: 0.3,
            fallback_site_height: 0.5,
            fallback_site_limit: 6,
        }
    }
}

/// Everything that exists in the world: terrain, blocks, trees and pandas
pub struct Scene {
    pub config: WorldConfig,
    pub terrain: HeightField,
    pub grid: VoxelGrid,
    pub trees: Vec<Tree>,
    pub main_panda: Panda,
    pub babies: Vec<Panda>,
    pub progress: GameProgress,
}

impl Scene {
    pub fn generate(config: &WorldConfig) -> Self {
        let mut rng = Rng::with_seed(config.seed);

        let terrain = HeightField::with_config(config.terrain);
        let mut grid = VoxelGrid::with_terrain_extent(
            config.grid_size,
            config.max_column_height,
            (terrain.width(), terrain.depth()),
        );

        let trees = trees::scatter_trees(&terrain, &config.trees, &mut rng);
        for tree in &trees {
            trees::plant_tree(&mut grid, tree, &mut rng);
        }

        let spawn = terrain.panda_spawn();
        let mut main_panda = Panda::main(Vec3::new(spawn.x, 0.0, spawn.y));
        main_panda.position.y = terrain.height_at(spawn.x, spawn.y) + main_panda.standing_offset();
        main_panda.start_animation();

        let sites = baby_sites(config, &terrain, &trees, &mut rng);
        let babies: Vec<Panda> = sites
            .iter()
            .take(config.baby_panda_limit)
            .map(|site| {
                let x = site.x + rng.f32() * 2.0 - 1.0;
                let z = site.y + rng.f32() * 2.0 - 1.0;
                let mut baby = Panda::baby(Vec3::new(x, 0.0, z));
                baby.position.y = terrain.height_at(x, z) + baby.standing_offset();
                baby.start_animation();
                baby
            })
            .collect();

        tracing::info!(
            seed = config.seed,
            trees = trees.len(),
            tree_blocks = grid.instance_count(),
            babies = babies.len(),
            "world generated"
        );

        let progress = GameProgress::new(babies.len());
        Self { config: *config, terrain, grid, trees, main_panda, babies, progress }
    }

    /// Where the player starts: the flat world center
    pub fn spawn_point(&self) -> Vec2 {
        self.terrain.center()
    }

    pub fn pandas(&self) -> impl Iterator<Item = &Panda> + '_ {
        std::iter::once(&self.main_panda).chain(self.babies.iter())
    }

    pub fn pandas_mut(&mut self) -> impl Iterator<Item = &mut Panda> + '_ {
        std::iter::once(&mut self.main_panda).chain(self.babies.iter_mut())
    }

    pub fn toggle_all_animations(&mut self) {
        for panda in self.pandas_mut() {
            panda.toggle_animation();
        }
    }
}

/// Shuffled candidate spots for hiding babies: next to tree trunks on raised
/// ground, or any raised grid cell if no tree qualifies.
fn baby_sites(config: &WorldConfig, terrain: &HeightField, trees: &[Tree], rng: &mut Rng) -> Vec<Vec2> {
    let mut sites: Vec<Vec2> = Vec::new();
    for tree in trees {
        let site = Vec2::new(tree.x as f32, tree.z as f32);
        if terrain.height_at(site.x, site.y) >= config.min_site_height && !sites.contains(&site) {
            sites.push(site);
        }
    }

    if sites.is_empty() {
        tracing::warn!("no tree sites for baby pandas, falling back to raised ground");
        'scan: for x in 0..config.grid_size {
            for z in 0..config.grid_size {
                if terrain.height_at(x as f32, z as f32) >= config.fallback_site_height {
                    sites.push(Vec2::new(x as f32, z as f32));
                    if sites.len() >= config.fallback_site_limit {
                        break 'scan;
                    }
                }
            }
        }
    }

    rng.shuffle(&mut sites);
    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::xz_distance;

    #[test]
    fn test_generate_places_pandas() {
        let scene = Scene::generate(&WorldConfig::default());
        assert!(!scene.trees.is_empty());
        assert!(!scene.babies.is_empty() && scene.babies.len() <= 4);
        assert_eq!(scene.progress.total(), scene.babies.len());
        assert_eq!(scene.progress.found(), 0);

        let spawn = scene.terrain.panda_spawn();
        assert_eq!(scene.main_panda.position, Vec3::new(spawn.x, 0.7, spawn.y));
        assert!(scene.main_panda.animation.animating);

        for baby in &scene.babies {
            assert_eq!(baby.scale, 0.5);
            assert!(!baby.is_following());
            let near_tree = scene
                .trees
                .iter()
                .any(|t| xz_distance(baby.position, Vec3::new(t.x as f32, 0.0, t.z as f32)) <= 1.5);
            assert!(near_tree, "baby should hide next to a trunk");
        }
    }

    #[test]
    fn test_same_seed_same_world() {
        let config = WorldConfig { seed: 1234, ..WorldConfig::default() };
        let a = Scene::generate(&config);
        let b = Scene::generate(&config);
        assert_eq!(a.trees, b.trees);
        assert_eq!(a.babies, b.babies);
        assert_eq!(a.grid.instance_count(), b.grid.instance_count());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = Scene::generate(&WorldConfig { seed: 1, ..WorldConfig::default() });
        let b = Scene::generate(&WorldConfig { seed: 2, ..WorldConfig::default() });
        assert_ne!(a.trees, b.trees);
    }

    #[test]
    fn test_no_trees_falls_back_to_raised_ground() {
        let mut config = WorldConfig::default();
        config.trees.count = 0;
        config.grid_size = 64;
        let scene = Scene::generate(&config);
        assert!(scene.trees.is_empty());
        assert!(!scene.babies.is_empty());
        assert!(scene.babies.len() <= 4);
    }

    #[test]
    fn test_toggle_all_animations() {
        let mut scene = Scene::generate(&WorldConfig::default());
        scene.toggle_all_animations();
        assert!(scene.pandas().all(|p| !p.animation.animating));
        scene.toggle_all_animations();
        assert!(scene.pandas().all(|p| p.animation.animating));
    }
}
