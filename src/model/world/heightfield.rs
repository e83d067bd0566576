// heightfield.rs - procedural terrain elevation lattice
//
// Generation runs once:
//   1. three sinusoidal octaves plus two radial peaks per lattice vertex
//   2. scale by max_height * 0.6, clamp at zero
//   3. flatten the spawn circle (radius 5 around the center) and the
//      panda circle (radius 3 around center + (2,2))
//   4. one 3x3 box blur pass, averaging only neighbours inside the lattice
//   5. re-apply the flat circles so the blur cannot lift them
//
// After construction the lattice never changes.

use glam::{Vec2, Vec3};

use crate::utils::{Mesh, Vertex};

/// Radius of the flattened circle around the world center
pub const SPAWN_FLAT_RADIUS: f32 = 5.0;
/// Radius of the flattened circle around the panda spawn point
pub const PANDA_FLAT_RADIUS: f32 = 3.0;
/// Offset of the panda spawn point from the world center
pub const PANDA_SPAWN_OFFSET: Vec2 = Vec2::new(2.0, 2.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightFieldConfig {
    // Cell counts; the lattice has one more vertex per axis
    pub width: usize,
    pub depth: usize,

    // World units per cell
    pub cell_scale: f32,

    // Peak amplitude before the 0.6 damping
    pub max_height: f32,
}

impl Default for HeightFieldConfig {
    fn default() -> Self {
        Self {
            width: 64,
            depth: 64,
            cell_scale: 1.0,
            max_height: 2.5,
        }
    }
}

pub struct HeightField {
    pub config: HeightFieldConfig,
    /// heights[x][z], (width + 1) x (depth + 1)
    heights: Vec<Vec<f32>>,
}

impl HeightField {
    pub fn new() -> Self {
        Self::with_config(HeightFieldConfig::default())
    }

    pub fn with_config(config: HeightFieldConfig) -> Self {
        let mut heights = vec![vec![0.0; config.depth + 1]; config.width + 1];
        for (x, column) in heights.iter_mut().enumerate() {
            for (z, h) in column.iter_mut().enumerate() {
                *h = raw_height(&config, x as f32, z as f32);
            }
        }

        let mut field = Self { config, heights };
        field.flatten_spawn_areas();
        field.smooth();
        field.flatten_spawn_areas();

        tracing::debug!(
            width = config.width,
            depth = config.depth,
            max = field.max_height(),
            "height field generated"
        );
        field
    }

    /// Flat test terrain: every lattice height is zero
    pub fn flat(width: usize, depth: usize) -> Self {
        let config = HeightFieldConfig { width, depth, ..HeightFieldConfig::default() };
        Self { config, heights: vec![vec![0.0; depth + 1]; width + 1] }
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn depth(&self) -> usize {
        self.config.depth
    }

    /// World-space center of the terrain; the player spawns here
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.config.width as f32 / 2.0, self.config.depth as f32 / 2.0) * self.config.cell_scale
    }

    /// Where the parent panda waits
    pub fn panda_spawn(&self) -> Vec2 {
        self.center() + PANDA_SPAWN_OFFSET * self.config.cell_scale
    }

    /// Lattice cell containing a world position, if it lies on the terrain
    pub fn cell_at(&self, x: f32, z: f32) -> Option<(usize, usize)> {
        let cx = (x / self.config.cell_scale).floor();
        let cz = (z / self.config.cell_scale).floor();
        if cx < 0.0 || cz < 0.0 || cx >= self.config.width as f32 || cz >= self.config.depth as f32 {
            return None;
        }
        Some((cx as usize, cz as usize))
    }

    pub fn in_bounds(&self, x: f32, z: f32) -> bool {
        self.cell_at(x, z).is_some()
    }

    /// Height of the lower-left lattice vertex of the cell; 0 off the terrain
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        match self.cell_at(x, z) {
            Some((cx, cz)) => self.heights[cx][cz],
            None => 0.0,
        }
    }

    /// Raw lattice access, `None` outside the (width+1) x (depth+1) vertices
    pub fn lattice(&self, x: usize, z: usize) -> Option<f32> {
        self.heights.get(x).and_then(|col| col.get(z)).copied()
    }

    pub fn max_height(&self) -> f32 {
        self.heights.iter().flatten().fold(0.0f32, |acc, &h| acc.max(h))
    }

    fn is_flattened(&self, x: f32, z: f32) -> bool {
        let p = Vec2::new(x, z);
        let center = Vec2::new(self.config.width as f32 / 2.0, self.config.depth as f32 / 2.0);
        p.distance(center) < SPAWN_FLAT_RADIUS || p.distance(center + PANDA_SPAWN_OFFSET) < PANDA_FLAT_RADIUS
    }

    fn flatten_spawn_areas(&mut self) {
        for x in 0..=self.config.width {
            for z in 0..=self.config.depth {
                if self.is_flattened(x as f32, z as f32) {
                    self.heights[x][z] = 0.0;
                }
            }
        }
    }

    fn smooth(&mut self) {
        let w = self.config.width as i64;
        let d = self.config.depth as i64;
        let mut smoothed = self.heights.clone();

        for x in 0..=w {
            for z in 0..=d {
                let mut sum = 0.0;
                let mut count = 0;
                for dx in -1..=1 {
                    for dz in -1..=1 {
                        let nx = x + dx;
                        let nz = z + dz;
                        if nx >= 0 && nx <= w && nz >= 0 && nz <= d {
                            sum += self.heights[nx as usize][nz as usize];
                            count += 1;
                        }
                    }
                }
                smoothed[x as usize][z as usize] = sum / count as f32;
            }
        }

        self.heights = smoothed;
    }

    /// Triangulated lattice with averaged per-vertex normals.
    /// Vertex heights are the exact values `height_at` returns.
    pub fn build_mesh(&self) -> Mesh {
        let w = self.config.width;
        let d = self.config.depth;
        let scale = self.config.cell_scale;
        let color = [0.4, 0.8, 0.4, 1.0];

        let mut mesh = Mesh::empty();
        for x in 0..=w {
            for z in 0..=d {
                mesh.vertices.push(Vertex {
                    pos: [x as f32 * scale, self.heights[x][z], z as f32 * scale],
                    normal: [0.0; 3],
                    color,
                    uv: [x as f32 / w as f32 * 4.0, z as f32 / d as f32 * 4.0],
                });
            }
        }

        let index = |x: usize, z: usize| (x * (d + 1) + z) as u32;
        for x in 0..w {
            for z in 0..d {
                let tl = index(x, z);
                let tr = index(x + 1, z);
                let bl = index(x, z + 1);
                let br = index(x + 1, z + 1);
                mesh.indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }

        let mut normals = vec![Vec3::ZERO; mesh.vertices.len()];
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let v0 = Vec3::from(mesh.vertices[a].pos);
            let v1 = Vec3::from(mesh.vertices[b].pos);
            let v2 = Vec3::from(mesh.vertices[c].pos);
            let face = (v1 - v0).cross(v2 - v0);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for (vertex, n) in mesh.vertices.iter_mut().zip(normals) {
            vertex.normal = n.try_normalize().unwrap_or(Vec3::Y).to_array();
        }

        mesh
    }
}

/// Noise synthesis before flattening and smoothing
fn raw_height(config: &HeightFieldConfig, x: f32, z: f32) -> f32 {
    let mut h = 0.0;

    // low, medium and high frequency octaves
    h += (x * 0.1).sin() * (z * 0.1).cos() * 0.3;
    h += (x * 0.3 + z * 0.2).sin() * 0.2;
    h += (x * 0.7 + z * 0.6).sin() * 0.1;

    let w = config.width as f32;
    let d = config.depth as f32;
    let p = Vec2::new(x, z);
    let d1 = p.distance(Vec2::new(w * 0.3, d * 0.7));
    let d2 = p.distance(Vec2::new(w * 0.7, d * 0.4));
    h += (2.0 - d1 / 8.0).max(0.0);
    h += (1.5 - d2 / 10.0).max(0.0);

    (h * config.max_height * 0.6).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heights_non_negative() {
        let field = HeightField::new();
        for x in 0..field.width() {
            for z in 0..field.depth() {
                assert!(field.height_at(x as f32, z as f32) >= 0.0);
            }
        }
        assert!(field.max_height() > 0.5, "peaks should rise above the plain");
    }

    #[test]
    fn test_spawn_areas_are_flat() {
        let field = HeightField::new();
        let center = field.center();
        let panda = field.panda_spawn();
        for x in 0..field.width() {
            for z in 0..field.depth() {
                let p = Vec2::new(x as f32, z as f32);
                if p.distance(center) < SPAWN_FLAT_RADIUS || p.distance(panda) < PANDA_FLAT_RADIUS {
                    assert_eq!(field.height_at(p.x, p.y), 0.0, "cell ({x}, {z}) should be flat");
                }
            }
        }
    }

    #[test]
    fn test_height_at_out_of_bounds_is_zero() {
        let field = HeightField::new();
        assert_eq!(field.height_at(-0.1, 10.0), 0.0);
        assert_eq!(field.height_at(10.0, 64.0), 0.0);
        assert_eq!(field.height_at(64.5, 64.5), 0.0);
    }

    #[test]
    fn test_height_at_uses_lower_lattice_vertex() {
        let field = HeightField::new();
        // the peak region around (19, 45) is well above zero
        let lattice = field.lattice(19, 45).unwrap();
        assert!(lattice > 0.0);
        assert_eq!(field.height_at(19.0, 45.0), lattice);
        assert_eq!(field.height_at(19.99, 45.7), lattice);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = HeightField::new();
        let b = HeightField::new();
        for x in 0..=64 {
            for z in 0..=64 {
                assert_eq!(a.lattice(x, z), b.lattice(x, z));
            }
        }
    }

    #[test]
    fn test_mesh_matches_height_queries() {
        let field = HeightField::with_config(HeightFieldConfig { width: 16, depth: 12, ..Default::default() });
        let mesh = field.build_mesh();
        assert_eq!(mesh.vertices.len(), 17 * 13);
        assert_eq!(mesh.triangle_count(), 16 * 12 * 2);

        for v in &mesh.vertices {
            let [x, y, z] = v.pos;
            if (x as usize) < 16 && (z as usize) < 12 {
                assert_eq!(field.height_at(x, z), y);
            }
            let n = Vec3::from(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-4);
            assert!(n.y > 0.0, "terrain normals point up");
        }
    }

    #[test]
    fn test_flat_field_normals_point_up() {
        let mesh = HeightField::flat(4, 4).build_mesh();
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }
}
