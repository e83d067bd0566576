use bytemuck::NoUninit;
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

/// Vertex/index arrays handed to the renderer as a mesh handle
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes, ready for a GPU upload on the host side
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Create outline mesh for block targeting (unit cube at origin, line list)
pub fn create_outline_mesh() -> Mesh {
    let color = [1.0, 1.0, 0.3, 1.0];
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let vertices = corners
        .iter()
        .map(|&pos| Vertex { pos, normal: [0.0, 1.0, 0.0], color, uv: [pos[0], pos[1]] })
        .collect();
    let indices = vec![
        0, 1, 1, 2, 2, 3, 3, 0, // bottom
        4, 5, 5, 6, 6, 7, 7, 4, // top
        0, 4, 1, 5, 2, 6, 3, 7, // sides
    ];

    Mesh { vertices, indices }
}

/// Unit cube spanning [0,1] on every axis, one quad per face with flat normals.
/// Color is white so the renderer tints it with the instance appearance.
pub fn create_cube_mesh() -> Mesh {
    // (normal, four corners in counter-clockwise order seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([1.0, 0.0, 0.0], [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
        ([-1.0, 0.0, 0.0], [[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]]),
        ([0.0, 1.0, 0.0], [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]]),
        ([0.0, -1.0, 0.0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
        ([0.0, 0.0, 1.0], [[1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]]),
        ([0.0, 0.0, -1.0], [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
    ];
    let uvs = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

    let mut mesh = Mesh::empty();
    for (normal, corners) in faces.iter() {
        let base = mesh.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            mesh.vertices.push(Vertex { pos: *corner, normal: *normal, color: [1.0; 4], uv: *uv });
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Integer cell coordinates in world space
#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub struct WorldCoord(pub i32, pub i32, pub i32);

impl WorldCoord {
    /// Cell containing a world position
    pub fn from_vec3(p: Vec3) -> Self {
        WorldCoord(p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32)
    }

    pub fn offset(&self, d: (i32, i32, i32)) -> Self {
        WorldCoord(self.0 + d.0, self.1 + d.1, self.2 + d.2)
    }
}

/// Distance on the ground plane, ignoring height
pub fn xz_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Quadratic ease-in-out on [0,1]
pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Wrap an angle in degrees into [0, 360)
pub fn normalize_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

/// Signed difference `to - from` along the shorter arc, in [-180, 180]
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    let mut diff = to - from;
    while diff > 180.0 {
        diff -= 360.0;
    }
    while diff < -180.0 {
        diff += 360.0;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_in_out_endpoints() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert!((ease_in_out_quad(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out_quad(1.0) - 1.0).abs() < 1e-6);
        assert!(ease_in_out_quad(0.25) < 0.25, "should start slow");
        assert!(ease_in_out_quad(0.75) > 0.75, "should end slow");
    }

    #[test]
    fn test_shortest_angle_wraps() {
        assert_eq!(shortest_angle_delta(350.0, 10.0), 20.0);
        assert_eq!(shortest_angle_delta(10.0, 350.0), -20.0);
        assert_eq!(shortest_angle_delta(0.0, 180.0), 180.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
    }

    #[test]
    fn test_cube_mesh_layout() {
        let cube = create_cube_mesh();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertex_bytes().len(), 24 * std::mem::size_of::<Vertex>());
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn test_world_coord_floors_negative() {
        assert_eq!(WorldCoord::from_vec3(Vec3::new(-0.5, 1.9, 2.0)), WorldCoord(-1, 1, 2));
        assert_eq!(WorldCoord(0, 0, 0).offset((1, -1, 2)), WorldCoord(1, -1, 2));
    }
}
