use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use rand::Rng;

use crate::color::Color;

/// This should match `VertexInput` in `cube_cloud.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
}

pub const VERTICES_PER_CUBE: usize = 24;
pub const INDICES_PER_CUBE: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeCloudParams {
    pub count: u32,
    pub shell_radius: f32,
    pub cube_extent: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn cube_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_CUBE
    }
}

/// Unit cube faces as (normal axis, u axis, v axis). Corners are spanned as
/// `normal + u * su + v * sv` for the four sign combinations.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
];

const FACE_CORNERS: [(f32, f32); 4] = [(-1.0, 1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
const FACE_INDICES: [u32; 6] = [0, 2, 1, 2, 3, 1];

/// Index into the eight corner colors, one bit per positive axis.
fn corner_index(unit: Vec3) -> usize {
    (unit.x > 0.0) as usize | ((unit.y > 0.0) as usize) << 1 | ((unit.z > 0.0) as usize) << 2
}

fn shell_point(rng: &mut impl Rng, radius: f32) -> Vec3 {
    let mut sample = || rng.gen::<f32>() * radius * 2.0 - radius;
    let point = Vec3::new(sample(), sample(), sample());
    point.normalize_or_zero() * radius
}

fn corner_colors(rng: &mut impl Rng) -> [Vec3; 8] {
    let base = Color::from_hsl(rng.gen(), rng.gen(), rng.gen()).rgb();
    std::array::from_fn(|_| base * Vec3::new(rng.gen(), rng.gen(), rng.gen()))
}

fn append_cube(geometry: &mut Geometry, dimensions: Vec3, transform: Mat4, colors: &[Vec3; 8]) {
    let half = dimensions * 0.5;

    for (normal, u, v) in FACES {
        let first = geometry.vertices.len() as u32;

        for (su, sv) in FACE_CORNERS {
            let unit = normal + u * su + v * sv;
            geometry.vertices.push(Vertex {
                position: transform.transform_point3(unit * half),
                color: colors[corner_index(unit)],
            });
        }

        geometry
            .indices
            .extend(FACE_INDICES.iter().map(|index| first + index));
    }
}

/// Scatters `count` randomly sized, rotated and colored boxes over the surface
/// of a sphere and merges them into a single indexed buffer.
pub fn generate_cube_cloud(params: &CubeCloudParams, rng: &mut impl Rng) -> Geometry {
    let count = params.count as usize;
    let radius = params.shell_radius;
    let extent = params.cube_extent;

    let mut geometry = Geometry {
        vertices: Vec::with_capacity(count * VERTICES_PER_CUBE),
        indices: Vec::with_capacity(count * INDICES_PER_CUBE),
    };

    for _ in 0..count {
        let position = shell_point(rng, radius);
        let colors = corner_colors(rng);

        let mut dimension = || rng.gen::<f32>() * extent * 2.0 - extent;
        let dimensions = Vec3::new(dimension(), dimension(), dimension());

        // X first, then Y, then Z
        let (rx, ry, rz) = (
            rng.gen::<f32>() * PI,
            rng.gen::<f32>() * PI,
            rng.gen::<f32>() * PI,
        );
        let rotation =
            Quat::from_rotation_z(rz) * Quat::from_rotation_y(ry) * Quat::from_rotation_x(rx);

        let transform = Mat4::from_rotation_translation(rotation, position);
        append_cube(&mut geometry, dimensions, transform, &colors);
    }

    log::debug!(
        "Generated cube cloud: {} cubes, {} vertices, radius {}",
        count,
        geometry.vertices.len(),
        radius
    );

    geometry
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn params(count: u32) -> CubeCloudParams {
        CubeCloudParams {
            count,
            shell_radius: 256.0,
            cube_extent: 16.0,
        }
    }

    #[test]
    fn buffer_sizes_follow_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let geometry = generate_cube_cloud(&params(37), &mut rng);

        assert_eq!(geometry.vertices.len(), 37 * VERTICES_PER_CUBE);
        assert_eq!(geometry.indices.len(), 37 * INDICES_PER_CUBE);
        assert_eq!(geometry.cube_count(), 37);
        assert!(geometry
            .indices
            .iter()
            .all(|&i| (i as usize) < geometry.vertices.len()));
    }

    #[test]
    fn cubes_are_centered_on_the_shell() {
        let mut rng = StdRng::seed_from_u64(7);
        let geometry = generate_cube_cloud(&params(64), &mut rng);

        for cube in geometry.vertices.chunks(VERTICES_PER_CUBE) {
            let center = cube.iter().map(|v| v.position).sum::<Vec3>() / cube.len() as f32;
            assert!(
                (center.length() - 256.0).abs() < 0.01,
                "cube center {center} is off the shell"
            );
        }
    }

    #[test]
    fn cubes_stay_within_extent() {
        let mut rng = StdRng::seed_from_u64(3);
        let geometry = generate_cube_cloud(&params(64), &mut rng);
        // Half diagonal of the largest possible box
        let max_reach = 16.0 * 3f32.sqrt() + 0.01;

        for cube in geometry.vertices.chunks(VERTICES_PER_CUBE) {
            let center = cube.iter().map(|v| v.position).sum::<Vec3>() / cube.len() as f32;
            for vertex in cube {
                assert!((vertex.position - center).length() <= max_reach);
            }
        }
    }

    #[test]
    fn colors_are_normalized() {
        let mut rng = StdRng::seed_from_u64(11);
        let geometry = generate_cube_cloud(&params(50), &mut rng);

        for vertex in &geometry.vertices {
            assert!(vertex.color.min_element() >= 0.0);
            assert!(vertex.color.max_element() <= 1.0);
        }
    }

    #[test]
    fn shared_corners_share_colors() {
        let mut rng = StdRng::seed_from_u64(5);
        let geometry = generate_cube_cloud(&params(1), &mut rng);

        let mut distinct = geometry.vertices.iter().map(|v| v.color).collect::<Vec<_>>();
        distinct.sort_by(|a, b| {
            a.x.total_cmp(&b.x)
                .then(a.y.total_cmp(&b.y))
                .then(a.z.total_cmp(&b.z))
        });
        distinct.dedup();
        assert!(distinct.len() <= 8);
    }

    #[test]
    fn same_seed_same_cloud() {
        let a = generate_cube_cloud(&params(20), &mut StdRng::seed_from_u64(99));
        let b = generate_cube_cloud(&params(20), &mut StdRng::seed_from_u64(99));
        let c = generate_cube_cloud(&params(20), &mut StdRng::seed_from_u64(100));

        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.indices, b.indices);
        assert_ne!(a.vertices, c.vertices);
    }

    #[test]
    fn zero_size_collapses_to_origin() {
        let mut rng = StdRng::seed_from_u64(2);
        let geometry = generate_cube_cloud(
            &CubeCloudParams {
                count: 3,
                shell_radius: 0.0,
                cube_extent: 0.0,
            },
            &mut rng,
        );

        assert_eq!(geometry.cube_count(), 3);
        assert!(geometry.vertices.iter().all(|v| v.position == Vec3::ZERO));
    }

    #[test]
    fn corner_index_covers_all_corners() {
        let mut seen = [false; 8];
        for (normal, u, v) in FACES {
            for (su, sv) in FACE_CORNERS {
                seen[corner_index(normal + u * su + v * sv)] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }
}
