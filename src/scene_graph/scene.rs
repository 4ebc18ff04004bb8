use glam::Vec3;
use id_arena::Arena;
use itertools::Itertools;

use crate::geometry::Geometry;
use crate::scene_graph::object3d::{Object3D, ObjectId};

/// Ordered mesh objects sharing one geometry.
pub struct Scene {
    objects: Arena<Object3D>,
    geometry: Geometry,
    generation: u64,
}

impl Scene {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            objects: Arena::new(),
            geometry,
            generation: 0,
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object3D)> {
        self.objects.iter()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut Object3D)> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Bumped every time the geometry is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Swaps in a new shared geometry for every object and drops the old one.
    pub fn replace_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
        self.generation += 1;
    }

    /// Objects sorted furthest first, as transparent meshes need to be drawn.
    /// Ties keep insertion order.
    pub fn back_to_front(&self, depth: impl Fn(Vec3) -> f32) -> Vec<ObjectId> {
        self.objects
            .iter()
            .map(|(id, object)| (id, depth(object.transform.translation())))
            .sorted_by(|(_, a), (_, b)| b.total_cmp(a))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::transform::Transform;

    fn object_at(name: &str, z: f32) -> Object3D {
        Object3D {
            name: name.to_string(),
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, z)),
            ..Default::default()
        }
    }

    #[test]
    fn keeps_insertion_order() {
        let mut scene = Scene::new(Geometry::default());
        let a = scene.add_object(object_at("a", 0.0));
        let b = scene.add_object(object_at("b", 0.0));

        let ids = scene.objects().map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get_object(b).map(|o| o.name.as_str()), Some("b"));
    }

    #[test]
    fn replacing_geometry_bumps_generation() {
        let mut scene = Scene::new(Geometry::default());
        scene.add_object(object_at("a", 0.0));
        assert_eq!(scene.generation(), 0);

        scene.replace_geometry(Geometry {
            vertices: Vec::new(),
            indices: vec![0, 1, 2],
        });

        assert_eq!(scene.generation(), 1);
        assert_eq!(scene.geometry().indices, vec![0, 1, 2]);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn back_to_front_orders_by_depth() {
        let mut scene = Scene::new(Geometry::default());
        let near = scene.add_object(object_at("near", 10.0));
        let far = scene.add_object(object_at("far", -10.0));
        let middle = scene.add_object(object_at("middle", 0.0));

        // Looking down -Z from +Z, depth grows as z shrinks
        let order = scene.back_to_front(|p| -p.z);
        assert_eq!(order, vec![far, middle, near]);
    }

    #[test]
    fn back_to_front_is_stable_for_ties() {
        let mut scene = Scene::new(Geometry::default());
        let a = scene.add_object(object_at("a", 0.0));
        let b = scene.add_object(object_at("b", 0.0));

        assert_eq!(scene.back_to_front(|p| p.z), vec![a, b]);
    }
}
