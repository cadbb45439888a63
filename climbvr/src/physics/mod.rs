pub mod query;
pub mod util;

use std::collections::HashMap;

use bitflags::bitflags;
use cgmath::{Quaternion, Vector3};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;

pub use query::{cast_sphere, CollisionResult};

use self::util::{cgvec_to_npoint, cgvec_to_nvec, isometry_from_parts, npoint_to_cgvec, nvec_to_cgvec};

bitflags! {
    /// Layers a collider can belong to. Locomotion queries only see colliders
    /// whose layers intersect the configured locomotion mask.
    pub struct CollisionGroup: u32 {
        /// Static level geometry the player can climb
        const LOCOMOTION = 0b0000_0001;
        /// Loose props that hands may push but not climb
        const DYNAMIC = 0b0000_0010;
        /// The player's own body and hand volumes
        const PLAYER = 0b0000_0100;
        /// Volumes that only report overlaps
        const TRIGGER = 0b0000_1000;
    }
}

impl CollisionGroup {
    /// Collision groups for a collider that belongs to these layers.
    pub fn membership(self) -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_truncate(self.bits()), Group::ALL)
    }

    /// Collision groups for a query that should only see these layers.
    pub fn query_mask(self) -> InteractionGroups {
        InteractionGroups::new(Group::ALL, Group::from_bits_truncate(self.bits()))
    }
}

/// Per-collider overrides read by the locomotion resolver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Surface {
    /// Fraction of the leftover movement allowed to slide along this surface.
    /// `None` falls back to the configured hand-context default.
    pub slip_percentage: Option<f32>,
    /// Material id matched against the impact feedback's sounding materials
    pub material: Option<u32>,
}

impl Surface {
    pub fn with_slip(slip_percentage: f32) -> Self {
        Surface {
            slip_percentage: Some(slip_percentage),
            material: None,
        }
    }

    pub fn with_material(self, material: u32) -> Self {
        Surface {
            material: Some(material),
            ..self
        }
    }
}

/// First blocking surface found by a world query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    pub point: Vector3<f32>,
    pub normal: Vector3<f32>,
    /// Distance travelled along the query direction before contact
    pub distance: f32,
    pub slip_percentage: Option<f32>,
    pub material: Option<u32>,
}

/// The world geometry seen by the locomotion core.
///
/// `direction` is always a unit vector; `max_distance` is the travel allowed
/// along it. Only locomotion-enabled geometry may be reported.
pub trait CollisionWorld {
    fn sphere_cast(
        &self,
        origin: Vector3<f32>,
        radius: f32,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<SurfaceHit>;

    fn raycast(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<SurfaceHit>;
}

/// Static and kinematic level geometry backed by rapier's query pipeline.
///
/// The query pipeline is rebuilt whenever colliders are added, moved or
/// removed, so queries always see the current geometry.
pub struct PhysicsWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    island_manager: IslandManager,
    query_pipeline: QueryPipeline,
    surfaces: HashMap<ColliderHandle, Surface>,
    locomotion_mask: CollisionGroup,
}

impl PhysicsWorld {
    pub fn new(locomotion_mask: CollisionGroup) -> Self {
        PhysicsWorld {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            island_manager: IslandManager::new(),
            query_pipeline: QueryPipeline::new(),
            surfaces: HashMap::new(),
            locomotion_mask,
        }
    }

    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    pub fn locomotion_mask(&self) -> CollisionGroup {
        self.locomotion_mask
    }

    pub fn set_locomotion_mask(&mut self, mask: CollisionGroup) {
        self.locomotion_mask = mask;
    }

    /// Box collider centred at `center`. `half_extents` are measured in the box's own frame.
    pub fn add_static_cuboid(
        &mut self,
        center: Vector3<f32>,
        half_extents: Vector3<f32>,
        rotation: Quaternion<f32>,
        group: CollisionGroup,
        surface: Option<Surface>,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .position(isometry_from_parts(center, rotation))
            .collision_groups(group.membership())
            .build();
        self.insert_collider(collider, surface)
    }

    pub fn add_static_ball(
        &mut self,
        center: Vector3<f32>,
        radius: f32,
        group: CollisionGroup,
        surface: Option<Surface>,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::ball(radius)
            .translation(cgvec_to_nvec(center))
            .collision_groups(group.membership())
            .build();
        self.insert_collider(collider, surface)
    }

    /// Triangle soup such as imported level geometry. Returns `None` for an empty mesh.
    pub fn add_static_trimesh(
        &mut self,
        vertices: &[Vector3<f32>],
        indices: Vec<[u32; 3]>,
        group: CollisionGroup,
        surface: Option<Surface>,
    ) -> Option<ColliderHandle> {
        if vertices.is_empty() || indices.is_empty() {
            return None;
        }

        let points = vertices.iter().map(|v| cgvec_to_npoint(*v)).collect();
        let collider = ColliderBuilder::trimesh(points, indices)
            .collision_groups(group.membership())
            .build();
        Some(self.insert_collider(collider, surface))
    }

    /// Reposition a collider, e.g. a moving platform. Returns false for an unknown handle.
    pub fn move_collider(
        &mut self,
        handle: ColliderHandle,
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) -> bool {
        let Some(collider) = self.collider_set.get_mut(handle) else {
            return false;
        };
        collider.set_position(isometry_from_parts(position, rotation));
        self.update_query_pipeline();
        true
    }

    pub fn remove_collider(&mut self, handle: ColliderHandle) -> bool {
        let removed = self
            .collider_set
            .remove(handle, &mut self.island_manager, &mut self.rigid_body_set, false)
            .is_some();
        if removed {
            self.surfaces.remove(&handle);
            self.update_query_pipeline();
        }
        removed
    }

    pub fn set_surface(&mut self, handle: ColliderHandle, surface: Surface) {
        self.surfaces.insert(handle, surface);
    }

    pub fn surface(&self, handle: ColliderHandle) -> Option<&Surface> {
        self.surfaces.get(&handle)
    }

    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.rigid_body_set, &self.collider_set);
    }

    fn insert_collider(&mut self, collider: Collider, surface: Option<Surface>) -> ColliderHandle {
        let handle = self.collider_set.insert(collider);
        if let Some(surface) = surface {
            self.surfaces.insert(handle, surface);
        }
        self.update_query_pipeline();
        engine::physics_log!(trace, "added collider {:?}", handle);
        handle
    }

    fn query_filter(&self) -> QueryFilter {
        QueryFilter::default()
            .exclude_sensors()
            .groups(self.locomotion_mask.query_mask())
    }

    fn surface_or_default(&self, handle: ColliderHandle) -> Surface {
        self.surfaces.get(&handle).copied().unwrap_or_default()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(CollisionGroup::LOCOMOTION)
    }
}

impl CollisionWorld for PhysicsWorld {
    fn sphere_cast(
        &self,
        origin: Vector3<f32>,
        radius: f32,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<SurfaceHit> {
        if radius <= 0.0 || max_distance <= 0.0 {
            return None;
        }

        let ball = Ball::new(radius);
        let shape_pos = Isometry::translation(origin.x, origin.y, origin.z);
        let shape_vel = cgvec_to_nvec(direction);
        // Shapes that start out overlapping are only reported when moving deeper.
        let mut options = ShapeCastOptions::with_max_time_of_impact(max_distance);
        options.stop_at_penetration = false;

        let (handle, hit) = self.query_pipeline.cast_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &shape_pos,
            &shape_vel,
            &ball,
            options,
            self.query_filter(),
        )?;
        let surface = self.surface_or_default(handle);

        Some(SurfaceHit {
            point: npoint_to_cgvec(&hit.witness1),
            normal: nvec_to_cgvec(&hit.normal1),
            distance: hit.time_of_impact,
            slip_percentage: surface.slip_percentage,
            material: surface.material,
        })
    }

    fn raycast(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<SurfaceHit> {
        if max_distance <= 0.0 {
            return None;
        }

        let ray = Ray::new(cgvec_to_npoint(origin), cgvec_to_nvec(direction));
        let (handle, intersection) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            self.query_filter(),
        )?;
        let surface = self.surface_or_default(handle);

        Some(SurfaceHit {
            point: npoint_to_cgvec(&ray.point_at(intersection.time_of_impact)),
            normal: nvec_to_cgvec(&intersection.normal),
            distance: intersection.time_of_impact,
            slip_percentage: surface.slip_percentage,
            material: surface.material,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, One, vec3};

    fn floor_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::default();
        world.add_static_cuboid(
            vec3(0.0, -0.5, 0.0),
            vec3(10.0, 0.5, 10.0),
            Quaternion::one(),
            CollisionGroup::LOCOMOTION,
            None,
        );
        world
    }

    #[test]
    fn test_sphere_cast_hits_floor() {
        let world = floor_world();
        let hit = world
            .sphere_cast(vec3(0.0, 1.0, 0.0), 0.25, vec3(0.0, -1.0, 0.0), 5.0)
            .expect("floor should block the cast");

        assert!((hit.distance - 0.75).abs() < 1.0e-3);
        assert!((hit.normal - vec3(0.0, 1.0, 0.0)).magnitude() < 1.0e-3);
        assert!(hit.point.y.abs() < 1.0e-3);
        assert_eq!(hit.slip_percentage, None);
    }

    #[test]
    fn test_sphere_cast_respects_max_distance() {
        let world = floor_world();
        assert!(world
            .sphere_cast(vec3(0.0, 2.0, 0.0), 0.25, vec3(0.0, -1.0, 0.0), 1.0)
            .is_none());
    }

    #[test]
    fn test_raycast_reports_point_and_normal() {
        let world = floor_world();
        let hit = world
            .raycast(vec3(1.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0), 5.0)
            .expect("ray should hit the floor");

        assert!((hit.distance - 2.0).abs() < 1.0e-3);
        assert!((hit.point - vec3(1.0, 0.0, 0.0)).magnitude() < 1.0e-3);
        assert!((hit.normal - vec3(0.0, 1.0, 0.0)).magnitude() < 1.0e-3);
    }

    #[test]
    fn test_non_locomotion_layers_are_ignored() {
        let mut world = PhysicsWorld::default();
        world.add_static_cuboid(
            vec3(0.0, -0.5, 0.0),
            vec3(10.0, 0.5, 10.0),
            Quaternion::one(),
            CollisionGroup::DYNAMIC,
            None,
        );

        assert!(world
            .raycast(vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0), 5.0)
            .is_none());

        world.set_locomotion_mask(CollisionGroup::LOCOMOTION | CollisionGroup::DYNAMIC);
        assert!(world
            .raycast(vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0), 5.0)
            .is_some());
    }

    #[test]
    fn test_surface_slip_is_reported() {
        let mut world = PhysicsWorld::default();
        world.add_static_ball(
            vec3(0.0, 0.0, -2.0),
            0.5,
            CollisionGroup::LOCOMOTION,
            Some(Surface::with_slip(0.4)),
        );

        let hit = world
            .raycast(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0), 5.0)
            .unwrap();
        assert_eq!(hit.slip_percentage, Some(0.4));
        assert_eq!(hit.material, None);
    }

    #[test]
    fn test_surface_material_is_reported() {
        let mut world = PhysicsWorld::default();
        world.add_static_ball(
            vec3(0.0, 0.0, -2.0),
            0.5,
            CollisionGroup::LOCOMOTION,
            Some(Surface::with_slip(0.1).with_material(7)),
        );

        let hit = world
            .sphere_cast(vec3(0.0, 0.0, 0.0), 0.1, vec3(0.0, 0.0, -1.0), 5.0)
            .unwrap();
        assert_eq!(hit.material, Some(7));
        assert_eq!(hit.slip_percentage, Some(0.1));
    }

    #[test]
    fn test_surface_can_be_assigned_after_insertion() {
        let mut world = PhysicsWorld::default();
        let handle = world.add_static_ball(vec3(0.0, 0.0, -2.0), 0.5, CollisionGroup::LOCOMOTION, None);
        assert!(world.surface(handle).is_none());

        world.set_surface(handle, Surface::with_slip(0.7));
        assert_eq!(world.surface(handle), Some(&Surface::with_slip(0.7)));
        let hit = world
            .raycast(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0), 5.0)
            .unwrap();
        assert_eq!(hit.slip_percentage, Some(0.7));
    }

    #[test]
    fn test_moving_and_removing_colliders() {
        let mut world = PhysicsWorld::default();
        let handle = world.add_static_ball(vec3(0.0, 0.0, -2.0), 0.5, CollisionGroup::LOCOMOTION, None);
        let forward = vec3(0.0, 0.0, -1.0);

        assert!(world.raycast(vec3(0.0, 0.0, 0.0), forward, 5.0).is_some());

        assert!(world.move_collider(handle, vec3(5.0, 0.0, -2.0), Quaternion::one()));
        assert!(world.raycast(vec3(0.0, 0.0, 0.0), forward, 5.0).is_none());
        assert!(world.raycast(vec3(5.0, 0.0, 0.0), forward, 5.0).is_some());

        assert!(world.remove_collider(handle));
        assert!(!world.remove_collider(handle));
        assert_eq!(world.collider_count(), 0);
        assert!(world.raycast(vec3(5.0, 0.0, 0.0), forward, 5.0).is_none());
    }

    #[test]
    fn test_empty_trimesh_is_rejected() {
        let mut world = PhysicsWorld::default();
        assert!(world
            .add_static_trimesh(&[], Vec::new(), CollisionGroup::LOCOMOTION, None)
            .is_none());

        let vertices = [
            vec3(-5.0, 0.0, -5.0),
            vec3(5.0, 0.0, -5.0),
            vec3(0.0, 0.0, 5.0),
        ];
        assert!(world
            .add_static_trimesh(&vertices, vec![[0, 2, 1]], CollisionGroup::LOCOMOTION, None)
            .is_some());
        assert!(world
            .raycast(vec3(0.0, 1.0, 0.0), vec3(0.0, -1.0, 0.0), 2.0)
            .is_some());
    }
}
