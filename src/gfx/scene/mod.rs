//! # Scene Management Module
//!
//! Entity/component storage for everything the render graph draws: meshes
//! with materials, the three light types, and the skybox.
//!
//! ## Key Components
//!
//! - [`World`] - Flat component arenas plus cached query index sets
//! - [`Entity`] - Plain `u32` id handed out by [`World::spawn`]
//! - [`components`] - The component types themselves
//! - [`Mesh`] - Indexed triangle geometry with lazily created GPU buffers
//!
//! ## Usage
//!
//! ```no_run
//! use gloam::gfx::scene::World;
//! use gloam::gfx::scene::components::{MaterialComponent, TransformComponent};
//!
//! let mut world = World::new();
//! let entity = world.spawn();
//! world.add_transform(entity, TransformComponent::default());
//! world.add_material(entity, MaterialComponent::new([1.0, 0.2, 0.2, 1.0]));
//! ```
//!
//! Query index sets are rebuilt when components are added or removed, never
//! on read, so per-frame iteration is a plain slice walk.

pub mod components;
pub mod mesh;

pub use mesh::{DrawMesh, Mesh};

use components::{
    DirectionalLightComponent, MaterialComponent, MeshComponent, PointLightComponent,
    SkyboxComponent, SpotLightComponent, TransformComponent,
};

use crate::gfx::resources::texture::TextureResource;

/// Identifier of a spawned entity; indexes the component arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(pub u32);

impl Entity {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Component storage: one `Vec<Option<T>>` arena per component type.
///
/// Entities are never reused; despawning clears the slots and leaves a
/// hole. Suits scenes that are built once and mutated rarely.
#[derive(Default)]
pub struct World {
    transforms: Vec<Option<TransformComponent>>,
    meshes: Vec<Option<MeshComponent>>,
    materials: Vec<Option<MaterialComponent>>,
    directional_lights: Vec<Option<DirectionalLightComponent>>,
    point_lights: Vec<Option<PointLightComponent>>,
    spot_lights: Vec<Option<SpotLightComponent>>,
    skyboxes: Vec<Option<SkyboxComponent>>,

    renderables: Vec<Entity>,
    directional_light_set: Vec<Entity>,
    point_light_set: Vec<Entity>,
    spot_light_set: Vec<Entity>,
    skybox_set: Vec<Entity>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> Entity {
        let entity = Entity(self.transforms.len() as u32);
        self.transforms.push(None);
        self.meshes.push(None);
        self.materials.push(None);
        self.directional_lights.push(None);
        self.point_lights.push(None);
        self.spot_lights.push(None);
        self.skyboxes.push(None);
        entity
    }

    /// Clears every component of the entity. The id is not reused.
    pub fn despawn(&mut self, entity: Entity) {
        let i = self.check(entity);
        self.transforms[i] = None;
        self.meshes[i] = None;
        self.materials[i] = None;
        self.directional_lights[i] = None;
        self.point_lights[i] = None;
        self.spot_lights[i] = None;
        self.skyboxes[i] = None;
        self.rebuild_queries();
    }

    pub fn entity_count(&self) -> usize {
        self.transforms.len()
    }

    fn check(&self, entity: Entity) -> usize {
        let i = entity.index();
        if i >= self.transforms.len() {
            panic!("unknown entity {:?}", entity);
        }
        i
    }

    pub fn add_transform(&mut self, entity: Entity, component: TransformComponent) {
        let i = self.check(entity);
        self.transforms[i] = Some(component);
        self.rebuild_queries();
    }

    pub fn add_mesh(&mut self, entity: Entity, component: MeshComponent) {
        let i = self.check(entity);
        self.meshes[i] = Some(component);
        self.rebuild_queries();
    }

    pub fn add_material(&mut self, entity: Entity, component: MaterialComponent) {
        let i = self.check(entity);
        self.materials[i] = Some(component);
        self.rebuild_queries();
    }

    pub fn add_directional_light(&mut self, entity: Entity, component: DirectionalLightComponent) {
        let i = self.check(entity);
        self.directional_lights[i] = Some(component);
        self.rebuild_queries();
    }

    pub fn add_point_light(&mut self, entity: Entity, component: PointLightComponent) {
        let i = self.check(entity);
        self.point_lights[i] = Some(component);
        self.rebuild_queries();
    }

    pub fn add_spot_light(&mut self, entity: Entity, component: SpotLightComponent) {
        let i = self.check(entity);
        self.spot_lights[i] = Some(component);
        self.rebuild_queries();
    }

    pub fn add_skybox(&mut self, entity: Entity, component: SkyboxComponent) {
        let i = self.check(entity);
        self.skyboxes[i] = Some(component);
        self.rebuild_queries();
    }

    pub fn remove_mesh(&mut self, entity: Entity) {
        let i = self.check(entity);
        self.meshes[i] = None;
        self.rebuild_queries();
    }

    pub fn remove_material(&mut self, entity: Entity) {
        let i = self.check(entity);
        self.materials[i] = None;
        self.rebuild_queries();
    }

    pub fn transform(&self, entity: Entity) -> Option<&TransformComponent> {
        self.transforms[self.check(entity)].as_ref()
    }

    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut TransformComponent> {
        let i = self.check(entity);
        self.transforms[i].as_mut()
    }

    pub fn mesh(&self, entity: Entity) -> Option<&MeshComponent> {
        self.meshes[self.check(entity)].as_ref()
    }

    pub fn mesh_mut(&mut self, entity: Entity) -> Option<&mut MeshComponent> {
        let i = self.check(entity);
        self.meshes[i].as_mut()
    }

    pub fn material(&self, entity: Entity) -> Option<&MaterialComponent> {
        self.materials[self.check(entity)].as_ref()
    }

    pub fn material_mut(&mut self, entity: Entity) -> Option<&mut MaterialComponent> {
        let i = self.check(entity);
        self.materials[i].as_mut()
    }

    /// Entities carrying transform, mesh, and material.
    pub fn renderables(&self) -> &[Entity] {
        &self.renderables
    }

    pub fn directional_lights(
        &self,
    ) -> impl Iterator<Item = (Entity, &TransformComponent, &DirectionalLightComponent)> {
        self.directional_light_set.iter().filter_map(move |&e| {
            let i = e.index();
            Some((
                e,
                self.transforms[i].as_ref()?,
                self.directional_lights[i].as_ref()?,
            ))
        })
    }

    pub fn point_lights(
        &self,
    ) -> impl Iterator<Item = (Entity, &TransformComponent, &PointLightComponent)> {
        self.point_light_set.iter().filter_map(move |&e| {
            let i = e.index();
            Some((e, self.transforms[i].as_ref()?, self.point_lights[i].as_ref()?))
        })
    }

    pub fn spot_lights(
        &self,
    ) -> impl Iterator<Item = (Entity, &TransformComponent, &SpotLightComponent)> {
        self.spot_light_set.iter().filter_map(move |&e| {
            let i = e.index();
            Some((e, self.transforms[i].as_ref()?, self.spot_lights[i].as_ref()?))
        })
    }

    /// First skybox in spawn order, if any.
    pub fn skybox(&self) -> Option<&SkyboxComponent> {
        let e = *self.skybox_set.first()?;
        self.skyboxes[e.index()].as_ref()
    }

    fn rebuild_queries(&mut self) {
        self.renderables.clear();
        self.directional_light_set.clear();
        self.point_light_set.clear();
        self.spot_light_set.clear();
        self.skybox_set.clear();

        for i in 0..self.transforms.len() {
            let e = Entity(i as u32);
            if self.transforms[i].is_some()
                && self.meshes[i].is_some()
                && self.materials[i].is_some()
            {
                self.renderables.push(e);
            }
            if self.transforms[i].is_some() && self.directional_lights[i].is_some() {
                self.directional_light_set.push(e);
            }
            if self.transforms[i].is_some() && self.point_lights[i].is_some() {
                self.point_light_set.push(e);
            }
            if self.transforms[i].is_some() && self.spot_lights[i].is_some() {
                self.spot_light_set.push(e);
            }
            if self.skyboxes[i].is_some() {
                self.skybox_set.push(e);
            }
        }
    }

    /// Uploads mesh buffers, material textures, and the skybox cube texture.
    ///
    /// Must be called after the GPU context is available and before
    /// rendering. Safe to call again after adding entities; existing
    /// resources are not re-uploaded.
    pub fn init_gpu_resources(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for slot in self.meshes.iter_mut().flatten() {
            slot.mesh.init_gpu_resources(device);
        }

        for (i, slot) in self.materials.iter_mut().enumerate() {
            let Some(material) = slot.as_mut() else {
                continue;
            };
            if let (Some(data), None) = (&material.diffuse, &material.diffuse_gpu) {
                material.diffuse_gpu = Some(TextureResource::create_from_rgba_data(
                    device,
                    queue,
                    &data.pixels,
                    data.width,
                    data.height,
                    &format!("Diffuse Map {}", i),
                ));
            }
            if let (Some(data), None) = (&material.normal, &material.normal_gpu) {
                material.normal_gpu = Some(TextureResource::create_from_rgba_data(
                    device,
                    queue,
                    &data.pixels,
                    data.width,
                    data.height,
                    &format!("Normal Map {}", i),
                ));
            }
            if let (Some(data), None) = (&material.height, &material.height_gpu) {
                material.height_gpu = Some(TextureResource::create_from_rgba_data(
                    device,
                    queue,
                    &data.pixels,
                    data.width,
                    data.height,
                    &format!("Height Map {}", i),
                ));
            }
        }

        for slot in self.skyboxes.iter_mut().flatten() {
            if slot.gpu.is_none() {
                let faces = &slot.faces;
                let size = faces[0].width;
                let face_refs: [&[u8]; 6] = [
                    &faces[0].pixels,
                    &faces[1].pixels,
                    &faces[2].pixels,
                    &faces[3].pixels,
                    &faces[4].pixels,
                    &faces[5].pixels,
                ];
                slot.gpu = Some(TextureResource::create_cube_from_rgba_faces(
                    device,
                    queue,
                    &face_refs,
                    size,
                    "Skybox Cube Texture",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use cgmath::Vector3;

    fn test_mesh() -> MeshComponent {
        MeshComponent::new(Mesh::from_geometry(&generate_cube()))
    }

    #[test]
    fn spawn_assigns_sequential_ids() {
        let mut world = World::new();
        assert_eq!(world.spawn(), Entity(0));
        assert_eq!(world.spawn(), Entity(1));
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn renderable_query_requires_all_three_components() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_transform(e, TransformComponent::default());
        world.add_mesh(e, test_mesh());
        assert!(world.renderables().is_empty());

        world.add_material(e, MaterialComponent::new([1.0; 4]));
        assert_eq!(world.renderables(), &[e]);
    }

    #[test]
    fn removing_a_component_drops_the_renderable() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_transform(e, TransformComponent::default());
        world.add_mesh(e, test_mesh());
        world.add_material(e, MaterialComponent::new([1.0; 4]));
        assert_eq!(world.renderables().len(), 1);

        world.remove_material(e);
        assert!(world.renderables().is_empty());
    }

    #[test]
    fn despawn_clears_all_queries() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_transform(e, TransformComponent::default());
        world.add_point_light(e, PointLightComponent::default());
        assert_eq!(world.point_lights().count(), 1);

        world.despawn(e);
        assert_eq!(world.point_lights().count(), 0);
        // The id is not handed out again.
        assert_eq!(world.spawn(), Entity(1));
    }

    #[test]
    fn light_queries_pair_transform_and_light() {
        let mut world = World::new();

        let lit = world.spawn();
        world.add_transform(lit, TransformComponent::at(Vector3::new(0.0, 5.0, 0.0)));
        world.add_directional_light(lit, DirectionalLightComponent::default());

        // A light without a transform is not part of the set.
        let orphan = world.spawn();
        world.add_directional_light(orphan, DirectionalLightComponent::default());

        let collected: Vec<_> = world.directional_lights().collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].0, lit);
        assert_eq!(collected[0].1.position.y, 5.0);
    }

    #[test]
    fn empty_world_queries_are_empty() {
        let world = World::new();
        assert!(world.renderables().is_empty());
        assert_eq!(world.directional_lights().count(), 0);
        assert!(world.skybox().is_none());
    }

    #[test]
    #[should_panic(expected = "unknown entity")]
    fn component_add_for_unknown_entity_panics() {
        let mut world = World::new();
        world.add_transform(Entity(3), TransformComponent::default());
    }
}
