use wgpu::Device;

use super::object::{Object, ObjectHandle};
use crate::gfx::resources::{environment::EnvironmentMap, layouts::SceneLayouts};

/// Scene containing top-level objects and an optional environment map.
///
/// Loads insert into the scene whenever they finish; GPU resources are
/// created by [`Scene::prepare_gpu`] before the next frame, so a partially
/// loaded scene renders whatever is present.
#[derive(Default)]
pub struct Scene {
    objects: Vec<(ObjectHandle, Object)>,
    pub environment: Option<EnvironmentMap>,
    next_handle: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a top-level object and returns its handle
    pub fn add_object(&mut self, object: Object) -> ObjectHandle {
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        log::info!("added '{}' to scene", object.name);
        self.objects.push((handle, object));
        handle
    }

    /// Replaces the environment used for ambient lighting and reflections
    pub fn set_environment(&mut self, environment: EnvironmentMap) {
        log::info!(
            "scene environment set ({}x{}, {:?})",
            environment.width,
            environment.height,
            environment.mapping
        );
        self.environment = Some(environment);
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&Object> {
        self.objects
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, object)| object)
    }

    pub fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut Object> {
        self.objects
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, object)| object)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter().map(|(_, object)| object)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn has_environment_gpu(&self) -> bool {
        self.environment
            .as_ref()
            .is_some_and(|environment| environment.bind_group().is_some())
    }

    /// Creates missing GPU resources and syncs transforms
    ///
    /// Must run on the render thread before each frame.
    pub fn prepare_gpu(&mut self, device: &Device, queue: &wgpu::Queue, layouts: &SceneLayouts) {
        for (_, object) in self.objects.iter_mut() {
            object.init_gpu_resources(device, queue, layouts);
            object.update_transform(queue);
        }

        if let Some(environment) = self.environment.as_mut() {
            environment.init_gpu_resources(device, queue, layouts);
        }
    }

    pub fn get_statistics(&self) -> SceneStatistics {
        SceneStatistics {
            object_count: self.objects.len(),
            material_count: self.objects().map(|o| o.materials.len()).sum(),
            total_triangles: self.objects().map(Object::triangle_count).sum(),
            has_environment: self.environment.is_some(),
        }
    }
}

/// Scene statistics for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub material_count: usize,
    pub total_triangles: u32,
    pub has_environment: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::{material::Material, TextureMapping};

    #[test]
    fn handles_are_unique_and_resolve() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object::new(vec![], vec![]));
        let b = scene.add_object(Object::new(vec![], vec![Material::default()]));
        assert_ne!(a, b);
        assert_eq!(scene.object_count(), 2);
        assert_eq!(scene.object(b).map(|o| o.materials.len()), Some(1));
    }

    #[test]
    fn object_mut_edits_in_place() {
        let mut scene = Scene::new();
        let handle = scene.add_object(Object::new(vec![], vec![]));
        scene
            .object_mut(handle)
            .expect("object exists")
            .set_rotation_xy(0.1, 0.2);
        let object = scene.object(handle).expect("object exists");
        assert_eq!(object.rotation.x, 0.1);
        assert_eq!(object.rotation.y, 0.2);
    }

    #[test]
    fn environment_starts_absent() {
        let mut scene = Scene::new();
        assert!(scene.environment.is_none());
        assert!(!scene.has_environment_gpu());

        scene.set_environment(
            EnvironmentMap::new(1, 1, vec![1.0; 4])
                .with_mapping(TextureMapping::EquirectangularReflection),
        );
        assert!(scene.get_statistics().has_environment);
        // not uploaded until prepare_gpu runs
        assert!(!scene.has_environment_gpu());
    }
}
