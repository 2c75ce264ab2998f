use std::ops::Range;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Rad, SquareMatrix, Vector3, Zero};
use wgpu::Device;

use super::vertex::Vertex3D;
use crate::{
    gfx::resources::{layouts::SceneLayouts, material::Material},
    wgpu_utils::{uniform_buffer::UniformBuffer, BindGroupBuilder},
};

/// Stable identifier of a top-level object in a [`super::Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub(crate) u64);

pub struct Mesh {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    /// Index into the owning object's materials
    pub material: usize,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>, material: usize) -> Self {
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            material,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    /// Area-weighted smooth normals for meshes that ship without them
    pub fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![Vector3::zero(); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let v0 = Vector3::from(positions[i0]);
            let v1 = Vector3::from(positions[i1]);
            let v2 = Vector3::from(positions[i2]);

            // unnormalized cross product weights by triangle area
            let face_normal = (v1 - v0).cross(v2 - v0);
            for i in [i0, i1, i2] {
                normals[i] += face_normal;
            }
        }

        normals
            .into_iter()
            .map(|n: Vector3<f32>| {
                if n.magnitude2() > 0.0 {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect()
    }

    fn init_gpu_resources(&mut self, device: &Device) {
        if self.vertex_buffer.is_some() {
            return;
        }

        self.vertex_buffer = Some(wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        self.index_buffer = Some(wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));
    }
}

/// Per-object uniform. MUST match `Transform` in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix, upper 3x3 used
    pub normal: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn from_matrix(model: Matrix4<f32>) -> Self {
        let linear = Matrix3::from_cols(model.x.truncate(), model.y.truncate(), model.z.truncate());
        let normal = linear
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(linear);

        Self {
            model: model.into(),
            normal: Matrix4::from(normal).into(),
        }
    }
}

pub struct ObjectGpuResources {
    pub transform_buffer: UniformBuffer<TransformUniform>,
    pub transform_bind_group: wgpu::BindGroup,
}

/// A top-level scene node with its meshes and materials.
///
/// Child node transforms of the source asset are baked into the mesh
/// vertices, so the node's own position, rotation and scale are the only
/// transform left.
pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub position: Vector3<f32>,
    /// Euler angles in radians, applied in XYZ order
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub visible: bool,
    pub gpu_resources: Option<ObjectGpuResources>, // None until init_gpu_resources called
}

impl Object {
    /// Create a new Object with identity transformation
    pub fn new(meshes: Vec<Mesh>, materials: Vec<Material>) -> Self {
        Self {
            name: String::from("Object"),
            meshes,
            materials,
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set uniform scale
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = Vector3::new(scale, scale, scale);
    }

    /// Sets pitch (about X) and yaw (about Y), keeping roll
    pub fn set_rotation_xy(&mut self, pitch: f32, yaw: f32) {
        self.rotation.x = pitch;
        self.rotation.y = yaw;
    }

    /// T * Rx * Ry * Rz * S
    pub fn transform(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z));
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }

    pub fn triangle_count(&self) -> u32 {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    pub fn material_for(&self, mesh: &Mesh) -> Option<&Material> {
        self.materials.get(mesh.material)
    }

    /// Creates buffers, bind groups and material resources once
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue, layouts: &SceneLayouts) {
        if self.gpu_resources.is_some() {
            return;
        }

        for mesh in self.meshes.iter_mut() {
            mesh.init_gpu_resources(device);
        }
        for material in self.materials.iter_mut() {
            material.init_gpu_resources(device, queue, layouts);
        }

        let transform_buffer =
            UniformBuffer::new(device, "Transform Uniform", TransformUniform::from_matrix(self.transform()));
        let transform_bind_group = BindGroupBuilder::new(&layouts.transform)
            .resource(transform_buffer.binding_resource())
            .create(device, &format!("{} Transform Bind Group", self.name));

        self.gpu_resources = Some(ObjectGpuResources {
            transform_buffer,
            transform_bind_group,
        });
        log::debug!(
            "uploaded '{}' ({} meshes, {} triangles)",
            self.name,
            self.meshes.len(),
            self.triangle_count()
        );
    }

    /// Syncs the current transform to the GPU if resources exist
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        let uniform = TransformUniform::from_matrix(self.transform());
        if let Some(gpu_resources) = &mut self.gpu_resources {
            gpu_resources.transform_buffer.write(queue, uniform);
        }
    }

    pub fn get_transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("name", &self.name)
            .field("meshes", &self.meshes.len())
            .field("materials", &self.materials)
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("uploaded", &self.gpu_resources.is_some())
            .finish()
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_object(&mut self, object: &'a Object);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // not uploaded yet
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    /// Binds slot 1 (transform) and slot 2 (material) per mesh
    fn draw_object(&mut self, object: &'b Object) {
        let Some(transform_bind_group) = object.get_transform_bind_group() else {
            return;
        };
        self.set_bind_group(1, transform_bind_group, &[]);

        for mesh in &object.meshes {
            let Some(material_bind_group) = object.material_for(mesh).and_then(Material::bind_group)
            else {
                continue;
            };
            self.set_bind_group(2, material_bind_group, &[]);
            self.draw_mesh(mesh);
        }
    }
}
