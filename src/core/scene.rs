// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::kdtree::{ KdTree, KdTreeBuilder, SearchCache };
use crate::core::provider::{ GeometryProvider, ShadingProvider };
use crate::core::shader::{ Shader, ShaderId, ShaderSet };
use crate::core::shape::Shape;
use crate::core::tangent_frame::SurfaceFrame;
use crate::core::trace_result::{ GeoId, TraceResult };
use crate::materials::diffuse::Diffuse;
use crate::materials::white_light::WhiteLight;
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector3f };
use crate::math::ray::Ray3f;
use crate::shapes::sphere::Sphere;
use crate::shapes::triangle::Triangle;

pub const DEFAULT_ENVIRONMENT_RADIUS: Float = 20.0;
pub const DEFAULT_ENVIRONMENT_INTENSITY: Float = 40.0;

/// A triangle mesh with its own spatial index and one shader.
pub struct PolyMesh {
    triangles: Vec<Triangle>,
    frames: Vec<SurfaceFrame>,
    index: KdTree,
    shader: ShaderId,
}

impl ComputationNode for PolyMesh {
    fn to_string(&self) -> String {
        format!("PolyMesh: {{ triangles: {}, nodes: {}, depth: {} }}",
                self.triangles.len(), self.index.node_count(), self.index.depth())
    }
}

impl PolyMesh {
    fn build(triangles: Vec<Triangle>, shader: ShaderId) -> Self {
        let mut builder = KdTreeBuilder::with_capacity(triangles.len());
        let mut frames = Vec::with_capacity(triangles.len());
        for (i, triangle) in triangles.iter().enumerate() {
            match triangle.geometric_normal() {
                Some(normal) => {
                    frames.push(SurfaceFrame::from_normal(&normal));
                    builder.add_entry(triangle.bounding_box(), i);
                }
                None => {
                    // Never hit, kept so element indices match the input.
                    frames.push(SurfaceFrame::from_normal(&Vector3f::new(0.0, 1.0, 0.0)));
                }
            }
        }
        let index = builder.finalize();
        Self { triangles, frames, index, shader }
    }

    fn trace(&self, ray: &Ray3f, cache: &mut SearchCache) -> Option<(usize, Float)> {
        let triangles = &self.triangles;
        self.index
            .find_nearest(ray, cache, |ray, primitive| triangles[primitive].ray_intersection(ray))
            .map(|hit| (hit.primitive, hit.distance))
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> Option<AABB> {
        self.index.bounds()
    }
}

/// Collects meshes and shaders. Consumed by `build`, which constructs every
/// mesh index before the scene can be queried.
pub struct SceneBuilder {
    shaders: ShaderSet,
    default_shader: ShaderId,
    meshes: Vec<(Vec<Triangle>, ShaderId)>,
    environment_radius: Float,
    environment_intensity: Float,
}

impl SceneBuilder {
    pub fn new() -> Self {
        let mut shaders = ShaderSet::new();
        let default_shader = shaders.add(Box::new(Diffuse::default()));
        Self {
            shaders,
            default_shader,
            meshes: Vec::new(),
            environment_radius: DEFAULT_ENVIRONMENT_RADIUS,
            environment_intensity: DEFAULT_ENVIRONMENT_INTENSITY,
        }
    }

    pub fn with_environment(mut self, radius: Float, intensity: Float) -> Self {
        self.environment_radius = radius;
        self.environment_intensity = intensity;
        self
    }

    pub fn add_shader(&mut self, shader: Box<dyn Shader>) -> ShaderId {
        self.shaders.add(shader)
    }

    /// The white diffuse shader every builder starts with.
    pub fn default_shader(&self) -> ShaderId {
        self.default_shader
    }

    pub fn add_mesh(&mut self, triangles: Vec<Triangle>, shader: ShaderId) {
        debug_assert!(shader.index() < self.shaders.len());
        self.meshes.push((triangles, shader));
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn build(self) -> SimpleScene {
        let SceneBuilder { mut shaders, meshes, environment_radius, environment_intensity, .. } = self;

        let meshes: Vec<PolyMesh> = meshes.into_iter()
            .map(|(triangles, shader)| PolyMesh::build(triangles, shader))
            .collect();
        let environment_shader = shaders.add(Box::new(WhiteLight::new(environment_intensity)));
        let environment = Sphere::new(Vector3f::zeros(), environment_radius);

        let scene = SimpleScene { meshes, shaders, environment, environment_shader };
        log::info!("Scene built: {} meshes, {} triangles, environment radius {}.",
                   scene.meshes.len(), scene.triangle_count(), environment_radius);
        scene
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Triangle meshes enclosed by a glowing environment sphere.
///
/// Mesh `i` answers with object index `i + 1`; the environment uses the
/// index after the last mesh and only shows where no mesh is closer.
pub struct SimpleScene {
    meshes: Vec<PolyMesh>,
    shaders: ShaderSet,
    environment: Sphere,
    environment_shader: ShaderId,
}

impl SimpleScene {
    pub fn builder() -> SceneBuilder {
        SceneBuilder::new()
    }

    pub fn meshes(&self) -> &[PolyMesh] {
        &self.meshes
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count()).sum()
    }

    pub fn environment_object_index(&self) -> usize {
        self.meshes.len() + 1
    }

    pub fn environment(&self) -> &Sphere {
        &self.environment
    }

    fn mesh_for(&self, geo_id: &GeoId) -> Option<&PolyMesh> {
        if geo_id.object_index == 0 {
            return None;
        }
        self.meshes.get(geo_id.object_index - 1)
    }
}

impl GeometryProvider for SimpleScene {
    fn trace(&self, ray: &Ray3f, cache: &mut SearchCache) -> TraceResult {
        let mut best = TraceResult::miss();
        for (i, mesh) in self.meshes.iter().enumerate() {
            if let Some((element, distance)) = mesh.trace(ray, cache) {
                if distance < best.distance {
                    best = TraceResult::new(distance, GeoId::new(i + 1, element));
                }
            }
        }

        if let Some(distance) = self.environment.ray_intersection(ray) {
            if distance < best.distance {
                best = TraceResult::new(distance, GeoId::new(self.environment_object_index(), 0));
            }
        }
        best
    }
}

impl ShadingProvider for SimpleScene {
    fn surface_frame(&self, geo_id: &GeoId) -> SurfaceFrame {
        match self.mesh_for(geo_id).and_then(|mesh| mesh.frames.get(geo_id.element_index)) {
            Some(frame) => *frame,
            None => SurfaceFrame::from_normal(&Vector3f::new(0.0, 1.0, 0.0)),
        }
    }

    fn surface_shader(&self, geo_id: &GeoId) -> &dyn Shader {
        match self.mesh_for(geo_id) {
            Some(mesh) => self.shaders.get(mesh.shader),
            None => self.shaders.get(self.environment_shader),
        }
    }
}
