//! Scene contents drawn by the scene pass.
//!
//! The scene is plain data: registered meshes, a list of objects that
//! reference them and an optional raymarched SDF sphere. The frame closure
//! mutates objects between frames; the pipeline only reads the scene.

use crate::color::Color;
use crate::mesh::{Mesh, Transform};
use crate::sdf::SdfSphere;

/// Type-safe handle to a mesh registered with a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Type-safe handle to an object in a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) usize);

/// One drawable instance of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshId,
    pub transform: Transform,
    pub color: Color,
    /// Hidden objects keep their slot but are not drawn.
    pub visible: bool,
}

impl SceneObject {
    pub fn new(mesh: MeshId) -> Self {
        Self {
            mesh,
            transform: Transform::default(),
            color: Color::WHITE,
            visible: true,
        }
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the color's alpha. Anything below 1 draws translucent and
    /// double-sided.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.color.a = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn is_translucent(&self) -> bool {
        self.color.a < 1.0
    }
}

/// Registered meshes and the objects placed in the world.
#[derive(Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    objects: Vec<SceneObject>,
    sdf: Option<SdfSphere>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Visible objects whose mesh is registered, in insertion order.
    pub fn drawables(&self) -> impl Iterator<Item = (&Mesh, &SceneObject)> {
        self.objects
            .iter()
            .filter(|o| o.visible)
            .filter_map(|o| self.meshes.get(o.mesh.0).map(|m| (m, o)))
    }

    /// Replaces the raymarched sphere; `None` removes it.
    pub fn set_sdf(&mut self, sdf: Option<SdfSphere>) {
        self.sdf = sdf;
    }

    pub fn sdf(&self) -> Option<&SdfSphere> {
        self.sdf.as_ref()
    }

    pub fn sdf_mut(&mut self) -> Option<&mut SdfSphere> {
        self.sdf.as_mut()
    }

    /// Number of objects [`drawables`](Self::drawables) yields.
    pub fn drawable_count(&self) -> usize {
        self.drawables().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_are_addressable_by_id() {
        let mut scene = Scene::new();
        let a = scene.add_object(SceneObject::new(MeshId(0)).color(Color::BLACK));
        let b = scene.add_object(SceneObject::new(MeshId(0)));
        assert_ne!(a, b);
        assert_eq!(scene.object(a).map(|o| o.color), Some(Color::BLACK));

        if let Some(obj) = scene.object_mut(b) {
            obj.visible = false;
        }
        assert_eq!(scene.object(b).map(|o| o.visible), Some(false));
        assert!(scene.object(ObjectId(7)).is_none());
    }

    #[test]
    fn alpha_below_one_marks_objects_translucent() {
        let opaque = SceneObject::new(MeshId(0));
        assert!(!opaque.is_translucent());
        let glass = SceneObject::new(MeshId(0)).color(Color::rgb(0.2, 0.4, 0.6)).alpha(0.5);
        assert!(glass.is_translucent());
        assert_eq!(glass.color.a, 0.5);
        assert_eq!(SceneObject::new(MeshId(0)).alpha(3.0).color.a, 1.0);
    }

    #[test]
    fn sdf_sphere_is_optional() {
        let mut scene = Scene::new();
        assert!(scene.sdf().is_none());
        scene.set_sdf(Some(SdfSphere::new(glam::Vec3::Y, 0.5)));
        if let Some(sphere) = scene.sdf_mut() {
            sphere.radius = 0.75;
        }
        assert_eq!(scene.sdf().map(|s| s.radius), Some(0.75));
        scene.set_sdf(None);
        assert!(scene.sdf().is_none());
    }

    #[test]
    fn objects_without_registered_meshes_are_not_drawn() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(MeshId(3)));
        assert_eq!(scene.objects().len(), 1);
        assert_eq!(scene.drawable_count(), 0);
    }
}
