//! Headless rendering backend
//!
//! Keeps every renderable in a generational slot map and resolves hit tests
//! against each renderable's planar radius. Used by the test suites and the
//! demo app; it also supports fault injection so disposal failures can be
//! exercised without a GPU.

use std::collections::HashSet;

use slotmap::SlotMap;

use crate::core::config::{StackingConfig, ViewportConfig};
use crate::foundation::math::Vec2;
use crate::render::{BackendResult, Depth, RenderBackend, RenderError, RenderHandle, RenderSpec};

/// One renderable held by the headless backend
#[derive(Debug, Clone)]
pub struct HeadlessObject {
    /// Creation spec
    pub spec: RenderSpec,
    /// Position on the scene plane
    pub position: Vec2,
    /// Stacking key
    pub depth: Depth,
    /// Engine z derived from `depth`
    pub z: f32,
    /// Whether the renderable is in the scene graph
    pub attached: bool,
}

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Renderables created
    pub created: usize,
    /// Renderables disposed
    pub disposed: usize,
    /// Attach calls that succeeded
    pub attached: usize,
}

/// In-memory [`RenderBackend`]
#[derive(Debug)]
pub struct HeadlessBackend {
    objects: SlotMap<RenderHandle, HeadlessObject>,
    viewport: ViewportConfig,
    stacking: StackingConfig,
    camera_center: Vec2,
    refuse_disposal: HashSet<String>,
    creation_budget: Option<usize>,
    stats: BackendStats,
}

impl HeadlessBackend {
    /// Create a backend with the given viewport and z spacing
    pub fn new(viewport: ViewportConfig, stacking: StackingConfig) -> Self {
        Self {
            objects: SlotMap::with_key(),
            viewport,
            stacking,
            camera_center: Vec2::zeros(),
            refuse_disposal: HashSet::new(),
            creation_budget: None,
            stats: BackendStats::default(),
        }
    }

    /// Center the camera on a planar point
    pub fn set_camera_center(&mut self, center: Vec2) {
        self.camera_center = center;
    }

    /// Refuse to dispose renderables whose label equals `label`
    pub fn refuse_disposal_of(&mut self, label: impl Into<String>) {
        self.refuse_disposal.insert(label.into());
    }

    /// Fail every creation after `count` more successful ones
    pub fn fail_creation_after(&mut self, count: usize) {
        self.creation_budget = Some(count);
    }

    /// Map a planar point to screen pixels (inverse of [`RenderBackend::unproject`])
    #[allow(clippy::cast_precision_loss)]
    pub fn project(&self, planar: Vec2) -> Vec2 {
        let half = Vec2::new(self.viewport.width as f32, self.viewport.height as f32) * 0.5;
        (planar - self.camera_center) / self.viewport.zoom + half
    }

    /// Look up a renderable
    pub fn object(&self, handle: RenderHandle) -> Option<&HeadlessObject> {
        self.objects.get(handle)
    }

    /// Number of renderables still held (attached or not)
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of renderables in the scene graph
    pub fn attached_count(&self) -> usize {
        self.objects.values().filter(|object| object.attached).count()
    }

    /// Lifetime counters
    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    fn object_mut(&mut self, handle: RenderHandle) -> BackendResult<&mut HeadlessObject> {
        self.objects.get_mut(handle).ok_or(RenderError::InvalidHandle(handle))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(ViewportConfig::default(), StackingConfig::default())
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_renderable(&mut self, spec: &RenderSpec) -> BackendResult<RenderHandle> {
        if let Some(budget) = self.creation_budget.as_mut() {
            if *budget == 0 {
                return Err(RenderError::CreationFailed {
                    label: spec.label.clone(),
                    reason: "creation budget exhausted".to_string(),
                });
            }
            *budget -= 1;
        }

        let handle = self.objects.insert(HeadlessObject {
            spec: spec.clone(),
            position: Vec2::zeros(),
            depth: Depth::default(),
            z: 0.0,
            attached: false,
        });
        self.stats.created += 1;
        log::trace!("created {:?} '{}'", handle, spec.label);
        Ok(handle)
    }

    fn set_position(&mut self, handle: RenderHandle, position: Vec2) -> BackendResult<()> {
        self.object_mut(handle)?.position = position;
        Ok(())
    }

    fn set_depth(&mut self, handle: RenderHandle, depth: Depth) -> BackendResult<()> {
        let z = depth.to_z(&self.stacking);
        let object = self.object_mut(handle)?;
        object.depth = depth;
        object.z = z;
        Ok(())
    }

    fn attach(&mut self, handle: RenderHandle) -> BackendResult<()> {
        self.object_mut(handle)?.attached = true;
        self.stats.attached += 1;
        Ok(())
    }

    fn dispose(&mut self, handle: RenderHandle) -> BackendResult<()> {
        let object = self.objects.get(handle).ok_or(RenderError::InvalidHandle(handle))?;
        if self.refuse_disposal.contains(&object.spec.label) {
            return Err(RenderError::DisposalRefused(handle));
        }
        self.objects.remove(handle);
        self.stats.disposed += 1;
        log::trace!("disposed {:?}", handle);
        Ok(())
    }

    fn hit_test(&self, screen: Vec2, predicate: &dyn Fn(RenderHandle) -> bool) -> Option<RenderHandle> {
        let planar = self.unproject(screen);
        self.objects
            .iter()
            .filter(|(_, object)| object.attached)
            .filter(|(_, object)| (object.position - planar).norm() <= object.spec.radius)
            .filter(|(handle, _)| predicate(*handle))
            .max_by_key(|(_, object)| object.depth)
            .map(|(handle, _)| handle)
    }

    #[allow(clippy::cast_precision_loss)]
    fn unproject(&self, screen: Vec2) -> Vec2 {
        let half = Vec2::new(self.viewport.width as f32, self.viewport.height as f32) * 0.5;
        (screen - half) * self.viewport.zoom + self.camera_center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Shape;
    use approx::assert_relative_eq;

    fn disc(label: &str, radius: f32) -> RenderSpec {
        RenderSpec::new(label, Shape::Disc, radius)
    }

    #[test]
    fn test_project_unproject_round_trip() {
        let mut backend = HeadlessBackend::new(
            ViewportConfig {
                width: 800,
                height: 600,
                zoom: 2.0,
            },
            StackingConfig::default(),
        );
        backend.set_camera_center(Vec2::new(10.0, -5.0));

        let planar = Vec2::new(37.0, 12.5);
        let back = backend.unproject(backend.project(planar));
        assert_relative_eq!(back.x, planar.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, planar.y, epsilon = 1e-4);
    }

    #[test]
    fn test_hit_test_ignores_detached_and_picks_topmost() {
        let mut backend = HeadlessBackend::default();
        let low = backend.create_renderable(&disc("low", 10.0)).unwrap();
        let high = backend.create_renderable(&disc("high", 10.0)).unwrap();
        let detached = backend.create_renderable(&disc("detached", 10.0)).unwrap();
        backend.attach(low).unwrap();
        backend.attach(high).unwrap();
        backend.set_depth(low, Depth::new(0, 1)).unwrap();
        backend.set_depth(high, Depth::new(0, 2)).unwrap();
        backend.set_depth(detached, Depth::new(9, 9)).unwrap();

        let screen = backend.project(Vec2::zeros());
        assert_eq!(backend.hit_test(screen, &|_| true), Some(high));
        assert_eq!(backend.hit_test(screen, &|h| h != high), Some(low));

        let far = backend.project(Vec2::new(50.0, 0.0));
        assert_eq!(backend.hit_test(far, &|_| true), None);
    }

    #[test]
    fn test_set_depth_stores_engine_z() {
        let mut backend = HeadlessBackend::new(
            ViewportConfig::default(),
            StackingConfig {
                layer_spacing: 10.0,
                ordinal_step: 0.5,
            },
        );
        let handle = backend.create_renderable(&disc("a", 1.0)).unwrap();
        backend.set_depth(handle, Depth::new(2, 3)).unwrap();

        let object = backend.object(handle).unwrap();
        assert_eq!(object.depth, Depth::new(2, 3));
        assert_relative_eq!(object.z, 21.5);
    }

    #[test]
    fn test_dispose_twice_is_invalid_handle() {
        let mut backend = HeadlessBackend::default();
        let handle = backend.create_renderable(&disc("a", 1.0)).unwrap();
        backend.dispose(handle).unwrap();
        assert_eq!(backend.dispose(handle), Err(RenderError::InvalidHandle(handle)));
        assert_eq!(backend.stats().disposed, 1);
    }

    #[test]
    fn test_refused_disposal_keeps_object() {
        let mut backend = HeadlessBackend::default();
        backend.refuse_disposal_of("stuck");
        let handle = backend.create_renderable(&disc("stuck", 1.0)).unwrap();

        assert_eq!(backend.dispose(handle), Err(RenderError::DisposalRefused(handle)));
        assert_eq!(backend.object_count(), 1);
    }

    #[test]
    fn test_creation_budget() {
        let mut backend = HeadlessBackend::default();
        backend.fail_creation_after(1);
        assert!(backend.create_renderable(&disc("a", 1.0)).is_ok());
        assert!(matches!(
            backend.create_renderable(&disc("b", 1.0)),
            Err(RenderError::CreationFailed { .. })
        ));
    }
}
