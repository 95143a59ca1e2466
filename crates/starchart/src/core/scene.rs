use glam::DVec2;
use serde::Serialize;

use crate::components::layer::MapLayer;
use crate::components::shape::Shape;

/// Model → screen mapping applied by the drawing layer.
///
/// `screen = (model + translate) * scale`, where `translate` already folds
/// in the renderer origin (`offset - origin`). Screen (0, 0) is the center
/// of the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate: DVec2,
}

impl ViewTransform {
    pub fn new(scale: f64, translate: DVec2) -> Self {
        Self { scale, translate }
    }

    pub fn to_screen(&self, model: DVec2) -> DVec2 {
        (model + self.translate) * self.scale
    }

    pub fn to_model(&self, screen: DVec2) -> DVec2 {
        screen / self.scale - self.translate
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: DVec2::ZERO,
        }
    }
}

/// Shapes of one layer plus its visibility.
#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    pub layer: MapLayer,
    pub visible: bool,
    /// Bumped on every rebuild; lets the host skip unchanged uploads.
    pub generation: u32,
    pub shapes: Vec<Shape>,
}

/// Snapshot of the layer mask consumed by the host since the last bake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BakeState {
    /// Bitmask of layers changed since the previous bake.
    pub mask: u16,
    /// Incremented once per bake.
    pub generation: u32,
}

/// Layered scene graph produced by a map renderer.
/// Small and flat: one Vec of shapes per layer, drawn back-to-front.
#[derive(Debug, Clone, Serialize)]
pub struct MapScene {
    pub transform: ViewTransform,
    layers: Vec<Layer>,
    #[serde(skip)]
    dirty: u16,
    #[serde(skip)]
    bakes: u32,
}

impl MapScene {
    pub fn new() -> Self {
        Self {
            transform: ViewTransform::default(),
            layers: MapLayer::ALL
                .iter()
                .map(|&layer| Layer {
                    layer,
                    visible: true,
                    generation: 0,
                    shapes: Vec::new(),
                })
                .collect(),
            dirty: 0,
            bakes: 0,
        }
    }

    /// Replace the shapes of `layer`.
    pub fn rebuild(&mut self, layer: MapLayer, shapes: Vec<Shape>) {
        let entry = &mut self.layers[layer.as_u8() as usize];
        entry.shapes = shapes;
        entry.generation = entry.generation.wrapping_add(1);
        self.dirty |= layer.bit();
    }

    /// Show or hide `layer`. Marks the layer dirty only when visibility changes.
    pub fn set_visible(&mut self, layer: MapLayer, visible: bool) {
        let entry = &mut self.layers[layer.as_u8() as usize];
        if entry.visible != visible {
            entry.visible = visible;
            self.dirty |= layer.bit();
        }
    }

    pub fn layer(&self, layer: MapLayer) -> &Layer {
        &self.layers[layer.as_u8() as usize]
    }

    pub fn shapes(&self, layer: MapLayer) -> &[Shape] {
        &self.layer(layer).shapes
    }

    pub fn is_visible(&self, layer: MapLayer) -> bool {
        self.layer(layer).visible
    }

    /// Iterate over visible layers in draw order.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.visible)
    }

    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = transform;
    }

    /// Layers changed since the last `bake`.
    pub fn dirty_mask(&self) -> u16 {
        self.dirty
    }

    pub fn is_dirty(&self, layer: MapLayer) -> bool {
        self.dirty & layer.bit() != 0
    }

    /// Consume the dirty mask.
    pub fn bake(&mut self) -> BakeState {
        self.bakes = self.bakes.wrapping_add(1);
        BakeState {
            mask: std::mem::take(&mut self.dirty),
            generation: self.bakes,
        }
    }

    /// Empty every layer.
    pub fn clear(&mut self) {
        for layer in MapLayer::ALL {
            self.rebuild(layer, Vec::new());
        }
    }

    /// Total shape count across all layers.
    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.shapes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MapScene {
    fn default() -> Self {
        Self::new()
    }
}
