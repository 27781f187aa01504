//! Layers hold loaded documents together with their presentation state
use crate::{
    ColorU8, DocumentError, DocumentGeometry, ImageOwned, ParsedPath, Point, RasterError,
    Rasterizer, Scalar, SvgDocument, raster_size, recolor,
};
use std::{fmt, path::Path};

/// Opacity of a newly added layer
pub const DEFAULT_OPACITY: Scalar = 0.5;

/// Tints assigned to layers in the order they are added
pub const TINT_PALETTE: [ColorU8; 5] = [
    ColorU8::new(0, 0, 255, 255),
    ColorU8::new(0, 255, 0, 255),
    ColorU8::new(255, 0, 255, 255),
    ColorU8::new(255, 165, 0, 255),
    ColorU8::new(238, 130, 238, 255),
];

/// Identifier of a layer, unique within its stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RasterKey {
    scale: Scalar,
    opacity: Scalar,
    tint: ColorU8,
}

#[derive(Debug, Default)]
struct RasterCache {
    /// Rasterizer output keyed by scale
    plain: Option<(Scalar, ImageOwned<ColorU8>)>,
    /// Recolored raster
    tinted: Option<(RasterKey, ImageOwned<ColorU8>)>,
}

/// Loaded document with its geometry and presentation state
#[derive(Debug)]
pub struct Layer {
    id: LayerId,
    name: String,
    source: String,
    paths: Vec<ParsedPath>,
    geometry: DocumentGeometry,
    offset: Point,
    visible: bool,
    opacity: Scalar,
    tint: ColorU8,
    cache: RasterCache,
}

impl Layer {
    fn new(id: LayerId, name: String, document: SvgDocument, tint: ColorU8) -> Result<Self, DocumentError> {
        let geometry = DocumentGeometry::from_document(&document)?;
        Ok(Self {
            id,
            name,
            source: document.source().to_owned(),
            paths: document.paths().to_vec(),
            geometry,
            offset: Point::default(),
            visible: true,
            opacity: DEFAULT_OPACITY,
            tint,
            cache: RasterCache::default(),
        })
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text of the document
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed paths of the document, used to draw outlines
    pub fn paths(&self) -> &[ParsedPath] {
        &self.paths
    }

    pub fn geometry(&self) -> &DocumentGeometry {
        &self.geometry
    }

    /// Position of the document origin in document units
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    /// Move layer by `delta`
    pub fn translate(&mut self, delta: Point) {
        self.offset = self.offset.add(delta);
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn opacity(&self) -> Scalar {
        self.opacity
    }

    /// Set opacity, clamped to `[0, 1]`
    pub fn set_opacity(&mut self, opacity: Scalar) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity != self.opacity {
            self.opacity = opacity;
            self.cache.tinted = None;
        }
    }

    pub fn tint(&self) -> ColorU8 {
        self.tint
    }

    pub fn set_tint(&mut self, tint: ColorU8) {
        if tint != self.tint {
            self.tint = tint;
            self.cache.tinted = None;
        }
    }

    /// Recolored raster of the document at `scale`
    ///
    /// Rasterizer is only invoked when scale changes, opacity and tint changes
    /// only recolor the cached output.
    pub fn raster(
        &mut self,
        rasterizer: &dyn Rasterizer,
        scale: Scalar,
    ) -> Result<&ImageOwned<ColorU8>, RasterError> {
        let key = RasterKey {
            scale,
            opacity: self.opacity,
            tint: self.tint,
        };
        let tinted = match self.cache.tinted.take() {
            Some((cached, image)) if cached == key => image,
            _ => {
                let plain = match self.cache.plain.take() {
                    Some((cached, image)) if cached == scale => image,
                    _ => {
                        let size = raster_size(&self.geometry, scale);
                        let _guard = tracing::debug_span!(
                            "[raster]",
                            layer = %self.id,
                            rasterizer = rasterizer.name(),
                            %size,
                        )
                        .entered();
                        rasterizer.rasterize(self.source.as_bytes(), size)?
                    }
                };
                let tinted = recolor(&plain, self.tint, self.opacity);
                self.cache.plain = Some((scale, plain));
                tinted
            }
        };
        Ok(&self.cache.tinted.insert((key, tinted)).1)
    }
}

/// Ordered collection of layers, from bottom to top
#[derive(Debug, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load document from the file and put it on top of the stack
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<LayerId, DocumentError> {
        let path = path.as_ref();
        let document = SvgDocument::open(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        self.push(name, document)
    }

    /// Put loaded document on top of the stack
    pub fn push(
        &mut self,
        name: impl Into<String>,
        document: SvgDocument,
    ) -> Result<LayerId, DocumentError> {
        let id = LayerId(self.next_id);
        let tint = TINT_PALETTE[self.next_id as usize % TINT_PALETTE.len()];
        let layer = Layer::new(id, name.into(), document, tint)?;
        self.next_id += 1;
        tracing::debug!(layer = %id, name = layer.name(), "[layers:push]");
        self.layers.push(layer);
        Ok(id)
    }

    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.position(id)?;
        Some(self.layers.remove(index))
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    /// Index of the layer counting from the bottom
    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    /// Swap layer with the one above it, returns `false` if nothing moved
    pub fn raise(&mut self, id: LayerId) -> bool {
        match self.position(id) {
            Some(index) if index + 1 < self.layers.len() => {
                self.layers.swap(index, index + 1);
                true
            }
            _ => false,
        }
    }

    /// Swap layer with the one below it, returns `false` if nothing moved
    pub fn lower(&mut self, id: LayerId) -> bool {
        match self.position(id) {
            Some(index) if index > 0 => {
                self.layers.swap(index, index - 1);
                true
            }
            _ => false,
        }
    }

    /// Move layer to the position `index`, clamped to the top of the stack
    pub fn move_to(&mut self, id: LayerId, index: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let layer = self.layers.remove(from);
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        true
    }

    /// Layers from bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentErrorKind, Image, Size, raster::SolidRasterizer};

    const DOC: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 5">
        <path d="M1,1 C2,2 3,3 4,4"/>
    </svg>"#;

    fn stack(count: usize) -> (LayerStack, Vec<LayerId>) {
        let mut stack = LayerStack::new();
        let ids = (0..count)
            .map(|index| {
                let document = SvgDocument::parse(DOC).expect("valid document");
                stack.push(format!("doc{}", index), document).expect("valid geometry")
            })
            .collect();
        (stack, ids)
    }

    fn names(stack: &LayerStack) -> Vec<&str> {
        stack.iter().map(|layer| layer.name()).collect()
    }

    #[test]
    fn test_push_assigns_ids_and_tints() {
        let (stack, ids) = stack(6);
        assert_eq!(stack.len(), 6);
        for (index, id) in ids.iter().enumerate() {
            assert_eq!(stack.position(*id), Some(index));
        }
        let tints: Vec<_> = stack.iter().map(|layer| layer.tint()).collect();
        assert_eq!(tints[0], TINT_PALETTE[0]);
        assert_eq!(tints[5], TINT_PALETTE[0]);
        assert_eq!(tints[1], TINT_PALETTE[1]);

        let layer = stack.get(ids[0]).expect("layer exists");
        assert!(layer.visible());
        assert_eq!(layer.opacity(), DEFAULT_OPACITY);
        assert_eq!(layer.offset(), Point::new(0.0, 0.0));
        assert_eq!(layer.geometry().end_points().len(), 2);
        assert_eq!(layer.paths().len(), 1);
        assert_eq!(layer.paths()[0].segments.len(), 1);
    }

    #[test]
    fn test_push_rejects_missing_view_box() {
        let mut stack = LayerStack::new();
        let document = SvgDocument::parse(r#"<svg><path d="M0 0 L1 1"/></svg>"#)
            .expect("valid document");
        let error = stack.push("bad", document).unwrap_err();
        assert_eq!(error.kind(), DocumentErrorKind::Malformed);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_ordering() {
        let (mut stack, ids) = stack(3);
        assert_eq!(names(&stack), ["doc0", "doc1", "doc2"]);

        assert!(stack.raise(ids[0]));
        assert_eq!(names(&stack), ["doc1", "doc0", "doc2"]);
        assert!(stack.raise(ids[0]));
        assert!(!stack.raise(ids[0]));
        assert_eq!(names(&stack), ["doc1", "doc2", "doc0"]);

        assert!(stack.lower(ids[2]));
        assert!(!stack.lower(ids[2]));
        assert_eq!(names(&stack), ["doc2", "doc1", "doc0"]);

        assert!(stack.move_to(ids[2], 100));
        assert_eq!(names(&stack), ["doc1", "doc0", "doc2"]);
        assert!(stack.move_to(ids[0], 0));
        assert_eq!(names(&stack), ["doc0", "doc1", "doc2"]);

        let removed = stack.remove(ids[1]).expect("layer exists");
        assert_eq!(removed.name(), "doc1");
        assert_eq!(names(&stack), ["doc0", "doc2"]);
        assert!(stack.remove(ids[1]).is_none());
        assert!(!stack.raise(ids[1]));
        assert!(!stack.move_to(ids[1], 0));
    }

    #[test]
    fn test_presentation_state() {
        let (mut stack, ids) = stack(1);
        let layer = stack.get_mut(ids[0]).expect("layer exists");
        layer.set_offset(Point::new(1.0, 2.0));
        layer.translate(Point::new(3.0, -1.0));
        assert_eq!(layer.offset(), Point::new(4.0, 1.0));

        assert!(!layer.toggle_visible());
        assert!(layer.toggle_visible());
        layer.set_visible(false);
        assert!(!layer.visible());

        layer.set_opacity(1.5);
        assert_eq!(layer.opacity(), 1.0);
        layer.set_opacity(-0.5);
        assert_eq!(layer.opacity(), 0.0);
    }

    #[test]
    fn test_raster_cache() -> Result<(), RasterError> {
        let (mut stack, ids) = stack(1);
        let rasterizer = SolidRasterizer::new(ColorU8::new(0, 0, 0, 255));
        let layer = stack.get_mut(ids[0]).expect("layer exists");

        let image = layer.raster(&rasterizer, 2.0)?;
        assert_eq!(image.size(), Size::new(20, 10));
        assert_eq!(image.get(0, 0), Some(&TINT_PALETTE[0].with_alpha(128)));
        layer.raster(&rasterizer, 2.0)?;
        assert_eq!(rasterizer.calls.get(), 1);

        // recoloring does not invoke rasterizer
        layer.set_opacity(1.0);
        layer.set_tint(ColorU8::new(255, 0, 0, 255));
        let image = layer.raster(&rasterizer, 2.0)?;
        assert_eq!(image.get(3, 3), Some(&ColorU8::new(255, 0, 0, 255)));
        assert_eq!(rasterizer.calls.get(), 1);

        // offset and visibility do not affect raster
        layer.translate(Point::new(1.0, 1.0));
        layer.set_visible(false);
        layer.raster(&rasterizer, 2.0)?;
        assert_eq!(rasterizer.calls.get(), 1);

        let image = layer.raster(&rasterizer, 3.0)?;
        assert_eq!(image.size(), Size::new(30, 15));
        assert_eq!(rasterizer.calls.get(), 2);
        Ok(())
    }

    #[test]
    fn test_open() -> Result<(), DocumentError> {
        let path = std::env::temp_dir().join(format!("layer-open-{}.svg", std::process::id()));
        std::fs::write(&path, DOC)?;
        let mut stack = LayerStack::new();
        let id = stack.open(&path);
        std::fs::remove_file(&path)?;
        let layer = stack.get(id?).expect("layer exists");
        assert!(layer.name().starts_with("layer-open-"));
        assert!(layer.source().contains("viewBox"));

        let missing = stack.open(path).unwrap_err();
        assert_eq!(missing.kind(), DocumentErrorKind::Unreadable);
        Ok(())
    }
}
