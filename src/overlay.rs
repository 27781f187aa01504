//! Composition of layers and their geometry annotations into a single image
use crate::{
    ColorU8, EllipArc, ImageOwned, Layer, LayerStack, ParsedPath, Point, RasterError, Rasterizer,
    Scalar, Segment, Size,
    raster::{image_from_pixmap, new_pixmap, pixmap_from_image},
};
use resvg::tiny_skia;

/// Scale of a freshly created view, screen pixels per document unit
pub const DEFAULT_SCALE: Scalar = 10.0;

/// Scale multiplier of a single zoom step
pub const ZOOM_FACTOR: Scalar = 1.1;

/// Number of line segments used to draw an arc outline
const ARC_STEPS: usize = 32;

/// Zoom and pan state shared by all layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    scale: Scalar,
    pan: Point,
}

impl Default for View {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            pan: Point::new(0.0, 0.0),
        }
    }
}

impl View {
    pub fn new(scale: Scalar, pan: Point) -> Self {
        Self { scale, pan }
    }

    /// Screen pixels per document unit
    pub fn scale(&self) -> Scalar {
        self.scale
    }

    /// Screen position of the document origin
    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom_in(&mut self) {
        self.scale *= ZOOM_FACTOR;
    }

    pub fn zoom_out(&mut self) {
        self.scale /= ZOOM_FACTOR;
    }

    /// Zoom in for positive `delta` (wheel up) and out for negative
    pub fn zoom(&mut self, delta: Scalar) {
        if delta > 0.0 {
            self.zoom_in()
        } else if delta < 0.0 {
            self.zoom_out()
        }
    }

    /// Multiply scale by `factor` keeping the screen point `anchor` in place
    pub fn zoom_at(&mut self, anchor: Point, factor: Scalar) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        self.pan = anchor.add(self.pan.sub(anchor).scale(factor));
        self.scale *= factor;
    }

    /// Move view by `delta` screen pixels
    pub fn pan_by(&mut self, delta: Point) {
        self.pan = self.pan.add(delta);
    }

    /// Return pan to the origin, scale is kept
    pub fn reset(&mut self) {
        self.pan = Point::new(0.0, 0.0);
    }

    /// Convert document units into screen pixels
    pub fn to_screen(&self, point: Point) -> Point {
        point.scale(self.scale).add(self.pan)
    }

    /// Convert screen pixels into document units
    pub fn to_document(&self, point: Point) -> Point {
        point.sub(self.pan).scale(self.scale.recip())
    }
}

/// Colors and sizes of annotations
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Style {
    pub background: ColorU8,
    /// Rectangle around the view box of each layer
    pub frame: ColorU8,
    /// Edges between control points and their endpoints
    pub connector: ColorU8,
    pub end_point: ColorU8,
    pub control_point: ColorU8,
    /// Outline of line segments
    pub outline_line: ColorU8,
    /// Outline of cubic Bézier segments
    pub outline_cubic: ColorU8,
    /// Outline of quadratic Bézier segments
    pub outline_quadratic: ColorU8,
    /// Outline of arc segments
    pub outline_arc: ColorU8,
    /// Color of the background grid, no grid is drawn if absent
    pub grid: Option<ColorU8>,
    /// Distance between grid lines in document units
    pub grid_step: Scalar,
    /// Radius of point markers in pixels
    pub marker_radius: Scalar,
    /// Width of frame, outline and connector lines in pixels
    pub line_width: Scalar,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            background: ColorU8::new(255, 255, 255, 255),
            frame: ColorU8::new(173, 216, 230, 255),
            connector: ColorU8::new(238, 130, 238, 255),
            end_point: ColorU8::new(255, 0, 0, 255),
            control_point: ColorU8::new(255, 165, 0, 255),
            outline_line: ColorU8::new(0, 0, 0, 255),
            outline_cubic: ColorU8::new(0, 0, 255, 255),
            outline_quadratic: ColorU8::new(0, 255, 0, 255),
            outline_arc: ColorU8::new(255, 0, 255, 255),
            grid: Some(ColorU8::new(242, 242, 242, 255)),
            grid_step: 10.0,
            marker_radius: 3.0,
            line_width: 1.0,
        }
    }
}

impl Style {
    /// Load style from JSON, missing fields take default values
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Renders visible layers with annotations of their geometry
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    style: Style,
}

impl Overlay {
    pub fn new(style: Style) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Compose all visible layers, bottom to top, into an image of `size`
    ///
    /// The grid goes under all layers. Each layer contributes its recolored raster
    /// followed by the frame of its view box, segment outlines, connectors,
    /// endpoint markers and control point markers.
    pub fn render(
        &self,
        layers: &mut LayerStack,
        view: &View,
        rasterizer: &dyn Rasterizer,
        size: Size,
    ) -> Result<ImageOwned<ColorU8>, RasterError> {
        let _guard = tracing::debug_span!("[overlay]", %size, layers = layers.len()).entered();
        let mut canvas = new_pixmap(size)?;
        canvas.fill(color(self.style.background));
        self.grid(&mut canvas, view);

        for layer in layers.iter_mut().filter(|layer| layer.visible()) {
            let raster = pixmap_from_image(layer.raster(rasterizer, view.scale())?)?;
            let origin = view.to_screen(layer.offset());
            canvas.draw_pixmap(
                origin.x().round() as i32,
                origin.y().round() as i32,
                raster.as_ref(),
                &tiny_skia::PixmapPaint::default(),
                tiny_skia::Transform::identity(),
                None,
            );
            self.annotate(&mut canvas, view, layer);
        }

        Ok(image_from_pixmap(&canvas))
    }

    // Lines at multiples of the grid step, aligned to pixel centers
    fn grid(&self, canvas: &mut tiny_skia::Pixmap, view: &View) {
        let Some(grid) = self.style.grid else {
            return;
        };
        let step = self.style.grid_step * view.scale();
        if !step.is_finite() || step < 2.0 {
            return;
        }
        let (width, height) = (canvas.width() as Scalar, canvas.height() as Scalar);
        let mut builder = tiny_skia::PathBuilder::new();
        let mut x = view.pan().x().rem_euclid(step).floor() + 0.5;
        while x < width {
            builder.move_to(x as f32, 0.0);
            builder.line_to(x as f32, height as f32);
            x += step;
        }
        let mut y = view.pan().y().rem_euclid(step).floor() + 0.5;
        while y < height {
            builder.move_to(0.0, y as f32);
            builder.line_to(width as f32, y as f32);
            y += step;
        }
        if let Some(path) = builder.finish() {
            let stroke = tiny_skia::Stroke {
                width: 1.0,
                ..Default::default()
            };
            canvas.stroke_path(
                &path,
                &paint(grid),
                &stroke,
                tiny_skia::Transform::identity(),
                None,
            );
        }
    }

    fn annotate(&self, canvas: &mut tiny_skia::Pixmap, view: &View, layer: &Layer) {
        let (offset, geometry) = (layer.offset(), layer.geometry());
        let origin = geometry.view_box().min();
        let screen = |point: Point| view.to_screen(offset.add(point.sub(origin)));
        let stroke = tiny_skia::Stroke {
            width: self.style.line_width as f32,
            ..Default::default()
        };

        let corner = view.to_screen(offset);
        let frame = tiny_skia::Rect::from_xywh(
            corner.x() as f32,
            corner.y() as f32,
            (geometry.width() * view.scale()) as f32,
            (geometry.height() * view.scale()) as f32,
        );
        if let Some(frame) = frame {
            let path = tiny_skia::PathBuilder::from_rect(frame);
            canvas.stroke_path(
                &path,
                &paint(self.style.frame),
                &stroke,
                tiny_skia::Transform::identity(),
                None,
            );
        }

        self.outlines(canvas, layer.paths(), &screen, &stroke);

        let mut builder = tiny_skia::PathBuilder::new();
        for (control, end_point) in geometry.connectors() {
            let (from, to) = (screen(control), screen(end_point));
            builder.move_to(from.x() as f32, from.y() as f32);
            builder.line_to(to.x() as f32, to.y() as f32);
        }
        if let Some(path) = builder.finish() {
            canvas.stroke_path(
                &path,
                &paint(self.style.connector),
                &stroke,
                tiny_skia::Transform::identity(),
                None,
            );
        }

        self.markers(canvas, geometry.end_points().iter().copied().map(screen), self.style.end_point);
        self.markers(
            canvas,
            geometry.control_points().iter().copied().map(screen),
            self.style.control_point,
        );
    }

    // One stroked path per segment kind so each kind gets its own color
    fn outlines(
        &self,
        canvas: &mut tiny_skia::Pixmap,
        paths: &[ParsedPath],
        screen: &dyn Fn(Point) -> Point,
        stroke: &tiny_skia::Stroke,
    ) {
        let mut lines = tiny_skia::PathBuilder::new();
        let mut cubics = tiny_skia::PathBuilder::new();
        let mut quadratics = tiny_skia::PathBuilder::new();
        let mut arcs = tiny_skia::PathBuilder::new();
        let move_to = |builder: &mut tiny_skia::PathBuilder, point: Point| {
            let point = screen(point);
            builder.move_to(point.x() as f32, point.y() as f32);
        };
        let line_to = |builder: &mut tiny_skia::PathBuilder, point: Point| {
            let point = screen(point);
            builder.line_to(point.x() as f32, point.y() as f32);
        };

        for segment in paths.iter().flat_map(|path| path.segments.iter()) {
            match *segment {
                Segment::Line { start, end } => {
                    move_to(&mut lines, start);
                    line_to(&mut lines, end);
                }
                Segment::CubicBezier {
                    start,
                    control1,
                    control2,
                    end,
                } => {
                    let [c1, c2, p] = [control1, control2, end].map(screen);
                    move_to(&mut cubics, start);
                    cubics.cubic_to(
                        c1.x() as f32,
                        c1.y() as f32,
                        c2.x() as f32,
                        c2.y() as f32,
                        p.x() as f32,
                        p.y() as f32,
                    );
                }
                Segment::QuadraticBezier {
                    start,
                    control,
                    end,
                } => {
                    let [c, p] = [control, end].map(screen);
                    move_to(&mut quadratics, start);
                    quadratics.quad_to(c.x() as f32, c.y() as f32, p.x() as f32, p.y() as f32);
                }
                Segment::Arc { start, end, .. } => {
                    move_to(&mut arcs, start);
                    match EllipArc::from_segment(segment) {
                        Some(arc) => arc
                            .flatten(ARC_STEPS)
                            .skip(1)
                            .for_each(|point| line_to(&mut arcs, point)),
                        None => line_to(&mut arcs, end),
                    }
                }
                Segment::Move { .. } | Segment::Unrecognized { .. } => {}
            }
        }

        let outlines = [
            (lines, self.style.outline_line),
            (cubics, self.style.outline_cubic),
            (quadratics, self.style.outline_quadratic),
            (arcs, self.style.outline_arc),
        ];
        for (builder, outline) in outlines {
            if let Some(path) = builder.finish() {
                canvas.stroke_path(
                    &path,
                    &paint(outline),
                    stroke,
                    tiny_skia::Transform::identity(),
                    None,
                );
            }
        }
    }

    fn markers(
        &self,
        canvas: &mut tiny_skia::Pixmap,
        points: impl Iterator<Item = Point>,
        fill: ColorU8,
    ) {
        let radius = self.style.marker_radius as f32;
        let mut builder = tiny_skia::PathBuilder::new();
        for point in points {
            builder.push_circle(point.x() as f32, point.y() as f32, radius);
        }
        if let Some(path) = builder.finish() {
            canvas.fill_path(
                &path,
                &paint(fill),
                tiny_skia::FillRule::Winding,
                tiny_skia::Transform::identity(),
                None,
            );
        }
    }
}

fn color(color: ColorU8) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_rgba();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn paint(fill: ColorU8) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(color(fill));
    paint.anti_alias = true;
    paint
}
