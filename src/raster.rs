//! Conversion of SVG documents into pixels and recoloring of the result
use crate::{ColorU8, DocumentGeometry, Image, ImageOwned, Scalar, Size};
use resvg::{tiny_skia, usvg};
use std::fmt;

/// Common interface to SVG rasterizers
pub trait Rasterizer {
    /// Name of the rasterizer
    fn name(&self) -> &str;

    /// Render SVG source so it exactly fills an image of the requested size
    ///
    /// Returned pixels use straight alpha.
    fn rasterize(&self, source: &[u8], size: Size) -> Result<ImageOwned<ColorU8>, RasterError>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn rasterize(&self, source: &[u8], size: Size) -> Result<ImageOwned<ColorU8>, RasterError> {
        (**self).rasterize(source, size)
    }
}

/// Rasterizer backed by `resvg`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgRasterizer;

impl ResvgRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for ResvgRasterizer {
    fn name(&self) -> &str {
        "resvg"
    }

    fn rasterize(&self, source: &[u8], size: Size) -> Result<ImageOwned<ColorU8>, RasterError> {
        let tree = usvg::Tree::from_data(source, &usvg::Options::default())?;
        let mut pixmap = new_pixmap(size)?;
        let tree_size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            size.width as f32 / tree_size.width(),
            size.height as f32 / tree_size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Ok(image_from_pixmap(&pixmap))
    }
}

/// Size of the raster of the document drawn at `scale`
pub fn raster_size(geometry: &DocumentGeometry, scale: Scalar) -> Size {
    Size::scaled(geometry.width(), geometry.height(), scale)
}

/// Paint every visible pixel with `tint` and scale its alpha by `opacity`
///
/// Fully transparent pixels are left untouched, opacity is clamped to `[0, 1]`.
pub fn recolor(
    image: impl Image<Pixel = ColorU8>,
    tint: ColorU8,
    opacity: Scalar,
) -> ImageOwned<ColorU8> {
    let opacity = opacity.clamp(0.0, 1.0);
    let size = image.size();
    let mut rows = image.rows().flat_map(|row| row.iter().copied());
    ImageOwned::new_with(size, |_, _| {
        let pixel = rows.next().unwrap_or_default();
        if pixel.alpha() == 0 {
            pixel
        } else {
            let alpha = (pixel.alpha() as Scalar * opacity).round() as u8;
            tint.with_alpha(alpha)
        }
    })
}

pub(crate) fn new_pixmap(size: Size) -> Result<tiny_skia::Pixmap, RasterError> {
    if size.is_empty() {
        return Err(RasterError::EmptySize(size));
    }
    let (Ok(width), Ok(height)) = (u32::try_from(size.width), u32::try_from(size.height)) else {
        return Err(RasterError::TooLarge(size));
    };
    tiny_skia::Pixmap::new(width, height).ok_or(RasterError::TooLarge(size))
}

/// Convert premultiplied pixmap into straight alpha image
pub(crate) fn image_from_pixmap(pixmap: &tiny_skia::Pixmap) -> ImageOwned<ColorU8> {
    let size = Size::new(pixmap.width() as usize, pixmap.height() as usize);
    let mut pixels = pixmap.pixels().iter();
    ImageOwned::new_with(size, |_, _| {
        pixels.next().map_or(ColorU8::TRANSPARENT, |pixel| {
            let color = pixel.demultiply();
            ColorU8::new(color.red(), color.green(), color.blue(), color.alpha())
        })
    })
}

/// Convert straight alpha image into premultiplied pixmap
pub(crate) fn pixmap_from_image(
    image: impl Image<Pixel = ColorU8>,
) -> Result<tiny_skia::Pixmap, RasterError> {
    let mut pixmap = new_pixmap(image.size())?;
    let colors = image.rows().flat_map(|row| row.iter());
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(colors) {
        let [r, g, b, a] = src.to_rgba();
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Error while producing raster of a document
#[derive(Debug)]
pub enum RasterError {
    /// SVG source rejected by the renderer
    Svg(usvg::Error),
    /// Requested image has no pixels
    EmptySize(Size),
    /// Requested image does not fit into addressable pixel memory
    TooLarge(Size),
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::Svg(error) => write!(f, "failed to render document: {}", error),
            RasterError::EmptySize(size) => write!(f, "cannot render image of size {}", size),
            RasterError::TooLarge(size) => write!(f, "image of size {} is too large", size),
        }
    }
}

impl std::error::Error for RasterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RasterError::Svg(error) => Some(error),
            RasterError::EmptySize(_) | RasterError::TooLarge(_) => None,
        }
    }
}

impl From<usvg::Error> for RasterError {
    fn from(error: usvg::Error) -> Self {
        Self::Svg(error)
    }
}

/// Rasterizer filling the whole image with a single color and counting its calls
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct SolidRasterizer {
    pub color: ColorU8,
    pub calls: std::cell::Cell<usize>,
}

#[cfg(test)]
impl SolidRasterizer {
    pub fn new(color: ColorU8) -> Self {
        Self {
            color,
            calls: Default::default(),
        }
    }
}

#[cfg(test)]
impl Rasterizer for SolidRasterizer {
    fn name(&self) -> &str {
        "solid"
    }

    fn rasterize(&self, _source: &[u8], size: Size) -> Result<ImageOwned<ColorU8>, RasterError> {
        if size.is_empty() {
            return Err(RasterError::EmptySize(size));
        }
        self.calls.set(self.calls.get() + 1);
        Ok(ImageOwned::new_with(size, |_, _| self.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"
    <svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">
        <rect x="0" y="0" width="5" height="10" fill="#ff0000"/>
    </svg>
    "##;

    #[test]
    fn test_recolor() {
        let image = ImageOwned::new_with(Size::new(3, 1), |_, col| match col {
            0 => ColorU8::new(10, 20, 30, 0),
            1 => ColorU8::new(10, 20, 30, 200),
            _ => ColorU8::new(0, 0, 0, 255),
        });
        let tint = ColorU8::new(0, 0, 255, 255);
        let result = recolor(&image, tint, 0.5);
        assert_eq!(
            result.to_vec(),
            vec![
                ColorU8::new(10, 20, 30, 0),
                ColorU8::new(0, 0, 255, 100),
                ColorU8::new(0, 0, 255, 128),
            ]
        );

        // opacity outside of the unit interval is clamped
        let result = recolor(&image, tint, 3.0);
        assert_eq!(result.get(0, 1), Some(&ColorU8::new(0, 0, 255, 200)));
        let result = recolor(&image, tint, -1.0);
        assert_eq!(result.get(0, 2), Some(&ColorU8::new(0, 0, 255, 0)));
    }

    #[test]
    fn test_rasterize() -> Result<(), RasterError> {
        let rasterizer = ResvgRasterizer::new();
        let image = rasterizer.rasterize(SQUARE.as_bytes(), Size::new(20, 10))?;
        assert_eq!(image.size(), Size::new(20, 10));
        assert_eq!(image.get(5, 2), Some(&ColorU8::new(255, 0, 0, 255)));
        assert_eq!(image.get(5, 17).map(|pixel| pixel.alpha()), Some(0));

        // deterministic for fixed inputs
        let again = rasterizer.rasterize(SQUARE.as_bytes(), Size::new(20, 10))?;
        assert!(image == again);
        Ok(())
    }

    #[test]
    fn test_rasterize_errors() {
        let rasterizer = ResvgRasterizer::new();
        assert!(matches!(
            rasterizer.rasterize(b"not svg", Size::new(1, 1)),
            Err(RasterError::Svg(_))
        ));
        assert!(matches!(
            rasterizer.rasterize(SQUARE.as_bytes(), Size::new(0, 4)),
            Err(RasterError::EmptySize(_))
        ));
    }

    #[test]
    fn test_oversized_pixmap() {
        let wide = Size::new(u32::MAX as usize + 2, 1);
        assert!(matches!(new_pixmap(wide), Err(RasterError::TooLarge(size)) if size == wide));
        assert!(matches!(
            new_pixmap(Size::new(usize::MAX, usize::MAX)),
            Err(RasterError::TooLarge(_))
        ));
        // fits into u32 but not into pixel memory
        assert!(matches!(
            new_pixmap(Size::new(u32::MAX as usize, u32::MAX as usize)),
            Err(RasterError::TooLarge(_))
        ));
        assert!(matches!(new_pixmap(Size::new(0, 1)), Err(RasterError::EmptySize(_))));

        let huge = Size::scaled(1e30, 1.0, 10.0);
        assert_eq!(huge.width, usize::MAX);
        assert!(matches!(
            ResvgRasterizer::new().rasterize(SQUARE.as_bytes(), huge),
            Err(RasterError::TooLarge(_))
        ));
    }

    #[test]
    fn test_pixmap_conversion() -> Result<(), RasterError> {
        let image = ImageOwned::new_with(Size::new(2, 2), |row, col| {
            ColorU8::new(255, (row * 100) as u8, (col * 100) as u8, 255)
        });
        let pixmap = pixmap_from_image(&image)?;
        assert!(image_from_pixmap(&pixmap) == image);
        Ok(())
    }
}
