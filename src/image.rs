use crate::{ColorU8, Scalar};
use std::{fmt, io::Write};

/// Size of an image in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Pixel size of the area `width x height` drawn at `scale`, never smaller than 1x1
    ///
    /// Values beyond `usize::MAX` saturate, allocation of such an image fails
    /// with [`RasterError::TooLarge`](crate::RasterError::TooLarge).
    pub fn scaled(width: Scalar, height: Scalar, scale: Scalar) -> Self {
        let pixels = |value: Scalar| {
            let value = (value * scale).round();
            if value.is_nan() || value < 1.0 {
                1
            } else if value >= usize::MAX as Scalar {
                usize::MAX
            } else {
                value as usize
            }
        };
        Self {
            width: pixels(width),
            height: pixels(height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Width of the image
    pub width: usize,
    /// Height of the image
    pub height: usize,
    /// How many elements we need to skip to get to the next row.
    pub row_stride: usize,
}

impl Shape {
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        row * self.row_stride + col
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

pub trait Image {
    type Pixel;

    fn data(&self) -> &[Self::Pixel];

    fn shape(&self) -> Shape;

    fn width(&self) -> usize {
        self.shape().width
    }

    fn height(&self) -> usize {
        self.shape().height
    }

    fn size(&self) -> Size {
        self.shape().size()
    }

    fn get(&self, row: usize, col: usize) -> Option<&Self::Pixel> {
        let shape = self.shape();
        if row >= shape.height || col >= shape.width {
            return None;
        }
        self.data().get(shape.offset(row, col))
    }

    /// Iterate over rows of the image
    fn rows(&self) -> impl Iterator<Item = &[Self::Pixel]> {
        let shape = self.shape();
        let data = self.data();
        (0..shape.height).map(move |row| {
            let offset = shape.offset(row, 0);
            &data[offset..offset + shape.width]
        })
    }
}

pub trait ImageMut: Image {
    fn data_mut(&mut self) -> &mut [Self::Pixel];

    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Self::Pixel> {
        let shape = self.shape();
        if row >= shape.height || col >= shape.width {
            return None;
        }
        self.data_mut().get_mut(shape.offset(row, col))
    }
}

/// Image that owns its pixels, rows are stored contiguously
#[derive(Clone, PartialEq)]
pub struct ImageOwned<P> {
    shape: Shape,
    data: Vec<P>,
}

impl<P> fmt::Debug for ImageOwned<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageOwned({})", self.shape.size())
    }
}

impl<P> ImageOwned<P> {
    pub fn new_default(size: Size) -> Self
    where
        P: Default,
    {
        Self::new_with(size, |_, _| Default::default())
    }

    pub fn new_with<F>(size: Size, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> P,
    {
        let Size { width, height } = size;
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col))
            }
        }
        Self {
            shape: Shape {
                width,
                height,
                row_stride: width,
            },
            data,
        }
    }

    /// Apply `f` to every pixel producing a new image of the same size
    pub fn map<Q>(&self, f: impl FnMut(&P) -> Q) -> ImageOwned<Q> {
        ImageOwned {
            shape: self.shape,
            data: self.data.iter().map(f).collect(),
        }
    }

    pub fn to_vec(self) -> Vec<P> {
        self.data
    }
}

impl<P> Image for ImageOwned<P> {
    type Pixel = P;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn data(&self) -> &[Self::Pixel] {
        &self.data
    }
}

impl<P> ImageMut for ImageOwned<P> {
    fn data_mut(&mut self) -> &mut [Self::Pixel] {
        &mut self.data
    }
}

impl<I> Image for &I
where
    I: Image + ?Sized,
{
    type Pixel = I::Pixel;

    fn shape(&self) -> Shape {
        (*self).shape()
    }

    fn data(&self) -> &[Self::Pixel] {
        (*self).data()
    }
}

impl ImageOwned<ColorU8> {
    /// Raw RGBA bytes, row by row
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Write image in PNG format
    #[cfg(feature = "png")]
    pub fn write_png(&self, w: impl Write) -> std::io::Result<()> {
        let (width, height) = (dimension(self.width())?, dimension(self.height())?);
        let mut encoder = png::Encoder::new(w, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(std::io::Error::other)?;
        writer
            .write_image_data(self.as_bytes())
            .map_err(std::io::Error::other)?;
        writer.finish().map_err(std::io::Error::other)
    }

    /// Write image in uncompressed 32-bit BMP format
    pub fn write_bmp(&self, mut w: impl Write) -> std::io::Result<()> {
        const BMP_HEADER_SIZE: u32 = 14;
        const DIB_HEADER_SIZE: u32 = 108;
        let data_offset = BMP_HEADER_SIZE + DIB_HEADER_SIZE;
        let width = i32::try_from(dimension(self.width())?).map_err(too_large)?;
        let height = i32::try_from(dimension(self.height())?).map_err(too_large)?;
        let data_size = self
            .width()
            .checked_mul(self.height())
            .and_then(|pixels| pixels.checked_mul(4))
            .and_then(|bytes| u32::try_from(bytes).ok())
            .and_then(|bytes| bytes.checked_add(data_offset).map(|_| bytes))
            .ok_or_else(|| too_large(self.size()))?;

        // BMP File Header
        write!(w, "BM")?;
        w.write_all(&(data_offset + data_size).to_le_bytes())?;
        w.write_all(&0u32.to_le_bytes())?;
        w.write_all(&data_offset.to_le_bytes())?;

        // BITMAPV4HEADER, negative height means rows are stored top to bottom
        w.write_all(&DIB_HEADER_SIZE.to_le_bytes())?;
        w.write_all(&width.to_le_bytes())?;
        w.write_all(&(-height).to_le_bytes())?;
        w.write_all(&1u16.to_le_bytes())?; // planes
        w.write_all(&32u16.to_le_bytes())?; // bits per pixel
        w.write_all(&3u32.to_le_bytes())?; // BI_BITFIELDS
        w.write_all(&data_size.to_le_bytes())?;
        w.write_all(&2835u32.to_le_bytes())?; // horizontal resolution 72 DPI
        w.write_all(&2835u32.to_le_bytes())?; // vertical resolution 72 DPI
        w.write_all(&0u32.to_le_bytes())?; // colors in palette
        w.write_all(&0u32.to_le_bytes())?; // important colors
        w.write_all(&0x000000ffu32.to_le_bytes())?; // red mask
        w.write_all(&0x0000ff00u32.to_le_bytes())?; // green mask
        w.write_all(&0x00ff0000u32.to_le_bytes())?; // blue mask
        w.write_all(&0xff000000u32.to_le_bytes())?; // alpha mask
        w.write_all(b"BGRs")?; // sRGB color space
        w.write_all(&[0u8; 48])?; // endpoints and gamma, unused for sRGB

        for row in self.rows() {
            w.write_all(bytemuck::cast_slice(row))?;
        }
        Ok(())
    }
}

fn too_large(value: impl fmt::Display) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("image dimension {} is too large", value),
    )
}

fn dimension(value: usize) -> std::io::Result<u32> {
    u32::try_from(value).map_err(|_| too_large(value))
}
