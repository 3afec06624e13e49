//! Bitmap decoding and encoding.
//!
//! The engine works on a plain RGBA8 [`PixelBuffer`]; everything that
//! touches container formats sits behind [`BitmapCodec`].

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::color::Pixel;
use crate::error::{EngineError, EngineResult};

/// Row-major RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, checking the length matches the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> EngineResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(EngineError::decode(format!(
                "buffer length {} does not match {}x{} RGBA ({} bytes)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Pixel) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let p = f(x, y);
                data.extend_from_slice(&[p.r, p.g, p.b, p.a]);
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `data` holds exactly `width * height` RGBA pixels.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * 4
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / 4
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Pixel::rgba(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
    }

    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.data
            .chunks_exact(4)
            .map(|c| Pixel::rgba(c[0], c[1], c[2], c[3]))
    }

    /// New buffer with `f` applied to every pixel.
    pub fn map_pixels(&self, mut f: impl FnMut(Pixel) -> Pixel) -> PixelBuffer {
        let mut data = Vec::with_capacity(self.data.len());
        for p in self.pixels() {
            let out = f(p);
            data.extend_from_slice(&[out.r, out.g, out.b, out.a]);
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Convert to an `image` RGBA buffer.
    pub fn to_rgba_image(&self) -> EngineResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            EngineError::Encode {
                message: format!("invalid {}x{} buffer", self.width, self.height),
            }
        })
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

/// Container format for encoded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Webp => ImageFormat::WebP,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Jpeg => write!(f, "jpeg"),
            OutputFormat::Webp => write!(f, "webp"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// Result of decoding input bytes.
#[derive(Debug, Clone)]
pub struct DecodedBitmap {
    pub buffer: PixelBuffer,
    /// Detected container format, lowercase ("jpeg", "png", ...)
    pub format: Option<String>,
}

/// Seam between the engine and container formats.
pub trait BitmapCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> EngineResult<DecodedBitmap>;

    fn encode(&self, buffer: &PixelBuffer, format: OutputFormat) -> EngineResult<Vec<u8>>;
}

/// [`BitmapCodec`] backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self {
            max_dimension: 10_000,
            jpeg_quality: 90,
        }
    }
}

impl ImageCodec {
    pub fn new(max_dimension: u32, jpeg_quality: u8) -> Self {
        Self {
            max_dimension,
            jpeg_quality,
        }
    }
}

/// Lowercase name of an `image` format.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}

impl BitmapCodec for ImageCodec {
    fn decode(&self, bytes: &[u8]) -> EngineResult<DecodedBitmap> {
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| EngineError::decode(format!("Cannot detect image format: {}", e)))?;

        let format = reader
            .format()
            .ok_or_else(|| EngineError::decode("Unrecognized image format"))?;

        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        reader.limits(limits);

        let image = reader
            .decode()
            .map_err(|e| EngineError::decode(e.to_string()))?;

        Ok(DecodedBitmap {
            buffer: PixelBuffer::from(image.to_rgba8()),
            format: Some(format_to_string(format)),
        })
    }

    fn encode(&self, buffer: &PixelBuffer, format: OutputFormat) -> EngineResult<Vec<u8>> {
        let rgba = buffer.to_rgba_image()?;
        let mut out = Cursor::new(Vec::new());
        let encode_err = |e: image::ImageError| EngineError::Encode {
            message: e.to_string(),
        };

        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
                encoder
                    .encode(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        image::ExtendedColorType::Rgb8,
                    )
                    .map_err(encode_err)?;
            }
            OutputFormat::Png | OutputFormat::Webp => {
                rgba.write_to(&mut out, format.image_format())
                    .map_err(encode_err)?;
            }
        }

        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gradient;

    #[test]
    fn test_pixel_buffer_length_checked() {
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            PixelBuffer::new(2, 2, vec![0; 15]),
            Err(EngineError::Decode { .. })
        ));
    }

    #[test]
    fn test_png_encode_decode_preserves_pixels() {
        let codec = ImageCodec::default();
        let buffer = gradient(8, 4);
        let bytes = codec.encode(&buffer, OutputFormat::Png).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.format.as_deref(), Some("png"));
        assert_eq!(decoded.buffer, buffer);
    }

    #[test]
    fn test_jpeg_encode_keeps_dimensions() {
        let codec = ImageCodec::new(10_000, 85);
        let buffer = gradient(16, 9);
        let bytes = codec.encode(&buffer, OutputFormat::Jpeg).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.format.as_deref(), Some("jpeg"));
        assert_eq!((decoded.buffer.width, decoded.buffer.height), (16, 9));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let codec = ImageCodec::default();
        assert!(matches!(
            codec.decode(b"definitely not an image"),
            Err(EngineError::Decode { .. })
        ));
    }

    #[test]
    fn test_decode_respects_dimension_limit() {
        let bytes = ImageCodec::default()
            .encode(&gradient(64, 8), OutputFormat::Png)
            .unwrap();
        let strict = ImageCodec::new(32, 90);
        assert!(strict.decode(&bytes).is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert!("tga".parse::<OutputFormat>().is_err());
    }
}
