//! Pixel source adapter.
//!
//! Turns a raw image buffer (bytes + width/height + pixel format) into a lazy
//! stream of [`PixelSample`]s. The sampling stride is applied on both axes, so
//! a stride of 3 visits every third column of every third row.

use image::RgbaImage;
use palette::Srgb;

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, Result};

/// Memory layout of one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Red, green, blue, alpha. One byte each.
    Rgba8,
    /// Blue, green, red, alpha. One byte each.
    Bgra8,
    /// Alpha, red, green, blue. One byte each.
    Argb8,
    /// Red, green, blue. No alpha.
    Rgb8,
    /// 5-6-5 packed into a little-endian `u16`. No alpha.
    Rgb565,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 | PixelFormat::Argb8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgb565 => 2,
        }
    }

    /// Decode one pixel into `(color, alpha)`. `px` is exactly `bytes_per_pixel` long.
    #[inline(always)]
    fn decode(self, px: &[u8]) -> (Srgb<u8>, u8) {
        match self {
            PixelFormat::Rgba8 => (Srgb::new(px[0], px[1], px[2]), px[3]),
            PixelFormat::Bgra8 => (Srgb::new(px[2], px[1], px[0]), px[3]),
            PixelFormat::Argb8 => (Srgb::new(px[1], px[2], px[3]), px[0]),
            PixelFormat::Rgb8 => (Srgb::new(px[0], px[1], px[2]), u8::MAX),
            PixelFormat::Rgb565 => {
                let v = u16::from_le_bytes([px[0], px[1]]);
                let r = ((v >> 11) & 0x1f) as u8;
                let g = ((v >> 5) & 0x3f) as u8;
                let b = (v & 0x1f) as u8;
                (
                    Srgb::new((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)),
                    u8::MAX,
                )
            }
        }
    }
}

/// One sampled pixel. Read-only once produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelSample {
    pub color: Srgb<u8>,
    /// `(x, y)` in the source image, when known.
    pub position: Option<(u32, u32)>,
}

impl PixelSample {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self {
            color: Srgb::new(red, green, blue),
            position: None,
        }
    }
}

/// Which samples are dropped before quantization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleFilter {
    /// Samples with alpha at or below this are skipped. `None` keeps them all.
    pub alpha_threshold: Option<u8>,
    /// Skip samples whose three channels are all above 250.
    pub ignore_white: bool,
}

impl SampleFilter {
    /// Keeps every sample, including fully transparent ones.
    pub const KEEP_ALL: SampleFilter = SampleFilter {
        alpha_threshold: None,
        ignore_white: false,
    };

    #[inline(always)]
    fn keeps(&self, color: Srgb<u8>, alpha: u8) -> bool {
        if self.alpha_threshold.is_some_and(|threshold| alpha <= threshold) {
            return false;
        }
        !(self.ignore_white && color.red > 250 && color.green > 250 && color.blue > 250)
    }
}

impl From<&ExtractionConfig> for SampleFilter {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            alpha_threshold: Some(config.alpha_threshold()),
            ignore_white: config.ignore_white(),
        }
    }
}

/// A borrowed, validated view over raw pixel bytes.
#[derive(Clone, Copy, Debug)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    row_stride: usize,
}

impl<'a> PixelBuffer<'a> {
    /// Tightly packed rows (`row_stride = width * bytes_per_pixel`).
    pub fn new(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        // An overflowing row is reported by `with_row_stride`.
        let row_stride = row_bytes(width, format).unwrap_or(usize::MAX);
        Self::with_row_stride(data, width, height, format, row_stride)
    }

    /// Rows padded to `row_stride` bytes. The final row may omit its padding.
    pub fn with_row_stride(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        row_stride: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ExtractError::EmptyImage(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }

        let overflow = || {
            ExtractError::InvalidFormat(format!(
                "{}x{} {:?} with row stride {} does not fit in addressable memory",
                width, height, format, row_stride
            ))
        };

        let row_bytes = row_bytes(width, format).ok_or_else(overflow)?;
        if row_stride < row_bytes {
            return Err(ExtractError::InvalidFormat(format!(
                "row stride {} is shorter than one {:?} row of {} pixels ({} bytes)",
                row_stride, format, width, row_bytes
            )));
        }

        let min_len = row_stride
            .checked_mul(height as usize - 1)
            .and_then(|padded| padded.checked_add(row_bytes))
            .ok_or_else(overflow)?;
        // The final row may omit its padding, so only the lower bound must fit.
        let max_len = row_stride.saturating_mul(height as usize);
        if data.len() < min_len || data.len() > max_len {
            return Err(ExtractError::InvalidFormat(format!(
                "buffer of {} bytes does not match {}x{} {:?} with row stride {} (expected {}..={} bytes)",
                data.len(),
                width,
                height,
                format,
                row_stride,
                min_len,
                max_len
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            format,
            row_stride,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Lazily yield every `stride`-th pixel on both axes that passes `filter`.
    pub fn samples(&self, stride: usize, filter: SampleFilter) -> Samples<'a> {
        Samples {
            buffer: *self,
            stride: u32::try_from(stride.max(1)).unwrap_or(u32::MAX),
            filter,
            x: 0,
            y: 0,
        }
    }
}

/// Bytes in one unpadded row, or `None` if that overflows `usize`.
fn row_bytes(width: u32, format: PixelFormat) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(format.bytes_per_pixel())
}

/// Unvalidated image description, as handed over by a caller.
///
/// [`RawImage::validate`] turns it into a [`PixelBuffer`] or reports why the
/// metadata and the bytes disagree.
#[derive(Clone, Copy, Debug)]
pub struct RawImage<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Bytes per row. `None` means tightly packed.
    pub row_stride: Option<usize>,
}

impl<'a> RawImage<'a> {
    pub fn new(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
            row_stride: None,
        }
    }

    pub fn with_row_stride(mut self, row_stride: usize) -> Self {
        self.row_stride = Some(row_stride);
        self
    }

    pub fn validate(&self) -> Result<PixelBuffer<'a>> {
        match self.row_stride {
            Some(stride) => PixelBuffer::with_row_stride(
                self.data,
                self.width,
                self.height,
                self.format,
                stride,
            ),
            None => PixelBuffer::new(self.data, self.width, self.height, self.format),
        }
    }
}

impl<'a> From<&'a RgbaImage> for RawImage<'a> {
    fn from(img: &'a RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        RawImage::new(img.as_raw(), width, height, PixelFormat::Rgba8)
    }
}

/// Iterator returned by [`PixelBuffer::samples`].
#[derive(Clone, Debug)]
pub struct Samples<'a> {
    buffer: PixelBuffer<'a>,
    stride: u32,
    filter: SampleFilter,
    x: u32,
    y: u32,
}

impl Iterator for Samples<'_> {
    type Item = PixelSample;

    fn next(&mut self) -> Option<PixelSample> {
        let bpp = self.buffer.format.bytes_per_pixel();
        while self.y < self.buffer.height {
            let (x, y) = (self.x, self.y);
            self.x = self.x.saturating_add(self.stride);
            if self.x >= self.buffer.width {
                self.x = 0;
                self.y = self.y.saturating_add(self.stride);
            }

            let offset = y as usize * self.buffer.row_stride + x as usize * bpp;
            let (color, alpha) = self.buffer.format.decode(&self.buffer.data[offset..offset + bpp]);
            if self.filter.keeps(color, alpha) {
                return Some(PixelSample {
                    color,
                    position: Some((x, y)),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors(buffer: &PixelBuffer, stride: usize, filter: SampleFilter) -> Vec<(u8, u8, u8)> {
        buffer
            .samples(stride, filter)
            .map(|s| (s.color.red, s.color.green, s.color.blue))
            .collect()
    }

    #[test]
    fn zero_dimension_is_empty_image() {
        let err = PixelBuffer::new(&[], 0, 4, PixelFormat::Rgba8).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyImage(_)));
        let err = PixelBuffer::new(&[], 4, 0, PixelFormat::Rgba8).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyImage(_)));
    }

    #[test]
    fn length_mismatch_is_invalid_format() {
        let data = [0u8; 15];
        let err = PixelBuffer::new(&data, 2, 2, PixelFormat::Rgba8).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat(_)));

        let data = [0u8; 17];
        let err = PixelBuffer::new(&data, 2, 2, PixelFormat::Rgba8).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat(_)));
    }

    #[test]
    fn short_row_stride_is_invalid_format() {
        let data = [0u8; 12];
        let err = PixelBuffer::with_row_stride(&data, 2, 2, PixelFormat::Rgb8, 5).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat(_)));
    }

    #[test]
    fn oversized_metadata_is_invalid_format() {
        let data = [0u8; 8];
        let huge_stride = usize::MAX / 2 + 1;
        let err = PixelBuffer::with_row_stride(&data, 1, 3, PixelFormat::Rgba8, huge_stride)
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat(_)), "{err}");

        let err = PixelBuffer::with_row_stride(&data[..4], 1, 3, PixelFormat::Rgba8, usize::MAX)
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat(_)), "{err}");

        // Wraps to zero bytes per row where `usize` is 32 bits wide.
        let err = PixelBuffer::new(&[], 0x4000_0000, 1, PixelFormat::Rgba8).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat(_)), "{err}");
        let err = PixelBuffer::new(&[], u32::MAX, u32::MAX, PixelFormat::Rgba8).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat(_)), "{err}");
    }

    #[test]
    fn huge_stride_on_single_row_reads_only_that_row() {
        let data = [1u8, 2, 3, 255];
        let buffer =
            PixelBuffer::with_row_stride(&data, 1, 1, PixelFormat::Rgba8, usize::MAX).unwrap();
        assert_eq!(colors(&buffer, 1, SampleFilter::KEEP_ALL), vec![(1, 2, 3)]);
    }

    #[test]
    fn raw_image_honours_row_stride() {
        let data = [0u8; 8 + 6];
        let raw = RawImage::new(&data, 2, 2, PixelFormat::Rgb8);
        assert!(matches!(raw.validate(), Err(ExtractError::InvalidFormat(_))));
        assert!(raw.with_row_stride(8).validate().is_ok());
    }

    #[test]
    fn padded_rows_skip_padding() {
        // 2x2 RGB8, rows padded to 8 bytes, last row unpadded.
        let data = [
            1, 2, 3, 4, 5, 6, 0xEE, 0xEE, //
            7, 8, 9, 10, 11, 12,
        ];
        let buffer = PixelBuffer::with_row_stride(&data, 2, 2, PixelFormat::Rgb8, 8).unwrap();
        assert_eq!(
            colors(&buffer, 1, SampleFilter::KEEP_ALL),
            vec![(1, 2, 3), (4, 5, 6), (7, 8, 9), (10, 11, 12)]
        );
    }

    #[test]
    fn channel_orders_decode_to_rgb() {
        let bgra = [30, 20, 10, 255];
        let buffer = PixelBuffer::new(&bgra, 1, 1, PixelFormat::Bgra8).unwrap();
        assert_eq!(colors(&buffer, 1, SampleFilter::KEEP_ALL), vec![(10, 20, 30)]);

        let argb = [255, 10, 20, 30];
        let buffer = PixelBuffer::new(&argb, 1, 1, PixelFormat::Argb8).unwrap();
        assert_eq!(colors(&buffer, 1, SampleFilter::KEEP_ALL), vec![(10, 20, 30)]);
    }

    #[test]
    fn rgb565_expands_to_full_range() {
        // pure red, pure green, pure blue, white
        let words: [u16; 4] = [0xF800, 0x07E0, 0x001F, 0xFFFF];
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let buffer = PixelBuffer::new(&data, 4, 1, PixelFormat::Rgb565).unwrap();
        assert_eq!(
            colors(&buffer, 1, SampleFilter::KEEP_ALL),
            vec![(255, 0, 0), (0, 255, 0), (0, 0, 255), (255, 255, 255)]
        );
    }

    #[test]
    fn stride_applies_to_both_axes() {
        // 3x3 RGB8 where each pixel's red channel is its index.
        let data: Vec<u8> = (0..9u8).flat_map(|i| [i, 0, 0]).collect();
        let buffer = PixelBuffer::new(&data, 3, 3, PixelFormat::Rgb8).unwrap();
        let reds: Vec<u8> = buffer
            .samples(2, SampleFilter::KEEP_ALL)
            .map(|s| s.color.red)
            .collect();
        assert_eq!(reds, vec![0, 2, 6, 8]);

        let positions: Vec<_> = buffer
            .samples(2, SampleFilter::KEEP_ALL)
            .map(|s| s.position)
            .collect();
        assert_eq!(
            positions,
            vec![Some((0, 0)), Some((2, 0)), Some((0, 2)), Some((2, 2))]
        );
    }

    #[test]
    fn stride_larger_than_image_yields_origin_only() {
        let data = [9u8; 4 * 4 * 3];
        let buffer = PixelBuffer::new(&data, 4, 4, PixelFormat::Rgb8).unwrap();
        assert_eq!(buffer.samples(100, SampleFilter::KEEP_ALL).count(), 1);
    }

    #[test]
    fn filter_drops_transparent_and_white() {
        let data = [
            255, 0, 0, 255, // opaque red
            0, 255, 0, 100, // translucent green
            255, 255, 255, 255, // white
            251, 251, 250, 255, // near white, blue channel not above 250
        ];
        let buffer = PixelBuffer::new(&data, 4, 1, PixelFormat::Rgba8).unwrap();
        let filter = SampleFilter {
            alpha_threshold: Some(125),
            ignore_white: true,
        };
        assert_eq!(
            colors(&buffer, 1, filter),
            vec![(255, 0, 0), (251, 251, 250)]
        );
    }

    #[test]
    fn rgba_image_converts_without_copy() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let buffer = RawImage::from(&img).validate().unwrap();
        assert_eq!(buffer.width(), 3);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.samples(1, SampleFilter::KEEP_ALL).count(), 6);

        let empty = RgbaImage::new(0, 0);
        assert!(matches!(
            RawImage::from(&empty).validate(),
            Err(ExtractError::EmptyImage(_))
        ));
    }
}
