//! Raw frame adapter.
//!
//! - `RawFrame`: Owned RGBA8 pixel buffer for one analysis cycle.
//! - `FrameView`: Borrowed, read-only view the extractor scans.
//!
//! A frame is released exactly once: when the owning `RawFrame` is dropped.
//! Producers that recycle buffers attach a release hook with
//! `RawFrame::with_release`, which runs on drop.
//!
//! A view cannot outlive the frame it borrows from:
//!
//! ```compile_fail
//! use steering_kernel::RawFrame;
//!
//! let view = {
//!     let frame = RawFrame::new(vec![0u8; 16], 2, 2);
//!     frame.view()
//! };
//! let _ = view.width();
//! ```

use thiserror::Error;

/// Bytes per pixel for the RGBA8 layout (R, G, B, A byte order).
pub const BYTES_PER_PIXEL: usize = 4;

/// Errors raised while addressing a malformed frame.
///
/// These are fatal to the single frame being analyzed, never to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("pixel ({row}, {col}) outside {width}x{height} frame")]
    OutOfRange {
        row: u32,
        col: u32,
        width: u32,
        height: u32,
    },
    #[error("pixel ({row}, {col}) addresses byte {end} but buffer holds {len}")]
    Truncated {
        row: u32,
        col: u32,
        end: usize,
        len: usize,
    },
    #[error("invalid frame layout: {0}")]
    InvalidLayout(String),
}

/// One RGBA pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Integer luma (ITU-R BT.601 weights), 0..=255.
    pub fn luma(self) -> u32 {
        (self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000
    }

    #[inline]
    fn from_slice(px: &[u8]) -> Self {
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Owned RGBA frame delivered by a frame source.
///
/// Dimensions are public; pixel bytes are reached through `view()`.
pub struct RawFrame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row. At least `width * 4`; larger when rows are padded.
    pub stride: usize,
    release: Option<ReleaseHook>,
}

impl RawFrame {
    /// Create a tightly packed frame (`stride == width * 4`).
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
            release: None,
        }
    }

    /// Create a frame whose rows are `stride` bytes apart.
    ///
    /// Rejects a stride shorter than a row of pixels. The buffer length is
    /// checked lazily on access so that a truncated buffer from a faulty
    /// producer surfaces as a per-frame `FrameError::Truncated`.
    pub fn with_stride(
        data: Vec<u8>,
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, FrameError> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if stride < row_bytes {
            return Err(FrameError::InvalidLayout(format!(
                "stride {} shorter than row of {} bytes",
                stride, row_bytes
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            release: None,
        })
    }

    /// Build a packed frame with every pixel set to `fill`.
    pub fn filled(width: u32, height: u32, fill: Rgba) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
        for _ in 0..pixels {
            data.extend_from_slice(&[fill.r, fill.g, fill.b, fill.a]);
        }
        Self::new(data, width, height)
    }

    /// Attach a hook that runs when the frame is released (dropped).
    pub fn with_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    /// Read-only view for analysis.
    pub fn view(&self) -> FrameView<'_> {
        FrameView { frame: self }
    }

    /// Overwrite one pixel. Used by synthetic sources to paint targets.
    pub fn set_pixel(&mut self, row: u32, col: u32, px: Rgba) -> Result<(), FrameError> {
        let start = self.view().offset_of(row, col)?;
        self.data[start..start + BYTES_PER_PIXEL].copy_from_slice(&[px.r, px.g, px.b, px.a]);
        Ok(())
    }

    pub(crate) fn byte_len(&self) -> usize {
        self.data.len()
    }
}

impl Drop for RawFrame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.byte_len())
            .finish()
    }
}

/// Borrowed read-only view over a `RawFrame`.
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    frame: &'a RawFrame,
}

impl<'a> FrameView<'a> {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    pub fn stride(&self) -> usize {
        self.frame.stride
    }

    /// Bounds-checked pixel access. O(1), no copy.
    pub fn pixel_at(&self, row: u32, col: u32) -> Result<Rgba, FrameError> {
        let start = self.offset_of(row, col)?;
        Ok(Rgba::from_slice(&self.frame.data[start..start + BYTES_PER_PIXEL]))
    }

    /// Pixel bytes of one row, `width * 4` long.
    pub fn row(&self, row: u32) -> Result<&'a [u8], FrameError> {
        if row >= self.frame.height {
            return Err(self.out_of_range(row, 0));
        }
        let start = row as usize * self.frame.stride;
        let end = start + self.frame.width as usize * BYTES_PER_PIXEL;
        if end > self.frame.data.len() {
            return Err(FrameError::Truncated {
                row,
                col: self.frame.width.saturating_sub(1),
                end,
                len: self.frame.data.len(),
            });
        }
        Ok(&self.frame.data[start..end])
    }

    /// Visit every `step`-th pixel of every `step`-th row in row-major order.
    ///
    /// Rows are validated before they are visited, so a truncated buffer
    /// fails before the visitor sees any pixel from the missing tail.
    pub fn for_each_sampled<F>(&self, step: u32, mut visit: F) -> Result<(), FrameError>
    where
        F: FnMut(u32, u32, Rgba),
    {
        let step = step.max(1);
        let mut row = 0;
        while row < self.frame.height {
            let bytes = self.row(row)?;
            for (col, px) in bytes
                .chunks_exact(BYTES_PER_PIXEL)
                .enumerate()
                .step_by(step as usize)
            {
                visit(row, col as u32, Rgba::from_slice(px));
            }
            row = row.saturating_add(step);
        }
        Ok(())
    }

    fn offset_of(&self, row: u32, col: u32) -> Result<usize, FrameError> {
        if row >= self.frame.height || col >= self.frame.width {
            return Err(self.out_of_range(row, col));
        }
        let start = row as usize * self.frame.stride + col as usize * BYTES_PER_PIXEL;
        let end = start + BYTES_PER_PIXEL;
        if end > self.frame.data.len() {
            return Err(FrameError::Truncated {
                row,
                col,
                end,
                len: self.frame.data.len(),
            });
        }
        Ok(start)
    }

    fn out_of_range(&self, row: u32, col: u32) -> FrameError {
        FrameError::OutOfRange {
            row,
            col,
            width: self.frame.width,
            height: self.frame.height,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
