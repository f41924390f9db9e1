// THEORY:
// The `frame` module is the bridge between the acquisition collaborator and
// the engine. A `Frame` is an owned RGBA8 buffer with its geometry validated
// once at construction, so every downstream stage can index into it without
// re-checking bounds. The only transform it offers is the reduction to a
// single-channel intensity plane, which is all the segmenter ever reads.

use crate::error::EngineError;
use image::GrayImage;

const CHANNELS: usize = 4;

/// A single RGBA8 video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wraps a raw RGBA buffer, validating its length against the geometry.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, EngineError> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(EngineError::FrameGeometry {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether two frames share the same pixel geometry.
    pub fn same_geometry(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Collapses the frame to a single-channel intensity plane using the
    /// Rec. 601 luma weights. Alpha is ignored.
    pub(crate) fn to_intensity(&self) -> GrayImage {
        let mut luma = Vec::with_capacity(self.width as usize * self.height as usize);
        for pixel in self.data.chunks_exact(CHANNELS) {
            let intensity = 0.299 * f64::from(pixel[0])
                + 0.587 * f64::from(pixel[1])
                + 0.114 * f64::from(pixel[2]);
            luma.push(intensity.round().min(255.0) as u8);
        }
        // Length matches by construction.
        GrayImage::from_raw(self.width, self.height, luma).unwrap()
    }
}
