// THEORY:
// The `segmenter` module is the engine of the change-detection layer. It turns
// a pair of consecutive frames into a set of raw motion regions using plain
// O(pixels) image arithmetic, which is what lets the engine run on constrained
// hardware without any learned model.
//
// Key architectural principles & algorithm steps:
// 1.  **Noise Suppression First**: Both frames are reduced to intensity and
//     smoothed (Gaussian blur, then a 3x3 median pass for salt-and-pepper
//     noise) before they are ever compared. Sensor noise that survives to the
//     differencing stage becomes indistinguishable from motion.
// 2.  **Differencing & Binarization**: The absolute per-pixel difference is
//     thresholded into a binary change mask. The threshold is intentionally
//     high; a fixed camera means any genuine motion produces strong edges.
// 3.  **Morphological Dilation**: One 3x3 dilation pass closes single-pixel
//     gaps so that one moving object yields one connected bright area rather
//     than a constellation of fragments.
// 4.  **Component Extraction**: Connected bright areas are grown breadth-first
//     over 8-connectivity, and each component below the configured area floor
//     is discarded as flicker. Survivors are emitted as axis-aligned boxes.
// 5.  **Stateless Utility**: The segmenter holds tunables but no frame state.
//     Identical input frames produce an empty region set, not an error.

use crate::core_modules::frame::Frame;
use crate::core_modules::region::Region;
use crate::error::EngineError;
use image::GrayImage;

/// Sigma of the Gaussian smoothing pass applied to both intensity planes.
const BLUR_SIGMA: f32 = 1.5;

/// Converts a previous/current frame pair into raw change regions.
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Minimum pixel area a connected component must exceed to be emitted.
    /// Zero means no filtering.
    pub sensitivity: u32,
    /// Intensity difference at which a pixel counts as changed.
    pub diff_threshold: u8,
}

impl Segmenter {
    pub fn new(sensitivity: u32, diff_threshold: u8) -> Self {
        Self {
            sensitivity,
            diff_threshold,
        }
    }

    /// Segments the motion between two frames into bounding regions.
    ///
    /// Fails with `InvalidInput` when the frame geometries disagree; an empty
    /// difference yields an empty region set.
    pub fn segment(&self, prev: &Frame, curr: &Frame) -> Result<Vec<Region>, EngineError> {
        if !prev.same_geometry(curr) {
            return Err(EngineError::InvalidInput(format!(
                "frame geometries disagree: {}x{} vs {}x{}",
                prev.width(),
                prev.height(),
                curr.width(),
                curr.height()
            )));
        }

        let prev_plane = smooth(&prev.to_intensity());
        let curr_plane = smooth(&curr.to_intensity());

        let width = curr.width() as usize;
        let height = curr.height() as usize;

        let mask = difference_mask(&prev_plane, &curr_plane, self.diff_threshold);
        let mask = dilate(&mask, width, height);

        let regions = extract_regions(&mask, width, height, self.sensitivity);
        tracing::debug!(
            regions = regions.len(),
            sensitivity = self.sensitivity,
            "segmented frame pair"
        );
        Ok(regions)
    }
}

/// Gaussian blur followed by a 3x3 median pass.
fn smooth(plane: &GrayImage) -> GrayImage {
    median3(&image::imageops::blur(plane, BLUR_SIGMA))
}

/// 3x3 median filter; border pixels use their in-bounds neighborhood.
fn median3(plane: &GrayImage) -> GrayImage {
    let (width, height) = plane.dimensions();
    let mut out = GrayImage::new(width, height);
    let mut window = [0u8; 9];

    for y in 0..height {
        for x in 0..width {
            let mut count = 0;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let ny = y as i64 + dy;
                    let nx = x as i64 + dx;
                    if ny >= 0 && ny < height as i64 && nx >= 0 && nx < width as i64 {
                        window[count] = plane.get_pixel(nx as u32, ny as u32).0[0];
                        count += 1;
                    }
                }
            }
            window[..count].sort_unstable();
            out.put_pixel(x, y, image::Luma([window[count / 2]]));
        }
    }
    out
}

/// Binary change mask: 1 where the absolute intensity difference meets the
/// threshold, 0 elsewhere.
fn difference_mask(prev: &GrayImage, curr: &GrayImage, threshold: u8) -> Vec<u8> {
    prev.as_raw()
        .iter()
        .zip(curr.as_raw())
        .map(|(p, c)| u8::from(p.abs_diff(*c) >= threshold))
        .collect()
}

/// One iteration of 3x3 morphological dilation.
fn dilate(mask: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; mask.len()];
    for y in 0..height {
        for x in 0..width {
            'neighbors: for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let ny = y as i64 + dy;
                    let nx = x as i64 + dx;
                    if ny >= 0
                        && ny < height as i64
                        && nx >= 0
                        && nx < width as i64
                        && mask[ny as usize * width + nx as usize] != 0
                    {
                        out[y * width + x] = 1;
                        break 'neighbors;
                    }
                }
            }
        }
    }
    out
}

/// Grows 8-connected components of the change mask breadth-first and emits the
/// bounding box of every component whose pixel area exceeds `area_floor`.
fn extract_regions(mask: &[u8], width: usize, height: usize, area_floor: u32) -> Vec<Region> {
    let mut visited = vec![false; mask.len()];
    let mut regions = Vec::new();

    for start in 0..mask.len() {
        if mask[start] == 0 || visited[start] {
            continue;
        }

        visited[start] = true;
        let mut queue = vec![start];
        let mut area: u64 = 0;
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);

        while let Some(index) = queue.pop() {
            area += 1;
            let x = index % width;
            let y = index / width;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let ny = y as i64 + dy;
                    let nx = x as i64 + dx;
                    if ny >= 0 && ny < height as i64 && nx >= 0 && nx < width as i64 {
                        let neighbor = ny as usize * width + nx as usize;
                        if mask[neighbor] != 0 && !visited[neighbor] {
                            visited[neighbor] = true;
                            queue.push(neighbor);
                        }
                    }
                }
            }
        }

        if area > u64::from(area_floor) {
            regions.push(Region {
                x1: min_x as u32,
                y1: min_y as u32,
                x2: max_x as u32,
                y2: max_y as u32,
            });
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, value: u8) -> Frame {
        let mut data = vec![value; (width * height * 4) as usize];
        for alpha in data.iter_mut().skip(3).step_by(4) {
            *alpha = 255;
        }
        Frame::from_rgba(width, height, data).unwrap()
    }

    /// Paints an opaque white square onto an otherwise black frame.
    fn frame_with_square(width: u32, height: u32, x1: u32, y1: u32, x2: u32, y2: u32) -> Frame {
        let mut data = vec![0u8; (width * height * 4) as usize];
        for chunk in data.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        for y in y1..=y2 {
            for x in x1..=x2 {
                let offset = ((y * width + x) * 4) as usize;
                data[offset..offset + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        Frame::from_rgba(width, height, data).unwrap()
    }

    #[test]
    fn identical_frames_yield_no_regions() {
        let segmenter = Segmenter::new(40, 105);
        let frame = solid_frame(64, 64, 128);
        let regions = segmenter.segment(&frame, &frame.clone()).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn mismatched_geometry_is_invalid_input() {
        let segmenter = Segmenter::new(40, 105);
        let err = segmenter
            .segment(&solid_frame(64, 64, 0), &solid_frame(32, 32, 0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn a_moving_square_is_segmented() {
        let segmenter = Segmenter::new(10, 105);
        let prev = solid_frame(96, 96, 0);
        let curr = frame_with_square(96, 96, 30, 30, 60, 60);
        let regions = segmenter.segment(&prev, &curr).unwrap();
        assert_eq!(regions.len(), 1);

        // Blur and dilation widen the box slightly; it must still enclose
        // the painted square.
        let region = regions[0];
        assert!(region.x1 <= 30 && region.y1 <= 30);
        assert!(region.x2 >= 60 && region.y2 >= 60);
    }

    #[test]
    fn zero_sensitivity_keeps_every_component() {
        let prev = solid_frame(96, 96, 0);
        let curr = frame_with_square(96, 96, 40, 40, 52, 52);

        let strict = Segmenter::new(10_000, 105);
        assert!(strict.segment(&prev, &curr).unwrap().is_empty());

        let open = Segmenter::new(0, 105);
        assert!(!open.segment(&prev, &curr).unwrap().is_empty());
    }
}
