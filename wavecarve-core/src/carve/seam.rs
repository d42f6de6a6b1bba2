//! Content-aware width resizing by seam carving.
//!
//! Energy is the L1 gradient over all three channels (sum of absolute
//! differences to the four neighbours). A seam is an 8-connected top-to-bottom
//! path with one pixel per row, found by dynamic programming over cumulative
//! energy.
//!
//! Narrowing removes the cheapest seam repeatedly. Widening finds the `k`
//! cheapest seams on a working copy and duplicates each in the original,
//! averaging with the right-hand neighbour, so the same seam is never picked
//! twice.

use image::{Rgb, RgbImage};

use super::WidthResizer;
use crate::listener::{NoOpListener, PipelineEvent, PipelineListener};
use crate::{Result, WavecarveError};

/// Seam-carving [`WidthResizer`]. Target widths are clamped to `[1, 2 * width]`.
pub struct SeamCarver<L: PipelineListener = NoOpListener> {
    listener: L,
}

impl SeamCarver {
    pub fn new() -> Self {
        SeamCarver {
            listener: NoOpListener,
        }
    }
}

impl Default for SeamCarver {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: PipelineListener> SeamCarver<L> {
    /// Reports one [`PipelineEvent::SeamDone`] per seam to `listener`.
    pub fn with_listener(listener: L) -> Self {
        SeamCarver { listener }
    }
}

impl<L: PipelineListener> WidthResizer for SeamCarver<L> {
    fn resize(&self, image: &RgbImage, target_width: u32) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(WavecarveError::Transform(format!(
                "cannot carve a {}x{} image",
                width, height
            )));
        }
        let target = target_width.clamp(1, width.saturating_mul(2));
        self.listener.on_event(PipelineEvent::ResizeStarted {
            from_width: width,
            to_width: target,
        });

        let grid = Grid::from_image(image);
        let carved = if target < width {
            self.shrink(grid, (width - target) as usize)
        } else if target > width {
            self.grow(grid, (target - width) as usize)
        } else {
            grid
        };

        self.listener.on_event(PipelineEvent::ResizeFinished {
            width: carved.width as u32,
        });
        Ok(carved.into_image())
    }
}

impl<L: PipelineListener> SeamCarver<L> {
    fn shrink(&self, mut grid: Grid, count: usize) -> Grid {
        for index in 0..count {
            let seam = grid.find_seam();
            grid.remove_seam(&seam);
            self.listener.on_event(PipelineEvent::SeamDone {
                index,
                total: count,
            });
        }
        grid
    }

    fn grow(&self, grid: Grid, count: usize) -> Grid {
        let (width, height) = (grid.width, grid.height);
        let mut work = grid.clone();
        // Original column of every pixel still present in `work`
        let mut origin: Vec<usize> = (0..height).flat_map(|_| 0..width).collect();
        let mut duplicate = vec![false; width * height];

        for index in 0..count {
            let seam = work.find_seam();
            for (y, &x) in seam.iter().enumerate() {
                duplicate[y * width + origin[y * work.width + x]] = true;
            }
            origin = remove_from_rows(&origin, work.width, &seam);
            work.remove_seam(&seam);
            self.listener.on_event(PipelineEvent::SeamDone {
                index,
                total: count,
            });
        }

        let mut pixels = Vec::with_capacity((width + count) * height);
        for y in 0..height {
            let row = &grid.pixels[y * width..(y + 1) * width];
            for x in 0..width {
                pixels.push(row[x]);
                if duplicate[y * width + x] {
                    pixels.push(average(row[x], row[(x + 1).min(width - 1)]));
                }
            }
        }
        Grid {
            width: width + count,
            height,
            pixels,
        }
    }
}

/// Row-major RGB pixels.
#[derive(Clone)]
struct Grid {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl Grid {
    fn from_image(image: &RgbImage) -> Self {
        Grid {
            width: image.width() as usize,
            height: image.height() as usize,
            pixels: image.pixels().map(|p| p.0).collect(),
        }
    }

    fn into_image(self) -> RgbImage {
        let width = self.width;
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            Rgb(self.pixels[y as usize * width + x as usize])
        })
    }

    fn at(&self, x: usize, y: usize) -> [u8; 3] {
        self.pixels[y * self.width + x]
    }

    fn energy(&self) -> Vec<u32> {
        let (w, h) = (self.width, self.height);
        let mut energy = vec![0u32; w * h];
        for y in 0..h {
            let up = y.saturating_sub(1);
            let down = (y + 1).min(h - 1);
            for x in 0..w {
                let left = x.saturating_sub(1);
                let right = (x + 1).min(w - 1);
                let here = self.at(x, y);
                energy[y * w + x] = distance(here, self.at(left, y))
                    + distance(here, self.at(right, y))
                    + distance(here, self.at(x, up))
                    + distance(here, self.at(x, down));
            }
        }
        energy
    }

    /// Column index of the cheapest seam in each row.
    fn find_seam(&self) -> Vec<usize> {
        let (w, h) = (self.width, self.height);
        let mut cost = self.energy();
        for y in 1..h {
            for x in 0..w {
                let lo = x.saturating_sub(1);
                let hi = (x + 1).min(w - 1);
                let best = (lo..=hi)
                    .map(|k| cost[(y - 1) * w + k])
                    .min()
                    .unwrap_or(0);
                cost[y * w + x] += best;
            }
        }

        let mut seam = vec![0usize; h];
        seam[h - 1] = argmin(&cost[(h - 1) * w..h * w], 0, w - 1);
        for y in (0..h - 1).rev() {
            let x = seam[y + 1];
            let lo = x.saturating_sub(1);
            let hi = (x + 1).min(w - 1);
            seam[y] = argmin(&cost[y * w..(y + 1) * w], lo, hi);
        }
        seam
    }

    fn remove_seam(&mut self, seam: &[usize]) {
        self.pixels = remove_from_rows(&self.pixels, self.width, seam);
        self.width -= 1;
    }
}

/// Drops `seam[y]` from each row of a row-major buffer of the given width.
fn remove_from_rows<T: Copy>(values: &[T], width: usize, seam: &[usize]) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len().saturating_sub(seam.len()));
    for (y, &skip) in seam.iter().enumerate() {
        let row = &values[y * width..(y + 1) * width];
        out.extend_from_slice(&row[..skip]);
        out.extend_from_slice(&row[skip + 1..]);
    }
    out
}

/// Index of the smallest value in `row[lo..=hi]`; the leftmost wins ties.
fn argmin(row: &[u32], lo: usize, hi: usize) -> usize {
    let mut best = lo;
    for x in lo + 1..=hi {
        if row[x] < row[best] {
            best = x;
        }
    }
    best
}

fn distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter().zip(b).map(|(&p, q)| p.abs_diff(q) as u32).sum()
}

fn average(a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    let mut out = [0u8; 3];
    for c in 0..3 {
        out[c] = ((a[c] as u16 + b[c] as u16 + 1) / 2) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    /// Black image with one white column.
    fn stripe(width: u32, height: u32, at: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| if x == at { WHITE } else { BLACK })
    }

    fn white_columns(image: &RgbImage) -> Vec<u32> {
        (0..image.width())
            .filter(|&x| *image.get_pixel(x, 0) == WHITE)
            .collect()
    }

    #[derive(Default)]
    struct CountSeams(AtomicUsize);

    impl PipelineListener for CountSeams {
        fn on_event(&self, event: PipelineEvent) {
            if let PipelineEvent::SeamDone { .. } = event {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn shrink_keeps_height() {
        let carved = SeamCarver::new().resize(&stripe(20, 7, 9), 13).unwrap();
        assert_eq!(carved.dimensions(), (13, 7));
    }

    #[test]
    fn shrink_spares_the_high_energy_column() {
        let carved = SeamCarver::new().resize(&stripe(5, 4, 2), 3).unwrap();
        assert_eq!(carved.width(), 3);
        assert_eq!(white_columns(&carved).len(), 1);
        for y in 0..4 {
            assert_eq!(carved.get_pixel(1, y), &WHITE);
        }
    }

    #[test]
    fn grow_inserts_into_flat_regions() {
        let carved = SeamCarver::new().resize(&stripe(6, 5, 4), 8).unwrap();
        assert_eq!(carved.dimensions(), (8, 5));
        // The stripe stays a single column
        assert_eq!(white_columns(&carved).len(), 1);
    }

    #[test]
    fn grow_is_capped_at_double_width() {
        let image = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));
        let carved = SeamCarver::new().resize(&image, 100).unwrap();
        assert_eq!(carved.dimensions(), (8, 3));
        assert!(carved.pixels().all(|p| *p == Rgb([10, 20, 30])));
    }

    #[test]
    fn target_zero_is_clamped_to_one() {
        let carved = SeamCarver::new().resize(&stripe(6, 3, 1), 0).unwrap();
        assert_eq!(carved.dimensions(), (1, 3));
    }

    #[test]
    fn same_width_is_unchanged() {
        let image = stripe(6, 3, 1);
        assert_eq!(SeamCarver::new().resize(&image, 6).unwrap(), image);
    }

    #[test]
    fn empty_image_is_rejected() {
        let err = SeamCarver::new().resize(&RgbImage::new(0, 4), 2).unwrap_err();
        assert!(matches!(err, WavecarveError::Transform(_)));
    }

    #[test]
    fn reports_one_event_per_seam() {
        let counter = CountSeams::default();
        let carver = SeamCarver::with_listener(&counter);
        carver.resize(&stripe(10, 4, 3), 6).unwrap();
        assert_eq!(counter.0.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn seams_are_connected() {
        let image = RgbImage::from_fn(9, 12, |x, y| Rgb([(x * 29 + y * 7) as u8, (x * y) as u8, 3]));
        let seam = Grid::from_image(&image).find_seam();
        assert_eq!(seam.len(), 12);
        for pair in seam.windows(2) {
            assert!(pair[0].abs_diff(pair[1]) <= 1);
        }
    }
}
