//! Conversion between [`Spectrogram`] and `image` buffers, plus PNG persistence.
//!
//! Raster layout: column `x` is frame `x`, row `y` is bin `y`. Pixel `(0,0)`
//! holds the header; the spectrum value it displaces is replaced by a silent
//! bin when the raster is read back.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use super::{Encoding, Pixel, Spectrogram, SpectrogramHeader, OPAQUE};
use crate::dsp::frame::validate_frame_size;
use crate::{output, Result, WavecarveError};

impl Spectrogram {
    /// Rasterizes the spectrogram with the header written into pixel `(0,0)`.
    ///
    /// A zero-width spectrogram becomes one column holding only the header
    /// and silent bins, since raster formats cannot be zero pixels wide.
    pub fn to_rgba(&self) -> RgbaImage {
        let width = self.width.max(1) as u32;
        let height = self.frame_size as u32;
        let silent = self.encoding().silent_pixel(0);
        let mut img = RgbaImage::from_pixel(width, height, Rgba(silent));

        for (x, column) in self.pixels.chunks(self.frame_size).enumerate() {
            for (y, pixel) in column.iter().enumerate() {
                img.put_pixel(x as u32, y as u32, Rgba(*pixel));
            }
        }
        img.put_pixel(0, 0, Rgba(self.header.to_pixel()));
        img
    }

    /// Reads a raster produced by [`Spectrogram::to_rgba`], possibly edited.
    ///
    /// Fails if the image height is not `frame_size`.
    ///
    /// The layout tag lives in the alpha channel, and a raster whose alpha was
    /// stripped or flattened reads as fully opaque, i.e. as the default tag.
    /// A default tag is therefore checked against the pixel content with
    /// [`Encoding::infer`].
    pub fn from_rgba(img: &RgbaImage, frame_size: usize) -> Result<Self> {
        validate_frame_size(frame_size)?;
        let (width, height) = img.dimensions();
        if height as usize != frame_size {
            return Err(WavecarveError::Format(format!(
                "image height {} does not match frame size {}",
                height, frame_size
            )));
        }
        if width == 0 {
            return Err(WavecarveError::Format("image has no columns".into()));
        }

        let mut header = SpectrogramHeader::from_pixel(img.get_pixel(0, 0).0);
        let mut pixels: Vec<Pixel> = Vec::with_capacity(width as usize * frame_size);
        for x in 0..width {
            for y in 0..height {
                let [r, g, b, _] = img.get_pixel(x, y).0;
                pixels.push([r, g, b, OPAQUE]);
            }
        }
        if header.encoding == Encoding::default() {
            let inferred = Encoding::infer(&pixels[1..]);
            if inferred != header.encoding {
                tracing::debug!(%inferred, "opaque metadata pixel, layout inferred from content");
                header.encoding = inferred;
            }
        }
        // Amplitude is per column, so borrow it from the bin below
        pixels[0] = header.encoding.silent_pixel(pixels[1][2]);

        Self::from_parts(header, frame_size, pixels)
    }

    /// The spectrum pixels without alpha or header, as handed to a resizer.
    pub fn to_rgb(&self) -> RgbImage {
        let height = self.frame_size as u32;
        RgbImage::from_fn(self.width as u32, height, |x, y| {
            let [r, g, b, _] = self.pixel(x as usize, y as usize);
            Rgb([r, g, b])
        })
    }

    /// Rebuilds a spectrogram from resized spectrum pixels, keeping `header`.
    pub fn from_rgb(img: &RgbImage, header: SpectrogramHeader, frame_size: usize) -> Result<Self> {
        let (width, height) = img.dimensions();
        if height as usize != frame_size {
            return Err(WavecarveError::Format(format!(
                "image height {} does not match frame size {}",
                height, frame_size
            )));
        }
        let mut pixels: Vec<Pixel> = Vec::with_capacity(width as usize * frame_size);
        for x in 0..width {
            for y in 0..height {
                let [r, g, b] = img.get_pixel(x, y).0;
                pixels.push([r, g, b, OPAQUE]);
            }
        }
        Self::from_parts(header, frame_size, pixels)
    }

    /// Writes the rasterized spectrogram as a PNG.
    ///
    /// Nothing appears at `path` unless the whole image was encoded.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let img = self.to_rgba();
        output::write_atomically(path, |w| {
            img.write_to(w, ImageFormat::Png)
                .map_err(|e| WavecarveError::image(format!("write {}", path.display()), e))
        })
    }

    /// Loads a spectrogram from any raster file the `image` crate can decode.
    pub fn open(path: impl AsRef<Path>, frame_size: usize) -> Result<Self> {
        let path = path.as_ref();
        Self::from_rgba(&read_rgba(path)?, frame_size)
    }

    /// Like [`Spectrogram::open`], taking the frame size from the image height.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = read_rgba(path)?;
        let frame_size = img.height() as usize;
        Self::from_rgba(&img, frame_size)
    }
}

fn read_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path)
        .map_err(|e| WavecarveError::image(format!("read {}", path.display()), e))?;
    Ok(img.to_rgba8())
}
