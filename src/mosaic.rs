//! Lay out sagittal, coronal and axial slices of a cube side by side, one
//! frame per depth index

use crate::enums::Orientation;
use crate::error::{Error, Result};
use crate::volume::NormalizedVolume;

use image::{Rgba, RgbaImage};
use log::debug;
use ndarray::{Array2, Array3, ArrayView2, Axis, concatenate, stack};

/// Grayscale frames, each `N` rows by `3N` columns
#[derive(Debug, Clone, PartialEq)]
pub struct Mosaic {
    frames: Vec<Array2<u8>>,
}

/// Three-channel frames of shape (rows, columns, 3)
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMosaic {
    frames: Vec<Array3<u8>>,
}

impl Mosaic {
    pub fn frames(&self) -> &[Array2<u8>] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames as opaque gray RGBA images ready for encoding
    pub fn to_rgba_images(&self) -> Vec<RgbaImage> {
        self.frames
            .iter()
            .map(|frame| {
                let (height, width) = frame.dim();
                RgbaImage::from_fn(width as u32, height as u32, |x, y| {
                    let v = frame[[y as usize, x as usize]];
                    Rgba([v, v, v, 255])
                })
            })
            .collect()
    }
}

impl ColorMosaic {
    pub(crate) fn from_frames(frames: Vec<Array3<u8>>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Array3<u8>] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames as opaque RGBA images ready for encoding
    pub fn to_rgba_images(&self) -> Vec<RgbaImage> {
        self.frames
            .iter()
            .map(|frame| {
                let (height, width, _) = frame.dim();
                RgbaImage::from_fn(width as u32, height as u32, |x, y| {
                    let (x, y) = (x as usize, y as usize);
                    Rgba([frame[[y, x, 0]], frame[[y, x, 1]], frame[[y, x, 2]], 255])
                })
            })
            .collect()
    }
}

/// One grayscale frame for every `frameskip`-th depth index.
///
/// Frame `i` shows the sagittal slice at `i` and the coronal and axial slices
/// at `N - 1 - i`, which keeps front/back and top/bottom consistent across the
/// three panels.
///
/// # Errors
///
/// Returns [`Error::InvalidFrameskip`] if `frameskip` is zero
pub fn create_mosaic_normal(volume: &NormalizedVolume, frameskip: usize) -> Result<Mosaic> {
    if frameskip == 0 {
        return Err(Error::InvalidFrameskip);
    }

    let n = volume.dim();
    let frames = (0..n)
        .step_by(frameskip)
        .map(|i| compose_frame(volume, i))
        .collect::<Result<Vec<_>>>()?;

    debug!("built {} mosaic frames from a cube of side {n}", frames.len());
    Ok(Mosaic { frames })
}

/// Encode the change between neighbouring slices as colour.
///
/// Frames `i`, `i + 1` and `i + 2` of the normal mosaic become the red, green
/// and blue channels of output frame `i`. The last three frames have no
/// lookahead and are replaced with black so the frame count is unchanged.
pub fn create_mosaic_depth(volume: &NormalizedVolume, frameskip: usize) -> Result<ColorMosaic> {
    let mosaic = create_mosaic_normal(volume, frameskip)?;
    let count = mosaic.len();

    let mut frames = (0..count.saturating_sub(3))
        .map(|i| {
            let window = &mosaic.frames[i..i + 3];
            stack_channels([window[0].view(), window[1].view(), window[2].view()])
        })
        .collect::<Result<Vec<_>>>()?;

    let missing = count - frames.len();
    pad_with_black(&mut frames, &mosaic, missing);
    Ok(ColorMosaic::from_frames(frames))
}

/// Combine three cubes into one colour mosaic: the first drives red, the
/// second green and the third blue.
///
/// Three black frames are appended after the composite frames.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the cubes differ in size
pub fn create_mosaic_rgb(
    red: &NormalizedVolume,
    green: &NormalizedVolume,
    blue: &NormalizedVolume,
    frameskip: usize,
) -> Result<ColorMosaic> {
    if red.dim() != green.dim() || red.dim() != blue.dim() {
        return Err(Error::DimensionMismatch {
            red: red.dim(),
            green: green.dim(),
            blue: blue.dim(),
        });
    }

    let channels = [
        create_mosaic_normal(red, frameskip)?,
        create_mosaic_normal(green, frameskip)?,
        create_mosaic_normal(blue, frameskip)?,
    ];

    let mut frames = (0..channels[0].len())
        .map(|i| {
            stack_channels([
                channels[0].frames[i].view(),
                channels[1].frames[i].view(),
                channels[2].frames[i].view(),
            ])
        })
        .collect::<Result<Vec<_>>>()?;

    pad_with_black(&mut frames, &channels[0], 3);
    Ok(ColorMosaic::from_frames(frames))
}

fn compose_frame(volume: &NormalizedVolume, index: usize) -> Result<Array2<u8>> {
    let n = volume.dim();
    let panels = Orientation::PANELS.map(|orientation| {
        let slice_index = match orientation {
            Orientation::Sagittal => index,
            Orientation::Coronal | Orientation::Axial => n - 1 - index,
        };
        panel(volume.data().index_axis(Axis(orientation.axis()), slice_index))
    });

    Ok(concatenate(
        Axis(1),
        &[panels[0].view(), panels[1].view(), panels[2].view()],
    )?)
}

/// Flip along the second in-plane axis, then transpose
fn panel(mut slice: ArrayView2<'_, u8>) -> ArrayView2<'_, u8> {
    slice.invert_axis(Axis(1));
    slice.reversed_axes()
}

fn stack_channels(channels: [ArrayView2<'_, u8>; 3]) -> Result<Array3<u8>> {
    Ok(stack(Axis(2), &channels)?)
}

fn pad_with_black(frames: &mut Vec<Array3<u8>>, mosaic: &Mosaic, count: usize) {
    let (height, width) = mosaic
        .frames
        .first()
        .map(Array2::dim)
        .unwrap_or((0, 0));
    frames.extend((0..count).map(|_| Array3::zeros((height, width, 3))));
}
