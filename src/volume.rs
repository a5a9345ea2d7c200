use crate::enums::AxisDirection;
use crate::error::{Error, Result};
use crate::interpolator::{Interpolator, SampleGrid};

use log::debug;
use ndarray::{Array3, ArrayView3, Axis, s};

/// A raw scan: intensities indexed `[x, y, z]` with the physical spacing of each axis
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array3<f32>,
    spacing: (f32, f32, f32),
    orientation: [AxisDirection; 3],
}

impl Volume {
    /// Create a volume in canonical orientation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyVolume`] if any axis has length zero and
    /// [`Error::InvalidSpacing`] if a spacing is not finite and positive.
    pub fn new(data: Array3<f32>, spacing: (f32, f32, f32)) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptyVolume(data.shape().to_vec()));
        }

        let (sx, sy, sz) = spacing;
        if [sx, sy, sz].iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(Error::InvalidSpacing(spacing));
        }

        Ok(Self {
            data,
            spacing,
            orientation: AxisDirection::CANONICAL,
        })
    }

    /// Label the direction each voxel axis increases in
    pub fn with_orientation(mut self, orientation: [AxisDirection; 3]) -> Self {
        self.orientation = orientation;
        self
    }

    /// Get the dimensions of the volume (x, y, z)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    pub fn orientation(&self) -> [AxisDirection; 3] {
        self.orientation
    }

    pub fn is_canonical(&self) -> bool {
        self.orientation == AxisDirection::CANONICAL
    }

    /// Flip and permute the axes so that they run Right, Anterior, Superior.
    ///
    /// Spacing follows the axes it belongs to.
    pub fn into_canonical(self) -> Self {
        if self.is_canonical() {
            return self;
        }

        let Volume {
            mut data,
            spacing,
            orientation,
        } = self;
        let spacing = [spacing.0, spacing.1, spacing.2];

        // permutation[world] is the voxel axis that runs along that world axis
        let mut permutation = [0, 1, 2];
        for (axis, direction) in orientation.iter().enumerate() {
            if !direction.is_positive() {
                data.invert_axis(Axis(axis));
            }
            permutation[direction.world_axis()] = axis;
        }

        let data = data
            .permuted_axes(permutation)
            .as_standard_layout()
            .into_owned();
        let spacing = (
            spacing[permutation[0]],
            spacing[permutation[1]],
            spacing[permutation[2]],
        );
        debug!("reoriented {orientation:?} to RAS, shape {:?}", data.dim());

        Self {
            data,
            spacing,
            orientation: AxisDirection::CANONICAL,
        }
    }
}

/// An intensity-normalised cube of side N with values in `[0, 255]`
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedVolume {
    data: Array3<u8>,
}

impl NormalizedVolume {
    /// Wrap an existing cube.
    ///
    /// # Panics
    ///
    /// Panics if the axes of `data` do not all have the same length.
    pub fn from_cube(data: Array3<u8>) -> Self {
        let (x, y, z) = data.dim();
        assert!(x == y && y == z, "normalised volume must be a cube");
        Self { data }
    }

    /// Side length N of the cube
    pub fn dim(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn into_data(self) -> Array3<u8> {
        self.data
    }
}

/// Settings shared by both normalisation paths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    /// Global resize factor applied to the finished cube
    pub size: f32,
    /// Isotropic spacing to resample to, the finest native spacing when `None`
    pub target_spacing: Option<f32>,
    /// Largest cube side allowed to be allocated
    pub max_cube_dim: Option<usize>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            size: 1.0,
            target_spacing: None,
            max_cube_dim: None,
        }
    }
}

/// Resample, pad to a centred cube, rescale to 8 bit, then optionally resize.
///
/// The volume is brought to canonical orientation first. Padding is split with
/// the smaller half before the content.
pub fn normalize_isotropic(volume: Volume, options: &NormalizeOptions) -> Result<NormalizedVolume> {
    validate_size(options.size)?;
    if !volume.is_canonical() {
        debug!(
            "volume labelled {:?}, reorienting before resampling",
            volume.orientation()
        );
    }

    let volume = volume.into_canonical();
    let shape = isotropic_shape(&volume, options.target_spacing)?;
    check_cube_dim(cube_side(shape), options.max_cube_dim)?;
    let resampled = resample_to_shape(&volume, shape);

    let cube = pad_to_cube_centered(resampled.view());
    let cube = rescale_to_u8(cube.view())?;
    finish(cube, options)
}

/// Pad the raw volume to a cube and rescale to 8 bit, without any spacing correction.
///
/// The padding offset is `(dim - N) / -2` computed in floating point and
/// truncated, kept as-is so existing renderings keep their exact pixel alignment.
pub fn normalize_anisotropic(
    volume: &Volume,
    options: &NormalizeOptions,
) -> Result<NormalizedVolume> {
    validate_size(options.size)?;
    check_cube_dim(cube_side(volume.dim()), options.max_cube_dim)?;

    let cube = pad_to_cube_truncated(volume.data().view());
    let cube = rescale_to_u8(cube.view())?;
    finish(cube, options)
}

fn finish(cube: Array3<u8>, options: &NormalizeOptions) -> Result<NormalizedVolume> {
    let cube = if options.size != 1.0 {
        resize_cube(cube.view(), options.size)?
    } else {
        cube
    };
    debug!("normalised cube side {}", cube.len_of(Axis(0)));
    Ok(NormalizedVolume::from_cube(cube))
}

/// Resample to isotropic voxels with linear interpolation.
///
/// # Errors
///
/// Returns [`Error::InvalidTargetSpacing`] if `target_spacing` is not finite and positive.
pub fn resample_isotropic(volume: &Volume, target_spacing: Option<f32>) -> Result<Array3<f32>> {
    let shape = isotropic_shape(volume, target_spacing)?;
    Ok(resample_to_shape(volume, shape))
}

/// Shape of `volume` once resampled to `target_spacing`, without touching the data.
///
/// # Errors
///
/// Returns [`Error::InvalidTargetSpacing`] if `target_spacing` is not finite and positive.
pub fn isotropic_shape(
    volume: &Volume,
    target_spacing: Option<f32>,
) -> Result<(usize, usize, usize)> {
    let (sx, sy, sz) = volume.spacing();
    let target = target_spacing.unwrap_or(sx.min(sy).min(sz));
    if !target.is_finite() || target <= 0.0 {
        return Err(Error::InvalidTargetSpacing(target));
    }

    Ok(Interpolator::get_isotropic_dimensions(
        volume.spacing(),
        volume.dim(),
        target,
    ))
}

fn resample_to_shape(volume: &Volume, shape: (usize, usize, usize)) -> Array3<f32> {
    debug!(
        "resampling {:?} at {:?} to {shape:?}",
        volume.dim(),
        volume.spacing()
    );
    Interpolator::resample(volume.data().view(), shape, SampleGrid::AlignCorners)
}

/// Embed `data` in a zero cube with start offset `floor((N - dim) / 2)` on every axis
pub fn pad_to_cube_centered(data: ArrayView3<'_, f32>) -> Array3<f32> {
    let (x, y, z) = data.dim();
    let n = cube_side(data.dim());
    let (ox, oy, oz) = ((n - x) / 2, (n - y) / 2, (n - z) / 2);

    let mut cube = Array3::<f32>::zeros((n, n, n));
    cube.slice_mut(s![ox..ox + x, oy..oy + y, oz..oz + z])
        .assign(&data);
    cube
}

/// Embed `data` in a zero cube with start offset `trunc((dim - N) / -2)` on every axis
pub fn pad_to_cube_truncated(data: ArrayView3<'_, f32>) -> Array3<f32> {
    let (x, y, z) = data.dim();
    let n = cube_side(data.dim());
    let offset = |len: usize| ((len as f64 - n as f64) / -2.0).trunc() as usize;
    let (ox, oy, oz) = (offset(x), offset(y), offset(z));

    let mut cube = Array3::<f32>::zeros((n, n, n));
    cube.slice_mut(s![ox..ox + x, oy..oy + y, oz..oz + z])
        .assign(&data);
    cube
}

/// Scale so the maximum maps to 255 and truncate to 8 bit.
///
/// # Errors
///
/// Returns [`Error::DegenerateVolume`] when the maximum is not a positive finite number.
pub fn rescale_to_u8(data: ArrayView3<'_, f32>) -> Result<Array3<u8>> {
    let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() || max <= 0.0 {
        return Err(Error::DegenerateVolume(max));
    }

    // float to int casts saturate, so negative intensities land on 0
    Ok(data.mapv(|v| (v * 255.0 / max) as u8))
}

/// Resize every axis of the cube to `trunc(size * N)` with linear interpolation.
///
/// When shrinking, the cube is smoothed first with a Gaussian of
/// `sigma = (N / resized - 1) / 2` voxels to suppress aliasing.
pub fn resize_cube(cube: ArrayView3<'_, u8>, size: f32) -> Result<Array3<u8>> {
    let n = cube.len_of(Axis(0));
    let resized = (f64::from(size) * n as f64) as usize;
    if resized == 0 {
        return Err(Error::InvalidSizeFactor(size));
    }

    let data = cube.mapv(f32::from);
    let sigma = ((n as f64 / resized as f64 - 1.0) / 2.0).max(0.0);
    let data = if sigma > 0.0 {
        Interpolator::gaussian_filter(data.view(), [sigma; 3])
    } else {
        data
    };
    let out = Interpolator::resample(data.view(), (resized, resized, resized), SampleGrid::HalfPixel);
    Ok(out.mapv(|v| v as u8))
}

fn cube_side(dim: (usize, usize, usize)) -> usize {
    dim.0.max(dim.1).max(dim.2)
}

fn validate_size(size: f32) -> Result<()> {
    if !size.is_finite() || size <= 0.0 {
        return Err(Error::InvalidSizeFactor(size));
    }
    Ok(())
}

fn check_cube_dim(dim: usize, max: Option<usize>) -> Result<()> {
    match max {
        Some(max) if dim > max => Err(Error::CubeTooLarge { dim, max }),
        _ => Ok(()),
    }
}
