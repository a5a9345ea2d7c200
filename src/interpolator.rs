use ndarray::{Array3, ArrayView3, Axis, Zip};

/// Where output samples sit relative to the input grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SampleGrid {
    /// First and last samples coincide with the first and last input voxels
    AlignCorners,
    /// Samples are voxel centres, edges are clamped
    HalfPixel,
}

pub(crate) struct Interpolator;

impl Interpolator {
    /// Shape of the volume after resampling every axis to `target_spacing`.
    ///
    /// Each axis is scaled by `spacing / target_spacing` and rounded, never below one voxel.
    pub(crate) fn get_isotropic_dimensions(
        spacing: (f32, f32, f32),
        original_dim: (usize, usize, usize),
        target_spacing: f32,
    ) -> (usize, usize, usize) {
        let scale = |len: usize, spacing: f32| -> usize {
            let factor = f64::from(spacing) / f64::from(target_spacing);
            ((len as f64 * factor).round() as usize).max(1)
        };

        (
            scale(original_dim.0, spacing.0),
            scale(original_dim.1, spacing.1),
            scale(original_dim.2, spacing.2),
        )
    }

    /// Trilinear resampling of `data` to `shape`, done as one linear pass per axis
    pub(crate) fn resample(
        data: ArrayView3<'_, f32>,
        shape: (usize, usize, usize),
        grid: SampleGrid,
    ) -> Array3<f32> {
        let target = [shape.0, shape.1, shape.2];
        let mut current = data.to_owned();

        for (axis, &out_len) in target.iter().enumerate() {
            if current.len_of(Axis(axis)) != out_len {
                current = Self::resample_axis(current.view(), axis, out_len, grid);
            }
        }
        current
    }

    fn resample_axis(
        data: ArrayView3<'_, f32>,
        axis: usize,
        out_len: usize,
        grid: SampleGrid,
    ) -> Array3<f32> {
        let in_len = data.len_of(Axis(axis));
        let weights = Self::sample_positions(in_len, out_len, grid);

        let mut shape = data.raw_dim();
        shape[axis] = out_len;
        let mut output = Array3::<f32>::zeros(shape);

        Zip::from(output.lanes_mut(Axis(axis)))
            .and(data.lanes(Axis(axis)))
            .par_for_each(|mut out_lane, in_lane| {
                for (value, &(i0, i1, w)) in out_lane.iter_mut().zip(weights.iter()) {
                    *value = Self::linear_interpolate(in_lane[i0], in_lane[i1], w);
                }
            });

        output
    }

    /// Separable Gaussian smoothing with a per-axis standard deviation in voxels.
    ///
    /// Kernels are truncated at four sigma and edges are mirrored about the
    /// outermost voxel. Axes with a sigma of zero are left untouched.
    pub(crate) fn gaussian_filter(data: ArrayView3<'_, f32>, sigma: [f64; 3]) -> Array3<f32> {
        let mut current = data.to_owned();

        for (axis, &sigma) in sigma.iter().enumerate() {
            let len = current.len_of(Axis(axis));
            if sigma <= 0.0 || len < 2 {
                continue;
            }

            let kernel = Self::gaussian_kernel(sigma);
            let radius = (kernel.len() / 2) as isize;
            let mut output = Array3::<f32>::zeros(current.raw_dim());

            Zip::from(output.lanes_mut(Axis(axis)))
                .and(current.lanes(Axis(axis)))
                .par_for_each(|mut out_lane, in_lane| {
                    for (i, value) in out_lane.iter_mut().enumerate() {
                        *value = kernel
                            .iter()
                            .enumerate()
                            .map(|(k, &w)| {
                                let j = i as isize + k as isize - radius;
                                w * in_lane[Self::mirror_index(j, len)]
                            })
                            .sum();
                    }
                });

            current = output;
        }
        current
    }

    fn gaussian_kernel(sigma: f64) -> Vec<f32> {
        let radius = (4.0 * sigma + 0.5) as isize;
        let weights: Vec<f64> = (-radius..=radius)
            .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        weights.iter().map(|w| (w / total) as f32).collect()
    }

    /// Reflect `index` about the first and last sample, `d c b | a b c d | c b a`
    fn mirror_index(index: isize, len: usize) -> usize {
        let period = 2 * (len as isize - 1);
        let wrapped = index.rem_euclid(period);
        if wrapped >= len as isize {
            (period - wrapped) as usize
        } else {
            wrapped as usize
        }
    }

    /// For every output index the two neighbouring input indices and the weight of the second
    fn sample_positions(in_len: usize, out_len: usize, grid: SampleGrid) -> Vec<(usize, usize, f32)> {
        let last = (in_len - 1) as f64;

        (0..out_len)
            .map(|o| {
                let src = match grid {
                    SampleGrid::AlignCorners if out_len > 1 => {
                        o as f64 * last / (out_len - 1) as f64
                    }
                    SampleGrid::AlignCorners => 0.0,
                    SampleGrid::HalfPixel => {
                        let norm = (o as f64 + 0.5) / out_len as f64;
                        (norm * in_len as f64 - 0.5).clamp(0.0, last)
                    }
                };

                let i0 = (src.floor() as usize).min(in_len - 1);
                let i1 = (i0 + 1).min(in_len - 1);
                (i0, i1, (src - i0 as f64) as f32)
            })
            .collect()
    }

    #[inline]
    fn linear_interpolate(v0: f32, v1: f32, w: f32) -> f32 {
        v0.mul_add(1.0 - w, v1 * w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    #[test]
    fn isotropic_dimensions_scale_coarse_axes() {
        let dim = Interpolator::get_isotropic_dimensions((1.0, 1.0, 2.5), (10, 20, 4), 1.0);
        assert_eq!(dim, (10, 20, 10));
    }

    #[test]
    fn isotropic_dimensions_never_collapse() {
        let dim = Interpolator::get_isotropic_dimensions((0.1, 1.0, 1.0), (2, 3, 3), 1.0);
        assert_eq!(dim, (1, 3, 3));
    }

    #[test]
    fn align_corners_keeps_end_points() {
        let data = Array::from_shape_vec((1, 1, 3), vec![0.0, 10.0, 20.0]).unwrap();
        let out = Interpolator::resample(data.view(), (1, 1, 5), SampleGrid::AlignCorners);
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![0.0, 5.0, 10.0, 15.0, 20.0]);
    }

    #[test]
    fn half_pixel_clamps_at_edges() {
        let data = Array::from_shape_vec((2, 1, 1), vec![0.0, 8.0]).unwrap();
        let out = Interpolator::resample(data.view(), (4, 1, 1), SampleGrid::HalfPixel);
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![0.0, 2.0, 6.0, 8.0]);
    }

    #[test]
    fn mirror_reflects_about_edge_samples() {
        let mirrored: Vec<_> = (-3..7).map(|i| Interpolator::mirror_index(i, 4)).collect();
        assert_eq!(mirrored, vec![3, 2, 1, 0, 1, 2, 3, 2, 1, 0]);
    }

    #[test]
    fn gaussian_keeps_constant_volume() {
        let data = Array3::<f32>::from_elem((5, 3, 4), 7.0);
        let out = Interpolator::gaussian_filter(data.view(), [1.5, 0.5, 0.0]);
        assert!(out.iter().all(|&v| (v - 7.0).abs() < 1e-4));
    }

    #[test]
    fn gaussian_spreads_an_impulse() {
        let mut data = Array3::<f32>::zeros((9, 1, 1));
        data[[4, 0, 0]] = 1.0;
        let out = Interpolator::gaussian_filter(data.view(), [1.0, 0.0, 0.0]);

        assert!((out.sum() - 1.0).abs() < 1e-5);
        assert!(out[[4, 0, 0]] < 1.0);
        assert!((out[[3, 0, 0]] - out[[5, 0, 0]]).abs() < 1e-6);
        assert!(out[[3, 0, 0]] > out[[2, 0, 0]]);
    }

    #[test]
    fn same_shape_is_identity() {
        let data = Array::from_shape_fn((3, 4, 5), |(x, y, z)| (x * 20 + y * 5 + z) as f32);
        let out = Interpolator::resample(data.view(), (3, 4, 5), SampleGrid::HalfPixel);
        assert_eq!(out, data);
    }
}
