use super::axis_codes_from_columns;
use crate::enums::AxisDirection;
use crate::error::{Error, Result};
use crate::volume::Volume;

use log::warn;
use ndarray::Array3;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;

pub struct NiftiLoader;

impl NiftiLoader {
    /// Load a NIfTI-1 file in stored voxel order, labelled with its orientation.
    ///
    /// Intensities have the header scaling applied. Trailing singleton
    /// dimensions are dropped and 2D images become a single slice.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be parsed or holds more than three
    /// non-trivial dimensions
    pub fn load(path: impl AsRef<Path>) -> Result<Volume> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = obj.header().clone();
        let array = obj.into_volume().into_ndarray::<f32>()?;

        let shape = Self::spatial_shape(array.shape())?;
        let values: Vec<f32> = array.iter().copied().collect();
        let data = Array3::from_shape_vec(shape, values)?;

        Ok(Volume::new(data, Self::get_spacing(&header))?
            .with_orientation(Self::get_orientation(&header)))
    }

    fn spatial_shape(shape: &[usize]) -> Result<(usize, usize, usize)> {
        if shape.len() > 3 && shape[3..].iter().any(|&len| len != 1) {
            return Err(Error::NotThreeDimensional(shape.len()));
        }

        let axis = |i: usize| shape.get(i).copied().unwrap_or(1);
        Ok((axis(0), axis(1), axis(2)))
    }

    fn get_spacing(header: &NiftiHeader) -> (f32, f32, f32) {
        let axis = |i: usize| {
            let spacing = header.pixdim[i].abs();
            if spacing.is_finite() && spacing > 0.0 {
                spacing
            } else {
                warn!("pixdim[{i}] is {spacing}, assuming unit spacing");
                1.0
            }
        };
        (axis(1), axis(2), axis(3))
    }

    /// Direction of each voxel axis from the sform, then the qform, then the
    /// default LAS layout used when neither transform is set
    fn get_orientation(header: &NiftiHeader) -> [AxisDirection; 3] {
        if header.sform_code > 0 {
            let rows = [header.srow_x, header.srow_y, header.srow_z];
            let column = |j: usize| [rows[0][j] as f64, rows[1][j] as f64, rows[2][j] as f64];
            return axis_codes_from_columns([column(0), column(1), column(2)]);
        }

        if header.qform_code > 0 {
            return axis_codes_from_columns(Self::quaternion_columns(header));
        }

        [
            AxisDirection::Left,
            AxisDirection::Anterior,
            AxisDirection::Superior,
        ]
    }

    fn quaternion_columns(header: &NiftiHeader) -> [[f64; 3]; 3] {
        let (b, c, d) = (
            header.quatern_b as f64,
            header.quatern_c as f64,
            header.quatern_d as f64,
        );
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };

        [
            [
                a * a + b * b - c * c - d * d,
                2.0 * (b * c + a * d),
                2.0 * (b * d - a * c),
            ],
            [
                2.0 * (b * c - a * d),
                a * a + c * c - b * b - d * d,
                2.0 * (c * d + a * b),
            ],
            [
                qfac * 2.0 * (b * d + a * c),
                qfac * 2.0 * (c * d - a * b),
                qfac * (a * a + d * d - b * b - c * c),
            ],
        ]
    }
}
