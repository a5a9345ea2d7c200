//! Reading scans from disk into [`Volume`]s
//!
//! Two sources are supported:
//!  - NIfTI-1 files (`.nii`, `.nii.gz`)
//!  - directories of DICOM slices (`*.dcm`)
//!
//! Both hand back data in stored voxel order, labelled with the anatomical
//! direction of each axis. [`Volume::into_canonical`](crate::Volume::into_canonical)
//! turns that into RAS+ when needed.

mod dicom_series;
mod nifti_file;

pub use self::dicom_series::DicomLoader;
pub use self::nifti_file::NiftiLoader;

use crate::enums::{AxisDirection, SortBy};
use crate::error::{Error, Result};
use crate::volume::Volume;

use log::debug;
use std::path::Path;

/// Anything that can turn a path into a [`Volume`]
pub trait LoadVolume {
    fn load(&self, path: &Path) -> Result<Volume>;
}

/// Options for the combined loader
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderOptions {
    /// Ordering of DICOM slices along the stacking axis
    pub sort_by: SortBy,
}

/// Picks the reader from the path: directories are DICOM series, `.nii` and
/// `.nii.gz` files are NIfTI
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeLoader {
    options: LoaderOptions,
}

impl VolumeLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }
}

impl LoadVolume for VolumeLoader {
    fn load(&self, path: &Path) -> Result<Volume> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let volume = if path.is_dir() {
            DicomLoader::load_from_directory(path, self.options.sort_by)?
        } else if is_nifti_path(path) {
            NiftiLoader::load(path)?
        } else {
            return Err(Error::UnsupportedFormat(path.to_path_buf()));
        };

        debug!(
            "loaded {} with shape {:?} and spacing {:?}",
            path.display(),
            volume.dim(),
            volume.spacing()
        );
        Ok(volume)
    }
}

fn is_nifti_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_ascii_lowercase())
        .is_some_and(|name| name.ends_with(".nii") || name.ends_with(".nii.gz"))
}

/// Closest anatomical direction of each voxel axis.
///
/// `columns[j]` is the RAS world vector voxel axis `j` steps along. The largest
/// remaining component is assigned first, so every world axis is used exactly
/// once even for oblique acquisitions.
pub(crate) fn axis_codes_from_columns(columns: [[f64; 3]; 3]) -> [AxisDirection; 3] {
    let mut codes = AxisDirection::CANONICAL;
    let mut free_voxel = [true; 3];
    let mut free_world = [true; 3];

    for _ in 0..3 {
        let mut best: Option<(usize, usize, f64)> = None;
        for (voxel, column) in columns.iter().enumerate() {
            for (world, &value) in column.iter().enumerate() {
                if !free_voxel[voxel] || !free_world[world] {
                    continue;
                }
                if best.is_none_or(|(_, _, b)| value.abs() > b.abs()) {
                    best = Some((voxel, world, value));
                }
            }
        }

        if let Some((voxel, world, value)) = best {
            codes[voxel] = AxisDirection::from_world_axis(world, value >= 0.0);
            free_voxel[voxel] = false;
            free_world[world] = false;
        }
    }

    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::AxisDirection::*;

    #[test]
    fn identity_columns_are_canonical() {
        let codes = axis_codes_from_columns([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(codes, AxisDirection::CANONICAL);
    }

    #[test]
    fn flipped_and_swapped_columns() {
        let codes =
            axis_codes_from_columns([[0.0, -0.9, 0.1], [-1.0, 0.0, 0.0], [0.0, 0.2, -2.0]]);
        assert_eq!(codes, [Posterior, Left, Inferior]);
    }

    #[test]
    fn oblique_columns_stay_a_permutation() {
        let codes =
            axis_codes_from_columns([[0.7, 0.7, 0.0], [0.7, 0.71, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(codes, [Right, Anterior, Superior]);
    }

    #[test]
    fn nifti_extensions() {
        assert!(is_nifti_path(Path::new("/data/brain.nii")));
        assert!(is_nifti_path(Path::new("brain.NII.GZ")));
        assert!(!is_nifti_path(Path::new("brain.mgz")));
    }

    #[test]
    fn missing_and_unsupported_inputs() {
        let loader = VolumeLoader::default();
        let missing = loader.load(Path::new("/nonexistent/brain.nii")).unwrap_err();
        assert!(matches!(missing, Error::FileNotFound(_)));

        let file = tempfile::Builder::new().suffix(".mgz").tempfile().unwrap();
        let unsupported = loader.load(file.path()).unwrap_err();
        assert!(matches!(unsupported, Error::UnsupportedFormat(_)));
    }
}
