use super::axis_codes_from_columns;
use crate::enums::SortBy;
use crate::error::{Error, Result};
use crate::volume::Volume;

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use log::{debug, warn};
use ndarray::{Array2, Array3, s};
use std::{fs, path::Path};

pub struct DicomLoader;

impl DicomLoader {
    /// Load a volume from DICOM objects
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found, dimensions are inconsistent or
    /// no object carries pixel spacing and slice thickness
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<Volume> {
        let mut images_with_order: Vec<_> = dicom_objects
            .iter()
            .filter_map(|dicom_object| Self::extract_image_with_order(dicom_object, &sort_by))
            .collect();

        if images_with_order.is_empty() {
            return Err(Error::NoValidImages);
        }
        if images_with_order.len() < dicom_objects.len() {
            warn!(
                "skipped {} of {} DICOM objects without decodable pixel data or sort key",
                dicom_objects.len() - images_with_order.len(),
                dicom_objects.len()
            );
        }

        Self::sort_images(&mut images_with_order, sort_by);

        let images: Vec<_> = images_with_order
            .into_iter()
            .map(|(_, image)| image)
            .collect();

        Self::validate_dimensions(&images)?;

        let volume_array = Self::build_volume_array(&images);
        let spacing = Self::get_spacing(dicom_objects).ok_or(Error::MissingSpacing)?;
        let orientation = axis_codes_from_columns(Self::get_axis_vectors(dicom_objects, sort_by));
        debug!("DICOM series orientation {orientation:?}");

        Ok(Volume::new(volume_array, spacing)?.with_orientation(orientation))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(paths: &[impl AsRef<Path>], sort_by: SortBy) -> Result<Volume> {
        let objects: core::result::Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(path: impl AsRef<Path>, sort_by: SortBy) -> Result<Volume> {
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(core::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(Error::NoValidImages);
        }

        Self::load_from_file_paths(&paths, sort_by)
    }

    fn extract_image_with_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<(Option<f32>, Array2<f32>)> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let image_2d = Self::decode_image(dicom_object)?;
        Some((order, image_2d))
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<Option<f32>> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                Some(pos.get(2).copied())
            }
            SortBy::TablePosition => {
                let pos = dicom_object
                    .element(tags::TABLE_POSITION)
                    .ok()?
                    .to_float32()
                    .ok();
                Some(pos)
            }
            SortBy::InstanceNumber => {
                let num = dicom_object
                    .element(tags::INSTANCE_NUMBER)
                    .ok()?
                    .to_int::<i32>()
                    .ok()
                    .map(|n| n as f32);
                Some(num)
            }
            SortBy::None => Some(Some(0.0)),
        }
    }

    /// First frame of the pixel data as (rows, columns)
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<f32>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
        pixel_data
            .to_ndarray_with_options::<u16>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]).mapv(f32::from))
    }

    fn sort_images(images_with_order: &mut [(Option<f32>, Array2<f32>)], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            images_with_order
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        }

        if matches!(sort_by, SortBy::ImagePositionPatient) {
            images_with_order.reverse();
        }
    }

    fn validate_dimensions(images: &[Array2<f32>]) -> Result<()> {
        let first_dim = images[0].dim();
        if images.iter().any(|img| img.dim() != first_dim) {
            return Err(Error::InconsistentDimensions);
        }
        Ok(())
    }

    /// Stack the slices into `[column, row, slice]` order
    fn build_volume_array(images: &[Array2<f32>]) -> Array3<f32> {
        let (height, width) = images[0].dim();
        let depth = images.len();
        let mut volume = Array3::<f32>::zeros((width, height, depth));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![.., .., i]).assign(&image.t());
        }

        volume
    }

    /// Spacing along (columns, rows, slices)
    fn get_spacing(dicom_objects: &[FileDicomObject<InMemDicomObject>]) -> Option<(f32, f32, f32)> {
        dicom_objects.iter().find_map(|dicom_object| {
            let pixel_spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float32()
                .ok()?;

            let slice_thickness = dicom_object
                .element(tags::SLICE_THICKNESS)
                .ok()?
                .to_float32()
                .ok()?;

            // PixelSpacing is (between rows, between columns)
            Some((*pixel_spacing.get(1)?, *pixel_spacing.first()?, slice_thickness))
        })
    }

    /// RAS vectors of the column, row and slice axes.
    ///
    /// Falls back to a standard axial acquisition when no object carries
    /// ImageOrientationPatient.
    fn get_axis_vectors(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> [[f64; 3]; 3] {
        let cosines = dicom_objects
            .iter()
            .find_map(|dicom_object| {
                let iop = dicom_object
                    .element(tags::IMAGE_ORIENTATION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                (iop.len() == 6).then(|| iop.iter().map(|&v| f64::from(v)).collect::<Vec<_>>())
            })
            .unwrap_or_else(|| vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);

        Self::axis_vectors_from_cosines(&cosines, sort_by)
    }

    fn axis_vectors_from_cosines(cosines: &[f64], sort_by: SortBy) -> [[f64; 3]; 3] {
        // DICOM patient space is LPS
        let to_ras = |v: &[f64]| [-v[0], -v[1], v[2]];
        let row = to_ras(&cosines[0..3]);
        let column = to_ras(&cosines[3..6]);

        let slice = match sort_by {
            // sorted by descending z, so slices step toward the feet
            SortBy::ImagePositionPatient => [0.0, 0.0, -1.0],
            _ => [
                row[1] * column[2] - row[2] * column[1],
                row[2] * column[0] - row[0] * column[2],
                row[0] * column[1] - row[1] * column[0],
            ],
        };

        [row, column, slice]
    }
}
