//! # volume-gif
//!
//! Turn volumetric scans into animated GIFs for a quick look at the data.
//!
//! A scan is loaded from a NIfTI file or a directory of DICOM slices, padded
//! into a cube and rescaled to 8 bit. Every frame of the animation then shows
//! the sagittal, coronal and axial slice at one depth index side by side.
//! Four flavours are available:
//!  - Normal: grayscale, resampled to isotropic voxels first
//!  - Depth: three neighbouring slices as red, green and blue
//!  - RGB: three different scans as red, green and blue
//!  - Pseudocolor: grayscale passed through a named colormap
//!
//! All processing happens in memory and each conversion writes a single file.
//! The output lands next to the input and is named after it, e.g.
//! `brain.nii.gz` becomes `brain.gif`, `brain_depth.gif` or `brain_hot.gif`.
//!
//! # Examples
//!
//! ## Writing a grayscale mosaic
//!
//! ```no_run
//! # use volume_gif::{ConversionOptions, GifWriter, VolumeLoader, write_gif_normal};
//! # use std::path::Path;
//! let output = write_gif_normal(
//!     &VolumeLoader::default(),
//!     &GifWriter::default(),
//!     Path::new("brain.nii.gz"),
//!     &ConversionOptions::default(),
//! )
//! .expect("should have written brain.gif");
//! ```
//!
//! ## Composing frames by hand
//!
//! ```no_run
//! # use volume_gif::{ColormapRegistry, NormalizeOptions, VolumeLoader, LoadVolume};
//! # use volume_gif::{apply_named_colormap, create_mosaic_normal, normalize_anisotropic};
//! # use std::path::Path;
//! let volume = VolumeLoader::default().load(Path::new("brain.nii")).unwrap();
//! let cube = normalize_anisotropic(&volume, &NormalizeOptions::default()).unwrap();
//! let mosaic = create_mosaic_normal(&cube, 2).unwrap();
//! let colored = apply_named_colormap(&mosaic, "bone", &ColormapRegistry::default()).unwrap();
//! ```

pub mod colormap;
pub mod encoder;
pub mod enums;
pub mod error;
mod interpolator;
pub mod mosaic;
pub mod pipeline;
pub mod volume;
pub mod volume_loader;

pub use colormap::{Colormap, ColormapRegistry, apply_colormap, apply_named_colormap};
pub use encoder::{AnimationEncoder, GifWriter};
pub use enums::{AxisDirection, Orientation, SortBy, TimingConvention};
pub use error::{Error, ErrorKind, Result};
pub use mosaic::{
    ColorMosaic, Mosaic, create_mosaic_depth, create_mosaic_normal, create_mosaic_rgb,
};
pub use pipeline::{
    ConversionOptions, write_gif_depth, write_gif_normal, write_gif_pseudocolor, write_gif_rgb,
};
pub use volume::{
    NormalizeOptions, NormalizedVolume, Volume, normalize_anisotropic, normalize_isotropic,
};
pub use volume_loader::{DicomLoader, LoadVolume, LoaderOptions, NiftiLoader, VolumeLoader};
