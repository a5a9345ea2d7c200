//! End-to-end conversions: load, normalise, compose, colour, encode
//!
//! Each conversion is a single blocking call that writes exactly one GIF next
//! to its input and returns the path it wrote.

use crate::colormap::{ColormapRegistry, apply_named_colormap};
use crate::encoder::AnimationEncoder;
use crate::error::{Error, Result};
use crate::mosaic::{create_mosaic_depth, create_mosaic_normal, create_mosaic_rgb};
use crate::volume::{NormalizeOptions, normalize_anisotropic, normalize_isotropic};
use crate::volume_loader::LoadVolume;

use log::info;
use std::path::{Path, PathBuf};

/// Largest cube side allowed by default, about 4 GiB for one `f32` cube
pub const DEFAULT_MAX_CUBE_DIM: usize = 1024;

/// Settings shared by all conversions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionOptions {
    /// Resize factor for the cube, also scales the frame rate
    pub size: f32,
    /// Nominal frames per second before scaling by `size`
    pub fps: f32,
    /// Stride over depth indices
    pub frameskip: usize,
    /// Isotropic spacing for the normal conversion, finest native spacing when `None`
    pub target_spacing: Option<f32>,
    /// Largest cube side that may be allocated
    pub max_cube_dim: Option<usize>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            size: 1.0,
            fps: 18.0,
            frameskip: 1,
            target_spacing: None,
            max_cube_dim: Some(DEFAULT_MAX_CUBE_DIM),
        }
    }
}

impl ConversionOptions {
    fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            size: self.size,
            target_spacing: self.target_spacing,
            max_cube_dim: self.max_cube_dim,
        }
    }

    /// Frame rate actually written: `fps * size`, truncated
    pub fn effective_fps(&self) -> Result<u32> {
        let fps = (self.fps * self.size).trunc();
        if !fps.is_finite() || fps < 1.0 {
            return Err(Error::InvalidFrameRate(fps));
        }
        Ok(fps as u32)
    }
}

/// Grayscale mosaic of the isotropically resampled volume, written to `<base>.gif`
pub fn write_gif_normal(
    loader: &impl LoadVolume,
    encoder: &impl AnimationEncoder,
    input: &Path,
    options: &ConversionOptions,
) -> Result<PathBuf> {
    let fps = options.effective_fps()?;
    let volume = loader.load(input)?;
    let cube = normalize_isotropic(volume, &options.normalize_options())?;
    let mosaic = create_mosaic_normal(&cube, options.frameskip)?;

    let output = output_path(input, ".gif");
    encoder.encode(&output, mosaic.to_rgba_images(), fps)?;
    Ok(output)
}

/// Depth-encoded mosaic of the raw volume, written to `<base>_depth.gif`
pub fn write_gif_depth(
    loader: &impl LoadVolume,
    encoder: &impl AnimationEncoder,
    input: &Path,
    options: &ConversionOptions,
) -> Result<PathBuf> {
    let fps = options.effective_fps()?;
    let volume = loader.load(input)?;
    let cube = normalize_anisotropic(&volume, &options.normalize_options())?;
    let mosaic = create_mosaic_depth(&cube, options.frameskip)?;

    let output = output_path(input, "_depth.gif");
    encoder.encode(&output, mosaic.to_rgba_images(), fps)?;
    Ok(output)
}

/// Three volumes as red, green and blue, written to
/// `<base1>_<base2>_<base3>_rgb.gif` beside the first input
pub fn write_gif_rgb(
    loader: &impl LoadVolume,
    encoder: &impl AnimationEncoder,
    inputs: &[PathBuf],
    options: &ConversionOptions,
) -> Result<PathBuf> {
    let [red, green, blue] = inputs else {
        return Err(Error::WrongInputCount {
            expected: 3,
            found: inputs.len(),
        });
    };

    let fps = options.effective_fps()?;
    let normalize = options.normalize_options();
    let red_cube = normalize_anisotropic(&loader.load(red)?, &normalize)?;
    let green_cube = normalize_anisotropic(&loader.load(green)?, &normalize)?;
    let blue_cube = normalize_anisotropic(&loader.load(blue)?, &normalize)?;
    let mosaic = create_mosaic_rgb(&red_cube, &green_cube, &blue_cube, options.frameskip)?;

    let output = rgb_output_path(red, green, blue);
    encoder.encode(&output, mosaic.to_rgba_images(), fps)?;
    Ok(output)
}

/// Grayscale mosaic of the raw volume passed through a named colormap,
/// written to `<base>_<colormap>.gif`
pub fn write_gif_pseudocolor(
    loader: &impl LoadVolume,
    encoder: &impl AnimationEncoder,
    input: &Path,
    colormap: &str,
    registry: &ColormapRegistry,
    options: &ConversionOptions,
) -> Result<PathBuf> {
    let fps = options.effective_fps()?;
    // fail on a bad name before doing any heavy lifting
    registry.get(colormap)?;

    let volume = loader.load(input)?;
    let cube = normalize_anisotropic(&volume, &options.normalize_options())?;
    let mosaic = create_mosaic_normal(&cube, options.frameskip)?;
    let colored = apply_named_colormap(&mosaic, colormap, registry)?;

    let output = output_path(input, &format!("_{colormap}.gif"));
    encoder.encode(&output, colored.to_rgba_images(), fps)?;
    info!("applied colormap {colormap}");
    Ok(output)
}

/// Split a path into its directory and its name up to the first `.`
///
/// A DICOM directory is treated like a file whose name is the directory name.
pub fn split_base_name(path: &Path) -> (PathBuf, String) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let base = if path.is_dir() {
        name
    } else {
        name.split('.').next().unwrap_or_default().to_string()
    };
    (dir, base)
}

/// `<dir>/<base><suffix>` for an input path
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let (dir, base) = split_base_name(input);
    dir.join(format!("{base}{suffix}"))
}

/// `<dir of red>/<red>_<green>_<blue>_rgb.gif`
pub fn rgb_output_path(red: &Path, green: &Path, blue: &Path) -> PathBuf {
    let (dir, red) = split_base_name(red);
    let (_, green) = split_base_name(green);
    let (_, blue) = split_base_name(blue);
    dir.join(format!("{red}_{green}_{blue}_rgb.gif"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_stops_at_first_dot() {
        let (dir, base) = split_base_name(Path::new("/john/home/image.nii.gz"));
        assert_eq!(dir, PathBuf::from("/john/home"));
        assert_eq!(base, "image");
    }

    #[test]
    fn output_suffixes() {
        let input = Path::new("/data/sub-01_T1w.nii.gz");
        assert_eq!(output_path(input, ".gif"), PathBuf::from("/data/sub-01_T1w.gif"));
        assert_eq!(
            output_path(input, "_depth.gif"),
            PathBuf::from("/data/sub-01_T1w_depth.gif")
        );
        assert_eq!(
            output_path(input, "_hot.gif"),
            PathBuf::from("/data/sub-01_T1w_hot.gif")
        );
    }

    #[test]
    fn rgb_name_joins_all_three() {
        let path = rgb_output_path(
            Path::new("/data/t1.nii"),
            Path::new("/other/t2.nii.gz"),
            Path::new("flair.nii"),
        );
        assert_eq!(path, PathBuf::from("/data/t1_t2_flair_rgb.gif"));
    }

    #[test]
    fn relative_file_has_empty_dir() {
        assert_eq!(output_path(Path::new("scan.nii"), ".gif"), PathBuf::from("scan.gif"));
    }

    #[test]
    fn effective_fps_scales_with_size() {
        let options = ConversionOptions {
            size: 0.5,
            fps: 18.0,
            ..Default::default()
        };
        assert_eq!(options.effective_fps().unwrap(), 9);

        let options = ConversionOptions {
            size: 0.1,
            fps: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            options.effective_fps(),
            Err(Error::InvalidFrameRate(_))
        ));
    }
}
