//! Command line front end: turn NIfTI files or DICOM directories into GIFs.

use clap::{Parser, ValueEnum};
use log::error;
use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use volume_gif::{
    ColormapRegistry, ConversionOptions, GifWriter, LoaderOptions, SortBy, TimingConvention,
    VolumeLoader, pipeline::DEFAULT_MAX_CUBE_DIM, write_gif_depth, write_gif_normal,
    write_gif_pseudocolor, write_gif_rgb,
};

#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// Input NIfTI files or DICOM directories. The rgb mode takes exactly three.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Kind of animation to produce
    #[arg(short, long, value_enum, default_value_t = Mode::Normal)]
    mode: Mode,

    /// Resize factor in (0, 1], also scales the frame rate
    #[arg(short, long, default_value_t = 1.0, value_parser = parse_size)]
    size: f32,

    /// Frames per second
    #[arg(long, default_value_t = 18.0)]
    fps: f32,

    /// Colormap for the pseudocolor mode, append `_r` to reverse it
    #[arg(long, default_value = "hot")]
    cmap: String,

    /// Only render every n-th slice
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    frameskip: u64,

    /// Isotropic voxel size in mm for the normal mode, finest native spacing if omitted
    #[arg(long)]
    target_spacing: Option<f32>,

    /// Refuse volumes whose padded cube is larger than this many voxels per side
    #[arg(long, default_value_t = DEFAULT_MAX_CUBE_DIM)]
    max_dim: usize,

    /// Slice ordering for DICOM directories
    #[arg(long, value_enum, default_value_t = SortKey::Position)]
    sort_by: SortKey,

    /// Encoder version as `major.minor`, older than 2.29 expects a frame rate instead of a duration
    #[arg(long, value_parser = parse_version)]
    encoder_version: Option<(u32, u32)>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Normal,
    Depth,
    Rgb,
    Pseudocolor,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortKey {
    Position,
    Table,
    Instance,
    None,
}

impl From<SortKey> for SortBy {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Position => SortBy::ImagePositionPatient,
            SortKey::Table => SortBy::TablePosition,
            SortKey::Instance => SortBy::InstanceNumber,
            SortKey::None => SortBy::None,
        }
    }
}

fn parse_size(value: &str) -> Result<f32, String> {
    let size: f32 = value.parse().map_err(|e| format!("{e}"))?;
    if size > 0.0 && size <= 1.0 {
        Ok(size)
    } else {
        Err(format!("{size} is not in (0, 1]"))
    }
}

fn parse_version(value: &str) -> Result<(u32, u32), String> {
    let mut parts = value.split('.');
    let mut next = || -> Result<u32, String> {
        parts
            .next()
            .unwrap_or("0")
            .parse()
            .map_err(|e| format!("invalid version \"{value}\": {e}"))
    };
    Ok((next()?, next()?))
}

/// stderrlog level: 0 is errors only, 1 adds warnings and so on
fn log_verbosity(quiet: bool, verbose: u8) -> usize {
    if quiet { 0 } else { usize::from(verbose) + 1 }
}

fn run(args: &Args) -> volume_gif::Result<Vec<PathBuf>> {
    let loader = VolumeLoader::new(LoaderOptions {
        sort_by: args.sort_by.into(),
    });
    let writer = match args.encoder_version {
        Some(version) => GifWriter::for_encoder_version(version),
        None => GifWriter::new(TimingConvention::default()),
    };
    let options = ConversionOptions {
        size: args.size,
        fps: args.fps,
        frameskip: args.frameskip as usize,
        target_spacing: args.target_spacing,
        max_cube_dim: Some(args.max_dim),
    };

    match args.mode {
        Mode::Rgb => Ok(vec![write_gif_rgb(&loader, &writer, &args.inputs, &options)?]),
        Mode::Normal => args
            .inputs
            .iter()
            .map(|input| write_gif_normal(&loader, &writer, input, &options))
            .collect(),
        Mode::Depth => args
            .inputs
            .iter()
            .map(|input| write_gif_depth(&loader, &writer, input, &options))
            .collect(),
        Mode::Pseudocolor => {
            let registry = ColormapRegistry::default();
            args.inputs
                .iter()
                .map(|input| {
                    write_gif_pseudocolor(&loader, &writer, input, &args.cmap, &registry, &options)
                })
                .collect()
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(log_verbosity(args.quiet, args.verbose))
        .init()
        .unwrap_or_else(|e| eprintln!("Error! {e}"));

    match run(&args) {
        Ok(outputs) => {
            for output in outputs {
                println!("{}", output.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_still_logs_errors() {
        let args = Args::try_parse_from(["volume-gif", "-q", "-vv", "scan.nii"]).unwrap();
        assert!(args.quiet);
        assert_eq!(log_verbosity(args.quiet, args.verbose), 0);
    }

    #[test]
    fn default_verbosity_shows_warnings() {
        let args = Args::try_parse_from(["volume-gif", "scan.nii"]).unwrap();
        assert_eq!(log_verbosity(args.quiet, args.verbose), 1);
        assert_eq!(log_verbosity(false, 2), 3);
    }

    #[test]
    fn size_outside_unit_interval_is_rejected() {
        assert_eq!(parse_size("0.5"), Ok(0.5));
        assert!(parse_size("0").is_err());
        assert!(parse_size("1.5").is_err());
    }

    #[test]
    fn version_defaults_minor_to_zero() {
        assert_eq!(parse_version("2.28"), Ok((2, 28)));
        assert_eq!(parse_version("3"), Ok((3, 0)));
        assert!(parse_version("two").is_err());
    }
}
