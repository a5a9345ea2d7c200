//! Result and Error types for volume-gif

use std::path::PathBuf;

/// Type alias for Result<T, volume_gif::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// Broad classes of failure, independent of the concrete variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input could not be read or is not a supported volume
    Format,
    /// Input was read but its content cannot be normalised
    Data,
    /// Caller supplied arguments that violate a precondition
    Precondition,
    /// Unknown named configuration such as a colormap
    Config,
    /// Output could not be produced or written
    Io,
}

/// The error type for the `volume-gif` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("input \"{0}\" does not exist")]
    FileNotFound(PathBuf),

    #[error("input \"{0}\" is not a NIfTI file or a DICOM directory")]
    UnsupportedFormat(PathBuf),

    #[error("failed to read NIfTI file")]
    Nifti(#[from] nifti::NiftiError),

    #[error("failed to read DICOM file")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("no valid DICOM images found")]
    NoValidImages,

    #[error("inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("missing spacing information")]
    MissingSpacing,

    #[error("expected a 3D volume, found {0} dimensions")]
    NotThreeDimensional(usize),

    #[error("volume has an empty axis (shape {0:?})")]
    EmptyVolume(Vec<usize>),

    #[error("volume is degenerate, maximum intensity is {0}")]
    DegenerateVolume(f32),

    #[error("voxel spacing must be finite and positive, found {0:?}")]
    InvalidSpacing((f32, f32, f32)),

    #[error("target spacing must be finite and positive, found {0}")]
    InvalidTargetSpacing(f32),

    #[error("size factor must be finite and positive with a non-empty result, found {0}")]
    InvalidSizeFactor(f32),

    #[error("frameskip must be at least 1")]
    InvalidFrameskip,

    #[error("frame rate must be at least 1 frame per second, found {0}")]
    InvalidFrameRate(f32),

    #[error("cube side {dim} exceeds the configured maximum of {max}")]
    CubeTooLarge { dim: usize, max: usize },

    #[error("cube dimensions differ across channels (red {red}, green {green}, blue {blue})")]
    DimensionMismatch {
        red: usize,
        green: usize,
        blue: usize,
    },

    #[error("expected {expected} input volumes, found {found}")]
    WrongInputCount { expected: usize, found: usize },

    #[error("colormap \"{0}\" is not registered")]
    UnknownColormap(String),

    #[error("failed input/output stream")]
    Io(#[from] std::io::Error),

    #[error("failed to encode animation")]
    Encode(#[from] image::ImageError),

    #[error("incompatible array shapes")]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    /// Classify the error into one of the broad [`ErrorKind`]s
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound(_)
            | Error::UnsupportedFormat(_)
            | Error::Nifti(_)
            | Error::Dicom(_)
            | Error::NoValidImages
            | Error::InconsistentDimensions
            | Error::MissingSpacing
            | Error::NotThreeDimensional(_) => ErrorKind::Format,
            Error::EmptyVolume(_) | Error::DegenerateVolume(_) => ErrorKind::Data,
            Error::InvalidSpacing(_)
            | Error::InvalidTargetSpacing(_)
            | Error::InvalidSizeFactor(_)
            | Error::InvalidFrameskip
            | Error::InvalidFrameRate(_)
            | Error::CubeTooLarge { .. }
            | Error::DimensionMismatch { .. }
            | Error::WrongInputCount { .. } => ErrorKind::Precondition,
            Error::UnknownColormap(_) => ErrorKind::Config,
            Error::Io(_) | Error::Encode(_) | Error::Shape(_) => ErrorKind::Io,
        }
    }
}
