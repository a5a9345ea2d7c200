/// The three anatomical viewing planes shown side by side in a mosaic frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Sagittal,
    Coronal,
    Axial,
}

impl Orientation {
    /// Panels in the order they appear from left to right
    pub const PANELS: [Orientation; 3] = [
        Orientation::Sagittal,
        Orientation::Coronal,
        Orientation::Axial,
    ];

    /// The cube axis that is held fixed to extract this plane
    pub fn axis(&self) -> usize {
        match self {
            Orientation::Sagittal => 0,
            Orientation::Coronal => 1,
            Orientation::Axial => 2,
        }
    }
}

/// Direction in which a voxel axis increases, in patient space
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisDirection {
    Right,
    Left,
    Anterior,
    Posterior,
    Superior,
    Inferior,
}

impl AxisDirection {
    /// Canonical RAS+ labelling: axis 0 toward Right, 1 toward Anterior, 2 toward Superior
    pub const CANONICAL: [AxisDirection; 3] = [
        AxisDirection::Right,
        AxisDirection::Anterior,
        AxisDirection::Superior,
    ];

    /// Build from a world axis index (0 = x, 1 = y, 2 = z in RAS) and a sign
    pub fn from_world_axis(world_axis: usize, positive: bool) -> Self {
        match (world_axis, positive) {
            (0, true) => AxisDirection::Right,
            (0, false) => AxisDirection::Left,
            (1, true) => AxisDirection::Anterior,
            (1, false) => AxisDirection::Posterior,
            (2, false) => AxisDirection::Inferior,
            _ => AxisDirection::Superior,
        }
    }

    /// Index of the RAS world axis this direction runs along
    pub fn world_axis(&self) -> usize {
        match self {
            AxisDirection::Right | AxisDirection::Left => 0,
            AxisDirection::Anterior | AxisDirection::Posterior => 1,
            AxisDirection::Superior | AxisDirection::Inferior => 2,
        }
    }

    /// Whether the axis increases along the positive RAS direction
    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            AxisDirection::Right | AxisDirection::Anterior | AxisDirection::Superior
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}

/// How the encoder expects frame timing to be expressed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimingConvention {
    /// Explicit per-frame duration in whole milliseconds
    #[default]
    FrameDuration,
    /// A frames-per-second rate
    FramesPerSecond,
}

impl TimingConvention {
    /// Pick the convention an encoder of the given `(major, minor)` version understands.
    ///
    /// Encoders newer than 2.28 take a frame duration, older ones take a rate.
    pub fn for_encoder_version(version: (u32, u32)) -> Self {
        if version > (2, 28) {
            TimingConvention::FrameDuration
        } else {
            TimingConvention::FramesPerSecond
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_axis_round_trip() {
        for direction in [
            AxisDirection::Right,
            AxisDirection::Left,
            AxisDirection::Anterior,
            AxisDirection::Posterior,
            AxisDirection::Superior,
            AxisDirection::Inferior,
        ] {
            let rebuilt =
                AxisDirection::from_world_axis(direction.world_axis(), direction.is_positive());
            assert_eq!(rebuilt, direction);
        }
    }

    #[test]
    fn timing_convention_follows_version() {
        assert_eq!(
            TimingConvention::for_encoder_version((2, 31)),
            TimingConvention::FrameDuration
        );
        assert_eq!(
            TimingConvention::for_encoder_version((2, 28)),
            TimingConvention::FramesPerSecond
        );
        assert_eq!(
            TimingConvention::for_encoder_version((3, 0)),
            TimingConvention::FrameDuration
        );
    }
}
