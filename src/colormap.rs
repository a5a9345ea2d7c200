//! Named colour transfer functions and their application to grayscale mosaics
//!
//! A [`Colormap`] maps a value in `[0, 1]` to RGBA. Colormaps are looked up by
//! name in a [`ColormapRegistry`], which comes pre-populated with the common
//! piecewise-linear maps (`gray`, `hot`, `bone`, `jet`, ...). Any registered
//! name can be suffixed with `_r` to get the reversed map.

use crate::error::{Error, Result};
use crate::mosaic::{ColorMosaic, Mosaic};

use log::debug;
use ndarray::Array3;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A colour transfer function over `[0, 1]`
pub trait Colormap: Send + Sync {
    /// RGBA components, each in `[0, 1]`
    fn rgba(&self, value: f64) -> [f64; 4];
}

/// Anchor `(x, y_below, y_above)` of a piecewise-linear channel
pub type Anchor = (f64, f64, f64);

/// Channels interpolated linearly between anchors, allowing jumps where
/// `y_below != y_above`
#[derive(Debug, Clone, Copy)]
pub struct SegmentedColormap {
    red: &'static [Anchor],
    green: &'static [Anchor],
    blue: &'static [Anchor],
}

impl SegmentedColormap {
    pub const fn new(
        red: &'static [Anchor],
        green: &'static [Anchor],
        blue: &'static [Anchor],
    ) -> Self {
        Self { red, green, blue }
    }

    fn channel(anchors: &[Anchor], value: f64) -> f64 {
        let Some(&(_, _, first)) = anchors.first() else {
            return 0.0;
        };
        // a single anchor is a constant channel
        if value <= 0.0 || anchors.len() == 1 {
            return first;
        }

        // first anchor at or beyond `value`, interpolate from the one before it
        let upper = anchors
            .iter()
            .position(|&(x, _, _)| x >= value)
            .unwrap_or(anchors.len() - 1)
            .max(1);
        let (x0, _, y0) = anchors[upper - 1];
        let (x1, y1, _) = anchors[upper];

        let t = if x1 > x0 { (value - x0) / (x1 - x0) } else { 1.0 };
        (y0 + t.min(1.0) * (y1 - y0)).clamp(0.0, 1.0)
    }
}

impl Colormap for SegmentedColormap {
    fn rgba(&self, value: f64) -> [f64; 4] {
        [
            Self::channel(self.red, value),
            Self::channel(self.green, value),
            Self::channel(self.blue, value),
            1.0,
        ]
    }
}

/// Channels given as closed-form functions, clipped to `[0, 1]`
#[derive(Debug, Clone, Copy)]
pub struct FunctionColormap {
    red: fn(f64) -> f64,
    green: fn(f64) -> f64,
    blue: fn(f64) -> f64,
}

impl FunctionColormap {
    pub const fn new(red: fn(f64) -> f64, green: fn(f64) -> f64, blue: fn(f64) -> f64) -> Self {
        Self { red, green, blue }
    }
}

impl Colormap for FunctionColormap {
    fn rgba(&self, value: f64) -> [f64; 4] {
        [
            (self.red)(value).clamp(0.0, 1.0),
            (self.green)(value).clamp(0.0, 1.0),
            (self.blue)(value).clamp(0.0, 1.0),
            1.0,
        ]
    }
}

/// Another colormap read from the top down
struct Reversed(Arc<dyn Colormap>);

impl Colormap for Reversed {
    fn rgba(&self, value: f64) -> [f64; 4] {
        self.0.rgba(1.0 - value)
    }
}

const GRAY: SegmentedColormap = SegmentedColormap::new(
    &[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0)],
    &[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0)],
    &[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0)],
);

const BINARY: SegmentedColormap = SegmentedColormap::new(
    &[(0.0, 1.0, 1.0), (1.0, 0.0, 0.0)],
    &[(0.0, 1.0, 1.0), (1.0, 0.0, 0.0)],
    &[(0.0, 1.0, 1.0), (1.0, 0.0, 0.0)],
);

const HOT: SegmentedColormap = SegmentedColormap::new(
    &[(0.0, 0.0416, 0.0416), (0.365079, 1.0, 1.0), (1.0, 1.0, 1.0)],
    &[
        (0.0, 0.0, 0.0),
        (0.365079, 0.0, 0.0),
        (0.746032, 1.0, 1.0),
        (1.0, 1.0, 1.0),
    ],
    &[(0.0, 0.0, 0.0), (0.746032, 0.0, 0.0), (1.0, 1.0, 1.0)],
);

const BONE: SegmentedColormap = SegmentedColormap::new(
    &[
        (0.0, 0.0, 0.0),
        (0.746032, 0.652778, 0.652778),
        (1.0, 1.0, 1.0),
    ],
    &[
        (0.0, 0.0, 0.0),
        (0.365079, 0.319444, 0.319444),
        (0.746032, 0.777778, 0.777778),
        (1.0, 1.0, 1.0),
    ],
    &[
        (0.0, 0.0, 0.0),
        (0.365079, 0.444444, 0.444444),
        (1.0, 1.0, 1.0),
    ],
);

const COPPER: SegmentedColormap = SegmentedColormap::new(
    &[(0.0, 0.0, 0.0), (0.809524, 1.0, 1.0), (1.0, 1.0, 1.0)],
    &[(0.0, 0.0, 0.0), (1.0, 0.7812, 0.7812)],
    &[(0.0, 0.0, 0.0), (1.0, 0.4975, 0.4975)],
);

const JET: SegmentedColormap = SegmentedColormap::new(
    &[
        (0.0, 0.0, 0.0),
        (0.35, 0.0, 0.0),
        (0.66, 1.0, 1.0),
        (0.89, 1.0, 1.0),
        (1.0, 0.5, 0.5),
    ],
    &[
        (0.0, 0.0, 0.0),
        (0.125, 0.0, 0.0),
        (0.375, 1.0, 1.0),
        (0.64, 1.0, 1.0),
        (0.91, 0.0, 0.0),
        (1.0, 0.0, 0.0),
    ],
    &[
        (0.0, 0.5, 0.5),
        (0.11, 1.0, 1.0),
        (0.34, 1.0, 1.0),
        (0.65, 0.0, 0.0),
        (1.0, 0.0, 0.0),
    ],
);

const COOL: FunctionColormap = FunctionColormap::new(|x| x, |x| 1.0 - x, |_| 1.0);
const SPRING: FunctionColormap = FunctionColormap::new(|_| 1.0, |x| x, |x| 1.0 - x);
const SUMMER: FunctionColormap = FunctionColormap::new(|x| x, |x| 0.5 + x / 2.0, |_| 0.4);
const AUTUMN: FunctionColormap = FunctionColormap::new(|_| 1.0, |x| x, |_| 0.0);
const WINTER: FunctionColormap = FunctionColormap::new(|_| 0.0, |x| x, |x| 1.0 - x / 2.0);
const AFMHOT: FunctionColormap =
    FunctionColormap::new(|x| 2.0 * x, |x| 2.0 * x - 0.5, |x| 2.0 * x - 1.0);
const GIST_HEAT: FunctionColormap =
    FunctionColormap::new(|x| 1.5 * x, |x| 2.0 * x - 1.0, |x| 4.0 * x - 3.0);

/// Name to colormap lookup
#[derive(Clone)]
pub struct ColormapRegistry {
    maps: BTreeMap<String, Arc<dyn Colormap>>,
}

impl ColormapRegistry {
    /// A registry with no colormaps at all
    pub fn empty() -> Self {
        Self {
            maps: BTreeMap::new(),
        }
    }

    /// Add or replace a colormap under `name`
    pub fn register(&mut self, name: impl Into<String>, colormap: impl Colormap + 'static) {
        self.maps.insert(name.into(), Arc::new(colormap));
    }

    /// Look up `name`, resolving a trailing `_r` to the reversed map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColormap`] if neither `name` nor its base is registered
    pub fn get(&self, name: &str) -> Result<Arc<dyn Colormap>> {
        if let Some(colormap) = self.maps.get(name) {
            return Ok(Arc::clone(colormap));
        }

        name.strip_suffix("_r")
            .and_then(|base| self.maps.get(base))
            .map(|base| Arc::new(Reversed(Arc::clone(base))) as Arc<dyn Colormap>)
            .ok_or_else(|| Error::UnknownColormap(name.to_string()))
    }

    /// Registered names in alphabetical order, without the `_r` variants
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}

impl Default for ColormapRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("gray", GRAY);
        registry.register("binary", BINARY);
        registry.register("hot", HOT);
        registry.register("afmhot", AFMHOT);
        registry.register("gist_heat", GIST_HEAT);
        registry.register("bone", BONE);
        registry.register("copper", COPPER);
        registry.register("jet", JET);
        registry.register("cool", COOL);
        registry.register("spring", SPRING);
        registry.register("summer", SUMMER);
        registry.register("autumn", AUTUMN);
        registry.register("winter", WINTER);
        registry
    }
}

/// 8-bit RGB for every possible 8-bit input, alpha dropped
pub fn lookup_table(colormap: &dyn Colormap) -> [[u8; 3]; 256] {
    let mut table = [[0u8; 3]; 256];
    for (value, entry) in table.iter_mut().enumerate() {
        let [r, g, b, _] = colormap.rgba(value as f64 / 255.0);
        *entry = [(255.0 * r) as u8, (255.0 * g) as u8, (255.0 * b) as u8];
    }
    table
}

/// Map every frame of a grayscale mosaic through `colormap`
pub fn apply_colormap(mosaic: &Mosaic, colormap: &dyn Colormap) -> ColorMosaic {
    let table = lookup_table(colormap);

    let frames = mosaic
        .frames()
        .par_iter()
        .map(|frame| {
            let (height, width) = frame.dim();
            Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
                table[frame[[y, x]] as usize][c]
            })
        })
        .collect();

    debug!("coloured {} frames", mosaic.len());
    ColorMosaic::from_frames(frames)
}

/// Look `name` up in `registry` and apply it
pub fn apply_named_colormap(
    mosaic: &Mosaic,
    name: &str,
    registry: &ColormapRegistry,
) -> Result<ColorMosaic> {
    let colormap = registry.get(name)?;
    Ok(apply_colormap(mosaic, colormap.as_ref()))
}
