//! Geometric and numeric guarantees of normalisation and composition

use ndarray::{Array, Array3};
use rstest::{fixture, rstest};
use volume_gif::{
    ColormapRegistry, Error, ErrorKind, NormalizeOptions, NormalizedVolume, Volume,
    apply_named_colormap, create_mosaic_depth, create_mosaic_normal, create_mosaic_rgb,
    normalize_anisotropic, normalize_isotropic,
};

fn ramp(shape: (usize, usize, usize)) -> Array3<f32> {
    Array::from_shape_fn(shape, |(x, y, z)| ((x * 3 + y * 5 + z * 7) % 97 + 1) as f32)
}

fn cube(n: usize) -> NormalizedVolume {
    NormalizedVolume::from_cube(Array::from_shape_fn((n, n, n), |(x, y, z)| {
        ((x + 2 * y + 3 * z) % 255) as u8 + 1
    }))
}

#[fixture]
fn registry() -> ColormapRegistry {
    ColormapRegistry::default()
}

#[rstest]
#[case((8, 8, 8))]
#[case((9, 4, 6))]
#[case((3, 10, 7))]
#[case((1, 1, 5))]
fn isotropic_cube_is_centered(#[case] shape: (usize, usize, usize)) {
    let volume = Volume::new(ramp(shape), (1.5, 1.5, 1.5)).unwrap();
    let normalized = normalize_isotropic(volume, &NormalizeOptions::default()).unwrap();

    let n = shape.0.max(shape.1).max(shape.2);
    assert_eq!(normalized.dim(), n);
    assert_eq!(normalized.data().iter().copied().max(), Some(255));

    let offsets = [(n - shape.0) / 2, (n - shape.1) / 2, (n - shape.2) / 2];
    let lengths = [shape.0, shape.1, shape.2];
    for ((x, y, z), &v) in normalized.data().indexed_iter() {
        let inside = [x, y, z]
            .iter()
            .zip(offsets.iter().zip(lengths.iter()))
            .all(|(&i, (&o, &l))| i >= o && i < o + l);
        assert_eq!(inside, v > 0, "voxel {:?}", (x, y, z));
    }
}

#[rstest]
#[case((4, 4, 4), (1, 2, 3))]
#[case((5, 2, 3), (0, 1, 2))]
#[case((2, 7, 4), (1, 6, 0))]
fn single_voxel_lands_where_centering_predicts(
    #[case] shape: (usize, usize, usize),
    #[case] voxel: (usize, usize, usize),
) {
    let mut data = Array3::<f32>::zeros(shape);
    data[[voxel.0, voxel.1, voxel.2]] = 1.0;
    let volume = Volume::new(data, (1.0, 1.0, 1.0)).unwrap();

    let n = shape.0.max(shape.1).max(shape.2);
    let expected = (
        voxel.0 + (n - shape.0) / 2,
        voxel.1 + (n - shape.1) / 2,
        voxel.2 + (n - shape.2) / 2,
    );

    for normalized in [
        normalize_isotropic(volume.clone(), &NormalizeOptions::default()).unwrap(),
        normalize_anisotropic(&volume, &NormalizeOptions::default()).unwrap(),
    ] {
        let lit: Vec<_> = normalized
            .data()
            .indexed_iter()
            .filter(|(_, v)| **v > 0)
            .map(|(idx, v)| (idx, *v))
            .collect();
        assert_eq!(lit, vec![(expected, 255)]);
    }
}

#[rstest]
fn all_zero_volume_is_a_data_error() {
    let volume = Volume::new(Array3::zeros((4, 5, 6)), (1.0, 1.0, 1.0)).unwrap();

    let err = normalize_isotropic(volume.clone(), &NormalizeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::DegenerateVolume(_)));
    assert_eq!(err.kind(), ErrorKind::Data);

    let err = normalize_anisotropic(&volume, &NormalizeOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Data);
}

#[rstest]
fn non_uniform_spacing_does_not_crash() {
    let volume = Volume::new(ramp((12, 10, 3)), (0.8, 0.9, 3.3)).unwrap();
    let normalized = normalize_isotropic(volume, &NormalizeOptions::default()).unwrap();
    // 3 slices of 3.3mm at 0.8mm become 12
    assert_eq!(normalized.dim(), 12);
    assert_eq!(normalized.data().iter().copied().max(), Some(255));
}

#[rstest]
fn frame_count_matches_stride(
    #[values(1, 2, 17, 64, 128)] n: usize,
    #[values(1, 2, 3, 5)] frameskip: usize,
) {
    let volume = cube(n);
    let mosaic = create_mosaic_normal(&volume, frameskip).unwrap();

    assert_eq!(mosaic.len(), n.div_ceil(frameskip));
    assert!(mosaic.frames().iter().all(|f| f.dim() == (n, 3 * n)));
}

#[rstest]
fn depth_keeps_frame_count(#[values(8, 17, 32)] n: usize, #[values(1, 2)] frameskip: usize) {
    let volume = cube(n);
    let normal = create_mosaic_normal(&volume, frameskip).unwrap();
    let depth = create_mosaic_depth(&volume, frameskip).unwrap();

    assert_eq!(depth.len(), normal.len());
    let tail = &depth.frames()[depth.len() - 3..];
    assert!(tail.iter().all(|f| f.iter().all(|&v| v == 0)));
    assert!(depth.frames()[0].iter().any(|&v| v > 0));
}

#[rstest]
fn rgb_requires_matching_cubes() {
    let err = create_mosaic_rgb(&cube(64), &cube(64), &cube(32), 1).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            red: 64,
            green: 64,
            blue: 32
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[rstest]
fn unknown_colormap_is_a_config_error(registry: ColormapRegistry) {
    let mosaic = create_mosaic_normal(&cube(8), 1).unwrap();
    let err = apply_named_colormap(&mosaic, "not_a_colormap", &registry).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[rstest]
#[case("hot")]
#[case("bone")]
#[case("jet_r")]
fn known_colormap_gives_three_channels(registry: ColormapRegistry, #[case] name: &str) {
    let mosaic = create_mosaic_normal(&cube(8), 3).unwrap();
    let colored = apply_named_colormap(&mosaic, name, &registry).unwrap();

    assert_eq!(colored.len(), mosaic.len());
    assert!(colored.frames().iter().all(|f| f.dim() == (8, 24, 3)));
}
