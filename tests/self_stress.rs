use ndarray::Array2;
use trusskit::{
    assemble, combine_self_stress, point, segment, AssemblyInput, CrossSection, ElementSpec,
    ElementKind, SelfStressError, Settings, Structure, Support,
};

/// Square with both diagonals, one corner pinned and one on rollers so the
/// frame is statically determinate from outside.
fn braced_square() -> Structure {
    let corners = [
        point(0.0, 0.0, 0.0),
        point(3.0, 0.0, 0.0),
        point(3.0, 3.0, 0.0),
        point(0.0, 3.0, 0.0),
    ];
    let cable = CrossSection::asymmetric(5.0e-5, 1.6e11, 1.0);
    let strut = CrossSection::new(2.0e-4, 2.1e11);
    let mut elements: Vec<ElementSpec> = (0..4)
        .map(|i| ElementSpec::new(segment(corners[i], corners[(i + 1) % 4]), strut))
        .collect();
    elements.push(
        ElementSpec::new(segment(corners[0], corners[2]), cable).with_kind(ElementKind::TensionOnly),
    );
    elements.push(
        ElementSpec::new(segment(corners[1], corners[3]), cable).with_kind(ElementKind::TensionOnly),
    );
    let input = AssemblyInput::new(elements).with_supports([
        Support::new(corners[0], [true, true, true]),
        Support::new(corners[1], [false, true, true]),
        Support::new(corners[2], [false, false, true]),
        Support::new(corners[3], [false, false, true]),
    ]);
    assemble(&input, &Settings::default()).expect("square assembles")
}

/// Sides in compression, diagonals in tension.
fn square_mode() -> Vec<f64> {
    let diagonal = std::f64::consts::SQRT_2;
    vec![-1.0, -1.0, -1.0, -1.0, diagonal, diagonal]
}

#[test]
fn braced_square_mode_prestresses_cables() {
    let structure = braced_square();
    let modes = Array2::from_shape_vec((1, 6), square_mode()).expect("shape");
    let stressed = combine_self_stress(&structure, &modes, &[2_000.0], &Settings::default())
        .expect("mode is self-equilibrated");

    let mode = square_mode();
    for (index, element) in stressed.elements().enumerate() {
        assert_eq!(element.tension, mode[index] * 2_000.0);
        let original = structure.element(index).expect("element");
        if element.kind == ElementKind::TensionOnly {
            assert!(element.free_length < original.free_length);
        } else {
            assert!(element.free_length > original.free_length);
        }
    }
}

#[test]
fn split_levels_match_single_level() {
    let structure = braced_square();
    let mode = square_mode();
    let mut twice = mode.clone();
    twice.extend(&mode);
    let single = Array2::from_shape_vec((1, 6), mode).expect("shape");
    let double = Array2::from_shape_vec((2, 6), twice).expect("shape");

    let settings = Settings::default();
    let once = combine_self_stress(&structure, &single, &[1_000.0], &settings).expect("accepted");
    let split =
        combine_self_stress(&structure, &double, &[250.0, 750.0], &settings).expect("accepted");

    for (a, b) in once.elements().zip(split.elements()) {
        assert!((a.tension - b.tension).abs() < 1.0e-9);
    }
}

#[test]
fn single_side_is_not_a_self_stress() {
    let structure = braced_square();
    let mut modes = Array2::zeros((1, 6));
    modes[[0, 2]] = 1.0;
    let error = combine_self_stress(&structure, &modes, &[10.0], &Settings::default())
        .expect_err("side 2 alone pulls on free axes");
    assert!(matches!(error, SelfStressError::NotSelfEquilibrated { .. }));
}

#[test]
fn tighter_tolerance_is_honoured() {
    let structure = braced_square();
    let mut mode = square_mode();
    // Perturb one diagonal slightly so the residual is small but not negligible.
    mode[4] += 1.0e-4;
    let modes = Array2::from_shape_vec((1, 6), mode).expect("shape");

    let loose = Settings::default();
    assert!(combine_self_stress(&structure, &modes, &[1.0], &loose).is_ok());

    let strict = Settings {
        self_stress_tolerance: 1.0e-6,
        ..Settings::default()
    };
    assert!(combine_self_stress(&structure, &modes, &[1.0], &strict).is_err());
}
