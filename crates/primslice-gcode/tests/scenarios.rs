use approx::assert_relative_eq;
use primslice::primitives::sphere;
use primslice::{Element, InfillPattern, PrinterSettings, SlicerError, SupportType};
use primslice_gcode::{generate_composite, generate_for_element, GcodeError, PrinterProfile};

const END_PRINT: &str = "; END PRINT";

fn word(line: &str, letter: char) -> Option<f64> {
    line.split(';')
        .next()?
        .split_whitespace()
        .skip(1)
        .find(|w| w.starts_with(letter))
        .and_then(|w| w[1..].parse().ok())
}

fn is_extrusion(line: &str) -> bool {
    (line.starts_with("G1 ") || line.starts_with("G2 ") || line.starts_with("G3 "))
        && word(line, 'E').is_some()
}

/// Lines of one `;LAYER:n` block.
fn layer_block(gcode: &str, index: usize) -> Vec<&str> {
    let header = format!(";LAYER:{index}");
    gcode
        .lines()
        .skip_while(|l| *l != header)
        .skip(1)
        .take_while(|l| !l.starts_with(";LAYER:") && *l != END_PRINT)
        .collect()
}

/// Paths of a block section as point lists; each travel starts a new one.
fn paths(lines: &[&str]) -> Vec<Vec<(f64, f64)>> {
    let mut out: Vec<Vec<(f64, f64)>> = Vec::new();
    for line in lines {
        let (Some(x), Some(y)) = (word(line, 'X'), word(line, 'Y')) else {
            continue;
        };
        if line.starts_with("G0 ") {
            out.push(vec![(x, y)]);
        } else if line.starts_with("G1 ") {
            if let Some(path) = out.last_mut() {
                path.push((x, y));
            }
        }
    }
    out
}

fn assert_monotonic_e(gcode: &str) {
    let body = gcode.split(END_PRINT).next().unwrap();
    let mut last = f64::MIN;
    for line in body.lines().filter(|l| is_extrusion(l)) {
        let e = word(line, 'E').unwrap();
        assert!(e >= last, "E went backwards at '{line}'");
        last = e;
    }
    assert!(last > 0.0);
}

fn cube_json(size: f64) -> String {
    format!(
        r#"{{"type": "cube", "position": [0, 0, {}], "width": {size}, "depth": {size}, "height": {size}}}"#,
        size / 2.0
    )
}

#[test]
fn cube_has_one_block_per_layer() {
    let cube = Element::from_json_str(&cube_json(10.0)).unwrap();
    let out = generate_for_element(&cube, &PrinterSettings::default(), &PrinterProfile::generic())
        .unwrap();
    assert_eq!(out.layer_count, 50);
    assert_eq!(out.gcode.matches(";LAYER:").count(), 50);
    assert_eq!(out.gcode.matches("G92 E0").count(), 1);
}

#[test]
fn cube_outer_shell_is_forty_millimetres() {
    let settings = PrinterSettings {
        shell_count: 2,
        infill_density: 20.0,
        infill_pattern: InfillPattern::Lines,
        ..Default::default()
    };
    let tree = Element::from_json_str(&format!(
        r#"{{"type": "composite", "children": [{}]}}"#,
        cube_json(10.0)
    ))
    .unwrap();
    let out = generate_composite(&tree, &settings, &PrinterProfile::generic()).unwrap();
    assert_eq!(out.gcode.matches(";LAYER:").count(), 50);

    for index in [0, 1, 25, 49] {
        let block = layer_block(&out.gcode, index);
        let first = &paths(&block)[0];
        assert_eq!(first.len(), 5);
        assert_eq!(first.first(), first.last());
        let perimeter: f64 = first
            .windows(2)
            .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
            .sum();
        assert_relative_eq!(perimeter, 40.0, epsilon = 1e-9);
    }
    assert_monotonic_e(&out.gcode);
}

#[test]
fn sphere_slices_follow_profile() {
    let json = r#"{"type": "sphere", "position": [0, 0, 5], "radius": 5}"#;
    let element = Element::from_json_str(json).unwrap();
    let settings = PrinterSettings::default();
    let out = generate_for_element(&element, &settings, &PrinterProfile::generic()).unwrap();
    assert_eq!(out.layer_count, 50);

    let first_shell_radius = |index: usize| {
        let block = layer_block(&out.gcode, index);
        let shell = paths(&block).into_iter().next()?;
        Some((shell[0].0.powi(2) + shell[0].1.powi(2)).sqrt())
    };

    // Layer 0 samples the bottom pole.
    assert!(!layer_block(&out.gcode, 0).iter().any(|l| is_extrusion(l)));

    // Equator: the first shell starts on the 5mm circle.
    assert_relative_eq!(first_shell_radius(25).unwrap(), 5.0, epsilon = 1e-3);
    let equator = layer_block(&out.gcode, 25);
    assert!(paths(&equator)[0].len() >= 24);

    // The top layer samples z = 9.8, one layer below the top pole.
    let top = first_shell_radius(49).unwrap();
    assert_relative_eq!(top, (25.0_f64 - 4.8 * 4.8).sqrt(), epsilon = 1e-3);
    for index in 1..49 {
        assert!(first_shell_radius(index).unwrap() > top - 1e-3);
    }

    let Element::Sphere(s) = &element else {
        panic!("expected sphere");
    };
    assert!(sphere::cross_section(s, 10.0, &settings).is_empty());
    assert_monotonic_e(&out.gcode);
}

#[test]
fn torus_hole_splits_infill_lines() {
    let json = r#"{"type": "torus", "position": [0, 0, 3], "major_radius": 10, "tube_radius": 3}"#;
    let tree = Element::from_json_str(&format!(r#"{{"type": "group", "children": [{json}]}}"#))
        .unwrap();
    let out = generate_composite(&tree, &PrinterSettings::default(), &PrinterProfile::generic())
        .unwrap();

    // Layer 15 samples the equator; odd layers run infill along Y.
    let block = layer_block(&out.gcode, 15);
    let shells: Vec<&str> = block.iter().copied().take_while(|l| *l != "; infill").collect();
    let radii: Vec<f64> = paths(&shells)
        .iter()
        .map(|p| (p[0].0.powi(2) + p[0].1.powi(2)).sqrt())
        .collect();
    assert!(radii.iter().any(|r| (r - 13.0).abs() < 1e-3));
    assert!(radii.iter().any(|r| (r - 7.0).abs() < 1e-3));

    let infill: Vec<&str> = block.iter().copied().skip_while(|l| *l != "; infill").collect();
    let through_center: Vec<Vec<(f64, f64)>> = paths(&infill)
        .into_iter()
        .filter(|p| p.iter().all(|(x, _)| x.abs() < 1e-3))
        .collect();
    assert_eq!(through_center.len(), 2);
    for path in &through_center {
        assert!(path.iter().all(|(_, y)| y.abs() > 7.0));
    }
    assert_monotonic_e(&out.gcode);
}

#[test]
fn overlapping_parts_print_as_one_solid() {
    // Block B starts halfway up block A and overlaps its right half.
    let json = r#"{
        "type": "composite",
        "children": [
            {"type": "cube", "position": [0, 0, 5], "width": 10, "depth": 10, "height": 10},
            {"type": "cube", "position": [5, 0, 10], "width": 10, "depth": 10, "height": 10}
        ]
    }"#;
    let tree = Element::from_json_str(json).unwrap();
    let settings = PrinterSettings {
        support_type: SupportType::Everywhere,
        ..Default::default()
    };
    let out = generate_composite(&tree, &settings, &PrinterProfile::generic()).unwrap();
    assert_eq!(out.layer_count, 75);

    // Even layers run infill along X across both blocks without a gap.
    let block = layer_block(&out.gcode, 36);
    let infill: Vec<&str> = block.iter().copied().skip_while(|l| *l != "; infill").collect();
    let spans: Vec<f64> = paths(&infill)
        .iter()
        .map(|p| {
            let xs = p.iter().map(|(x, _)| *x);
            xs.clone().fold(f64::MIN, f64::max) - xs.fold(f64::MAX, f64::min)
        })
        .collect();
    assert!(!spans.is_empty());
    assert!(spans.iter().all(|w| (w - 13.4).abs() < 1e-3), "{spans:?}");

    // Support only stands under the part of B that hangs past A.
    for index in 0..out.layer_count {
        let block = layer_block(&out.gcode, index);
        let has_support = block.contains(&"; support");
        if index >= 25 {
            assert!(!has_support, "support inside the model on layer {index}");
            continue;
        }
        assert!(has_support, "no support under the overhang on layer {index}");
        let support: Vec<&str> = block.iter().copied().skip_while(|l| *l != "; support").collect();
        for path in paths(&support) {
            for (x, _) in path {
                assert!(x > 5.0, "support inside block A at x = {x}");
            }
        }
    }
    assert_monotonic_e(&out.gcode);
}

#[test]
fn unknown_element_prints_placeholder() {
    let json = r#"{
        "type": "composite",
        "children": [
            {"type": "mystery", "position": [0, 0, 5], "size": [4, 4, 10]},
            {"type": "cylinder", "position": [20, 0, 5], "radius": 3, "height": 10}
        ]
    }"#;
    let tree = Element::from_json_str(json).unwrap();
    let out = generate_composite(&tree, &PrinterSettings::default(), &PrinterProfile::generic())
        .unwrap();
    assert!(out
        .gcode
        .contains("; WARNING: unsupported element 'mystery' printed as bounding box"));
    assert_eq!(out.layer_count, 50);
    assert!(layer_block(&out.gcode, 10).iter().any(|l| l.starts_with("G0 X-2.000 Y-2.000")));
    assert_monotonic_e(&out.gcode);
}

#[test]
fn text_prints_placeholder_with_error() {
    let json = r#"{"type": "text", "position": [0, 0, 1], "text": "hi", "font_size": 8, "height": 2}"#;
    let element = Element::from_json_str(json).unwrap();
    let out = generate_for_element(&element, &PrinterSettings::default(), &PrinterProfile::generic())
        .unwrap();
    assert!(out.gcode.contains("; ERROR: text 'hi'"));
    assert_eq!(out.layer_count, 10);
}

#[test]
fn empty_composite_is_fatal() {
    let tree = Element::from_json_str(r#"{"type": "composite", "children": []}"#).unwrap();
    let err = generate_composite(&tree, &PrinterSettings::default(), &PrinterProfile::generic())
        .unwrap_err();
    assert!(matches!(err, GcodeError::Slicer(SlicerError::Unbounded(_))));
}

#[test]
fn support_only_under_overhang() {
    let json = r#"{
        "type": "composite",
        "children": [
            {"type": "cylinder", "position": [0, 0, 3], "radius": 2, "height": 6},
            {"type": "cube", "position": [0, 0, 7], "width": 16, "depth": 16, "height": 2}
        ]
    }"#;
    let tree = Element::from_json_str(json).unwrap();
    let settings = PrinterSettings {
        support_type: SupportType::Everywhere,
        ..Default::default()
    };
    let out = generate_composite(&tree, &settings, &PrinterProfile::generic()).unwrap();
    assert_eq!(out.layer_count, 40);

    for index in 0..out.layer_count {
        let block = layer_block(&out.gcode, index);
        let has_support = block.contains(&"; support");
        if index >= 30 {
            assert!(!has_support, "support on cap layer {index}");
            continue;
        }
        assert!(has_support, "no support under cap on layer {index}");
        let support: Vec<&str> = block.iter().copied().skip_while(|l| *l != "; support").collect();
        for path in paths(&support) {
            for (x, y) in path {
                assert!((x * x + y * y).sqrt() > 2.0, "support inside stem at ({x}, {y})");
            }
        }
    }
    assert_monotonic_e(&out.gcode);

    let without = generate_composite(&tree, &PrinterSettings::default(), &PrinterProfile::generic())
        .unwrap();
    assert!(!without.gcode.contains("; support"));
}

#[test]
fn extrusion_is_monotonic_across_features() {
    let json = r#"{
        "type": "composite",
        "children": [
            {"type": "sphere", "position": [0, 0, 6], "radius": 6},
            {"type": "component", "children": [
                {"type": "cone", "position": [20, 0, 4], "radius": 4, "height": 8},
                {"type": "line", "start": [-10, -12, 0], "end": [10, -12, 0], "width": 0.6}
            ]},
            {"type": "ellipsoid", "position": [-20, 0, 3], "radius_x": 5, "radius_y": 3, "radius_z": 3, "rotation": 30}
        ]
    }"#;
    let tree = Element::from_json_str(json).unwrap();
    for pattern in [
        InfillPattern::Grid,
        InfillPattern::Honeycomb,
        InfillPattern::Triangular,
        InfillPattern::Circular,
    ] {
        let settings = PrinterSettings {
            infill_pattern: pattern,
            support_type: SupportType::TouchingBuildplate,
            raft_layers: 1,
            solid_layers: 2,
            arc_perimeters: true,
            ..Default::default()
        };
        let out = generate_composite(&tree, &settings, &PrinterProfile::ender3()).unwrap();
        assert_monotonic_e(&out.gcode);
        assert!(out.stats.filament_grams > 0.0);
        assert!(out.stats.print_time_seconds > 0.0);
    }
}

#[test]
fn end_block_retracts_after_marker() {
    let cube = Element::from_json_str(&cube_json(2.0)).unwrap();
    let out = generate_for_element(&cube, &PrinterSettings::default(), &PrinterProfile::generic())
        .unwrap();
    let (body, end) = out.gcode.split_once(END_PRINT).unwrap();
    assert!(!body.contains("G91"));
    assert!(end.contains("G1 E-5.00000"));
    assert!(end.contains("G0 Z12.000"));
    assert!(end.trim_end().ends_with("M84 ; disable motors"));
}
