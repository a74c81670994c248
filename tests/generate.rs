//! End-to-end scenarios: element list in, recorded sink calls and Aufmaß
//! text out.

use aushub::{GenerateError, Layer, RecordingSink, SinkOp, generate};
use insta::assert_snapshot;
use serde_json::{Value, json};

fn trench(length: f64, width: f64, depth: f64) -> Value {
    json!({"type": "Baugraben", "length": length, "width": width, "depth": depth})
}

/// Two-point outlines on a layer, for structural assertions.
fn segments(sink: &RecordingSink, layer: Layer) -> Vec<(glam::DVec2, glam::DVec2)> {
    sink.ops
        .iter()
        .filter_map(|op| match op {
            SinkOp::Outline { points, layer: l, .. } if *l == layer && points.len() == 2 => {
                Some((points[0], points[1]))
            }
            _ => None,
        })
        .collect()
}

fn vertical_segments_at(
    sink: &RecordingSink,
    layer: Layer,
    x: f64,
    y_range: (f64, f64),
) -> usize {
    segments(sink, layer)
        .iter()
        .filter(|(a, b)| {
            (a.x - b.x).abs() < 1e-9
                && (a.x - x).abs() < 1e-9
                && a.y.min(b.y) >= y_range.0 - 1e-9
                && a.y.max(b.y) <= y_range.1 + 1e-9
        })
        .count()
}

#[test]
fn single_trench_scenario() {
    let mut sink = RecordingSink::new();
    let text = generate(&mut sink, &[trench(10.0, 2.0, 1.5)]).unwrap();
    assert_snapshot!(text, @"Baugraben 1: l=10.0 m  b=2.0 m  t=1.5 m");

    // elevation: one inner + one outer contour, the soil annulus as a
    // single hatch with the inner contour as its hole
    let closed_outer = sink
        .ops
        .iter()
        .filter(|op| {
            matches!(op, SinkOp::Outline { layer: Layer::TrenchOuter, closed: true, .. })
        })
        .count();
    let closed_inner = sink
        .ops
        .iter()
        .filter(|op| {
            matches!(op, SinkOp::Outline { layer: Layer::TrenchInner, closed: true, .. })
        })
        .count();
    assert_eq!(closed_outer, 1);
    assert_eq!(closed_inner, 1);
    assert_eq!(sink.hatches_on(Layer::Soil), 1);
    let Some(SinkOp::Hatch { holes, .. }) =
        sink.ops.iter().find(|op| matches!(op, SinkOp::Hatch { .. }))
    else {
        panic!("expected soil hatch");
    };
    assert_eq!(holes.len(), 1);

    // one depth dimension in the elevation, length + width in the plan
    assert_eq!(sink.dimensions().count(), 3);
    // plan rectangle: four open edges
    assert_eq!(segments(&sink, Layer::TrenchOuter).len(), 4);
    // the Aufmaß text block is emitted with its header
    assert!(sink.ops.iter().any(|op| matches!(
        op,
        SinkOp::Text { text, .. } if text.starts_with("Aufmaß:\n")
    )));
}

#[test]
fn generate_is_deterministic() {
    let elements = [
        trench(10.0, 2.0, 1.0),
        trench(8.0, 2.5, 2.0),
        json!({"type": "Durchstich", "between": 1, "length": 1.5}),
        json!({"type": "Rohr", "for_trench": 1, "diameter": 0.15, "full_span": true}),
        json!({"type": "Oberflächenbefestigung", "for_trench": 2, "offset": 0.3}),
    ];
    let mut sink_a = RecordingSink::new();
    let text_a = generate(&mut sink_a, &elements).unwrap();
    let mut sink_b = RecordingSink::new();
    let text_b = generate(&mut sink_b, &elements).unwrap();
    assert_eq!(text_a, text_b);
    assert_eq!(sink_a, sink_b);
}

#[test]
fn passage_merge_scenario() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[
            trench(10.0, 2.0, 1.0),
            trench(8.0, 2.0, 2.0),
            json!({"type": "Durchstich", "between": 1, "length": 1.5}),
        ],
    )
    .unwrap();
    assert_snapshot!(text, @r"
    Baugraben 1: l=10.0 m  b=2.0 m  t=1.0 m
    Baugraben 2: l=8.0 m  b=2.0 m  t=2.0 m
    Durchstich 1: l=1.5 m
    ");

    // one hatched passage block spanning exactly the passage length
    assert_eq!(sink.hatches_on(Layer::Passage), 1);
    let Some(SinkOp::Outline { points, .. }) = sink.ops.iter().find(|op| {
        matches!(op, SinkOp::Outline { layer: Layer::Passage, closed: true, .. })
    }) else {
        panic!("expected passage frame");
    };
    assert!((points[1].x - points[0].x - 1.5).abs() < 1e-9);

    // exactly one vertical step in the outer floor at the seam; the right
    // side is deeper, so the step vertical shifts left of the seam
    let x_seam = 0.2 + 10.0;
    let step_x = x_seam - 0.2;
    assert_eq!(
        vertical_segments_at(&sink, Layer::TrenchOuter, step_x, (-0.5, 1.5)),
        1
    );

    // equal ceilings: no top riser at the seam
    assert_eq!(
        vertical_segments_at(&sink, Layer::TrenchOuter, x_seam, (2.0, 3.0)),
        0
    );
}

#[test]
fn full_span_pipe_crosses_the_cluster() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[
            trench(10.0, 2.0, 1.5),
            trench(8.0, 2.0, 1.5),
            json!({"type": "Durchstich", "between": 1, "length": 1.0}),
            json!({"type": "Rohr", "for_trench": 1, "diameter": 0.15, "full_span": true}),
        ],
    )
    .unwrap();
    // 10 + 1 + 8 minus both side clearances, as one line, not two
    assert!(text.contains("Rohr 1–2: l=18.0 m  Ø=0.15 m"));
    assert_eq!(text.matches("Rohr").count(), 1);
    assert_eq!(sink.outlines_on(Layer::Pipe), 1);
}

#[test]
fn oversized_pipe_offset_draws_nothing() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[
            trench(6.0, 2.0, 1.5),
            json!({"type": "Rohr", "for_trench": 1, "diameter": 0.15, "offset": 5.5}),
        ],
    )
    .unwrap();
    assert!(!text.contains("Rohr"));
    assert_eq!(sink.outlines_on(Layer::Pipe), 0);
}

#[test]
fn surface_segments_scenario() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[
            trench(10.0, 2.0, 1.5),
            json!({"type": "Oberflächenbefestigung", "for_trench": 1, "seq": 1,
                   "offset": 0.2, "length": 5.0, "material": "Mosaiksteine"}),
            json!({"type": "Oberflächenbefestigung", "for_trench": 1, "seq": 2,
                   "offset": 0.5, "material": "Gehwegplatten"}),
        ],
    )
    .unwrap();
    assert_snapshot!(text, @r"
    Baugraben 1: l=10.0 m  b=2.0 m  t=1.5 m
    Oberfläche 1.1: Randzone=0.2 m  l=5.2 m  b=2.4 m  Material=Mosaiksteine
    Oberfläche 1.2: Randzone=0.5 m  l=5.5 m  b=3.0 m  Material=Gehwegplatten
    ");
    // one stepped polygon on the surface layer
    assert_eq!(sink.outlines_on(Layer::Surface), 1);
}

#[test]
fn clip_reconciliation_across_connection_and_passage() {
    // A–B plain connection, B–C passage: B is clipped on its left only.
    let mut sink = RecordingSink::new();
    generate(
        &mut sink,
        &[
            trench(10.0, 2.0, 1.0),
            trench(8.0, 2.0, 1.0),
            trench(6.0, 2.0, 1.0),
            json!({"type": "Verbindung", "between": 1}),
            json!({"type": "Durchstich", "between": 2, "length": 1.0}),
        ],
    )
    .unwrap();

    // plan view sits above y = 2.7 (clearance + shift + max depth)
    let plan = (0.2 + 1.5 + 1.0, f64::MAX);
    // A's left edge at x = 0.2 is free
    assert_eq!(vertical_segments_at(&sink, Layer::TrenchOuter, 0.2, plan), 1);
    // the A|B seam at x = 10.2 is a connection: no border line on either side
    assert_eq!(vertical_segments_at(&sink, Layer::TrenchOuter, 10.2, plan), 0);
    // B's right edge at x = 18.2 faces a real passage: visible
    assert_eq!(vertical_segments_at(&sink, Layer::TrenchOuter, 18.2, plan), 1);
    // C's left edge across the 1 m gap at x = 19.2: visible
    assert_eq!(vertical_segments_at(&sink, Layer::TrenchOuter, 19.2, plan), 1);
}

#[test]
fn connection_merge_emits_no_passage_artifacts() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[
            trench(10.0, 2.0, 1.0),
            trench(8.0, 2.0, 2.0),
            json!({"type": "Verbindung", "between": 1}),
        ],
    )
    .unwrap();
    assert!(!text.contains("Durchstich"));
    assert_eq!(sink.hatches_on(Layer::Passage), 0);
    assert_eq!(sink.outlines_on(Layer::Passage), 0);
}

#[test]
fn ceilings_align_across_unequal_depths() {
    let mut sink = RecordingSink::new();
    generate(
        &mut sink,
        &[trench(10.0, 2.0, 1.0), trench(8.0, 2.0, 2.0), trench(6.0, 2.0, 1.5)],
    )
    .unwrap();
    let ceiling = 0.2 + 2.0;
    let tops: Vec<f64> = sink
        .ops
        .iter()
        .filter_map(|op| match op {
            SinkOp::Outline { points, layer: Layer::TrenchOuter, closed: true } => {
                Some(points.iter().map(|p| p.y).fold(f64::MIN, f64::max))
            }
            _ => None,
        })
        .collect();
    assert_eq!(tops.len(), 3);
    for top in tops {
        assert!((top - ceiling).abs() < 1e-6);
    }
}

#[test]
fn gok_shifts_one_trench_and_gets_its_dimension() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[
            json!({"type": "Baugraben", "length": 10.0, "width": 2.0, "depth": 1.5, "gok": 0.09}),
            trench(8.0, 2.0, 1.5),
            json!({"type": "Verbindung", "between": 1}),
        ],
    )
    .unwrap();
    assert!(text.contains("GOK=+0.09 m"));
    let gok_dims: Vec<_> = sink
        .dimensions()
        .filter(|d| d.text.as_deref() == Some("GOK +<> m"))
        .collect();
    assert_eq!(gok_dims.len(), 1);
    // the dimension measures exactly the GOK offset
    let d = gok_dims[0];
    assert!(((d.p1.y - d.p2.y).abs() - 0.09).abs() < 1e-9);
}

#[test]
fn standalone_trench_gets_no_gok_dimension() {
    let mut sink = RecordingSink::new();
    generate(
        &mut sink,
        &[json!({"type": "Baugraben", "length": 10.0, "width": 2.0, "depth": 1.5, "gok": 0.09})],
    )
    .unwrap();
    assert!(sink.dimensions().all(|d| d.text.is_none()));
}

#[test]
fn manual_override_lines_lead_the_output() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[
            trench(10.0, 2.0, 1.5),
            json!({"type": "Rohr", "for_trench": 1, "diameter": 0.15, "length": 6.0}),
            json!({"type": "aufmass_override",
                   "lines": ["Rohr 1: l=6.0 m  Ø=0.15 m", "Eigene Zeile"]}),
        ],
    )
    .unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Rohr 1: l=6.0 m  Ø=0.15 m");
    assert_eq!(lines[1], "Eigene Zeile");
    assert_eq!(lines[2], "Baugraben 1: l=10.0 m  b=2.0 m  t=1.5 m");
}

#[test]
fn sloped_trench_reports_both_depths() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[json!({"type": "Baugraben", "length": 5.0, "width": 5.0,
                 "depth": 1.1, "depth_left": 1.1, "depth_right": 1.03})],
    )
    .unwrap();
    assert_snapshot!(text, @"Baugraben 1: l=5.0 m  b=5.0 m  t_links=1.1 m  t_rechts=1.03 m");
}

#[test]
fn three_way_chain_draws_each_trench_once() {
    let mut sink = RecordingSink::new();
    let text = generate(
        &mut sink,
        &[
            trench(10.0, 2.0, 1.0),
            trench(8.0, 2.0, 2.0),
            trench(6.0, 2.0, 1.5),
            json!({"type": "Durchstich", "between": 1, "length": 1.0}),
            json!({"type": "Durchstich", "between": 2, "length": 2.0}),
        ],
    )
    .unwrap();
    assert_eq!(text.matches("Baugraben").count(), 3);
    assert_eq!(text.matches("Durchstich").count(), 2);
    // each trench has exactly one plan length dimension (and one width),
    // i.e. tops were not drawn twice: 3 plan pairs + 3 elevation depth dims
    // + 2 passage length dims
    assert_eq!(sink.dimensions().count(), 3 * 2 + 3 + 2);
}

#[test]
fn missing_passage_length_aborts() {
    let mut sink = RecordingSink::new();
    let err = generate(
        &mut sink,
        &[
            trench(10.0, 2.0, 1.0),
            trench(8.0, 2.0, 2.0),
            json!({"type": "Durchstich", "between": 1}),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, GenerateError::MissingPassageLength { seam: 1 }));
}

#[test]
fn empty_element_list_has_no_layout_origin() {
    let mut sink = RecordingSink::new();
    let err = generate(&mut sink, &[]).unwrap_err();
    assert!(matches!(err, GenerateError::NoTrenches));
}
