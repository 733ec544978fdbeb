//! End-to-end parse and render scenarios

use super::*;

const BLUE_CIRCLE: &str =
    r#"<svg width="100" height="100"><circle cx="50" cy="50" r="40" fill="blue"/></svg>"#;

const GRADIENT_RECT: &str = r##"<svg width="100" height="10">
    <defs>
        <linearGradient id="g1">
            <stop offset="0" stop-color="#000000"/>
            <stop offset="1" stop-color="#ffffff"/>
        </linearGradient>
    </defs>
    <rect x="0" y="0" width="100" height="10" fill="url(#g1)"/>
</svg>"##;

#[test]
fn test_circle_center_is_blue_corners_transparent() {
    let image = render_str(BLUE_CIRCLE, 100, 100).unwrap();
    assert_eq!(image.pixel(50, 50), Some([0, 0, 255, 255]));
    for (x, y) in [(0, 0), (99, 0), (0, 99), (99, 99)] {
        assert_eq!(image.pixel(x, y).map(|p| p[3]), Some(0), "corner {x},{y}");
    }
}

#[test]
fn test_empty_input_is_an_error() {
    assert_eq!(parse(""), Err(ParseError::EmptyInput));
    assert_eq!(render_str("", 10, 10), Err(ParseError::EmptyInput));
}

#[test]
fn test_unsized_rect_fills_every_pixel() {
    let image = render_str(
        r##"<svg><rect x="0" y="0" width="10" height="10" fill="#ff0000"/></svg>"##,
        10,
        10,
    )
    .unwrap();
    for y in 0..10 {
        for x in 0..10 {
            assert_eq!(image.pixel(x, y), Some([255, 0, 0, 255]), "pixel {x},{y}");
        }
    }
}

#[test]
fn test_linear_gradient_runs_black_to_white() {
    let image = render_str(GRADIENT_RECT, 100, 10).unwrap();
    let left = image.pixel(0, 5).unwrap();
    let right = image.pixel(99, 5).unwrap();
    assert!(left[0] < 8 && left[3] == 255, "left column {left:?}");
    assert!(right[0] > 247 && right[3] == 255, "right column {right:?}");

    let mut previous = 0;
    for x in 0..100 {
        let [r, g, b, _] = image.pixel(x, 5).unwrap();
        assert!(r >= previous, "column {x} went from {previous} to {r}");
        assert!(r == g && g == b, "gray ramp at column {x}");
        previous = r;
    }
}

#[test]
fn test_closed_triangle_path_data() {
    assert_eq!(
        parse_path_data("M0,0 L10,0 L10,10 Z").unwrap(),
        vec![
            Segment::MoveTo(quill_core::Point::new(0.0, 0.0)),
            Segment::LineTo(quill_core::Point::new(10.0, 0.0)),
            Segment::LineTo(quill_core::Point::new(10.0, 10.0)),
            Segment::Close,
        ]
    );
}

#[test]
fn test_unterminated_element_reports_position() {
    match parse(r#"<svg><rect width="10"></svg>"#) {
        Err(ParseError::MalformedMarkup { position, .. }) => {
            assert_eq!(position.line, 1);
            assert!(position.offset > 0, "{position:?}");
        }
        other => panic!("expected malformed markup, got {other:?}"),
    }
}

#[test]
fn test_bad_path_does_not_hide_valid_shapes() {
    let src = r#"<svg width="20" height="10">
        <rect x="0" y="0" width="10" height="10" fill="red"/>
        <path d="M10 0 L20 0 L20 10 Y" fill="blue"/>
    </svg>"#;
    let document = parse(src).unwrap();
    assert_eq!(document.nodes().len(), 1);
    assert!(matches!(
        document.diagnostics(),
        [Diagnostic::InvalidPathData { .. }]
    ));

    let image = render(&document, 20, 10);
    assert_eq!(image.pixel(5, 5), Some([255, 0, 0, 255]));
    assert_eq!(image.pixel(15, 5), Some([0, 0, 0, 0]));
}

#[test]
fn test_parse_and_render_are_deterministic() {
    let a = parse(GRADIENT_RECT).unwrap();
    let b = parse(GRADIENT_RECT).unwrap();
    assert_eq!(a, b);
    assert_eq!(render(&a, 37, 11), render(&a, 37, 11));
}

#[test]
fn test_output_size_ignores_view_box() {
    let document = parse(r#"<svg viewBox="-50 -50 1000 3"><circle r="10"/></svg>"#).unwrap();
    for (w, h) in [(1, 1), (64, 64), (200, 7), (3, 90)] {
        let image = render(&document, w, h);
        assert_eq!(image.dimensions(), (w, h));
        assert_eq!(image.data().len(), w as usize * h as usize * 4);
    }
}

#[test]
fn test_concurrent_renders_of_one_document() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SvgDocument>();

    let document = parse(GRADIENT_RECT).unwrap();
    let expected = render(&document, 64, 64);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let document = &document;
                scope.spawn(move || {
                    if i % 2 == 0 {
                        render(document, 64, 64)
                    } else {
                        render(document, THUMBNAIL_SIZE, THUMBNAIL_SIZE)
                    }
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_nothing_to_draw_is_transparent() {
    let image = render_str(r#"<svg width="10" height="10"><g/></svg>"#, 8, 8).unwrap();
    assert!(image.is_transparent());
    assert_eq!(image.dimensions(), (8, 8));
}

#[test]
fn test_render_or_blank_absorbs_parse_failures() {
    let image = render_or_blank("<svg><g></svg>", 16, 12);
    assert_eq!(image.dimensions(), (16, 12));
    assert!(image.is_transparent());

    let thumb = render_thumbnail(BLUE_CIRCLE);
    assert_eq!(thumb.dimensions(), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
    assert_eq!(thumb.pixel(32, 32), Some([0, 0, 255, 255]));
}

#[test]
fn test_unresolved_gradient_is_transparent_or_fallback() {
    let src = r##"<svg width="4" height="2">
        <rect width="2" height="2" fill="url(#missing)"/>
        <rect x="2" width="2" height="2" fill="url(#missing) lime"/>
    </svg>"##;
    let document = parse(src).unwrap();
    assert_eq!(
        document.diagnostics(),
        [Diagnostic::GradientRefUnresolved {
            id: "missing".into()
        }]
    );
    let image = render(&document, 4, 2);
    assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(image.pixel(3, 1), Some([0, 255, 0, 255]));
}

#[test]
fn test_radial_gradient_is_darkest_at_center() {
    let src = r##"<svg viewBox="0 0 20 20">
        <radialGradient id="r">
            <stop offset="0%" stop-color="black"/>
            <stop offset="100%" stop-color="white"/>
        </radialGradient>
        <rect width="20" height="20" fill="url(#r)"/>
    </svg>"##;
    let image = render_str(src, 20, 20).unwrap();
    let center = image.pixel(10, 10).unwrap()[0];
    let edge = image.pixel(10, 0).unwrap()[0];
    let corner = image.pixel(0, 0).unwrap()[0];
    assert!(center < 30, "center {center}");
    assert!(edge > 200, "edge {edge}");
    assert_eq!(corner, 255, "padded beyond the radius");
}

#[test]
fn test_view_box_scales_content() {
    let src = r#"<svg viewBox="0 0 10 10"><rect x="5" width="5" height="10" fill="blue"/></svg>"#;
    let image = render_str(src, 100, 100).unwrap();
    assert_eq!(image.pixel(25, 50), Some([0, 0, 0, 0]));
    assert_eq!(image.pixel(75, 50), Some([0, 0, 255, 255]));
}

#[test]
fn test_inherited_stroke_and_current_color() {
    let src = r#"<svg width="10" height="10" color="red">
        <g stroke="currentColor" stroke-width="4" fill="none">
            <line x1="0" y1="5" x2="10" y2="5"/>
        </g>
    </svg>"#;
    let image = render_str(src, 10, 10).unwrap();
    assert_eq!(image.pixel(5, 4), Some([255, 0, 0, 255]));
    assert_eq!(image.pixel(5, 0), Some([0, 0, 0, 0]));
}

#[test]
fn test_transformed_group_draws_rotated() {
    let src = r#"<svg width="20" height="20">
        <g transform="rotate(90 10 10)"><rect x="0" y="0" width="20" height="5" fill="black"/></g>
    </svg>"#;
    let image = render_str(src, 20, 20).unwrap();
    // The top band becomes a right-hand band
    assert_eq!(image.pixel(18, 10).map(|p| p[3]), Some(255));
    assert_eq!(image.pixel(10, 2).map(|p| p[3]), Some(0));
}

#[test]
fn test_deeply_nested_document_is_rejected() {
    let depth = 5000;
    let src = format!("<svg>{}{}</svg>", "<g>".repeat(depth), "</g>".repeat(depth));
    assert!(matches!(parse(&src), Err(ParseError::MalformedMarkup { .. })));
    assert!(render_or_blank(&src, 4, 4).is_transparent());
}

#[test]
fn test_absurd_output_size_does_not_allocate() {
    let document = parse(r#"<svg><rect width="1" height="1"/></svg>"#).unwrap();
    assert_eq!(render(&document, u32::MAX, u32::MAX).dimensions(), (0, 0));
    assert_eq!(render_or_blank("nonsense", u32::MAX, 2).dimensions(), (0, 0));
    assert!(matches!(
        try_render_with_options(&document, 1 << 20, 1 << 20, &RenderOptions::default()),
        Err(RenderError::SizeTooLarge { .. })
    ));
}
