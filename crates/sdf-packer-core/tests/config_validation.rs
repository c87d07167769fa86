use sdf_packer_core::prelude::*;

#[test]
fn settings_defaults() {
    let s = GenerationSettings::default();
    assert!(s.generate);
    assert_eq!(s.backend, BackendKind::Auto);
    assert_eq!(s.border_offset, 4);
    assert_eq!(s.resolution_scale, 1.0);
    assert!((s.gradient_size - 0.1).abs() < f32::EPSILON);
    assert!(s.validate().is_ok());

    let parsed: GenerationSettings = serde_json::from_str("{}").expect("empty object");
    assert_eq!(parsed, s);
    let parsed: GenerationSettings =
        serde_json::from_str(r#"{"backend":"cpu","gradient_size":0.3}"#).expect("partial");
    assert_eq!(parsed.backend, BackendKind::Cpu);
    assert_eq!(parsed.border_offset, 4);
}

#[test]
fn gradient_must_be_positive() {
    for g in [0.0, -0.5, f32::NAN, f32::INFINITY] {
        let s = GenerationSettings::builder().gradient_size(g).build();
        assert!(
            matches!(s.validate(), Err(SdfPackerError::InvalidConfig(msg)) if msg.contains("gradient_size")),
            "gradient {g} accepted"
        );
    }
}

#[test]
fn resolution_scale_only_down() {
    for scale in [0.0, -1.0, 1.5, f32::NAN] {
        let s = GenerationSettings::builder().resolution_scale(scale).build();
        assert!(s.validate().is_err(), "scale {scale} accepted");
    }
    for scale in [0.1, 0.5, 1.0] {
        let s = GenerationSettings::builder().resolution_scale(scale).build();
        assert!(s.validate().is_ok(), "scale {scale} rejected");
    }
}

#[test]
fn oversized_border_offset_is_rejected() {
    let limit = sdf_packer_core::MAX_BORDER_OFFSET;
    let ok = GenerationSettings::builder().border_offset(limit).build();
    assert!(ok.validate().is_ok());

    for offset in [limit + 1, u32::MAX / 2 + 1, u32::MAX] {
        let s = GenerationSettings::builder().border_offset(offset).build();
        assert!(
            matches!(s.validate(), Err(SdfPackerError::InvalidConfig(msg)) if msg.contains("border_offset")),
            "border offset {offset} accepted"
        );
    }
}

#[test]
fn huge_border_offset_fails_before_any_allocation() {
    let img = image::RgbaImage::new(4, 4);
    let settings = GenerationSettings::builder()
        .backend(BackendKind::Cpu)
        .border_offset(u32::MAX)
        .build();
    let err = generate_atlas(
        &image::DynamicImage::ImageRgba8(img),
        &[SpriteRect::new("s", Rect::new(0, 0, 4, 4))],
        &settings,
        AtlasConfig::default(),
    )
    .expect_err("must fail");
    assert!(matches!(err, SdfPackerError::InvalidConfig(_)), "got {err:?}");
}

#[test]
fn scaled_border_offset_rounds() {
    let s = GenerationSettings::builder()
        .border_offset(5)
        .resolution_scale(0.5)
        .build();
    assert_eq!(s.scaled_border_offset(), 3);
    let s = GenerationSettings::builder()
        .border_offset(4)
        .resolution_scale(0.25)
        .build();
    assert_eq!(s.scaled_border_offset(), 1);
}

#[test]
fn atlas_dimensions_must_be_non_zero() {
    let cfg = AtlasConfig {
        max_width: 0,
        max_height: 1024,
        ..Default::default()
    };
    match cfg.validate() {
        Err(SdfPackerError::InvalidDimensions { width, height }) => {
            assert_eq!(width, 0);
            assert_eq!(height, 1024);
        }
        other => panic!("Expected InvalidDimensions error, got {other:?}"),
    }
}

#[test]
fn border_padding_must_leave_room() {
    let cfg = AtlasConfig::builder()
        .with_max_dimensions(64, 64)
        .border_padding(32)
        .build();
    match cfg.validate() {
        Err(SdfPackerError::InvalidConfig(msg)) => assert!(msg.contains("border_padding")),
        other => panic!("Expected InvalidConfig error, got {other:?}"),
    }
    let ok = AtlasConfig::builder()
        .with_max_dimensions(64, 64)
        .border_padding(31)
        .build();
    assert!(ok.validate().is_ok());
}

#[test]
fn reserved_size_and_offset() {
    let cfg = AtlasConfig::builder()
        .texture_padding(3)
        .texture_extrusion(2)
        .build();
    assert_eq!(cfg.reserved_size(10, 4), (17, 11));
    assert_eq!(cfg.content_offset(), 3);
}

#[test]
fn enums_parse_from_strings() {
    assert_eq!("GPU".parse::<BackendKind>(), Ok(BackendKind::Gpu));
    assert_eq!("cpu".parse::<BackendKind>(), Ok(BackendKind::Cpu));
    assert_eq!("Auto".parse::<BackendKind>(), Ok(BackendKind::Auto));
    assert!("vulkan".parse::<BackendKind>().is_err());
    assert_eq!("shelf".parse::<PackAlgorithm>(), Ok(PackAlgorithm::Shelf));
    assert_eq!("maxrects".parse::<PackAlgorithm>(), Ok(PackAlgorithm::MaxRects));
    assert_eq!("bssf".parse::<MaxRectsHeuristic>(), Ok(MaxRectsHeuristic::BestShortSideFit));
    assert_eq!("height_desc".parse::<SortOrder>(), Ok(SortOrder::HeightDesc));
    assert_eq!(BackendKind::Cpu.to_string(), "CPU");
}

#[test]
fn atlas_config_serde_defaults() {
    let cfg: AtlasConfig =
        serde_json::from_str(r#"{"max_width":512,"max_height":256}"#).expect("parse");
    assert_eq!(cfg.texture_padding, 2);
    assert_eq!(cfg.family, PackAlgorithm::MaxRects);
    assert_eq!(cfg.sort_order, SortOrder::AreaDesc);
    assert!(!cfg.power_of_two);
}
