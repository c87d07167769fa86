use image::{DynamicImage, Rgba, RgbaImage};
use sdf_packer_core::prelude::*;

#[test]
fn json_lists_sprites_in_input_order() {
    let img = RgbaImage::from_fn(24, 8, |x, y| {
        Rgba([0, 0, 0, if (x + y) % 3 == 0 { 255 } else { 0 }])
    });
    let sprites = vec![
        SpriteRect::new("small", Rect::new(0, 0, 4, 4)).with_pivot(0.0, 1.0),
        SpriteRect::new("big", Rect::new(4, 0, 20, 8))
            .with_border(Border::new(1.0, 2.0, 3.0, 4.0)),
    ];
    let settings = GenerationSettings::builder()
        .backend(BackendKind::Cpu)
        .border_offset(1)
        .build();
    let out = generate_atlas(
        &DynamicImage::ImageRgba8(img),
        &sprites,
        &settings,
        AtlasConfig::default(),
    )
    .expect("generate");

    let v = to_json(&out.layout);
    let list = v["sprites"].as_array().expect("sprites array");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["name"], "small");
    assert_eq!(list[0]["index"], 0);
    assert_eq!(list[1]["name"], "big");
    assert_eq!(list[1]["frame"]["w"], 22);
    assert_eq!(list[1]["frame"]["h"], 10);
    assert_eq!(list[1]["border"]["top"], 5.0);
    assert!(list[0]["uvMin"].is_array());
    assert!(list[0]["pivot"]["x"].is_number());
    assert!(list[1]["gradientPx"].as_f64().expect("gradient") > 0.0);

    assert_eq!(v["meta"]["app"], "sdf-packer");
    assert_eq!(v["meta"]["width"], out.packed_image.width());
    assert_eq!(v["meta"]["backend"], "cpu");
    assert_eq!(v["meta"]["settings"]["border_offset"], 1);
}

#[test]
fn written_json_reads_back_as_current_layout() {
    let img = RgbaImage::from_fn(16, 16, |x, _| Rgba([9, 9, 9, if x < 8 { 255 } else { 0 }]));
    let sprites = vec![
        SpriteRect::new("left", Rect::new(0, 0, 8, 16)).with_pivot(0.25, 0.75),
        SpriteRect::new("right", Rect::new(8, 0, 8, 16)),
    ];
    let settings = GenerationSettings::builder()
        .backend(BackendKind::Cpu)
        .build();
    let out = generate_atlas(
        &DynamicImage::ImageRgba8(img),
        &sprites,
        &settings,
        AtlasConfig::default(),
    )
    .expect("generate");

    let text = serde_json::to_string_pretty(&to_json(&out.layout)).expect("serialize");
    let value: serde_json::Value = serde_json::from_str(&text).expect("parse");
    let back = from_json(&value).expect("read back");
    assert_eq!(back, out.layout);
    assert!(back.is_current(&settings, &AtlasConfig::default(), &sprites));
}

#[test]
fn foreign_json_is_rejected() {
    let value = serde_json::json!({ "frames": [] });
    match from_json(&value) {
        Err(SdfPackerError::InvalidInput(msg)) => assert!(msg.contains("atlas JSON")),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}
