use image::{DynamicImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sdf_packer_core::prelude::*;

/// Source image with random opaque blocks, plus a row of sprite rects over it.
fn random_sheet(rng: &mut StdRng, count: usize) -> (DynamicImage, Vec<SpriteRect>) {
    let mut sprites = Vec::with_capacity(count);
    let mut x = 0;
    for i in 0..count {
        let w = rng.gen_range(4..24);
        let h = rng.gen_range(4..24);
        sprites.push(SpriteRect::new(format!("s{i}"), Rect::new(x, 0, w, h)));
        x += w;
    }
    let img = RgbaImage::from_fn(x, 24, |_, _| {
        let a = if rng.gen_bool(0.5) { 255 } else { 0 };
        Rgba([rng.r#gen(), rng.r#gen(), rng.r#gen(), a])
    });
    (DynamicImage::ImageRgba8(img), sprites)
}

fn settings() -> GenerationSettings {
    GenerationSettings::builder()
        .backend(BackendKind::Cpu)
        .border_offset(2)
        .gradient_size(0.2)
        .build()
}

fn check_layout(out: &AtlasResult, sprites: &[SpriteRect], cfg: &AtlasConfig) {
    let placements = &out.layout.placements;
    assert_eq!(placements.len(), sprites.len());
    let (aw, ah) = out.packed_image.dimensions();
    assert!(aw <= cfg.max_width && ah <= cfg.max_height);
    assert_eq!((aw, ah), (out.layout.meta.width, out.layout.meta.height));

    for (i, (p, s)) in placements.iter().zip(sprites).enumerate() {
        assert_eq!(p.sprite_index, i);
        assert_eq!(p.name, s.name);
        assert!(p.rect.right() < aw && p.rect.bottom() < ah);
        assert_eq!(p.rect_from_uv(aw, ah), p.rect);
    }
    for i in 0..placements.len() {
        for j in i + 1..placements.len() {
            assert!(
                !placements[i].rect.intersects(&placements[j].rect),
                "{:?} overlaps {:?}",
                placements[i].rect,
                placements[j].rect
            );
        }
    }
}

#[test]
fn placements_reconstruct_independent_fields() {
    let mut rng = StdRng::seed_from_u64(42);
    let (source, sprites) = random_sheet(&mut rng, 12);
    let settings = settings();

    for family in [
        PackAlgorithm::MaxRects,
        PackAlgorithm::Guillotine,
        PackAlgorithm::Shelf,
        PackAlgorithm::Auto,
    ] {
        let cfg = AtlasConfig::builder()
            .with_max_dimensions(256, 256)
            .texture_padding(2)
            .texture_extrusion(1)
            .family(family.clone())
            .build();
        let out = generate_atlas(&source, &sprites, &settings, cfg.clone()).expect("pack");
        check_layout(&out, &sprites, &cfg);

        let cpu = CpuBackend::new();
        let rgba = cpu.copy_source_image(&source);
        for (i, (p, s)) in out.layout.placements.iter().zip(&sprites).enumerate() {
            let region = cpu.create_working_region(&rgba, s.rect, settings.border_offset);
            let field = cpu
                .generate(&region, resolve_gradient_px(&settings, s))
                .into_result()
                .expect("field");
            let expected = cpu.extract_result(&region, &field);

            let r = p.rect_from_uv(out.packed_image.width(), out.packed_image.height());
            let got =
                image::imageops::crop_imm(&out.packed_image, r.x, r.y, r.w, r.h).to_image();
            assert_eq!(got, expected, "{family:?} sprite {i}");
            assert_eq!(out.sprite_image(i).as_ref(), Some(&expected));
        }
    }
}

#[test]
fn auto_is_never_larger_than_any_family() {
    let mut rng = StdRng::seed_from_u64(3);
    let sizes: Vec<(u32, u32)> = (0..40)
        .map(|_| (rng.gen_range(4..40), rng.gen_range(4..40)))
        .collect();
    let base = AtlasConfig::builder().with_max_dimensions(512, 512).build();
    let auto = sdf_packer_core::layout_sizes(
        &sizes,
        &AtlasConfig {
            family: PackAlgorithm::Auto,
            ..base.clone()
        },
    )
    .expect("auto");
    for family in [
        PackAlgorithm::MaxRects,
        PackAlgorithm::Guillotine,
        PackAlgorithm::Shelf,
    ] {
        let single = sdf_packer_core::layout_sizes(
            &sizes,
            &AtlasConfig {
                family,
                ..base.clone()
            },
        )
        .expect("single");
        assert!(auto.area() <= single.area());
    }
}

#[test]
fn sort_order_does_not_change_placement_order() {
    let sizes = vec![(4, 4), (30, 30), (10, 2), (2, 10)];
    for order in [
        SortOrder::AreaDesc,
        SortOrder::MaxSideDesc,
        SortOrder::HeightDesc,
        SortOrder::None,
    ] {
        let cfg = AtlasConfig::builder()
            .with_max_dimensions(64, 64)
            .texture_padding(0)
            .sort_order(order)
            .build();
        let layout = sdf_packer_core::layout_sizes(&sizes, &cfg).expect("layout");
        let got: Vec<(u32, u32)> = layout.frames.iter().map(|r| (r.w, r.h)).collect();
        assert_eq!(got, sizes);
    }
}

#[test]
fn too_small_atlas_reports_out_of_space() {
    let sizes = vec![(40, 40), (40, 40), (40, 40)];
    let cfg = AtlasConfig::builder()
        .with_max_dimensions(64, 64)
        .texture_padding(0)
        .build();
    match sdf_packer_core::layout_sizes(&sizes, &cfg) {
        Err(SdfPackerError::OutOfSpace {
            placed,
            total,
            unplaced,
        }) => {
            assert_eq!(placed, 1);
            assert_eq!(total, 3);
            assert_eq!(unplaced.len(), 2);
        }
        other => panic!("expected OutOfSpace, got {other:?}"),
    }
}

#[test]
fn pow2_square_and_forced_pages() {
    let sizes = vec![(20, 10), (12, 12)];
    let pow2 = AtlasConfig::builder()
        .texture_padding(0)
        .pow2(true)
        .square(true)
        .build();
    let layout = sdf_packer_core::layout_sizes(&sizes, &pow2).expect("pow2");
    assert!(layout.width.is_power_of_two());
    assert_eq!(layout.width, layout.height);

    let forced = AtlasConfig::builder()
        .with_max_dimensions(100, 60)
        .force_max_dimensions(true)
        .build();
    let layout = sdf_packer_core::layout_sizes(&sizes, &forced).expect("forced");
    assert_eq!((layout.width, layout.height), (100, 60));

    let bordered = AtlasConfig::builder()
        .texture_padding(0)
        .border_padding(3)
        .build();
    let layout = sdf_packer_core::layout_sizes(&sizes, &bordered).expect("border");
    for f in &layout.frames {
        assert!(f.x >= 3 && f.y >= 3);
        assert!(f.right() + 3 < layout.width && f.bottom() + 3 < layout.height);
    }
}

#[test]
fn stats_are_consistent() {
    let mut rng = StdRng::seed_from_u64(9);
    let (source, sprites) = random_sheet(&mut rng, 5);
    let out = generate_atlas(&source, &sprites, &settings(), AtlasConfig::default()).expect("ok");
    let stats = out.stats();
    assert_eq!(stats.num_sprites, 5);
    assert!(stats.occupancy > 0.0 && stats.occupancy <= 1.0);
    assert_eq!(stats.wasted_area(), stats.page_area - stats.used_area);
    assert!(stats.summary().contains("Sprites: 5"));
}
