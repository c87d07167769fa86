use image::{DynamicImage, Rgba, RgbaImage};
use sdf_packer_core::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

/// Wraps the CPU backend but defers until its "kernel" has been initialized.
struct LazyBackend {
    inner: CpuBackend,
    ready: bool,
    calls: Rc<Cell<usize>>,
}

impl LazyBackend {
    fn new() -> Self {
        Self {
            inner: CpuBackend::new(),
            ready: false,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl SdfBackend for LazyBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn initialize(&mut self) -> sdf_packer_core::Result<()> {
        self.ready = true;
        Ok(())
    }

    fn teardown(&mut self) {
        self.ready = false;
    }

    fn generate(&self, region: &WorkingRegion, gradient_px: f32) -> Generation<DistanceField> {
        self.calls.set(self.calls.get() + 1);
        if !self.ready {
            return Generation::Deferred("kernel not loaded".into());
        }
        self.inner.generate(region, gradient_px)
    }
}

fn input() -> (DynamicImage, Vec<SpriteRect>) {
    let img = RgbaImage::from_fn(16, 8, |x, _| {
        if x % 8 >= 2 && x % 8 < 6 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let sprites = vec![
        SpriteRect::new("left", Rect::new(0, 0, 8, 8)),
        SpriteRect::new("right", Rect::new(8, 0, 8, 8)),
    ];
    (DynamicImage::ImageRgba8(img), sprites)
}

#[test]
fn deferred_until_initialized_then_ready() {
    let (source, sprites) = input();
    let settings = GenerationSettings::default();
    let mut generator =
        SdfGenerator::with_backend(Box::new(LazyBackend::new()), Default::default());

    let first = generator.run(&source, &sprites, &settings);
    assert!(first.is_deferred());
    assert!(matches!(
        first.into_result(),
        Err(SdfPackerError::NotReady(reason)) if reason.contains("kernel")
    ));

    generator.initialize().expect("init");
    let second = generator.run(&source, &sprites, &settings);
    assert!(second.is_ready());
    let out = second.into_result().expect("atlas");
    assert_eq!(out.layout.placements.len(), 2);

    generator.teardown();
    assert!(generator.run(&source, &sprites, &settings).is_deferred());
}

#[test]
fn deferral_stops_at_the_first_sprite() {
    let (source, sprites) = input();
    let backend = LazyBackend::new();
    let calls = Rc::clone(&backend.calls);
    let generator = SdfGenerator::with_backend(Box::new(backend), Default::default());
    let out = generator.run(&source, &sprites, &GenerationSettings::default());
    assert!(out.is_deferred());
    assert_eq!(calls.get(), 1);
}

#[test]
fn validation_failures_are_not_deferred() {
    let (source, _) = input();
    let generator =
        SdfGenerator::with_backend(Box::new(LazyBackend::new()), Default::default());
    let bad = vec![SpriteRect::new("huge", Rect::new(0, 0, 64, 64))];
    match generator.run(&source, &bad, &GenerationSettings::default()) {
        Generation::Failed(SdfPackerError::SpriteOutOfBounds { name, .. }) => {
            assert_eq!(name, "huge")
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn generation_map_and_conversion() {
    let ready: Generation<u32> = Ok(2).into();
    assert_eq!(ready.map(|v| v * 2).into_result().expect("ready"), 4);
    let failed: Generation<u32> = Err(SdfPackerError::Empty).into();
    assert!(!failed.is_ready());
    let deferred: Generation<u32> = Generation::Deferred("later".into());
    assert!(deferred.map(|v| v + 1).is_deferred());
}
