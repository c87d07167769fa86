use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sdf_packer_core::prelude::*;

/// Random soft-edged blobs: a few discs with a linear alpha ramp at their rims.
fn blobs(rng: &mut StdRng, w: u32, h: u32) -> SolidityMask {
    let discs: Vec<(f32, f32, f32)> = (0..rng.gen_range(1..6))
        .map(|_| {
            (
                rng.gen_range(0.0..w as f32),
                rng.gen_range(0.0..h as f32),
                rng.gen_range(2.0..(w.min(h) as f32 / 3.0)),
            )
        })
        .collect();
    let alpha = (0..w * h)
        .map(|i| {
            let (x, y) = ((i % w) as f32, (i / w) as f32);
            discs
                .iter()
                .map(|&(cx, cy, r)| {
                    let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
                    (r - d + 0.5).clamp(0.0, 1.0)
                })
                .fold(0.0f32, f32::max)
        })
        .collect();
    SolidityMask::from_alpha(w, h, alpha)
}

#[test]
fn parallel_and_sequential_are_bit_identical() {
    let mut rng = StdRng::seed_from_u64(0x5df);
    let parallel = CpuBackend::new();
    let sequential = CpuBackend::sequential();
    assert!(!sequential.is_parallel());
    for _ in 0..8 {
        let w = rng.gen_range(8..48);
        let h = rng.gen_range(8..48);
        let mask = blobs(&mut rng, w, h);
        let gradient = rng.gen_range(1.0..10.0);
        let a = parallel.distance_field(&mask, gradient);
        let b = sequential.distance_field(&mask, gradient);
        let a_bits: Vec<u32> = a.values.iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.values.iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits, "{w}x{h}");
    }
}

#[test]
fn repeated_runs_match() {
    let mut rng = StdRng::seed_from_u64(7);
    let mask = blobs(&mut rng, 40, 30);
    let cpu = CpuBackend::new();
    let first = cpu.distance_field(&mask, 4.0);
    for _ in 0..3 {
        assert_eq!(cpu.distance_field(&mask, 4.0), first);
    }
}
