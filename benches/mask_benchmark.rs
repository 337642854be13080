//! Mask benchmark: collision mask construction and overlap tests.
//!
//! Target: a 200-member Collide in under a millisecond with warm masks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use spritelink::{Mask, Surface};

/// A filled circle on a transparent background.
fn disc(side: u32) -> Surface {
    let r = side as f32 / 2.0;
    let image = RgbaImage::from_fn(side, side, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        if dx * dx + dy * dy <= r * r {
            Rgba([200, 200, 200, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    Surface::new(image)
}

fn build_masks(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask_from_surface");
    for side in [16u32, 64, 256] {
        let surface = disc(side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &surface, |b, surface| {
            b.iter(|| Mask::from_surface(black_box(surface), 127));
        });
    }
    group.finish();
}

fn overlap_hit_and_miss(c: &mut Criterion) {
    let a = Mask::from_surface(&disc(64), 127);
    let b = Mask::from_surface(&disc(64), 127);

    c.bench_function("overlap_64_hit", |bench| {
        bench.iter(|| a.overlaps(black_box((20, 20)), &b));
    });
    // Bounding boxes touch only at transparent corners
    c.bench_function("overlap_64_corner_miss", |bench| {
        bench.iter(|| a.overlaps(black_box((60, 60)), &b));
    });
    c.bench_function("overlap_64_disjoint", |bench| {
        bench.iter(|| a.overlaps(black_box((200, 0)), &b));
    });
}

fn collide_sweep(c: &mut Criterion) {
    let subject = Mask::from_surface(&disc(32), 127);
    let members: Vec<(Mask, (i32, i32))> = (0..200)
        .map(|i| (Mask::from_surface(&disc(24), 127), ((i % 20) * 30, (i / 20) * 30)))
        .collect();

    c.bench_function("collide_200_members", |bench| {
        bench.iter(|| {
            members
                .iter()
                .filter(|(mask, at)| subject.overlaps((at.0 - 100, at.1 - 100), mask))
                .count()
        });
    });
}

criterion_group!(benches, build_masks, overlap_hit_and_miss, collide_sweep);
criterion_main!(benches);
