//! Codec benchmark: decode a realistic command stream.
//!
//! Target: a full game frame of commands in well under a millisecond.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spritelink::protocol::{read_int16, read_int8};
use spritelink::{Command, Handle, Opcode, SpriteDescriptor};

/// One frame of an asteroids-style game: moves, rotations and collisions.
fn frame_stream(sprites: u8) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..sprites {
        let handle = Handle::new(i);
        Command::SetPos {
            sprite: handle,
            x: u16::from(i) * 3,
            y: 480 - u16::from(i),
        }
        .encode(&mut out);
        Command::SetRot {
            sprite: handle,
            angle: u16::from(i) * 7 % 360,
        }
        .encode(&mut out);
    }
    Command::Collide {
        sprite: Handle::new(0),
        group: Handle::ALL_GROUP,
    }
    .encode(&mut out);
    out
}

fn decode_all(mut bytes: &[u8]) -> usize {
    let mut count = 0;
    while !bytes.is_empty() {
        let opcode = Opcode::try_from(read_int8(&mut bytes).unwrap()).unwrap();
        black_box(Command::read(opcode, &mut bytes).unwrap());
        count += 1;
    }
    count
}

fn decode_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    for sprites in [8u8, 64, 200] {
        let stream = frame_stream(sprites);
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sprites), &stream, |b, stream| {
            b.iter(|| decode_all(black_box(stream)));
        });
    }
    group.finish();
}

fn decode_create_sprite(c: &mut Criterion) {
    let command = Command::CreateSprite(SpriteDescriptor {
        image: "asteroid_large.png".into(),
        x: 320,
        y: 240,
        angle: 45,
        width: 64,
        height: 64,
        order: 1,
    });
    let bytes = command.to_bytes();

    c.bench_function("decode_create_sprite", |b| {
        b.iter(|| decode_all(black_box(&bytes)));
    });
}

fn decode_int16(c: &mut Criterion) {
    let bytes: Vec<u8> = (0..=255u8).flat_map(|b| [b, b.wrapping_mul(31)]).collect();

    c.bench_function("decode_int16_x256", |b| {
        b.iter(|| {
            let mut source = black_box(bytes.as_slice());
            let mut sum = 0u32;
            while !source.is_empty() {
                sum += u32::from(read_int16(&mut source).unwrap());
            }
            sum
        });
    });
}

fn encode_frames(c: &mut Criterion) {
    c.bench_function("encode_frame_64", |b| {
        b.iter(|| frame_stream(black_box(64)));
    });
}

criterion_group!(
    benches,
    decode_frames,
    decode_create_sprite,
    decode_int16,
    encode_frames,
);
criterion_main!(benches);
