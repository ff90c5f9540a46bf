//! Marshalling benchmarks: the allocate-and-copy step dominates the
//! binding-side cost of a dispatch, so it is the part worth watching.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use novakv_client::ffi::marshal::{BatchBuffer, CommandBuffer};
use novakv_client::{Batch, Command, RequestType};

fn bench_command_marshal(c: &mut Criterion) {
    let small = Command::new(RequestType::Set).arg("key").arg("value");
    c.bench_function("marshal_small_command", |b| {
        b.iter(|| {
            let mut buffer = CommandBuffer::new(black_box(small.clone())).unwrap();
            let ptr = buffer.as_ptr().unwrap();
            black_box(ptr);
        })
    });

    let payload = vec![0u8; 16 * 1024];
    let large = Command::new(RequestType::Set)
        .arg("key")
        .arg(payload);
    c.bench_function("marshal_16k_value", |b| {
        b.iter(|| {
            let mut buffer = CommandBuffer::new(black_box(large.clone())).unwrap();
            let ptr = buffer.as_ptr().unwrap();
            black_box(ptr);
        })
    });
}

fn bench_batch_marshal(c: &mut Criterion) {
    let mut batch = Batch::new();
    for i in 0..50 {
        batch.push(
            Command::new(RequestType::Set)
                .arg(format!("key:{i}"))
                .arg("value"),
        );
    }
    c.bench_function("marshal_50_command_batch", |b| {
        b.iter(|| {
            let mut buffer = BatchBuffer::new(black_box(batch.clone())).unwrap();
            let ptr = buffer.as_ptr().unwrap();
            black_box(ptr);
        })
    });
}

criterion_group!(benches, bench_command_marshal, bench_batch_marshal);
criterion_main!(benches);
