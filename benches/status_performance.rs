// benches/status_performance.rs
//! Benchmarks for status vector decoding, encoding and boundary crossings.
//!
//! Each benchmark also reports the median number of heap allocations per
//! iteration, measured with stats_alloc.

use criterion::{BenchmarkId, Bencher, Criterion, black_box, criterion_group, criterion_main};
use fb_status::{
    BadAllocation, Boundary, ErrorRecord, Exception, FixedStatusBuffer, LocalStatus, RawStatus,
    STATUS_LENGTH, StatusArgs, StatusError, StatusVector, StatusWord, SystemError, check_status,
    gds, markers::*,
};
use stats_alloc::{INSTRUMENTED_SYSTEM, Region, StatsAlloc};
use std::alloc::System;

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

thread_local! {
    static ALLOC_COUNTS: std::cell::RefCell<Vec<usize>> = const { std::cell::RefCell::new(Vec::new()) };
}

/// Time `f` with criterion and print its median allocation count.
fn bench_with_allocs<F>(b: &mut Bencher<'_>, label: &str, mut f: F)
where
    F: FnMut(),
{
    ALLOC_COUNTS.with(|counts| counts.borrow_mut().clear());

    b.iter(|| {
        let region = Region::new(GLOBAL);
        f();
        let allocations = region.change().allocations;
        ALLOC_COUNTS.with(|counts| counts.borrow_mut().push(allocations));
    });

    ALLOC_COUNTS.with(|counts| {
        let mut counts = counts.borrow_mut();
        if !counts.is_empty() {
            counts.sort_unstable();
            println!("{label:<40} median allocations: {}", counts[counts.len() / 2]);
        }
    });
}

fn network_failure() -> StatusArgs {
    StatusArgs::error(gds::NETWORK_ERROR)
        .str("db.example.org")
        .gds(gds::NET_READ_ERR)
        .native_os(104)
        .warning(gds::UNAVAILABLE)
        .num(3)
}

// ============================================================================
// DECODING BENCHMARKS
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for entries in [1usize, 4, 16] {
        let mut args = StatusArgs::new();
        for i in 0..entries {
            args = args.gds(gds::IO_ERROR).str("/var/lib/db/employee.fdb").num(i as StatusWord);
        }
        group.bench_with_input(BenchmarkId::from_parameter(entries), &args, |b, args| {
            bench_with_allocs(b, &format!("parse {entries} entries"), || {
                black_box(ErrorRecord::parse(args.as_raw()));
            })
        });
    }

    group.finish();
}

fn bench_check_status_success(c: &mut Criterion) {
    let words = [ARG_GDS, 0, ARG_END];
    c.bench_function("check_status_success", |b| {
        bench_with_allocs(b, "check_status success", || {
            black_box(check_status(RawStatus::codes_only(black_box(&words))).is_ok());
        })
    });
}

fn bench_check_status_failure(c: &mut Criterion) {
    let args = network_failure();
    c.bench_function("check_status_failure", |b| {
        bench_with_allocs(b, "check_status failure", || {
            black_box(check_status(args.as_raw()).is_err());
        })
    });
}

// ============================================================================
// ENCODING BENCHMARKS
// ============================================================================

fn bench_serialize_vector(c: &mut Criterion) {
    let err = StatusError::from_args(network_failure());
    c.bench_function("serialize_status_vector", |b| {
        bench_with_allocs(b, "serialize into StatusVector", || {
            let mut vector = StatusVector::new();
            black_box(fb_status::StatusException::serialize_into(&err, &mut vector));
        })
    });
}

fn bench_serialize_fixed(c: &mut Criterion) {
    let err = StatusError::from_args(network_failure());
    c.bench_function("serialize_fixed_buffer", |b| {
        let mut words = [0 as StatusWord; STATUS_LENGTH];
        let mut arena = [0u8; 256];
        bench_with_allocs(b, "serialize into FixedStatusBuffer", || {
            let mut buffer = FixedStatusBuffer::new(&mut words, &mut arena);
            black_box(fb_status::StatusException::serialize_into(&err, &mut buffer));
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let record = StatusError::from_args(network_failure()).record().clone();
    c.bench_function("render_message", |b| {
        bench_with_allocs(b, "render message", || {
            black_box(record.message());
        })
    });
}

// ============================================================================
// BOUNDARY BENCHMARKS
// ============================================================================

fn bench_boundary_success(c: &mut Criterion) {
    let boundary = Boundary::new();
    let mut status = LocalStatus::new();
    c.bench_function("boundary_call_success", |b| {
        bench_with_allocs(b, "boundary call success", || {
            black_box(boundary.call(&mut status, |checkpoint| {
                checkpoint.check()?;
                Ok(black_box(42u32))
            }));
        })
    });
}

fn bench_boundary_system_error(c: &mut Criterion) {
    let boundary = Boundary::new();
    let mut status = LocalStatus::new();
    c.bench_function("boundary_call_system_error", |b| {
        bench_with_allocs(b, "boundary call SystemError", || {
            black_box(boundary.call(&mut status, |_| SystemError::raise::<()>("open", 2)));
        })
    });
}

fn bench_bad_allocation_fixed(c: &mut Criterion) {
    let boundary = Boundary::new();
    c.bench_function("bad_allocation_fixed_buffer", |b| {
        let mut words = [0 as StatusWord; STATUS_LENGTH];
        let mut arena = [0u8; 64];
        bench_with_allocs(b, "BadAllocation into fixed buffer", || {
            let mut buffer = FixedStatusBuffer::new(&mut words, &mut arena);
            black_box(boundary.call_into(&mut buffer, |_| BadAllocation::raise()));
        })
    });
}

fn bench_description(c: &mut Criterion) {
    let exception = Exception::from(StatusError::from_args(network_failure()));
    c.bench_function("to_description", |b| {
        bench_with_allocs(b, "host description", || {
            black_box(exception.to_description());
        })
    });
}

// ============================================================================
// BENCHMARK GROUPS
// ============================================================================

criterion_group!(
    decoding_benches,
    bench_parse,
    bench_check_status_success,
    bench_check_status_failure,
);

criterion_group!(
    encoding_benches,
    bench_serialize_vector,
    bench_serialize_fixed,
    bench_render,
);

criterion_group!(
    boundary_benches,
    bench_boundary_success,
    bench_boundary_system_error,
    bench_bad_allocation_fixed,
    bench_description,
);

criterion_main!(decoding_benches, encoding_benches, boundary_benches);
