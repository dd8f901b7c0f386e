//! Benchmarks for cached dispatch and formula evaluation

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use num_complex::Complex64;
use pixcall::{Formula, Numeric, OpenError, RawSymbol, Registry, SymbolSource};

/// The kernel crate's exports, linked in statically
struct Kernel;

impl SymbolSource for Kernel {
    fn load(path: &Path) -> Result<Self, OpenError> {
        Err(OpenError::LibraryLoadFailed {
            path: path.to_path_buf(),
            reason: "statically linked".to_string(),
        })
    }

    fn resolve(&self, name: &str) -> Option<RawSymbol> {
        let ptr = match name {
            "func" => pixcall_kernel::func as *const (),
            "toon" => pixcall_kernel::toon as *const (),
            "vingette" => pixcall_kernel::vingette as *const (),
            "alpha" => pixcall_kernel::alpha as *const (),
            "saturate" => pixcall_kernel::saturate as *const (),
            _ => return None,
        };
        RawSymbol::from_ptr(ptr)
    }
}

fn open_kernel() -> Registry<Complex64, Kernel> {
    let mut registry = Registry::new();
    registry
        .open_with(Kernel, 128)
        .expect("kernel registry should open");
    registry
}

/// Benchmark a call served from the arity cache
fn bench_cached_call(c: &mut Criterion) {
    let mut registry = open_kernel();
    let x = Complex64::from_real(0.73);
    let n = Complex64::from_real(4.0);

    // Warm up: resolve once
    registry.call2("toon", x, n).into_result().unwrap();

    c.bench_function("cached_call2_toon", |b| {
        b.iter(|| black_box(registry.call2("toon", black_box(x), black_box(n))))
    });

    c.bench_function("direct_toon", |b| {
        b.iter(|| black_box(pixcall_kernel::toon(black_box(x), black_box(n))))
    });
}

/// Benchmark a full image's worth of formula evaluations
fn bench_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("formula");
    let mut registry = open_kernel();
    let formula =
        Formula::parse("saturate(toon(x1, 4) * vingette(x1, x2, x3) + alpha(x1, 6.28, 0, 2), 0, 1)")
            .unwrap();
    formula.check(&mut registry, 3).unwrap();

    const SIDE: usize = 64;
    group.throughput(Throughput::Elements((SIDE * SIDE) as u64));
    group.bench_function(format!("{}x{}_pixels", SIDE, SIDE), |b| {
        b.iter(|| {
            let mut sum = Complex64::from_real(0.0);
            for py in 0..SIDE {
                for px in 0..SIDE {
                    let args = [
                        Complex64::from_real(0.5),
                        Complex64::from_real(px as f64 / SIDE as f64),
                        Complex64::from_real(py as f64 / SIDE as f64),
                    ];
                    sum += formula.eval(&mut registry, &args).unwrap();
                }
            }
            black_box(sum)
        })
    });

    group.bench_function("parse", |b| {
        b.iter(|| black_box(Formula::parse(black_box("toon(x1, 4) * 0.5 + _1")).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_cached_call, bench_formula);
criterion_main!(benches);
