//! Benchmarks for the constant resolution fast paths.
//!
//! Measures the costs compiled code and the interpreter actually pay:
//! - tag reads on an already-resolved pool
//! - the resolved-class fast path (tag acquire-load + side-table read)
//! - the cached-constant fast path through the reference table
//! - first-time bulk resolution of a large pool

extern crate klasspool;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use klasspool::prelude::*;
use std::hint::black_box;

/// Inert collaborator: every class exists, with canonical per-name identity.
struct NullEnv {
    symbols: SymbolTable,
    classes: dashmap::DashMap<String, KlassRc>,
}

impl NullEnv {
    fn new() -> Self {
        NullEnv {
            symbols: SymbolTable::new(),
            classes: dashmap::DashMap::new(),
        }
    }
}

impl RuntimeEnv for NullEnv {
    fn resolve_or_fail(&self, name: &Symbol, loader: LoaderId) -> klasspool::Result<KlassRc> {
        Ok(self
            .classes
            .entry(name.to_string())
            .or_insert_with(|| Klass::new(name.clone(), loader, KlassFlags::PUBLIC))
            .clone())
    }

    fn intern_string(&self, contents: &str) -> HeapRef {
        HeapRef::new(HeapObject::String(contents.into()))
    }

    fn link_method_handle(
        &self,
        _kind: RefKind,
        _holder: &KlassRc,
        _name: &Symbol,
        _descriptor: &Symbol,
    ) -> klasspool::Result<HeapRef> {
        Ok(HeapRef::new(HeapObject::Opaque(
            self.symbols.intern("MethodHandle"),
        )))
    }

    fn link_method_type(&self, _descriptor: &Symbol) -> klasspool::Result<HeapRef> {
        Ok(HeapRef::new(HeapObject::Opaque(
            self.symbols.intern("MethodType"),
        )))
    }

    fn invoke_bootstrap_method(
        &self,
        _specifier: &BootstrapSpecifier,
    ) -> klasspool::Result<HeapRef> {
        Ok(HeapRef::new(HeapObject::Opaque(
            self.symbols.intern("CallSite"),
        )))
    }
}

const CLASSES: usize = 512;

fn build_class_heavy_pool(symbols: &SymbolTable) -> (ConstantPool, Vec<u16>) {
    let mut builder = PoolBuilder::new(symbols.intern("bench/Holder"), LoaderId::BOOTSTRAP);
    let mut class_indices = Vec::with_capacity(CLASSES);
    for i in 0..CLASSES {
        let name = builder.push_utf8(symbols.intern(&format!("bench/Class{i:04}")));
        class_indices.push(builder.push_class(name));
    }
    (builder.build().unwrap(), class_indices)
}

fn bench_resolved_klass_fast_path(c: &mut Criterion) {
    let symbols = SymbolTable::new();
    let (pool, class_indices) = build_class_heavy_pool(&symbols);
    let env = NullEnv::new();
    pool.preresolve(&env);

    let mut group = c.benchmark_group("klass_fast_path");
    group.throughput(Throughput::Elements(class_indices.len() as u64));
    group.bench_function("klass_at_resolved", |b| {
        b.iter(|| {
            for &index in &class_indices {
                black_box(pool.klass_at(black_box(index), &env).unwrap());
            }
        });
    });
    group.bench_function("tag_at", |b| {
        b.iter(|| {
            for &index in &class_indices {
                black_box(pool.tag_at(black_box(index)));
            }
        });
    });
    group.finish();
}

fn bench_cached_constant_fast_path(c: &mut Criterion) {
    let symbols = SymbolTable::new();
    let mut builder = PoolBuilder::new(symbols.intern("bench/Holder"), LoaderId::BOOTSTRAP);
    let mut string_indices = Vec::new();
    for i in 0..256 {
        let text = builder.push_utf8(symbols.intern(&format!("constant string {i}")));
        string_indices.push(builder.push_string(text));
    }
    let pool = builder.build().unwrap();
    let env = NullEnv::new();

    let reference_indices: Vec<u32> = string_indices
        .iter()
        .map(|&index| {
            pool.string_at(index, &env).unwrap();
            pool.reference_index_at(index).unwrap()
        })
        .collect();

    let mut group = c.benchmark_group("cached_constant");
    group.throughput(Throughput::Elements(reference_indices.len() as u64));
    group.bench_function("resolve_cached_constant_at", |b| {
        b.iter(|| {
            for &reference in &reference_indices {
                black_box(pool.resolve_cached_constant_at(black_box(reference), &env).unwrap());
            }
        });
    });
    group.finish();
}

fn bench_first_time_resolution(c: &mut Criterion) {
    let symbols = SymbolTable::new();
    let env = NullEnv::new();

    let mut group = c.benchmark_group("first_resolution");
    group.throughput(Throughput::Elements(CLASSES as u64));
    group.bench_function("preresolve_cold_pool", |b| {
        b.iter_batched(
            || build_class_heavy_pool(&symbols).0,
            |pool| black_box(pool.preresolve(&env)),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_resolved_klass_fast_path,
    bench_cached_constant_fast_path,
    bench_first_time_resolution
);
criterion_main!(benches);
