// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for parsing Go sources and generating wrappers.
//!
//! Run with: `cargo bench --bench generate`

use std::collections::HashMap;
use std::hint::black_box;
use std::path::PathBuf;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::sync::watch;

use otwgen::generate::{assemble, generate_all, GenerateOptions, Grouping, TracingTarget, WorkUnit};
use otwgen::loader::{GoParser, Package, SourceFile};

/// A source file with `funcs` wrappable functions and one wrappable type.
fn synthetic_source(index: usize, funcs: usize) -> String {
    let mut source = String::from(
        "package bench\n\nimport (\n\t\"context\"\n\tstdio \"io\"\n)\n\n",
    );
    source.push_str(&format!(
        "type Client{} struct{{}}\n\nfunc (c *Client{}) Do(ctx context.Context, r stdio.Reader) (int, error) {{\n\treturn 0, nil\n}}\n\n",
        index, index
    ));
    for i in 0..funcs {
        source.push_str(&format!(
            "// Call{i} does work.\nfunc Call{index}_{i}(ctx context.Context, n int, opts ...string) error {{\n\treturn nil\n}}\n\nfunc helper{index}_{i}(n int) int {{\n\treturn n\n}}\n\n",
        ));
    }
    source
}

fn synthetic_package(files: usize, funcs: usize) -> Package {
    let mut parser = GoParser::new().unwrap();
    let files = (0..files)
        .map(|i| {
            let path = PathBuf::from("bench").join(format!("file{}.go", i));
            let parsed = parser
                .parse_file(&path, &synthetic_source(i, funcs))
                .unwrap();
            SourceFile {
                path,
                syntax: parsed.syntax,
            }
        })
        .collect();
    Package {
        id: "example.com/bench".to_string(),
        name: "bench".to_string(),
        dir: PathBuf::from("bench"),
        files,
        imports: HashMap::from([
            ("context".to_string(), "context".to_string()),
            ("io".to_string(), "io".to_string()),
        ]),
        errors: Vec::new(),
    }
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for funcs in [10, 100] {
        let source = synthetic_source(0, funcs);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_file", funcs), &source, |b, source| {
            let mut parser = GoParser::new().unwrap();
            let path = PathBuf::from("bench/file0.go");
            b.iter(|| parser.parse_file(black_box(&path), black_box(source)));
        });
    }

    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    let tracing = TracingTarget::default();

    for funcs in [10, 100] {
        let package = Arc::new(synthetic_package(1, funcs));
        let unit = WorkUnit::for_package(package, Grouping::PerPackage).remove(0);
        group.throughput(Throughput::Elements(funcs as u64));
        group.bench_with_input(BenchmarkId::new("assemble_render", funcs), &unit, |b, unit| {
            b.iter(|| assemble(black_box(unit), &tracing).map(|file| file.render()));
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let packages: Vec<Package> = (0..8)
        .map(|i| {
            let mut package = synthetic_package(4, 20);
            package.id = format!("example.com/bench{}", i);
            package
        })
        .collect();

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(packages.len() as u64));

    for workers in [1, 4] {
        group.bench_with_input(
            BenchmarkId::new("generate_all", workers),
            &workers,
            |b, &workers| {
                b.to_async(&runtime).iter(|| {
                    let packages = packages.clone();
                    async move {
                        let (_tx, cancel) = watch::channel(false);
                        let options = GenerateOptions {
                            workers,
                            channel_capacity: workers * 2,
                            ..Default::default()
                        };
                        generate_all(packages, options, cancel).await
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_assemble, bench_pipeline);
criterion_main!(benches);
