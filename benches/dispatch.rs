use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kvfs::{KvfsBuilder, MemoryStore, SimpleFdTable, SyscallRequest, SyscallVfs};
use std::sync::Arc;

fn adapter() -> Arc<SyscallVfs> {
    KvfsBuilder::new()
        .store(MemoryStore::new())
        .fd_table(Arc::new(SimpleFdTable::default()))
        .build()
        .unwrap()
}

/// Benchmark the path grammar matchers on representative inputs
fn bench_path_grammar(c: &mut Criterion) {
    let paths = [
        "./db1/t1.frm",
        "./db1/db.opt",
        "./db1/sub/t1.frm",
        "/var/log/engine.log",
    ];

    let mut group = c.benchmark_group("path_grammar");
    for path in paths {
        group.bench_with_input(BenchmarkId::from_parameter(path), &path, |b, &path| {
            b.iter(|| kvfs::core::path::is_known_file(black_box(path)));
        });
    }
    group.finish();
}

/// Benchmark full typed dispatch of the cheap probing calls
fn bench_dispatch_probes(c: &mut Criterion) {
    let vfs = adapter();
    vfs.write("./db1/db.opt", b"charset=utf8", 0).unwrap();
    vfs.write("./db1/t1.frm", &vec![0u8; 4096], 0).unwrap();

    let mut group = c.benchmark_group("dispatch_probes");

    group.bench_function("stat_hit", |b| {
        b.iter(|| {
            vfs.dispatch(black_box(SyscallRequest::Stat {
                path: "./db1/t1.frm",
            }))
            .unwrap()
        });
    });

    group.bench_function("stat_miss", |b| {
        b.iter(|| {
            vfs.dispatch(black_box(SyscallRequest::Stat {
                path: "./db1/ghost.frm",
            }))
            .unwrap()
        });
    });

    group.bench_function("access_folder", |b| {
        b.iter(|| {
            vfs.dispatch(black_box(SyscallRequest::Access { path: "./db1/" }))
                .unwrap()
        });
    });

    group.bench_function("passthrough", |b| {
        b.iter(|| {
            vfs.dispatch(black_box(SyscallRequest::Unlink {
                path: "/var/log/engine.log",
            }))
            .unwrap()
        });
    });

    group.finish();
}

/// Benchmark the data path at a few entry sizes
fn bench_write_read(c: &mut Criterion) {
    let sizes = [512usize, 4096, 65536];

    let mut group = c.benchmark_group("write_read");
    for size in sizes {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("write", size), &size, |b, &size| {
            let vfs = adapter();
            let data = vec![0xA5u8; size];
            b.iter(|| vfs.write("./db1/t1.frm", black_box(&data), 0).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("read", size), &size, |b, &size| {
            let vfs = adapter();
            vfs.write("./db1/t1.frm", &vec![0xA5u8; size], 0).unwrap();
            let mut buf = vec![0u8; size];
            b.iter(|| vfs.read("./db1/t1.frm", black_box(&mut buf), 0).unwrap());
        });
    }
    group.finish();
}

/// Benchmark directory synthesis over a populated store
fn bench_dir_listing(c: &mut Criterion) {
    let vfs = adapter();
    for db in 0..100 {
        vfs.write(&format!("./db{}/db.opt", db), b"", 0).unwrap();
        for table in 0..10 {
            vfs.write(&format!("./db{}/t{}.frm", db, table), b"def", 0)
                .unwrap();
        }
    }

    let mut group = c.benchmark_group("dir_listing");
    group.bench_function("root_100_dbs", |b| {
        b.iter(|| black_box(vfs.dir(".").unwrap()));
    });
    group.bench_function("folder_10_tables", |b| {
        b.iter(|| black_box(vfs.dir("./db42/").unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_path_grammar,
    bench_dispatch_probes,
    bench_write_read,
    bench_dir_listing,
);
criterion_main!(benches);
