//! Benchmarks for the execute/flatten path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Write;
use tempfile::NamedTempFile;
use tensorlink_api::{ElementType, Predictor, SessionOptions};

fn manifest_with_sequence(leaves: usize, elements: usize) -> String {
    let values: Vec<String> = (0..elements).map(|i| format!("{}.0", i % 10)).collect();
    let values = values.join(", ");
    let mut nodes = Vec::new();
    for i in 0..leaves {
        nodes.push(format!(
            r#"{{"op": "Constant", "outputs": ["c{i}"], "dtype": "float32",
                "dims": [{elements}], "values": [{values}]}}"#
        ));
    }
    let inputs: Vec<String> = (0..leaves).map(|i| format!("\"c{i}\"")).collect();
    nodes.push(format!(
        r#"{{"op": "SequenceConstruct", "inputs": [{}], "outputs": ["seq"]}}"#,
        inputs.join(", ")
    ));
    format!(
        r#"{{"name": "bench", "inputs": [], "outputs": ["seq"], "nodes": [{}]}}"#,
        nodes.join(", ")
    )
}

fn bench_convert_output(c: &mut Criterion) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(manifest_with_sequence(32, 256).as_bytes())
        .unwrap();
    let options = SessionOptions::default().with_profiling(false);
    let mut pred = Predictor::new(file.path(), options).unwrap();
    pred.run().unwrap();

    c.bench_function("convert_output/32x256xf32", |b| {
        b.iter(|| {
            pred.convert_output().unwrap();
            black_box(pred.num_outputs())
        })
    });
}

fn bench_identity_cycle(c: &mut Criterion) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"{
            "inputs": [{"name": "x", "dtype": "float32", "dims": [1, 1024]}],
            "outputs": ["y"],
            "nodes": [{"op": "Identity", "inputs": ["x"], "outputs": ["y"]}]
        }"#,
    )
    .unwrap();
    let options = SessionOptions::default().with_profiling(false);
    let mut pred = Predictor::new(file.path(), options).unwrap();
    let data = vec![0u8; 4 * 1024];

    c.bench_function("bind_run_convert/1024xf32", |b| {
        b.iter(|| {
            pred.clear();
            unsafe {
                pred.add_input(data.as_ptr(), &[1, 1024], ElementType::F32.to_wire())
                    .unwrap();
            }
            pred.run().unwrap();
            pred.convert_output().unwrap();
            black_box(pred.num_outputs())
        })
    });
}

criterion_group!(benches, bench_convert_output, bench_identity_cycle);
criterion_main!(benches);
