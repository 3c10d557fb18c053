use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fiber_core::{Element, Node};
use fiber_testing::TestRoot;

const ITEM_COUNT_SAMPLES: &[usize] = &[16, 128, 1024];
const ROTATE_ITEM_COUNT: usize = 256;

fn keyed_list(keys: &[usize]) -> Node {
    Element::host("ul")
        .children(keys.iter().map(|&key| {
            Node::from(
                Element::host("li")
                    .key(key.to_string())
                    .attr("data-id", key as i64)
                    .child(key),
            )
        }))
        .into()
}

struct ReorderFixture {
    root: TestRoot,
    keys: Vec<usize>,
}

impl ReorderFixture {
    fn new(item_count: usize) -> Self {
        let fixture = Self {
            root: TestRoot::new(),
            keys: (0..item_count).collect(),
        };
        fixture.commit();
        fixture
    }

    fn commit(&self) {
        if let Err(err) = self.root.render(keyed_list(&self.keys)) {
            panic!("benchmark render failed: {err}");
        }
        // The host log grows with every commit; keep it bounded.
        black_box(self.root.take_ops());
    }

    fn reverse(&mut self) {
        self.keys.reverse();
        self.commit();
    }

    fn rotate(&mut self) {
        self.keys.rotate_right(1);
        self.commit();
    }
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_mount");
    for &item_count in ITEM_COUNT_SAMPLES {
        group.bench_with_input(
            BenchmarkId::new("items", item_count),
            &item_count,
            |b, &item_count| {
                b.iter(|| {
                    let fixture = ReorderFixture::new(item_count);
                    black_box(fixture.root.top_level());
                });
            },
        );
    }
    group.finish();
}

fn bench_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_reverse");
    for &item_count in ITEM_COUNT_SAMPLES {
        group.bench_with_input(
            BenchmarkId::new("items", item_count),
            &item_count,
            |b, &item_count| {
                let mut fixture = ReorderFixture::new(item_count);
                b.iter(|| fixture.reverse());
            },
        );
    }
    group.finish();
}

fn bench_rotate(c: &mut Criterion) {
    let mut fixture = ReorderFixture::new(ROTATE_ITEM_COUNT);

    c.bench_function("keyed_rotate_one", |b| {
        b.iter(|| fixture.rotate());
    });
}

fn bench_rerender_unchanged(c: &mut Criterion) {
    let fixture = ReorderFixture::new(ROTATE_ITEM_COUNT);

    c.bench_function("keyed_rerender_unchanged", |b| {
        b.iter(|| fixture.commit());
    });
}

criterion_group!(
    keyed_reorder,
    bench_mount,
    bench_reverse,
    bench_rotate,
    bench_rerender_unchanged
);
criterion_main!(keyed_reorder);
