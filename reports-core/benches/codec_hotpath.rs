use reports_core::{
    from_epoch_millis, ReportInstance, ReportInstanceStatus, SearchItem, SearchResults,
    StreamCodec, StreamInput, StreamOutput,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

const LIST_FIELD: &str = "reportInstanceList";

fn bench_page(size: usize) -> SearchResults<ReportInstance> {
    let ts = from_epoch_millis(1_603_506_908_773).expect("valid timestamp");
    let items = (0..size)
        .map(|n| ReportInstance {
            id: format!("instance-{n}"),
            last_updated_time: ts,
            created_time: ts,
            begin_time: ts,
            end_time: ts,
            tenant: String::new(),
            access: vec!["User:admin".to_string(), "BERole:analyst".to_string()],
            report_definition_details: None,
            status: ReportInstanceStatus::Success,
            status_text: Some("Generated".to_string()),
            in_context_download_url_path: Some(format!("/reports/instance-{n}")),
        })
        .collect();
    SearchResults::new(0, size as u64, items, LIST_FIELD).expect("valid page")
}

fn bench_codec(c: &mut Criterion) {
    let page = bench_page(100);

    c.bench_function("codec/page_to_document", |b| {
        b.iter(|| black_box(page.to_document()));
    });

    let doc = page.to_document();
    c.bench_function("codec/page_from_document", |b| {
        b.iter(|| {
            let parsed =
                SearchResults::<ReportInstance>::from_document(black_box(&doc), LIST_FIELD)
                    .expect("parse page");
            black_box(parsed.total_hits());
        });
    });

    let mut out = StreamOutput::new();
    page.write_to(&mut out);
    let bytes = out.freeze();
    c.bench_function("codec/page_from_stream", |b| {
        b.iter(|| {
            let mut input = StreamInput::new(black_box(&bytes));
            let parsed = SearchResults::<ReportInstance>::read_from(&mut input, LIST_FIELD)
                .expect("read page");
            black_box(parsed.items()[0].id().len());
        });
    });

    let item = &page.items()[0];
    c.bench_function("codec/instance_to_stream", |b| {
        b.iter(|| black_box(item.to_stream_bytes()));
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
