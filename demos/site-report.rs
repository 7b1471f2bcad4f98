//! Generates a report for a small sample project.
//!
//! ```sh
//! cargo run --example site-report -- [config.json] [output-dir]
//! ```
//!
//! Set `RUST_LOG=debug` to follow pagination and embedding decisions.

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use punch_report::dashboard::{RecordFilter, StatusFilter};
use punch_report::store::{watch_records, MemoryStore, RecordQuery, RecordStore};
use punch_report::{
    NewRecord, PhotoUpload, RecordPatch, RecordPublisher, ReportAssets, ReportConfig,
    ReportGenerator, ReportPublisher, Status,
};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const PROJECT: &str = "Emek Projesi";

fn sample_photo() -> Vec<u8> {
    let photo = RgbImage::from_fn(320, 240, |x, y| {
        image::Rgb([(x / 2) as u8, (y / 2) as u8, 140])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(photo)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Jpeg(85))
        .expect("can encode photo");
    bytes
}

fn new_record(location: &str, assignee: &str, status: Status) -> NewRecord {
    NewRecord {
        project_name: PROJECT.to_string(),
        location: location.to_string(),
        assignee: assignee.to_string(),
        status,
        description: None,
        comment: None,
        qr_payload: None,
        photo_url: None,
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "report.json".to_string());
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let config = ReportConfig::load(&config_path).expect("can load configuration");
    let assets = ReportAssets::load(&config);
    let bucket = config.bucket.clone();
    let generator = ReportGenerator::new(config, assets);

    let store = Arc::new(MemoryStore::with_public_base("https://files.example.com/"));

    // keep a local copy of the project's records, refreshed on every change
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    let mut subscription = watch_records(
        store.as_ref(),
        Arc::clone(&store),
        RecordQuery::project(PROJECT),
        move |fresh| *sink.lock().expect("records lock") = fresh,
    );

    let mut first = new_record("Blok A", "Ali", Status::Open);
    first.description = Some(lipsum::lipsum(70));
    first.qr_payload = Some("EMEK-BLK-A-001".to_string());
    let photo = PhotoUpload::new("blok-a.jpg", sample_photo());
    let saver = RecordPublisher::new(store.as_ref(), store.as_ref(), bucket.clone());
    let first = saver.insert(first, Some(&photo)).expect("can insert");

    let mut second = new_record("Blok B / Kat 3", "Ayşe", Status::Faulty);
    second.comment = Some("Çatlak sıva, yeniden kontrol edilecek.".to_string());
    store.insert(second).expect("can insert");

    store
        .insert(new_record("Otopark", "Mehmet", Status::Completed))
        .expect("can insert");
    store
        .update(first.id, &RecordPatch {
            comment: Some(Some(lipsum::lipsum(25))),
            ..RecordPatch::default()
        })
        .expect("can update");

    subscription.unsubscribe();

    let mut all = records.lock().expect("records lock").clone();
    // records carry photo URLs; the report needs the bytes
    if let Some(record) = all.iter_mut().find(|r| r.id == first.id) {
        record.photo = Some(photo.bytes.clone());
    }

    let (view, stats) = RecordFilter::new(StatusFilter::All, None).view(&all);
    println!(
        "{} records, {:.1}% complete",
        stats.total,
        stats.progress()
    );

    let report = generator
        .generate_report(PROJECT, &view, &stats)
        .expect("can generate report");
    let path = out_dir.join(&report.file_name);
    report.write_to(&path).expect("can write report");
    println!("wrote {} ({} pages)", path.display(), report.page_count);

    let publisher = ReportPublisher::new(store.as_ref(), store.as_ref(), bucket);
    let url = publisher
        .publish(&report, Some(first.id))
        .expect("can publish report");
    println!("published to {url}");
}
