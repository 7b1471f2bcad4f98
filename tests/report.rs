use chrono::{NaiveDate, TimeZone, Utc};
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use punch_report::dashboard::{RecordFilter, StatusFilter};
use punch_report::store::{MemoryStore, RecordQuery, RecordStore};
use punch_report::{
    colours, Document, Image, Mm, NewRecord, Pt, Record, RecordId, ReportAssets, ReportConfig,
    ReportGenerator, ReportPublisher, Shape, Stats, Status,
};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::sync::Arc;

fn report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn record(id: i64) -> Record {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    Record::new(RecordId(id), "Emek Projesi", "Blok A", "Ali", Status::Open, created)
}

fn generator() -> ReportGenerator {
    ReportGenerator::new(ReportConfig::default(), ReportAssets::default())
}

fn photo(format: ImageOutputFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_fn(120, 60, |x, _| image::Rgb([x as u8, 80, 160])))
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode test photo");
    bytes
}

fn texts(document: &Document) -> Vec<String> {
    document
        .pages()
        .flat_map(|page| page.spans().map(|span| span.text.clone()))
        .collect()
}

fn block_titles(document: &Document) -> Vec<String> {
    texts(document)
        .into_iter()
        .filter(|t| t.starts_with("Record #"))
        .collect()
}

fn sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[test]
fn records_keep_their_input_order() {
    let records: Vec<_> = [5, 3, 9, 1, 7].into_iter().map(record).collect();
    let document = generator()
        .build_document_on("P", &records, &Stats::from_records(&records), report_date())
        .unwrap();
    assert_eq!(
        block_titles(&document),
        ["Record #5", "Record #3", "Record #9", "Record #1", "Record #7"]
    );
}

#[test]
fn page_count_follows_the_fixed_stride() {
    for (count, pages) in [(0, 1), (1, 1), (2, 1), (3, 2), (4, 2), (5, 3), (10, 5)] {
        let records: Vec<_> = (1..=count).map(record).collect();
        let report = generator()
            .generate_report_on("P", &records, &Stats::from_records(&records), report_date())
            .unwrap();
        assert_eq!(report.page_count, pages, "{count} records");
    }
}

#[test]
fn blocks_are_never_split_across_pages() {
    let config = ReportConfig::default();
    let bottom = Pt::from(config.margins.bottom);
    let records: Vec<_> = (1..=9).map(|id| record(id).with_description(lipsum::lipsum(30))).collect();
    let document = generator()
        .build_document_on("P", &records, &Stats::from_records(&records), report_date())
        .unwrap();

    let mut blocks = 0;
    for page in document.pages() {
        for shape in page.shapes() {
            if let (Shape::RoundedRect { rect, .. }, Some((colour, _))) = (&shape.shape, shape.stroke) {
                assert_eq!(colour, colours::BORDER);
                assert!(rect.y1 >= bottom - Pt(1e-3), "block reaches into the bottom margin");
                assert!(rect.y2 <= page.height());
                assert!((Mm::from(rect.height()).0 - 60.0).abs() < 1e-3);
                blocks += 1;
            }
        }
    }
    assert_eq!(blocks, 9);
}

#[test]
fn corrupt_photos_leave_the_rest_of_the_block_intact() {
    let broken = record(1)
        .with_photo(b"\xFF\xD8\xFF definitely not a jpeg".to_vec())
        .with_qr("BLK-A-001");
    let document = generator()
        .build_document_on("P", &[broken], &Stats::default(), report_date())
        .unwrap();

    let page = document.pages().next().unwrap();
    // only the QR symbol made it
    assert_eq!(page.images().count(), 1);
    let texts = texts(&document);
    for expected in [
        "Record #1",
        "Location: Blok A",
        "Assignee: Ali",
        "Status: Open",
        "Date: 01.01.2025",
        "QR Code: BLK-A-001",
    ] {
        assert!(texts.iter().any(|t| t == expected), "missing {expected:?}");
    }
}

#[test]
fn photos_are_fitted_and_anchored_to_the_block_top() {
    let short = record(1).with_photo(photo(ImageOutputFormat::Png));
    let long = record(2)
        .with_photo(photo(ImageOutputFormat::Jpeg(90)))
        .with_description(lipsum::lipsum(120));

    let generator = generator();
    let position = |r: Record| {
        let document = generator
            .build_document_on("P", &[r], &Stats::default(), report_date())
            .unwrap();
        let page = document.pages().next().unwrap();
        let placed = page.images().next().expect("photo placed").position;
        placed
    };

    let a = position(short);
    let b = position(long);
    assert_eq!(a, b);
    // a 2:1 photo in a 60 x 45 mm box fills the width
    assert!((Mm::from(a.width()).0 - 60.0).abs() < 1e-3);
    assert!((Mm::from(a.height()).0 - 30.0).abs() < 1e-3);
}

#[test]
fn identical_inputs_give_identical_bytes() {
    let records = vec![
        record(1).with_description(lipsum::lipsum(60)).with_qr("Q-1"),
        record(2).with_photo(photo(ImageOutputFormat::Png)),
        record(3).with_comment("Follow up next week"),
    ];
    let stats = Stats::from_records(&records);

    let first = generator()
        .generate_report_on("Emek Projesi", &records, &stats, report_date())
        .unwrap();
    let second = generator()
        .generate_report_on("Emek Projesi", &records, &stats, report_date())
        .unwrap();
    assert_eq!(sha256(&first.bytes), sha256(&second.bytes));

    let next_day = generator()
        .generate_report_on("Emek Projesi", &records, &stats, report_date().succ_opt().unwrap())
        .unwrap();
    assert_ne!(sha256(&first.bytes), sha256(&next_day.bytes));
}

#[test]
fn badges_show_stats_exactly_as_given() {
    // deliberately inconsistent; rendered as given
    let stats = Stats {
        open: 12,
        faulty: 0,
        closed: 7,
        completed: 3,
        total: 99,
    };
    let document = generator()
        .build_document_on("P", &[], &stats, report_date())
        .unwrap();
    let texts = texts(&document);
    let badges: Vec<_> = texts.iter().skip(2).map(String::as_str).collect();
    assert_eq!(
        badges,
        ["Open", "12", "Faulty", "0", "Closed", "7", "Completed", "3", "Total", "99"]
    );

    let page = document.pages().next().unwrap();
    let fills: Vec<_> = page.shapes().filter_map(|s| s.fill).collect();
    assert_eq!(
        fills,
        [colours::BLUE, colours::RED, colours::GREY, colours::GREEN, colours::PURPLE]
    );
}

#[test]
fn empty_reports_have_one_page_of_header_and_zeros() {
    let report = generator()
        .generate_report_on("X", &[], &Stats::default(), report_date())
        .unwrap();
    assert_eq!(report.page_count, 1);
    assert!(report.bytes.starts_with(b"%PDF-"));
    assert_eq!(report.file_name, "X_01.01.2025.pdf");
    assert!(report.to_data_uri().starts_with("data:application/pdf;base64,JVBERi"));

    let document = generator()
        .build_document_on("X", &[], &Stats::default(), report_date())
        .unwrap();
    let texts = texts(&document);
    assert_eq!(texts.len(), 12);
    assert_eq!(texts[0], "X - Project Report");
    assert!(block_titles(&document).is_empty());
    assert!(document.outline.is_empty());
}

#[test]
fn emek_projesi_scenario() {
    let description: String = lipsum::lipsum(120).chars().take(400).collect();
    assert_eq!(description.chars().count(), 400);
    let records = vec![record(1).with_description(description.clone())];
    let stats: Stats =
        serde_json::from_str(r#"{"acik":1,"hatali":0,"kapali":0,"tamamlandi":0,"toplam":1}"#)
            .unwrap();

    let generator = generator();
    let document = generator
        .build_document_on("Emek Projesi", &records, &stats, report_date())
        .unwrap();
    assert_eq!(document.page_count(), 1);

    let texts = texts(&document);
    for expected in [
        "Emek Projesi - Project Report",
        "Record #1",
        "Location: Blok A",
        "Assignee: Ali",
        "Status: Open",
        "Date: 01.01.2025",
        "Description:",
    ] {
        assert!(texts.iter().any(|t| t == expected), "missing {expected:?}");
    }
    assert!(!texts.iter().any(|t| t.starts_with("QR Code")));

    // the description is wrapped onto several lines and nothing is lost
    let start = texts.iter().position(|t| t == "Description:").unwrap() + 1;
    let wrapped = &texts[start..];
    assert!(wrapped.len() > 1);
    let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    assert_eq!(normalize(&wrapped.join(" ")), normalize(&description));

    let page = document.pages().next().unwrap();
    assert_eq!(page.images().count(), 0);

    let report = generator
        .generate_report_on("Emek Projesi", &records, &stats, report_date())
        .unwrap();
    assert_eq!(report.page_count, 1);
    assert_eq!(report.file_name, "Emek Projesi_01.01.2025.pdf");
}

#[test]
fn turkish_text_is_folded_for_helvetica() {
    let mut r = record(1);
    r.location = "Şantiye İç Alan".to_string();
    r.assignee = "Ayşe Güneş".to_string();
    let document = generator()
        .build_document_on("Proje Ağı", &[r], &Stats::default(), report_date())
        .unwrap();
    let texts = texts(&document);
    assert_eq!(texts[0], "Proje Agi - Project Report");
    assert!(texts.iter().any(|t| t == "Location: Santiye Iç Alan"));
    assert!(texts.iter().any(|t| t == "Assignee: Ayse Günes"));
}

#[test]
fn concurrent_calls_are_independent() {
    let generator = Arc::new(generator());
    let inputs: Vec<Vec<Record>> = (1..=6)
        .map(|n| (1..=n).map(|id| record(id).with_qr(format!("QR-{id}"))).collect())
        .collect();

    let expected: Vec<Vec<u8>> = inputs
        .iter()
        .map(|records| {
            generator
                .generate_report_on("P", records, &Stats::from_records(records), report_date())
                .unwrap()
                .bytes
        })
        .collect();

    let handles: Vec<_> = inputs
        .into_iter()
        .map(|records| {
            let generator = Arc::clone(&generator);
            std::thread::spawn(move || {
                generator
                    .generate_report_on("P", &records, &Stats::from_records(&records), report_date())
                    .unwrap()
                    .bytes
            })
        })
        .collect();

    for (handle, expected) in handles.into_iter().zip(expected) {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn filtered_views_publish_back_to_the_store() {
    let store = MemoryStore::with_public_base("https://files.example/");
    for (location, status) in [
        ("Blok A", Status::Open),
        ("Blok B", Status::Completed),
        ("Otopark", Status::Open),
    ] {
        store
            .insert(NewRecord {
                project_name: "Emek Projesi".to_string(),
                location: location.to_string(),
                assignee: "Ali".to_string(),
                status,
                description: None,
                comment: None,
                qr_payload: None,
                photo_url: None,
            })
            .unwrap();
    }

    let all = store.select(&RecordQuery::project("Emek Projesi")).unwrap();
    let filter = RecordFilter::new(StatusFilter::Only(Status::Open), Some("blok".to_string()));
    let (view, stats) = filter.view(&all);
    assert_eq!(view.len(), 1);
    assert_eq!(stats.open, 1);

    let report = generator()
        .generate_report_on("Emek Projesi", &view, &stats, report_date())
        .unwrap();
    let publisher = ReportPublisher::new(&store, &store, "site");
    let url = publisher.publish(&report, Some(view[0].id)).unwrap();
    assert_eq!(url, "https://files.example/site/reports/Emek Projesi_01.01.2025.pdf");

    let (stored, content_type) = store
        .object("site", "reports/Emek Projesi_01.01.2025.pdf")
        .unwrap();
    assert_eq!(stored, report.bytes);
    assert_eq!(content_type, "application/pdf");

    let updated = store.select(&RecordQuery::project("Emek Projesi")).unwrap();
    let linked: Vec<_> = updated.iter().filter(|r| r.pdf_url.is_some()).collect();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].id, view[0].id);
}

fn span_y(document: &Document, text: &str) -> Pt {
    document
        .pages()
        .flat_map(|page| page.spans())
        .find(|span| span.text == text)
        .unwrap_or_else(|| panic!("no span {text:?}"))
        .coords
        .1
}

fn close(a: Pt, b: Pt) -> bool {
    (a.0 - b.0).abs() < 1e-2
}

#[test]
fn logos_fill_the_header_box() {
    let logo = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 100, image::Rgb([0, 90, 170])));
    let assets = ReportAssets::new(Some(Image::from_dynamic(&logo)), Default::default());
    let generator = ReportGenerator::new(ReportConfig::default(), assets);
    let document = generator
        .build_document_on("P", &[], &Stats::default(), report_date())
        .unwrap();

    let page = document.pages().next().unwrap();
    let images: Vec<_> = page.images().collect();
    assert_eq!(images.len(), 1);
    let placed = images[0].position;
    // (10, 8) mm from the top-left of a 210 mm tall page, 40 x 18 mm
    assert!(close(placed.x1, Mm(10.0).into()));
    assert!(close(placed.y2, Mm(210.0 - 8.0).into()));
    assert!(close(placed.width(), Mm(40.0).into()));
    assert!(close(placed.height(), Mm(18.0).into()));
}

#[test]
fn unencodable_qr_payloads_keep_the_photo() {
    let payload = "x".repeat(5000);
    let document = generator()
        .build_document_on(
            "P",
            &[record(1)
                .with_photo(photo(ImageOutputFormat::Png))
                .with_qr(payload.clone())],
            &Stats::default(),
            report_date(),
        )
        .unwrap();

    let page = document.pages().next().unwrap();
    let images: Vec<_> = page.images().collect();
    assert_eq!(images.len(), 1);
    // the one image is the photo, in the 60 mm wide photo box
    assert!(close(images[0].position.width(), Mm(60.0).into()));
    assert!(texts(&document).contains(&format!("QR Code: {payload}")));
}

#[test]
fn comments_follow_the_description() {
    let document = generator()
        .build_document_on(
            "P",
            &[record(1)
                .with_description("one\ntwo\nthree")
                .with_comment("checked")],
            &Stats::default(),
            report_date(),
        )
        .unwrap();

    let description = span_y(&document, "Description:");
    let comment = span_y(&document, "Comment:");
    // three wrapped lines at 5 mm plus 5 mm paragraph spacing
    assert!(close(description - comment, Mm(3.0 * 5.0 + 5.0).into()));
    assert!(close(description - span_y(&document, "one"), Mm(5.0).into()));
    assert!(close(comment - span_y(&document, "checked"), Mm(5.0).into()));
}
