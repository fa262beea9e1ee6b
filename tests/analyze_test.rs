//! End-to-end tests over real PDF files.

use std::fs;
use std::path::PathBuf;

use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, Stream};
use pdfratio::job::{JobQueue, JobStatus, QueueOptions};
use pdfratio::{analyze, Document, Error, JsonFormat, ReportColor, TreeBackend};
use tempfile::TempDir;

/// One page of a generated test PDF.
#[derive(Default)]
struct TestPage {
    /// Shown at 10pt from (72, 700); each glyph is estimated 5pt wide, 10pt tall
    text: Option<&'static str>,
    /// (width, height) of each image; a `None` height omits `/Height`
    images: Vec<(i64, Option<i64>)>,
}

impl TestPage {
    fn text(text: &'static str) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }

    fn with_image(mut self, width: i64, height: i64) -> Self {
        self.images.push((width, Some(height)));
        self
    }
}

fn write_pdf(dir: &TempDir, name: &str, pages: Vec<TestPage>) -> PathBuf {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for page in pages {
        let mut xobjects = Dictionary::new();
        for (i, (width, height)) in page.images.iter().enumerate() {
            let mut image = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => *width,
                "BitsPerComponent" => 8,
                "ColorSpace" => "DeviceGray",
            };
            if let Some(height) = height {
                image.set("Height", *height);
            }
            let data = vec![0u8; (width * height.unwrap_or(1)) as usize];
            let image_id = doc.add_object(Stream::new(image, data));
            xobjects.set(format!("Im{}", i), image_id);
        }

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        };
        if let Some(text) = page.text {
            let content = format!("BT /F1 10 Tf 72 700 Td ({}) Tj ET", text);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            page_dict.set("Contents", content_id);
        }
        kids.push(Object::from(doc.add_object(page_dict)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.path().join(name);
    doc.save(&path).expect("failed to save test PDF");
    path
}

/// Write a one-page PDF whose page dictionary entries come from `page_entries`.
fn write_single_page(
    dir: &TempDir,
    name: &str,
    page_entries: impl FnOnce(&mut LopdfDocument) -> Dictionary,
) -> PathBuf {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut page = page_entries(&mut doc);
    page.set("Type", "Page");
    page.set("Parent", pages_id);
    let page_id = doc.add_object(page);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.path().join(name);
    doc.save(&path).expect("failed to save test PDF");
    path
}

#[test]
fn test_text_and_image_page() {
    let dir = TempDir::new().unwrap();
    // "Hello" is 25 × 10 = 250, the image 10 × 5 = 50
    let path = write_pdf(&dir, "mixed.pdf", vec![TestPage::text("Hello").with_image(10, 5)]);

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.page_count(), 1);
    let page = doc.page(0).unwrap();
    assert_eq!(page.width(), 595.0);
    assert_eq!(page.height(), 842.0);
    assert_eq!(page.text_area(), 250.0);
    assert_eq!(page.image_area(), 50.0);
    assert_eq!(page.ratio(), 5.0);
    assert_eq!(page.classification().color, ReportColor::Green);

    let report = analyze(&path).unwrap();
    assert!(report.contains("Text area: 250.00"));
    assert!(report.contains("Image area: 50.00"));
    assert!(report.contains("<span style=\"color: green\">5.00</span>"));
}

#[test]
fn test_balanced_page_is_orange() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "balanced.pdf", vec![TestPage::text("Hello").with_image(25, 10)]);

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.ratio(), 1.0);
    assert_eq!(doc.classification().color, ReportColor::Orange);
    assert_eq!(doc.classification().label, "1.00");
}

#[test]
fn test_images_only_page() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "scan.pdf", vec![TestPage::default().with_image(100, 100)]);

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.text_area(), 0.0);
    assert_eq!(doc.image_area(), 10000.0);
    assert_eq!(doc.ratio(), -1.0);

    let report = analyze(&path).unwrap();
    assert!(report.contains("<span style=\"color: red\">images only, no text</span>"));
}

#[test]
fn test_blank_page() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "blank.pdf", vec![TestPage::default()]);

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.ratio(), -2.0);
    assert_eq!(doc.classification().label, "no text or images");
    assert_eq!(doc.classification().color, ReportColor::Green);
}

#[test]
fn test_text_only_page() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "text.pdf", vec![TestPage::text("Hello")]);

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.text_area(), 250.0);
    assert_eq!(doc.ratio(), 0.0);
    assert_eq!(doc.classification().label, "text only, no images");
}

#[test]
fn test_document_totals_are_page_sums() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(
        &dir,
        "two.pdf",
        vec![
            TestPage::text("Hello").with_image(10, 5),
            TestPage::text("Hi").with_image(4, 5).with_image(2, 5),
        ],
    );

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.page_count(), 2);

    let text: f64 = doc.pages().iter().map(|p| p.text_area()).sum();
    let images: f64 = doc.pages().iter().map(|p| p.image_area()).sum();
    assert_eq!(doc.text_area(), text);
    assert_eq!(doc.image_area(), images);
    // "Hi" is 10 × 10
    assert_eq!(doc.text_area(), 350.0);
    assert_eq!(doc.image_area(), 80.0);

    let report = analyze(&path).unwrap();
    let doc_at = report.find("two.pdf").unwrap();
    let page1_at = report.find("<h2>Page 1</h2>").unwrap();
    let page2_at = report.find("<h2>Page 2</h2>").unwrap();
    assert!(doc_at < page1_at && page1_at < page2_at);
}

#[test]
fn test_progress_callback() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(
        &dir,
        "three.pdf",
        vec![TestPage::default(), TestPage::default(), TestPage::default()],
    );

    let mut calls = Vec::new();
    Document::open_with_progress(&path, |done, total| calls.push((done, total))).unwrap();
    assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
}

#[test]
fn test_close_twice() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "close.pdf", vec![TestPage::text("Hello")]);

    let mut doc = Document::open(&path).unwrap();
    assert!(!doc.is_closed());
    doc.close();
    doc.close();
    assert!(doc.is_closed());
    assert_eq!(doc.text_area(), 250.0);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = analyze(dir.path().join("missing.pdf")).unwrap_err();
    assert!(matches!(err, Error::DocumentOpen { .. }));
}

#[test]
fn test_not_a_pdf() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.pdf");
    fs::write(&path, "just some text").unwrap();

    let err = analyze(&path).unwrap_err();
    assert!(matches!(err, Error::DocumentOpen { .. }));
    assert!(err.to_string().contains("notes.pdf"));
}

#[test]
fn test_image_without_height_is_structural() {
    let dir = TempDir::new().unwrap();
    let mut page = TestPage::text("Hello");
    page.images.push((10, None));
    let path = write_pdf(&dir, "broken.pdf", vec![page]);

    let err = analyze(&path).unwrap_err();
    assert!(matches!(err, Error::Structural(_)));
}

#[test]
fn test_dump_with_missing_bbox_is_structural() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dump.json");
    fs::write(
        &path,
        r#"{"name": "d.pdf", "pages": [{"width": 1, "height": 1, "images": [],
            "blocks": [{"number": 0, "type": 0, "lines": []}]}]}"#,
    )
    .unwrap();

    let err = TreeBackend::from_path(&path).unwrap_err();
    assert!(matches!(err, Error::Structural(_)));
}

#[test]
fn test_json_summary() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "json.pdf", vec![TestPage::text("Hello").with_image(10, 5)]);

    let json = pdfratio::to_json(&path, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["page_count"], 1);
    assert_eq!(value["text_area"], 250.0);
    assert_eq!(value["ratio"], 5.0);
    assert_eq!(value["color"], "green");
    assert_eq!(value["pages"][0]["number"], 1);
}

#[test]
fn test_job_queue_end_to_end() {
    let dir = TempDir::new().unwrap();
    let good = write_pdf(&dir, "good.pdf", vec![TestPage::text("Hello"), TestPage::default()]);
    let missing = dir.path().join("missing.pdf");

    let queue = JobQueue::new(QueueOptions::new().with_workers(2));
    let good_id = queue.submit(&good).unwrap();
    let missing_id = queue.submit(&missing).unwrap();

    let report = queue.wait(good_id).unwrap();
    assert_eq!(report, analyze(&good).unwrap());
    assert_eq!(queue.status(good_id).unwrap(), JobStatus::Success);

    assert!(queue.wait(missing_id).is_err());
    match queue.status(missing_id).unwrap() {
        JobStatus::Failure { error } => assert!(error.contains("missing.pdf")),
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn test_form_xobject_text_and_images() {
    let dir = TempDir::new().unwrap();
    let path = write_single_page(&dir, "form.pdf", |doc| {
        let image = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 100,
                "Height" => 100,
                "BitsPerComponent" => 8,
                "ColorSpace" => "DeviceGray",
            },
            vec![0u8; 100 * 100],
        ));
        let form = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im1" => image },
                },
            },
            b"q 100 0 0 100 0 0 cm /Im1 Do Q BT /F1 10 Tf 72 700 Td (Hello) Tj ET".to_vec(),
        ));
        let content = doc.add_object(Stream::new(Dictionary::new(), b"/Fm1 Do".to_vec()));
        dictionary! {
            "Contents" => content,
            "Resources" => dictionary! { "XObject" => dictionary! { "Fm1" => form } },
        }
    });

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.text_area(), 250.0);
    assert_eq!(doc.image_area(), 10000.0);
    assert_eq!(doc.ratio(), 0.025);
    assert_eq!(doc.classification().color, ReportColor::Red);
}

#[test]
fn test_contents_reference_to_stream_array() {
    let dir = TempDir::new().unwrap();
    let path = write_single_page(&dir, "split.pdf", |doc| {
        let stream = doc.add_object(Stream::new(
            Dictionary::new(),
            b"BT /F1 10 Tf 72 700 Td (Hello) Tj ET".to_vec(),
        ));
        let array = doc.add_object(Object::Array(vec![stream.into()]));
        dictionary! { "Contents" => array }
    });

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.text_area(), 250.0);
    assert_eq!(doc.ratio(), 0.0);
}

#[test]
fn test_empty_document_areas_are_positive_zero() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "blank.pdf", vec![TestPage::default()]);

    let doc = Document::open(&path).unwrap();
    assert!(doc.text_area().is_sign_positive());
    assert!(doc.image_area().is_sign_positive());
    assert!(doc.pages()[0].text_area().is_sign_positive());

    let report = analyze(&path).unwrap();
    assert!(report.contains("Text area: 0.00"));
    assert!(!report.contains("-0.00"));
}
