use compliance_check::{
    config::Config,
    error::CheckError,
    error::TransportError,
    media::{MimeFilter, SelectedFile},
    normalize::{Issue, IssuesPayload},
    report::{FileDigest, Outcome, SubmissionReport, submission_id, write_artifacts},
    transport::{HttpTransport, Submission, Transport},
};
use std::path::Path;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0x0d];

fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, bytes).unwrap();
    p
}

#[test]
fn content_sniffing_beats_extension() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::default();
    let disguised = write(dir.path(), "scan.dat", PNG_MAGIC);
    let doc = write(dir.path(), "manual.pdf", b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n");
    let notes = write(dir.path(), "notes.txt", b"plain words");

    let f = SelectedFile::open(&cfg, &disguised).unwrap();
    assert_eq!(f.mime, "image/png");
    assert_eq!(f.name, "scan.dat");
    assert_eq!(f.size, PNG_MAGIC.len() as u64);

    assert_eq!(SelectedFile::open(&cfg, &doc).unwrap().mime, "application/pdf");
    let notes = SelectedFile::open(&cfg, &notes).unwrap();
    assert_eq!(notes.mime, "application/octet-stream");

    let filter = MimeFilter::new(&cfg).unwrap();
    assert!(filter.is_image(&f));
    assert!(!filter.is_image(&notes));
}

#[test]
fn extension_is_used_when_sniffing_is_off() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.upload.sniff_content = false;
    let p = write(dir.path(), "photo.JPG", b"not really a jpeg");
    assert_eq!(SelectedFile::open(&cfg, &p).unwrap().mime, "image/jpeg");
}

#[test]
fn oversized_files_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.upload.max_file_bytes = 4;
    let p = write(dir.path(), "big.png", PNG_MAGIC);
    assert!(SelectedFile::open(&cfg, &p).is_err());
}

#[test]
fn bad_image_pattern_is_reported() {
    let mut cfg = Config::default();
    cfg.upload.image_mime_pattern = "(".into();
    assert!(MimeFilter::new(&cfg).is_err());
}

#[test]
fn artifacts_hold_results_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::default();
    let img = SelectedFile::open(&cfg, &write(dir.path(), "a.png", PNG_MAGIC)).unwrap();
    let doc = SelectedFile::open(&cfg, &write(dir.path(), "d.pdf", b"%PDF-1.4\n")).unwrap();

    let images = vec![FileDigest::of(&img).unwrap()];
    let document = FileDigest::of(&doc).unwrap();
    let id = submission_id(&cfg, &images, &document);
    assert_eq!(id, submission_id(&cfg, &images, &document));
    assert_eq!(id.len(), 64);

    let issues = vec![Issue {
        issue_identified: Some("Missing label".into()),
        evidence: None,
        suggested_fix: Some("Add the label".into()),
    }];
    let report = SubmissionReport {
        submission_id: id.clone(),
        started: "2026-01-01T00:00:00Z".into(),
        finished: "2026-01-01T00:00:01Z".into(),
        endpoint: cfg.api.endpoint(),
        images,
        document,
        outcome: Outcome::from_issues(&issues),
    };

    let out = dir.path().join("out").join(&id);
    let written = write_artifacts(&cfg, &out, &report, Some(&issues)).unwrap();
    assert_eq!(written.len(), 2);

    let raw = std::fs::read_to_string(out.join("results.json")).unwrap();
    let payload: IssuesPayload = serde_json::from_str(&raw).unwrap();
    assert_eq!(payload.issues, issues);

    let raw = std::fs::read_to_string(out.join("report.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["outcome"]["status"], "issues");
    assert_eq!(v["outcome"]["count"], 1);
    assert_eq!(v["images"][0]["mime"], "image/png");
}

#[test]
fn failed_submissions_get_no_results_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::default();
    let report = SubmissionReport {
        submission_id: "x".into(),
        started: String::new(),
        finished: String::new(),
        endpoint: cfg.api.endpoint(),
        images: vec![],
        document: FileDigest {
            name: "d.pdf".into(),
            mime: "application/pdf".into(),
            size: 0,
            sha256: String::new(),
        },
        outcome: Outcome::from_error(&CheckError::Parse { raw: "{}".into() }),
    };
    let written = write_artifacts(&cfg, dir.path(), &report, None).unwrap();
    assert_eq!(written, vec![dir.path().join("report.json")]);
}

#[test]
fn refused_connection_is_a_network_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg0 = Config::default();
    let img = SelectedFile::open(&cfg0, &write(dir.path(), "a.png", PNG_MAGIC)).unwrap();
    let doc = SelectedFile::open(&cfg0, &write(dir.path(), "d.pdf", b"%PDF-1.4\n")).unwrap();

    // Grab a free port, then close it so nothing is listening.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let mut cfg = Config::default();
    cfg.api.base_url = format!("http://127.0.0.1:{port}");
    cfg.api.timeout_seconds = 5;

    let t = HttpTransport::new(&cfg).unwrap();
    assert_eq!(t.endpoint(), format!("http://127.0.0.1:{port}/api/check-compliance"));
    let err = t.send(&Submission::new(&[img], &doc)).unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}

#[test]
fn unreadable_part_is_a_file_error() {
    let cfg = Config::default();
    let t = HttpTransport::new(&cfg).unwrap();
    let ghost = SelectedFile::new("/nonexistent/ghost.png", "image/png", 1);
    let doc = SelectedFile::new("/nonexistent/ghost.pdf", "application/pdf", 1);
    let err = t.send(&Submission::new(&[ghost], &doc)).unwrap_err();
    assert!(matches!(err, TransportError::File { .. }));
}
