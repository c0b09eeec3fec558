use compliance_check::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../compliance-check.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.api.path, "/api/check-compliance");
    assert_eq!(cfg.upload.document_mime, "application/pdf");
    assert!(cfg.upload.enforce_document_type);
    assert!(!cfg.output.out_dir.is_empty());
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[global]\nprint_summary = false\n").expect("parse TOML");
    assert!(!cfg.global.print_summary);
    assert_eq!(cfg.api.endpoint(), "http://localhost:3000/api/check-compliance");
    assert_eq!(cfg.render.control_chars_to_sanitize.len(), 33);
}

#[test]
fn endpoint_joins_base_and_path() {
    let mut cfg = Config::default();
    cfg.api.base_url = "https://checker.example.org/".into();
    cfg.api.path = "api/check-compliance".into();
    assert_eq!(cfg.api.endpoint(), "https://checker.example.org/api/check-compliance");
}
