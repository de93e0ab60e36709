use super::*;
use chrono::TimeZone as _;

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 30, 0).unwrap()
}

#[test]
fn code_is_prefix_plus_first_eight_hex_chars() {
    let fp = Fingerprint::from_bytes(b"some audio bytes");
    assert_eq!(fp.catalog_code, format!("lufs-{}", &fp.hash[..8]));
    assert!(is_valid_catalog_code(&fp.catalog_code));
}

#[test]
fn code_pattern_holds_for_many_inputs() {
    for i in 0u32..200 {
        let fp = Fingerprint::from_bytes(&i.to_le_bytes());
        assert!(is_valid_catalog_code(&fp.catalog_code), "{}", fp.catalog_code);
        assert!(fp.hash.starts_with(&fp.catalog_code[CATALOG_PREFIX.len()..]));
    }
}

#[test]
fn validator_rejects_malformed_codes() {
    assert!(!is_valid_catalog_code("lufs-1234567"));
    assert!(!is_valid_catalog_code("lufs-123456789"));
    assert!(!is_valid_catalog_code("lufs-ABCDEF12"));
    assert!(!is_valid_catalog_code("luf-12345678"));
    assert!(!is_valid_catalog_code("lufs-1234567g"));
}

#[test]
fn text_form_round_trips() {
    let fp = Fingerprint::from_bytes(b"abc");
    let rec = CatalogRecord::new(&fp, Path::new("/music/My Song.wav"), fixed_time());
    let text = rec.to_text();
    assert!(text.contains("generated_at: 2026-10-18T12:30:00Z"));
    assert!(text.contains("source: My Song.wav"));
    assert!(text.contains("catalog_code: lufs-ba7816bf"));
    assert!(text.contains(&format!("hash: {}", fp.hash)));
    assert_eq!(CatalogRecord::parse(&text).unwrap(), rec);
}

#[test]
fn parse_rejects_incomplete_records() {
    let err = CatalogRecord::parse("source: a.wav\nhash: abc\n").unwrap_err();
    assert!(matches!(err, LufsError::Validation(_)));
}

#[test]
fn write_persists_readable_record() {
    let dir = tempfile::tempdir().unwrap();
    let fp = Fingerprint::from_bytes(b"abc");
    let rec = CatalogRecord::new(&fp, Path::new("track.flac"), fixed_time());
    let path = rec.write(&dir.path().join("catalog.txt")).unwrap();
    let back = CatalogRecord::parse(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(back, rec);
}
