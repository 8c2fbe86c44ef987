use std::cell::Cell;
use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, TimeZone};
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use cmd::commands::{ScanArgs, scan_command};
use logscan::{MATCH_FILE_NAME, MemorySource};

const WAF_LINE: &str = r#"{"timestamp":1000,"action":"BLOCK","httpRequest":{"clientIp":"1.2.3.4","httpMethod":"GET","country":"US","uri":"/x"}}"#;

fn args(local_dir: Option<PathBuf>, regex: &str) -> ScanArgs {
    ScanArgs {
        bucket_name: "logs".to_string(),
        s3_prefix: "waf/2024/".to_string(),
        regex_filter: regex.to_string(),
        local_dir,
    }
}

fn gzip(data: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data.as_bytes()).expect("compress");
    encoder.finish().expect("finish")
}

#[test]
fn test_scan_command_prints_report_and_summary() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("triage");
    let source = MemorySource::new("logs")
        .with_object("waf/2024/", "")
        .with_object("waf/2024/a.log.gz", gzip(&format!("{WAF_LINE}\n")));

    let mut lines = Vec::new();
    let summary = scan_command(
        &args(Some(out.clone()), "BLOCK"),
        &Local::now(),
        |_| Ok(&source),
        |l| lines.push(l),
    )
    .expect("scan");

    assert_eq!(summary.matches, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.match_file, out.join(MATCH_FILE_NAME));

    let n = lines.len();
    assert!(n >= 2);
    let table = &lines[n - 2];
    assert!(table.contains("HTTP Method"));
    assert!(table.contains("BLOCK"));
    assert!(lines[n - 1].starts_with("2 objects listed, 1 skipped, 1 processed, 0 failed, 1 matches"));
}

#[test]
fn test_default_output_dir_from_start_time() {
    let tmp = TempDir::new().expect("temp dir");
    let started = Local
        .with_ymd_and_hms(2024, 12, 31, 23, 59, 1)
        .single()
        .expect("unambiguous local time");

    let config = args(None, "BLOCK").run_config(&started).expect("config");
    assert_eq!(config.output_dir, PathBuf::from("tmp/20241231-2359"));

    let config = args(Some(tmp.path().to_path_buf()), "BLOCK")
        .run_config(&started)
        .expect("config");
    assert_eq!(config.match_file(), tmp.path().join(MATCH_FILE_NAME));
}

#[test]
fn test_invalid_regex_fails_before_listing() {
    let tmp = TempDir::new().expect("temp dir");
    let source = MemorySource::new("logs").with_object("waf/2024/a.log", "x\n");
    let opened = Cell::new(false);

    let err = scan_command(
        &args(Some(tmp.path().join("out")), "[unclosed"),
        &Local::now(),
        |_| {
            opened.set(true);
            Ok(&source)
        },
        |_| {},
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("Invalid regex filter"));
    assert!(!opened.get());
    assert_eq!(source.list_calls(), 0);
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_store_open_failure_is_reported() {
    let tmp = TempDir::new().expect("temp dir");

    let err = scan_command(
        &args(Some(tmp.path().join("out")), "BLOCK"),
        &Local::now(),
        |bucket| -> anyhow::Result<MemorySource> {
            Err(anyhow::anyhow!("no credentials for {bucket}"))
        },
        |_| {},
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "no credentials for logs");
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_listing_failure_is_fatal() {
    let tmp = TempDir::new().expect("temp dir");
    let source = MemorySource::new("logs").with_failing_listing();

    let err = scan_command(
        &args(Some(tmp.path().join("out")), "BLOCK"),
        &Local::now(),
        |_| Ok(&source),
        |_| {},
    )
    .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Scan of logs/waf/2024/ failed"));
    assert!(message.contains("Listing failed"));
}
