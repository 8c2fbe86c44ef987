use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use logscan::{
    MATCH_FILE_NAME, MemorySource, RunConfig, ScanError, Scanner, render_report, run_and_report,
};

const WAF_LINE: &str = r#"{"timestamp":1000,"action":"BLOCK","httpRequest":{"clientIp":"1.2.3.4","httpMethod":"GET","country":"US","uri":"/x"}}"#;

fn gzip(data: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data.as_bytes()).expect("compress");
    encoder.finish().expect("finish")
}

fn waf_bucket() -> MemorySource {
    MemorySource::new("logs").with_object("waf/2024/a.log.gz", gzip(&format!("{WAF_LINE}\n")))
}

/// Run a scan, collecting console lines
fn scan(source: &MemorySource, config: &RunConfig) -> (logscan::RunSummary, Vec<String>) {
    let mut lines = Vec::new();
    let summary = Scanner::new(source, config, |l| lines.push(l))
        .run()
        .expect("run");
    (summary, lines)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read file")
}

#[test]
fn test_end_to_end_block_match() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("run");
    let source = waf_bucket();
    let config = RunConfig::new("waf/2024/", "BLOCK", &out).expect("config");

    let (summary, lines) = scan(&source, &config);

    let decompressed = out.join("a.log");
    assert!(decompressed.exists());
    assert!(!out.join("a.log.gz").exists());
    assert_eq!(read(&decompressed), format!("{WAF_LINE}\n"));

    assert_eq!(
        read(&out.join(MATCH_FILE_NAME)),
        format!("{},1000,BLOCK,1.2.3.4,GET,US,/x\n", decompressed.display())
    );
    assert_eq!(summary.matches, 1);
    assert_eq!(summary.failed, 0);

    assert_eq!(
        lines,
        vec![
            format!(
                "Downloaded: waf/2024/a.log.gz to {}",
                out.join("a.log.gz").display()
            ),
            format!("Decompressed: {}", decompressed.display()),
            format!("Processing {} for regex matches...", decompressed.display()),
            format!(
                "MATCH 1: {},1000,BLOCK,1.2.3.4,GET,US,/x",
                decompressed.display()
            ),
            format!("Found 1 matches in {}.", decompressed.display()),
        ]
    );
}

#[test]
fn test_end_to_end_no_match() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("run");
    let source = waf_bucket();
    let config = RunConfig::new("waf/2024/", "ALLOW", &out).expect("config");

    let (summary, lines) = scan(&source, &config);

    assert_eq!(summary.matches, 0);
    assert_eq!(read(&out.join(MATCH_FILE_NAME)), "");
    assert!(lines.iter().any(|l| l.starts_with("Found 0 matches")));
}

#[test]
fn test_report_reads_the_file_the_writer_appended() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("run");
    let source = MemorySource::new("logs")
        .with_object("waf/a.log", format!("{WAF_LINE}\n{WAF_LINE}\n"))
        .with_object("waf/b.log", format!("{WAF_LINE}\n"));
    let config = RunConfig::new("waf/", "BLOCK", &out).expect("config");

    let mut lines = Vec::new();
    let summary = run_and_report(&source, &config, |l| lines.push(l)).expect("run");
    assert_eq!(summary.matches, 3);
    assert_eq!(read(&summary.match_file).lines().count(), 3);

    let table = lines.last().expect("table");
    assert!(table.contains("File Name"));
    assert_eq!(table.matches("1.2.3.4").count(), 3);

    // The historical report file name never existed; asking for it is an explicit error
    let err = render_report(&out.join("matched_logs.txt")).unwrap_err();
    assert!(matches!(err, ScanError::MatchFileMissing { .. }));
}

#[test]
fn test_failures_do_not_stop_the_run() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("run");
    let source = MemorySource::new("logs")
        .with_object("waf/1-bad-json.log", "BLOCK {not json\n")
        .with_object("waf/2-corrupt.log.gz", "definitely not gzip")
        .with_object("waf/3-unreachable.log", "")
        .with_failing_download("waf/3-unreachable.log")
        .with_object("waf/4-good.log", format!("{WAF_LINE}\n"));
    let config = RunConfig::new("waf/", "BLOCK", &out).expect("config");

    let (summary, lines) = scan(&source, &config);

    assert_eq!(summary.listed, 4);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.matches, 1);

    let errors: Vec<_> = lines
        .iter()
        .filter(|l| l.starts_with("Error processing file "))
        .collect();
    assert_eq!(errors.len(), 3);
    assert!(errors[0].contains("1-bad-json.log"));
    assert!(errors[0].contains("Invalid JSON on line 1"));
    assert!(errors[1].contains("2-corrupt.log.gz"));
    assert!(errors[2].contains("HTTP 500"));

    assert_eq!(read(&out.join(MATCH_FILE_NAME)).lines().count(), 1);
}

#[test]
fn test_listing_failure_aborts() {
    let tmp = TempDir::new().expect("temp dir");
    let source = MemorySource::new("logs").with_failing_listing();
    let config = RunConfig::new("waf/", "BLOCK", tmp.path().join("run")).expect("config");

    let err = Scanner::new(&source, &config, |_| {}).run().unwrap_err();
    assert!(matches!(err, ScanError::Listing(_)));
    assert!(source.downloads().is_empty());
}

#[test]
fn test_pagination_and_nested_keys() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("run");
    let mut source = MemorySource::new("logs").with_page_size(2);
    for hour in 0..5 {
        source = source.with_object(
            &format!("waf/2024/01/{hour:02}/events.log.gz"),
            gzip(&format!("{WAF_LINE}\n")),
        );
    }
    source = source.with_object("waf/2024/01/", "");
    let config = RunConfig::new("waf/2024/", "BLOCK", &out).expect("config");

    let (summary, _) = scan(&source, &config);

    assert_eq!(source.list_calls(), 3);
    assert_eq!(summary.listed, 6);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.matches, 5);
    assert!(!source.downloads().contains(&"waf/2024/01/".to_string()));
    for hour in 0..5 {
        let dir = out.join(format!("01/{hour:02}"));
        assert!(dir.join("events.log").exists());
        assert!(!dir.join("events.log.gz").exists());
    }
}

#[test]
fn test_rerun_into_fresh_directory_is_identical() {
    let tmp = TempDir::new().expect("temp dir");
    let source = MemorySource::new("logs")
        .with_object("waf/a.log.gz", gzip(&format!("{WAF_LINE}\n")))
        .with_object("waf/sub/b.log", format!("{WAF_LINE}\nnoise\n"));

    let mut contents = Vec::new();
    for run in ["first", "second"] {
        let out = tmp.path().join(run);
        let config = RunConfig::new("waf/", "BLOCK", &out).expect("config");
        let _ = scan(&source, &config);

        let prefix = format!("{}/", out.display());
        let matches = read(&out.join(MATCH_FILE_NAME)).replace(&prefix, "");
        let files = (read(&out.join("a.log")), read(&out.join("sub/b.log")));
        contents.push((matches, files));
    }
    assert_eq!(contents[0], contents[1]);
}

#[test]
fn test_match_file_appends_across_runs() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("run");
    let source = MemorySource::new("logs").with_object("waf/a.log", format!("{WAF_LINE}\n"));
    let config = RunConfig::new("waf/", "BLOCK", &out).expect("config");

    let _ = scan(&source, &config);
    let _ = scan(&source, &config);
    assert_eq!(read(&out.join(MATCH_FILE_NAME)).lines().count(), 2);
}
