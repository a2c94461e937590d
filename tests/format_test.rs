//! Metric line formatting tests
//!
//! Tests for label selection, escaping and value rendering.

use docker_volume_exporter::collector::ProbeResult;
use docker_volume_exporter::docker::Volume;
use docker_volume_exporter::format::{format_metric, quote};
use proptest::prelude::*;

fn result(volume: Volume, path: &str, size_bytes: u64) -> ProbeResult {
    ProbeResult {
        volume,
        path: path.to_string(),
        size_bytes,
    }
}

#[test]
fn test_line_without_compose_labels() {
    // Given: A volume with no labels at all
    let line = format_metric(&result(Volume::new("v1", "/data1"), "/rootfs/data1", 100));

    // Then: Only name and mountpoint are rendered
    assert_eq!(
        line,
        "docker_volume_size_bytes{name=\"v1\",mountpoint=\"/rootfs/data1\"} 100\n"
    );
}

#[test]
fn test_line_with_both_compose_labels() {
    let volume = Volume::new("app_db", "/var/lib/docker/volumes/app_db/_data")
        .with_label("com.docker.compose.project", "app")
        .with_label("com.docker.compose.volume", "db");

    let line = format_metric(&result(
        volume,
        "/rootfs/var/lib/docker/volumes/app_db/_data",
        123_456_789,
    ));

    assert_eq!(
        line,
        "docker_volume_size_bytes{name=\"app_db\",mountpoint=\"/rootfs/var/lib/docker/volumes/app_db/_data\",project=\"app\",volume=\"db\"} 123456789\n"
    );
}

#[test]
fn test_volume_label_without_project() {
    let volume = Volume::new("cache", "/c").with_label("com.docker.compose.volume", "cache");

    let line = format_metric(&result(volume, "/rootfs/c", 0));

    assert_eq!(
        line,
        "docker_volume_size_bytes{name=\"cache\",mountpoint=\"/rootfs/c\",volume=\"cache\"} 0\n"
    );
}

#[test]
fn test_empty_compose_labels_are_omitted() {
    // Given: Compose labels present but empty, plus an unrelated label
    let volume = Volume::new("v", "/v")
        .with_label("com.docker.compose.project", "")
        .with_label("com.docker.compose.volume", "")
        .with_label("owner", "ops");

    let line = format_metric(&result(volume, "/rootfs/v", 7));

    assert!(!line.contains("project="));
    assert!(!line.contains("volume="));
    assert!(!line.contains("owner"));
}

#[test]
fn test_size_is_raw_decimal() {
    let line = format_metric(&result(Volume::new("big", "/b"), "/rootfs/b", u64::MAX));
    assert!(line.ends_with("} 18446744073709551615\n"));
}

#[test]
fn test_label_values_are_escaped() {
    let volume = Volume::new("we\"ird\\name\n", "/w")
        .with_label("com.docker.compose.project", "tab\there");

    let line = format_metric(&result(volume, "/rootfs/w", 1));

    assert_eq!(
        line,
        "docker_volume_size_bytes{name=\"we\\\"ird\\\\name\\n\",mountpoint=\"/rootfs/w\",project=\"tab\\there\"} 1\n"
    );
}

#[test]
fn test_quote_matches_go_escapes() {
    assert_eq!(quote(""), r#""""#);
    assert_eq!(quote("plain"), r#""plain""#);
    assert_eq!(quote("a\"b"), r#""a\"b""#);
    assert_eq!(quote("a\\b"), r#""a\\b""#);
    assert_eq!(quote("\u{07}\u{08}\u{0C}\n\r\t\u{0B}"), r#""\a\b\f\n\r\t\v""#);
    assert_eq!(quote("\u{00}"), r#""\x00""#);
    assert_eq!(quote("\u{1b}[0m"), r#""\x1b[0m""#);
    assert_eq!(quote("\u{7f}"), r#""\x7f""#);
}

#[test]
fn test_quote_non_ascii() {
    // Printable characters pass through unchanged
    assert_eq!(quote("héllo wörld"), "\"héllo wörld\"");
    assert_eq!(quote("データ"), "\"データ\"");
    assert_eq!(quote("😀"), "\"😀\"");
    // Combining marks and symbols outside ASCII are printable too
    assert_eq!(quote("e\u{301}"), "\"e\u{301}\"");
    assert_eq!(quote("€ ≤ ∞"), "\"€ ≤ ∞\"");

    // Invisible and non-printing characters are escaped
    assert_eq!(quote("\u{85}"), r#""\u0085""#);
    assert_eq!(quote("a\u{a0}b"), r#""a\u00a0b""#);
    assert_eq!(quote("\u{200b}"), r#""\u200b""#);
    assert_eq!(quote("\u{2028}"), r#""\u2028""#);
    assert_eq!(quote("\u{feff}"), r#""\ufeff""#);
    assert_eq!(quote("\u{e000}"), r#""\ue000""#);
    assert_eq!(quote("\u{f0000}"), r#""\U000f0000""#);
    assert_eq!(quote("\u{e0001}"), r#""\U000e0001""#);
    assert_eq!(quote("\u{1d173}"), r#""\U0001d173""#);
    assert_eq!(quote("\u{378}"), r#""\u0378""#);
    assert_eq!(quote("\u{110bd}"), r#""\U000110bd""#);
    assert_eq!(quote("\u{61c}"), r#""\u061c""#);
}

proptest! {
    #[test]
    fn test_any_volume_name_renders_one_line(name in "\\PC*", path in ".*", size in any::<u64>()) {
        // Given: Arbitrary volume names and paths
        let line = format_metric(&result(Volume::new(name, "/x"), &path, size));

        // Then: The output is exactly one terminated line ending with the size
        prop_assert!(line.starts_with("docker_volume_size_bytes{name=\""), "line does not start with metric prefix: {:?}", line);
        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);
        let expected_suffix = format!("}} {}\n", size);
        prop_assert!(line.ends_with(&expected_suffix));
    }

    #[test]
    fn test_quoted_value_has_no_raw_quotes_or_controls(value in ".*") {
        let quoted = quote(&value);
        let inner = &quoted[1..quoted.len() - 1];

        prop_assert!(quoted.starts_with('"') && quoted.ends_with('"'));
        prop_assert!(!inner.chars().any(|c| c.is_control()));

        // Every quote inside is preceded by an odd run of backslashes
        let bytes = inner.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'"' {
                let backslashes = bytes[..i].iter().rev().take_while(|c| **c == b'\\').count();
                prop_assert!(backslashes % 2 == 1);
            }
        }
    }
}
