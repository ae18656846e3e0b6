use chrono::{DateTime, Utc};

use crate::contract::format_timestamp;

pub const BINARY_MARKER: &str = "[Binary content preserved]";

/// Everything a transformation gets to see about one object.
#[derive(Debug, Clone, Copy)]
pub struct TransformInput<'a> {
    pub content: &'a [u8],
    pub object_key: &'a str,
    pub credential: Option<&'a str>,
    pub processed_at: DateTime<Utc>,
}

/// Pluggable content transformation. Errors abort the batch.
pub trait Transformer {
    fn transform(&self, input: &TransformInput<'_>) -> Result<Vec<u8>, String>;
}

/// Wraps the object in a plain-text processing report.
///
/// UTF-8 content is reproduced uppercased inside the report. Anything that
/// fails UTF-8 decoding is treated as binary: the report is shortened and the
/// original bytes are appended untouched. File extensions and content types
/// are never consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportTransformer;

impl Transformer for ReportTransformer {
    fn transform(&self, input: &TransformInput<'_>) -> Result<Vec<u8>, String> {
        match std::str::from_utf8(input.content) {
            Ok(text) => Ok(text_report(input, text).into_bytes()),
            Err(_) => {
                let mut body = binary_report(input).into_bytes();
                body.extend_from_slice(input.content);
                Ok(body)
            }
        }
    }
}

fn text_report(input: &TransformInput<'_>, text: &str) -> String {
    let mut report = report_header("File Processing Report", input);
    report.push_str("\nProcessed Content:\n");
    report.push_str(&text.to_uppercase());
    report.push_str("\n\nProcessing completed successfully.\n");
    report
}

fn binary_report(input: &TransformInput<'_>) -> String {
    let mut report = report_header("Binary File Processing Report", input);
    report.push_str(&format!("\n{BINARY_MARKER}\n"));
    report
}

fn report_header(title: &str, input: &TransformInput<'_>) -> String {
    let mut header = format!(
        "\n{title}\n{underline}\nOriginal File: {key}\nProcessed At: {at}\n\
         Original Size: {size} bytes\n",
        underline = "=".repeat(title.len()),
        key = input.object_key,
        at = format_timestamp(input.processed_at),
        size = input.content.len(),
    );
    if let Some(credential) = input.credential {
        header.push_str(&format!("Credential (API Key): {credential}\n"));
    }
    header
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn input<'a>(content: &'a [u8], credential: Option<&'a str>) -> TransformInput<'a> {
        TransformInput {
            content,
            object_key: "report.txt",
            credential,
            processed_at: Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 5).unwrap(),
        }
    }

    #[test]
    fn text_report_embeds_uppercased_body_and_metadata() {
        let body = ReportTransformer
            .transform(&input(b"hello world", Some("k-123")))
            .expect("text transform");
        let report = String::from_utf8(body).expect("report is utf-8");

        assert!(report.contains("File Processing Report"));
        assert!(report.contains("Original File: report.txt"));
        assert!(report.contains("Processed At: 2026-02-14T09:30:05.000000Z"));
        assert!(report.contains("Original Size: 11 bytes"));
        assert!(report.contains("Credential (API Key): k-123"));
        assert!(report.contains("Processed Content:\nHELLO WORLD\n"));
        assert!(report.ends_with("Processing completed successfully.\n"));
    }

    #[test]
    fn report_header_lines_are_in_order() {
        let body = ReportTransformer
            .transform(&input(b"hi", Some("k-123")))
            .expect("text transform");
        let report = String::from_utf8(body).expect("report is utf-8");
        let expected = "\nFile Processing Report\n\
                        ======================\n\
                        Original File: report.txt\n\
                        Processed At: 2026-02-14T09:30:05.000000Z\n\
                        Original Size: 2 bytes\n\
                        Credential (API Key): k-123\n\
                        \nProcessed Content:\nHI\n\nProcessing completed successfully.\n";
        assert_eq!(report, expected);
    }

    #[test]
    fn credential_line_is_omitted_without_credential() {
        let body = ReportTransformer
            .transform(&input(b"hello", None))
            .expect("text transform");
        let report = String::from_utf8(body).expect("report is utf-8");
        assert!(!report.contains("Credential"));
    }

    #[test]
    fn uppercases_non_ascii_text() {
        let body = ReportTransformer
            .transform(&input("straße ação".as_bytes(), None))
            .expect("text transform");
        let report = String::from_utf8(body).expect("report is utf-8");
        assert!(report.contains("STRASSE AÇÃO"));
    }

    #[test]
    fn binary_content_is_appended_verbatim() {
        let content = [0x89, b'P', b'N', b'G', 0xff, 0x00, 0xfe];
        let body = ReportTransformer
            .transform(&input(&content, Some("k-123")))
            .expect("binary transform");

        assert!(body.ends_with(&content));
        let header = String::from_utf8_lossy(&body[..body.len() - content.len()]);
        assert!(header.contains("Binary File Processing Report"));
        assert!(header.contains("Original Size: 7 bytes"));
        assert!(header.contains("Credential (API Key): k-123"));
        assert!(header.trim_end().ends_with(BINARY_MARKER));
        assert!(!header.contains("Processed Content"));
    }

    #[test]
    fn truncated_utf8_sequence_counts_as_binary() {
        let content = "olá".as_bytes();
        let truncated = &content[..content.len() - 1];
        let body = ReportTransformer
            .transform(&input(truncated, None))
            .expect("binary transform");
        assert!(body.ends_with(truncated));
        assert!(String::from_utf8_lossy(&body).contains("Binary File Processing Report"));
    }

    #[test]
    fn empty_object_is_text() {
        let body = ReportTransformer
            .transform(&input(b"", None))
            .expect("text transform");
        let report = String::from_utf8(body).expect("report is utf-8");
        assert!(report.contains("Original Size: 0 bytes"));
        assert!(report.contains("Processed Content:"));
    }
}
