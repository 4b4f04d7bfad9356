use chrono::{DateTime, Utc};

use super::validation::sanitized_stem;

/// Download name for a converted artifact: `{stem}__{YYYYMMDD-HHMMSS}{ext}`.
///
/// The timestamp is the record's creation time, so the `.md` and `.txt`
/// artifacts of one record always share a stamp.
pub fn build_output_name(input_name: &str, created_at: DateTime<Utc>, ext: &str) -> String {
    format!(
        "{}__{}{}",
        sanitized_stem(input_name),
        created_at.format("%Y%m%d-%H%M%S"),
        ext
    )
}

/// Name for the ZIP bundle of a session's conversions
pub fn archive_name(at: DateTime<Utc>) -> String {
    format!("converted_markdown_{}.zip", at.format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_build_output_name() {
        assert_eq!(
            build_output_name("my report.docx", stamp(), ".md"),
            "my_report__20240315-093005.md"
        );
        assert_eq!(
            build_output_name("my report.docx", stamp(), ".txt"),
            "my_report__20240315-093005.txt"
        );
    }

    #[test]
    fn test_build_output_name_empty_input() {
        assert_eq!(
            build_output_name("", stamp(), ".md"),
            "converted__20240315-093005.md"
        );
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(archive_name(stamp()), "converted_markdown_20240315-093005.zip");
    }
}
