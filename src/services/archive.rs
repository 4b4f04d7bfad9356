use anyhow::Result;
use std::io::{Cursor, Write};
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

use crate::services::cache::ConversionRecord;
use crate::utils::naming::build_output_name;

/// Serialize every record into one deflate-compressed ZIP, flat layout.
///
/// Each record contributes a `.md` entry (empty markdown included, so the
/// bundle mirrors the session exactly) and, when the plain-text artifact
/// exists, a `.txt` entry with the same stem and stamp. Two distinct
/// records can still collide on stem + second; the last entry wins when
/// extracting, which is an accepted limitation.
pub fn bundle_records(records: &[(String, ConversionRecord)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (_hash, record) in records {
        let md_name = build_output_name(&record.original_name, record.created_at, ".md");
        zip.start_file(md_name, options)?;
        zip.write_all(record.markdown.as_bytes())?;

        if let Some(txt) = &record.plain_text {
            let txt_name = build_output_name(&record.original_name, record.created_at, ".txt");
            zip.start_file(txt_name, options)?;
            zip.write_all(txt.as_bytes())?;
        }
    }

    Ok(zip.finish()?.into_inner())
}
