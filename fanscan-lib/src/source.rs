//! Line-oriented item source.
//!
//! Reads entries lazily, one per line, so the total number of items never
//! has to be known before dispatch starts.

use crate::error::ScanError;
use futures::stream::{self, Stream};
use std::borrow::Cow;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Open `path` and stream its entries.
///
/// A path that cannot be opened, or is not a regular file, is a setup
/// error: it is returned here, before anything has been produced.
pub async fn open_lines<P: AsRef<Path>>(
    path: P,
) -> Result<impl Stream<Item = String> + Send + 'static, ScanError> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        ScanError::file_error(
            path.to_string_lossy(),
            format!("Failed to open input file: {}", e),
        )
    })?;
    if !metadata.is_file() {
        return Err(ScanError::file_error(
            path.to_string_lossy(),
            "Input is not a regular file",
        ));
    }

    let file = tokio::fs::File::open(path).await.map_err(|e| {
        ScanError::file_error(
            path.to_string_lossy(),
            format!("Failed to open input file: {}", e),
        )
    })?;

    tracing::debug!(path = %path.display(), "reading items");
    Ok(lines_from_reader(BufReader::new(file)))
}

/// Stream the entries of any buffered async reader.
///
/// Each line is trimmed; empty lines and `#` comments are skipped, and an
/// inline ` #` comment is cut off. Bytes that are not valid UTF-8 are
/// replaced with U+FFFD and the line is kept. An I/O error ends the stream
/// after a warning.
pub fn lines_from_reader<R>(reader: R) -> impl Stream<Item = String> + Send + 'static
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let lines = reader.split(b'\n');
    stream::unfold((lines, 0usize), |(mut lines, mut line_num)| async move {
        loop {
            line_num += 1;
            match lines.next_segment().await {
                Ok(Some(raw)) => {
                    let line = String::from_utf8_lossy(&raw);
                    if let Cow::Owned(_) = line {
                        tracing::warn!(line = line_num, "input line is not valid UTF-8");
                    }
                    if let Some(entry) = parse_entry(&line) {
                        return Some((entry.to_string(), (lines, line_num)));
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(line = line_num, error = %e, "stopped reading input");
                    return None;
                }
            }
        }
    })
}

/// Extract the entry from one input line, if it holds one.
fn parse_entry(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let entry = match trimmed.find(" #") {
        Some(idx) => trimmed[..idx].trim_end(),
        None => trimmed,
    };
    if entry.is_empty() {
        None
    } else {
        Some(entry)
    }
}
