//! Bounded line reader for the stdin command stream.
//!
//! Commands are short, so the reader works with a small fixed buffer: at most
//! `capacity - 1` bytes are read per chunk (the last byte is reserved, as in a
//! C string buffer).  A chunk that fills up before a line terminator is seen
//! means the line is too long to be a valid command.
//!
//! # Truncation rules
//!
//! - The first over-long chunk of a line yields one [`LineRead::Truncated`].
//! - Every further chunk of that line, including the terminated tail, is
//!   skipped silently.
//! - A final line that ends at EOF without a terminator is also truncated.
//! - A NUL byte before the terminator counts as truncation of that line only;
//!   the next line is read normally.
//!
//! The line content ends at the first `\r` or `\n`, so CRLF input behaves like
//! LF input.  Bytes that are not valid UTF-8 are replaced, not rejected.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Default buffer size in bytes.
pub const DEFAULT_LINE_BUFFER: usize = 64;

/// Smallest buffer that can still hold a one-field command.
pub const MIN_LINE_BUFFER: usize = 4;

/// One item produced by [`LineReader::next_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// A complete line without its terminator.
    Line(String),
    /// An over-long or unterminated line was discarded.
    Truncated,
}

/// Reads terminator-delimited lines through a bounded buffer.
pub struct LineReader<R> {
    inner: R,
    capacity: usize,
    skipping: bool,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Creates a reader with the default 64-byte buffer.
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_LINE_BUFFER)
    }

    /// Creates a reader with a `capacity`-byte buffer (at least [`MIN_LINE_BUFFER`]).
    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(MIN_LINE_BUFFER),
            skipping: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the next line, `Truncated` once per over-long line, or `None` at EOF.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying reader.
    pub async fn next_line(&mut self) -> io::Result<Option<LineRead>> {
        loop {
            let Some(chunk) = self.read_chunk().await? else {
                return Ok(None);
            };
            let terminated = chunk.last() == Some(&b'\n');

            // Tail of an over-long line: drop chunks until its terminator.
            if self.skipping {
                self.skipping = !terminated;
                continue;
            }
            if !terminated {
                self.skipping = true;
                return Ok(Some(LineRead::Truncated));
            }

            return match chunk.iter().position(|&b| matches!(b, b'\r' | b'\n' | 0)) {
                Some(end) if chunk[end] != 0 => {
                    let line = String::from_utf8_lossy(&chunk[..end]).into_owned();
                    Ok(Some(LineRead::Line(line)))
                }
                // NUL inside a complete line.
                _ => Ok(Some(LineRead::Truncated)),
            };
        }
    }

    /// Reads up to `capacity - 1` bytes, stopping after a `\n`.  `None` at EOF.
    async fn read_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let limit = self.capacity - 1;
        let mut chunk = Vec::with_capacity(limit);

        while chunk.len() < limit {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                break;
            }
            let window = &available[..available.len().min(limit - chunk.len())];
            let (take, done) = match window.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (window.len(), false),
            };
            chunk.extend_from_slice(&window[..take]);
            self.inner.consume(take);
            if done {
                break;
            }
        }

        Ok((!chunk.is_empty()).then_some(chunk))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio_test::io::Builder;

    async fn collect(reader: &mut LineReader<BufReader<tokio_test::io::Mock>>) -> Vec<LineRead> {
        let mut out = Vec::new();
        while let Some(item) = reader.next_line().await.unwrap() {
            out.push(item);
        }
        out
    }

    fn line(s: &str) -> LineRead {
        LineRead::Line(s.to_string())
    }

    #[tokio::test]
    async fn test_reads_lf_and_crlf_lines() {
        // Arrange
        let mock = Builder::new().read(b"k 65\nK 65\r\n").build();
        let mut reader = LineReader::new(BufReader::new(mock));

        // Act
        let items = collect(&mut reader).await;

        // Assert
        assert_eq!(items, vec![line("k 65"), line("K 65")]);
    }

    #[tokio::test]
    async fn test_line_split_across_reads_is_joined() {
        let mock = Builder::new().read(b"m 1").read(b"0 -4\nb 0 1\n").build();
        let mut reader = LineReader::new(BufReader::new(mock));

        let items = collect(&mut reader).await;

        assert_eq!(items, vec![line("m 10 -4"), line("b 0 1")]);
    }

    #[tokio::test]
    async fn test_over_long_line_yields_one_truncation_and_skips_tail() {
        // Arrange: 200 bytes spans several 63-byte chunks
        let mut input = vec![b'x'; 200];
        input.extend_from_slice(b"\nk 65\n");
        let mock = Builder::new().read(&input).build();
        let mut reader = LineReader::new(BufReader::new(mock));

        // Act
        let items = collect(&mut reader).await;

        // Assert
        assert_eq!(items, vec![LineRead::Truncated, line("k 65")]);
    }

    #[tokio::test]
    async fn test_line_filling_buffer_exactly_is_truncated() {
        // 63 payload bytes leave no room for the newline in a 64-byte buffer
        let mut input = vec![b'y'; 63];
        input.push(b'\n');
        let mock = Builder::new().read(&input).build();
        let mut reader = LineReader::new(BufReader::new(mock));

        let items = collect(&mut reader).await;

        assert_eq!(items, vec![LineRead::Truncated]);
    }

    #[tokio::test]
    async fn test_longest_line_that_fits() {
        let mut input = vec![b'z'; 62];
        input.push(b'\n');
        let mock = Builder::new().read(&input).build();
        let mut reader = LineReader::new(BufReader::new(mock));

        let items = collect(&mut reader).await;

        assert_eq!(items, vec![LineRead::Line("z".repeat(62))]);
    }

    #[tokio::test]
    async fn test_unterminated_final_line_is_truncation() {
        let mock = Builder::new().read(b"k 65\nK 65").build();
        let mut reader = LineReader::new(BufReader::new(mock));

        let items = collect(&mut reader).await;

        assert_eq!(items, vec![line("k 65"), LineRead::Truncated]);
    }

    #[tokio::test]
    async fn test_embedded_nul_counts_as_truncation() {
        let mock = Builder::new().read(b"k\x0065\nk 66\n").build();
        let mut reader = LineReader::new(BufReader::new(mock));

        let items = collect(&mut reader).await;

        assert_eq!(items, vec![LineRead::Truncated, line("k 66")]);
    }

    #[tokio::test]
    async fn test_nul_line_inside_over_long_run_is_not_reported_twice() {
        // Arrange: 70 bytes, a NUL in the tail chunk, then a valid line
        let mut input = vec![b'x'; 70];
        input[66] = 0;
        input.extend_from_slice(b"\nK 65\n");
        let mock = Builder::new().read(&input).build();
        let mut reader = LineReader::new(BufReader::new(mock));

        // Act
        let items = collect(&mut reader).await;

        // Assert
        assert_eq!(items, vec![LineRead::Truncated, line("K 65")]);
    }

    #[tokio::test]
    async fn test_carriage_return_in_over_long_chunk_is_not_a_line_end() {
        let mut input = b"k 65\r".to_vec();
        input.extend(std::iter::repeat(b'x').take(80));
        input.extend_from_slice(b"\nK 65\n");
        let mock = Builder::new().read(&input).build();
        let mut reader = LineReader::new(BufReader::new(mock));

        let items = collect(&mut reader).await;

        assert_eq!(items, vec![LineRead::Truncated, line("K 65")]);
    }

    #[tokio::test]
    async fn test_empty_line_is_returned_as_empty() {
        let mock = Builder::new().read(b"\n").build();
        let mut reader = LineReader::new(BufReader::new(mock));

        let items = collect(&mut reader).await;

        assert_eq!(items, vec![line("")]);
    }

    #[tokio::test]
    async fn test_small_capacity_is_raised_to_minimum() {
        let mock = Builder::new().build();
        let reader = LineReader::with_capacity(BufReader::new(mock), 1);

        assert_eq!(reader.capacity(), MIN_LINE_BUFFER);
    }

    #[tokio::test]
    async fn test_read_error_is_propagated() {
        let mock = Builder::new()
            .read(b"k 65\n")
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let mut reader = LineReader::new(BufReader::new(mock));

        assert_eq!(reader.next_line().await.unwrap(), Some(line("k 65")));
        let err = reader.next_line().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
