//! Frame extraction rules for the receive buffer.
//!
//! Data lines are delimited by a line feed. The monitor deliberately
//! frames only the *most recent* complete line and discards anything
//! older: firmware interleaves status lines with data lines, and for a
//! live view only the newest controller state matters. This trades
//! completeness for latency and self-heals against backlog without a
//! queue; it is the wrong tool for lossless capture.
//!
//! Printer-style devices instead emit a multi-line transcript that is
//! treated as a single packet once one of the known terminator lines
//! shows up in it.

/// ASCII line feed, the packet delimiter on the wire.
pub(crate) const FRAME_DELIMITER: u8 = 0x0A;

/// Substrings that terminate a printer transcript.
pub(crate) const PRINTER_SENTINELS: [&str; 4] = [
    "# Finished Pretending To Print for fun!",
    "Memory Waterline:",
    "// Timed Out (Memory Waterline: 4B out of 400B)",
    "// Timed Out (Memory Waterline: 6B out of 400B)",
];

/// Byte range of the newest complete line in `buffer`.
///
/// The packet is `buffer[start..end]`; the caller drains through `end`
/// (inclusive) after emitting. `None` means no usable frame yet, so
/// wait for more data.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    pub start: usize,
    pub end: usize,
}

pub(crate) fn latest_frame(buffer: &[u8]) -> Option<Frame> {
    let end = buffer.iter().rposition(|&b| b == FRAME_DELIMITER)?;
    if end <= 1 {
        // A delimiter with no usable content in front of it.
        return None;
    }

    let start = buffer[..end]
        .iter()
        .rposition(|&b| b == FRAME_DELIMITER)
        .map_or(0, |previous| previous + 1);
    Some(Frame { start, end })
}

/// End of a completed printer transcript, if one of the sentinel lines
/// has arrived. The transcript is `buffer[..end]`; until a sentinel
/// shows up the buffer keeps accumulating.
pub(crate) fn printer_transcript_end(buffer: &[u8]) -> Option<usize> {
    let end = buffer.iter().rposition(|&b| b == FRAME_DELIMITER)?;
    if end <= 1 {
        return None;
    }

    let transcript = String::from_utf8_lossy(&buffer[..end]);
    PRINTER_SENTINELS
        .iter()
        .any(|sentinel| transcript.contains(sentinel))
        .then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_delimiter_means_no_frame() {
        assert_eq!(latest_frame(b"partial packet"), None);
        assert_eq!(latest_frame(b""), None);
    }

    #[test]
    fn delimiter_without_content_means_no_frame() {
        assert_eq!(latest_frame(b"\n"), None);
        assert_eq!(latest_frame(b"a\n"), None);
    }

    #[test]
    fn single_complete_line_is_framed_from_the_start() {
        let frame = latest_frame(b"packet\n").unwrap();
        assert_eq!(frame, Frame { start: 0, end: 6 });
    }

    #[test]
    fn only_the_newest_of_several_lines_is_framed() {
        let buffer = b"oldest\nolder\nnewest\ntail";
        let frame = latest_frame(buffer).unwrap();
        assert_eq!(&buffer[frame.start..frame.end], b"newest");
        // Bytes after the last delimiter stay for the next tick.
        assert_eq!(frame.end, 19);
    }

    #[test]
    fn printer_transcript_waits_for_a_sentinel() {
        assert_eq!(printer_transcript_end(b"!init ok\ndata line\n"), None);

        let done = b"!init ok\ndata line\n# Finished Pretending To Print for fun!\n";
        let end = printer_transcript_end(done).unwrap();
        assert_eq!(end, done.len() - 1);
    }

    #[test]
    fn every_sentinel_terminates_a_transcript() {
        for sentinel in PRINTER_SENTINELS {
            let mut buffer = b"line one\n".to_vec();
            buffer.extend_from_slice(sentinel.as_bytes());
            buffer.push(b'\n');
            assert!(
                printer_transcript_end(&buffer).is_some(),
                "sentinel {sentinel:?} did not terminate"
            );
        }
    }
}
