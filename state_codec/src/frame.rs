use crate::decode::decode;
use crate::value::Value;

pub const START_MARKER: &str = ">>>GAMESTATE>>>";
pub const END_MARKER: &str = "<<<END<<<";
/// Chunked frames look like `>>>GAMESTATE:2/5>>>…`, one chunk per log line,
/// with the final chunk terminated by [`END_MARKER`].
pub const CHUNK_PREFIX: &str = ">>>GAMESTATE:";

/// Frame a payload as one single-line block.
pub fn frame_block(payload: &str) -> String {
    format!("{START_MARKER}{payload}{END_MARKER}")
}

/// Frame a payload, splitting it across numbered chunk lines when it exceeds
/// `max_chunk` bytes. The host log writer caps line length, so oversized
/// payloads must travel as multiple lines and be reassembled on extraction.
pub fn frame_chunked(payload: &str, max_chunk: usize) -> Vec<String> {
    let max_chunk = max_chunk.max(1);
    if payload.len() <= max_chunk {
        return vec![frame_block(payload)];
    }

    let mut pieces: Vec<&str> = Vec::new();
    let mut rest = payload;
    while !rest.is_empty() {
        let mut split = max_chunk.min(rest.len());
        while split > 0 && !rest.is_char_boundary(split) {
            split -= 1;
        }
        if split == 0 {
            // max_chunk landed inside the first character; emit it whole.
            split = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        }
        let (head, tail) = rest.split_at(split);
        pieces.push(head);
        rest = tail;
    }

    let total = pieces.len();
    pieces
        .iter()
        .enumerate()
        .map(|(index, piece)| {
            let mut line = format!("{CHUNK_PREFIX}{}/{}>>>{}", index + 1, total, piece);
            if index + 1 == total {
                line.push_str(END_MARKER);
            }
            line
        })
        .collect()
}

/// All complete block payloads in `text`, in stream order.
///
/// A block is complete when an end marker follows its start marker (or its
/// full chunk set). Start markers with no matching end, incomplete chunk
/// sets, and inter-block noise contribute nothing.
pub fn extract_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut cursor = 0usize;
    while let Some(rel) = text[cursor..].find(END_MARKER) {
        let end = cursor + rel;
        if let Some(payload) = parse_segment(&text[cursor..end]) {
            blocks.push(payload);
        }
        cursor = end + END_MARKER.len();
    }
    blocks
}

/// Decode the last complete block in `text`.
///
/// `None` means "no new snapshot this poll": either no complete block exists
/// or the last one failed to decode. Never panics on malformed input.
pub fn extract_latest(text: &str) -> Option<Value> {
    let blocks = extract_blocks(text);
    let payload = blocks.last()?;
    decode(payload).ok()
}

/// Explicit read-position state for an append-only, occasionally truncated
/// stream. Owned by the caller and passed around; never a process global.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamCursor {
    position: u64,
}

impl StreamCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn advance_to(&mut self, position: u64) {
        self.position = position;
    }

    /// Reconcile against the stream's current length. Returns `true` when
    /// the stream shrank (external truncation) and the cursor was reset to
    /// the start.
    pub fn sync(&mut self, stream_len: u64) -> bool {
        if stream_len < self.position {
            self.position = 0;
            true
        } else {
            false
        }
    }
}

/// One segment runs from the previous end marker (or stream start) up to the
/// next end marker. It holds at most one block: the trailing simple block or
/// the trailing complete chunk set, whichever starts later.
fn parse_segment(segment: &str) -> Option<String> {
    let simple_start = segment.rfind(START_MARKER);
    let chunked = last_chunk_set(segment);

    match (simple_start, &chunked) {
        (Some(start), Some((set_start, _))) if start > *set_start => {
            Some(segment[start + START_MARKER.len()..].trim().to_string())
        }
        (_, Some((_, payload))) => Some(payload.clone()),
        (Some(start), None) => Some(segment[start + START_MARKER.len()..].trim().to_string()),
        (None, None) => None,
    }
}

/// Reassemble the last complete chunk set in the segment, returning its
/// start offset and joined payload. Chunks must run 1..=n with a consistent
/// n; non-final chunk content ends at its log line's newline.
fn last_chunk_set(segment: &str) -> Option<(usize, String)> {
    let markers = chunk_markers(segment);
    if markers.is_empty() {
        return None;
    }

    // Walk chunk-1 markers from the back; the newest complete set wins.
    for (first_idx, first) in markers.iter().enumerate().rev() {
        if first.index != 1 {
            continue;
        }
        let total = first.total;
        if total == 0 {
            continue;
        }
        let mut pieces: Vec<String> = Vec::with_capacity(total as usize);
        let mut complete = true;
        for expected in 1..=total {
            let Some(marker) = markers.get(first_idx + expected as usize - 1) else {
                complete = false;
                break;
            };
            if marker.index != expected || marker.total != total {
                complete = false;
                break;
            }
            let content_end = markers
                .get(first_idx + expected as usize)
                .map(|next| next.start)
                .unwrap_or(segment.len());
            let mut content = &segment[marker.content_start..content_end];
            if expected < total {
                if let Some(newline) = content.find('\n') {
                    content = &content[..newline];
                }
                content = content.trim_end_matches('\r');
            }
            pieces.push(content.to_string());
        }
        if complete {
            return Some((first.start, pieces.concat().trim().to_string()));
        }
    }
    None
}

struct ChunkMarker {
    start: usize,
    content_start: usize,
    index: u32,
    total: u32,
}

fn chunk_markers(segment: &str) -> Vec<ChunkMarker> {
    let mut markers = Vec::new();
    let mut offset = 0usize;
    while let Some(rel) = segment[offset..].find(CHUNK_PREFIX) {
        let start = offset + rel;
        offset = start + CHUNK_PREFIX.len();
        if let Some(marker) = parse_chunk_marker(segment, start) {
            offset = marker.content_start;
            markers.push(marker);
        }
    }
    markers
}

fn parse_chunk_marker(segment: &str, start: usize) -> Option<ChunkMarker> {
    let rest = &segment[start + CHUNK_PREFIX.len()..];
    let slash = rest.find('/')?;
    let index: u32 = rest[..slash].parse().ok()?;
    let after_slash = &rest[slash + 1..];
    let close = after_slash.find(">>>")?;
    let total: u32 = after_slash[..close].parse().ok()?;
    let content_start = start + CHUNK_PREFIX.len() + slash + 1 + close + 3;
    Some(ChunkMarker {
        start,
        content_start,
        index,
        total,
    })
}
