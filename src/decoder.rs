use serde_json::Value;
use tracing::trace;

use crate::events::{
    FrameEvent, Terminal, DEFAULT_EVENT_KIND, EVENT_DELTA, EVENT_DONE, EVENT_ERROR,
};

const FIELD_EVENT: &str = "event";
const FIELD_DATA: &str = "data";

const FRAME_TERMINATOR: &[u8] = b"\n\n";

/// Incremental decoder for blank-line delimited event frames.
///
/// Holds the per-request stream state: bytes not yet forming a complete
/// frame, the concatenation of every delta yielded so far, and the terminal
/// marker. Buffering is byte-level, so frame terminators and multi-byte
/// characters may fall on any chunk boundary.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    carry: Vec<u8>,
    /// Prefix of `carry` already searched for a terminator.
    scanned: usize,
    accumulated: String,
    terminal: Terminal,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and lazily drain the complete frames now available.
    ///
    /// Frames the caller does not pull stay buffered for the next call. Once
    /// a terminal frame has been yielded, further input is discarded.
    pub fn feed(&mut self, bytes: &[u8]) -> Frames<'_> {
        if !self.terminal.is_terminal() {
            let start = self.carry.len().saturating_sub(1);
            self.carry.extend_from_slice(bytes);
            normalize_line_endings(&mut self.carry, start);
        }
        Frames { decoder: self }
    }

    /// Decode a complete payload in one shot.
    pub fn parse_frames(input: &str) -> Vec<FrameEvent> {
        let mut decoder = Self::default();
        decoder.feed(input.as_bytes()).collect()
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated
    }

    pub fn into_text(self) -> String {
        self.accumulated
    }

    pub fn terminal(&self) -> Terminal {
        self.terminal
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.carry.iter().all(u8::is_ascii_whitespace)
    }

    fn next_event(&mut self) -> Option<FrameEvent> {
        while !self.terminal.is_terminal() {
            let Some(split) = find_terminator(&self.carry, self.scanned) else {
                self.scanned = self.carry.len();
                return None;
            };
            let frame: Vec<u8> = self.carry.drain(..split + FRAME_TERMINATOR.len()).collect();
            self.scanned = 0;
            let frame = String::from_utf8_lossy(&frame[..split]);

            let Some(raw) = RawFrame::parse(&frame) else {
                trace!(len = split, "skipping frame without fields");
                continue;
            };

            let event = raw.into_event();
            self.apply(&event);
            return Some(event);
        }

        None
    }

    fn apply(&mut self, event: &FrameEvent) {
        match event {
            FrameEvent::Delta { text } => self.accumulated.push_str(text),
            FrameEvent::Done => self.finish(Terminal::Done),
            FrameEvent::Error { .. } => self.finish(Terminal::Error),
            FrameEvent::Other { .. } => {}
        }
    }

    fn finish(&mut self, terminal: Terminal) {
        self.terminal = terminal;
        self.carry.clear();
        self.scanned = 0;
    }
}

/// Lazy view over the complete frames buffered in a [`FrameDecoder`].
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Frames<'_> {
    /// Text accumulated from every delta yielded so far, this batch included.
    pub fn accumulated_text(&self) -> &str {
        self.decoder.accumulated_text()
    }

    pub fn terminal(&self) -> Terminal {
        self.decoder.terminal()
    }
}

impl Iterator for Frames<'_> {
    type Item = FrameEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_event()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Event,
    Data,
}

#[derive(Debug, Default)]
struct RawFrame {
    kind: Option<String>,
    data: Option<String>,
}

impl RawFrame {
    /// The first `event` and the first `data` line win; comments, `id`,
    /// `retry` and lines without a known field are skipped.
    fn parse(frame: &str) -> Option<Self> {
        let mut raw = Self::default();

        for line in frame.split('\n') {
            match split_field(line) {
                Some((Field::Event, value)) if raw.kind.is_none() => {
                    raw.kind = Some(value.trim().to_owned());
                }
                Some((Field::Data, value)) if raw.data.is_none() => {
                    raw.data = Some(value.to_owned());
                }
                _ => {}
            }
        }

        if raw.kind.is_none() && raw.data.is_none() {
            None
        } else {
            Some(raw)
        }
    }

    fn into_event(self) -> FrameEvent {
        let data = self.data.unwrap_or_default();
        let kind = self
            .kind
            .filter(|kind| !kind.is_empty())
            .unwrap_or_else(|| DEFAULT_EVENT_KIND.to_owned());

        match kind.as_str() {
            EVENT_DELTA => FrameEvent::Delta {
                text: delta_text(&data),
            },
            EVENT_DONE => FrameEvent::Done,
            EVENT_ERROR => FrameEvent::Error {
                detail: error_detail(&data),
            },
            _ => FrameEvent::Other { kind, data },
        }
    }
}

fn split_field(line: &str) -> Option<(Field, &str)> {
    let (name, value) = match line.find(':') {
        Some(index) => (&line[..index], &line[index + 1..]),
        None => (line, ""),
    };
    let value = value.strip_prefix(' ').unwrap_or(value);

    let field = match name {
        FIELD_EVENT => Field::Event,
        FIELD_DATA => Field::Data,
        _ => return None,
    };
    Some((field, value))
}

/// JSON payloads contribute their `text` string, or nothing when it is
/// absent. Anything that does not parse as JSON is literal text.
fn delta_text(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(payload) => payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        Err(_) => data.to_owned(),
    }
}

fn error_detail(data: &str) -> Option<String> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }

    let message = serde_json::from_str::<Value>(data).ok().and_then(|value| {
        value
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .map(ToString::to_string)
    });

    Some(message.unwrap_or_else(|| data.to_owned()))
}

/// Search resumes a terminator's length before `scanned`, since the last
/// normalization may have shifted the bytes around the old end.
fn find_terminator(buffer: &[u8], scanned: usize) -> Option<usize> {
    let from = scanned
        .min(buffer.len())
        .saturating_sub(FRAME_TERMINATOR.len());
    buffer[from..]
        .windows(FRAME_TERMINATOR.len())
        .position(|window| window == FRAME_TERMINATOR)
        .map(|offset| from + offset)
}

/// Drop every `\r` that precedes a `\n` in `buffer[from..]`. A trailing `\r`
/// is kept until its partner arrives.
fn normalize_line_endings(buffer: &mut Vec<u8>, from: usize) {
    if !buffer[from..].windows(2).any(|pair| pair == b"\r\n") {
        return;
    }

    let mut write = from;
    for read in from..buffer.len() {
        let byte = buffer[read];
        if byte == b'\r' && buffer.get(read + 1) == Some(&b'\n') {
            continue;
        }
        buffer[write] = byte;
        write += 1;
    }
    buffer.truncate(write);
}
