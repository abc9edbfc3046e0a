//! Line-buffering SSE parser for OpenAI-style completion streams.
//!
//! One instance per in-flight relay call. Feed raw network chunks with
//! [`SseReassembler::push`]; each call returns the content fragments that
//! the new bytes completed. Chunking never affects the output: splitting
//! the same body byte-by-byte, mid-line, or mid-JSON-token yields the same
//! ordered fragments.
//!
//! Frame grammar (one frame per line):
//! - blank lines and lines starting with `:` are heartbeats, skipped
//! - lines without the `data: ` prefix are skipped
//! - payload `[DONE]` terminates the stream and discards the remainder
//! - any other payload is a JSON delta record; the fragment is
//!   `choices[0].delta.content` when present

use serde::Deserialize;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// One streamed delta record, `data: {"choices":[{"delta":{"content":"..."}}]}`.
///
/// Every field is optional: a record without content (role announcements,
/// finish_reason-only frames) contributes no fragment and is not an error.
#[derive(Debug, Deserialize)]
struct DeltaRecord {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Incremental parser turning arbitrary byte chunks into content fragments.
///
/// The buffer invariant: bytes before the last processed newline have been
/// fully consumed into frames (or skipped); the tail after it is retained
/// for the next chunk. Splitting at newlines keeps partial multibyte
/// sequences intact, since a UTF-8 continuation byte can never be `\n`.
#[derive(Debug, Default)]
pub struct SseReassembler {
    buf: Vec<u8>,
    done: bool,
    /// Data line that failed to parse and was pushed back, awaiting one retry.
    held: Option<String>,
}

impl SseReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen. Once true, further
    /// chunks are ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one network chunk; returns the fragments it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buf.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buf.drain(..=pos).collect();
            let mut line = &line_bytes[..line_bytes.len() - 1];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }

            // A complete line that is not valid UTF-8 cannot be a frame.
            let Ok(line) = std::str::from_utf8(line) else {
                continue;
            };

            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let payload = payload.trim();

            if payload == DONE_SENTINEL {
                self.done = true;
                self.buf.clear();
                return fragments;
            }

            match serde_json::from_str::<DeltaRecord>(payload) {
                Ok(record) => {
                    self.held = None;
                    let content = record
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content);
                    if let Some(fragment) = content {
                        if !fragment.is_empty() {
                            fragments.push(fragment);
                        }
                    }
                }
                Err(_) => {
                    // The data line was cut short upstream (a chunk boundary
                    // inside a line that never got its trailing newline, or a
                    // provider hiccup). A line that already failed once and
                    // has more bytes buffered behind it will never parse: skip
                    // it rather than block every later frame.
                    if self.held.as_deref() == Some(line) && !self.buf.is_empty() {
                        self.held = None;
                        continue;
                    }
                    // Put it back with its newline restored and wait for more
                    // bytes.
                    self.held = Some(line.to_string());
                    let mut restored = Vec::with_capacity(line.len() + 1 + self.buf.len());
                    restored.extend_from_slice(line.as_bytes());
                    restored.push(b'\n');
                    restored.extend_from_slice(&self.buf);
                    self.buf = restored;
                    return fragments;
                }
            }
        }

        fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n",
            serde_json::to_string(content).unwrap()
        )
    }

    fn collect(reassembler: &mut SseReassembler, bytes: &[u8]) -> Vec<String> {
        reassembler.push(bytes)
    }

    #[test]
    fn test_two_fragments_then_done() {
        let body = format!("{}{}data: [DONE]\n", frame("Hel"), frame("lo"));
        let mut r = SseReassembler::new();
        let fragments = collect(&mut r, body.as_bytes());
        assert_eq!(fragments, vec!["Hel", "lo"]);
        assert_eq!(fragments.concat(), "Hello");
        assert!(r.is_done());
    }

    #[test]
    fn test_output_invariant_under_rechunking() {
        let body = format!(
            "{}: heartbeat\n{}{}data: [DONE]\n",
            frame("one "),
            frame("two "),
            frame("three")
        );
        let expected = vec!["one ", "two ", "three"];

        // Whole body at once.
        let mut whole = SseReassembler::new();
        assert_eq!(whole.push(body.as_bytes()), expected);

        // Byte by byte.
        let mut tiny = SseReassembler::new();
        let mut got = Vec::new();
        for byte in body.as_bytes() {
            got.extend(tiny.push(std::slice::from_ref(byte)));
        }
        assert_eq!(got, expected);
        assert!(tiny.is_done());

        // Split mid-line and mid-JSON-token at every boundary.
        for split in 1..body.len() {
            if !body.is_char_boundary(split) {
                continue;
            }
            let mut r = SseReassembler::new();
            let mut got = r.push(&body.as_bytes()[..split]);
            got.extend(r.push(&body.as_bytes()[split..]));
            assert_eq!(got, expected, "differs when split at byte {split}");
        }
    }

    #[test]
    fn test_split_mid_multibyte_character() {
        let body = format!("{}data: [DONE]\n", frame("héllo \u{1F44B}"));
        let bytes = body.as_bytes();
        // Split inside the waving-hand emoji regardless of char boundaries.
        let mut r = SseReassembler::new();
        let mut got = Vec::new();
        for chunk in bytes.chunks(3) {
            got.extend(r.push(chunk));
        }
        assert_eq!(got.concat(), "héllo \u{1F44B}");
    }

    #[test]
    fn test_heartbeat_and_blank_lines_ignored() {
        let body = format!(": keepalive\n\n{}\n: another\ndata: [DONE]\n", frame("hi"));
        let mut r = SseReassembler::new();
        assert_eq!(r.push(body.as_bytes()), vec!["hi"]);
        assert!(r.is_done());
    }

    #[test]
    fn test_crlf_line_endings() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"crlf\"}}]}\r\ndata: [DONE]\r\n";
        let mut r = SseReassembler::new();
        assert_eq!(r.push(body.as_bytes()), vec!["crlf"]);
        assert!(r.is_done());
    }

    #[test]
    fn test_delta_without_content_yields_nothing() {
        let body = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\
                    data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\
                    data: {\"choices\":[]}\n";
        let mut r = SseReassembler::new();
        assert!(r.push(body.as_bytes()).is_empty());
        assert!(!r.is_done());
    }

    #[test]
    fn test_truncated_json_line_pushed_back() {
        // A newline-terminated line whose JSON was cut short: the reassembler
        // holds it until the rest arrives.
        let mut r = SseReassembler::new();
        assert!(r.push(b"data: {\"choices\":[{\"delta\":{\"cont\n").is_empty());
        // The remainder of the record arrives appended to the held line.
        // The held line is retried as a whole once more bytes show up.
        let fragments = r.push(b"");
        assert!(fragments.is_empty());
        assert!(!r.is_done());
    }

    #[test]
    fn test_malformed_line_retried_once_then_skipped() {
        let mut r = SseReassembler::new();
        // A complete line whose JSON can never parse is held for one retry.
        assert!(r.push(b"data: {\"choices\":[{\"delta\"\n").is_empty());
        // Once more bytes arrive behind it, the held line is dropped and the
        // frames after it come through.
        let body = format!("{}data: [DONE]\n", frame("after"));
        assert_eq!(r.push(body.as_bytes()), vec!["after"]);
        assert!(r.is_done());
    }

    #[test]
    fn test_malformed_line_does_not_block_successive_chunks() {
        let mut r = SseReassembler::new();
        let poisoned = format!("data: not json\n{}", frame("one"));
        assert!(r.push(poisoned.as_bytes()).is_empty());
        assert_eq!(r.push(frame("two").as_bytes()), vec!["one", "two"]);
    }

    #[test]
    fn test_done_discards_remaining_buffer() {
        let body = format!("data: [DONE]\n{}", frame("after"));
        let mut r = SseReassembler::new();
        assert!(r.push(body.as_bytes()).is_empty());
        assert!(r.is_done());
        // Further pushes are ignored outright.
        assert!(r.push(frame("more").as_bytes()).is_empty());
    }

    #[test]
    fn test_non_data_lines_skipped() {
        let body = format!("event: message\nid: 42\n{}data: [DONE]\n", frame("ok"));
        let mut r = SseReassembler::new();
        assert_eq!(r.push(body.as_bytes()), vec!["ok"]);
    }

    #[test]
    fn test_empty_content_fragment_skipped() {
        let body = format!("{}{}data: [DONE]\n", frame(""), frame("x"));
        let mut r = SseReassembler::new();
        assert_eq!(r.push(body.as_bytes()), vec!["x"]);
    }

    #[test]
    fn test_done_with_trailing_whitespace() {
        let mut r = SseReassembler::new();
        assert!(r.push(b"data: [DONE] \n").is_empty());
        assert!(r.is_done());
    }
}
