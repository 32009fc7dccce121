//! Incremental `text/event-stream` decoder
//!
//! Accepts arbitrary chunk boundaries and yields the `data` payload of each
//! complete event. Comment lines (keep-alives) and fields other than `data`
//! are skipped.

#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect the events it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut raw: Vec<u8> = self.pending.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }

            let line = String::from_utf8_lossy(&raw);
            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (&*line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_single_frame() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b"data: {\"id\":1}\n\n");
        assert_eq!(events, vec!["{\"id\":1}".to_string()]);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.feed(b"data: {\"id\"").is_empty());
        assert!(decoder.feed(b":1}\n").is_empty());
        assert_eq!(decoder.feed(b"\n"), vec!["{\"id\":1}".to_string()]);
    }

    #[test]
    fn test_skips_keepalive_comments_and_other_fields() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b":\n\nevent: update\nid: 3\ndata: x\n\n");
        assert_eq!(events, vec!["x".to_string()]);
    }

    #[test]
    fn test_multiline_data_and_crlf() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b"data: a\r\ndata: b\r\n\r\ndata:c\n\n");
        assert_eq!(events, vec!["a\nb".to_string(), "c".to_string()]);
    }
}
