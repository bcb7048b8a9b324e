use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSON-lines trace of catalog loading.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: BTreeMap<&'static str, u64>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: BTreeMap::new(),
            })),
        })
    }

    /// One line per candidate resource; `error` is `None` when it loaded.
    pub fn candidate(&self, style: &str, resource: &str, error: Option<&str>) {
        let outcome = match error {
            Some(message) => format!("\"ok\":false,\"error\":\"{}\"", json_escape(message)),
            None => "\"ok\":true".to_string(),
        };
        self.write_line(&format!(
            "{{\"type\":\"catalog.candidate\",\"style\":\"{}\",\"resource\":\"{}\",{}}}",
            json_escape(style),
            json_escape(resource),
            outcome
        ));
    }

    pub fn unresolved(&self, style: &str, failures: &[String]) {
        let list = failures
            .iter()
            .map(|f| format!("\"{}\"", json_escape(f)))
            .collect::<Vec<_>>()
            .join(",");
        self.write_line(&format!(
            "{{\"type\":\"catalog.unresolved\",\"style\":\"{}\",\"failures\":[{}]}}",
            json_escape(style),
            list
        ));
    }

    pub fn increment(&self, key: &'static str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.counters.entry(key).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    /// Writes the counters gathered so far and resets them.
    pub fn emit_summary(&self, context: &str) {
        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        let counts = std::mem::take(&mut state.counters)
            .into_iter()
            .map(|(key, value)| format!("\"{}\":{}", json_escape(key), value))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            state.writer,
            "{{\"type\":\"debug.summary\",\"context\":\"{}\",\"counts\":{{{}}}}}",
            json_escape(context),
            counts
        );
        let _ = state.writer.flush();
    }

    fn write_line(&self, json: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = writeln!(state.writer, "{json}");
        }
    }
}

fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_records_and_sorted_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.jsonl");
        let logger = DebugLogger::new(&path).unwrap();
        logger.candidate("room", "illustrations/room.svg", Some("bad \"quote\""));
        logger.candidate("room", "illustrations/room.png", None);
        logger.increment("styles.resolved", 1);
        logger.increment("candidates.tried", 2);
        logger.emit_summary("catalog");

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"ok\":false"));
        assert!(lines[0].contains("bad \\\"quote\\\""));
        assert!(lines[1].contains("\"ok\":true"));
        assert_eq!(
            lines[2],
            "{\"type\":\"debug.summary\",\"context\":\"catalog\",\"counts\":{\"candidates.tried\":2,\"styles.resolved\":1}}"
        );
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(json_escape("a\u{1}b\n"), "a\\u0001b\\n");
    }
}
