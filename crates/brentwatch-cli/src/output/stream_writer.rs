//! `--stream` output: one JSON event per line.
//!
//! A run always produces `start`, `progress` (series loaded), one `chunk` per
//! dashboard panel (or a single chunk holding the whole payload for the other
//! commands), one `error` per envelope error and a closing `end`.

use std::io::Write;

use brentwatch_core::{Envelope, EnvelopeError, EnvelopeMeta, PanelId, UtcDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamEventType {
    Start,
    Progress,
    Chunk,
    End,
    Error,
}

/// Envelope error as it appears on the stream, stage included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamEventError<'a> {
    pub code: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'a str>,
}

impl<'a> From<&'a EnvelopeError> for StreamEventError<'a> {
    fn from(error: &'a EnvelopeError) -> Self {
        Self {
            code: &error.code,
            message: &error.message,
            retryable: error.retryable,
            stage: error.stage.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EventData<'a> {
    Start {
        request_id: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_id: Option<&'a str>,
        schema_version: &'a str,
        source: &'a str,
    },
    Loaded {
        phase: &'static str,
        cache_hit: bool,
        latency_ms: u64,
        warning_count: usize,
    },
    Panel(PanelChunk<'a>),
    Payload(&'a Value),
    End {
        status: &'static str,
        warning_count: usize,
        error_count: usize,
    },
}

/// A single rendered panel with its position in the dashboard.
#[derive(Debug, Serialize)]
struct PanelChunk<'a> {
    index: usize,
    total: usize,
    id: PanelId,
    panel: &'a Value,
}

#[derive(Debug, Serialize)]
struct StreamEvent<'a> {
    event: StreamEventType,
    seq: u64,
    ts: UtcDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<EventData<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<StreamEventError<'a>>,
}

/// Writes the event sequence for one envelope with a monotonically increasing
/// `seq`, flushing after every line.
pub struct DashboardStreamWriter<W: Write> {
    writer: W,
    next_seq: u64,
}

impl<W: Write> DashboardStreamWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            next_seq: 1,
        }
    }

    pub fn write_envelope(&mut self, envelope: &Envelope<Value>) -> Result<(), CliError> {
        self.start(&envelope.meta)?;
        self.loaded(&envelope.meta)?;

        match panels_of(&envelope.data) {
            Some(panels) => {
                let total = panels.len();
                for (index, (id, panel)) in panels.into_iter().enumerate() {
                    let chunk = PanelChunk {
                        index,
                        total,
                        id,
                        panel,
                    };
                    self.emit(StreamEventType::Chunk, Some(EventData::Panel(chunk)), None)?;
                }
            }
            None => self.emit(
                StreamEventType::Chunk,
                Some(EventData::Payload(&envelope.data)),
                None,
            )?,
        }

        for error in &envelope.errors {
            self.emit(StreamEventType::Error, None, Some(error.into()))?;
        }

        let status = if envelope.errors.is_empty() { "ok" } else { "error" };
        self.emit(
            StreamEventType::End,
            Some(EventData::End {
                status,
                warning_count: envelope.meta.warnings.len(),
                error_count: envelope.errors.len(),
            }),
            None,
        )
    }

    fn start(&mut self, meta: &EnvelopeMeta) -> Result<(), CliError> {
        let data = EventData::Start {
            request_id: &meta.request_id,
            trace_id: meta.trace_id.as_deref(),
            schema_version: &meta.schema_version,
            source: &meta.source,
        };
        self.emit(StreamEventType::Start, Some(data), None)
    }

    fn loaded(&mut self, meta: &EnvelopeMeta) -> Result<(), CliError> {
        let data = EventData::Loaded {
            phase: "loaded",
            cache_hit: meta.cache_hit,
            latency_ms: meta.latency_ms,
            warning_count: meta.warnings.len(),
        };
        self.emit(StreamEventType::Progress, Some(data), None)
    }

    fn emit(
        &mut self,
        event: StreamEventType,
        data: Option<EventData<'_>>,
        error: Option<StreamEventError<'_>>,
    ) -> Result<(), CliError> {
        let event = StreamEvent {
            event,
            seq: self.next_seq,
            ts: UtcDateTime::now(),
            data,
            error,
        };
        self.next_seq += 1;

        let payload = serde_json::to_string(&event)?;
        self.writer.write_all(payload.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Dashboard panels keyed by their id. `None` when the payload is not a
/// dashboard or a panel id is not recognised.
fn panels_of(data: &Value) -> Option<Vec<(PanelId, &Value)>> {
    data.get("panels")?
        .as_array()?
        .iter()
        .map(|panel| {
            let id = panel.get("id")?.as_str()?.parse().ok()?;
            Some((id, panel))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn envelope(data: Value, errors: Vec<EnvelopeError>) -> Envelope<Value> {
        let meta = EnvelopeMeta::new("request-12345", "v1.0.0", "http://prices.test", 5, false)
            .expect("valid meta");
        Envelope::with_errors(meta, data, errors).expect("valid envelope")
    }

    fn events(envelope: &Envelope<Value>) -> Vec<Value> {
        let mut sink = Vec::<u8>::new();
        DashboardStreamWriter::new(&mut sink)
            .write_envelope(envelope)
            .expect("stream");
        std::str::from_utf8(&sink)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[test]
    fn panel_chunks_carry_id_and_position() {
        let data = json!({ "panels": [
            { "id": "observed", "content": { "kind": "observations" } },
            { "id": "trend", "content": { "kind": "observations" } },
        ]});

        let events = events(&envelope(data, Vec::new()));

        let kinds: Vec<&str> = events
            .iter()
            .map(|event| event["event"].as_str().unwrap_or_default())
            .collect();
        assert_eq!(kinds, vec!["start", "progress", "chunk", "chunk", "end"]);
        assert_eq!(events[3]["data"]["id"], "trend");
        assert_eq!(events[3]["data"]["index"], 1);
        assert_eq!(events[3]["data"]["total"], 2);
        assert_eq!(events[3]["data"]["panel"]["content"]["kind"], "observations");
        assert_eq!(events[0]["seq"], 1);
        assert_eq!(events[4]["seq"], 5);
    }

    #[test]
    fn non_dashboard_payload_is_one_chunk() {
        let data = json!({ "observations": [] });

        let events = events(&envelope(data.clone(), Vec::new()));

        assert_eq!(events.len(), 4);
        assert_eq!(events[2]["event"], "chunk");
        assert_eq!(events[2]["data"], data);
        assert_eq!(events[3]["data"]["status"], "ok");
    }

    #[test]
    fn error_events_carry_stage_and_retryable() {
        let error = EnvelopeError::new("transport_error", "HTTP 404")
            .expect("valid error")
            .with_retryable(true)
            .with_stage("fetch");

        let events = events(&envelope(json!({ "observations": [] }), vec![error]));

        let error_event = events
            .iter()
            .find(|event| event["event"] == "error")
            .expect("error event");
        assert_eq!(error_event["error"]["code"], "transport_error");
        assert_eq!(error_event["error"]["stage"], "fetch");
        assert_eq!(error_event["error"]["retryable"], true);
        assert!(error_event.get("data").is_none());
        assert_eq!(events.last().expect("end")["data"]["status"], "error");
    }
}
