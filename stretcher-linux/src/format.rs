use std::fmt::Write;

use serde::Serialize;
use stretcher::decoder::Event;

use crate::simulation::SimulationReport;

/// An event together with what the host derives from it
#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    #[serde(flatten)]
    event: &'a Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    bus_frequency_hz: Option<u32>,
}

pub fn format_event(w: &mut impl Write, event: &Event, tick_rate_hz: u32) -> std::fmt::Result {
    match (event, event.bus_frequency(tick_rate_hz)) {
        (
            Event::FinishTraining {
                measurements: [low0, high0, low1],
            },
            Some(bus),
        ) => write!(
            w,
            "* finish link training: bus speed {bus} Hz (low {low0}, high {high0}, low {low1} ticks)"
        ),
        _ => write!(w, "* {event}"),
    }
}

pub fn format_event_json(event: &Event, tick_rate_hz: u32) -> serde_json::Result<String> {
    serde_json::to_string(&EventRecord {
        event,
        bus_frequency_hz: event.bus_frequency(tick_rate_hz),
    })
}

pub fn format_report(w: &mut impl Write, report: &SimulationReport, tick_rate_hz: u32) -> std::fmt::Result {
    for event in &report.events {
        format_event(w, event, tick_rate_hz)?;
        writeln!(w)?;
    }

    writeln!(
        w,
        "{} ticks, {} telemetry bytes, {} bus cycles",
        report.ticks,
        report.telemetry_bytes,
        report.stretches.len()
    )?;
    write!(w, "stretched ticks per cycle:")?;
    for stretch in &report.stretches {
        write!(w, " {stretch}")?;
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use stretcher::decoder::DecoderPhase;

    use super::*;

    fn text(event: &Event) -> String {
        let mut buf = String::new();
        format_event(&mut buf, event, 12_000_000).unwrap();
        buf
    }

    #[test]
    fn text_output() {
        assert_eq!(text(&Event::StartTraining), "* start link training");
        assert_eq!(
            text(&Event::FinishTraining {
                measurements: [15, 15, 15]
            }),
            "* finish link training: bus speed 400000 Hz (low 15, high 15, low 15 ticks)"
        );
        assert_eq!(
            text(&Event::FinishTraining {
                measurements: [0, 0, 0]
            }),
            "* finish link training: low 0, high 0, low 0 ticks"
        );
    }

    #[test]
    fn json_output() {
        let json = format_event_json(
            &Event::FinishTraining {
                measurements: [15, 15, 16],
            },
            12_000_000,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "finish-training");
        assert_eq!(value["measurements"], serde_json::json!([15, 15, 16]));
        assert_eq!(value["bus_frequency_hz"], 400_000);

        let json = format_event_json(
            &Event::Unhandled {
                phase: DecoderPhase::Idle,
                byte: 0x42,
            },
            12_000_000,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "unhandled");
        assert_eq!(value["phase"], "idle");
        assert_eq!(value["byte"], 0x42);
        assert!(value.get("bus_frequency_hz").is_none());
    }

    #[test]
    fn report_output() {
        let report = SimulationReport {
            ticks: 40,
            telemetry_bytes: 9,
            events: vec![Event::StartTraining],
            stretches: vec![0, 0, 4],
        };
        let mut buf = String::new();
        format_report(&mut buf, &report, 12_000_000).unwrap();
        assert_eq!(
            buf,
            "* start link training\n\
             40 ticks, 9 telemetry bytes, 3 bus cycles\n\
             stretched ticks per cycle: 0 0 4\n"
        );
    }
}
