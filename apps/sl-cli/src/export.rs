//! Trajectory export.

use std::io::Write;

use clap::ValueEnum;
use sl_sim::SimRecord;

use crate::error::AppResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Json,
}

/// One row per recorded time point: `time_s,<state columns>`.
pub fn write_csv<W: Write>(out: &mut W, record: &SimRecord) -> AppResult<()> {
    writeln!(out, "time_s,{}", record.labels.join(","))?;
    for (t, x) in record.t.iter().zip(&record.x) {
        let values: Vec<String> = x.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{},{}", t, values.join(","))?;
    }
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, record: &SimRecord) -> AppResult<()> {
    serde_json::to_writer_pretty(&mut *out, record)?;
    writeln!(out)?;
    Ok(())
}

pub fn write<W: Write>(out: &mut W, record: &SimRecord, format: Format) -> AppResult<()> {
    match format {
        Format::Csv => write_csv(out, record),
        Format::Json => write_json(out, record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_sim::{ModelKind, ModelParams, SimOptions, run_sim};

    fn record() -> SimRecord {
        let opts = SimOptions {
            t_end: 0.03,
            ..SimOptions::for_kind(ModelKind::DrainingTank)
        };
        run_sim(ModelParams::defaults(ModelKind::DrainingTank), &opts).unwrap()
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &record()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time_s,h_m");
        assert_eq!(lines[1], "0,2");
        assert_eq!(lines.len(), 1 + record().len());
    }

    #[test]
    fn json_carries_labels_and_stop() {
        let mut buf = Vec::new();
        write_json(&mut buf, &record()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["kind"], "draining_tank");
        assert_eq!(value["labels"][0], "h_m");
        assert!(value["stop"].is_null());
    }
}
