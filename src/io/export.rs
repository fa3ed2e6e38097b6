//! CSV export for node exchange records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::fed::types::NodeExchange;

/// Column header for CSV exchange telemetry.
const HEADER: &str = "time,node,requested_mw,heat_rate_mj_kwh,flow_required_m3s,\
                      flow_delivered_m3s,available_mw,iterations,converged";

/// Exports exchange records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per node exchange. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[NodeExchange], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes exchange records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[NodeExchange], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    // Data rows
    for r in records {
        wtr.write_record(&[
            format!("{:.4}", r.granted_time),
            r.node_id.clone(),
            format!("{:.4}", r.requested_mw),
            format!("{:.4}", r.heat_rate_mj_kwh),
            format!("{:.4}", r.flow_required_m3s),
            format!("{:.4}", r.flow_delivered_m3s),
            format!("{:.4}", r.available_mw),
            r.iterations.to_string(),
            r.converged.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
