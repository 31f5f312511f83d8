//! Tabular audit report export.
//!
//! One row per verified claim, written as comma-delimited text. The
//! format is the run's only durable artifact, so parsing it back is part
//! of the contract: `parse_report(render_report(rows))` reproduces every
//! field. Floats are written with Rust's shortest round-trip formatting,
//! so numeric fields reload to the exact same values.

use std::fmt::Write as _;
use std::path::Path;

use crate::model::{Verdict, VerifiedClaim};

/// Claim text is truncated to this many characters in the export.
const CLAIM_PREVIEW_CHARS: usize = 80;

const HEADER: &str = "location,lat,lon,before,after,delta,verdict,claim";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed report: {0}")]
    Malformed(String),
}

/// One reloaded report row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub before: f64,
    pub after: f64,
    pub delta: f64,
    pub verdict: Verdict,
    pub claim: String,
}

/// Write the report for `rows` to `path`.
pub fn write_report(path: &Path, rows: &[VerifiedClaim]) -> Result<(), ExportError> {
    std::fs::write(path, render_report(rows))?;
    Ok(())
}

/// Render the report as delimited text.
pub fn render_report(rows: &[VerifiedClaim]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for row in rows {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            quote(&row.claim.location),
            row.coords.lat,
            row.coords.lon,
            row.before.value,
            row.after.value,
            row.delta,
            row.verdict,
            quote(&truncate_chars(&row.claim.text, CLAIM_PREVIEW_CHARS)),
        );
    }

    out
}

/// Read a previously exported report back from `path`.
pub fn read_report(path: &Path) -> Result<Vec<ReportRow>, ExportError> {
    parse_report(&std::fs::read_to_string(path)?)
}

/// Parse exported report text back into rows.
pub fn parse_report(text: &str) -> Result<Vec<ReportRow>, ExportError> {
    let mut records = split_records(text)?;

    if records.is_empty() {
        return Err(ExportError::Malformed("missing header".to_string()));
    }
    let header = records.remove(0);
    if header.join(",") != HEADER {
        return Err(ExportError::Malformed(format!(
            "unexpected header: {}",
            header.join(",")
        )));
    }

    records
        .into_iter()
        .enumerate()
        .map(|(i, fields)| {
            if fields.len() != 8 {
                return Err(ExportError::Malformed(format!(
                    "row {}: expected 8 fields, got {}",
                    i + 1,
                    fields.len()
                )));
            }

            let num = |s: &str, name: &str| {
                s.parse::<f64>().map_err(|_| {
                    ExportError::Malformed(format!("row {}: bad {}: {}", i + 1, name, s))
                })
            };

            Ok(ReportRow {
                location: fields[0].clone(),
                lat: num(&fields[1], "lat")?,
                lon: num(&fields[2], "lon")?,
                before: num(&fields[3], "before")?,
                after: num(&fields[4], "after")?,
                delta: num(&fields[5], "delta")?,
                verdict: fields[6]
                    .parse()
                    .map_err(|e| ExportError::Malformed(format!("row {}: {}", i + 1, e)))?,
                claim: fields[7].clone(),
            })
        })
        .collect()
}

/// Quote a field when it contains a delimiter, quote, or newline;
/// embedded quotes are doubled.
fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Truncate to `max` characters, marking longer text with an ellipsis.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut preview: String = text.chars().take(max).collect();
        preview.push_str("...");
        preview
    }
}

/// Split delimited text into records of unquoted fields. Handles quoted
/// fields with doubled quotes and embedded delimiters or newlines.
fn split_records(text: &str) -> Result<Vec<Vec<String>>, ExportError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                other => field.push(other),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                if !(fields.len() == 1 && fields[0].is_empty()) {
                    records.push(std::mem::take(&mut fields));
                } else {
                    fields.clear();
                }
            }
            other => field.push(other),
        }
    }

    if in_quotes {
        return Err(ExportError::Malformed("unterminated quote".to_string()));
    }

    // Final record without trailing newline.
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Claim, Coordinates, GeoBox, VegetationSample};

    fn verified(location: &str, text: &str, before: f64, after: f64) -> VerifiedClaim {
        let coords = Coordinates {
            lat: 12.97,
            lon: 77.59,
        };
        VerifiedClaim {
            claim: Claim {
                text: text.to_string(),
                location: location.to_string(),
            },
            coords,
            bbox: GeoBox::around(coords, 0.05),
            before: VegetationSample {
                value: before,
                scene_id: "scene-before".to_string(),
            },
            after: VegetationSample {
                value: after,
                scene_id: "scene-after".to_string(),
            },
            delta: after - before,
            verdict: crate::service::verdict::classify(after - before, 0.05),
        }
    }

    #[test]
    fn row_count_matches_verified_claims() {
        let rows = vec![
            verified("Bangalore", "We planted trees.", 0.31, 0.41),
            verified("Nairobi", "Water restored.", 0.52, 0.50),
        ];
        let text = render_report(&rows);
        assert_eq!(text.lines().count(), 3); // header + 2 rows

        let parsed = parse_report(&text).unwrap();
        assert_eq!(parsed.len(), rows.len());
    }

    #[test]
    fn report_round_trips_losslessly() {
        let rows = vec![verified(
            "Bangalore",
            "We initiated a reforestation project in Bangalore to improve air quality.",
            0.31,
            0.41,
        )];
        let parsed = parse_report(&render_report(&rows)).unwrap();

        let row = &parsed[0];
        assert_eq!(row.location, "Bangalore");
        assert_eq!(row.lat, 12.97);
        assert_eq!(row.lon, 77.59);
        assert_eq!(row.before, 0.31);
        assert_eq!(row.after, 0.41);
        assert_eq!(row.delta, 0.41 - 0.31);
        assert_eq!(row.verdict, Verdict::Positive);
        assert_eq!(row.claim, rows[0].claim.text);
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        let rows = vec![verified(
            "Springfield, USA",
            "We \"restored\" wetlands, fully.",
            0.2,
            0.2,
        )];
        let text = render_report(&rows);
        assert!(text.contains("\"Springfield, USA\""));

        let parsed = parse_report(&text).unwrap();
        assert_eq!(parsed[0].location, "Springfield, USA");
        assert_eq!(parsed[0].claim, "We \"restored\" wetlands, fully.");
        assert_eq!(parsed[0].verdict, Verdict::Neutral);
    }

    #[test]
    fn long_claim_text_is_truncated_with_ellipsis() {
        let long = "x".repeat(120);
        let rows = vec![verified("Bangalore", &long, 0.1, 0.3)];
        let parsed = parse_report(&render_report(&rows)).unwrap();
        assert_eq!(parsed[0].claim.chars().count(), 83);
        assert!(parsed[0].claim.ends_with("..."));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            parse_report(""),
            Err(ExportError::Malformed(_))
        ));
        assert!(matches!(
            parse_report("wrong,header\n"),
            Err(ExportError::Malformed(_))
        ));
        let text = format!("{}\nonly,three,fields\n", "location,lat,lon,before,after,delta,verdict,claim");
        assert!(matches!(
            parse_report(&text),
            Err(ExportError::Malformed(_))
        ));
    }

    #[test]
    fn write_and_read_report_files() {
        let dir = std::env::temp_dir();
        let path = dir.join("terraclaim_export_test.csv");
        let rows = vec![verified("Bangalore", "We planted trees.", 0.31, 0.41)];

        write_report(&path, &rows).unwrap();
        let parsed = read_report(&path).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].location, "Bangalore");

        let _ = std::fs::remove_file(&path);
    }
}
