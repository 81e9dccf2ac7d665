use crate::core::models::interaction::{InteractionRecord, MEASUREMENT_SLOTS, Measurements};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableWriteError {
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

fn header() -> Vec<String> {
    let mut columns = vec!["label1".to_string(), "label2".to_string(), "pair_type".to_string()];
    for leg in 1..=2 {
        columns.extend((1..=MEASUREMENT_SLOTS).map(|slot| format!("item{leg}_{slot}")));
    }
    columns.extend(["atom1_id", "atom2_id", "atom3_id", "atom4_id"].map(String::from));
    columns
}

fn slot_fields(items: Option<&Measurements>) -> impl Iterator<Item = String> + '_ {
    (0..MEASUREMENT_SLOTS).map(move |slot| {
        items
            .and_then(|m| m.get(slot))
            .map(|value| value.to_string())
            .unwrap_or_default()
    })
}

fn row(record: &InteractionRecord) -> Vec<String> {
    let bridge = record.bridge.as_ref();
    let mut fields = vec![
        record.label.clone(),
        bridge.map(|b| b.label.clone()).unwrap_or_default(),
        record.pair_type.clone(),
    ];
    fields.extend(slot_fields(Some(&record.items)));
    fields.extend(slot_fields(bridge.map(|b| &b.items)));
    fields.push(record.atom1.to_string());
    fields.push(record.atom2.to_string());
    fields.push(bridge.map(|b| b.solvent.to_string()).unwrap_or_default());
    fields.push(bridge.map(|b| b.partner.to_string()).unwrap_or_default());
    fields
}

/// Writes the raw interaction table, one row per record. Undefined slots are empty fields.
pub fn write_interactions<W: Write>(records: &[InteractionRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header())?;
    for record in records {
        csv_writer.write_record(row(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_interactions_to_path(records: &[InteractionRecord], path: &Path) -> Result<(), TableWriteError> {
    let file = std::fs::File::create(path).map_err(|e| TableWriteError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    write_interactions(records, std::io::BufWriter::new(file)).map_err(|e| TableWriteError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

/// Writes `label,count` rows, preceded by a `frames,<n>` row when a frame count is given.
pub fn write_label_totals_to_path(
    totals: &BTreeMap<String, usize>,
    frames: Option<usize>,
    path: &Path,
) -> Result<(), TableWriteError> {
    let csv_error = |e: csv::Error| TableWriteError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error)?;
    if let Some(frames) = frames {
        csv_writer
            .write_record(["frames".to_string(), frames.to_string()])
            .map_err(csv_error)?;
    }
    for (label, count) in totals {
        csv_writer
            .write_record([label.clone(), count.to_string()])
            .map_err(csv_error)?;
    }
    csv_writer.flush().map_err(|e| TableWriteError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::interaction::BridgeLeg;
    use std::fs;
    use tempfile::tempdir;

    fn records() -> Vec<InteractionRecord> {
        let plain = InteractionRecord::new(
            "HB_NH_O",
            "L-Pro".into(),
            Measurements::from_values(&[2.6, 150.0, 120.5]),
            1,
            3,
        );
        let mut bridged = InteractionRecord::new(
            "HB_OH_O",
            "L-S-Pro".into(),
            Measurements::from_values(&[2.8]),
            1,
            2,
        );
        bridged.bridge = Some(BridgeLeg {
            label: "HB_NH_O".into(),
            items: Measurements::from_values(&[2.9]),
            solvent: 2,
            partner: 5,
        });
        vec![plain, bridged]
    }

    #[test]
    fn write_interactions_emits_header_and_empty_slots() {
        let mut buffer = Vec::new();
        write_interactions(&records(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let header: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(header.len(), 3 + 2 * MEASUREMENT_SLOTS + 4);
        assert_eq!(header[3], "item1_1");
        assert_eq!(header[13], "item2_1");
        assert_eq!(header[23], "atom1_id");

        let plain: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(plain[0], "HB_NH_O");
        assert_eq!(plain[1], "");
        assert_eq!(plain[3], "2.6");
        assert_eq!(plain[6], "");
        assert_eq!(&plain[23..], &["1", "3", "", ""]);

        let bridged: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(bridged[1], "HB_NH_O");
        assert_eq!(bridged[2], "L-S-Pro");
        assert_eq!(bridged[13], "2.9");
        assert_eq!(&bridged[23..], &["1", "2", "2", "5"]);
    }

    #[test]
    fn write_label_totals_prefixes_frame_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out_trajectory.csv");
        let totals = BTreeMap::from([("HB_NH_O".to_string(), 4), ("vdW".to_string(), 10)]);
        write_label_totals_to_path(&totals, Some(2), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "frames,2\nHB_NH_O,4\nvdW,10\n");
    }

    #[test]
    fn write_to_unwritable_path_reports_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.csv");
        assert!(matches!(
            write_interactions_to_path(&records(), &path),
            Err(TableWriteError::Io { .. })
        ));
    }
}
