use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use super::types::{ExportError, ProductRow};

pub const CSV_HEADERS: [&str; 11] = [
    "name",
    "category1",
    "category2",
    "category3",
    "description",
    "model number",
    "list price",
    "image link",
    "documents",
    "features",
    "url",
];

/// `<dir>/<prefix>-YYYYMMDDHHmm.csv`
pub fn export_path<Tz>(dir: &Path, prefix: &str, generated_at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let ts = generated_at.format("%Y%m%d%H%M");
    dir.join(format!("{prefix}-{ts}.csv"))
}

fn row_to_record(row: &ProductRow) -> [&str; 11] {
    [
        row.name.as_str(),
        row.category1.as_str(),
        row.category2.as_deref().unwrap_or_default(),
        row.category3.as_deref().unwrap_or_default(),
        row.description_html.as_str(),
        row.model_number.as_str(),
        row.list_price.as_str(),
        row.image_link.as_str(),
        row.document_links.as_str(),
        row.features_html.as_str(),
        row.source_url.as_str(),
    ]
}

/// Writes the header and every row, in order, to a freshly created file.
pub fn export_rows<Tz>(
    rows: &[ProductRow],
    dir: &Path,
    prefix: &str,
    generated_at: &DateTime<Tz>,
) -> Result<PathBuf, ExportError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = export_path(dir, prefix, generated_at);
    let csv_err = |source: csv::Error| ExportError::Csv {
        path: path.clone(),
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
    writer.write_record(CSV_HEADERS).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row_to_record(row)).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn row(model: &str) -> ProductRow {
        ProductRow {
            name: "Purist Faucet".to_string(),
            category1: "Kitchen".to_string(),
            category2: Some("Faucets".to_string()),
            category3: None,
            description_html: "<p class=\"d\">Lever, \"pull-down\"\nspray</p>".to_string(),
            model_number: model.to_string(),
            list_price: "419.00".to_string(),
            image_link: format!("https://img.example.com/{model}.jpg"),
            document_links: "https://www.us.kohler.com/a.pdf, https://www.us.kohler.com/b.pdf"
                .to_string(),
            features_html: "<div><ul><li>Swing spout</li></ul></div>".to_string(),
            source_url: "https://www.us.kohler.com/p/7505".to_string(),
        }
    }

    #[test]
    fn file_name_embeds_minute_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 59).unwrap();
        assert_eq!(
            export_path(Path::new("out"), "kohler", &at),
            PathBuf::from("out/kohler-202403091405.csv")
        );
    }

    #[test]
    fn rows_round_trip_through_standard_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let rows = vec![row("K-7505-CP"), row("K-7505-VS")];

        let path = export_rows(&rows, dir.path(), "kohler", &at).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_HEADERS.to_vec());

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][4], rows[0].description_html.as_str());
        assert_eq!(&records[0][3], "");
        assert_eq!(&records[1][5], "K-7505-VS");
        assert_eq!(&records[1][8], rows[1].document_links.as_str());
    }

    #[test]
    fn empty_export_still_has_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let path = export_rows(&[], &dir.path().join("nested"), "kohler", &at).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), CSV_HEADERS.len());
        assert_eq!(reader.records().count(), 0);
        assert!(path.starts_with(dir.path().join("nested")));
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let err = export_rows(&[row("K-1")], &blocker, "kohler", &at).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
