use std::fs::File;
use std::io::Write;

use anyhow::Result;
use res_enricher::app::EnrichUseCase;
use res_enricher::infra::{CsvOutputAdapter, LogDirectorySource, SqliteGeographySource};
use rusqlite::Connection;
use tempfile::tempdir;

fn seed_geography(path: &std::path::Path) -> Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE geography (
            geographyId INTEGER PRIMARY KEY,
            parentId INTEGER,
            name TEXT NOT NULL,
            level INTEGER NOT NULL,
            country_flag INTEGER NOT NULL,
            region_flag INTEGER NOT NULL
        );
        INSERT INTO geography VALUES (1, NULL, 'Greece', 0, 1, 0);
        INSERT INTO geography VALUES (2, 1, 'Attica', 1, 0, 1);
        INSERT INTO geography VALUES (3, 2, 'Athens', 2, 0, 0);
        INSERT INTO geography VALUES (4, 2, 'Piraeus', 2, 0, 0);",
    )?;
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_enrichment() -> Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("geography.sqlite");
    seed_geography(&db_path)?;

    let log_dir = dir.path().join("raw/2021-04-20-12");
    std::fs::create_dir_all(&log_dir)?;
    let mut log = File::create(log_dir.join("searches-0001"))?;
    // Two areas in one region: must collapse into a single output row.
    writeln!(
        log,
        "{{'date': '2021-04-20 12:01:07', 'areaIDs': [3, 4], 'category': 'residential', 'priceLow': 50000, 'priceHigh': 999999, 'garage': True, 'brokerID': None}}"
    )?;
    // Broker-originated: must be dropped.
    writeln!(
        log,
        "{{'date': '2021-04-20 12:05:00', 'areaIDs': [3], 'brokerID': 77}}"
    )?;
    // Unknown area: kept with null geography.
    writeln!(
        log,
        "{{'date': '2021-04-21 08:00:00', 'areaIDs': [9999], 'category': 'commercial'}}"
    )?;
    // Malformed: skipped, counted.
    writeln!(log, "definitely not a record")?;

    let output_path = dir.path().join("enriched.csv");
    let use_case = EnrichUseCase::new(
        Box::new(SqliteGeographySource::new(db_path)),
        Box::new(LogDirectorySource::new(dir.path().join("raw"))),
        Box::new(CsvOutputAdapter::new(&output_path)?),
        0.5,
    );

    let report = use_case.run().await?;
    assert_eq!(report.files_read, 1);
    assert_eq!(report.malformed_lines, 1);
    assert_eq!(report.broker_filtered, 1);
    assert_eq!(report.normalized_events, 2);
    assert_eq!(report.unknown_areas, 1);
    assert_eq!(report.enriched.len(), 2);

    let csv = std::fs::read_to_string(&output_path)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3); // header + 2 rows

    let header = lines[0];
    assert!(header.contains("priceLow"));
    assert!(header.contains("countryName"));

    // The two-area search: one row, sentinel priceHigh cleared, geography joined.
    let first = lines[1];
    assert!(first.contains("\"[3, 4]\""));
    assert!(first.contains("\"[Athens, Piraeus]\""));
    assert!(first.contains("Greece"));
    assert!(first.contains("Attica"));
    assert!(first.contains("50000"));
    assert!(!first.contains("999999"));

    // The unknown-area search survives with empty geography columns.
    let second = lines[2];
    assert!(second.contains("\"[9999]\""));
    assert!(second.contains("commercial"));
    assert!(!second.contains("Greece"));

    Ok(())
}
