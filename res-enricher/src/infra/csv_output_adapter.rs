use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use csv::WriterBuilder;
use res_core::domain::EnrichedSearchEvent;
use serde::Serialize;
use tracing::info;

use crate::app::ports::EnrichedOutputPort;

/// CSV row shape: column names match the raw log field names, list-valued
/// columns are serialized as a textual list.
#[derive(Debug, Serialize)]
struct CsvSearchRow {
    search_id: u64,
    date: String,
    category: Option<String>,
    #[serde(rename = "listingType")]
    listing_type: Option<String>,
    #[serde(rename = "livingAreaLow")]
    living_area_low: Option<i64>,
    #[serde(rename = "livingAreaHigh")]
    living_area_high: Option<i64>,
    #[serde(rename = "priceLow")]
    price_low: Option<i64>,
    #[serde(rename = "priceHigh")]
    price_high: Option<i64>,
    #[serde(rename = "newDevelopment")]
    new_development: Option<bool>,
    garage: Option<bool>,
    storage: Option<bool>,
    balcony: Option<bool>,
    #[serde(rename = "secureDoor")]
    secure_door: Option<bool>,
    alarm: Option<bool>,
    fireplace: Option<bool>,
    elevator: Option<bool>,
    garden: Option<bool>,
    #[serde(rename = "roomsLow")]
    rooms_low: Option<i64>,
    #[serde(rename = "roomsHigh")]
    rooms_high: Option<i64>,
    #[serde(rename = "petsAllowed")]
    pets_allowed: Option<bool>,
    #[serde(rename = "areaIDs")]
    area_ids: String,
    #[serde(rename = "geographyName")]
    geography_names: String,
    #[serde(rename = "countryName")]
    country_name: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
}

impl From<&EnrichedSearchEvent> for CsvSearchRow {
    fn from(event: &EnrichedSearchEvent) -> Self {
        let filters = &event.filters;
        Self {
            search_id: event.search_id,
            date: event.date.to_string(),
            category: filters.category.clone(),
            listing_type: filters.listing_type.clone(),
            living_area_low: filters.living_area_low,
            living_area_high: filters.living_area_high,
            price_low: filters.price_low,
            price_high: filters.price_high,
            new_development: filters.new_development,
            garage: filters.garage,
            storage: filters.storage,
            balcony: filters.balcony,
            secure_door: filters.secure_door,
            alarm: filters.alarm,
            fireplace: filters.fireplace,
            elevator: filters.elevator,
            garden: filters.garden,
            rooms_low: filters.rooms_low,
            rooms_high: filters.rooms_high,
            pets_allowed: filters.pets_allowed,
            area_ids: format_list(event.area_ids.iter().map(i64::to_string)),
            geography_names: format_list(
                event
                    .geography_names
                    .iter()
                    .map(|n| n.clone().unwrap_or_default()),
            ),
            country_name: event.country_name.clone(),
            region_name: event.region_name.clone(),
        }
    }
}

fn format_list<I: Iterator<Item = String>>(items: I) -> String {
    format!("[{}]", items.collect::<Vec<_>>().join(", "))
}

/// Writes the enriched table to a single delimited file.
pub struct CsvOutputAdapter {
    writer: Mutex<csv::Writer<BufWriter<File>>>,
    path: String,
}

impl CsvOutputAdapter {
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = BufWriter::new(File::create(path)?);
        let writer = WriterBuilder::new().from_writer(file);
        info!("writing enriched searches to {}", path.display());
        Ok(Self {
            writer: Mutex::new(writer),
            path: path.display().to_string(),
        })
    }
}

#[async_trait]
impl EnrichedOutputPort for CsvOutputAdapter {
    async fn write_enriched_record(&self, record: &EnrichedSearchEvent) -> anyhow::Result<()> {
        let row = CsvSearchRow::from(record);
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("csv writer lock poisoned for {}", self.path))?;
        writer.serialize(&row)?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("csv writer lock poisoned for {}", self.path))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use res_core::domain::SearchFilters;

    fn event() -> EnrichedSearchEvent {
        EnrichedSearchEvent {
            search_id: 5,
            date: NaiveDate::from_ymd_opt(2021, 4, 20).unwrap(),
            filters: SearchFilters {
                category: Some("residential".to_string()),
                price_low: Some(50_000),
                garage: Some(true),
                ..Default::default()
            },
            country_name: Some("Greece".to_string()),
            region_name: Some("Attica".to_string()),
            area_ids: vec![3, 4],
            geography_names: vec![Some("Athens".to_string()), None],
        }
    }

    #[tokio::test]
    async fn test_writes_header_and_list_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enriched.csv");

        let adapter = CsvOutputAdapter::new(&path).unwrap();
        adapter.write_enriched_record(&event()).await.unwrap();
        adapter.flush().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("search_id,date,category,listingType"));
        assert!(header.ends_with("areaIDs,geographyName,countryName,regionName"));

        let row = lines.next().unwrap();
        assert!(row.contains("\"[3, 4]\""));
        assert!(row.contains("\"[Athens, ]\""));
        assert!(row.contains("Greece"));
        assert!(row.contains("2021-04-20"));
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/deep/enriched.csv");
        let adapter = CsvOutputAdapter::new(&path).unwrap();
        adapter.flush().await.unwrap();
        assert!(path.exists());
    }
}
