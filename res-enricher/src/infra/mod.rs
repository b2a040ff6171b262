pub mod csv_output_adapter;
pub mod log_directory_source;
pub mod sqlite_geography_source;

pub use csv_output_adapter::CsvOutputAdapter;
pub use log_directory_source::LogDirectorySource;
pub use sqlite_geography_source::SqliteGeographySource;
