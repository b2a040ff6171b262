use std::path::PathBuf;

use async_trait::async_trait;
use res_core::domain::GeographyNode;
use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::app::ports::GeographySourcePort;

/// Reads the geography reference table from its SQLite database. The table
/// uses 0/1 integer flags and a nullable (or self-referential) parent id.
pub struct SqliteGeographySource {
    db_path: PathBuf,
}

impl SqliteGeographySource {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    fn load_sync(&self) -> anyhow::Result<Vec<GeographyNode>> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut stmt = conn.prepare(
            "SELECT geographyId, parentId, name, level, country_flag, region_flag FROM geography",
        )?;
        let nodes = stmt
            .query_map([], |row| {
                Ok(GeographyNode {
                    id: row.get(0)?,
                    parent_id: row.get(1)?,
                    name: row.get(2)?,
                    level: row.get(3)?,
                    is_country: row.get::<_, i64>(4)? != 0,
                    is_region: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "loaded {} geography nodes from {}",
            nodes.len(),
            self.db_path.display()
        );
        Ok(nodes)
    }
}

#[async_trait]
impl GeographySourcePort for SqliteGeographySource {
    async fn load_nodes(&self) -> anyhow::Result<Vec<GeographyNode>> {
        self.load_sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_database(path: &std::path::Path) {
        let conn = Connection::open(path).unwrap();
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
            INSERT INTO geography VALUES (3, 2, 'Athens', 2, 0, 0);",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_loads_nodes_with_flags_and_null_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("geography.sqlite");
        seed_database(&db_path);

        let source = SqliteGeographySource::new(db_path);
        let mut nodes = source.load_nodes().await.unwrap();
        nodes.sort_by_key(|n| n.id);

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].parent_id, None);
        assert!(nodes[0].is_country);
        assert!(!nodes[0].is_region);
        assert!(nodes[1].is_region);
        assert_eq!(nodes[2].parent_id, Some(2));
        assert_eq!(nodes[2].name, "Athens");
    }

    #[tokio::test]
    async fn test_missing_database_is_an_error() {
        let source = SqliteGeographySource::new(PathBuf::from("/nonexistent/geography.sqlite"));
        assert!(source.load_nodes().await.is_err());
    }
}
