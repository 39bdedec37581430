use crate::domain::{DomainError, DomainResult, TableData, TableSchema};
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_DIR: &str = "schema";
const DATA_DIR: &str = "data";

/// Master-data project on disk: `schema/<table>.json` next to `data/<table>.csv`.
#[derive(Debug, Clone)]
pub struct TableRepository {
    root: PathBuf,
}

impl TableRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schema_path(&self, name: &str) -> PathBuf {
        self.root.join(SCHEMA_DIR).join(format!("{name}.json"))
    }

    fn data_path(&self, name: &str) -> PathBuf {
        self.root.join(DATA_DIR).join(format!("{name}.csv"))
    }

    /// Table names with a schema file, sorted.
    pub fn list_tables(&self) -> DomainResult<Vec<String>> {
        let dir = self.root.join(SCHEMA_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Loads a table. A missing data file is an empty table; the CSV header
    /// line is skipped in favour of the schema.
    pub fn load_table(&self, name: &str) -> DomainResult<TableData> {
        let schema_path = self.schema_path(name);
        if !schema_path.exists() {
            return Err(DomainError::TableNotFound(name.to_string()));
        }
        let schema: TableSchema = serde_json::from_str(&fs::read_to_string(&schema_path)?)?;
        if schema.header.is_empty() {
            return Err(DomainError::InvalidSchema(format!("{name} has no columns")));
        }

        let data_path = self.data_path(name);
        let mut rows = Vec::new();
        if data_path.exists() {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .from_path(&data_path)?;
            for record in reader.records() {
                let record = record?;
                let mut row: Vec<String> = record.iter().map(str::to_string).collect();
                row.resize(schema.header.len(), String::new());
                rows.push(row);
            }
        }

        tracing::info!(table = name, rows = rows.len(), "loaded table");
        Ok(TableData { schema, rows })
    }

    pub fn save_table(&self, name: &str, table: &TableData) -> DomainResult<()> {
        let schema_path = self.schema_path(name);
        let data_path = self.data_path(name);
        for path in [&schema_path, &data_path] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&schema_path, serde_json::to_string_pretty(&table.schema)?)?;

        let mut writer = csv::Writer::from_path(&data_path)?;
        writer.write_record(table.schema.header.iter().map(|c| c.name.as_str()))?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        tracing::info!(table = name, rows = table.rows.len(), "saved table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnSchema, Grid, FIRST_DATA_ROW};
    use tempfile::TempDir;

    fn write_project(dir: &Path) {
        fs::create_dir_all(dir.join(SCHEMA_DIR)).unwrap();
        fs::create_dir_all(dir.join(DATA_DIR)).unwrap();
        fs::write(
            dir.join(SCHEMA_DIR).join("items.json"),
            r#"{
                "description": "Items",
                "primary_key": "id",
                "header": [
                    { "key": 1, "name": "id", "type": "int" },
                    { "key": 2, "name": "label", "type": "string", "comment": "shown", "references": ["texts"] }
                ]
            }"#,
        )
        .unwrap();
        fs::write(dir.join(DATA_DIR).join("items.csv"), "id,label\n1,apple\n2,\"pear, ripe\"\n3\n").unwrap();
        fs::write(dir.join(SCHEMA_DIR).join("notes.txt"), "ignored").unwrap();
    }

    #[test]
    fn test_list_tables() {
        let dir = TempDir::new().unwrap();
        write_project(dir.path());
        fs::write(dir.path().join(SCHEMA_DIR).join("alpha.json"), "{}").unwrap();
        let repo = TableRepository::new(dir.path());
        assert_eq!(repo.list_tables().unwrap(), vec!["alpha", "items"]);
    }

    #[test]
    fn test_list_tables_without_schema_dir() {
        let dir = TempDir::new().unwrap();
        assert!(TableRepository::new(dir.path()).list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_load_table() {
        let dir = TempDir::new().unwrap();
        write_project(dir.path());
        let table = TableRepository::new(dir.path()).load_table("items").unwrap();

        assert_eq!(table.schema.primary_key, "id");
        assert_eq!(table.schema.header[1].comment.as_deref(), Some("shown"));
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1], vec!["2".to_string(), "pear, ripe".to_string()]);
        assert_eq!(table.rows[2], vec!["3".to_string(), String::new()]);
    }

    #[test]
    fn test_missing_table() {
        let dir = TempDir::new().unwrap();
        let err = TableRepository::new(dir.path()).load_table("nope").unwrap_err();
        assert_eq!(err, DomainError::TableNotFound("nope".to_string()));
    }

    #[test]
    fn test_save_edited_grid_round_trip() {
        let dir = TempDir::new().unwrap();
        write_project(dir.path());
        let repo = TableRepository::new(dir.path());
        let table = repo.load_table("items").unwrap();

        let mut grid = Grid::from_table(&table, 10);
        grid.set_cell(FIRST_DATA_ROW + 2, 2, "plum");
        let edited = grid.to_table(&table.schema.description, &table.schema.primary_key).unwrap();
        repo.save_table("items", &edited).unwrap();

        let reloaded = repo.load_table("items").unwrap();
        assert_eq!(reloaded, edited);
        assert_eq!(reloaded.rows[2][1], "plum");
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = TempDir::new().unwrap();
        let repo = TableRepository::new(dir.path().join("fresh"));
        let table = TableData {
            schema: TableSchema {
                description: String::new(),
                primary_key: "id".to_string(),
                header: vec![ColumnSchema {
                    key: 1,
                    name: "id".to_string(),
                    kind: "int".to_string(),
                    comment: None,
                    references: None,
                }],
            },
            rows: vec![vec!["7".to_string()]],
        };
        repo.save_table("single", &table).unwrap();
        assert_eq!(repo.load_table("single").unwrap(), table);
        assert_eq!(repo.list_tables().unwrap(), vec!["single"]);
    }
}
