mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::models::*;
use crate::planner::FeatureStore;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "leanwave")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("leanwave.db");
        Self::open(db_path)
    }

    /// Open the configured path, or the platform default when none is set.
    pub fn open_configured(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Self::open_default(),
        }
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::initialize(&conn)
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_all_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, description, tech_stack, created_at, updated_at
             FROM projects ORDER BY name",
        )?;

        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, description, tech_stack, created_at, updated_at
             FROM projects WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(project_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO projects (id, name, description, tech_stack, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.description,
                &input.tech_stack,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Project {
            id,
            name: input.name,
            description: input.description,
            tech_stack: input.tech_stack,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM projects WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Feature operations
    // ============================================================

    /// Features of a project in backlog order.
    pub fn get_features_by_project(&self, project_id: &str) -> Result<Vec<Feature>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, description, size, risk, business_value, wow_factor, category
             FROM features WHERE project_id = ? ORDER BY position, created_at",
        )?;

        let features = stmt
            .query_map([project_id], feature_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(features)
    }

    pub fn get_feature(&self, id: &str) -> Result<Option<Feature>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, description, size, risk, business_value, wow_factor, category
             FROM features WHERE id = ?",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(feature_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Insert or update features by id in a single transaction.
    ///
    /// New features are appended after the project's existing backlog; updated
    /// features keep their position. An id already owned by another project
    /// fails the whole batch. Either every feature is written or none is.
    pub fn upsert_features(&self, project_id: &str, features: &[Feature]) -> Result<usize> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let exists: i32 = tx.query_row(
            "SELECT COUNT(*) FROM projects WHERE id = ?",
            [project_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            anyhow::bail!("Project not found");
        }

        let next_position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM features WHERE project_id = ?",
            [project_id],
            |row| row.get(0),
        )?;

        let now = Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO features (id, project_id, title, description, size, risk, business_value,
                                       wow_factor, category, position, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    size = excluded.size,
                    risk = excluded.risk,
                    business_value = excluded.business_value,
                    wow_factor = excluded.wow_factor,
                    category = excluded.category,
                    updated_at = excluded.updated_at
                 WHERE features.project_id = excluded.project_id",
            )?;

            for (offset, feature) in features.iter().enumerate() {
                let rows = stmt.execute(rusqlite::params![
                    &feature.id,
                    project_id,
                    &feature.title,
                    &feature.description,
                    feature.size.as_str(),
                    feature.risk.as_str(),
                    feature.business_value,
                    feature.wow_factor,
                    feature.category.as_str(),
                    next_position + offset as i64,
                    &now,
                    &now,
                ])?;
                // The guarded update writes nothing when the id is owned elsewhere.
                if rows == 0 {
                    anyhow::bail!("Feature {} belongs to another project", feature.id);
                }
            }
        }

        tx.commit()?;
        Ok(features.len())
    }

    pub fn delete_feature(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM features WHERE id = ?", [id])?;
        Ok(rows > 0)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

impl FeatureStore for Database {
    fn upsert_features(&self, project_id: &str, features: &[Feature]) -> Result<()> {
        Database::upsert_features(self, project_id, features).map(|_| ())
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        tech_stack: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn feature_from_row(row: &Row<'_>) -> rusqlite::Result<Feature> {
    Ok(Feature {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        size: Size::from_str(&row.get::<_, String>(4)?).unwrap_or(Size::M),
        risk: Risk::from_str(&row.get::<_, String>(5)?).unwrap_or(Risk::Medium),
        business_value: row.get(6)?,
        wow_factor: row.get(7)?,
        category: Category::from_str(&row.get::<_, String>(8)?).unwrap_or_default(),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
