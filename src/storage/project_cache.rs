use std::collections::HashMap;

use rusqlite::Connection;

use crate::domain::tree::ProjectInfoProvider;
use crate::storage::schema::projects;

#[derive(Debug, Clone)]
struct ProjectInfo {
    name: String,
    parent_id: i64,
}

/// Lazily loaded `id -> (name, parent_id)` map for one database session.
///
/// Owned by the report service and passed explicitly to queriers and the
/// tree builder; its lifetime ends with the session.
#[derive(Debug, Default)]
pub struct ProjectNameCache {
    loaded: bool,
    cache: HashMap<i64, ProjectInfo>,
}

impl ProjectNameCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent population from the `projects` table. A NULL parent is
    /// coerced to 0, the sentinel for "root".
    pub fn ensure_loaded(&mut self, conn: &Connection) -> rusqlite::Result<()> {
        if self.loaded {
            return Ok(());
        }

        let sql = format!(
            "SELECT {}, {}, {} FROM {}",
            projects::ID,
            projects::NAME,
            projects::PARENT_ID,
            projects::TABLE
        );
        let mut statement = conn.prepare(&sql)?;
        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            let project_id: i64 = row.get(0)?;
            let name: String = row.get::<_, Option<String>>(1)?.unwrap_or_default();
            let parent_id: i64 = row.get::<_, Option<i64>>(2)?.unwrap_or(0);
            self.cache.insert(project_id, ProjectInfo { name, parent_id });
        }
        self.loaded = true;
        Ok(())
    }

    /// Walks parents up to the root and returns root-first segments; an
    /// unknown id yields an empty vector.
    #[must_use]
    pub fn path_parts(&self, project_id: i64) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = project_id;
        while current != 0 {
            let Some(info) = self.cache.get(&current) else {
                break;
            };
            parts.push(info.name.clone());
            current = info.parent_id;
        }
        parts.reverse();
        parts
    }

    /// Root-to-leaf path joined with `_`, matching the SQL CTE output.
    #[must_use]
    pub fn joined_path(&self, project_id: i64) -> String {
        self.path_parts(project_id).join("_")
    }
}

impl ProjectInfoProvider for ProjectNameCache {
    fn path_parts(&self, project_id: i64) -> Vec<String> {
        ProjectNameCache::path_parts(self, project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE projects (id INTEGER PRIMARY KEY, name TEXT, parent_id INTEGER); \
             INSERT INTO projects VALUES (1, 'study', NULL); \
             INSERT INTO projects VALUES (2, 'english', 1); \
             INSERT INTO projects VALUES (3, 'words', 2); \
             INSERT INTO projects VALUES (4, 'rest', NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn walks_parents_to_the_root() {
        let conn = test_connection();
        let mut cache = ProjectNameCache::new();
        cache.ensure_loaded(&conn).unwrap();

        assert_eq!(cache.path_parts(3), vec!["study", "english", "words"]);
        assert_eq!(cache.path_parts(1), vec!["study"]);
        assert_eq!(cache.joined_path(3), "study_english_words");
    }

    #[test]
    fn unknown_id_gives_an_empty_path() {
        let conn = test_connection();
        let mut cache = ProjectNameCache::new();
        cache.ensure_loaded(&conn).unwrap();
        assert!(cache.path_parts(42).is_empty());
    }

    #[test]
    fn ensure_loaded_is_idempotent() {
        let conn = test_connection();
        let mut cache = ProjectNameCache::new();
        cache.ensure_loaded(&conn).unwrap();

        conn.execute("INSERT INTO projects VALUES (5, 'late', NULL)", [])
            .unwrap();
        cache.ensure_loaded(&conn).unwrap();
        // second call must not reload
        assert!(cache.path_parts(5).is_empty());
    }
}
