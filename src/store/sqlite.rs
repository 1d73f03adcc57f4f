use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};

use super::LegacyStore;
use super::schema::REQUIRED_TABLES;
use crate::error::{Error, Result};
use crate::types::CommitRights;
use crate::types::legacy::*;

pub struct SqliteLegacyStore {
    conn: Connection,
}

impl SqliteLegacyStore {
    /// Opens the legacy database read-only. The file must already exist.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            Error::Config(format!(
                "cannot open legacy database {}: {e}",
                path.display()
            ))
        })?;

        Ok(Self { conn })
    }

    /// Wraps an existing connection. Used for fixture databases.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection for custom queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Row of the repositories table before its polymorphic owner is resolved.
struct RepositoryRow {
    id: i64,
    project_id: i64,
    name: String,
    description: Option<String>,
    hashed_path: String,
    owner_type: String,
    owner_id: i64,
    user_id: Option<i64>,
    parent_id: Option<i64>,
    wiki_permissions: Option<i64>,
}

impl RepositoryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            hashed_path: row.get(4)?,
            owner_type: row.get(5)?,
            owner_id: row.get(6)?,
            user_id: row.get(7)?,
            parent_id: row.get(8)?,
            wiki_permissions: row.get(9)?,
        })
    }

    fn resolve(self) -> Result<Repository> {
        let owner = OwnerRef::resolve(&self.owner_type, self.owner_id)?;
        Ok(Repository {
            id: self.id,
            project_id: self.project_id,
            name: self.name,
            description: self.description,
            hashed_path: self.hashed_path,
            owner,
            // Legacy rows without a creator fall back to the owning user.
            user_id: self.user_id.or(owner.user_id()).unwrap_or_default(),
            parent_id: self.parent_id,
            wiki_permissions: self.wiki_permissions.unwrap_or_default(),
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        login: row.get(1)?,
        email: row.get(2)?,
        fullname: row.get(3)?,
    })
}

impl LegacyStore for SqliteLegacyStore {
    fn verify_schema(&self) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .map_err(|e| Error::Config(format!("legacy database is unreadable: {e}")))?;

        let mut missing = Vec::new();
        for table in REQUIRED_TABLES {
            let count: i64 = stmt
                .query_row(params![table], |row| row.get(0))
                .map_err(|e| Error::Config(format!("legacy database is unreadable: {e}")))?;
            if count == 0 {
                missing.push(*table);
            }
        }

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "legacy database is missing tables: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    // User operations

    fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, login, email, fullname FROM users ORDER BY id")?;
        let rows = stmt.query_map([], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, login, email, fullname FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_ssh_keys(&self, user_id: i64) -> Result<Vec<SshKey>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, user_id, key FROM ssh_keys WHERE user_id = ?1 ORDER BY id")?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(SshKey {
                id: row.get(0)?,
                user_id: row.get(1)?,
                key: row.get(2)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Group operations

    fn get_group(&self, id: i64) -> Result<Option<Group>> {
        let group = self
            .conn
            .query_row(
                "SELECT id, name, description, user_id FROM groups WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Group {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        admin_id: row.get(3)?,
                        member_ids: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut group) = group else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare("SELECT user_id FROM memberships WHERE group_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![id], |row| row.get::<_, i64>(0))?;

        for user_id in rows {
            let user_id = user_id?;
            if !group.member_ids.contains(&user_id) {
                group.member_ids.push(user_id);
            }
        }

        if !group.member_ids.contains(&group.admin_id) {
            group.member_ids.insert(0, group.admin_id);
        }

        Ok(Some(group))
    }

    // Project operations

    fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, slug, description, wiki_enabled, owner_type, owner_id
             FROM projects ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Project {
                id: row.get(0)?,
                title: row.get(1)?,
                slug: row.get(2)?,
                description: row.get(3)?,
                wiki_enabled: row.get::<_, Option<i64>>(4)?.unwrap_or(0) != 0,
                owner_type: row.get(5)?,
                owner_id: row.get(6)?,
                tags: Vec::new(),
            })
        })?;
        let mut projects = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        let mut tag_stmt = self.conn.prepare(
            "SELECT t.name FROM taggings tg JOIN tags t ON t.id = tg.tag_id
             WHERE tg.taggable_id = ?1 ORDER BY tg.id",
        )?;
        for project in &mut projects {
            let tags = tag_stmt.query_map(params![project.id], |row| row.get::<_, String>(0))?;
            project.tags = tags.collect::<std::result::Result<Vec<_>, _>>()?;
        }

        Ok(projects)
    }

    // Repository operations

    fn list_repositories(&self, project_id: i64) -> Result<Vec<Repository>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, name, description, hashed_path, owner_type, owner_id,
                    user_id, parent_id, wiki_permissions
             FROM repositories WHERE project_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![project_id], RepositoryRow::from_row)?;

        rows.map(|row| row.map_err(Error::from).and_then(RepositoryRow::resolve))
            .collect()
    }

    fn list_committerships(&self, repository_id: i64) -> Result<Vec<Committership>> {
        let mut stmt = self.conn.prepare(
            "SELECT repository_id, committer_type, committer_id, permissions
             FROM committerships WHERE repository_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![repository_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        rows.map(|row| {
            let (repository_id, committer_type, committer_id, permissions) = row?;
            Ok(Committership {
                repository_id,
                committer: OwnerRef::resolve(&committer_type, committer_id)?,
                rights: CommitRights::from(permissions),
            })
        })
        .collect()
    }
}
