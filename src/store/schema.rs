/// Tables the migration reads from the legacy database.
pub const REQUIRED_TABLES: &[&str] = &[
    "users",
    "ssh_keys",
    "groups",
    "memberships",
    "projects",
    "tags",
    "taggings",
    "repositories",
    "committerships",
];

/// The subset of the legacy schema the migration reads. Fixture databases are
/// built from it; production databases carry many more columns.
pub const LEGACY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    login TEXT NOT NULL,
    email TEXT NOT NULL,
    fullname TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS ssh_keys (
    id INTEGER PRIMARY KEY,
    user_id INTEGER REFERENCES users(id),
    key TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- user_id is the group admin
CREATE TABLE IF NOT EXISTS groups (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    user_id INTEGER REFERENCES users(id),
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS memberships (
    id INTEGER PRIMARY KEY,
    group_id INTEGER REFERENCES groups(id),
    user_id INTEGER REFERENCES users(id),
    role_id INTEGER
);

-- owner_type is 'User' or 'Group'
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    slug TEXT NOT NULL,
    description TEXT,
    owner_id INTEGER NOT NULL,
    owner_type TEXT NOT NULL,
    user_id INTEGER REFERENCES users(id),
    wiki_enabled INTEGER DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS taggings (
    id INTEGER PRIMARY KEY,
    tag_id INTEGER REFERENCES tags(id),
    taggable_id INTEGER REFERENCES projects(id)
);

-- parent_id set means the repository is a fork
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY,
    project_id INTEGER REFERENCES projects(id),
    name TEXT NOT NULL,
    description TEXT,
    hashed_path TEXT NOT NULL,
    owner_id INTEGER NOT NULL,
    owner_type TEXT NOT NULL,
    user_id INTEGER REFERENCES users(id),
    parent_id INTEGER REFERENCES repositories(id),
    wiki_permissions INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- permissions: 1 review, 2 commit, 4 admin
CREATE TABLE IF NOT EXISTS committerships (
    id INTEGER PRIMARY KEY,
    repository_id INTEGER REFERENCES repositories(id),
    committer_id INTEGER NOT NULL,
    committer_type TEXT NOT NULL,
    permissions INTEGER NOT NULL DEFAULT 0
);
"#;
