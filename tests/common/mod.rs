#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use forge_migrate::api::TargetApi;
use forge_migrate::api::dto::*;
use forge_migrate::config::MigrationConfig;
use forge_migrate::error::{Error, Result};
use forge_migrate::mirror::Mirror;
use forge_migrate::store::{LEGACY_SCHEMA, SqliteLegacyStore};
use forge_migrate::types::*;
use rusqlite::{Connection, params};

pub const TARGET_URL: &str = "https://gitlab.test";
pub const CLONE_URL: &str = "git://gitorious.test/{path}.git";

pub fn test_config(export_root: &Path) -> MigrationConfig {
    let content = format!(
        r#"
[legacy]
database = "unused.db"
clone_url = "{CLONE_URL}"

[target]
url = "{TARGET_URL}"
token = "admin-token"

[export]
root = "{}"
"#,
        export_root.display()
    );
    MigrationConfig::parse(&content, None).expect("valid test config")
}

fn api_error(status: u16, message: &str) -> Error {
    Error::Api {
        status,
        message: message.to_string(),
    }
}

fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

#[derive(Default)]
pub struct FakeState {
    next_id: u64,
    pub users: Vec<TargetUser>,
    pub passwords: BTreeMap<String, String>,
    pub ssh_keys: Vec<(u64, NewSshKey)>,
    pub tokens: Vec<u64>,
    pub groups: Vec<TargetGroup>,
    pub group_members: BTreeMap<u64, Vec<Member>>,
    pub projects: Vec<TargetProject>,
    pub project_members: BTreeMap<u64, Vec<Member>>,
    pub fork_relations: Vec<(u64, u64)>,
    pub deleted_users: Vec<u64>,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn username(&self, id: u64) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }
}

/// In-memory stand-in for the target API.
pub struct FakeApi {
    pub state: RefCell<FakeState>,
    pub reject_usernames: HashSet<String>,
    pub reject_ssh_keys: bool,
    pub unreachable: bool,
}

impl FakeApi {
    pub fn new() -> Self {
        let mut state = FakeState {
            next_id: 100,
            ..FakeState::default()
        };
        state.users.push(TargetUser {
            id: 1,
            username: "root".into(),
            name: "Administrator".into(),
        });
        Self {
            state: RefCell::new(state),
            reject_usernames: HashSet::new(),
            reject_ssh_keys: false,
            unreachable: false,
        }
    }

    /// Pre-existing target account.
    pub fn with_user(self, username: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = state.next_id();
            state.users.push(TargetUser {
                id,
                username: username.to_string(),
                name: username.to_string(),
            });
        }
        self
    }

    pub fn user(&self, username: &str) -> Option<TargetUser> {
        self.state
            .borrow()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn group(&self, path: &str) -> Option<TargetGroup> {
        self.state
            .borrow()
            .groups
            .iter()
            .find(|g| g.path == path)
            .cloned()
    }

    pub fn project(&self, namespace: &str, path: &str) -> Option<TargetProject> {
        self.state
            .borrow()
            .projects
            .iter()
            .find(|p| p.namespace.path == namespace && p.path == path)
            .cloned()
    }

    pub fn group_members(&self, group_id: u64) -> Vec<Member> {
        self.state
            .borrow()
            .group_members
            .get(&group_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn project_members(&self, project_id: u64) -> Vec<Member> {
        self.state
            .borrow()
            .project_members
            .get(&project_id)
            .cloned()
            .unwrap_or_default()
    }

    fn insert_project(&self, request: &NewProject, namespace: Namespace, owner: Option<u64>) -> Result<TargetProject> {
        let mut state = self.state.borrow_mut();
        let path = slugify(&request.name);
        if state
            .projects
            .iter()
            .any(|p| p.namespace.path == namespace.path && p.path == path)
        {
            return Err(api_error(400, "has already been taken"));
        }

        let project = TargetProject {
            id: state.next_id(),
            name: request.name.clone(),
            http_url_to_repo: format!("{TARGET_URL}/{}/{path}.git", namespace.path),
            path,
            namespace,
            owner: owner.map(|id| ProjectOwner { id }),
        };
        state.projects.push(project.clone());
        Ok(project)
    }
}

impl TargetApi for FakeApi {
    fn current_user(&self) -> Result<TargetUser> {
        if self.unreachable {
            return Err(api_error(401, "401 Unauthorized"));
        }
        Ok(self.state.borrow().users[0].clone())
    }

    fn list_users(&self) -> Result<Vec<TargetUser>> {
        Ok(self.state.borrow().users.clone())
    }

    fn create_user(&self, user: &NewUser) -> Result<TargetUser> {
        if self.reject_usernames.contains(&user.username) {
            return Err(api_error(400, "Email has already been taken"));
        }
        let mut state = self.state.borrow_mut();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(api_error(409, "Username has already been taken"));
        }
        let created = TargetUser {
            id: state.next_id(),
            username: user.username.clone(),
            name: user.name.clone(),
        };
        state
            .passwords
            .insert(user.username.clone(), user.password.clone());
        state.users.push(created.clone());
        Ok(created)
    }

    fn delete_user(&self, id: u64) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.users.retain(|u| u.id != id);
        state.deleted_users.push(id);
        Ok(())
    }

    fn create_ssh_key(&self, user_id: u64, key: &NewSshKey) -> Result<()> {
        if self.reject_ssh_keys {
            return Err(api_error(400, "key is invalid"));
        }
        self.state.borrow_mut().ssh_keys.push((user_id, key.clone()));
        Ok(())
    }

    fn create_impersonation_token(
        &self,
        user_id: u64,
        _token: &NewImpersonationToken,
    ) -> Result<ImpersonationToken> {
        let mut state = self.state.borrow_mut();
        state.tokens.push(user_id);
        Ok(ImpersonationToken {
            id: state.next_id(),
            token: format!("token-{user_id}"),
        })
    }

    fn create_group(&self, group: &NewGroup) -> Result<TargetGroup> {
        let mut state = self.state.borrow_mut();
        if state.groups.iter().any(|g| g.path == group.path) {
            return Err(api_error(400, "Failed to save group"));
        }
        let created = TargetGroup {
            id: state.next_id(),
            name: group.name.clone(),
            path: group.path.clone(),
        };
        state.groups.push(created.clone());
        Ok(created)
    }

    fn list_groups(&self) -> Result<Vec<TargetGroup>> {
        Ok(self.state.borrow().groups.clone())
    }

    fn delete_group(&self, id: u64) -> Result<()> {
        self.state.borrow_mut().groups.retain(|g| g.id != id);
        Ok(())
    }

    fn add_group_member(&self, group_id: u64, member: &NewMember) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let username = state.username(member.user_id);
        let members = state.group_members.entry(group_id).or_default();
        if members.iter().any(|m| m.id == member.user_id) {
            return Err(api_error(409, "Member already exists"));
        }
        members.push(Member {
            id: member.user_id,
            username,
            access_level: member.access_level,
        });
        Ok(())
    }

    fn list_group_members(&self, group_id: u64) -> Result<Vec<Member>> {
        Ok(self.group_members(group_id))
    }

    fn create_project(&self, project: &NewProject) -> Result<TargetProject> {
        let namespace_id = project
            .namespace_id
            .ok_or_else(|| api_error(400, "namespace is missing"))?;
        let group = self
            .state
            .borrow()
            .groups
            .iter()
            .find(|g| g.id == namespace_id)
            .cloned()
            .ok_or_else(|| api_error(404, "404 Namespace Not Found"))?;

        self.insert_project(
            project,
            Namespace {
                id: group.id,
                kind: NamespaceKind::Group,
                path: group.path,
            },
            None,
        )
    }

    fn create_user_project(&self, user_id: u64, project: &NewProject) -> Result<TargetProject> {
        let username = self.state.borrow().username(user_id);
        if username.is_empty() {
            return Err(api_error(404, "404 User Not Found"));
        }
        self.insert_project(
            project,
            Namespace {
                id: user_id,
                kind: NamespaceKind::User,
                path: username,
            },
            Some(user_id),
        )
    }

    fn list_projects(&self) -> Result<Vec<TargetProject>> {
        Ok(self.state.borrow().projects.clone())
    }

    fn delete_project(&self, id: u64) -> Result<()> {
        self.state.borrow_mut().projects.retain(|p| p.id != id);
        Ok(())
    }

    fn add_project_member(&self, project_id: u64, member: &NewMember) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let username = state.username(member.user_id);
        let members = state.project_members.entry(project_id).or_default();
        if members.iter().any(|m| m.id == member.user_id) {
            return Err(api_error(409, "Member already exists"));
        }
        members.push(Member {
            id: member.user_id,
            username,
            access_level: member.access_level,
        });
        Ok(())
    }

    fn create_fork_relation(&self, project_id: u64, forked_from_id: u64) -> Result<()> {
        self.state
            .borrow_mut()
            .fork_relations
            .push((project_id, forked_from_id));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorCall {
    pub local_path: PathBuf,
    pub source_url: String,
    pub push_url: String,
}

/// Records mirror requests instead of touching git.
#[derive(Default)]
pub struct RecordingMirror {
    pub calls: RefCell<Vec<MirrorCall>>,
    /// Source URLs that fail to mirror.
    pub failing: HashSet<String>,
}

impl RecordingMirror {
    pub fn failing_on(source_url: &str) -> Self {
        Self {
            failing: HashSet::from([source_url.to_string()]),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<MirrorCall> {
        self.calls.borrow().clone()
    }

    pub fn push_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.push_url).collect()
    }
}

impl Mirror for RecordingMirror {
    fn mirror(&self, local_path: &Path, source_url: &str, push_url: &str) -> Result<()> {
        if self.failing.contains(source_url) {
            return Err(Error::Io(std::io::Error::other(format!(
                "could not read from {source_url}"
            ))));
        }
        self.calls.borrow_mut().push(MirrorCall {
            local_path: local_path.to_path_buf(),
            source_url: source_url.to_string(),
            push_url: push_url.to_string(),
        });
        Ok(())
    }
}

pub fn source_url(hashed_path: &str) -> String {
    CLONE_URL.replace("{path}", hashed_path)
}

/// Builds a legacy database in memory.
pub struct LegacyFixture {
    conn: Connection,
}

impl LegacyFixture {
    pub fn new() -> Self {
        Self::with_connection(Connection::open_in_memory().expect("open in-memory db"))
    }

    /// Fixture backed by a database file, for tests that open it by path.
    pub fn at(path: &Path) -> Self {
        Self::with_connection(Connection::open(path).expect("open fixture file"))
    }

    fn with_connection(conn: Connection) -> Self {
        conn.execute_batch(LEGACY_SCHEMA).expect("create legacy schema");
        Self { conn }
    }

    pub fn user(self, id: i64, login: &str) -> Self {
        self.conn
            .execute(
                "INSERT INTO users (id, login, email, fullname) VALUES (?1, ?2, ?3, ?4)",
                params![id, login, format!("{login}@example.com"), format!("{login} Example")],
            )
            .expect("insert user");
        self
    }

    pub fn ssh_key(self, user_id: i64, key: &str) -> Self {
        self.conn
            .execute(
                "INSERT INTO ssh_keys (user_id, key) VALUES (?1, ?2)",
                params![user_id, key],
            )
            .expect("insert ssh key");
        self
    }

    pub fn group(self, id: i64, name: &str, admin_id: i64, member_ids: &[i64]) -> Self {
        self.conn
            .execute(
                "INSERT INTO groups (id, name, user_id) VALUES (?1, ?2, ?3)",
                params![id, name, admin_id],
            )
            .expect("insert group");
        for member_id in member_ids {
            self.conn
                .execute(
                    "INSERT INTO memberships (group_id, user_id) VALUES (?1, ?2)",
                    params![id, member_id],
                )
                .expect("insert membership");
        }
        self
    }

    pub fn project(self, id: i64, title: &str, slug: &str, owner_type: &str, owner_id: i64) -> Self {
        self.conn
            .execute(
                "INSERT INTO projects (id, title, slug, description, owner_type, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, title, slug, format!("{title} description"), owner_type, owner_id],
            )
            .expect("insert project");
        self
    }

    pub fn tag(self, project_id: i64, name: &str) -> Self {
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])
            .expect("insert tag");
        let tag_id = self.conn.last_insert_rowid();
        self.conn
            .execute(
                "INSERT INTO taggings (tag_id, taggable_id) VALUES (?1, ?2)",
                params![tag_id, project_id],
            )
            .expect("insert tagging");
        self
    }

    /// Repository owned by a user, created by the same user.
    pub fn repo(self, id: i64, project_id: i64, name: &str, hashed_path: &str, owner_id: i64) -> Self {
        self.repository(id, project_id, name, hashed_path, ("User", owner_id), owner_id, None)
    }

    pub fn fork(
        self,
        id: i64,
        project_id: i64,
        name: &str,
        hashed_path: &str,
        owner_id: i64,
        parent_id: i64,
    ) -> Self {
        self.repository(
            id,
            project_id,
            name,
            hashed_path,
            ("User", owner_id),
            owner_id,
            Some(parent_id),
        )
    }

    pub fn repository(
        self,
        id: i64,
        project_id: i64,
        name: &str,
        hashed_path: &str,
        owner: (&str, i64),
        user_id: i64,
        parent_id: Option<i64>,
    ) -> Self {
        self.conn
            .execute(
                "INSERT INTO repositories
                    (id, project_id, name, hashed_path, owner_type, owner_id, user_id, parent_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![id, project_id, name, hashed_path, owner.0, owner.1, user_id, parent_id],
            )
            .expect("insert repository");
        self
    }

    pub fn committer(self, repository_id: i64, committer: (&str, i64), permissions: i64) -> Self {
        self.conn
            .execute(
                "INSERT INTO committerships (repository_id, committer_type, committer_id, permissions)
                 VALUES (?1, ?2, ?3, ?4)",
                params![repository_id, committer.0, committer.1, permissions],
            )
            .expect("insert committership");
        self
    }

    pub fn into_store(self) -> SqliteLegacyStore {
        SqliteLegacyStore::from_connection(self.conn)
    }
}
