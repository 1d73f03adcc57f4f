use reqwest::blocking::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};

use super::TargetApi;
use super::dto::*;
use crate::config::TargetConfig;
use crate::error::{Error, Result};
use crate::types::*;

const PER_PAGE: u32 = 100;
const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Blocking client for the target platform's v4 REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(config: &TargetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url, path)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()?;
        self.handle_response(resp)
    }

    /// Follows page headers until every item has been fetched.
    pub fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let url = self.url(&format!("{path}{separator}per_page={PER_PAGE}&page={page}"));
            let resp = self.client.get(&url).bearer_auth(&self.token).send()?;
            let next = resp
                .headers()
                .get(NEXT_PAGE_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());

            let batch: Vec<T> = self.handle_response(resp)?;
            items.extend(batch);

            match next {
                Some(n) if n > page => page = n,
                _ => break,
            }
        }

        Ok(items)
    }

    pub fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()?;
        self.handle_response(resp)
    }

    /// POST whose response body is not needed.
    pub fn post_empty<B: Serialize>(&self, path: &str, body: Option<&B>) -> Result<()> {
        let mut req = self.client.post(self.url(path)).bearer_auth(&self.token);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send()?;
        Self::check_status(resp).map(drop)
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()?;
        Self::check_status(resp).map(drop)
    }

    fn handle_response<T: DeserializeOwned>(&self, resp: Response) -> Result<T> {
        let resp = Self::check_status(resp)?;
        Ok(resp.json()?)
    }

    fn check_status(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = resp
            .json::<ApiErrorBody>()
            .ok()
            .and_then(ApiErrorBody::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Server error (no details provided)")
                    .to_string()
            });
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl TargetApi for ApiClient {
    fn current_user(&self) -> Result<TargetUser> {
        self.get("/user")
    }

    fn list_users(&self) -> Result<Vec<TargetUser>> {
        self.get_all("/users")
    }

    fn create_user(&self, user: &NewUser) -> Result<TargetUser> {
        self.post("/users", user)
    }

    fn delete_user(&self, id: u64) -> Result<()> {
        self.delete(&format!("/users/{id}"))
    }

    fn create_ssh_key(&self, user_id: u64, key: &NewSshKey) -> Result<()> {
        self.post_empty(&format!("/users/{user_id}/keys"), Some(key))
    }

    fn create_impersonation_token(
        &self,
        user_id: u64,
        token: &NewImpersonationToken,
    ) -> Result<ImpersonationToken> {
        self.post(&format!("/users/{user_id}/impersonation_tokens"), token)
    }

    fn create_group(&self, group: &NewGroup) -> Result<TargetGroup> {
        self.post("/groups", group)
    }

    fn list_groups(&self) -> Result<Vec<TargetGroup>> {
        self.get_all("/groups?all_available=true")
    }

    fn delete_group(&self, id: u64) -> Result<()> {
        self.delete(&format!("/groups/{id}"))
    }

    fn add_group_member(&self, group_id: u64, member: &NewMember) -> Result<()> {
        self.post_empty(&format!("/groups/{group_id}/members"), Some(member))
    }

    fn list_group_members(&self, group_id: u64) -> Result<Vec<Member>> {
        self.get_all(&format!("/groups/{group_id}/members"))
    }

    fn create_project(&self, project: &NewProject) -> Result<TargetProject> {
        self.post("/projects", project)
    }

    fn create_user_project(&self, user_id: u64, project: &NewProject) -> Result<TargetProject> {
        self.post(&format!("/projects/user/{user_id}"), project)
    }

    fn list_projects(&self) -> Result<Vec<TargetProject>> {
        self.get_all("/projects")
    }

    fn delete_project(&self, id: u64) -> Result<()> {
        self.delete(&format!("/projects/{id}"))
    }

    fn add_project_member(&self, project_id: u64, member: &NewMember) -> Result<()> {
        self.post_empty(&format!("/projects/{project_id}/members"), Some(member))
    }

    fn create_fork_relation(&self, project_id: u64, forked_from_id: u64) -> Result<()> {
        self.post_empty::<()>(&format!("/projects/{project_id}/fork/{forked_from_id}"), None)
    }
}
