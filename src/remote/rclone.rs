//! rclone remote-control client.
//!
//! Talks to an already running `rclone rcd` daemon; starting and supervising
//! the daemon is out of scope.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RemoteEntry, RemoteLister};
use crate::config::RemoteConfig;

const LIST_ENDPOINT: &str = "operations/list";

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    fs: String,
    remote: &'a str,
    opt: ListOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListOptions {
    recurse: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    list: Vec<RcloneItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RcloneItem {
    #[serde(rename = "ID")]
    id: Option<String>,
    name: String,
    path: String,
    #[serde(default)]
    is_dir: bool,
    mime_type: Option<String>,
    size: Option<i64>,
    mod_time: Option<String>,
}

impl From<RcloneItem> for RemoteEntry {
    fn from(item: RcloneItem) -> Self {
        Self {
            id: item.id.unwrap_or_else(|| item.path.clone()),
            name: item.name,
            path: item.path,
            is_dir: item.is_dir,
            mime_type: item.mime_type,
            size: item.size.filter(|s| *s >= 0),
            modified_time: item.mod_time,
        }
    }
}

/// [`RemoteLister`] backed by the rclone rc API.
pub struct RcloneLister {
    client: Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl RcloneLister {
    pub fn new(config: &RemoteConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        let auth = match (&config.rc_user, &config.rc_pass) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };

        Self {
            client,
            base_url: config.rc_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}

#[async_trait::async_trait]
impl RemoteLister for RcloneLister {
    async fn list(&self, remote: &str, max_depth: Option<u32>) -> Result<Vec<RemoteEntry>> {
        let request = ListRequest {
            fs: format!("{remote}:"),
            remote: "",
            opt: ListOptions {
                recurse: true,
                max_depth,
            },
        };

        let mut builder = self.client.post(self.url(LIST_ENDPOINT)).json(&request);
        if let Some((user, pass)) = &self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to list remote '{remote}'"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            anyhow::bail!("rclone list of '{}' failed ({}): {}", remote, status, error);
        }

        let body: ListResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to decode rclone listing of '{remote}'"))?;

        debug!(remote = remote, entries = body.list.len(), "Listed remote");
        Ok(body.list.into_iter().map(RemoteEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> RemoteConfig {
        RemoteConfig {
            rc_url: url.to_string(),
            ..RemoteConfig::default()
        }
    }

    #[tokio::test]
    async fn lists_remote_and_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/operations/list"))
            .and(body_json(json!({
                "fs": "shows:",
                "remote": "",
                "opt": { "recurse": true, "maxDepth": 3 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [
                    {
                        "ID": "abc", "Name": "Dark", "Path": "Dark", "IsDir": true,
                        "MimeType": "inode/directory", "Size": -1,
                        "ModTime": "2026-01-01T00:00:00Z"
                    },
                    {
                        "Name": "e01.mkv", "Path": "Dark/Season 1/e01.mkv", "IsDir": false,
                        "MimeType": "video/x-matroska", "Size": 1234,
                        "ModTime": "2026-01-02T00:00:00Z"
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let lister = RcloneLister::new(&config(&server.uri()));
        let entries = lister.list("shows", Some(3)).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "abc");
        assert!(entries[0].is_dir);
        assert_eq!(entries[0].size, None);
        // Backends without ids fall back to the path.
        assert_eq!(entries[1].id, "Dark/Season 1/e01.mkv");
        assert_eq!(entries[1].size, Some(1234));
        assert!(entries[1].is_video());
    }

    #[tokio::test]
    async fn omits_max_depth_when_unbounded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/operations/list"))
            .and(body_json(json!({
                "fs": "movies:",
                "remote": "",
                "opt": { "recurse": true }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let lister = RcloneLister::new(&config(&server.uri()));
        assert!(lister.list("movies", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn daemon_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/operations/list"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "error": "didn't find section in config file" })),
            )
            .mount(&server)
            .await;

        let lister = RcloneLister::new(&config(&server.uri()));
        let err = lister.list("missing", None).await.unwrap_err();
        assert!(err.to_string().contains("didn't find section"));
    }
}
