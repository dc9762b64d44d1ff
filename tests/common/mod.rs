//! Shared test harness for integration tests.
//!
//! [`TestHarness`] starts one wiremock server standing in for both the rclone
//! daemon and TMDB, and wires the real lister, provider and SQLite sink
//! against it.

#![allow(dead_code)]

use std::sync::Arc;

use cinedex::catalog::SqliteSink;
use cinedex::config::{Config, RemoteConfig, TmdbConfig};
use cinedex::metadata::{MetadataProvider, TmdbProvider};
use cinedex::pipeline::Pipeline;
use cinedex::remote::RcloneLister;
use cinedex::resolve::{IdCache, Resolver};
use cinedex_db::pool::{init_memory_pool, DbPool};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestHarness {
    pub server: MockServer,
    pub config: Config,
    pub db: DbPool,
}

impl TestHarness {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let config = Config {
            tmdb: TmdbConfig {
                api_key: "test-key".into(),
                base_url: server.uri(),
                export_base_url: format!("{}/exports", server.uri()),
                requests_per_second: 50,
                ..TmdbConfig::default()
            },
            remote: RemoteConfig {
                rc_url: server.uri(),
                timeout_secs: 5,
                ..RemoteConfig::default()
            },
            ..Config::default()
        };
        let db = init_memory_pool().expect("failed to create in-memory pool");
        Self { server, config, db }
    }

    pub fn provider(&self) -> Arc<dyn MetadataProvider> {
        Arc::new(TmdbProvider::new(&self.config.tmdb))
    }

    pub fn sink(&self) -> SqliteSink {
        SqliteSink::new(self.db.clone())
    }

    /// Pipeline over the mock server, with the ID cache enabled.
    pub fn pipeline(&self) -> Pipeline {
        let provider = self.provider();
        let cache = Arc::new(IdCache::new(self.db.clone(), provider.clone()));
        let resolver = Arc::new(Resolver::new(provider.clone(), Some(cache)));
        Pipeline::new(
            Arc::new(RcloneLister::new(&self.config.remote)),
            provider,
            resolver,
            Arc::new(self.sink()),
        )
        .with_config(&self.config)
    }

    /// Serve an rclone listing for `remote`.
    pub async fn mount_listing(&self, remote: &str, items: Vec<Value>) {
        Mock::given(method("POST"))
            .and(path("/operations/list"))
            .and(body_partial_json(json!({ "fs": format!("{remote}:") })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": items })))
            .mount(&self.server)
            .await;
    }

    /// Serve a search for `query` returning `ids` in order.
    pub async fn mount_search(&self, kind: &str, query: &str, ids: &[u64]) {
        let results: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        Mock::given(method("GET"))
            .and(path(format!("/search/{kind}")))
            .and(query_param("query", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
            .mount(&self.server)
            .await;
    }

    /// Serve the first details call for `/{kind}/{id}`.
    pub async fn mount_details(&self, kind: &str, id: u64, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/{kind}/{id}")))
            .and(query_param("append_to_response", "credits,images,external_ids,videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve a season batch for a series.
    pub async fn mount_seasons(&self, id: u64, appends: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/tv/{id}")))
            .and(query_param("append_to_response", appends))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }
}

pub fn dir(path: &str) -> Value {
    json!({
        "ID": format!("d:{path}"),
        "Name": path.rsplit('/').next().unwrap_or(path),
        "Path": path,
        "IsDir": true,
        "MimeType": "inode/directory",
        "Size": -1,
        "ModTime": "2026-10-01T00:00:00Z",
    })
}

pub fn file(path: &str) -> Value {
    json!({
        "ID": format!("f:{path}"),
        "Name": path.rsplit('/').next().unwrap_or(path),
        "Path": path,
        "IsDir": false,
        "MimeType": "application/octet-stream",
        "Size": 1_000_000,
        "ModTime": "2026-10-02T00:00:00Z",
    })
}
