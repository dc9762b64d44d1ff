//! Remote storage listings.
//!
//! A [`RemoteLister`] turns one configured category (an rclone remote) into a
//! flat sequence of [`RemoteEntry`] values. Parent/child relations are implied
//! by the `/`-separated `path`; nothing here builds a tree.

mod rclone;

pub use rclone::RcloneLister;

use anyhow::Result;
use cinedex_common::paths;
use serde::{Deserialize, Serialize};

/// One file or directory from a remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Backend file id (e.g. a Drive file id); falls back to the path
    pub id: String,
    pub name: String,
    /// Path relative to the category root, `/`-separated
    pub path: String,
    pub is_dir: bool,
    pub mime_type: Option<String>,
    /// Size in bytes; unknown for most directories
    pub size: Option<i64>,
    /// RFC 3339 modification time as reported by the backend
    pub modified_time: Option<String>,
}

impl RemoteEntry {
    /// Path of the containing directory; the category root is `""`.
    pub fn parent_path(&self) -> &str {
        paths::parent_path(&self.path)
    }

    /// Depth below the category root (top-level entries are 0).
    pub fn depth(&self) -> usize {
        paths::depth(&self.path)
    }

    /// Video file, by extension or by MIME type.
    pub fn is_video(&self) -> bool {
        !self.is_dir
            && (paths::is_video_name(&self.name)
                || self.mime_type.as_deref().is_some_and(paths::is_video_mime))
    }

    pub fn is_subtitle(&self) -> bool {
        !self.is_dir && paths::is_subtitle_name(&self.name)
    }

    pub fn is_text_marker(&self) -> bool {
        !self.is_dir && paths::is_text_marker(&self.name)
    }

    /// Placeholder for a directory that was implied by a path but never listed.
    pub fn synthesized_dir(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            id: path.to_string(),
            name,
            path: path.to_string(),
            is_dir: true,
            mime_type: None,
            size: None,
            modified_time: None,
        }
    }
}

/// Source of remote listings for a category.
#[async_trait::async_trait]
pub trait RemoteLister: Send + Sync {
    /// Recursively list `remote`. `max_depth` bounds the recursion, `None`
    /// means unlimited.
    async fn list(&self, remote: &str, max_depth: Option<u32>) -> Result<Vec<RemoteEntry>>;
}
