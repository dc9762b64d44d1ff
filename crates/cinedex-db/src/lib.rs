//! Cinedex-DB: Database schema, migrations, and query operations
//!
//! This crate provides the persistent side of cinedex using SQLite with
//! rusqlite and r2d2 connection pooling. It holds two kinds of data: the
//! bulk provider ID cache used for fuzzy title resolution, and the catalog
//! itself, written one category at a time.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use cinedex_common::MediaKind;
//! use cinedex_db::pool::{init_pool, get_conn};
//! use cinedex_db::queries::id_cache;
//!
//! let pool = init_pool("/var/lib/cinedex/cinedex.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let hit = id_cache::find_exact(&conn, MediaKind::Movie, "iron man").unwrap();
//! println!("cached id: {:?}", hit);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
