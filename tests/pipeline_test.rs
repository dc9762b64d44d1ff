//! End-to-end category builds against mocked rclone and TMDB endpoints.

mod common;

use std::io::Write;

use cinedex_common::{Category, MediaKind, TmdbId};
use cinedex_db::pool::get_conn;
use cinedex_db::queries::{builds, catalog};
use common::{dir, file, TestHarness};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, ResponseTemplate};

fn gzip(lines: &[&str]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for line in lines {
        writeln!(encoder, "{line}").unwrap();
    }
    encoder.finish().unwrap()
}

#[tokio::test]
async fn movie_category_is_built_and_searchable() {
    let h = TestHarness::new().await;
    h.mount_listing(
        "films",
        vec![
            dir("The Matrix (1999)"),
            file("The Matrix (1999)/The Matrix (1999).mkv"),
            file("The Matrix (1999)/The Matrix (1999) 2160p.mkv"),
            file("The Matrix (1999)/The Matrix (1999).en.srt"),
            dir("Samples"),
            file("Samples/sample.mkv"),
            file("Samples/ignore.txt"),
        ],
    )
    .await;
    h.mount_search("movie", "the matrix", &[603, 604]).await;
    h.mount_details(
        "movie",
        603,
        json!({
            "id": 603,
            "title": "The Matrix",
            "original_title": "The Matrix",
            "release_date": "1999-03-31",
            "runtime": 136,
            "credits": {
                "cast": [{"id": 6384, "name": "Keanu Reeves", "character": "Neo", "order": 0}],
                "crew": [
                    {"id": 9339, "name": "Lilly Wachowski", "job": "Director", "department": "Directing"},
                    {"id": 1, "name": "Grip", "job": "Key Grip", "department": "Crew"}
                ]
            },
            "images": {"logos": [{"file_path": "/matrix-logo.png"}]},
            "external_ids": {"imdb_id": "tt0133093"}
        }),
    )
    .await;

    let category = Category::new("films", MediaKind::Movie, "Films");
    let report = h.pipeline().run_category(&category).await.unwrap();

    assert_eq!(report.candidates, 2);
    assert_eq!(report.identified, 2);
    assert_eq!(report.entities, 1);
    assert_eq!(report.files, 2);

    {
        let conn = get_conn(&h.db).unwrap();
        let entry = catalog::get_entry(&conn, "films", TmdbId::new(603))
            .unwrap()
            .unwrap();
        assert_eq!(entry.title, "The Matrix");
        assert_eq!(entry.year, Some(1999));
        assert_eq!(entry.body["number_of_files"], 2);
        assert_eq!(entry.body["subtitles"].as_array().unwrap().len(), 1);
        assert_eq!(entry.body["logo_path"], "/matrix-logo.png");
        assert_eq!(entry.body["crew"]["Director"][0]["name"], "Lilly Wachowski");
        assert_eq!(entry.body["external_ids"]["imdb_id"], "tt0133093");

        let last = builds::last_build(&conn, "films").unwrap().unwrap();
        assert_eq!(last.entities, 1);
    }

    let hits = h.sink().search_titles("matrix", None, 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].category_id, "films");
}

#[tokio::test]
async fn rebuild_replaces_previous_contents() {
    let h = TestHarness::new().await;
    h.mount_listing("films", vec![file("Heat (1995).mkv")]).await;
    h.mount_search("movie", "heat", &[949]).await;
    h.mount_details("movie", 949, json!({"id": 949, "title": "Heat"}))
        .await;

    let category = Category::new("films", MediaKind::Movie, "Films");
    let pipeline = h.pipeline();
    pipeline.run_category(&category).await.unwrap();
    pipeline.run_category(&category).await.unwrap();

    let conn = get_conn(&h.db).unwrap();
    assert_eq!(catalog::count_entries(&conn, "films").unwrap(), 1);
    assert_eq!(builds::list_builds(&conn, Some("films"), 10).unwrap().len(), 2);
}

#[tokio::test]
async fn unresolved_movie_falls_back_to_id_export() {
    let h = TestHarness::new().await;
    h.mount_listing("films", vec![file("Amelie (2001).mkv")]).await;
    h.mount_search("movie", "amelie", &[]).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/exports/movie_ids_\d{2}_\d{2}_\d{4}\.json\.gz$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(&[
            r#"{"adult":false,"id":194,"original_title":"Amelie","popularity":20.1,"video":false}"#,
            "not json",
            r#"{"adult":false,"id":195,"original_title":"Amelia","popularity":2.0,"video":false}"#,
        ])))
        .expect(1)
        .mount(&h.server)
        .await;
    h.mount_details("movie", 194, json!({"id": 194, "title": "Amélie"}))
        .await;

    let category = Category::new("films", MediaKind::Movie, "Films");
    let report = h.pipeline().run_category(&category).await.unwrap();

    assert_eq!(report.deferred, 1);
    assert_eq!(report.resolved_in_fallback, 1);
    assert_eq!(report.entities, 1);

    let conn = get_conn(&h.db).unwrap();
    assert!(catalog::get_entry(&conn, "films", TmdbId::new(194))
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn series_category_keeps_every_episode_file() {
    let h = TestHarness::new().await;
    h.mount_listing(
        "shows",
        vec![
            dir("Dark (2017)"),
            dir("Dark (2017)/Season 1"),
            file("Dark (2017)/Season 1/Dark.S01E01.mkv"),
            file("Dark (2017)/Season 1/Dark.S01E02.mkv"),
            dir("Dark (2017)/Season 9"),
            file("Dark (2017)/Season 9/Dark.S09E01.mkv"),
        ],
    )
    .await;
    h.mount_search("tv", "dark", &[70523]).await;
    h.mount_details(
        "tv",
        70523,
        json!({
            "id": 70523,
            "name": "Dark",
            "original_name": "Dark",
            "first_air_date": "2017-12-01",
            "created_by": [{"id": 1, "name": "Baran bo Odar"}],
            "seasons": [{"season_number": 1, "episode_count": 10, "name": "Season 1"}]
        }),
    )
    .await;
    h.mount_seasons(
        70523,
        "season/1",
        json!({
            "id": 70523,
            "season/1": {
                "season_number": 1,
                "episodes": [{"episode_number": 1, "name": "Secrets", "air_date": "2017-12-01"}]
            }
        }),
    )
    .await;

    let category = Category::new("shows", MediaKind::Series, "Shows");
    let report = h.pipeline().run_category(&category).await.unwrap();

    assert_eq!(report.entities, 1);
    // Season 9 is unknown to the provider and is left out.
    assert_eq!(report.files, 2);

    let conn = get_conn(&h.db).unwrap();
    let episodes = catalog::list_episodes(&conn, "shows", TmdbId::new(70523)).unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[0].name.as_deref(), Some("Secrets"));
    // No metadata for episode 2: the file is kept as a placeholder.
    assert_eq!(episodes[1].episode_number, 2);
    assert_eq!(episodes[1].name, None);

    let entry = catalog::get_entry(&conn, "shows", TmdbId::new(70523))
        .unwrap()
        .unwrap();
    assert_eq!(entry.body["crew"]["Creator"][0]["name"], "Baran bo Odar");
    assert_eq!(
        entry.body["seasons"][0]["episodes"][1]["air_date"],
        "2017-01-01"
    );
    assert_eq!(entry.body["seasons"][0]["episodes"][1]["placeholder"], true);

    let recent = catalog::recent_episodes(&conn, 5).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].series_title, "Dark");
}

#[tokio::test]
async fn listing_failure_fails_only_that_category() {
    let h = TestHarness::new().await;
    h.mount_listing("films", vec![]).await;

    let results = h
        .pipeline()
        .run(&[
            Category::new("offline", MediaKind::Movie, "Offline"),
            Category::new("films", MediaKind::Movie, "Films"),
        ])
        .await;

    assert!(results[0].1.is_err());
    assert_eq!(results[1].1.as_ref().unwrap().entities, 0);
}
