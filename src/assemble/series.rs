use std::collections::HashSet;

use cinedex_common::TmdbId;
use cinedex_parser::{parse_episode, EpisodeNumbers};
use tracing::{debug, info, warn};

use super::crew::{series_crew, CAST_LIMIT, VIDEO_LIMIT};
use crate::catalog::model::{Episode, FileRef, Season, Series};
use crate::harvest::{SeasonBucket, SeriesCandidate};
use crate::metadata::{EpisodeDetails, MediaDetails, MetadataProvider};
use crate::remote::RemoteEntry;

/// Build a series entity with every harvested season the provider knows.
///
/// `year` is the year parsed from the folder name; placeholder episodes
/// use it for their air date.
pub async fn build_series(
    candidate: &SeriesCandidate,
    details: &MediaDetails,
    year: Option<u16>,
    provider: &dyn MetadataProvider,
) -> Series {
    let mut seasons = Vec::new();
    for (number, bucket) in &candidate.seasons {
        if details.season_summary(*number).is_none() && !details.season_details.contains_key(number)
        {
            info!(
                series = %candidate.folder.name,
                tmdb_id = details.id,
                season = number,
                "Season unknown to provider, skipping"
            );
            continue;
        }
        seasons.push(build_season(bucket, details, year, provider).await);
    }

    Series {
        folder: FileRef::from(&candidate.folder),
        size: seasons.iter().map(|s| s.size).sum(),

        tmdb_id: details.tmdb_id(),
        title: details.display_title().unwrap_or_default().to_string(),
        original_title: details.display_original_title().map(str::to_string),
        status: details.status.clone(),
        tagline: details.tagline.clone().filter(|t| !t.is_empty()),
        description: details.overview.clone(),
        first_air_date: details.premiere_date().map(str::to_string),
        last_air_date: details.last_air_date.clone(),
        year: details.year(),
        runtime: details.episode_run_time.first().copied(),
        popularity: details.popularity,
        rating: details.vote_average,
        vote_count: details.vote_count,
        genres: details.genres.clone(),
        studios: details.production_companies.clone(),
        cast: details.credits.cast.iter().take(CAST_LIMIT).cloned().collect(),
        crew: series_crew(&details.credits.crew, &details.created_by),
        external_ids: details.external_ids.clone(),
        total_episodes: details.number_of_episodes,
        total_seasons: details.number_of_seasons,
        last_episode_to_air: details.last_episode_to_air.clone(),
        next_episode_to_air: details.next_episode_to_air.clone(),
        homepage: details.homepage.clone().filter(|h| !h.is_empty()),
        logo_path: details.images.logos.first().map(|l| l.file_path.clone()),
        poster_path: details.poster_path.clone(),
        backdrop_path: details.backdrop_path.clone(),
        videos: details.videos.results.iter().take(VIDEO_LIMIT).cloned().collect(),
        seasons,
    }
}

async fn build_season(
    bucket: &SeasonBucket,
    details: &MediaDetails,
    year: Option<u16>,
    provider: &dyn MetadataProvider,
) -> Season {
    let summary = details.season_summary(bucket.number);
    let body = details.season_details.get(&bucket.number);

    let parsed: Vec<_> = bucket.episodes.iter().map(|f| parse_episode(&f.name)).collect();
    let numbers = episode_numbers(&parsed);

    let mut episodes = Vec::with_capacity(bucket.episodes.len());
    for ((file, parsed), episode_number) in bucket.episodes.iter().zip(&parsed).zip(numbers) {
        let season_number = parsed.season.unwrap_or(bucket.number);
        if season_number != bucket.number {
            debug!(
                file = %file.path,
                parsed = season_number,
                folder = bucket.number,
                "Season number in file name differs from its folder"
            );
        }

        let found = episode_details(details, season_number, episode_number, provider).await;
        episodes.push(episode_entity(file, bucket.number, episode_number, found, year));
    }

    let episodes = dedup_sorted(episodes, details.tmdb_id(), bucket.number);
    Season {
        folder: bucket.folder.as_ref().map(FileRef::from),
        size: episodes.iter().filter_map(|e| e.file.size).sum(),

        tmdb_id: body.and_then(|b| b.id).or(summary.and_then(|s| s.id)),
        season_number: bucket.number,
        name: body
            .and_then(|b| b.name.clone())
            .or_else(|| summary.and_then(|s| s.name.clone())),
        description: body
            .and_then(|b| b.overview.clone())
            .or_else(|| summary.and_then(|s| s.overview.clone()))
            .filter(|o| !o.is_empty()),
        air_date: body
            .and_then(|b| b.air_date.clone())
            .or_else(|| summary.and_then(|s| s.air_date.clone())),
        episode_count: body
            .map(|b| b.episodes.len() as u32)
            .or(summary.and_then(|s| s.episode_count)),
        poster_path: body
            .and_then(|b| b.poster_path.clone())
            .or_else(|| summary.and_then(|s| s.poster_path.clone())),
        episodes,
    }
}

/// Final episode number per file.
///
/// Files without a parsable episode number count down from the bucket size:
/// the first such file of K is episode K. A countdown number another file
/// already parsed is replaced by the next number above every one in use.
fn episode_numbers(parsed: &[EpisodeNumbers]) -> Vec<u32> {
    let total = parsed.len() as u32;
    let mut used: HashSet<u32> = parsed.iter().filter_map(|p| p.episode).collect();
    let mut next_free = used.iter().max().copied().unwrap_or(0).max(total);

    parsed
        .iter()
        .enumerate()
        .map(|(index, p)| {
            if let Some(number) = p.episode {
                return number;
            }
            let mut number = total - index as u32;
            if used.contains(&number) {
                next_free += 1;
                number = next_free;
            }
            used.insert(number);
            number
        })
        .collect()
}

/// Merged season body first, then the per-episode endpoint.
async fn episode_details(
    details: &MediaDetails,
    season: u32,
    episode: u32,
    provider: &dyn MetadataProvider,
) -> Option<EpisodeDetails> {
    if let Some(found) = details.episode(season, episode) {
        return Some(found.clone());
    }

    match provider
        .get_episode_details(details.tmdb_id(), season, episode)
        .await
    {
        Ok(found) => found,
        Err(e) => {
            warn!(
                tmdb_id = details.id,
                season = season,
                episode = episode,
                error = %format!("{e:#}"),
                "Episode lookup failed"
            );
            None
        }
    }
}

fn episode_entity(
    file: &RemoteEntry,
    season_number: u32,
    episode_number: u32,
    found: Option<EpisodeDetails>,
    year: Option<u16>,
) -> Episode {
    match found {
        Some(d) => Episode {
            file: FileRef::from(file),
            episode_number,
            season_number,
            tmdb_id: d.id,
            name: d.name,
            overview: d.overview.filter(|o| !o.is_empty()),
            air_date: d.air_date,
            runtime: d.runtime,
            still_path: d.still_path,
            rating: d.vote_average,
            vote_count: d.vote_count,
            placeholder: false,
        },
        None => {
            debug!(
                file = %file.path,
                season = season_number,
                episode = episode_number,
                "No episode metadata, using placeholder"
            );
            Episode {
                file: FileRef::from(file),
                episode_number,
                season_number,
                tmdb_id: None,
                name: None,
                overview: None,
                air_date: year.map(|y| format!("{y}-01-01")),
                runtime: None,
                still_path: None,
                rating: None,
                vote_count: None,
                placeholder: true,
            }
        }
    }
}

/// Sort by episode number, keeping the first file of each number.
fn dedup_sorted(episodes: Vec<Episode>, tmdb_id: TmdbId, season: u32) -> Vec<Episode> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Episode> = episodes
        .into_iter()
        .filter(|e| {
            let first = seen.insert(e.episode_number);
            if !first {
                warn!(
                    tmdb_id = %tmdb_id,
                    season = season,
                    episode = e.episode_number,
                    file = %e.file.path,
                    "Duplicate episode number, keeping the first file"
                );
            }
            first
        })
        .collect();
    kept.sort_by_key(|e| e.episode_number);
    kept
}

/// Fold a second series entity with the same identifier into `target`.
pub fn merge_series(target: &mut Series, other: Series) {
    debug!(
        tmdb_id = %target.tmdb_id,
        folder = %other.folder.path,
        "Merging series folder into existing entity"
    );
    for season in other.seasons {
        match target
            .seasons
            .iter_mut()
            .find(|s| s.season_number == season.season_number)
        {
            Some(existing) => {
                let mut episodes = std::mem::take(&mut existing.episodes);
                episodes.extend(season.episodes);
                existing.episodes = dedup_sorted(episodes, target.tmdb_id, existing.season_number);
                existing.size = existing.episodes.iter().filter_map(|e| e.file.size).sum();
                if existing.folder.is_none() {
                    existing.folder = season.folder;
                }
            }
            None => target.seasons.push(season),
        }
    }
    target.seasons.sort_by_key(|s| s.season_number);
    target.size = target.seasons.iter().map(|s| s.size).sum();
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::metadata::test_support::StubProvider;
    use crate::metadata::{SeasonDetails, SeasonSummary};
    use crate::remote::test_support::{dir, file};

    fn summary(number: u32) -> SeasonSummary {
        SeasonSummary {
            id: Some(100 + number as u64),
            season_number: number,
            name: Some(format!("Season {number}")),
            overview: None,
            air_date: None,
            episode_count: Some(10),
            poster_path: None,
        }
    }

    fn known(number: u32, name: &str) -> EpisodeDetails {
        EpisodeDetails {
            id: Some(number as u64),
            episode_number: number,
            season_number: None,
            name: Some(name.to_string()),
            overview: None,
            air_date: Some("2019-05-01".into()),
            runtime: Some(50),
            still_path: None,
            vote_average: None,
            vote_count: None,
        }
    }

    fn details(seasons: &[u32]) -> MediaDetails {
        MediaDetails {
            id: 70523,
            name: Some("Dark".into()),
            first_air_date: Some("2017-12-01".into()),
            seasons: seasons.iter().map(|n| summary(*n)).collect(),
            ..Default::default()
        }
    }

    fn candidate(folder: &str, seasons: Vec<(u32, Vec<&str>)>) -> SeriesCandidate {
        let mut map = BTreeMap::new();
        for (number, files) in seasons {
            let season_dir = format!("{folder}/Season {number}");
            map.insert(
                number,
                SeasonBucket {
                    number,
                    folder: Some(dir(&season_dir)),
                    episodes: files
                        .iter()
                        .map(|f| file(&format!("{season_dir}/{f}")))
                        .collect(),
                },
            );
        }
        SeriesCandidate {
            folder: dir(folder),
            seasons: map,
        }
    }

    fn numbers(season: &Season) -> Vec<u32> {
        season.episodes.iter().map(|e| e.episode_number).collect()
    }

    #[tokio::test]
    async fn test_positional_fallback_counts_down() {
        let provider = StubProvider::default();
        let series = build_series(
            &candidate("Dark", vec![(2, vec!["Alpha.mkv", "Beta.mkv", "Gamma.mkv"])]),
            &details(&[2]),
            None,
            &provider,
        )
        .await;

        let season = &series.seasons[0];
        assert_eq!(numbers(season), vec![1, 2, 3]);
        // Sorted ascending, so the last listed file comes first.
        assert_eq!(season.episodes[0].file.name, "Gamma.mkv");
        assert_eq!(season.episodes[2].file.name, "Alpha.mkv");
    }

    #[test]
    fn test_countdown_skips_parsed_numbers() {
        let assign = |names: &[&str]| {
            let parsed: Vec<_> = names.iter().map(|n| parse_episode(n)).collect();
            episode_numbers(&parsed)
        };
        assert_eq!(assign(&["Show.E01.mkv", "Bonus.mkv"]), vec![1, 2]);
        assert_eq!(assign(&["Bonus.mkv", "Extra.mkv", "Show.E03.mkv"]), vec![4, 2, 3]);
        assert_eq!(assign(&["A.mkv", "B.mkv", "C.mkv"]), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_unnumbered_file_is_kept_next_to_parsed_one() {
        let provider = StubProvider::default();
        let series = build_series(
            &candidate("Dark", vec![(1, vec!["Dark.E01.mkv", "Bonus.mkv"])]),
            &details(&[1]),
            None,
            &provider,
        )
        .await;

        let season = &series.seasons[0];
        assert_eq!(numbers(season), vec![1, 2]);
        assert_eq!(season.episodes[1].file.name, "Bonus.mkv");
    }

    #[tokio::test]
    async fn test_merged_body_then_endpoint_then_placeholder() {
        let provider = StubProvider::default();
        provider.add_episode(
            70523,
            EpisodeDetails {
                season_number: Some(1),
                ..known(2, "From endpoint")
            },
        );

        let mut details = details(&[1]);
        details.season_details.insert(
            1,
            SeasonDetails {
                id: Some(7),
                season_number: 1,
                name: Some("Season One".into()),
                overview: None,
                air_date: None,
                poster_path: None,
                episodes: vec![known(1, "From body")],
            },
        );

        let series = build_series(
            &candidate(
                "Dark",
                vec![(1, vec!["Dark.S01E01.mkv", "Dark.S01E02.mkv", "Dark.S01E03.mkv"])],
            ),
            &details,
            Some(2017),
            &provider,
        )
        .await;

        let season = &series.seasons[0];
        assert_eq!(season.name.as_deref(), Some("Season One"));
        assert_eq!(season.episodes[0].name.as_deref(), Some("From body"));
        assert_eq!(season.episodes[1].name.as_deref(), Some("From endpoint"));

        let placeholder = &season.episodes[2];
        assert!(placeholder.placeholder);
        assert_eq!(placeholder.name, None);
        assert_eq!(placeholder.air_date.as_deref(), Some("2017-01-01"));
        assert_eq!(placeholder.file.name, "Dark.S01E03.mkv");

        // Episode 1 came from the body, so only 2 and 3 hit the endpoint.
        assert_eq!(provider.episode_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_season_skipped_and_duplicates_keep_first() {
        let provider = StubProvider::default();
        let series = build_series(
            &candidate(
                "Dark",
                vec![
                    (1, vec!["Dark.S01E02.mkv", "Dark.S01E01.mkv", "Dark.S01E01.REPACK.mkv"]),
                    (4, vec!["Dark.S04E01.mkv"]),
                ],
            ),
            &details(&[0, 1, 2, 3]),
            None,
            &provider,
        )
        .await;

        assert_eq!(series.seasons.len(), 1);
        let season = &series.seasons[0];
        assert_eq!(numbers(season), vec![1, 2]);
        assert_eq!(season.episodes[0].file.name, "Dark.S01E01.mkv");
        assert_eq!(series.episode_count(), 2);
        assert_eq!(series.size, 2048);
    }

    #[tokio::test]
    async fn test_merge_series_combines_seasons() {
        let provider = StubProvider::default();
        let details = details(&[1, 2]);
        let mut first = build_series(
            &candidate("Dark", vec![(2, vec!["Dark.S02E01.mkv"])]),
            &details,
            None,
            &provider,
        )
        .await;
        let second = build_series(
            &candidate(
                "Dark (2017)",
                vec![
                    (1, vec!["Dark.S01E01.mkv"]),
                    (2, vec!["Dark.S02E01.mkv", "Dark.S02E02.mkv"]),
                ],
            ),
            &details,
            None,
            &provider,
        )
        .await;

        merge_series(&mut first, second);

        let seasons: Vec<u32> = first.seasons.iter().map(|s| s.season_number).collect();
        assert_eq!(seasons, vec![1, 2]);
        assert_eq!(numbers(&first.seasons[1]), vec![1, 2]);
        assert_eq!(first.seasons[1].episodes[0].file.path, "Dark/Season 2/Dark.S02E01.mkv");
        assert_eq!(first.size, 3 * 1024);
    }
}
