use tracing::debug;

use super::crew::{movie_crew, CAST_LIMIT, VIDEO_LIMIT};
use crate::catalog::model::{FileRef, Movie};
use crate::harvest::MovieCandidate;
use crate::metadata::MediaDetails;

/// Build a movie entity from its first file.
pub fn build_movie(candidate: &MovieCandidate, details: &MediaDetails) -> Movie {
    let mut movie = Movie {
        file_ids: Vec::new(),
        file_names: Vec::new(),
        paths: Vec::new(),
        parents: Vec::new(),
        modified_times: Vec::new(),
        sizes: Vec::new(),
        subtitles: Vec::new(),
        number_of_files: 0,

        tmdb_id: details.tmdb_id(),
        title: details.display_title().unwrap_or_default().to_string(),
        original_title: details.display_original_title().map(str::to_string),
        status: details.status.clone(),
        tagline: details.tagline.clone(),
        description: details.overview.clone(),
        release_date: details.premiere_date().map(str::to_string),
        year: details.year(),
        runtime: details.runtime,
        popularity: details.popularity,
        revenue: details.revenue,
        rating: details.vote_average,
        vote_count: details.vote_count,
        genres: details.genres.clone(),
        studios: details.production_companies.clone(),
        collection: details.belongs_to_collection.clone(),
        cast: details.credits.cast.iter().take(CAST_LIMIT).cloned().collect(),
        crew: movie_crew(&details.credits.crew),
        external_ids: details.external_ids.clone(),
        homepage: details.homepage.clone().filter(|h| !h.is_empty()),
        logo_path: details.images.logos.first().map(|l| l.file_path.clone()),
        poster_path: details.poster_path.clone(),
        backdrop_path: details.backdrop_path.clone(),
        videos: details.videos.results.iter().take(VIDEO_LIMIT).cloned().collect(),
    };
    append_file(&mut movie, candidate);
    movie
}

/// Add another file of the same movie.
pub fn append_file(movie: &mut Movie, candidate: &MovieCandidate) {
    let file = &candidate.file;
    movie.file_ids.push(file.id.clone());
    movie.file_names.push(file.name.clone());
    movie.paths.push(file.path.clone());
    movie
        .parents
        .push(candidate.parent.as_ref().map(|p| p.path.clone()));
    movie.modified_times.push(file.modified_time.clone());
    movie.sizes.push(file.size);
    movie
        .subtitles
        .extend(candidate.subtitles.iter().map(FileRef::from));
    movie.number_of_files += 1;

    debug!(
        tmdb_id = %movie.tmdb_id,
        file = %file.path,
        files = movie.number_of_files,
        "Added file to movie"
    );
}
