//! Crew curation.
//!
//! Only a handful of jobs are kept. "Screenplay by" credits join
//! "Screenplay"; for series, "Series Director" and "Series Writer" join
//! "Director" and "Writer", and the creators come from `created_by` followed
//! by any "Creator" credits not already listed there.

use crate::catalog::model::Crew;
use crate::metadata::details::CrewMember;

/// Cast members carried per entity.
pub const CAST_LIMIT: usize = 10;

/// Trailers and clips carried per entity.
pub const VIDEO_LIMIT: usize = 10;

pub fn movie_crew(crew: &[CrewMember]) -> Crew {
    let mut curated = Crew {
        creator: with_jobs(crew, &["Creator"]),
        ..Crew::default()
    };
    fill_common(&mut curated, crew, false);
    curated
}

pub fn series_crew(crew: &[CrewMember], created_by: &[CrewMember]) -> Crew {
    let mut creator = created_by.to_vec();
    for member in with_jobs(crew, &["Creator"]) {
        if !creator.iter().any(|c| c.id == member.id) {
            creator.push(member);
        }
    }

    let mut curated = Crew {
        creator,
        ..Crew::default()
    };
    fill_common(&mut curated, crew, true);
    curated
}

fn fill_common(curated: &mut Crew, crew: &[CrewMember], series: bool) {
    curated.director = with_jobs(crew, &["Director"]);
    curated.screenplay = with_jobs(crew, &["Screenplay"]);
    curated.screenplay.extend(with_jobs(crew, &["Screenplay by"]));
    curated.author = with_jobs(crew, &["Author"]);
    curated.writer = with_jobs(crew, &["Writer"]);

    if series {
        curated.director.extend(with_jobs(crew, &["Series Director"]));
        curated.writer.extend(with_jobs(crew, &["Series Writer"]));
    }
}

fn with_jobs(crew: &[CrewMember], jobs: &[&str]) -> Vec<CrewMember> {
    crew.iter()
        .filter(|m| m.job.as_deref().is_some_and(|job| jobs.contains(&job)))
        .cloned()
        .collect()
}
