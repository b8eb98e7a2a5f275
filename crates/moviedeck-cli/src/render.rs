//! Plain-text rendering of catalog results.

use moviedeck_core::models::{MovieDetail, MovieListResponse};
use moviedeck_core::utils::{format_rating, format_votes, truncate_string};

/// Maximum title width in list output
const TITLE_WIDTH: usize = 48;

/// Maximum overview width in detail output
const OVERVIEW_WIDTH: usize = 400;

pub fn movie_list(heading: &str, list: &MovieListResponse) -> String {
    let mut out = format!(
        "{} (page {} of {}, {} results)\n",
        heading, list.page, list.total_pages, list.total_results
    );
    if list.results.is_empty() {
        out.push_str("  No movies found.\n");
        return out;
    }
    for movie in &list.results {
        out.push_str(&format!(
            "  {:>8}  {:<width$}  {:>7}\n",
            movie.id,
            truncate_string(&movie.display_title(), TITLE_WIDTH),
            format_rating(movie.vote_average, movie.vote_count),
            width = TITLE_WIDTH,
        ));
    }
    if list.has_next_page() {
        out.push_str(&format!("  More: --page {}\n", list.page + 1));
    }
    out
}

pub fn movie_detail(detail: &MovieDetail) -> String {
    let movie = &detail.movie;
    let mut out = format!("{}\n", movie.display_title());
    if let Some(tagline) = detail.tagline.as_deref().filter(|t| !t.is_empty()) {
        out.push_str(&format!("\"{}\"\n", tagline));
    }
    out.push('\n');

    let genres = detail.genre_names();
    if !genres.is_empty() {
        out.push_str(&format!("Genres:   {}\n", genres.join(", ")));
    }
    if let Some(runtime) = detail.runtime_display() {
        out.push_str(&format!("Runtime:  {}\n", runtime));
    }
    out.push_str(&format!(
        "Rating:   {} ({} votes)\n",
        format_rating(movie.vote_average, movie.vote_count),
        format_votes(movie.vote_count)
    ));
    if !detail.status.is_empty() {
        out.push_str(&format!("Status:   {}\n", detail.status));
    }
    if let Some(imdb) = detail.imdb_id.as_deref().filter(|i| !i.is_empty()) {
        out.push_str(&format!("IMDb:     https://www.imdb.com/title/{}\n", imdb));
    }
    if !movie.overview.is_empty() {
        out.push_str(&format!("\n{}\n", truncate_string(&movie.overview, OVERVIEW_WIDTH)));
    }
    out
}
