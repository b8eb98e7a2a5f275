//! Data models for the movie catalog.
//!
//! Field names follow the catalog's snake_case JSON so the types
//! deserialize directly from API responses.

pub mod movie;

pub use movie::{
    Genre, Movie, MovieDetail, MovieListResponse, ProductionCompany, ProductionCountry,
    SpokenLanguage,
};
