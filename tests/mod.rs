//! Integration tests for aniwatch
//!
//! Tests are organized by component:
//! - jikan_test: Jikan client (search, anime metadata, episode pages)
//! - anilist_test: AniList GraphQL client
//! - kitsu_test: Kitsu mapping and title lookups
//! - malsync_test: MAL-Sync site links
//! - resolver_test: Resolution order against stub sources
//! - cli_test: Argument parsing and command handlers
//! - e2e_test: Config -> Resolver -> mock HTTP -> resolved count

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
