//! Shared constants for end-to-end tests

// ============================================================================
// Test Catalog
// ============================================================================

pub const ARTIST_1_ID: &str = "ARTEST0001";
pub const ARTIST_1_NAME: &str = "Test Artist";

pub const ARTIST_2_ID: &str = "ARTEST0002";
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

pub const SONG_1_ID: &str = "SOTEST0001";
pub const SONG_1_TITLE: &str = "Test Song";
pub const SONG_1_DURATION: f64 = 123.45;

pub const SONG_2_ID: &str = "SOTEST0002";
pub const SONG_2_TITLE: &str = "Blue Night";
pub const SONG_2_DURATION: f64 = 301.2;

// ============================================================================
// Test Users
// ============================================================================

pub const USER_1_ID: &str = "39";
pub const USER_2_ID: &str = "97";

/// 2018-11-11 02:33:56.796 UTC
pub const TS_1: i64 = 1_541_903_636_796;
/// 2018-11-12 10:00:00.000 UTC
pub const TS_2: i64 = 1_542_016_800_000;
