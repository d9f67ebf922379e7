//! The row types backing the schema of `schema.rs`.

/// Canonicalizes a name field for uniqueness comparisons: trimmed and
/// case-folded, so "Karpov" and "karpov " collide on insert rather than
/// creating two player rows for the same person.
pub fn canonicalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub id: i64,
    pub last_name: String,
    pub first_names: String,
    pub country_code: Option<String>,
    pub elo: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Site {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotator {
    pub id: i64,
    pub name: String,
}

/// A persisted game row. `moves_blob`/`annotations_blob` are the bit-packed
/// encodings produced by `codec::encode_game`; `time_control_blob` is the
/// length-prefixed little-endian period list.
#[derive(Clone, Debug, Default)]
pub struct GameRecord {
    pub id: i64,
    pub white_id: Option<i64>,
    pub black_id: Option<i64>,
    pub event_id: Option<i64>,
    pub site_id: Option<i64>,
    pub annotator_id: Option<i64>,
    pub round_major: i32,
    pub round_minor: i32,
    pub day: Option<i32>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub result: String,
    pub eco: Option<String>,
    pub time_control_blob: Vec<u8>,
    pub moves_blob: Vec<u8>,
    pub annotations_blob: Vec<u8>,
    pub partial_flag: bool,
}

/// One row of the opening-tree index: a position hash reached by `game_id`
/// at some ply, the move played from it, and whether that position is a
/// known "book" terminal line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpeningTreeRow {
    pub hash_key: u64,
    pub game_id: i64,
    pub move_bits: u32,
    pub score: i32,
    pub last_move_flag: bool,
}
