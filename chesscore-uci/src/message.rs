//! The UCI message taxonomy: closed tagged unions dispatched on
//! their tag, never an inheritance hierarchy.

use chesscore::Move;

use crate::options::UciOptionDescriptor;

/// GUI → engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiMessage {
    Uci,
    Debug(bool),
    IsReady,
    Register(Registration),
    SetOption { name: String, value: Option<String> },
    NewGame,
    Position { start: PositionRoot, moves: Vec<Move> },
    Go(GoParams),
    Stop,
    PonderHit,
    Quit,
    /// Escape hatch for UCI extensions not in the taxonomy above: sent
    /// verbatim as a single line.
    Custom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Name(String),
    Later,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionRoot {
    Startpos,
    Fen(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoParams {
    pub search_moves: Vec<Move>,
    pub ponder: bool,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub moves_to_go: Option<u32>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub mate: Option<u32>,
    pub move_time_ms: Option<u64>,
    pub infinite: bool,
}

/// Engine → GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    Id { name: Option<String>, author: Option<String> },
    UciOk,
    ReadyOk,
    RegistrationError,
    BestMove { mv: Move, ponder: Option<Move> },
    InfoSearch(SearchInfo),
    InfoString(String),
    Option(UciOptionDescriptor),
    /// A heartbeat the driver synthesizes internally so a caller blocked
    /// on `from_engine` can distinguish "nothing yet" from "still alive".
    MainloopAlive,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub score_cp: Option<i32>,
    pub score_mate: Option<i32>,
    pub pv: Vec<Move>,
}
