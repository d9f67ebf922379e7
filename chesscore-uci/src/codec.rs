//! Translates between typed messages and UCI wire text
//! lines: line-based, lower-case tokens, optional
//! whitespace.

use chesscore::Move;

use crate::error::{DriverError, Result};
use crate::message::{EngineMessage, GoParams, GuiMessage, PositionRoot, Registration, SearchInfo};
use crate::options::UciOptionDescriptor;

/// Renders a `GuiMessage` as the UCI command line(s) to write to the
/// engine's stdin. Never includes the trailing newline (the I/O loop adds
/// it). An empty return means "nothing to send" and the driver's I/O loop
/// treats it as a serialization error.
pub fn format_gui_message(msg: &GuiMessage) -> String {
    match msg {
        GuiMessage::Uci => "uci".to_string(),
        GuiMessage::Debug(on) => format!("debug {}", if *on { "on" } else { "off" }),
        GuiMessage::IsReady => "isready".to_string(),
        GuiMessage::Register(Registration::Later) => "register later".to_string(),
        GuiMessage::Register(Registration::Name(name)) => format!("register name {name}"),
        GuiMessage::SetOption { name, value } => match value {
            Some(v) => format!("setoption name {name} value {v}"),
            None => format!("setoption name {name}"),
        },
        GuiMessage::NewGame => "ucinewgame".to_string(),
        GuiMessage::Position { start, moves } => format_position(start, moves),
        GuiMessage::Go(params) => format_go(params),
        GuiMessage::Stop => "stop".to_string(),
        GuiMessage::PonderHit => "ponderhit".to_string(),
        GuiMessage::Quit => "quit".to_string(),
        GuiMessage::Custom(raw) => raw.clone(),
    }
}

fn format_position(start: &PositionRoot, moves: &[Move]) -> String {
    let mut s = match start {
        PositionRoot::Startpos => "position startpos".to_string(),
        PositionRoot::Fen(fen) => format!("position fen {fen}"),
    };
    if !moves.is_empty() {
        s.push_str(" moves");
        for mv in moves {
            s.push(' ');
            s.push_str(&mv.to_uci());
        }
    }
    s
}

fn format_go(params: &GoParams) -> String {
    let mut parts = vec!["go".to_string()];
    if params.infinite {
        parts.push("infinite".to_string());
    }
    if params.ponder {
        parts.push("ponder".to_string());
    }
    if !params.search_moves.is_empty() {
        parts.push("searchmoves".to_string());
        for mv in &params.search_moves {
            parts.push(mv.to_uci());
        }
    }
    macro_rules! opt_field {
        ($field:expr, $keyword:literal) => {
            if let Some(v) = $field {
                parts.push($keyword.to_string());
                parts.push(v.to_string());
            }
        };
    }
    opt_field!(params.wtime_ms, "wtime");
    opt_field!(params.btime_ms, "btime");
    opt_field!(params.winc_ms, "winc");
    opt_field!(params.binc_ms, "binc");
    opt_field!(params.moves_to_go, "movestogo");
    opt_field!(params.depth, "depth");
    opt_field!(params.nodes, "nodes");
    opt_field!(params.mate, "mate");
    opt_field!(params.move_time_ms, "movetime");
    parts.join(" ")
}

/// Parses one complete engine→GUI line. Unrecognised tokens become
/// `InfoString`, never a hard parse error — the engine side of the
/// wire is adversarial input the driver must never choke on.
pub fn parse_engine_line(line: &str) -> Result<EngineMessage> {
    let line = line.trim();
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else {
        return Ok(EngineMessage::InfoString(String::new()));
    };
    let rest: Vec<&str> = tokens.collect();

    match first {
        "id" => Ok(parse_id(&rest)),
        "uciok" => Ok(EngineMessage::UciOk),
        "readyok" => Ok(EngineMessage::ReadyOk),
        "registration" if rest.first() == Some(&"error") => Ok(EngineMessage::RegistrationError),
        "bestmove" => parse_bestmove(&rest),
        "info" => Ok(parse_info(&rest, line)),
        "option" => {
            let descriptor = UciOptionDescriptor::parse_line(&rest.join(" "))?;
            Ok(EngineMessage::Option(descriptor))
        }
        _ => Ok(EngineMessage::InfoString(line.to_string())),
    }
}

fn parse_id(rest: &[&str]) -> EngineMessage {
    match rest.first() {
        Some(&"name") => EngineMessage::Id { name: Some(rest[1..].join(" ")), author: None },
        Some(&"author") => EngineMessage::Id { name: None, author: Some(rest[1..].join(" ")) },
        _ => EngineMessage::Id { name: None, author: None },
    }
}

fn parse_bestmove(rest: &[&str]) -> Result<EngineMessage> {
    let mv_str = rest
        .first()
        .ok_or_else(|| DriverError::parse("bestmove missing a move"))?;
    let mv = Move::from_uci(mv_str)?;
    let ponder = match rest.get(1) {
        Some(&"ponder") => rest.get(2).map(|s| Move::from_uci(s)).transpose()?,
        _ => None,
    };
    Ok(EngineMessage::BestMove { mv, ponder })
}

fn parse_info(rest: &[&str], full_line: &str) -> EngineMessage {
    // "info string ..." is freeform text to the end of the line.
    if rest.first() == Some(&"string") {
        let prefix_len = full_line.find("string").unwrap_or(0) + "string".len();
        return EngineMessage::InfoString(full_line[prefix_len..].trim().to_string());
    }

    let mut info = SearchInfo::default();
    let mut idx = 0;
    while idx < rest.len() {
        match rest[idx] {
            "depth" => idx = take_u32(rest, idx, &mut info.depth),
            "seldepth" => idx = take_u32(rest, idx, &mut info.seldepth),
            "time" => idx = take_u64(rest, idx, &mut info.time_ms),
            "nodes" => idx = take_u64(rest, idx, &mut info.nodes),
            "nps" => idx = take_u64(rest, idx, &mut info.nps),
            "score" => {
                idx += 1;
                match rest.get(idx) {
                    Some(&"cp") => {
                        idx += 1;
                        if let Some(v) = rest.get(idx).and_then(|t| t.parse().ok()) {
                            info.score_cp = Some(v);
                            idx += 1;
                        }
                    }
                    Some(&"mate") => {
                        idx += 1;
                        if let Some(v) = rest.get(idx).and_then(|t| t.parse().ok()) {
                            info.score_mate = Some(v);
                            idx += 1;
                        }
                    }
                    _ => {}
                }
            }
            "pv" => {
                idx += 1;
                while idx < rest.len() {
                    match Move::from_uci(rest[idx]) {
                        Ok(mv) => info.pv.push(mv),
                        Err(_) => break,
                    }
                    idx += 1;
                }
            }
            _ => idx += 1,
        }
    }
    EngineMessage::InfoSearch(info)
}

fn take_u32(rest: &[&str], idx: usize, out: &mut Option<u32>) -> usize {
    if let Some(v) = rest.get(idx + 1).and_then(|t| t.parse().ok()) {
        *out = Some(v);
        idx + 2
    } else {
        idx + 1
    }
}

fn take_u64(rest: &[&str], idx: usize, out: &mut Option<u64>) -> usize {
    if let Some(v) = rest.get(idx + 1).and_then(|t| t.parse().ok()) {
        *out = Some(v);
        idx + 2
    } else {
        idx + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_position_with_moves() {
        let moves = vec![Move::from_uci("e2e4").unwrap(), Move::from_uci("e7e5").unwrap()];
        let line = format_gui_message(&GuiMessage::Position {
            start: PositionRoot::Startpos,
            moves,
        });
        assert_eq!(line, "position startpos moves e2e4 e7e5");
    }

    #[test]
    fn formats_go_with_clock() {
        let params = GoParams {
            wtime_ms: Some(30000),
            btime_ms: Some(30000),
            winc_ms: Some(0),
            binc_ms: Some(0),
            ..Default::default()
        };
        let line = format_gui_message(&GuiMessage::Go(params));
        assert_eq!(line, "go wtime 30000 btime 30000 winc 0 binc 0");
    }

    #[test]
    fn parses_bestmove_with_ponder() {
        let msg = parse_engine_line("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            EngineMessage::BestMove { mv, ponder } => {
                assert_eq!(mv.to_uci(), "e2e4");
                assert_eq!(ponder.unwrap().to_uci(), "e7e5");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_info_search_line() {
        let msg = parse_engine_line(
            "info depth 12 seldepth 18 score cp 34 nodes 12345 nps 500000 time 24 pv e2e4 e7e5",
        )
        .unwrap();
        match msg {
            EngineMessage::InfoSearch(info) => {
                assert_eq!(info.depth, Some(12));
                assert_eq!(info.score_cp, Some(34));
                assert_eq!(info.pv.len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_info_string_line() {
        let msg = parse_engine_line("info string NNUE evaluation enabled").unwrap();
        assert_eq!(msg, EngineMessage::InfoString("NNUE evaluation enabled".to_string()));
    }

    #[test]
    fn unrecognised_line_becomes_info_string() {
        let msg = parse_engine_line("somethingweird 1 2 3").unwrap();
        assert_eq!(msg, EngineMessage::InfoString("somethingweird 1 2 3".to_string()));
    }
}
