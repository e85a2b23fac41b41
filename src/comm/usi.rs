/* =======================================================================
Rustic is a chess playing engine.
Copyright (C) 2019-2024, Marcel Vanthoor
https://rustic-chess.org/

Rustic is written in the Rust programming language. It is an original
work, not derived from any engine that came before it. However, it does
use a lot of concepts which are well-known and are in use by most if not
all classical alpha/beta-based chess engines.

Rustic is free software: you can redistribute it and/or modify it under
the terms of the GNU General Public License version 3 as published by
the Free Software Foundation.

Rustic is distributed in the hope that it will be useful, but WITHOUT
ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License
for more details.

You should have received a copy of the GNU General Public License along
with this program.  If not, see <http://www.gnu.org/licenses/>.
======================================================================= */

use super::CommControl;
use crate::defs::About;
use crate::engine::defs::EngineOptionName;
use crate::position::defs::Move;
use crate::search::defs::{GameTime, ReportBound, SearchReport};

#[derive(PartialEq, Clone, Debug)]
pub enum UsiReport {
    Usi,
    IsReady,
    UsiNewGame,
    SetOption(EngineOptionName),
    Position(String, Vec<String>),
    GoInfinite,
    GoDepth(i8),
    GoMoveTime(u128),
    GoNodes(usize),
    GoGameTime(GameTime),
    GoPonder(GameTime),
    Stop,
    PonderHit,
    GameOver,
    Quit,
    Unknown,
}

pub fn parse(line: &str) -> UsiReport {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("usi") => UsiReport::Usi,
        Some("isready") => UsiReport::IsReady,
        Some("usinewgame") => UsiReport::UsiNewGame,
        Some("setoption") => parse_setoption(tokens),
        Some("position") => parse_position(tokens),
        Some("go") => parse_go(tokens),
        Some("stop") => UsiReport::Stop,
        Some("ponderhit") => UsiReport::PonderHit,
        Some("gameover") => UsiReport::GameOver,
        Some("quit") => UsiReport::Quit,
        _ => UsiReport::Unknown,
    }
}

fn parse_setoption<'a>(mut tokens: impl Iterator<Item = &'a str>) -> UsiReport {
    // "setoption name <name...> value <value...>"; the name can contain
    // spaces, so everything between "name" and "value" is joined back.
    if tokens.next() != Some("name") {
        return UsiReport::SetOption(EngineOptionName::Nothing);
    }
    let mut name_parts = Vec::new();
    let mut value_parts = Vec::new();
    let mut in_value = false;
    for t in tokens {
        if t == "value" {
            in_value = true;
            continue;
        }
        if in_value {
            value_parts.push(t);
        } else {
            name_parts.push(t);
        }
    }
    let name = name_parts.join(" ");
    let value = value_parts.join(" ");

    let option = match name.as_str() {
        EngineOptionName::HASH => EngineOptionName::Hash(value),
        EngineOptionName::CLEAR_HASH => EngineOptionName::ClearHash,
        EngineOptionName::THREADS => EngineOptionName::Threads(value),
        EngineOptionName::MULTI_PV => EngineOptionName::MultiPv(value),
        EngineOptionName::USI_PONDER => EngineOptionName::UsiPonder(value),
        EngineOptionName::OWN_BOOK => EngineOptionName::OwnBook(value),
        EngineOptionName::BOOK_FILE => EngineOptionName::BookFile(value),
        EngineOptionName::BEST_BOOK_MOVE => EngineOptionName::BestBookMove(value),
        EngineOptionName::MIN_BOOK_SCORE => EngineOptionName::MinBookScore(value),
        EngineOptionName::CONTEMPT => EngineOptionName::Contempt(value),
        EngineOptionName::BYOYOMI_MARGIN => EngineOptionName::ByoyomiMargin(value),
        _ => EngineOptionName::Nothing,
    };
    UsiReport::SetOption(option)
}

fn parse_position<'a>(mut tokens: impl Iterator<Item = &'a str>) -> UsiReport {
    let first = match tokens.next() {
        Some(t) => t,
        None => return UsiReport::Unknown,
    };

    let sfen = if first == "startpos" {
        crate::defs::SFEN_START_POSITION.to_string()
    } else if first == "sfen" {
        let fields: Vec<&str> = (&mut tokens).take_while(|&t| t != "moves").collect();
        fields.join(" ")
    } else {
        return UsiReport::Unknown;
    };

    // take_while above already consumed the "moves" token when sfen-form
    // is used; for startpos, "moves" (if present) is still ahead of us.
    let mut moves = Vec::new();
    let mut rest = tokens.peekable();
    if first == "startpos" {
        if rest.peek() == Some(&"moves") {
            rest.next();
        }
    }
    for t in rest {
        moves.push(t.to_string());
    }

    UsiReport::Position(sfen, moves)
}

fn parse_go<'a>(tokens: impl Iterator<Item = &'a str>) -> UsiReport {
    let tokens: Vec<&str> = tokens.collect();
    if tokens.first() == Some(&"infinite") {
        return UsiReport::GoInfinite;
    }

    let mut depth: Option<i8> = None;
    let mut movetime: Option<u128> = None;
    let mut nodes: Option<usize> = None;
    let mut gt = GameTime::default();
    let mut ponder = false;
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "ponder" => ponder = true,
            "depth" => {
                depth = tokens.get(i + 1).and_then(|v| v.parse().ok());
                i += 1;
            }
            "movetime" => {
                movetime = tokens.get(i + 1).and_then(|v| v.parse().ok());
                i += 1;
            }
            "nodes" => {
                nodes = tokens.get(i + 1).and_then(|v| v.parse().ok());
                i += 1;
            }
            "btime" => {
                gt.btime = tokens.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 1;
            }
            "wtime" => {
                gt.wtime = tokens.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 1;
            }
            "binc" => {
                gt.binc = tokens.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 1;
            }
            "winc" => {
                gt.winc = tokens.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 1;
            }
            "byoyomi" => {
                gt.byoyomi = tokens.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 1;
            }
            _ => (),
        }
        i += 1;
    }

    if let Some(d) = depth {
        return UsiReport::GoDepth(d);
    }
    if let Some(ms) = movetime {
        return UsiReport::GoMoveTime(ms);
    }
    if let Some(n) = nodes {
        return UsiReport::GoNodes(n);
    }
    if ponder {
        return UsiReport::GoPonder(gt);
    }
    UsiReport::GoGameTime(gt)
}

fn move_to_usi(mv: Move) -> String {
    if mv.is_drop() {
        format!("{}*{}", piece_letter(mv.dropped_piece_type()), square_to_usi(mv.to()))
    } else {
        let promo = if mv.is_promotion() { "+" } else { "" };
        format!("{}{}{}", square_to_usi(mv.from()), square_to_usi(mv.to()), promo)
    }
}

fn square_to_usi(sq: usize) -> String {
    use crate::position::defs::{file_of, rank_of};
    let file_digit = 9 - file_of(sq);
    let rank_letter = (b'a' + rank_of(sq) as u8) as char;
    format!("{file_digit}{rank_letter}")
}

fn piece_letter(pt: usize) -> char {
    use crate::position::defs::PieceType;
    match pt {
        PieceType::PAWN => 'P',
        PieceType::LANCE => 'L',
        PieceType::KNIGHT => 'N',
        PieceType::SILVER => 'S',
        PieceType::GOLD => 'G',
        PieceType::BISHOP => 'B',
        PieceType::ROOK => 'R',
        _ => '?',
    }
}

pub fn write(control: CommControl) {
    match control {
        CommControl::Identify => {
            println!("id name {} {}", About::ENGINE, About::VERSION);
            println!("id author {}", About::AUTHOR);
            println!("option name USI_Hash type spin default 32 min 0 max 65536");
            println!("option name Threads type spin default 1 min 1 max 512");
            println!("option name MultiPV type spin default 1 min 1 max 16");
            println!("option name USI_Ponder type check default false");
            println!("option name OwnBook type check default false");
            println!("option name BookFile type string default <empty>");
            println!("option name Best_Book_Move type check default true");
            println!("option name Min_Book_Score type spin default 0 min -32000 max 32000");
            println!("option name Contempt type spin default 0 min -1000 max 1000");
            println!("option name ByoyomiMargin type spin default 20 min 0 max 60000");
            println!("option name Clear_Hash type button");
            println!("usiok");
        }
        CommControl::Ready => println!("readyok"),
        CommControl::BestMove(mv, ponder) => {
            if mv.is_ok() {
                match ponder {
                    Some(p) => println!("bestmove {} ponder {}", move_to_usi(mv), move_to_usi(p)),
                    None => println!("bestmove {}", move_to_usi(mv)),
                }
            } else {
                println!("bestmove resign");
            }
        }
        CommControl::InfoString(s) => println!("info string {s}"),
        CommControl::SearchCurrentInfo(report) => write_search_report(report),
        CommControl::Quit => (),
    }
}

fn write_search_report(report: SearchReport) {
    match report {
        SearchReport::Iteration { depth, seldepth, score_cp, mate, bound, nodes, nps, time_ms, pv } => {
            let score = match mate {
                Some(m) => format!("mate {m}"),
                None => format!("cp {score_cp}"),
            };
            let bound_str = match bound {
                Some(ReportBound::Upper) => " upperbound",
                Some(ReportBound::Lower) => " lowerbound",
                None => "",
            };
            let pv_str: Vec<String> = pv.into_iter().map(move_to_usi).collect();
            println!(
                "info depth {depth} seldepth {seldepth} score {score}{bound_str} nodes {nodes} nps {nps} time {time_ms} pv {}",
                pv_str.join(" ")
            );
        }
        SearchReport::CurrMove { depth, move_number, current } => {
            println!("info depth {depth} currmove {} currmovenumber {move_number}", move_to_usi(current));
        }
        SearchReport::BestMove { best_move, ponder } => write(CommControl::BestMove(best_move, ponder)),
        SearchReport::InfoString(s) => println!("info string {s}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usi_command_parses_to_the_usi_variant() {
        assert_eq!(parse("usi"), UsiReport::Usi);
    }

    #[test]
    fn position_startpos_with_moves_collects_the_move_list() {
        match parse("position startpos moves 7g7f 3c3d") {
            UsiReport::Position(sfen, moves) => {
                assert_eq!(sfen, crate::defs::SFEN_START_POSITION);
                assert_eq!(moves, vec!["7g7f".to_string(), "3c3d".to_string()]);
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn go_depth_is_recognized_over_a_default_game_time_search() {
        assert_eq!(parse("go depth 6"), UsiReport::GoDepth(6));
    }

    #[test]
    fn unrecognized_commands_parse_to_unknown_rather_than_panicking() {
        assert_eq!(parse("notacommand foo bar"), UsiReport::Unknown);
    }
}
