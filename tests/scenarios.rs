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

// End-to-end exercises of the public position/move-generation surface,
// as opposed to the unit tests living alongside each module.

use shogi_sharp::defs::SFEN_START_POSITION;
use shogi_sharp::movegen::defs::{MoveList, MoveType};
use shogi_sharp::movegen::mate1::find_mate_in_one;
use shogi_sharp::movegen::MoveGenerator;
use shogi_sharp::position::attacks::AttackTables;
use shogi_sharp::position::defs::{square_of, Move, PieceType};
use shogi_sharp::position::repetition::Repetition;
use shogi_sharp::position::zobrist::ZobristRandoms;
use shogi_sharp::Position;
use shogi_sharp::misc::parse::{parse_move, PotentialMove};
use std::sync::Arc;

fn fresh(sfen: &str) -> Position {
    let mut pos = Position::new(Arc::new(AttackTables::new()), Arc::new(ZobristRandoms::new()));
    pos.set_sfen(sfen).unwrap();
    pos
}

// Finds the legal move matching a USI move string, the same way the
// engine's `position ... moves ...` handling does, without reaching
// into the engine crate's private matcher.
fn find_and_play(pos: &mut Position, mg: &MoveGenerator, usi: &str) -> Move {
    let potential = parse_move(usi).unwrap_or_else(|| panic!("unparsable move: {usi}"));
    let mut list = MoveList::new();
    mg.generate_moves(pos, &mut list, MoveType::Legal);
    let mv = list
        .iter()
        .copied()
        .find(|&mv| match potential {
            PotentialMove::Board { from, to, promote } => {
                !mv.is_drop() && mv.from() == from && mv.to() == to && mv.is_promotion() == promote
            }
            PotentialMove::Drop { piece_type, to } => mv.is_drop() && mv.dropped_piece_type() == piece_type && mv.to() == to,
        })
        .unwrap_or_else(|| panic!("{usi} is not legal in this position"));
    pos.do_move(mv);
    mv
}

#[test]
fn initial_position_has_thirty_legal_moves() {
    let mut pos = fresh(SFEN_START_POSITION);
    let mg = MoveGenerator::new();
    let mut list = MoveList::new();
    mg.generate_moves(&pos, &mut list, MoveType::Legal);
    assert_eq!(list.len(), 30);
    assert!(list.iter().next().is_some());
}

#[test]
fn mate_in_one_is_found_when_it_exists() {
    // King boxed into the corner by its own pawn and a silver; dropping
    // gold at the one remaining adjacent square is check with no escape,
    // capture or block, since nothing recaptures the gold.
    let pos = fresh("k1S6/1p7/9/9/9/9/9/9/8K b G 1");
    let mv = find_mate_in_one(&pos).expect("mate in one should be found");
    assert!(mv.is_drop());
    assert_eq!(mv.piece_type(), PieceType::GOLD);
}

#[test]
fn mate_in_one_is_absent_when_king_can_step_away() {
    let pos = fresh("4k4/9/9/9/9/9/9/9/3RK4 b - 1");
    assert!(find_mate_in_one(&pos).is_none());
}

#[test]
fn undoing_a_sequence_restores_the_starting_key() {
    let mut pos = fresh(SFEN_START_POSITION);
    let start_key = pos.key();
    let start_sfen = pos.to_sfen();
    let mg = MoveGenerator::new();

    find_and_play(&mut pos, &mg, "7g7f");
    find_and_play(&mut pos, &mg, "3c3d");
    find_and_play(&mut pos, &mg, "7f7e");

    assert_ne!(pos.key(), start_key);

    pos.undo_move();
    pos.undo_move();
    pos.undo_move();

    assert_eq!(pos.key(), start_key);
    assert_eq!(pos.to_sfen(), start_sfen);
}

#[test]
fn sliding_onto_the_kings_file_gives_check() {
    // Black rook starts a file away from the white king, so the position
    // is legal (white isn't already in check), then slides sideways onto
    // the king's file with a clear path: a genuine new check, not a
    // capture of the king itself.
    let mut pos = fresh("7k1/9/6R2/9/9/9/9/9/K8 b - 1");
    let mv = Move::new_board_move(square_of(2, 6), square_of(2, 7), false, PieceType::ROOK, PieceType::NONE);
    assert!(pos.gives_check(mv));
}

#[test]
fn fourfold_repetition_with_no_checks_is_a_draw() {
    let mut pos = fresh("4k4/9/9/9/4R4/9/9/9/4K4 b - 1");
    let rook_out = Move::new_board_move(square_of(4, 4), square_of(3, 4), false, PieceType::ROOK, PieceType::NONE);
    let rook_back = Move::new_board_move(square_of(3, 4), square_of(4, 4), false, PieceType::ROOK, PieceType::NONE);
    let king_out = Move::new_board_move(square_of(0, 4), square_of(0, 3), false, PieceType::KING, PieceType::NONE);
    let king_back = Move::new_board_move(square_of(0, 3), square_of(0, 4), false, PieceType::KING, PieceType::NONE);

    for _ in 0..3 {
        pos.do_move(rook_out);
        pos.do_move(king_out);
        pos.do_move(rook_back);
        pos.do_move(king_back);
    }

    assert_eq!(pos.detect_repetition(), Repetition::Draw);
}
