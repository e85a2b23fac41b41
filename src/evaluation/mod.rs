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

// A thin material-plus-piece-square evaluator. Deliberately not tuned: its
// job is to give search something deterministic to optimise against, not
// to play strong shogi. `Position::material` already tracks board and hand
// material incrementally, so this module only has to add the positional
// term and cache the combined result for the node.

use crate::defs::{Sides, Value};
use crate::position::bitboard::in_promotion_zone;
use crate::position::defs::{file_of, rank_of, PieceType};
use crate::position::Position;

// Per-node cache: a search stack frame embeds one of these so a node that
// gets re-evaluated (e.g. after a failed null-move search falls back to the
// same position) doesn't redo the square-by-square walk. Null-move nodes
// carry their parent's cache forward verbatim, since a null move never
// changes Position's material or piece placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalCache {
    value: Option<Value>,
}

impl EvalCache {
    pub fn new() -> Self {
        EvalCache { value: None }
    }

    pub fn invalidate(&mut self) {
        self.value = None;
    }
}

pub fn evaluate(pos: &Position, cache: &mut EvalCache) -> Value {
    if let Some(v) = cache.value {
        return v;
    }

    let material = pos.material(Sides::BLACK) - pos.material(Sides::WHITE);
    let positional = piece_square_total(pos, Sides::BLACK) - piece_square_total(pos, Sides::WHITE);
    let score = material + positional;

    let from_side_to_move = if pos.us() == Sides::BLACK { score } else { -score };
    cache.value = Some(from_side_to_move);
    from_side_to_move
}

fn piece_square_total(pos: &Position, color: usize) -> Value {
    let mut total = 0;
    for pt in PieceType::PAWN..=PieceType::DRAGON {
        let mut bb = pos.pieces(color, pt);
        while !bb.is_empty() {
            let sq = bb.pop_lsb();
            total += piece_square_value(pt, sq, color);
        }
    }
    total
}

// Centralisation and advancement, computed from board geometry rather than
// a fitted table: the point is to give search a smooth gradient toward
// "reasonable" placement, not to encode real shogi positional knowledge.
fn piece_square_value(pt: usize, sq: usize, color: usize) -> Value {
    let rank = rank_of(sq);
    let file = file_of(sq);
    let center_file_dist = (file as i32 - 4).abs();
    let center_bonus = 4 - center_file_dist;

    let advance = if color == Sides::BLACK { 8 - rank as i32 } else { rank as i32 };

    match pt {
        PieceType::PAWN | PieceType::LANCE => advance * 2,
        PieceType::KNIGHT | PieceType::SILVER | PieceType::BISHOP => center_bonus * 3 + advance,
        PieceType::ROOK => center_bonus * 2,
        PieceType::GOLD | PieceType::PROM_PAWN | PieceType::PROM_LANCE | PieceType::PROM_KNIGHT | PieceType::PROM_SILVER => {
            center_bonus * 2
        }
        PieceType::HORSE | PieceType::DRAGON => center_bonus * 4,
        PieceType::KING => {
            // A king still sheltered behind its own lines, away from the
            // center, is worth a small bonus; one that has wandered into
            // the opponent's camp is not. `promotion_zone(color)` is the
            // zone where `color`'s own pieces promote, i.e. the opponent's
            // home camp, so that is exactly "enemy territory" for this king.
            if in_promotion_zone(sq, color) {
                -20
            } else {
                8 - center_bonus
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::attacks::AttackTables;
    use crate::position::zobrist::ZobristRandoms;
    use crate::defs::SFEN_START_POSITION;
    use std::sync::Arc;

    fn fresh(sfen: &str) -> Position {
        let mut pos = Position::new(Arc::new(AttackTables::new()), Arc::new(ZobristRandoms::new()));
        pos.set_sfen(sfen).unwrap();
        pos
    }

    #[test]
    fn start_position_is_exactly_balanced() {
        let pos = fresh(SFEN_START_POSITION);
        let mut cache = EvalCache::new();
        assert_eq!(evaluate(&pos, &mut cache), 0);
    }

    #[test]
    fn an_extra_rook_in_hand_is_worth_a_large_positive_score_to_its_owner() {
        let pos = fresh("4k4/9/9/9/9/9/9/9/4K4 b R 1");
        let mut cache = EvalCache::new();
        assert!(evaluate(&pos, &mut cache) > 900);
    }

    #[test]
    fn cache_returns_the_stashed_value_without_recomputing() {
        let pos = fresh(SFEN_START_POSITION);
        let mut cache = EvalCache::new();
        let first = evaluate(&pos, &mut cache);
        cache.value = Some(first + 12345);
        assert_eq!(evaluate(&pos, &mut cache), first + 12345);
    }

    #[test]
    fn evaluation_flips_sign_with_side_to_move() {
        let black_to_move = fresh("4k4/9/9/9/9/9/9/9/4K4 b R 1");
        let white_to_move = fresh("4k4/9/9/9/9/9/9/9/4K4 w R 1");
        let mut c1 = EvalCache::new();
        let mut c2 = EvalCache::new();
        assert_eq!(evaluate(&black_to_move, &mut c1), -evaluate(&white_to_move, &mut c2));
    }
}
