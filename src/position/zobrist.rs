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

use super::defs::{PieceType, Square, NR_SQUARES};
use crate::defs::Sides;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub type ZobristKey = u64;

pub struct ZobristRandoms {
    piece: [[[ZobristKey; NR_SQUARES]; PieceType::COUNT]; Sides::BOTH],
    hand: [[ZobristKey; 19]; PieceType::COUNT], // count 0..=18 covers every hand-piece maximum
    // Both of these are single dedicated random constants, not a bit
    // carved out of every other key. `side_to_move` is XORed in on every
    // swap_side; `exclusion` is XORed in only while probing the
    // transposition table during a singular-extension search, so that
    // search does not see (and potentially cut on) the ordinary entry for
    // the same position.
    side_to_move: ZobristKey,
    exclusion: ZobristKey,
}

impl ZobristRandoms {
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5A6F_6272_6973_7421);
        let mut piece = [[[0u64; NR_SQUARES]; PieceType::COUNT]; Sides::BOTH];
        for side in piece.iter_mut() {
            for pt in side.iter_mut() {
                for key in pt.iter_mut() {
                    *key = rng.next_u64();
                }
            }
        }
        let mut hand = [[0u64; 19]; PieceType::COUNT];
        for pt in hand.iter_mut() {
            for key in pt.iter_mut() {
                *key = rng.next_u64();
            }
        }
        ZobristRandoms {
            piece,
            hand,
            side_to_move: rng.next_u64(),
            exclusion: rng.next_u64(),
        }
    }

    pub fn piece(&self, side: usize, piece_type: usize, square: Square) -> ZobristKey {
        self.piece[side][piece_type][square]
    }

    pub fn hand(&self, side: usize, piece_type: usize, count: u32) -> ZobristKey {
        if count == 0 {
            0
        } else {
            self.hand[piece_type][count as usize] ^ (side as u64)
        }
    }

    pub fn side_to_move(&self) -> ZobristKey {
        self.side_to_move
    }

    pub fn exclusion(&self) -> ZobristKey {
        self.exclusion
    }
}

impl Default for ZobristRandoms {
    fn default() -> Self {
        ZobristRandoms::new()
    }
}
