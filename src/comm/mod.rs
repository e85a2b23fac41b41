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

// USI protocol front end. A background reader thread turns stdin lines
// into `CommReport`s delivered over a crossbeam channel; the engine's main
// loop answers by calling `send`, which formats and writes to stdout
// directly. There is only one protocol today (USI), but the split mirrors
// how the teacher keeps its own UCI implementation behind this same
// `Comm`/`CommReport`/`CommControl` boundary so a second protocol could be
// added as a sibling module without touching the engine.

pub mod usi;

use crate::position::defs::Move;
use crossbeam_channel::{Receiver, Sender};
use std::io;
use std::thread::JoinHandle;

use self::usi::UsiReport;

#[derive(PartialEq, Clone, Debug)]
pub enum CommReport {
    Usi(UsiReport),
}

pub enum CommControl {
    Identify,
    Ready,
    BestMove(Move, Option<Move>),
    SearchCurrentInfo(crate::search::defs::SearchReport),
    InfoString(String),
    Quit,
}

pub struct Comm {
    input_handle: Option<JoinHandle<()>>,
    report_tx: Option<Sender<CommReport>>,
}

impl Comm {
    pub fn new() -> Self {
        Self { input_handle: None, report_tx: None }
    }

    // Spawns the stdin reader thread and returns the receiving end of its
    // channel; the engine's main loop owns that receiver from here on.
    pub fn init(&mut self) -> Receiver<CommReport> {
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<CommReport>();
        self.report_tx = Some(report_tx.clone());

        let handle = std::thread::spawn(move || {
            let mut line = String::new();
            loop {
                line.clear();
                match io::stdin().read_line(&mut line) {
                    Ok(0) => {
                        let _ = report_tx.send(CommReport::Usi(UsiReport::Quit));
                        break;
                    }
                    Ok(_) => {
                        let report = usi::parse(line.trim());
                        let is_quit = report == UsiReport::Quit;
                        let _ = report_tx.send(CommReport::Usi(report));
                        if is_quit {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        self.input_handle = Some(handle);
        report_rx
    }

    pub fn send(&self, control: CommControl) {
        usi::write(control);
    }

    pub fn shutdown(&mut self) {
        if let Some(h) = self.input_handle.take() {
            let _ = h.join();
        }
    }
}

impl Default for Comm {
    fn default() -> Self {
        Self::new()
    }
}
