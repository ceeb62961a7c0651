use std::fmt::{self, Display, Formatter, Write};

use serde::Serialize;
use sweepbot_core::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Won,
    Lost,
    /// Stopped before the game ended.
    Dnf,
}

/// Actions taken over a game.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Moves {
    pub cycles: usize,
    pub reveals: usize,
    pub flags: usize,
    pub chords: usize,
    pub guesses: usize,
}

impl Moves {
    pub fn add(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.reveals += report.count(ActionKind::Reveal);
        self.flags += report.count(ActionKind::Flag);
        self.chords += report.count(ActionKind::Chord);
        self.guesses += report.count(ActionKind::Guess);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameSummary {
    pub seed: u64,
    pub result: GameResult,
    pub moves: Moves,
    pub revealed: CellCount,
    pub safe_tiles: CellCount,
    pub seconds: f64,
}

impl GameSummary {
    pub fn clearance_rate(&self) -> f64 {
        f64::from(self.revealed) / f64::from(self.safe_tiles.max(1))
    }
}

impl Display for GameSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} in {:.3}s (seed: {}), {}/{} tiles revealed ({:.1}%), {} guesses over {} cycles",
            self.result,
            self.seconds,
            self.seed,
            self.revealed,
            self.safe_tiles,
            100.0 * self.clearance_rate(),
            self.moves.guesses,
            self.moves.cycles,
        )
    }
}

/// Win/loss tally over many games.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    pub config: GameConfig,
    pub won: usize,
    pub lost: usize,
    pub dnf: usize,
    pub revealed: u64,
    pub safe_tiles: u64,
    pub seconds: f64,
    pub longest_game: f64,
    pub games: Vec<GameSummary>,
}

impl Record {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            won: 0,
            lost: 0,
            dnf: 0,
            revealed: 0,
            safe_tiles: 0,
            seconds: 0.0,
            longest_game: 0.0,
            games: Vec::new(),
        }
    }

    pub fn add(&mut self, summary: GameSummary) {
        match summary.result {
            GameResult::Won => self.won += 1,
            GameResult::Lost => self.lost += 1,
            GameResult::Dnf => self.dnf += 1,
        }
        self.revealed += u64::from(summary.revealed);
        self.safe_tiles += u64::from(summary.safe_tiles);
        self.seconds += summary.seconds;
        self.longest_game = self.longest_game.max(summary.seconds);
        self.games.push(summary);
    }

    pub fn played(&self) -> usize {
        self.won + self.lost + self.dnf
    }

    pub fn win_rate(&self) -> f64 {
        self.won as f64 / self.played().max(1) as f64
    }

    pub fn clearance_rate(&self) -> f64 {
        self.revealed as f64 / self.safe_tiles.max(1) as f64
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.config.size;
        write!(
            f,
            "{}-{}-{} on {rows}x{cols} with {} mines ({:.2}% win rate, {:.2}% tiles cleared), \
             {:.3}s per game, longest game took {:.3}s",
            self.won,
            self.lost,
            self.dnf,
            self.config.mines,
            100.0 * self.win_rate(),
            100.0 * self.clearance_rate(),
            self.seconds / self.played().max(1) as f64,
            self.longest_game,
        )
    }
}

/// One line per row: `#` hidden, `F` flagged, `.` empty, digits for counts. After a loss the
/// triggered mine is `*` and other unflagged mines are `x`.
pub fn render_board(board: &Board) -> Vec<String> {
    let (rows, cols) = board.size();
    let lost = board.status() == GameStatus::Lost;

    (0..rows)
        .map(|row| {
            let mut line = String::with_capacity(usize::from(cols));
            for col in 0..cols {
                let pos = (row, col);
                let glyph = match board.state_of(pos) {
                    _ if lost && board.triggered_mine() == Some(pos) => '*',
                    TileState::Hidden if lost && board.has_mine_at(pos) => 'x',
                    TileState::Hidden => '#',
                    TileState::Flagged => 'F',
                    TileState::Revealed(0) => '.',
                    TileState::Revealed(count) => char::from(b'0' + count),
                };
                line.push(glyph);
            }
            line
        })
        .collect()
}

pub fn render_text(board: &Board, summary: &GameSummary) -> String {
    let mut out = String::new();
    for line in render_board(board) {
        let _ = writeln!(out, "{line}");
    }
    let _ = write!(out, "{summary}");
    out
}
