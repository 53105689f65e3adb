//! Rule-based players
//!
//! A [`StrategyChain`] tries pure heuristics in a fixed order and plays the
//! first cell any of them proposes. A proposal that is not a free cell counts
//! as no proposal. None of this touches the value table.

use log::trace;
use rand::{rngs::StdRng, seq::IndexedRandom};

use crate::tictactoe::{BoardState, Cell, LineAnalyzer, Player, coord_to_index};

/// A heuristic proposing a cell for `mark`, or `None` when it does not apply.
pub type Strategy = fn(&BoardState, Player, &mut StdRng) -> Option<usize>;

/// Named corner and edge cells of a square board.
struct Geometry {
    size: usize,
    last: usize,
    mid: usize,
}

impl Geometry {
    fn of(state: &BoardState) -> Self {
        let size = state.size();
        Self {
            size,
            last: size - 1,
            mid: size / 2,
        }
    }

    fn at(&self, row: usize, col: usize) -> usize {
        coord_to_index(row, col, self.size)
    }

    fn center(&self) -> usize {
        self.at(self.mid, self.mid)
    }

    /// Corners clockwise from top-left as (corner, diagonally opposite corner).
    fn corners(&self) -> [(usize, usize); 4] {
        let tl = self.at(0, 0);
        let bl = self.at(self.last, 0);
        let br = self.at(self.last, self.last);
        let tr = self.at(0, self.last);
        [(tl, br), (bl, tr), (br, tl), (tr, bl)]
    }

    /// The two edge cells next to each corner, same order as `corners`.
    fn corner_neighbours(&self) -> [[usize; 2]; 4] {
        let (l, n) = (self.last, self.last.saturating_sub(1));
        [
            [self.at(1, 0), self.at(0, 1)],
            [self.at(n, 0), self.at(l, 1)],
            [self.at(n, l), self.at(l, n)],
            [self.at(0, n), self.at(1, l)],
        ]
    }

    fn edge_midpoints(&self) -> [usize; 4] {
        [
            self.at(0, self.mid),
            self.at(self.mid, 0),
            self.at(self.mid, self.last),
            self.at(self.last, self.mid),
        ]
    }
}

fn is_free(state: &BoardState, index: usize) -> bool {
    state.cell(index) == Some(Cell::Empty)
}

fn holds(state: &BoardState, index: usize, player: Player) -> bool {
    state.cell(index) == Some(player.to_cell())
}

fn first_free(state: &BoardState, candidates: &[usize]) -> Option<usize> {
    candidates.iter().copied().find(|&i| is_free(state, i))
}

/// Corner-first fallback: a random corner of a free diagonal pair, else the
/// first free corner.
fn free_corner(state: &BoardState, geometry: &Geometry, rng: &mut StdRng) -> Option<usize> {
    let corners = geometry.corners();
    for (corner, opposite) in &corners[..2] {
        if is_free(state, *corner) && is_free(state, *opposite) {
            return [*corner, *opposite].choose(rng).copied();
        }
    }
    first_free(state, &corners.map(|(corner, _)| corner))
}

/// Complete one of our own lines.
pub fn final_attack(state: &BoardState, mark: Player, _rng: &mut StdRng) -> Option<usize> {
    LineAnalyzer::find_best_step(state, mark)
}

/// Block the opponent's completing cell.
pub fn final_defense(state: &BoardState, mark: Player, _rng: &mut StdRng) -> Option<usize> {
    LineAnalyzer::find_best_step(state, mark.opponent())
}

/// Take the center, then guard against the opponent setting up two threats
/// at once from opposite corners or from a row and column sharing a corner.
pub fn two_side_defense(state: &BoardState, mark: Player, _rng: &mut StdRng) -> Option<usize> {
    let geometry = Geometry::of(state);
    let center = geometry.center();
    if is_free(state, center) {
        return Some(center);
    }
    if !holds(state, center, mark) {
        return None;
    }

    let opponent = mark.opponent();
    let corners = geometry.corners();
    let opposite_corners = corners[..2]
        .iter()
        .any(|&(a, b)| holds(state, a, opponent) && holds(state, b, opponent));
    if opposite_corners && let Some(edge) = first_free(state, &geometry.edge_midpoints()) {
        return Some(edge);
    }

    let last = geometry.last;
    let in_row_0 = state.contains_in_row(0, opponent);
    let in_row_last = state.contains_in_row(last, opponent);
    let in_col_0 = state.contains_in_column(0, opponent);
    let in_col_last = state.contains_in_column(last, opponent);
    let corner = if in_col_0 && in_row_0 {
        geometry.at(0, 0)
    } else if in_col_0 && in_row_last {
        geometry.at(last, 0)
    } else if in_col_last && in_row_0 {
        geometry.at(0, last)
    } else if in_col_last && in_row_last {
        geometry.at(last, last)
    } else {
        return None;
    };
    Some(corner)
}

/// Hold the center and build a fork from it through a corner.
pub fn center_corner_attack(state: &BoardState, mark: Player, rng: &mut StdRng) -> Option<usize> {
    let geometry = Geometry::of(state);
    let center = geometry.center();

    let from_center = if is_free(state, center) {
        Some(center)
    } else if holds(state, center, mark) {
        // Only the first corner we hold is considered.
        geometry
            .corners()
            .iter()
            .zip(geometry.corner_neighbours())
            .find(|((corner, _), _)| holds(state, *corner, mark))
            .and_then(|(_, neighbours)| first_free(state, &neighbours))
    } else {
        None
    };

    from_center.or_else(|| free_corner(state, &geometry, rng))
}

/// Hold a corner and take the diagonally opposite one.
pub fn two_side_attack(state: &BoardState, mark: Player, _rng: &mut StdRng) -> Option<usize> {
    let geometry = Geometry::of(state);
    let corners = geometry.corners();
    corners
        .iter()
        .find(|(corner, _)| holds(state, *corner, mark))
        .and_then(|&(_, opposite)| first_free(state, &[opposite]))
        .or_else(|| first_free(state, &corners.map(|(corner, _)| corner)))
}

/// Any free cell.
pub fn random_play(state: &BoardState, _mark: Player, rng: &mut StdRng) -> Option<usize> {
    state.available_actions().choose(rng).copied()
}

/// Ordered list of strategies; the first valid proposal wins.
#[derive(Clone)]
pub struct StrategyChain {
    strategies: Vec<(&'static str, Strategy)>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append `strategy` at the lowest priority.
    pub fn with(mut self, name: &'static str, strategy: Strategy) -> Self {
        self.strategies.push((name, strategy));
        self
    }

    /// Win if possible, otherwise play anywhere.
    pub fn random_player() -> Self {
        Self::new()
            .with("final-attack", final_attack)
            .with("random-play", random_play)
    }

    /// Full heuristic player that wins, blocks and sets traps.
    pub fn sophisticated() -> Self {
        Self::new()
            .with("final-attack", final_attack)
            .with("final-defense", final_defense)
            .with("two-side-defense", two_side_defense)
            .with("center-corner-attack", center_corner_attack)
            .with("two-side-attack", two_side_attack)
            .with("random-play", random_play)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|(name, _)| *name)
    }

    /// Cell chosen for `mark`, or `None` only when no strategy applies.
    pub fn play(&self, state: &BoardState, mark: Player, rng: &mut StdRng) -> Option<usize> {
        self.strategies.iter().find_map(|(name, strategy)| {
            let proposal = strategy(state, mark, rng).filter(|&cell| is_free(state, cell))?;
            trace!("{name} proposes cell {proposal}");
            Some(proposal)
        })
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::sophisticated()
    }
}
