//! Most probable state path by the Viterbi recurrence. One decode fills an
//! input-length by state-count table of scores and backpointers, picks a
//! champion in the last column, and walks the backpointers out into a path
//! and per-state subsequences. Time is O(len * states^2), space O(len * states).
use crate::model::MarkovModel;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A run of consecutive positions decoded into one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based position of the first symbol of the run.
    pub start: usize,
    /// The input symbols of the run, in sequence order.
    pub seq: Vec<u8>,
}

impl Segment {
    /// Exclusive 1-based end position.
    pub fn end(&self) -> usize {
        self.start + self.seq.len()
    }
    pub fn len(&self) -> usize {
        self.seq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}-{}:{}",
            self.start,
            self.end(),
            String::from_utf8_lossy(&self.seq)
        )
    }
}

/// What one decode produced. Owns a copy of the parameters it ran with, so
/// training histories stay valid after later reestimations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeResult<M> {
    score: f64,
    path: Vec<u8>,
    segments: Vec<Vec<Segment>>,
    model: M,
}

impl<M> DecodeResult<M> {
    /// Log probability of the decoded path.
    pub fn score(&self) -> f64 {
        self.score
    }
    /// State symbols along the path, one per input position.
    pub fn path(&self) -> &[u8] {
        &self.path
    }
    /// Runs decoded into the given state, ordered by start position.
    /// Panics if `state` is not a valid state index.
    pub fn segments_of(&self, state: usize) -> &[Segment] {
        &self.segments[state]
    }
    /// The parameters this decode ran with.
    pub fn model(&self) -> &M {
        &self.model
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    score: f64,
    prev: Option<usize>,
}

// Scores laid out flat, position major.
struct Trellis {
    states: usize,
    cells: Vec<Cell>,
}

impl Trellis {
    fn new(states: usize, len: usize) -> Self {
        let seed = Cell {
            score: f64::MIN,
            prev: None,
        };
        Self {
            states,
            cells: vec![seed; states * len],
        }
    }
}

impl std::ops::Index<(usize, usize)> for Trellis {
    type Output = Cell;
    fn index(&self, (pos, state): (usize, usize)) -> &Self::Output {
        &self.cells[pos * self.states + state]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Trellis {
    fn index_mut(&mut self, (pos, state): (usize, usize)) -> &mut Self::Output {
        &mut self.cells[pos * self.states + state]
    }
}

/// Decodes the most probable state path of `seq` under `model`.
///
/// Scores compare by strict greater-than against a floor of [`f64::MIN`].
/// The predecessor scan runs in state order and keeps the first maximum;
/// the final column is scanned in reverse order, so there the last state in
/// enumeration order wins ties. Candidates that compare as NaN are never
/// picked up by either scan.
pub fn decode<M: MarkovModel>(model: &M, seq: &[u8]) -> Result<DecodeResult<M>> {
    if seq.is_empty() {
        return Err(Error::EmptySequence);
    }
    let states = model.state_symbols().len();
    let mut trellis = Trellis::new(states, seq.len());
    for state in 0..states {
        let score = model.log_emission(seq[0], state)? + model.log_begin(state)?;
        trellis[(0, state)] = Cell { score, prev: None };
    }
    for (pos, &symbol) in seq.iter().enumerate().skip(1) {
        for state in 0..states {
            let mut best = f64::MIN;
            let mut prev = None;
            for from in 0..states {
                let cand = trellis[(pos - 1, from)].score + model.log_transition(from, state)?;
                if cand > best {
                    best = cand;
                    prev = Some(from);
                }
            }
            let score = model.log_emission(symbol, state)? + best;
            trellis[(pos, state)] = Cell { score, prev };
        }
    }
    let last = seq.len() - 1;
    let mut best = f64::MIN;
    let mut champion = None;
    for state in (0..states).rev() {
        if trellis[(last, state)].score > best {
            best = trellis[(last, state)].score;
            champion = Some(state);
        }
    }
    let champion = champion.ok_or(Error::DegenerateModel)?;
    Ok(traceback(model, seq, &trellis, champion, best))
}

// Walks the backpointers from the champion cell, collecting the reversed
// path and closing a subsequence whenever the state changes. Everything is
// collected back to front and reversed once at the end.
fn traceback<M: MarkovModel>(
    model: &M,
    seq: &[u8],
    trellis: &Trellis,
    champion: usize,
    score: f64,
) -> DecodeResult<M> {
    let symbols = model.state_symbols();
    let mut path = vec![];
    let mut segments: Vec<Vec<Segment>> = vec![vec![]; symbols.len()];
    let mut run: Vec<u8> = vec![];
    let mut run_state = champion;
    let mut run_start = 0;
    let (mut pos, mut state) = (seq.len() - 1, champion);
    loop {
        path.push(symbols[state]);
        if state != run_state {
            run.reverse();
            segments[run_state].push(Segment {
                start: run_start,
                seq: std::mem::take(&mut run),
            });
            run_state = state;
        }
        run.push(seq[pos]);
        run_start = pos + 1;
        match trellis[(pos, state)].prev {
            Some(from) => {
                pos -= 1;
                state = from;
            }
            None => break,
        }
    }
    if !run.is_empty() {
        run.reverse();
        segments[run_state].push(Segment {
            start: run_start,
            seq: run,
        });
    }
    path.reverse();
    for list in segments.iter_mut() {
        list.reverse();
    }
    DecodeResult {
        score,
        path,
        segments,
        model: model.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiceRollModel, GcPatchModel};

    fn fixture() -> DiceRollModel {
        let loaded = [1. / 10., 1. / 10., 1. / 10., 1. / 10., 1. / 10., 1. / 2.];
        DiceRollModel::new(
            [0.5, 0.5],
            [[0.95, 0.05], [0.05, 0.95]],
            [loaded, [1. / 6.; 6]],
        )
    }

    fn uniform() -> DiceRollModel {
        DiceRollModel::new([0.5, 0.5], [[0.5, 0.5], [0.5, 0.5]], [[1. / 6.; 6]; 2])
    }

    // Score of a given path, summed independently of the trellis.
    fn path_score<M: MarkovModel>(model: &M, seq: &[u8], path: &[u8]) -> f64 {
        let index = |symbol: u8| {
            model
                .state_symbols()
                .iter()
                .position(|&s| s == symbol)
                .unwrap()
        };
        let first = index(path[0]);
        let mut score =
            model.log_begin(first).unwrap() + model.log_emission(seq[0], first).unwrap();
        for i in 1..seq.len() {
            score += model
                .log_transition(index(path[i - 1]), index(path[i]))
                .unwrap();
            score += model.log_emission(seq[i], index(path[i])).unwrap();
        }
        score
    }

    #[test]
    fn loaded_run_decodes_to_l() {
        let result = decode(&fixture(), b"66662").unwrap();
        assert_eq!(result.path(), b"LLLLL");
        assert!((result.score() - -5.973494173343975).abs() < 1e-9);
        let hits = result.segments_of(0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start, 1);
        assert_eq!(hits[0].seq, b"66662");
        assert_eq!(hits[0].end(), 6);
        assert!(result.segments_of(1).is_empty());
    }

    #[test]
    fn score_matches_path_recomputation() {
        let model = DiceRollModel::default();
        for seq in [&b"6666163533516266"[..], &b"123456654321"[..], &b"2"[..]] {
            let result = decode(&model, seq).unwrap();
            assert_eq!(result.path().len(), seq.len());
            let recomputed = path_score(&model, seq, result.path());
            assert!(
                (result.score() - recomputed).abs() < 1e-9,
                "{} vs {}",
                result.score(),
                recomputed
            );
        }
    }

    #[test]
    fn decode_is_deterministic() {
        let model = GcPatchModel::default();
        let seq = b"ACGGGCCCGTATTTACCCGGGCAT";
        let first = decode(&model, seq).unwrap();
        let second = decode(&model, seq).unwrap();
        assert_eq!(first.path(), second.path());
        assert_eq!(first.score().to_bits(), second.score().to_bits());
        for state in 0..2 {
            assert_eq!(first.segments_of(state), second.segments_of(state));
        }
    }

    #[test]
    fn ties_pick_first_predecessor_and_last_final_state() {
        // Every candidate ties, so only the scan orders decide the path.
        let result = decode(&uniform(), b"123456").unwrap();
        assert_eq!(result.path(), b"LLLLLF");
        let loaded = result.segments_of(0);
        assert_eq!(loaded.len(), 1);
        assert_eq!((loaded[0].start, loaded[0].end()), (1, 6));
        assert_eq!(loaded[0].seq, b"12345");
        let fair = result.segments_of(1);
        assert_eq!(fair.len(), 1);
        assert_eq!((fair[0].start, fair[0].end()), (6, 7));
        assert_eq!(fair[0].seq, b"6");
    }

    #[test]
    fn single_symbol_tie_goes_to_the_last_state() {
        let result = decode(&uniform(), b"3").unwrap();
        assert_eq!(result.path(), b"F");
        let expected = 0.5f64.ln() + (1f64 / 6.).ln();
        assert!((result.score() - expected).abs() < 1e-9);
        assert!(result.segments_of(0).is_empty());
        assert_eq!(result.segments_of(1).len(), 1);
    }

    #[test]
    fn segments_partition_the_input() {
        let model = DiceRollModel::default();
        let seq = b"66661635335162666612356456";
        let result = decode(&model, seq).unwrap();
        let mut all: Vec<&Segment> = (0..2).flat_map(|s| result.segments_of(s)).collect();
        all.sort_by_key(|segment| segment.start);
        let mut expected_start = 1;
        let mut rebuilt = vec![];
        for segment in all {
            assert_eq!(segment.start, expected_start);
            expected_start = segment.end();
            rebuilt.extend_from_slice(&segment.seq);
        }
        assert_eq!(expected_start, seq.len() + 1);
        assert_eq!(rebuilt, seq);
    }

    #[test]
    fn segment_lists_are_ordered_by_start() {
        let model = DiceRollModel::default();
        let seq = b"66666611111166666611111166";
        let result = decode(&model, seq).unwrap();
        for state in 0..2 {
            let hits = result.segments_of(state);
            for pair in hits.windows(2) {
                assert!(pair[0].start < pair[1].start);
                assert!(pair[0].end() <= pair[1].start);
            }
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(decode(&fixture(), b"").unwrap_err(), Error::EmptySequence);
    }

    #[test]
    fn unknown_symbol_is_reported() {
        let err = decode(&fixture(), b"66x66").unwrap_err();
        assert!(matches!(err, Error::MissingEmission { symbol: 'x', .. }));
    }

    #[test]
    #[should_panic]
    fn segments_of_panics_past_the_last_state() {
        let result = decode(&fixture(), b"66").unwrap();
        result.segments_of(7);
    }
}
