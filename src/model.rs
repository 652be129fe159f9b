//! Parameter sets for two-state segmentation problems: the occasionally
//! loaded casino die and GC-rich patches in genomic sequence.
//! All probabilities are kept in log space, as the decoder consumes them.
use crate::decode::DecodeResult;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Shared interface of a parameter set: state and symbol enumeration,
/// log-probability lookup, and count-based reestimation from a decoded result.
///
/// The order of [`state_symbols`](MarkovModel::state_symbols) is the order the
/// decoder scans states in, so it fixes how score ties are broken.
pub trait MarkovModel: Clone + std::fmt::Display {
    /// Display symbols of the hidden states.
    fn state_symbols(&self) -> &[u8];
    /// Symbols the model emits.
    fn alphabet(&self) -> &[u8];
    /// Log probability of entering `to` from the begin pseudostate.
    fn log_begin(&self, to: usize) -> Result<f64>;
    /// Log probability of moving from one real state to another.
    fn log_transition(&self, from: usize, to: usize) -> Result<f64>;
    /// Log probability of `symbol` being emitted in `state`.
    fn log_emission(&self, symbol: u8, state: usize) -> Result<f64>;
    /// Counts a decoded result back into a fresh parameter set.
    /// The receiver is left untouched.
    fn reestimate(&self, result: &DecodeResult<Self>) -> Self;
}

const INVALID: usize = usize::MAX;

const DICE_STATES: &[u8] = b"LF";
const DICE_FACES: &[u8] = b"123456";

const fn dice_face_table() -> [usize; 256] {
    let mut slots = [INVALID; 256];
    slots[b'1' as usize] = 0;
    slots[b'2' as usize] = 1;
    slots[b'3' as usize] = 2;
    slots[b'4' as usize] = 3;
    slots[b'5' as usize] = 4;
    slots[b'6' as usize] = 5;
    slots
}
const DICE_FACE_TABLE: [usize; 256] = dice_face_table();

const fn dice_state_table() -> [usize; 256] {
    let mut slots = [INVALID; 256];
    slots[b'L' as usize] = 0;
    slots[b'F' as usize] = 1;
    slots
}
const DICE_STATE_TABLE: [usize; 256] = dice_state_table();

const GC_STATES: &[u8] = b"-+";
const GC_BASES: &[u8] = b"ACGT";

// Anything that is not a recognized base reads as T.
const fn gc_base_table() -> [usize; 256] {
    let mut slots = [3; 256];
    slots[b'A' as usize] = 0;
    slots[b'C' as usize] = 1;
    slots[b'G' as usize] = 2;
    slots[b'a' as usize] = 0;
    slots[b'c' as usize] = 1;
    slots[b'g' as usize] = 2;
    slots
}
const GC_BASE_TABLE: [usize; 256] = gc_base_table();

const fn gc_state_table() -> [usize; 256] {
    let mut slots = [INVALID; 256];
    slots[b'-' as usize] = 0;
    slots[b'+' as usize] = 1;
    slots
}
const GC_STATE_TABLE: [usize; 256] = gc_state_table();

// Ordered state pairs along a path and how often each state occurs as a source.
// The last position never acts as a source. Symbols outside the table are skipped.
fn count_transitions(path: &[u8], table: &[usize; 256]) -> ([[usize; 2]; 2], [usize; 2]) {
    let mut pairs = [[0; 2]; 2];
    let mut froms = [0; 2];
    for w in path.windows(2) {
        let (from, to) = (table[w[0] as usize], table[w[1] as usize]);
        if from < 2 && to < 2 {
            pairs[from][to] += 1;
            froms[from] += 1;
        }
    }
    (pairs, froms)
}

/// The occasionally loaded casino die. State `L` rolls a six half of the
/// time, state `F` is fair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceRollModel {
    begin: [f64; 2],
    trans: [[f64; 2]; 2],
    emit: [[f64; 6]; 2],
}

impl std::default::Default for DiceRollModel {
    fn default() -> Self {
        let begin = [0.52, 0.48];
        let trans = [[0.6, 0.4], [0.17, 0.83]];
        let loaded = [1. / 10., 1. / 10., 1. / 10., 1. / 10., 1. / 10., 1. / 2.];
        let fair = [1. / 6.; 6];
        Self::new(begin, trans, [loaded, fair])
    }
}

impl DiceRollModel {
    /// Build a model from linear-scale probabilities.
    /// `trans[from][to]` and `emit[state][face]` follow the order of
    /// [`state_symbols`](MarkovModel::state_symbols), faces run 1 to 6.
    /// Rows are stored as given. Debug builds assert each row sums to one.
    pub fn new(begin: [f64; 2], trans: [[f64; 2]; 2], emit: [[f64; 6]; 2]) -> Self {
        assert!(begin.iter().all(|p| (0f64..=1f64).contains(p)));
        assert!(trans.iter().flatten().all(|p| (0f64..=1f64).contains(p)));
        assert!(emit.iter().flatten().all(|p| (0f64..=1f64).contains(p)));
        debug_assert!((begin.iter().sum::<f64>() - 1.).abs() < 1e-6);
        debug_assert!(trans.iter().all(|row| (row.iter().sum::<f64>() - 1.).abs() < 1e-6));
        debug_assert!(emit.iter().all(|row| (row.iter().sum::<f64>() - 1.).abs() < 1e-6));
        Self {
            begin: begin.map(f64::ln),
            trans: trans.map(|row| row.map(f64::ln)),
            emit: emit.map(|row| row.map(f64::ln)),
        }
    }
}

impl std::fmt::Display for DiceRollModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "State transition probability (log)")?;
        let probs: Vec<_> = self.begin.iter().map(|x| format!("{:.4}", x)).collect();
        writeln!(f, "B:{}", probs.join("\t"))?;
        for (from, row) in self.trans.iter().enumerate() {
            let probs: Vec<_> = row.iter().map(|x| format!("{:.4}", x)).collect();
            writeln!(f, "{}:{}", DICE_STATES[from] as char, probs.join("\t"))?;
        }
        writeln!(f, "Emission probability (log)")?;
        for (state, row) in self.emit.iter().enumerate() {
            let probs: Vec<_> = row.iter().map(|x| format!("{:.4}", x)).collect();
            writeln!(f, "{}:{}", DICE_STATES[state] as char, probs.join("\t"))?;
        }
        Ok(())
    }
}

impl MarkovModel for DiceRollModel {
    fn state_symbols(&self) -> &[u8] {
        DICE_STATES
    }
    fn alphabet(&self) -> &[u8] {
        DICE_FACES
    }
    fn log_begin(&self, to: usize) -> Result<f64> {
        self.begin
            .get(to)
            .copied()
            .ok_or(Error::MissingBeginTransition(to))
    }
    fn log_transition(&self, from: usize, to: usize) -> Result<f64> {
        self.trans
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .ok_or(Error::MissingTransition { from, to })
    }
    fn log_emission(&self, symbol: u8, state: usize) -> Result<f64> {
        let face = DICE_FACE_TABLE[symbol as usize];
        match self.emit.get(state) {
            Some(row) if face != INVALID => Ok(row[face]),
            _ => Err(Error::MissingEmission {
                symbol: symbol as char,
                state,
            }),
        }
    }
    // Emission rows are recounted from scratch for every state, so a state the
    // path never visits ends up with 0/0 everywhere. Transition entries are
    // only overwritten for pairs the path actually contains, and the begin
    // row never changes.
    fn reestimate(&self, result: &DecodeResult<Self>) -> Self {
        let mut emit = [[0f64; 6]; 2];
        for (state, row) in emit.iter_mut().enumerate() {
            let segments = result.segments_of(state);
            let total: usize = segments.iter().map(|s| s.seq.len()).sum();
            for (face, slot) in row.iter_mut().enumerate() {
                let count: usize = segments
                    .iter()
                    .map(|s| bytecount::count(&s.seq, DICE_FACES[face]))
                    .sum();
                *slot = (count as f64 / total as f64).ln();
            }
        }
        let (pairs, froms) = count_transitions(result.path(), &DICE_STATE_TABLE);
        let mut trans = self.trans;
        for (from, row) in trans.iter_mut().enumerate() {
            for (to, slot) in row.iter_mut().enumerate() {
                if pairs[from][to] > 0 {
                    *slot = (pairs[from][to] as f64 / froms[from] as f64).ln();
                }
            }
        }
        Self {
            begin: self.begin,
            trans,
            emit,
        }
    }
}

/// GC-rich patches over a background of ordinary sequence. State `-` is the
/// background, state `+` favors C and G. Emission lookup is case insensitive
/// and reads every unrecognized base as T.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcPatchModel {
    begin: [f64; 2],
    trans: [[f64; 2]; 2],
    emit: [[f64; 4]; 2],
}

// Priors the begin row returns to on every reestimation.
const GC_BEGIN: [f64; 2] = [0.9999, 0.0001];

impl std::default::Default for GcPatchModel {
    fn default() -> Self {
        let trans = [[0.9999, 0.0001], [0.01, 0.99]];
        let emit = [[0.25; 4], [0.20, 0.30, 0.30, 0.20]];
        Self::new(GC_BEGIN, trans, emit)
    }
}

impl GcPatchModel {
    /// Build a model from linear-scale probabilities, `emit[state]` ordered
    /// as A, C, G, T. Rows are stored as given. Debug builds assert each row
    /// sums to one.
    pub fn new(begin: [f64; 2], trans: [[f64; 2]; 2], emit: [[f64; 4]; 2]) -> Self {
        assert!(begin.iter().all(|p| (0f64..=1f64).contains(p)));
        assert!(trans.iter().flatten().all(|p| (0f64..=1f64).contains(p)));
        assert!(emit.iter().flatten().all(|p| (0f64..=1f64).contains(p)));
        debug_assert!((begin.iter().sum::<f64>() - 1.).abs() < 1e-6);
        debug_assert!(trans.iter().all(|row| (row.iter().sum::<f64>() - 1.).abs() < 1e-6));
        debug_assert!(emit.iter().all(|row| (row.iter().sum::<f64>() - 1.).abs() < 1e-6));
        Self {
            begin: begin.map(f64::ln),
            trans: trans.map(|row| row.map(f64::ln)),
            emit: emit.map(|row| row.map(f64::ln)),
        }
    }
}

impl std::fmt::Display for GcPatchModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "State transition probability (log)")?;
        let header: Vec<_> = GC_STATES.iter().map(|&s| format!("{:>10}", s as char)).collect();
        writeln!(f, "  {}", header.join("\t"))?;
        for (from, row) in self.trans.iter().enumerate() {
            let probs: Vec<_> = row.iter().map(|x| format!("{:>10.4}", x)).collect();
            writeln!(f, "{} {}", GC_STATES[from] as char, probs.join("\t"))?;
        }
        writeln!(f, "Emission probability (log)")?;
        let header: Vec<_> = GC_BASES.iter().map(|&b| format!("{:>10}", b as char)).collect();
        writeln!(f, "  {}", header.join("\t"))?;
        for (state, row) in self.emit.iter().enumerate() {
            let probs: Vec<_> = row.iter().map(|x| format!("{:>10.4}", x)).collect();
            writeln!(f, "{} {}", GC_STATES[state] as char, probs.join("\t"))?;
        }
        Ok(())
    }
}

impl MarkovModel for GcPatchModel {
    fn state_symbols(&self) -> &[u8] {
        GC_STATES
    }
    fn alphabet(&self) -> &[u8] {
        GC_BASES
    }
    fn log_begin(&self, to: usize) -> Result<f64> {
        self.begin
            .get(to)
            .copied()
            .ok_or(Error::MissingBeginTransition(to))
    }
    fn log_transition(&self, from: usize, to: usize) -> Result<f64> {
        self.trans
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .ok_or(Error::MissingTransition { from, to })
    }
    fn log_emission(&self, symbol: u8, state: usize) -> Result<f64> {
        let base = GC_BASE_TABLE[symbol as usize];
        self.emit
            .get(state)
            .map(|row| row[base])
            .ok_or(Error::MissingEmission {
                symbol: symbol as char,
                state,
            })
    }
    // Transitions the path does not contain drop to minus infinity, the begin
    // row returns to its priors, and emission rows are recounted from scratch
    // with the same base clipping the lookup applies.
    fn reestimate(&self, result: &DecodeResult<Self>) -> Self {
        let mut emit = [[0f64; 4]; 2];
        for (state, row) in emit.iter_mut().enumerate() {
            let segments = result.segments_of(state);
            let total: usize = segments.iter().map(|s| s.seq.len()).sum();
            let mut counts = [0usize; 4];
            for s in segments {
                counts[0] += bytecount::count(&s.seq, b'A') + bytecount::count(&s.seq, b'a');
                counts[1] += bytecount::count(&s.seq, b'C') + bytecount::count(&s.seq, b'c');
                counts[2] += bytecount::count(&s.seq, b'G') + bytecount::count(&s.seq, b'g');
            }
            counts[3] = total - counts[0] - counts[1] - counts[2];
            for (slot, &count) in row.iter_mut().zip(counts.iter()) {
                *slot = (count as f64 / total as f64).ln();
            }
        }
        let (pairs, froms) = count_transitions(result.path(), &GC_STATE_TABLE);
        let mut trans = [[f64::NEG_INFINITY; 2]; 2];
        for (from, row) in trans.iter_mut().enumerate() {
            for (to, slot) in row.iter_mut().enumerate() {
                if pairs[from][to] > 0 {
                    *slot = (pairs[from][to] as f64 / froms[from] as f64).ln();
                }
            }
        }
        Self {
            begin: GC_BEGIN.map(f64::ln),
            trans,
            emit,
        }
    }
}
