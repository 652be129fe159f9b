//! This module is to generate some random sequence to assess the decoder.
//! Usually, it would not be used in the real-applications.
use crate::model::MarkovModel;
use rand::seq::SliceRandom;
use rand::Rng;

/// Draws a sequence of the given length from `model`, returning it together
/// with the hidden path it was emitted from. Meant for tests and demo runs;
/// panics if the model rows do not form usable distributions.
pub fn simulate<M: MarkovModel, R: Rng>(model: &M, rng: &mut R, len: usize) -> (Vec<u8>, Vec<u8>) {
    assert!(len > 0);
    let states: Vec<usize> = (0..model.state_symbols().len()).collect();
    let weight = |prob: crate::Result<f64>| prob.map(f64::exp).unwrap_or(0.);
    let mut state = *states
        .choose_weighted(rng, |&to| weight(model.log_begin(to)))
        .unwrap();
    let mut seq = Vec::with_capacity(len);
    let mut path = Vec::with_capacity(len);
    for i in 0..len {
        if i > 0 {
            state = *states
                .choose_weighted(rng, |&to| weight(model.log_transition(state, to)))
                .unwrap();
        }
        path.push(model.state_symbols()[state]);
        let symbol = *model
            .alphabet()
            .choose_weighted(rng, |&sym| weight(model.log_emission(sym, state)))
            .unwrap();
        seq.push(symbol);
    }
    (seq, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiceRollModel, GcPatchModel};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn simulate_is_seeded() {
        let model = DiceRollModel::default();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(42);
        let first = simulate(&model, &mut rng, 100);
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(42);
        let second = simulate(&model, &mut rng, 100);
        assert_eq!(first, second);
    }

    #[test]
    fn simulate_respects_the_alphabets() {
        let model = GcPatchModel::default();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(3);
        let (seq, path) = simulate(&model, &mut rng, 500);
        assert_eq!(seq.len(), 500);
        assert_eq!(path.len(), 500);
        assert!(seq.iter().all(|b| model.alphabet().contains(b)));
        assert!(path.iter().all(|s| model.state_symbols().contains(s)));
    }

    #[test]
    fn loaded_positions_favor_sixes() {
        let model = DiceRollModel::default();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(8);
        let (seq, path) = simulate(&model, &mut rng, 4000);
        let sixes_in = |target: u8| {
            let total = path.iter().filter(|&&s| s == target).count();
            let sixes = seq
                .iter()
                .zip(path.iter())
                .filter(|(&sym, &s)| s == target && sym == b'6')
                .count();
            sixes as f64 / total as f64
        };
        assert!(sixes_in(b'L') > 0.4, "{}", sixes_in(b'L'));
        assert!(sixes_in(b'F') < 0.25, "{}", sixes_in(b'F'));
    }
}
