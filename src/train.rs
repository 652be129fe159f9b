//! Viterbi training: decode, recount the decoded path into new parameters,
//! decode again. The hard-assignment counterpart of Baum-Welch.
use crate::decode::{decode, DecodeResult};
use crate::model::MarkovModel;
use crate::{Error, Result};

/// Runs `rounds` decode-and-reestimate iterations over `seq` and returns
/// every intermediate result, oldest first. Each result owns the parameter
/// snapshot its decode ran with; reestimation never touches earlier entries.
pub fn train_and_decode<M: MarkovModel>(
    mut model: M,
    seq: &[u8],
    rounds: usize,
) -> Result<Vec<DecodeResult<M>>> {
    if rounds == 0 {
        return Err(Error::NoIterations);
    }
    let mut results = Vec::with_capacity(rounds);
    for round in 1..=rounds {
        let result = decode(&model, seq)?;
        debug!("ITER\t{}\t{}", round, result.score());
        trace!("MODEL\t{}", model);
        model = model.reestimate(&result);
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiceRollModel;

    fn fixture() -> DiceRollModel {
        let loaded = [1. / 10., 1. / 10., 1. / 10., 1. / 10., 1. / 10., 1. / 2.];
        DiceRollModel::new(
            [0.5, 0.5],
            [[0.95, 0.05], [0.05, 0.95]],
            [loaded, [1. / 6.; 6]],
        )
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let err = train_and_decode(fixture(), b"66662", 0).unwrap_err();
        assert_eq!(err, Error::NoIterations);
    }

    #[test]
    fn decode_errors_propagate() {
        assert_eq!(
            train_and_decode(fixture(), b"", 3).unwrap_err(),
            Error::EmptySequence
        );
    }

    #[test]
    fn history_keeps_one_snapshot_per_round() {
        let results = train_and_decode(fixture(), b"66662", 3).unwrap();
        assert_eq!(results.len(), 3);
        // Round one ran with the starting parameters.
        let first = results[0].model();
        assert!((first.log_emission(b'6', 0).unwrap() - 0.5f64.ln()).abs() < 1e-9);
        assert!((results[0].score() - -5.973494173343975).abs() < 1e-9);
        // Round two ran with the counts of round one: four sixes and a two,
        // all of them decoded loaded.
        let second = results[1].model();
        assert!((second.log_emission(b'6', 0).unwrap() - 0.8f64.ln()).abs() < 1e-9);
        assert_eq!(second.log_transition(0, 0).unwrap(), 0.0);
        let expected = 4. * 0.8f64.ln() + 0.2f64.ln() + 0.5f64.ln();
        assert!((results[1].score() - expected).abs() < 1e-9);
        // The counts repeat themselves from here on.
        let third = results[2].model();
        assert!((third.log_emission(b'6', 0).unwrap() - 0.8f64.ln()).abs() < 1e-9);
        assert!((results[2].score() - expected).abs() < 1e-9);
        for result in results.iter() {
            assert_eq!(result.path(), b"LLLLL");
        }
    }

    #[test]
    fn snapshots_survive_later_rounds() {
        let results = train_and_decode(fixture(), b"66662", 2).unwrap();
        // The first snapshot still reports the starting parameters even
        // though reestimation replaced them for round two.
        let first = results[0].model();
        assert!((first.log_emission(b'2', 0).unwrap() - 0.1f64.ln()).abs() < 1e-9);
        assert!((first.log_transition(1, 0).unwrap() - 0.05f64.ln()).abs() < 1e-9);
        assert!(first.log_emission(b'3', 1).unwrap().is_finite());
        let second = results[1].model();
        assert!(second.log_emission(b'3', 1).unwrap().is_nan());
    }
}
