//! Text summaries of decode results, in the shape of the classic Viterbi
//! homework printout: the parameters used, the path score, and where the
//! state of interest was found.
use crate::decode::DecodeResult;
use crate::model::MarkovModel;

struct HitReport<'a, M> {
    result: &'a DecodeResult<M>,
    state: usize,
    max_hits: usize,
}

impl<'a, M: MarkovModel> std::fmt::Display for HitReport<'a, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let hits = self.result.segments_of(self.state);
        writeln!(f, "Viterbi Result")?;
        writeln!(f, "{}", self.result.model())?;
        writeln!(f, "Log probability : {}", self.result.score())?;
        writeln!(f, "Total number of hits : {}", hits.len())?;
        if hits.is_empty() {
            return writeln!(f, "No hits found");
        }
        let take = self.max_hits.min(hits.len());
        writeln!(f)?;
        writeln!(f, "Printing first {} hits", take)?;
        writeln!(f, "Start Index - End Index - Length")?;
        for hit in hits.iter().take(take) {
            writeln!(f, "{} - {} - {}", hit.start, hit.end(), hit.len())?;
        }
        Ok(())
    }
}

impl<M: MarkovModel> DecodeResult<M> {
    /// Renders the hits of `state`, at most `max_hits` of them, earliest
    /// first. Start and end are 1-based and the end is exclusive.
    /// Panics if `state` is not a valid state index.
    pub fn report(&self, state: usize, max_hits: usize) -> String {
        HitReport {
            result: self,
            state,
            max_hits,
        }
        .to_string()
    }

    /// Renders every hit of `state`.
    pub fn report_all(&self, state: usize) -> String {
        self.report(state, self.segments_of(state).len())
    }
}
