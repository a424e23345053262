//! Per-attribute sampling efficiency bookkeeping and the efficiency queue.

use crate::pli::Pli;
use crate::utils::binomial;

/// Tracks how productive windowed sampling has been for one attribute: the
/// fraction of comparisons so far that turned up a new non-FD.
#[derive(Debug, Clone)]
pub struct Efficiency {
    pub att: usize,
    pub total: u64,
    pub window: usize,
    pub comps: u64,
    pub results: f64,
    pub done: bool,
}

impl Efficiency {
    /// One entry per attribute, created on the sampler's first pass.
    /// `total = sum(C(|cluster|, 2))` over every cluster of `pli`.
    pub fn new(att: usize, pli: &Pli) -> Self {
        let total: u64 = pli.iter().map(|c| binomial(c.len() as u64, 2)).sum();
        Efficiency {
            att,
            total,
            window: 2,
            comps: 0,
            results: 0.0,
            done: total == 0,
        }
    }

    pub fn increase_comps(&mut self) {
        self.comps += 1;
        if self.comps == self.total {
            self.done = true;
        }
    }

    /// `results / comps`, or `0.0` if no comparison has happened yet (most
    /// notably an all-unique column, whose `total` is `0` and so never gets
    /// a single `increase_comps` call) — avoids a `0.0/0.0` NaN that would
    /// poison the efficiency queue's sort.
    pub fn eval(&self) -> f64 {
        if self.comps == 0 {
            0.0
        } else {
            self.results / self.comps as f64
        }
    }
}
