use batsat::{
    callbacks::{Callbacks, ProgressStatus},
    lbool,
};
use log::trace;
use std::{
    cell::RefCell,
    rc::Rc,
    time::{Duration, Instant},
};

#[derive(Debug)]
struct DeadlineState {
    start: Instant,
    budget: Duration,
    elapsed: Duration,
}

/// Cooperative time budget for a single analysis. The same handle is polled
/// while clauses are being constructed and installed as the solver's
/// `Callbacks`, whose `stop` hook interrupts the search; expiry surfaces as
/// an indeterminate analysis result, never as a crash.
#[derive(Debug, Clone)]
pub struct Deadline(Rc<RefCell<DeadlineState>>);

impl Deadline {
    pub fn after_millis(budget_ms: u64) -> Self {
        Deadline(Rc::new(RefCell::new(DeadlineState {
            start: Instant::now(),
            budget: Duration::from_millis(budget_ms),
            elapsed: Duration::ZERO,
        })))
    }

    pub fn unlimited() -> Self {
        Deadline(Rc::new(RefCell::new(DeadlineState {
            start: Instant::now(),
            budget: Duration::MAX,
            elapsed: Duration::ZERO,
        })))
    }

    fn measure(&self) {
        let mut st = self.0.borrow_mut();
        st.elapsed = st.start.elapsed();
    }

    pub fn expired(&self) -> bool {
        self.measure();
        let st = self.0.borrow();
        st.elapsed > st.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.0.borrow().elapsed
    }
}

impl Callbacks for Deadline {
    fn on_start(&mut self) {
        self.measure();
        trace!( target: "FBA",
            "c ============================[ Search Statistics ]=============================="
        );
        trace!( target: "FBA",
            "c | Conflicts |          ORIGINAL         |          LEARNT          | Progress |"
        );
        trace!( target: "FBA",
            "c |           |    Vars  Clauses Literals |    Limit  Clauses Lit/Cl |          |"
        );
        trace!( target: "FBA",
            "c ==============================================================================="
        );
    }

    fn on_result(&mut self, _: lbool) {
        self.measure();
        trace!( target: "FBA",
            "c ==============================================================================="
        );
        trace!( target: "FBA",
            "solver finished after {} ms",
            self.elapsed().as_millis()
        );
    }

    fn on_progress<F>(&mut self, p: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
        let p = p();
        trace!( target: "FBA",
            "c | {:9} | {:7} {:8} {:8} | {:8} {:8} {:6.0} | {:6.3} % |",
            p.conflicts,
            p.dec_vars,
            p.n_clauses,
            p.n_clause_lits,
            p.max_learnt,
            p.n_learnt,
            p.n_learnt_lits,
            p.progress_estimate
        );
    }

    fn on_gc(&mut self, old: usize, new: usize) {
        trace!( target: "FBA",
            "|  Garbage collection:   {:12} bytes => {:12} bytes             |",
            old, new
        );
    }

    fn stop(&self) -> bool {
        self.expired()
    }
}
