//! Cycle scheduler: paces whole-instruction execution to one external clock.
//!
//! An instruction executes atomically on the tick where nothing is owed; its
//! total cost then becomes a countdown burned one tick at a time. The elapsed
//! counter advances on every tick, so after an instruction of cost N it has
//! grown by exactly N.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    elapsed: u64,
    owed: u8,
}

impl Scheduler {
    pub fn new(elapsed: u64) -> Self {
        Self { elapsed, owed: 0 }
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Cycles still to burn before the next fetch.
    pub fn owed(&self) -> u8 {
        self.owed
    }

    pub fn ready(&self) -> bool {
        self.owed == 0
    }

    /// Start the countdown for a freshly executed step.
    pub fn charge(&mut self, cycles: u8) {
        debug_assert!(self.ready(), "charged while {} cycles still owed", self.owed);
        self.owed = cycles;
    }

    /// One external clock tick.
    pub fn burn(&mut self) {
        self.owed = self.owed.saturating_sub(1);
        self.elapsed += 1;
    }

    /// Burn whatever is owed in one go. Returns the ticks consumed.
    pub fn settle(&mut self) -> u8 {
        let owed = self.owed;
        self.elapsed += owed as u64;
        self.owed = 0;
        owed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_gates_the_next_fetch() {
        let mut scheduler = Scheduler::new(7);
        assert!(scheduler.ready());

        scheduler.charge(3);
        assert_eq!(scheduler.owed(), 3);
        for owed in [2, 1] {
            scheduler.burn();
            assert!(!scheduler.ready());
            assert_eq!(scheduler.owed(), owed);
        }
        scheduler.burn();
        assert!(scheduler.ready());
        assert_eq!(scheduler.elapsed(), 10);
    }

    #[test]
    fn settle_burns_remainder() {
        let mut scheduler = Scheduler::new(0);
        scheduler.charge(5);
        scheduler.burn();
        assert_eq!(scheduler.settle(), 4);
        assert_eq!(scheduler.elapsed(), 5);
        assert!(scheduler.ready());
    }
}
