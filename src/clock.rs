use chrono::{Local, NaiveDate};

/// Source of "today". Sampled on every render and filter change, never cached.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[cfg(test)]
pub use fixed::FixedClock;

#[cfg(test)]
mod fixed {
    use super::Clock;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Test clock; clones share the same date so a test can move time forward.
    #[derive(Clone)]
    pub struct FixedClock(Rc<Cell<NaiveDate>>);

    impl FixedClock {
        pub fn new(date: NaiveDate) -> Self {
            FixedClock(Rc::new(Cell::new(date)))
        }

        pub fn set(&self, date: NaiveDate) {
            self.0.set(date);
        }
    }

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0.get()
        }
    }
}
