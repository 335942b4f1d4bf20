pub trait Timer {
    fn delay_micros(&self, micros: u64);
    fn delay_millis(&self, millis: u64);
    fn get_micros(&self) -> u64;
}

/// A point in time after which a wait is abandoned. `None` never expires.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Deadline {
    at: Option<u64>
}

impl Deadline {
    pub fn after(timer: &impl Timer, micros: Option<u64>) -> Self {
        Self {
            at: micros.map(|micros| timer.get_micros().saturating_add(micros))
        }
    }

    pub fn expired(&self, timer: &impl Timer) -> bool {
        match self.at {
            Some(at) => timer.get_micros() >= at,
            None => false
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{Deadline, fake::FakeTimer};

    #[test]
    fn test_deadline_expires() {
        let timer = FakeTimer::new(10);
        let deadline = Deadline::after(&timer, Some(25));

        assert!(!deadline.expired(&timer));
        assert!(!deadline.expired(&timer));
        assert!(deadline.expired(&timer));
    }

    #[test]
    fn test_unbounded_deadline_never_expires() {
        let timer = FakeTimer::new(u64::MAX / 4);
        let deadline = Deadline::after(&timer, None);

        for _ in 0..3 {
            assert!(!deadline.expired(&timer));
        }
    }
}
