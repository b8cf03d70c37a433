//! Trailing-edge debounce timer.

use std::time::{Duration, Instant};

/// A single trailing-edge timer.
///
/// Arming replaces any existing deadline, so a burst of notifications fires
/// once, `delay` after the last one.
#[derive(Debug, Clone)]
pub struct Debounce {
	delay: Duration,
	deadline: Option<Instant>,
}

impl Debounce {
	pub fn new(delay: Duration) -> Self {
		Self {
			delay,
			deadline: None,
		}
	}

	/// Arms (or re-arms) the timer relative to `now`.
	///
	/// Returns true if a deadline was already pending.
	pub fn arm(&mut self, now: Instant) -> bool {
		self.deadline.replace(now + self.delay).is_some()
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	pub fn is_pending(&self) -> bool {
		self.deadline.is_some()
	}

	/// Returns true if the timer is armed and its deadline has passed.
	pub fn is_due(&self, now: Instant) -> bool {
		self.deadline.is_some_and(|deadline| now >= deadline)
	}

	/// Disarms the timer if it is due. Returns true if it fired.
	pub fn take_due(&mut self, now: Instant) -> bool {
		let due = self.is_due(now);
		if due {
			self.deadline = None;
		}
		due
	}

	/// Disarms the timer. Returns true if it was pending.
	pub fn cancel(&mut self) -> bool {
		self.deadline.take().is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rearm_moves_deadline_forward() {
		let start = Instant::now();
		let mut timer = Debounce::new(Duration::from_millis(500));
		assert!(!timer.arm(start));
		assert!(timer.arm(start + Duration::from_millis(400)));
		assert!(!timer.is_due(start + Duration::from_millis(500)));
		assert!(timer.take_due(start + Duration::from_millis(900)));
		assert!(!timer.is_pending());
	}

	#[test]
	fn test_cancel_disarms() {
		let start = Instant::now();
		let mut timer = Debounce::new(Duration::from_millis(10));
		timer.arm(start);
		assert!(timer.cancel());
		assert!(!timer.take_due(start + Duration::from_secs(1)));
		assert!(!timer.cancel());
	}
}
