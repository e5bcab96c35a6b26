//! Request lifecycle states
//!
//! ```text
//! Received -> ConsumerResolved -> HandlerInvoked -> ProducerResolved -> Serialized -> Finished
//!    |              (POST/PUT)          |              (models only)
//!    +----------------------------------+--> Rejected(status)
//! ```
//!
//! `Finished` and `Rejected` are terminal. Every request ends in exactly one
//! of them, and the response is finished exactly once.

use http::StatusCode;
use supercell_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	Received,
	ConsumerResolved,
	HandlerInvoked,
	ProducerResolved,
	Serialized,
	Finished,
	Rejected(StatusCode),
}

impl LifecycleState {
	pub fn is_terminal(&self) -> bool {
		matches!(self, LifecycleState::Finished | LifecycleState::Rejected(_))
	}

	pub fn can_advance_to(&self, next: LifecycleState) -> bool {
		use LifecycleState::*;

		match (*self, next) {
			(Received, ConsumerResolved | HandlerInvoked) => true,
			(ConsumerResolved, HandlerInvoked) => true,
			// Status results are serialized without a provider
			(HandlerInvoked, ProducerResolved | Serialized) => true,
			(ProducerResolved, Serialized) => true,
			(Serialized, Finished) => true,
			(current, Rejected(_)) => !current.is_terminal(),
			_ => false,
		}
	}
}

/// Tracks the states one request passed through.
#[derive(Debug, Clone)]
pub struct Lifecycle {
	trail: Vec<LifecycleState>,
}

impl Lifecycle {
	pub fn new() -> Self {
		Self {
			trail: vec![LifecycleState::Received],
		}
	}

	pub fn state(&self) -> LifecycleState {
		self.trail
			.last()
			.copied()
			.unwrap_or(LifecycleState::Received)
	}

	pub fn advance(&mut self, next: LifecycleState) -> Result<()> {
		let current = self.state();
		if !current.can_advance_to(next) {
			return Err(Error::Internal(format!(
				"invalid lifecycle transition {current:?} -> {next:?}"
			)));
		}
		tracing::trace!(from = ?current, to = ?next, "lifecycle");
		self.trail.push(next);
		Ok(())
	}

	pub fn reject(&mut self, status: StatusCode) -> Result<()> {
		self.advance(LifecycleState::Rejected(status))
	}

	pub fn trail(&self) -> &[LifecycleState] {
		&self.trail
	}

	pub fn into_trail(self) -> Vec<LifecycleState> {
		self.trail
	}
}

impl Default for Lifecycle {
	fn default() -> Self {
		Self::new()
	}
}
