//! Reconnect policy and the connection lifecycle state machine.
//!
//! [`Lifecycle`] holds no I/O: the driver feeds it socket events and acts on
//! the returned [`CloseOutcome`], which keeps retry timing testable without
//! a socket.

use std::time::Duration;

use rentdesk_protocol::constants::is_terminal_close;

use crate::types::ConnectionState;

/// Linear reconnect policy: attempt `n` (1-based) waits `base_interval * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_interval: Duration::from_millis(3000),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the given attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_interval.saturating_mul(attempt)
    }
}

/// What the driver must do after a socket closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Clean close (1000/1001): stay disconnected.
    Final,
    /// Schedule exactly one retry after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Attempts exhausted: the state is now [`ConnectionState::Error`].
    Exhausted { attempts: u32 },
}

/// Connection state plus the retry counter.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    state: ConnectionState,
    attempt: u32,
    policy: ReconnectPolicy,
}

impl Lifecycle {
    pub(crate) fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempt: 0,
            policy,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Moves to `Connecting`. Returns `false` (no-op) when a socket is
    /// already open or opening.
    pub(crate) fn begin_connect(&mut self) -> bool {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => false,
            ConnectionState::Disconnected | ConnectionState::Error => {
                self.state = ConnectionState::Connecting;
                true
            }
        }
    }

    /// The socket opened.
    pub(crate) fn opened(&mut self) {
        self.state = ConnectionState::Connected;
    }

    /// The server acknowledged the connection; the retry budget refills.
    pub(crate) fn established(&mut self) {
        self.attempt = 0;
    }

    pub(crate) fn reset_attempts(&mut self) {
        self.attempt = 0;
    }

    /// Forced disconnect. Returns the previous state.
    pub(crate) fn disconnect(&mut self) -> ConnectionState {
        std::mem::replace(&mut self.state, ConnectionState::Disconnected)
    }

    /// The socket closed (or failed to open) with `code`.
    pub(crate) fn closed(&mut self, code: u16) -> CloseOutcome {
        if is_terminal_close(code) {
            self.state = ConnectionState::Disconnected;
            return CloseOutcome::Final;
        }

        if self.attempt < self.policy.max_attempts {
            self.state = ConnectionState::Disconnected;
            self.attempt += 1;
            CloseOutcome::Retry {
                attempt: self.attempt,
                delay: self.policy.delay_for_attempt(self.attempt),
            }
        } else {
            self.state = ConnectionState::Error;
            CloseOutcome::Exhausted {
                attempts: self.attempt,
            }
        }
    }
}
