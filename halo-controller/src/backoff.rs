//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

/// Exponential reconnect backoff: 1s, 2s, 4s, capped at 10s. Resets to the
/// initial delay after a successful connection.
pub struct Backoff {
    next: Duration,
}

const INITIAL: Duration = Duration::from_secs(1);
const CAP: Duration = Duration::from_secs(10);

impl Default for Backoff {
    fn default() -> Self {
        Backoff { next: INITIAL }
    }
}

impl Backoff {
    pub fn reset(&mut self) {
        self.next = INITIAL;
    }

    /// Returns the delay to wait before the next reconnect attempt and
    /// advances the internal state.
    pub fn advance(&mut self) -> Duration {
        let delay = self.next;
        self.next = std::cmp::min(self.next * 2, CAP);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_up_to_the_cap() {
        let mut backoff = Backoff::default();
        assert_eq!(backoff.advance(), Duration::from_secs(1));
        assert_eq!(backoff.advance(), Duration::from_secs(2));
        assert_eq!(backoff.advance(), Duration::from_secs(4));
        assert_eq!(backoff.advance(), Duration::from_secs(8));
        assert_eq!(backoff.advance(), Duration::from_secs(10));
        assert_eq!(backoff.advance(), Duration::from_secs(10));
    }

    #[test]
    fn reset_returns_to_the_initial_delay() {
        let mut backoff = Backoff::default();
        backoff.advance();
        backoff.advance();
        backoff.reset();
        assert_eq!(backoff.advance(), Duration::from_secs(1));
    }
}
