//! Frame pacing for the cooperative simulation loop.
//!
//! The loop yields to the host once per frame. `RateLimiter::wait` blocks
//! until the next frame boundary so a demo runs at its target rate no matter
//! how cheap a tick is.

use std::time::{Duration, Instant};

use crate::error::{CoreError, CoreResult};

/// Fixed-rate frame limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    period: Duration,
    next_frame: Option<Instant>,
    frames: u64,
}

impl RateLimiter {
    /// Create a limiter targeting `hz` frames per second.
    pub fn new(hz: f64) -> CoreResult<Self> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "frame rate must be positive",
            });
        }
        Ok(Self {
            period: Duration::from_secs_f64(1.0 / hz),
            next_frame: None,
            frames: 0,
        })
    }

    /// A limiter that never sleeps (headless runs and tests).
    pub fn unpaced() -> Self {
        Self {
            period: Duration::ZERO,
            next_frame: None,
            frames: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_unpaced(&self) -> bool {
        self.period.is_zero()
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Block until the next frame boundary.
    pub fn wait(&mut self) {
        self.frames += 1;
        if self.period.is_zero() {
            return;
        }

        let now = Instant::now();
        let target = match self.next_frame {
            Some(t) => t,
            None => {
                self.next_frame = Some(now + self.period);
                return;
            }
        };

        if now < target {
            std::thread::sleep(target - now);
            self.next_frame = Some(target + self.period);
        } else if now - target > self.period {
            // Fell more than a frame behind: resync instead of bursting.
            self.next_frame = Some(now + self.period);
        } else {
            self.next_frame = Some(target + self.period);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_rate() {
        assert!(RateLimiter::new(0.0).is_err());
        assert!(RateLimiter::new(-60.0).is_err());
        assert!(RateLimiter::new(f64::NAN).is_err());
    }

    #[test]
    fn period_from_rate() {
        let limiter = RateLimiter::new(100.0).unwrap();
        assert_eq!(limiter.period(), Duration::from_millis(10));
    }

    #[test]
    fn unpaced_counts_frames_without_sleeping() {
        let mut limiter = RateLimiter::unpaced();
        let start = Instant::now();
        for _ in 0..1000 {
            limiter.wait();
        }
        assert_eq!(limiter.frames(), 1000);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn paced_frames_take_at_least_the_period() {
        let mut limiter = RateLimiter::new(200.0).unwrap();
        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait();
        }
        // First wait arms the clock; the next four each wait one 5 ms period.
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
