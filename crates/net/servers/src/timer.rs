//! Stopwatch for measuring server response times.

use web_time::Instant;

/// Measures how long a request to a server took, in whole milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct ResponseTimer {
    started: Instant,
}

impl Default for ResponseTimer {
    fn default() -> Self {
        Self::start()
    }
}

impl ResponseTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_elapsed() {
        let timer = ResponseTimer::start();
        std::thread::sleep(Duration::from_millis(15));
        assert!(timer.elapsed_millis() >= 15);
    }
}
