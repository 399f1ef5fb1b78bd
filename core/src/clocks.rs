// Creditline
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Collection of clock implementations.

use time::OffsetDateTime;

/// Generic definition of a clock.
pub trait Clock {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Clock implementation that uses the system clock.
#[derive(Clone, Default)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();

        // Truncate the timestamp to microsecond resolution as this is the resolution supported by
        // timestamps in the PostgreSQL database.  We could do this in the database instead, but
        // then we would get some strange behavior throughout the program.  Better be consistent.
        let nanos = nanos / 1000 * 1000;

        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .expect("nanos must be in range because they come from the current timestamp")
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// A clock frozen at a preconfigured instant.
    ///
    /// Only supports microsecond-level precision, like `SystemClock`.
    pub struct FixedClock {
        /// The instant returned by every reading.
        now: OffsetDateTime,
    }

    impl FixedClock {
        /// Creates a new clock that always returns `now`.
        pub fn new(now: OffsetDateTime) -> Self {
            assert!(now.nanosecond() % 1000 == 0, "Nanosecond precision not supported");
            Self { now }
        }
    }

    impl Clock for FixedClock {
        fn now_utc(&self) -> OffsetDateTime {
            self.now
        }
    }

    /// A clock that returns a monotonically increasing instant every time it is queried.
    ///
    /// Every call to `now_utc` advances the clock by one second, which gives every entity created
    /// in a test a distinct creation timestamp.
    pub struct MonotonicClock {
        /// Current fake time in seconds.
        now_secs: AtomicU64,
    }

    impl MonotonicClock {
        /// Creates a new clock whose first reading is `now_secs` seconds after the epoch.
        pub fn new(now_secs: u64) -> Self {
            Self { now_secs: AtomicU64::new(now_secs) }
        }
    }

    impl Clock for MonotonicClock {
        fn now_utc(&self) -> OffsetDateTime {
            let now_secs = self.now_secs.fetch_add(1, Ordering::SeqCst);
            OffsetDateTime::from_unix_timestamp(i64::try_from(now_secs).unwrap()).unwrap()
        }
    }

}
