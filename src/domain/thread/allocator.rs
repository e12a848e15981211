//! Thread code allocation.
//!
//! Codes are drawn uniformly at random from `1000..=9999`. A bounded number
//! of random draws is followed by a deterministic wrap-around scan of the
//! whole space, so allocation always terminates and yields a free code
//! whenever one exists.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::foundation::ThreadId;

use super::ThreadError;

/// Smallest code handed out.
pub const MIN_THREAD_CODE: u16 = 1000;
/// Largest code handed out.
pub const MAX_THREAD_CODE: u16 = 9999;
/// Number of codes in the allocation space.
pub const THREAD_CODE_SPACE: usize = (MAX_THREAD_CODE - MIN_THREAD_CODE + 1) as usize;

/// Supplies candidate codes to the allocator.
pub trait CandidateSource: Send {
    fn next_candidate(&mut self) -> ThreadId;
}

/// Uniform random candidates over the allocation space.
pub struct RandomCandidates {
    rng: StdRng,
}

impl RandomCandidates {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomCandidates {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateSource for RandomCandidates {
    fn next_candidate(&mut self) -> ThreadId {
        let code = self.rng.gen_range(MIN_THREAD_CODE..=MAX_THREAD_CODE);
        ThreadId::from_code_wrapping(code)
    }
}

/// Hands out thread codes not held by any open thread.
pub struct ThreadIdAllocator {
    source: Box<dyn CandidateSource>,
    max_attempts: usize,
}

impl ThreadIdAllocator {
    pub fn new(source: impl CandidateSource + 'static, max_attempts: usize) -> Self {
        Self {
            source: Box::new(source),
            max_attempts,
        }
    }

    /// Random allocation with `max_attempts` draws before scanning.
    pub fn random(max_attempts: usize) -> Self {
        Self::new(RandomCandidates::new(), max_attempts)
    }

    /// Returns a code for which `is_taken` is false.
    ///
    /// # Errors
    ///
    /// `ThreadError::IdSpaceExhausted` when every code in the space is taken.
    pub fn allocate(
        &mut self,
        is_taken: impl Fn(&ThreadId) -> bool,
    ) -> Result<ThreadId, ThreadError> {
        let mut last_code = None;

        for _ in 0..self.max_attempts {
            let candidate = self.source.next_candidate();
            let code = candidate.code();
            if !in_space(code) {
                continue;
            }
            if !is_taken(&candidate) {
                return Ok(candidate);
            }
            last_code = Some(code);
        }

        // Scan starts right after the last collision, or at the bottom.
        let first = last_code.map_or(0, |code| code - MIN_THREAD_CODE + 1);
        let space = THREAD_CODE_SPACE as u16;
        for offset in 0..space {
            let code = MIN_THREAD_CODE + (first + offset) % space;
            let candidate = ThreadId::from_code_wrapping(code);
            if !is_taken(&candidate) {
                tracing::debug!(
                    thread_id = %candidate,
                    attempts = self.max_attempts,
                    "Random draws collided, allocated by scan"
                );
                return Ok(candidate);
            }
        }

        Err(ThreadError::IdSpaceExhausted(THREAD_CODE_SPACE))
    }
}

fn in_space(code: u16) -> bool {
    (MIN_THREAD_CODE..=MAX_THREAD_CODE).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Replays a fixed list of codes forever.
    struct Scripted {
        codes: Vec<ThreadId>,
        next: usize,
    }

    impl Scripted {
        fn new(codes: &[&str]) -> Self {
            Self {
                codes: codes.iter().map(|c| ThreadId::parse(c).unwrap()).collect(),
                next: 0,
            }
        }
    }

    impl CandidateSource for Scripted {
        fn next_candidate(&mut self) -> ThreadId {
            let id = self.codes[self.next % self.codes.len()];
            self.next += 1;
            id
        }
    }

    fn id(code: &str) -> ThreadId {
        ThreadId::parse(code).unwrap()
    }

    #[test]
    fn random_candidates_stay_in_space() {
        let mut source = RandomCandidates::seeded(7);
        for _ in 0..2_000 {
            assert!(in_space(source.next_candidate().code()));
        }
    }

    #[test]
    fn first_free_candidate_wins() {
        let mut allocator = ThreadIdAllocator::new(Scripted::new(&["4821", "1234"]), 8);
        let taken: HashSet<_> = [id("4821")].into_iter().collect();

        assert_eq!(allocator.allocate(|c| taken.contains(c)), Ok(id("1234")));
    }

    #[test]
    fn forced_collision_falls_back_to_scan() {
        let mut allocator = ThreadIdAllocator::new(Scripted::new(&["4821"]), 5);
        let taken: HashSet<_> = [id("4821"), id("4822")].into_iter().collect();

        assert_eq!(allocator.allocate(|c| taken.contains(c)), Ok(id("4823")));
    }

    #[test]
    fn scan_wraps_around_the_space() {
        let mut allocator = ThreadIdAllocator::new(Scripted::new(&["9999"]), 3);
        let taken: HashSet<_> = [id("9999")].into_iter().collect();

        assert_eq!(allocator.allocate(|c| taken.contains(c)), Ok(id("1000")));
    }

    #[test]
    fn out_of_space_candidates_are_skipped() {
        let mut allocator = ThreadIdAllocator::new(Scripted::new(&["0000", "0999"]), 4);

        let got = allocator.allocate(|_| false).unwrap();
        assert_eq!(got, id("1000"));
    }

    #[test]
    fn zero_attempts_still_allocates() {
        let mut allocator = ThreadIdAllocator::new(Scripted::new(&["5000"]), 0);
        assert_eq!(allocator.allocate(|_| false), Ok(id("1000")));
    }

    #[test]
    fn finds_the_single_free_code() {
        let mut allocator = ThreadIdAllocator::new(Scripted::new(&["2000"]), 16);
        let free = id("7777");

        assert_eq!(allocator.allocate(|c| *c != free), Ok(free));
    }

    #[test]
    fn full_space_is_reported() {
        let mut allocator = ThreadIdAllocator::random(16);
        assert_eq!(
            allocator.allocate(|_| true),
            Err(ThreadError::IdSpaceExhausted(9000))
        );
    }
}
