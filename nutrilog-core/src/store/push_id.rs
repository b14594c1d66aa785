//! Time-ordered child keys for `push`.
//!
//! A key is 8 characters of millisecond timestamp followed by 12 random
//! characters, all from an alphabet that sorts in ASCII order. Keys made in
//! the same millisecond increment the random part so they still sort in
//! creation order.

use rand::Rng;
use std::sync::Mutex;

const ALPHABET: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushIdState>,
}

#[derive(Debug, Default)]
struct PushIdState {
    last_millis: i64,
    last_random: [u8; 12],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a key for the current time.
    pub fn next_id(&self) -> String {
        self.next_id_at(chrono::Utc::now().timestamp_millis())
    }

    /// Generates a key for `millis` since the epoch.
    pub fn next_id_at(&self, millis: i64) -> String {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if millis == state.last_millis {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::rng();
            for slot in state.last_random.iter_mut() {
                *slot = rng.random_range(0..64u8);
            }
            state.last_millis = millis;
        }

        let mut id = String::with_capacity(20);
        let mut ts = millis.max(0) as u64;
        let mut time_chars = [0u8; 8];
        for slot in time_chars.iter_mut().rev() {
            *slot = ALPHABET[(ts % 64) as usize];
            ts /= 64;
        }
        id.extend(time_chars.iter().map(|&b| b as char));
        id.extend(state.last_random.iter().map(|&i| ALPHABET[i as usize] as char));
        id
    }
}

/// Adds one to a base-64 digit array, carrying from the right.
fn increment(digits: &mut [u8; 12]) {
    for digit in digits.iter_mut().rev() {
        if *digit < 63 {
            *digit += 1;
            return;
        }
        *digit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_shape() {
        let id = PushIdGenerator::new().next_id();
        assert_eq!(id.len(), 20);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_ids_sort_by_time() {
        let generator = PushIdGenerator::new();
        let early = generator.next_id_at(1_700_000_000_000);
        let late = generator.next_id_at(1_700_000_000_001);
        assert!(early < late);
    }

    #[test]
    fn test_same_millisecond_ids_are_ordered() {
        let generator = PushIdGenerator::new();
        let ids: Vec<String> = (0..50).map(|_| generator.next_id_at(42)).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_increment_carries() {
        let mut digits = [0u8; 12];
        digits[11] = 63;
        increment(&mut digits);
        assert_eq!(digits[11], 0);
        assert_eq!(digits[10], 1);
    }
}
