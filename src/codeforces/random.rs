extern crate rand;

use rand::{thread_rng, Rng};

const FTAA_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Browser fingerprint token sent along with login and submit forms.
pub(crate) fn random_ftaa(length: usize) -> String {
    let mut rng = thread_rng();
    (0..length)
        .map(|_| FTAA_CHARS[rng.gen_range(0..FTAA_CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ftaa_shape() {
        let s = random_ftaa(18);
        assert_eq!(s.len(), 18);
        assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
