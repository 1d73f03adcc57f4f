use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of the throwaway password given to created accounts.
pub const PASSWORD_LENGTH: usize = 16;

/// Generates a random ASCII word of letters only.
#[must_use]
pub fn random_word<R: Rng + ?Sized>(length: usize, rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .map(char::from)
        .filter(char::is_ascii_alphabetic)
        .take(length)
        .collect()
}
