//! Pronounceable folder names for fresh checkouts.
//!
//! Names are two random words from the phonetic alphabet, e.g.
//! `tango-niner`. They are not derived from the URL, so unrelated sources
//! never clash on a naming convention.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

/// Letters and digits as spoken over the radio.
pub const PHONETICS: [&str; 36] = [
    "alfa", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliett",
    "kilo", "lima", "mike", "november", "oscar", "papa", "quebec", "romeo", "sierra", "tango",
    "uniform", "victor", "whiskey", "xray", "yankee", "zulu", "zero", "wun", "too", "tree",
    "fower", "five", "six", "seven", "ait", "niner",
];

pub fn mkname<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = PHONETICS.choose(rng).copied().unwrap_or("alfa");
    let second = PHONETICS.choose(rng).copied().unwrap_or("alfa");
    format!("{}-{}", first, second)
}

/// Draw names until `<rootdir>/<name>` does not exist yet.
pub fn unused_folder<R: Rng + ?Sized>(rootdir: &Path, rng: &mut R) -> (String, PathBuf) {
    loop {
        let name = mkname(rng);
        let folder = rootdir.join(&name);
        if !folder.exists() {
            return (name, folder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mkname_is_two_phonetic_words() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let name = mkname(&mut rng);
            let (first, second) = name.split_once('-').unwrap();
            assert!(PHONETICS.contains(&first));
            assert!(PHONETICS.contains(&second));
        }
    }

    #[test]
    fn test_unused_folder_skips_existing_paths() {
        let temp = tempfile::TempDir::new().unwrap();
        // occupy every name the seeded generator produces first
        let mut probe = StdRng::seed_from_u64(42);
        let taken: Vec<String> = (0..5).map(|_| mkname(&mut probe)).collect();
        for name in &taken {
            std::fs::create_dir_all(temp.path().join(name)).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(42);
        let (name, folder) = unused_folder(temp.path(), &mut rng);
        assert!(!taken.contains(&name));
        assert_eq!(folder, temp.path().join(&name));
        assert!(!folder.exists());
    }
}
