//! Character names: random picks and the on-screen keyboard.

use std::collections::BTreeSet;

use rand::Rng;

/// Longest name a character can have.
pub const MAX_NAME_LEN: usize = 16;

/// Names offered by the random pick.
pub const NAME_POOL: [&str; 20] = [
    "Arin", "Bram", "Cora", "Dain", "Elow", "Fenn", "Garen", "Hira", "Ivo", "Jora", "Kael",
    "Lyra", "Mira", "Nox", "Orin", "Pella", "Quin", "Rook", "Sera", "Taro",
];

/// A random name no existing save uses.
///
/// When the pool is exhausted a roman numeral is appended to a pooled
/// name (`Lyra II`, `Lyra III`, ...), trimming the base so the result
/// fits [`MAX_NAME_LEN`].
pub fn random_name<R: Rng>(rng: &mut R, taken: &BTreeSet<String>) -> String {
    let free: Vec<&str> = NAME_POOL.iter().copied().filter(|n| !taken.contains(*n)).collect();
    if !free.is_empty() {
        return free[rng.random_range(0..free.len())].to_string();
    }
    let base = NAME_POOL[rng.random_range(0..NAME_POOL.len())];
    let mut n = 2;
    loop {
        let numeral = roman(n);
        let room = MAX_NAME_LEN.saturating_sub(numeral.len() + 1);
        let trimmed: String = base.chars().take(room).collect();
        let candidate = format!("{trimmed} {numeral}").trim().to_string();
        if !candidate.is_empty() && !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Roman numeral for `n` (`n >= 1`).
pub fn roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, symbol) in TABLE {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// Clip a typed name to [`MAX_NAME_LEN`] characters.
pub fn clip_name(name: &str) -> String {
    name.trim().chars().take(MAX_NAME_LEN).collect()
}

// ---------------------------------------------------------------------------
// On-screen keyboard
// ---------------------------------------------------------------------------

/// One key of the name-entry keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Types a character (letters honor shift).
    Char(char),
    /// Types a space.
    Space,
    /// Deletes the last character.
    Backspace,
    /// Toggles upper case.
    Shift,
    /// Accepts the name.
    Done,
    /// Returns to the name choice.
    Cancel,
}

const LETTER_ROWS: [&str; 4] = ["1234567890", "abcdefghij", "klmnopqrst", "uvwxyz-'"];
const CONTROL_ROW: [Key; 5] = [Key::Space, Key::Backspace, Key::Shift, Key::Done, Key::Cancel];

/// Number of keyboard rows.
pub fn rows() -> usize {
    LETTER_ROWS.len() + 1
}

/// Number of keys in `row`.
pub fn row_len(row: usize) -> usize {
    match LETTER_ROWS.get(row) {
        Some(letters) => letters.chars().count(),
        None if row == LETTER_ROWS.len() => CONTROL_ROW.len(),
        None => 0,
    }
}

/// The key under the cursor.
pub fn key_at(row: usize, col: usize) -> Option<Key> {
    match LETTER_ROWS.get(row) {
        Some(letters) => letters.chars().nth(col).map(Key::Char),
        None if row == LETTER_ROWS.len() => CONTROL_ROW.get(col).copied(),
        None => None,
    }
}

/// Apply a typing key to `name`. Returns false if the key does not type.
pub fn type_key(name: &mut String, key: Key, shift: bool) -> bool {
    match key {
        Key::Char(c) => {
            if name.chars().count() < MAX_NAME_LEN {
                name.push(if shift { c.to_ascii_uppercase() } else { c });
            }
            true
        }
        Key::Space => {
            if !name.is_empty() && name.chars().count() < MAX_NAME_LEN {
                name.push(' ');
            }
            true
        }
        Key::Backspace => {
            name.pop();
            true
        }
        Key::Shift | Key::Done | Key::Cancel => false,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn roman_numerals() {
        assert_eq!(roman(2), "II");
        assert_eq!(roman(4), "IV");
        assert_eq!(roman(14), "XIV");
        assert_eq!(roman(1994), "MCMXCIV");
    }

    #[test]
    fn random_name_avoids_taken() {
        let mut rng = StdRng::seed_from_u64(3);
        let taken: BTreeSet<String> = NAME_POOL[1..].iter().map(|s| s.to_string()).collect();
        assert_eq!(random_name(&mut rng, &taken), "Arin");
    }

    #[test]
    fn exhausted_pool_gets_numerals() {
        let mut rng = StdRng::seed_from_u64(9);
        let taken: BTreeSet<String> = NAME_POOL.iter().map(|s| s.to_string()).collect();
        let name = random_name(&mut rng, &taken);
        assert!(name.ends_with(" II"), "{name}");
        assert!(name.len() <= MAX_NAME_LEN);
    }

    #[test]
    fn keyboard_typing() {
        let mut name = String::new();
        assert!(type_key(&mut name, Key::Space, false));
        assert!(name.is_empty());
        type_key(&mut name, key_at(1, 0).unwrap(), true);
        type_key(&mut name, key_at(2, 1).unwrap(), false);
        assert_eq!(name, "Al");
        type_key(&mut name, Key::Backspace, false);
        assert_eq!(name, "A");
        assert!(!type_key(&mut name, Key::Done, false));
        assert_eq!(key_at(4, 3), Some(Key::Done));
        assert_eq!(row_len(3), 8);
        assert_eq!(key_at(5, 0), None);
    }

    #[test]
    fn names_are_clipped() {
        assert_eq!(clip_name("  Abcdefghijklmnopqrs "), "Abcdefghijklmnop");
    }
}
