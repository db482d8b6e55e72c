use phf::{Map, phf_map};
use std::fmt;

/// A chemical element from the periodic table.
///
/// Elements are interned in a static table, so an `Element` is a cheap copyable
/// handle to its symbol, atomic number and standard atomic mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// The canonical symbol (e.g., "C", "Si").
    pub symbol: &'static str,
    /// The atomic number.
    pub atomic_number: u8,
    /// The standard atomic mass in daltons.
    pub mass: f64,
}

static ELEMENTS: Map<&'static str, (u8, f64)> = phf_map! {
    "H" => (1, 1.008),
    "He" => (2, 4.0026),
    "Li" => (3, 6.94),
    "Be" => (4, 9.0122),
    "B" => (5, 10.81),
    "C" => (6, 12.011),
    "N" => (7, 14.007),
    "O" => (8, 15.999),
    "F" => (9, 18.998),
    "Ne" => (10, 20.180),
    "Na" => (11, 22.990),
    "Mg" => (12, 24.305),
    "Al" => (13, 26.982),
    "Si" => (14, 28.085),
    "P" => (15, 30.974),
    "S" => (16, 32.06),
    "Cl" => (17, 35.45),
    "Ar" => (18, 39.948),
    "K" => (19, 39.098),
    "Ca" => (20, 40.078),
    "Ti" => (22, 47.867),
    "Cr" => (24, 51.996),
    "Mn" => (25, 54.938),
    "Fe" => (26, 55.845),
    "Co" => (27, 58.933),
    "Ni" => (28, 58.693),
    "Cu" => (29, 63.546),
    "Zn" => (30, 65.38),
    "Ga" => (31, 69.723),
    "Ge" => (32, 72.630),
    "As" => (33, 74.922),
    "Se" => (34, 78.971),
    "Br" => (35, 79.904),
    "Kr" => (36, 83.798),
    "Ag" => (47, 107.87),
    "Sn" => (50, 118.71),
    "I" => (53, 126.90),
    "Xe" => (54, 131.29),
    "Pt" => (78, 195.08),
    "Au" => (79, 196.97),
    "Hg" => (80, 200.59),
    "Pb" => (82, 207.2),
};

impl Element {
    /// Looks up an element by its symbol.
    ///
    /// The lookup normalises capitalisation, so `"si"`, `"SI"` and `"Si"` all
    /// resolve to silicon.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let canonical = canonical_symbol(symbol.trim())?;
        ELEMENTS
            .get_entry(canonical.as_str())
            .map(|(&symbol, &(atomic_number, mass))| Element {
                symbol,
                atomic_number,
                mass,
            })
    }

    /// Infers an element from a particle name such as `"C1"`, `"CL"` or `"_Si"`.
    ///
    /// Digits and punctuation are stripped. A lowercase second letter marks a
    /// two-letter symbol (`"Si"`); otherwise the first letter is tried on its own and
    /// the two-letter reading is the fallback (`"CA"` is carbon, `"ZN"` is zinc).
    /// Names that match nothing yield `None`.
    pub fn infer(name: &str) -> Option<Self> {
        let letters: Vec<char> = name.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        let first = *letters.first()?;
        let two_letter = letters
            .get(1)
            .and_then(|&second| Self::from_symbol(&format!("{first}{second}")));

        if letters.get(1).is_some_and(|c| c.is_ascii_lowercase()) && two_letter.is_some() {
            return two_letter;
        }
        Self::from_symbol(&first.to_string()).or(two_letter)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

fn canonical_symbol(symbol: &str) -> Option<String> {
    let mut chars = symbol.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let mut canonical = first.to_ascii_uppercase().to_string();
    canonical.extend(chars.map(|c| c.to_ascii_lowercase()));
    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_symbol_is_case_insensitive() {
        assert_eq!(Element::from_symbol("si").unwrap().atomic_number, 14);
        assert_eq!(Element::from_symbol("SI").unwrap().atomic_number, 14);
        assert_eq!(Element::from_symbol("Si").unwrap().symbol, "Si");
    }

    #[test]
    fn from_symbol_rejects_unknown_symbols() {
        assert!(Element::from_symbol("Xx").is_none());
        assert!(Element::from_symbol("").is_none());
        assert!(Element::from_symbol("1").is_none());
    }

    #[test]
    fn infer_strips_digits_and_prefers_one_letter_for_ambiguous_names() {
        assert_eq!(Element::infer("C1").unwrap().symbol, "C");
        assert_eq!(Element::infer("H12").unwrap().symbol, "H");
        assert_eq!(Element::infer("CA").unwrap().symbol, "C");
    }

    #[test]
    fn infer_uses_two_letter_symbols_when_one_letter_fails() {
        assert_eq!(Element::infer("Au").unwrap().symbol, "Au");
        assert_eq!(Element::infer("_Si").unwrap().symbol, "Si");
        assert_eq!(Element::infer("Zn2").unwrap().symbol, "Zn");
        assert_eq!(Element::infer("ZN").unwrap().symbol, "Zn");
    }

    #[test]
    fn infer_returns_none_for_ghost_names() {
        assert!(Element::infer("G").is_none());
        assert!(Element::infer("123").is_none());
    }

    #[test]
    fn display_prints_symbol() {
        assert_eq!(Element::from_symbol("cl").unwrap().to_string(), "Cl");
    }
}
