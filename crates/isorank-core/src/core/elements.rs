use phf::{Map, phf_map};

/// Element symbols indexed by atomic number minus one.
#[rustfmt::skip]
static SYMBOLS: [&str; 118] = [
    "H",                                                                                                  "He",
    "Li", "Be",                                                             "B",  "C",  "N",  "O",  "F",  "Ne",
    "Na", "Mg",                                                             "Al", "Si", "P",  "S",  "Cl", "Ar",
    "K",  "Ca", "Sc", "Ti", "V",  "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr",
    "Rb", "Sr", "Y",  "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te", "I",  "Xe",
    "Cs", "Ba",
    "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu",
                "Hf", "Ta", "W",  "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    "Fr", "Ra",
    "Ac", "Th", "Pa", "U",  "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr",
                "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

#[rustfmt::skip]
static ATOMIC_NUMBERS: Map<&'static str, u8> = phf_map! {
    // --- Period 1-3 ---
    "H" => 1, "He" => 2,
    "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8, "F" => 9, "Ne" => 10,
    "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15, "S" => 16, "Cl" => 17, "Ar" => 18,

    // --- Period 4 ---
    "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22, "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26,
    "Co" => 27, "Ni" => 28, "Cu" => 29, "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33, "Se" => 34,
    "Br" => 35, "Kr" => 36,

    // --- Period 5 ---
    "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43, "Ru" => 44,
    "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49, "Sn" => 50, "Sb" => 51, "Te" => 52,
    "I" => 53, "Xe" => 54,

    // --- Period 6 ---
    "Cs" => 55, "Ba" => 56, "La" => 57, "Ce" => 58, "Pr" => 59, "Nd" => 60, "Pm" => 61, "Sm" => 62,
    "Eu" => 63, "Gd" => 64, "Tb" => 65, "Dy" => 66, "Ho" => 67, "Er" => 68, "Tm" => 69, "Yb" => 70,
    "Lu" => 71, "Hf" => 72, "Ta" => 73, "W" => 74, "Re" => 75, "Os" => 76, "Ir" => 77, "Pt" => 78,
    "Au" => 79, "Hg" => 80, "Tl" => 81, "Pb" => 82, "Bi" => 83, "Po" => 84, "At" => 85, "Rn" => 86,

    // --- Period 7 ---
    "Fr" => 87, "Ra" => 88, "Ac" => 89, "Th" => 90, "Pa" => 91, "U" => 92, "Np" => 93, "Pu" => 94,
    "Am" => 95, "Cm" => 96, "Bk" => 97, "Cf" => 98, "Es" => 99, "Fm" => 100, "Md" => 101, "No" => 102,
    "Lr" => 103, "Rf" => 104, "Db" => 105, "Sg" => 106, "Bh" => 107, "Hs" => 108, "Mt" => 109,
    "Ds" => 110, "Rg" => 111, "Cn" => 112, "Nh" => 113, "Fl" => 114, "Mc" => 115, "Lv" => 116,
    "Ts" => 117, "Og" => 118,
};

/// Read-only bidirectional mapping between element symbols and atomic numbers.
///
/// The data lives in static tables, so a `PeriodicTable` is free to construct.
/// Components that need lookups take it by reference rather than reaching for a
/// global.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodicTable {
    _private: (),
}

impl PeriodicTable {
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Returns the symbol for an atomic number, or `None` outside `1..=118`.
    pub fn symbol(&self, atomic_number: u8) -> Option<&'static str> {
        SYMBOLS.get(usize::from(atomic_number).checked_sub(1)?).copied()
    }

    /// Returns the atomic number for a symbol.
    ///
    /// The lookup tolerates surrounding whitespace and normalizes case, so
    /// `"si"` and `"SI"` both resolve to silicon.
    pub fn number(&self, symbol: &str) -> Option<u8> {
        let symbol = symbol.trim();
        if let Some(&z) = ATOMIC_NUMBERS.get(symbol) {
            return Some(z);
        }
        let mut chars = symbol.chars();
        let first = chars.next()?.to_ascii_uppercase();
        let normalized: String = std::iter::once(first)
            .chain(chars.map(|c| c.to_ascii_lowercase()))
            .collect();
        ATOMIC_NUMBERS.get(normalized.as_str()).copied()
    }
}
