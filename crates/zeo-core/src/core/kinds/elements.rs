use phf::{Map, phf_map};

pub const MAX_ATOMIC_NUMBER: i64 = 118;

static SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

// Elements common in framework materials, keyed by upper-case symbol.
static COMMON: Map<&'static str, i64> = phf_map! {
    "H" => 1,
    "C" => 6,
    "N" => 7,
    "O" => 8,
    "F" => 9,
    "NA" => 11,
    "MG" => 12,
    "AL" => 13,
    "SI" => 14,
    "P" => 15,
    "S" => 16,
    "CL" => 17,
    "K" => 19,
    "CA" => 20,
    "TI" => 22,
    "FE" => 26,
    "CU" => 29,
    "ZN" => 30,
    "GE" => 32,
    "GA" => 31,
};

static CPK: Map<i64, [f64; 4]> = phf_map! {
    1i64 => [1.0, 1.0, 1.0, 1.0],
    6i64 => [0.3, 0.3, 0.3, 1.0],
    7i64 => [0.2, 0.2, 1.0, 1.0],
    8i64 => [1.0, 0.1, 0.1, 1.0],
    13i64 => [0.75, 0.65, 0.65, 1.0],
    14i64 => [0.94, 0.78, 0.63, 1.0],
};

/// Chemical symbol for an atomic number.
pub fn symbol(number: i64) -> Option<&'static str> {
    if (1..=MAX_ATOMIC_NUMBER).contains(&number) {
        Some(SYMBOLS[(number - 1) as usize])
    } else {
        None
    }
}

/// Atomic number for a chemical symbol, case-insensitively.
///
/// Labels such as `Si1` or `O_2` resolve to the leading alphabetic symbol.
pub fn atomic_number(label: &str) -> Option<i64> {
    let alpha: String = label
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if alpha.is_empty() {
        return None;
    }
    let upper = alpha.to_ascii_uppercase();
    if let Some(&n) = COMMON.get(upper.as_str()) {
        return Some(n);
    }
    SYMBOLS
        .iter()
        .position(|s| s.eq_ignore_ascii_case(&alpha))
        .map(|i| i as i64 + 1)
}

/// Default drawing colour of an element.
pub fn default_color(number: i64) -> Option<[f64; 4]> {
    CPK.get(&number).copied()
}
