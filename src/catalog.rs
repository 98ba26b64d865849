//! Closed lists of selectable substations and NOCS codes.
//!
//! Names are spelled exactly as they appear on the meter sheet, including
//! doubled and trailing spaces, because selections are matched verbatim.

use crate::reports::Scope;
use tracing::warn;

pub const SUBSTATIONS: [&str; 89] = [
    "Moghbazar 132/33/11KV S/S",
    "Moghbazar 33/11KV S/S",
    "Green Road 33/11KV S/S",
    "Lalmatia  33/11KV S/S",
    "Tejgoan 33/11KV S/S",
    "T&T 33/11 KV",
    "Dhanmondi 132/33/11KV S/S",
    "Dhanmondi 33/11KV S/S",
    "Kawranbazar  33/11KV S/S",
    "New Ramna   33/11KV S/S",
    "Ullon 132/33/11KV S/S",
    "Ullon local 33/11KV S/S",
    "Kakrail  33/11KV S/S",
    "Khillgaon  33/11KV S/S",
    "Goran  33/11KV S/S",
    "Taltola  33/11KV S/S",
    "Satmasjid 33/11KV S/S",
    "Jigatola 33/11KV S/S",
    "Kallyanpur 33/11KV S/S",
    "Kamrangirchar 132/33/11KV S/S",
    "Kamrangirchar 33/11KV S/S",
    "Lalbagh old 33/11KV S/S",
    "Banshal 33/11KV S/S",
    "Japan Garden 33/11 KV",
    "Azimpur 33/11 KV",
    "SHERE BANGLA NAGAR  33/11 KV S/S ",
    "LALBAGH   132/33 KV S/S ",
    "LALBAGH   33/11 KV S/S ",
    "Asad Gate 33/11 KV S/S",
    "Shatmasjid 132/33 KV S/S",
    "Banasree 33/11 SS",
    "Mugdhapara Hospital 33/11 KV SS",
    "DMC 33/11 KV SS",
    "Green Road Dormatory 33/11 SS",
    "BSMMU 33/11KV S/S",
    "Dhaka Uddyan 33/11 KV S/S",
    "Dhaka University 132/33 KV S/S",
    "Dhaka University 33/11 KV S/S",
    "Monipuripara 33/11 KV S/S",
    "BGB 33/11 KV S/S",
    "BB Aveneu 33/11 KV S/S",
    "Jigatola 132/33 KV S/S",
    "Jigatola New 33/11 KV S/S",
    "Ispahani 33/11 KV SS",
    "Bangabhaban 132/11KV S/S",
    "Narinda 132/33KV S/S",
    "Narinda 33/11KV S/S",
    "Kumertuly  33/11KV S/S",
    "Maniknagar 132/33 S/S",
    "Maniknagar 33/11 KV SS",
    "Madarteck 132/33KV S/S",
    "Madarteck 33/11KV S/S",
    "Kazla  33/11KV S/S",
    "Shyampur  132/33KV S/S",
    "Shyampur  33/11KV S/S",
    "Shyampur BISIC  33/11KV S/S",
    "Postogola 33/11KV S/S",
    "Fatullah 33/11KV S/S",
    "Sitalakhya  132/33KV S/S",
    "Sitalakhya  33/11KV S/S",
    "Narayangonj (west) BSCIC33/11KV S/S",
    "Char Syedpur 33/11KV S/S",
    "Siddhirganj 132/33/11KV S/S",
    "Siddhirganj  33/11KV S/S",
    "Demra 33/11KV S/S",
    "Mondalpara 33/11KV S/S",
    "Khanpur 33/11KV S/S",
    "Matuail 33/11KV S/S",
    "Matuail 132/33 KV S/S",
    "Sarulia  33/11KV S/S",
    "Maniknagar 33/11KV S/S",
    "IG Gate GIS 33/11 kV",
    "Motijheel old 33/11 kV",
    "Mitford 33/11 kV",
    "Biddyut Bhaban 33/11 KV",
    "Nandalalpur 33/11 kV",
    "Dapa 33/11 kV",
    "Laxmi Narayan Cotton Mill 33/11 kV",
    "Amulia 33/11 kv",
    "New Fatullah 132/33 KV SS",
    "New Fatullah 33/11 KV SS",
    "P & T 33/11 KV SS",
    "Motijheel 132/33 KV SS",
    "Motijheel 33/11 KV SS (new)",
    "Kazla 132/133 KV SS",
    "Kamalapur Railway 33/11 KV SS",
    "Char Syedpur 132/33KV S/S",
    "Char Syedpur 33/11 KV S/S New",
    "Postogola 132/33 KV S/S",
];

pub const NOCS_CODES: [&str; 36] = [
    "Motijheel",
    "Khilgaon",
    "Lalbag",
    "Kazla",
    "Postogola",
    "Banglabazar",
    "N.Gonj (West)",
    "Siddirgonj",
    "Bashabo",
    "Narinda",
    "Maniknagar",
    "Jurain",
    "Shyampur",
    "Swamibag",
    "Bangshal",
    "N.Gonj (East)",
    "Fatullah",
    "Mugdapara",
    "Tejgaon",
    "Satmasjid",
    "Paribag",
    "Kakrail",
    "Moghbazar",
    "Dhanmondi",
    "Ramna",
    "Shyamoli",
    "Shere b.nagar",
    "Rajarbag",
    "Jigatola",
    "Azimpur",
    "Demra",
    "Matuail",
    "Sytalakhya",
    "Kamrangirchar",
    "Banosree",
    "Adabor",
];

pub fn is_known_substation(name: &str) -> bool {
    SUBSTATIONS.contains(&name)
}

pub fn is_known_nocs(code: &str) -> bool {
    NOCS_CODES.contains(&code)
}

/// Whether a scope selects something from the closed lists. Unknown
/// selections are logged; building a report for them yields no rows.
pub fn check_scope(scope: &Scope) -> bool {
    let known = match scope {
        Scope::All => true,
        Scope::BySubstation(name) => is_known_substation(name),
        Scope::ByNocs(code) => is_known_nocs(code),
    };
    if !known {
        warn!(scope = %scope, "selection is not in the catalog");
    }
    known
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substation_names_match_verbatim() {
        assert!(is_known_substation("LALBAGH   33/11 KV S/S "));
        assert!(!is_known_substation("LALBAGH 33/11 KV S/S"));
        assert!(is_known_substation("Kazla  33/11KV S/S"));
    }

    #[test]
    fn codes_are_case_sensitive() {
        assert!(is_known_nocs("N.Gonj (West)"));
        assert!(!is_known_nocs("motijheel"));
    }

    #[test]
    fn checks_scopes() {
        assert!(check_scope(&Scope::All));
        assert!(check_scope(&Scope::ByNocs("Demra".into())));
        assert!(!check_scope(&Scope::BySubstation("NonExistent".into())));
    }
}
