use super::ids::AtomId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tripos bond type. Detection only follows connectivity; the type is kept so
/// a structure can be written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
    Amide,
    Dummy,
    Unknown,
    NotConnected,
}

const TRIPOS_TOKENS: [(BondOrder, &str); 8] = [
    (BondOrder::Single, "1"),
    (BondOrder::Double, "2"),
    (BondOrder::Triple, "3"),
    (BondOrder::Aromatic, "ar"),
    (BondOrder::Amide, "am"),
    (BondOrder::Dummy, "du"),
    (BondOrder::Unknown, "un"),
    (BondOrder::NotConnected, "nc"),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown Tripos bond type '{0}'")]
pub struct ParseBondOrderError(pub String);

impl BondOrder {
    pub fn tripos_token(self) -> &'static str {
        TRIPOS_TOKENS
            .iter()
            .find(|(order, _)| *order == self)
            .map_or("un", |(_, token)| token)
    }
}

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TRIPOS_TOKENS
            .iter()
            .find(|(_, token)| token.eq_ignore_ascii_case(s))
            .map(|(order, _)| *order)
            .ok_or_else(|| ParseBondOrderError(s.to_string()))
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tripos_token())
    }
}

/// An undirected covalent bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1_id: AtomId,
    pub atom2_id: AtomId,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1_id: AtomId, atom2_id: AtomId, order: BondOrder) -> Self {
        Self {
            atom1_id,
            atom2_id,
            order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tripos_tokens_parse_case_insensitively() {
        assert_eq!("ar".parse::<BondOrder>(), Ok(BondOrder::Aromatic));
        assert_eq!("AM".parse::<BondOrder>(), Ok(BondOrder::Amide));
        assert_eq!("nc".parse::<BondOrder>(), Ok(BondOrder::NotConnected));
        assert_eq!("2".parse::<BondOrder>(), Ok(BondOrder::Double));
    }

    #[test]
    fn unknown_tokens_are_rejected_with_the_token() {
        assert_eq!("double".parse::<BondOrder>(), Err(ParseBondOrderError("double".into())));
        assert!("".parse::<BondOrder>().is_err());
    }

    #[test]
    fn display_writes_the_tripos_token() {
        for (order, token) in TRIPOS_TOKENS {
            assert_eq!(order.to_string(), token);
        }
    }
}
