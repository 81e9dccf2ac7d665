use super::{ParamLoadError, read_file};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Which of the two X-H···π definitions is active for a run.
///
/// Both read `{El}H_PI` keys from the threshold table, but with different
/// parameter layouts, so the table must know which one to validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XhPiDefinition {
    /// Ring-projection definition keyed by the donor element.
    #[default]
    Geometric,
    /// Older definition anchored on an aromatic atom, keyed by the donor element.
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    fn from_token(token: &str) -> Self {
        token
            .parse::<f64>()
            .map(ParamValue::Number)
            .unwrap_or_else(|_| ParamValue::Text(token.to_string()))
    }
}

struct ParamList<'a> {
    key: &'a str,
    values: Vec<ParamValue>,
}

impl<'a> ParamList<'a> {
    fn from_toml(key: &'a str, value: &toml::Value) -> Result<Self, ParamLoadError> {
        let malformed = |reason: &str| ParamLoadError::MalformedThreshold {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let values = match value {
            toml::Value::String(s) => s.split_whitespace().map(ParamValue::from_token).collect(),
            toml::Value::Integer(i) => vec![ParamValue::Number(*i as f64)],
            toml::Value::Float(f) => vec![ParamValue::Number(*f)],
            toml::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    toml::Value::Integer(i) => Ok(ParamValue::Number(*i as f64)),
                    toml::Value::Float(f) => Ok(ParamValue::Number(*f)),
                    toml::Value::String(s) => Ok(ParamValue::from_token(s.trim())),
                    _ => Err(malformed("array items must be numbers or strings")),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(malformed("expected a string, number or array")),
        };
        Ok(Self { key, values })
    }

    fn number(&self, index: usize) -> Result<f64, ParamLoadError> {
        match self.values.get(index) {
            Some(ParamValue::Number(n)) => Ok(*n),
            Some(ParamValue::Text(t)) => Err(ParamLoadError::MalformedThreshold {
                key: self.key.to_string(),
                reason: format!("value #{} ('{t}') is not a number", index + 1),
            }),
            None => Err(ParamLoadError::MalformedThreshold {
                key: self.key.to_string(),
                reason: format!("expected at least {} values, found {}", index + 1, self.values.len()),
            }),
        }
    }

    fn text(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(ParamValue::Text(t)) => Some(t),
            _ => None,
        }
    }
}

trait FromParamList: Sized {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError>;
}

/// Donor-angle limit with a separate value for quaternary nitrogen donors.
pub trait DonorAngleLimit {
    fn donor_angle_max_for(&self, donor_type: &str) -> f64;
}

/// Angle rule for hydrogen bonds onto an N or O acceptor: the H-acceptor-substituent
/// angle must fall inside a window.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptorAngleRule {
    pub donor_angle_max: f64,
    pub donor_angle_max_n4: f64,
    pub acceptor_angle_min: f64,
    pub acceptor_angle_max: f64,
}

/// Angle rule for hydrogen bonds onto a hydroxyl oxygen, checked against both
/// the acceptor's own hydrogen and its heavy substituent.
#[derive(Debug, Clone, PartialEq)]
pub struct HydroxylAngleRule {
    pub donor_angle_max: f64,
    pub donor_angle_max_n4: f64,
    pub hydrogen_angle_min: f64,
    pub substituent_angle_min: f64,
}

impl DonorAngleLimit for AcceptorAngleRule {
    fn donor_angle_max_for(&self, donor_type: &str) -> f64 {
        if donor_type == "N.4" {
            self.donor_angle_max_n4
        } else {
            self.donor_angle_max
        }
    }
}

impl DonorAngleLimit for HydroxylAngleRule {
    fn donor_angle_max_for(&self, donor_type: &str) -> f64 {
        if donor_type == "N.4" {
            self.donor_angle_max_n4
        } else {
            self.donor_angle_max
        }
    }
}

fn donor_angles(list: &ParamList, offset: usize, with_n4: bool) -> Result<(f64, f64, usize), ParamLoadError> {
    let donor = list.number(offset)?;
    if with_n4 {
        Ok((donor, list.number(offset + 1)?, offset + 2))
    } else {
        Ok((donor, donor, offset + 1))
    }
}

impl AcceptorAngleRule {
    fn parse(list: &ParamList, offset: usize, with_n4: bool) -> Result<Self, ParamLoadError> {
        let (donor_angle_max, donor_angle_max_n4, next) = donor_angles(list, offset, with_n4)?;
        Ok(Self {
            donor_angle_max,
            donor_angle_max_n4,
            acceptor_angle_min: list.number(next)?,
            acceptor_angle_max: list.number(next + 1)?,
        })
    }
}

impl HydroxylAngleRule {
    fn parse(list: &ParamList, offset: usize, with_n4: bool) -> Result<Self, ParamLoadError> {
        let (donor_angle_max, donor_angle_max_n4, next) = donor_angles(list, offset, with_n4)?;
        Ok(Self {
            donor_angle_max,
            donor_angle_max_n4,
            hydrogen_angle_min: list.number(next)?,
            substituent_angle_min: list.number(next + 1)?,
        })
    }
}

/// Hydrogen bond thresholds. The distance limit is absolute, not VdW based.
#[derive(Debug, Clone, PartialEq)]
pub struct HBondParams<R> {
    pub max_distance: f64,
    pub rule: R,
}

/// Electrostatic thresholds: a distance window from `min_distance` up to
/// `buffer` plus the VdW sum, followed by the hydrogen bond angle rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectrostaticParams<R> {
    pub min_distance: f64,
    pub buffer: f64,
    pub rule: R,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChHeteroParams {
    pub buffer: f64,
    pub near_distance: f64,
    pub far_distance: f64,
    pub donor_angle_max: f64,
    pub hydrogen_angle_min: f64,
}

impl FromParamList for ChHeteroParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            near_distance: list.number(1)?,
            far_distance: list.number(2)?,
            donor_angle_max: list.number(3)?,
            hydrogen_angle_min: list.number(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChOxygenParams {
    pub buffer: f64,
    pub hydrogen_distance_max: f64,
    pub donor_angle_max: f64,
    pub hydrogen_angle_min: f64,
}

impl FromParamList for ChOxygenParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            hydrogen_distance_max: list.number(1)?,
            donor_angle_max: list.number(2)?,
            hydrogen_angle_min: list.number(3)?,
        })
    }
}

/// A VdW buffer plus a single angle limit, shared by several families.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferAngleParams {
    pub buffer: f64,
    pub angle: f64,
}

impl FromParamList for BufferAngleParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            angle: list.number(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferParams {
    pub buffer: f64,
}

impl FromParamList for BufferParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VdwContactParams {
    pub buffer: f64,
    pub overlap_max: f64,
    pub near_distance: f64,
    pub shell_min: f64,
    pub shell_max: f64,
}

impl FromParamList for VdwContactParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            overlap_max: list.number(1)?,
            near_distance: list.number(2)?,
            shell_min: list.number(3)?,
            shell_max: list.number(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PiStackingParams {
    pub buffer: f64,
    pub normal_angle_max: f64,
    pub offset_angle_min: f64,
}

impl FromParamList for PiStackingParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            normal_angle_max: list.number(1)?,
            offset_angle_min: list.number(2)?,
        })
    }
}

/// How hydrogen substituents take part in dipole detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DipoleHydrogenMode {
    /// Hydrogen counts as a dipole terminus on both sides.
    Add,
    /// Hydrogen substituents are ignored.
    Except,
    /// Substituents are used as they are, without extending the type sets.
    #[default]
    Keep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DipoleParams {
    pub buffer: f64,
    pub vector_angle_min: f64,
    pub first_angle_max: f64,
    pub second_angle_max: f64,
    pub charge_difference_min: f64,
    pub hydrogen_mode: DipoleHydrogenMode,
}

impl FromParamList for DipoleParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        let hydrogen_mode = match list.text(5) {
            Some("add") => DipoleHydrogenMode::Add,
            Some("except") => DipoleHydrogenMode::Except,
            Some("keep") | Some("none") => DipoleHydrogenMode::Keep,
            Some(other) => {
                return Err(ParamLoadError::MalformedThreshold {
                    key: list.key.to_string(),
                    reason: format!("unknown hydrogen mode '{other}'"),
                });
            }
            None if list.values.len() > 5 => {
                return Err(ParamLoadError::MalformedThreshold {
                    key: list.key.to_string(),
                    reason: "hydrogen mode must be 'add', 'except' or 'keep'".to_string(),
                });
            }
            None => DipoleHydrogenMode::Keep,
        };
        Ok(Self {
            buffer: list.number(0)?,
            vector_angle_min: list.number(1)?,
            first_angle_max: list.number(2)?,
            second_angle_max: list.number(3)?,
            charge_difference_min: list.number(4)?,
            hydrogen_mode,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultipoleParams {
    pub buffer: f64,
    pub approach_angle_min: f64,
    pub approach_angle_max: f64,
    pub projection_angle_max: f64,
    pub substituent_angle_min: f64,
    pub charge_difference_min: f64,
}

impl FromParamList for MultipoleParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            approach_angle_min: list.number(1)?,
            approach_angle_max: list.number(2)?,
            projection_angle_max: list.number(3)?,
            substituent_angle_min: list.number(4)?,
            charge_difference_min: list.number(5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XhPiParams {
    pub buffer: f64,
    pub ring_coefficient: f64,
    pub near_distance: f64,
    pub far_distance: f64,
    pub projection_angle_max: f64,
    pub hydrogen_angle_min: f64,
}

impl FromParamList for XhPiParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            ring_coefficient: list.number(1)?,
            near_distance: list.number(2)?,
            far_distance: list.number(3)?,
            projection_angle_max: list.number(4)?,
            hydrogen_angle_min: list.number(5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyXhPiParams {
    pub buffer: f64,
    pub angle_min: f64,
    pub angle_max: f64,
    pub dihedral_max: f64,
    pub outer_dihedral_min: f64,
}

impl FromParamList for LegacyXhPiParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            angle_min: list.number(1)?,
            angle_max: list.number(2)?,
            dihedral_max: list.number(3)?,
            outer_dihedral_min: list.number(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XhFluorineParams {
    pub buffer: f64,
    pub hydrogen_distance: f64,
    pub donor_angle_max: f64,
    pub hydrogen_angle_min: f64,
    pub water_hydrogen_distance: f64,
}

impl FromParamList for XhFluorineParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            hydrogen_distance: list.number(1)?,
            donor_angle_max: list.number(2)?,
            hydrogen_angle_min: list.number(3)?,
            water_hydrogen_distance: list.number(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XhHalogenParams {
    pub buffer: f64,
    pub hydrogen_angle_max: f64,
    pub donor_angle_max: f64,
    pub hydrogen_donor_angle_max: f64,
    pub carbon_angle_max: f64,
}

impl FromParamList for XhHalogenParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            hydrogen_angle_max: list.number(1)?,
            donor_angle_max: list.number(2)?,
            hydrogen_donor_angle_max: list.number(3)?,
            carbon_angle_max: list.number(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HalogenPiParams {
    pub buffer: f64,
    pub ring_coefficient: f64,
    pub angle_min: f64,
    pub dihedral_min: f64,
}

impl FromParamList for HalogenPiParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            ring_coefficient: list.number(1)?,
            angle_min: list.number(2)?,
            dihedral_min: list.number(3)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NhSulfurParams {
    pub buffer: f64,
    pub near_distance: f64,
    pub far_distance: f64,
    pub near_window: (f64, f64),
    pub far_window: (f64, f64),
}

impl FromParamList for NhSulfurParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            near_distance: list.number(1)?,
            far_distance: list.number(2)?,
            near_window: (list.number(3)?, list.number(4)?),
            far_window: (list.number(5)?, list.number(6)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SulfurPiParams {
    pub buffer: f64,
    pub ring_coefficient: f64,
    pub normal_angle_min: f64,
    pub terminal_angle_min: f64,
    pub dihedral_min: f64,
}

impl FromParamList for SulfurPiParams {
    fn from_list(list: &ParamList) -> Result<Self, ParamLoadError> {
        Ok(Self {
            buffer: list.number(0)?,
            ring_coefficient: list.number(1)?,
            normal_angle_min: list.number(2)?,
            terminal_angle_min: list.number(3)?,
            dihedral_min: list.number(4)?,
        })
    }
}

/// The `{El}H_PI` entries, validated against the active definition.
#[derive(Debug, Clone, PartialEq)]
pub enum XhPiThresholds {
    Geometric(BTreeMap<String, XhPiParams>),
    Legacy(BTreeMap<String, LegacyXhPiParams>),
}

/// Every interaction-family threshold, validated at load time.
///
/// Fixed-name families are plain fields. Families whose key embeds an element
/// symbol are stored per element and looked up on demand; a variant that is
/// never present in the file only becomes an error when a detector needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    pub hbond_nh: HBondParams<AcceptorAngleRule>,
    pub hbond_nh_hydroxyl: HBondParams<HydroxylAngleRule>,
    pub hbond_oh: HBondParams<AcceptorAngleRule>,
    pub hbond_oh_hydroxyl: HBondParams<HydroxylAngleRule>,
    pub electrostatic: ElectrostaticParams<AcceptorAngleRule>,
    pub electrostatic_hydroxyl: ElectrostaticParams<HydroxylAngleRule>,
    pub ch_oxygen: ChOxygenParams,
    pub vdw: VdwContactParams,
    pub pi_stacking: PiStackingParams,
    pub dipole: DipoleParams,
    pub multipole: MultipoleParams,
    pub halogen_pi: HalogenPiParams,
    pub nh_sulfur: NhSulfurParams,
    pub sulfur_oxygen: BufferParams,
    pub sulfur_nitrogen: BufferParams,
    pub sulfur_sulfur: BufferAngleParams,
    pub sulfur_fluorine: BufferAngleParams,
    pub sulfur_pi: SulfurPiParams,
    pub metal: BufferParams,
    pub ion: BufferParams,
    ch_hetero: BTreeMap<String, ChHeteroParams>,
    sh_acceptor: BTreeMap<String, BufferAngleParams>,
    halogen: BTreeMap<String, BufferAngleParams>,
    xh_fluorine: BTreeMap<String, XhFluorineParams>,
    xh_halogen: BTreeMap<String, XhHalogenParams>,
    xh_sulfur: BTreeMap<String, BufferAngleParams>,
    xh_pi: XhPiThresholds,
}

const HB_NH: &str = "HB_NH_(N,O)";
const HB_NH_OH: &str = "HB_NH_OH";
const HB_OH: &str = "HB_OH_(N,O)";
const HB_OH_OH: &str = "HB_OH_OH";
const ELEC: &str = "Elec_(NH,OH)_(N,O)";
const ELEC_OH: &str = "Elec_(N,O)H_OH";
const CH_O: &str = "CH_O";
const VDW: &str = "vdW";
const PI_PI: &str = "PI_PI";
const DIPO: &str = "Dipo";
const OMULPOL: &str = "OMulPol";
const HAL_PI: &str = "Hal_PI_(X)";
const NH_S: &str = "NH_S";
const S_O: &str = "S_O";
const S_N: &str = "S_N";
const S_S: &str = "S_S";
const S_F: &str = "S_F";
const S_PI: &str = "S_PI";
const METAL: &str = "(Met)_(X)";
const ION: &str = "(Ion)_(X)";

const FIXED_KEYS: &[&str] = &[
    HB_NH, HB_NH_OH, HB_OH, HB_OH_OH, ELEC, ELEC_OH, CH_O, VDW, PI_PI, DIPO, OMULPOL, HAL_PI,
    NH_S, S_O, S_N, S_S, S_F, S_PI, METAL, ION,
];

fn element_variant<'k>(key: &'k str, prefix: &str, suffix: &str) -> Option<&'k str> {
    key.strip_prefix(prefix)?
        .strip_suffix(suffix)
        .filter(|el| !el.is_empty() && el.chars().all(|c| c.is_ascii_alphabetic()))
}

impl ThresholdTable {
    pub fn load(path: &Path, definition: XhPiDefinition) -> Result<Self, ParamLoadError> {
        let content = read_file(path)?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_table(&table, definition)
    }

    pub fn from_table(table: &toml::Table, definition: XhPiDefinition) -> Result<Self, ParamLoadError> {
        let list = |key: &'static str| -> Result<ParamList<'static>, ParamLoadError> {
            let value = table.get(key).ok_or_else(|| ParamLoadError::MissingThreshold {
                key: key.to_string(),
            })?;
            ParamList::from_toml(key, value)
        };
        let hb_nh = list(HB_NH)?;
        let hb_nh_oh = list(HB_NH_OH)?;
        let hb_oh = list(HB_OH)?;
        let hb_oh_oh = list(HB_OH_OH)?;
        let elec = list(ELEC)?;
        let elec_oh = list(ELEC_OH)?;

        let mut result = Self {
            hbond_nh: HBondParams {
                max_distance: hb_nh.number(0)?,
                rule: AcceptorAngleRule::parse(&hb_nh, 1, true)?,
            },
            hbond_nh_hydroxyl: HBondParams {
                max_distance: hb_nh_oh.number(0)?,
                rule: HydroxylAngleRule::parse(&hb_nh_oh, 1, true)?,
            },
            hbond_oh: HBondParams {
                max_distance: hb_oh.number(0)?,
                rule: AcceptorAngleRule::parse(&hb_oh, 1, false)?,
            },
            hbond_oh_hydroxyl: HBondParams {
                max_distance: hb_oh_oh.number(0)?,
                rule: HydroxylAngleRule::parse(&hb_oh_oh, 1, false)?,
            },
            electrostatic: ElectrostaticParams {
                min_distance: elec.number(0)?,
                buffer: elec.number(1)?,
                rule: AcceptorAngleRule::parse(&elec, 2, true)?,
            },
            electrostatic_hydroxyl: ElectrostaticParams {
                min_distance: elec_oh.number(0)?,
                buffer: elec_oh.number(1)?,
                rule: HydroxylAngleRule::parse(&elec_oh, 2, true)?,
            },
            ch_oxygen: parse(&list(CH_O)?)?,
            vdw: parse(&list(VDW)?)?,
            pi_stacking: parse(&list(PI_PI)?)?,
            dipole: parse(&list(DIPO)?)?,
            multipole: parse(&list(OMULPOL)?)?,
            halogen_pi: parse(&list(HAL_PI)?)?,
            nh_sulfur: parse(&list(NH_S)?)?,
            sulfur_oxygen: parse(&list(S_O)?)?,
            sulfur_nitrogen: parse(&list(S_N)?)?,
            sulfur_sulfur: parse(&list(S_S)?)?,
            sulfur_fluorine: parse(&list(S_F)?)?,
            sulfur_pi: parse(&list(S_PI)?)?,
            metal: parse(&list(METAL)?)?,
            ion: parse(&list(ION)?)?,
            ch_hetero: BTreeMap::new(),
            sh_acceptor: BTreeMap::new(),
            halogen: BTreeMap::new(),
            xh_fluorine: BTreeMap::new(),
            xh_halogen: BTreeMap::new(),
            xh_sulfur: BTreeMap::new(),
            xh_pi: match definition {
                XhPiDefinition::Geometric => XhPiThresholds::Geometric(BTreeMap::new()),
                XhPiDefinition::Legacy => XhPiThresholds::Legacy(BTreeMap::new()),
            },
        };

        for (key, value) in table {
            if FIXED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let entry = ParamList::from_toml(key, value)?;
            if let Some(el) = element_variant(key, "", "H_Hal_(X)") {
                result.xh_halogen.insert(el.to_string(), parse(&entry)?);
            } else if let Some(el) = element_variant(key, "", "H_F") {
                result.xh_fluorine.insert(el.to_string(), parse(&entry)?);
            } else if let Some(el) = element_variant(key, "", "H_PI") {
                match &mut result.xh_pi {
                    XhPiThresholds::Geometric(map) => {
                        map.insert(el.to_string(), parse(&entry)?);
                    }
                    XhPiThresholds::Legacy(map) => {
                        map.insert(el.to_string(), parse(&entry)?);
                    }
                }
            } else if let Some(el) = element_variant(key, "", "H_S").filter(|el| matches!(*el, "O" | "S")) {
                result.xh_sulfur.insert(el.to_string(), parse(&entry)?);
            } else if let Some(el) = element_variant(key, "SH_", "").filter(|el| matches!(*el, "N" | "O")) {
                result.sh_acceptor.insert(el.to_string(), parse(&entry)?);
            } else if let Some(el) = element_variant(key, "CH_", "").filter(|el| matches!(*el, "N" | "S")) {
                result.ch_hetero.insert(el.to_string(), parse(&entry)?);
            } else if let Some(el) = element_variant(key, "Hal_(X)_", "") {
                result.halogen.insert(el.to_string(), parse(&entry)?);
            } else {
                warn!(key = %key, "Ignoring unknown threshold entry.");
            }
        }

        Ok(result)
    }

    pub fn ch_hetero(&self, acceptor_element: &str) -> Option<&ChHeteroParams> {
        self.ch_hetero.get(acceptor_element)
    }

    pub fn sh_acceptor(&self, acceptor_element: &str) -> Option<&BufferAngleParams> {
        self.sh_acceptor.get(acceptor_element)
    }

    pub fn halogen(&self, acceptor_element: &str) -> Option<&BufferAngleParams> {
        self.halogen.get(acceptor_element)
    }

    pub fn xh_fluorine(&self, donor_element: &str) -> Option<&XhFluorineParams> {
        self.xh_fluorine.get(donor_element)
    }

    pub fn xh_halogen(&self, donor_element: &str) -> Option<&XhHalogenParams> {
        self.xh_halogen.get(donor_element)
    }

    pub fn xh_sulfur(&self, donor_element: &str) -> Option<&BufferAngleParams> {
        self.xh_sulfur.get(donor_element)
    }

    pub fn xh_pi(&self, donor_element: &str) -> Option<&XhPiParams> {
        match &self.xh_pi {
            XhPiThresholds::Geometric(map) => map.get(donor_element),
            XhPiThresholds::Legacy(_) => None,
        }
    }

    pub fn legacy_xh_pi(&self, donor_element: &str) -> Option<&LegacyXhPiParams> {
        match &self.xh_pi {
            XhPiThresholds::Legacy(map) => map.get(donor_element),
            XhPiThresholds::Geometric(_) => None,
        }
    }

    pub fn xh_pi_definition(&self) -> XhPiDefinition {
        match self.xh_pi {
            XhPiThresholds::Geometric(_) => XhPiDefinition::Geometric,
            XhPiThresholds::Legacy(_) => XhPiDefinition::Legacy,
        }
    }
}

fn parse<T: FromParamList>(list: &ParamList) -> Result<T, ParamLoadError> {
    T::from_list(list)
}

#[cfg(test)]
pub(crate) const SAMPLE_THRESHOLDS: &str = r#"
"HB_NH_(N,O)" = "3.5 60 75 90 180"
"HB_NH_OH" = "3.5 60 75 90 90"
"HB_OH_(N,O)" = "3.5 60 90 180"
"HB_OH_OH" = "3.5 60 90 90"
"CH_N" = "0.5 2.7 3.0 180 120"
"CH_S" = "0.5 2.9 3.2 180 120"
"CH_O" = "0.5 2.7 180 120"
"SH_N" = "0.5 150"
"SH_O" = "0.5 150"
"Elec_(NH,OH)_(N,O)" = "2.5 1.0 60 75 90 180"
"Elec_(N,O)H_OH" = "2.5 1.0 60 75 90 90"
"vdW" = "0.5 0.3 2.0 2.5 3.0"
"PI_PI" = "1.5 30 60"
"Dipo" = "0.5 120 60 60 0.3 except"
"OMulPol" = "0.5 70 110 30 70 0.3"
"CH_PI" = "1.5 1.2 2.8 3.2 30 120"
"NH_PI" = "1.5 1.2 2.6 3.0 30 120"
"OH_PI" = "1.5 1.2 2.6 3.0 30 120"
"SH_PI" = "1.5 1.2 2.9 3.3 30 120"
"Hal_(X)_N" = "0.5 30"
"Hal_(X)_O" = "0.5 30"
"Hal_(X)_S" = "0.5 30"
"CH_F" = "0.5 2.6 180 120 2.6"
"NH_F" = "0.5 2.4 180 120 2.4"
"OH_F" = "0.5 2.4 180 120 2.2"
"SH_F" = "0.5 2.6 180 120 2.6"
"CH_Hal_(X)" = "0.5 120 120 60 60"
"NH_Hal_(X)" = "0.5 120 120 60 60"
"OH_Hal_(X)" = "0.5 120 120 60 60"
"SH_Hal_(X)" = "0.5 120 120 60 60"
"Hal_PI_(X)" = "1.0 1.2 100 60"
"NH_S" = "0.5 2.8 3.2 120 180 140 180"
"OH_S" = "0.5 150"
"SH_S" = "0.5 150"
"S_O" = 0.5
"S_N" = "0.5"
"S_S" = "0.5 150"
"S_F" = "0.5 150"
"S_PI" = "1.0 1.2 60 100 60"
"(Met)_(X)" = 0.8
"(Ion)_(X)" = [0.5]
"#;

#[cfg(test)]
pub(crate) fn sample_table(overrides: &[(&str, &str)], definition: XhPiDefinition) -> ThresholdTable {
    let mut table: toml::Table = toml::from_str(SAMPLE_THRESHOLDS).unwrap();
    for (key, value) in overrides {
        table.insert(key.to_string(), toml::Value::String(value.to_string()));
    }
    ThresholdTable::from_table(&table, definition).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_succeeds_with_all_value_styles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thresholds.toml");
        fs::write(&path, SAMPLE_THRESHOLDS).unwrap();

        let table = ThresholdTable::load(&path, XhPiDefinition::Geometric).unwrap();
        assert_eq!(table.hbond_nh.max_distance, 3.5);
        assert_eq!(table.hbond_nh.rule.donor_angle_max_for("N.3"), 60.0);
        assert_eq!(table.hbond_nh.rule.donor_angle_max_for("N.4"), 75.0);
        assert_eq!(table.sulfur_oxygen.buffer, 0.5);
        assert_eq!(table.ion.buffer, 0.5);
        assert_eq!(table.nh_sulfur.far_window, (140.0, 180.0));
        assert_eq!(table.dipole.hydrogen_mode, DipoleHydrogenMode::Except);
    }

    #[test]
    fn hydroxyl_donor_family_reuses_donor_angle_for_n4() {
        let table = sample_table(&[], XhPiDefinition::Geometric);
        assert_eq!(table.hbond_oh.rule.donor_angle_max_for("N.4"), 60.0);
        assert_eq!(table.hbond_oh.rule.acceptor_angle_min, 90.0);
        assert_eq!(table.hbond_oh_hydroxyl.rule.substituent_angle_min, 90.0);
    }

    #[test]
    fn element_variants_are_collected_per_element() {
        let table = sample_table(&[], XhPiDefinition::Geometric);
        assert!(table.ch_hetero("N").is_some());
        assert!(table.ch_hetero("S").is_some());
        assert!(table.ch_hetero("O").is_none());
        assert!(table.sh_acceptor("O").is_some());
        assert!(table.xh_sulfur("S").is_some());
        assert!(table.xh_sulfur("N").is_none());
        assert!(table.halogen("S").is_some());
        assert_eq!(table.xh_fluorine("O").unwrap().water_hydrogen_distance, 2.2);
        assert!(table.xh_halogen("C").is_some());
        assert_eq!(table.xh_pi("C").unwrap().near_distance, 2.8);
        assert!(table.legacy_xh_pi("C").is_none());
    }

    #[test]
    fn legacy_definition_validates_legacy_layout() {
        let table = sample_table(
            &[("CH_PI", "1.0 100 180 30 60"), ("NH_PI", "1.0 100 180 30 60")],
            XhPiDefinition::Legacy,
        );
        assert_eq!(table.xh_pi_definition(), XhPiDefinition::Legacy);
        assert_eq!(table.legacy_xh_pi("N").unwrap().angle_min, 100.0);
        assert!(table.xh_pi("C").is_none());
    }

    #[test]
    fn load_fails_for_missing_fixed_family() {
        let mut table: toml::Table = toml::from_str(SAMPLE_THRESHOLDS).unwrap();
        table.remove("PI_PI");
        let result = ThresholdTable::from_table(&table, XhPiDefinition::Geometric);
        assert!(matches!(result, Err(ParamLoadError::MissingThreshold { key }) if key == "PI_PI"));
    }

    #[test]
    fn load_fails_for_short_parameter_list() {
        let mut table: toml::Table = toml::from_str(SAMPLE_THRESHOLDS).unwrap();
        table.insert("vdW".into(), toml::Value::String("0.5 0.3".into()));
        let result = ThresholdTable::from_table(&table, XhPiDefinition::Geometric);
        assert!(matches!(result, Err(ParamLoadError::MalformedThreshold { key, .. }) if key == "vdW"));
    }

    #[test]
    fn load_fails_for_text_where_number_expected() {
        let mut table: toml::Table = toml::from_str(SAMPLE_THRESHOLDS).unwrap();
        table.insert("S_S".into(), toml::Value::String("0.5 wide".into()));
        let result = ThresholdTable::from_table(&table, XhPiDefinition::Geometric);
        assert!(matches!(result, Err(ParamLoadError::MalformedThreshold { .. })));
    }

    #[test]
    fn load_fails_for_unknown_dipole_mode() {
        let mut table: toml::Table = toml::from_str(SAMPLE_THRESHOLDS).unwrap();
        table.insert("Dipo".into(), toml::Value::String("0.5 120 60 60 0.3 maybe".into()));
        let result = ThresholdTable::from_table(&table, XhPiDefinition::Geometric);
        assert!(matches!(result, Err(ParamLoadError::MalformedThreshold { key, .. }) if key == "Dipo"));
    }

    #[test]
    fn load_fails_for_missing_file_and_malformed_toml() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ThresholdTable::load(&missing, XhPiDefinition::Geometric),
            Err(ParamLoadError::Io { .. })
        ));

        let malformed = dir.path().join("malformed.toml");
        fs::write(&malformed, "this is not toml").unwrap();
        assert!(matches!(
            ThresholdTable::load(&malformed, XhPiDefinition::Geometric),
            Err(ParamLoadError::Toml { .. })
        ));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let table = sample_table(&[("Cation_PI", "1.0 2.0")], XhPiDefinition::Geometric);
        assert_eq!(table.pi_stacking.normal_angle_max, 30.0);
    }
}
