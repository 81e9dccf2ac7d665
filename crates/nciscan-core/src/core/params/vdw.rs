use super::{ParamLoadError, read_file};
use std::collections::HashMap;
use std::path::Path;

/// Van der Waals radius per element symbol, in Angstroms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VdwRadii {
    radii: HashMap<String, f64>,
}

impl VdwRadii {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = read_file(path)?;
        let radii: HashMap<String, f64> =
            toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        Ok(Self { radii })
    }

    pub fn radius(&self, element: &str) -> Option<f64> {
        self.radii.get(element).copied()
    }
}

impl FromIterator<(String, f64)> for VdwRadii {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            radii: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_radii() -> VdwRadii {
    [
        ("H", 1.2),
        ("C", 1.7),
        ("N", 1.55),
        ("O", 1.52),
        ("S", 1.8),
        ("F", 1.47),
        ("Cl", 1.75),
        ("Br", 1.85),
        ("I", 1.98),
        ("P", 1.8),
        ("Na", 2.27),
        ("K", 2.75),
        ("Zn", 1.39),
        ("Fe", 1.94),
        ("Mg", 1.73),
        ("Ca", 2.31),
        ("Ni", 1.63),
    ]
    .into_iter()
    .map(|(el, r)| (el.to_string(), r))
    .collect()
}
