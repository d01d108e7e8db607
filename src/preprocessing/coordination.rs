//! Координационные числа позиций

use crate::error::{DescriptorError, Result};
use crate::structure::Structure;

/// Структура -> координационное число каждой позиции, по порядку
pub trait CoordinationClassifier: Send + Sync {
    fn classify(&self, structure: &Structure) -> Result<Vec<u32>>;
}

/// Геометрический классификатор по степеням окисления.
///
/// Катион считает анионы, анион - катионы, нейтральная позиция - все
/// остальные позиции. Соседями считаются все, кто не дальше
/// `d_min * (1 + tolerance)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffClassifier {
    tolerance: f64,
}

impl CutoffClassifier {
    pub const DEFAULT_TOLERANCE: f64 = 0.2;

    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for CutoffClassifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOLERANCE)
    }
}

fn is_counter_ion(own: i32, other: i32) -> bool {
    match own.signum() {
        0 => true,
        sign => other.signum() == -sign,
    }
}

impl CoordinationClassifier for CutoffClassifier {
    fn classify(&self, structure: &Structure) -> Result<Vec<u32>> {
        let charges = structure
            .sites()
            .iter()
            .enumerate()
            .map(|(i, site)| {
                site.oxidation_state.ok_or_else(|| {
                    DescriptorError::Structure(format!(
                        "site {} ({}) has no oxidation state",
                        i, site.element
                    ))
                })
            })
            .collect::<Result<Vec<i32>>>()?;

        let volume = structure.lattice().volume();
        if !volume.is_finite() || volume < 1e-8 {
            return Err(DescriptorError::Structure(format!(
                "lattice is degenerate (volume {})",
                volume
            )));
        }

        (0..structure.len())
            .map(|i| {
                let counter_ions: Vec<usize> = (0..structure.len())
                    .filter(|&j| is_counter_ion(charges[i], charges[j]))
                    .collect();

                // любой найденный образ ограничивает d_min сверху
                let bound = counter_ions
                    .iter()
                    .flat_map(|&j| structure.image_distances(i, j))
                    .filter(|d| *d > 1e-8)
                    .fold(f64::INFINITY, f64::min);
                if !bound.is_finite() {
                    return Err(DescriptorError::Structure(format!(
                        "site {} ({}) has no counter-ions",
                        i,
                        structure.sites()[i].element
                    )));
                }

                let radius = bound * (1.0 + self.tolerance);
                let distances: Vec<f64> = counter_ions
                    .iter()
                    .flat_map(|&j| structure.distances_within(i, j, radius))
                    .filter(|d| *d > 1e-8)
                    .collect();

                let nearest = distances.iter().copied().fold(bound, f64::min);
                let cutoff = nearest * (1.0 + self.tolerance);
                Ok(distances.iter().filter(|d| **d <= cutoff).count() as u32)
            })
            .collect()
    }
}

/// Берет готовые координационные числа из позиций
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecomputedClassifier;

impl CoordinationClassifier for PrecomputedClassifier {
    fn classify(&self, structure: &Structure) -> Result<Vec<u32>> {
        structure
            .sites()
            .iter()
            .enumerate()
            .map(|(i, site)| {
                site.coordination_number
                    .filter(|cn| *cn > 0)
                    .ok_or_else(|| {
                        DescriptorError::Structure(format!(
                            "site {} ({}) has no coordination number",
                            i, site.element
                        ))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Lattice, Site};

    fn rocksalt() -> Structure {
        let na = [[0.0, 0.0, 0.0], [0.5, 0.5, 0.0], [0.5, 0.0, 0.5], [0.0, 0.5, 0.5]];
        let cl = [[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 0.5], [0.5, 0.5, 0.5]];
        let sites = na
            .iter()
            .map(|c| Site::new("Na", *c))
            .chain(cl.iter().map(|c| Site::new("Cl", *c)))
            .collect();

        Structure::new(Lattice::cubic(5.64), sites).with_oxidation_states([("Na", 1), ("Cl", -1)])
    }

    #[test]
    fn test_rocksalt_is_octahedral() {
        let cns = CutoffClassifier::default().classify(&rocksalt()).unwrap();
        assert_eq!(cns, vec![6; 8]);
    }

    #[test]
    fn test_cesium_chloride_is_cubic() {
        let structure = Structure::new(
            Lattice::cubic(4.12),
            vec![Site::new("Cs", [0.0; 3]), Site::new("Cl", [0.5; 3])],
        )
        .with_oxidation_states([("Cs", 1), ("Cl", -1)]);

        let cns = CutoffClassifier::default().classify(&structure).unwrap();
        assert_eq!(cns, vec![8, 8]);
    }

    #[test]
    fn test_zincblende_is_tetrahedral() {
        let zn = [[0.0, 0.0, 0.0], [0.5, 0.5, 0.0], [0.5, 0.0, 0.5], [0.0, 0.5, 0.5]];
        let sites = zn
            .iter()
            .map(|c| Site::new("Zn", *c))
            .chain(zn.iter().map(|c| Site::new("S", [c[0] + 0.25, c[1] + 0.25, c[2] + 0.25])))
            .collect();
        let structure =
            Structure::new(Lattice::cubic(5.41), sites).with_oxidation_states([("Zn", 2), ("S", -2)]);

        let cns = CutoffClassifier::default().classify(&structure).unwrap();
        assert_eq!(cns, vec![4; 8]);
    }

    #[test]
    fn test_missing_oxidation_state() {
        let structure = Structure::new(
            Lattice::cubic(4.12),
            vec![Site::new("Cs", [0.0; 3]), Site::new("Cl", [0.5; 3])],
        );

        let err = CutoffClassifier::default().classify(&structure).unwrap_err();
        assert!(matches!(err, DescriptorError::Structure(_)));
    }

    #[test]
    fn test_no_counter_ions() {
        let structure = Structure::new(Lattice::cubic(3.0), vec![Site::new("Na", [0.0; 3])])
            .with_oxidation_states([("Na", 1)]);

        let err = CutoffClassifier::default().classify(&structure).unwrap_err();
        assert!(matches!(err, DescriptorError::Structure(_)));
    }

    #[test]
    fn test_neutral_sites_count_everything() {
        // простая кубическая решетка: 6 ближайших образов самой позиции
        let structure = Structure::new(Lattice::cubic(3.0), vec![Site::new("Po", [0.0; 3])])
            .with_oxidation_states([("Po", 0)]);

        let cns = CutoffClassifier::default().classify(&structure).unwrap();
        assert_eq!(cns, vec![6]);
    }

    #[test]
    fn test_skewed_basis() {
        let structure = Structure::new(
            Lattice::new([[3.0, 0.0, 0.0], [6.0, 3.0, 0.0], [0.0, 0.0, 3.0]]),
            vec![Site::new("Po", [0.0; 3])],
        )
        .with_oxidation_states([("Po", 0)]);

        let cns = CutoffClassifier::default().classify(&structure).unwrap();
        assert_eq!(cns, vec![6]);
    }

    #[test]
    fn test_cesium_chloride_in_skewed_basis() {
        let a = 4.12;
        let structure = Structure::new(
            Lattice::new([[a, 0.0, 0.0], [2.0 * a, a, 0.0], [0.0, 0.0, a]]),
            vec![Site::new("Cs", [0.0; 3]), Site::new("Cl", [-0.5, 0.5, 0.5])],
        )
        .with_oxidation_states([("Cs", 1), ("Cl", -1)]);

        let cns = CutoffClassifier::default().classify(&structure).unwrap();
        assert_eq!(cns, vec![8, 8]);
    }

    #[test]
    fn test_degenerate_lattice() {
        let structure = Structure::new(
            Lattice::new([[3.0, 0.0, 0.0], [6.0, 0.0, 0.0], [0.0, 0.0, 3.0]]),
            vec![Site::new("Po", [0.0; 3])],
        )
        .with_oxidation_states([("Po", 0)]);

        let err = CutoffClassifier::default().classify(&structure).unwrap_err();
        assert!(matches!(err, DescriptorError::Structure(_)));
    }

    #[test]
    fn test_precomputed() {
        let structure = Structure::new(
            Lattice::cubic(3.0),
            vec![
                Site::new("Al", [0.0; 3]).with_coordination_number(6),
                Site::new("Al", [0.5; 3]).with_coordination_number(4),
            ],
        );
        assert_eq!(PrecomputedClassifier.classify(&structure).unwrap(), vec![6, 4]);

        let structure = Structure::new(Lattice::cubic(3.0), vec![Site::new("Al", [0.0; 3])]);
        assert!(PrecomputedClassifier.classify(&structure).is_err());
    }
}
