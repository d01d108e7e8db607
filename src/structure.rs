//! Модель кристаллической структуры

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Векторы решетки a, b, c по строкам (ангстремы)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lattice {
    matrix: [[f64; 3]; 3],
}

impl Lattice {
    pub fn new(matrix: [[f64; 3]; 3]) -> Self {
        Self { matrix }
    }

    pub fn cubic(a: f64) -> Self {
        Self::orthorhombic(a, a, a)
    }

    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self::new([[a, 0.0, 0.0], [0.0, b, 0.0], [0.0, 0.0, c]])
    }

    pub fn matrix(&self) -> &[[f64; 3]; 3] {
        &self.matrix
    }

    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        dot(a, cross(b, c)).abs()
    }

    /// Расстояния между соседними плоскостями (100), (010), (001)
    pub fn interplanar_spacings(&self) -> [f64; 3] {
        let [a, b, c] = self.matrix;
        let volume = self.volume();
        [cross(b, c), cross(c, a), cross(a, b)].map(|normal| volume / norm(normal))
    }

    pub fn to_cartesian(&self, frac: [f64; 3]) -> [f64; 3] {
        let mut cart = [0.0; 3];
        for (k, row) in self.matrix.iter().enumerate() {
            for (i, value) in row.iter().enumerate() {
                cart[i] += frac[k] * value;
            }
        }
        cart
    }
}

fn cross(u: [f64; 3], v: [f64; 3]) -> [f64; 3] {
    [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ]
}

fn dot(u: [f64; 3], v: [f64; 3]) -> f64 {
    u.iter().zip(v).map(|(x, y)| x * y).sum()
}

fn norm(u: [f64; 3]) -> f64 {
    dot(u, u).sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub element: String,
    pub frac_coords: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxidation_state: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordination_number: Option<u32>,
}

impl Site {
    pub fn new(element: impl Into<String>, frac_coords: [f64; 3]) -> Self {
        Self {
            element: element.into(),
            frac_coords,
            oxidation_state: None,
            coordination_number: None,
        }
    }

    pub fn with_oxidation_state(mut self, oxidation_state: i32) -> Self {
        self.oxidation_state = Some(oxidation_state);
        self
    }

    pub fn with_coordination_number(mut self, coordination_number: u32) -> Self {
        self.coordination_number = Some(coordination_number);
        self
    }
}

/// Неизменяемая структура: решетка и упорядоченный список позиций
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    lattice: Lattice,
    sites: Vec<Site>,
}

impl Structure {
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> Self {
        Self { lattice, sites }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Проставляет степени окисления по элементам; остальные позиции не меняются
    pub fn with_oxidation_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        let states: HashMap<String, i32> = states
            .into_iter()
            .map(|(element, state)| (element.into(), state))
            .collect();

        for site in &mut self.sites {
            if let Some(state) = states.get(&site.element) {
                site.oxidation_state = Some(*state);
            }
        }
        self
    }

    /// Расстояния от позиции `i` до позиции `j` в 27 соседних ячейках.
    ///
    /// Для `i == j` в результат попадает и нулевое расстояние.
    pub fn image_distances(&self, i: usize, j: usize) -> Vec<f64> {
        let a = self.sites[i].frac_coords;
        let b = self.sites[j].frac_coords;

        let mut distances = Vec::with_capacity(27);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let shift = [dx as f64, dy as f64, dz as f64];
                    let delta = [
                        b[0] + shift[0] - a[0],
                        b[1] + shift[1] - a[1],
                        b[2] + shift[2] - a[2],
                    ];
                    distances.push(norm(self.lattice.to_cartesian(delta)));
                }
            }
        }
        distances
    }

    /// Все расстояния от позиции `i` до образов позиции `j` не дальше `radius`.
    ///
    /// Число перебираемых ячеек по каждой оси считается из межплоскостного
    /// расстояния, поэтому результат не зависит от выбора базиса решетки.
    /// Для вырожденной решетки результат пуст.
    pub fn distances_within(&self, i: usize, j: usize, radius: f64) -> Vec<f64> {
        let a = self.sites[i].frac_coords;
        let b = self.sites[j].frac_coords;
        let delta: [f64; 3] = std::array::from_fn(|k| {
            let d = b[k] - a[k];
            d - d.round()
        });

        let spacings = self.lattice.interplanar_spacings();
        if spacings.iter().any(|s| !s.is_finite() || *s < 1e-8) {
            return Vec::new();
        }
        let reach = spacings.map(|s| (radius / s + 0.5).ceil() as i64);

        let mut distances = Vec::new();
        for dx in -reach[0]..=reach[0] {
            for dy in -reach[1]..=reach[1] {
                for dz in -reach[2]..=reach[2] {
                    let shifted = [
                        delta[0] + dx as f64,
                        delta[1] + dy as f64,
                        delta[2] + dz as f64,
                    ];
                    let distance = norm(self.lattice.to_cartesian(shifted));
                    if distance <= radius {
                        distances.push(distance);
                    }
                }
            }
        }
        distances
    }
}
