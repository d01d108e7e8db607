//! Табличный набор признаков

use std::collections::{HashMap, HashSet};

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};

/// Имя единственной колонки у таблицы-ряда (признак -> значение)
pub const VALUE_COLUMN: &str = "value";

/// Одна строка признаков: только присутствующие значения, по порядку
pub type Record = Vec<(String, f64)>;

/// Таблица с уникальными именами строк и колонок.
///
/// Ячейка `None` означает отсутствующее значение и никогда не заменяется нулем.
/// В JSON отсутствующая ячейка пишется как `null`; нечисловые результаты
/// (`NaN`, бесконечности) туда не попадают, см. [`DataFrame::ensure_finite`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameRepr", into = "FrameRepr")]
pub struct DataFrame {
    index: Vec<String>,
    columns: Vec<String>,
    values: Array2<Option<f64>>,
    /// Создана через `from_series`: имена признаков лежат в строках
    series: bool,
}

impl DataFrame {
    pub fn new(
        index: Vec<String>,
        columns: Vec<String>,
        values: Array2<Option<f64>>,
    ) -> Result<Self> {
        if values.dim() != (index.len(), columns.len()) {
            return Err(DescriptorError::Shape(format!(
                "{} row labels and {} column labels for a {:?} table",
                index.len(),
                columns.len(),
                values.dim()
            )));
        }
        ensure_unique("column", &columns)?;
        ensure_unique("row", &index)?;

        Ok(Self {
            index,
            columns,
            values,
            series: false,
        })
    }

    /// Таблица из именованных колонок одинаковой длины
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let (names, data): (Vec<String>, Vec<Vec<f64>>) = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .unzip();

        let nrows = data.first().map_or(0, Vec::len);
        if let Some((name, column)) = names.iter().zip(&data).find(|(_, c)| c.len() != nrows) {
            return Err(DescriptorError::Shape(format!(
                "column '{}' has {} rows, expected {}",
                name,
                column.len(),
                nrows
            )));
        }

        let values = Array2::from_shape_fn((nrows, names.len()), |(i, j)| Some(data[j][i]));
        Self::new(default_index(nrows), names, values)
    }

    /// Одна строка на запись, колонки объединяются в порядке первого появления
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for record in &records {
            for (name, _) in record {
                if !positions.contains_key(name) {
                    positions.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let mut values = Array2::from_elem((records.len(), columns.len()), None);
        for (i, record) in records.iter().enumerate() {
            for (name, value) in record {
                let cell = &mut values[[i, positions[name]]];
                if cell.is_some() {
                    return Err(DescriptorError::Composition(format!(
                        "feature '{}' appears twice in row {}",
                        name, i
                    )));
                }
                *cell = Some(*value);
            }
        }

        Self::new(default_index(records.len()), columns, values)
    }

    /// Ряд признаков как таблица из одной колонки `value`
    pub fn from_series(record: Record) -> Result<Self> {
        let (index, values): (Vec<String>, Vec<f64>) = record.into_iter().unzip();
        let values = Array2::from_shape_fn((values.len(), 1), |(i, _)| Some(values[i]));
        let mut frame = Self::new(index, vec![VALUE_COLUMN.to_string()], values)?;
        frame.series = true;
        Ok(frame)
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<Option<f64>> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_position(&self, label: &str) -> Option<usize> {
        self.index.iter().position(|r| r == label)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, Option<f64>>> {
        self.column_position(name).map(|j| self.values.column(j))
    }

    /// Значение по имени строки и колонки
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.row_position(row)?;
        let j = self.column_position(column)?;
        self.values[[i, j]]
    }

    /// Значение по номеру строки и имени колонки
    pub fn iat(&self, row: usize, column: &str) -> Option<f64> {
        let j = self.column_position(column)?;
        self.values.get((row, j)).copied().flatten()
    }

    /// Ряд получается только из `from_series`, имя колонки роли не играет
    pub fn is_series(&self) -> bool {
        self.series
    }

    /// Ошибка на первой ячейке с `NaN` или бесконечностью
    pub fn ensure_finite(&self) -> Result<()> {
        for ((i, j), value) in self.values.indexed_iter() {
            if let Some(value) = value.filter(|v| !v.is_finite()) {
                return Err(DescriptorError::evaluation(
                    &self.columns[j],
                    format!("non-finite value {} in row '{}'", value, self.index[i]),
                ));
            }
        }
        Ok(())
    }

    /// Разворачивает таблицу в одну запись.
    ///
    /// У ряда имена признаков совпадают с именами строк, иначе каждая ячейка
    /// получает имя `"{row} {column}"`. Отсутствующие ячейки пропускаются.
    pub fn to_record(&self) -> Result<Record> {
        let series = self.is_series();
        let mut seen = HashSet::new();
        let mut record = Vec::new();

        for (i, row) in self.index.iter().enumerate() {
            for (j, column) in self.columns.iter().enumerate() {
                let Some(value) = self.values[[i, j]] else {
                    continue;
                };
                let name = if series {
                    row.clone()
                } else {
                    format!("{} {}", row, column)
                };
                if !seen.insert(name.clone()) {
                    return Err(DescriptorError::Composition(format!(
                        "flattened feature '{}' is ambiguous",
                        name
                    )));
                }
                record.push((name, value));
            }
        }

        Ok(record)
    }
}

pub(crate) fn default_index(n: usize) -> Vec<String> {
    (0..n).map(|i| i.to_string()).collect()
}

fn ensure_unique(axis: &str, labels: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    match labels.iter().find(|label| !seen.insert(label.as_str())) {
        Some(label) => Err(DescriptorError::Composition(format!(
            "duplicate {} name '{}'",
            axis, label
        ))),
        None => Ok(()),
    }
}

#[derive(Serialize, Deserialize)]
struct FrameRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<Vec<String>>,
    columns: Vec<String>,
    data: Vec<Vec<Option<f64>>>,
}

impl TryFrom<FrameRepr> for DataFrame {
    type Error = DescriptorError;

    fn try_from(repr: FrameRepr) -> Result<Self> {
        let nrows = repr.data.len();
        let ncols = repr.columns.len();
        if let Some((i, row)) = repr.data.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(DescriptorError::Shape(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                ncols
            )));
        }

        let values = Array2::from_shape_vec((nrows, ncols), repr.data.into_iter().flatten().collect())
            .map_err(|e| DescriptorError::Shape(e.to_string()))?;
        let index = repr.index.unwrap_or_else(|| default_index(nrows));
        Self::new(index, repr.columns, values)
    }
}

impl From<DataFrame> for FrameRepr {
    fn from(frame: DataFrame) -> Self {
        Self {
            index: Some(frame.index),
            columns: frame.columns,
            data: frame.values.rows().into_iter().map(|row| row.to_vec()).collect(),
        }
    }
}
