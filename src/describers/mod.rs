/// Генераторы дескрипторов

pub mod func_generator;
pub mod multi;
pub mod site_property;

pub use func_generator::FuncGenerator;
pub use multi::MultiDescriber;
pub use site_property::DistinctSiteProperty;

use crate::error::Result;
use crate::frame::DataFrame;

/// Общий контракт: один вход -> таблица признаков, набор входов -> строка на вход
pub trait Describer: Send + Sync {
    type Input;

    fn describe(&self, input: &Self::Input) -> Result<DataFrame>;

    /// Ошибка на любом входе прерывает весь набор
    fn describe_all(&self, inputs: &[Self::Input]) -> Result<DataFrame> {
        tracing::debug!("Describing {} inputs", inputs.len());

        let records = inputs
            .iter()
            .map(|input| self.describe(input).and_then(|frame| frame.to_record()))
            .collect::<Result<Vec<_>>>()?;

        DataFrame::from_records(records)
    }
}
