//! Композиция нескольких генераторов

use super::Describer;
use crate::error::Result;
use crate::frame::DataFrame;

/// Цепочка генераторов, свертка слева направо.
///
/// Первый генератор получает исходный вход, каждый следующий - таблицу
/// предыдущего. Строки результата - признаки первого генератора, колонки -
/// признаки последнего: для `DistinctSiteProperty` + `FuncGenerator(exp)`
/// в ячейке `["6-Z"]["exp"]` лежит `exp` от значения `6-Z`.
pub struct MultiDescriber<I> {
    head: Box<dyn Describer<Input = I>>,
    stages: Vec<Box<dyn Describer<Input = DataFrame>>>,
}

impl<I> MultiDescriber<I> {
    pub fn new(head: impl Describer<Input = I> + 'static) -> Self {
        Self {
            head: Box::new(head),
            stages: Vec::new(),
        }
    }

    pub fn then(mut self, stage: impl Describer<Input = DataFrame> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Число генераторов в цепочке
    pub fn depth(&self) -> usize {
        1 + self.stages.len()
    }
}

impl<I> Describer for MultiDescriber<I> {
    type Input = I;

    fn describe(&self, input: &I) -> Result<DataFrame> {
        let mut frame = self.head.describe(input)?;
        for stage in &self.stages {
            frame = stage.describe(&frame)?;
        }

        tracing::debug!(
            "Combined {} describers into {}x{} table",
            self.depth(),
            frame.nrows(),
            frame.ncols()
        );

        Ok(frame)
    }
}
