//! Свойства позиций, сгруппированных по координационному числу

use std::collections::HashMap;
use std::sync::Arc;

use super::Describer;
use crate::error::{DescriptorError, Result};
use crate::frame::{DataFrame, Record};
use crate::preprocessing::{CoordinationClassifier, CutoffClassifier, PropertyLookup};
use crate::structure::Structure;

/// Для каждой пары (КЧ, свойство) - среднее свойство по позициям с этим КЧ.
///
/// Признак называется `"{cn}-{property}"`. Если позиций с данным КЧ нет,
/// признаки этого КЧ пропускаются, а не заполняются нулями.
pub struct DistinctSiteProperty {
    cns: Vec<u32>,
    properties: Vec<String>,
    exclude: Vec<String>,
    lookup: Arc<dyn PropertyLookup>,
    classifier: Arc<dyn CoordinationClassifier>,
}

impl DistinctSiteProperty {
    pub fn new<C, P, S>(cns: C, properties: P, lookup: impl PropertyLookup + 'static) -> Self
    where
        C: IntoIterator<Item = u32>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique_cns = Vec::new();
        for cn in cns {
            if !unique_cns.contains(&cn) {
                unique_cns.push(cn);
            }
        }
        let mut unique_properties: Vec<String> = Vec::new();
        for property in properties {
            let property = property.into();
            if !unique_properties.contains(&property) {
                unique_properties.push(property);
            }
        }

        Self {
            cns: unique_cns,
            properties: unique_properties,
            exclude: Vec::new(),
            lookup: Arc::new(lookup),
            classifier: Arc::new(CutoffClassifier::default()),
        }
    }

    pub fn with_classifier(mut self, classifier: impl CoordinationClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Элементы, исключаемые при вызове через `Describer`
    pub fn with_excluded<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = elements.into_iter().map(Into::into).collect();
        self
    }

    pub fn cns(&self) -> &[u32] {
        &self.cns
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn excluded(&self) -> &[String] {
        &self.exclude
    }

    /// Все возможные имена признаков: КЧ снаружи, свойства внутри
    pub fn feature_names(&self) -> Vec<String> {
        self.cns
            .iter()
            .flat_map(|cn| self.properties.iter().map(move |p| feature_name(*cn, p)))
            .collect()
    }

    pub fn features<S: AsRef<str>>(&self, structure: &Structure, exclude: &[S]) -> Result<Record> {
        let cns = self.classifier.classify(structure)?;
        if cns.len() != structure.len() {
            return Err(DescriptorError::Structure(format!(
                "classifier returned {} coordination numbers for {} sites",
                cns.len(),
                structure.len()
            )));
        }

        let mut groups: HashMap<u32, Vec<&str>> = HashMap::new();
        for (site, cn) in structure.sites().iter().zip(&cns) {
            if exclude.iter().any(|element| element.as_ref() == site.element) {
                continue;
            }
            groups.entry(*cn).or_default().push(&site.element);
        }

        let mut record = Vec::new();
        for cn in &self.cns {
            let Some(elements) = groups.get(cn) else {
                continue;
            };
            for property in &self.properties {
                let total = elements
                    .iter()
                    .map(|element| self.lookup.lookup(element, property))
                    .sum::<Result<f64>>()?;
                record.push((feature_name(*cn, property), total / elements.len() as f64));
            }
        }

        tracing::debug!(
            "Described {} sites in {} coordination groups: {} features",
            structure.len(),
            groups.len(),
            record.len()
        );

        Ok(record)
    }

    /// Ряд признаков одной структуры (колонка `value`)
    pub fn describe_excluding<S: AsRef<str>>(
        &self,
        structure: &Structure,
        exclude: &[S],
    ) -> Result<DataFrame> {
        DataFrame::from_series(self.features(structure, exclude)?)
    }

    /// Строка на структуру, колонки объединены по всем структурам
    pub fn describe_all_excluding<S: AsRef<str>>(
        &self,
        structures: &[Structure],
        exclude: &[S],
    ) -> Result<DataFrame> {
        let records = structures
            .iter()
            .map(|structure| self.features(structure, exclude))
            .collect::<Result<Vec<_>>>()?;

        DataFrame::from_records(records)
    }
}

fn feature_name(cn: u32, property: &str) -> String {
    format!("{}-{}", cn, property)
}

impl Describer for DistinctSiteProperty {
    type Input = Structure;

    fn describe(&self, structure: &Structure) -> Result<DataFrame> {
        self.describe_excluding(structure, &self.exclude)
    }

    fn describe_all(&self, structures: &[Structure]) -> Result<DataFrame> {
        self.describe_all_excluding(structures, &self.exclude)
    }
}
