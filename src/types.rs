/// Типы запросов к сервису

use serde::{Deserialize, Serialize};

use crate::describers::{DistinctSiteProperty, FuncGenerator};
use crate::frame::DataFrame;
use crate::preprocessing::{CutoffClassifier, PrecomputedClassifier, PropertyLookup};
use crate::structure::Structure;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Cutoff,
    Precomputed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePropertySettings {
    pub cns: Vec<u32>,
    pub properties: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub classifier: ClassifierKind,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 { CutoffClassifier::DEFAULT_TOLERANCE }

impl SitePropertySettings {
    pub fn build(&self, lookup: impl PropertyLookup + 'static) -> DistinctSiteProperty {
        let describer = DistinctSiteProperty::new(
            self.cns.iter().copied(),
            self.properties.iter().cloned(),
            lookup,
        )
        .with_excluded(self.exclude.iter().cloned());

        match self.classifier {
            ClassifierKind::Cutoff => describer.with_classifier(CutoffClassifier::new(self.tolerance)),
            ClassifierKind::Precomputed => describer.with_classifier(PrecomputedClassifier),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub generator: FuncGenerator,
    pub table: DataFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitePropertyRequest {
    pub settings: SitePropertySettings,
    pub structures: Vec<Structure>,
}

/// Цепочка: свойства позиций, затем генераторы по порядку
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub settings: SitePropertySettings,
    #[serde(default)]
    pub stages: Vec<FuncGenerator>,
    pub structures: Vec<Structure>,
}
