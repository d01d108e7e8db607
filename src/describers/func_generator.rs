//! Именованные преобразования табличных данных

use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Describer;
use crate::error::{DescriptorError, Result};
use crate::frame::DataFrame;
use crate::preprocessing::Expr;

/// Применяет набор `имя -> выражение` к таблице.
///
/// Преобразование с одной колонкой результата дает колонку `имя`. Если
/// колонок несколько, при `append` они называются `"{имя} {колонка}"`,
/// иначе остаются с исходными подписями.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct FuncGenerator {
    funcs: Vec<(String, Expr)>,
    append: bool,
}

impl FuncGenerator {
    pub fn new<I, K, V>(funcs: I, append: bool) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut parsed: Vec<(String, Expr)> = Vec::new();
        for (name, source) in funcs {
            let name = name.into();
            if parsed.iter().any(|(existing, _)| *existing == name) {
                return Err(DescriptorError::Composition(format!(
                    "transformation '{}' is defined twice",
                    name
                )));
            }
            let expr = Expr::parse(source.as_ref())?;
            parsed.push((name, expr));
        }

        Ok(Self {
            funcs: parsed,
            append,
        })
    }

    /// То же, что `new(funcs, true)`
    pub fn from_pairs<I, K, V>(funcs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        Self::new(funcs, true)
    }

    pub fn append(&self) -> bool {
        self.append
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// `{"func_dict": {имя: выражение}, "append": bool}`
    pub fn as_dict(&self) -> Value {
        let func_dict: Map<String, Value> = self
            .funcs
            .iter()
            .map(|(name, expr)| (name.clone(), Value::String(expr.to_string())))
            .collect();

        let mut dict = Map::new();
        dict.insert("func_dict".to_string(), Value::Object(func_dict));
        dict.insert("append".to_string(), Value::Bool(self.append));
        Value::Object(dict)
    }

    pub fn from_dict(dict: &Value) -> Result<Self> {
        let object = dict
            .as_object()
            .ok_or_else(|| DescriptorError::Serialization("expected an object".to_string()))?;

        let func_dict = match object.get("func_dict") {
            Some(Value::Object(funcs)) => funcs,
            Some(_) => {
                return Err(DescriptorError::Serialization(
                    "'func_dict' must be an object".to_string(),
                ))
            }
            None => {
                return Err(DescriptorError::Serialization(
                    "missing key 'func_dict'".to_string(),
                ))
            }
        };
        let append = match object.get("append") {
            Some(Value::Bool(append)) => *append,
            Some(_) => {
                return Err(DescriptorError::Serialization(
                    "'append' must be a boolean".to_string(),
                ))
            }
            None => {
                return Err(DescriptorError::Serialization(
                    "missing key 'append'".to_string(),
                ))
            }
        };

        let mut funcs = Vec::with_capacity(func_dict.len());
        for (name, source) in func_dict {
            let source = source.as_str().ok_or_else(|| {
                DescriptorError::Serialization(format!(
                    "expression for '{}' must be a string",
                    name
                ))
            })?;
            funcs.push((name.as_str(), source));
        }

        Self::new(funcs, append).map_err(|e| DescriptorError::Serialization(e.to_string()))
    }
}

impl Describer for FuncGenerator {
    type Input = DataFrame;

    fn describe(&self, table: &DataFrame) -> Result<DataFrame> {
        tracing::debug!(
            "Applying {} transformations to {}x{} table",
            self.funcs.len(),
            table.nrows(),
            table.ncols()
        );

        let mut columns = Vec::new();
        let mut blocks = Vec::with_capacity(self.funcs.len());
        for (name, expr) in &self.funcs {
            let block = expr.evaluate(name, table)?;
            if block.labels.len() == 1 {
                columns.push(name.clone());
            } else if self.append {
                columns.extend(block.labels.iter().map(|label| format!("{} {}", name, label)));
            } else {
                columns.extend(block.labels.iter().cloned());
            }
            blocks.push(block.values);
        }

        let values = if blocks.is_empty() {
            Array2::from_elem((table.nrows(), 0), None)
        } else {
            let views: Vec<_> = blocks.iter().map(|values| values.view()).collect();
            concatenate(Axis(1), &views).map_err(|e| DescriptorError::Shape(e.to_string()))?
        };

        DataFrame::new(table.index().to_vec(), columns, values)
    }
}

impl TryFrom<Value> for FuncGenerator {
    type Error = DescriptorError;

    fn try_from(dict: Value) -> Result<Self> {
        Self::from_dict(&dict)
    }
}

impl From<FuncGenerator> for Value {
    fn from(generator: FuncGenerator) -> Self {
        generator.as_dict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xyz() -> DataFrame {
        DataFrame::from_columns([
            ("x", vec![0.5, -1.0]),
            ("y", vec![2.0, 0.0]),
            ("z", vec![-3.0, 4.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_names_follow_registration_order() {
        let generator =
            FuncGenerator::from_pairs([("sum", "sum"), ("sin", "sin"), ("nest", "log(exp([x]))")])
                .unwrap();
        let result = generator.describe(&xyz()).unwrap();

        assert_eq!(result.columns(), &["sum", "sin x", "sin y", "sin z", "nest"]);
        assert_eq!(result.index(), xyz().index());
    }

    #[test]
    fn test_without_append_keeps_raw_labels() {
        let generator = FuncGenerator::new([("sin", "sin"), ("total", "sum")], false).unwrap();
        let result = generator.describe(&xyz()).unwrap();

        assert_eq!(result.columns(), &["x", "y", "z", "total"]);
        assert_eq!(result.get("1", "z"), Some(4.0f64.sin()));
    }

    #[test]
    fn test_without_append_collision() {
        let generator = FuncGenerator::new([("sin", "sin"), ("cos", "cos")], false).unwrap();
        let err = generator.describe(&xyz()).unwrap_err();

        assert!(matches!(err, DescriptorError::Composition(_)));
    }

    #[test]
    fn test_single_column_table_uses_name() {
        let table = DataFrame::from_series(vec![("6-Z".to_string(), 1.0)]).unwrap();
        let generator = FuncGenerator::new([("exp", "exp")], false).unwrap();
        let result = generator.describe(&table).unwrap();

        assert_eq!(result.columns(), &["exp"]);
        assert_eq!(result.get("6-Z", "exp"), Some(1.0f64.exp()));
    }

    #[test]
    fn test_missing_column() {
        let generator = FuncGenerator::from_pairs([("w", "sqrt([w])")]).unwrap();
        let err = generator.describe(&xyz()).unwrap_err();

        assert!(matches!(err, DescriptorError::Evaluation { .. }));
    }

    #[test]
    fn test_duplicate_name() {
        let err = FuncGenerator::from_pairs([("a", "sin"), ("a", "cos")]).unwrap_err();
        assert!(matches!(err, DescriptorError::Composition(_)));
    }

    #[test]
    fn test_as_dict() {
        let generator = FuncGenerator::new([("sin", "sin"), ("sum", "sum([x], [y])")], false).unwrap();

        assert_eq!(
            generator.as_dict(),
            serde_json::json!({
                "func_dict": {"sin": "sin(*)", "sum": "sum([x], [y])"},
                "append": false
            })
        );
    }

    #[test]
    fn test_from_dict_rejects_malformed_payloads() {
        let payloads = [
            serde_json::json!([]),
            serde_json::json!({"append": true}),
            serde_json::json!({"func_dict": {"a": "sin"}}),
            serde_json::json!({"func_dict": {"a": 1}, "append": true}),
            serde_json::json!({"func_dict": {"a": "sin"}, "append": "yes"}),
            serde_json::json!({"func_dict": ["sin"], "append": true}),
            serde_json::json!({"func_dict": {"a": "np.sin"}, "append": true}),
        ];

        for payload in payloads {
            let err = FuncGenerator::from_dict(&payload).unwrap_err();
            assert!(matches!(err, DescriptorError::Serialization(_)), "{}", payload);
        }
    }

    #[test]
    fn test_from_dict_keeps_order() {
        let json = r#"{"func_dict": {"z": "abs", "a": "square([y])"}, "append": true}"#;
        let generator: FuncGenerator = serde_json::from_str(json).unwrap();

        assert_eq!(generator.names().collect::<Vec<_>>(), vec!["z", "a"]);
        assert!(generator.append());
    }
}
