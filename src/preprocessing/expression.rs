//! Закрытый словарь преобразований для FuncGenerator.
//!
//! Грамматика:
//!
//! ```text
//! expr := "*"                      вся таблица
//!       | "[" column "]"           одна колонка
//!       | op "(" expr, ... ")"     операция над аргументами
//!       | op                       то же, что op(*)
//! ```
//!
//! Внутри `[...]` символы `]` и `\` записываются как `\]` и `\\`.
//!
//! Поэлементные операции: `sin cos tan exp log log10 sqrt abs square`.
//! По колонкам: `zscore`. По строкам (свертка в одну колонку): `sum mean min max`.

use std::fmt;

use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};

use crate::error::{DescriptorError, Result};
use crate::frame::DataFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Log10,
    Sqrt,
    Abs,
    Square,
}

impl UnaryOp {
    const ALL: [UnaryOp; 9] = [
        UnaryOp::Sin,
        UnaryOp::Cos,
        UnaryOp::Tan,
        UnaryOp::Exp,
        UnaryOp::Log,
        UnaryOp::Log10,
        UnaryOp::Sqrt,
        UnaryOp::Abs,
        UnaryOp::Square,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Log10 => "log10",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Abs => "abs",
            UnaryOp::Square => "square",
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Tan => x.tan(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Log => x.ln(),
            UnaryOp::Log10 => x.log10(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Abs => x.abs(),
            UnaryOp::Square => x * x,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOp {
    /// (x - mean) / std по каждой колонке
    Zscore,
}

impl ColumnOp {
    pub fn name(self) -> &'static str {
        match self {
            ColumnOp::Zscore => "zscore",
        }
    }

    fn apply(self, values: &mut Array2<Option<f64>>) {
        match self {
            ColumnOp::Zscore => {
                for mut column in values.columns_mut() {
                    let present: Vec<f64> = column.iter().flatten().copied().collect();
                    if present.is_empty() {
                        continue;
                    }
                    let mean = present.iter().sum::<f64>() / present.len() as f64;
                    let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                        / present.len() as f64;
                    // Избегаем деления на ноль
                    let std = match variance.sqrt() {
                        s if s < 1e-10 => 1.0,
                        s => s,
                    };
                    column.mapv_inplace(|v| v.map(|x| (x - mean) / std));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
    Min,
    Max,
}

impl Reduction {
    pub fn name(self) -> &'static str {
        match self {
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Min => "min",
            Reduction::Max => "max",
        }
    }

    /// Строка с хотя бы одним отсутствующим значением дает `None`
    fn apply(self, row: ArrayView1<'_, Option<f64>>) -> Option<f64> {
        let values: Vec<f64> = row.iter().copied().collect::<Option<Vec<f64>>>()?;
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        Some(match self {
            Reduction::Sum => sum,
            Reduction::Mean => sum / values.len() as f64,
            Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

enum Operation {
    Unary(UnaryOp),
    Column(ColumnOp),
    Reduce(Reduction),
}

impl Operation {
    fn from_name(name: &str) -> Option<Self> {
        if let Some(op) = UnaryOp::ALL.iter().find(|op| op.name() == name) {
            return Some(Operation::Unary(*op));
        }
        match name {
            "zscore" => Some(Operation::Column(ColumnOp::Zscore)),
            "sum" => Some(Operation::Reduce(Reduction::Sum)),
            "mean" => Some(Operation::Reduce(Reduction::Mean)),
            "min" => Some(Operation::Reduce(Reduction::Min)),
            "max" => Some(Operation::Reduce(Reduction::Max)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Table,
    Column(String),
    Elementwise(UnaryOp, Box<Expr>),
    Columnwise(ColumnOp, Box<Expr>),
    Reduce(Reduction, Vec<Expr>),
}

/// Результат вычисления: колонки с подписями, строки выровнены по входной таблице
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub labels: Vec<String>,
    pub values: Array2<Option<f64>>,
}

impl Expr {
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser { src: source, pos: 0 };
        let expr = parser
            .expr()
            .map_err(|reason| DescriptorError::expression(source, reason))?;
        parser.skip_ws();
        if parser.pos != source.len() {
            return Err(DescriptorError::expression(
                source,
                format!("unexpected trailing input at {}", parser.pos),
            ));
        }
        Ok(expr)
    }

    /// Вычисляет выражение над таблицей; `name` попадает в текст ошибки
    pub fn evaluate(&self, name: &str, frame: &DataFrame) -> Result<Block> {
        self.eval(frame)
            .map_err(|reason| DescriptorError::evaluation(name, reason))
    }

    fn eval(&self, frame: &DataFrame) -> std::result::Result<Block, String> {
        match self {
            Expr::Table => Ok(Block {
                labels: frame.columns().to_vec(),
                values: frame.values().clone(),
            }),
            Expr::Column(column) => {
                let values = frame
                    .column(column)
                    .ok_or_else(|| format!("column '{}' not found", column))?;
                Ok(Block {
                    labels: vec![column.clone()],
                    values: values.to_owned().insert_axis(Axis(1)),
                })
            }
            Expr::Elementwise(op, inner) => {
                let mut block = inner.eval(frame)?;
                block.values.mapv_inplace(|v| v.map(|x| op.apply(x)));
                Ok(block)
            }
            Expr::Columnwise(op, inner) => {
                let mut block = inner.eval(frame)?;
                op.apply(&mut block.values);
                Ok(block)
            }
            Expr::Reduce(reduction, args) => {
                let blocks = args
                    .iter()
                    .map(|arg| arg.eval(frame))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                let views: Vec<_> = blocks.iter().map(|b| b.values.view()).collect();
                let joined = concatenate(Axis(1), &views).map_err(|e| e.to_string())?;
                let reduced: Array1<Option<f64>> = joined
                    .rows()
                    .into_iter()
                    .map(|row| reduction.apply(row))
                    .collect();
                Ok(Block {
                    labels: vec![reduction.name().to_string()],
                    values: reduced.insert_axis(Axis(1)),
                })
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Table => write!(f, "*"),
            Expr::Column(column) => {
                let escaped = column.replace('\\', "\\\\").replace(']', "\\]");
                write!(f, "[{}]", escaped)
            }
            Expr::Elementwise(op, inner) => write!(f, "{}({})", op.name(), inner),
            Expr::Columnwise(op, inner) => write!(f, "{}({})", op.name(), inner),
            Expr::Reduce(reduction, args) => {
                write!(f, "{}(", reduction.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.bump(c);
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.bump(expected);
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> std::result::Result<Expr, String> {
        self.skip_ws();
        match self.peek() {
            None => Err("unexpected end of expression".to_string()),
            Some('*') => {
                self.bump('*');
                Ok(Expr::Table)
            }
            Some('[') => {
                self.bump('[');
                let column = self.column()?;
                if column.is_empty() {
                    return Err("empty column reference".to_string());
                }
                Ok(Expr::Column(column))
            }
            Some(c) if c.is_ascii_alphabetic() => self.operation(),
            Some(c) => Err(format!("unexpected character '{}' at {}", c, self.pos)),
        }
    }

    /// Имя колонки до закрывающей `]`, с раскрытием `\]` и `\\`
    fn column(&mut self) -> std::result::Result<String, String> {
        let mut column = String::new();
        let mut chars = self.rest().chars();
        while let Some(c) = chars.next() {
            self.bump(c);
            match c {
                ']' => return Ok(column),
                '\\' => {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| "unclosed column reference".to_string())?;
                    if escaped != ']' && escaped != '\\' {
                        return Err(format!("unknown escape '\\{}' at {}", escaped, self.pos));
                    }
                    self.bump(escaped);
                    column.push(escaped);
                }
                c => column.push(c),
            }
        }
        Err("unclosed column reference".to_string())
    }

    fn operation(&mut self) -> std::result::Result<Expr, String> {
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        let name = &self.rest()[..len];
        let operation =
            Operation::from_name(name).ok_or_else(|| format!("unknown operation '{}'", name))?;
        let name = name.to_string();
        self.pos += len;

        let mut args = Vec::new();
        if self.eat('(') {
            loop {
                args.push(self.expr()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat(')') {
                    break;
                }
                return Err(format!("expected ',' or ')' at {}", self.pos));
            }
        } else {
            args.push(Expr::Table);
        }

        match operation {
            Operation::Unary(op) => Ok(Expr::Elementwise(op, Box::new(single(&name, args)?))),
            Operation::Column(op) => Ok(Expr::Columnwise(op, Box::new(single(&name, args)?))),
            Operation::Reduce(reduction) => Ok(Expr::Reduce(reduction, args)),
        }
    }
}

fn single(name: &str, mut args: Vec<Expr>) -> std::result::Result<Expr, String> {
    match args.len() {
        1 => Ok(args.remove(0)),
        n => Err(format!("'{}' takes one argument, got {}", name, n)),
    }
}
