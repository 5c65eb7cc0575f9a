use crate::error::{BenchError, Result};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_SNV_RATE: f64 = 0.01;
pub const DEFAULT_DEL_RATE: f64 = 0.05;
pub const DEFAULT_INS_RATE: f64 = 0.05;
pub const DEFAULT_COVERAGE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateKind {
    Snv,
    Deletion,
    Insertion,
    Coverage,
}

impl RateKind {
    pub fn default_value(self) -> f64 {
        match self {
            RateKind::Snv => DEFAULT_SNV_RATE,
            RateKind::Deletion => DEFAULT_DEL_RATE,
            RateKind::Insertion => DEFAULT_INS_RATE,
            RateKind::Coverage => DEFAULT_COVERAGE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            RateKind::Snv => "SNV",
            RateKind::Deletion => "Del",
            RateKind::Insertion => "Ins",
            RateKind::Coverage => "Coverages",
        }
    }

    fn check(self, value: f64) -> std::result::Result<(), &'static str> {
        if !value.is_finite() {
            return Err("not a finite number");
        }
        match self {
            RateKind::Coverage if value <= 0.0 => Err("coverage must be positive"),
            RateKind::Coverage => Ok(()),
            _ if !(0.0..=1.0).contains(&value) => Err("rates must lie in [0, 1]"),
            _ => Ok(()),
        }
    }
}

/// Ordered list of values for one rate category. Several values describe
/// a sweep; an empty input falls back to the category default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRateSet {
    kind: RateKind,
    values: Vec<f64>,
}

impl ErrorRateSet {
    /// Parses a comma-separated list such as `0.01,0.02`.
    pub fn parse(input: &str, kind: RateKind) -> Result<Self> {
        let values = parse_number_list(input)?;
        Self::from_values(values, kind)
    }

    pub fn from_values(values: Vec<f64>, kind: RateKind) -> Result<Self> {
        for &v in &values {
            kind.check(v).map_err(|reason| {
                BenchError::parameter(format!("{} value {}: {}", kind.label(), v, reason))
            })?;
        }
        let values = if values.is_empty() {
            vec![kind.default_value()]
        } else {
            values
        };
        Ok(Self { kind, values })
    }

    pub fn default_for(kind: RateKind) -> Self {
        Self {
            kind,
            values: vec![kind.default_value()],
        }
    }

    pub fn kind(&self) -> RateKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First value; the single-shot simulation modes use only this one.
    pub fn first(&self) -> f64 {
        self.values[0]
    }
}

impl fmt::Display for ErrorRateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "{}: {}", self.kind.label(), values.join(", "))
    }
}

/// Splits a comma-separated list of numbers. Blank input gives an empty list.
pub fn parse_number_list(input: &str) -> Result<Vec<f64>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| BenchError::parameter(format!("could not convert '{}' to a number", s)))
        })
        .collect()
}
