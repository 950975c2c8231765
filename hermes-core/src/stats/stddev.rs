use std::collections::VecDeque;

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

/// Rolling sample variance over a fixed window.
///
/// Needs at least two samples; `std_dev` is the square root of the sample
/// variance and serves as the close-to-close volatility measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingVariance {
    window: usize,
    values: VecDeque<Decimal>,
    sum: Decimal,
}

impl RollingVariance {
    pub fn new(window: usize) -> Self {
        RollingVariance {
            window: window.max(2),
            values: VecDeque::with_capacity(window.max(2)),
            sum: Decimal::ZERO,
        }
    }

    pub fn push(&mut self, value: Decimal) {
        if self.values.len() >= self.window {
            if let Some(removed) = self.values.pop_front() {
                self.sum -= removed;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn mean(&self) -> Option<Decimal> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.sum / Decimal::from(self.values.len()))
    }

    pub fn variance(&self) -> Option<Decimal> {
        if self.values.len() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let sum_sq_diff: Decimal = self
            .values
            .iter()
            .map(|v| {
                let diff = *v - mean;
                diff * diff
            })
            .sum();
        Some(sum_sq_diff / Decimal::from(self.values.len() - 1))
    }

    pub fn std_dev(&self) -> Option<Decimal> {
        self.variance().and_then(|v| v.sqrt())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
