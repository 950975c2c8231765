use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Simple moving average over a fixed window.
///
/// Keeps a running sum so each push is O(1); the value is `None` until the
/// window is full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sma {
    window: usize,
    values: VecDeque<Decimal>,
    sum: Decimal,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        Sma {
            window: window.max(1),
            values: VecDeque::with_capacity(window.max(1)),
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

    pub fn value(&self) -> Option<Decimal> {
        if self.values.len() < self.window {
            return None;
        }
        Some(self.sum / Decimal::from(self.values.len()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
