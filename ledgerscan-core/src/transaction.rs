//! Statement rows as returned by the extraction model.
//!
//! Nothing here is normalized: dates stay free-form and the running balance
//! stays a string so that a trailing `Dr`/`Cr` survives untouched.

use num_format::Locale;
use serde::{Deserialize, Serialize};

/// One row of a bank statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub date: String,
    pub particulars: String,
    /// Debit amount; `None` when the row has no payment.
    #[serde(default)]
    pub payments: Option<f64>,
    /// Credit amount; `None` when the row has no receipt.
    #[serde(default)]
    pub receipts: Option<f64>,
    pub balance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceDirection {
    Debit,
    Credit,
}

impl Transaction {
    /// Trailing `Dr`/`Cr` marker on the balance, if the statement printed one.
    pub fn balance_direction(&self) -> Option<BalanceDirection> {
        let b = self.balance.trim_end();
        if b.len() < 2 || !b.is_char_boundary(b.len() - 2) {
            return None;
        }
        let (head, tail) = b.split_at(b.len() - 2);

        // "1,000.00Cr" and "1,000.00 Cr" both count; "Descr" does not.
        let separated = head
            .chars()
            .last()
            .map(|c| c.is_ascii_digit() || c.is_whitespace() || c == '.')
            .unwrap_or(true);
        if !separated {
            return None;
        }

        if tail.eq_ignore_ascii_case("dr") {
            Some(BalanceDirection::Debit)
        } else if tail.eq_ignore_ascii_case("cr") {
            Some(BalanceDirection::Credit)
        } else {
            None
        }
    }
}

/// Render an optional amount the way the results table shows it:
/// en-US grouping, two decimals, `-` when absent.
pub fn format_amount(amount: Option<f64>) -> String {
    let Some(value) = amount else {
        return "-".to_string();
    };

    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sep = Locale::en.separator();
    let mut whole = String::with_capacity(int.len() + int.len() / 3 * sep.len());
    for (i, d) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            whole.push_str(sep);
        }
        whole.push(d);
    }
    // no sign on a value that rounds to zero
    let sign = if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    format!("{sign}{whole}.{frac}")
}
