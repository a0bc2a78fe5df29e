use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, RateProvider, ResultEngine};

/// Signed money amount represented as **integer minor units** plus a currency.
///
/// Use this type for **all** monetary values in the engine (targets, balances,
/// entry amounts) to avoid floating-point drift.
///
/// The value is signed:
/// - positive = deposit / increase
/// - negative = withdrawal / decrease
///
/// Arithmetic between two amounts of different currencies is rejected with
/// [`EngineError::CurrencyMismatch`]; conversion goes through an external
/// [`RateProvider`] first.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(12_34, Currency::Eur);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34 EUR");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more fraction digits than the currency carries):
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert_eq!(Money::parse("10", Currency::Eur).unwrap().minor(), 1000);
/// assert_eq!(Money::parse("10,5", Currency::Eur).unwrap().minor(), 1050);
/// assert!(Money::parse("12.345", Currency::Eur).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// The zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.minor
    }

    /// Returns the currency of this amount.
    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.minor == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.minor > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.minor < 0
    }

    /// Negates the amount (deposit ⇄ withdrawal).
    #[must_use]
    pub const fn negated(self) -> Self {
        Self {
            minor: -self.minor,
            currency: self.currency,
        }
    }

    fn ensure_same_currency(self, rhs: Money) -> ResultEngine<()> {
        if self.currency != rhs.currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "expected {}, got {}",
                self.currency.code(),
                rhs.currency.code()
            )));
        }
        Ok(())
    }

    /// Checked addition; fails on currency mismatch or overflow.
    pub fn checked_add(self, rhs: Money) -> ResultEngine<Money> {
        self.ensure_same_currency(rhs)?;
        let minor = self
            .minor
            .checked_add(rhs.minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(minor, self.currency))
    }

    /// Checked subtraction; fails on currency mismatch or overflow.
    pub fn checked_sub(self, rhs: Money) -> ResultEngine<Money> {
        self.ensure_same_currency(rhs)?;
        let minor = self
            .minor
            .checked_sub(rhs.minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(minor, self.currency))
    }

    /// Checked multiplication by an integer factor; fails on overflow.
    pub fn checked_mul(self, factor: i64) -> ResultEngine<Money> {
        let minor = self
            .minor
            .checked_mul(factor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(minor, self.currency))
    }

    /// Compares two amounts of the same currency.
    pub fn compare(self, rhs: Money) -> ResultEngine<Ordering> {
        self.ensure_same_currency(rhs)?;
        Ok(self.minor.cmp(&rhs.minor))
    }

    /// Splits a non-negative amount over positive integer weights so that the
    /// parts **always sum exactly to the original amount**.
    ///
    /// Each part starts from the floored proportional share; the leftover
    /// minor units are then assigned one by one to the parts with the largest
    /// fractional remainder (ties broken by the lower index). This is the
    /// largest-remainder method, so no money is ever lost or created by
    /// rounding.
    pub fn split_weighted(self, weights: &[i64]) -> ResultEngine<Vec<Money>> {
        if weights.is_empty() {
            return Err(EngineError::InvalidAmount(
                "split requires at least one weight".to_string(),
            ));
        }
        if self.minor < 0 {
            return Err(EngineError::InvalidAmount(
                "cannot split a negative amount".to_string(),
            ));
        }
        if weights.iter().any(|w| *w <= 0) {
            return Err(EngineError::InvalidAmount(
                "split weights must be > 0".to_string(),
            ));
        }

        let total: i128 = weights.iter().map(|w| i128::from(*w)).sum();
        let amount = i128::from(self.minor);

        let mut parts: Vec<i64> = Vec::with_capacity(weights.len());
        let mut remainders: Vec<(usize, i128)> = Vec::with_capacity(weights.len());
        let mut assigned: i128 = 0;
        for (index, weight) in weights.iter().enumerate() {
            let numerator = amount * i128::from(*weight);
            let share = numerator / total;
            parts.push(share as i64);
            remainders.push((index, numerator % total));
            assigned += share;
        }

        // Leftover is strictly smaller than the number of parts.
        let leftover = (amount - assigned) as usize;
        remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for (index, _) in remainders.into_iter().take(leftover) {
            parts[index] += 1;
        }

        Ok(parts
            .into_iter()
            .map(|minor| Money::new(minor, self.currency))
            .collect())
    }

    /// Divides a non-negative amount into `parts` even instalments.
    ///
    /// Returns `(per_part, final_part)` where every part but the last is
    /// `per_part` (floored division) and the final part absorbs the rounding
    /// remainder, so `per_part × (parts − 1) + final_part` equals the original
    /// amount exactly.
    pub fn split_even(self, parts: u32) -> ResultEngine<(Money, Money)> {
        if parts == 0 {
            return Err(EngineError::InvalidAmount(
                "split requires at least one part".to_string(),
            ));
        }
        if self.minor < 0 {
            return Err(EngineError::InvalidAmount(
                "cannot split a negative amount".to_string(),
            ));
        }
        let n = i64::from(parts);
        let per = self.minor / n;
        let last = self.minor - per * (n - 1);
        Ok((Money::new(per, self.currency), Money::new(last, self.currency)))
    }

    /// Converts this amount to another currency through a [`RateProvider`].
    ///
    /// The rate is applied as an integer ratio with half-even rounding on the
    /// resulting minor units. Same-currency conversion is the identity.
    pub fn convert_with<P: RateProvider + ?Sized>(
        self,
        provider: &P,
        to: Currency,
    ) -> ResultEngine<Money> {
        if to == self.currency {
            return Ok(self);
        }
        let (numerator, denominator) = provider.rate(self.currency, to)?;
        if numerator <= 0 || denominator <= 0 {
            return Err(EngineError::InvalidAmount(
                "exchange rate must be positive".to_string(),
            ));
        }

        let product = i128::from(self.minor) * i128::from(numerator);
        let den = i128::from(denominator);
        let quotient = product.div_euclid(den);
        let remainder = product.rem_euclid(den);
        let rounded = match (remainder * 2).cmp(&den) {
            Ordering::Less => quotient,
            Ordering::Greater => quotient + 1,
            // Half-even: round to the even neighbour.
            Ordering::Equal => {
                if quotient % 2 == 0 {
                    quotient
                } else {
                    quotient + 1
                }
            }
        };

        let minor = i64::try_from(rounded)
            .map_err(|_| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(minor, to))
    }

    /// Parses a decimal string into an amount of the given currency.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading
    /// `+`/`-`. Rejects more fraction digits than the currency carries.
    pub fn parse(s: &str, currency: Currency) -> ResultEngine<Money> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (-1i64, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (1i64, stripped)
        } else {
            (1i64, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut pieces = rest.split('.');
        let major_str = pieces.next().ok_or_else(invalid)?;
        let frac_str = pieces.next();
        if pieces.next().is_some() {
            return Err(invalid());
        }

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: i64 = major_str.parse().map_err(|_| invalid())?;

        let digits = usize::from(currency.minor_units());
        let scale = 10i64.pow(currency.minor_units() as u32);

        let frac: i64 = match frac_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if frac.len() > digits {
                    return Err(EngineError::InvalidAmount(
                        "too many decimals".to_string(),
                    ));
                }
                let parsed: i64 = frac.parse().map_err(|_| invalid())?;
                parsed * 10i64.pow((digits - frac.len()) as u32)
            }
        };

        let total = major
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        let signed = if sign < 0 {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money::new(signed, currency))
    }
}

impl PartialOrd for Money {
    /// Ordering is only defined within one currency; comparing across
    /// currencies yields `None`.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.minor.cmp(&other.minor))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        let scale = 10u64.pow(self.currency.minor_units() as u32);
        let major = abs / scale;
        let frac = abs % scale;
        let digits = usize::from(self.currency.minor_units());
        write!(
            f,
            "{sign}{major}.{frac:0digits$} {}",
            self.currency.code()
        )
    }
}
