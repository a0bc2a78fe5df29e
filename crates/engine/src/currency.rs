use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// ISO-like currency code carried by every [`Money`] value.
///
/// A goal, its ledger entries and any amount compared against them must share
/// one currency; mixing currencies is a type-level error surfaced as
/// [`EngineError::CurrencyMismatch`]. Conversion is a pre-processing step done
/// through an external [`RateProvider`] before amounts reach the ledger.
///
/// ## Minor units
///
/// The engine stores monetary values as an `i64` number of **minor units**
/// (see [`Money`]). `minor_units()` returns how many decimal digits are used
/// when converting between:
/// - major units (human input/output, e.g. `10.50 EUR`)
/// - minor units (stored integers, e.g. `1050`)
///
/// [`Money`]: crate::Money
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Eur | Currency::Usd | Currency::Gbp => 2,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

/// Exchange-rate collaborator.
///
/// The engine never looks rates up itself: when a posting currency differs
/// from a goal's currency the caller converts first via
/// [`Money::convert_with`], backed by an implementation of this trait.
///
/// [`Money::convert_with`]: crate::Money::convert_with
pub trait RateProvider {
    /// Rate from `from` to `to` as an integer ratio `numerator / denominator`.
    ///
    /// An integer ratio keeps the engine free of floating point; a provider
    /// backed by decimal rates can scale them (e.g. `1.0842` → `10842 /
    /// 10000`).
    fn rate(&self, from: Currency, to: Currency) -> ResultEngine<(i64, i64)>;
}
