// 💳 Fee Table - Net factors per payment modality
// How much of the charged amount the merchant keeps after the processor fee

use crate::error::FeeError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Lowest installment count the processor accepts
pub const MIN_INSTALLMENTS: u32 = 2;

/// Highest installment count the processor accepts
pub const MAX_INSTALLMENTS: u32 = 12;

const INSTALLMENT_SLOTS: usize = (MAX_INSTALLMENTS - MIN_INSTALLMENTS + 1) as usize;

// ============================================================================
// MODALITY
// ============================================================================

/// Payment method chosen by the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    DebitNow,
    CreditNow,
    CreditInstallments,
}

impl Modality {
    pub const ALL: [Modality; 3] = [
        Modality::DebitNow,
        Modality::CreditNow,
        Modality::CreditInstallments,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Modality::DebitNow => "debit-now",
            Modality::CreditNow => "credit-now",
            Modality::CreditInstallments => "credit-installments",
        }
    }

    /// Label shown in the modality selector
    pub fn label(&self) -> &'static str {
        match self {
            Modality::DebitNow => "Débito à vista",
            Modality::CreditNow => "Crédito à vista",
            Modality::CreditInstallments => "Crédito parcelado",
        }
    }

    pub fn needs_installments(&self) -> bool {
        matches!(self, Modality::CreditInstallments)
    }
}

impl FromStr for Modality {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modality::ALL
            .iter()
            .copied()
            .find(|m| m.id() == s.trim())
            .ok_or_else(|| FeeError::InvalidModality(s.to_string()))
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ============================================================================
// FEE KEY
// ============================================================================

/// Key of one entry in the fee table.
///
/// `CreditInstallments` only ever holds a count inside
/// `MIN_INSTALLMENTS..=MAX_INSTALLMENTS`; the constructor and the string
/// parser both enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeKey {
    DebitNow,
    CreditNow,
    CreditInstallments(u32),
}

impl FeeKey {
    /// Resolve a modality and optional installment count into a table key.
    /// The count is ignored for the single-payment modalities.
    pub fn resolve(modality: Modality, installments: Option<u32>) -> Result<Self, FeeError> {
        match modality {
            Modality::DebitNow => Ok(FeeKey::DebitNow),
            Modality::CreditNow => Ok(FeeKey::CreditNow),
            Modality::CreditInstallments => match installments {
                Some(n) if (MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&n) => {
                    Ok(FeeKey::CreditInstallments(n))
                }
                other => Err(FeeError::InvalidInstallmentCount(other)),
            },
        }
    }

    pub fn modality(&self) -> Modality {
        match self {
            FeeKey::DebitNow => Modality::DebitNow,
            FeeKey::CreditNow => Modality::CreditNow,
            FeeKey::CreditInstallments(_) => Modality::CreditInstallments,
        }
    }

    /// Number of payments the charge is split into (1 for single payments)
    pub fn installments(&self) -> u32 {
        match self {
            FeeKey::CreditInstallments(n) => *n,
            _ => 1,
        }
    }

    pub fn id(&self) -> String {
        match self {
            FeeKey::CreditInstallments(n) => format!("credit-installments-{}", n),
            other => other.modality().id().to_string(),
        }
    }

    /// Human-readable label stored with each history record
    pub fn label(&self) -> String {
        match self {
            FeeKey::CreditInstallments(n) => format!("Crédito parcelado em {}x", n),
            other => other.modality().label().to_string(),
        }
    }
}

impl FromStr for FeeKey {
    type Err = FeeError;

    /// Accepts `debit-now`, `credit-now` and `credit-installments-N`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(count) = trimmed.strip_prefix("credit-installments-") {
            let n = count
                .parse::<u32>()
                .map_err(|_| FeeError::InvalidModality(s.to_string()))?;
            return FeeKey::resolve(Modality::CreditInstallments, Some(n));
        }

        let modality: Modality = trimmed.parse()?;
        FeeKey::resolve(modality, None)
    }
}

impl fmt::Display for FeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ============================================================================
// FEE TABLE
// ============================================================================

/// One row of the table, as listed to front-ends
#[derive(Debug, Clone, Serialize)]
pub struct FeeEntry {
    pub id: String,
    pub label: String,
    pub factor: f64,
    pub installments: u32,
}

/// Net-receipt factors for every modality.
///
/// A plain value: callers hold or copy it and hand it to the inverter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeTable {
    debit_now: f64,
    credit_now: f64,
    installments: [f64; INSTALLMENT_SLOTS],
}

/// Processor rates currently in effect
pub const STANDARD_TABLE: FeeTable = FeeTable::new(
    0.97,
    0.95361,
    [
        0.94541, // 2x
        0.93721, // 3x
        0.92902, // 4x
        0.92082, // 5x
        0.91262, // 6x
        0.90443, // 7x
        0.89623, // 8x
        0.88804, // 9x
        0.87984, // 10x
        0.87164, // 11x
        0.86345, // 12x
    ],
);

impl FeeTable {
    /// Build a table without checking it; see `validate`
    pub const fn new(debit_now: f64, credit_now: f64, installments: [f64; INSTALLMENT_SLOTS]) -> Self {
        FeeTable {
            debit_now,
            credit_now,
            installments,
        }
    }

    pub fn standard() -> Self {
        STANDARD_TABLE
    }

    /// Factor of a resolved key
    pub fn factor(&self, key: FeeKey) -> f64 {
        match key {
            FeeKey::DebitNow => self.debit_now,
            FeeKey::CreditNow => self.credit_now,
            FeeKey::CreditInstallments(n) => self.installments[(n - MIN_INSTALLMENTS) as usize],
        }
    }

    pub fn factor_for(&self, modality: Modality, installments: Option<u32>) -> Result<f64, FeeError> {
        let key = FeeKey::resolve(modality, installments)?;
        Ok(self.factor(key))
    }

    /// Every key in display order: debit, credit, then 2x..12x
    pub fn keys() -> impl Iterator<Item = FeeKey> {
        [FeeKey::DebitNow, FeeKey::CreditNow]
            .into_iter()
            .chain((MIN_INSTALLMENTS..=MAX_INSTALLMENTS).map(FeeKey::CreditInstallments))
    }

    pub fn entries(&self) -> Vec<FeeEntry> {
        Self::keys()
            .map(|key| FeeEntry {
                id: key.id(),
                label: key.label(),
                factor: self.factor(key),
                installments: key.installments(),
            })
            .collect()
    }

    /// Check that every factor lies in (0, 1] and that installment factors
    /// strictly decrease with the count. Returns every violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for key in Self::keys() {
            let factor = self.factor(key);
            if !(factor > 0.0 && factor <= 1.0) {
                errors.push(format!("{}: factor {} outside (0, 1]", key.id(), factor));
            }
        }

        for n in (MIN_INSTALLMENTS + 1)..=MAX_INSTALLMENTS {
            let previous = self.factor(FeeKey::CreditInstallments(n - 1));
            let current = self.factor(FeeKey::CreditInstallments(n));
            if current >= previous {
                errors.push(format!(
                    "credit-installments-{}: factor {} not below {}x factor {}",
                    n,
                    current,
                    n - 1,
                    previous
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for FeeTable {
    fn default() -> Self {
        STANDARD_TABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_valid() {
        assert!(STANDARD_TABLE.validate().is_ok());
    }

    #[test]
    fn test_single_payment_factors() {
        let table = FeeTable::standard();

        assert_eq!(table.factor_for(Modality::DebitNow, None).unwrap(), 0.97);
        assert_eq!(table.factor_for(Modality::CreditNow, None).unwrap(), 0.95361);
    }

    #[test]
    fn test_installments_ignored_for_single_payments() {
        let table = FeeTable::standard();

        assert_eq!(table.factor_for(Modality::DebitNow, Some(7)).unwrap(), 0.97);
        assert_eq!(table.factor_for(Modality::CreditNow, Some(99)).unwrap(), 0.95361);
    }

    #[test]
    fn test_installment_factors() {
        let table = FeeTable::standard();

        assert_eq!(table.factor_for(Modality::CreditInstallments, Some(2)).unwrap(), 0.94541);
        assert_eq!(table.factor_for(Modality::CreditInstallments, Some(3)).unwrap(), 0.93721);
        assert_eq!(table.factor_for(Modality::CreditInstallments, Some(12)).unwrap(), 0.86345);
    }

    #[test]
    fn test_installment_bounds() {
        let table = FeeTable::standard();

        assert_eq!(
            table.factor_for(Modality::CreditInstallments, Some(1)),
            Err(FeeError::InvalidInstallmentCount(Some(1)))
        );
        assert_eq!(
            table.factor_for(Modality::CreditInstallments, Some(13)),
            Err(FeeError::InvalidInstallmentCount(Some(13)))
        );
        assert_eq!(
            table.factor_for(Modality::CreditInstallments, None),
            Err(FeeError::InvalidInstallmentCount(None))
        );
    }

    #[test]
    fn test_unknown_modality() {
        assert_eq!(
            "pix".parse::<Modality>(),
            Err(FeeError::InvalidModality("pix".to_string()))
        );
        assert!(matches!("boleto".parse::<FeeKey>(), Err(FeeError::InvalidModality(_))));
    }

    #[test]
    fn test_fee_key_parsing() {
        assert_eq!("debit-now".parse::<FeeKey>().unwrap(), FeeKey::DebitNow);
        assert_eq!(" credit-now ".parse::<FeeKey>().unwrap(), FeeKey::CreditNow);
        assert_eq!(
            "credit-installments-5".parse::<FeeKey>().unwrap(),
            FeeKey::CreditInstallments(5)
        );
        assert_eq!(
            "credit-installments-13".parse::<FeeKey>(),
            Err(FeeError::InvalidInstallmentCount(Some(13)))
        );
        assert_eq!(
            "credit-installments".parse::<FeeKey>(),
            Err(FeeError::InvalidInstallmentCount(None))
        );
        assert!(matches!(
            "credit-installments-x".parse::<FeeKey>(),
            Err(FeeError::InvalidModality(_))
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(FeeKey::DebitNow.label(), "Débito à vista");
        assert_eq!(FeeKey::CreditNow.label(), "Crédito à vista");
        assert_eq!(FeeKey::CreditInstallments(4).label(), "Crédito parcelado em 4x");
    }

    #[test]
    fn test_entries_cover_whole_table() {
        let entries = STANDARD_TABLE.entries();

        assert_eq!(entries.len(), 13);
        assert_eq!(entries[0].id, "debit-now");
        assert_eq!(entries[1].id, "credit-now");
        assert_eq!(entries[12].id, "credit-installments-12");
        assert_eq!(entries[12].installments, 12);
    }

    #[test]
    fn test_validate_reports_violations() {
        let mut factors = [0.9; 11];
        factors[0] = 0.0;
        let table = FeeTable::new(1.2, 0.95, factors);

        let errors = table.validate().unwrap_err();

        assert!(errors.iter().any(|e| e.starts_with("debit-now")));
        assert!(errors.iter().any(|e| e.starts_with("credit-installments-2")));
        // 0.0 -> 0.9 and the flat tail all break monotonicity
        assert!(errors.iter().filter(|e| e.contains("not below")).count() >= 10);
    }
}
