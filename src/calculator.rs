// 🧮 Fee Inverter - From the amount the merchant wants to the amount to charge

use crate::error::FeeError;
use crate::fees::{FeeKey, FeeTable, Modality};
use serde::Serialize;
use tracing::debug;

/// Outcome of one inversion. Amounts keep full precision; round for display only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrossResult {
    pub desired_net: f64,
    #[serde(serialize_with = "serialize_key")]
    pub key: FeeKey,
    pub factor: f64,
    pub gross: f64,
    pub installments: u32,
    pub per_installment: f64,
    pub net_received: f64,
}

fn serialize_key<S: serde::Serializer>(key: &FeeKey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&key.id())
}

impl GrossResult {
    pub fn label(&self) -> String {
        self.key.label()
    }

    pub fn is_split(&self) -> bool {
        self.installments > 1
    }

    /// Amount the processor keeps
    pub fn fee(&self) -> f64 {
        self.gross - self.net_received
    }
}

/// Inverts the net-factor relation of the table it was built with
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeInverter {
    table: FeeTable,
}

impl FeeInverter {
    pub fn new(table: FeeTable) -> Self {
        FeeInverter { table }
    }

    pub fn table(&self) -> &FeeTable {
        &self.table
    }

    pub fn compute(
        &self,
        desired_net: f64,
        modality: Modality,
        installments: Option<u32>,
    ) -> Result<GrossResult, FeeError> {
        let key = FeeKey::resolve(modality, installments)?;
        self.compute_key(desired_net, key)
    }

    /// Same as `compute` for an already resolved table key.
    ///
    /// Zero is accepted and yields a zero charge; negative or non-finite
    /// amounts are rejected.
    pub fn compute_key(&self, desired_net: f64, key: FeeKey) -> Result<GrossResult, FeeError> {
        if !desired_net.is_finite() || desired_net < 0.0 {
            return Err(FeeError::InvalidAmount(desired_net));
        }

        let factor = self.table.factor(key);
        if factor == 0.0 {
            return Err(FeeError::DivisionByZero);
        }

        let gross = desired_net / factor;
        if !gross.is_finite() {
            return Err(FeeError::AmountTooLarge(desired_net));
        }
        let installments = key.installments();

        debug!(
            desired_net,
            key = %key.id(),
            factor,
            gross,
            "computed gross amount"
        );

        Ok(GrossResult {
            desired_net,
            key,
            factor,
            gross,
            installments,
            per_installment: gross / installments as f64,
            net_received: gross * factor,
        })
    }
}
