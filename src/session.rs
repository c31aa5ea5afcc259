// Desktop session: owns the history and runs one calculation per user action

use crate::calculator::{FeeInverter, GrossResult};
use crate::error::SessionError;
use crate::fees::{FeeTable, Modality};
use crate::format::parse_amount;
use crate::history::{CalculationRecord, HistoryStore};
use chrono::{Local, NaiveDateTime};
use std::path::Path;

pub struct CalculatorSession {
    inverter: FeeInverter,
    history: HistoryStore,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl CalculatorSession {
    /// Open the history at `path` (loading it) and price with `table`
    pub fn open<P: AsRef<Path>>(path: P, table: FeeTable) -> Self {
        let mut history = HistoryStore::new(path);
        history.load();

        CalculatorSession {
            inverter: FeeInverter::new(table),
            history,
            clock: local_now,
        }
    }

    /// Replace the clock used to stamp records
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the raw amount, compute, and record the result.
    ///
    /// Amounts of zero or below are refused here; nothing is recorded for a
    /// failed request.
    pub fn calculate(
        &mut self,
        amount_text: &str,
        modality: Modality,
        installments: Option<u32>,
    ) -> Result<GrossResult, SessionError> {
        let desired = parse_amount(amount_text)
            .ok_or_else(|| SessionError::InvalidNumber(amount_text.trim().to_string()))?;

        if desired <= 0.0 {
            return Err(SessionError::NonPositiveAmount);
        }

        let result = self.inverter.compute(desired, modality, installments)?;
        let record = CalculationRecord::from_result(&result, (self.clock)());
        self.history.append(record)?;

        Ok(result)
    }

    /// Log rows, newest first
    pub fn history(&self) -> Vec<&CalculationRecord> {
        self.history.render_order()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_path(&self) -> &Path {
        self.history.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeeError;
    use chrono::NaiveDate;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn session(dir: &tempfile::TempDir) -> CalculatorSession {
        CalculatorSession::open(dir.path().join("historico.json"), FeeTable::standard())
            .with_clock(fixed_clock)
    }

    #[test]
    fn test_calculate_records_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);

        let result = s.calculate("100,00", Modality::DebitNow, None).unwrap();

        assert_eq!(format!("{:.2}", result.gross), "103.09");
        let history = s.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].modality_label, "Débito à vista");
        assert_eq!(history[0].timestamp, fixed_clock());
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);

        assert!(matches!(
            s.calculate("0", Modality::DebitNow, None),
            Err(SessionError::NonPositiveAmount)
        ));
        assert!(matches!(
            s.calculate("-5", Modality::DebitNow, None),
            Err(SessionError::NonPositiveAmount)
        ));
        assert_eq!(s.history_len(), 0);
    }

    #[test]
    fn test_rejects_garbage_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);

        let err = s.calculate(" dez ", Modality::DebitNow, None).unwrap_err();

        assert!(matches!(err, SessionError::InvalidNumber(ref t) if t == "dez"));
    }

    #[test]
    fn test_fee_errors_are_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);

        let err = s.calculate("50", Modality::CreditInstallments, None).unwrap_err();

        assert!(matches!(
            err,
            SessionError::Fee(FeeError::InvalidInstallmentCount(None))
        ));
        assert_eq!(s.history_len(), 0);
    }

    #[test]
    fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut s = session(&dir);
            s.calculate("10", Modality::CreditNow, None).unwrap();
            s.calculate("20", Modality::CreditInstallments, Some(6)).unwrap();
        }

        let reopened = session(&dir);
        let history = reopened.history();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].modality_label, "Crédito parcelado em 6x");
        assert_eq!(history[1].desired_net, 10.0);
    }

    #[test]
    fn test_huge_amount_keeps_earlier_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        s.calculate("10", Modality::DebitNow, None).unwrap();
        s.calculate("20", Modality::CreditNow, None).unwrap();

        let err = s
            .calculate("1.7e308", Modality::CreditInstallments, Some(12))
            .unwrap_err();

        assert!(matches!(err, SessionError::Fee(FeeError::AmountTooLarge(_))));
        assert_eq!(s.history_len(), 2);
        let reopened = session(&dir);
        assert_eq!(reopened.history_len(), 2);
    }

    #[test]
    fn test_write_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be makes the write fail
        let path = dir.path().join("blocked");
        std::fs::create_dir(&path).unwrap();
        let mut s = CalculatorSession::open(&path, FeeTable::standard());

        let err = s.calculate("10", Modality::DebitNow, None).unwrap_err();

        assert!(matches!(err, SessionError::History(_)));
        assert_eq!(s.history_len(), 0);
    }
}
