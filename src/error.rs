// Error kinds for the fee core, the history store and the desktop session

use thiserror::Error;

/// Failures of a fee lookup or of the inversion itself
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeeError {
    /// Modality or table key string that names no entry
    #[error("Modalidade de pagamento inválida: '{0}'")]
    InvalidModality(String),

    /// Installment count missing or outside 2..=12
    #[error("Número de parcelas inválido{}. Deve ser entre 2 e 12.", describe_count(.0))]
    InvalidInstallmentCount(Option<u32>),

    /// Net factor of zero; the gross amount would be undefined
    #[error("Não foi possível calcular: fator de recebimento igual a zero")]
    DivisionByZero,

    /// Desired amount is negative, NaN or infinite
    #[error("Valor desejado inválido: {0}")]
    InvalidAmount(f64),

    /// Gross amount does not fit in a finite number
    #[error("Valor desejado grande demais para calcular: {0}")]
    AmountTooLarge(f64),
}

fn describe_count(count: &Option<u32>) -> String {
    match count {
        Some(n) => format!(" ({})", n),
        None => String::new(),
    }
}

/// Failures of the persisted history log
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Histórico ainda não carregado")]
    NotLoaded,

    /// JSON has no representation for NaN or infinity
    #[error("Registro com valor não finito não pode ser gravado")]
    NonFiniteAmount,

    #[error("Falha ao gravar o histórico: {0}")]
    Io(#[from] std::io::Error),

    #[error("Falha ao serializar o histórico: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything a calculation request from the desktop front-end can hit
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Por favor, digite um número válido para o valor desejado ('{0}').")]
    InvalidNumber(String),

    #[error("O valor desejado deve ser maior que zero.")]
    NonPositiveAmount,

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
