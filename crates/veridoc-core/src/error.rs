use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("trust score out of range [0, 100]: {0}")]
    InvalidScore(f64),

    #[error("threshold ordering violated: need reject {reject} <= manual {manual} <= auto {auto}")]
    InvalidThresholds { reject: f64, manual: f64, auto: f64 },

    #[error("malformed address: {0:?}")]
    MalformedAddress(String),

    #[error("malformed amount: {0:?}")]
    MalformedAmount(String),

    #[error("amount arithmetic overflow")]
    AmountOverflow,
}
