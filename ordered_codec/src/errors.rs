use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of buffer: needed {needed} bytes but only {remaining} remain")]
    Truncated { needed: usize, remaining: usize },

    #[error("declared length {length} exceeds the {max} byte decode ceiling")]
    OversizedLength { length: u64, max: usize },

    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("timestamp of {micros} microseconds is outside the representable range")]
    TimestampRange { micros: u64 },
}
