use thiserror::Error;

/// Failure classes of the resolver pipeline.
///
/// `MixedStream`, `ObservationType` and `Io` abort the run; the remaining
/// classes are counted by the driver and surfaced in the run summary.
#[derive(Debug, Error)]
pub enum Error {
    /// Line without a usable DF002, or a decoder could not locate a
    /// mandatory field.
    #[error("malformed input line: {0}")]
    InputMalformed(String),

    /// Per-PRN history table is full; the record was dropped.
    #[error("history capacity exceeded for PRN {0}")]
    Capacity(usize),

    /// An observation message of the other family arrived after the first
    /// one latched the stream type.
    #[error("mixed observation stream: message type {found} after type {active}")]
    MixedStream { active: u16, found: u16 },

    /// An observation family the series builder does not know reached it.
    #[error("observation type {0} not supported by the series builder")]
    ObservationType(u8),

    /// Normal-equation matrix was not invertible for this epoch.
    #[error("singular geometry matrix at epoch index {0}")]
    SingularGeometry(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
