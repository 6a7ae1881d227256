/// Common error type used throughout the crate.
pub type Err = anyhow::Error;
/// Result type aliased to the crate's common error type.
pub type Res<T> = Result<T, Err>;
/// A `Res` with no success payload.
pub type Void = Res<()>;
