use std::fmt;

/// Errors reported by engine operations.
///
/// A failed operation leaves the canvas, its state stack and the attached
/// surface exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed geometry, out-of-range parameters or an unsupported color layout.
    InvalidArgument(String),
    /// `restore` without a matching `save`.
    StateUnderflow,
    /// A thread holding a read lock asked for the write lock, or touched guarded
    /// data while another access of the same thread was still in progress.
    InvalidLockTransition,
    /// A buffer allocation failed.
    OutOfMemory,
    /// The active backend or device lacks the requested capability.
    Unsupported(&'static str),
    /// Drawing was requested before a surface was attached.
    NotInitialized,
    /// A bounded wait expired before the awaited event.
    Timeout,
}

/// Shorthand for [`Error::InvalidArgument`].
#[inline]
pub(crate) fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidArgument(msg.into())
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::StateUnderflow => f.write_str("state stack underflow: restore without save"),
            Error::InvalidLockTransition => f.write_str("invalid lock transition"),
            Error::OutOfMemory => f.write_str("out of memory"),
            Error::Unsupported(what) => write!(f, "unsupported: {what}"),
            Error::NotInitialized => f.write_str("no surface attached"),
            Error::Timeout => f.write_str("operation timed out"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Allocates a vector of `len` copies of `value`, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    v.resize(len, value);
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_detail() {
        let e = invalid("radius is NaN");
        assert_eq!(e.to_string(), "invalid argument: radius is NaN");
        assert_eq!(Error::Unsupported("overlay").to_string(), "unsupported: overlay");
    }

    #[test]
    fn try_vec_fills() {
        let v = try_vec(4, 7u8).unwrap();
        assert_eq!(v, vec![7, 7, 7, 7]);
    }

    #[test]
    fn try_vec_reports_oom() {
        assert_eq!(try_vec::<u64>(usize::MAX / 2, 0).unwrap_err(), Error::OutOfMemory);
    }
}
