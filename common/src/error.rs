use thiserror::Error;

/// Failures that a caller of the scan engine can observe.
///
/// Probe and name resolution failures never show up here: they are absorbed
/// into "no result" for the unit of work that produced them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// No active IPv4 interface was found to derive a /24 prefix from.
    #[error("unable to determine the local subnet")]
    NoSubnet,

    /// A subnet prefix did not consist of exactly three decimal octets.
    #[error("invalid subnet prefix: {0}")]
    InvalidPrefix(String),
}
