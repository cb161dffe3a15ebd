//! Value object trait: equality by value, not identity.
//!
//! Value objects are defined entirely by their attribute values. Two value
//! objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// The trait requires:
/// - **Clone**: value objects are copied, never shared mutably
/// - **PartialEq**: value objects are compared by their attribute values
/// - **Debug**: value objects show up in logs and test failures
///
/// Directory sub-records that carry a trust attestation build on this trait
/// (see `gatekeep_directory::VerifiableContent`): their change detection is
/// exactly value equality of the content.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Handle {
///     url: String,
///     username: String,
/// }
///
/// impl ValueObject for Handle {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
