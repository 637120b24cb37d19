use snafu::Snafu;
use std::{borrow::Cow, ops::RangeInclusive};

/// Length constraints for a namespace name.
///
/// A `RangeInclusive` is a closed interval, covering [1, 64]
const LENGTH_CONSTRAINT: RangeInclusive<usize> = 1..=64;

/// Namespace name validation errors.
#[derive(Debug, Snafu)]
pub enum NamespaceNameError {
    #[snafu(display(
        "namespace name {} length must be between {} and {} characters",
        name,
        LENGTH_CONSTRAINT.start(),
        LENGTH_CONSTRAINT.end()
    ))]
    LengthConstraint { name: String },

    #[snafu(display(
        "namespace name {} contains invalid characters (allowed: alphanumeric, _ and -)",
        name
    ))]
    BadChars { name: String },
}

/// A correctly formed namespace name.
///
/// The namespace is the tenant/category key carried as the second path
/// segment of a submission, and is used for backpressure accounting. Using
/// this wrapper type allows the consuming code to enforce the invariant that
/// only valid names are provided.
///
/// This type derefs to a `str` and therefore can be used in place of
/// anything that is expecting a `str`:
///
/// ```rust
/// # use data_types::NamespaceName;
/// fn print_namespace(s: &str) {
///     println!("namespace: {}", s);
/// }
///
/// let ns = NamespaceName::new("events").unwrap();
/// print_namespace(&ns);
/// ```
///
/// But this is not reciprocal - functions that wish to accept only
/// pre-validated names can use `NamespaceName` as a parameter.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct NamespaceName<'a>(Cow<'a, str>);

impl<'a> NamespaceName<'a> {
    /// Validate `name` and wrap it, rejecting empty, over-long and
    /// badly-charactered values.
    pub fn new<T: Into<Cow<'a, str>>>(name: T) -> Result<Self, NamespaceNameError> {
        let name: Cow<'a, str> = name.into();

        if !LENGTH_CONSTRAINT.contains(&name.len()) {
            return Err(NamespaceNameError::LengthConstraint {
                name: name.to_string(),
            });
        }

        // Validate the name contains only valid characters.
        //
        // NOTE: If changing these characters, please update the error message
        // above.
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(NamespaceNameError::BadChars {
                name: name.to_string(),
            });
        }

        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl<'a> std::convert::From<NamespaceName<'a>> for String {
    fn from(name: NamespaceName<'a>) -> Self {
        name.0.to_string()
    }
}

impl<'a> std::convert::TryFrom<&'a str> for NamespaceName<'a> {
    type Error = NamespaceNameError;

    fn try_from(v: &'a str) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl<'a> std::convert::TryFrom<String> for NamespaceName<'a> {
    type Error = NamespaceNameError;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl<'a> std::ops::Deref for NamespaceName<'a> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl<'a> std::fmt::Display for NamespaceName<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
