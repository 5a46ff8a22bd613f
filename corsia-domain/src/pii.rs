use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for passenger contact data that masks its value in `Debug` and
/// `Display` output. Serialization passes the real value through: audit
/// entries and store rows need it, the risk is accidental leakage through
/// log macros like `tracing::info!("{:?}", entry)`.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_is_masked() {
        let contact = Masked::new("ada@example.com".to_string());
        assert_eq!(format!("{:?}", contact), "********");
        assert_eq!(format!("{}", contact), "********");
    }

    #[test]
    fn test_serialization_keeps_value() {
        let contact = Masked::new("ada@example.com".to_string());
        let json = serde_json::to_string(&contact).unwrap();
        assert_eq!(json, "\"ada@example.com\"");
    }
}
