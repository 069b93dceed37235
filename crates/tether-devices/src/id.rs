use core::fmt;

/// Broker-assigned device identifier: 24 hex characters.
///
/// Construction never fails. A device built with a malformed id is still
/// usable in memory, it just never makes it onto the connect roster and so
/// never sees broker traffic. Callers check `is_valid` where that matters.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DeviceId {
    raw: String,
}

impl DeviceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn is_valid(&self) -> bool {
        self.raw.len() == 24 && self.raw.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for DeviceId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_24_hex_characters() {
        assert!(DeviceId::new("5dc1564130b2a3f9c8d7e6f0").is_valid());
        assert!(DeviceId::new("AABBCCDDEEFF001122334455").is_valid());
    }

    #[test]
    fn rejects_wrong_length_or_alphabet() {
        assert!(!DeviceId::new("").is_valid());
        assert!(!DeviceId::new("5dc1564130b2a3f9c8d7e6").is_valid());
        assert!(!DeviceId::new("5dc1564130b2a3f9c8d7e6f0aa").is_valid());
        assert!(!DeviceId::new("5dc1564130b2a3f9c8d7e6zz").is_valid());
    }

    #[test]
    fn displays_raw_value() {
        let id = DeviceId::from("not-a-real-id");
        assert_eq!(id.to_string(), "not-a-real-id");
        assert!(!id.is_valid());
    }
}
