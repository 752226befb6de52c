//! Delivery address types.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// Label of a saved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AddressKind {
    #[default]
    Home,
    Office,
    Other,
}

impl std::str::FromStr for AddressKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "office" | "work" => Ok(Self::Office),
            "other" => Ok(Self::Other),
            other => Err(format!("invalid address type: {other}")),
        }
    }
}

/// The postal part of an address, shared by saved addresses, the user
/// profile, and the customer snapshot on an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFields {
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl AddressFields {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Single-line rendering for order summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(6);
        if let Some(apartment) = self.apartment.as_deref().filter(|a| !a.trim().is_empty()) {
            parts.push(apartment);
        }
        parts.extend([
            self.street.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.postal_code.as_str(),
            self.country.as_str(),
        ]);
        parts.join(", ")
    }
}

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(rename = "type")]
    pub kind: AddressKind,
    #[serde(flatten)]
    pub fields: AddressFields,
    #[serde(default)]
    pub is_default: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields() -> AddressFields {
        AddressFields {
            street: "12 MG Road".to_owned(),
            apartment: Some("Flat 4B".to_owned()),
            city: "Pune".to_owned(),
            state: "MH".to_owned(),
            postal_code: "411001".to_owned(),
            country: "India".to_owned(),
        }
    }

    #[test]
    fn test_missing_fields() {
        assert!(fields().missing_fields().is_empty());

        let blank = AddressFields {
            city: "  ".to_owned(),
            postal_code: String::new(),
            ..fields()
        };
        assert_eq!(blank.missing_fields(), vec!["city", "postalCode"]);
    }

    #[test]
    fn test_one_line() {
        assert_eq!(
            fields().one_line(),
            "Flat 4B, 12 MG Road, Pune, MH, 411001, India"
        );
    }

    #[test]
    fn test_address_json_shape() {
        let address = Address {
            id: AddressId::generate(),
            kind: AddressKind::Office,
            fields: fields(),
            is_default: true,
        };
        let value = serde_json::to_value(&address).unwrap();
        assert_eq!(value["type"], "Office");
        assert_eq!(value["postalCode"], "411001");
        assert_eq!(value["isDefault"], true);

        let back: Address = serde_json::from_value(value).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("work".parse::<AddressKind>().unwrap(), AddressKind::Office);
        assert!("castle".parse::<AddressKind>().is_err());
    }
}
