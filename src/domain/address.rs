use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Shipping,
    Billing,
    Other,
}

impl AddressKind {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shipping" => Ok(AddressKind::Shipping),
            "billing" => Ok(AddressKind::Billing),
            "other" => Ok(AddressKind::Other),
            other => Err(DomainError::Validation(format!(
                "unknown address kind '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddressKind::Shipping => "shipping",
            AddressKind::Billing => "billing",
            AddressKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub kind: AddressKind,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub kind: AddressKind,
    pub is_default: bool,
}

impl NewAddress {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddressUpdate {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub kind: Option<AddressKind>,
}

impl AddressUpdate {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
            && self.kind.is_none()
    }
}

/// The address pre-selected on checkout: an explicitly-selected id when it
/// resolves, else the default, else the first by creation order.
pub fn choose_checkout_address(
    addresses: &[Address],
    selected: Option<Uuid>,
) -> Option<&Address> {
    if let Some(id) = selected {
        if let Some(address) = addresses.iter().find(|a| a.id == id) {
            return Some(address);
        }
    }
    addresses
        .iter()
        .find(|a| a.is_default)
        .or_else(|| addresses.first())
}
