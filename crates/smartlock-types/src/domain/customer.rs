use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::domain::validation::{ValidationErrors, Validator};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s\-\+\(\)]{10,}$").expect("phone pattern"));
static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[1-9][0-9]{3} ?[A-Z]{2}$").expect("postal code pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone.trim())
}

/// Dutch postal code, with or without the space: `1234 AB`, `1234ab`.
pub fn is_valid_postal_code(code: &str) -> bool {
    POSTAL_CODE.is_match(code.trim())
}

/// `1234ab` -> `1234 AB`. Input must already pass [`is_valid_postal_code`].
pub fn normalize_postal_code(code: &str) -> String {
    let compact: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let (digits, letters) = compact.split_at(4.min(compact.len()));
    format!("{digits} {letters}")
}

/// Shipping and contact details as submitted at checkout, unchecked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl CustomerInput {
    pub fn validate(self) -> Result<Customer, ValidationErrors> {
        let mut v = Validator::new();
        v.require("name", &self.name);
        if v.require("email", &self.email) {
            v.check(
                "email",
                is_valid_email(&self.email),
                "is not a valid email address",
            );
        }
        if v.require("phone", &self.phone) {
            v.check(
                "phone",
                is_valid_phone(&self.phone),
                "is not a valid phone number",
            );
        }
        v.require("address", &self.address);
        v.require("city", &self.city);
        if v.require("postal_code", &self.postal_code) {
            v.check(
                "postal_code",
                is_valid_postal_code(&self.postal_code),
                "is not a valid postal code (e.g. 1234 AB)",
            );
        }
        v.finish()?;

        Ok(Customer {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            postal_code: normalize_postal_code(&self.postal_code),
        })
    }
}
