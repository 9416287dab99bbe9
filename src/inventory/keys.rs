//! Parsers for the WMI object paths carried by `Win32_LoggedOnUser`.
//!
//! A path looks like `\\SERVER\root\cimv2:Class.Key="value",Other="value"`.
//! The shape is checked before anything is extracted; unexpected input is a
//! decode error rather than a guessed identifier.

use crate::error::InventoryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath<'a> {
    pub class: &'a str,
    pub keys: Vec<(&'a str, String)>,
}

impl<'a> ObjectPath<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, InventoryError> {
        let err = || InventoryError::decode("WMI object path", raw);

        let rest = raw.strip_prefix(r"\\").ok_or_else(err)?;
        let (location, object) = rest.split_once(':').ok_or_else(err)?;
        let (server, namespace) = location.split_once('\\').ok_or_else(err)?;
        if server.is_empty() || !namespace.eq_ignore_ascii_case(r"root\cimv2") {
            return Err(err());
        }

        let (class, key_list) = object.split_once('.').ok_or_else(err)?;
        if class.is_empty() || !class.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(err());
        }

        let keys = parse_keys(key_list).ok_or_else(err)?;
        if keys.is_empty() {
            return Err(err());
        }

        Ok(Self { class, keys })
    }

    pub fn key(&self, name: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// `Key="value",Key2="value2"`; quoted values may contain `\"` and `\\`.
fn parse_keys(input: &str) -> Option<Vec<(&str, String)>> {
    let mut keys = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let (name, after) = rest.split_once('=')?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            let mut value = String::new();
            let mut chars = quoted.char_indices();
            let mut end = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => value.push(chars.next()?.1),
                    '"' => {
                        end = Some(i + 1);
                        break;
                    }
                    _ => value.push(c),
                }
            }
            (value, &quoted[end?..])
        } else {
            let end = after.find(',').unwrap_or(after.len());
            (after[..end].to_string(), &after[end..])
        };

        keys.push((name, value));
        rest = match remainder.strip_prefix(',') {
            Some(next) if !next.is_empty() => next,
            Some(_) => return None,
            None if remainder.is_empty() => remainder,
            None => return None,
        };
    }

    Some(keys)
}

/// The user account side of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
    pub domain: Option<String>,
    pub name: String,
}

impl AccountKey {
    pub fn parse(antecedent: &str) -> Result<Self, InventoryError> {
        let path = ObjectPath::parse(antecedent)?;
        if !path.class.ends_with("Account") {
            return Err(InventoryError::decode("account key", antecedent));
        }
        let name = path
            .key("Name")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| InventoryError::decode("account key", antecedent))?;

        Ok(Self {
            domain: path.key("Domain").map(str::to_string),
            name: name.to_string(),
        })
    }
}

/// The logon-session identifier embedded in a binding's dependent key.
pub fn parse_logon_id(dependent: &str) -> Result<String, InventoryError> {
    let path = ObjectPath::parse(dependent)?;
    if !path.class.eq_ignore_ascii_case("Win32_LogonSession") {
        return Err(InventoryError::decode("logon session key", dependent));
    }
    match path.key("LogonId") {
        Some(id) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => Ok(id.to_string()),
        _ => Err(InventoryError::decode("logon session key", dependent)),
    }
}
