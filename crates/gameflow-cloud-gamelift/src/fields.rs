//! Helpers between remote field maps and SDK shapes

use crate::error::{GameLiftError, Result};
use gameflow_cloud::{Attributes, RemoteFields, Value};

/// Non-empty scalar
pub(crate) fn text(attrs: &Attributes, name: &str) -> Option<String> {
    attrs
        .get(name)
        .and_then(Value::as_scalar)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Scalar list, empty when the field was cleared
pub(crate) fn strings(attrs: &Attributes, name: &str) -> Option<Vec<String>> {
    match attrs.get(name) {
        Some(Value::List(items)) => Some(items.clone()),
        _ => None,
    }
}

pub(crate) fn integer(attrs: &Attributes, name: &str) -> Result<Option<i32>> {
    let Some(raw) = text(attrs, name) else {
        return Ok(None);
    };
    raw.parse::<i32>()
        .map(Some)
        .map_err(|_| GameLiftError::InvalidInteger {
            field: name.to_string(),
            value: raw,
        })
}

/// Non-empty single block
pub(crate) fn block<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a Attributes> {
    match attrs.get(name) {
        Some(Value::Block(inner)) if !inner.is_empty() => Some(inner),
        _ => None,
    }
}

pub(crate) fn blocks<'a>(attrs: &'a Attributes, name: &str) -> &'a [Attributes] {
    match attrs.get(name) {
        Some(Value::Blocks(items)) => items,
        _ => &[],
    }
}

/// Collects response fields, skipping what the service left unset
#[derive(Default)]
pub(crate) struct Collector(Attributes);

impl Collector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn text(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.0.insert(name.to_string(), Value::scalar(value));
        }
        self
    }

    pub(crate) fn number(mut self, name: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.0.insert(name.to_string(), Value::scalar(value.to_string()));
        }
        self
    }

    pub(crate) fn strings(mut self, name: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.0.insert(name.to_string(), Value::list(values.iter().cloned()));
        }
        self
    }

    pub(crate) fn block(mut self, name: &str, inner: Option<Attributes>) -> Self {
        if let Some(inner) = inner.filter(|b| !b.is_empty()) {
            self.0.insert(name.to_string(), Value::Block(inner));
        }
        self
    }

    pub(crate) fn into_attributes(self) -> Attributes {
        self.0
    }

    pub(crate) fn into_fields(self) -> RemoteFields {
        RemoteFields::from(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> Attributes {
        Collector::new()
            .text("Name", Some("arena"))
            .text("Description", Some(""))
            .number("FromPort", Some(7777))
            .text("Protocol", None)
            .strings("LogPaths", &[])
            .into_attributes()
    }

    #[test]
    fn test_collector_skips_unset() {
        let attrs = attrs();
        assert_eq!(attrs.len(), 2);
        assert_eq!(text(&attrs, "Name"), Some("arena".to_string()));
        assert_eq!(text(&attrs, "Description"), None);
    }

    #[test]
    fn test_integer_parsing() {
        let mut attrs = attrs();
        assert_eq!(integer(&attrs, "FromPort").unwrap(), Some(7777));
        assert_eq!(integer(&attrs, "ToPort").unwrap(), None);

        attrs.insert("ToPort".to_string(), Value::scalar("99999999999"));
        assert!(matches!(
            integer(&attrs, "ToPort"),
            Err(GameLiftError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_block_helpers() {
        let mut attrs = Attributes::new();
        attrs.insert("RoutingStrategy".to_string(), Value::Block(Attributes::new()));
        attrs.insert("Permissions".to_string(), Value::Blocks(vec![Attributes::new()]));

        assert!(block(&attrs, "RoutingStrategy").is_none());
        assert_eq!(blocks(&attrs, "Permissions").len(), 1);
        assert!(blocks(&attrs, "Missing").is_empty());
        assert_eq!(strings(&attrs, "Missing"), None);
    }
}
