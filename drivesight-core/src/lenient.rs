//! Tolerant field deserializers for model-produced JSON.
//!
//! `#[serde(default)]` only covers absent keys. These helpers also accept
//! `null`, wrong-typed values and stray list elements, mapping each onto the
//! field's default so a single odd value cannot fail the whole document.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Text {
    Text(String),
    Other(IgnoredAny),
}

impl Text {
    fn into_option(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Item<T> {
    Item(T),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum List<T> {
    Many(Vec<Item<T>>),
    Other(IgnoredAny),
}

/// A string, or `""` for anything that is not one.
pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Text::deserialize(d)?.into_option().unwrap_or_default())
}

/// A non-blank string, or `None`.
pub(crate) fn non_blank<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Text::deserialize(d)?
        .into_option()
        .filter(|s| !s.trim().is_empty()))
}

/// A number, also accepted as a numeric string; `0.0` otherwise.
pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    let value = match Number::deserialize(d)? {
        Number::Number(n) => n as f32,
        Number::Text(s) => s.trim().parse().unwrap_or(0.0),
        Number::Other(_) => 0.0,
    };
    Ok(if value.is_finite() { value } else { 0.0 })
}

/// A list of strings. A lone string becomes a one-element list; non-string
/// elements are dropped; anything else is an empty list.
pub(crate) fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Strings {
        Many(Vec<Text>),
        One(String),
        Other(IgnoredAny),
    }

    Ok(match Strings::deserialize(d)? {
        Strings::Many(items) => items.into_iter().filter_map(Text::into_option).collect(),
        Strings::One(s) => vec![s],
        Strings::Other(_) => Vec::new(),
    })
}

/// A list whose elements that fail to deserialize as `T` are skipped.
pub(crate) fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match List::<T>::deserialize(d)? {
        List::Many(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Item::Item(t) => Some(t),
                Item::Other(_) => None,
            })
            .collect(),
        List::Other(_) => Vec::new(),
    })
}

/// `T`, or `T::default()` for `null` or a value of the wrong shape.
pub(crate) fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(match Item::<T>::deserialize(d)? {
        Item::Item(t) => t,
        Item::Other(_) => T::default(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Inner {
        #[serde(default, deserialize_with = "super::string")]
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Doc {
        #[serde(default, deserialize_with = "super::string")]
        text: String,
        #[serde(default, deserialize_with = "super::non_blank")]
        maybe: Option<String>,
        #[serde(default, deserialize_with = "super::number")]
        score: f32,
        #[serde(default, deserialize_with = "super::strings")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "super::list")]
        items: Vec<Inner>,
        #[serde(default, deserialize_with = "super::or_default")]
        inner: Inner,
    }

    #[test]
    fn test_nulls_become_defaults() {
        let doc: Doc = serde_json::from_str(
            r#"{"text": null, "maybe": null, "score": null, "tags": null, "items": null, "inner": null}"#,
        )
        .unwrap();
        assert_eq!(doc.text, "");
        assert_eq!(doc.maybe, None);
        assert_eq!(doc.score, 0.0);
        assert!(doc.tags.is_empty());
        assert!(doc.items.is_empty());
        assert_eq!(doc.inner, Inner::default());
    }

    #[test]
    fn test_wrong_types_are_coerced_or_dropped() {
        let doc: Doc = serde_json::from_str(
            r#"{"text": 7, "maybe": "  ", "score": "0.75", "tags": ["wet", null, 3], "items": [{"name": "a"}, "b", null], "inner": []}"#,
        )
        .unwrap();
        assert_eq!(doc.text, "");
        assert_eq!(doc.maybe, None);
        assert_eq!(doc.score, 0.75);
        assert_eq!(doc.tags, vec!["wet"]);
        assert_eq!(doc.items, vec![Inner { name: "a".into() }]);
        assert_eq!(doc.inner, Inner::default());
    }

    #[test]
    fn test_single_string_becomes_list() {
        let doc: Doc = serde_json::from_str(r#"{"tags": "fog"}"#).unwrap();
        assert_eq!(doc.tags, vec!["fog"]);
    }
}
