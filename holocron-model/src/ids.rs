use base64::Engine;
use std::fmt;

/// Opaque catalog id for a film, as issued by the catalog API.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FilmId(pub String);

/// Opaque catalog id for a character (a "person" upstream).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CharacterId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Decode the Relay-style global id behind this value.
            pub fn decode(&self) -> GlobalId {
                GlobalId::decode(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(FilmId);
string_id!(CharacterId);

/// Parts of a Relay global id such as `cGVvcGxlOjIy` (`people:22`).
///
/// Decoding never fails; anything that does not parse leaves the
/// corresponding part empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalId {
    pub kind: Option<String>,
    pub raw: Option<String>,
    pub numeric: Option<u64>,
}

impl GlobalId {
    pub fn decode(global_id: &str) -> Self {
        let Ok(bytes) =
            base64::engine::general_purpose::STANDARD.decode(global_id.trim())
        else {
            return Self::default();
        };
        let Ok(decoded) = String::from_utf8(bytes) else {
            return Self::default();
        };

        let mut parts = decoded.splitn(2, ':');
        let kind = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let raw = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let numeric = raw
            .as_deref()
            .filter(|r| r.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|r| r.parse().ok());

        Self { kind, raw, numeric }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_people_id() {
        let id = GlobalId::decode("cGVvcGxlOjIy");
        assert_eq!(id.kind.as_deref(), Some("people"));
        assert_eq!(id.raw.as_deref(), Some("22"));
        assert_eq!(id.numeric, Some(22));
    }

    #[test]
    fn non_numeric_raw_keeps_raw_only() {
        // "films:abc"
        let id = GlobalId::decode("ZmlsbXM6YWJj");
        assert_eq!(id.kind.as_deref(), Some("films"));
        assert_eq!(id.raw.as_deref(), Some("abc"));
        assert_eq!(id.numeric, None);
    }

    #[test]
    fn garbage_decodes_to_empty_parts() {
        assert_eq!(GlobalId::decode("%%%not-base64"), GlobalId::default());
        assert_eq!(GlobalId::decode(""), GlobalId::default());
    }

    #[test]
    fn typed_ids_delegate_to_global_decode() {
        let film = FilmId::new("ZmlsbXM6MQ==");
        assert_eq!(film.decode().numeric, Some(1));
        assert_eq!(film.to_string(), "ZmlsbXM6MQ==");
    }
}
