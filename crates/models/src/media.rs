use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use strum::{AsRefStr, EnumIter, EnumProperty, EnumString, IntoEnumIterator};

#[cfg(feature = "database")]
use sea_orm::Value;

/// The kind of media a lesson's content points at.
///
/// The storage token (`video` / `pdf`) is what the database holds, the
/// MIME-style token is what travels in payloads and upload requests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, EnumProperty,
)]
pub enum MediaKind {
    #[strum(serialize = "video", props(mime = "video/mp4"))]
    Video,
    #[strum(serialize = "pdf", props(mime = "application/pdf"))]
    Document,
}

impl MediaKind {
    /// Token stored in the `lessons.content_kind` column
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Canonical MIME-style token used on the wire
    pub fn as_mime(&self) -> &'static str {
        self.get_str("mime").unwrap_or_default()
    }

    pub fn all() -> Vec<MediaKind> {
        MediaKind::iter().collect()
    }

    /// Parses a canonical MIME-style token back into a kind.
    pub fn from_mime(token: &str) -> Option<Self> {
        Self::iter().find(|kind| kind.as_mime() == token)
    }

    /// Classifies an arbitrary upload content type.
    ///
    /// Any `video/*` type is a video; only `application/pdf` is a document.
    pub fn classify(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.split_once('/') {
            Some(("video", subtype)) if !subtype.is_empty() => Some(Self::Video),
            Some(("application", "pdf")) => Some(Self::Document),
            _ => None,
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_mime())
    }
}

impl Serialize for MediaKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_mime())
    }
}

impl<'de> Deserialize<'de> for MediaKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;

        // Older payloads carry the storage token instead of the MIME form
        MediaKind::from_mime(&token)
            .or_else(|| MediaKind::from_str(&token).ok())
            .ok_or_else(|| D::Error::custom(format!("unknown media type `{token}`")))
    }
}

#[cfg(feature = "database")]
impl sea_orm::sea_query::ValueType for MediaKind {
    fn try_from(v: Value) -> Result<Self, sea_orm::sea_query::ValueTypeErr> {
        match v {
            Value::String(Some(s)) => {
                MediaKind::from_str(&s).map_err(|_| sea_orm::sea_query::ValueTypeErr)
            }
            _ => Err(sea_orm::sea_query::ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "MediaKind".to_string()
    }

    fn array_type() -> sea_orm::sea_query::ArrayType {
        sea_orm::sea_query::ArrayType::String
    }

    fn column_type() -> sea_orm::sea_query::ColumnType {
        sea_orm::sea_query::ColumnType::Text
    }
}

#[cfg(feature = "database")]
impl From<MediaKind> for Value {
    fn from(kind: MediaKind) -> Self {
        Value::String(Some(Box::new(kind.as_str().to_owned())))
    }
}

#[cfg(feature = "database")]
impl sea_orm::TryGetable for MediaKind {
    fn try_get_by<I: sea_orm::ColIdx>(
        res: &sea_orm::QueryResult,
        index: I,
    ) -> Result<Self, sea_orm::TryGetError> {
        // Go through String's TryGetable so a NULL stays TryGetError::Null
        // and Option<MediaKind> decodes it as None
        let val = <String as sea_orm::TryGetable>::try_get_by(res, index)?;

        MediaKind::from_str(&val).map_err(|e| {
            sea_orm::TryGetError::DbErr(sea_orm::DbErr::Type(format!(
                "Failed to parse MediaKind `{val}`: {e}"
            )))
        })
    }
}

#[cfg(feature = "database")]
impl sea_orm::sea_query::Nullable for MediaKind {
    fn null() -> Value {
        Value::String(None)
    }
}
