/// A search-cluster field type, i.e. the value of a mapping property's
/// `type` key.
///
/// The variant set is the closed list a `es_type` tag override is allowed to
/// name; anything outside it is an [`InvalidFieldType`] at the
/// tag-override site and simply "not representable" when derived from a
/// source type name (the attribute is then dropped, see [`map`]).
///
/// [`InvalidFieldType`]: crate::ConfigError::InvalidFieldType
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldType {
    Text,
    Keyword,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    Boolean,
    Date,
    Binary,
    Object,
    Ip,
    Completion,
    GeoPoint,
    GeoShape,
}

impl FieldType {
    const ALL: &'static [(&'static str, FieldType)] = &[
        ("text", FieldType::Text),
        ("keyword", FieldType::Keyword),
        ("long", FieldType::Long),
        ("integer", FieldType::Integer),
        ("short", FieldType::Short),
        ("byte", FieldType::Byte),
        ("double", FieldType::Double),
        ("float", FieldType::Float),
        ("half_float", FieldType::HalfFloat),
        ("scaled_float", FieldType::ScaledFloat),
        ("boolean", FieldType::Boolean),
        ("date", FieldType::Date),
        ("binary", FieldType::Binary),
        ("object", FieldType::Object),
        ("ip", FieldType::Ip),
        ("completion", FieldType::Completion),
        ("geo_point", FieldType::GeoPoint),
        ("geo_shape", FieldType::GeoShape),
    ];

    /// Parses an `es_type` tag override. The tag must be one of the closed
    /// set of search-cluster field type names; any other string is rejected
    /// rather than silently dropped, since an explicit override is a
    /// statement of intent from the model author.
    pub fn from_tag(tag: &str) -> Option<FieldType> {
        Self::ALL.iter().find(|(name, _)| *name == tag).map(|(_, ty)| *ty)
    }

    pub fn as_str(self) -> &'static str {
        Self::ALL.iter().find(|(_, ty)| *ty == self).map(|(name, _)| *name).unwrap()
    }
}

/// Strips one layer of `array<T>` / `set<T>` and returns the inner type name,
/// or `None` if `source_type` isn't a homogeneous collection wrapper.
fn unwrap_collection(source_type: &str) -> Option<&str> {
    let source_type = source_type.trim();
    for wrapper in ["array<", "set<"] {
        if let Some(rest) = source_type.strip_prefix(wrapper) {
            if let Some(inner) = rest.strip_suffix('>') {
                return Some(inner.trim());
            }
        }
    }
    None
}

/// Maps a bare source type name to a field type, with no tag override in
/// play. Returns `None` for anything unrecognized; callers
/// treat that as "omit this attribute" rather than an error.
fn map_source_type(source_type: &str) -> Option<FieldType> {
    if let Some(inner) = unwrap_collection(source_type) {
        return map_source_type(inner);
    }

    let lower = source_type.trim().to_ascii_lowercase();
    // `map<string,string>`, `hash<k,v>`, `record<...>` and `json<...>` all
    // carry a generic payload that doesn't affect the field type they
    // resolve to; match on the base name alone.
    let base = lower.split('<').next().unwrap_or(&lower);
    let ty = match base {
        "bool" | "boolean" => FieldType::Boolean,
        "int8" | "i8" => FieldType::Byte,
        "int16" | "i16" | "short" => FieldType::Short,
        "int32" | "i32" | "int" | "integer" => FieldType::Integer,
        "int64" | "i64" | "long" => FieldType::Long,
        "float32" | "f32" | "float" => FieldType::Float,
        "float64" | "f64" | "double" => FieldType::Double,
        "string" | "str" | "text" => FieldType::Text,
        "time" | "timestamp" | "datetime" => FieldType::Date,
        "json" | "object" | "map" | "hash" | "record" => FieldType::Object,
        _ => return None,
    };
    Some(ty)
}

/// Public contract of the type mapper: `map(source_type, tag_override)
/// -> field_type | none`, with an explicit `es_type` override taking
/// precedence and validated against the closed set of field types.
pub fn map(source_type: &str, tag_override: Option<&str>) -> Result<Option<FieldType>, String> {
    if let Some(tag) = tag_override {
        return match FieldType::from_tag(tag) {
            Some(ty) => Ok(Some(ty)),
            None => Err(tag.to_string()),
        };
    }
    Ok(map_source_type(source_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_scalars() {
        assert_eq!(map("bool", None).unwrap(), Some(FieldType::Boolean));
        assert_eq!(map("string", None).unwrap(), Some(FieldType::Text));
        assert_eq!(map("int64", None).unwrap(), Some(FieldType::Long));
        assert_eq!(map("timestamp", None).unwrap(), Some(FieldType::Date));
        assert_eq!(map("map<string,string>", None).unwrap(), Some(FieldType::Object));
    }

    #[test]
    fn strips_collections_recursively() {
        assert_eq!(map("array<string>", None).unwrap(), Some(FieldType::Text));
        assert_eq!(map("set<array<int64>>", None).unwrap(), Some(FieldType::Long));
    }

    #[test]
    fn unknown_source_type_is_none_not_error() {
        assert_eq!(map("some_custom_enum", None).unwrap(), None);
    }

    #[test]
    fn tag_override_takes_precedence() {
        assert_eq!(map("string", Some("keyword")).unwrap(), Some(FieldType::Keyword));
    }

    #[test]
    fn invalid_tag_override_is_an_error() {
        assert!(map("string", Some("not_a_real_type")).is_err());
    }
}
