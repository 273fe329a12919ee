use crate::import::destination::BundleSchema;

pub const TEXT_LONG: &str = "text_long";
pub const TEXT_WITH_SUMMARY: &str = "text_with_summary";
pub const IMAGE: &str = "image";

/// Hardcoded last resort for body text.
pub const FALLBACK_BODY_FIELD: &str = "body";

/// Pick a destination field of `required_type`.
///
/// A preferred name wins when the bundle declares it with that type;
/// otherwise the first declared field of that type is used.
pub fn pick_destination_field<'s, S: AsRef<str>>(
    schema: &'s BundleSchema,
    preferred_names: &[S],
    required_type: &str,
) -> Option<&'s str> {
    preferred_names
        .iter()
        .find_map(|name| {
            schema
                .field(name.as_ref())
                .filter(|def| def.field_type == required_type)
        })
        .or_else(|| {
            schema
                .fields
                .iter()
                .find(|def| def.field_type == required_type)
        })
        .map(|def| def.name.as_str())
}

/// Body text field: `text_long`, then `text_with_summary`, then a declared `body`.
pub fn pick_body_field<'s, S: AsRef<str>>(
    schema: &'s BundleSchema,
    preferred_names: &[S],
) -> Option<&'s str> {
    pick_destination_field(schema, preferred_names, TEXT_LONG)
        .or_else(|| pick_destination_field(schema, preferred_names, TEXT_WITH_SUMMARY))
        .or_else(|| {
            schema
                .field(FALLBACK_BODY_FIELD)
                .map(|def| def.name.as_str())
        })
}

pub fn pick_image_field<'s, S: AsRef<str>>(
    schema: &'s BundleSchema,
    preferred_names: &[S],
) -> Option<&'s str> {
    pick_destination_field(schema, preferred_names, IMAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::destination::FieldDefinition;

    fn schema(fields: &[(&str, &str, i64)]) -> BundleSchema {
        BundleSchema {
            bundle: "page".into(),
            fields: fields
                .iter()
                .map(|(name, ty, card)| FieldDefinition {
                    name: name.to_string(),
                    field_type: ty.to_string(),
                    cardinality: *card,
                })
                .collect(),
        }
    }

    #[test]
    fn preferred_name_wins_when_type_matches() {
        let s = schema(&[("field_summary", "text_long", 1), ("field_body", "text_long", 1)]);
        assert_eq!(pick_destination_field(&s, &["field_body"], "text_long"), Some("field_body"));
    }

    #[test]
    fn preferred_name_with_wrong_type_is_ignored() {
        let s = schema(&[("body", "text_with_summary", 1), ("field_text", "text_long", 1)]);
        assert_eq!(pick_destination_field(&s, &["body"], "text_long"), Some("field_text"));
    }

    #[test]
    fn no_field_of_type_yields_none() {
        let s = schema(&[("field_tags", "entity_reference", -1)]);
        assert_eq!(pick_destination_field(&s, &["field_tags"], "image"), None);
        assert_eq!(pick_image_field(&s, &["field_image"]), None);
    }

    #[test]
    fn body_preference_order() {
        let s = schema(&[("body", "text_with_summary", 1)]);
        assert_eq!(pick_body_field(&s, &["body"]), Some("body"));

        let s = schema(&[("body", "string", 1)]);
        assert_eq!(pick_body_field(&s, &["field_x"]), Some("body"));

        let s = schema(&[("field_tags", "entity_reference", -1)]);
        assert_eq!(pick_body_field(&s, &["body"]), None);
    }
}
