use crate::field::Field;

/// Deterministic field order for argument and column lists.
///
/// Fields are classified by default first, then nullability, and emitted as
/// mandatory (non-nullable, no default), then defaulted, then nullable; each group
/// sorted by name.
pub fn sort_fields(fields: Vec<Field>) -> Vec<Field> {
    let mut mandatory = Vec::new();
    let mut defaulted = Vec::new();
    let mut nullable = Vec::new();
    for field in fields {
        if field.has_default() {
            defaulted.push(field);
        } else if field.nullable {
            nullable.push(field);
        } else {
            mandatory.push(field);
        }
    }
    for group in [&mut mandatory, &mut defaulted, &mut nullable] {
        group.sort_by(|a, b| a.name.cmp(&b.name));
    }
    mandatory.into_iter().chain(defaulted).chain(nullable).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{BoolField, StringField, WithDefault};
    use proptest::prelude::*;

    fn rank(field: &Field) -> u8 {
        if field.has_default() {
            1
        } else if field.nullable {
            2
        } else {
            0
        }
    }

    fn build(name: String, nullable: bool, defaulted: bool) -> Field {
        let mut builder = StringField::new(&name, 50);
        if !nullable {
            builder = builder.not_null();
        }
        if defaulted {
            builder = builder.default("x");
        }
        builder.into()
    }

    #[test]
    fn defaulted_non_nullable_sorts_with_defaults() {
        let fields = vec![
            StringField::new("z_nullable", 10).into(),
            BoolField::new("b_default").not_null().default(false).into(),
            StringField::new("a_required", 10).not_null().into(),
            StringField::new("a_nullable", 10).into(),
        ];
        let names: Vec<_> = sort_fields(fields).into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["a_required", "b_default", "a_nullable", "z_nullable"]);
    }

    proptest! {
        #[test]
        fn groups_are_ordered_and_alphabetical(
            specs in prop::collection::btree_map("[a-z]{1,8}", (any::<bool>(), any::<bool>()), 0..24)
        ) {
            let fields: Vec<Field> = specs
                .into_iter()
                .map(|(name, (nullable, defaulted))| build(name, nullable, defaulted))
                .collect();
            let count = fields.len();
            let sorted = sort_fields(fields);
            prop_assert_eq!(sorted.len(), count);
            for pair in sorted.windows(2) {
                let (a, b) = (rank(&pair[0]), rank(&pair[1]));
                prop_assert!(a < b || (a == b && pair[0].name < pair[1].name));
            }
        }
    }
}
