//! Enumerations usable as field types. Stored by variant name; in Postgres each
//! enum becomes a named `CREATE TYPE ... AS ENUM`.

pub trait EntEnum: Copy + Send + Sync + 'static {
    /// Rust type name, also the SQL type name after snake-casing.
    const TYPE_NAME: &'static str;
    /// Path generated code uses to reach the type, e.g. `crate::schemas::Status`.
    const TYPE_PATH: &'static str;
    const VARIANTS: &'static [&'static str];

    fn as_str(&self) -> &'static str;
    fn parse(name: &str) -> Option<Self>;
}

/// Declare a fieldless enum implementing [`EntEnum`].
///
/// ```
/// ent_sdk::ent_enum! {
///     pub enum Status in "crate::schemas::Status" { Active, Archived }
/// }
/// assert_eq!(<Status as ent_sdk::EntEnum>::VARIANTS, &["Active", "Archived"]);
/// ```
#[macro_export]
macro_rules! ent_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident in $path:literal { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::EntEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const TYPE_PATH: &'static str = $path;
            const VARIANTS: &'static [&'static str] = &[$(stringify!($variant)),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            fn parse(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl $crate::FromFieldValue for $name {
            fn from_field_value(value: &$crate::FieldValue) -> Option<Self> {
                value.as_str().and_then(<$name as $crate::EntEnum>::parse)
            }
        }

        impl From<$name> for $crate::FieldValue {
            fn from(value: $name) -> Self {
                $crate::FieldValue::from_enum(value)
            }
        }
    };
}
