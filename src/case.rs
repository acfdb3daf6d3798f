//! Identifier conversion between descriptor names and generated/storage names:
//! `EntTestObjectSchema` -> base `EntTestObject` -> module `ent_test_object`, table `test_object`.

/// Convert a single identifier from CamelCase to snake_case.
/// e.g. "EntTestObject" -> "ent_test_object", "EntTestObject5" -> "ent_test_object5"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Strip the descriptor suffix ("Schema" / "Pattern"). Returns None when the name does not carry it.
pub fn base_name<'a>(descriptor_name: &'a str, suffix: &str) -> Option<&'a str> {
    descriptor_name
        .strip_suffix(suffix)
        .filter(|base| base.starts_with("Ent") && base.len() > 3)
}

/// Storage table name: drop the "Ent" prefix, then snake_case.
pub fn table_name(base_name: &str) -> String {
    let trimmed = base_name.strip_prefix("Ent").unwrap_or(base_name);
    to_snake_case(trimmed)
}

/// Relational view name for a pattern.
pub fn view_name(base_name: &str) -> String {
    format!("{}_view", to_snake_case(base_name))
}

/// Generated module (file stem) for a descriptor.
pub fn module_name(base_name: &str) -> String {
    to_snake_case(base_name)
}
