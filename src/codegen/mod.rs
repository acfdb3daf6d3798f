//! Code generation: resolved descriptors rendered into Rust source text.
//!
//! Every emitter is a pure function of the registry and [`GeneratorConfig`]; only
//! [`run`] touches the filesystem. Units are produced in a fixed order (shared bases,
//! then schemas and patterns by name) so regenerating unchanged descriptors yields
//! byte-identical output.

mod base;
mod entity;
mod example;
mod mutator;
mod pattern;
mod query;
mod storage;
mod view;

use crate::config::{EdgeTarget, GeneratorConfig, Registry, ResolvedSchema};
use crate::error::ConfigError;
use crate::field::{EdgeInfo, Field, FieldKind};
use std::path::PathBuf;

/// One generated source unit, relative to the output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self { path: path.into(), contents }
    }
}

/// Render every unit without writing anything.
pub fn generate(registry: &Registry, config: &GeneratorConfig) -> Result<Vec<GeneratedFile>, ConfigError> {
    let ctx = Ctx { registry, config };
    let mut files = vec![
        GeneratedFile::new("ent_model.rs", base::ent_model(&ctx)),
        GeneratedFile::new("ent_query.rs", base::ent_query(&ctx)),
        GeneratedFile::new("all_models.rs", base::all_models(&ctx)),
    ];
    for schema in registry.schemas() {
        warn_unfillable_fields(&ctx, schema);
        files.push(GeneratedFile::new(
            format!("{}.rs", schema.module_name),
            schema_unit(&ctx, schema)?,
        ));
    }
    for pattern in registry.patterns() {
        files.push(GeneratedFile::new(
            format!("{}.rs", pattern.module_name),
            pattern::unit(&ctx, pattern)?,
        ));
        files.push(GeneratedFile::new(
            format!("{}.rs", crate::case::view_name(&pattern.base_name)),
            view::unit(&ctx, pattern),
        ));
    }
    files.push(GeneratedFile::new("mod.rs", base::mod_rs(&ctx)));
    Ok(files)
}

/// Generate and write all units under `config.output_dir`. Nothing is written when
/// rendering fails.
pub fn run(registry: &Registry, config: &GeneratorConfig) -> Result<Vec<PathBuf>, ConfigError> {
    let files = generate(registry, config)?;
    std::fs::create_dir_all(&config.output_dir).map_err(|source| ConfigError::Write {
        path: config.output_dir.clone(),
        source,
    })?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = config.output_dir.join(&file.path);
        std::fs::write(&path, file.contents.as_bytes())
            .map_err(|source| ConfigError::Write { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "wrote");
        written.push(path);
    }
    tracing::info!(
        output_dir = %config.output_dir.display(),
        schemas = registry.schemas().len(),
        patterns = registry.patterns().len(),
        files = written.len(),
        "generated"
    );
    Ok(written)
}

fn schema_unit(ctx: &Ctx<'_>, schema: &ResolvedSchema) -> Result<String, ConfigError> {
    let mut src = Source::default();
    ctx.header(&mut src, &schema.descriptor_name);
    entity::imports(ctx, &mut src, schema)?;
    storage::schema_model(ctx, &mut src, schema);
    entity::emit(ctx, &mut src, schema)?;
    mutator::schema_mutator(ctx, &mut src, schema);
    query::schema_query(&mut src, schema);
    example::schema_example(ctx, &mut src, schema);
    tracing::info!(schema = %schema.descriptor_name, "rendered schema");
    Ok(src.finish())
}

/// Mandatory fields the example factory cannot fill make every example call fail
/// unless the caller sets them. Reported, not rejected.
fn warn_unfillable_fields(ctx: &Ctx<'_>, schema: &ResolvedSchema) {
    for field in schema.fields.iter().filter(|f| f.is_mandatory()) {
        let fillable = field.example().is_some()
            || field.dynamic_example().is_some()
            || field.edge().map_or(false, |e| synthesizes_edge(ctx.registry, schema, e));
        if !fillable {
            tracing::warn!(
                schema = %schema.descriptor_name,
                field = %field.name,
                "mandatory field has no example or default; examples must set it explicitly"
            );
        }
    }
}

fn synthesizes_edge(registry: &Registry, schema: &ResolvedSchema, edge: &EdgeInfo) -> bool {
    if !edge.generate_example {
        return false;
    }
    match registry.edge_target(&edge.target) {
        Some(EdgeTarget::Schema(target)) => target.base_name != schema.base_name,
        Some(EdgeTarget::Pattern(pattern)) => {
            !schema.implements(&pattern.base_name) && pattern.example_schema.is_some()
        }
        None => false,
    }
}

/// Naming and import context shared by the emitters.
pub(crate) struct Ctx<'a> {
    pub registry: &'a Registry,
    pub config: &'a GeneratorConfig,
}

impl Ctx<'_> {
    pub fn rt(&self) -> &str {
        &self.config.runtime_path
    }

    pub fn session(&self) -> String {
        format!("&{}", self.config.session_type)
    }

    pub fn vc(&self) -> String {
        format!("&Arc<{}>", self.config.vc_name)
    }

    pub fn model_trait(&self) -> &str {
        &self.config.base_model_name
    }

    fn vc_use(&self) -> String {
        let last = self.config.vc_import.rsplit("::").next().unwrap_or_default();
        if last == self.config.vc_name {
            format!("use {};", self.config.vc_import)
        } else {
            format!("use {} as {};", self.config.vc_import, self.config.vc_name)
        }
    }

    pub fn header(&self, src: &mut Source, origin: &str) {
        src.line(format!("// @generated by ent-sdk from {}. Do not edit.", origin));
        src.line("#![allow(dead_code, unused_imports, unused_mut, unused_variables, clippy::clone_on_copy, clippy::too_many_arguments)]");
        src.blank();
    }

    /// Imports common to schema and pattern units.
    pub fn runtime_imports(&self, src: &mut Source) {
        let rt = self.rt();
        src.line("use super::all_models::registry;");
        src.line(format!("use super::ent_model::{{erase_vc, {}}};", self.model_trait()));
        src.line("use super::ent_query::{FromEnt, TypedQuery};");
        src.line(self.vc_use());
        src.line(format!("use {}::chrono::{{DateTime, NaiveTime, Utc}};", rt));
        src.line(format!("use {}::uuid::Uuid;", rt));
        src.line(format!(
            "use {}::{{ColumnRef, CreateAction, DeleteAction, Ent, EntError, EntIdInput, FieldValue, PatternHandle, Record, SchemaHandle, StorageTable, UpdateAction, Vc}};",
            rt
        ));
        src.line("use std::sync::Arc;");
    }

    /// `(module, type)` of an edge's target.
    pub fn edge_target(&self, edge: &EdgeInfo) -> Result<(String, String), ConfigError> {
        match self.registry.edge_target(&edge.target) {
            Some(EdgeTarget::Schema(s)) => Ok((s.module_name.clone(), s.base_name.clone())),
            Some(EdgeTarget::Pattern(p)) => Ok((p.module_name.clone(), p.base_name.clone())),
            None => Err(ConfigError::MissingReference { kind: "edge target", id: edge.target.clone() }),
        }
    }

    /// Rust type of a non-null value of `kind`.
    pub fn value_type(&self, kind: &FieldKind) -> String {
        match kind {
            FieldKind::Bool => "bool".to_string(),
            FieldKind::Int => "i64".to_string(),
            FieldKind::String { .. } | FieldKind::Text => "String".to_string(),
            FieldKind::Datetime => "DateTime<Utc>".to_string(),
            FieldKind::Time => "NaiveTime".to_string(),
            FieldKind::Uuid | FieldKind::Edge(_) => "Uuid".to_string(),
            FieldKind::Enum(info) => info.type_path.to_string(),
            FieldKind::Json { .. } => format!("{}::serde_json::Value", self.rt()),
        }
    }

    /// Type stored in the model: optional when the field is nullable.
    pub fn stored_type(&self, field: &Field) -> String {
        let inner = self.value_type(&field.kind);
        if field.nullable {
            format!("Option<{}>", inner)
        } else {
            inner
        }
    }

    /// Return type and body of a read accessor over `model.<field>`.
    pub fn accessor(&self, field: &Field) -> (String, String) {
        let name = ident(&field.name);
        match (&field.kind, field.nullable) {
            (FieldKind::String { .. } | FieldKind::Text, false) => {
                ("&str".to_string(), format!("&self.model.{}", name))
            }
            (FieldKind::String { .. } | FieldKind::Text, true) => {
                ("Option<&str>".to_string(), format!("self.model.{}.as_deref()", name))
            }
            (FieldKind::Json { .. }, false) => (
                format!("&{}", self.value_type(&field.kind)),
                format!("&self.model.{}", name),
            ),
            (FieldKind::Json { .. }, true) => (
                format!("Option<&{}>", self.value_type(&field.kind)),
                format!("self.model.{}.as_ref()", name),
            ),
            _ => (self.stored_type(field), format!("self.model.{}", name)),
        }
    }
}

/// Indented line buffer.
#[derive(Default)]
pub(crate) struct Source {
    buf: String,
    depth: usize,
}

impl Source {
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str("    ");
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.line("")
    }

    pub fn open(&mut self, head: impl AsRef<str>) -> &mut Self {
        self.line(format!("{} {{", head.as_ref()));
        self.depth += 1;
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.close_with("}")
    }

    pub fn close_with(&mut self, tail: &str) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(tail)
    }

    pub fn doc(&mut self, text: &str) -> &mut Self {
        for l in text.lines() {
            self.line(format!("/// {}", l).trim_end());
        }
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn",
    "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in", "let", "loop",
    "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "static",
    "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use", "virtual",
    "where", "while", "yield",
];

/// Field name as a Rust identifier.
pub(crate) fn ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Raw string literal that can hold `s` verbatim.
pub(crate) fn raw_str(s: &str) -> String {
    let mut hashes = 1;
    while s.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let h = "#".repeat(hashes);
    format!("r{}\"{}\"{}", h, s, h)
}

/// Type tag as a Rust array literal.
pub(crate) fn tag_literal(tag: [u8; 2]) -> String {
    format!("[0x{:02x}, 0x{:02x}]", tag[0], tag[1])
}
