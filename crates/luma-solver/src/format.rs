//! Type formatting for diagnostics.

use luma_common::limits::UNION_MEMBER_DIAGNOSTIC_LIMIT;

use crate::TypeInterner;
use crate::def::{DefId, DefinitionStore};
use crate::types::{IntrinsicKind, LiteralValue, TypeData, TypeId};

/// Depth at which nested structure is elided with `...`.
const MAX_FORMAT_DEPTH: u32 = 4;

/// Renders types for error messages.
///
/// Named definitions print their name instead of their expanded body, which
/// both keeps messages readable and terminates on recursive types.
pub struct TypeFormatter<'a> {
    db: &'a TypeInterner,
    defs: Option<&'a DefinitionStore>,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a TypeInterner) -> Self {
        Self { db, defs: None }
    }

    pub fn with_defs(db: &'a TypeInterner, defs: &'a DefinitionStore) -> Self {
        Self {
            db,
            defs: Some(defs),
        }
    }

    pub fn format(&self, ty: TypeId) -> String {
        self.format_at_depth(ty, 0)
    }

    fn format_at_depth(&self, ty: TypeId, depth: u32) -> String {
        if depth > MAX_FORMAT_DEPTH {
            return "...".to_string();
        }
        let Some(data) = self.db.lookup(ty) else {
            return "unknown".to_string();
        };
        match data {
            TypeData::Intrinsic(kind) => intrinsic_name(kind).to_string(),
            TypeData::Literal(LiteralValue::String(atom)) => {
                format!("\"{}\"", self.db.resolve_atom(atom))
            }
            TypeData::Literal(LiteralValue::Number(value)) => format_number(value.0),
            TypeData::Union(list) => {
                let members = self.db.type_list(list);
                let mut parts: Vec<String> = members
                    .iter()
                    .take(UNION_MEMBER_DIAGNOSTIC_LIMIT)
                    .map(|&member| self.format_at_depth(member, depth + 1))
                    .collect();
                if members.len() > UNION_MEMBER_DIAGNOSTIC_LIMIT {
                    parts.push("...".to_string());
                }
                parts.join(" | ")
            }
            TypeData::Intersection(list) => {
                let members = self.db.type_list(list);
                members
                    .iter()
                    .map(|&member| self.format_at_depth(member, depth + 1))
                    .collect::<Vec<_>>()
                    .join(" & ")
            }
            TypeData::Object(shape_id) => {
                let Some(shape) = self.db.object_shape(shape_id) else {
                    return "{}".to_string();
                };
                if let Some(defs) = self.defs {
                    // Prefer the declared name when this shape is a known
                    // definition body.
                    if let Some(name) = self.find_def_name(ty, defs) {
                        return name;
                    }
                }
                if shape.properties.is_empty() && shape.construct_signatures.is_empty() {
                    return "{}".to_string();
                }
                if shape.properties.is_empty() && !shape.construct_signatures.is_empty() {
                    if let Some(signature) = shape
                        .construct_signatures
                        .first()
                        .and_then(|&sig| self.db.signature(sig))
                    {
                        return format!(
                            "new ({}) => {}",
                            self.format_params(&signature.params, depth),
                            self.format_at_depth(signature.return_type, depth + 1)
                        );
                    }
                }
                let props: Vec<String> = shape
                    .properties
                    .iter()
                    .map(|prop| {
                        format!(
                            "{}{}: {}",
                            self.db.resolve_atom(prop.name),
                            if prop.optional { "?" } else { "" },
                            self.format_at_depth(prop.type_id, depth + 1)
                        )
                    })
                    .collect();
                format!("{{ {} }}", props.join("; "))
            }
            TypeData::Function(signature_id) => {
                let Some(signature) = self.db.signature(signature_id) else {
                    return "Function".to_string();
                };
                format!(
                    "({}) => {}",
                    self.format_params(&signature.params, depth),
                    self.format_at_depth(signature.return_type, depth + 1)
                )
            }
            TypeData::TypeParam(info) => self.db.resolve_atom(info.name).to_string(),
            TypeData::Lazy(def) | TypeData::Enum(def) => self
                .defs
                .and_then(|defs| defs.get_name(def))
                .map(|name| self.db.resolve_atom(name).to_string())
                .unwrap_or_else(|| "...".to_string()),
            TypeData::EnumMember { def, value } => {
                let Some(defs) = self.defs else {
                    return self.format_literal(value);
                };
                let enum_name = defs
                    .get_name(def)
                    .map(|name| self.db.resolve_atom(name).to_string())
                    .unwrap_or_else(|| "...".to_string());
                let member_name = defs.get_enum_members(def).and_then(|members| {
                    members
                        .iter()
                        .find(|(_, member_value)| *member_value == value)
                        .map(|(name, _)| self.db.resolve_atom(*name).to_string())
                });
                match member_name {
                    Some(member) => format!("{enum_name}.{member}"),
                    None => enum_name,
                }
            }
        }
    }

    fn format_params(&self, params: &[crate::types::ParamInfo], depth: u32) -> String {
        params
            .iter()
            .map(|param| {
                format!(
                    "{}{}{}: {}",
                    if param.rest { "..." } else { "" },
                    self.db.resolve_atom(param.name),
                    if param.optional { "?" } else { "" },
                    self.format_at_depth(param.type_id, depth + 1)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_literal(&self, value: LiteralValue) -> String {
        match value {
            LiteralValue::String(atom) => format!("\"{}\"", self.db.resolve_atom(atom)),
            LiteralValue::Number(number) => format_number(number.0),
        }
    }

    fn find_def_name(&self, ty: TypeId, defs: &DefinitionStore) -> Option<String> {
        // Reverse lookup from a body type to its definition is only used for
        // formatting, so a linear scan over registered defs is acceptable.
        (DefId::FIRST_VALID..defs.len() as u32 + DefId::FIRST_VALID)
            .map(DefId)
            .find(|&def| defs.get_body(def) == Some(ty))
            .and_then(|def| defs.get_name(def))
            .map(|name| self.db.resolve_atom(name).to_string())
    }
}

fn intrinsic_name(kind: IntrinsicKind) -> &'static str {
    match kind {
        IntrinsicKind::Any => "any",
        IntrinsicKind::Unknown => "unknown",
        IntrinsicKind::Never => "never",
        IntrinsicKind::Void => "void",
        IntrinsicKind::Null => "null",
        IntrinsicKind::Undefined => "undefined",
        IntrinsicKind::String => "string",
        IntrinsicKind::Number => "number",
        IntrinsicKind::Boolean => "boolean",
        IntrinsicKind::True => "true",
        IntrinsicKind::False => "false",
        IntrinsicKind::Error => "error",
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
