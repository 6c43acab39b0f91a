//! Declaration processing and annotation lowering.
//!
//! Named types go through the definition store: interfaces get a `DefId`
//! and a lazily-referenced body (which is what lets `interface Node {
//! next?: Node }` terminate), enums get a nominal definition with evaluated
//! members, and aliases are transparent and resolve straight to their body
//! with a circularity guard.

use luma_ast::{EnumMemberDecl, NodeId, NodeKind, ParamAnn, VarDeclKind};
use luma_binder::{SymbolId, symbol_flags};
use luma_common::diagnostics::diagnostic_messages;
use luma_solver::{DefinitionInfo, LiteralValue, ParamInfo, PropertyInfo, TypeId, TypePredicate};
use tracing::trace;

use crate::context::CheckerState;

impl CheckerState<'_> {
    // ---- Declarations ----

    /// Register definitions for every interface and enum declaration, then
    /// lower interface bodies. Bodies reference other named types through
    /// `Lazy`/`Enum` handles, so lowering one body never recurses into
    /// another.
    pub(crate) fn declare_types(&mut self, statements: &[NodeId]) {
        let mut interfaces = Vec::new();
        self.register_definitions(statements, &mut interfaces);
        for symbol in interfaces {
            self.lower_interface_body(symbol);
        }
    }

    fn register_definitions(&mut self, statements: &[NodeId], interfaces: &mut Vec<SymbolId>) {
        for &statement in statements {
            let Some(kind) = self.arena.kind(statement).cloned() else {
                continue;
            };
            match kind {
                NodeKind::InterfaceDecl { name, .. } => {
                    let Some(&symbol) = self.binding.node_symbol.get(&statement) else {
                        continue;
                    };
                    if !self.symbol_defs.contains_key(&symbol) {
                        let def = self.defs.register(DefinitionInfo::interface(name));
                        trace!(def_id = def.0, "declare interface");
                        self.symbol_defs.insert(symbol, def);
                        interfaces.push(symbol);
                    }
                }
                NodeKind::EnumDecl { name, members } => {
                    let Some(&symbol) = self.binding.node_symbol.get(&statement) else {
                        continue;
                    };
                    if !self.symbol_defs.contains_key(&symbol) {
                        let values = self.evaluate_enum_members(&members);
                        let def = self.defs.register(DefinitionInfo::enumeration(name, values));
                        trace!(def_id = def.0, "declare enum");
                        self.symbol_defs.insert(symbol, def);
                    }
                }
                // Aliases resolve on demand through the symbol-type guard.
                NodeKind::TypeAliasDecl { .. } => {}
                NodeKind::Block { statements } => {
                    self.register_definitions(&statements, interfaces);
                }
                NodeKind::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    self.register_definitions(&[then_branch], interfaces);
                    if !else_branch.is_none() {
                        self.register_definitions(&[else_branch], interfaces);
                    }
                }
                NodeKind::While { body, .. }
                | NodeKind::DoWhile { body, .. }
                | NodeKind::For { body, .. } => {
                    self.register_definitions(&[body], interfaces);
                }
                NodeKind::Try {
                    block,
                    catch_block,
                    finally_block,
                    ..
                } => {
                    self.register_definitions(&[block], interfaces);
                    if !catch_block.is_none() {
                        self.register_definitions(&[catch_block], interfaces);
                    }
                    if !finally_block.is_none() {
                        self.register_definitions(&[finally_block], interfaces);
                    }
                }
                NodeKind::FuncDecl { body, .. } => {
                    self.register_definitions(&[body], interfaces);
                }
                _ => {}
            }
        }
    }

    /// Auto-numbering: members without an initializer continue from the
    /// previous numeric value; string members do not advance the counter.
    fn evaluate_enum_members(&self, members: &[EnumMemberDecl]) -> Vec<(luma_common::Atom, LiteralValue)> {
        let mut values = Vec::with_capacity(members.len());
        let mut counter = 0.0f64;
        for member in members {
            let value = match self.arena.kind(member.value) {
                Some(&NodeKind::NumberLit { value }) => {
                    counter = value + 1.0;
                    LiteralValue::number(value)
                }
                Some(&NodeKind::StringLit { value }) => LiteralValue::String(value),
                _ => {
                    let value = LiteralValue::number(counter);
                    counter += 1.0;
                    value
                }
            };
            values.push((member.name, value));
        }
        values
    }

    /// Lower the merged body of an interface symbol. Members from later
    /// merged declarations are appended; the first declaration of a member
    /// name wins.
    fn lower_interface_body(&mut self, symbol: SymbolId) {
        let Some(&def) = self.symbol_defs.get(&symbol) else {
            return;
        };
        let declarations = match self.binding.symbols.get(symbol) {
            Some(info) => info.declarations.to_vec(),
            None => return,
        };
        let mut properties: Vec<PropertyInfo> = Vec::new();
        for declaration in declarations {
            let Some(NodeKind::InterfaceDecl { members, .. }) =
                self.arena.kind(declaration).cloned()
            else {
                continue;
            };
            for member in members {
                if properties.iter().any(|prop| prop.name == member.name) {
                    continue;
                }
                let member_type = self.lower_annotation(member.annotation);
                properties.push(PropertyInfo {
                    name: member.name,
                    type_id: member_type,
                    optional: member.optional,
                    readonly: false,
                });
            }
        }
        let body = self.types.object(properties);
        self.defs.set_body(def, body);
    }

    // ---- Annotation lowering ----

    pub(crate) fn lower_annotation(&mut self, node: NodeId) -> TypeId {
        if node.is_none() {
            return TypeId::ANY;
        }
        let Some(kind) = self.arena.kind(node).cloned() else {
            return TypeId::ERROR;
        };
        match kind {
            NodeKind::TypeName { name } => self.lower_type_name(node, name),
            NodeKind::TypeStringLit { value } => self.types.literal_string_atom(value),
            NodeKind::TypeNumberLit { value } => self.types.literal_number(value),
            NodeKind::TypeBoolLit { value } => self.types.literal_boolean(value),
            NodeKind::TypeUnion { members } => {
                let lowered: Vec<TypeId> = members
                    .iter()
                    .map(|&member| self.lower_annotation(member))
                    .collect();
                // Declared unions keep literals written next to their base.
                self.types.union_preserving_literals(lowered)
            }
            NodeKind::TypeObject { members } => {
                let properties: Vec<PropertyInfo> = members
                    .iter()
                    .map(|member| PropertyInfo {
                        name: member.name,
                        type_id: self.lower_annotation(member.annotation),
                        optional: member.optional,
                        readonly: false,
                    })
                    .collect();
                self.types.object(properties)
            }
            NodeKind::TypeFunc {
                params,
                return_annotation,
            } => {
                let params = self.lower_annotation_params(&params);
                let return_type = if return_annotation.is_none() {
                    TypeId::VOID
                } else {
                    self.lower_annotation(return_annotation)
                };
                self.types.function(params, return_type)
            }
            NodeKind::TypeCtor { params, instance } => {
                let params = self.lower_annotation_params(&params);
                let instance = self.lower_annotation(instance);
                self.types.constructor(params, instance)
            }
            _ => TypeId::ERROR,
        }
    }

    fn lower_type_name(&mut self, node: NodeId, name: luma_common::Atom) -> TypeId {
        if let Some(&symbol) = self.binding.node_symbol.get(&node) {
            return self.lower_named_type(node, symbol);
        }
        let text = self.arena.interner().resolve(name);
        match text.as_ref() {
            "any" => TypeId::ANY,
            "unknown" => TypeId::UNKNOWN,
            "never" => TypeId::NEVER,
            "void" => TypeId::VOID,
            "null" => TypeId::NULL,
            "undefined" => TypeId::UNDEFINED,
            "string" => TypeId::STRING,
            "number" => TypeId::NUMBER,
            "boolean" => TypeId::BOOLEAN,
            _ => {
                self.error_at(node, diagnostic_messages::UNKNOWN_NAME, &[text.as_ref()]);
                TypeId::ERROR
            }
        }
    }

    fn lower_named_type(&mut self, node: NodeId, symbol: SymbolId) -> TypeId {
        let Some(info) = self.binding.symbols.get(symbol) else {
            return TypeId::ERROR;
        };
        let flags = info.flags;
        let name = info.name;
        if flags & symbol_flags::INTERFACE != 0 {
            return match self.symbol_defs.get(&symbol) {
                Some(&def) => self.types.lazy(def),
                None => TypeId::ERROR,
            };
        }
        if flags & symbol_flags::ENUM != 0 {
            return match self.symbol_defs.get(&symbol) {
                Some(&def) => self.types.enum_type(def),
                None => TypeId::ERROR,
            };
        }
        if flags & symbol_flags::TYPE_ALIAS != 0 {
            return self.type_of_symbol(symbol);
        }
        // A value name in type position.
        let text = self.arena.interner().resolve(name);
        self.error_at(node, diagnostic_messages::UNKNOWN_NAME, &[text.as_ref()]);
        TypeId::ERROR
    }

    fn lower_annotation_params(&mut self, params: &[ParamAnn]) -> Vec<ParamInfo> {
        params
            .iter()
            .map(|param| ParamInfo {
                name: param.name,
                type_id: self.lower_annotation(param.annotation),
                optional: param.optional,
                rest: false,
            })
            .collect()
    }

    // ---- Symbol types ----

    /// Declared type of a symbol, resolved lazily and memoized. Re-entry
    /// during resolution is a circular definition: one diagnostic at the
    /// declaration, `error` at every use.
    pub(crate) fn type_of_symbol(&mut self, symbol: SymbolId) -> TypeId {
        if let Some(entry) = self.symbol_types.get(&symbol) {
            return match entry {
                Some(ty) => *ty,
                None => self.report_circular_symbol(symbol),
            };
        }
        if self.is_cancelled() {
            return TypeId::ERROR;
        }
        self.symbol_types.insert(symbol, None);
        let ty = self.compute_symbol_type(symbol);
        if self.is_cancelled() {
            // The computation may have been cut short; drop the in-progress
            // marker instead of caching an unreliable type.
            self.symbol_types.remove(&symbol);
            return ty;
        }
        self.symbol_types.insert(symbol, Some(ty));
        ty
    }

    fn report_circular_symbol(&mut self, symbol: SymbolId) -> TypeId {
        let Some(info) = self.binding.symbols.get(symbol) else {
            return TypeId::ERROR;
        };
        let declaration = info.value_declaration;
        let text = self.arena.interner().resolve(info.name);
        self.error_at(
            declaration,
            diagnostic_messages::CIRCULAR_REFERENCE,
            &[text.as_ref()],
        );
        self.symbol_types.insert(symbol, Some(TypeId::ERROR));
        TypeId::ERROR
    }

    fn compute_symbol_type(&mut self, symbol: SymbolId) -> TypeId {
        let Some(info) = self.binding.symbols.get(symbol) else {
            return TypeId::ERROR;
        };
        let flags = info.flags;
        let name = info.name;
        let declaration = info.value_declaration;

        if flags & symbol_flags::TYPE_ALIAS != 0 {
            if let Some(NodeKind::TypeAliasDecl { annotation, .. }) =
                self.arena.kind(declaration).cloned()
            {
                return self.lower_annotation(annotation);
            }
            return TypeId::ERROR;
        }
        if flags & symbol_flags::INTERFACE != 0 {
            return match self.symbol_defs.get(&symbol) {
                Some(&def) => self.types.lazy(def),
                None => TypeId::ERROR,
            };
        }
        if flags & symbol_flags::ENUM != 0 {
            return self.enum_value_type(symbol);
        }
        if flags & symbol_flags::FUNCTION != 0 {
            return self.function_type(declaration);
        }
        if flags & symbol_flags::PARAMETER != 0 {
            return self.parameter_type(declaration, name);
        }

        // let / const
        let Some(NodeKind::VarDecl {
            decl_kind,
            annotation,
            initializer,
            ..
        }) = self.arena.kind(declaration).cloned()
        else {
            // Catch bindings hang off their try statement and have no
            // annotation; the caught value is untyped.
            if matches!(self.arena.kind(declaration), Some(NodeKind::Try { .. })) {
                return TypeId::ANY;
            }
            return TypeId::ERROR;
        };
        if !annotation.is_none() {
            return self.lower_annotation(annotation);
        }
        if !initializer.is_none() {
            let initializer_type = self.check_expression(initializer);
            let widened = luma_solver::widen_freshness(self.types, initializer_type);
            return match decl_kind {
                VarDeclKind::Const => widened,
                VarDeclKind::Let => luma_solver::widen_literal(self.types, widened),
            };
        }
        TypeId::ANY
    }

    /// The value side of an enum: an object whose properties are the
    /// members, each typed as its nominal member type.
    fn enum_value_type(&mut self, symbol: SymbolId) -> TypeId {
        let Some(&def) = self.symbol_defs.get(&symbol) else {
            return TypeId::ERROR;
        };
        let Some(members) = self.defs.get_enum_members(def) else {
            return TypeId::ERROR;
        };
        let properties: Vec<PropertyInfo> = members
            .into_iter()
            .map(|(name, value)| PropertyInfo {
                name,
                type_id: self.types.enum_member(def, value),
                optional: false,
                readonly: true,
            })
            .collect();
        self.types.object(properties)
    }

    fn function_type(&mut self, declaration: NodeId) -> TypeId {
        let Some(NodeKind::FuncDecl {
            params,
            return_annotation,
            predicate,
            ..
        }) = self.arena.kind(declaration).cloned()
        else {
            return TypeId::ERROR;
        };
        let param_infos: Vec<ParamInfo> = params
            .iter()
            .map(|param| ParamInfo {
                name: param.name,
                type_id: self.lower_annotation(param.annotation),
                optional: param.optional,
                rest: false,
            })
            .collect();
        if let Some(predicate) = predicate {
            let target = self.lower_annotation(predicate.annotation);
            let param_index = params
                .iter()
                .position(|param| param.name == predicate.param)
                .unwrap_or(0) as u32;
            return self.types.function_with_predicate(
                param_infos,
                TypeId::BOOLEAN,
                TypePredicate {
                    param_index,
                    target,
                },
            );
        }
        let return_type = if return_annotation.is_none() {
            TypeId::VOID
        } else {
            self.lower_annotation(return_annotation)
        };
        self.types.function(param_infos, return_type)
    }

    fn parameter_type(&mut self, declaration: NodeId, name: luma_common::Atom) -> TypeId {
        let Some(NodeKind::FuncDecl { params, .. }) = self.arena.kind(declaration).cloned() else {
            return TypeId::ERROR;
        };
        match params.iter().find(|param| param.name == name) {
            Some(param) => {
                let mut ty = self.lower_annotation(param.annotation);
                if param.optional {
                    ty = self.types.union2(ty, TypeId::UNDEFINED);
                }
                ty
            }
            None => TypeId::ERROR,
        }
    }
}
