//! Expression checking.

use luma_ast::{BinaryOp, NodeId, NodeKind, UnaryOp};
use luma_binder::symbol_flags;
use luma_common::Atom;
use luma_common::diagnostics::diagnostic_messages;
use luma_solver::{PropertyInfo, TypeData, TypeId};

use crate::context::{CheckerState, is_assignable, resolve_structural, with_narrower};

/// Symbols whose reads are flow-narrowed.
const NARROWABLE: u32 = symbol_flags::VARIABLE | symbol_flags::CONST | symbol_flags::PARAMETER;

impl CheckerState<'_> {
    pub(crate) fn check_expression(&mut self, node: NodeId) -> TypeId {
        if let Some(&ty) = self.node_types.get(&node) {
            return ty;
        }
        let ty = self.compute_expression_type(node);
        if !self.is_cancelled() {
            self.node_types.insert(node, ty);
        }
        ty
    }

    fn compute_expression_type(&mut self, node: NodeId) -> TypeId {
        let Some(kind) = self.arena.kind(node).cloned() else {
            return TypeId::ERROR;
        };
        match kind {
            NodeKind::Ident { .. } => self.check_identifier(node),
            NodeKind::NumberLit { value } => self.types.literal_number(value),
            NodeKind::StringLit { value } => self.types.literal_string_atom(value),
            NodeKind::BoolLit { value } => self.types.literal_boolean(value),
            NodeKind::NullLit => TypeId::NULL,
            NodeKind::UndefinedLit => TypeId::UNDEFINED,
            NodeKind::ObjectLit { properties } => {
                let mut props: Vec<PropertyInfo> = Vec::with_capacity(properties.len());
                for property in &properties {
                    let value_type = self.check_expression(property.value);
                    if !props.iter().any(|existing| existing.name == property.name) {
                        props.push(PropertyInfo::required(property.name, value_type));
                    }
                }
                self.types.fresh_object(props)
            }
            NodeKind::Member {
                object,
                property,
                optional,
            } => {
                let object_type = self.check_expression(object);
                self.check_property_access(node, object_type, property, optional)
            }
            NodeKind::Call { callee, arguments } => self.check_call(node, callee, &arguments),
            NodeKind::Unary { op, operand } => {
                self.check_expression(operand);
                match op {
                    UnaryOp::Not => TypeId::BOOLEAN,
                    UnaryOp::TypeOf => TypeId::STRING,
                    UnaryOp::Neg => TypeId::NUMBER,
                }
            }
            NodeKind::Binary { op, left, right } => {
                let left_type = self.check_expression(left);
                let right_type = self.check_expression(right);
                match op {
                    BinaryOp::Add => {
                        if is_assignable(self, left_type, TypeId::STRING)
                            || is_assignable(self, right_type, TypeId::STRING)
                        {
                            TypeId::STRING
                        } else {
                            TypeId::NUMBER
                        }
                    }
                    BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => TypeId::NUMBER,
                    _ => TypeId::BOOLEAN,
                }
            }
            NodeKind::Logical { op, left, right } => {
                let left_type = self.check_expression(left);
                let right_type = self.check_expression(right);
                match op {
                    luma_ast::LogicalOp::Coalesce => {
                        let non_nullish = with_narrower(self, |n| n.non_nullish(left_type));
                        self.types.union2(non_nullish, right_type)
                    }
                    _ => self.types.union2(left_type, right_type),
                }
            }
            NodeKind::Assign { target, value } => self.check_assignment(target, value),
            NodeKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.check_expression(condition);
                let true_type = self.check_expression(when_true);
                let false_type = self.check_expression(when_false);
                self.types.union2(true_type, false_type)
            }
            NodeKind::Paren { expr } => self.check_expression(expr),
            _ => TypeId::ERROR,
        }
    }

    fn check_identifier(&mut self, node: NodeId) -> TypeId {
        let Some(&symbol) = self.binding.node_symbol.get(&node) else {
            // Unknown name; the binder already reported it.
            return TypeId::ERROR;
        };
        let declared = self.type_of_symbol(symbol);
        let narrowable = self
            .binding
            .symbols
            .get(symbol)
            .is_some_and(|info| info.has_any_flags(NARROWABLE));
        if !narrowable {
            return declared;
        }
        let Some(&flow) = self.binding.node_flow.get(&node) else {
            return declared;
        };
        self.flow_type(flow, symbol, declared)
    }

    fn check_assignment(&mut self, target: NodeId, value: NodeId) -> TypeId {
        let value_type = self.check_expression(value);
        match self.arena.kind(target).cloned() {
            Some(NodeKind::Ident { .. }) => {
                if let Some(&symbol) = self.binding.node_symbol.get(&target) {
                    let declared = self.type_of_symbol(symbol);
                    self.report_assignability(value, value_type, declared);
                }
            }
            Some(NodeKind::Member {
                object, property, ..
            }) => {
                let object_type = self.check_expression(object);
                if let Some(property_type) = self.property_type(object_type, property) {
                    self.report_assignability(value, value_type, property_type);
                }
            }
            _ => {}
        }
        value_type
    }

    // ---- Property access ----

    fn check_property_access(
        &mut self,
        node: NodeId,
        object_type: TypeId,
        name: Atom,
        optional: bool,
    ) -> TypeId {
        if object_type == TypeId::ANY || object_type == TypeId::ERROR {
            return object_type;
        }
        let has_nullish = self
            .types
            .constituents(object_type)
            .iter()
            .any(|&member| is_nullish_type(member));
        let lookup_type = if has_nullish {
            if !optional {
                let rendered = self.format_type(object_type);
                self.error_at(node, diagnostic_messages::POSSIBLY_NULLISH, &[&rendered]);
            }
            with_narrower(self, |n| n.non_nullish(object_type))
        } else {
            object_type
        };

        let result = match self.property_type(lookup_type, name) {
            Some(property_type) => property_type,
            None => {
                let property = self.arena.interner().resolve(name);
                let rendered = self.format_type(object_type);
                self.error_at(
                    node,
                    diagnostic_messages::UNKNOWN_PROPERTY,
                    &[property.as_ref(), &rendered],
                );
                TypeId::ERROR
            }
        };
        if optional && has_nullish {
            self.types.union2(result, TypeId::UNDEFINED)
        } else {
            result
        }
    }

    /// Type of `object_type.name`, distributing over unions. `None` when
    /// any constituent lacks the property.
    pub(crate) fn property_type(&mut self, object_type: TypeId, name: Atom) -> Option<TypeId> {
        let members = self.types.constituents(object_type);
        let mut results = Vec::with_capacity(members.len());
        for member in members {
            let resolved = resolve_structural(self, member);
            if resolved == TypeId::ANY || resolved == TypeId::ERROR {
                results.push(resolved);
                continue;
            }
            let shape = self.types.shape_of(resolved)?;
            match shape.property(name) {
                Some(prop) => {
                    let prop_type = if prop.optional {
                        self.types.union2(prop.type_id, TypeId::UNDEFINED)
                    } else {
                        prop.type_id
                    };
                    results.push(prop_type);
                }
                None => results.push(shape.string_index?),
            }
        }
        Some(self.types.union_preserving_literals(results))
    }

    // ---- Calls ----

    fn check_call(&mut self, node: NodeId, callee: NodeId, arguments: &[NodeId]) -> TypeId {
        let callee_type = self.check_expression(callee);
        // `a?.f(x)` short-circuits: the undefined from a skipped chain
        // flows into the call result, not into the callable check.
        let optional_chain = matches!(
            self.arena.kind(callee),
            Some(&NodeKind::Member { optional: true, .. })
        );
        let (lookup_type, short_circuits) = if optional_chain {
            let stripped = with_narrower(self, |n| n.non_nullish(callee_type));
            (stripped, stripped != callee_type)
        } else {
            (callee_type, false)
        };
        let argument_types: Vec<TypeId> = arguments
            .iter()
            .map(|&argument| self.check_expression(argument))
            .collect();

        let resolved = resolve_structural(self, lookup_type);
        if resolved == TypeId::ANY || resolved == TypeId::ERROR {
            return resolved;
        }
        let signature = match self.types.lookup(resolved) {
            Some(TypeData::Function(signature)) => self.types.signature(signature),
            Some(TypeData::Object(shape_id)) => self
                .types
                .object_shape(shape_id)
                .and_then(|shape| shape.call_signatures.first().copied())
                .and_then(|signature| self.types.signature(signature)),
            _ => None,
        };
        let Some(signature) = signature else {
            let rendered = self.format_type(callee_type);
            self.error_at(node, diagnostic_messages::NOT_CALLABLE, &[&rendered]);
            return TypeId::ERROR;
        };

        let min = signature.min_argument_count();
        let max = signature.params.len();
        if argument_types.len() < min || (argument_types.len() > max && !signature.has_rest()) {
            let expected = if argument_types.len() < min { min } else { max };
            self.error_at(
                node,
                diagnostic_messages::ARGUMENT_COUNT_MISMATCH,
                &[&expected.to_string(), &argument_types.len().to_string()],
            );
        }
        for (index, &argument_type) in argument_types.iter().enumerate() {
            let param = signature
                .params
                .get(index)
                .or_else(|| signature.params.last().filter(|param| param.rest));
            if let Some(param) = param {
                let target = param.type_id;
                self.report_assignability(arguments[index], argument_type, target);
            }
        }
        if short_circuits {
            self.types.union2(signature.return_type, TypeId::UNDEFINED)
        } else {
            signature.return_type
        }
    }
}

pub(crate) fn is_nullish_type(ty: TypeId) -> bool {
    matches!(ty, TypeId::NULL | TypeId::UNDEFINED | TypeId::VOID)
}
