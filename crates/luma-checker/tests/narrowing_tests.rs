//! Flow narrowing: typeof, truthiness, nullish and literal equality,
//! discriminants, instanceof, user-defined guards, assignments, and loops.

use luma_ast::{
    BinaryOp, LogicalOp, NodeArena, NodeId, ParamAnn, PredicateAnn, UnaryOp, VarDeclKind,
};
use luma_checker::Program;
use luma_solver::TypeId;

struct Harness {
    program: Program,
    arena: NodeArena,
}

impl Harness {
    fn new() -> Self {
        let program = Program::new();
        let arena = program.new_arena();
        Self { program, arena }
    }

    fn finish(mut self, statements: Vec<NodeId>) -> Program {
        self.program.add_file("main.luma", self.arena, statements);
        self.program.check();
        self.program
    }
}

/// `function f(x: <annotation>) { <body statements> }`
fn function_over(
    arena: &mut NodeArena,
    annotation: NodeId,
    body_statements: Vec<NodeId>,
) -> NodeId {
    let body = arena.add_block(body_statements);
    let param = arena.param("x", annotation);
    let void_ann = arena.add_type_name("void");
    arena.add_func_decl("f", vec![param], void_ann, None, body)
}

#[test]
fn test_typeof_narrows_both_branches() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let number_ann = arena.add_type_name("number");
    let union_ann = arena.add_type_union(vec![string_ann, number_ann]);

    let operand = arena.add_ident("x");
    let type_of = arena.add_unary(UnaryOp::TypeOf, operand);
    let tag = arena.add_string("string");
    let condition = arena.add_binary(BinaryOp::StrictEq, type_of, tag);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);

    let func = function_over(arena, union_ann, vec![branch]);
    let program = h.finish(vec![func]);
    assert_eq!(program.type_at(0, then_read), Some(TypeId::STRING));
    assert_eq!(program.type_at(0, else_read), Some(TypeId::NUMBER));
}

#[test]
fn test_truthiness_drops_null_in_the_true_branch() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let null_ann = arena.add_type_name("null");
    let union_ann = arena.add_type_union(vec![string_ann, null_ann]);

    let condition = arena.add_ident("x");
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);

    let func = function_over(arena, union_ann, vec![branch]);
    let program = h.finish(vec![func]);
    assert_eq!(program.type_at(0, then_read), Some(TypeId::STRING));
    // "" is falsy, so string survives the false branch too.
    let declared = program.types().union2(TypeId::STRING, TypeId::NULL);
    assert_eq!(program.type_at(0, else_read), Some(declared));
}

#[test]
fn test_loose_null_check_covers_undefined() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let null_ann = arena.add_type_name("null");
    let undefined_ann = arena.add_type_name("undefined");
    let union_ann = arena.add_type_union(vec![string_ann, null_ann, undefined_ann]);

    let left = arena.add_ident("x");
    let null_lit = arena.add_null();
    let condition = arena.add_binary(BinaryOp::Eq, left, null_lit);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);

    let func = function_over(arena, union_ann, vec![branch]);
    let program = h.finish(vec![func]);
    let nullish = program.types().union2(TypeId::NULL, TypeId::UNDEFINED);
    assert_eq!(program.type_at(0, then_read), Some(nullish));
    assert_eq!(program.type_at(0, else_read), Some(TypeId::STRING));
}

#[test]
fn test_strict_null_check_leaves_undefined_alone() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let null_ann = arena.add_type_name("null");
    let undefined_ann = arena.add_type_name("undefined");
    let union_ann = arena.add_type_union(vec![string_ann, null_ann, undefined_ann]);

    let left = arena.add_ident("x");
    let null_lit = arena.add_null();
    let condition = arena.add_binary(BinaryOp::StrictEq, left, null_lit);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);

    let func = function_over(arena, union_ann, vec![branch]);
    let program = h.finish(vec![func]);
    assert_eq!(program.type_at(0, then_read), Some(TypeId::NULL));
    let remaining = program.types().union2(TypeId::STRING, TypeId::UNDEFINED);
    assert_eq!(program.type_at(0, else_read), Some(remaining));
}

#[test]
fn test_literal_equality_narrows_a_literal_union() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let a_ann = arena.add_type_string_lit("a");
    let b_ann = arena.add_type_string_lit("b");
    let union_ann = arena.add_type_union(vec![a_ann, b_ann]);

    let left = arena.add_ident("x");
    let a_lit = arena.add_string("a");
    let condition = arena.add_binary(BinaryOp::StrictEq, left, a_lit);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);

    let func = function_over(arena, union_ann, vec![branch]);
    let program = h.finish(vec![func]);
    let types = program.types();
    assert_eq!(program.type_at(0, then_read), Some(types.literal_string("a")));
    assert_eq!(program.type_at(0, else_read), Some(types.literal_string("b")));
}

#[test]
fn test_discriminated_union_narrows_to_the_matching_variant() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let circle_tag = arena.add_type_string_lit("circle");
    let number_ann = arena.add_type_name("number");
    let circle_kind = arena.member_ann("kind", circle_tag);
    let radius = arena.member_ann("radius", number_ann);
    let circle = arena.add_interface_decl("Circle", vec![circle_kind, radius]);
    let square_tag = arena.add_type_string_lit("square");
    let square_kind = arena.member_ann("kind", square_tag);
    let side = arena.member_ann("side", number_ann);
    let square = arena.add_interface_decl("Square", vec![square_kind, side]);
    let circle_ref = arena.add_type_name("Circle");
    let square_ref = arena.add_type_name("Square");
    let shape_body = arena.add_type_union(vec![circle_ref, square_ref]);
    let shape = arena.add_type_alias_decl("Shape", shape_body);

    let object = arena.add_ident("s");
    let kind_access = arena.add_member(object, "kind");
    let tag = arena.add_string("circle");
    let condition = arena.add_binary(BinaryOp::StrictEq, kind_access, tag);
    let then_object = arena.add_ident("s");
    let radius_access = arena.add_member(then_object, "radius");
    let then_ret = arena.add_return(radius_access);
    let then_block = arena.add_block(vec![then_ret]);
    let else_object = arena.add_ident("s");
    let side_access = arena.add_member(else_object, "side");
    let else_ret = arena.add_return(side_access);
    let else_block = arena.add_block(vec![else_ret]);
    let branch = arena.add_if(condition, then_block, else_block);
    let body = arena.add_block(vec![branch]);
    let shape_ann = arena.add_type_name("Shape");
    let param = arena.param("s", shape_ann);
    let func = arena.add_func_decl("area", vec![param], number_ann, None, body);

    let program = h.finish(vec![circle, square, shape, func]);
    assert_eq!(program.diagnostic_count(), 0);
    let narrowed = program.type_at(0, then_object).map(|ty| program.format_type(ty));
    assert_eq!(narrowed.as_deref(), Some("Circle"));
    assert_eq!(program.type_at(0, radius_access), Some(TypeId::NUMBER));
    let narrowed = program.type_at(0, else_object).map(|ty| program.format_type(ty));
    assert_eq!(narrowed.as_deref(), Some("Square"));
}

#[test]
fn test_instanceof_narrows_to_the_construct_signature_instance() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let name = arena.member_ann("name", string_ann);
    let animal = arena.add_interface_decl("Animal", vec![name]);
    let animal_ref = arena.add_type_name("Animal");
    let null_ann = arena.add_type_name("null");
    let union_ann = arena.add_type_union(vec![animal_ref, null_ann]);
    let instance_ref = arena.add_type_name("Animal");
    let ctor_ann = arena.add_type_ctor(vec![], instance_ref);

    let left = arena.add_ident("x");
    let right = arena.add_ident("make");
    let condition = arena.add_binary(BinaryOp::InstanceOf, left, right);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);

    let body = arena.add_block(vec![branch]);
    let value_param = arena.param("x", union_ann);
    let ctor_param = arena.param("make", ctor_ann);
    let void_ann = arena.add_type_name("void");
    let func = arena.add_func_decl("f", vec![value_param, ctor_param], void_ann, None, body);

    let program = h.finish(vec![animal, func]);
    let narrowed = program.type_at(0, then_read).map(|ty| program.format_type(ty));
    assert_eq!(narrowed.as_deref(), Some("Animal"));
    assert_eq!(program.type_at(0, else_read), Some(TypeId::NULL));
}

#[test]
fn test_user_defined_guard_narrows_its_argument() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let number_ann = arena.add_type_name("number");
    let union_ann = arena.add_type_union(vec![string_ann, number_ann]);

    let truth = arena.add_bool(true);
    let guard_ret = arena.add_return(truth);
    let guard_body = arena.add_block(vec![guard_ret]);
    let guard_param = arena.param("value", union_ann);
    let predicate = PredicateAnn {
        param: arena.atom("value"),
        annotation: string_ann,
    };
    let guard = arena.add_func_decl(
        "isText",
        vec![guard_param],
        NodeId::NONE,
        Some(predicate),
        guard_body,
    );

    let callee = arena.add_ident("isText");
    let argument = arena.add_ident("x");
    let condition = arena.add_call(callee, vec![argument]);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);
    let func = function_over(arena, union_ann, vec![branch]);

    let program = h.finish(vec![guard, func]);
    assert_eq!(program.diagnostic_count(), 0);
    assert_eq!(program.type_at(0, then_read), Some(TypeId::STRING));
    assert_eq!(program.type_at(0, else_read), Some(TypeId::NUMBER));
}

#[test]
fn test_assignment_replaces_the_narrowed_type() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let number_ann = arena.add_type_name("number");
    let union_ann = arena.add_type_union(vec![string_ann, number_ann]);
    let init = arena.add_string("a");
    let decl = arena.add_var_decl("x", VarDeclKind::Let, union_ann, init);
    let first_read = arena.add_ident("x");
    let first_stmt = arena.add_expr_stmt(first_read);
    let target = arena.add_ident("x");
    let one = arena.add_number(1.0);
    let assign = arena.add_assign(target, one);
    let assign_stmt = arena.add_expr_stmt(assign);
    let second_read = arena.add_ident("x");
    let second_stmt = arena.add_expr_stmt(second_read);

    let program = h.finish(vec![decl, first_stmt, assign_stmt, second_stmt]);
    assert_eq!(program.diagnostic_count(), 0);
    assert_eq!(program.type_at(0, first_read), Some(TypeId::STRING));
    assert_eq!(program.type_at(0, second_read), Some(TypeId::NUMBER));
}

#[test]
fn test_loop_back_edges_union_into_the_loop_head() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let number_ann = arena.add_type_name("number");
    let union_ann = arena.add_type_union(vec![string_ann, number_ann]);
    let init = arena.add_string("a");
    let decl = arena.add_var_decl("x", VarDeclKind::Let, union_ann, init);

    let inner_read = arena.add_ident("x");
    let inner_stmt = arena.add_expr_stmt(inner_read);
    let target = arena.add_ident("x");
    let one = arena.add_number(1.0);
    let assign = arena.add_assign(target, one);
    let assign_stmt = arena.add_expr_stmt(assign);
    let body = arena.add_block(vec![inner_stmt, assign_stmt]);
    let condition = arena.add_bool(true);
    let while_loop = arena.add_while(condition, body);

    let after_read = arena.add_ident("x");
    let after_stmt = arena.add_expr_stmt(after_read);

    let program = h.finish(vec![decl, while_loop, after_stmt]);
    assert_eq!(program.diagnostic_count(), 0);
    let both = program.types().union2(TypeId::STRING, TypeId::NUMBER);
    assert_eq!(program.type_at(0, inner_read), Some(both));
    assert_eq!(program.type_at(0, after_read), Some(both));
}

#[test]
fn test_logical_and_composes_guards() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let null_ann = arena.add_type_name("null");
    let union_ann = arena.add_type_union(vec![string_ann, null_ann]);

    let operand = arena.add_ident("x");
    let type_of = arena.add_unary(UnaryOp::TypeOf, operand);
    let tag = arena.add_string("string");
    let left = arena.add_binary(BinaryOp::StrictEq, type_of, tag);
    let right = arena.add_ident("x");
    let condition = arena.add_logical(LogicalOp::And, left, right);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let branch = arena.add_if(condition, then_block, NodeId::NONE);

    let func = function_over(arena, union_ann, vec![branch]);
    let program = h.finish(vec![func]);
    assert_eq!(program.type_at(0, then_read), Some(TypeId::STRING));
}

#[test]
fn test_logical_or_narrows_the_else_branch() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let number_ann = arena.add_type_name("number");
    let null_ann = arena.add_type_name("null");
    let union_ann = arena.add_type_union(vec![string_ann, number_ann, null_ann]);

    let left_ident = arena.add_ident("x");
    let null_lit = arena.add_null();
    let left = arena.add_binary(BinaryOp::StrictEq, left_ident, null_lit);
    let operand = arena.add_ident("x");
    let type_of = arena.add_unary(UnaryOp::TypeOf, operand);
    let tag = arena.add_string("number");
    let right = arena.add_binary(BinaryOp::StrictEq, type_of, tag);
    let condition = arena.add_logical(LogicalOp::Or, left, right);
    let then_block = arena.add_block(vec![]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);

    let func = function_over(arena, union_ann, vec![branch]);
    let program = h.finish(vec![func]);
    assert_eq!(program.type_at(0, else_read), Some(TypeId::STRING));
}

#[test]
fn test_coalesce_narrows_its_right_operand_to_nullish() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let null_ann = arena.add_type_name("null");
    let union_ann = arena.add_type_union(vec![string_ann, null_ann]);

    let left = arena.add_ident("x");
    let right = arena.add_ident("x");
    let coalesce = arena.add_logical(LogicalOp::Coalesce, left, right);
    let stmt = arena.add_expr_stmt(coalesce);

    let func = function_over(arena, union_ann, vec![stmt]);
    let program = h.finish(vec![func]);
    assert_eq!(program.diagnostic_count(), 0);
    // The right operand only evaluates when the left was nullish.
    assert_eq!(program.type_at(0, right), Some(TypeId::NULL));
}

#[test]
fn test_optional_call_narrows_the_receiver_in_arguments() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let void_ann = arena.add_type_name("void");
    let counter_ref = arena.add_type_name("Counter");
    let log_param = ParamAnn {
        name: arena.atom("value"),
        annotation: counter_ref,
        optional: false,
    };
    let log_ann = arena.add_type_func(vec![log_param], void_ann);
    let log_member = arena.member_ann("log", log_ann);
    let counter = arena.add_interface_decl("Counter", vec![log_member]);

    let counter_ann = arena.add_type_name("Counter");
    let null_ann = arena.add_type_name("null");
    let union_ann = arena.add_type_union(vec![counter_ann, null_ann]);
    let object = arena.add_ident("x");
    let callee = arena.add_optional_member(object, "log");
    let argument = arena.add_ident("x");
    let call = arena.add_call(callee, vec![argument]);
    let stmt = arena.add_expr_stmt(call);

    // `x?.log(x)` only calls when x is non-nullish, so the argument
    // satisfies the Counter parameter without a check.
    let func = function_over(arena, union_ann, vec![stmt]);
    let program = h.finish(vec![counter, func]);
    assert_eq!(program.diagnostic_count(), 0);
    let narrowed = program.type_at(0, argument).map(|ty| program.format_type(ty));
    assert_eq!(narrowed.as_deref(), Some("Counter"));
}

#[test]
fn test_negated_guard_flips_the_branches() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let number_ann = arena.add_type_name("number");
    let union_ann = arena.add_type_union(vec![string_ann, number_ann]);

    let operand = arena.add_ident("x");
    let type_of = arena.add_unary(UnaryOp::TypeOf, operand);
    let tag = arena.add_string("string");
    let equality = arena.add_binary(BinaryOp::StrictEq, type_of, tag);
    let condition = arena.add_unary(UnaryOp::Not, equality);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);

    let func = function_over(arena, union_ann, vec![branch]);
    let program = h.finish(vec![func]);
    assert_eq!(program.type_at(0, then_read), Some(TypeId::NUMBER));
    assert_eq!(program.type_at(0, else_read), Some(TypeId::STRING));
}

#[test]
fn test_narrowed_types_stay_assignable_to_the_declared_type() {
    let mut h = Harness::new();
    let arena = &mut h.arena;
    let string_ann = arena.add_type_name("string");
    let number_ann = arena.add_type_name("number");
    let null_ann = arena.add_type_name("null");
    let union_ann = arena.add_type_union(vec![string_ann, number_ann, null_ann]);

    // if (typeof x === "number") { x = 1; x; } else { x; } x;
    let operand = arena.add_ident("x");
    let type_of = arena.add_unary(UnaryOp::TypeOf, operand);
    let tag = arena.add_string("number");
    let condition = arena.add_binary(BinaryOp::StrictEq, type_of, tag);
    let target = arena.add_ident("x");
    let one = arena.add_number(1.0);
    let assign = arena.add_assign(target, one);
    let assign_stmt = arena.add_expr_stmt(assign);
    let then_read = arena.add_ident("x");
    let then_stmt = arena.add_expr_stmt(then_read);
    let then_block = arena.add_block(vec![assign_stmt, then_stmt]);
    let else_read = arena.add_ident("x");
    let else_stmt = arena.add_expr_stmt(else_read);
    let else_block = arena.add_block(vec![else_stmt]);
    let branch = arena.add_if(condition, then_block, else_block);
    let after_read = arena.add_ident("x");
    let after_stmt = arena.add_expr_stmt(after_read);

    let func = function_over(arena, union_ann, vec![branch, after_stmt]);
    let program = h.finish(vec![func]);
    let declared = program
        .types()
        .union(vec![TypeId::STRING, TypeId::NUMBER, TypeId::NULL]);
    // Guards, assignments, and the branch join all produce types within the
    // declared union, never outside it.
    for read in [then_read, else_read, after_read] {
        let narrowed = program.type_at(0, read).unwrap();
        assert!(program.is_assignable(narrowed, declared));
    }
    assert_eq!(program.type_at(0, then_read), Some(TypeId::NUMBER));
    assert_eq!(
        program.type_at(0, else_read),
        Some(program.types().union2(TypeId::STRING, TypeId::NULL))
    );
}
