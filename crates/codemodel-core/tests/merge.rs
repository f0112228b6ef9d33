mod support;

use codemodel_core::{
    Category, Expression, GenericType, Inherit, KeepBodies, Model, ModelConfig, NodeRef,
    Operation, RawDecl, RawField, Statement, Strategy, Type,
};
use expect_test::expect;
use salsa::DatabaseImpl;
use support::{MapSource, field, field_names, method, raw_field, text, with_body};

fn primitive<'db>(model: &Model<'db>, name: &str) -> GenericType<'db> {
    GenericType::Type(model.builtin(name).unwrap())
}

fn add_field<'db>(model: &mut Model<'db>, owner: Type<'db>, name: &str, ty: &str) {
    let ty = primitive(model, ty);
    let field = model.new_field(name, ty).unwrap();
    model.add_field(owner, field).unwrap();
}

fn add_method<'db>(
    model: &mut Model<'db>,
    owner: Type<'db>,
    name: &str,
    statement: Option<&str>,
) -> Operation<'db> {
    let void = GenericType::Type(model.void_type());
    let method = model.new_method(name, void).unwrap();
    model.add_operation(owner, method).unwrap();
    if let Some(statement) = statement {
        model.add_statement(method, Statement::new(statement)).unwrap();
    }
    method
}

fn body<'db>(model: &Model<'db>, operation: Operation<'db>) -> Vec<String> {
    let Some(body) = model[operation].body() else {
        return Vec::new();
    };
    body.statements().iter().map(|statement| statement.text().to_owned()).collect()
}

fn method_names<'db>(model: &mut Model<'db>, owner: Type<'db>) -> Vec<String> {
    let methods = model.methods(owner).to_vec();
    let model = &*model;
    methods.into_iter().map(|method| text(model, model[method].name()).to_owned()).collect()
}

fn field_type<'db>(model: &mut Model<'db>, owner: Type<'db>, name: &str) -> String {
    let field = model.field_named(owner, name).unwrap();
    model.display(model[field].ty())
}

#[test]
fn override_replaces_every_member() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let string = model.declare_type("java.lang.String", Category::Class).unwrap();
    let target = model.declare_type("a.Target", Category::Class).unwrap();
    add_field(&mut model, target, "fieldA", "int");

    let other = model.new_type("Target", Category::Class).unwrap();
    let field_b = model.new_field("fieldB", GenericType::Type(string)).unwrap();
    model.add_field(other, field_b).unwrap();

    let merged =
        model.merge(NodeRef::Type(target), NodeRef::Type(other), &Inherit, Strategy::Override);
    assert_eq!(merged.unwrap(), NodeRef::Type(target));

    assert_eq!(field_names(&mut model, target), ["fieldB"]);
    assert_eq!(field_type(&mut model, target, "fieldB"), "java.lang.String");
    let copied = model.field_named(target, "fieldB").unwrap();
    assert_ne!(copied, field_b);
    assert_eq!(model.parent(NodeRef::Field(copied)), Some(NodeRef::Type(target)));

    // `other` is copied from, never taken apart.
    assert_eq!(field_names(&mut model, other), ["fieldB"]);
    assert_eq!(model.parent(NodeRef::Field(field_b)), Some(NodeRef::Type(other)));
}

#[test]
fn bodies_survive_unless_the_strategy_takes_them() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);

    for (strategy, expected) in
        [(Strategy::MergeKeepBody, "B1"), (Strategy::MergeOverrideBody, "B2")]
    {
        let target = model.new_type("Worker", Category::Class).unwrap();
        let run = add_method(&mut model, target, "run", Some("B1"));
        let other = model.new_type("Worker", Category::Class).unwrap();
        add_method(&mut model, other, "run", Some("B2"));

        model.merge(NodeRef::Type(target), NodeRef::Type(other), &Inherit, strategy).unwrap();

        assert_eq!(model.methods(target).to_vec(), [run]);
        assert_eq!(body(&model, run), [expected], "{strategy:?}");
    }
}

#[test]
fn unmatched_members_are_adopted_and_target_only_members_kept() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let target = model.declare_type("a.Account", Category::Class).unwrap();
    add_field(&mut model, target, "a", "int");
    add_method(&mut model, target, "m", None);

    let other = model.new_type("Account", Category::Class).unwrap();
    add_field(&mut model, other, "a", "long");
    add_field(&mut model, other, "b", "int");
    add_method(&mut model, other, "n", Some("return;"));

    let strategy = Strategy::MergeKeepBody;
    model.merge(NodeRef::Type(target), NodeRef::Type(other), &Inherit, strategy).unwrap();

    assert_eq!(field_names(&mut model, target), ["a", "b"]);
    assert_eq!(field_type(&mut model, target, "a"), "long");
    assert_eq!(method_names(&mut model, target), ["m", "n"]);

    // Adopted members come with their bodies whatever the strategy.
    let n = model.find_method(target, "n", &[]).unwrap();
    assert_eq!(body(&model, n), ["return;"]);
}

#[test]
fn keep_leaves_the_target_alone() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let target = model.declare_type("a.Account", Category::Class).unwrap();
    add_field(&mut model, target, "a", "int");

    let other = model.new_type("Account", Category::Interface).unwrap();
    add_field(&mut model, other, "a", "long");
    add_field(&mut model, other, "b", "int");

    model.merge(NodeRef::Type(target), NodeRef::Type(other), &Inherit, Strategy::Keep).unwrap();

    assert_eq!(field_names(&mut model, target), ["a"]);
    assert_eq!(field_type(&mut model, target, "a"), "int");
    assert_eq!(model[target].category(), Category::Class);
}

#[test]
fn keep_bodies_caps_members_below_the_root() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let int = primitive(&model, "int");

    let target = model.new_type("Counter", Category::Class).unwrap();
    let count = model.new_field("count", int.clone()).unwrap();
    model.add_field(target, count).unwrap();
    model.set_initializer(count, Some(Expression::new("0"))).unwrap();
    let tick = add_method(&mut model, target, "tick", Some("count++;"));

    let other = model.new_type("Counter", Category::Class).unwrap();
    let their_count = model.new_field("count", int).unwrap();
    model.add_field(other, their_count).unwrap();
    model.set_initializer(their_count, Some(Expression::new("10"))).unwrap();
    add_method(&mut model, other, "tick", Some("count += 2;"));

    let strategy = Strategy::MergeOverrideBody;
    model.merge(NodeRef::Type(target), NodeRef::Type(other), &KeepBodies, strategy).unwrap();

    assert_eq!(body(&model, tick), ["count++;"]);
    assert_eq!(model[count].initializer().map(Expression::text), Some("0"));
}

fn keep_field_a<'db>(
    model: &Model<'db>,
    target: NodeRef<'db>,
    _other: NodeRef<'db>,
    inherited: Strategy,
) -> Strategy {
    match target {
        NodeRef::Field(field) if text(model, model[field].name()) == "a" => Strategy::Keep,
        _ => inherited,
    }
}

#[test]
fn functions_decide_per_node() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let target = model.new_type("Pair", Category::Class).unwrap();
    add_field(&mut model, target, "a", "int");
    add_field(&mut model, target, "b", "int");

    let other = model.new_type("Pair", Category::Class).unwrap();
    add_field(&mut model, other, "a", "long");
    add_field(&mut model, other, "b", "long");

    let strategy = Strategy::MergeKeepBody;
    model.merge(NodeRef::Type(target), NodeRef::Type(other), &keep_field_a, strategy).unwrap();

    assert_eq!(field_type(&mut model, target, "a"), "int");
    assert_eq!(field_type(&mut model, target, "b"), "long");
}

#[test]
fn mismatched_nodes_cannot_be_merged() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let foo = model.declare_type("a.Foo", Category::Class).unwrap();
    add_field(&mut model, foo, "x", "int");
    let x = model.field_named(foo, "x").unwrap();

    let strategy = Strategy::MergeKeepBody;
    let err = model.merge(NodeRef::Type(foo), NodeRef::Field(x), &Inherit, strategy).unwrap_err();
    expect!["cannot merge type `a.Foo` with field `x` of type `a.Foo`"]
        .assert_eq(&err.to_string());

    let run = add_method(&mut model, foo, "run", None);
    let constructor = model.new_constructor();
    let err = model
        .merge(NodeRef::Operation(run), NodeRef::Operation(constructor), &Inherit, strategy)
        .unwrap_err();
    expect!["cannot merge method `run` of type `a.Foo` with constructor"]
        .assert_eq(&err.to_string());

    let void = GenericType::Type(model.void_type());
    let longer = model.new_method("run", void).unwrap();
    let param = model.new_parameter("times", primitive(&model, "int")).unwrap();
    model.add_parameter(longer, param).unwrap();
    let err = model
        .merge(NodeRef::Operation(run), NodeRef::Operation(longer), &Inherit, strategy)
        .unwrap_err();
    expect!["cannot merge method `run` of type `a.Foo` with method `run`"]
        .assert_eq(&err.to_string());
}

#[test]
fn packages_merge_file_by_file() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let cart = model.declare_type("shop.Cart", Category::Class).unwrap();
    add_field(&mut model, cart, "items", "int");
    let shop = model.package_named("shop").unwrap();

    let NodeRef::Package(other) = model.copy(NodeRef::Package(shop)) else {
        panic!("copy of a package is a package");
    };
    let other_file = *model[other].files().first().unwrap();
    let other_cart = *model[other_file].types().first().unwrap();
    add_field(&mut model, other_cart, "total", "int");
    let order = model.new_type("Order", Category::Class).unwrap();
    model.add_type_to_package(other, order).unwrap();
    assert!(model.type_named("shop.Order").is_err());

    let strategy = Strategy::MergeKeepBody;
    model.merge(NodeRef::Package(shop), NodeRef::Package(other), &Inherit, strategy).unwrap();

    assert_eq!(model.type_named("shop.Cart").unwrap(), cart);
    assert_eq!(field_names(&mut model, cart), ["items", "total"]);
    let merged_order = model.type_named("shop.Order").unwrap();
    assert_ne!(merged_order, order);
    assert_eq!(model[shop].files().len(), 2);
}

#[test]
fn reloaded_declarations_merge_into_edited_ones() {
    let count = RawField { initializer: Some("0".to_owned()), ..raw_field("count", "int") };
    let source = MapSource::new()
        .declare("a.Node", Category::Class)
        .nested("a.Node", "Kind", Category::Enumeration)
        .with("a.Node", field("kind", "Kind"))
        .with("a.Node", RawDecl::Field(count))
        .with("a.Node", with_body(method("getKind", Some("Kind"), &[]), &["return kind;"]));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let node = model.type_named("a.Node").unwrap();
    let kind = model.nested_type_named(node, "Kind").unwrap();
    let count = model.field_named(node, "count").unwrap();
    model.remove(NodeRef::Field(count)).unwrap();
    add_field(&mut model, node, "extra", "int");
    let get_kind = model.methods_named(node, "getKind")[0];
    model.set_body(get_kind, None).unwrap();
    model.add_statement(get_kind, Statement::new("return null;")).unwrap();

    let fresh = model.reload(node).unwrap();
    assert_eq!(model.parent(NodeRef::Type(fresh)), None);
    assert_eq!(model.qualified_name(fresh), "a.Node");

    let strategy = Strategy::MergeKeepBody;
    model.merge(NodeRef::Type(node), NodeRef::Type(fresh), &Inherit, strategy).unwrap();

    assert_eq!(model.type_named("a.Node").unwrap(), node);
    assert_eq!(model.nested_types(node).to_vec(), [kind]);
    assert_eq!(field_names(&mut model, node), ["kind", "extra", "count"]);
    let kind_field = model.field_named(node, "kind").unwrap();
    assert_eq!(model[kind_field].ty(), &GenericType::Type(kind));
    let restored = model.field_named(node, "count").unwrap();
    assert_eq!(model[restored].initializer().map(Expression::text), Some("0"));
    assert_eq!(body(&model, get_kind), ["return null;"]);
    assert_eq!(model.methods_named(node, "getKind"), [get_kind]);
    assert_eq!(model[get_kind].return_type(), Some(&GenericType::Type(kind)));

    let fresh = model.reload(node).unwrap();
    let strategy = Strategy::MergeOverrideBody;
    model.merge(NodeRef::Type(node), NodeRef::Type(fresh), &Inherit, strategy).unwrap();
    assert_eq!(body(&model, get_kind), ["return kind;"]);
}
