mod support;

use codemodel_core::{
    Category, GenericType, Model, ModelConfig, ModelError, Modifiers, NodeRef, RawDecl, RawField,
    RawOperation, RawType, Statement,
};
use expect_test::expect;
use salsa::DatabaseImpl;
use support::{
    MapSource, field, field_names, method, operation, property_names, raw_field,
    raw_type_param, supertype, text, tree, type_param, with_body,
};

fn displayed<'db>(model: &Model<'db>, types: &[GenericType<'db>]) -> Vec<String> {
    types.iter().map(|ty| model.display(ty)).collect()
}

fn reason(err: ModelError) -> &'static str {
    match err {
        ModelError::IllegalSupertype { reason, .. } => reason,
        other => panic!("unexpected error: {other}"),
    }
}

fn primitive<'db>(model: &Model<'db>, name: &str) -> GenericType<'db> {
    GenericType::Type(model.builtin(name).unwrap())
}

#[test]
fn containers_are_populated_once_on_first_access() {
    let source = MapSource::new()
        .declare("geo.Point", Category::Class)
        .with("geo.Point", field("x", "int"))
        .with("geo.Point", field("y", "int"));
    let calls = source.populate_calls();
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let point = model.type_named("geo.Point").unwrap();
    assert_eq!(calls.get(), 0);
    assert!(!model[point].is_populated());

    // Type parameters come along with any other container.
    assert_eq!(field_names(&mut model, point), ["x", "y"]);
    assert_eq!(calls.get(), 2);

    model.initialize(point);
    assert_eq!(calls.get(), 6);
    assert!(model[point].is_populated());

    model.initialize(point);
    assert_eq!(field_names(&mut model, point), ["x", "y"]);
    assert_eq!(calls.get(), 6);
}

#[test]
fn duplicate_source_declarations_are_skipped() {
    let source = MapSource::new()
        .declare("geo.Point", Category::Class)
        .with("geo.Point", field("x", "int"))
        .with("geo.Point", field("x", "long"));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let point = model.type_named("geo.Point").unwrap();
    assert_eq!(field_names(&mut model, point), ["x"]);
    let x = model.field_named(point, "x").unwrap();
    assert_eq!(model.display(model[x].ty()), "int");
}

#[test]
fn type_references_resolve_through_scope() {
    let source = MapSource::new()
        .declare("geo.Shape", Category::Class)
        .declare("geo.Vector", Category::Class)
        .nested("geo.Shape", "Kind", Category::Enumeration)
        .with("geo.Shape", field("kind", "Kind"))
        .with("geo.Shape", field("offset", "Vector"))
        .with("geo.Shape", field("name", "String"))
        .with("geo.Shape", field("tags", "java.util.List<String>[]"))
        .with("geo.Shape", field("missing", "Missing"));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let shape = model.type_named("geo.Shape").unwrap();
    let types: Vec<_> = model.fields(shape).to_vec();
    let types: Vec<_> = types.into_iter().map(|field| model[field].ty().clone()).collect();
    assert_eq!(
        displayed(&model, &types),
        [
            "geo.Shape.Kind",
            "geo.Vector",
            "String",
            "java.util.List<String>[]",
            "Missing",
        ]
    );

    let kind = model.nested_type_named(shape, "Kind").unwrap();
    assert_eq!(model.type_named("geo.Shape.Kind").unwrap(), kind);
    assert_eq!(model[kind].category(), Category::Enumeration);
}

#[test]
fn unknown_types_are_reported() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);

    let err = model.type_named("a.Nowhere").unwrap_err();
    expect!["unknown type `a.Nowhere`"].assert_eq(&err.to_string());
}

#[test]
fn accessor_methods_form_properties() {
    let source = MapSource::new()
        .declare("a.Bag", Category::Class)
        .with("a.Bag", method("getSize", Some("int"), &[]))
        .with("a.Bag", method("getNothing", None, &[]))
        .with("a.Bag", method("getItem", Some("int"), &[("index", "int")]))
        .with("a.Bag", method("setSize", None, &[("size", "int")]))
        .with("a.Bag", method("setPair", None, &[("first", "int"), ("second", "int")]))
        .with("a.Bag", method("isEmpty", Some("boolean"), &[]))
        .with("a.Bag", method("settle", None, &[("x", "int")]));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let bag = model.type_named("a.Bag").unwrap();
    assert_eq!(property_names(&mut model, bag), ["size", "empty"]);

    let size = model.property(bag, "size").unwrap();
    let (getter, setter) = (model[size].getter().unwrap(), model[size].setter().unwrap());
    assert_eq!(text(&model, model[getter].name()), "getSize");
    assert_eq!(text(&model, model[setter].name()), "setSize");
    assert_eq!(model[size].field(), None);
    assert_eq!(model.display(model[size].ty().unwrap()), "int");
}

#[test]
fn generic_properties_are_inherited_through_substitution() {
    let source = MapSource::new()
        .declare("coll.Box", Category::Class)
        .with("coll.Box", type_param("T", &[]))
        .with("coll.Box", field("value", "T"))
        .with(
            "coll.Box",
            RawDecl::Field(RawField { modifiers: Modifiers::STATIC, ..raw_field("COUNT", "int") }),
        )
        .with("coll.Box", method("getValue", Some("T"), &[]))
        .with("coll.Box", method("setValue", None, &[("value", "T")]))
        .declare("coll.IntBox", Category::Class)
        .with("coll.IntBox", supertype("Box<java.lang.Integer>"));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let boxed = model.type_named("coll.Box").unwrap();
    assert_eq!(property_names(&mut model, boxed), ["value"]);
    let value = model.property(boxed, "value").unwrap();
    assert!(model[value].field().is_some());
    assert!(model[value].getter().is_some());
    assert!(model[value].setter().is_some());
    assert_eq!(model.display(model[value].ty().unwrap()), "T");

    let int_box = model.type_named("coll.IntBox").unwrap();
    let supertypes = model.all_supertypes(int_box).unwrap();
    assert_eq!(displayed(&model, &supertypes), ["coll.Box<java.lang.Integer>"]);

    assert!(model.declared_properties(int_box).is_empty());
    let inherited = model.all_properties(int_box).unwrap();
    assert_eq!(inherited.len(), 1);
    let inherited = &model[inherited[0]];
    assert_eq!(text(&model, inherited.name()), "value");
    assert_eq!(inherited.owner(), int_box);
    assert_eq!(model.display(inherited.ty().unwrap()), "java.lang.Integer");

    // The declaring type's view is untouched.
    assert_eq!(model.display(model[value].ty().unwrap()), "T");
}

#[test]
fn inherited_properties_keep_their_handle() {
    let source = MapSource::new()
        .declare("coll.Box", Category::Class)
        .with("coll.Box", type_param("T", &[]))
        .with("coll.Box", method("getValue", Some("T"), &[]))
        .with("coll.Box", method("setValue", None, &[("value", "T")]))
        .declare("coll.IntBox", Category::Class)
        .with("coll.IntBox", supertype("Box<java.lang.Integer>"));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);
    let boxed = model.type_named("coll.Box").unwrap();
    let int_box = model.type_named("coll.IntBox").unwrap();

    let first = model.all_properties(int_box).unwrap();
    assert_eq!(model.all_properties(int_box).unwrap(), first);
    assert_eq!(model.all_properties(int_box).unwrap(), first);
    assert!(model[first[0]].setter().is_some());

    // Edits upstream show through the same handle.
    let setter = model.methods_named(boxed, "setValue")[0];
    model.remove(NodeRef::Operation(setter)).unwrap();
    assert_eq!(model.all_properties(int_box).unwrap(), first);
    assert!(model[first[0]].setter().is_none());
    assert!(model[first[0]].getter().is_some());
}

#[test]
fn supertypes_are_walked_superclass_first() {
    let source = MapSource::new()
        .declare("a.I", Category::Interface)
        .declare("a.J", Category::Interface)
        .with("a.J", supertype("I"))
        .declare("a.B", Category::Class)
        .declare("a.C", Category::Class)
        .with("a.C", supertype("I"))
        .with("a.C", supertype("B"))
        .declare("a.D", Category::Class)
        .with("a.D", supertype("C"))
        .declare("a.E", Category::Class)
        .with("a.E", supertype("I"))
        .with("a.E", supertype("J"));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let d = model.type_named("a.D").unwrap();
    let all = model.all_supertypes(d).unwrap();
    assert_eq!(displayed(&model, &all), ["a.C", "a.B", "a.I"]);

    // Reached along two paths, listed twice.
    let e = model.type_named("a.E").unwrap();
    let all = model.all_supertypes(e).unwrap();
    assert_eq!(displayed(&model, &all), ["a.I", "a.J", "a.I"]);

    let c = model.type_named("a.C").unwrap();
    let superclass = model.superclass(c).unwrap();
    assert_eq!(model.display(&superclass), "a.B");
    let interfaces = model.interfaces(c);
    assert_eq!(displayed(&model, &interfaces), ["a.I"]);

    let b = model.type_named("a.B").unwrap();
    let superclass = model.superclass(b).unwrap();
    assert_eq!(model.display(&superclass), "java.lang.Object");

    let i = model.type_named("a.I").unwrap();
    assert_eq!(model.superclass(i), None);
}

#[test]
fn inheritance_cycles_are_errors() {
    let source = MapSource::new()
        .declare("a.X", Category::Class)
        .with("a.X", supertype("Y"))
        .declare("a.Y", Category::Class)
        .with("a.Y", supertype("X"));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let x = model.type_named("a.X").unwrap();
    let err = model.all_supertypes(x).unwrap_err();
    expect!["inheritance cycle: a.X -> a.Y -> a.X"].assert_eq(&err.to_string());
    assert!(model.all_properties(x).is_err());
}

#[test]
fn illegal_supertypes_are_rejected() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let foo = model.declare_type("a.Foo", Category::Class).unwrap();
    let base = model.declare_type("a.Base", Category::Class).unwrap();
    let other = model.declare_type("a.Other", Category::Class).unwrap();
    let api = model.declare_type("a.Api", Category::Interface).unwrap();

    let err = model.add_supertype(foo, GenericType::Type(foo)).unwrap_err();
    expect!["`a.Foo` cannot declare itself as a super-type"].assert_eq(&err.to_string());

    let err = model.add_supertype(api, GenericType::Type(foo)).unwrap_err();
    assert_eq!(reason(err), "an interface can only extend interfaces");

    model.add_supertype(foo, GenericType::Type(base)).unwrap();
    let err = model.add_supertype(foo, GenericType::Type(other)).unwrap_err();
    expect!["`a.Foo` cannot declare `a.Other` as a super-type: a class has at most one superclass"]
        .assert_eq(&err.to_string());

    let err = model.add_supertype(foo, primitive(&model, "int")).unwrap_err();
    assert_eq!(reason(err), "primitive types take no part in inheritance");

    model.add_supertype(foo, GenericType::Type(api)).unwrap();
    let err = model.add_supertype(foo, GenericType::Type(api)).unwrap_err();
    expect!["`a.Api` is already declared in super-types of type `a.Foo`"]
        .assert_eq(&err.to_string());
}

#[test]
fn renames_keep_properties_consistent() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let string = model.declare_type("java.lang.String", Category::Class).unwrap();
    let string = GenericType::Type(string);
    let person = model.declare_type("people.Person", Category::Class).unwrap();

    let name = model.new_field("name", string.clone()).unwrap();
    model.add_field(person, name).unwrap();
    let getter = model.new_method("getName", string).unwrap();
    model.add_operation(person, getter).unwrap();
    assert_eq!(property_names(&mut model, person), ["name"]);

    model.rename(NodeRef::Field(name), "fullName").unwrap();
    assert_eq!(property_names(&mut model, person), ["name", "fullName"]);
    assert!(model.field_named(person, "name").is_none());
    assert_eq!(model.field_named(person, "fullName"), Some(name));

    model.rename(NodeRef::Operation(getter), "getFullName").unwrap();
    assert_eq!(property_names(&mut model, person), ["fullName"]);
    let full_name = model.property(person, "fullName").unwrap();
    assert_eq!(model[full_name].field(), Some(name));
    assert_eq!(model[full_name].getter(), Some(getter));
    assert_eq!(model.find_method(person, "getFullName", &[]), Some(getter));

    model.remove(NodeRef::Field(name)).unwrap();
    assert_eq!(property_names(&mut model, person), ["fullName"]);
    assert_eq!(model.parent(NodeRef::Field(name)), None);

    model.remove(NodeRef::Operation(getter)).unwrap();
    assert!(property_names(&mut model, person).is_empty());
    assert!(model.property(person, "fullName").is_none());
}

#[test]
fn renaming_a_type_updates_the_registry() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let shape = model.declare_type("geo.Shape", Category::Class).unwrap();
    let kind = model.new_type("Kind", Category::Enumeration).unwrap();
    model.add_nested_type(shape, kind).unwrap();
    assert_eq!(model.type_named("geo.Shape.Kind").unwrap(), kind);

    model.rename(NodeRef::Type(shape), "Figure").unwrap();
    assert_eq!(model.type_named("geo.Figure").unwrap(), shape);
    assert_eq!(model.type_named("geo.Figure.Kind").unwrap(), kind);
    assert!(model.type_named("geo.Shape").is_err());
    assert_eq!(model.qualified_name(kind), "geo.Figure.Kind");
}

#[test]
fn source_types_can_be_edited_before_population() {
    let source = MapSource::new()
        .declare("a.Old", Category::Class)
        .with("a.Old", field("size", "int"))
        .nested("a.Old", "Inner", Category::Class)
        .declare("a.Gone", Category::Class)
        .with("a.Gone", field("left", "int"));
    let calls_made = source.populate_calls();
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let old = model.type_named("a.Old").unwrap();
    model.rename(NodeRef::Type(old), "New").unwrap();
    assert_eq!(calls_made.get(), 0);

    let inner = model.nested_type_named(old, "Inner").unwrap();
    assert_eq!(model.qualified_name(inner), "a.New.Inner");
    assert_eq!(model.type_named("a.New.Inner").unwrap(), inner);
    assert_eq!(field_names(&mut model, old), ["size"]);
    assert_ne!(model.type_named("a.Old.Inner").ok(), Some(inner));

    let gone = model.type_named("a.Gone").unwrap();
    model.remove(NodeRef::Type(gone)).unwrap();
    assert!(model.parent(NodeRef::Type(gone)).is_none());
    assert_eq!(field_names(&mut model, gone), ["left"]);
    assert_eq!(model.qualified_name(gone), "a.Gone");
}

#[test]
fn duplicates_are_refused() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let foo = model.declare_type("a.Foo", Category::Class).unwrap();
    let (int, long) = (primitive(&model, "int"), primitive(&model, "long"));
    let void = GenericType::Type(model.void_type());

    let x = model.new_field("x", int.clone()).unwrap();
    model.add_field(foo, x).unwrap();
    let again = model.new_field("x", long.clone()).unwrap();
    let err = model.add_field(foo, again).unwrap_err();
    expect!["`x` is already declared in fields of type `a.Foo`"].assert_eq(&err.to_string());
    assert_eq!(model.parent(NodeRef::Field(again)), None);

    let y = model.new_field("y", long.clone()).unwrap();
    model.add_field(foo, y).unwrap();
    let err = model.rename(NodeRef::Field(y), "x").unwrap_err();
    expect!["`x` is already declared in fields of type `a.Foo`"].assert_eq(&err.to_string());
    assert_eq!(text(&model, model[y].name()), "y");

    let with_int = model.new_method("m", void.clone()).unwrap();
    let value = model.new_parameter("value", int.clone()).unwrap();
    model.add_parameter(with_int, value).unwrap();
    model.add_operation(foo, with_int).unwrap();

    let with_long = model.new_method("m", void.clone()).unwrap();
    let value = model.new_parameter("value", long).unwrap();
    model.add_parameter(with_long, value).unwrap();
    model.add_operation(foo, with_long).unwrap();

    // Growing `m()` into `m(int)` clashes and is rolled back.
    let bare = model.new_method("m", void).unwrap();
    model.add_operation(foo, bare).unwrap();
    let param = model.new_parameter("other", int.clone()).unwrap();
    let err = model.add_parameter(bare, param).unwrap_err();
    expect!["`m(int)` is already declared in methods of type `a.Foo`"]
        .assert_eq(&err.to_string());
    assert!(model[bare].params().is_empty());
    assert_eq!(model.parent(NodeRef::Parameter(param)), None);
    assert_eq!(model.find_method(foo, "m", &[]), Some(bare));
    assert_eq!(model.find_method(foo, "m", &[int]), Some(with_int));
    assert_eq!(model.methods_named(foo, "m").len(), 3);

    let err = model.declare_type("a.Foo", Category::Interface).unwrap_err();
    expect!["`Foo` is already declared in types of package `a`"].assert_eq(&err.to_string());

    let err = model.new_field("1x", GenericType::Type(foo)).unwrap_err();
    expect!["`1x` is not a legal name"].assert_eq(&err.to_string());

    let err = model.add_field(foo, x).unwrap_err();
    expect!["field `x` of type `a.Foo` already has a parent"].assert_eq(&err.to_string());
}

#[test]
fn frozen_nodes_refuse_edits() {
    let db = DatabaseImpl::default();
    let mut model = Model::new(&db);
    let foo = model.declare_type("a.Foo", Category::Class).unwrap();
    let int = primitive(&model, "int");

    let x = model.new_field("x", int.clone()).unwrap();
    model.add_field(foo, x).unwrap();
    let run = model.new_method("run", GenericType::Type(model.void_type())).unwrap();
    model.add_operation(foo, run).unwrap();
    model.add_statement(run, Statement::new("x++;")).unwrap();

    model.freeze(NodeRef::Type(foo));
    model.freeze(NodeRef::Type(foo));
    assert!(model.is_frozen(NodeRef::Type(foo)));
    assert!(model.is_frozen(NodeRef::Field(x)));
    assert!(model.is_frozen(NodeRef::Operation(run)));

    let err = model.rename(NodeRef::Field(x), "y").unwrap_err();
    expect!["field `x` of type `a.Foo` is frozen and cannot be modified"]
        .assert_eq(&err.to_string());

    let z = model.new_field("z", int).unwrap();
    let err = model.add_field(foo, z).unwrap_err();
    expect!["type `a.Foo` is frozen and cannot be modified"].assert_eq(&err.to_string());

    let err = model.add_statement(run, Statement::new("x--;")).unwrap_err();
    expect!["method `run` of type `a.Foo` is frozen and cannot be modified"]
        .assert_eq(&err.to_string());

    assert!(model.remove(NodeRef::Field(x)).is_err());
    assert_eq!(field_names(&mut model, foo), ["x"]);

    let NodeRef::Type(copy) = model.copy(NodeRef::Type(foo)) else {
        panic!("copy of a type is a type");
    };
    assert!(!model.is_frozen(NodeRef::Type(copy)));
    let copied_x = model.field_named(copy, "x").unwrap();
    model.rename(NodeRef::Field(copied_x), "y").unwrap();
    let copied_run = model.methods_named(copy, "run")[0];
    model.add_statement(copied_run, Statement::new("y--;")).unwrap();

    assert_eq!(field_names(&mut model, copy), ["y"]);
    assert_eq!(field_names(&mut model, foo), ["x"]);
    assert_eq!(model[run].body().unwrap().statements().len(), 1);
    assert_eq!(model[copied_run].body().unwrap().statements().len(), 2);
}

#[test]
fn copies_redirect_internal_references() {
    let source = MapSource::new()
        .declare("coll.Box", Category::Class)
        .with("coll.Box", type_param("T", &[]))
        .with("coll.Box", field("value", "T"))
        .with("coll.Box", field("next", "Box<T>"))
        .with("coll.Box", with_body(method("get", Some("T"), &[]), &["return value;"]))
        .nested("coll.Box", "Entry", Category::Class);
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let boxed = model.type_named("coll.Box").unwrap();
    let package = model.package("copies").unwrap();
    let copy = model.copy_type_to_package(boxed, package).unwrap();

    assert_eq!(model.type_named("copies.Box").unwrap(), copy);
    let entry = model.nested_type_named(copy, "Entry").unwrap();
    assert_eq!(model.type_named("copies.Box.Entry").unwrap(), entry);

    let original_t = *model.type_params(boxed).first().unwrap();
    let t = *model.type_params(copy).first().unwrap();
    assert_ne!(t, original_t);
    let value = model.field_named(copy, "value").unwrap();
    assert_eq!(model[value].ty(), &GenericType::Variable(t));

    expect![[r#"
        class copies.Box<T>
          field T value
          field copies.Box<T> next
          method T get() { return value; }
          class copies.Box.Entry
    "#]]
    .assert_eq(&tree(&mut model, copy));
    expect![[r#"
        class coll.Box<T>
          field T value
          field coll.Box<T> next
          method T get() { return value; }
          class coll.Box.Entry
    "#]]
    .assert_eq(&tree(&mut model, boxed));
}

#[test]
fn copies_share_references_outside_the_subtree() {
    let source = MapSource::new()
        .declare("geo.Point", Category::Class)
        .declare("geo.Shape", Category::Class)
        .with("geo.Shape", field("origin", "Point"))
        .with("geo.Shape", method("moveTo", Some("Shape"), &[("target", "Point")]));
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);
    let point = model.type_named("geo.Point").unwrap();
    let shape = model.type_named("geo.Shape").unwrap();

    let NodeRef::Type(copy) = model.copy(NodeRef::Type(shape)) else {
        panic!("a type copies to a type");
    };
    assert!(model.parent(NodeRef::Type(copy)).is_none());

    let origin = model.field_named(shape, "origin").unwrap();
    let copied_origin = model.field_named(copy, "origin").unwrap();
    assert_ne!(copied_origin, origin);
    assert_eq!(model[copied_origin].ty(), &GenericType::Type(point));

    let move_to = model.methods_named(copy, "moveTo")[0];
    let target = *model[move_to].params().first().unwrap();
    assert_eq!(model[target].ty(), &GenericType::Type(point));
    assert_eq!(model[move_to].return_type(), Some(&GenericType::Type(copy)));
}

#[test]
fn debug_tree_renders_declarations() {
    let mut circle = RawType::named("geo.Circle", Category::Class);
    circle.modifiers = Modifiers::PUBLIC;
    let mut base = RawType::named("geo.Base", Category::Class);
    base.modifiers = Modifiers::PUBLIC | Modifiers::ABSTRACT;

    let radius = RawField {
        modifiers: Modifiers::PRIVATE,
        initializer: Some("1.0".to_owned()),
        ..raw_field("radius", "double")
    };
    let init = RawOperation {
        modifiers: Modifiers::PUBLIC,
        ..operation("", None, &[("radius", "double")])
    };
    let get_radius = RawOperation {
        modifiers: Modifiers::PUBLIC,
        ..operation("getRadius", Some("double"), &[])
    };
    let pick = RawOperation {
        modifiers: Modifiers::PUBLIC | Modifiers::ABSTRACT,
        type_params: vec![raw_type_param("T", &[])],
        ..operation("pick", Some("T"), &[("first", "T"), ("second", "T")])
    };

    let source = MapSource::new()
        .declare("geo.Shape", Category::Interface)
        .declare_raw(base)
        .declare_raw(circle)
        .with("geo.Circle", supertype("Base"))
        .with("geo.Circle", supertype("Shape"))
        .with("geo.Circle", RawDecl::Field(radius))
        .with("geo.Circle", with_body(RawDecl::Constructor(init), &["this.radius = radius;"]))
        .with("geo.Circle", with_body(RawDecl::Method(get_radius), &["return radius;"]))
        .with("geo.Circle", RawDecl::Method(pick))
        .nested("geo.Circle", "Unit", Category::Enumeration);
    let db = DatabaseImpl::default();
    let mut model = Model::with_source(&db, ModelConfig::default(), source);

    let circle = model.type_named("geo.Circle").unwrap();
    expect![[r#"
        public class geo.Circle extends geo.Base implements geo.Shape
          field private double radius = 1.0
          constructor public Circle(double radius) { this.radius = radius; }
          method public double getRadius() { return radius; }
          method public abstract <T> T pick(T first, T second);
          enum geo.Circle.Unit
    "#]]
    .assert_eq(&tree(&mut model, circle));

    let package = model.package_named("geo").unwrap();
    expect![[r#"
        package geo
          file Circle.java
            public class geo.Circle extends geo.Base implements geo.Shape
              field private double radius = 1.0
              constructor public Circle(double radius) { this.radius = radius; }
              method public double getRadius() { return radius; }
              method public abstract <T> T pick(T first, T second);
              enum geo.Circle.Unit
          file Base.java
            public abstract class geo.Base
          file Shape.java
            interface geo.Shape
    "#]]
    .assert_eq(&model.debug_tree(NodeRef::Package(package)));
}
