use codemodel_span::Symbol;

use crate::container::Container;
use crate::item::Type;
use crate::member::{Block, Operation, OperationKind, TypeParam};
use crate::model::Model;
use crate::node::{Modifiers, NodeRef};
use crate::ty::GenericType;

impl<'db> Model<'db> {
    /// A stable, indented rendering of `node` and everything it owns.
    ///
    /// Types list their fields, constructors, methods and nested types in that
    /// order. Unpopulated types are initialized on the way.
    pub fn debug_tree(&mut self, node: NodeRef<'db>) -> String {
        let mut lines = Vec::new();
        self.debug_lines(&mut lines, node, 0);
        lines.into_iter().map(|line| line + "\n").collect()
    }

    fn debug_lines(&mut self, lines: &mut Vec<String>, node: NodeRef<'db>, depth: usize) {
        let line = match node {
            NodeRef::Package(it) => format!("package {}", self.packages[it].name.text(self.db)),
            NodeRef::File(it) => format!("file {}", self.files[it].name.text(self.db)),
            NodeRef::Type(it) => {
                self.initialize(it);
                self.type_line(it)
            }
            NodeRef::Field(it) => {
                let data = &self.fields[it];
                let mut line = format!(
                    "field {}{} {}",
                    modifiers(data.modifiers),
                    self.display(&data.ty),
                    data.name.text(self.db)
                );
                if let Some(initializer) = &data.initializer {
                    line.push_str(" = ");
                    line.push_str(initializer.text());
                }
                line
            }
            NodeRef::Operation(it) => self.operation_line(it),
            NodeRef::Parameter(it) => {
                let data = &self.parameters[it];
                let (ty, name) = (self.display(&data.ty), data.name.text(self.db));
                format!("parameter {}{ty} {name}", modifiers(data.modifiers))
            }
            NodeRef::TypeParam(it) => format!("type parameter {}", self.type_param(it)),
        };
        lines.push(format!("{}{line}", "  ".repeat(depth)));

        for child in self.debug_children(node) {
            self.debug_lines(lines, child, depth + 1);
        }
    }

    fn debug_children(&self, node: NodeRef<'db>) -> Vec<NodeRef<'db>> {
        match node {
            NodeRef::Package(it) => {
                self.packages[it].files.items().map(|&file| NodeRef::File(file)).collect()
            }
            NodeRef::File(it) => {
                self.files[it].types.items().map(|&ty| NodeRef::Type(ty)).collect()
            }
            NodeRef::Type(it) => {
                let data = &self.types[it];
                let fields = data.fields.items().map(|&it| NodeRef::Field(it));
                let operations = data.constructors.items().chain(data.methods.items());
                let operations = operations.map(|&it| NodeRef::Operation(it));
                let nested = data.nested.items().map(|&it| NodeRef::Type(it));
                fields.chain(operations).chain(nested).collect()
            }
            _ => Vec::new(),
        }
    }

    fn type_line(&self, ty: Type<'db>) -> String {
        let data = &self.types[ty];
        let mut line = format!(
            "{}{} {}{}",
            modifiers(data.modifiers),
            data.category.keyword(),
            self.qualified_name(ty),
            self.type_params_list(&data.type_params)
        );

        let list = |types: &[&GenericType<'db>]| {
            types.iter().map(|&ty| self.display(ty)).collect::<Vec<_>>().join(", ")
        };
        let supertypes: Vec<_> = data.supertypes.items().collect();

        if data.category.is_interface_like() {
            if !supertypes.is_empty() {
                line.push_str(&format!(" extends {}", list(&supertypes)));
            }
            return line;
        }

        let (classes, interfaces): (Vec<_>, Vec<_>) = supertypes.into_iter().partition(|ty| {
            ty.nominal().is_some_and(|nominal| self.types[nominal].category.is_class_like())
        });
        if !classes.is_empty() {
            line.push_str(&format!(" extends {}", list(&classes)));
        }
        if !interfaces.is_empty() {
            line.push_str(&format!(" implements {}", list(&interfaces)));
        }
        line
    }

    fn operation_line(&self, operation: Operation<'db>) -> String {
        let data = &self.operations[operation];
        let mut line = match data.kind {
            OperationKind::Method => "method ".to_owned(),
            OperationKind::Constructor => "constructor ".to_owned(),
        };
        line.push_str(&modifiers(data.modifiers));
        if !data.type_params.is_empty() {
            line.push_str(&self.type_params_list(&data.type_params));
            line.push(' ');
        }

        match data.kind {
            OperationKind::Method => {
                let return_type = data.return_type.as_ref().map(|ty| self.display(ty));
                let return_type = return_type.unwrap_or_else(|| self.config.void_type.clone());
                line.push_str(&format!("{return_type} {}", data.name.text(self.db)));
            }
            OperationKind::Constructor => match data.header.parent() {
                Some(NodeRef::Type(owner)) => line.push_str(self.types[owner].name.text(self.db)),
                _ => line.push_str("<detached>"),
            },
        }

        let params: Vec<_> = data
            .params
            .items()
            .map(|&param| {
                let param = &self.parameters[param];
                let mods = modifiers(param.modifiers);
                format!("{mods}{} {}", self.display(&param.ty), param.name.text(self.db))
            })
            .collect();
        line.push_str(&format!("({})", params.join(", ")));

        if !data.exceptions.is_empty() {
            let exceptions: Vec<_> =
                data.exceptions.items().map(|ty| self.display(ty)).collect();
            line.push_str(&format!(" throws {}", exceptions.join(", ")));
        }

        match &data.body {
            Some(body) => line.push_str(&body_text(body)),
            None => line.push(';'),
        }
        line
    }

    fn type_params_list(&self, params: &Container<'db, Symbol<'db>, TypeParam<'db>>) -> String {
        if params.is_empty() {
            return String::new();
        }
        let params: Vec<_> = params.items().map(|&param| self.type_param(param)).collect();
        format!("<{}>", params.join(", "))
    }

    fn type_param(&self, param: TypeParam<'db>) -> String {
        let data = &self.type_params[param];
        let name = data.name.text(self.db);
        if data.bounds.is_empty() {
            return name.to_owned();
        }
        let bounds: Vec<_> = data.bounds.iter().map(|bound| self.display(bound)).collect();
        format!("{name} extends {}", bounds.join(" & "))
    }
}

fn modifiers(modifiers: Modifiers) -> String {
    if modifiers.is_empty() { String::new() } else { format!("{modifiers} ") }
}

fn body_text(body: &Block) -> String {
    let statements: Vec<_> = body.statements().iter().map(|statement| statement.text()).collect();
    if statements.is_empty() {
        return " {}".to_owned();
    }
    format!(" {{ {} }}", statements.join(" "))
}
