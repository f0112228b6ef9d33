use crate::item::Type;
use crate::member::Operation;
use crate::model::Model;
use crate::node::NodeRef;

impl<'db> Model<'db> {
    /// Makes `node` and everything it owns read-only. Lazy containers are pulled first
    /// so a frozen tree never changes underneath a reader. Freezing twice is harmless.
    pub fn freeze(&mut self, node: NodeRef<'db>) {
        match node {
            NodeRef::Package(package) => {
                for file in self.packages[package].files.to_vec() {
                    self.freeze(NodeRef::File(file));
                }
                let data = &mut self.packages[package];
                data.header.freeze();
                data.files.freeze();
            }
            NodeRef::File(file) => {
                for ty in self.files[file].types.to_vec() {
                    self.freeze_type(ty);
                }
                let data = &mut self.files[file];
                data.header.freeze();
                data.types.freeze();
            }
            NodeRef::Type(ty) => self.freeze_type(ty),
            NodeRef::Operation(operation) => self.freeze_operation(operation),
            NodeRef::Field(_) | NodeRef::Parameter(_) | NodeRef::TypeParam(_) => {
                self.header_mut(node).freeze();
            }
        }
    }

    /// Freezes every package of the model.
    pub fn freeze_all(&mut self) {
        for package in self.roots.to_vec() {
            self.freeze(NodeRef::Package(package));
        }
    }

    fn freeze_type(&mut self, ty: Type<'db>) {
        if self.types[ty].header.is_frozen() {
            return;
        }

        self.initialize(ty);
        self.ensure_properties(ty);

        let data = &self.types[ty];
        let type_params = data.type_params.to_vec();
        let fields = data.fields.to_vec();
        let operations: Vec<_> =
            data.constructors.items().chain(data.methods.items()).copied().collect();
        let nested = data.nested.to_vec();

        for type_param in type_params {
            self.type_params[type_param].header.freeze();
        }
        for field in fields {
            self.fields[field].header.freeze();
        }
        for operation in operations {
            self.freeze_operation(operation);
        }
        for nested in nested {
            self.freeze_type(nested);
        }

        self.types[ty].freeze_containers();
        tracing::debug!(name = %self.qualified_name(ty), "frozen");
    }

    fn freeze_operation(&mut self, operation: Operation<'db>) {
        let data = &self.operations[operation];
        let type_params = data.type_params.to_vec();
        let params = data.params.to_vec();

        for type_param in type_params {
            self.type_params[type_param].header.freeze();
        }
        for param in params {
            self.parameters[param].header.freeze();
        }
        self.operations[operation].freeze_containers();
    }
}
