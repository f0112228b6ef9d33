use codemodel_span::Symbol;

use crate::container::Container;
use crate::item::Type;
use crate::node::NodeHeader;

pub type Package<'db> = la_arena::Idx<PackageData<'db>>;
pub type File<'db> = la_arena::Idx<FileData<'db>>;

#[derive(Debug, Clone)]
pub struct PackageData<'db> {
    pub(crate) header: NodeHeader<'db>,
    /// Qualified; the default package is the empty name.
    pub(crate) name: Symbol<'db>,
    pub(crate) files: Container<'db, Symbol<'db>, File<'db>>,
}

impl<'db> PackageData<'db> {
    pub(crate) fn new(name: Symbol<'db>) -> Self {
        Self { header: NodeHeader::default(), name, files: Container::populated() }
    }

    pub fn header(&self) -> &NodeHeader<'db> {
        &self.header
    }

    pub fn name(&self) -> Symbol<'db> {
        self.name
    }

    pub fn files(&self) -> &Container<'db, Symbol<'db>, File<'db>> {
        &self.files
    }
}

#[derive(Debug, Clone)]
pub struct FileData<'db> {
    pub(crate) header: NodeHeader<'db>,
    pub(crate) name: Symbol<'db>,
    pub(crate) types: Container<'db, Symbol<'db>, Type<'db>>,
}

impl<'db> FileData<'db> {
    pub(crate) fn new(name: Symbol<'db>) -> Self {
        Self { header: NodeHeader::default(), name, types: Container::populated() }
    }

    pub fn header(&self) -> &NodeHeader<'db> {
        &self.header
    }

    pub fn name(&self) -> Symbol<'db> {
        self.name
    }

    pub fn types(&self) -> &Container<'db, Symbol<'db>, Type<'db>> {
        &self.types
    }
}
