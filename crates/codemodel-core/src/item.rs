mod package;
mod types;

pub use package::{File, FileData, Package, PackageData};
pub use types::{Category, MethodKey, Type, TypeData};
