//! A mutable, lazily populated model of object-oriented declarations.
//!
//! Packages own files, files own types, types own their members. Everything lives
//! in arenas inside [`Model`] and is addressed by handle; all edits go through the
//! model so container keys, the type registry and derived properties stay in step.

mod config;
mod container;
mod copy;
mod debug;
mod edit;
mod error;
mod freeze;
mod item;
mod member;
mod merge;
mod model;
mod node;
mod populate;
mod property;
mod resolve;
mod source;
mod supertypes;
mod ty;

pub use config::{Accessor, ModelConfig, classify};
pub use container::{Container, Population, Sequence};
pub use error::{ModelError, Result};
pub use item::{Category, File, FileData, MethodKey, Package, PackageData, Type, TypeData};
pub use member::{
    Block, CONSTRUCTOR_NAME, Expression, Field, FieldData, Operation, OperationData,
    OperationKind, Parameter, ParameterData, Statement, TypeParam, TypeParamData,
};
pub use merge::{Decider, Inherit, KeepBodies, Strategy};
pub use model::Model;
pub use node::{Doc, Modifiers, NodeHeader, NodeRef};
pub use property::{Property, PropertyData};
pub use resolve::Substitution;
pub use source::{
    DeclarationSource, MalformedTypeRef, Origin, RawDecl, RawField, RawOperation, RawParameter,
    RawType, RawTypeParam, RawTypeRef, Slot, SourceId,
};
pub use ty::{BoundKind, Erasure, GenericType, Invokability};
