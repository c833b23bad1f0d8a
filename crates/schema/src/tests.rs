//! Shared mock schemas for unit and integration tests in downstream crates.

use crate::datatype::DataType;
use crate::definition::{AssemblyDef, FieldDef, FlagDef, ModuleDef};
use crate::instance::{
    AssemblyInstance, DefinitionRef, FieldInstance, FlagInstance, MaxOccurs, ModelInstance,
};
use crate::qname::QName;
use crate::value::{BoundAssembly, BoundField, BoundValue};

pub const TEST_NS: &str = "http://example.com/ns/computer";

/// A small non-recursive module:
///
/// ```text
/// assembly computer (root "computer")
///   flag id (token, required)
///   field vendor (string) 0..1, flag country (token)
///   field cpu-speed (decimal) 0..*, grouped as "cpu-speeds"
/// ```
pub fn computer_module() -> ModuleDef {
    let mut module = ModuleDef::new("computer", Some(TEST_NS.to_string()));

    module
        .add_flag(FlagDef::new(module.qualify("id"), DataType::Token))
        .unwrap();
    module
        .add_flag(FlagDef::new(module.qualify("country"), DataType::Token))
        .unwrap();

    module
        .add_field(
            FieldDef::new(module.qualify("vendor"), DataType::String).with_flag(
                FlagInstance::new(DefinitionRef::by_name(module.qualify("country"))),
            ),
        )
        .unwrap();
    module
        .add_field(FieldDef::new(module.qualify("cpu-speed"), DataType::Decimal))
        .unwrap();

    let computer = AssemblyDef::new(module.qualify("computer"))
        .with_root_name(module.qualify("computer"))
        .with_flag(FlagInstance::new(DefinitionRef::by_name(module.qualify("id"))).required())
        .with_model(ModelInstance::Field(
            FieldInstance::new(DefinitionRef::by_name(module.qualify("vendor")))
                .occurs(0, MaxOccurs::Bounded(1)),
        ))
        .with_model(ModelInstance::Field(
            FieldInstance::new(DefinitionRef::by_name(module.qualify("cpu-speed")))
                .occurs(0, MaxOccurs::Unbounded)
                .with_group_as("cpu-speeds"),
        ));
    module.add_assembly(computer).unwrap();

    module
}

/// A bound document for [`computer_module`].
pub fn computer_value() -> BoundValue {
    BoundValue::Assembly(
        BoundAssembly::new()
            .with_flag("id", "pc-0001")
            .with_child(
                "vendor",
                BoundValue::Field(BoundField::new("Example Corp").with_flag("country", "DE")),
            )
            .with_children(
                "cpu-speed",
                vec![
                    BoundValue::Field(BoundField::new(dec_scalar("2.4"))),
                    BoundValue::Field(BoundField::new(dec_scalar("3.1"))),
                ],
            ),
    )
}

fn dec_scalar(s: &str) -> crate::value::ScalarValue {
    crate::value::ScalarValue::Dec(s.parse().unwrap())
}

/// A self-recursive module:
///
/// ```text
/// assembly group (root "group")
///   flag name (token)
///   field member (string) 0..*
///   assembly group 0..*           <- recursive usage
/// ```
pub fn recursive_group_module() -> ModuleDef {
    let mut module = ModuleDef::new("group", Some("http://example.com/ns/group".to_string()));

    module
        .add_flag(FlagDef::new(module.qualify("name"), DataType::Token))
        .unwrap();
    module
        .add_field(FieldDef::new(module.qualify("member"), DataType::String))
        .unwrap();

    let group = AssemblyDef::new(module.qualify("group"))
        .with_root_name(module.qualify("group"))
        .with_flag(FlagInstance::new(DefinitionRef::by_name(module.qualify("name"))))
        .with_model(ModelInstance::Field(
            FieldInstance::new(DefinitionRef::by_name(module.qualify("member")))
                .occurs(0, MaxOccurs::Unbounded),
        ))
        .with_model(ModelInstance::Assembly(
            AssemblyInstance::new(DefinitionRef::by_name(module.qualify("group")))
                .occurs(0, MaxOccurs::Unbounded),
        ));
    module.add_assembly(group).unwrap();

    module
}

/// A two-level bound document for [`recursive_group_module`]:
/// a group containing one member and one nested group.
pub fn nested_group_value() -> BoundValue {
    let inner = BoundAssembly::new()
        .with_flag("name", "inner")
        .with_child("member", BoundValue::Field(BoundField::new("leaf")));

    BoundValue::Assembly(
        BoundAssembly::new()
            .with_flag("name", "outer")
            .with_child("member", BoundValue::Field(BoundField::new("top")))
            .with_child("group", BoundValue::Assembly(inner)),
    )
}

/// The root assembly name of [`recursive_group_module`].
pub fn group_root_name() -> QName {
    QName::new("http://example.com/ns/group", "group")
}
