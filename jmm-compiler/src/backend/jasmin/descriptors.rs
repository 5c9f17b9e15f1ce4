//! JVM type and method descriptors, and class name resolution.

use crate::ir::{ClassUnit, IrType};

pub const OBJECT: &str = "java/lang/Object";
pub const STRING: &str = "java/lang/String";

/// Slash-separated path of a class as seen from `unit`.
///
/// The unit's own class stays as is, imported classes resolve to their full
/// import path, anything else has its dots turned into slashes.
pub fn class_path(name: &str, unit: &ClassUnit) -> String {
    if name == unit.name {
        return name.to_string();
    }
    if name == "String" {
        return STRING.to_string();
    }
    unit.imports
        .iter()
        .find(|path| path.rsplit('.').next() == Some(name))
        .map_or_else(|| name.replace('.', "/"), |path| path.replace('.', "/"))
}

pub fn super_path(unit: &ClassUnit) -> String {
    unit.super_class
        .as_deref()
        .map_or_else(|| OBJECT.to_string(), |s| class_path(s, unit))
}

pub fn type_descriptor(ty: &IrType, unit: &ClassUnit) -> String {
    match ty {
        IrType::Int => "I".to_string(),
        IrType::Bool => "Z".to_string(),
        IrType::Void => "V".to_string(),
        IrType::String => format!("L{STRING};"),
        IrType::Array(elem) => format!("[{}", type_descriptor(elem, unit)),
        IrType::Class(name) => format!("L{};", class_path(name, unit)),
    }
}

/// `(<params>)<ret>`
pub fn method_descriptor<'a>(
    params: impl IntoIterator<Item = &'a IrType>,
    ret: &IrType,
    unit: &ClassUnit,
) -> String {
    let params: String = params
        .into_iter()
        .map(|t| type_descriptor(t, unit))
        .collect();
    format!("({params}){}", type_descriptor(ret, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> ClassUnit {
        let mut u = ClassUnit::new("Simple");
        u.imports = vec!["io".into(), "java.util.ArrayList".into()];
        u
    }

    #[test]
    fn resolves_imports_and_own_class() {
        let u = unit();
        assert_eq!(class_path("Simple", &u), "Simple");
        assert_eq!(class_path("ArrayList", &u), "java/util/ArrayList");
        assert_eq!(class_path("io", &u), "io");
        assert_eq!(super_path(&u), "java/lang/Object");
    }

    #[test]
    fn descriptors() {
        let u = unit();
        let args = IrType::Array(Box::new(IrType::String));
        assert_eq!(type_descriptor(&args, &u), "[Ljava/lang/String;");
        assert_eq!(
            type_descriptor(&IrType::Class("ArrayList".into()), &u),
            "Ljava/util/ArrayList;"
        );
        assert_eq!(
            method_descriptor(&[IrType::Int, IrType::Bool], &IrType::Void, &u),
            "(IZ)V"
        );
    }
}
