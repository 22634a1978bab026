use alloc::vec::Vec;

use crate::class::ClassDef;
use crate::data::{
    CLASS_NAME_INDEX, CONSTRUCTOR_RETURN, DataArrays, HEADER_LEN, Layout, METHOD_TAG,
    PROPERTY_ACCESS_IN_STATIC_METACALL, REVISION,
};
use crate::seq;
use crate::strings::{StaticString, StringTable};
use crate::types::{TypeRef, UNRESOLVED_TYPE};

/// Builds the string table and the integer array for `class`.
///
/// One pass emits the words in table order; every string is interned at the
/// moment the word that refers to it is written, so the string table layout
/// follows from that order. The result depends only on the declarations.
///
/// ```
/// use mo_meta::class::ClassDef;
/// use mo_meta::data::{generate, header};
///
/// struct Empty;
///
/// let arrays = generate(&ClassDef::<Empty>::new("Empty"));
/// assert_eq!(arrays.data().len(), 14);
/// assert_eq!(arrays.data()[header::METHOD_COUNT], 0);
/// assert_eq!(arrays.string(0), Some("Empty"));
/// ```
pub fn generate<T: 'static>(class: &ClassDef<T>) -> DataArrays {
    let mut strings = StringTable::new();
    strings.push(StaticString::new(class.name()));
    strings.push(StaticString::EMPTY);

    let method_count = class.method_count();
    let property_count = class.property_count();
    let constructor_count = class.constructor_count();
    let layout = Layout::new(method_count, property_count, constructor_count);

    let method_argcs: Vec<u32> = class.methods().map(|m| m.arg_count() as u32).collect();
    let constructor_argcs: Vec<u32> = class
        .constructors()
        .iter()
        .map(|c| c.arg_count() as u32)
        .collect();
    let argcs = seq::concat(&method_argcs, &constructor_argcs);
    let param_offsets = seq::param_offsets(layout.param_base, &argcs);

    let mut data = Vec::with_capacity(layout.total_len(&argcs));

    // header
    data.extend_from_slice(&[
        REVISION,
        CLASS_NAME_INDEX,
        0,
        0,
        method_count as u32,
        layout.method_offset,
        property_count as u32,
        layout.property_offset,
        0,
        0,
        constructor_count as u32,
        layout.constructor_offset,
        PROPERTY_ACCESS_IN_STATIC_METACALL,
        class.signal_count() as u32,
    ]);
    debug_assert_eq!(data.len(), HEADER_LEN);

    for (method, &param_offset) in class.methods().zip(&param_offsets) {
        data.extend_from_slice(&[
            intern(&mut strings, method.name()),
            method.arg_count() as u32,
            param_offset,
            METHOD_TAG,
            method.flags().bits(),
        ]);
    }

    for property in class.properties() {
        data.extend_from_slice(&[
            intern(&mut strings, property.name()),
            type_code(&mut strings, property.type_ref()),
            property.flags().bits(),
        ]);
    }

    for (constructor, &param_offset) in class.constructors().iter().zip(&param_offsets[method_count..]) {
        data.extend_from_slice(&[
            CLASS_NAME_INDEX,
            constructor.arg_count() as u32,
            param_offset,
            METHOD_TAG,
            constructor.flags().bits(),
        ]);
    }

    for method in class.methods() {
        data.push(type_code(&mut strings, method.return_type()));
        push_params(&mut data, &mut strings, method.arg_types(), method.arg_names());
    }

    for constructor in class.constructors() {
        data.push(CONSTRUCTOR_RETURN);
        push_params(
            &mut data,
            &mut strings,
            constructor.arg_types(),
            constructor.arg_names(),
        );
    }

    let arrays = DataArrays::new(strings, data.into_boxed_slice());

    log::debug!(
        "generated meta tables for `{}`: {} methods ({} signals), {} properties, {} constructors, {} words, {} string bytes",
        class.name(),
        method_count,
        class.signal_count(),
        property_count,
        constructor_count,
        arrays.data().len(),
        arrays.string_data().len(),
    );

    arrays
}

#[inline]
fn intern(strings: &mut StringTable, s: &'static str) -> u32 {
    strings.intern(StaticString::new(s))
}

fn type_code(strings: &mut StringTable, ty: TypeRef) -> u32 {
    match ty {
        TypeRef::Builtin(builtin) => builtin.code(),
        TypeRef::Custom(name) => UNRESOLVED_TYPE | intern(strings, name),
    }
}

fn push_params(
    data: &mut Vec<u32>,
    strings: &mut StringTable,
    types: &[TypeRef],
    names: &'static [&'static str],
) {
    // Names are either all given or all omitted.
    if names.is_empty() {
        for (&ty, placeholder) in types.iter().zip(seq::ones(types.len())) {
            data.extend([type_code(strings, ty), placeholder]);
        }
    } else {
        for (&ty, name) in types.iter().zip(names) {
            data.extend([type_code(strings, ty), intern(strings, name)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generate;
    use crate::class::ClassDef;
    use crate::data::{CONSTRUCTOR_RETURN, EMPTY_INDEX, header};
    use crate::member::{MethodFlags, PropertyDecl};
    use crate::types::{BuiltinType, UNRESOLVED_TYPE};

    #[derive(Clone)]
    struct Color;

    crate::declare_meta_type!(Color => "Color");

    #[derive(Default)]
    struct Lamp {
        on: bool,
    }

    impl Lamp {
        fn new(on: bool) -> Self {
            Self { on }
        }
        fn toggled(&self, _: bool) {}
        fn paint(&mut self, _: Color, _: Color) {}
        fn is_on(&self) -> bool {
            self.on
        }
    }

    fn lamp() -> ClassDef<Lamp> {
        ClassDef::new("Lamp")
            .slot_named("paint", Lamp::paint as fn(&mut Lamp, Color, Color), &["fg", "bg"])
            .signal_named("toggled", Lamp::toggled as fn(&Lamp, bool), &["on"])
            .property(PropertyDecl::<Lamp, bool>::new("on").getter(Lamp::is_on))
            .constructor(Lamp::new as fn(bool) -> Lamp)
    }

    #[test]
    fn records_and_params_line_up() {
        let arrays = generate(&lamp());
        let data = arrays.data();

        assert_eq!(data[header::METHOD_COUNT], 2);
        assert_eq!(data[header::SIGNAL_COUNT], 1);
        assert_eq!(data[header::PROPERTY_COUNT], 1);
        assert_eq!(data[header::CONSTRUCTOR_COUNT], 1);

        // 14 + 2 * 5 + 3 + 5 = 32; signal block 3 words, slot 5, constructor 3
        assert_eq!(data.len(), 32 + 3 + 5 + 3);

        let signal = &data[14..19];
        assert_eq!(arrays.string(signal[0]), Some("toggled"));
        assert_eq!(signal[2], 32);
        assert_eq!(signal[4], (MethodFlags::SIGNAL | MethodFlags::ACCESS_PUBLIC).bits());
        assert_eq!(&data[32..35], &[BuiltinType::Void.code(), BuiltinType::Bool.code(), data[32 + 2]]);
        assert_eq!(arrays.string(data[34]), Some("on"));

        let slot = &data[19..24];
        assert_eq!(slot[2], 35);
        let color = data[36];
        assert_eq!(color & UNRESOLVED_TYPE, UNRESOLVED_TYPE);
        assert_eq!(arrays.string(color & !UNRESOLVED_TYPE), Some("Color"));
        assert_eq!(data[38], color);

        let ctor = &data[27..32];
        assert_eq!(ctor[0], 0);
        assert_eq!(ctor[2], 40);
        assert_eq!(data[40], CONSTRUCTOR_RETURN);
        assert_eq!(data[41], BuiltinType::Bool.code());
        assert_eq!(data[42], EMPTY_INDEX);
    }

    #[test]
    fn strings_are_deduplicated() {
        let arrays = generate(&lamp());
        let names: Vec<_> = (0..arrays.string_count() as u32)
            .filter_map(|i| arrays.string(i))
            .collect();
        // "on" is both the signal argument and the property name.
        assert_eq!(names, ["Lamp", "", "toggled", "paint", "on", "Color", "fg", "bg"]);
    }

    #[test]
    fn generation_is_idempotent() {
        let a = generate(&lamp());
        let b = generate(&lamp());
        assert_eq!(a.string_data(), b.string_data());
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn empty_class_has_header_only() {
        let arrays = generate(&ClassDef::<Lamp>::new("Empty"));
        let data = arrays.data();

        assert_eq!(data.len(), 14);
        assert_eq!(data[header::METHOD_COUNT], 0);
        assert_eq!(data[header::PROPERTY_COUNT], 0);
        assert_eq!(data[header::CONSTRUCTOR_COUNT], 0);
        // Offsets still point where the sections would start.
        assert_eq!(data[header::METHOD_OFFSET], 14);
        assert_eq!(data[header::PROPERTY_OFFSET], 14);
        assert_eq!(data[header::CONSTRUCTOR_OFFSET], 14);
        assert_eq!(arrays.string_count(), 2);
    }

    #[test]
    fn custom_type_is_stored_once() {
        let class = lamp().method_named("blend", Lamp::paint as fn(&mut Lamp, Color, Color), &["a", "b"]);
        let arrays = generate(&class);
        let colors = (0..arrays.string_count() as u32)
            .filter(|&i| arrays.string(i) == Some("Color"))
            .count();
        assert_eq!(colors, 1);
        assert_eq!(arrays.method(2).map(|m| m.signature()).as_deref(), Some("blend(Color,Color)"));
    }
}
