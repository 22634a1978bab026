#![cfg(feature = "auto_register")]
#![expect(unsafe_code, reason = "drives the host dispatch entry point")]

use core::ffi::c_void;
use core::ptr;

use mo_meta::derive::{MetaType, impl_auto_register};
use mo_meta::ptr::PtrMut;
use mo_meta::types::{TypeRef, TypeRegistry};
use mo_meta::{CallKind, ClassDef, ClassRegistry, MetaClass};

#[derive(Clone, Debug, PartialEq, MetaType)]
#[meta_type(name = "QPoint", auto_register)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Default)]
struct Canvas {
    last: Option<Point>,
}

impl Canvas {
    fn moved(&self, _: Point) {}

    fn place(&mut self, point: Point) {
        self.last = Some(point);
    }
}

impl MetaClass for Canvas {
    fn declare() -> ClassDef<Self> {
        ClassDef::new("Canvas")
            .signal("moved", Canvas::moved as fn(&Canvas, Point))
            .slot_named("place", Canvas::place as fn(&mut Canvas, Point), &["point"])
    }
}

impl_auto_register!(Canvas);

#[test]
fn derived_type_uses_its_host_name() {
    assert_eq!(<Point as mo_meta::MetaType>::TYPE, TypeRef::Custom("QPoint"));

    let meta = Canvas::static_meta_object();
    assert_eq!(meta.index_of_method("place(QPoint)"), 1);
    assert_eq!(meta.index_of_signal("moved(QPoint)"), 0);
}

#[test]
fn derived_type_crosses_the_argument_buffer() {
    let mut canvas = Canvas::default();
    let mut point = Point { x: 3, y: -4 };
    let mut args: [*mut c_void; 2] = [ptr::null_mut(), ptr::from_mut(&mut point).cast()];

    let meta = Canvas::static_meta_object();
    unsafe {
        meta.static_metacall(Some(PtrMut::from_mut(&mut canvas)), CallKind::InvokeMetaMethod, 1, &mut args);
    }
    assert_eq!(canvas.last, Some(Point { x: 3, y: -4 }));
}

#[test]
fn auto_register_collects_classes_and_types() {
    let mut classes = ClassRegistry::empty();
    assert!(classes.auto_register());
    assert!(classes.get("Canvas").is_some());
    assert!(classes.get_type::<Canvas>().is_some());

    let mut types = TypeRegistry::empty();
    assert!(types.auto_register());
    assert!(types.contains("QPoint"));
}
