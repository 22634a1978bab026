//! Items referenced by code generated in `mo_meta_derive`.
//!
//! Not public API.

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::object::MetaClass;
    use crate::registry::ClassRegistry;
    use crate::types::{MetaType, TypeRegistry};

    pub struct __AutoRegisterClass(pub fn(&mut ClassRegistry));

    inventory::collect!(__AutoRegisterClass);

    pub struct __AutoRegisterType(pub fn(&mut TypeRegistry));

    inventory::collect!(__AutoRegisterType);

    pub trait __RegisterClass {
        fn __register(registry: &mut ClassRegistry);
    }

    impl<T: MetaClass> __RegisterClass for T {
        #[inline]
        fn __register(registry: &mut ClassRegistry) {
            registry.register::<T>();
        }
    }

    pub trait __RegisterType {
        fn __register(registry: &mut TypeRegistry);
    }

    impl<T: MetaType> __RegisterType for T {
        #[inline]
        fn __register(registry: &mut TypeRegistry) {
            registry.register_type::<T>();
        }
    }

    pub fn __register_classes(registry: &mut ClassRegistry) {
        for item in inventory::iter::<__AutoRegisterClass> {
            (item.0)(registry);
        }
    }

    pub fn __register_types(registry: &mut TypeRegistry) {
        for item in inventory::iter::<__AutoRegisterType> {
            (item.0)(registry);
        }
    }
}
