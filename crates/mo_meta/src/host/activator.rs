use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ffi::c_void;
use std::sync::OnceLock;

use mo_ptr::Ptr;
use thiserror::Error;

use crate::host::MetaObject;

/// The host's signal delivery primitive.
///
/// Called synchronously for every emitted signal with the sender, the
/// sender class's meta object, the class-local signal index and the packed
/// arguments `[null, &arg0, &arg1, ..]`. The argument pointers are only
/// valid for the duration of the call.
///
/// Closures with the same shape implement this trait.
pub trait Activator: Send + Sync {
    fn activate(
        &self,
        sender: Ptr<'_>,
        meta_object: &'static MetaObject,
        signal_index: u32,
        args: &mut [*mut c_void],
    );
}

impl<F> Activator for F
where
    F: Fn(Ptr<'_>, &'static MetaObject, u32, &mut [*mut c_void]) + Send + Sync,
{
    #[inline]
    fn activate(
        &self,
        sender: Ptr<'_>,
        meta_object: &'static MetaObject,
        signal_index: u32,
        args: &mut [*mut c_void],
    ) {
        self(sender, meta_object, signal_index, args);
    }
}

/// Failure to install the process-wide activator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivatorError {
    #[error("a process-wide activator is already installed")]
    AlreadyInstalled,
}

static GLOBAL: OnceLock<Box<dyn Activator>> = OnceLock::new();

std::thread_local! {
    static SCOPED: RefCell<Vec<Arc<dyn Activator>>> = const { RefCell::new(Vec::new()) };
}

/// Installs the process-wide activator. It can be installed once.
pub fn set_activator(activator: impl Activator + 'static) -> Result<(), ActivatorError> {
    GLOBAL
        .set(Box::new(activator))
        .map_err(|_| ActivatorError::AlreadyInstalled)
}

/// Runs `f` with `activator` taking precedence on the current thread.
///
/// Scopes nest; the innermost one receives the activations.
///
/// ```
/// use core::ffi::c_void;
/// use std::sync::{Arc, Mutex};
///
/// use mo_meta::host::{Activator, MetaObject, with_activator};
/// use mo_ptr::Ptr;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<u32>>);
///
/// impl Activator for Recorder {
///     fn activate(&self, _: Ptr<'_>, _: &'static MetaObject, index: u32, _: &mut [*mut c_void]) {
///         self.0.lock().unwrap().push(index);
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let answer = with_activator(recorder.clone(), || 42);
///
/// assert_eq!(answer, 42);
/// assert!(recorder.0.lock().unwrap().is_empty());
/// ```
pub fn with_activator<R>(activator: Arc<dyn Activator>, f: impl FnOnce() -> R) -> R {
    struct PopOnDrop;

    impl Drop for PopOnDrop {
        fn drop(&mut self) {
            SCOPED.with_borrow_mut(|stack| stack.pop());
        }
    }

    SCOPED.with_borrow_mut(|stack| stack.push(activator));
    let _guard = PopOnDrop;
    f()
}

/// Hands an activation to the innermost scoped activator, or the global one.
///
/// Returns `false` if none is installed.
pub(crate) fn deliver(
    sender: Ptr<'_>,
    meta_object: &'static MetaObject,
    signal_index: u32,
    args: &mut [*mut c_void],
) -> bool {
    // Cloned out so the activator may emit again.
    if let Some(scoped) = SCOPED.with_borrow(|stack| stack.last().cloned()) {
        scoped.activate(sender, meta_object, signal_index, args);
        return true;
    }
    match GLOBAL.get() {
        Some(global) => {
            global.activate(sender, meta_object, signal_index, args);
            true
        }
        None => false,
    }
}
