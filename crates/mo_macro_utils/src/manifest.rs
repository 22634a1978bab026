use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use proc_macro2::Span;
use toml_edit::{Document, Item, Table};

/// The caller's `Cargo.toml`, used to find how generated code must name a
/// workspace crate.
///
/// ```rust
/// # use mo_macro_utils::Manifest;
/// let path: syn::Path = Manifest::shared(|m| m.get_crate_path("mo_meta"));
/// ```
///
/// # Resolution rules
///
/// 1. A crate listed in `dependencies` is named `::crate_name`.
/// 2. For a `mo_*` crate, a dependency on the facade `mo_core` gives
///    `::mo_core::short_name` (`mo_meta` becomes `::mo_core::meta`).
/// 3. Steps 1 and 2 are repeated for `dev-dependencies`.
/// 4. Otherwise `::crate_name` is used.
///
/// A crate naming itself this way needs `extern crate self as crate_name;`
/// in its root.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: Option<SystemTime>,
}

const FACADE_NAME: &str = "mo_core";
const CRATE_PREFIX: &str = "mo_";

impl Manifest {
    fn manifest_path() -> PathBuf {
        let Some(dir) = env::var_os("CARGO_MANIFEST_DIR") else {
            panic!("CARGO_MANIFEST_DIR is not set; proc-macros must be run by cargo");
        };
        let mut path = PathBuf::from(dir);
        path.push("Cargo.toml");
        path
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn read(path: &Path) -> Document<Box<str>> {
        let text = std::fs::read_to_string(path).unwrap_or_else(|err| {
            panic!("unable to read cargo manifest {}: {err}", path.display())
        });
        Document::parse(text.into_boxed_str()).unwrap_or_else(|err| {
            panic!("failed to parse cargo manifest {}: {err}", path.display())
        })
    }

    fn absolute(name: &str) -> syn::Path {
        let ident = syn::Ident::new(name, Span::call_site());
        let mut path = syn::Path::from(ident);
        path.leading_colon = Some(Default::default());
        path
    }

    fn find_in(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Some(Self::absolute(name));
        }
        let module = name.strip_prefix(CRATE_PREFIX)?;
        if deps.contains_key(FACADE_NAME) {
            let mut path = Self::absolute(FACADE_NAME);
            path.segments.push(syn::Ident::new(module, Span::call_site()).into());
            return Some(path);
        }
        None
    }

    /// Returns the path generated code should use for crate `name`.
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        for table in ["dependencies", "dev-dependencies"] {
            if let Some(Item::Table(deps)) = self.manifest.get(table)
                && let Some(path) = Self::find_in(deps, name)
            {
                return path;
            }
        }
        Self::absolute(name)
    }

    /// Runs `func` on the caller's manifest, parsed at most once per change.
    ///
    /// Reading and parsing are not cheap: call this once per macro
    /// invocation and pass the resulting path around.
    ///
    /// # Panics
    ///
    /// Panics if the manifest cannot be located, read or parsed. Inside a
    /// proc-macro this surfaces as a compile error.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let path = Self::manifest_path();
        let modified_time = Self::modified_time(&path);

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&path)
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read(&path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);
        result
    }
}
