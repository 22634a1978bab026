//! `hashbrown` containers hashed with a fixed `foldhash` seed.
//!
//! A string table built twice from the same declarations hashes and iterates
//! identically.
//!
//! ```
//! use mo_utils::hash::{FIXED_STATE, HashMap};
//!
//! let mut strings: HashMap<&str, u32> = HashMap::with_hasher(FIXED_STATE);
//! strings.insert("valueChanged", 2);
//! assert_eq!(strings.get("valueChanged"), Some(&2));
//! ```

use foldhash::fast::FixedState;

/// The hash state shared by every [`HashMap`] and [`HashSet`] in the crates.
pub const FIXED_STATE: FixedState = FixedState::with_seed(0x6D6F_5F6D_6574_6131);

/// A [`hashbrown::HashMap`] using [`FixedState`].
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedState>;

/// A [`hashbrown::HashSet`] using [`FixedState`].
pub type HashSet<T> = hashbrown::HashSet<T, FixedState>;

pub use foldhash;
pub use hashbrown;
