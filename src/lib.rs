#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use mo_meta as meta;
pub use mo_ptr as ptr;
pub use mo_utils as utils;
