//! Form field integration

mod select_remote;

pub use select_remote::{FieldAttributes, FieldValue, SelectOption, SelectRemoteField};
