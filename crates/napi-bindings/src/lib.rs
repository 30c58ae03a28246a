#[macro_use]
extern crate napi_derive;

pub mod engine_api;

#[napi]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
