//! Browser bindings for shaderpass.
//!
//! `WebProcessor` wraps a [`Processor`](shaderpass_core::Processor) over
//! the WebGL2 context of a canvas and is only built for `wasm32`. Argument
//! parsing and the program registry live here so they can be tested
//! natively.

pub mod error;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{start, WebProcessor};

pub use error::BindingError;

use serde_json::{Number, Value};
use shaderpass_core::{FramebufferFormat, Primitive, TextureOptions};
use std::collections::HashMap;

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Parses JSON produced by `JSON.stringify`; `None` (an `undefined` JS
/// value) reads as `null`.
pub fn parse_json(text: Option<&str>) -> Result<Value, BindingError> {
    match text {
        Some(text) => Ok(serde_json::from_str(text)?),
        None => Ok(Value::Null),
    }
}

/// A uniform or options argument as read from a `JsValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum JsArgument {
    Undefined,
    /// Elements of a typed array such as `Float32Array` or `Int32Array`.
    Numbers(Vec<f64>),
    /// `JSON.stringify` output for any other value.
    Json(String),
}

/// Converts an argument to JSON for
/// [`Processor::uniform_json`](shaderpass_core::Processor::uniform_json).
///
/// Typed array elements become a JSON array. Whole numbers are written as
/// integers so `Int32Array` values fit `int` uniforms.
pub fn argument_json(argument: JsArgument) -> Result<Value, BindingError> {
    match argument {
        JsArgument::Undefined => parse_json(None),
        JsArgument::Json(text) => parse_json(Some(&text)),
        JsArgument::Numbers(values) => values
            .into_iter()
            .map(number_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
    }
}

fn number_json(v: f64) -> Result<Value, BindingError> {
    if v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
        return Ok(Value::from(v as i64));
    }
    Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| BindingError::Js(format!("typed array holds non-finite value {v}")))
}

/// Compiled programs by name, shared by the passes of one context.
///
/// Each name is registered once, since packed passes keep the program's
/// handle.
#[derive(Debug)]
pub struct ProgramRegistry<P> {
    by_name: HashMap<String, P>,
}

impl<P> Default for ProgramRegistry<P> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }
}

impl<P> ProgramRegistry<P> {
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// # Errors
    ///
    /// Returns `DuplicateProgram` if `name` is taken; the registered
    /// program is kept.
    pub fn insert(&mut self, name: &str, program: P) -> Result<(), BindingError> {
        if self.contains(name) {
            return Err(BindingError::DuplicateProgram(name.to_string()));
        }
        self.by_name.insert(name.to_string(), program);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&P, BindingError> {
        self.by_name
            .get(name)
            .ok_or_else(|| BindingError::UnknownProgram(name.to_string()))
    }

    /// Removes every program, for deletion with the context.
    pub fn drain(&mut self) -> impl Iterator<Item = P> + '_ {
        self.by_name.drain().map(|(_, program)| program)
    }
}

/// Texture options from a JS object such as `{ wrap: "repeat", min: "linear" }`.
pub fn parse_texture_options(options: &Value) -> Result<TextureOptions, BindingError> {
    if options.is_null() {
        return Ok(TextureOptions::default());
    }
    Ok(TextureOptions::from_json(options)?)
}

pub fn parse_format(format: &str) -> Result<FramebufferFormat, BindingError> {
    Ok(format.parse()?)
}

pub fn parse_primitive(primitive: &str) -> Result<Primitive, BindingError> {
    Ok(primitive.parse()?)
}
