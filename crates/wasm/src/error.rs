//! Errors surfaced to JavaScript.

use shaderpass_core::render::ShaderError;
use shaderpass_core::ProcessorError;
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// A JS argument was not valid JSON.
    #[error("invalid JSON argument: {0}")]
    Json(#[from] serde_json::Error),

    /// `packWith` named a program that was never compiled.
    #[error("shader program not found: {0}")]
    UnknownProgram(String),

    /// `compileShader` reused the name of a registered program.
    #[error("shader program already registered: {0}")]
    DuplicateProgram(String),

    /// The canvas or its WebGL2 context could not be obtained, or a JS
    /// value could not be read.
    #[error("{0}")]
    Js(String),
}

impl From<ShaderError> for BindingError {
    fn from(err: ShaderError) -> Self {
        BindingError::Processor(err.into())
    }
}

impl From<BindingError> for JsValue {
    fn from(err: BindingError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
