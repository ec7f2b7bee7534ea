use crate::error::BindingError;
use crate::{
    argument_json, parse_format, parse_primitive, parse_texture_options, JsArgument,
    ProgramRegistry,
};
use shaderpass_core::{Geometry, Processor, Raster, ShaderProgram};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

type Gl = glow::Context;

#[wasm_bindgen(start)]
pub fn start() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    // A second module instance may have installed the logger already.
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("console logger already initialized");
    }
}

/// Programs of one context, deleted when its last pass is dropped.
struct Programs {
    gl: Rc<Gl>,
    registry: ProgramRegistry<ShaderProgram<Gl>>,
}

impl Drop for Programs {
    fn drop(&mut self) {
        for program in self.registry.drain() {
            program.destroy(&*self.gl);
        }
    }
}

/// A processing pass over a canvas's WebGL2 context.
#[wasm_bindgen]
pub struct WebProcessor {
    processor: Processor<Gl>,
    canvas: HtmlCanvasElement,
    programs: Rc<RefCell<Programs>>,
}

fn js_argument(value: &JsValue) -> Result<JsArgument, BindingError> {
    if value.is_undefined() {
        return Ok(JsArgument::Undefined);
    }
    // DataView and BigInt arrays are views too, but hold no plain numbers.
    if js_sys::ArrayBuffer::is_view(value)
        && !value.is_instance_of::<js_sys::DataView>()
        && !value.is_instance_of::<js_sys::BigInt64Array>()
        && !value.is_instance_of::<js_sys::BigUint64Array>()
    {
        return Ok(JsArgument::Numbers(js_sys::Float64Array::new(value).to_vec()));
    }
    let text: String = js_sys::JSON::stringify(value)
        .map_err(|_| BindingError::Js("value is not serializable to JSON".to_string()))?
        .into();
    Ok(JsArgument::Json(text))
}

fn js_value_json(value: &JsValue) -> Result<serde_json::Value, BindingError> {
    argument_json(js_argument(value)?)
}

#[wasm_bindgen]
impl WebProcessor {
    /// Sizes `canvas` and wraps its WebGL2 context.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, width: u32, height: u32) -> Result<WebProcessor, BindingError> {
        canvas.set_width(width);
        canvas.set_height(height);
        let context = canvas
            .get_context("webgl2")
            .map_err(|_| BindingError::Js("failed to query the webgl2 context".to_string()))?
            .ok_or_else(|| BindingError::Js("WebGL2 is not available".to_string()))?
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(|_| BindingError::Js("context is not WebGL2".to_string()))?;
        let gl = Rc::new(glow::Context::from_webgl2_context(context));
        let programs = Rc::new(RefCell::new(Programs {
            gl: Rc::clone(&gl),
            registry: ProgramRegistry::default(),
        }));
        Ok(Self {
            processor: Processor::new(gl, width, height)?,
            canvas,
            programs,
        })
    }

    /// Another pass on the same context, sharing compiled programs so its
    /// output can be sampled with `framebufferTextureFrom`.
    #[wasm_bindgen(js_name = nextPass)]
    pub fn next_pass(&self, width: u32, height: u32) -> Result<WebProcessor, BindingError> {
        Ok(Self {
            processor: Processor::new(Rc::clone(self.processor.context()), width, height)?,
            canvas: self.canvas.clone(),
            programs: Rc::clone(&self.programs),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.processor.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.processor.height()
    }

    /// Compiles and links a program, registering it as `name`. A name can
    /// only be registered once.
    #[wasm_bindgen(js_name = compileShader)]
    pub fn compile_shader(&self, name: &str, vertex: &str, fragment: &str) -> Result<(), BindingError> {
        let mut programs = self.programs.borrow_mut();
        if programs.registry.contains(name) {
            return Err(BindingError::DuplicateProgram(name.to_string()));
        }
        let program = ShaderProgram::new(&*programs.gl, vertex, fragment)?;
        programs.registry.insert(name, program)
    }

    pub fn attribute(
        &mut self,
        name: &str,
        components: u32,
        stride: u32,
        offset: u32,
    ) -> Result<(), BindingError> {
        self.processor.attribute(name, components, stride, offset)?;
        Ok(())
    }

    /// Uploads the stock clip-space quad.
    pub fn quad(&mut self) -> Result<(), BindingError> {
        self.processor.geometry(Geometry::quad())?;
        Ok(())
    }

    /// Uploads interleaved vertices drawn as `primitive`
    /// (`"TRIANGLE_STRIP"`, `"TRIANGLES"`, `"POINTS"` or `"LINES"`).
    pub fn geometry(&mut self, primitive: &str, vertices: Vec<f32>, count: u32) -> Result<(), BindingError> {
        let primitive = parse_primitive(primitive)?;
        self.processor
            .geometry(Geometry::new(primitive, vertices, count))?;
        Ok(())
    }

    #[wasm_bindgen(js_name = packWith)]
    pub fn pack_with(&mut self, name: &str) -> Result<(), BindingError> {
        let programs = self.programs.borrow();
        let program = programs.registry.get(name)?;
        self.processor.pack_with(program)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = textureGray8)]
    pub fn texture_gray8(
        &mut self,
        data: Vec<u8>,
        width: u32,
        height: u32,
        unit: u32,
        options: JsValue,
    ) -> Result<(), BindingError> {
        self.upload(Raster::gray8(width, height, data)?, unit, &options)
    }

    #[wasm_bindgen(js_name = textureGray16)]
    pub fn texture_gray16(
        &mut self,
        data: Vec<u16>,
        width: u32,
        height: u32,
        unit: u32,
        options: JsValue,
    ) -> Result<(), BindingError> {
        self.upload(Raster::gray16(width, height, data)?, unit, &options)
    }

    #[wasm_bindgen(js_name = textureRgba)]
    pub fn texture_rgba(
        &mut self,
        data: Vec<u8>,
        width: u32,
        height: u32,
        unit: u32,
        options: JsValue,
    ) -> Result<(), BindingError> {
        self.upload(Raster::rgba(width, height, data)?, unit, &options)
    }

    #[wasm_bindgen(js_name = textureFloat32)]
    pub fn texture_float32(
        &mut self,
        data: Vec<f32>,
        width: u32,
        height: u32,
        unit: u32,
        options: JsValue,
    ) -> Result<(), BindingError> {
        self.upload(Raster::float32(width, height, data)?, unit, &options)
    }

    /// Renders the next `run` into framebuffer `name` (`"uint8"`,
    /// `"uint16"` or `"float32"`).
    #[wasm_bindgen(js_name = redirectTo)]
    pub fn redirect_to(&mut self, name: &str, format: &str, attachment: u32) -> Result<(), BindingError> {
        let format = parse_format(format)?;
        self.processor.redirect_to(name, format, attachment)?;
        Ok(())
    }

    /// Samples this pass's own framebuffer `name` on `unit`.
    #[wasm_bindgen(js_name = framebufferTexture)]
    pub fn framebuffer_texture(&mut self, name: &str, unit: u32) -> Result<(), BindingError> {
        self.processor.texture_from(name, unit)?;
        Ok(())
    }

    /// Samples framebuffer `name` of `source`, a pass created with
    /// `nextPass`, on `unit`.
    #[wasm_bindgen(js_name = framebufferTextureFrom)]
    pub fn framebuffer_texture_from(
        &mut self,
        source: &WebProcessor,
        name: &str,
        unit: u32,
    ) -> Result<(), BindingError> {
        if !Rc::ptr_eq(self.processor.context(), source.processor.context()) {
            return Err(BindingError::Js(
                "framebuffer belongs to a different WebGL context".to_string(),
            ));
        }
        let output = source.processor.output(name)?;
        self.processor.framebuffer_texture(output, unit);
        Ok(())
    }

    #[wasm_bindgen(js_name = useProgram)]
    pub fn use_program(&mut self) -> Result<(), BindingError> {
        self.processor.use_program()?;
        Ok(())
    }

    /// Sets a uniform from a number, array of numbers or flat column-major
    /// matrix, read according to the uniform's declared type.
    pub fn uniform(&mut self, name: &str, value: JsValue) -> Result<(), BindingError> {
        let value = js_value_json(&value)?;
        self.processor.uniform_json(name, &value)?;
        Ok(())
    }

    pub fn run(&mut self) -> Result<(), BindingError> {
        self.processor.run()?;
        Ok(())
    }

    #[wasm_bindgen(js_name = clearCanvas)]
    pub fn clear_canvas(&mut self, r: f32, g: f32, b: f32, a: f32) -> Result<(), BindingError> {
        self.sync_canvas_size()?;
        self.processor.clear_canvas([r, g, b, a]);
        Ok(())
    }

    /// Clears with the default colour.
    pub fn clear(&mut self) -> Result<(), BindingError> {
        self.sync_canvas_size()?;
        self.processor.clear();
        Ok(())
    }

    /// Resizes the canvas and the pass.
    pub fn size(&mut self, width: u32, height: u32) -> Result<(), BindingError> {
        self.processor.size(width, height)?;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        Ok(())
    }

    /// Whether float framebuffers can be rendered into.
    #[wasm_bindgen(js_name = supportsFloatTargets)]
    pub fn supports_float_targets(&self) -> bool {
        self.processor.capabilities().color_buffer_float
    }
}

impl WebProcessor {
    /// Another pass, or page script, may have resized the shared canvas.
    fn sync_canvas_size(&mut self) -> Result<(), BindingError> {
        self.processor
            .set_canvas_size(self.canvas.width(), self.canvas.height())?;
        Ok(())
    }

    fn upload(&mut self, raster: Raster, unit: u32, options: &JsValue) -> Result<(), BindingError> {
        let options = parse_texture_options(&js_value_json(options)?)?;
        self.processor.texture(&raster, unit, options)?;
        Ok(())
    }
}
