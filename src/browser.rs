use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen::{
    JsCast,
    JsValue,
};
use wasm_bindgen::closure::{
    Closure,
    WasmClosure,
    WasmClosureFnOnce,
};

#[rustfmt::skip]
use web_sys::{
    Document,
    Window,
    CanvasRenderingContext2d,
    HtmlCanvasElement,
    HtmlImageElement,
    Response,
};

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CONTEXT_2D: &str = "2d";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

static LOGGER: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();

/// Route `log` macros to the browser console and panics to console.error.
/// Safe to call more than once.
pub fn init_logging(level: log::Level) {
    LOGGER.get_or_init(|| {
        console_error_panic_hook::set_once();
        #[cfg(target_arch = "wasm32")]
        if let Err(err) = console_log::init_with_level(level) {
            web_sys::console::warn_1(&format!("logger already set : {}", err).into());
        }
        #[cfg(not(target_arch = "wasm32"))]
        log::set_max_level(level.to_level_filter());
    });
}

pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new()
        .map_err(|err|
            anyhow!("Could not create image element : {:#?}", err)
        )
}

pub fn context(canvas_id: &str) -> Result<CanvasRenderingContext2d> {
    canvas(canvas_id)?
        .get_context(html::CONTEXT_2D)
        // Because return is Result<Option<Object>,JsValue>
        // - we map error(JsValue) to Error (anyhow)
        // - take the inner Option and map the None case to a value
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn canvas(canvas_id: &str) -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(canvas_id)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{}'", canvas_id))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

/// milliseconds from `performance.now()`
pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn closure_once<F, A, R>(f: F) ->
    Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!("fetching {} returned status {}", json_path, resp.status()));
    }
    let json =
    resp.json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}
