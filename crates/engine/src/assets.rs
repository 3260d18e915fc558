use image::RgbaImage;

/// Raw image data decoded from an asset file.
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// Wrap the pixels as an `image` buffer. `None` when the byte count does not
    /// match the dimensions.
    pub fn into_rgba_image(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba)
    }
}

/// Resolves and loads image assets. Relative names resolve against `base_path`;
/// absolute `http(s)://` URLs (remote tile images) are used as-is.
/// Generic: knows nothing about tiles, variants or orders.
pub struct AssetManager {
    base_path: String,
}

impl AssetManager {
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the full URL for an asset.
    pub fn asset_url(&self, name: &str) -> String {
        if name.starts_with("http://") || name.starts_with("https://") || self.base_path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.base_path, name.trim_start_matches('/'))
        }
    }

    /// Load an image using the browser's image decoder.
    /// Returns raw RGBA pixel data.
    #[cfg(target_arch = "wasm32")]
    pub async fn load_image(&self, name: &str) -> Result<ImageData, wasm_bindgen::JsValue> {
        let url = self.asset_url(name);
        let image = browser::load_image_element(&url).await.map_err(|e| {
            log::error!("assets: failed to load {}: {:?}", url, e);
            e
        })?;
        let data = browser::decode_image_to_rgba(&image).map_err(|e| {
            log::error!("assets: failed to decode {}: {:?}", url, e);
            e
        })?;
        log::debug!("assets: loaded {} ({}x{})", url, data.width, data.height);
        Ok(data)
    }

    /// Load several images in order, converting each into an `RgbaImage`.
    #[cfg(target_arch = "wasm32")]
    pub async fn load_rgba_images(&self, names: &[&str]) -> Result<Vec<RgbaImage>, wasm_bindgen::JsValue> {
        let mut images = Vec::with_capacity(names.len());
        for name in names {
            let data = self.load_image(name).await?;
            let (width, height, len) = (data.width, data.height, data.rgba.len());
            let image = data.into_rgba_image().ok_or_else(|| {
                log::error!("assets: {} decoded to {} bytes for {}x{}", name, len, width, height);
                wasm_bindgen::JsValue::from_str("decoded image has the wrong size")
            })?;
            images.push(image);
        }
        Ok(images)
    }
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::HtmlImageElement;

    use super::ImageData;

    /// Load an HtmlImageElement from a URL, waiting for the load event.
    pub(super) async fn load_image_element(url: &str) -> Result<HtmlImageElement, JsValue> {
        let image = HtmlImageElement::new()?;

        let promise = js_sys::Promise::new(&mut |resolve, reject| {
            let onload = Closure::once(move || {
                resolve.call0(&JsValue::NULL).ok();
            });
            let onerror = Closure::once(move || {
                reject
                    .call1(&JsValue::NULL, &JsValue::from_str("Image load failed"))
                    .ok();
            });

            image.set_onload(Some(onload.as_ref().unchecked_ref()));
            image.set_onerror(Some(onerror.as_ref().unchecked_ref()));

            // Closures must outlive the load
            onload.forget();
            onerror.forget();
        });

        // Remote tile images are served cross-origin; the export reads their pixels.
        image.set_cross_origin(Some("anonymous"));
        image.set_src(url);

        wasm_bindgen_futures::JsFuture::from(promise).await?;
        Ok(image)
    }

    /// Decode an HtmlImageElement to raw RGBA bytes through a scratch 2D canvas.
    pub(super) fn decode_image_to_rgba(image: &HtmlImageElement) -> Result<ImageData, JsValue> {
        let width = image.natural_width();
        let height = image.natural_height();

        let document = web_sys::window()
            .ok_or("no window")?
            .document()
            .ok_or("no document")?;

        let canvas = document
            .create_element("canvas")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;
        canvas.set_width(width);
        canvas.set_height(height);

        let ctx = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<web_sys::CanvasRenderingContext2d>()?;

        ctx.draw_image_with_html_image_element(image, 0.0, 0.0)?;

        let data = ctx.get_image_data(0.0, 0.0, width as f64, height as f64)?;
        let rgba = data.data().to_vec();

        Ok(ImageData {
            width,
            height,
            rgba,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_leaves_names_alone() {
        let assets = AssetManager::new("");
        assert_eq!(assets.asset_url("s0.png"), "s0.png");
        let nested = AssetManager::new("static/");
        assert_eq!(nested.asset_url("/s0.png"), "static/s0.png");
    }

    #[test]
    fn remote_urls_are_not_rebased() {
        let assets = AssetManager::new("assets/");
        assert_eq!(assets.asset_url("tiles/s0.png"), "assets/tiles/s0.png");
        assert_eq!(
            assets.asset_url("https://i.imgur.com/RSSS8zt.png"),
            "https://i.imgur.com/RSSS8zt.png"
        );
    }

    #[test]
    fn image_data_checks_length() {
        let ok = ImageData { width: 2, height: 1, rgba: vec![0; 8] };
        assert!(ok.into_rgba_image().is_some());
        let short = ImageData { width: 2, height: 2, rgba: vec![0; 8] };
        assert!(short.into_rgba_image().is_none());
    }
}
