//! Request pipeline: catalog → plan → composite → decorators → PNG bytes.
//!
//! A [`Renderer`] owns the catalog cache and the decorator settings and is
//! shared by all requests. Each request builds its own rasters from scratch;
//! nothing mutable is shared between requests, so `render` can be called
//! from many threads at once.
//!
//! Errors terminate the request they belong to and are never retried.

use crate::catalog::{CatalogCache, CatalogError};
use crate::composite::{CompositeError, composite};
use crate::config::AppConfig;
use crate::imaging::{
    BackendError, DecorationError, EngravingParams, QrParams, RasterBackend, RustBackend,
    encode_png, engrave, render_qr, stamp_qr,
};
use crate::select::{CompositePlan, Selection, resolve_plan};
use crate::types::{Catalog, Group};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Content type of every rendered image.
pub const CONTENT_TYPE: &str = "image/png";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error("Decoration failed: {0}")]
    Decoration(#[from] DecorationError),
    #[error(transparent)]
    Encode(#[from] BackendError),
    #[error("A QR payload is required")]
    MissingPayload,
}

/// One composite request.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Collection to draw from; the configured default when `None`.
    pub collection: Option<String>,
    pub selection: Selection,
    /// Engraving text; empty or `None` draws nothing.
    pub engraving: Option<String>,
    /// QR payload; when non-empty the emblem layer is dropped and a QR
    /// stamp is drawn instead.
    pub qr_payload: Option<String>,
}

impl RenderRequest {
    pub fn new(selection: Selection) -> Self {
        Self {
            collection: None,
            selection,
            engraving: None,
            qr_payload: None,
        }
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn engraving(mut self, text: impl Into<String>) -> Self {
        self.engraving = Some(text.into());
        self
    }

    pub fn qr_payload(mut self, payload: impl Into<String>) -> Self {
        self.qr_payload = Some(payload.into());
        self
    }

    fn qr(&self) -> Option<&str> {
        self.qr_payload.as_deref().filter(|p| !p.is_empty())
    }
}

/// Encoded output of a render.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedImage {
    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }
}

/// Shared, read-only rendering service.
pub struct Renderer {
    config: AppConfig,
    cache: CatalogCache,
    backend: RustBackend,
    engraving: EngravingParams,
    qr: QrParams,
}

impl Renderer {
    pub fn new(assets_root: impl Into<PathBuf>, config: AppConfig) -> Self {
        let engraving = EngravingParams::from(&config.engraving);
        let qr = QrParams::from(&config.qr);
        Self {
            cache: CatalogCache::new(assets_root),
            backend: RustBackend::new(),
            engraving,
            qr,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Catalog for `collection`, or the configured default.
    pub fn catalog(&self, collection: Option<&str>) -> Result<Arc<Catalog>, RenderError> {
        let collection = collection.unwrap_or(&self.config.default_collection);
        Ok(self.cache.get(collection)?)
    }

    /// Layer names and variant counts for a collection.
    pub fn groups(&self, collection: Option<&str>) -> Result<Vec<Group>, RenderError> {
        Ok(self.catalog(collection)?.groups())
    }

    /// Resolve the plan a request would composite.
    pub fn plan(
        &self,
        request: &RenderRequest,
    ) -> Result<(Arc<Catalog>, CompositePlan), RenderError> {
        let catalog = self.catalog(request.collection.as_deref())?;
        let suppressed = request.qr().map(|_| self.config.emblem_layer.as_str());
        let plan = resolve_plan(&catalog, &request.selection, suppressed);
        Ok((catalog, plan))
    }

    /// Composite, decorate, and encode one request.
    pub fn render(&self, request: &RenderRequest) -> Result<RenderedImage, RenderError> {
        let (catalog, plan) = self.plan(request)?;
        self.render_plan(&catalog, &plan, request)
    }

    /// Composite a plan already resolved by [`Renderer::plan`], then apply
    /// the request's decorations and encode.
    #[tracing::instrument(skip_all, fields(collection = catalog.collection.as_str()))]
    pub fn render_plan(
        &self,
        catalog: &Catalog,
        plan: &CompositePlan,
        request: &RenderRequest,
    ) -> Result<RenderedImage, RenderError> {
        let mut image = composite(&self.backend, catalog, plan)?;

        if let Some(text) = request.engraving.as_deref() {
            engrave(&mut image, text, &self.engraving)?;
        }
        if let Some(payload) = request.qr() {
            stamp_qr(&mut image, payload, &self.qr)?;
        }

        let png = self.backend.encode_png(&image)?;
        debug!(
            layers = plan.len(),
            bytes = png.len(),
            "rendered composite"
        );
        Ok(RenderedImage {
            png,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Standalone QR code image for `payload`.
    pub fn render_qr(&self, payload: &str) -> Result<RenderedImage, RenderError> {
        if payload.is_empty() {
            return Err(RenderError::MissingPayload);
        }
        let image = render_qr(payload, self.qr.module_px)?;
        Ok(RenderedImage {
            png: encode_png(&image)?,
            width: image.width(),
            height: image.height(),
        })
    }
}
