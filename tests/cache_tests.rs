use std::sync::Arc;

use neumorph::render::ShadowRaster;
use neumorph::{
    Appearance, Bounds, CacheConfig, CacheKey, LightSource, RenderError, ShadowCache, ShadowLayer,
    ShapeSurface, Style, Theme, VariantKind, compute_outline,
};

fn style() -> Style {
    Style::new(4.0, 6.0).unwrap()
}

fn key(bounds: Bounds, layer: ShadowLayer) -> CacheKey {
    CacheKey::new(
        bounds,
        &Appearance::rounded(8.0),
        Theme::default(),
        style(),
        LightSource::TopLeft,
        layer,
    )
}

fn surface(cache: &Arc<ShadowCache>, bounds: Bounds) -> ShapeSurface {
    let mut surface = ShapeSurface::new(Arc::clone(cache));
    surface.set_appearance(Appearance::rounded(8.0));
    surface.set_style(style());
    surface.set_variant(VariantKind::Flat);
    surface.on_bounds_changed(bounds);
    surface
}

#[test]
fn background_warmup_is_picked_up_by_surfaces() {
    let cache = Arc::new(ShadowCache::default());
    let bounds = Bounds::new(64, 32);

    let warm = Arc::clone(&cache);
    std::thread::spawn(move || {
        let outline = compute_outline(bounds, &Appearance::rounded(8.0));
        let raster = ShadowRaster::new(outline, Theme::default(), style(), LightSource::TopLeft);
        warm.get_or_try_create(&key(bounds, ShadowLayer::Outer), || {
            raster.render_layer(ShadowLayer::Outer)
        })
    })
    .join()
    .unwrap()
    .unwrap();

    let mut surface = surface(&cache, bounds);
    surface.render().unwrap();
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn entry_limit_evicts_oldest_shapes() {
    let cache = Arc::new(ShadowCache::new(CacheConfig::default().with_max_entries(2)));
    for width in [40, 50, 60] {
        surface(&cache, Bounds::new(width, 30)).render().unwrap();
    }

    assert_eq!(cache.len(), 2);
    assert!(!cache.contains(&key(Bounds::new(40, 30), ShadowLayer::Outer)));
    assert!(cache.contains(&key(Bounds::new(60, 30), ShadowLayer::Outer)));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn oversized_layers_are_returned_but_not_stored() {
    let cache = Arc::new(ShadowCache::new(CacheConfig::default().with_max_bytes(1024)));
    let rendered = surface(&cache, Bounds::new(80, 40)).render().unwrap();

    assert!(!rendered.is_empty());
    assert!(cache.is_empty());
    assert_eq!(cache.bytes(), 0);
}

#[test]
fn failed_render_is_retried() {
    let cache = ShadowCache::default();
    let k = key(Bounds::new(10, 10), ShadowLayer::Inner);

    let err = cache
        .get_or_try_create(&k, || Err(RenderError::Allocation { width: 0, height: 0 }))
        .unwrap_err();
    assert_eq!(err, RenderError::Allocation { width: 0, height: 0 });
    assert!(!cache.contains(&k));

    let outline = compute_outline(Bounds::new(10, 10), &Appearance::rounded(8.0));
    let raster = ShadowRaster::new(outline, Theme::default(), style(), LightSource::TopLeft);
    let pixmap = cache
        .get_or_try_create(&k, || raster.render_layer(ShadowLayer::Inner))
        .unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (30, 30));
    assert!(cache.contains(&k));
}
