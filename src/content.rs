use crate::engine::Size;
use std::collections::HashMap;

/// Kinds of already-loaded content a scene can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Audio,
}

/// Logical handle to loaded content.
///
/// Only the name and the decoded dimensions travel through the core, the
/// host's [`Surface`](crate::engine::Surface) maps the name back to the real
/// image (an `HtmlImageElement` in the browser).
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub kind: AssetKind,
    pub size: Size,
}

impl Asset {
    pub fn image(name: &str, size: Size) -> Self {
        Asset {
            name: name.to_string(),
            kind: AssetKind::Image,
            size,
        }
    }

    pub fn audio(name: &str) -> Self {
        Asset {
            name: name.to_string(),
            kind: AssetKind::Audio,
            size: Size::default(),
        }
    }
}

/// Capability handed to whoever needs asset lookups. Never blocks: content
/// that isn't loaded yet simply resolves to `None`.
pub trait AssetResolver {
    fn resolve(&self, name: &str, kind: AssetKind) -> Option<Asset>;
}

/// Plain in-memory registry, enough for hosts that load everything up front
/// (and for tests).
#[derive(Debug, Default, Clone)]
pub struct ContentCache {
    assets: HashMap<(String, AssetKind), Asset>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, asset: Asset) -> &mut Self {
        if asset.name.is_empty() {
            log::warn!("ignoring {:?} asset without a name", asset.kind);
            return self;
        }
        self.assets
            .insert((asset.name.clone(), asset.kind), asset);
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetResolver for ContentCache {
    fn resolve(&self, name: &str, kind: AssetKind) -> Option<Asset> {
        self.assets.get(&(name.to_string(), kind)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_by_name_and_kind() {
        let mut cache = ContentCache::new();
        cache
            .register(Asset::image("hero", Size { width: 64, height: 32 }))
            .register(Asset::audio("hero"));

        let image = cache.resolve("hero", AssetKind::Image).map(|a| a.size);
        assert_eq!(image, Some(Size { width: 64, height: 32 }));
        assert_eq!(
            cache.resolve("hero", AssetKind::Audio).map(|a| a.kind),
            Some(AssetKind::Audio)
        );
        assert_eq!(cache.resolve("villain", AssetKind::Image), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn nameless_assets_are_skipped() {
        let mut cache = ContentCache::new();
        cache.register(Asset::audio(""));
        assert!(cache.is_empty());
    }
}
