//! Cached value types.

use serde::{Deserialize, Serialize};

/// Linear RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Create a color from its three channels.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Channels as an array, in r, g, b order.
    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[f32; 3]> for Rgb {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<(f32, f32, f32)> for Rgb {
    fn from((r, g, b): (f32, f32, f32)) -> Self {
        Self { r, g, b }
    }
}

/// A computed lighting result.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheEntry {
    pub color: Rgb,
    pub weight: f32,
}

impl CacheEntry {
    /// Create an entry from a color and its sample weight.
    pub const fn new(color: Rgb, weight: f32) -> Self {
        Self { color, weight }
    }
}

/// A dynamic-tier entry.
///
/// `age` is opaque metadata: it is persisted and restored but no cache policy
/// reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DynamicEntry {
    pub entry: CacheEntry,
    pub age: u8,
}

impl DynamicEntry {
    /// Wrap a freshly computed result (age 0).
    pub fn fresh(entry: CacheEntry) -> Self {
        Self { entry, age: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_conversions() {
        let channels: [f32; 3] = [0.1, 0.2, 0.3];
        let from_array = Rgb::from(channels);
        let from_tuple = Rgb::from((0.1f32, 0.2f32, 0.3f32));
        assert_eq!(from_array, from_tuple);
        assert_eq!(from_array.to_array(), [0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_fresh_dynamic_entry_has_zero_age() {
        let entry = CacheEntry::new(Rgb::new(1.0, 0.5, 0.25), 0.75);
        let dynamic = DynamicEntry::fresh(entry);
        assert_eq!(dynamic.age, 0);
        assert_eq!(dynamic.entry, entry);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = CacheEntry::new(Rgb::new(0.4, 0.5, 0.6), 0.5);
        let json = serde_json::to_value(entry).unwrap();

        assert_eq!(json["weight"], 0.5);
        assert!(json["color"]["r"].is_number());
        assert!(json["color"]["b"].is_number());
    }
}
