// Adapters layer: concrete implementations for external systems (file formats, databases).

pub mod loaders;
