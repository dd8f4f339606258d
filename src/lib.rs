pub mod config;
pub mod renderer;
pub mod terrain;

pub use config::{ConfigError, RenderConfig};
pub use renderer::MapRenderer;
pub use terrain::{GameMap, MapError, TerrainGrid, TerrainKind};
