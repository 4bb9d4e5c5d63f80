pub mod lights;
pub mod synthesis;

pub use lights::LightRig;
