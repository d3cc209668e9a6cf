pub mod building;
pub mod solar;
pub mod wire;
