pub mod analysis;
pub mod container;
pub mod decode;
pub mod features;
pub mod onset;
pub mod quantize;
pub mod spectrum;
pub mod window;
