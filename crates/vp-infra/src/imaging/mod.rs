mod frame_encoder;

pub use frame_encoder::ImageFrameEncoder;
