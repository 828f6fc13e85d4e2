mod argument_builder;
mod ffmpeg_encoder;
pub mod progress_parser;

pub use argument_builder::ArgumentBuilder;
pub use ffmpeg_encoder::FfmpegEncoder;
