/// Codec de trame glyphpack.
///
/// Turns a greyscale grid into one self-contained record: error-diffusion
/// quantization to 7 glyph levels, an order-1 Markov rank transform, a
/// deterministic list-based Huffman build and an MSB-first bit packer.
pub mod bitpack;
pub mod dither;
pub mod encoder;
pub mod error;
pub mod huffman;
pub mod markov;
pub mod record;

pub use encoder::{FrameEncoder, encode_quantized};
pub use error::{CodecError, Result};
pub use huffman::{Codeword, HuffmanCode, HuffmanTree};
pub use markov::{Histogram, RankMatrix, RankTransform, rank_transform};
pub use record::{FrameRecord, decode_permutation, encode_permutation};
